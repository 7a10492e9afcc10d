//! Node field derivation for Markdown content nodes.
//!
//! The per-node hook computes a URL slug and a content-type classification
//! from a node's source file path and frontmatter, and attaches both as
//! derived fields. Frontmatter image paths are normalized first, for every
//! node kind.

mod images;

use tracing::{debug, instrument};

use siteforge_shared::{
    ContentNode, FileNode, Frontmatter, NodeId, NodeKind, Result, SiteforgeError, SourcePath,
};

pub use images::normalize_frontmatter_images;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Options for the per-node hook.
#[derive(Debug, Clone)]
pub struct DeriveOptions {
    /// Content tree root, relative to the site root.
    pub content_dir: String,
    /// Static asset root absolute image paths resolve into.
    pub static_dir: String,
}

impl Default for DeriveOptions {
    fn default() -> Self {
        Self {
            content_dir: "content".into(),
            static_dir: "static".into(),
        }
    }
}

/// Fields the deriver attaches to a Markdown node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedFields {
    /// URL path for the node.
    pub slug: String,
    /// Raw directory component of the source file.
    pub content_type: String,
}

/// By-id lookup of a node's backing file, supplied by the host.
pub trait NodeLookup {
    fn file_node(&self, id: &NodeId) -> Option<&FileNode>;
}

// ---------------------------------------------------------------------------
// Hook
// ---------------------------------------------------------------------------

/// Per-node hook: normalize frontmatter images, then derive and attach
/// `slug` and `content_type` fields.
///
/// Image normalization runs for every node that has a backing file,
/// regardless of kind. Field derivation applies only to Markdown nodes;
/// other kinds are left untouched. A Markdown node whose parent file
/// cannot be resolved is an error.
#[instrument(skip_all, fields(node = %node.id))]
pub fn on_create_node(
    node: &mut ContentNode,
    lookup: &dyn NodeLookup,
    opts: &DeriveOptions,
) -> Result<()> {
    // Image paths are rewritten before any slug work, for every kind.
    if let Some(parent) = node.parent {
        if let Some(file) = lookup.file_node(&parent) {
            let path = SourcePath::parse(&file.relative_path);
            images::normalize_frontmatter_images(&mut node.frontmatter, &path.dir, opts);
        }
    }

    if node.kind != NodeKind::Markdown {
        return Ok(());
    }

    let parent = node.parent.ok_or_else(|| {
        SiteforgeError::validation(format!("markdown node {} has no parent file", node.id))
    })?;
    let file = lookup.file_node(&parent).ok_or_else(|| {
        SiteforgeError::validation(format!(
            "parent file {parent} of markdown node {} not found",
            node.id
        ))
    })?;

    let path = SourcePath::parse(&file.relative_path);
    let derived = derive_fields(&node.frontmatter, &path);

    debug!(
        slug = %derived.slug,
        content_type = %derived.content_type,
        file = %file.relative_path,
        "derived node fields"
    );

    node.fields.slug = Some(derived.slug);
    node.fields.content_type = Some(derived.content_type);

    Ok(())
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// Compute the slug and content type for a Markdown source file.
///
/// Slug precedence, first match wins:
/// 1. explicit frontmatter slug, lower-cased and wrapped in slashes
/// 2. `pages/home` gets the root path
/// 3. frontmatter title, kebab-cased under the kebab-cased directory
/// 4. top-level files fall back to their base name
/// 5. everything else falls back to its directory
///
/// Empty frontmatter values count as absent. The content type is always
/// the raw directory component.
pub fn derive_fields(frontmatter: &Frontmatter, path: &SourcePath) -> DerivedFields {
    let slug = if let Some(slug) = non_empty(frontmatter.slug.as_deref()) {
        format!("/{}/", slug.to_lowercase())
    } else if path.stem == "home" && path.dir == "pages" {
        "/".to_string()
    } else if let Some(title) = non_empty(frontmatter.title.as_deref()) {
        format!("/{}/{}/", kebab_case(&path.dir), kebab_case(title))
    } else if path.dir.is_empty() {
        format!("/{}/", path.stem)
    } else {
        format!("/{}/", path.dir)
    };

    DerivedFields {
        slug,
        content_type: path.dir.clone(),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// Lower-case kebab-case: words split on non-alphanumerics, camelCase
/// boundaries, and letter/digit edges, joined with hyphens.
///
/// `"My Post"` → `my-post`, `"camelCase"` → `camel-case`,
/// `"Top10"` → `top-10`, `"HTMLParser"` → `html-parser`.
pub fn kebab_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if !current.is_empty() {
            let prev = chars[i - 1];
            let upper_start = c.is_uppercase() && (prev.is_lowercase() || prev.is_numeric());
            let digit_edge = prev.is_alphanumeric() && (c.is_numeric() != prev.is_numeric());

            if upper_start || digit_edge {
                words.push(std::mem::take(&mut current));
            } else if c.is_lowercase() && prev.is_uppercase() && current.chars().count() > 1 {
                // Acronym run followed by a word: the run's last capital
                // starts the new word ("HTMLParser" → "HTML" + "Parser").
                if let Some(last) = current.pop() {
                    if !current.is_empty() {
                        words.push(std::mem::take(&mut current));
                    }
                    current.push(last);
                }
            }
        }

        current.push(c);
    }

    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
