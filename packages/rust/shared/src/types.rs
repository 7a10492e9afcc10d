//! Core domain types for the siteforge build hooks.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Extra file extensions the host's module resolver should treat as
/// resolvable. Declared capability only; ingest also uses it to decide
/// which non-Markdown files still become data nodes.
pub const RESOLVABLE_EXTENSIONS: &[&str] = &[".json"];

// ---------------------------------------------------------------------------
// NodeId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for node identifiers (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Generate a new time-sortable node identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for NodeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// Content nodes
// ---------------------------------------------------------------------------

/// Kind discriminator for content nodes (`internal.type` in the host model).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    /// A Markdown content file. The only kind the field deriver acts on.
    Markdown,
    /// A structured data file with a resolvable extension.
    Data,
}

/// Author-supplied metadata from the head of a content file.
///
/// The keys the build hooks read are typed; everything else the author
/// wrote is carried verbatim in `extra` (and is where image paths live).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frontmatter {
    /// Template name for page creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Page title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Explicit URL slug override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// All remaining frontmatter keys, passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Fields attached to a node by the deriver hook. Empty until the hook runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeFields {
    /// Derived URL path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Coarse classification from the source directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// A unit of content discovered by the host's file-ingestion subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentNode {
    /// Unique node identifier.
    pub id: NodeId,
    /// Kind discriminator.
    pub kind: NodeKind,
    /// The backing file node, when one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeId>,
    /// Author-supplied metadata.
    #[serde(default)]
    pub frontmatter: Frontmatter,
    /// Deriver-populated fields.
    #[serde(default)]
    pub fields: NodeFields,
}

/// The file backing a content node. Read-only once ingested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileNode {
    /// Unique node identifier.
    pub id: NodeId,
    /// Path relative to the content root, always `/`-separated.
    pub relative_path: String,
    /// SHA-256 hash of the file contents at ingest time.
    pub content_hash: String,
}

// ---------------------------------------------------------------------------
// SourcePath
// ---------------------------------------------------------------------------

/// Directory and base-name components of a file's relative path.
///
/// Splits the way the host splits `relativePath`: `dir` is everything
/// before the last separator (empty for top-level files), `stem` is the
/// file name with its final extension removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePath {
    pub dir: String,
    pub stem: String,
}

impl SourcePath {
    /// Parse a `/`-separated relative path into its components.
    pub fn parse(relative_path: &str) -> Self {
        let (dir, file) = match relative_path.rsplit_once('/') {
            Some((dir, file)) => (dir.to_string(), file),
            None => (String::new(), relative_path),
        };

        let stem = match file.rsplit_once('.') {
            Some((stem, _ext)) if !stem.is_empty() => stem.to_string(),
            _ => file.to_string(),
        };

        Self { dir, stem }
    }
}

// ---------------------------------------------------------------------------
// Page requests
// ---------------------------------------------------------------------------

/// An instruction to the host page registry: create one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Unique URL path for the page.
    pub path: String,
    /// Filesystem path to the template that renders the page.
    pub component: PathBuf,
    /// Opaque key-values forwarded verbatim to the template's data layer.
    pub context: serde_json::Value,
}

/// The `pages.json` manifest written at the end of a build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageManifest {
    /// When the build ran.
    pub generated_at: DateTime<Utc>,
    /// Every page request emitted, in emission order.
    pub pages: Vec<PageRequest>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_roundtrip() {
        let id = NodeId::new();
        let s = id.to_string();
        let parsed: NodeId = s.parse().expect("parse NodeId");
        assert_eq!(id, parsed);
    }

    #[test]
    fn source_path_splits_dir_and_stem() {
        let p = SourcePath::parse("pages/home.md");
        assert_eq!(p.dir, "pages");
        assert_eq!(p.stem, "home");

        let p = SourcePath::parse("about.md");
        assert_eq!(p.dir, "");
        assert_eq!(p.stem, "about");

        let p = SourcePath::parse("articles/2024/my-post.md");
        assert_eq!(p.dir, "articles/2024");
        assert_eq!(p.stem, "my-post");
    }

    #[test]
    fn source_path_keeps_name_without_extension() {
        let p = SourcePath::parse("pages/README");
        assert_eq!(p.stem, "README");

        // A dotfile's leading dot is part of the name, not an extension.
        let p = SourcePath::parse(".config");
        assert_eq!(p.stem, ".config");
    }

    #[test]
    fn frontmatter_carries_extra_keys() {
        let yaml_equivalent = serde_json::json!({
            "template": "HomePage",
            "title": "Home",
            "image": "/img/banner.png",
            "tags": ["a", "b"],
        });

        let fm: Frontmatter = serde_json::from_value(yaml_equivalent).expect("deserialize");
        assert_eq!(fm.template.as_deref(), Some("HomePage"));
        assert_eq!(fm.extra["image"], "/img/banner.png");
        assert_eq!(fm.extra["tags"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn content_node_serialization() {
        let node = ContentNode {
            id: NodeId::new(),
            kind: NodeKind::Markdown,
            parent: Some(NodeId::new()),
            frontmatter: Frontmatter {
                title: Some("Home".into()),
                ..Default::default()
            },
            fields: NodeFields::default(),
        };

        let json = serde_json::to_string(&node).expect("serialize");
        let parsed: ContentNode = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.kind, NodeKind::Markdown);
        assert_eq!(parsed.frontmatter.title.as_deref(), Some("Home"));
        assert!(parsed.fields.slug.is_none());
    }

    #[test]
    fn page_manifest_serialization() {
        let manifest = PageManifest {
            generated_at: Utc::now(),
            pages: vec![PageRequest {
                path: "/about/".into(),
                component: PathBuf::from("src/templates/DefaultPage.html"),
                context: serde_json::json!({ "id": "abc" }),
            }],
        };

        let json = serde_json::to_string_pretty(&manifest).expect("serialize");
        let parsed: PageManifest = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.pages.len(), 1);
        assert_eq!(parsed.pages[0].path, "/about/");
    }

    #[test]
    fn resolvable_extensions_declares_json() {
        assert!(RESOLVABLE_EXTENSIONS.contains(&".json"));
    }
}
