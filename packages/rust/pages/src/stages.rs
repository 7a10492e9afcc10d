//! Pure page planners: record sets in, page-creation requests out.
//!
//! Nothing here touches the host; the pipeline feeds these from the
//! query surface and pushes the results into the page sink.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::json;
use tracing::{debug, info};

use siteforge_shared::PageRequest;

use crate::query::{MarkdownPageNode, ProductRecord, SheetRow};

/// Upper bound on the Markdown node query.
pub const MARKDOWN_QUERY_LIMIT: usize = 1000;

/// Content type reserved for spreadsheet-sourced pages; Markdown nodes
/// under it never become pages.
const SHEET_CONTENT_TYPE: &str = "posts";

/// Owned by the static blog index page; never emitted from a node.
const BLOG_INDEX_SLUG: &str = "/blog/";

/// Template rendering every product page.
const PRODUCT_TEMPLATE: &str = "ProductPage";

/// Template rendering every spreadsheet-sourced blog page.
const BLOG_TEMPLATE: &str = "SingleBlog";

/// Template files are HTML documents in the templates directory.
const TEMPLATE_EXT: &str = "html";

// ---------------------------------------------------------------------------
// Stage A: Markdown-derived pages
// ---------------------------------------------------------------------------

/// Plan pages for Markdown nodes, grouped by content type.
///
/// The `posts` group is skipped entirely (those pages come from the
/// sheet), as is any node claiming the blog index slug or lacking a
/// template. A group left with no qualifying nodes logs a skip and
/// produces nothing.
pub fn plan_markdown_pages(
    nodes: &[MarkdownPageNode],
    templates_dir: &Path,
) -> Vec<PageRequest> {
    let mut groups: BTreeMap<&str, Vec<&MarkdownPageNode>> = BTreeMap::new();
    for node in nodes {
        groups.entry(node.content_type.as_str()).or_default().push(node);
    }

    let mut requests = Vec::new();

    for (content_type, group) in &groups {
        if *content_type == SHEET_CONTENT_TYPE {
            continue;
        }

        let qualifying: Vec<(&MarkdownPageNode, &str)> = group
            .iter()
            .filter_map(|node| match node.template.as_deref() {
                Some(template) if !template.is_empty() && node.slug != BLOG_INDEX_SLUG => {
                    Some((*node, template))
                }
                _ => None,
            })
            .collect();

        if qualifying.is_empty() {
            info!(content_type, "skipping content type with no qualifying pages");
            continue;
        }

        info!(content_type, count = qualifying.len(), "creating pages");

        for (node, template) in qualifying {
            requests.push(PageRequest {
                path: node.slug.clone(),
                component: template_path(templates_dir, template),
                context: json!({ "id": node.id }),
            });
        }
    }

    requests
}

// ---------------------------------------------------------------------------
// Stage B: commerce product pages
// ---------------------------------------------------------------------------

/// Plan one page per product record, unconditionally.
pub fn plan_product_pages(
    products: &[ProductRecord],
    templates_dir: &Path,
) -> Vec<PageRequest> {
    debug!(count = products.len(), "planning product pages");

    products
        .iter()
        .map(|product| PageRequest {
            path: format!("/product/{}/", product.handle),
            component: template_path(templates_dir, PRODUCT_TEMPLATE),
            context: json!({ "handle": product.handle }),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Stage C: spreadsheet-sourced blog pages
// ---------------------------------------------------------------------------

/// Plan one blog page per sheet row, newest first.
pub fn plan_blog_pages(rows: &[SheetRow], templates_dir: &Path) -> Vec<PageRequest> {
    let mut ordered: Vec<&SheetRow> = rows.iter().collect();
    ordered.sort_by(|a, b| b.dateadded.cmp(&a.dateadded));

    debug!(count = ordered.len(), "planning blog pages");

    ordered
        .iter()
        .map(|row| PageRequest {
            path: format!("/blog/{}/", row.articleid),
            component: template_path(templates_dir, BLOG_TEMPLATE),
            context: json!({ "blogid": row.articleid }),
        })
        .collect()
}

/// Resolve a template name to its file in the templates directory.
fn template_path(templates_dir: &Path, template: &str) -> PathBuf {
    templates_dir.join(format!("{template}.{TEMPLATE_EXT}"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
