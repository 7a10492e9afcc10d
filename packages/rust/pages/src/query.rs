//! Query boundary: the host's data surface and the record shapes it
//! must produce.
//!
//! The host query engine answers with a `{ data, errors }` envelope;
//! record shapes are validated here at the boundary (via serde and the
//! source implementations) instead of being picked apart ad hoc
//! downstream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use siteforge_shared::NodeId;

// ---------------------------------------------------------------------------
// Query envelope
// ---------------------------------------------------------------------------

/// Result envelope for one host data query: the rows it produced plus
/// any errors the engine reported alongside them.
#[derive(Debug, Clone)]
pub struct QueryOutcome<T> {
    /// Rows matching the query.
    pub data: Vec<T>,
    /// Engine-reported errors, human-readable.
    pub errors: Vec<String>,
}

impl<T> QueryOutcome<T> {
    /// An outcome with rows and no errors.
    pub fn ok(data: Vec<T>) -> Self {
        Self {
            data,
            errors: Vec::new(),
        }
    }

    /// An outcome carrying only errors.
    pub fn failed(errors: Vec<String>) -> Self {
        Self {
            data: Vec::new(),
            errors,
        }
    }
}

/// The host's query surface: the three fixed record sets page creation
/// draws from. Each query is awaited to completion before the next
/// stage's query is issued.
#[allow(async_fn_in_trait)]
pub trait DataSource {
    /// Markdown content nodes with derived fields, at most `limit` rows.
    async fn markdown_nodes(&self, limit: usize) -> QueryOutcome<MarkdownPageNode>;

    /// All commerce product records.
    async fn products(&self) -> QueryOutcome<ProductRecord>;

    /// All spreadsheet rows.
    async fn sheet_rows(&self) -> QueryOutcome<SheetRow>;
}

// ---------------------------------------------------------------------------
// Record shapes
// ---------------------------------------------------------------------------

/// A Markdown node as the page planner sees it: identity, template
/// binding, and the fields the deriver attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkdownPageNode {
    /// Node identity, forwarded into the page context.
    pub id: NodeId,
    /// Template name from frontmatter, if the author set one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Title from frontmatter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Derived URL path. Never empty after derivation.
    pub slug: String,
    /// Derived content-type classification.
    pub content_type: String,
}

/// An external commerce product record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Unique, URL-safe product identifier.
    pub handle: String,
}

/// One row of the spreadsheet export backing the blog.
///
/// `articleid` keys the page path; the remaining columns ride along into
/// the manifest untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetRow {
    /// Unique article key used for the page path.
    pub articleid: String,
    /// When the row was added; orders blog pages newest-first.
    pub dateadded: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publishdate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relativepopularity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl SheetRow {
    /// Long-form display date, e.g. `Tuesday Mar 12, 2024`.
    pub fn display_date(&self) -> String {
        self.dateadded.format("%A %b %d, %Y").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_row_parses_with_sparse_columns() {
        let json = r#"{
            "articleid": "341",
            "dateadded": "2024-03-12T08:00:00Z",
            "title": "A linked article",
            "url": "https://example.com/a"
        }"#;

        let row: SheetRow = serde_json::from_str(json).expect("deserialize");
        assert_eq!(row.articleid, "341");
        assert_eq!(row.title.as_deref(), Some("A linked article"));
        assert!(row.author.is_none());
        assert!(row.popularity.is_none());
    }

    #[test]
    fn sheet_row_display_date_is_long_form() {
        let row: SheetRow = serde_json::from_str(
            r#"{ "articleid": "1", "dateadded": "2024-03-12T08:00:00Z" }"#,
        )
        .expect("deserialize");
        assert_eq!(row.display_date(), "Tuesday Mar 12, 2024");
    }

    #[test]
    fn query_outcome_constructors() {
        let ok: QueryOutcome<ProductRecord> = QueryOutcome::ok(vec![]);
        assert!(ok.errors.is_empty());

        let failed: QueryOutcome<ProductRecord> =
            QueryOutcome::failed(vec!["engine exploded".into()]);
        assert!(failed.data.is_empty());
        assert_eq!(failed.errors.len(), 1);
    }
}
