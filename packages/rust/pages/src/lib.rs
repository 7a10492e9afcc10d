//! Page planning and creation.
//!
//! One build-time pass over three record sets — Markdown nodes, commerce
//! products, spreadsheet rows — emitting one page-creation request per
//! qualifying record. The query surface and page registry are host
//! collaborators behind traits; the planning itself is pure.

mod pipeline;
mod query;
mod stages;

pub use pipeline::{CreatePagesOptions, CreatePagesResult, PageSink, create_pages};
pub use query::{DataSource, MarkdownPageNode, ProductRecord, QueryOutcome, SheetRow};
pub use stages::{
    MARKDOWN_QUERY_LIMIT, plan_blog_pages, plan_markdown_pages, plan_product_pages,
};
