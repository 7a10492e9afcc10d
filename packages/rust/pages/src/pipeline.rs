//! Page-creation pipeline: three staged queries, one sink.
//!
//! Stages run strictly in order; each stage's query completes before the
//! next stage's query is issued. Page requests are pushed into the sink
//! synchronously as each stage plans them.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{error, info, instrument};

use siteforge_shared::{PageRequest, Result, SiteforgeError};

use crate::query::DataSource;
use crate::stages::{
    MARKDOWN_QUERY_LIMIT, plan_blog_pages, plan_markdown_pages, plan_product_pages,
};

/// Options for a page-creation run.
#[derive(Debug, Clone)]
pub struct CreatePagesOptions {
    /// Directory template components resolve from.
    pub templates_dir: PathBuf,
}

/// Summary of a completed page-creation run.
#[derive(Debug)]
pub struct CreatePagesResult {
    /// Pages created from Markdown nodes.
    pub markdown_pages: usize,
    /// Pages created from product records.
    pub product_pages: usize,
    /// Pages created from sheet rows.
    pub blog_pages: usize,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// The host page registry: receives page-creation requests.
/// Calls are fire-and-forget; the sink owns any buffering or I/O.
pub trait PageSink {
    fn create_page(&mut self, request: PageRequest);
}

/// Run page creation across all three record sets.
///
/// The Markdown query gates everything: if it reports errors they are
/// logged and the run aborts before the product or sheet queries are
/// issued.
#[instrument(skip_all)]
pub async fn create_pages<D: DataSource>(
    source: &D,
    sink: &mut dyn PageSink,
    opts: &CreatePagesOptions,
) -> Result<CreatePagesResult> {
    let start = Instant::now();

    // --- Stage A: Markdown-derived pages ---
    let markdown = source.markdown_nodes(MARKDOWN_QUERY_LIMIT).await;

    if !markdown.errors.is_empty() {
        for err in &markdown.errors {
            error!(%err, "markdown query error");
        }
        return Err(SiteforgeError::Query(format!(
            "markdown query reported {} error(s)",
            markdown.errors.len()
        )));
    }

    let markdown_pages = emit(sink, plan_markdown_pages(&markdown.data, &opts.templates_dir));

    // --- Stage B: commerce product pages ---
    // TODO: consult outcome.errors here and in stage C the way stage A
    // does; today a failed feed silently yields zero pages.
    let products = source.products().await;
    let product_pages = emit(sink, plan_product_pages(&products.data, &opts.templates_dir));

    // --- Stage C: spreadsheet-sourced blog pages ---
    let rows = source.sheet_rows().await;
    let blog_pages = emit(sink, plan_blog_pages(&rows.data, &opts.templates_dir));

    let result = CreatePagesResult {
        markdown_pages,
        product_pages,
        blog_pages,
        elapsed: start.elapsed(),
    };

    info!(
        markdown_pages = result.markdown_pages,
        product_pages = result.product_pages,
        blog_pages = result.blog_pages,
        elapsed_ms = result.elapsed.as_millis(),
        "page creation complete"
    );

    Ok(result)
}

/// Push a batch of requests into the sink, returning how many were sent.
fn emit(sink: &mut dyn PageSink, requests: Vec<PageRequest>) -> usize {
    let count = requests.len();
    for request in requests {
        sink.create_page(request);
    }
    count
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
