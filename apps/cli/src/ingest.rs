//! Host-emulation boundary for the CLI.
//!
//! Everything the build hooks expect the host to provide lives here:
//! content-tree ingestion into a node index, the file-backed data source
//! answering the three page queries, and the manifest-writing page sink.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument, warn};

use siteforge_nodes::{DeriveOptions, NodeLookup, on_create_node};
use siteforge_pages::{
    DataSource, MarkdownPageNode, PageSink, ProductRecord, QueryOutcome, SheetRow,
};
use siteforge_shared::{
    ContentNode, FileNode, Frontmatter, NodeId, NodeKind, PageManifest, PageRequest,
    RESOLVABLE_EXTENSIONS, Result, SiteforgeError,
};

// ---------------------------------------------------------------------------
// Node index
// ---------------------------------------------------------------------------

/// By-id store of ingested file nodes.
#[derive(Debug, Default)]
pub(crate) struct FileStore {
    files: HashMap<NodeId, FileNode>,
}

impl NodeLookup for FileStore {
    fn file_node(&self, id: &NodeId) -> Option<&FileNode> {
        self.files.get(id)
    }
}

/// The result of walking a content tree: every file node plus the
/// content nodes created from them.
#[derive(Debug, Default)]
pub(crate) struct Ingested {
    pub files: FileStore,
    pub nodes: Vec<ContentNode>,
}

impl Ingested {
    /// Number of ingested file nodes.
    pub fn file_count(&self) -> usize {
        self.files.files.len()
    }

    /// Number of Markdown content nodes.
    pub fn markdown_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Markdown)
            .count()
    }
}

// ---------------------------------------------------------------------------
// Ingestion
// ---------------------------------------------------------------------------

/// Walk a content tree and build the node index.
///
/// Markdown files become Markdown content nodes backed by file nodes;
/// files with a resolvable extension become data nodes; everything else
/// is indexed as a file node only. The walk is depth-first with sorted
/// directory entries so node order is stable across builds.
#[instrument(skip_all, fields(content_dir = %content_dir.display()))]
pub(crate) fn ingest_content(content_dir: &Path) -> Result<Ingested> {
    let mut ingested = Ingested::default();
    visit_dir(content_dir, content_dir, &mut ingested)?;

    debug!(
        files = ingested.file_count(),
        nodes = ingested.nodes.len(),
        "content tree ingested"
    );

    Ok(ingested)
}

fn visit_dir(dir: &Path, root: &Path, ingested: &mut Ingested) -> Result<()> {
    let mut entries: Vec<_> = fs::read_dir(dir)
        .map_err(|e| SiteforgeError::io(dir, e))?
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| SiteforgeError::io(dir, e))?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = entry.path();
        if path.is_dir() {
            visit_dir(&path, root, ingested)?;
        } else {
            ingest_file(&path, root, ingested)?;
        }
    }

    Ok(())
}

fn ingest_file(path: &Path, root: &Path, ingested: &mut Ingested) -> Result<()> {
    let relative_path = relative_path(path, root)?;
    let bytes = fs::read(path).map_err(|e| SiteforgeError::io(path, e))?;

    let content_hash = {
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        format!("{:x}", hasher.finalize())
    };

    let file = FileNode {
        id: NodeId::new(),
        relative_path,
        content_hash,
    };

    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase());

    match extension.as_deref() {
        Some("md" | "markdown") => {
            let source = String::from_utf8(bytes).map_err(|e| {
                SiteforgeError::parse(format!("{}: not valid UTF-8: {e}", path.display()))
            })?;
            let frontmatter = extract_frontmatter(&source, path)?;

            ingested.nodes.push(ContentNode {
                id: NodeId::new(),
                kind: NodeKind::Markdown,
                parent: Some(file.id),
                frontmatter,
                fields: Default::default(),
            });
        }
        Some(ext) if RESOLVABLE_EXTENSIONS.contains(&format!(".{ext}").as_str()) => {
            ingested.nodes.push(ContentNode {
                id: NodeId::new(),
                kind: NodeKind::Data,
                parent: Some(file.id),
                frontmatter: Frontmatter::default(),
                fields: Default::default(),
            });
        }
        _ => {}
    }

    ingested.files.files.insert(file.id, file);
    Ok(())
}

/// Build the `/`-separated path of a file relative to the content root.
fn relative_path(path: &Path, root: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).map_err(|_| {
        SiteforgeError::validation(format!(
            "{} is outside the content root {}",
            path.display(),
            root.display()
        ))
    })?;

    Ok(relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}

/// Split a `---` fenced YAML block off the head of a Markdown document.
///
/// Documents without a leading fence get default (empty) frontmatter; a
/// fence that never closes is a parse error.
fn extract_frontmatter(source: &str, path: &Path) -> Result<Frontmatter> {
    let mut lines = source.lines();
    if lines.next().map(str::trim_end) != Some("---") {
        return Ok(Frontmatter::default());
    }

    let mut block = String::new();
    for line in lines {
        if line.trim_end() == "---" {
            if block.trim().is_empty() {
                return Ok(Frontmatter::default());
            }
            return serde_yaml_ng::from_str(&block).map_err(|e| {
                SiteforgeError::parse(format!("{}: invalid frontmatter: {e}", path.display()))
            });
        }
        block.push_str(line);
        block.push('\n');
    }

    Err(SiteforgeError::parse(format!(
        "{}: unterminated frontmatter block",
        path.display()
    )))
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// Run the per-node hook over every ingested content node.
/// Returns how many nodes received derived fields.
pub(crate) fn derive_all(ingested: &mut Ingested, opts: &DeriveOptions) -> Result<usize> {
    let files = &ingested.files;
    let mut derived = 0;

    for node in &mut ingested.nodes {
        on_create_node(node, files, opts)?;
        if node.fields.slug.is_some() {
            derived += 1;
        }
    }

    Ok(derived)
}

// ---------------------------------------------------------------------------
// Data source
// ---------------------------------------------------------------------------

/// File-backed host data source: Markdown nodes come from the ingested
/// index, products and sheet rows from JSON feed files.
pub(crate) struct FileSource<'a> {
    ingested: &'a Ingested,
    products_path: PathBuf,
    sheet_path: PathBuf,
}

impl<'a> FileSource<'a> {
    pub fn new(ingested: &'a Ingested, products_path: PathBuf, sheet_path: PathBuf) -> Self {
        Self {
            ingested,
            products_path,
            sheet_path,
        }
    }
}

impl DataSource for FileSource<'_> {
    async fn markdown_nodes(&self, limit: usize) -> QueryOutcome<MarkdownPageNode> {
        let mut data = Vec::new();
        let mut errors = Vec::new();

        for node in self
            .ingested
            .nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Markdown)
            .take(limit)
        {
            match (&node.fields.slug, &node.fields.content_type) {
                (Some(slug), Some(content_type)) if !slug.is_empty() => {
                    data.push(MarkdownPageNode {
                        id: node.id,
                        template: node.frontmatter.template.clone(),
                        title: node.frontmatter.title.clone(),
                        slug: slug.clone(),
                        content_type: content_type.clone(),
                    });
                }
                _ => errors.push(format!(
                    "markdown node {} is missing derived fields",
                    node.id
                )),
            }
        }

        QueryOutcome { data, errors }
    }

    async fn products(&self) -> QueryOutcome<ProductRecord> {
        read_feed(&self.products_path)
    }

    async fn sheet_rows(&self) -> QueryOutcome<SheetRow> {
        read_feed(&self.sheet_path)
    }
}

/// Read a JSON array feed. Failures surface as envelope errors and a
/// warning; callers decide whether to consult them.
fn read_feed<T: DeserializeOwned>(path: &Path) -> QueryOutcome<T> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read feed");
            return QueryOutcome::failed(vec![format!("{}: {e}", path.display())]);
        }
    };

    match serde_json::from_str(&content) {
        Ok(data) => QueryOutcome::ok(data),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to parse feed");
            QueryOutcome::failed(vec![format!("{}: {e}", path.display())])
        }
    }
}

// ---------------------------------------------------------------------------
// Page sink
// ---------------------------------------------------------------------------

/// Collects page requests and writes the build manifest.
#[derive(Debug, Default)]
pub(crate) struct ManifestSink {
    requests: Vec<PageRequest>,
}

impl PageSink for ManifestSink {
    fn create_page(&mut self, request: PageRequest) {
        debug!(path = %request.path, component = %request.component.display(), "create page");
        self.requests.push(request);
    }
}

impl ManifestSink {
    /// Total page requests received so far.
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Write the collected requests as a `pages.json` manifest.
    pub fn write_manifest(&self, path: &Path) -> Result<()> {
        let manifest = PageManifest {
            generated_at: Utc::now(),
            pages: self.requests.clone(),
        };

        let json = serde_json::to_string_pretty(&manifest)
            .map_err(|e| SiteforgeError::validation(format!("manifest serialization: {e}")))?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| SiteforgeError::io(parent, e))?;
            }
        }

        fs::write(path, json).map_err(|e| SiteforgeError::io(path, e))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use siteforge_pages::{CreatePagesOptions, create_pages};

    fn fixtures() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../fixtures")
    }

    fn ingest_fixture_content() -> Ingested {
        ingest_content(&fixtures().join("content")).expect("ingest fixture content")
    }

    fn derived_fixture_content() -> Ingested {
        let mut ingested = ingest_fixture_content();
        derive_all(&mut ingested, &DeriveOptions::default()).expect("derive");
        ingested
    }

    // --- ingestion ---

    #[test]
    fn ingests_markdown_data_and_plain_files() {
        let ingested = ingest_fixture_content();

        assert_eq!(ingested.markdown_count(), 6);
        // site-links.json has a resolvable extension and becomes a data node.
        let data_nodes = ingested
            .nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Data)
            .count();
        assert_eq!(data_nodes, 1);
        // notes.txt is indexed as a file but creates no content node.
        assert_eq!(ingested.file_count(), 8);
    }

    #[test]
    fn frontmatter_is_parsed_from_fenced_block() {
        let ingested = ingest_fixture_content();

        let home = ingested
            .nodes
            .iter()
            .find(|n| n.frontmatter.template.as_deref() == Some("HomePage"))
            .expect("home node");
        assert_eq!(home.frontmatter.title.as_deref(), Some("Home"));
        assert_eq!(home.frontmatter.extra["image"], "/img/banner.png");
    }

    #[test]
    fn file_nodes_carry_stable_content_hashes() {
        let a = ingest_fixture_content();
        let b = ingest_fixture_content();

        let hash = |ingested: &Ingested| {
            let mut hashes: Vec<&str> = ingested
                .files
                .files
                .values()
                .map(|f| f.content_hash.as_str())
                .collect();
            hashes.sort_unstable();
            hashes.join(",")
        };
        assert_eq!(hash(&a), hash(&b));
    }

    #[test]
    fn extract_frontmatter_edge_cases() {
        let path = Path::new("test.md");

        let fm = extract_frontmatter("no frontmatter here\n", path).expect("plain");
        assert_eq!(fm, Frontmatter::default());

        let fm = extract_frontmatter("---\n---\nbody\n", path).expect("empty block");
        assert_eq!(fm, Frontmatter::default());

        let fm =
            extract_frontmatter("---\ntitle: Hello\n---\nbody\n", path).expect("titled");
        assert_eq!(fm.title.as_deref(), Some("Hello"));

        let err = extract_frontmatter("---\ntitle: Hello\nbody\n", path).unwrap_err();
        assert!(err.to_string().contains("unterminated"));
    }

    // --- derivation + markdown query ---

    #[test]
    fn derive_all_attaches_fields_to_every_markdown_node() {
        let ingested = derived_fixture_content();

        for node in ingested.nodes.iter().filter(|n| n.kind == NodeKind::Markdown) {
            assert!(node.fields.slug.is_some(), "node without slug");
            assert!(node.fields.content_type.is_some(), "node without content type");
        }
    }

    #[tokio::test]
    async fn markdown_query_projects_derived_nodes() {
        let ingested = derived_fixture_content();
        let source = FileSource::new(
            &ingested,
            fixtures().join("data/products.fixture.json"),
            fixtures().join("data/sheet.fixture.json"),
        );

        let outcome = source.markdown_nodes(1000).await;
        assert!(outcome.errors.is_empty());

        let slugs: Vec<&str> = outcome.data.iter().map(|n| n.slug.as_str()).collect();
        assert!(slugs.contains(&"/"));
        assert!(slugs.contains(&"/blog/"));
        assert!(slugs.contains(&"/articles/my-first-post/"));
    }

    #[tokio::test]
    async fn markdown_query_respects_limit() {
        let ingested = derived_fixture_content();
        let source = FileSource::new(
            &ingested,
            fixtures().join("data/products.fixture.json"),
            fixtures().join("data/sheet.fixture.json"),
        );

        let outcome = source.markdown_nodes(2).await;
        assert_eq!(outcome.data.len(), 2);
    }

    #[tokio::test]
    async fn underived_nodes_surface_as_query_errors() {
        let ingested = ingest_fixture_content(); // derive_all never ran
        let source = FileSource::new(
            &ingested,
            fixtures().join("data/products.fixture.json"),
            fixtures().join("data/sheet.fixture.json"),
        );

        let outcome = source.markdown_nodes(1000).await;
        assert!(outcome.data.is_empty());
        assert_eq!(outcome.errors.len(), 6);
    }

    // --- feeds ---

    #[tokio::test]
    async fn product_feed_parses() {
        let ingested = derived_fixture_content();
        let source = FileSource::new(
            &ingested,
            fixtures().join("data/products.fixture.json"),
            fixtures().join("data/sheet.fixture.json"),
        );

        let outcome = source.products().await;
        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.data.len(), 2);
        assert_eq!(outcome.data[0].handle, "ginger-kombucha");
    }

    #[tokio::test]
    async fn missing_feed_reports_errors_without_panicking() {
        let ingested = derived_fixture_content();
        let source = FileSource::new(
            &ingested,
            fixtures().join("data/no-such-feed.json"),
            fixtures().join("data/sheet.fixture.json"),
        );

        let outcome = source.products().await;
        assert!(outcome.data.is_empty());
        assert_eq!(outcome.errors.len(), 1);
    }

    // --- end to end ---

    #[tokio::test]
    async fn build_produces_expected_page_manifest() {
        let ingested = derived_fixture_content();
        let source = FileSource::new(
            &ingested,
            fixtures().join("data/products.fixture.json"),
            fixtures().join("data/sheet.fixture.json"),
        );
        let mut sink = ManifestSink::default();

        let result = create_pages(
            &source,
            &mut sink,
            &CreatePagesOptions {
                templates_dir: PathBuf::from("src/templates"),
            },
        )
        .await
        .expect("create pages");

        // articles/my-first-post + pages/{home,about}; blog.md is the
        // reserved blog index and posts/ is reserved for the sheet.
        assert_eq!(result.markdown_pages, 3);
        assert_eq!(result.product_pages, 2);
        assert_eq!(result.blog_pages, 2);

        let paths: Vec<&str> = sink.requests.iter().map(|r| r.path.as_str()).collect();
        assert!(paths.contains(&"/"));
        assert!(paths.contains(&"/about-us/"));
        assert!(paths.contains(&"/articles/my-first-post/"));
        assert!(!paths.contains(&"/blog/"));
        assert!(paths.contains(&"/product/ginger-kombucha/"));
        assert!(paths.contains(&"/product/original-kombucha/"));
        // Sheet pages come out newest first.
        let blog_paths: Vec<&str> = paths
            .iter()
            .filter(|p| p.starts_with("/blog/"))
            .copied()
            .collect();
        assert_eq!(blog_paths, vec!["/blog/102/", "/blog/87/"]);
    }

    #[tokio::test]
    async fn manifest_writes_and_reads_back() {
        let ingested = derived_fixture_content();
        let source = FileSource::new(
            &ingested,
            fixtures().join("data/products.fixture.json"),
            fixtures().join("data/sheet.fixture.json"),
        );
        let mut sink = ManifestSink::default();

        create_pages(
            &source,
            &mut sink,
            &CreatePagesOptions {
                templates_dir: PathBuf::from("src/templates"),
            },
        )
        .await
        .expect("create pages");

        let out = std::env::temp_dir().join(format!("siteforge-test-{}.json", NodeId::new()));
        sink.write_manifest(&out).expect("write manifest");

        let content = fs::read_to_string(&out).expect("read manifest");
        let manifest: PageManifest = serde_json::from_str(&content).expect("parse manifest");
        assert_eq!(manifest.pages.len(), sink.len());

        let _ = fs::remove_file(&out);
    }
}
