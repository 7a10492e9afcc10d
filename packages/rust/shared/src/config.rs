//! Site configuration for siteforge.
//!
//! Config lives at `siteforge.toml` in the site root, next to the content
//! it describes. CLI flags override config file values, which override
//! defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SiteforgeError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "siteforge.toml";

// ---------------------------------------------------------------------------
// Config structs (matching siteforge.toml schema)
// ---------------------------------------------------------------------------

/// Top-level site config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Directory layout.
    #[serde(default)]
    pub paths: PathsConfig,

    /// External data sources.
    #[serde(default)]
    pub sources: SourcesConfig,
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Content tree the ingester walks.
    #[serde(default = "default_content_dir")]
    pub content_dir: String,

    /// Static asset root frontmatter image paths resolve into.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    /// Directory page templates are resolved from.
    #[serde(default = "default_templates_dir")]
    pub templates_dir: String,

    /// Where the build writes the page manifest.
    #[serde(default = "default_manifest")]
    pub manifest: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            content_dir: default_content_dir(),
            static_dir: default_static_dir(),
            templates_dir: default_templates_dir(),
            manifest: default_manifest(),
        }
    }
}

fn default_content_dir() -> String {
    "content".into()
}
fn default_static_dir() -> String {
    "static".into()
}
fn default_templates_dir() -> String {
    "src/templates".into()
}
fn default_manifest() -> String {
    "pages.json".into()
}

/// `[sources]` section — feed files backing the non-Markdown record sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Commerce product feed (JSON array of product records).
    #[serde(default = "default_products")]
    pub products: String,

    /// Spreadsheet export (JSON array of sheet rows).
    #[serde(default = "default_sheet")]
    pub sheet: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            products: default_products(),
            sheet: default_sheet(),
        }
    }
}

fn default_products() -> String {
    "data/products.json".into()
}
fn default_sheet() -> String {
    "data/sheet.json".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config file inside a site root.
pub fn config_file_path(site_root: &Path) -> PathBuf {
    site_root.join(CONFIG_FILE_NAME)
}

/// Load the site config from a site root. Returns defaults if the file
/// does not exist.
pub fn load_config(site_root: &Path) -> Result<SiteConfig> {
    let path = config_file_path(site_root);

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(SiteConfig::default());
    }

    load_config_from(&path)
}

/// Load the site config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<SiteConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SiteforgeError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        SiteforgeError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Write a default config file into the site root.
/// Returns the path to the created file.
pub fn init_config(site_root: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(site_root).map_err(|e| SiteforgeError::io(site_root, e))?;

    let path = config_file_path(site_root);
    let config = SiteConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| SiteforgeError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SiteforgeError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = SiteConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("content_dir"));
        assert!(toml_str.contains("src/templates"));
    }

    #[test]
    fn config_roundtrip() {
        let config = SiteConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: SiteConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.paths.content_dir, "content");
        assert_eq!(parsed.sources.products, "data/products.json");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[paths]
templates_dir = "theme/templates"

[sources]
sheet = "exports/links.json"
"#;
        let config: SiteConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.paths.templates_dir, "theme/templates");
        assert_eq!(config.paths.content_dir, "content");
        assert_eq!(config.sources.sheet, "exports/links.json");
        assert_eq!(config.sources.products, "data/products.json");
    }

    #[test]
    fn fixture_config_validates() {
        let fixture = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures/site.fixture.toml");
        let config = load_config_from(&fixture).expect("load fixture config");
        assert_eq!(config.paths.content_dir, "content");
        assert_eq!(config.sources.products, "data/products.fixture.json");
    }

    #[test]
    fn missing_config_falls_back_to_defaults() {
        let config =
            load_config(Path::new("/definitely/not/a/site/root")).expect("load defaults");
        assert_eq!(config.paths.manifest, "pages.json");
    }
}
