//! Frontmatter image-path normalization.
//!
//! Authors write absolute image paths (`/img/photo.png`) that point into
//! the static asset root, but templates resolve paths relative to the
//! content file itself. Each absolute image path in frontmatter is
//! rewritten into a relative path that walks up out of the content tree
//! and into the static directory.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use siteforge_shared::Frontmatter;

use crate::DeriveOptions;

/// Matches a path ending in a known raster or vector image extension.
static IMAGE_EXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(jpe?g|png|gif|webp|avif|svg)$").expect("valid regex")
});

/// Rewrite absolute image paths in frontmatter relative to the content
/// file at `<content_dir>/<file_dir>/...`.
///
/// Walks every frontmatter value, including nested arrays and maps.
/// Values that are not strings, not absolute paths, or not image paths
/// are left untouched.
pub fn normalize_frontmatter_images(
    frontmatter: &mut Frontmatter,
    file_dir: &str,
    opts: &DeriveOptions,
) {
    let depth = component_count(&opts.content_dir) + component_count(file_dir);
    let mut rewritten = 0usize;

    for value in frontmatter.extra.values_mut() {
        rewrite_value(value, depth, &opts.static_dir, &mut rewritten);
    }

    if rewritten > 0 {
        debug!(rewritten, file_dir, "normalized frontmatter image paths");
    }
}

/// Recursively rewrite image-path strings inside a frontmatter value.
fn rewrite_value(value: &mut Value, depth: usize, static_dir: &str, rewritten: &mut usize) {
    match value {
        Value::String(s) => {
            if let Some(relative) = relativize(s, depth, static_dir) {
                *s = relative;
                *rewritten += 1;
            }
        }
        Value::Array(items) => {
            for item in items {
                rewrite_value(item, depth, static_dir, rewritten);
            }
        }
        Value::Object(map) => {
            for nested in map.values_mut() {
                rewrite_value(nested, depth, static_dir, rewritten);
            }
        }
        _ => {}
    }
}

/// Rewrite one absolute image path, or return `None` if it should stay
/// as written. Protocol-relative URLs (`//cdn...`) are never touched.
fn relativize(path: &str, depth: usize, static_dir: &str) -> Option<String> {
    if !path.starts_with('/') || path.starts_with("//") {
        return None;
    }
    if !IMAGE_EXT_RE.is_match(path) {
        return None;
    }

    let ups = "../".repeat(depth);
    Some(format!("{ups}{static_dir}{path}"))
}

fn component_count(dir: &str) -> usize {
    dir.split('/').filter(|c| !c.is_empty()).count()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
