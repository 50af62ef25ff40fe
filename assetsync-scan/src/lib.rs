//! Local asset inventory for `assetsync-scan`.
//!
//! `scan(source, pattern)` walks the source tree, keeps every file whose
//! relative key matches the glob pattern, and infers the content type and
//! content encoding each object should be served with. Encodings come from a
//! fixed suffix table; the content type is looked up on the name with that
//! suffix stripped, so `app.js.gz` is `gzip`-encoded JavaScript.

use std::path::{Component, Path, PathBuf};

use assetsync_core::types::{LocalFile, LocalInventory, ObjectKey};
use globset::{GlobBuilder, GlobMatcher};
use thiserror::Error;
use walkdir::WalkDir;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Errors from the local scan.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("source directory not found: {path}")]
    SourceNotFound { path: PathBuf },

    #[error("invalid pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("failed walking source tree: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("path is not valid UTF-8: {path}")]
    NonUtf8Path { path: PathBuf },
}

/// Compression suffixes recognised on asset names.
const ENCODINGS: &[(&str, &str)] = &[(".gz", "gzip"), (".br", "br"), (".zz", "deflate")];

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build the local inventory for every file under `source` whose key matches
/// `pattern`.
///
/// `*` does not cross `/`; `**` spans directories, so the default `**/*`
/// matches every file.
pub fn scan(source: &Path, pattern: &str) -> Result<LocalInventory, ScanError> {
    if !source.is_dir() {
        return Err(ScanError::SourceNotFound {
            path: source.to_path_buf(),
        });
    }
    let matcher = compile(pattern)?;

    let mut files = LocalInventory::new();
    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry?;
        let path = entry.path();
        // Symlinks to files are published; symlinked directories are not walked.
        if entry.file_type().is_dir() || !path.is_file() {
            continue;
        }

        let Ok(rel) = path.strip_prefix(source) else {
            tracing::debug!("skipping {}: outside source root", path.display());
            continue;
        };
        let key = object_key(rel)?;
        if !matcher.is_match(key.as_str()) {
            continue;
        }

        let (content_type, content_encoding) = infer_content(key.as_str());
        files.insert(
            key.clone(),
            LocalFile {
                key,
                path: path.to_path_buf(),
                content_type,
                content_encoding,
            },
        );
    }

    tracing::info!("Found {} files", files.len());
    Ok(files)
}

/// Infer `(content_type, content_encoding)` for an object name.
pub fn infer_content(name: &str) -> (Option<String>, Option<String>) {
    let (stem, encoding) = strip_encoding(name);
    let content_type = Path::new(stem)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| mime_guess::from_ext(ext).first_raw())
        .map(str::to_string);
    (content_type, encoding.map(str::to_string))
}

/// Split a recognised compression suffix off `name`.
///
/// A bare suffix (`.gz` with nothing before it) is treated as a plain name.
pub fn strip_encoding(name: &str) -> (&str, Option<&'static str>) {
    for (suffix, encoding) in ENCODINGS {
        if let Some(stem) = name.strip_suffix(suffix) {
            let file_stem = stem.rsplit('/').next().unwrap_or(stem);
            if !file_stem.is_empty() {
                return (stem, Some(encoding));
            }
        }
    }
    (name, None)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn compile(pattern: &str) -> Result<GlobMatcher, ScanError> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|source| ScanError::Pattern {
            pattern: pattern.to_string(),
            source,
        })
}

/// Join the normal components of `rel` with `/`, independent of platform.
fn object_key(rel: &Path) -> Result<ObjectKey, ScanError> {
    let mut parts = Vec::new();
    for component in rel.components() {
        if let Component::Normal(part) = component {
            let part = part.to_str().ok_or_else(|| ScanError::NonUtf8Path {
                path: rel.to_path_buf(),
            })?;
            parts.push(part);
        }
    }
    Ok(ObjectKey::from(parts.join("/")))
}
