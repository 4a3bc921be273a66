//! Resolution of document paths relative to the opened base directory

use super::error::CoreError;

/// Replace Windows separators with forward slashes
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Resolve `full_path` relative to `base_path`.
///
/// Both inputs may mix `/` and `\`. The base must be a literal prefix of the
/// full path once separators are normalized; no case folding or segment-wise
/// matching is attempted. The result always starts with exactly one `/`.
pub fn resolve(full_path: &str, base_path: &str) -> Result<String, CoreError> {
    let full = normalize_separators(full_path);
    let base = normalize_separators(base_path);

    let Some(rest) = full.strip_prefix(base.as_str()) else {
        return Err(CoreError::PathMismatch {
            full: full_path.to_string(),
            base: base_path.to_string(),
        });
    };

    Ok(format!("/{}", rest.trim_start_matches('/')))
}
