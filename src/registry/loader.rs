//! Dictionary parsing and translation file discovery.

use std::collections::HashMap;
use std::path::{
    Path,
    PathBuf,
};

use globset::{
    Glob,
    GlobSetBuilder,
};
use ignore::WalkBuilder;
use jsonc_parser::ParseOptions;
use serde_json::Value;

use super::{
    RegistryBuilder,
    RegistryError,
};
use crate::config::RuntimeSettings;

/// Parses JSON with comments, trailing commas and unquoted property names.
///
/// An empty document parses as an empty object.
pub fn parse_jsonc(text: &str) -> Result<Value, RegistryError> {
    jsonc_parser::parse_to_serde_value(text, &ParseOptions::default())
        .map(|value| value.unwrap_or_else(|| Value::Object(serde_json::Map::new())))
        .map_err(|e| RegistryError::Parse(e.to_string()))
}

/// Flatten nested JSON object into separator-joined key map.
///
/// Array elements use `[index]` notation. Non-string leaves are dropped.
///
/// # Examples
/// ```
/// use serde_json::json;
/// use page_locale_runtime::registry::flatten_json;
///
/// let json = json!({
///     "nav": {
///         "home": "Home",
///         "call": "Call"
///     }
/// });
///
/// let flattened = flatten_json(&json, ".", None);
/// assert_eq!(flattened.get("nav.home"), Some(&"Home".to_string()));
/// assert_eq!(flattened.get("nav.call"), Some(&"Call".to_string()));
/// ```
#[must_use]
pub fn flatten_json(
    json: &Value,
    separator: &str,
    prefix: Option<&str>,
) -> HashMap<String, String> {
    let mut result = HashMap::new();
    flatten_json_value(json, separator, prefix, &mut result);
    result
}

/// Recursive step of [`flatten_json`].
fn flatten_json_value(
    json: &Value,
    separator: &str,
    prefix: Option<&str>,
    result: &mut HashMap<String, String>,
) {
    match json {
        Value::Object(map) => {
            for (key, value) in map {
                let full_key =
                    prefix.map_or_else(|| key.clone(), |p| format!("{p}{separator}{key}"));
                flatten_json_value(value, separator, Some(&full_key), result);
            }
        }
        Value::Array(arr) => {
            for (index, value) in arr.iter().enumerate() {
                let full_key =
                    prefix.map_or_else(|| format!("[{index}]"), |p| format!("{p}[{index}]"));
                flatten_json_value(value, separator, Some(&full_key), result);
            }
        }
        Value::String(s) => {
            if let Some(key) = prefix {
                result.insert(key.to_string(), s.clone());
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

/// Reads a key-major dictionary file into `builder`.
pub fn load_dictionary_file(
    builder: &mut RegistryBuilder,
    path: &Path,
) -> Result<(), RegistryError> {
    let content = read_file(path)?;
    let table = parse_jsonc(&content).map_err(|e| e.in_file(path))?;
    builder.add_key_table(&table).map_err(|e| e.in_file(path))?;
    tracing::debug!(path = %path.display(), "Loaded dictionary file");
    Ok(())
}

/// Finds files under `root` matching `pattern` (relative to `root`).
pub fn discover_translation_files(
    root: &Path,
    pattern: &str,
) -> Result<Vec<PathBuf>, RegistryError> {
    let glob = Glob::new(pattern)
        .map_err(|source| RegistryError::InvalidPattern { pattern: pattern.to_string(), source })?;
    let mut builder = GlobSetBuilder::new();
    builder.add(glob);
    let matcher = builder
        .build()
        .map_err(|source| RegistryError::InvalidPattern { pattern: pattern.to_string(), source })?;

    let mut found_files = Vec::new();
    for result in WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(true)
        .git_exclude(true)
        .follow_links(false)
        .build()
    {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!(?err, "Failed to read directory entry");
                continue;
            }
        };

        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let path = entry.path();
        let Ok(relative_path) = path.strip_prefix(root) else {
            continue;
        };
        if matcher.is_match(relative_path) {
            found_files.push(path.to_path_buf());
        }
    }

    found_files.sort();
    Ok(found_files)
}

/// Loads every locale resource file under `root` into `builder`.
///
/// The locale is the file stem (`locales/hi-Latn.json` → `hi-Latn`). Files for
/// locales outside the supported table are skipped. Returns the number of files
/// merged.
pub fn load_translation_files(
    builder: &mut RegistryBuilder,
    root: &Path,
    settings: &RuntimeSettings,
) -> Result<usize, RegistryError> {
    let files = discover_translation_files(root, &settings.translation_files.file_pattern)?;
    let mut loaded = 0;

    for path in files {
        let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        let Some(locale) = settings.supported_locales.find(stem) else {
            tracing::warn!(path = %path.display(), "Skipping translation file for unsupported locale");
            continue;
        };

        let content = read_file(&path)?;
        let tree = parse_jsonc(&content).map_err(|e| e.in_file(&path))?;
        builder.add_locale_tree(locale.as_str(), &tree);
        loaded += 1;
        tracing::debug!(path = %path.display(), %locale, "Loaded translation file");
    }

    tracing::info!(root = %root.display(), files = loaded, "Translation files loaded");
    Ok(loaded)
}

/// Reads a whole file, keeping its path in the error.
fn read_file(path: &Path) -> Result<String, RegistryError> {
    std::fs::read_to_string(path)
        .map_err(|source| RegistryError::Io { path: path.to_path_buf(), source })
}
