//! ホストのルートから設定を組み立てる

use std::path::Path;

use jsonc_parser::ParseOptions;
use serde_json::Value;

use super::{
    ConfigError,
    RuntimeSettings,
};

/// Settings file looked up in the host root.
pub const CONFIG_FILE_NAME: &str = ".locale-runtime.json";

impl RuntimeSettings {
    /// Validated settings for an optional host root.
    ///
    /// Without a root, or when the root has no settings file, the defaults apply.
    pub fn resolve(root: Option<&Path>) -> Result<Self, ConfigError> {
        let settings = match root {
            Some(root) => Self::read_root(root)?,
            None => Self::default(),
        };

        settings.validate().map_err(ConfigError::ValidationErrors)?;
        tracing::debug!(
            storage_key = %settings.storage_key,
            expiry_ms = settings.expiry_ms,
            locales = settings.supported_locales.len(),
            "Runtime settings resolved"
        );
        Ok(settings)
    }

    /// Reads `.locale-runtime.json` under `root`, unvalidated.
    ///
    /// The file may carry comments and trailing commas, like the dictionaries.
    fn read_root(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILE_NAME);

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No settings file; using defaults");
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        let parse_error = |message: String| ConfigError::Parse { path: path.clone(), message };
        let value = jsonc_parser::parse_to_serde_value(&content, &ParseOptions::default())
            .map_err(|e| parse_error(e.to_string()))?
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
        let settings = serde_json::from_value(value).map_err(|e| parse_error(e.to_string()))?;

        tracing::debug!(path = %path.display(), "Loaded settings file");
        Ok(settings)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use rstest::*;
    use tempfile::TempDir;

    use super::*;
    use crate::config::DEFAULT_STORAGE_KEY;

    /// 設定ファイルを書いたホストルート
    fn root_with(content: &str) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILE_NAME), content).unwrap();
        temp_dir
    }

    /// resolve: ルートなしはデフォルト
    #[rstest]
    fn resolve_without_root_uses_defaults() {
        let settings = RuntimeSettings::resolve(None).unwrap();

        assert_eq!(settings, RuntimeSettings::default());
    }

    /// resolve: 設定ファイルがないルートはデフォルト
    #[rstest]
    fn resolve_root_without_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();

        let settings = RuntimeSettings::resolve(Some(temp_dir.path())).unwrap();

        assert_eq!(settings.storage_key, DEFAULT_STORAGE_KEY);
    }

    /// resolve: コメントと末尾カンマを許す
    #[rstest]
    fn resolve_reads_file_with_comments() {
        let root = root_with(
            r#"{
                // one minute
                "expiryMs": 60000,
                "selectorClass": "picker",
            }"#,
        );

        let settings = RuntimeSettings::resolve(Some(root.path())).unwrap();

        assert_eq!(settings.expiry_ms, 60_000);
        assert_eq!(settings.selector_class, "picker");
        assert_eq!(settings.default_locale, "it");
    }

    /// resolve: 空ファイルはデフォルト
    #[rstest]
    fn resolve_empty_file_uses_defaults() {
        let root = root_with("");

        let settings = RuntimeSettings::resolve(Some(root.path())).unwrap();

        assert_eq!(settings, RuntimeSettings::default());
    }

    /// resolve: 構文エラーはファイルパス付き
    #[rstest]
    #[case::syntax("{ \"expiryMs\": }")]
    #[case::wrong_type(r#"{ "expiryMs": "soon" }"#)]
    fn resolve_reports_parse_errors_with_path(#[case] content: &str) {
        let root = root_with(content);

        let result = RuntimeSettings::resolve(Some(root.path()));

        let expected = root.path().join(CONFIG_FILE_NAME);
        assert!(matches!(
            result,
            Err(ConfigError::Parse { path, message }) if path == expected && !message.is_empty()
        ));
    }

    /// resolve: 読めたが不正な設定は検証エラー
    #[rstest]
    fn resolve_validates_loaded_settings() {
        let root = root_with(r#"{"defaultLocale": "fr"}"#);

        let result = RuntimeSettings::resolve(Some(root.path()));

        assert!(matches!(result, Err(ConfigError::ValidationErrors(errors)) if errors.len() == 1));
    }

    /// resolve: ディレクトリは読み込みエラー
    #[rstest]
    fn resolve_reports_unreadable_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join(CONFIG_FILE_NAME)).unwrap();

        let result = RuntimeSettings::resolve(Some(temp_dir.path()));

        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
