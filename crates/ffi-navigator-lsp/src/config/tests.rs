//! Tests for the Configuration Engine
//!
//! Covers TOML parsing, defaults for missing sections and loading from a
//! workspace root.

use super::*;

// ==================== SETTINGS PARSING TESTS ====================

mod parsing_tests {
    use super::*;

    #[test]
    fn test_load_config_from_toml() {
        let toml = r#"
[workspace]
scan_dirs = ["src", "python/tvm"]
extensions = ["py", "cc"]

[dialects]
enabled = ["tvm"]
"#;

        let settings = Settings::from_toml_str(toml).unwrap();

        assert_eq!(settings.workspace.scan_dirs, vec!["src", "python/tvm"]);
        assert_eq!(settings.workspace.extensions, vec!["py", "cc"]);
        assert_eq!(settings.dialects.enabled, vec!["tvm"]);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let toml = r#"
[dialects]
enabled = ["torch"]
"#;

        let settings = Settings::from_toml_str(toml).unwrap();

        assert_eq!(settings.workspace, WorkspaceSettings::default());
        assert_eq!(settings.dialects.enabled, vec!["torch"]);
    }

    #[test]
    fn test_partial_section_uses_field_defaults() {
        let toml = r#"
[workspace]
extensions = ["py"]
"#;

        let settings = Settings::from_toml_str(toml).unwrap();

        assert_eq!(settings.workspace.scan_dirs, vec!["src", "include", "python"]);
        assert_eq!(settings.workspace.extensions, vec!["py"]);
    }

    #[test]
    fn test_empty_config() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let result = Settings::from_toml_str("[workspace\nscan_dirs = 3");
        assert!(result.is_err());

        let wrong_type = Settings::from_toml_str("[workspace]\nscan_dirs = \"src\"");
        assert!(wrong_type.is_err());
    }
}

// ==================== LOADING TESTS ====================

mod loading_tests {
    use super::*;
    use crate::error::NavigatorError;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(dir.path()).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_load_from_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[workspace]\nscan_dirs = [\"lib\"]\n",
        )
        .unwrap();

        let settings = Settings::load(dir.path()).unwrap();
        assert_eq!(settings.workspace.scan_dirs, vec!["lib"]);
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "not = [valid").unwrap();

        let err = Settings::load(dir.path()).unwrap_err();
        assert!(matches!(err, NavigatorError::ConfigParse { .. }));
        assert!(err.to_string().contains(CONFIG_FILE_NAME));
    }
}
