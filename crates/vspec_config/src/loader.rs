//! Reading and validating `vspec.toml`.

use crate::error::ConfigError;
use crate::types::SpecConfig;
use std::path::Path;

/// Loads and validates the configuration at `path`.
///
/// Relative `include_dirs` are resolved against the directory containing the
/// file, so a config can be used from any working directory.
pub fn load_config(path: &Path) -> Result<SpecConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config = load_config_from_str(&content)?;
    if let Some(base) = path.parent() {
        for dir in &mut config.include_dirs {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
    }
    Ok(config)
}

/// Parses and validates configuration text.
pub fn load_config_from_str(content: &str) -> Result<SpecConfig, ConfigError> {
    let config: SpecConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &SpecConfig) -> Result<(), ConfigError> {
    if let Some(top) = &config.top {
        if top.trim().is_empty() {
            return Err(ConfigError::Validation("`top` must not be empty".into()));
        }
    }
    for define in &config.defines {
        let name = define.split_once('=').map_or(define.as_str(), |(n, _)| n);
        if name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "define `{define}` has an empty macro name"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn empty_file_is_default() {
        let cfg = load_config_from_str("").unwrap();
        assert_eq!(cfg, SpecConfig::default());
    }

    #[test]
    fn full_config() {
        let cfg = load_config_from_str(
            r#"
            top = "soc_top"
            include_dirs = ["rtl/include"]
            defines = ["SYNTHESIS", "DEPTH=16"]

            [parameters]
            WIDTH = "Data path width in bits"

            [ports]
            clk = "System clock"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.top.as_deref(), Some("soc_top"));
        assert_eq!(cfg.include_dirs, vec![PathBuf::from("rtl/include")]);
        assert_eq!(cfg.defines.len(), 2);
        assert_eq!(cfg.parameter_description("WIDTH"), "Data path width in bits");
    }

    #[test]
    fn empty_top_rejected() {
        let err = load_config_from_str(r#"top = "  ""#).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn empty_define_name_rejected() {
        let err = load_config_from_str(r#"defines = ["=3"]"#).unwrap_err();
        assert!(err.to_string().contains("empty macro name"));
    }

    #[test]
    fn malformed_toml() {
        let err = load_config_from_str("top = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn include_dirs_relative_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vspec.toml");
        std::fs::write(&path, "include_dirs = [\"inc\", \"/abs/inc\"]\n").unwrap();
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.include_dirs[0], dir.path().join("inc"));
        assert_eq!(cfg.include_dirs[1], PathBuf::from("/abs/inc"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/no/such/vspec.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
