//! Configuration errors.

/// Errors produced while loading a `vspec.toml` file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The content is not valid TOML or does not match the schema.
    #[error("failed to parse configuration: {0}")]
    Parse(String),

    /// A value parsed but is not acceptable.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let err = ConfigError::Validation("`top` must not be empty".into());
        assert_eq!(
            err.to_string(),
            "invalid configuration: `top` must not be empty"
        );
        let err = ConfigError::Parse("expected `=`".into());
        assert_eq!(err.to_string(), "failed to parse configuration: expected `=`");
    }

    #[test]
    fn io_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ConfigError = io.into();
        assert!(matches!(err, ConfigError::Io(_)));
        assert!(err.to_string().contains("gone"));
    }
}
