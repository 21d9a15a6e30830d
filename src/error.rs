use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum BuilderError {
    #[error("{what} '{name}' not found")]
    NotFound { what: &'static str, name: String },

    #[error("{what} '{name}' already exists")]
    AlreadyExists { what: &'static str, name: String },

    #[error("Asset '{name}' is used by plugins: {}. Use --force to delete anyway.", plugins.join(", "))]
    InUse { name: String, plugins: Vec<String> },

    #[error("Invalid {what} name '{name}': {reason}")]
    InvalidName {
        what: &'static str,
        name: String,
        reason: &'static str,
    },

    #[error("Malformed manifest at {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl BuilderError {
    pub fn not_found(what: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            what,
            name: name.into(),
        }
    }

    pub fn already_exists(what: &'static str, name: impl Into<String>) -> Self {
        Self::AlreadyExists {
            what,
            name: name.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BuilderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_use_lists_every_plugin() {
        let err = BuilderError::InUse {
            name: "reviewer".into(),
            plugins: vec!["core".into(), "extras".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("reviewer"));
        assert!(msg.contains("core, extras"));
        assert!(msg.contains("--force"));
    }

    #[test]
    fn not_found_names_the_kind() {
        let err = BuilderError::not_found("Plugin", "core");
        assert_eq!(err.to_string(), "Plugin 'core' not found");
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: BuilderError = io_err.into();
        assert!(matches!(err, BuilderError::Io(_)));
    }
}
