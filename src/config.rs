use std::path::PathBuf;

use clap::Args;

use crate::store::DEFAULT_STORAGE_KEY;

/// Storage settings shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct StorageArgs {
    /// Directory holding the file-backed feedback store
    #[arg(long, env = "PULSEVIEW_DATA_DIR", default_value = ".pulseview", global = true)]
    pub data_dir: PathBuf,

    /// Key the feedback blob is stored under
    #[arg(long, env = "PULSEVIEW_STORAGE_KEY", default_value = DEFAULT_STORAGE_KEY, global = true)]
    pub storage_key: String,

    /// Postgres URL; when set, feedback is stored in the database instead of files
    #[arg(long, env = "DATABASE_URL", global = true)]
    pub database_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    File { dir: PathBuf },
    Postgres { url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub backend: StorageBackend,
    pub storage_key: String,
}

impl AppConfig {
    pub fn from_args(args: &StorageArgs) -> Self {
        let backend = match args.database_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => StorageBackend::Postgres {
                url: url.to_string(),
            },
            _ => StorageBackend::File {
                dir: args.data_dir.clone(),
            },
        };

        Self {
            backend,
            storage_key: args.storage_key.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(database_url: Option<&str>) -> StorageArgs {
        StorageArgs {
            data_dir: PathBuf::from("/tmp/pulse"),
            storage_key: "pulseview-feedback".to_string(),
            database_url: database_url.map(str::to_string),
        }
    }

    #[test]
    fn defaults_to_file_backend() {
        let config = AppConfig::from_args(&args(None));
        assert_eq!(
            config.backend,
            StorageBackend::File {
                dir: PathBuf::from("/tmp/pulse")
            }
        );
        assert_eq!(config.storage_key, "pulseview-feedback");
    }

    #[test]
    fn database_url_selects_postgres() {
        let config = AppConfig::from_args(&args(Some("postgres://localhost/pulse")));
        assert_eq!(
            config.backend,
            StorageBackend::Postgres {
                url: "postgres://localhost/pulse".to_string()
            }
        );
    }

    #[test]
    fn blank_database_url_is_ignored() {
        let config = AppConfig::from_args(&args(Some("  ")));
        assert!(matches!(config.backend, StorageBackend::File { .. }));
    }
}
