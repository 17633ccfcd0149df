use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

const DB_ENV_VAR: &str = "DAYBOOK_DB";

pub struct Config {
    pub db_path: PathBuf,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from("", "", "daybook").context("Could not determine home directory")?;

        let mut config = Self::from_data_dir(proj_dirs.data_dir())?;
        if let Some(path) = std::env::var_os(DB_ENV_VAR).filter(|p| !p.is_empty()) {
            config.db_path = PathBuf::from(path);
        }
        Ok(config)
    }

    /// Use `data_dir` for all state, creating it if needed.
    pub fn from_data_dir(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        Ok(Config {
            db_path: data_dir.join("daybook.db"),
            data_dir: data_dir.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_data_dir_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("daybook");

        let config = Config::from_data_dir(&dir).unwrap();
        assert!(dir.is_dir());
        assert_eq!(config.data_dir, dir);
        assert_eq!(config.db_path, dir.join("daybook.db"));
    }

    #[test]
    fn test_from_data_dir_opens_database() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::from_data_dir(tmp.path()).unwrap();
        daybook_core::db::Database::open(&config.db_path).unwrap();
        assert!(config.db_path.exists());
    }
}
