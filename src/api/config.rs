//! Server configuration.
//!
//! Upload/output locations, the upload size cap and the default CRS pair
//! are concerns of the HTTP service, never of the conversion core — the
//! core receives field names and CRS codes as explicit parameters. Values
//! come from the environment (a `.env` file is honored when present):
//!
//! | Variable             | Default     |
//! |----------------------|-------------|
//! | `PNZED_UPLOAD_DIR`   | `uploads`   |
//! | `PNZED_OUTPUT_DIR`   | `outputs`   |
//! | `PNZED_MAX_UPLOAD_MB`| `16`        |
//! | `PNZED_SOURCE_CRS`   | `EPSG:4326` |
//! | `PNZED_TARGET_CRS`   | `EPSG:6543` |

use std::env;
use std::path::PathBuf;

use crate::models::CrsId;

/// Runtime configuration for the HTTP service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Where uploads are written while a conversion runs.
    pub upload_dir: PathBuf,
    /// Where converted files are written and served from.
    pub output_dir: PathBuf,
    /// Maximum accepted request body size in bytes.
    pub max_upload_bytes: usize,
    /// Default source CRS when a request does not override it.
    pub default_source_crs: CrsId,
    /// Default target CRS when a request does not override it.
    pub default_target_crs: CrsId,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            output_dir: PathBuf::from("outputs"),
            max_upload_bytes: 16 * 1024 * 1024,
            default_source_crs: CrsId::new("EPSG:4326"),
            default_target_crs: CrsId::new("EPSG:6543"),
        }
    }
}

impl ServerConfig {
    /// Build the configuration from the environment, falling back to the
    /// defaults above.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let max_upload_bytes = env::var("PNZED_MAX_UPLOAD_MB")
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .map(|mb| mb * 1024 * 1024)
            .unwrap_or(defaults.max_upload_bytes);

        Self {
            upload_dir: env::var("PNZED_UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            output_dir: env::var("PNZED_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            max_upload_bytes,
            default_source_crs: env::var("PNZED_SOURCE_CRS")
                .map(CrsId::new)
                .unwrap_or(defaults.default_source_crs),
            default_target_crs: env::var("PNZED_TARGET_CRS")
                .map(CrsId::new)
                .unwrap_or(defaults.default_target_crs),
        }
    }

    /// Create the upload and output directories if they do not exist.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.upload_dir)?;
        std::fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.output_dir, PathBuf::from("outputs"));
        assert_eq!(config.max_upload_bytes, 16 * 1024 * 1024);
        assert_eq!(config.default_source_crs, CrsId::new("EPSG:4326"));
        assert_eq!(config.default_target_crs, CrsId::new("EPSG:6543"));
    }

    #[test]
    fn test_ensure_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            upload_dir: dir.path().join("up"),
            output_dir: dir.path().join("out"),
            ..ServerConfig::default()
        };

        config.ensure_dirs().unwrap();
        assert!(config.upload_dir.is_dir());
        assert!(config.output_dir.is_dir());
    }
}
