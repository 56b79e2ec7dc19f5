use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SplitpackError};
use crate::event::Language;
use crate::policy::{ArchiveRequest, MIB, SmallFileAction};

/// User-facing run settings. Sizes are whole megabytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub input_file: Option<PathBuf>,
    pub input_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub size_threshold_mb: u64,
    pub large_volume_mb: u64,
    pub small_volume_mb: u64,
    pub process_subdirectories: bool,
    pub small_file_action: SmallFileAction,
    pub password: Option<String>,
    pub compression_level: u8,
    pub language: Language,
    pub jobs: usize,
    pub archiver: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input_file: None,
            input_dir: None,
            output_dir: None,
            size_threshold_mb: 25,
            large_volume_mb: 25,
            small_volume_mb: 25,
            process_subdirectories: false,
            small_file_action: SmallFileAction::Compress,
            password: None,
            compression_level: 1,
            language: Language::En,
            jobs: 1,
            archiver: PathBuf::from("7z"),
        }
    }
}

fn megabytes(name: &str, mb: u64) -> Result<u64> {
    mb.checked_mul(MIB)
        .ok_or_else(|| SplitpackError::InvalidRequest(format!("{name} of {mb} MB is too large")))
}

impl RunConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| SplitpackError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&text).map_err(|e| SplitpackError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Validate and convert to a byte-based request. A file input wins over
    /// a directory input when both are set.
    pub fn resolve(&self) -> Result<ArchiveRequest> {
        let target = self
            .input_file
            .as_ref()
            .filter(|p| !p.as_os_str().is_empty())
            .or(self.input_dir.as_ref().filter(|p| !p.as_os_str().is_empty()))
            .cloned()
            .ok_or(SplitpackError::InputMissing)?;
        let output_dir = self
            .output_dir
            .clone()
            .filter(|p| p.is_dir())
            .ok_or_else(|| SplitpackError::OutputDirectoryMissing {
                path: self.output_dir.clone().unwrap_or_default(),
            })?;

        let req = ArchiveRequest {
            target,
            output_dir,
            size_threshold: megabytes("size threshold", self.size_threshold_mb)?,
            large_volume_size: megabytes("large volume size", self.large_volume_mb)?,
            small_volume_size: megabytes("small volume size", self.small_volume_mb)?,
            process_subdirectories: self.process_subdirectories,
            small_file_action: self.small_file_action,
            password: self.password.clone().filter(|p| !p.is_empty()),
            compression_level: self.compression_level,
        };
        req.validate()?;
        Ok(req)
    }
}
