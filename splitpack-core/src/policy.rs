use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SplitpackError};

pub const MIB: u64 = 1024 * 1024;
pub const MAX_LEVEL: u8 = 9;

/// What to do with a target at or below the size threshold.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmallFileAction {
    #[default]
    Compress,
    SplitCompress,
}

impl std::str::FromStr for SmallFileAction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "compress" => Ok(Self::Compress),
            "split_compress" | "split-compress" => Ok(Self::SplitCompress),
            other => Err(format!("unknown small-file action: {other}")),
        }
    }
}

/// Everything one run needs. Sizes are in bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveRequest {
    pub target: PathBuf,
    pub output_dir: PathBuf,
    pub size_threshold: u64,
    pub large_volume_size: u64,
    pub small_volume_size: u64,
    /// Archive each immediate child directory of `target` on its own.
    pub process_subdirectories: bool,
    pub small_file_action: SmallFileAction,
    /// `None` disables encryption.
    pub password: Option<String>,
    pub compression_level: u8,
}

impl ArchiveRequest {
    pub fn validate(&self) -> Result<()> {
        for (name, v) in [
            ("size threshold", self.size_threshold),
            ("large volume size", self.large_volume_size),
            ("small volume size", self.small_volume_size),
        ] {
            if v == 0 {
                return Err(SplitpackError::InvalidRequest(format!("{name} must be positive")));
            }
        }
        if self.compression_level > MAX_LEVEL {
            return Err(SplitpackError::InvalidRequest(format!(
                "compression level {} outside 0..={MAX_LEVEL}",
                self.compression_level
            )));
        }
        Ok(())
    }

    /// Password with the empty string treated as absent.
    pub fn credential(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SizeClass {
    Small,
    Large,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Plan {
    Single,
    Split { volume_size: u64 },
}

impl Plan {
    pub fn is_split(&self) -> bool {
        matches!(self, Plan::Split { .. })
    }
}

/// Strictly greater than the threshold is large; equal is small.
pub fn size_class(size: u64, threshold: u64) -> SizeClass {
    if size > threshold {
        SizeClass::Large
    } else {
        SizeClass::Small
    }
}

/// Large targets always split with the large volume size; small ones follow
/// the configured action.
pub fn classify(size: u64, req: &ArchiveRequest) -> Plan {
    match size_class(size, req.size_threshold) {
        SizeClass::Large => Plan::Split {
            volume_size: req.large_volume_size,
        },
        SizeClass::Small => match req.small_file_action {
            SmallFileAction::Compress => Plan::Single,
            SmallFileAction::SplitCompress => Plan::Split {
                volume_size: req.small_volume_size,
            },
        },
    }
}

/// Whole megabytes in `bytes`, truncated.
pub fn volume_megabytes(bytes: u64) -> u64 {
    bytes / MIB
}

#[cfg(test)]
pub(crate) fn request(action: SmallFileAction) -> ArchiveRequest {
    ArchiveRequest {
        target: PathBuf::from("/in"),
        output_dir: PathBuf::from("/out"),
        size_threshold: 25 * MIB,
        large_volume_size: 50 * MIB,
        small_volume_size: 5 * MIB,
        process_subdirectories: false,
        small_file_action: action,
        password: None,
        compression_level: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn large_always_splits_with_large_volume() {
        for action in [SmallFileAction::Compress, SmallFileAction::SplitCompress] {
            let req = request(action);
            for size in [req.size_threshold + 1, req.size_threshold * 4, u64::MAX] {
                assert_eq!(
                    classify(size, &req),
                    Plan::Split {
                        volume_size: 50 * MIB
                    }
                );
            }
        }
    }

    #[test]
    fn small_follows_action() {
        let compress = request(SmallFileAction::Compress);
        let split = request(SmallFileAction::SplitCompress);
        for size in [0, 1, MIB, compress.size_threshold - 1] {
            assert_eq!(classify(size, &compress), Plan::Single);
            assert_eq!(
                classify(size, &split),
                Plan::Split {
                    volume_size: 5 * MIB
                }
            );
        }
    }

    #[test]
    fn threshold_itself_is_small() {
        let req = request(SmallFileAction::Compress);
        assert_eq!(size_class(req.size_threshold, req.size_threshold), SizeClass::Small);
        assert_eq!(classify(req.size_threshold, &req), Plan::Single);
        assert_eq!(size_class(req.size_threshold + 1, req.size_threshold), SizeClass::Large);
    }

    #[test]
    fn megabytes_truncate() {
        assert_eq!(volume_megabytes(26_214_400), 25);
        assert_eq!(volume_megabytes(26_214_401), 25);
        assert_eq!(volume_megabytes(27_262_975), 25);
        assert_eq!(volume_megabytes(MIB - 1), 0);
    }

    #[test]
    fn validate_rejects_zero_sizes_and_high_levels() {
        let mut req = request(SmallFileAction::Compress);
        assert!(req.validate().is_ok());
        req.small_volume_size = 0;
        assert!(matches!(req.validate(), Err(SplitpackError::InvalidRequest(_))));
        let mut req = request(SmallFileAction::Compress);
        req.compression_level = 10;
        assert!(req.validate().is_err());
        req.compression_level = 9;
        assert!(req.validate().is_ok());
    }

    #[test]
    fn empty_password_is_no_credential() {
        let mut req = request(SmallFileAction::Compress);
        req.password = Some(String::new());
        assert_eq!(req.credential(), None);
        req.password = Some("s3cret".into());
        assert_eq!(req.credential(), Some("s3cret"));
    }

    #[test]
    fn action_names() {
        assert_eq!("split_compress".parse::<SmallFileAction>().unwrap(), SmallFileAction::SplitCompress);
        assert_eq!("compress".parse::<SmallFileAction>().unwrap(), SmallFileAction::Compress);
        assert!("zip".parse::<SmallFileAction>().is_err());
    }
}
