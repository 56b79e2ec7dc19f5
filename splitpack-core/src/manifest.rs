//! `info.json` sidecar describing the volumes of a split archive.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::error::{Result, SplitpackError};
use crate::invoker::{base_name, discover_parts};

pub const MANIFEST_FILE: &str = "info.json";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PartEntry {
    pub part_number: u32, // 1-based
    pub part_size: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VolumeManifest {
    pub original_file_path: String,
    pub original_file_size: u64,
    pub part_count: usize,
    pub parts: Vec<PartEntry>,
}

impl VolumeManifest {
    /// Build from parts already on disk, numbered in the given order.
    pub fn from_parts(original_path: &Path, original_size: u64, part_paths: &[PathBuf]) -> std::io::Result<Self> {
        let parts = part_paths
            .iter()
            .enumerate()
            .map(|(i, p)| {
                Ok(PartEntry {
                    part_number: i as u32 + 1,
                    part_size: fs::metadata(p)?.len(),
                })
            })
            .collect::<std::io::Result<Vec<_>>>()?;
        Ok(Self {
            original_file_path: original_path.to_string_lossy().into_owned(),
            original_file_size: original_size,
            part_count: parts.len(),
            parts,
        })
    }

    pub fn total_part_bytes(&self) -> u64 {
        self.parts.iter().map(|p| p.part_size).sum()
    }

    pub fn load(folder: &Path) -> Result<Self> {
        let path = folder.join(MANIFEST_FILE);
        let bytes = fs::read(&path).map_err(|e| SplitpackError::ManifestRead {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        serde_json::from_slice(&bytes).map_err(|e| SplitpackError::ManifestRead {
            path,
            reason: e.to_string(),
        })
    }
}

fn to_pretty_json(manifest: &VolumeManifest) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    manifest.serialize(&mut ser).map_err(std::io::Error::other)?;
    buf.push(b'\n');
    Ok(buf)
}

/// Write `<folder>/info.json`, replacing any previous manifest.
pub fn write(
    folder: &Path,
    original_path: &Path,
    original_size: u64,
    part_paths: &[PathBuf],
) -> Result<VolumeManifest> {
    let path = folder.join(MANIFEST_FILE);
    let wrap = |source| SplitpackError::ManifestWrite {
        path: path.clone(),
        source,
    };
    let manifest = VolumeManifest::from_parts(original_path, original_size, part_paths).map_err(wrap)?;
    let bytes = to_pretty_json(&manifest).map_err(wrap)?;
    let mut f = fs::File::create(&path).map_err(wrap)?;
    f.write_all(&bytes).map_err(wrap)?;
    f.sync_all().map_err(wrap)?;
    Ok(manifest)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    PartCount { recorded: usize, listed: usize, found: usize },
    PartSize { part_number: u32, recorded: u64, found: u64 },
    MissingPart { part_number: u32 },
    Numbering { position: usize, part_number: u32 },
}

#[derive(Debug, Clone)]
pub struct VerifyReport {
    pub manifest: VolumeManifest,
    pub parts: Vec<PathBuf>,
    pub mismatches: Vec<Mismatch>,
}

impl VerifyReport {
    pub fn is_ok(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Compare a folder's manifest against the volume files beside it.
///
/// Parts are rediscovered by the base name of the recorded original path.
pub fn verify(folder: &Path) -> Result<VerifyReport> {
    let manifest = VolumeManifest::load(folder)?;
    let original = PathBuf::from(&manifest.original_file_path);
    let parts = discover_parts(folder, base_name(&original)?)?;

    let mut mismatches = Vec::new();
    if manifest.part_count != manifest.parts.len() || manifest.part_count != parts.len() {
        mismatches.push(Mismatch::PartCount {
            recorded: manifest.part_count,
            listed: manifest.parts.len(),
            found: parts.len(),
        });
    }
    for (i, entry) in manifest.parts.iter().enumerate() {
        if entry.part_number as usize != i + 1 {
            mismatches.push(Mismatch::Numbering {
                position: i,
                part_number: entry.part_number,
            });
        }
        match parts.get(i) {
            Some(p) => {
                let found = fs::metadata(p)?.len();
                if found != entry.part_size {
                    mismatches.push(Mismatch::PartSize {
                        part_number: entry.part_number,
                        recorded: entry.part_size,
                        found,
                    });
                }
            }
            None => mismatches.push(Mismatch::MissingPart {
                part_number: entry.part_number,
            }),
        }
    }
    Ok(VerifyReport {
        manifest,
        parts,
        mismatches,
    })
}
