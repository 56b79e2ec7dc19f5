//! Command construction and execution for the external archiver.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{Result, SplitpackError};
use crate::policy::volume_megabytes;

pub const ARCHIVE_EXT: &str = "7z";
pub const DICTIONARY_ARG: &str = "-md=192m";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ArchiveMode {
    Single { level: u8 },
    Split { level: u8, volume_mb: u64 },
}

impl ArchiveMode {
    pub fn level(&self) -> u8 {
        match *self {
            ArchiveMode::Single { level } | ArchiveMode::Split { level, .. } => level,
        }
    }
}

/// One fully specified archiver invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    pub mode: ArchiveMode,
    pub credential: Option<String>,
    pub archive: PathBuf,
    pub source: PathBuf,
}

impl CommandSpec {
    /// `a [-p<pw> -mhe] -md=192m [-v<N>m] -mx=<L> <archive> <source>`
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["a".into()];
        if let Some(pw) = &self.credential {
            args.push(format!("-p{pw}").into());
            args.push("-mhe".into());
        }
        args.push(DICTIONARY_ARG.into());
        if let ArchiveMode::Split { volume_mb, .. } = self.mode {
            args.push(format!("-v{volume_mb}m").into());
        }
        args.push(format!("-mx={}", self.mode.level()).into());
        args.push(self.archive.clone().into_os_string());
        args.push(self.source.clone().into_os_string());
        args
    }
}

/// Argument list with the password masked, for logs and dry runs.
impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for a in self.args() {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            let s = a.to_string_lossy();
            if self.credential.is_some() && s.starts_with("-p") {
                f.write_str("-p***")?;
            } else {
                f.write_str(&s)?;
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct ToolOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn diagnostic(&self) -> String {
        let err = self.stderr.trim();
        if err.is_empty() {
            self.stdout.trim().to_string()
        } else {
            err.to_string()
        }
    }
}

pub trait Archiver: Send + Sync {
    fn program(&self) -> &Path;

    /// Run to completion. `Err` only when the process could not be started.
    fn execute(&self, args: &[OsString]) -> std::io::Result<ToolOutput>;
}

impl<A: Archiver + ?Sized> Archiver for &A {
    fn program(&self) -> &Path {
        (**self).program()
    }

    fn execute(&self, args: &[OsString]) -> std::io::Result<ToolOutput> {
        (**self).execute(args)
    }
}

/// The `7z` command-line tool.
#[derive(Clone, Debug)]
pub struct SevenZip {
    program: PathBuf,
}

impl SevenZip {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for SevenZip {
    fn default() -> Self {
        Self::new("7z")
    }
}

impl Archiver for SevenZip {
    fn program(&self) -> &Path {
        &self.program
    }

    fn execute(&self, args: &[OsString]) -> std::io::Result<ToolOutput> {
        let out = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .output()?;
        Ok(ToolOutput {
            success: out.status.success(),
            code: out.status.code(),
            stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArchiveOutcome {
    Single {
        archive: PathBuf,
    },
    Split {
        folder: PathBuf,
        archive: PathBuf,
        /// In volume order.
        parts: Vec<PathBuf>,
    },
}

pub(crate) fn base_name(path: &Path) -> Result<&OsStr> {
    path.file_name().ok_or_else(|| {
        SplitpackError::InvalidRequest(format!("{} has no final path component", path.display()))
    })
}

fn archive_file_name(base: &OsStr) -> OsString {
    let mut name = base.to_os_string();
    name.push(".");
    name.push(ARCHIVE_EXT);
    name
}

pub struct ArchiveInvoker<A> {
    archiver: A,
}

impl<A: Archiver> ArchiveInvoker<A> {
    pub fn new(archiver: A) -> Self {
        Self { archiver }
    }

    pub fn archiver(&self) -> &A {
        &self.archiver
    }

    /// `<output_dir>/<base>.7z`
    pub fn single_command(
        &self,
        path: &Path,
        output_dir: &Path,
        password: Option<&str>,
        level: u8,
    ) -> Result<CommandSpec> {
        let base = base_name(path)?;
        Ok(CommandSpec {
            mode: ArchiveMode::Single { level },
            credential: password.filter(|p| !p.is_empty()).map(str::to_owned),
            archive: output_dir.join(archive_file_name(base)),
            source: path.to_path_buf(),
        })
    }

    /// `<output_dir>/<base>/<base>.7z`, volumes sized in whole megabytes.
    pub fn split_command(
        &self,
        path: &Path,
        output_dir: &Path,
        volume_size: u64,
        password: Option<&str>,
        level: u8,
    ) -> Result<CommandSpec> {
        let base = base_name(path)?;
        Ok(CommandSpec {
            mode: ArchiveMode::Split {
                level,
                volume_mb: volume_megabytes(volume_size),
            },
            credential: password.filter(|p| !p.is_empty()).map(str::to_owned),
            archive: output_dir.join(base).join(archive_file_name(base)),
            source: path.to_path_buf(),
        })
    }

    pub fn invoke_single(
        &self,
        path: &Path,
        output_dir: &Path,
        password: Option<&str>,
        level: u8,
    ) -> Result<ArchiveOutcome> {
        let spec = self.single_command(path, output_dir, password, level)?;
        self.run(&spec)?;
        Ok(ArchiveOutcome::Single {
            archive: spec.archive,
        })
    }

    pub fn invoke_split(
        &self,
        path: &Path,
        output_dir: &Path,
        volume_size: u64,
        password: Option<&str>,
        level: u8,
    ) -> Result<ArchiveOutcome> {
        let spec = self.split_command(path, output_dir, volume_size, password, level)?;
        let folder = output_dir.join(base_name(path)?);
        fs::create_dir_all(&folder)?;
        self.run(&spec)?;
        let parts = discover_parts(&folder, base_name(path)?)?;
        Ok(ArchiveOutcome::Split {
            folder,
            archive: spec.archive,
            parts,
        })
    }

    fn run(&self, spec: &CommandSpec) -> Result<()> {
        tracing::debug!(program = %self.archiver.program().display(), command = %spec, "invoking archiver");
        let out = self
            .archiver
            .execute(&spec.args())
            .map_err(|source| SplitpackError::Spawn {
                program: self.archiver.program().to_path_buf(),
                source,
            })?;
        if !out.success {
            return Err(SplitpackError::ArchiveInvocation {
                path: spec.source.clone(),
                code: out.code,
                diagnostic: out.diagnostic(),
            });
        }
        Ok(())
    }
}

/// Numeric volume suffix, `7` for `x.7z.007`.
fn volume_index(path: &Path) -> Option<u64> {
    path.extension()?.to_str()?.parse().ok()
}

/// Regular files in `folder` whose name starts with `prefix`, in volume
/// order: numeric suffixes by value, then anything else by name.
pub fn discover_parts(folder: &Path, prefix: &OsStr) -> Result<Vec<PathBuf>> {
    let prefix = prefix.as_encoded_bytes();
    let mut parts = Vec::new();
    for entry in fs::read_dir(folder)? {
        let entry = entry?;
        if !entry.file_name().as_encoded_bytes().starts_with(prefix) {
            continue;
        }
        let path = entry.path();
        if fs::metadata(&path)?.is_file() {
            parts.push(path);
        }
    }
    parts.sort_by_cached_key(|p| {
        let name = p.file_name().map(OsStr::to_os_string).unwrap_or_default();
        match volume_index(p) {
            Some(n) => (false, n, name),
            None => (true, 0, name),
        }
    });
    Ok(parts)
}
