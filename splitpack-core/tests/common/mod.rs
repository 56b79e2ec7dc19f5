#![allow(dead_code)]

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use splitpack_core::{Archiver, ToolOutput};

/// Stands in for `7z`: writes the archive, or volumes of at most
/// `-v<N>m` bytes (scaled down to N KiB to keep fixtures small).
pub struct ScriptedArchiver {
    pub fail_on: Vec<String>,
    pub calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedArchiver {
    pub fn new() -> Self {
        Self {
            fail_on: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(names: &[&str]) -> Self {
        Self {
            fail_on: names.iter().map(|s| s.to_string()).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

fn walk_len(path: &Path) -> u64 {
    let md = fs::metadata(path).unwrap();
    if md.is_file() {
        return md.len();
    }
    fs::read_dir(path)
        .unwrap()
        .map(|e| walk_len(&e.unwrap().path()))
        .sum()
}

impl Archiver for ScriptedArchiver {
    fn program(&self) -> &Path {
        Path::new("scripted-7z")
    }

    fn execute(&self, args: &[OsString]) -> std::io::Result<ToolOutput> {
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        self.calls.lock().unwrap().push(args.clone());

        let source = PathBuf::from(&args[args.len() - 1]);
        let archive = PathBuf::from(&args[args.len() - 2]);
        let name = source.file_name().unwrap().to_string_lossy().into_owned();
        if self.fail_on.contains(&name) {
            return Ok(ToolOutput {
                success: false,
                code: Some(2),
                stderr: format!("ERROR: {name}: access denied"),
                ..Default::default()
            });
        }

        let len = walk_len(&source).max(1);
        let volume = args
            .iter()
            .find_map(|a| a.strip_prefix("-v").and_then(|v| v.strip_suffix('m')))
            .map(|n| n.parse::<u64>().unwrap() * 1024);
        match volume {
            None => fs::write(&archive, vec![0u8; len as usize])?,
            Some(vol) => {
                let mut left = len;
                let mut i = 1;
                while left > 0 {
                    let n = left.min(vol);
                    let mut part = archive.clone().into_os_string();
                    part.push(format!(".{i:03}"));
                    fs::write(PathBuf::from(part), vec![0u8; n as usize])?;
                    left -= n;
                    i += 1;
                }
            }
        }
        Ok(ToolOutput {
            success: true,
            code: Some(0),
            ..Default::default()
        })
    }
}

pub fn write_file(path: &Path, len: usize) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, vec![9u8; len]).unwrap();
}
