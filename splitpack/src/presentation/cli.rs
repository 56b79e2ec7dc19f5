use clap::{Args, Parser, Subcommand};
use splitpack_core::{Language, SmallFileAction};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Size-aware 7z archiving with split volumes", long_about = None)]
pub struct Cli {
    /// Message language (en, zh)
    #[arg(long, global = true)]
    pub lang: Option<Language>,

    /// Log debug detail, including the archiver command lines
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone, Debug, Default)]
pub struct RunArgs {
    /// JSON run config; flags below override its fields
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Archive a single file
    #[arg(long, conflicts_with = "dir")]
    pub file: Option<PathBuf>,

    /// Archive a directory
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Existing directory that receives archives
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Targets above this many MB are always split
    #[arg(long = "threshold-mb")]
    pub threshold_mb: Option<u64>,

    /// Volume size in MB for targets above the threshold
    #[arg(long = "large-volume-mb")]
    pub large_volume_mb: Option<u64>,

    /// Volume size in MB for small targets split by --small-action
    #[arg(long = "small-volume-mb")]
    pub small_volume_mb: Option<u64>,

    /// Archive each immediate subdirectory of --dir on its own
    #[arg(long, overrides_with = "no_subdirs")]
    pub subdirs: bool,

    /// Archive --dir as one target even if the config file says otherwise
    #[arg(long = "no-subdirs", overrides_with = "subdirs")]
    pub no_subdirs: bool,

    /// What to do with targets at or below the threshold (compress, split_compress)
    #[arg(long = "small-action")]
    pub small_action: Option<SmallFileAction>,

    /// Encrypt contents and file names
    #[arg(long)]
    pub password: Option<String>,

    /// Compression level, 0 (store) to 9 (ultra)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=9))]
    pub level: Option<u8>,

    /// Subdirectories archived concurrently
    #[arg(long)]
    pub jobs: Option<usize>,

    /// Archiver executable
    #[arg(long)]
    pub archiver: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Archive a file or directory, splitting into volumes by size
    Compress(RunArgs),

    /// Show how each target would be archived without running the archiver
    Plan(RunArgs),

    /// Check a split archive folder against its info.json
    Verify {
        /// Folder holding the volumes and info.json
        folder: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compress_args(argv: &[&str]) -> RunArgs {
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Compress(args) => args,
            _ => panic!("expected compress"),
        }
    }

    #[test]
    fn last_subdirs_flag_wins() {
        let args = compress_args(&["splitpack", "compress", "--subdirs", "--no-subdirs"]);
        assert!(!args.subdirs);
        assert!(args.no_subdirs);

        let args = compress_args(&["splitpack", "compress", "--no-subdirs", "--subdirs"]);
        assert!(args.subdirs);
        assert!(!args.no_subdirs);
    }
}
