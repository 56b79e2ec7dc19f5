use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use splitpack_core::error::Result;
use splitpack_core::manifest::{self, Mismatch};
use splitpack_core::policy::MIB;
use splitpack_core::{
    Archiver, BatchDriver, Language, MemorySink, Plan, PolicyEngine, RunConfig, SevenZip, TracingSink,
    run_with,
};

use crate::presentation::cli::RunArgs;

/// Config file (or defaults) with every given flag laid over it.
fn config_from_args(args: RunArgs, lang: Option<Language>) -> Result<RunConfig> {
    let mut cfg = match &args.config {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };
    if args.file.is_some() || args.dir.is_some() {
        cfg.input_file = args.file;
        cfg.input_dir = args.dir;
    }
    if let Some(v) = args.output {
        cfg.output_dir = Some(v);
    }
    if let Some(v) = args.threshold_mb {
        cfg.size_threshold_mb = v;
    }
    if let Some(v) = args.large_volume_mb {
        cfg.large_volume_mb = v;
    }
    if let Some(v) = args.small_volume_mb {
        cfg.small_volume_mb = v;
    }
    if args.subdirs {
        cfg.process_subdirectories = true;
    } else if args.no_subdirs {
        cfg.process_subdirectories = false;
    }
    if let Some(v) = args.small_action {
        cfg.small_file_action = v;
    }
    if args.password.is_some() {
        cfg.password = args.password;
    }
    if let Some(v) = args.level {
        cfg.compression_level = v;
    }
    if let Some(v) = args.jobs {
        cfg.jobs = v;
    }
    if let Some(v) = args.archiver {
        cfg.archiver = v;
    }
    if let Some(v) = lang {
        cfg.language = v;
    }
    Ok(cfg)
}

/// Run the batch and write each localized event line to `out` once.
/// Returns the number of failed targets.
fn compress_with<A: Archiver, W: Write>(cfg: &RunConfig, archiver: A, out: &mut W) -> Result<usize> {
    let sink = MemorySink::new();
    let outcome = run_with(cfg, archiver, &sink);
    for event in sink.events() {
        writeln!(out, "{}", event.render(cfg.language))?;
    }
    let report = outcome?;
    let failed = report.failed().count();
    tracing::info!(
        archived = report.results.len() - failed,
        failed,
        "run finished"
    );
    Ok(failed)
}

pub fn handle_compress(args: RunArgs, lang: Option<Language>) -> Result<ExitCode> {
    let cfg = config_from_args(args, lang)?;
    let failed = compress_with(&cfg, SevenZip::new(&cfg.archiver), &mut io::stdout().lock())?;
    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn describe(plan: Plan) -> String {
    match plan {
        Plan::Single => "single archive".to_string(),
        Plan::Split { volume_size } => format!("split, {} MB volumes", volume_size / MIB),
    }
}

pub fn handle_plan(args: RunArgs, lang: Option<Language>) -> Result<ExitCode> {
    let cfg = config_from_args(args, lang)?;
    let req = cfg.resolve()?;
    let driver = BatchDriver::new(PolicyEngine::new(
        SevenZip::new(&cfg.archiver),
        TracingSink::new(cfg.language),
    ));

    let mut ok = true;
    for (path, planned) in driver.plan(&req)? {
        match planned {
            Ok(p) => {
                println!("{}  {} bytes  {}", path.display(), p.target.size, describe(p.plan));
                println!("    {} {}", cfg.archiver.display(), p.command);
            }
            Err(e) => {
                ok = false;
                println!("{}  error: {e}", path.display());
            }
        }
    }
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

pub fn handle_verify(folder: PathBuf) -> Result<ExitCode> {
    let report = manifest::verify(&folder)?;
    let m = &report.manifest;
    println!(
        "{}: {} bytes in {} part(s), {} bytes on disk",
        m.original_file_path,
        m.original_file_size,
        m.part_count,
        m.total_part_bytes()
    );
    for mismatch in &report.mismatches {
        match mismatch {
            Mismatch::PartCount {
                recorded,
                listed,
                found,
            } => println!("  part count: recorded {recorded}, listed {listed}, found {found}"),
            Mismatch::PartSize {
                part_number,
                recorded,
                found,
            } => println!("  part {part_number}: recorded {recorded} bytes, found {found}"),
            Mismatch::MissingPart { part_number } => println!("  part {part_number}: missing"),
            Mismatch::Numbering {
                position,
                part_number,
            } => println!("  entry {position}: numbered {part_number}"),
        }
    }
    if report.is_ok() {
        eprintln!("verify: OK");
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("verify: {} problem(s)", report.mismatches.len());
        Ok(ExitCode::FAILURE)
    }
}
