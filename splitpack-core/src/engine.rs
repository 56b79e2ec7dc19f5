use std::path::{Path, PathBuf};

use crate::error::{Result, SplitpackError};
use crate::event::{Event, EventSink};
use crate::invoker::{ArchiveInvoker, ArchiveOutcome, Archiver, CommandSpec};
use crate::manifest::{self, VolumeManifest};
use crate::policy::{ArchiveRequest, Plan, classify};
use crate::probe;

/// One unit of work, sized at classification time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveTarget {
    pub path: PathBuf,
    pub size: u64,
}

#[derive(Clone, Debug)]
pub struct PlannedTarget {
    pub target: ArchiveTarget,
    pub plan: Plan,
    pub command: CommandSpec,
}

#[derive(Clone, Debug)]
pub struct TargetReport {
    pub target: ArchiveTarget,
    pub plan: Plan,
    pub outcome: ArchiveOutcome,
    /// Present on the split path only.
    pub manifest: Option<VolumeManifest>,
}

pub struct PolicyEngine<A, S> {
    invoker: ArchiveInvoker<A>,
    sink: S,
}

impl<A: Archiver, S: EventSink> PolicyEngine<A, S> {
    pub fn new(archiver: A, sink: S) -> Self {
        Self {
            invoker: ArchiveInvoker::new(archiver),
            sink,
        }
    }

    pub fn invoker(&self) -> &ArchiveInvoker<A> {
        &self.invoker
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Size a target. A directory that cannot be fully walked keeps the
    /// bytes it counted; a file that cannot be stat'ed fails.
    pub fn probe(&self, path: &Path) -> Result<ArchiveTarget> {
        let size = match probe::target_size(path) {
            Ok(n) => n,
            Err(SplitpackError::SizeProbe {
                partial_bytes,
                source,
                ..
            }) if path.is_dir() => {
                tracing::warn!(path = %path.display(), error = %source, partial_bytes, "directory size is partial");
                partial_bytes
            }
            Err(e) => return Err(e),
        };
        Ok(ArchiveTarget {
            path: path.to_path_buf(),
            size,
        })
    }

    /// Classify a target and build the command it would run, without running it.
    pub fn plan_target(&self, path: &Path, req: &ArchiveRequest) -> Result<PlannedTarget> {
        let target = self.probe(path)?;
        let plan = classify(target.size, req);
        let command = match plan {
            Plan::Single => self.invoker.single_command(
                path,
                &req.output_dir,
                req.credential(),
                req.compression_level,
            )?,
            Plan::Split { volume_size } => self.invoker.split_command(
                path,
                &req.output_dir,
                volume_size,
                req.credential(),
                req.compression_level,
            )?,
        };
        Ok(PlannedTarget {
            target,
            plan,
            command,
        })
    }

    /// Classify, run the archiver, and write the manifest on the split path.
    /// Success and failure are both reported to the sink.
    pub fn classify_and_dispatch(&self, path: &Path, req: &ArchiveRequest) -> Result<TargetReport> {
        match self.dispatch(path, req) {
            Ok(report) => {
                let event = match &report.outcome {
                    ArchiveOutcome::Single { archive } => Event::file_compressed(path, archive),
                    ArchiveOutcome::Split { folder, parts, .. } => {
                        Event::file_split_compressed(path, folder, parts.len())
                    }
                };
                self.sink.emit(event);
                Ok(report)
            }
            Err(e) => {
                self.sink.emit(Event::target_failed(path, &e));
                Err(e)
            }
        }
    }

    fn dispatch(&self, path: &Path, req: &ArchiveRequest) -> Result<TargetReport> {
        let target = self.probe(path)?;
        let plan = classify(target.size, req);
        tracing::debug!(path = %path.display(), size = target.size, ?plan, "classified");

        let password = req.credential();
        let level = req.compression_level;
        let (outcome, manifest) = match plan {
            Plan::Single => {
                let outcome = self.invoker.invoke_single(path, &req.output_dir, password, level)?;
                (outcome, None)
            }
            Plan::Split { volume_size } => {
                let outcome = self
                    .invoker
                    .invoke_split(path, &req.output_dir, volume_size, password, level)?;
                let manifest = match &outcome {
                    ArchiveOutcome::Split { folder, parts, .. } => {
                        Some(manifest::write(folder, path, target.size, parts)?)
                    }
                    ArchiveOutcome::Single { .. } => None,
                };
                (outcome, manifest)
            }
        };
        Ok(TargetReport {
            target,
            plan,
            outcome,
            manifest,
        })
    }
}
