use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::engine::{PlannedTarget, PolicyEngine, TargetReport};
use crate::error::{Result, SplitpackError};
use crate::event::{Event, EventSink};
use crate::invoker::Archiver;
use crate::policy::ArchiveRequest;

#[derive(Debug)]
pub struct TargetResult {
    pub path: PathBuf,
    pub result: Result<TargetReport>,
}

#[derive(Debug, Default)]
pub struct RunReport {
    /// In enumeration order, one per target.
    pub results: Vec<TargetResult>,
}

impl RunReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &TargetReport> {
        self.results.iter().filter_map(|r| r.result.as_ref().ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = (&Path, &SplitpackError)> {
        self.results
            .iter()
            .filter_map(|r| r.result.as_ref().err().map(|e| (r.path.as_path(), e)))
    }

    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }
}

/// Applies the policy to every target of a request. One target's failure
/// never stops the others.
pub struct BatchDriver<A, S> {
    engine: PolicyEngine<A, S>,
    jobs: usize,
}

impl<A: Archiver, S: EventSink> BatchDriver<A, S> {
    pub fn new(engine: PolicyEngine<A, S>) -> Self {
        Self { engine, jobs: 1 }
    }

    /// Targets archived concurrently; 1 runs strictly in order.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn engine(&self) -> &PolicyEngine<A, S> {
        &self.engine
    }

    /// The units of work: immediate child directories of the target when
    /// subdirectories are processed separately, otherwise the target itself.
    pub fn targets(&self, req: &ArchiveRequest) -> Result<Vec<PathBuf>> {
        if !(req.process_subdirectories && req.target.is_dir()) {
            return Ok(vec![req.target.clone()]);
        }
        let mut dirs = Vec::new();
        for entry in fs::read_dir(&req.target)? {
            let path = entry?.path();
            // follows links, so a symlinked directory counts as a child
            if fs::metadata(&path).map(|m| m.is_dir()).unwrap_or(false) {
                dirs.push(path);
            }
        }
        Ok(dirs)
    }

    pub fn run(&self, req: &ArchiveRequest) -> Result<RunReport> {
        req.validate()?;
        if !req.output_dir.is_dir() {
            self.engine.sink().emit(Event::output_dir_missing(&req.output_dir));
            return Err(SplitpackError::OutputDirectoryMissing {
                path: req.output_dir.clone(),
            });
        }
        let targets = self.targets(req).inspect_err(|e| {
            self.engine.sink().emit(Event::target_failed(&req.target, e));
        })?;
        tracing::info!(count = targets.len(), jobs = self.jobs, "archiving targets");

        let run_one = |path: &PathBuf| TargetResult {
            path: path.clone(),
            result: self.engine.classify_and_dispatch(path, req),
        };
        let results: Vec<TargetResult> = if self.jobs == 1 {
            targets.iter().map(run_one).collect()
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.jobs)
                .build()
                .map_err(|e| std::io::Error::other(e.to_string()))?;
            pool.install(|| targets.par_iter().map(run_one).collect())
        };
        Ok(RunReport { results })
    }

    /// Dry run: what each target would do.
    pub fn plan(&self, req: &ArchiveRequest) -> Result<Vec<(PathBuf, Result<PlannedTarget>)>> {
        req.validate()?;
        Ok(self
            .targets(req)?
            .into_iter()
            .map(|p| {
                let planned = self.engine.plan_target(&p, req);
                (p, planned)
            })
            .collect())
    }
}
