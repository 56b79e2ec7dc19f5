use crate::batch::{BatchDriver, RunReport};
use crate::config::RunConfig;
use crate::engine::PolicyEngine;
use crate::error::{Result, SplitpackError};
use crate::event::{Event, EventSink};
use crate::invoker::Archiver;

/// Resolve a config and archive every target through `archiver`.
pub fn run_with<A: Archiver, S: EventSink>(cfg: &RunConfig, archiver: A, sink: S) -> Result<RunReport> {
    let req = match cfg.resolve() {
        Ok(req) => req,
        Err(e) => {
            match &e {
                SplitpackError::InputMissing => sink.emit(Event::select_input()),
                SplitpackError::OutputDirectoryMissing { path } => sink.emit(Event::output_dir_missing(path)),
                _ => {}
            }
            return Err(e);
        }
    };
    BatchDriver::new(PolicyEngine::new(archiver, sink))
        .with_jobs(cfg.jobs)
        .run(&req)
}
