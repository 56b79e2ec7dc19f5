#![forbid(unsafe_code)]

pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod invoker;
pub mod manifest;
pub mod policy;
pub mod probe;
pub mod session;

// Re-exports: stable API surface
pub use batch::{BatchDriver, RunReport, TargetResult};
pub use config::RunConfig;
pub use engine::{ArchiveTarget, PlannedTarget, PolicyEngine, TargetReport};
pub use error::{Result, SplitpackError};
pub use event::{Event, EventSink, Language, MemorySink, MessageId, TracingSink};
pub use invoker::{ArchiveInvoker, ArchiveMode, ArchiveOutcome, Archiver, CommandSpec, SevenZip, ToolOutput};
pub use manifest::{VolumeManifest, verify};
pub use policy::{ArchiveRequest, Plan, SmallFileAction, classify};
pub use session::run_with;
