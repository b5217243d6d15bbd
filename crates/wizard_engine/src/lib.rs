//! Wizard engine: HTTP calls, debounce timers and draft files behind the pure core.
mod api;
mod debounce;
mod engine;
mod filename;
mod persist;
mod types;

pub use api::{ApiSettings, GradeClient, ReqwestApi, Submitter};
pub use debounce::{DebounceTimer, TimerSet};
pub use engine::{EngineError, EngineEvents, EngineHandle};
pub use filename::draft_filename;
pub use persist::{ensure_draft_dir, DraftStore, PersistError};
pub use types::{
    ApiError, EngineEvent, FailureKind, GradeEndpoint, GradeQuery, RequestId, SubmitFile,
    SubmitRequest, SubmitResponse, TimerKey,
};
