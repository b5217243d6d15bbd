//! Wizard core: pure form state machine, live-score bookkeeping and view-model helpers.
mod definition;
mod effect;
mod form;
mod msg;
mod payload;
mod scorer;
mod state;
mod step;
mod update;
mod view_model;

pub use definition::{DefinitionError, FormDefinition, FormKind, RESUME_SLOT};
pub use effect::Effect;
pub use form::{
    Attachment, Education, EducationField, FieldRef, FormError, FormState, Reference,
    ReferenceField, RepeatableSection, SectionItem,
};
pub use msg::Msg;
pub use payload::{parse_fields, FilePart, PayloadError, SubmissionPayload, SubmitReceipt};
pub use scorer::{
    DebouncePolicy, DebounceSlot, LiveScorer, QuietTimer, RequestId, ResponseDisposition,
    ScoreFailure, ScoreInputs, ScoringKind, ScoringSpec, WatchedField, DEFAULT_QUIET_PERIOD,
};
pub use state::{AppState, SubmissionPhase};
pub use step::{NavOutcome, Requirement, StepDescriptor, StepNavigator};
pub use update::update;
pub use view_model::{AppViewModel, FieldRowView};
