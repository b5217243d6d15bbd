use crate::form::{Attachment, FieldRef, FormState, RepeatableSection, SectionItem};
use crate::payload::SubmitReceipt;
use crate::scorer::{DebounceSlot, RequestId, ScoreFailure};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User changed one field.
    FieldEdited { field: FieldRef, value: String },
    /// User added an entry to a repeatable section, starting from a template.
    ItemAdded(SectionItem),
    /// User removed an entry from a repeatable section.
    ItemRemoved {
        section: RepeatableSection,
        index: usize,
    },
    FileAttached {
        slot: String,
        attachment: Attachment,
    },
    FileDetached { slot: String },
    NextClicked,
    BackClicked,
    SubmitClicked,
    /// A quiet-period timer fired.
    QuietPeriodElapsed { slot: DebounceSlot, token: u64 },
    /// The scoring endpoint answered (or failed) for a request.
    ScoreArrived {
        request_id: RequestId,
        result: Result<u32, ScoreFailure>,
    },
    /// The submission call finished; the error is the user-facing message.
    SubmissionFinished { result: Result<SubmitReceipt, String> },
    /// Restore text values saved from an earlier session.
    RestoreDraft(FormState),
    /// The form is being closed; nothing may update it afterwards.
    TornDown,
}
