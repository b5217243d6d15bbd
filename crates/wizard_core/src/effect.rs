use crate::payload::SubmissionPayload;
use crate::scorer::{QuietTimer, RequestId, ScoreInputs};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// (Re)start the quiet-period timer for a slot, replacing any pending one.
    StartQuietTimer(QuietTimer),
    RequestScore {
        request_id: RequestId,
        inputs: ScoreInputs,
    },
    /// Drop pending timers and make in-flight scoring requests inert.
    CancelScoring,
    Submit {
        payload: SubmissionPayload,
    },
    Redirect {
        location: String,
    },
    DiscardDraft,
}
