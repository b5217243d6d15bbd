use crate::form::FieldRef;
use crate::state::SubmissionPhase;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub title: String,
    pub step_index: usize,
    pub step_count: usize,
    pub step_title: String,
    pub is_final_step: bool,
    pub rows: Vec<FieldRowView>,
    pub invalid: Vec<FieldRef>,
    /// Live score in percent; `None` when the form has no scoring.
    pub score: Option<u32>,
    pub scoring_in_flight: bool,
    pub phase: SubmissionPhase,
    pub submit_error: Option<String>,
    pub notice: Option<String>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRowView {
    pub field: FieldRef,
    pub value: String,
    pub invalid: bool,
}
