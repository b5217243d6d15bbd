use crate::definition::{FormDefinition, FormKind};
use crate::form::{EducationField, FieldRef, FormState, ReferenceField};
use crate::scorer::LiveScorer;
use crate::step::StepNavigator;
use crate::view_model::{AppViewModel, FieldRowView};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionPhase {
    #[default]
    Editing,
    Submitting,
    Done {
        redirect: Option<String>,
    },
}

/// Everything the wizard knows; advanced only through [`crate::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    kind: FormKind,
    submit_path: String,
    form: FormState,
    prefill: Vec<(FieldRef, String)>,
    navigator: StepNavigator,
    scorer: Option<LiveScorer>,
    phase: SubmissionPhase,
    submit_error: Option<String>,
    notice: Option<String>,
    dirty: bool,
}

impl AppState {
    pub fn new(definition: &FormDefinition) -> Self {
        Self {
            kind: definition.kind(),
            submit_path: definition.submit_path().to_string(),
            form: definition.initial_form(),
            prefill: definition.prefill().to_vec(),
            navigator: StepNavigator::new(definition.steps().to_vec()),
            scorer: definition.scoring().cloned().map(LiveScorer::new),
            phase: SubmissionPhase::Editing,
            submit_error: None,
            notice: None,
            dirty: true,
        }
    }

    pub fn kind(&self) -> FormKind {
        self.kind
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn navigator(&self) -> &StepNavigator {
        &self.navigator
    }

    pub fn scorer(&self) -> Option<&LiveScorer> {
        self.scorer.as_ref()
    }

    pub fn phase(&self) -> &SubmissionPhase {
        &self.phase
    }

    pub fn is_done(&self) -> bool {
        matches!(self.phase, SubmissionPhase::Done { .. })
    }

    /// Text state worth saving for a later session; `None` once submitted.
    pub fn draft(&self) -> Option<FormState> {
        if self.is_done() {
            None
        } else {
            Some(self.form.clone())
        }
    }

    pub fn view(&self) -> AppViewModel {
        let step = self.navigator.current_step();
        let invalid = self.navigator.invalid_fields();
        let mut rows: Vec<FieldRowView> = field_rows(&self.form)
            .into_iter()
            .map(|(field, value)| FieldRowView {
                invalid: invalid.contains(&field),
                field,
                value,
            })
            .collect();
        // Missing attachments have no value row of their own.
        for field in invalid {
            if !rows.iter().any(|row| &row.field == field) {
                rows.push(FieldRowView {
                    field: field.clone(),
                    value: String::new(),
                    invalid: true,
                });
            }
        }
        AppViewModel {
            title: self.kind.label(),
            step_index: self.navigator.current(),
            step_count: self.navigator.step_count(),
            step_title: step.title.clone(),
            is_final_step: self.navigator.is_final(),
            rows,
            invalid: invalid.iter().cloned().collect(),
            score: self.scorer.as_ref().map(LiveScorer::score),
            scoring_in_flight: self
                .scorer
                .as_ref()
                .is_some_and(|scorer| scorer.in_flight().is_some()),
            phase: self.phase.clone(),
            submit_error: self.submit_error.clone(),
            notice: self.notice.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn submit_path(&self) -> &str {
        &self.submit_path
    }

    pub(crate) fn form_mut(&mut self) -> &mut FormState {
        &mut self.form
    }

    /// Merges a saved draft; values prefilled from the job stay authoritative.
    pub(crate) fn restore_draft(&mut self, draft: FormState) {
        self.form.merge_draft(draft);
        for (field, value) in &self.prefill {
            self.form.set_field(field, value.clone());
        }
    }

    pub(crate) fn navigator_mut(&mut self) -> &mut StepNavigator {
        &mut self.navigator
    }

    pub(crate) fn scorer_mut(&mut self) -> Option<&mut LiveScorer> {
        self.scorer.as_mut()
    }

    pub(crate) fn set_phase(&mut self, phase: SubmissionPhase) {
        self.phase = phase;
    }

    pub(crate) fn set_submit_error(&mut self, error: Option<String>) {
        self.submit_error = error;
    }

    pub(crate) fn set_notice(&mut self, notice: Option<String>) {
        self.notice = notice;
    }
}

fn field_rows(form: &FormState) -> Vec<(FieldRef, String)> {
    let mut rows: Vec<(FieldRef, String)> = form
        .personal()
        .iter()
        .map(|(name, value)| (FieldRef::Personal(name.clone()), value.clone()))
        .collect();
    for (index, reference) in form.references().iter().enumerate() {
        for field in [
            ReferenceField::Name,
            ReferenceField::Relation,
            ReferenceField::Contact,
        ] {
            rows.push((
                FieldRef::Reference { index, field },
                reference.get(field).to_string(),
            ));
        }
    }
    for (index, entry) in form.education().iter().enumerate() {
        for field in [
            EducationField::School,
            EducationField::GraduationDate,
            EducationField::Gpa,
        ] {
            rows.push((FieldRef::Education { index, field }, entry.get(field).to_string()));
        }
    }
    for (index, skill) in form.skills().iter().enumerate() {
        rows.push((FieldRef::Skill { index }, skill.clone()));
    }
    for (question, answer) in form.answers() {
        rows.push((FieldRef::Answer(question.clone()), answer.clone()));
    }
    for (slot, attachment) in form.attachments() {
        rows.push((
            FieldRef::Attachment(slot.clone()),
            format!("{} ({} bytes)", attachment.file_name, attachment.bytes.len()),
        ));
    }
    rows
}
