use std::collections::BTreeSet;
use std::time::Duration;

use thiserror::Error;

use crate::form::{EducationField, FieldRef, FormState, ReferenceField, RepeatableSection};
use crate::scorer::{DebouncePolicy, ScoringKind, ScoringSpec, WatchedField, DEFAULT_QUIET_PERIOD};
use crate::step::{Requirement, StepDescriptor};

/// Attachment slot holding the applicant's resume.
pub const RESUME_SLOT: &str = "resume";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    JobPosting,
    JobApplication { job_id: u64 },
}

impl FormKind {
    pub fn label(&self) -> String {
        match self {
            FormKind::JobPosting => "job posting".to_string(),
            FormKind::JobApplication { job_id } => format!("application for job {job_id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("a form needs at least one step")]
    NoSteps,
    #[error("step at position {position} declares index {declared}")]
    IndexMismatch { position: usize, declared: usize },
}

/// Static description of one wizard: its steps, sections and scoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormDefinition {
    kind: FormKind,
    steps: Vec<StepDescriptor>,
    required_sections: BTreeSet<RepeatableSection>,
    questions: Vec<String>,
    prefill: Vec<(FieldRef, String)>,
    scoring: Option<ScoringSpec>,
    submit_path: String,
}

impl FormDefinition {
    pub fn new(
        kind: FormKind,
        steps: Vec<StepDescriptor>,
        submit_path: impl Into<String>,
    ) -> Result<Self, DefinitionError> {
        if steps.is_empty() {
            return Err(DefinitionError::NoSteps);
        }
        if let Some((position, step)) = steps
            .iter()
            .enumerate()
            .find(|(position, step)| step.index != *position)
        {
            return Err(DefinitionError::IndexMismatch {
                position,
                declared: step.index,
            });
        }
        Ok(Self {
            kind,
            steps,
            required_sections: BTreeSet::new(),
            questions: Vec::new(),
            prefill: Vec::new(),
            scoring: None,
            submit_path: submit_path.into(),
        })
    }

    pub fn with_questions(mut self, questions: Vec<String>) -> Self {
        self.questions = questions;
        self
    }

    /// Overrides debounce settings of the scoring spec, if there is one.
    pub fn with_debounce(mut self, policy: DebouncePolicy, quiet_period: Duration) -> Self {
        if let Some(scoring) = self.scoring.as_mut() {
            scoring.policy = policy;
            scoring.quiet_period = quiet_period;
        }
        self
    }

    pub fn kind(&self) -> FormKind {
        self.kind
    }

    pub fn steps(&self) -> &[StepDescriptor] {
        &self.steps
    }

    pub fn scoring(&self) -> Option<&ScoringSpec> {
        self.scoring.as_ref()
    }

    pub fn submit_path(&self) -> &str {
        &self.submit_path
    }

    /// Values that come from the job itself and always win over a restored draft.
    pub(crate) fn prefill(&self) -> &[(FieldRef, String)] {
        &self.prefill
    }

    /// Fresh form state: required sections seeded, questions registered,
    /// every required or scored personal field present (empty), prefill applied.
    pub fn initial_form(&self) -> FormState {
        let mut form = FormState::with_required_sections(self.required_sections.iter().copied())
            .with_questions(self.questions.iter().cloned());
        let required = self
            .steps
            .iter()
            .flat_map(|step| &step.requirements)
            .filter_map(|requirement| match requirement {
                Requirement::Field(field) => Some(field),
                _ => None,
            });
        let scored = self
            .scoring
            .iter()
            .flat_map(|scoring| &scoring.watched)
            .map(|watched| &watched.field);
        for field in required.chain(scored) {
            if matches!(field, FieldRef::Personal(_)) {
                form.set_field(field, "");
            }
        }
        for (field, value) in &self.prefill {
            form.set_field(field, value.clone());
        }
        form
    }

    /// Employer flow: details, compensation, required skills, review.
    pub fn job_posting() -> Self {
        let steps = vec![
            StepDescriptor::new(
                0,
                "Job details",
                vec![
                    Requirement::Field(FieldRef::personal("title")),
                    Requirement::Field(FieldRef::personal("company")),
                    Requirement::Field(FieldRef::personal("description")),
                    Requirement::Field(FieldRef::personal("location")),
                ],
            ),
            StepDescriptor::new(
                1,
                "Compensation",
                vec![Requirement::Field(FieldRef::personal("job_type"))],
            ),
            StepDescriptor::new(2, "Required skills", vec![Requirement::AtLeastOneSkill]),
            StepDescriptor::new(3, "Review", Vec::new()),
        ];
        Self {
            kind: FormKind::JobPosting,
            steps,
            required_sections: BTreeSet::from([RepeatableSection::Skills]),
            questions: Vec::new(),
            prefill: Vec::new(),
            scoring: Some(ScoringSpec {
                kind: ScoringKind::JobPosting,
                watched: [
                    WatchedField {
                        field: FieldRef::personal("description"),
                        param: "description".to_string(),
                    },
                    WatchedField {
                        field: FieldRef::personal("location"),
                        param: "location".to_string(),
                    },
                ],
                policy: DebouncePolicy::SharedGate,
                quiet_period: DEFAULT_QUIET_PERIOD,
            }),
            submit_path: "/api/jobs/".to_string(),
        }
    }

    /// Student flow for one job. `description` is the job's own text and is
    /// scored against the resume link the applicant enters.
    pub fn job_application(job_id: u64, description: &str, questions: Vec<String>) -> Self {
        let steps = vec![
            StepDescriptor::new(
                0,
                "Personal info",
                vec![
                    Requirement::Field(FieldRef::personal("first_name")),
                    Requirement::Field(FieldRef::personal("last_name")),
                    Requirement::Field(FieldRef::personal("email")),
                ],
            ),
            StepDescriptor::new(
                1,
                "References",
                vec![
                    Requirement::EachReference(ReferenceField::Name),
                    Requirement::EachReference(ReferenceField::Contact),
                ],
            ),
            StepDescriptor::new(
                2,
                "Education",
                vec![
                    Requirement::EachEducation(EducationField::School),
                    Requirement::EachEducation(EducationField::GraduationDate),
                ],
            ),
            StepDescriptor::new(
                3,
                "Skills & questions",
                vec![Requirement::AtLeastOneSkill, Requirement::AnswerAll],
            ),
            StepDescriptor::new(
                4,
                "Review",
                vec![Requirement::Field(FieldRef::Attachment(
                    RESUME_SLOT.to_string(),
                ))],
            ),
        ];
        Self {
            kind: FormKind::JobApplication { job_id },
            steps,
            required_sections: BTreeSet::from([
                RepeatableSection::References,
                RepeatableSection::Education,
                RepeatableSection::Skills,
            ]),
            questions,
            prefill: vec![(FieldRef::personal("description"), description.to_string())],
            scoring: Some(ScoringSpec {
                kind: ScoringKind::Application,
                watched: [
                    WatchedField {
                        field: FieldRef::personal("resume_url"),
                        param: "resume_url".to_string(),
                    },
                    WatchedField {
                        field: FieldRef::personal("description"),
                        param: "description".to_string(),
                    },
                ],
                policy: DebouncePolicy::SharedGate,
                quiet_period: DEFAULT_QUIET_PERIOD,
            }),
            submit_path: format!("/api/jobs/{job_id}/apply/"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_misnumbered_steps() {
        assert_eq!(
            FormDefinition::new(FormKind::JobPosting, Vec::new(), "/x").unwrap_err(),
            DefinitionError::NoSteps
        );
        let steps = vec![StepDescriptor::new(1, "Only", Vec::new())];
        assert_eq!(
            FormDefinition::new(FormKind::JobPosting, steps, "/x").unwrap_err(),
            DefinitionError::IndexMismatch {
                position: 0,
                declared: 1
            }
        );
    }

    #[test]
    fn application_form_is_prefilled_and_seeded() {
        let definition =
            FormDefinition::job_application(9, "Answer phones", vec!["Why us?".to_string()]);
        let form = definition.initial_form();
        assert_eq!(
            form.value(&FieldRef::personal("description")),
            Some("Answer phones")
        );
        assert_eq!(form.references().len(), 1);
        assert_eq!(form.education().len(), 1);
        assert_eq!(form.skills().len(), 1);
        assert_eq!(form.answers().get("Why us?").map(String::as_str), Some(""));
        assert_eq!(definition.submit_path(), "/api/jobs/9/apply/");
    }

    #[test]
    fn required_and_scored_personal_fields_start_empty() {
        let form = FormDefinition::job_application(9, "Answer phones", Vec::new()).initial_form();
        for name in ["first_name", "last_name", "email", "resume_url"] {
            assert_eq!(form.value(&FieldRef::personal(name)), Some(""), "{name}");
        }
        assert_eq!(form.value(&FieldRef::Attachment(RESUME_SLOT.to_string())), None);

        let posting = FormDefinition::job_posting().initial_form();
        assert_eq!(posting.personal().len(), 5);
    }
}
