use std::collections::BTreeSet;

use crate::form::{EducationField, FieldRef, FormState, ReferenceField, RepeatableSection};

/// A condition that must hold before the wizard may leave a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    Field(FieldRef),
    EachReference(ReferenceField),
    EachEducation(EducationField),
    AtLeastOneSkill,
    AnswerAll,
}

impl Requirement {
    /// Fields violating this requirement, in form order.
    pub fn missing(&self, form: &FormState) -> Vec<FieldRef> {
        match self {
            Requirement::Field(field) => {
                if form.is_filled(field) {
                    Vec::new()
                } else {
                    vec![field.clone()]
                }
            }
            Requirement::EachReference(field) => (0..form.references().len())
                .map(|index| FieldRef::Reference {
                    index,
                    field: *field,
                })
                .filter(|target| !form.is_filled(target))
                .collect(),
            Requirement::EachEducation(field) => (0..form.education().len())
                .map(|index| FieldRef::Education {
                    index,
                    field: *field,
                })
                .filter(|target| !form.is_filled(target))
                .collect(),
            Requirement::AtLeastOneSkill => {
                if form.skills().iter().any(|skill| !skill.trim().is_empty()) {
                    Vec::new()
                } else {
                    vec![FieldRef::Skill { index: 0 }]
                }
            }
            Requirement::AnswerAll => form
                .answers()
                .iter()
                .filter(|(_, answer)| answer.trim().is_empty())
                .map(|(question, _)| FieldRef::Answer(question.clone()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDescriptor {
    pub index: usize,
    pub title: String,
    pub requirements: Vec<Requirement>,
}

impl StepDescriptor {
    pub fn new(index: usize, title: impl Into<String>, requirements: Vec<Requirement>) -> Self {
        Self {
            index,
            title: title.into(),
            requirements,
        }
    }

    pub fn missing(&self, form: &FormState) -> Vec<FieldRef> {
        let mut seen = BTreeSet::new();
        self.requirements
            .iter()
            .flat_map(|requirement| requirement.missing(form))
            .filter(|field| seen.insert(field.clone()))
            .collect()
    }

    pub fn is_complete(&self, form: &FormState) -> bool {
        self.missing(form).is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavOutcome {
    Advanced { to: usize },
    Blocked { missing: Vec<FieldRef> },
    AtFinalStep,
}

/// Linear step chain. Forward moves are validated, backward moves never are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepNavigator {
    steps: Vec<StepDescriptor>,
    current: usize,
    invalid: BTreeSet<FieldRef>,
}

impl StepNavigator {
    /// `steps` must be non-empty; [`crate::FormDefinition::new`] guarantees it.
    pub(crate) fn new(steps: Vec<StepDescriptor>) -> Self {
        debug_assert!(!steps.is_empty());
        Self {
            steps,
            current: 0,
            invalid: BTreeSet::new(),
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn steps(&self) -> &[StepDescriptor] {
        &self.steps
    }

    pub fn current_step(&self) -> &StepDescriptor {
        &self.steps[self.current]
    }

    pub fn is_final(&self) -> bool {
        self.current + 1 >= self.steps.len()
    }

    pub fn invalid_fields(&self) -> &BTreeSet<FieldRef> {
        &self.invalid
    }

    pub fn next(&mut self, form: &FormState) -> NavOutcome {
        if self.is_final() {
            return NavOutcome::AtFinalStep;
        }
        if let Err(missing) = self.validate_current(form) {
            return NavOutcome::Blocked { missing };
        }
        self.current += 1;
        NavOutcome::Advanced { to: self.current }
    }

    pub fn back(&mut self) -> usize {
        self.current = self.current.saturating_sub(1);
        self.current
    }

    /// Checks the current step, marking missing fields as touched+invalid.
    pub fn validate_current(&mut self, form: &FormState) -> Result<(), Vec<FieldRef>> {
        let missing = self.current_step().missing(form);
        if missing.is_empty() {
            self.invalid.clear();
            Ok(())
        } else {
            self.invalid.extend(missing.iter().cloned());
            Err(missing)
        }
    }

    pub fn clear_invalid(&mut self, field: &FieldRef) -> bool {
        self.invalid.remove(field)
    }

    /// Drops marks inside a repeatable section whose indexes just shifted.
    pub(crate) fn forget_section(&mut self, section: RepeatableSection) {
        self.invalid.retain(|field| {
            !matches!(
                (section, field),
                (RepeatableSection::References, FieldRef::Reference { .. })
                    | (RepeatableSection::Education, FieldRef::Education { .. })
                    | (RepeatableSection::Skills, FieldRef::Skill { .. })
            )
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::SectionItem;

    fn two_steps() -> StepNavigator {
        StepNavigator::new(vec![
            StepDescriptor::new(
                0,
                "Personal",
                vec![Requirement::Field(FieldRef::personal("email"))],
            ),
            StepDescriptor::new(1, "Review", Vec::new()),
        ])
    }

    #[test]
    fn next_blocks_and_marks_missing_fields() {
        let mut nav = two_steps();
        let form = FormState::new();
        assert_eq!(
            nav.next(&form),
            NavOutcome::Blocked {
                missing: vec![FieldRef::personal("email")]
            }
        );
        assert_eq!(nav.current(), 0);
        assert!(nav.invalid_fields().contains(&FieldRef::personal("email")));
    }

    #[test]
    fn back_is_bounded_and_unvalidated() {
        let mut nav = two_steps();
        assert_eq!(nav.back(), 0);
        let mut form = FormState::new();
        form.set_field(&FieldRef::personal("email"), "a@b.c");
        assert_eq!(nav.next(&form), NavOutcome::Advanced { to: 1 });
        form.set_field(&FieldRef::personal("email"), "");
        assert_eq!(nav.back(), 0);
        assert!(matches!(nav.next(&form), NavOutcome::Blocked { .. }));
    }

    #[test]
    fn each_reference_checks_every_entry() {
        let mut form = FormState::with_required_sections([RepeatableSection::References]);
        form.add_item(&SectionItem::blank(RepeatableSection::References));
        form.set_field(
            &FieldRef::Reference {
                index: 0,
                field: ReferenceField::Name,
            },
            "Ada",
        );
        let missing = Requirement::EachReference(ReferenceField::Name).missing(&form);
        assert_eq!(
            missing,
            vec![FieldRef::Reference {
                index: 1,
                field: ReferenceField::Name
            }]
        );
    }
}
