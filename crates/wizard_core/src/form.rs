use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use board_logging::board_warn;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::payload::RESERVED_FIELDS;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    pub name: String,
    pub relation: String,
    pub contact: String,
}

impl Reference {
    pub fn get(&self, field: ReferenceField) -> &str {
        match field {
            ReferenceField::Name => &self.name,
            ReferenceField::Relation => &self.relation,
            ReferenceField::Contact => &self.contact,
        }
    }

    fn slot_mut(&mut self, field: ReferenceField) -> &mut String {
        match field {
            ReferenceField::Name => &mut self.name,
            ReferenceField::Relation => &mut self.relation,
            ReferenceField::Contact => &mut self.contact,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    pub school: String,
    pub graduation_date: String,
    pub gpa: String,
}

impl Education {
    pub fn get(&self, field: EducationField) -> &str {
        match field {
            EducationField::School => &self.school,
            EducationField::GraduationDate => &self.graduation_date,
            EducationField::Gpa => &self.gpa,
        }
    }

    fn slot_mut(&mut self, field: EducationField) -> &mut String {
        match field {
            EducationField::School => &mut self.school,
            EducationField::GraduationDate => &mut self.graduation_date,
            EducationField::Gpa => &mut self.gpa,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReferenceField {
    Name,
    Relation,
    Contact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EducationField {
    School,
    GraduationDate,
    Gpa,
}

/// Address of a single value inside a [`FormState`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldRef {
    Personal(String),
    Reference { index: usize, field: ReferenceField },
    Education { index: usize, field: EducationField },
    Skill { index: usize },
    Answer(String),
    Attachment(String),
}

impl FieldRef {
    pub fn personal(name: &str) -> Self {
        FieldRef::Personal(name.to_string())
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRef::Personal(name) => write!(f, "{name}"),
            FieldRef::Reference { index, field } => write!(f, "references[{index}].{field:?}"),
            FieldRef::Education { index, field } => write!(f, "education[{index}].{field:?}"),
            FieldRef::Skill { index } => write!(f, "skills[{index}]"),
            FieldRef::Answer(question) => write!(f, "answer \"{question}\""),
            FieldRef::Attachment(slot) => write!(f, "attachment {slot}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RepeatableSection {
    References,
    Education,
    Skills,
}

impl fmt::Display for RepeatableSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RepeatableSection::References => "references",
            RepeatableSection::Education => "education",
            RepeatableSection::Skills => "skills",
        };
        f.write_str(label)
    }
}

/// Template for one entry of a repeatable section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionItem {
    Reference(Reference),
    Education(Education),
    Skill(String),
}

impl SectionItem {
    pub fn blank(section: RepeatableSection) -> Self {
        match section {
            RepeatableSection::References => SectionItem::Reference(Reference::default()),
            RepeatableSection::Education => SectionItem::Education(Education::default()),
            RepeatableSection::Skills => SectionItem::Skill(String::new()),
        }
    }

    pub fn section(&self) -> RepeatableSection {
        match self {
            SectionItem::Reference(_) => RepeatableSection::References,
            SectionItem::Education(_) => RepeatableSection::Education,
            SectionItem::Skill(_) => RepeatableSection::Skills,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub mime: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("cannot remove the last entry of required section {section}")]
    LastRequiredItem { section: RepeatableSection },
    #[error("{section} has no entry {index} (len {len})")]
    IndexOutOfRange {
        section: RepeatableSection,
        index: usize,
        len: usize,
    },
}

/// Values of a multi-section form.
///
/// Required repeatable sections always hold at least one entry; removal of the
/// last entry is blocked rather than collapsing the section.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormState {
    personal: BTreeMap<String, String>,
    references: Vec<Reference>,
    education: Vec<Education>,
    skills: Vec<String>,
    answers: BTreeMap<String, String>,
    required_sections: BTreeSet<RepeatableSection>,
    #[serde(skip)]
    attachments: BTreeMap<String, Attachment>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an empty form whose required sections are seeded with one blank entry.
    pub fn with_required_sections(
        sections: impl IntoIterator<Item = RepeatableSection>,
    ) -> Self {
        let mut form = Self::default();
        for section in sections {
            form.required_sections.insert(section);
            if form.item_count(section) == 0 {
                form.add_item(&SectionItem::blank(section));
            }
        }
        form
    }

    /// Registers custom questions with empty answers; existing answers are kept.
    pub fn with_questions<I, S>(mut self, questions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for question in questions {
            self.answers.entry(question.into()).or_default();
        }
        self
    }

    pub fn personal(&self) -> &BTreeMap<String, String> {
        &self.personal
    }

    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    pub fn education(&self) -> &[Education] {
        &self.education
    }

    pub fn skills(&self) -> &[String] {
        &self.skills
    }

    pub fn answers(&self) -> &BTreeMap<String, String> {
        &self.answers
    }

    pub fn attachments(&self) -> &BTreeMap<String, Attachment> {
        &self.attachments
    }

    pub fn is_required(&self, section: RepeatableSection) -> bool {
        self.required_sections.contains(&section)
    }

    pub fn item_count(&self, section: RepeatableSection) -> usize {
        match section {
            RepeatableSection::References => self.references.len(),
            RepeatableSection::Education => self.education.len(),
            RepeatableSection::Skills => self.skills.len(),
        }
    }

    pub fn value(&self, field: &FieldRef) -> Option<&str> {
        match field {
            FieldRef::Personal(name) => self.personal.get(name).map(String::as_str),
            FieldRef::Reference { index, field } => {
                self.references.get(*index).map(|r| r.get(*field))
            }
            FieldRef::Education { index, field } => {
                self.education.get(*index).map(|e| e.get(*field))
            }
            FieldRef::Skill { index } => self.skills.get(*index).map(String::as_str),
            FieldRef::Answer(question) => self.answers.get(question).map(String::as_str),
            FieldRef::Attachment(slot) => self
                .attachments
                .get(slot)
                .map(|attachment| attachment.file_name.as_str()),
        }
    }

    /// A field counts as filled when it holds non-whitespace text, or for
    /// attachments, when a file is attached.
    pub fn is_filled(&self, field: &FieldRef) -> bool {
        match field {
            FieldRef::Attachment(slot) => self.attachments.contains_key(slot),
            other => self
                .value(other)
                .is_some_and(|value| !value.trim().is_empty()),
        }
    }

    /// Sets one text value. Returns `false` when the reference points at no
    /// existing entry or at a personal name reserved for a section; such edits
    /// are dropped.
    pub fn set_field(&mut self, target: &FieldRef, value: impl Into<String>) -> bool {
        let value = value.into();
        match target {
            FieldRef::Personal(name) if is_reserved(name) => {
                board_warn!("Personal field {:?} is reserved for a section", name);
                false
            }
            FieldRef::Personal(name) => {
                self.personal.insert(name.clone(), value);
                true
            }
            FieldRef::Answer(question) => {
                self.answers.insert(question.clone(), value);
                true
            }
            FieldRef::Reference { index, field } => match self.references.get_mut(*index) {
                Some(entry) => {
                    *entry.slot_mut(*field) = value;
                    true
                }
                None => dropped_edit(target),
            },
            FieldRef::Education { index, field } => match self.education.get_mut(*index) {
                Some(entry) => {
                    *entry.slot_mut(*field) = value;
                    true
                }
                None => dropped_edit(target),
            },
            FieldRef::Skill { index } => match self.skills.get_mut(*index) {
                Some(entry) => {
                    *entry = value;
                    true
                }
                None => dropped_edit(target),
            },
            FieldRef::Attachment(slot) => {
                board_warn!("Text edit ignored for attachment slot {}", slot);
                false
            }
        }
    }

    /// Appends a copy of `template` to its section and returns the new index.
    pub fn add_item(&mut self, template: &SectionItem) -> usize {
        match template.clone() {
            SectionItem::Reference(item) => {
                self.references.push(item);
                self.references.len() - 1
            }
            SectionItem::Education(item) => {
                self.education.push(item);
                self.education.len() - 1
            }
            SectionItem::Skill(item) => {
                self.skills.push(item);
                self.skills.len() - 1
            }
        }
    }

    pub fn remove_item(
        &mut self,
        section: RepeatableSection,
        index: usize,
    ) -> Result<(), FormError> {
        let len = self.item_count(section);
        if index >= len {
            return Err(FormError::IndexOutOfRange {
                section,
                index,
                len,
            });
        }
        if len == 1 && self.is_required(section) {
            return Err(FormError::LastRequiredItem { section });
        }
        match section {
            RepeatableSection::References => {
                self.references.remove(index);
            }
            RepeatableSection::Education => {
                self.education.remove(index);
            }
            RepeatableSection::Skills => {
                self.skills.remove(index);
            }
        }
        Ok(())
    }

    pub fn attach(&mut self, slot: impl Into<String>, attachment: Attachment) {
        self.attachments.insert(slot.into(), attachment);
    }

    pub fn detach(&mut self, slot: &str) -> Option<Attachment> {
        self.attachments.remove(slot)
    }

    /// Restores text values from another form (typically a saved draft),
    /// keeping this form's required sections, questions and attachments.
    pub fn merge_draft(&mut self, draft: FormState) {
        self.personal.extend(
            draft
                .personal
                .into_iter()
                .filter(|(name, _)| !is_reserved(name)),
        );
        if !draft.references.is_empty() {
            self.references = draft.references;
        }
        if !draft.education.is_empty() {
            self.education = draft.education;
        }
        if !draft.skills.is_empty() {
            self.skills = draft.skills;
        }
        for (question, answer) in draft.answers {
            if let Some(slot) = self.answers.get_mut(&question) {
                *slot = answer;
            }
        }
    }

    pub(crate) fn from_parts(
        personal: BTreeMap<String, String>,
        references: Vec<Reference>,
        education: Vec<Education>,
        skills: Vec<String>,
        answers: BTreeMap<String, String>,
    ) -> Self {
        Self {
            personal,
            references,
            education,
            skills,
            answers,
            ..Self::default()
        }
    }
}

fn is_reserved(name: &str) -> bool {
    RESERVED_FIELDS.contains(&name)
}

fn dropped_edit(target: &FieldRef) -> bool {
    board_warn!("Edit dropped for missing entry {}", target);
    false
}
