use std::collections::BTreeMap;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::form::{Education, FormState, Reference};

const REFERENCES_FIELD: &str = "references";
const EDUCATION_FIELD: &str = "education";
const SKILLS_FIELD: &str = "skills";
const ANSWERS_FIELD: &str = "answers";
/// Part names taken by the section encodings; no personal field may use them.
pub(crate) const RESERVED_FIELDS: [&str; 4] = [REFERENCES_FIELD, EDUCATION_FIELD, SKILLS_FIELD, ANSWERS_FIELD];

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("personal field name {0:?} collides with a section field")]
    ReservedField(String),
    #[error("could not encode {field}: {source}")]
    Encode {
        field: &'static str,
        source: serde_json::Error,
    },
    #[error("could not decode {field}: {source}")]
    Decode {
        field: String,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub name: String,
    pub file_name: String,
    pub mime: String,
    pub bytes: Bytes,
}

/// One multipart submission: text parts in a stable order followed by files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionPayload {
    pub path: String,
    pub fields: Vec<(String, String)>,
    pub files: Vec<FilePart>,
}

impl SubmissionPayload {
    pub fn build(path: &str, form: &FormState) -> Result<Self, PayloadError> {
        let mut fields = Vec::with_capacity(form.personal().len() + RESERVED_FIELDS.len());
        for (name, value) in form.personal() {
            if RESERVED_FIELDS.contains(&name.as_str()) {
                return Err(PayloadError::ReservedField(name.clone()));
            }
            fields.push((name.clone(), value.clone()));
        }
        fields.push((
            REFERENCES_FIELD.to_string(),
            encode(REFERENCES_FIELD, form.references())?,
        ));
        fields.push((
            EDUCATION_FIELD.to_string(),
            encode(EDUCATION_FIELD, form.education())?,
        ));
        fields.push((SKILLS_FIELD.to_string(), encode(SKILLS_FIELD, form.skills())?));
        fields.push((ANSWERS_FIELD.to_string(), encode(ANSWERS_FIELD, form.answers())?));

        let files = form
            .attachments()
            .iter()
            .map(|(slot, attachment)| FilePart {
                name: slot.clone(),
                file_name: attachment.file_name.clone(),
                mime: attachment.mime.clone(),
                bytes: attachment.bytes.clone(),
            })
            .collect();

        Ok(Self {
            path: path.to_string(),
            fields,
            files,
        })
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Rebuilds form values from submitted text parts, as a receiving backend would.
pub fn parse_fields<'a, I>(fields: I) -> Result<FormState, PayloadError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut personal = BTreeMap::new();
    let mut references: Vec<Reference> = Vec::new();
    let mut education: Vec<Education> = Vec::new();
    let mut skills: Vec<String> = Vec::new();
    let mut answers: BTreeMap<String, String> = BTreeMap::new();

    for (name, value) in fields {
        match name {
            REFERENCES_FIELD => references = decode(name, value)?,
            EDUCATION_FIELD => education = decode(name, value)?,
            SKILLS_FIELD => skills = decode(name, value)?,
            ANSWERS_FIELD => answers = decode(name, value)?,
            _ => {
                personal.insert(name.to_string(), value.to_string());
            }
        }
    }

    Ok(FormState::from_parts(
        personal, references, education, skills, answers,
    ))
}

fn encode<T: serde::Serialize + ?Sized>(
    field: &'static str,
    value: &T,
) -> Result<String, PayloadError> {
    serde_json::to_string(value).map_err(|source| PayloadError::Encode { field, source })
}

fn decode<T: DeserializeOwned>(field: &str, value: &str) -> Result<T, PayloadError> {
    serde_json::from_str(value).map_err(|source| PayloadError::Decode {
        field: field.to_string(),
        source,
    })
}

/// What the backend reports for an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmitReceipt {
    pub id: Option<String>,
    pub redirect: Option<String>,
}
