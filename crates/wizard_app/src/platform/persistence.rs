use std::path::PathBuf;

use board_logging::{board_error, board_info, board_warn};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use wizard_core::{FormKind, FormState};
use wizard_engine::{draft_filename, DraftStore};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedDraft {
    saved_at: String,
    form: FormState,
}

/// The saved draft of one form, addressed by form kind.
#[derive(Debug, Clone)]
pub(crate) struct Drafts {
    store: DraftStore,
    filename: String,
}

impl Drafts {
    pub(crate) fn new(dir: PathBuf, kind: FormKind) -> Self {
        let key = match kind {
            FormKind::JobPosting => "posting".to_string(),
            FormKind::JobApplication { job_id } => format!("application/{job_id}"),
        };
        Self {
            store: DraftStore::new(dir),
            filename: draft_filename(&kind.label(), &key),
        }
    }

    pub(crate) fn load(&self) -> Option<FormState> {
        let content = match self.store.load(&self.filename) {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(err) => {
                board_warn!("Failed to read draft {}: {}", self.filename, err);
                return None;
            }
        };

        match ron::from_str::<PersistedDraft>(&content) {
            Ok(draft) => {
                board_info!("Restored draft {} saved at {}", self.filename, draft.saved_at);
                Some(draft.form)
            }
            Err(err) => {
                board_warn!("Failed to parse draft {}: {}", self.filename, err);
                None
            }
        }
    }

    pub(crate) fn save(&self, form: &FormState) {
        let draft = PersistedDraft {
            saved_at: Utc::now().to_rfc3339(),
            form: form.clone(),
        };
        let pretty = ron::ser::PrettyConfig::new();
        let content = match ron::ser::to_string_pretty(&draft, pretty) {
            Ok(text) => text,
            Err(err) => {
                board_error!("Failed to serialize draft: {}", err);
                return;
            }
        };

        match self.store.save(&self.filename, &content) {
            Ok(path) => board_info!("Saved draft to {:?}", path),
            Err(err) => board_error!(
                "Failed to write draft to {:?}: {}",
                self.store.dir(),
                err
            ),
        }
    }

    pub(crate) fn discard(&self) {
        match self.store.discard(&self.filename) {
            Ok(true) => board_info!("Discarded draft {}", self.filename),
            Ok(false) => {}
            Err(err) => board_warn!("Failed to discard draft {}: {}", self.filename, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use wizard_core::{FieldRef, FormDefinition, ReferenceField};

    use super::*;

    fn application_form() -> FormState {
        let definition =
            FormDefinition::job_application(42, "Answer phones", vec!["Why us?".to_string()]);
        let mut form = definition.initial_form();
        form.set_field(&FieldRef::personal("first_name"), "Ada");
        form.set_field(
            &FieldRef::Reference {
                index: 0,
                field: ReferenceField::Contact,
            },
            "charles@example.com",
        );
        form.set_field(&FieldRef::Answer("Why us?".to_string()), "Engines");
        form
    }

    #[test]
    fn saved_draft_loads_back() {
        let temp = TempDir::new().unwrap();
        let drafts = Drafts::new(
            temp.path().join("drafts"),
            FormKind::JobApplication { job_id: 42 },
        );
        assert_eq!(drafts.load(), None);

        let form = application_form();
        drafts.save(&form);
        assert_eq!(drafts.load(), Some(form));

        drafts.discard();
        assert_eq!(drafts.load(), None);
    }

    #[test]
    fn drafts_are_kept_per_job() {
        let temp = TempDir::new().unwrap();
        let first = Drafts::new(temp.path().to_path_buf(), FormKind::JobApplication { job_id: 1 });
        let second = Drafts::new(temp.path().to_path_buf(), FormKind::JobApplication { job_id: 2 });
        first.save(&application_form());
        assert!(first.load().is_some());
        assert_eq!(second.load(), None);
    }

    #[test]
    fn corrupt_draft_is_ignored() {
        let temp = TempDir::new().unwrap();
        let drafts = Drafts::new(temp.path().to_path_buf(), FormKind::JobPosting);
        std::fs::write(temp.path().join(&drafts.filename), "not ron at all").unwrap();
        assert_eq!(drafts.load(), None);
    }
}
