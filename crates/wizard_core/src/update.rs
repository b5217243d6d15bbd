use board_logging::{board_debug, board_info, board_warn};

use crate::form::FieldRef;
use crate::payload::SubmissionPayload;
use crate::scorer::ResponseDisposition;
use crate::state::SubmissionPhase;
use crate::step::NavOutcome;
use crate::{AppState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    if state.is_done() && accepts_only_while_editing(&msg) {
        board_debug!("Form already submitted; ignoring {:?}", msg);
        return (state, Vec::new());
    }

    let effects = match msg {
        Msg::FieldEdited { field, value } => {
            if !state.form_mut().set_field(&field, value) {
                state.set_notice(Some(format!("No such field: {field}")));
                state.mark_dirty();
                return (state, Vec::new());
            }
            state.navigator_mut().clear_invalid(&field);
            state.set_notice(None);
            state.mark_dirty();
            restart_quiet_timer(&mut state, &field)
        }
        Msg::ItemAdded(template) => {
            let section = template.section();
            let index = state.form_mut().add_item(&template);
            board_debug!("Added {} entry {}", section, index);
            state.set_notice(None);
            state.mark_dirty();
            Vec::new()
        }
        Msg::ItemRemoved { section, index } => {
            match state.form_mut().remove_item(section, index) {
                Ok(()) => {
                    state.navigator_mut().forget_section(section);
                    state.set_notice(None);
                }
                Err(err) => {
                    board_info!("Removal rejected: {}", err);
                    state.set_notice(Some(err.to_string()));
                }
            }
            state.mark_dirty();
            Vec::new()
        }
        Msg::FileAttached { slot, attachment } => {
            board_info!(
                "Attached {} to slot {} ({} bytes)",
                attachment.file_name,
                slot,
                attachment.bytes.len()
            );
            state
                .navigator_mut()
                .clear_invalid(&FieldRef::Attachment(slot.clone()));
            state.form_mut().attach(slot, attachment);
            state.set_notice(None);
            state.mark_dirty();
            Vec::new()
        }
        Msg::FileDetached { slot } => {
            if state.form_mut().detach(&slot).is_some() {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::NextClicked => {
            let form = state.form().clone();
            let notice = match state.navigator_mut().next(&form) {
                NavOutcome::Advanced { to } => {
                    board_debug!("Advanced to step {}", to);
                    None
                }
                NavOutcome::Blocked { missing } => {
                    Some(format!("{} required field(s) missing", missing.len()))
                }
                NavOutcome::AtFinalStep => Some("Last step reached; submit to finish".to_string()),
            };
            state.set_notice(notice);
            state.mark_dirty();
            Vec::new()
        }
        Msg::BackClicked => {
            state.navigator_mut().back();
            state.set_notice(None);
            state.mark_dirty();
            Vec::new()
        }
        Msg::SubmitClicked => submit(&mut state),
        Msg::QuietPeriodElapsed { slot, token } => {
            let form = state.form().clone();
            match state
                .scorer_mut()
                .and_then(|scorer| scorer.on_quiet(slot, token, &form))
            {
                Some((request_id, inputs)) => {
                    board_debug!("Issuing live score request {}", request_id);
                    state.mark_dirty();
                    vec![Effect::RequestScore { request_id, inputs }]
                }
                None => Vec::new(),
            }
        }
        Msg::ScoreArrived { request_id, result } => {
            let disposition = state
                .scorer_mut()
                .map(|scorer| scorer.on_response(request_id, result));
            if matches!(
                disposition,
                Some(ResponseDisposition::Applied | ResponseDisposition::Reset)
            ) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::SubmissionFinished { result } => {
            if *state.phase() != SubmissionPhase::Submitting {
                board_warn!("Submission result arrived outside of a submission");
                return (state, Vec::new());
            }
            state.mark_dirty();
            match result {
                Ok(receipt) => {
                    board_info!("Submission accepted (id {:?})", receipt.id);
                    state.set_phase(SubmissionPhase::Done {
                        redirect: receipt.redirect.clone(),
                    });
                    state.set_submit_error(None);
                    state.set_notice(None);
                    let mut effects = tear_down_scorer(&mut state);
                    effects.push(Effect::DiscardDraft);
                    if let Some(location) = receipt.redirect {
                        effects.push(Effect::Redirect { location });
                    }
                    effects
                }
                Err(message) => {
                    board_warn!("Submission failed: {}", message);
                    state.set_phase(SubmissionPhase::Editing);
                    state.set_submit_error(Some(message));
                    Vec::new()
                }
            }
        }
        Msg::RestoreDraft(draft) => {
            state.restore_draft(draft);
            state.set_notice(Some("Draft restored".to_string()));
            state.mark_dirty();
            let form = state.form().clone();
            state
                .scorer_mut()
                .and_then(|scorer| scorer.on_restore(&form))
                .map(Effect::StartQuietTimer)
                .into_iter()
                .collect()
        }
        Msg::TornDown => tear_down_scorer(&mut state),
    };

    (state, effects)
}

fn accepts_only_while_editing(msg: &Msg) -> bool {
    !matches!(
        msg,
        Msg::QuietPeriodElapsed { .. }
            | Msg::ScoreArrived { .. }
            | Msg::SubmissionFinished { .. }
            | Msg::TornDown
    )
}

fn restart_quiet_timer(state: &mut AppState, field: &FieldRef) -> Vec<Effect> {
    let Some(scorer) = state.scorer_mut() else {
        return Vec::new();
    };
    scorer
        .watched_index(field)
        .and_then(|index| scorer.on_edit(index))
        .map(Effect::StartQuietTimer)
        .into_iter()
        .collect()
}

fn submit(state: &mut AppState) -> Vec<Effect> {
    if *state.phase() == SubmissionPhase::Submitting {
        board_debug!("Submit ignored; a submission is already in flight");
        return Vec::new();
    }
    state.mark_dirty();
    if !state.navigator().is_final() {
        state.set_notice(Some("Finish the remaining steps first".to_string()));
        return Vec::new();
    }
    let form = state.form().clone();
    if let Err(missing) = state.navigator_mut().validate_current(&form) {
        state.set_notice(Some(format!(
            "{} required field(s) missing",
            missing.len()
        )));
        return Vec::new();
    }
    match SubmissionPayload::build(state.submit_path(), &form) {
        Ok(payload) => {
            board_info!(
                "Submitting {} field(s) and {} file(s) to {}",
                payload.fields.len(),
                payload.files.len(),
                payload.path
            );
            state.set_phase(SubmissionPhase::Submitting);
            state.set_submit_error(None);
            state.set_notice(None);
            vec![Effect::Submit { payload }]
        }
        Err(err) => {
            state.set_submit_error(Some(err.to_string()));
            Vec::new()
        }
    }
}

fn tear_down_scorer(state: &mut AppState) -> Vec<Effect> {
    match state.scorer_mut() {
        Some(scorer) => {
            if scorer.tear_down() {
                vec![Effect::CancelScoring]
            } else {
                Vec::new()
            }
        }
        None => Vec::new(),
    }
}
