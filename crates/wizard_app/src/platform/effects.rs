use std::sync::mpsc;
use std::thread;

use anyhow::Context;
use board_logging::{board_debug, board_info, board_warn};
use wizard_core::{
    DebounceSlot, Effect, Msg, ScoreFailure, ScoreInputs, ScoringKind, SubmissionPayload,
    SubmitReceipt,
};
use wizard_engine::{
    ApiError, ApiSettings, EngineEvent, EngineEvents, EngineHandle, FailureKind, GradeEndpoint,
    GradeQuery, SubmitFile, SubmitRequest, SubmitResponse, TimerKey,
};

use super::app::AppInput;
use super::persistence::Drafts;

/// Carries core effects out through the engine and feeds engine events back as messages.
pub struct EffectRunner {
    engine: EngineHandle,
    drafts: Drafts,
}

impl EffectRunner {
    pub fn new(
        settings: ApiSettings,
        drafts: Drafts,
        input_tx: mpsc::Sender<AppInput>,
    ) -> anyhow::Result<Self> {
        let (engine, events) = EngineHandle::new(settings).context("starting the engine")?;
        spawn_event_pump(events, input_tx)?;
        Ok(Self { engine, drafts })
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartQuietTimer(timer) => {
                    self.engine
                        .start_timer(slot_key(timer.slot), timer.token, timer.delay);
                }
                Effect::RequestScore { request_id, inputs } => {
                    board_info!(
                        "RequestScore request_id={} params={}",
                        request_id,
                        inputs.params.len()
                    );
                    self.engine.grade(request_id, grade_query(inputs));
                }
                Effect::CancelScoring => self.engine.cancel_scoring(),
                Effect::Submit { payload } => {
                    board_info!(
                        "Submit path={} fields={} files={}",
                        payload.path,
                        payload.fields.len(),
                        payload.files.len()
                    );
                    self.engine.submit(submit_request(payload));
                }
                Effect::Redirect { location } => {
                    board_info!("Redirect to {}", location);
                    println!("Continue at {location}");
                }
                Effect::DiscardDraft => self.drafts.discard(),
            }
        }
    }
}

fn spawn_event_pump(events: EngineEvents, input_tx: mpsc::Sender<AppInput>) -> anyhow::Result<()> {
    thread::Builder::new()
        .name("wizard-events".to_string())
        .spawn(move || {
            while let Some(event) = events.recv() {
                if input_tx.send(AppInput::Engine(event_msg(event))).is_err() {
                    break;
                }
            }
            board_debug!("Engine event stream closed");
        })
        .context("spawning the engine event thread")?;
    Ok(())
}

fn event_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::QuietPeriodElapsed { key, token } => Msg::QuietPeriodElapsed {
            slot: key_slot(key),
            token,
        },
        EngineEvent::ScoreCompleted { request_id, result } => Msg::ScoreArrived {
            request_id,
            result: result.map_err(|err| score_failure(&err)),
        },
        EngineEvent::SubmissionCompleted { result } => Msg::SubmissionFinished {
            result: result.map(receipt).map_err(|err| submit_message(&err)),
        },
    }
}

fn slot_key(slot: DebounceSlot) -> TimerKey {
    match slot {
        DebounceSlot::Shared => 0,
        DebounceSlot::Field(index) => 1 + index as TimerKey,
    }
}

fn key_slot(key: TimerKey) -> DebounceSlot {
    match key {
        0 => DebounceSlot::Shared,
        key => DebounceSlot::Field(usize::from(key - 1)),
    }
}

fn grade_query(inputs: ScoreInputs) -> GradeQuery {
    GradeQuery {
        endpoint: match inputs.kind {
            ScoringKind::JobPosting => GradeEndpoint::JobPosting,
            ScoringKind::Application => GradeEndpoint::Application,
        },
        params: inputs.params,
    }
}

fn submit_request(payload: SubmissionPayload) -> SubmitRequest {
    SubmitRequest {
        path: payload.path,
        fields: payload.fields,
        files: payload
            .files
            .into_iter()
            .map(|file| SubmitFile {
                name: file.name,
                file_name: file.file_name,
                mime: file.mime,
                bytes: file.bytes,
            })
            .collect(),
    }
}

fn score_failure(err: &ApiError) -> ScoreFailure {
    match err.kind {
        FailureKind::Timeout => ScoreFailure::Timeout,
        FailureKind::HttpStatus(code) => ScoreFailure::HttpStatus(code),
        FailureKind::InvalidResponse | FailureKind::TooLarge { .. } => {
            ScoreFailure::InvalidResponse
        }
        FailureKind::InvalidUrl | FailureKind::InvalidRequest | FailureKind::Network => {
            ScoreFailure::Network
        }
    }
}

fn receipt(response: SubmitResponse) -> SubmitReceipt {
    SubmitReceipt {
        id: response.id,
        redirect: response.redirect,
    }
}

/// One line the user can act on; backend details are shown when the server sent some.
fn submit_message(err: &ApiError) -> String {
    match err.kind {
        FailureKind::HttpStatus(code) if !err.message.is_empty() => {
            format!("Submission rejected ({code}): {}", err.message)
        }
        FailureKind::Timeout => "Submission timed out; try again.".to_string(),
        _ => {
            board_warn!("Submission failed: {}", err);
            "Submission failed; check your connection and try again.".to_string()
        }
    }
}
