use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result};
use board_logging::{board_debug, board_info, board_warn, set_dispatch_seq};
use bytes::Bytes;
use wizard_core::{update, AppState, Attachment, Msg, SubmissionPhase};

use super::config::AppConfig;
use super::effects::EffectRunner;
use super::logging;
use super::persistence::Drafts;
use super::ui::commands::{self, Command, HELP};
use super::ui::render;

/// Everything the main loop reacts to.
pub(crate) enum AppInput {
    Line(String),
    Engine(Msg),
    StdinClosed,
}

pub fn run_app() -> Result<()> {
    let config = AppConfig::from_env()?;
    logging::initialize(config.log);

    let definition = config.definition();
    board_info!(
        "Opening {} against {}",
        definition.kind().label(),
        config.api.base_url
    );

    let (input_tx, input_rx) = mpsc::channel::<AppInput>();
    let drafts = Drafts::new(config.draft_dir.clone(), definition.kind());
    let restored = drafts.load();
    let runner = EffectRunner::new(config.api.clone(), drafts.clone(), input_tx.clone())?;
    spawn_stdin_reader(input_tx)?;

    let mut session = Session {
        state: Some(AppState::new(&definition)),
        runner,
        seq: 0,
    };
    if let Some(draft) = restored {
        println!("Restored your saved draft.");
        session.dispatch(Msg::RestoreDraft(draft));
    }
    session.print_view();
    println!("Type help for commands.");

    while let Ok(input) = input_rx.recv() {
        match input {
            AppInput::Engine(msg) => session.dispatch(msg),
            AppInput::Line(line) => match commands::parse(&line) {
                Ok(Command::Dispatch(msg)) => session.dispatch(msg),
                Ok(Command::Attach { slot, path }) => match load_attachment(&path) {
                    Ok(attachment) => session.dispatch(Msg::FileAttached { slot, attachment }),
                    Err(err) => println!("{err:#}"),
                },
                Ok(Command::Show) => session.print_view(),
                Ok(Command::Help) => println!("{HELP}"),
                Ok(Command::Quit) => break,
                Err(err) => println!("{err:#}"),
            },
            AppInput::StdinClosed => break,
        }
        if session.is_done() {
            break;
        }
        prompt();
    }

    session.close(&drafts);
    Ok(())
}

struct Session {
    /// `None` only while `update` owns the state.
    state: Option<AppState>,
    runner: EffectRunner,
    seq: u64,
}

impl Session {
    fn dispatch(&mut self, msg: Msg) {
        let Some(state) = self.state.take() else {
            return;
        };
        self.seq += 1;
        set_dispatch_seq(self.seq);
        board_debug!("dispatch {}", msg_name(&msg));

        let (mut state, effects) = update(state, msg);
        let was_dirty = state.consume_dirty();
        let view = state.view();
        self.state = Some(state);
        self.runner.run(effects);

        if was_dirty {
            print_lines(&render::render(&view));
        }
    }

    fn print_view(&self) {
        if let Some(state) = &self.state {
            print_lines(&render::render(&state.view()));
        }
    }

    fn is_done(&self) -> bool {
        self.state.as_ref().is_some_and(AppState::is_done)
    }

    /// Tears the form down and keeps unsent text for next time.
    fn close(mut self, drafts: &Drafts) {
        if matches!(
            self.state.as_ref().map(AppState::phase),
            Some(SubmissionPhase::Submitting)
        ) {
            board_warn!("Closing while a submission is in flight; it will be abandoned");
        }
        self.dispatch(Msg::TornDown);
        if let Some(draft) = self.state.as_ref().and_then(AppState::draft) {
            drafts.save(&draft);
            println!("Draft saved.");
        }
        board_info!("Session closed after {} messages", self.seq);
    }
}

fn spawn_stdin_reader(input_tx: mpsc::Sender<AppInput>) -> Result<()> {
    thread::Builder::new()
        .name("wizard-stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if input_tx.send(AppInput::Line(line)).is_err() {
                    return;
                }
            }
            let _ = input_tx.send(AppInput::StdinClosed);
        })
        .context("spawning the input thread")?;
    Ok(())
}

fn load_attachment(path: &Path) -> Result<Attachment> {
    let bytes = std::fs::read(path).with_context(|| format!("could not read {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("{} has no usable file name", path.display()))?
        .to_string();
    Ok(Attachment {
        mime: mime_for(&file_name).to_string(),
        file_name,
        bytes: Bytes::from(bytes),
    })
}

fn mime_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// Variant name only; values may hold personal data.
fn msg_name(msg: &Msg) -> &'static str {
    match msg {
        Msg::FieldEdited { .. } => "FieldEdited",
        Msg::ItemAdded(_) => "ItemAdded",
        Msg::ItemRemoved { .. } => "ItemRemoved",
        Msg::FileAttached { .. } => "FileAttached",
        Msg::FileDetached { .. } => "FileDetached",
        Msg::NextClicked => "NextClicked",
        Msg::BackClicked => "BackClicked",
        Msg::SubmitClicked => "SubmitClicked",
        Msg::QuietPeriodElapsed { .. } => "QuietPeriodElapsed",
        Msg::ScoreArrived { .. } => "ScoreArrived",
        Msg::SubmissionFinished { .. } => "SubmissionFinished",
        Msg::RestoreDraft(_) => "RestoreDraft",
        Msg::TornDown => "TornDown",
    }
}

fn print_lines(lines: &[String]) {
    let mut out = io::stdout().lock();
    for line in lines {
        let _ = writeln!(out, "{line}");
    }
}

fn prompt() {
    let mut out = io::stdout().lock();
    let _ = write!(out, "> ");
    let _ = out.flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_follows_extension() {
        assert_eq!(mime_for("CV.PDF"), "application/pdf");
        assert_eq!(mime_for("photo.jpeg"), "image/jpeg");
        assert_eq!(mime_for("notes"), "application/octet-stream");
    }

    #[test]
    fn attachment_reads_file_bytes() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("cv.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let attachment = load_attachment(&path).unwrap();
        assert_eq!(attachment.file_name, "cv.pdf");
        assert_eq!(attachment.mime, "application/pdf");
        assert_eq!(attachment.bytes, Bytes::from_static(b"%PDF-1.4"));

        assert!(load_attachment(&temp.path().join("missing.pdf")).is_err());
    }
}
