use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use board_logging::{board_debug, board_info, board_warn};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::api::{ApiSettings, GradeClient, ReqwestApi, Submitter};
use crate::debounce::TimerSet;
use crate::{ApiError, EngineEvent, GradeQuery, RequestId, SubmitRequest, TimerKey};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("could not start the async runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("could not build the api client: {0}")]
    Api(#[from] ApiError),
    #[error("could not spawn the engine thread: {0}")]
    Thread(std::io::Error),
}

enum EngineCommand {
    StartTimer {
        key: TimerKey,
        token: u64,
        delay: Duration,
    },
    Grade {
        request_id: RequestId,
        query: GradeQuery,
    },
    CancelScoring,
    Submit {
        request: SubmitRequest,
    },
}

/// Cancellation scope for scoring requests; dropping it cancels them all.
struct ScoringScope {
    token: CancellationToken,
}

impl ScoringScope {
    fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    fn child(&self) -> CancellationToken {
        self.token.child_token()
    }

    fn reset(&mut self) {
        self.token.cancel();
        self.token = CancellationToken::new();
    }
}

impl Drop for ScoringScope {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Command side of the engine. Dropping it stops the worker thread, its
/// pending timers and any in-flight scoring.
pub struct EngineHandle {
    cmd_tx: Option<mpsc::Sender<EngineCommand>>,
    worker: Option<thread::JoinHandle<()>>,
}

/// Event side of the engine.
pub struct EngineEvents {
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineEvents {
    /// Blocks until the next event; `None` once the engine is gone.
    pub fn recv(&self) -> Option<EngineEvent> {
        self.event_rx.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }
}

impl EngineHandle {
    pub fn new(settings: ApiSettings) -> Result<(Self, EngineEvents), EngineError> {
        let api = Arc::new(ReqwestApi::new(settings)?);
        Self::with_clients(api.clone(), api)
    }

    pub fn with_clients(
        grader: Arc<dyn GradeClient>,
        submitter: Arc<dyn Submitter>,
    ) -> Result<(Self, EngineEvents), EngineError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("wizard-engine-io")
            .enable_all()
            .build()?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        let worker = thread::Builder::new()
            .name("wizard-engine".to_string())
            .spawn(move || {
                let handle = runtime.handle().clone();
                let mut timers = TimerSet::new();
                let mut scope = ScoringScope::new();
                while let Ok(command) = cmd_rx.recv() {
                    match command {
                        EngineCommand::StartTimer { key, token, delay } => {
                            let event_tx = event_tx.clone();
                            timers.restart(key, &handle, delay, move || {
                                let _ = event_tx.send(EngineEvent::QuietPeriodElapsed { key, token });
                            });
                        }
                        EngineCommand::Grade { request_id, query } => {
                            let grader = grader.clone();
                            let event_tx = event_tx.clone();
                            let cancelled = scope.child();
                            handle.spawn(async move {
                                tokio::select! {
                                    _ = cancelled.cancelled() => {
                                        board_debug!("Score request {} cancelled", request_id);
                                    }
                                    result = grader.grade(&query) => {
                                        let _ = event_tx.send(EngineEvent::ScoreCompleted {
                                            request_id,
                                            result,
                                        });
                                    }
                                }
                            });
                        }
                        EngineCommand::CancelScoring => {
                            timers.cancel_all();
                            scope.reset();
                        }
                        EngineCommand::Submit { request } => {
                            let submitter = submitter.clone();
                            let event_tx = event_tx.clone();
                            handle.spawn(async move {
                                let result = submitter.submit(request).await;
                                if let Err(err) = &result {
                                    board_warn!("Submission failed: {}", err);
                                }
                                let _ = event_tx.send(EngineEvent::SubmissionCompleted { result });
                            });
                        }
                    }
                }
                drop(timers);
                drop(scope);
                runtime.shutdown_background();
                board_info!("Engine stopped");
            })
            .map_err(EngineError::Thread)?;

        Ok((
            Self {
                cmd_tx: Some(cmd_tx),
                worker: Some(worker),
            },
            EngineEvents { event_rx },
        ))
    }

    pub fn start_timer(&self, key: TimerKey, token: u64, delay: Duration) {
        self.send(EngineCommand::StartTimer { key, token, delay });
    }

    pub fn grade(&self, request_id: RequestId, query: GradeQuery) {
        self.send(EngineCommand::Grade { request_id, query });
    }

    pub fn cancel_scoring(&self) {
        self.send(EngineCommand::CancelScoring);
    }

    pub fn submit(&self, request: SubmitRequest) {
        self.send(EngineCommand::Submit { request });
    }

    fn send(&self, command: EngineCommand) {
        if let Some(tx) = &self.cmd_tx {
            if tx.send(command).is_err() {
                board_warn!("Engine thread is gone; command dropped");
            }
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.cmd_tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
