use std::fmt;
use std::time::Duration;

use board_logging::{board_debug, board_warn};

use crate::form::{FieldRef, FormState};

pub type RequestId = u64;

/// Quiet period applied when a definition does not override it.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringKind {
    JobPosting,
    Application,
}

/// How edits to the two watched fields are gated before a request fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebouncePolicy {
    /// One timer, restarted by an edit to either field.
    #[default]
    SharedGate,
    /// One timer and stability flag per field; fires once both are stable.
    PerField,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DebounceSlot {
    Shared,
    Field(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedField {
    pub field: FieldRef,
    /// Request parameter carrying this field's value.
    pub param: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoringSpec {
    pub kind: ScoringKind,
    pub watched: [WatchedField; 2],
    pub policy: DebouncePolicy,
    pub quiet_period: Duration,
}

/// Snapshot of the watched values sent with one scoring request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreInputs {
    pub kind: ScoringKind,
    pub params: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreFailure {
    Network,
    Timeout,
    HttpStatus(u16),
    InvalidResponse,
}

impl fmt::Display for ScoreFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreFailure::Network => write!(f, "network error"),
            ScoreFailure::Timeout => write!(f, "timeout"),
            ScoreFailure::HttpStatus(code) => write!(f, "http status {code}"),
            ScoreFailure::InvalidResponse => write!(f, "invalid response"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuietTimer {
    pub slot: DebounceSlot,
    pub token: u64,
    pub delay: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseDisposition {
    Applied,
    Reset,
    Stale,
    Inert,
}

/// Debounce and request-ordering state for live scoring.
///
/// Timers live outside the core; every scheduled timer carries a generation
/// token and only the newest token for a slot is honoured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveScorer {
    spec: ScoringSpec,
    tokens: [u64; 2],
    stable: [bool; 2],
    latest_request: RequestId,
    pending: Option<RequestId>,
    score: u32,
    torn_down: bool,
}

impl LiveScorer {
    pub fn new(spec: ScoringSpec) -> Self {
        Self {
            spec,
            tokens: [0; 2],
            stable: [true; 2],
            latest_request: 0,
            pending: None,
            score: 0,
            torn_down: false,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn in_flight(&self) -> Option<RequestId> {
        self.pending
    }

    pub fn latest_request(&self) -> RequestId {
        self.latest_request
    }

    pub fn watched_index(&self, field: &FieldRef) -> Option<usize> {
        self.spec
            .watched
            .iter()
            .position(|watched| &watched.field == field)
    }

    /// Registers an edit of watched field `index` and returns the timer to (re)start.
    pub fn on_edit(&mut self, index: usize) -> Option<QuietTimer> {
        if self.torn_down || index > 1 {
            return None;
        }
        let slot = match self.spec.policy {
            DebouncePolicy::SharedGate => {
                self.tokens[0] += 1;
                DebounceSlot::Shared
            }
            DebouncePolicy::PerField => {
                self.tokens[index] += 1;
                self.stable[index] = false;
                DebounceSlot::Field(index)
            }
        };
        Some(QuietTimer {
            slot,
            token: self.current_token(slot),
            delay: self.spec.quiet_period,
        })
    }

    /// Schedules a score for values restored from a draft, once both are present.
    pub fn on_restore(&mut self, form: &FormState) -> Option<QuietTimer> {
        let all_filled = self
            .spec
            .watched
            .iter()
            .all(|watched| form.is_filled(&watched.field));
        if all_filled {
            self.on_edit(0)
        } else {
            None
        }
    }

    /// Handles an elapsed timer; returns the request to issue, if any.
    pub fn on_quiet(
        &mut self,
        slot: DebounceSlot,
        token: u64,
        form: &FormState,
    ) -> Option<(RequestId, ScoreInputs)> {
        if self.torn_down {
            return None;
        }
        if !self.slot_matches_policy(slot) || token != self.current_token(slot) {
            board_debug!("Ignoring superseded quiet period {:?} token={}", slot, token);
            return None;
        }
        if let DebounceSlot::Field(index) = slot {
            self.stable[index] = true;
            if !self.stable.iter().all(|stable| *stable) {
                return None;
            }
        }
        if !self
            .spec
            .watched
            .iter()
            .all(|watched| form.is_filled(&watched.field))
        {
            return None;
        }

        self.latest_request += 1;
        self.pending = Some(self.latest_request);
        let params = self
            .spec
            .watched
            .iter()
            .map(|watched| {
                let value = form.value(&watched.field).unwrap_or_default();
                (watched.param.clone(), value.to_string())
            })
            .collect();
        Some((
            self.latest_request,
            ScoreInputs {
                kind: self.spec.kind,
                params,
            },
        ))
    }

    /// Applies a response only when it answers the most recently issued request.
    pub fn on_response(
        &mut self,
        request_id: RequestId,
        result: Result<u32, ScoreFailure>,
    ) -> ResponseDisposition {
        if self.torn_down {
            return ResponseDisposition::Inert;
        }
        if request_id != self.latest_request {
            board_debug!(
                "Discarding stale score response {} (latest {})",
                request_id,
                self.latest_request
            );
            return ResponseDisposition::Stale;
        }
        self.pending = None;
        match result {
            Ok(grade) => {
                self.score = grade.min(100);
                ResponseDisposition::Applied
            }
            Err(failure) => {
                board_warn!("Live score request {} failed: {}", request_id, failure);
                self.score = 0;
                ResponseDisposition::Reset
            }
        }
    }

    /// Makes every later timer or response inert. Returns `false` if already torn down.
    pub fn tear_down(&mut self) -> bool {
        if self.torn_down {
            return false;
        }
        self.torn_down = true;
        self.pending = None;
        true
    }

    fn current_token(&self, slot: DebounceSlot) -> u64 {
        match slot {
            DebounceSlot::Shared => self.tokens[0],
            DebounceSlot::Field(index) => self.tokens[index.min(1)],
        }
    }

    fn slot_matches_policy(&self, slot: DebounceSlot) -> bool {
        match (self.spec.policy, slot) {
            (DebouncePolicy::SharedGate, DebounceSlot::Shared) => true,
            (DebouncePolicy::PerField, DebounceSlot::Field(index)) => index <= 1,
            _ => false,
        }
    }
}
