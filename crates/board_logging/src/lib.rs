#![deny(missing_docs)]
//! Shared logging utilities for the wizard workspace.
//!
//! The `board_*` macros forward to `log` and prefix every line with the
//! sequence number of the wizard message being dispatched on the current
//! thread (`[#0]` outside the dispatch loop, e.g. on engine threads).

use std::cell::Cell;

thread_local! {
    /// Sequence number of the message currently being dispatched on this thread.
    static DISPATCH_SEQ: Cell<u64> = const { Cell::new(0) };
}

/// Records the sequence number of the message being dispatched on this thread.
/// The application loop calls this once per dispatched message.
pub fn set_dispatch_seq(seq: u64) {
    DISPATCH_SEQ.with(|v| v.set(seq));
}

/// Returns the sequence number of the message being dispatched on this thread.
/// Returns 0 outside of a dispatch loop.
pub fn dispatch_seq() -> u64 {
    DISPATCH_SEQ.with(|v| v.get())
}

/// Logs at trace level, prefixed with the current dispatch sequence number.
#[macro_export]
macro_rules! board_trace {
    ($($arg:tt)*) => {{
        log::trace!("[#{}] {}", $crate::dispatch_seq(), format_args!($($arg)*));
    }};
}

/// Info-level counterpart of [`board_trace!`]; used for wizard milestones
/// such as step changes, score requests and submissions.
#[macro_export]
macro_rules! board_info {
    ($($arg:tt)*) => {{
        log::info!("[#{}] {}", $crate::dispatch_seq(), format_args!($($arg)*));
    }};
}

/// Debug-level counterpart of [`board_trace!`].
#[macro_export]
macro_rules! board_debug {
    ($($arg:tt)*) => {{
        log::debug!("[#{}] {}", $crate::dispatch_seq(), format_args!($($arg)*));
    }};
}

/// Warn-level counterpart of [`board_trace!`]; dropped edits and failed
/// requests land here.
#[macro_export]
macro_rules! board_warn {
    ($($arg:tt)*) => {{
        log::warn!("[#{}] {}", $crate::dispatch_seq(), format_args!($($arg)*));
    }};
}

/// Error-level counterpart of [`board_trace!`].
#[macro_export]
macro_rules! board_error {
    ($($arg:tt)*) => {{
        log::error!("[#{}] {}", $crate::dispatch_seq(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Another test may have installed the logger already.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macros_accept_format_arguments() {
        initialize_for_tests();
        set_dispatch_seq(3);
        board_info!("step {} of {}", 1, 4);
        board_warn!("dropped edit for {:?}", "references[2].Name");
        assert_eq!(dispatch_seq(), 3);
    }

    #[test]
    fn dispatch_seq_is_per_thread() {
        set_dispatch_seq(7);
        assert_eq!(dispatch_seq(), 7);
        let other = std::thread::spawn(dispatch_seq).join().unwrap();
        assert_eq!(other, 0);
    }
}
