//! Recording session state machine
//!
//! Three states, no terminal one:
//! - Idle: recording never started
//! - Active: recognizer capturing
//! - Paused: capture stopped by the user, session kept

mod machine;

pub use machine::{RecordingState, RecordingStateMachine};
