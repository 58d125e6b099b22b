//! Interview session management
//!
//! This module provides the `InterviewSession` orchestrator that manages:
//! - The call lifecycle (Inactive → Connecting → Active → Finished)
//! - The question loop: speak, listen (with manual fallback), follow up, advance
//! - Transcript collection
//! - One-time feedback finalization and the resulting navigation

mod config;
mod session;
mod stats;
mod status;
mod transcript;

pub use config::{SessionConfig, SessionMode, SessionTimings, UserContext};
pub use session::{
    greeting, Collaborators, InterviewSession, SessionOutcome, COMPLETION_MESSAGE,
    GENERATE_MODE_MESSAGE,
};
pub use stats::SessionStats;
pub use status::{CallStatus, Navigation};
pub use transcript::{Role, Transcript, Turn, NO_ANSWER};
