pub mod config;
pub mod error;
pub mod feedback;
pub mod followup;
pub mod http;
pub mod session;
pub mod speech;

pub use config::Config;
pub use error::{CaptureError, FinalizeError, FollowupError, InterviewError};
pub use feedback::{FeedbackFactory, FeedbackFinalizer, FinalizeRequest};
pub use followup::{FollowupFactory, FollowupRequest, FollowupRequester};
pub use http::{create_router, AppState};
pub use session::{
    CallStatus, Collaborators, InterviewSession, Navigation, SessionConfig, SessionOutcome,
    SessionStats, Turn, UserContext,
};
pub use speech::{ManualEntry, RecognitionBackend, SpeechFactory, SpeechSynthesizer};
