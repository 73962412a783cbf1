//! Conversation state
//!
//! The typed session, the transition table, inbound events and outbound
//! replies, session storage, and the machine that ties them together.

pub mod engine;
pub mod events;
pub mod machine;
pub mod replies;
pub mod session;
pub mod storage;
pub mod transitions;

pub use engine::ConversationEngine;
pub use events::{Event, Token};
pub use machine::{ContactSettings, ConversationMachine, Transition};
pub use replies::{CompetitionChoice, ConfirmationCard, Prompt, Reply};
pub use session::Session;
pub use storage::{MemorySessionStore, RedisSessionStore, SessionStore};
pub use transitions::{resolve_certificate, CertificateOutcome, State};
