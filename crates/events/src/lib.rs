//! `appfold-events`: command/event contracts shared by domain and infrastructure.

pub mod command;
pub mod envelope;
pub mod event;
pub mod fold;
pub mod handler;

pub use command::Command;
pub use envelope::EventEnvelope;
pub use event::Event;
pub use fold::{fold, replay};
pub use handler::{CommandHandler, Decision, HandlerError};
