//! Acting principal attached to commands and events.

use serde::{Deserialize, Serialize};

use crate::id::UserId;

/// Who issued a command (and therefore who is recorded on the resulting events).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Actor {
    /// An interactive user.
    User(UserId),
    /// An API client acting on its own behalf.
    Client(String),
}

impl Actor {
    /// The user behind this actor, if it is a user.
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Actor::User(id) => Some(*id),
            Actor::Client(_) => None,
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Actor::User(_))
    }
}

impl core::fmt::Display for Actor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Actor::User(id) => write!(f, "user:{id}"),
            Actor::Client(id) => write!(f, "client:{id}"),
        }
    }
}
