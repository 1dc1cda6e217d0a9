/// The acting user
///
/// Ownership is decided by username alone; the id is carried for logging
/// and for attributing created scenarios.

use uuid::Uuid;

use crate::models::user::User;

/// Anything that can act on tasks
pub trait Identity: Send + Sync {
    /// Stable user id
    fn id(&self) -> Uuid;

    /// Username compared against `Task::owner`
    fn username(&self) -> &str;
}

impl Identity for User {
    fn id(&self) -> Uuid {
        self.id
    }

    fn username(&self) -> &str {
        &self.username
    }
}

/// A free-standing identity, for callers that have no stored user at hand
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub username: String,
}

impl Actor {
    /// Creates an actor with a fresh random id
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
        }
    }
}

impl Identity for Actor {
    fn id(&self) -> Uuid {
        self.id
    }

    fn username(&self) -> &str {
        &self.username
    }
}
