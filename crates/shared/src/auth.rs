//! Authentication types carried by access tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Role of the authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access, including deletions.
    Admin,
    /// Training provider staff: plans sessions, manages the catalog.
    Staff,
    /// Partner school contact.
    School,
    /// Trainer.
    Trainer,
}

impl Role {
    /// Returns the string representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Staff => "staff",
            Self::School => "school",
            Self::Trainer => "trainer",
        }
    }

    /// Parses a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "staff" => Some(Self::Staff),
            "school" => Some(Self::School),
            "trainer" => Some(Self::Trainer),
            _ => None,
        }
    }

    /// Returns true for provider-side roles.
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        matches!(self, Self::Admin | Self::Staff)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// User's role.
    pub role: Role,
    /// School the user represents (school role only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<Uuid>,
    /// Trainer profile of the user (trainer role only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trainer: Option<Uuid>,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(user_id: Uuid, role: Role, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            role,
            school: None,
            trainer: None,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Attaches the school scope.
    #[must_use]
    pub const fn with_school(mut self, school_id: Uuid) -> Self {
        self.school = Some(school_id);
        self
    }

    /// Attaches the trainer scope.
    #[must_use]
    pub const fn with_trainer(mut self, trainer_id: Uuid) -> Self {
        self.trainer = Some(trainer_id);
        self
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.sub
    }
}
