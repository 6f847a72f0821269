//! Feature entity families and their client-side aggregates.
//!
//! Rows are flat DTOs owned and validated by the backend. The only logic here
//! is what the dashboard computes over rows it already fetched: tallies,
//! sums, toggles and formatting.

pub mod board;
pub mod financial;
pub mod poll;
pub mod resource;
pub mod study;
pub mod trend;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, StudyhubError};

/// Display name used when a member row carries no name.
pub const ANONYMOUS: &str = "Anonymous";

/// Embedded author/member columns (`profiles(name, email)`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MemberRef {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl MemberRef {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(ANONYMOUS)
    }
}

/// Display name for an optional embedded member.
pub fn member_name(member: Option<&MemberRef>) -> &str {
    member.map(MemberRef::display_name).unwrap_or(ANONYMOUS)
}

/// What a like button press should do given the caller's existing like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeToggle {
    /// No like yet: insert one.
    Add,
    /// A like exists: delete it by id.
    Remove(Uuid),
}

impl LikeToggle {
    pub fn decide(existing_like: Option<Uuid>) -> Self {
        match existing_like {
            Some(id) => Self::Remove(id),
            None => Self::Add,
        }
    }

    /// Whether the post ends up liked after the toggle.
    pub fn liked_after(&self) -> bool {
        matches!(self, Self::Add)
    }
}

/// Trims comment text and rejects blank input before it reaches the backend.
pub fn normalize_content(content: &str) -> Result<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(StudyhubError::validation("content must not be empty"));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_display_name() {
        let named = MemberRef {
            name: Some("Park".to_string()),
            email: None,
        };
        assert_eq!(named.display_name(), "Park");
        assert_eq!(MemberRef::default().display_name(), ANONYMOUS);
        assert_eq!(member_name(None), ANONYMOUS);
    }

    #[test]
    fn test_like_toggle() {
        assert_eq!(LikeToggle::decide(None), LikeToggle::Add);
        assert!(LikeToggle::decide(None).liked_after());

        let id = Uuid::new_v4();
        let toggle = LikeToggle::decide(Some(id));
        assert_eq!(toggle, LikeToggle::Remove(id));
        assert!(!toggle.liked_after());
    }

    #[test]
    fn test_normalize_content() {
        assert_eq!(normalize_content("  hi  ").unwrap(), "hi");
        assert!(normalize_content("   ").unwrap_err().to_string().contains("empty"));
    }
}
