//! Profile domain model.
//!
//! Represents the display record keyed by an identity id.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Identity;
use crate::config::ProfileDefaults;

/// Display record for an authenticated identity.
///
/// Created lazily on first authenticated access, mutated only by its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    pub name: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
}

impl Profile {
    /// Builds the default profile for an identity.
    ///
    /// The name is the email local part, or `defaults.fallback_name` when the
    /// identity has no usable email.
    pub fn fallback(identity: &Identity, defaults: &ProfileDefaults) -> Self {
        let name = identity
            .email_local_part()
            .map(str::to_string)
            .unwrap_or_else(|| defaults.fallback_name.clone());

        Self {
            id: identity.id,
            email: identity.email.clone(),
            name,
            department: Some(defaults.department.clone()),
            position: Some(defaults.position.clone()),
            bio: None,
            interests: Vec::new(),
        }
    }

    /// Builds the default profile and overlays what the user entered at sign-up.
    pub fn seeded(identity: &Identity, defaults: &ProfileDefaults, details: &SignUpDetails) -> Self {
        let mut profile = Self::fallback(identity, defaults);
        if let Some(name) = details.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            profile.name = name.to_string();
        }
        profile.bio = details.bio.clone();
        profile.interests = details.interests.clone();
        profile
    }

    /// Applies a partial update in place.
    pub fn apply(&mut self, patch: &ProfilePatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(department) = &patch.department {
            self.department = Some(department.clone());
        }
        if let Some(position) = &patch.position {
            self.position = Some(position.clone());
        }
        if let Some(bio) = &patch.bio {
            self.bio = Some(bio.clone());
        }
        if let Some(interests) = &patch.interests {
            self.interests = interests.clone();
        }
    }
}

/// Partial profile update. `None` fields are left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interests: Option<Vec<String>>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Metadata entered on the sign-up form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignUpDetails {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
}
