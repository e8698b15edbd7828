//! Data model for notes, version snapshots, and share grants.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// Closed set of note categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteCategory {
    Work,
    Personal,
    Education,
}

impl NoteCategory {
    /// Database/wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteCategory::Work => "Work",
            NoteCategory::Personal => "Personal",
            NoteCategory::Education => "Education",
        }
    }
}

impl fmt::Display for NoteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Work" => Ok(NoteCategory::Work),
            "Personal" => Ok(NoteCategory::Personal),
            "Education" => Ok(NoteCategory::Education),
            other => Err(Error::Validation(format!(
                "Category must be Work, Personal, or Education (got '{}')",
                other
            ))),
        }
    }
}

/// Permission level attached to a share grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SharePermission {
    Read,
    Edit,
}

impl SharePermission {
    pub fn as_str(&self) -> &'static str {
        match self {
            SharePermission::Read => "read",
            SharePermission::Edit => "edit",
        }
    }
}

impl fmt::Display for SharePermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SharePermission {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(SharePermission::Read),
            "edit" => Ok(SharePermission::Edit),
            _ => Err(Error::Validation(
                "Permission must be \"read\" or \"edit\"".to_string(),
            )),
        }
    }
}

/// A principal's effective permission on a note.
///
/// `None` covers both "note does not exist" and "exists but no grant";
/// callers translate it into a uniform not-found outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteAccess {
    None,
    Read,
    Edit,
    Owner,
}

impl NoteAccess {
    /// Whether the principal may see the note at all.
    pub fn can_read(&self) -> bool {
        !matches!(self, NoteAccess::None)
    }

    /// Whether the principal may mutate the note (update/revert).
    pub fn can_edit(&self) -> bool {
        matches!(self, NoteAccess::Edit | NoteAccess::Owner)
    }

    /// Whether the principal owns the note (delete/share/unshare).
    pub fn is_owner(&self) -> bool {
        matches!(self, NoteAccess::Owner)
    }
}

impl From<SharePermission> for NoteAccess {
    fn from(p: SharePermission) -> Self {
        match p {
            SharePermission::Read => NoteAccess::Read,
            SharePermission::Edit => NoteAccess::Edit,
        }
    }
}

/// A note as stored. `version` is the optimistic-lock counter; `deleted_at`
/// marks logical deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub content: String,
    pub category: Option<NoteCategory>,
    pub version: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
}

/// Immutable snapshot of a note's content/category at one version number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionSnapshot {
    pub id: Uuid,
    pub note_id: Uuid,
    pub content: String,
    pub category: Option<NoteCategory>,
    pub version_number: i32,
    pub created_by: Uuid,
    pub created_at_utc: DateTime<Utc>,
}

/// A share grant: `grantee_id` may read or edit `note_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareGrant {
    pub id: Uuid,
    pub note_id: Uuid,
    pub grantee_id: Uuid,
    pub permission: SharePermission,
    pub granted_by: Uuid,
    pub created_at_utc: DateTime<Utc>,
}

/// A registered user. Credentials live with the auth collaborator, not here.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub created_at_utc: DateTime<Utc>,
}

/// Request to create a note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNoteRequest {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<NoteCategory>,
}

/// Request to update a note. Fields left `None` stay unchanged;
/// `expected_version` opts into an early optimistic-lock check.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateNoteRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<NoteCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_version: Option<i32>,
}

/// Addressing for a share grantee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ShareTarget {
    UserId(Uuid),
    Username(String),
}

/// A share grant joined with the grantee's username, for the owner's
/// "who has access" view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteShareInfo {
    pub id: Uuid,
    pub grantee_id: Uuid,
    pub grantee_username: String,
    pub permission: SharePermission,
    pub created_at_utc: DateTime<Utc>,
}

/// A note shared with the requesting user, with the grant that exposes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedNote {
    pub note: Note,
    pub permission: SharePermission,
    pub shared_by: Uuid,
}
