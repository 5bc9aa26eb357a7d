//! Polymorphic engagement targets.
//!
//! Relations reference one of several record kinds. Rather than carrying a
//! nullable column per kind, a reference is a [`TargetRef`]: the kind and the
//! single id travel together and cannot disagree.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use videotube_common::{AppError, AppResult, IdGenerator};

/// Kind of record an engagement can point at.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetKind {
    #[sea_orm(string_value = "video")]
    Video,
    #[sea_orm(string_value = "post")]
    Post,
    #[sea_orm(string_value = "comment")]
    Comment,
    #[sea_orm(string_value = "channel")]
    Channel,
}

impl TargetKind {
    /// Whether likes may point at this kind.
    #[must_use]
    pub const fn is_likeable(self) -> bool {
        matches!(self, Self::Video | Self::Post | Self::Comment)
    }

    /// Lower-case name used in log fields and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Post => "post",
            Self::Comment => "comment",
            Self::Channel => "channel",
        }
    }
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to exactly one engagement target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "targetType", content = "targetId", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetRef {
    Video(String),
    Post(String),
    Comment(String),
    Channel(String),
}

impl TargetRef {
    /// Build a reference from a discriminant and an id.
    #[must_use]
    pub fn new(kind: TargetKind, id: impl Into<String>) -> Self {
        let id = id.into();
        match kind {
            TargetKind::Video => Self::Video(id),
            TargetKind::Post => Self::Post(id),
            TargetKind::Comment => Self::Comment(id),
            TargetKind::Channel => Self::Channel(id),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> TargetKind {
        match self {
            Self::Video(_) => TargetKind::Video,
            Self::Post(_) => TargetKind::Post,
            Self::Comment(_) => TargetKind::Comment,
            Self::Channel(_) => TargetKind::Channel,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Video(id) | Self::Post(id) | Self::Comment(id) | Self::Channel(id) => id,
        }
    }

    /// Reject malformed ids before anything touches storage.
    pub fn validate(&self) -> AppResult<()> {
        IdGenerator::validate_named(&format!("{} id", self.kind()), self.id())
    }
}

/// The record a comment thread hangs off.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "targetType", content = "targetId", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThreadScope {
    Video(String),
    Post(String),
}

impl ThreadScope {
    /// Rebuild a scope from the two nullable comment columns.
    ///
    /// Returns `None` unless exactly one column is set.
    #[must_use]
    pub fn from_columns(video_id: Option<&str>, post_id: Option<&str>) -> Option<Self> {
        match (video_id, post_id) {
            (Some(video), None) => Some(Self::Video(video.to_string())),
            (None, Some(post)) => Some(Self::Post(post.to_string())),
            _ => None,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Video(id) | Self::Post(id) => id,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> TargetKind {
        match self {
            Self::Video(_) => TargetKind::Video,
            Self::Post(_) => TargetKind::Post,
        }
    }

    /// The scope as a general target reference.
    #[must_use]
    pub fn as_target(&self) -> TargetRef {
        TargetRef::new(self.kind(), self.id())
    }

    /// `(video_id, post_id)` column values for this scope.
    #[must_use]
    pub fn columns(&self) -> (Option<String>, Option<String>) {
        match self {
            Self::Video(id) => (Some(id.clone()), None),
            Self::Post(id) => (None, Some(id.clone())),
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        self.as_target().validate()
    }
}

impl TryFrom<TargetRef> for ThreadScope {
    type Error = AppError;

    fn try_from(target: TargetRef) -> AppResult<Self> {
        match target {
            TargetRef::Video(id) => Ok(Self::Video(id)),
            TargetRef::Post(id) => Ok(Self::Post(id)),
            other => Err(AppError::Validation(format!(
                "Comments cannot be attached to a {}",
                other.kind()
            ))),
        }
    }
}
