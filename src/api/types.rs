//! Wire types, one fixed schema per endpoint.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The six reactions a user can leave on a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReactionType {
    Like,
    Love,
    Haha,
    Wow,
    Sad,
    Angry,
}

impl ReactionType {
    pub const ALL: [ReactionType; 6] = [
        ReactionType::Like,
        ReactionType::Love,
        ReactionType::Haha,
        ReactionType::Wow,
        ReactionType::Sad,
        ReactionType::Angry,
    ];

    /// Upper-case name used on the wire and in query strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionType::Like => "LIKE",
            ReactionType::Love => "LOVE",
            ReactionType::Haha => "HAHA",
            ReactionType::Wow => "WOW",
            ReactionType::Sad => "SAD",
            ReactionType::Angry => "ANGRY",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            ReactionType::Like => "👍",
            ReactionType::Love => "❤️",
            ReactionType::Haha => "😆",
            ReactionType::Wow => "😮",
            ReactionType::Sad => "😢",
            ReactionType::Angry => "😠",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReactionType::Like => "Like",
            ReactionType::Love => "Love",
            ReactionType::Haha => "Haha",
            ReactionType::Wow => "Wow",
            ReactionType::Sad => "Sad",
            ReactionType::Angry => "Angry",
        }
    }
}

impl fmt::Display for ReactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown reaction type '{0}'")]
pub struct ParseReactionError(pub String);

impl FromStr for ReactionType {
    type Err = ParseReactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReactionType::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseReactionError(s.to_string()))
    }
}

/// `GET /api/reactions/post/{postId}` and the set/clear responses.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReactionSummary {
    pub total: u64,
    pub reactions: BTreeMap<ReactionType, u64>,
}

/// `GET /api/reactions/user`.
///
/// The `type` key is required (it may be `null`) and no other keys are
/// accepted, so an error body never reads as "no reaction".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserReactionResponse {
    #[serde(rename = "type", deserialize_with = "Option::deserialize")]
    pub reaction_type: Option<ReactionType>,
}

/// `POST /api/comments/{commentId}/react`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentLikeResponse {
    pub like_count: u64,
    pub user_liked: bool,
}
