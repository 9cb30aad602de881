use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CommentId, PostId, UserId, UserRef, wire};

/// Prefix of ids minted locally for comments the server has not confirmed yet.
pub(crate) const SYNTHETIC_PREFIX: &str = "local-";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: CommentId,
    #[serde(default, deserialize_with = "wire::id")]
    pub post: PostId,
    #[serde(rename = "user")]
    pub author: UserRef,
    pub content: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "wire::id_set")]
    pub likes: BTreeSet<UserId>,
}

impl Comment {
    pub fn is_synthetic(&self) -> bool {
        self.id.starts_with(SYNTHETIC_PREFIX)
    }

    pub fn likes_count(&self) -> usize {
        self.likes.len()
    }

    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.likes.contains(user_id)
    }

    pub fn set_liked(&mut self, user_id: &str, liked: bool) -> bool {
        if liked {
            self.likes.insert(user_id.to_string())
        } else {
            self.likes.remove(user_id)
        }
    }
}
