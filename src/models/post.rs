use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CommentId, PostId, UserId, UserRef, wire};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: PostId,
    #[serde(rename = "user")]
    pub author: UserRef,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "wire::id_set")]
    pub likes: BTreeSet<UserId>,
    #[serde(default, deserialize_with = "wire::id_list")]
    pub comments: Vec<CommentId>,
}

impl Post {
    pub fn likes_count(&self) -> usize {
        self.likes.len()
    }

    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.likes.contains(user_id)
    }

    /// Returns `true` when the like set actually changed.
    pub fn set_liked(&mut self, user_id: &str, liked: bool) -> bool {
        if liked {
            self.likes.insert(user_id.to_string())
        } else {
            self.likes.remove(user_id)
        }
    }

    pub fn is_authored_by(&self, user_id: &str) -> bool {
        self.author.id == user_id
    }
}
