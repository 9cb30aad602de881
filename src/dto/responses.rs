use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::{Notification, Post, UserId, UserRef, wire};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserRef,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowStatus {
    pub is_following: bool,
}

/// Body of a like toggle. The backend returns either the updated entity or
/// just `{ likes }`; both carry the authoritative like set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LikesResponse {
    #[serde(default, deserialize_with = "wire::optional_id_set")]
    pub likes: Option<BTreeSet<UserId>>,
}

/// Paginated notification list
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPage {
    #[serde(default)]
    pub notifications: Vec<Notification>,
    #[serde(default = "first_page")]
    pub current_page: usize,
    #[serde(default = "first_page")]
    pub total_pages: usize,
}

fn first_page() -> usize {
    1
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default)]
    pub users: Vec<UserRef>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty() && self.users.is_empty()
    }
}
