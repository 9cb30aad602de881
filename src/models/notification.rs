use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{NotificationId, PostId, UserId, UserRef, wire};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "_id")]
    pub id: NotificationId,
    #[serde(default, deserialize_with = "wire::id")]
    pub recipient: UserId,
    pub sender: UserRef,
    #[serde(default, deserialize_with = "wire::optional_id")]
    pub post: Option<PostId>,
    /// `like`, `comment`, `follow`, ...
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}
