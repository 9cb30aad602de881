mod comment;
mod notification;
mod post;
mod user;
pub(crate) mod wire;

pub use comment::Comment;
pub(crate) use comment::SYNTHETIC_PREFIX;
pub use notification::Notification;
pub use post::Post;
pub use user::{UserProfile, UserRef};

pub type UserId = String;
pub type PostId = String;
pub type CommentId = String;
pub type NotificationId = String;

/// Anything the caches can look up by id.
pub trait Entity: Clone {
    fn id(&self) -> &str;
}

impl Entity for Post {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Comment {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Notification {
    fn id(&self) -> &str {
        &self.id
    }
}
