use std::collections::HashMap;

use tracing::warn;

use super::{EntityKind, MutationEngine};
use crate::{
    cache::NotificationCache,
    errors::{MutationError, MutationResult},
    models::Notification,
};

const ALL: &str = "*";

impl MutationEngine {
    pub async fn mark_read(
        &self,
        notifications: &NotificationCache,
        notification_id: &str,
    ) -> MutationResult<Notification> {
        self.signed_in()?;
        let current = notifications
            .get(notification_id)
            .ok_or(MutationError::NotFound("Notification"))?;
        if current.read {
            return Ok(current);
        }
        let _guard = self.acquire(EntityKind::Notification, notification_id)?;

        notifications.update(notification_id, |n| n.read = true);
        match self.api.mark_read(notification_id).await {
            Ok(()) => Ok(notifications
                .get(notification_id)
                .unwrap_or(Notification { read: true, ..current })),
            Err(err) => {
                warn!("Notification {} stays unread: {}", notification_id, err);
                notifications.update(notification_id, |n| n.read = false);
                Err(err.into())
            }
        }
    }

    pub async fn mark_all_read(&self, notifications: &NotificationCache) -> MutationResult<()> {
        self.signed_in()?;
        let _guard = self.acquire(EntityKind::Notification, ALL)?;

        let previous: HashMap<String, bool> = notifications
            .snapshot()
            .into_iter()
            .map(|n| (n.id, n.read))
            .collect();
        notifications.update_all(|n| n.read = true);

        match self.api.mark_all_read().await {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!("Rolling back mark-all-read: {}", err);
                notifications.update_all(|n| {
                    if let Some(read) = previous.get(&n.id) {
                        n.read = *read;
                    }
                });
                Err(err.into())
            }
        }
    }
}
