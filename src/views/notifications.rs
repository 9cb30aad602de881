use std::sync::{Arc, PoisonError, RwLock};

use super::ViewStatus;
use crate::{
    cache::NotificationCache,
    dto::PaginationParams,
    errors::{ClientResult, MutationResult},
    models::Notification,
    states::AppState,
};

#[derive(Debug, Clone)]
pub struct NotificationsSnapshot {
    pub notifications: Vec<Notification>,
    pub unread: usize,
    pub page: usize,
    pub total_pages: usize,
    pub loading: bool,
    pub error: Option<String>,
    pub signed_out: bool,
}

impl NotificationsSnapshot {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

/// One page of the signed-in user's notifications.
#[derive(Clone)]
pub struct NotificationsScreen {
    app: AppState,
    notifications: NotificationCache,
    page: Arc<RwLock<PageInfo>>,
    status: ViewStatus,
}

#[derive(Debug, Clone, Copy)]
struct PageInfo {
    current: usize,
    total: usize,
    limit: usize,
}

impl NotificationsScreen {
    pub(crate) fn new(app: &AppState) -> Self {
        let params = PaginationParams::default();
        Self {
            app: app.clone(),
            notifications: NotificationCache::default(),
            page: Arc::new(RwLock::new(PageInfo {
                current: params.page,
                total: params.page,
                limit: params.limit,
            })),
            status: ViewStatus::default(),
        }
    }

    fn page_info(&self) -> PageInfo {
        *self.page.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub async fn load(&self, page: usize) -> ClientResult<()> {
        self.status.start_loading();
        let params = PaginationParams {
            page: page.max(1),
            limit: self.page_info().limit,
        };
        match self.app.api.notifications(params).await {
            Ok(fetched) => {
                self.notifications.replace_all(fetched.notifications);
                let mut info = self.page.write().unwrap_or_else(PoisonError::into_inner);
                info.current = fetched.current_page;
                info.total = fetched.total_pages.max(1);
                drop(info);
                self.status.finish_loading();
                Ok(())
            }
            Err(err) => {
                self.status.client_failed(&err);
                Err(err)
            }
        }
    }

    /// Loads the following page; stays put on the last one.
    pub async fn next_page(&self) -> ClientResult<()> {
        let info = self.page_info();
        if info.current >= info.total {
            return Ok(());
        }
        self.load(info.current + 1).await
    }

    pub async fn previous_page(&self) -> ClientResult<()> {
        let info = self.page_info();
        if info.current <= 1 {
            return Ok(());
        }
        self.load(info.current - 1).await
    }

    pub fn snapshot(&self) -> NotificationsSnapshot {
        let notifications = self.notifications.snapshot();
        let info = self.page_info();
        NotificationsSnapshot {
            unread: notifications.iter().filter(|n| !n.read).count(),
            notifications,
            page: info.current,
            total_pages: info.total,
            loading: self.status.loading(),
            error: self.status.error(),
            signed_out: self.status.signed_out(),
        }
    }

    pub async fn mark_read(&self, notification_id: &str) -> MutationResult<Notification> {
        let result = self
            .app
            .engine
            .mark_read(&self.notifications, notification_id)
            .await;
        self.status.track(result)
    }

    pub async fn mark_all_read(&self) -> MutationResult<()> {
        let result = self.app.engine.mark_all_read(&self.notifications).await;
        self.status.track(result)
    }
}
