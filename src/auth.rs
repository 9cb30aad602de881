use tracing::{info, warn};
use validator::Validate;

use crate::{
    dto::{AuthResponse, LoginRequest, RegisterRequest},
    errors::ClientResult,
    session::Session,
    states::AppState,
};

impl AppState {
    /// POST /auth/login, then persist the session.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<Session> {
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        request.validate()?;

        let response = self.api.login(&request).await?;
        Ok(self.start_session(response))
    }

    /// POST /auth/register, then persist the session.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> ClientResult<Session> {
        let request = RegisterRequest {
            username: username.trim().to_string(),
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        request.validate()?;

        let response = self.api.register(&request).await?;
        Ok(self.start_session(response))
    }

    /// Startup check against GET /auth/me. Any authentication failure wipes
    /// the stored session; other failures (offline, 5xx) keep it.
    pub async fn check_auth(&self) -> bool {
        if !self.session.is_signed_in() {
            return false;
        }
        match self.api.current_user().await {
            Ok(profile) => {
                self.session.set_profile_picture(profile.profile_picture);
                true
            }
            Err(err) if err.is_auth_failure() => {
                warn!("Stored session rejected, signing out");
                self.logout();
                false
            }
            Err(err) => {
                warn!("Could not verify session: {}", err);
                true
            }
        }
    }

    pub fn logout(&self) {
        self.session.end();
        self.follows.reset(None);
    }

    fn start_session(&self, response: AuthResponse) -> Session {
        let session = Session {
            token: response.token,
            user_id: response.user.id,
            username: response.user.username,
            profile_picture: response.user.profile_picture,
        };
        self.follows.reset(Some(session.user_id.clone()));
        self.session.begin(session.clone());
        info!("Session started for {}", session.user_id);
        session
    }
}
