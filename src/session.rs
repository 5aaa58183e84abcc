//! Client session and the authentication collaborator.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::auth::API_KEY_HEADER;
use crate::errors::AppError;
use crate::models::{Role, SessionInfo, User};

/// Which top-level screen the client shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Welcome,
    Login,
    App,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub api_key: String,
}

/// External identity check.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<User, AppError>;
    async fn logout(&self) -> Result<(), AppError>;
}

/// Who is using the client and in which mode.
#[derive(Debug, Clone)]
pub struct Session {
    user: Option<User>,
    view_only: bool,
    screen: Screen,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            user: None,
            view_only: false,
            screen: Screen::Welcome,
        }
    }
}

impl Session {
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn is_view_only(&self) -> bool {
        self.view_only
    }

    /// Editing needs an admin who has not chosen view-only mode.
    pub fn can_edit(&self) -> bool {
        !self.view_only && self.user.as_ref().is_some_and(|u| u.role == Role::Admin)
    }

    pub fn show_login(&mut self) {
        self.screen = Screen::Login;
    }

    pub fn cancel_login(&mut self) {
        self.screen = Screen::Welcome;
    }

    pub fn signed_in(&mut self, user: User) {
        self.user = Some(user);
        self.view_only = false;
        self.screen = Screen::App;
    }

    pub fn enter_view_only(&mut self) {
        self.user = Some(User::guest());
        self.view_only = true;
        self.screen = Screen::App;
    }

    /// Back to the entry screen with nobody signed in.
    pub fn reset(&mut self) {
        self.user = None;
        self.view_only = false;
        self.screen = Screen::Welcome;
    }

    /// Greeting line shown in the app header.
    pub fn greeting(&self) -> Option<String> {
        self.user.as_ref().map(|user| {
            let mode = if self.can_edit() { "editing" } else { "read only" };
            format!("User: {} ({})", user.display_name, mode)
        })
    }
}

/// Authenticates against the roster service's session probe.
#[derive(Clone)]
pub struct HttpAuthenticator {
    client: Client,
    base_url: String,
}

impl HttpAuthenticator {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Authenticator for HttpAuthenticator {
    async fn login(&self, credentials: &Credentials) -> Result<User, AppError> {
        let response = self
            .client
            .get(format!("{}/api/session", self.base_url))
            .header(API_KEY_HEADER, &credentials.api_key)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Login request failed: {}", e)))?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(AppError::Unauthorized(
                    "Invalid credentials or connection error".to_string(),
                ))
            }
            status => {
                return Err(AppError::Internal(format!(
                    "Unexpected login response: {}",
                    status
                )))
            }
        }

        let envelope: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("Invalid login response: {}", e)))?;
        let info: SessionInfo = serde_json::from_value(envelope["data"].clone())?;

        // A key the server does not recognise as admin grants nothing to log in to.
        if info.role != Role::Admin {
            return Err(AppError::Unauthorized(
                "Invalid credentials or connection error".to_string(),
            ));
        }

        tracing::info!(username = %credentials.username, "Signed in");
        Ok(User::new(credentials.username.clone(), None, info.role))
    }

    async fn logout(&self) -> Result<(), AppError> {
        // The key lives only in the client; nothing to revoke server-side.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_flow() {
        let mut session = Session::default();
        assert_eq!(session.screen(), Screen::Welcome);

        session.show_login();
        assert_eq!(session.screen(), Screen::Login);
        session.cancel_login();
        assert_eq!(session.screen(), Screen::Welcome);

        session.signed_in(User::new("ana@example.com", None, Role::Admin));
        assert_eq!(session.screen(), Screen::App);
        assert!(session.can_edit());
        assert_eq!(session.greeting().unwrap(), "User: ana (editing)");

        session.reset();
        assert!(session.user().is_none());
        assert_eq!(session.screen(), Screen::Welcome);
        assert!(!session.can_edit());
    }

    #[test]
    fn test_view_only_cannot_edit() {
        let mut session = Session::default();
        session.enter_view_only();

        assert!(session.is_view_only());
        assert_eq!(session.user().unwrap().role, Role::Viewer);
        assert!(!session.can_edit());
        assert_eq!(session.greeting().unwrap(), "User: Guest (read only)");
    }
}
