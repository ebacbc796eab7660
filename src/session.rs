//! The signed-in user, shared explicitly with every widget controller.
//!
//! Controllers receive a [`Session`] at construction and read the user at
//! request time, so a sign-out takes effect on the next queued request.

use std::sync::Arc;

use tokio::sync::watch;

use crate::config::SessionConfig;

pub const ADMIN_ROLE: &str = "ROLE_ADMIN";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: String,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: "ROLE_USER".to_string(),
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

/// Single source of truth for the current user. Clones share state.
#[derive(Debug, Clone)]
pub struct Session {
    user: Arc<watch::Sender<Option<User>>>,
}

impl Session {
    pub fn new(user: Option<User>) -> Self {
        let (tx, _rx) = watch::channel(user);
        Self { user: Arc::new(tx) }
    }

    pub fn anonymous() -> Self {
        Self::new(None)
    }

    /// Build the initial session from the `[session]` config section.
    pub fn from_config(config: &SessionConfig) -> Self {
        let user = config.user_id.as_ref().map(|id| {
            let mut user = User::new(id.clone(), config.user_name.clone().unwrap_or_default());
            if let Some(role) = &config.role {
                user.role = role.clone();
            }
            user
        });
        Self::new(user)
    }

    pub fn current(&self) -> Option<User> {
        self.user.borrow().clone()
    }

    pub fn user_id(&self) -> Option<String> {
        self.user.borrow().as_ref().map(|u| u.id.clone())
    }

    pub fn is_admin(&self) -> bool {
        self.user.borrow().as_ref().is_some_and(User::is_admin)
    }

    pub fn sign_in(&self, user: User) {
        tracing::info!(user_id = %user.id, "Signed in");
        self.user.send_replace(Some(user));
    }

    pub fn sign_out(&self) {
        if self.user.send_replace(None).is_some() {
            tracing::info!("Signed out");
        }
    }

    /// Receive every change of the signed-in user.
    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.user.subscribe()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::anonymous()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_in_and_out() {
        let session = Session::anonymous();
        assert_eq!(session.user_id(), None);

        session.sign_in(User::new("u1", "Ada"));
        assert_eq!(session.user_id().as_deref(), Some("u1"));
        assert!(!session.is_admin());

        session.sign_out();
        assert_eq!(session.current(), None);
    }

    #[test]
    fn clones_share_the_user() {
        let session = Session::anonymous();
        let other = session.clone();
        session.sign_in(User::new("u2", "Lin").with_role(ADMIN_ROLE));
        assert!(other.is_admin());
    }

    #[test]
    fn from_config_maps_role() {
        let config = SessionConfig {
            user_id: Some("42".into()),
            user_name: None,
            role: Some("ROLE_ADMIN".into()),
        };
        let session = Session::from_config(&config);
        let user = session.current().unwrap();
        assert_eq!(user.id, "42");
        assert!(user.is_admin());

        assert_eq!(Session::from_config(&SessionConfig::default()).current(), None);
    }

    #[tokio::test]
    async fn subscribers_see_changes() {
        let session = Session::anonymous();
        let mut rx = session.subscribe();
        session.sign_in(User::new("u3", "Kim"));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref().map(|u| u.id.as_str()), Some("u3"));
    }
}
