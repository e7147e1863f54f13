//! # Session
//!
//! What the login, signup and logout screens call. Failures come back as
//! [`ClientError`]s already titled for the alert the screen shows.
//!
//! ```text
//! sign_in  ✗ ──► ClientError::Login   ──► "Login Error"  / message
//! sign_up  ✗ ──► ClientError::Signup  ──► "Signup Error" / message
//! sign_out ✗ ──► ClientError::Auth    ──► "Error"        / message
//! ```

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::auth::{AuthGate, Identity};
use crate::error::{ClientError, ClientResult};

/// Facade over the [`AuthGate`].
#[derive(Clone)]
pub struct Session {
    auth: Arc<dyn AuthGate>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("identity", &self.auth.current_identity())
            .finish()
    }
}

impl Session {
    pub fn new(auth: Arc<dyn AuthGate>) -> Self {
        Session { auth }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> ClientResult<Identity> {
        self.auth.sign_in(email, password).await.map_err(|e| {
            warn!(error = %e, "Sign-in failed");
            ClientError::Login(e)
        })
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> ClientResult<Identity> {
        self.auth.sign_up(email, password).await.map_err(|e| {
            warn!(error = %e, "Sign-up failed");
            ClientError::Signup(e)
        })
    }

    pub async fn sign_out(&self) -> ClientResult<()> {
        self.auth.sign_out().await?;
        info!("Session ended");
        Ok(())
    }

    /// The signed-in identity, if any.
    pub fn identity(&self) -> Option<Identity> {
        self.auth.current_identity()
    }

    pub fn is_signed_in(&self) -> bool {
        self.identity().is_some()
    }

    /// Receiver that observes every sign-in and sign-out.
    pub fn on_identity_change(&self) -> watch::Receiver<Option<Identity>> {
        self.auth.on_identity_change()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
