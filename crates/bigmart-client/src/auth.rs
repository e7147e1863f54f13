//! # Auth Gate
//!
//! The port to the hosted email/password authentication service, plus an
//! in-process implementation.
//!
//! ## Identity Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Identity States                                  │
//! │                                                                         │
//! │                  sign_in(email, pw) ✓                                   │
//! │     ┌──────────┐ ───────────────────► ┌──────────────────┐              │
//! │     │  None    │                      │ Some(Identity)   │              │
//! │     │ (signed  │ ◄─────────────────── │ uid + email      │              │
//! │     │   out)   │      sign_out()      └──────────────────┘              │
//! │     └──────────┘                               ▲                        │
//! │          │       sign_up(email, pw) ✓          │                        │
//! │          └─────────────────────────────────────┘                        │
//! │                                                                         │
//! │  Every transition is published on the watch channel returned by         │
//! │  on_identity_change(). Failed attempts publish nothing.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};

/// Shortest password the auth service accepts on sign-up.
pub const MIN_PASSWORD_LEN: usize = 6;

// =============================================================================
// Identity
// =============================================================================

/// The authenticated user principal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// Stable user id; keys `user_locations/{uid}`.
    pub uid: String,
    pub email: String,
}

// =============================================================================
// Auth Port
// =============================================================================

/// Port for the hosted authentication service.
#[async_trait]
pub trait AuthGate: Send + Sync {
    /// The signed-in identity, if any.
    fn current_identity(&self) -> Option<Identity>;

    /// Receiver that observes every identity change.
    fn on_identity_change(&self) -> watch::Receiver<Option<Identity>>;

    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<Identity>;

    /// Creates an account and signs it in.
    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<Identity>;

    async fn sign_out(&self) -> AuthResult<()>;
}

// =============================================================================
// In-Process Auth Gate
// =============================================================================

#[derive(Debug, Clone)]
struct Account {
    uid: String,
    email: String,
    password_hash: String,
}

/// In-memory [`AuthGate`] with argon2-hashed passwords.
///
/// Emails are matched case-insensitively.
#[derive(Debug)]
pub struct MemoryAuthGate {
    accounts: RwLock<HashMap<String, Account>>,
    state: watch::Sender<Option<Identity>>,
}

impl Default for MemoryAuthGate {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAuthGate {
    pub fn new() -> Self {
        let (state, _) = watch::channel(None);
        MemoryAuthGate {
            accounts: RwLock::new(HashMap::new()),
            state,
        }
    }

    /// Number of registered accounts.
    pub async fn account_count(&self) -> usize {
        self.accounts.read().await.len()
    }

    fn publish(&self, identity: Option<Identity>) {
        self.state.send_replace(identity);
    }
}

fn normalize_email(email: &str) -> AuthResult<String> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
            Ok(email.to_lowercase())
        }
        _ => Err(AuthError::InvalidEmail),
    }
}

fn hash_password(password: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

#[async_trait]
impl AuthGate for MemoryAuthGate {
    fn current_identity(&self) -> Option<Identity> {
        self.state.borrow().clone()
    }

    fn on_identity_change(&self) -> watch::Receiver<Option<Identity>> {
        self.state.subscribe()
    }

    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<Identity> {
        let key = normalize_email(email)?;

        let account = self
            .accounts
            .read()
            .await
            .get(&key)
            .cloned()
            .ok_or(AuthError::UserNotFound)?;

        if !verify_password(password, &account.password_hash) {
            warn!(uid = %account.uid, "Sign-in rejected: wrong password");
            return Err(AuthError::WrongPassword);
        }

        let identity = Identity {
            uid: account.uid,
            email: account.email,
        };
        info!(uid = %identity.uid, "Signed in");
        self.publish(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<Identity> {
        let key = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword {
                min: MIN_PASSWORD_LEN,
            });
        }

        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&key) {
            debug!("Sign-up rejected: email already registered");
            return Err(AuthError::EmailAlreadyInUse);
        }

        let account = Account {
            uid: Uuid::new_v4().simple().to_string(),
            email: email.trim().to_string(),
            password_hash: hash_password(password)?,
        };
        let identity = Identity {
            uid: account.uid.clone(),
            email: account.email.clone(),
        };
        accounts.insert(key, account);
        drop(accounts);

        info!(uid = %identity.uid, "Account created");
        self.publish(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> AuthResult<()> {
        if let Some(identity) = self.current_identity() {
            info!(uid = %identity.uid, "Signed out");
        }
        self.publish(None);
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sign_up_signs_in() {
        let gate = MemoryAuthGate::new();
        let mut changes = gate.on_identity_change();
        assert!(gate.current_identity().is_none());

        let identity = gate.sign_up("ann@bigmart.test", "secret1").await.unwrap();
        changes.changed().await.unwrap();
        assert_eq!(changes.borrow().as_ref(), Some(&identity));
        assert_eq!(gate.current_identity(), Some(identity));
    }

    #[tokio::test]
    async fn test_sign_up_rules() {
        let gate = MemoryAuthGate::new();

        assert!(matches!(
            gate.sign_up("not-an-email", "secret1").await,
            Err(AuthError::InvalidEmail)
        ));
        assert!(matches!(
            gate.sign_up("ann@bigmart.test", "12345").await,
            Err(AuthError::WeakPassword { min: 6 })
        ));

        gate.sign_up("ann@bigmart.test", "secret1").await.unwrap();
        assert!(matches!(
            gate.sign_up("ANN@bigmart.test", "secret2").await,
            Err(AuthError::EmailAlreadyInUse)
        ));
        assert_eq!(gate.account_count().await, 1);
    }

    #[tokio::test]
    async fn test_sign_in_and_out() {
        let gate = MemoryAuthGate::new();
        let created = gate.sign_up("bob@bigmart.test", "hunter22").await.unwrap();
        gate.sign_out().await.unwrap();
        assert!(gate.current_identity().is_none());

        assert!(matches!(
            gate.sign_in("bob@bigmart.test", "wrong-pw").await,
            Err(AuthError::WrongPassword)
        ));
        assert!(gate.current_identity().is_none());

        assert!(matches!(
            gate.sign_in("nobody@bigmart.test", "hunter22").await,
            Err(AuthError::UserNotFound)
        ));

        let identity = gate.sign_in(" Bob@BigMart.test ", "hunter22").await.unwrap();
        assert_eq!(identity, created);
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("secret1").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("secret1", &hash));
        assert!(!verify_password("secret2", &hash));
        assert!(!verify_password("secret1", "not-a-hash"));
    }
}
