use std::sync::Arc;

use anyhow::anyhow;
use tracing::{info, warn};
use uuid::Uuid;

use agora_db::CredentialStore;
use agora_db::models::UserRow;
use agora_types::models::User;

use crate::error::ForumError;
use crate::passwords::{Argon2Scheme, PasswordScheme};
use crate::rows::{now_timestamp, user_from_row};
use crate::tokens::TokenSigner;

/// A successful login: the bearer token and the user it was issued to.
#[derive(Debug)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Registration, login and account removal over a credential store.
pub struct IdentityService {
    store: Arc<dyn CredentialStore>,
    signer: TokenSigner,
    passwords: Arc<dyn PasswordScheme>,
}

impl IdentityService {
    pub fn new(store: Arc<dyn CredentialStore>, signer: TokenSigner) -> Self {
        Self::with_passwords(store, signer, Arc::new(Argon2Scheme))
    }

    pub fn with_passwords(
        store: Arc<dyn CredentialStore>,
        signer: TokenSigner,
        passwords: Arc<dyn PasswordScheme>,
    ) -> Self {
        Self { store, signer, passwords }
    }

    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    pub fn register(&self, username: &str, password: &str) -> Result<User, ForumError> {
        if username.is_empty() || password.is_empty() {
            return Err(ForumError::Invalid("Username and password are required".into()));
        }

        // Skip the hashing cost when the name is obviously taken; the insert
        // below still catches a concurrent registration.
        if self.store.find_user_by_username(username)?.is_some() {
            return Err(ForumError::DuplicateIdentity);
        }

        let row = UserRow {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            password: self.passwords.hash(password)?,
            created_at: now_timestamp(),
        };

        if !self.store.insert_user(&row)? {
            return Err(ForumError::DuplicateIdentity);
        }

        info!("Registered user {}", row.username);
        user_from_row(&row)
    }

    pub fn login(&self, username: &str, password: &str) -> Result<Session, ForumError> {
        let Some(row) = self.store.find_user_by_username(username)? else {
            // Unknown users cost one full verify, same as a wrong password.
            let _ = self.passwords.verify(password, self.passwords.dummy_hash());
            warn!("Login failed for {}", username);
            return Err(ForumError::InvalidCredentials);
        };

        if !self.passwords.verify(password, &row.password)? {
            warn!("Login failed for {}", username);
            return Err(ForumError::InvalidCredentials);
        }

        let user = user_from_row(&row)?;
        let token = self
            .signer
            .issue(user.id, &user.username)
            .map_err(|e| anyhow!("token signing failed: {}", e))?;

        info!("User {} logged in", user.username);
        Ok(Session { token, user })
    }

    /// Removes the account with `user_id`. Unknown ids are not an error.
    pub fn delete_identity(&self, user_id: Uuid) -> Result<(), ForumError> {
        if self.store.delete_user(&user_id.to_string())? {
            info!("Deleted user {}", user_id);
        }
        Ok(())
    }
}
