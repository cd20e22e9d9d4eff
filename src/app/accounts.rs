use anyhow::{anyhow, Result};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use std::sync::Arc;

use crate::app::identity::normalize_username;
use crate::domain::account::Account;
use crate::infra::store::ReportStore;

const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;

/// Out-of-band account provisioning.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn ReportStore>,
}

impl AccountService {
    pub fn new(store: Arc<dyn ReportStore>) -> Self {
        Self { store }
    }

    /// Returns `None` if the name is already taken.
    pub async fn create_admin(&self, username: &str, password: &str) -> Result<Option<Account>> {
        let username = normalize_username(username)
            .ok_or_else(|| anyhow!("username must be 1-50 characters"))?;
        check_password(password)?;

        let password_hash = hash_password(password)?;
        self.store
            .insert_account(&username, &password_hash, true)
            .await
    }

    /// Returns `false` if no such account exists.
    pub async fn set_password(&self, username: &str, password: &str) -> Result<bool> {
        check_password(password)?;
        let password_hash = hash_password(password)?;
        self.store
            .update_password_hash(username.trim(), &password_hash)
            .await
    }
}

fn check_password(password: &str) -> Result<()> {
    if password.trim().len() < MIN_PASSWORD_LEN {
        return Err(anyhow!("password must be at least {} characters", MIN_PASSWORD_LEN));
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(anyhow!("password must be at most {} characters", MAX_PASSWORD_LEN));
    }
    Ok(())
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!("failed to hash password: {}", err))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|err| anyhow!("failed to parse password hash: {}", err))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
