use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::app::accounts::verify_password;
use crate::domain::account::{Identity, Role};
use crate::infra::store::ReportStore;

pub const USERNAME_MAX_CHARS: usize = 50;

/// What a caller presents to prove who they are.
#[derive(Debug, Clone)]
pub enum Credential {
    /// A bare name, taken at face value.
    Claim { username: String },
    Password { username: String, password: String },
}

/// How much an identity from a provider can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Strength {
    /// The name was claimed, nothing was checked.
    Trusted,
    /// A stored secret was verified.
    Verified,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn strength(&self) -> Strength;

    /// `Ok(None)` means the credential was refused.
    async fn verify(&self, credential: &Credential) -> Result<Option<Identity>>;
}

/// Trims and length-checks a username; `None` if unusable.
pub fn normalize_username(raw: &str) -> Option<String> {
    let name = raw.trim();
    if name.is_empty() || name.chars().count() > USERNAME_MAX_CHARS {
        return None;
    }
    Some(name.to_string())
}

/// Regular users: any well-formed name is accepted as a user identity.
#[derive(Clone, Default)]
pub struct ClaimProvider;

#[async_trait]
impl IdentityProvider for ClaimProvider {
    fn strength(&self) -> Strength {
        Strength::Trusted
    }

    async fn verify(&self, credential: &Credential) -> Result<Option<Identity>> {
        match credential {
            Credential::Claim { username } => Ok(normalize_username(username).map(Identity::user)),
            Credential::Password { .. } => Ok(None),
        }
    }
}

/// Provisioned accounts checked against their argon2 hash.
#[derive(Clone)]
pub struct AccountProvider {
    store: Arc<dyn ReportStore>,
}

impl AccountProvider {
    pub fn new(store: Arc<dyn ReportStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl IdentityProvider for AccountProvider {
    fn strength(&self) -> Strength {
        Strength::Verified
    }

    async fn verify(&self, credential: &Credential) -> Result<Option<Identity>> {
        let (username, password) = match credential {
            Credential::Password { username, password } => (username, password),
            Credential::Claim { .. } => return Ok(None),
        };

        let account = match self.store.find_account(username.trim()).await? {
            Some(account) => account,
            None => return Ok(None),
        };
        if account.password_hash.is_empty() || !verify_password(password, &account.password_hash)? {
            return Ok(None);
        }

        let role = if account.is_admin { Role::Admin } else { Role::User };
        Ok(Some(Identity {
            username: account.username,
            role,
        }))
    }
}
