use anyhow::{anyhow, Result};
use pasetors::claims::{Claims, ClaimsValidationRules};
use pasetors::keys::SymmetricKey;
use pasetors::token::UntrustedToken;
use pasetors::{local, version4::V4, Local};
use std::sync::Arc;
use time::{Duration, OffsetDateTime};

use crate::app::identity::{Credential, IdentityProvider, Strength};
use crate::config::SessionConfig;
use crate::domain::account::{Identity, Role};

const TOKEN_ISSUER: &str = "reportes";

/// A freshly issued session: who it is for and the sealed cookie value.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub identity: Identity,
    pub token: String,
    pub expires_at: OffsetDateTime,
}

/// Turns credentials into sealed session tokens and back.
///
/// Regular users go through `users` (any strength), administrators through
/// `admins`, which must be a `Strength::Verified` provider.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn IdentityProvider>,
    admins: Arc<dyn IdentityProvider>,
    session_key: [u8; 32],
    session_ttl_hours: u64,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn IdentityProvider>,
        admins: Arc<dyn IdentityProvider>,
        session: &SessionConfig,
    ) -> Result<Self> {
        if admins.strength() < Strength::Verified {
            return Err(anyhow!("admin identity provider must verify credentials"));
        }
        Ok(Self {
            users,
            admins,
            session_key: session.key,
            session_ttl_hours: session.ttl_hours,
        })
    }

    pub async fn login(&self, username: &str) -> Result<Option<IssuedSession>> {
        let credential = Credential::Claim {
            username: username.to_string(),
        };
        match self.users.verify(&credential).await? {
            Some(identity) => Ok(Some(self.issue(identity)?)),
            None => Ok(None),
        }
    }

    /// Only identities with the admin role are accepted here.
    pub async fn admin_login(&self, username: &str, password: &str) -> Result<Option<IssuedSession>> {
        let credential = Credential::Password {
            username: username.to_string(),
            password: password.to_string(),
        };
        match self.admins.verify(&credential).await? {
            Some(identity) if identity.is_admin() => Ok(Some(self.issue(identity)?)),
            _ => Ok(None),
        }
    }

    /// `None` for tampered, expired or foreign tokens.
    pub fn open(&self, token: &str) -> Result<Option<Identity>> {
        let key = SymmetricKey::<V4>::from(&self.session_key)?;
        let mut rules = ClaimsValidationRules::new();
        rules.validate_issuer_with(TOKEN_ISSUER);
        rules.validate_audience_with(TOKEN_ISSUER);

        let untrusted = match UntrustedToken::<Local, V4>::try_from(token) {
            Ok(token) => token,
            Err(_) => return Ok(None),
        };
        let trusted = match local::decrypt(&key, &untrusted, &rules, None, None) {
            Ok(token) => token,
            Err(_) => return Ok(None),
        };
        let claims = match trusted.payload_claims() {
            Some(claims) => claims,
            None => return Ok(None),
        };

        let username = claim_str(claims, "sub");
        let role = claim_str(claims, "role").and_then(Role::from_claim);
        match (username, role) {
            (Some(username), Some(role)) => Ok(Some(Identity {
                username: username.to_string(),
                role,
            })),
            _ => Ok(None),
        }
    }

    pub fn session_ttl_hours(&self) -> u64 {
        self.session_ttl_hours
    }

    fn issue(&self, identity: Identity) -> Result<IssuedSession> {
        let duration = std::time::Duration::from_secs(self.session_ttl_hours * 60 * 60);
        let mut claims = Claims::new_expires_in(&duration)?;
        claims.issuer(TOKEN_ISSUER)?;
        claims.audience(TOKEN_ISSUER)?;
        claims.subject(&identity.username)?;
        claims.add_additional("role", identity.role.as_claim())?;
        let expires_at = OffsetDateTime::now_utc() + Duration::hours(self.session_ttl_hours as i64);

        let key = SymmetricKey::<V4>::from(&self.session_key)?;
        let token = local::encrypt(&key, &claims, None, None)?;

        Ok(IssuedSession {
            identity,
            token,
            expires_at,
        })
    }
}

fn claim_str<'a>(claims: &'a Claims, name: &str) -> Option<&'a str> {
    claims.get_claim(name).and_then(|value| value.as_str())
}
