use chrono::Utc;

use super::middleware::AuthError;
use super::token::{TokenGenerator, parse_token};
use crate::store::Store;
use crate::types::Identity;

/// Strategy for establishing who is calling. Chosen once at startup
/// and injected into [`crate::server::AppState`]; the request path
/// never branches on configuration beyond calling this trait.
pub trait AuthPolicy: Send + Sync {
    fn authenticate(
        &self,
        store: &dyn Store,
        auth_header: Option<&str>,
    ) -> Result<Identity, AuthError>;
}

/// Production policy: a `Bearer clientele_<lookup>_<secret>` header,
/// verified against the Argon2id hash stored for the lookup prefix.
pub struct BearerTokenPolicy;

impl AuthPolicy for BearerTokenPolicy {
    fn authenticate(
        &self,
        store: &dyn Store,
        auth_header: Option<&str>,
    ) -> Result<Identity, AuthError> {
        let raw_token = match auth_header {
            Some(header) if header.starts_with("Bearer ") => {
                header.trim_start_matches("Bearer ").to_string()
            }
            Some(_) => return Err(AuthError::InvalidScheme),
            None => return Err(AuthError::MissingAuth),
        };

        let (lookup, _secret) = parse_token(&raw_token).map_err(|_| AuthError::InvalidToken)?;

        let token = store
            .get_token_by_lookup(lookup)
            .map_err(|_| AuthError::InternalError)?
            .ok_or(AuthError::InvalidToken)?;

        let generator = TokenGenerator::new();
        if !generator
            .verify(&raw_token, &token.token_hash)
            .map_err(|_| AuthError::InternalError)?
        {
            return Err(AuthError::InvalidToken);
        }

        if let Some(expires_at) = &token.expires_at {
            if expires_at < &Utc::now() {
                return Err(AuthError::TokenExpired);
            }
        }

        let user = store
            .get_user(&token.user_id)
            .map_err(|_| AuthError::InternalError)?
            .ok_or(AuthError::InvalidToken)?;

        if let Err(e) = store.update_token_last_used(&token.id) {
            tracing::warn!("Failed to update token last_used_at: {e}");
        }

        Ok(Identity {
            id: user.id,
            email: user.email,
        })
    }
}

/// Answers every request with the same identity, skipping token
/// verification entirely. For local development and tests only; the
/// server wires it up solely behind the `insecure-dev-auth` feature.
pub struct FixedIdentityPolicy {
    identity: Identity,
}

impl FixedIdentityPolicy {
    #[must_use]
    pub fn new(identity: Identity) -> Self {
        Self { identity }
    }
}

impl AuthPolicy for FixedIdentityPolicy {
    fn authenticate(
        &self,
        _store: &dyn Store,
        _auth_header: Option<&str>,
    ) -> Result<Identity, AuthError> {
        Ok(self.identity.clone())
    }
}
