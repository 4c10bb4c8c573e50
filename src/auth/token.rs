use std::fmt::Write as _;

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::Rng;

use crate::error::{Error, Result};

const ARGON2_MEMORY: u32 = 64 * 1024; // 64KB
const ARGON2_ITERATIONS: u32 = 1;
const ARGON2_PARALLELISM: u32 = 4;
const ARGON2_OUTPUT_LEN: usize = 32;

const TOKEN_PREFIX: &str = "clientele";
const LOOKUP_BYTES: usize = 4;
const SECRET_BYTES: usize = 12;
const LOOKUP_LENGTH: usize = LOOKUP_BYTES * 2;
const SECRET_LENGTH: usize = SECRET_BYTES * 2;

/// A freshly minted API token. `raw` is handed to the caller exactly
/// once; only `lookup` and `hash` are persisted, so a leaked token
/// table yields no usable credential.
pub struct IssuedToken {
    pub raw: String,
    pub lookup: String,
    pub hash: String,
}

/// Mints and verifies `clientele_<lookup>_<secret>` API tokens. The
/// lookup half indexes the stored row; the full raw token is what the
/// Argon2id hash covers.
pub struct TokenGenerator {
    argon2: Argon2<'static>,
}

impl TokenGenerator {
    #[must_use]
    pub fn new() -> Self {
        // Parameters are compile-time constants within argon2's bounds.
        let params = Params::new(
            ARGON2_MEMORY,
            ARGON2_ITERATIONS,
            ARGON2_PARALLELISM,
            Some(ARGON2_OUTPUT_LEN),
        )
        .expect("argon2 params");

        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    pub fn generate(&self) -> Result<IssuedToken> {
        let lookup = random_hex(LOOKUP_BYTES);
        let secret = random_hex(SECRET_BYTES);
        let raw = format!("{TOKEN_PREFIX}_{lookup}_{secret}");
        let hash = self.hash(&raw)?;
        Ok(IssuedToken { raw, lookup, hash })
    }

    pub fn hash(&self, token: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(token.as_bytes(), &salt)
            .map_err(|e| Error::Config(format!("failed to hash token: {e}")))?;
        Ok(hash.to_string())
    }

    /// Checks a raw token against a stored PHC hash. `Ok(false)` is a
    /// mismatch; `Err` means the stored hash itself is unusable.
    pub fn verify(&self, token: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| Error::Config(format!("invalid hash format: {e}")))?;

        match self.argon2.verify_password(token.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(Error::Config(format!("failed to verify token: {e}"))),
        }
    }
}

fn random_hex(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill(buf.as_mut_slice());
    let mut out = String::with_capacity(bytes * 2);
    for b in buf {
        let _ = write!(out, "{b:02x}");
    }
    out
}

/// Splits a raw token into its lookup and secret halves, rejecting
/// anything this service could not have minted.
pub fn parse_token(token: &str) -> Result<(&str, &str)> {
    let rest = token
        .strip_prefix(TOKEN_PREFIX)
        .and_then(|r| r.strip_prefix('_'))
        .ok_or(Error::InvalidTokenFormat)?;

    let (lookup, secret) = rest.split_once('_').ok_or(Error::InvalidTokenFormat)?;
    if lookup.len() != LOOKUP_LENGTH || secret.len() != SECRET_LENGTH {
        return Err(Error::InvalidTokenFormat);
    }
    if !is_hex(lookup) || !is_hex(secret) {
        return Err(Error::InvalidTokenFormat);
    }

    Ok((lookup, secret))
}

fn is_hex(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_hexdigit())
}
