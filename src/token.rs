//! Token lifecycle management.
//!
//! A [`TokenManager`] either signs short-lived HS256 tokens with the
//! configured secret, or passes a pre-generated bearer token through
//! unmodified. Validation is intentionally structural only: the manager is
//! the signer for minted tokens and has no trust material to verify
//! pass-through tokens against.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use crate::error::{CubeError, CubeResult};

/// Lifetime of minted tokens.
const TOKEN_TTL_SECS: i64 = 3600;

pub struct TokenManager {
    secret: String,
    claims: Map<String, Value>,
    pregenerated: bool,
    /// The live token. Replaced wholesale on refresh; the lock keeps a
    /// refresh-and-swap from racing concurrent callers.
    token: Mutex<String>,
}

impl TokenManager {
    /// Creates the manager and performs the initial mint. Fails with
    /// [`CubeError::Auth`] if the minted token does not validate.
    pub fn new(secret: impl Into<String>, claims: Map<String, Value>) -> CubeResult<Self> {
        let secret = secret.into();
        let pregenerated = Self::is_pregenerated(&secret);
        let manager = Self {
            secret,
            claims,
            pregenerated,
            token: Mutex::new(String::new()),
        };
        manager.refresh()?;
        Ok(manager)
    }

    /// True iff `secret` is already a usable bearer token: splitting on `.`
    /// yields exactly three non-empty parts.
    pub fn is_pregenerated(secret: &str) -> bool {
        let parts: Vec<&str> = secret.split('.').collect();
        parts.len() == 3 && parts.iter().all(|part| !part.is_empty())
    }

    pub fn pregenerated(&self) -> bool {
        self.pregenerated
    }

    /// Snapshot of the live token.
    pub fn current(&self) -> String {
        self.token.lock().clone()
    }

    fn mint(&self) -> CubeResult<String> {
        if self.pregenerated {
            return Ok(self.secret.clone());
        }
        let now = Utc::now().timestamp();
        let mut claims = self.claims.clone();
        claims.insert("iat".to_string(), Value::from(now));
        claims.insert("exp".to_string(), Value::from(now + TOKEN_TTL_SECS));
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| CubeError::Auth(format!("failed to sign token: {e}")))
    }

    /// Structural validation only; never verifies a signature.
    ///
    /// Pre-generated tokens get the same three-part shape check used for
    /// detection. Minted tokens are decoded without signature verification
    /// and must carry `iat` and `exp` with `exp` in the future. Decode
    /// failures are logged and reported as invalid, never raised.
    pub fn validate(&self, token: &str) -> bool {
        if token.is_empty() {
            return false;
        }
        if self.pregenerated {
            return Self::is_pregenerated(token);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let claims =
            match decode::<Map<String, Value>>(token, &DecodingKey::from_secret(&[]), &validation) {
                Ok(data) => data.claims,
                Err(e) => {
                    warn!("token validation failed: {e}");
                    return false;
                }
            };

        if !claims.contains_key("iat") {
            return false;
        }
        match claims.get("exp").and_then(Value::as_i64) {
            Some(exp) => exp > Utc::now().timestamp(),
            None => false,
        }
    }

    /// Mints a new token, validates it, and atomically swaps it in. An
    /// invalid result is fatal: this is the one authentication condition that
    /// propagates instead of being captured as response data.
    pub fn refresh(&self) -> CubeResult<()> {
        let minted = self.mint()?;
        if !self.validate(&minted) {
            error!("generated token failed validation");
            return Err(CubeError::Auth(
                "generated token failed validation".to_string(),
            ));
        }
        *self.token.lock() = minted;
        debug!("token refreshed");
        Ok(())
    }
}
