//! Client credentials.

use std::fmt;

use serde::Deserialize;
use serde_json::{Map, Value};

/// Connection credentials, supplied once at construction and immutable
/// thereafter.
///
/// `api_secret` is either an HS256 signing key or an already-usable bearer
/// token; the distinction is detected structurally by
/// [`crate::token::TokenManager`].
#[derive(Clone, Deserialize)]
pub struct CubeCredentials {
    /// Base URL of the Cube REST API, e.g. `https://cube.example.com/cubejs-api/v1`.
    pub endpoint: String,

    /// HS256 signing key, or a pre-generated JWT passed through verbatim.
    pub api_secret: String,

    /// Extra claims to embed in minted tokens (security context, tenant, ...).
    #[serde(default)]
    pub token_claims: Map<String, Value>,
}

impl fmt::Debug for CubeCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CubeCredentials")
            .field("endpoint", &self.endpoint)
            .field("api_secret", &"[REDACTED]")
            .field("token_claims", &self.token_claims)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_secret() {
        let credentials = CubeCredentials {
            endpoint: "http://localhost:4000".into(),
            api_secret: "super-secret-key".into(),
            token_claims: Map::new(),
        };
        let rendered = format!("{:?}", credentials);
        assert!(!rendered.contains("super-secret-key"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn deserializes_with_optional_claims() {
        let credentials: CubeCredentials = serde_json::from_str(
            r#"{"endpoint": "http://localhost:4000", "api_secret": "k"}"#,
        )
        .unwrap();
        assert!(credentials.token_claims.is_empty());
    }
}
