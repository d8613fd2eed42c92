//! Client error types.
//!
//! Only two conditions are hard errors: a token that fails structural
//! validation after minting, and construction-time configuration problems.
//! Every transport, polling, and reauthentication outcome is normalized into
//! a [`crate::types::CubeResponse`] instead, so callers branch on its `error`
//! field rather than catching failures.

use thiserror::Error;

pub type CubeResult<T> = Result<T, CubeError>;

#[derive(Debug, Error)]
pub enum CubeError {
    /// A freshly minted or refreshed token failed structural validation.
    /// This is the only error that can escape the request path.
    #[error("Authentication setup failed: {0}")]
    Auth(String),

    /// Invalid endpoint URL or HTTP client construction failure.
    #[error("Configuration error: {0}")]
    Config(String),
}
