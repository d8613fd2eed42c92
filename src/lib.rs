//! Synchronous Cube.dev REST client.
//!
//! Turns a backend that answers queries asynchronously (via a polling
//! sentinel) into a blocking, authenticated, failure-tolerant call interface.
//!
//! ## Modules
//!
//! - [`client`]: request execution (long-poll retry, one-shot 403 reauthentication)
//! - [`token`]: token lifecycle (HS256 minting, pass-through, structural validation)
//! - [`cast`]: numeric normalization of result rows
//! - [`sanitize`]: diagnostics-only redaction of responses and headers
//! - [`types`]: wire shapes for responses and queries
//!
//! Failure policy: only an invalid freshly-minted token is a hard error.
//! Timeouts, transport failures, and exhausted reauthentication all come back
//! as well-formed [`CubeResponse`] values carrying an `error` field.

pub mod cast;
pub mod client;
pub mod config;
pub mod error;
pub mod sanitize;
pub mod token;
pub mod types;

pub use cast::cast_numerics;
pub use client::{CubeClient, Route};
pub use config::CubeCredentials;
pub use error::{CubeError, CubeResult};
pub use sanitize::{sanitize_headers, sanitize_response};
pub use token::TokenManager;
pub use types::{
    Annotation, ColumnMeta, CubeResponse, DateRange, Granularity, OrderDirection, Query, Row,
    TimeDimension, CONTINUE_WAIT,
};
