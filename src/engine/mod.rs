//! The Coqui API client.
//!
//! [`Coqui`] opens one scoped GraphQL session per operation, maps server-side
//! validation and query errors onto [`CoquiError`], and offers a blocking
//! `_sync` twin for every async operation.

mod blocking;
mod coqui;
mod error;
mod request;

pub use blocking::block_on;
pub(crate) use blocking::blocking_api;
pub use coqui::{Access, ClientHandle, Coqui, Session, check_chunk_size};
pub use error::CoquiError;
pub use request::{QualityInput, QualitySource, format_speed};
