//! coqui-rs: Client library and CLI for the Coqui text-to-speech API.
//!
//! This crate authenticates against the Coqui GraphQL API, clones voices from
//! reference audio, synthesizes speech with them and downloads the results.
//! Every operation is async, with a blocking `_sync` twin.

pub mod backend;
pub mod cli;
pub mod config;
pub mod engine;
pub mod voice;

pub use engine::{Coqui, CoquiError};
