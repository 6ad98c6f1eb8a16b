//! CLI argument parsing and output rendering.

mod args;
mod output;

pub use args::{Args, Command, DEFAULT_NAME_LEN, ListOutput, TtsCommand, default_sample_name};
pub use output::{OutputError, OutputFormat, Record, write_record, write_records};
