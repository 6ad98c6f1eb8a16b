//! CLI argument definitions and parsing.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use crate::config::{ClientConfig, CredentialError, CredentialStore};

use super::output::OutputFormat;

/// Number of text characters used as the default sample name.
pub const DEFAULT_NAME_LEN: usize = 30;

/// Command-line client for the Coqui text-to-speech API.
#[derive(Parser, Debug)]
#[command(name = "coqui")]
#[command(about = "Voice cloning and text-to-speech with the Coqui API")]
#[command(version)]
pub struct Args {
    /// Override the API base URL
    #[arg(long, env = "COQUI_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Credential file to use instead of ~/.coqui/credentials
    #[arg(long, global = true)]
    pub credentials: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate an API token and save it
    Login {
        /// API token to sign in with
        #[arg(long)]
        token: String,
    },

    /// Text-to-speech commands
    #[command(subcommand)]
    Tts(TtsCommand),
}

/// Output selection shared by the listing commands.
#[derive(ClapArgs, Debug, Default, Clone)]
pub struct ListOutput {
    /// CSV output with the given comma separated fields, eg: -f id,name
    #[arg(short, long, value_delimiter = ',', conflicts_with = "json")]
    pub fields: Vec<String>,

    /// Print output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ListOutput {
    pub fn format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else if !self.fields.is_empty() {
            OutputFormat::Fields(self.fields.clone())
        } else {
            OutputFormat::Plain
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum TtsCommand {
    /// List the cloned voices of the account
    ListVoices {
        #[command(flatten)]
        output: ListOutput,
    },

    /// Clone a voice from a reference recording
    CloneVoice {
        /// Path of reference audio file to clone voice from
        #[arg(long, alias = "audio_file")]
        audio_file: PathBuf,

        /// Name of cloned voice
        #[arg(long)]
        name: String,

        /// Print output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the samples synthesized with a voice
    ListSamples {
        /// ID of voice to list existing samples for
        #[arg(long)]
        voice: String,

        #[command(flatten)]
        output: ListOutput,
    },

    /// Synthesize speech with a cloned voice
    Synthesize {
        /// ID of voice to synthesize
        #[arg(long)]
        voice: String,

        /// Text to synthesize
        #[arg(long)]
        text: String,

        /// Speed parameter for synthesis
        #[arg(long, default_value = "1.0")]
        speed: f32,

        /// Name of sample (defaults to the start of the text)
        #[arg(long)]
        name: Option<String>,

        /// Save the synthesized sample to this file
        #[arg(long, conflicts_with = "play")]
        save: Option<PathBuf>,

        /// Play the synthesized sample
        #[arg(long)]
        play: bool,

        /// Print output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Estimate the quality of a reference recording
    EstimateQuality {
        /// Path of the audio file to assess
        #[arg(long, alias = "audio_file", required_unless_present = "url", conflicts_with = "url")]
        audio_file: Option<PathBuf>,

        /// Publicly reachable URL of the audio to assess
        #[arg(long)]
        url: Option<String>,

        /// Print output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Args {
    /// Client configuration from the global options.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::from_base_url(self.base_url.clone())
    }

    /// Credential store from the global options.
    pub fn credential_store(&self) -> Result<CredentialStore, CredentialError> {
        match &self.credentials {
            Some(path) => Ok(CredentialStore::with_path(path.clone())),
            None => CredentialStore::new(),
        }
    }
}

/// Sample name used when `--name` is not given: the first characters of the text.
pub fn default_sample_name(text: &str) -> String {
    text.chars().take(DEFAULT_NAME_LEN).collect()
}
