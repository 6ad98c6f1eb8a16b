//! coqui CLI entry point.

use std::io::{self, Write};
use std::path::Path;
use std::process::{Command as Process, Stdio};

use anyhow::{Context, Result, bail};
use clap::Parser;
use coqui_rs::backend::AudioSource;
use coqui_rs::cli::{
    Args, Command, OutputFormat, TtsCommand, default_sample_name, write_record, write_records,
};
use coqui_rs::config::CredentialStore;
use coqui_rs::engine::{Coqui, QualityInput};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let client = Coqui::new(args.client_config());
    let store = args
        .credential_store()
        .context("Failed to locate credential file")?;

    match args.command {
        Command::Login { token } => login(&client, &store, &token),
        Command::Tts(command) => {
            authenticate(&client, &store)?;
            run_tts(&client, command)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn login(client: &Coqui, store: &CredentialStore, token: &str) -> Result<()> {
    if client.login_sync(token).context("Failed to validate token")? {
        store
            .save(token)
            .with_context(|| format!("Failed to save token to {}", store.path().display()))?;
        println!("Logged in!");
    } else {
        println!("Error: Invalid token!");
    }

    Ok(())
}

fn authenticate(client: &Coqui, store: &CredentialStore) -> Result<()> {
    let token = store.require()?;
    if !client.login_sync(&token).context("Failed to validate saved token")? {
        bail!("Saved token is invalid, run `coqui login --token <TOKEN>` again");
    }
    Ok(())
}

fn run_tts(client: &Coqui, command: TtsCommand) -> Result<()> {
    let mut out = io::stdout().lock();

    match command {
        TtsCommand::ListVoices { output } => {
            let voices = client.cloned_voices_sync().context("Failed to list voices")?;
            write_records(&mut out, &voices, &output.format())?;
        }
        TtsCommand::CloneVoice {
            audio_file,
            name,
            json,
        } => {
            let voice = client
                .clone_voice_sync(AudioSource::from(audio_file), &name)
                .context("Failed to clone voice")?;
            write_record(&mut out, &voice, &OutputFormat::json_or_plain(json))?;
        }
        TtsCommand::ListSamples { voice, output } => {
            let samples = client
                .list_samples_sync(&voice)
                .with_context(|| format!("Failed to list samples for voice '{voice}'"))?;
            write_records(&mut out, &samples, &output.format())?;
        }
        TtsCommand::Synthesize {
            voice,
            text,
            speed,
            name,
            save,
            play,
            json,
        } => {
            let name = name.unwrap_or_else(|| default_sample_name(&text));
            let sample = client
                .synthesize_sync(&voice, &text, speed, &name)
                .context("Failed to synthesize speech")?;

            let audio = tempfile::Builder::new()
                .suffix(".wav")
                .tempfile()
                .context("Failed to create temporary file")?;
            sample
                .download_to_sync(audio.path())
                .context("Failed to download synthesized sample")?;

            if let Some(save) = save {
                std::fs::copy(audio.path(), &save)
                    .with_context(|| format!("Failed to save sample to {}", save.display()))?;
                writeln!(out, "Saved synthesized sample to {}", save.display())?;
            } else if play {
                play_audio(audio.path())?;
            } else {
                write_record(&mut out, &sample, &OutputFormat::json_or_plain(json))?;
            }
        }
        TtsCommand::EstimateQuality {
            audio_file,
            url,
            json,
        } => {
            let input = QualityInput {
                audio_path: audio_file,
                audio_url: url,
                ..Default::default()
            };
            let estimate = client
                .estimate_quality_sync(input)
                .context("Failed to estimate quality")?;

            if json {
                serde_json::to_writer(&mut out, &estimate)?;
                writeln!(out)?;
            } else {
                writeln!(out, "Quality: {} ({:.2})", estimate.level, estimate.raw)?;
            }
        }
    }

    Ok(())
}

/// Play an audio file with the external `play` program.
fn play_audio(path: &Path) -> Result<()> {
    let status = Process::new("play")
        .arg(path)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .context("Failed to run `play`")?;

    if !status.success() {
        bail!("`play` exited with {status}");
    }
    Ok(())
}
