use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use pinsign_core::{Custodian, SignerConfig};

use crate::commands::{
    GenerateCommand, SignCommand, StatusCommand, VerifyCommand, VolumesCommand,
};

/**
    PIN-protected document signing with keys kept on removable media.
*/
#[derive(Parser)]
#[command(name = "pinsign")]
pub struct Cli {
    /// YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a key pair and seal the private key onto a removable drive.
    Generate(GenerateCommand),
    /// Sign a PDF with the key on the attached drive.
    Sign(SignCommand),
    /// Verify a signed PDF against a public key.
    Verify(VerifyCommand),
    /// Show whether a removable drive is attached.
    Status(StatusCommand),
    /// List removable volumes and the keys they carry.
    Volumes(VolumesCommand),
}

impl Cli {
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn run(self) -> Result<()> {
        let config = load_config(self.config.as_deref())?;
        let custodian = Custodian::new(config);

        match self.command {
            Command::Generate(cmd) => cmd.run(&custodian),
            Command::Sign(cmd) => cmd.run(&custodian),
            Command::Verify(cmd) => cmd.run(&custodian),
            Command::Status(cmd) => cmd.run(&custodian),
            Command::Volumes(cmd) => cmd.run(&custodian),
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<SignerConfig> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_yaml::from_str(&text)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => SignerConfig::default(),
    };

    // Linux desktops mount removable media under /run/media/<user>
    if config.storage.media_root.is_none()
        && cfg!(target_os = "linux")
        && let Ok(user) = std::env::var("USER")
    {
        config.storage.media_root = Some(Path::new("/run/media").join(user));
    }

    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}
