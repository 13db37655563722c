use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use dialoguer::Confirm;

use pinsign_core::{Custodian, PUBLIC_KEY_FILENAME, RemovableVolume};

use super::{choose, prompt_pin, report};

/**
    Generate a key pair and seal the private key onto a removable drive.
*/
#[derive(Args)]
pub struct GenerateCommand {
    /// Removable volume to store the sealed key on. Prompts if omitted.
    #[arg(long)]
    volume: Option<PathBuf>,

    /// Where to write the public key.
    #[arg(short, long, default_value = PUBLIC_KEY_FILENAME)]
    public_key: PathBuf,

    /// Also keep a sealed copy of the private key at this path.
    #[arg(long)]
    local_copy: Option<PathBuf>,

    /// Replace an existing key on the volume without asking.
    #[arg(short, long)]
    force: bool,
}

impl GenerateCommand {
    pub fn run(self, custodian: &Custodian) -> Result<()> {
        let volume = match self.volume {
            Some(path) => Some(RemovableVolume::new(path)),
            None => self.pick_volume(custodian)?,
        };
        if volume.is_none() && self.local_copy.is_none() {
            bail!("no removable drive selected");
        }

        if let Some(volume) = &volume {
            let existing = volume.path().join(custodian.storage().key_filename());
            if existing.exists() && !self.force && !confirm_overwrite(&existing)? {
                bail!("kept the existing key on {}", volume.path().display());
            }
        }

        let pin = prompt_pin(true);
        eprintln!(
            "Generating {}-bit key pair...",
            custodian.config().custody.key_bits
        );
        let generated = custodian
            .generate(
                pin.as_deref(),
                volume.as_ref(),
                Some(self.public_key.as_path()),
                self.local_copy.as_deref(),
            )
            .map_err(report)?;

        if let Some(path) = &generated.placed_key {
            println!("Sealed private key:  {}", path.display());
        }
        if let Some(path) = &generated.local_copy {
            println!("Local sealed copy:   {}", path.display());
        }
        println!("Public key:          {}", generated.public_key_path.display());
        Ok(())
    }

    fn pick_volume(&self, custodian: &Custodian) -> Result<Option<RemovableVolume>> {
        let mut volumes = custodian.volumes().map_err(report)?;
        match volumes.len() {
            0 => Ok(None),
            1 => Ok(volumes.pop()),
            _ => {
                let labels: Vec<String> = volumes
                    .iter()
                    .map(|v| v.path().display().to_string())
                    .collect();
                let index = choose("Store the key on", &labels)?;
                Ok(index.map(|i| volumes.swap_remove(i)))
            }
        }
    }
}

fn confirm_overwrite(path: &std::path::Path) -> Result<bool> {
    Confirm::new()
        .with_prompt(format!("{} already exists. Replace it?", path.display()))
        .default(false)
        .interact()
        .context("failed to read confirmation")
}
