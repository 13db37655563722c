use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use pinsign_core::{Custodian, SignatureMode, SignerError};

use super::{choose, prompt_pin, report};

/**
    Sign a PDF with the sealed key found on the attached drive.
*/
#[derive(Args)]
pub struct SignCommand {
    /// PDF to sign.
    document: PathBuf,

    /// Key file, or the volume holding it, when several drives carry one.
    #[arg(short, long)]
    key: Option<PathBuf>,

    /// Embed the signature or write it to a sidecar. Defaults to the configured mode.
    #[arg(short, long)]
    mode: Option<SignatureMode>,
}

impl SignCommand {
    pub fn run(self, custodian: &Custodian) -> Result<()> {
        let key = match custodian.storage().locate_key(self.key.as_deref()) {
            Ok(key) => key,
            Err(SignerError::MultipleKeys(candidates)) => {
                let labels: Vec<String> = candidates
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect();
                let index = choose("Sign with the key on", &labels)?;
                index
                    .and_then(|i| candidates.into_iter().nth(i))
                    .ok_or_else(|| report(SignerError::NoSelection))?
            }
            Err(e) => return Err(report(e)),
        };

        let pin = prompt_pin(false);
        let artifact = custodian
            .sign(Some(self.document.as_path()), pin.as_deref(), Some(key.as_path()), self.mode)
            .map_err(report)?;

        match artifact.mode {
            SignatureMode::Embedded => println!("Signed document: {}", artifact.path.display()),
            SignatureMode::Detached => println!("Signature file:  {}", artifact.path.display()),
        }
        Ok(())
    }
}
