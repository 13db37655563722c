use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;

use pinsign_core::{Custodian, PUBLIC_KEY_FILENAME, Verification};

use super::report;

/**
    Verify a signed PDF against a public key.
*/
#[derive(Args)]
pub struct VerifyCommand {
    /// Signed PDF, or the original when verifying a sidecar.
    document: PathBuf,

    /// Public key, PEM or DER.
    #[arg(short, long, default_value = PUBLIC_KEY_FILENAME)]
    public_key: PathBuf,

    /// Detached signature file. Without it the embedded signature is used,
    /// or `<document>.sig` if the document has none.
    #[arg(short, long)]
    signature: Option<PathBuf>,
}

impl VerifyCommand {
    pub fn run(self, custodian: &Custodian) -> Result<()> {
        let verification = custodian
            .verify(
                Some(self.document.as_path()),
                Some(self.public_key.as_path()),
                self.signature.as_deref(),
            )
            .map_err(report)?;

        match verification {
            Verification::Valid => {
                println!("Signature is valid.");
                Ok(())
            }
            Verification::InvalidSignature => {
                bail!("signature does not match this document and public key")
            }
        }
    }
}
