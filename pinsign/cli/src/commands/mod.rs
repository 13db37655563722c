mod generate;
mod sign;
mod status;
mod verify;

use anyhow::{Context, Result};
use dialoguer::{Password, Select};

use pinsign_core::SignerError;

pub use self::generate::GenerateCommand;
pub use self::sign::SignCommand;
pub use self::status::{StatusCommand, VolumesCommand};
pub use self::verify::VerifyCommand;

/**
    User-facing text for each core error. Every variant gets its own
    message; an unreadable file must never read as a bad signature.
*/
fn describe(error: &SignerError) -> String {
    match error {
        SignerError::CryptoFailure(_) => "internal cryptographic failure".into(),
        SignerError::WrongPinOrCorruptKey => {
            "the PIN is wrong or the key on the drive is damaged".into()
        }
        SignerError::InvalidPublicKey(_) => "the public key file could not be read".into(),
        SignerError::PinRequired => "a PIN is required".into(),
        SignerError::NoSelection => "nothing was selected".into(),
        SignerError::KeyNotFound => "no encrypted private key found on any removable drive".into(),
        SignerError::MultipleKeys(paths) => format!(
            "{} removable drives carry a key, pass --key to pick one",
            paths.len()
        ),
        SignerError::MalformedDocument(_) => "the document could not be read as a PDF".into(),
        SignerError::NoSignaturePresent => "the document carries no signature".into(),
        SignerError::VolumeUnavailable(path) => {
            format!("drive {} is no longer attached", path.display())
        }
        SignerError::Io { path, .. } => format!("could not access {}", path.display()),
    }
}

/**
    Wrap a core error with its user-facing message, keeping the
    original as the cause.
*/
fn report(error: SignerError) -> anyhow::Error {
    let message = describe(&error);
    anyhow::Error::new(error).context(message)
}

/**
    Ask for the PIN without echo. Cancelling or leaving it empty
    yields `None`, which the core turns into [`SignerError::PinRequired`].
*/
fn prompt_pin(confirm: bool) -> Option<String> {
    let mut prompt = Password::new()
        .with_prompt("PIN")
        .allow_empty_password(true);
    if confirm {
        prompt = prompt.with_confirmation("Repeat PIN", "PINs do not match");
    }
    prompt.interact().ok().filter(|pin| !pin.is_empty())
}

/**
    Let the user pick one of `items`. `Ok(None)` when the picker is dismissed.
*/
fn choose(prompt: &str, items: &[String]) -> Result<Option<usize>> {
    Select::new()
        .with_prompt(prompt)
        .items(items)
        .default(0)
        .interact_opt()
        .context("failed to read selection")
}
