use std::io;
use std::path::PathBuf;

use thiserror::Error;

/**
    Errors surfaced by the key custody and signing core.

    No variant ever carries a PIN, a derived key or private key material.
    Callers match on the variant to pick a message; the `Display` text is
    only a fallback for logs.
*/
#[derive(Debug, Error)]
pub enum SignerError {
    // ── Crypto ────────────────────────────────────────────────────────
    #[error("cryptographic operation failed: {0}")]
    CryptoFailure(String),
    #[error("wrong PIN or corrupt key")]
    WrongPinOrCorruptKey,
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    // ── User input ────────────────────────────────────────────────────
    #[error("PIN required")]
    PinRequired,
    #[error("no selection provided")]
    NoSelection,
    #[error("no encrypted private key found on removable media")]
    KeyNotFound,
    #[error("encrypted private keys found on {} volumes, selection required", .0.len())]
    MultipleKeys(Vec<PathBuf>),

    // ── Documents ─────────────────────────────────────────────────────
    #[error("malformed document: {0}")]
    MalformedDocument(String),
    #[error("document carries no signature")]
    NoSignaturePresent,

    // ── Storage ───────────────────────────────────────────────────────
    #[error("volume {} is no longer available", .0.display())]
    VolumeUnavailable(PathBuf),
    #[error("I/O failure on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SignerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /**
        Whether the caller may reasonably ask the user to try again
        (re-enter the PIN, re-attach the device, pick another file).

        Only crypto faults are final. Storage faults count as recoverable
        since removable media may simply have been unplugged.
    */
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::CryptoFailure(_))
    }
}

impl From<lopdf::Error> for SignerError {
    fn from(e: lopdf::Error) -> Self {
        Self::MalformedDocument(e.to_string())
    }
}

/**
    Type alias for results that may return a [`SignerError`].
*/
pub type SignerResult<T> = std::result::Result<T, SignerError>;
