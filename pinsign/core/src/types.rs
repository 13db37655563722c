use core::fmt;
use core::str::FromStr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::{SignerError, SignerResult};

/**
    Error returned by `FromStr` implementations on enum types.
*/
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseError {
    pub kind: &'static str,
    pub value: String,
}

/**
    A non-empty PIN supplied by the caller.

    The text is wiped on drop and never printed by `Debug`.
*/
#[derive(Clone)]
pub struct Pin(Zeroizing<String>);

impl Pin {
    /**
        Accept a PIN from the caller. `None` (cancelled prompt) and the
        empty string both mean no PIN was provided.
    */
    pub fn new(pin: Option<&str>) -> SignerResult<Self> {
        match pin {
            Some(p) if !p.is_empty() => Ok(Self(Zeroizing::new(p.to_owned()))),
            _ => Err(SignerError::PinRequired),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pin(<redacted>)")
    }
}

/**
    Block-cipher mode used to seal the private key.
*/
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SealMode {
    /// AES-256-CBC with a random IV prepended to the ciphertext.
    #[default]
    Cbc,
    /// AES-256-ECB without IV. Byte-compatible with keys custodied by
    /// older tooling, only for reading them back.
    LegacyEcb,
}

impl SealMode {
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim_ascii();
        if name.eq_ignore_ascii_case("cbc") {
            Some(Self::Cbc)
        } else if name.eq_ignore_ascii_case("legacy-ecb") || name.eq_ignore_ascii_case("ecb") {
            Some(Self::LegacyEcb)
        } else {
            None
        }
    }

    pub const fn to_name(self) -> &'static str {
        match self {
            Self::Cbc => "cbc",
            Self::LegacyEcb => "legacy-ecb",
        }
    }
}

impl fmt::Display for SealMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_name())
    }
}

impl FromStr for SealMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| ParseError {
            kind: "seal mode",
            value: s.to_owned(),
        })
    }
}

/**
    Where a signature is persisted.
*/
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignatureMode {
    /// Base64 text in the document-info dictionary of a new `_signed` artifact.
    #[default]
    Embedded,
    /// Raw signature bytes in a sidecar file; the document is left untouched.
    Detached,
}

impl SignatureMode {
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim_ascii();
        if name.eq_ignore_ascii_case("embedded") {
            Some(Self::Embedded)
        } else if name.eq_ignore_ascii_case("detached") {
            Some(Self::Detached)
        } else {
            None
        }
    }

    pub const fn to_name(self) -> &'static str {
        match self {
            Self::Embedded => "embedded",
            Self::Detached => "detached",
        }
    }
}

impl fmt::Display for SignatureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_name())
    }
}

impl FromStr for SignatureMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| ParseError {
            kind: "signature mode",
            value: s.to_owned(),
        })
    }
}

/**
    Outcome of a completed verification.

    Unreadable input is never folded into `InvalidSignature`; it surfaces
    as an error before a verdict is reached.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verification {
    Valid,
    InvalidSignature,
}

impl Verification {
    pub const fn is_valid(self) -> bool {
        matches!(self, Self::Valid)
    }
}

impl fmt::Display for Verification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => f.write_str("signature is valid"),
            Self::InvalidSignature => f.write_str("signature is invalid"),
        }
    }
}

/**
    A removable volume seen during one enumeration.
*/
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RemovableVolume {
    pub mount_path: PathBuf,
    pub removable: bool,
}

impl RemovableVolume {
    pub fn new(mount_path: impl Into<PathBuf>) -> Self {
        Self {
            mount_path: mount_path.into(),
            removable: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.mount_path
    }

    /**
        Whether the volume is still mounted right now.
    */
    pub fn is_present(&self) -> bool {
        self.mount_path.is_dir()
    }
}

/**
    Snapshot of removable-media presence for status displays.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsbStatus {
    Detected(PathBuf),
    NotDetected,
}

impl fmt::Display for UsbStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Detected(path) => write!(f, "removable drive detected: {}", path.display()),
            Self::NotDetected => f.write_str("no removable drive detected"),
        }
    }
}
