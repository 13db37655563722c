use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_KEY_BITS, ENCRYPTED_KEY_FILENAME, SIDECAR_EXTENSION, SIGNATURE_FIELD, SIGNED_SUFFIX,
};
use crate::types::{SealMode, SignatureMode};

/**
    Full configuration for the custody and signing core.

    Every section has working defaults, so an empty document
    deserializes into [`SignerConfig::default`].
*/
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignerConfig {
    pub custody: CustodyConfig,
    pub storage: StorageConfig,
    pub signature: SignatureConfig,
}

/**
    Key generation and sealing parameters.
*/
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustodyConfig {
    /// RSA modulus size in bits.
    pub key_bits: usize,
    /// Mode used when sealing new keys.
    pub seal_mode: SealMode,
    /// Whether unsealing may fall back to the legacy ECB layout.
    pub accept_legacy: bool,
}

impl Default for CustodyConfig {
    fn default() -> Self {
        Self {
            key_bits: DEFAULT_KEY_BITS,
            seal_mode: SealMode::Cbc,
            accept_legacy: true,
        }
    }
}

/**
    Where removable volumes are looked for and what the key file is called.
*/
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Filename of the sealed key at a volume root.
    pub key_filename: String,
    /// Directory whose subdirectories are removable mounts,
    /// e.g. `/run/media/<user>`.
    pub media_root: Option<PathBuf>,
    /// Also consult the OS list of mounted removable disks.
    pub mounted_disks: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            key_filename: ENCRYPTED_KEY_FILENAME.to_owned(),
            media_root: None,
            mounted_disks: true,
        }
    }
}

/**
    Signature persistence and artifact naming.
*/
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatureConfig {
    pub mode: SignatureMode,
    /// Document-info field holding the base64 signature.
    pub field: String,
    /// Appended to the file stem of an embedded-mode artifact.
    pub signed_suffix: String,
    /// Extension of a detached sidecar, without the dot.
    pub sidecar_extension: String,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            mode: SignatureMode::Embedded,
            field: SIGNATURE_FIELD.to_owned(),
            signed_suffix: SIGNED_SUFFIX.to_owned(),
            sidecar_extension: SIDECAR_EXTENSION.to_owned(),
        }
    }
}
