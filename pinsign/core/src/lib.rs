#![allow(clippy::doc_overindented_list_items)]

mod constants;
mod crypto;
mod error;
mod types;

pub mod canonical;
pub mod config;
pub mod custodian;
pub mod custody;
pub mod signature;
pub mod storage;

#[cfg(test)]
mod testing;

pub use self::config::{CustodyConfig, SignatureConfig, SignerConfig, StorageConfig};
pub use self::constants::{ENCRYPTED_KEY_FILENAME, PUBLIC_KEY_FILENAME};
pub use self::custodian::{Custodian, GeneratedKeys};
pub use self::custody::{KeyCustody, KeyPair};
pub use self::error::{SignerError, SignerResult};
pub use self::signature::{SignatureEngine, SignatureSource, SignedArtifact};
pub use self::storage::{MediaRoot, MountedDisks, RemovableStorage, VolumeSource};
pub use self::types::{
    ParseError, Pin, RemovableVolume, SealMode, SignatureMode, UsbStatus, Verification,
};
