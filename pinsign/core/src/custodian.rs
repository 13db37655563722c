use std::fs;
use std::path::{Path, PathBuf};

use crate::config::SignerConfig;
use crate::custody::{KeyCustody, load_public_key};
use crate::error::{SignerError, SignerResult};
use crate::signature::{SignatureEngine, SignedArtifact};
use crate::storage::{RemovableStorage, write_file};
use crate::types::{Pin, RemovableVolume, SignatureMode, UsbStatus, Verification};

/**
    Where a freshly generated key pair ended up.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedKeys {
    pub public_key_path: PathBuf,
    /// Sealed key on the removable volume, if one was chosen.
    pub placed_key: Option<PathBuf>,
    /// Sealed key on local disk, if requested.
    pub local_copy: Option<PathBuf>,
    pub public_pem: String,
}

/**
    Use-case entry points for key generation, signing and verification.

    Every argument the user supplies interactively is an `Option`, where
    `None` means the prompt or picker was cancelled. Nothing is remembered
    between calls; volumes are enumerated again each time.
*/
#[derive(Debug)]
pub struct Custodian {
    config: SignerConfig,
    custody: KeyCustody,
    storage: RemovableStorage,
    engine: SignatureEngine,
}

impl Custodian {
    pub fn new(config: SignerConfig) -> Self {
        let storage = RemovableStorage::from_config(&config.storage);
        Self::with_storage(config, storage)
    }

    pub fn with_storage(config: SignerConfig, storage: RemovableStorage) -> Self {
        Self {
            custody: KeyCustody::new(config.custody.clone()),
            engine: SignatureEngine::new(config.signature.clone()),
            storage,
            config,
        }
    }

    pub fn config(&self) -> &SignerConfig {
        &self.config
    }

    pub fn custody(&self) -> &KeyCustody {
        &self.custody
    }

    pub fn storage(&self) -> &RemovableStorage {
        &self.storage
    }

    pub fn volumes(&self) -> SignerResult<Vec<RemovableVolume>> {
        self.storage.enumerate()
    }

    pub fn status(&self) -> SignerResult<UsbStatus> {
        self.storage.status()
    }

    /**
        Generate a key pair, seal the private half under `pin` and store it
        on `target_volume` and/or at `local_copy`. The public key is written
        as PEM to `public_key_path`.

        Inputs are checked before the (slow) key generation starts. The
        public key is written before any sealed key, so a failed public key
        write leaves no sealed key behind.
    */
    pub fn generate(
        &self,
        pin: Option<&str>,
        target_volume: Option<&RemovableVolume>,
        public_key_path: Option<&Path>,
        local_copy: Option<&Path>,
    ) -> SignerResult<GeneratedKeys> {
        let pin = Pin::new(pin)?;
        let public_key_path = public_key_path.ok_or(SignerError::NoSelection)?;
        if target_volume.is_none() && local_copy.is_none() {
            return Err(SignerError::NoSelection);
        }
        if let Some(volume) = target_volume.filter(|v| !v.is_present()) {
            return Err(SignerError::VolumeUnavailable(volume.mount_path.clone()));
        }

        let pair = self.custody.generate()?;
        let public_pem = pair.public_pem()?;
        write_file(public_key_path, public_pem.as_bytes())?;

        let sealed = self.custody.seal_key(pair.private_key(), &pin)?.to_bytes();
        let placed_key = target_volume
            .map(|volume| self.storage.place(&sealed, volume, None))
            .transpose()?;
        if let Some(path) = local_copy {
            write_file(path, &sealed)?;
        }

        tracing::info!(
            bits = pair.bits(),
            public_key = %public_key_path.display(),
            "generated key pair"
        );
        Ok(GeneratedKeys {
            public_key_path: public_key_path.to_path_buf(),
            placed_key,
            local_copy: local_copy.map(Path::to_path_buf),
            public_pem,
        })
    }

    /**
        Sign `document` with the key found on removable media.

        The key is located before the PIN is looked at, so an absent device
        is reported as such regardless of PIN entry. `key_selection` picks
        among several keys (the key file or its volume root). `mode`
        overrides the configured persistence mode.
    */
    pub fn sign(
        &self,
        document: Option<&Path>,
        pin: Option<&str>,
        key_selection: Option<&Path>,
        mode: Option<SignatureMode>,
    ) -> SignerResult<SignedArtifact> {
        let document = document.ok_or(SignerError::NoSelection)?;
        let key_path = self.storage.locate_key(key_selection)?;
        let pin = Pin::new(pin)?;

        let blob = self.storage.read_key(&key_path)?;
        let private_key = self.custody.unseal(&blob, &pin)?;
        tracing::debug!(key = %key_path.display(), "using key from removable media");

        let mode = mode.unwrap_or(self.config.signature.mode);
        self.engine.sign(document, private_key, mode)
    }

    /**
        Check `document` against the PEM or DER public key at `public_key`.
        `sidecar` forces detached verification from that file.
    */
    pub fn verify(
        &self,
        document: Option<&Path>,
        public_key: Option<&Path>,
        sidecar: Option<&Path>,
    ) -> SignerResult<Verification> {
        let document = document.ok_or(SignerError::NoSelection)?;
        let public_key = public_key.ok_or(SignerError::NoSelection)?;

        let encoded = fs::read(public_key).map_err(|e| SignerError::io(public_key, e))?;
        let key = load_public_key(&encoded)?;
        self.engine.verify(document, &key, sidecar)
    }
}
