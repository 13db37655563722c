/*!
    RSA-PKCS#1 v1.5 / SHA-256 signatures over canonical document content.

    Signing and verification are one-shot pipelines. Each stage is its own
    type and is consumed by the transition to the next, so a stage cannot be
    skipped or replayed:

      sign:   KeyResolved -> Hashed -> Signed -> embedded artifact | sidecar
      verify: PublicKeyResolved -> VerifyHashed -> Verification
*/

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use lopdf::{Document, Object};
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

use crate::canonical::{self, CanonicalDocument};
use crate::config::SignatureConfig;
use crate::error::{SignerError, SignerResult};
use crate::storage::write_file;
use crate::types::{SignatureMode, Verification};

/**
    Signing stage 1: the private key is available.
*/
pub struct KeyResolved {
    key: RsaPrivateKey,
}

/**
    Signing stage 2: the canonical digest is known.
*/
pub struct Hashed {
    key: RsaPrivateKey,
    canonical: CanonicalDocument,
    metadata: Vec<(Vec<u8>, Object)>,
    digest: [u8; 32],
}

/**
    Signing stage 3: the signature exists and awaits persistence.
*/
#[derive(Debug)]
pub struct Signed {
    canonical: CanonicalDocument,
    metadata: Vec<(Vec<u8>, Object)>,
    signature: Vec<u8>,
}

impl KeyResolved {
    pub fn new(key: RsaPrivateKey) -> Self {
        Self { key }
    }

    /**
        Canonicalize the document and digest it. The source document's
        metadata is remembered so an embedded artifact can carry it on.
    */
    pub fn hash(self, document: &Document, signature_field: &str) -> SignerResult<Hashed> {
        let canonical = canonical::canonicalize_document(document)?;
        let digest = canonical.digest();
        tracing::debug!(digest = %hex::encode(digest), "document hashed");
        Ok(Hashed {
            key: self.key,
            metadata: canonical::read_metadata(document, signature_field),
            canonical,
            digest,
        })
    }
}

impl Hashed {
    pub fn digest(&self) -> &[u8; 32] {
        &self.digest
    }

    pub fn sign(self) -> SignerResult<Signed> {
        let signature = self
            .key
            .sign(Pkcs1v15Sign::new::<Sha256>(), &self.digest)
            .map_err(|e| SignerError::CryptoFailure(format!("signing: {e}")))?;
        Ok(Signed {
            canonical: self.canonical,
            metadata: self.metadata,
            signature,
        })
    }
}

impl Signed {
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /**
        Artifact bytes: the canonical container with the base64 signature
        in document-info field `field`.
    */
    pub fn embed(self, field: &str) -> SignerResult<Vec<u8>> {
        let encoded = data_encoding::BASE64.encode(&self.signature);
        canonical::embed(&self.canonical, self.metadata, field, &encoded)
    }

    /**
        Raw signature bytes for a sidecar.
    */
    pub fn detach(self) -> Vec<u8> {
        self.signature
    }
}

/**
    Verification stage 1: the public key is available.
*/
pub struct PublicKeyResolved {
    key: RsaPublicKey,
}

/**
    Verification stage 2: the canonical digest is recomputed.
*/
pub struct VerifyHashed {
    key: RsaPublicKey,
    digest: [u8; 32],
}

impl PublicKeyResolved {
    pub fn new(key: RsaPublicKey) -> Self {
        Self { key }
    }

    pub fn hash(self, document: &Document) -> SignerResult<VerifyHashed> {
        let canonical = canonical::canonicalize_document(document)?;
        Ok(VerifyHashed {
            key: self.key,
            digest: canonical.digest(),
        })
    }
}

impl VerifyHashed {
    pub fn check(self, signature: &[u8]) -> Verification {
        match self
            .key
            .verify(Pkcs1v15Sign::new::<Sha256>(), &self.digest, signature)
        {
            Ok(()) => Verification::Valid,
            Err(_) => Verification::InvalidSignature,
        }
    }
}

/**
    Where a verifier should take the signature from.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureSource {
    /// The document-info field of the document itself.
    Embedded,
    /// Raw bytes, e.g. read from a sidecar.
    Detached(Vec<u8>),
}

/**
    A persisted signature.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedArtifact {
    pub mode: SignatureMode,
    /// The `_signed` document in embedded mode, the sidecar in detached mode.
    pub path: PathBuf,
    pub signature: Vec<u8>,
}

/**
    Path of the embedded-mode artifact: `<stem><suffix>.<ext>` next to the input.
*/
pub fn signed_artifact_path(document: &Path, suffix: &str) -> PathBuf {
    let stem = document
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut name = format!("{stem}{suffix}");
    if let Some(ext) = document.extension() {
        name.push('.');
        name.push_str(&ext.to_string_lossy());
    }
    document.with_file_name(name)
}

/**
    Path of the detached sidecar: the input with its extension replaced.
*/
pub fn sidecar_path(document: &Path, extension: &str) -> PathBuf {
    document.with_extension(extension)
}

/**
    Signs and verifies documents according to a [`SignatureConfig`].
*/
#[derive(Debug, Clone, Default)]
pub struct SignatureEngine {
    config: SignatureConfig,
}

impl SignatureEngine {
    pub fn new(config: SignatureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SignatureConfig {
        &self.config
    }

    /**
        Run the signing pipeline up to [`Signed`] over in-memory bytes.
    */
    pub fn sign_bytes(&self, document: &[u8], key: RsaPrivateKey) -> SignerResult<Signed> {
        let document = canonical::load(document)?;
        KeyResolved::new(key)
            .hash(&document, &self.config.field)?
            .sign()
    }

    /**
        Sign the file at `document` and persist the result with `mode`.
        Embedded mode writes a new `_signed` document; detached mode writes
        a sidecar and leaves the document untouched. Either way an existing
        output file is overwritten.
    */
    pub fn sign(
        &self,
        document: &Path,
        key: RsaPrivateKey,
        mode: SignatureMode,
    ) -> SignerResult<SignedArtifact> {
        let bytes = read_document(document)?;
        let signed = self.sign_bytes(&bytes, key)?;
        let signature = signed.signature().to_vec();

        let path = match mode {
            SignatureMode::Embedded => {
                let path = signed_artifact_path(document, &self.config.signed_suffix);
                let artifact = signed.embed(&self.config.field)?;
                write_file(&path, &artifact)?;
                path
            }
            SignatureMode::Detached => {
                let path = sidecar_path(document, &self.config.sidecar_extension);
                write_file(&path, &signed.detach())?;
                path
            }
        };

        tracing::info!(%mode, path = %path.display(), "document signed");
        Ok(SignedArtifact {
            mode,
            path,
            signature,
        })
    }

    /**
        Verify in-memory document bytes.

        Unreadable documents, undecodable signature fields and a missing
        signature are errors; only a completed check yields a [`Verification`].
    */
    pub fn verify_bytes(
        &self,
        document: &[u8],
        source: SignatureSource,
        key: &RsaPublicKey,
    ) -> SignerResult<Verification> {
        let document = canonical::load(document)?;

        let signature = match source {
            SignatureSource::Detached(bytes) => bytes,
            SignatureSource::Embedded => {
                let field = canonical::signature_field(&document, &self.config.field)?
                    .ok_or(SignerError::NoSignaturePresent)?;
                decode_signature(&field)?
            }
        };
        if signature.is_empty() {
            return Err(SignerError::NoSignaturePresent);
        }

        let verification = PublicKeyResolved::new(key.clone())
            .hash(&document)?
            .check(&signature);
        tracing::info!(valid = verification.is_valid(), "signature checked");
        Ok(verification)
    }

    /**
        Verify the file at `document`.

        With an explicit `sidecar` the signature is read from it. Otherwise
        the embedded field is used when present, falling back to a sidecar
        at the conventional path.
    */
    pub fn verify(
        &self,
        document: &Path,
        key: &RsaPublicKey,
        sidecar: Option<&Path>,
    ) -> SignerResult<Verification> {
        let bytes = read_document(document)?;

        let source = match sidecar {
            Some(path) => SignatureSource::Detached(read_sidecar(path)?),
            None => {
                let parsed = canonical::load(&bytes)?;
                let conventional = sidecar_path(document, &self.config.sidecar_extension);
                if canonical::signature_field(&parsed, &self.config.field)?.is_some() {
                    SignatureSource::Embedded
                } else if conventional.is_file() {
                    SignatureSource::Detached(read_sidecar(&conventional)?)
                } else {
                    return Err(SignerError::NoSignaturePresent);
                }
            }
        };

        self.verify_bytes(&bytes, source, key)
    }
}

fn decode_signature(field: &[u8]) -> SignerResult<Vec<u8>> {
    let trimmed = field.trim_ascii();
    data_encoding::BASE64
        .decode(trimmed)
        .map_err(|e| SignerError::MalformedDocument(format!("signature field is not base64: {e}")))
}

fn read_document(path: &Path) -> SignerResult<Vec<u8>> {
    fs::read(path).map_err(|e| SignerError::io(path, e))
}

fn read_sidecar(path: &Path) -> SignerResult<Vec<u8>> {
    fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => SignerError::NoSignaturePresent,
        _ => SignerError::io(path, e),
    })
}
