/*!
    Symmetric primitives used to seal the private key at rest.

    - AES-256-CBC with PKCS#7 padding and a random IV: default sealing mode
    - AES-256-ECB with PKCS#7 padding: read path for keys sealed by older tooling
*/

pub(crate) mod aes;
pub(crate) mod padding;

use thiserror::Error;

/**
    Low-level cipher failures. Callers decide how much of this to expose;
    on the decrypt path all of them collapse into one opaque error.
*/
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum CipherError {
    #[error("invalid AES input: {0}")]
    InvalidInput(&'static str),
    #[error("invalid PKCS#7 padding")]
    PaddingInvalid,
}
