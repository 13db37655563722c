/**
    Well-known filename of the sealed private key on a removable volume.
*/
pub const ENCRYPTED_KEY_FILENAME: &str = "private_encrypted.pem";

/**
    Default filename for the exported public key.
*/
pub const PUBLIC_KEY_FILENAME: &str = "public.pem";

/**
    Default RSA modulus size in bits.
*/
pub const DEFAULT_KEY_BITS: usize = 4096;

/**
    AES block size in bytes. Also the IV length for CBC sealing.
*/
pub const AES_BLOCK_SIZE: usize = 16;

/**
    Length of the PIN-derived AES-256 key in bytes.
*/
pub const DERIVED_KEY_LEN: usize = 32;

/**
    Document-info field holding the base64 signature.
*/
pub const SIGNATURE_FIELD: &str = "Signature";

/**
    Suffix appended to the file stem of an embedded-mode signed artifact.
*/
pub const SIGNED_SUFFIX: &str = "_signed";

/**
    Extension of a detached signature sidecar.
*/
pub const SIDECAR_EXTENSION: &str = "sig";

/**
    PDF header version written by the canonical writer.
*/
pub const CANONICAL_PDF_VERSION: &str = "1.7";

/**
    Page attributes a page may inherit from its ancestors in the page tree.
*/
pub const INHERITABLE_PAGE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];
