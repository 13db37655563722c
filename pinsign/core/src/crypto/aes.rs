use aes::{
    Aes256, Block,
    cipher::{BlockDecrypt, BlockEncrypt, KeyInit},
};

use super::CipherError;
use crate::constants::{AES_BLOCK_SIZE, DERIVED_KEY_LEN};

fn cipher(key: &[u8; DERIVED_KEY_LEN]) -> Aes256 {
    Aes256::new(key.into())
}

fn check_aligned(data: &[u8]) -> Result<(), CipherError> {
    if data.is_empty() || !data.len().is_multiple_of(AES_BLOCK_SIZE) {
        return Err(CipherError::InvalidInput(
            "data must be non-empty and block-aligned",
        ));
    }
    Ok(())
}

/**
    AES-256-CBC encryption.

    Key: PIN-derived 32-byte key.
    IV: random 16 bytes, generated per sealing by the caller.
    Plaintext: must already be PKCS#7-padded.
*/
pub(crate) fn aes256_cbc_encrypt(
    key: &[u8; DERIVED_KEY_LEN],
    iv: &[u8; AES_BLOCK_SIZE],
    plaintext: &[u8],
) -> Result<Vec<u8>, CipherError> {
    check_aligned(plaintext)?;

    let cipher = cipher(key);
    let mut ciphertext = Vec::with_capacity(plaintext.len());
    let mut prev = *iv;

    for chunk in plaintext.chunks_exact(AES_BLOCK_SIZE) {
        let mut block = Block::clone_from_slice(chunk);
        block.iter_mut().zip(&prev).for_each(|(b, p)| *b ^= p);
        cipher.encrypt_block(&mut block);
        prev.copy_from_slice(&block);
        ciphertext.extend_from_slice(&block);
    }

    Ok(ciphertext)
}

/**
    AES-256-CBC decryption. Output is still PKCS#7-padded.
*/
pub(crate) fn aes256_cbc_decrypt(
    key: &[u8; DERIVED_KEY_LEN],
    iv: &[u8; AES_BLOCK_SIZE],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CipherError> {
    check_aligned(ciphertext)?;

    let cipher = cipher(key);
    let mut plaintext = Vec::with_capacity(ciphertext.len());
    let mut prev = *iv;

    for chunk in ciphertext.chunks_exact(AES_BLOCK_SIZE) {
        let mut block = Block::clone_from_slice(chunk);
        cipher.decrypt_block(&mut block);
        plaintext.extend(block.iter().zip(&prev).map(|(b, p)| b ^ p));
        prev.copy_from_slice(chunk);
    }

    Ok(plaintext)
}

/**
    AES-256-ECB encryption, each block independent.
    Only kept so legacy custodied keys can be produced in tests and
    by callers that explicitly ask for byte compatibility.
*/
pub(crate) fn aes256_ecb_encrypt(
    key: &[u8; DERIVED_KEY_LEN],
    plaintext: &[u8],
) -> Result<Vec<u8>, CipherError> {
    check_aligned(plaintext)?;

    let cipher = cipher(key);
    let mut out = Vec::with_capacity(plaintext.len());
    for chunk in plaintext.chunks_exact(AES_BLOCK_SIZE) {
        let mut block = Block::clone_from_slice(chunk);
        cipher.encrypt_block(&mut block);
        out.extend_from_slice(&block);
    }
    Ok(out)
}

/**
    AES-256-ECB decryption. Output is still PKCS#7-padded.
*/
pub(crate) fn aes256_ecb_decrypt(
    key: &[u8; DERIVED_KEY_LEN],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CipherError> {
    check_aligned(ciphertext)?;

    let cipher = cipher(key);
    let mut out = Vec::with_capacity(ciphertext.len());
    for chunk in ciphertext.chunks_exact(AES_BLOCK_SIZE) {
        let mut block = Block::clone_from_slice(chunk);
        cipher.decrypt_block(&mut block);
        out.extend_from_slice(&block);
    }
    Ok(out)
}
