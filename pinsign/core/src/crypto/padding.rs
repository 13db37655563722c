use super::CipherError;

/**
    Strip PKCS#7 padding. The trailing byte gives the pad length, which
    must be in `1..=block_size` and repeated across the whole pad.
*/
pub(crate) fn pkcs7_unpad(data: &[u8], block_size: usize) -> Result<&[u8], CipherError> {
    let Some(&last) = data.last() else {
        return Err(CipherError::PaddingInvalid);
    };
    if !data.len().is_multiple_of(block_size) {
        return Err(CipherError::PaddingInvalid);
    }

    let pad_len = usize::from(last);
    if !(1..=block_size).contains(&pad_len) {
        return Err(CipherError::PaddingInvalid);
    }

    let (body, pad) = data.split_at(data.len() - pad_len);
    if pad.iter().all(|&b| b == last) {
        Ok(body)
    } else {
        Err(CipherError::PaddingInvalid)
    }
}

/**
    Append PKCS#7 padding. Aligned input gains a whole block of padding.
*/
pub(crate) fn pkcs7_pad(data: &[u8], block_size: usize) -> Vec<u8> {
    let pad_len = block_size - data.len() % block_size;
    let fill = u8::try_from(pad_len).unwrap_or(u8::MAX);
    data.iter()
        .copied()
        .chain(std::iter::repeat_n(fill, pad_len))
        .collect()
}
