//! AES-GCM sealing / opening shared by `A*GCM` content encryption and `A*GCMKW` key wrapping.

use aes::Aes192;
use aes_gcm::{
    aead::{
        generic_array::{typenum::Unsigned, GenericArray},
        AeadCore, AeadInPlace, KeyInit,
    },
    Aes128Gcm, Aes256Gcm, AesGcm,
};
use anyhow::{anyhow, ensure};

/// Byte length of GCM initialization vectors used by JOSE.
pub(crate) const IV_LEN: usize = 12;
/// Byte length of GCM authentication tags used by JOSE.
pub(crate) const TAG_LEN: usize = 16;

type Aes192Gcm = AesGcm<Aes192, aes_gcm::aead::consts::U12>;

fn open_with<C: AeadInPlace + KeyInit>(
    key: &[u8],
    iv: &[u8],
    aad: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
) -> anyhow::Result<Vec<u8>> {
    let cipher = C::new_from_slice(key).map_err(|_| anyhow!("invalid AES-GCM key length"))?;
    ensure!(
        iv.len() == <C as AeadCore>::NonceSize::USIZE,
        "invalid AES-GCM IV length"
    );
    ensure!(tag.len() == TAG_LEN, "invalid AES-GCM tag length");

    let mut buffer = ciphertext.to_vec();
    cipher
        .decrypt_in_place_detached(
            GenericArray::from_slice(iv),
            aad,
            &mut buffer,
            GenericArray::from_slice(tag),
        )
        .map_err(|_| anyhow!("AES-GCM authentication failed"))?;
    Ok(buffer)
}

fn seal_with<C: AeadInPlace + KeyInit>(
    key: &[u8],
    iv: &[u8],
    aad: &[u8],
    plaintext: &[u8],
) -> anyhow::Result<(Vec<u8>, Vec<u8>)> {
    let cipher = C::new_from_slice(key).map_err(|_| anyhow!("invalid AES-GCM key length"))?;
    ensure!(
        iv.len() == <C as AeadCore>::NonceSize::USIZE,
        "invalid AES-GCM IV length"
    );

    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(GenericArray::from_slice(iv), aad, &mut buffer)
        .map_err(|_| anyhow!("AES-GCM encryption failed"))?;
    Ok((buffer, tag.to_vec()))
}

/// Decrypts and authenticates `ciphertext`. The AES variant is selected by the key length.
pub(crate) fn open(
    key: &[u8],
    iv: &[u8],
    aad: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
) -> anyhow::Result<Vec<u8>> {
    match key.len() {
        16 => open_with::<Aes128Gcm>(key, iv, aad, ciphertext, tag),
        24 => open_with::<Aes192Gcm>(key, iv, aad, ciphertext, tag),
        32 => open_with::<Aes256Gcm>(key, iv, aad, ciphertext, tag),
        len => Err(anyhow!("invalid AES-GCM key length: {len}")),
    }
}

/// Encrypts `plaintext`, returning the ciphertext and the detached tag.
pub(crate) fn seal(
    key: &[u8],
    iv: &[u8],
    aad: &[u8],
    plaintext: &[u8],
) -> anyhow::Result<(Vec<u8>, Vec<u8>)> {
    match key.len() {
        16 => seal_with::<Aes128Gcm>(key, iv, aad, plaintext),
        24 => seal_with::<Aes192Gcm>(key, iv, aad, plaintext),
        32 => seal_with::<Aes256Gcm>(key, iv, aad, plaintext),
        len => Err(anyhow!("invalid AES-GCM key length: {len}")),
    }
}
