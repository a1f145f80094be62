// src/blockchain/memo.rs

//! Encrypted transfer memos.
//!
//! A memo is encrypted with AES-256-CBC under a key derived from the ECDH
//! secret of the sender's and recipient's memo keys plus a one-time nonce,
//! then serialized together with both public keys and base58 encoded behind
//! a leading `#`.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use sha2::{Digest, Sha256, Sha512};
use thiserror::Error;
use zeroize::Zeroizing;

use super::encoding::{DecodeError, Decoder, Encoder};
use super::keys::{KeyError, PrivateKey, PublicKey};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Marker prefix of encrypted memos.
pub const MEMO_MARKER: char = '#';

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MemoError {
    #[error("memo is not encrypted (missing '#' prefix)")]
    NotEncrypted,
    #[error("invalid base58 in encrypted memo")]
    Base58,
    #[error("malformed encrypted memo: {0}")]
    Malformed(#[from] DecodeError),
    #[error("invalid key in encrypted memo: {0}")]
    Key(#[from] KeyError),
    #[error("memo checksum mismatch (wrong key?)")]
    Checksum,
    #[error("memo could not be decrypted")]
    Cipher,
}

pub fn is_encrypted(memo: &str) -> bool {
    memo.starts_with(MEMO_MARKER)
}

/// Encrypts `memo` from `sender` to `recipient` with a random nonce.
pub fn encode(sender: &PrivateKey, recipient: &PublicKey, memo: &str) -> Result<String, MemoError> {
    encode_with_nonce(sender, recipient, memo, rand::random())
}

pub fn encode_with_nonce(
    sender: &PrivateKey,
    recipient: &PublicKey,
    memo: &str,
    nonce: u64,
) -> Result<String, MemoError> {
    let text = memo.strip_prefix(MEMO_MARKER).unwrap_or(memo);
    let mut plain = Encoder::new();
    plain.string(text);
    let plain = Zeroizing::new(plain.into_bytes());

    let key = MemoKey::derive(sender, recipient, nonce);
    let cipher = Aes256CbcEnc::new_from_slices(key.cipher_key(), key.iv())
        .map_err(|_| MemoError::Cipher)?;
    let encrypted = cipher.encrypt_padded_vec_mut::<Pkcs7>(&plain);

    let mut out = Encoder::new();
    out.raw(&sender.public_key().to_bytes())
        .raw(&recipient.to_bytes())
        .u64(nonce)
        .u32(key.check())
        .bytes(&encrypted);

    Ok(format!(
        "{MEMO_MARKER}{}",
        bs58::encode(out.as_bytes()).into_string()
    ))
}

/// Decrypts a memo addressed to, or sent by, the owner of `receiver`.
pub fn decode(receiver: &PrivateKey, encoded: &str) -> Result<String, MemoError> {
    let body = encoded
        .trim()
        .strip_prefix(MEMO_MARKER)
        .ok_or(MemoError::NotEncrypted)?;
    let raw = bs58::decode(body)
        .into_vec()
        .map_err(|_| MemoError::Base58)?;

    let mut dec = Decoder::new(&raw);
    let from = PublicKey::from_bytes(dec.take(33)?)?;
    let to = PublicKey::from_bytes(dec.take(33)?)?;
    let nonce = dec.u64()?;
    let check = dec.u32()?;
    let encrypted = dec.bytes()?;

    let own = receiver.public_key();
    let other = if own == from { &to } else { &from };

    let key = MemoKey::derive(receiver, other, nonce);
    if key.check() != check {
        return Err(MemoError::Checksum);
    }
    let cipher =
        Aes256CbcDec::new_from_slices(key.cipher_key(), key.iv()).map_err(|_| MemoError::Cipher)?;
    let plain = Zeroizing::new(
        cipher
            .decrypt_padded_vec_mut::<Pkcs7>(encrypted)
            .map_err(|_| MemoError::Cipher)?,
    );

    Ok(Decoder::new(&plain).string()?)
}

/// `sha512(nonce ‖ shared_secret)`: bytes 0..32 are the AES key, 32..48 the IV.
struct MemoKey(Zeroizing<[u8; 64]>);

impl MemoKey {
    fn derive(own: &PrivateKey, other: &PublicKey, nonce: u64) -> Self {
        let shared = Zeroizing::new(own.shared_secret(other));
        let mut hasher = Sha512::new();
        hasher.update(nonce.to_le_bytes());
        hasher.update(&shared[..]);
        let mut key = Zeroizing::new([0u8; 64]);
        key.copy_from_slice(&hasher.finalize());
        Self(key)
    }

    fn cipher_key(&self) -> &[u8] {
        &self.0[..32]
    }

    fn iv(&self) -> &[u8] {
        &self.0[32..48]
    }

    fn check(&self) -> u32 {
        let digest = Sha256::digest(&self.0[..]);
        u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]])
    }
}
