// src/blockchain/keys.rs

//! Hive key and signature encodings on top of secp256k1.
//!
//! - private keys travel as WIF: base58(`0x80 ‖ key ‖ sha256d(0x80 ‖ key)[..4]`)
//! - public keys travel as `STM` + base58(`compressed ‖ ripemd160(compressed)[..4]`)
//! - signatures travel as 65 hex-encoded bytes: `recovery_id + 31 ‖ r ‖ s`

use std::fmt;
use std::str::FromStr;

use k256::ecdsa::{
    signature::hazmat::PrehashVerifier, Signature as EcdsaSignature, SigningKey, VerifyingKey,
};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256, Sha512};
use thiserror::Error;
use zeroize::Zeroizing;

/// Address prefix of Hive mainnet public keys.
pub const ADDRESS_PREFIX: &str = "STM";

const WIF_VERSION: u8 = 0x80;
const COMPACT_HEADER: u8 = 31;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid base58 encoding")]
    Base58,
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },
    #[error("invalid private key version byte")]
    Version,
    #[error("key checksum mismatch")]
    Checksum,
    #[error("key is not a valid secp256k1 point or scalar")]
    Curve,
    #[error("public key must start with {ADDRESS_PREFIX}")]
    Prefix,
    #[error("invalid signature encoding")]
    Signature,
    #[error("signing failed")]
    Signing,
}

fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

fn double_sha256(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

fn ripemd160_checksum(data: &[u8]) -> [u8; 4] {
    let digest = Ripemd160::digest(data);
    let mut out = [0u8; 4];
    out.copy_from_slice(&digest[..4]);
    out
}

/// A secp256k1 private key in one of the account's authority roles.
#[derive(Clone)]
pub struct PrivateKey(SigningKey);

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PrivateKey").field(&"[REDACTED]").finish()
    }
}

impl PrivateKey {
    /// Parses a WIF encoded private key.
    pub fn from_wif(wif: &str) -> Result<Self, KeyError> {
        let raw = Zeroizing::new(
            bs58::decode(wif.trim())
                .into_vec()
                .map_err(|_| KeyError::Base58)?,
        );
        if raw.len() != 37 {
            return Err(KeyError::Length {
                expected: 37,
                actual: raw.len(),
            });
        }
        if raw[0] != WIF_VERSION {
            return Err(KeyError::Version);
        }
        let (payload, checksum) = raw.split_at(33);
        if double_sha256(payload)[..4] != *checksum {
            return Err(KeyError::Checksum);
        }
        Self::from_bytes(&payload[1..])
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != 32 {
            return Err(KeyError::Length {
                expected: 32,
                actual: bytes.len(),
            });
        }
        SigningKey::from_slice(bytes)
            .map(Self)
            .map_err(|_| KeyError::Curve)
    }

    /// Key derived as `sha256(seed)`.
    pub fn from_seed(seed: &str) -> Result<Self, KeyError> {
        let digest = Zeroizing::new(sha256(seed.as_bytes()));
        Self::from_bytes(&digest[..])
    }

    pub fn to_wif(&self) -> String {
        let mut payload = Zeroizing::new(Vec::with_capacity(37));
        payload.push(WIF_VERSION);
        payload.extend_from_slice(self.0.to_bytes().as_slice());
        let checksum = double_sha256(&payload);
        payload.extend_from_slice(&checksum[..4]);
        bs58::encode(payload.as_slice()).into_string()
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.verifying_key().clone())
    }

    /// Signs a 32-byte digest with a deterministic (RFC 6979), low-S signature.
    pub fn sign(&self, digest: &[u8; 32]) -> Result<Signature, KeyError> {
        let (signature, recovery_id) = self
            .0
            .sign_prehash_recoverable(digest)
            .map_err(|_| KeyError::Signing)?;
        let mut bytes = [0u8; 65];
        bytes[0] = recovery_id.to_byte() + COMPACT_HEADER;
        bytes[1..].copy_from_slice(signature.to_bytes().as_slice());
        Ok(Signature(bytes))
    }

    /// `sha512` of the x coordinate of the ECDH point, as used for memo keys.
    pub fn shared_secret(&self, public: &PublicKey) -> [u8; 64] {
        let shared = k256::ecdh::diffie_hellman(self.0.as_nonzero_scalar(), public.0.as_affine());
        let digest = Sha512::digest(shared.raw_secret_bytes());
        let mut out = [0u8; 64];
        out.copy_from_slice(&digest);
        out
    }
}

/// A compressed secp256k1 public key.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey(VerifyingKey);

impl PublicKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != 33 {
            return Err(KeyError::Length {
                expected: 33,
                actual: bytes.len(),
            });
        }
        VerifyingKey::from_sec1_bytes(bytes)
            .map(Self)
            .map_err(|_| KeyError::Curve)
    }

    pub fn to_bytes(&self) -> [u8; 33] {
        let point = self.0.to_encoded_point(true);
        let mut out = [0u8; 33];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// Verifies a signature over a 32-byte digest.
    pub fn verify(&self, digest: &[u8; 32], signature: &Signature) -> bool {
        match EcdsaSignature::from_slice(&signature.0[1..]) {
            Ok(sig) => self.0.verify_prehash(digest, &sig).is_ok(),
            Err(_) => false,
        }
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = self.to_bytes();
        let mut data = Vec::with_capacity(37);
        data.extend_from_slice(&key);
        data.extend_from_slice(&ripemd160_checksum(&key));
        write!(f, "{}{}", ADDRESS_PREFIX, bs58::encode(data).into_string())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({self})")
    }
}

impl FromStr for PublicKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let encoded = s.trim().strip_prefix(ADDRESS_PREFIX).ok_or(KeyError::Prefix)?;
        let raw = bs58::decode(encoded)
            .into_vec()
            .map_err(|_| KeyError::Base58)?;
        if raw.len() != 37 {
            return Err(KeyError::Length {
                expected: 37,
                actual: raw.len(),
            });
        }
        let (key, checksum) = raw.split_at(33);
        if ripemd160_checksum(key) != *checksum {
            return Err(KeyError::Checksum);
        }
        Self::from_bytes(key)
    }
}

/// Compact recoverable signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; 65]);

impl Signature {
    pub fn as_bytes(&self) -> &[u8; 65] {
        &self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({self})")
    }
}

impl FromStr for Signature {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = hex::decode(s.trim()).map_err(|_| KeyError::Signature)?;
        let bytes: [u8; 65] = raw.try_into().map_err(|_| KeyError::Signature)?;
        // 27..=34 covers both compressed and uncompressed recovery headers
        if !(27..=34).contains(&bytes[0]) {
            return Err(KeyError::Signature);
        }
        Ok(Self(bytes))
    }
}

/// `sha256` helper shared with the signing tools.
pub fn message_digest(message: &[u8]) -> [u8; 32] {
    sha256(message)
}
