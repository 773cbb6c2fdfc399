//! Encrypted identifier codec - opaque external form of primary keys.
//!
//! URLs never carry raw database ids. `encode` wraps an id in
//! XChaCha20-Poly1305 under a process-wide key and transports it as
//! base64url; `decode` is the exact inverse. The AEAD tag makes any
//! tampered or forged value fail decryption, so `decode` can only
//! ever return an id that `encode` produced.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    XChaCha20Poly1305, XNonce,
};

use crate::config::APP_KEY_LENGTH;
use crate::errors::{AppError, AppResult};

/// XChaCha20-Poly1305 nonce length in bytes, prepended to the ciphertext
const NONCE_LENGTH: usize = 24;

/// Reversible, keyed codec for user identifiers.
#[derive(Clone)]
pub struct IdCodec {
    cipher: XChaCha20Poly1305,
}

impl std::fmt::Debug for IdCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdCodec").finish_non_exhaustive()
    }
}

impl IdCodec {
    /// Create a codec from the application key.
    pub fn new(key: &[u8; APP_KEY_LENGTH]) -> Self {
        Self {
            cipher: XChaCha20Poly1305::new(key.into()),
        }
    }

    /// Encrypt an id into its opaque URL-safe form.
    ///
    /// A fresh random nonce is used per call, so repeated encodings of
    /// the same id differ; all of them decode back to it.
    pub fn encode(&self, id: i32) -> AppResult<String> {
        let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, id.to_be_bytes().as_slice())
            .map_err(|_| AppError::internal("Identifier encryption failed"))?;

        let mut raw = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
        raw.extend_from_slice(&nonce);
        raw.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(raw))
    }

    /// Decrypt an opaque identifier back to the raw id.
    ///
    /// # Errors
    /// `AppError::InvalidId` for any input not produced by [`encode`]
    /// with the same key: bad base64, truncated payloads, or values
    /// whose authentication tag does not verify.
    ///
    /// [`encode`]: IdCodec::encode
    pub fn decode(&self, token: &str) -> AppResult<i32> {
        let raw = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| AppError::InvalidId)?;

        if raw.len() <= NONCE_LENGTH {
            return Err(AppError::InvalidId);
        }
        let (nonce, ciphertext) = raw.split_at(NONCE_LENGTH);

        let plaintext = self
            .cipher
            .decrypt(XNonce::from_slice(nonce), ciphertext)
            .map_err(|_| AppError::InvalidId)?;

        let bytes: [u8; 4] = plaintext.as_slice().try_into().map_err(|_| AppError::InvalidId)?;
        Ok(i32::from_be_bytes(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> IdCodec {
        IdCodec::new(b"test-app-key-32-bytes-padding-ok")
    }

    #[test]
    fn encode_decode_round_trip() {
        let codec = codec();
        for id in [0, 1, 42, 99_999, i32::MAX] {
            let token = codec.encode(id).unwrap();
            assert_eq!(codec.decode(&token).unwrap(), id);
        }
    }

    #[test]
    fn encodings_are_randomized_but_equivalent() {
        let codec = codec();
        let first = codec.encode(7).unwrap();
        let second = codec.encode(7).unwrap();
        assert_ne!(first, second);
        assert_eq!(codec.decode(&first).unwrap(), 7);
        assert_eq!(codec.decode(&second).unwrap(), 7);
    }

    #[test]
    fn garbage_input_fails_with_invalid_id() {
        let codec = codec();
        for input in ["", "not-a-token", "AAAA", "%%%", "abcdefghijklmnopqrstuvwxyz012345"] {
            assert!(matches!(codec.decode(input), Err(AppError::InvalidId)));
        }
    }

    #[test]
    fn tampered_token_is_rejected() {
        let codec = codec();
        let token = codec.encode(123).unwrap();

        // Flip one character in the middle of the token
        let mut chars: Vec<char> = token.chars().collect();
        let mid = chars.len() / 2;
        chars[mid] = if chars[mid] == 'A' { 'B' } else { 'A' };
        let tampered: String = chars.into_iter().collect();

        assert!(matches!(codec.decode(&tampered), Err(AppError::InvalidId)));
    }

    #[test]
    fn token_from_a_different_key_is_rejected() {
        let token = codec().encode(5).unwrap();
        let other = IdCodec::new(b"another-key-32-bytes-padding-ok!");
        assert!(matches!(other.decode(&token), Err(AppError::InvalidId)));
    }
}
