//! Crypto workload: AES-256 round trip plus SHA-256 digest
//!
//! One operation encrypts the whole buffer block by block, decrypts it
//! again and hashes the decrypted bytes. All buffers and the cipher state
//! are prepared in [`CryptoWorkload::new`], so the timed loop never
//! allocates.

use std::hint::black_box;

use aes::cipher::{generic_array::GenericArray, BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes256;
use sha2::digest::Output;
use sha2::{Digest, Sha256};

use crate::io::buffer::{random_bytes, try_filled};
use crate::{BenchError, Result};

/// AES block length in bytes
pub const BLOCK_SIZE: usize = 16;

/// Round `len` up to a whole number of AES blocks
pub fn padded_len(len: usize) -> usize {
    len.div_ceil(BLOCK_SIZE).saturating_mul(BLOCK_SIZE)
}

/// Encrypt `input` into `output` block by block; both must be block-aligned
pub fn encrypt_into(cipher: &Aes256, input: &[u8], output: &mut [u8]) {
    for (src, dst) in input
        .chunks_exact(BLOCK_SIZE)
        .zip(output.chunks_exact_mut(BLOCK_SIZE))
    {
        cipher.encrypt_block_b2b(GenericArray::from_slice(src), GenericArray::from_mut_slice(dst));
    }
}

/// Inverse of [`encrypt_into`]
pub fn decrypt_into(cipher: &Aes256, input: &[u8], output: &mut [u8]) {
    for (src, dst) in input
        .chunks_exact(BLOCK_SIZE)
        .zip(output.chunks_exact_mut(BLOCK_SIZE))
    {
        cipher.decrypt_block_b2b(GenericArray::from_slice(src), GenericArray::from_mut_slice(dst));
    }
}

/// Pre-allocated state for one crypto worker
pub struct CryptoWorkload {
    cipher: Aes256,
    plaintext: Vec<u8>,
    ciphertext: Vec<u8>,
    decrypted: Vec<u8>,
    hasher: Sha256,
    digest: Output<Sha256>,
}

impl CryptoWorkload {
    /// Prepare a workload over `data_size` bytes (rounded up to the block size)
    pub fn new(data_size: usize, seed: u64) -> Result<Self> {
        let len = padded_len(data_size);
        let key = random_bytes(32, seed ^ 0x6b65_79)?;

        Ok(Self {
            cipher: Aes256::new(GenericArray::from_slice(&key)),
            plaintext: random_bytes(len, seed)?,
            ciphertext: try_filled(len, 0u8)?,
            decrypted: try_filled(len, 0u8)?,
            hasher: Sha256::new(),
            digest: Output::<Sha256>::default(),
        })
    }

    /// Buffer length actually processed per operation
    pub fn len(&self) -> usize {
        self.plaintext.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plaintext.is_empty()
    }

    /// One full buffer transform
    pub fn run_once(&mut self) {
        encrypt_into(&self.cipher, &self.plaintext, &mut self.ciphertext);
        decrypt_into(&self.cipher, &self.ciphertext, &mut self.decrypted);
        self.hasher.update(&self.decrypted);
        self.hasher.finalize_into_reset(&mut self.digest);
        black_box(&self.digest);
    }

    /// Run once and check the round trip and digest
    pub fn verify(&mut self) -> Result<()> {
        self.run_once();

        if self.decrypted != self.plaintext {
            return Err(BenchError::Verification(
                "AES round trip did not reproduce the plaintext".to_string(),
            ));
        }

        if self.ciphertext == self.plaintext {
            return Err(BenchError::Verification(
                "AES encryption left the buffer unchanged".to_string(),
            ));
        }

        if self.digest.iter().all(|&byte| byte == 0) {
            return Err(BenchError::Verification("SHA-256 digest is all zeros".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    const KEY: [u8; 32] = hex!("cc4a401b59245e80b1ccc86d4eea62322b04b0c890488a5a53e7306c2e46517d");
    const PLAINTEXT: [u8; 32] =
        hex!("42de0be8e330b60d3dca3e5ab4f06f54d53ae89c30060236c41f4984a411ea0b");
    const CIPHERTEXT: [u8; 32] =
        hex!("cde6f2e8b795f296d026564f419c86c0c04f173ecba2da93e6100d8a7b04b3c1");
    const DIGEST: [u8; 32] =
        hex!("293ad79b5ee95cfeb84918f4f592f10d280754c6de7ca786cb2f68189e2a8f9e");

    #[test]
    fn test_aes_known_vector() {
        let cipher = Aes256::new(GenericArray::from_slice(&KEY));
        let mut ciphertext = [0u8; 32];
        encrypt_into(&cipher, &PLAINTEXT, &mut ciphertext);
        assert_eq!(ciphertext, CIPHERTEXT);

        let mut decrypted = [0u8; 32];
        decrypt_into(&cipher, &ciphertext, &mut decrypted);
        assert_eq!(decrypted, PLAINTEXT);
    }

    #[test]
    fn test_sha256_known_vector() {
        let mut hasher = Sha256::new();
        let mut digest = Output::<Sha256>::default();
        hasher.update(PLAINTEXT);
        hasher.finalize_into_reset(&mut digest);
        assert_eq!(digest.as_slice(), &DIGEST);

        // reset leaves the hasher reusable
        hasher.update(PLAINTEXT);
        assert_eq!(hasher.finalize().as_slice(), &DIGEST);
    }

    #[test]
    fn test_buffer_is_padded_to_block() {
        assert_eq!(padded_len(1), 16);
        assert_eq!(padded_len(16), 16);
        assert_eq!(padded_len(10 * 1024), 10 * 1024);
        assert_eq!(padded_len(33), 48);

        let workload = CryptoWorkload::new(33, 1).unwrap();
        assert_eq!(workload.len(), 48);
    }

    #[test]
    fn test_workload_verifies() {
        let mut workload = CryptoWorkload::new(1024, 7).unwrap();
        workload.verify().unwrap();
        workload.run_once();
        workload.verify().unwrap();
    }
}
