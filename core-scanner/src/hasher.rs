//! Content hashing
//!
//! Streams a file through SHA-256 in fixed 8 KiB blocks and returns the
//! hex-encoded digest. Pure function, no state.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Block size for streaming reads
const BLOCK_SIZE: usize = 8192;

/// Compute the SHA-256 digest of a file's contents.
pub fn hash_file(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut block = [0u8; BLOCK_SIZE];

    loop {
        let read = file.read(&mut block)?;
        if read == 0 {
            break;
        }
        hasher.update(&block[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
