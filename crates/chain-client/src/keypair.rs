//! Admin keypair loading

use std::path::Path;

use bootstrap_core::ClientError;
use solana_sdk::signature::{read_keypair_file, Keypair};

use crate::Result;

/// Read a keypair file (JSON array of 64 bytes)
pub fn load_admin_keypair(path: &Path) -> Result<Keypair> {
    read_keypair_file(path).map_err(|e| ClientError::Keypair {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}
