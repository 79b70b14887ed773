// src/aliases.rs
//! Secret-holding types used throughout encrypted-secret
//!
//! Everything here is wiped from memory on drop.

use zeroize::Zeroizing;

// Raw cipher key bytes; length depends on the algorithm
pub type KeyMaterial = Zeroizing<Vec<u8>>;
