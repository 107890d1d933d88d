//! # ethrex-crypto
//!
//! Cryptographic primitives shared by the analysis and creation layers.
//!
//! ## Quick Start
//!
//! ```rust
//! use ethrex_crypto::keccak_hash;
//!
//! let hash = keccak_hash(b"hello");
//! assert_eq!(hash.len(), 32);
//! ```

pub mod keccak;

pub use keccak::keccak_hash;
