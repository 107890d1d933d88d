//! # ethrex-common
//!
//! Shared primitive types used across the analysis and creation layers: addresses,
//! 256-bit words, byte buffers and the fork/revision enum that gates EOF support.

pub mod fork;
pub mod types;

pub use bytes::Bytes;
pub use ethereum_types::{Address, H256, U256};
pub use fork::Fork;
pub use types::{AccountInfo, TxKind};
