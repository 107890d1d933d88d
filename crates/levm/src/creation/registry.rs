//! C7: the transaction-scoped initcode registry `TXCREATE` resolves hashes against
//! (§3, §4.6.2).

use std::collections::HashMap;

use ethrex_common::{Bytes, H256};
use ethrex_crypto::keccak_hash;

use crate::constants::MAX_INITCODE_SIZE;
use crate::errors::TxValidationError;

/// Ordered, hash-indexed initcode list carried by an `initcodes`-type transaction.
/// Built once at transaction-validation time; read-only for the rest of the
/// transaction's lifetime. On a hash collision between two entries, the first
/// occurrence wins — later entries with the same hash are unreachable by design,
/// matching how a map-keyed lookup degrades rather than erroring.
#[derive(Debug, Clone, Default)]
pub struct InitcodeRegistry {
    ordered: Vec<Bytes>,
    by_hash: HashMap<H256, Bytes>,
}

impl InitcodeRegistry {
    /// Builds a registry from a transaction's raw `initcodes` list, enforcing the
    /// count and per-entry size bounds (§6.2). Returns the first violated bound.
    pub fn build(initcodes: Vec<Bytes>) -> Result<Self, TxValidationError> {
        if initcodes.is_empty() {
            return Err(TxValidationError::InitCodeCountZero);
        }
        if initcodes.len() > crate::constants::MAX_INITCODES_PER_TX {
            return Err(TxValidationError::InitCodeCountLimitExceeded);
        }

        let mut by_hash = HashMap::with_capacity(initcodes.len());
        for code in &initcodes {
            if code.is_empty() {
                return Err(TxValidationError::InitCodeEmpty);
            }
            if code.len() > MAX_INITCODE_SIZE {
                return Err(TxValidationError::InitCodeSizeLimitExceeded);
            }
            let hash = H256::from(keccak_hash(code.as_ref()));
            by_hash.entry(hash).or_insert_with(|| code.clone());
        }

        Ok(Self {
            ordered: initcodes,
            by_hash,
        })
    }

    /// Looks up an initcode by its keccak256 hash, as `TXCREATE` does on every
    /// invocation. Absence is a light failure at the call site, not an error here.
    pub fn get(&self, hash: H256) -> Option<&Bytes> {
        self.by_hash.get(&hash)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}
