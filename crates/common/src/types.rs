use crate::{Bytes, U256};

/// Snapshot of an account as seen by the creation state machine and its host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountInfo {
    pub nonce: u64,
    pub balance: U256,
    pub bytecode: Bytes,
}

impl AccountInfo {
    /// An account is considered empty for creation-collision purposes when it has
    /// never transacted and holds no code.
    pub fn has_no_code_and_no_nonce(&self) -> bool {
        self.nonce == 0 && self.bytecode.is_empty()
    }
}

/// Whether a transaction calls into an existing address or creates a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxKind {
    Call,
    Create,
}
