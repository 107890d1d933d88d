use sha3::{Digest, Keccak256 as Sha3Keccak256};

/// Single-shot Keccak-256, the hash ubiquitously used for the `CREATE`/`CREATE2`/`EOFCREATE`
/// address derivation and for the `TXCREATE` initcode registry key.
pub fn keccak_hash(data: impl AsRef<[u8]>) -> [u8; 32] {
    Keccak256::new().update(data).finalize()
}

/// Streaming Keccak-256, mirrors the single-shot helper's interface for multi-part inputs
/// such as `0xFF || creator || salt || keccak256(initcode)`.
#[derive(Clone, Default)]
pub struct Keccak256 {
    inner: Sha3Keccak256,
}

impl Keccak256 {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn update(mut self, data: impl AsRef<[u8]>) -> Self {
        self.inner.update(data.as_ref());
        self
    }

    pub fn finalize(self) -> [u8; 32] {
        self.inner.finalize().into()
    }
}
