//! Gas, size and limit constants used by code analysis and the creation state
//! machine. Values are the ones the test scenarios in the specification are
//! calibrated against (§9, "Open questions / source ambiguities").

/// Bytes of `STOP`-filled padding appended after legacy code: 32 for a `PUSH32`'s
/// worth of missing immediate bytes, plus one guaranteed terminating `STOP`.
pub const CODE_PADDING: usize = 33;

/// Maximum EVM stack depth.
pub const STACK_LIMIT: usize = 1024;

/// Maximum `max_stack_height` an EOF code section may declare.
pub const EOF_MAX_STACK_HEIGHT: u16 = 1023;

/// Maximum number of sub-containers an EOF container section may declare.
pub const MAX_CONTAINER_SECTIONS: usize = 256;

/// Maximum size, including header, of a deployed contract (EIP-170 carried forward
/// into EOF deploy containers).
pub const MAX_CODE_SIZE: usize = 0x6000;

/// Maximum size of initcode, whether supplied inline (`EOFCREATE`'s sub-container)
/// or out-of-band (`TXCREATE`'s `initcodes` entry).
pub const MAX_INITCODE_SIZE: usize = 0xC000;

/// Maximum call/create depth (`EOFCREATE`/`TXCREATE` light-fail at this depth).
pub const MAX_CALL_DEPTH: usize = 1024;

/// Constant gas charged by `EOFCREATE`/`TXCREATE` before memory expansion and
/// initcode hashing costs.
pub const EOFCREATE_GAS: u64 = 32_000;

/// Gas charged per 32-byte word of initcode when hashing it for address derivation.
pub const INITCODE_WORD_GAS: u64 = 6;

/// Fraction of the parent's remaining gas retained instead of handed to the child
/// frame (EIP-150's "63/64ths rule").
pub const CALL_GAS_RETAIN_DIVISOR: u64 = 64;

/// Maximum number of entries in a transaction's `initcodes` list.
pub const MAX_INITCODES_PER_TX: usize = 256;

/// Ceiling division of `n` bytes into 32-byte words.
#[inline]
pub const fn word_count(n: usize) -> usize {
    n.div_ceil(32)
}
