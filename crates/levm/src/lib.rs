//! Bytecode analysis and contract-creation core shared by the legacy and EOF
//! execution paths: jumpdest analysis and code padding for legacy code, EOF header
//! parsing and structural validation, the analysis dispatcher that picks between
//! them, and the `EOFCREATE`/`TXCREATE` state machine built on top.
//!
//! Deliberately out of scope: the general-purpose opcode dispatch loop, gas
//! accounting for anything other than creation opcodes, precompiles and persistent
//! storage — see each module for what it does cover.

pub mod code;
pub mod constants;
pub mod creation;
pub mod eof;
pub mod errors;
pub mod gas;
pub mod opcodes;
pub mod tx;

pub use code::{analyze, CodeAnalysis, JumpdestMap};
pub use creation::{
    derive_creation_address, eofcreate, txcreate, CreationOutcome, CreationRequest, Host,
    InitcodeExecutor, InitcodeRegistry, InitcodeTermination,
};
pub use eof::{validate_eof, validate_raw_eof, Eof, EofHeader, Mode};
pub use errors::{EofDecodeError, EofError, EofValidationError, InternalError, TxValidationError, VMError};
pub use tx::{build_initcode_registry, validate_create_transaction_data};

pub use ethrex_common::Fork;
