//! Error taxonomy for code analysis, EOF validation and the creation state machine.
//!
//! Mirrors the abstract kinds laid out for this subsystem: decode/validation errors
//! are fatal where they are raised (transaction admission, `TXCREATE`'s own
//! validation step), while everything that can happen mid-execution is folded into
//! [`VMError`] and, at the creation opcode boundary, into [`CreationOutcome`] instead
//! of propagating past the call.

use thiserror::Error;

/// Errors raised while parsing the EOF header (§4.3), before any per-section
/// instruction validation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum EofDecodeError {
    #[error("missing or invalid EOF magic bytes")]
    InvalidMagic,
    #[error("unsupported EOF version")]
    InvalidVersion,
    #[error("unknown or out-of-order section kind")]
    InvalidSectionKind,
    #[error("container ends before a section terminator was found")]
    MissingTerminator,
    #[error("container is too short to hold a declared section")]
    IncompleteSectionHeader,
    #[error("types section size is not a nonzero multiple of 4")]
    InvalidTypesSize,
    #[error("code section count or an individual code size is zero")]
    InvalidCodeSize,
    #[error("container section count is outside [1, 256]")]
    InvalidContainerSectionCount,
    #[error("an individual sub-container size is zero")]
    InvalidContainerSize,
    #[error("types section entry count does not match code section count")]
    TypesCodeMismatch,
    #[error("first code section must take 0 inputs and be non-returning")]
    InvalidFirstSectionType,
    #[error("declared max_stack_height exceeds the 1023 stack limit")]
    MaxStackHeightTooLarge,
    #[error("a declared section offset/size does not fit inside the container")]
    SectionOutOfBounds,
    #[error("data section is truncated, which is only legal for initcode")]
    DataSectionTruncated,
    #[error("container exceeds the maximum permitted size")]
    ContainerTooLarge,
}

/// Errors raised by the per-section structural and stack-height validator (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum EofValidationError {
    #[error("opcode is not recognized")]
    UnknownOpcode,
    #[error("opcode is disabled inside EOF code sections")]
    OpcodeDisabled,
    #[error("bytecode ends before an opcode's immediate bytes")]
    MissingImmediateBytes,
    #[error("relative jump targets an immediate byte")]
    JumpToImmediateBytes,
    #[error("relative jump target is out of the code section's bounds")]
    JumpOutOfBounds,
    #[error("RJUMPV's max index is zero, which degenerates to RJUMPI")]
    RjumpvZeroMaxIndex,
    #[error("CALLF/JUMPF targets an out-of-range code section")]
    InvalidSectionIndex,
    #[error("CALLF targets a non-returning function")]
    CallfToNonReturning,
    #[error("CALLF would overflow the 1023-item stack limit")]
    StackOverflow,
    #[error("stack height would underflow the opcode's required inputs")]
    StackUnderflow,
    #[error("a backward jump reaches an instruction with a different stack height")]
    StackHeightMismatch,
    #[error("max_stack_height does not match the computed maximum")]
    MaxStackMismatch,
    #[error("an instruction after a terminator is never reached by a forward jump")]
    UnreachableInstruction,
    #[error("a code section does not end in a terminating instruction")]
    SectionDoesNotTerminate,
    #[error("EOFCREATE/RETURNCONTRACT references an out-of-range sub-container")]
    InvalidContainerIndex,
    #[error("RETURNCONTRACT used outside an initcode section")]
    ReturnContractOutsideInitcode,
    #[error("DATALOADN's offset + 32 exceeds the declared data size")]
    DataLoadOutOfBounds,
    #[error("a code section was never reached from the entry section")]
    CodeSectionNotAccessed,
    #[error("a sub-container was never referenced by EOFCREATE or RETURNCONTRACT")]
    ContainerNotAccessed,
    #[error("a sub-container is referenced in incompatible modes")]
    ContainerModeConflict,
}

/// Combined EOF error: either the container didn't decode, or it decoded but failed
/// validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum EofError {
    #[error(transparent)]
    Decode(#[from] EofDecodeError),
    #[error(transparent)]
    Validation(#[from] EofValidationError),
}

/// Internal invariant violations: these indicate a bug in the surrounding dispatch
/// loop or host, not a malformed program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum InternalError {
    #[error("program counter overflowed")]
    PcOverflowed,
    #[error("arithmetic overflow computing a gas or size value")]
    ArithmeticOverflow,
    #[error("call depth counter underflowed")]
    DepthUnderflow,
}

/// Errors that can occur while executing a call frame, including a creation
/// sub-flow. Never escapes a call boundary: the creation state machine folds these
/// into [`crate::creation::CreationOutcome`] before returning to the parent frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum VMError {
    #[error("out of gas")]
    OutOfGas,
    #[error("stack underflow")]
    StackUnderflow,
    #[error("stack overflow")]
    StackOverflow,
    #[error(transparent)]
    Eof(#[from] EofError),
    #[error("deploy container failed post-initcode validation")]
    ContractValidationFailure,
    #[error("deploy or initcode exceeds its size limit")]
    SizeLimitExceeded,
    #[error(transparent)]
    Internal(#[from] InternalError),
}

/// Errors surfaced at transaction-admission time, before any execution happens
/// (§6.2, §7). These are fatal to the transaction as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum TxValidationError {
    #[error("a create transaction's data begins with the EOF magic bytes")]
    EofCreationTransaction,
    #[error("the `initcodes` transaction type is not supported before Prague")]
    TxTypeNotSupported,
    #[error("`initcodes` list is empty")]
    InitCodeCountZero,
    #[error("an `initcodes` entry is empty")]
    InitCodeEmpty,
    #[error("an `initcodes` entry exceeds the initcode size limit")]
    InitCodeSizeLimitExceeded,
    #[error("`initcodes` list exceeds the maximum entry count")]
    InitCodeCountLimitExceeded,
}
