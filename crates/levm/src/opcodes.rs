//! Opcode constants and the static per-opcode metadata the EOF validator needs.
//!
//! This is not a full opcode table for the dispatch loop (that lives outside the core
//! this crate covers) — only enough is modeled to run jumpdest analysis and EOF
//! structural/stack validation.

/// First `PUSH1` opcode. `PUSH1..=PUSH32` is the contiguous range `0x60..=0x7f`.
pub const PUSH1: u8 = 0x60;
pub const PUSH32: u8 = 0x7f;
pub const JUMPDEST: u8 = 0x5b;
pub const STOP: u8 = 0x00;

pub const DUP1: u8 = 0x80;
pub const DUP16: u8 = 0x8f;
pub const SWAP1: u8 = 0x90;
pub const SWAP16: u8 = 0x9f;
pub const LOG0: u8 = 0xa0;
pub const LOG4: u8 = 0xa4;

pub const JUMP: u8 = 0x56;
pub const JUMPI: u8 = 0x57;
pub const PC: u8 = 0x58;
pub const GAS: u8 = 0x5a;

pub const CODESIZE: u8 = 0x38;
pub const CODECOPY: u8 = 0x39;
pub const EXTCODESIZE: u8 = 0x3b;
pub const EXTCODECOPY: u8 = 0x3c;
pub const EXTCODEHASH: u8 = 0x3f;

pub const DATALOAD: u8 = 0xd0;
pub const DATALOADN: u8 = 0xd1;
pub const DATASIZE: u8 = 0xd2;
pub const DATACOPY: u8 = 0xd3;

pub const RJUMP: u8 = 0xe0;
pub const RJUMPI: u8 = 0xe1;
pub const RJUMPV: u8 = 0xe2;
pub const CALLF: u8 = 0xe3;
pub const RETF: u8 = 0xe4;
pub const JUMPF: u8 = 0xe5;

pub const CREATE: u8 = 0xf0;
pub const CALL: u8 = 0xf1;
pub const CALLCODE: u8 = 0xf2;
pub const RETURN: u8 = 0xf3;
pub const DELEGATECALL: u8 = 0xf4;
pub const CREATE2: u8 = 0xf5;
pub const EOFCREATE: u8 = 0xec;
pub const TXCREATE: u8 = 0xed;
pub const RETURNCONTRACT: u8 = 0xee;
pub const EXTCALL: u8 = 0xf8;
pub const EXTDELEGATECALL: u8 = 0xf9;
pub const STATICCALL: u8 = 0xfa;
pub const EXTSTATICCALL: u8 = 0xfb;
pub const REVERT: u8 = 0xfd;
pub const INVALID: u8 = 0xfe;
pub const SELFDESTRUCT: u8 = 0xff;

/// Whether `op` is any `PUSHn` opcode.
///
/// `PUSH32` (`0x7f`) is `i8::MAX`, so the upper bound is implicit when comparing the
/// signed reinterpretation the way the original analyzer does — kept here as an
/// explicit range instead, which reads the same for a u8 opcode byte.
#[inline]
pub const fn is_push(op: u8) -> bool {
    op >= PUSH1 && op <= PUSH32
}

/// Number of immediate bytes following a `PUSHn` opcode (`n`, for `PUSH1..=PUSH32`).
#[inline]
pub const fn push_immediate_size(op: u8) -> u8 {
    op - PUSH1 + 1
}

#[inline]
pub const fn is_dup(op: u8) -> bool {
    op >= DUP1 && op <= DUP16
}

#[inline]
pub const fn is_swap(op: u8) -> bool {
    op >= SWAP1 && op <= SWAP16
}

#[inline]
pub const fn is_log(op: u8) -> bool {
    op >= LOG0 && op <= LOG4
}

/// Opcodes that legacy code may use freely but that an EOF code section must reject
/// outright (§4.4): control-flow and introspection instructions whose job is taken
/// over by relative jumps, `CALLF`/`JUMPF`, `DATALOAD*` and the `EXTCALL*` family.
/// `RETURN` is not in this set — it is a legal terminator for a non-initcode section
/// (only `RETURNCONTRACT` cares about the runtime/initcode distinction, and the
/// validator rejects `RETURN` itself when the section is initcode).
#[inline]
pub const fn disabled_in_eof(op: u8) -> bool {
    matches!(
        op,
        CALLCODE
            | SELFDESTRUCT
            | JUMP
            | JUMPI
            | PC
            | CREATE
            | CREATE2
            | CALL
            | STATICCALL
            | DELEGATECALL
            | CODESIZE
            | CODECOPY
            | EXTCODESIZE
            | EXTCODECOPY
            | EXTCODEHASH
            | GAS
    )
}

/// Static stack effect of an opcode: `(inputs, outputs)`.
///
/// `CALLF`/`JUMPF`/`RETF` have signature-dependent effects resolved against the
/// container's type table by the validator, not by this table. `DUPn`/`SWAPn`/`LOGn`
/// are resolved by their dedicated helpers above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpInfo {
    pub inputs: u8,
    pub outputs: u8,
    /// Length of the immediate operand in bytes. `RJUMPV`'s is variable and handled
    /// separately by the validator.
    pub immediate_size: u8,
}

const fn op(inputs: u8, outputs: u8, immediate_size: u8) -> OpInfo {
    OpInfo {
        inputs,
        outputs,
        immediate_size,
    }
}

/// Looks up the static stack effect and immediate size of `op`, or `None` if the
/// opcode is unrecognized (or its effect depends on the call-site, like `CALLF`).
pub const fn opcode_info(opcode: u8) -> Option<OpInfo> {
    if is_push(opcode) {
        return Some(op(0, 1, push_immediate_size(opcode)));
    }
    if is_dup(opcode) {
        let n = opcode - DUP1 + 1;
        return Some(op(n, n + 1, 0));
    }
    if is_swap(opcode) {
        let n = opcode - SWAP1 + 2;
        return Some(op(n, n, 0));
    }
    if is_log(opcode) {
        let n = opcode - LOG0;
        return Some(op(2 + n, 0, 0));
    }
    Some(match opcode {
        STOP => op(0, 0, 0),
        0x01 => op(2, 1, 0), // ADD
        0x02 => op(2, 1, 0), // MUL
        0x03 => op(2, 1, 0), // SUB
        0x04 => op(2, 1, 0), // DIV
        0x05 => op(2, 1, 0), // SDIV
        0x06 => op(2, 1, 0), // MOD
        0x07 => op(2, 1, 0), // SMOD
        0x08 => op(3, 1, 0), // ADDMOD
        0x09 => op(3, 1, 0), // MULMOD
        0x0a => op(2, 1, 0), // EXP
        0x0b => op(2, 1, 0), // SIGNEXTEND
        0x10 => op(2, 1, 0), // LT
        0x11 => op(2, 1, 0), // GT
        0x12 => op(2, 1, 0), // SLT
        0x13 => op(2, 1, 0), // SGT
        0x14 => op(2, 1, 0), // EQ
        0x15 => op(1, 1, 0), // ISZERO
        0x16 => op(2, 1, 0), // AND
        0x17 => op(2, 1, 0), // OR
        0x18 => op(2, 1, 0), // XOR
        0x19 => op(1, 1, 0), // NOT
        0x1a => op(2, 1, 0), // BYTE
        0x1b => op(2, 1, 0), // SHL
        0x1c => op(2, 1, 0), // SHR
        0x1d => op(2, 1, 0), // SAR
        0x20 => op(2, 1, 0), // KECCAK256
        0x30 => op(0, 1, 0), // ADDRESS
        0x31 => op(1, 1, 0), // BALANCE
        0x32 => op(0, 1, 0), // ORIGIN
        0x33 => op(0, 1, 0), // CALLER
        0x34 => op(0, 1, 0), // CALLVALUE
        0x35 => op(1, 1, 0), // CALLDATALOAD
        0x36 => op(0, 1, 0), // CALLDATASIZE
        0x37 => op(3, 0, 0), // CALLDATACOPY
        0x3a => op(0, 1, 0), // GASPRICE
        0x3d => op(0, 1, 0), // RETURNDATASIZE
        0x3e => op(3, 0, 0), // RETURNDATACOPY
        0x40 => op(1, 1, 0), // BLOCKHASH
        0x41 => op(0, 1, 0), // COINBASE
        0x42 => op(0, 1, 0), // TIMESTAMP
        0x43 => op(0, 1, 0), // NUMBER
        0x44 => op(0, 1, 0), // PREVRANDAO
        0x45 => op(0, 1, 0), // GASLIMIT
        0x46 => op(0, 1, 0), // CHAINID
        0x47 => op(0, 1, 0), // SELFBALANCE
        0x48 => op(0, 1, 0), // BASEFEE
        0x49 => op(1, 1, 0), // BLOBHASH
        0x4a => op(0, 1, 0), // BLOBBASEFEE
        0x50 => op(1, 0, 0), // POP
        0x51 => op(1, 1, 0), // MLOAD
        0x52 => op(2, 0, 0), // MSTORE
        0x53 => op(2, 0, 0), // MSTORE8
        0x54 => op(1, 1, 0), // SLOAD
        0x55 => op(2, 0, 0), // SSTORE
        0x59 => op(0, 1, 0), // MSIZE
        JUMPDEST => op(0, 0, 0),
        0x5c => op(1, 1, 0), // TLOAD
        0x5d => op(2, 0, 0), // TSTORE
        0x5e => op(3, 0, 0), // MCOPY
        0x5f => op(0, 1, 0), // PUSH0
        DATALOAD => op(1, 1, 0),
        DATALOADN => op(0, 1, 2),
        DATASIZE => op(0, 1, 0),
        DATACOPY => op(3, 0, 0),
        RJUMP => op(0, 0, 2),
        RJUMPI => op(1, 0, 2),
        // RJUMPV's immediate is variable-length; the byte count is resolved by the
        // validator from the leading count byte, not from this table.
        RJUMPV => op(1, 0, 0),
        RETF => op(0, 0, 0),
        EOFCREATE => op(4, 1, 1),
        TXCREATE => op(5, 1, 0),
        RETURNCONTRACT => op(2, 0, 1),
        RETURN => op(2, 0, 0),
        EXTCALL => op(4, 1, 0),
        EXTDELEGATECALL => op(3, 1, 0),
        EXTSTATICCALL => op(3, 1, 0),
        REVERT => op(2, 0, 0),
        INVALID => op(0, 0, 0),
        _ => return None,
    })
}

/// Instructions that close an execution path: nothing may sequentially follow them
/// unless reached by a separate forward jump.
#[inline]
pub const fn ends_control_flow(op: u8) -> bool {
    matches!(
        op,
        STOP | RETURN | REVERT | INVALID | RETF | JUMPF | RETURNCONTRACT | RJUMP
    )
}
