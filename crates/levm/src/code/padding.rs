//! C2: the padded legacy code buffer (§4.2).

use bytes::Bytes;

use crate::constants::CODE_PADDING;
use crate::opcodes::STOP;

/// Copies `code` into a buffer that is `code.len() + 33` bytes long, with the last
/// 33 bytes set to `STOP`.
///
/// A `PUSH32` at the very last byte of `code` reads 32 bytes past it; the extra
/// guard byte on top of that guarantees the interpreter's PC always lands on a
/// terminating instruction once it runs past the original code.
pub fn pad_code(code: &[u8]) -> Bytes {
    let mut padded = Vec::with_capacity(code.len() + CODE_PADDING);
    padded.extend_from_slice(code);
    padded.resize(code.len() + CODE_PADDING, STOP);
    Bytes::from(padded)
}
