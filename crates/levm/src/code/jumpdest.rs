//! C1: legacy `JUMPDEST` analysis (§4.1).

use bitvec::prelude::*;

use crate::opcodes::{JUMPDEST, is_push, push_immediate_size};

/// Dense per-byte bitmap over legacy code: bit `i` is set iff `code[i]` is a valid
/// `JUMPDEST`. Has no padding — out-of-range queries answer `false` (JD2).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JumpdestMap {
    bits: BitVec<u8, Lsb0>,
}

impl JumpdestMap {
    /// Scans `code` left to right, skipping `PUSHn` immediates so that no bit is ever
    /// set inside one (JD1).
    pub fn analyze(code: &[u8]) -> Self {
        let mut bits = bitvec![u8, Lsb0; 0; code.len()];
        let mut i = 0;
        while i < code.len() {
            let opcode = code[i];
            if is_push(opcode) {
                // Consumes the tail with no bits set if the immediate runs past the
                // end of code. `push_immediate_size` is at most 32, so this cannot
                // overflow `usize`.
                #[allow(clippy::arithmetic_side_effects, clippy::as_conversions)]
                {
                    i += push_immediate_size(opcode) as usize + 1;
                }
            } else {
                if opcode == JUMPDEST {
                    bits.set(i, true);
                }
                i += 1;
            }
        }
        Self { bits }
    }

    /// `true` iff `pos` is a valid jump destination. Positions at or past the
    /// original code length always answer `false`.
    #[inline]
    pub fn is_valid(&self, pos: usize) -> bool {
        self.bits.get(pos).as_deref().copied().unwrap_or(false)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcodes::JUMPDEST as OP_JUMPDEST;

    #[test]
    fn plain_jumpdest_is_marked() {
        let code = [OP_JUMPDEST, 0x00];
        let map = JumpdestMap::analyze(&code);
        assert!(map.is_valid(0));
        assert!(!map.is_valid(1));
    }

    #[test]
    fn jumpdest_inside_push_immediate_is_not_marked() {
        // PUSH1 0x5b -- the 0x5b is data, not an opcode.
        let code = [0x60, OP_JUMPDEST];
        let map = JumpdestMap::analyze(&code);
        assert!(!map.is_valid(1));
    }

    #[test]
    fn push32_running_past_code_end_consumes_tail_safely() {
        let mut code = vec![0x7f]; // PUSH32
        code.extend(std::iter::repeat(OP_JUMPDEST).take(10)); // fewer than 32 bytes follow
        let map = JumpdestMap::analyze(&code);
        for i in 0..code.len() {
            assert!(!map.is_valid(i));
        }
    }

    #[test]
    fn bitmap_length_matches_code_length_and_out_of_range_is_false() {
        let code = [OP_JUMPDEST, 0x01, 0x02];
        let map = JumpdestMap::analyze(&code);
        assert_eq!(map.len(), code.len());
        assert!(!map.is_valid(code.len()));
        assert!(!map.is_valid(code.len() + 100));
    }
}
