//! Gas accounting shared by the creation state machine: the standard quadratic
//! memory-expansion formula and the retain-a-fraction call-gas rule (§5, §6.2).

use crate::constants::{word_count, CALL_GAS_RETAIN_DIVISOR};

/// Cost of having `words` many 32-byte memory words allocated, counted from a
/// zero-size memory. `words` is derived from a byte length capped well below
/// `u64::MAX / 512` by `word_count`'s callers, so this cannot overflow in practice.
#[allow(clippy::arithmetic_side_effects)]
const fn memory_cost(words: u64) -> u64 {
    3 * words + (words * words) / 512
}

/// Additional gas to expand memory from `current_size` to cover `[offset, offset +
/// len)`, or `0` if that range already fits. Saturates rather than panicking on
/// pathological (attacker-chosen) offsets; the caller still must have enough gas to
/// pay whatever this returns, which backstops unbounded growth.
pub fn memory_expansion_gas(current_size: u64, offset: u64, len: u64) -> u64 {
    if len == 0 {
        return 0;
    }
    let end = offset.saturating_add(len);
    if end <= current_size {
        return 0;
    }
    let new_words = u64::try_from(word_count(usize::try_from(end).unwrap_or(usize::MAX)))
        .unwrap_or(u64::MAX);
    let current_words =
        u64::try_from(word_count(usize::try_from(current_size).unwrap_or(usize::MAX)))
            .unwrap_or(u64::MAX);
    memory_cost(new_words).saturating_sub(memory_cost(current_words))
}

/// Splits `available` gas into `(retained, given_to_child)` per the 63/64ths rule:
/// the parent keeps `available / 64` and hands the rest to the child frame.
#[allow(clippy::arithmetic_side_effects)]
pub fn split_call_gas(available: u64) -> (u64, u64) {
    let retained = available / CALL_GAS_RETAIN_DIVISOR;
    (retained, available - retained)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expanding_into_already_covered_memory_is_free() {
        assert_eq!(memory_expansion_gas(64, 0, 32), 0);
    }

    #[test]
    fn expanding_from_zero_charges_the_full_word_cost() {
        assert_eq!(memory_expansion_gas(0, 0, 32), 3);
        assert_eq!(memory_expansion_gas(0, 0, 64), 6);
    }

    #[test]
    fn split_call_gas_retains_one_sixty_fourth() {
        let (retained, given) = split_call_gas(6400);
        assert_eq!(retained, 100);
        assert_eq!(given, 6300);
    }
}
