//! C4: full structural and stack-height validation of an EOF container and its
//! nested sub-containers (§4.4).

use crate::constants::{EOF_MAX_STACK_HEIGHT, MAX_CODE_SIZE};
use crate::eof::container::Eof;
use crate::eof::header::TypeSignature;
use crate::errors::{EofDecodeError, EofError, EofValidationError};
use crate::opcodes::{self, DATALOADN, EOFCREATE, JUMPF, RETF, RETURN, RETURNCONTRACT, RJUMP, RJUMPI, RJUMPV};

/// How a container (or sub-container, depending on which opcode referenced it) is
/// being validated: this governs whether a truncated data section is legal and
/// whether `RETURNCONTRACT` is a legal terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Deployed, executable code: data must be fully present, `RETURNCONTRACT` is
    /// illegal.
    Runtime,
    /// Code that runs during contract creation: data may be declared larger than
    /// what is physically present, and `RETURNCONTRACT` is the expected terminator.
    Initcode,
}

/// Validates `eof` and recursively every sub-container it references, starting in
/// `mode`. Each sub-container's mode is determined by how it is referenced:
/// `EOFCREATE` implies [`Mode::Initcode`], `RETURNCONTRACT` implies [`Mode::Runtime`].
pub fn validate_eof(eof: &Eof, mode: Mode) -> Result<(), EofError> {
    if mode == Mode::Runtime && eof.data_is_truncated() {
        return Err(EofDecodeError::DataSectionTruncated.into());
    }

    let references = validate_container_codes(eof, mode)?;

    for (idx, child_mode) in references {
        let child_bytes = eof
            .container_section(idx)
            .ok_or(EofValidationError::InvalidContainerIndex)?;
        let child = Eof::decode(child_bytes.to_vec().into())?;
        validate_eof(&child, child_mode)?;
    }

    Ok(())
}

/// Validates every code section of `eof` without recursing into sub-containers.
/// Returns the list of `(sub-container index, mode)` pairs that must themselves be
/// validated by the caller (keeps recursion iterative-by-caller rather than risking
/// unbounded stack depth inside this function).
fn validate_container_codes(
    eof: &Eof,
    this_mode: Mode,
) -> Result<Vec<(usize, Mode)>, EofValidationError> {
    let header = &eof.header;
    let first = header
        .types
        .first()
        .ok_or(EofValidationError::InvalidSectionIndex)?;
    if first.inputs != 0 || !first.is_non_returning() {
        return Err(EofValidationError::UnknownOpcode);
    }

    let mut codes_accessed = vec![false; header.code_sizes.len()];
    codes_accessed[0] = true;
    let mut processing = vec![0usize];

    let mut container_refs: Vec<(usize, Mode)> = Vec::new();
    let mut container_modes: Vec<Option<Mode>> = vec![None; header.container_sizes.len()];

    while let Some(idx) = processing.pop() {
        let code = eof
            .code_section(idx)
            .ok_or(EofValidationError::InvalidSectionIndex)?;
        let outcome = validate_code_section(
            code,
            idx,
            header.data_size as usize,
            header.container_sizes.len(),
            &header.types,
            this_mode,
        )?;

        for target in outcome.called_sections {
            if let Some(slot) = codes_accessed.get_mut(target) {
                if !*slot {
                    *slot = true;
                    processing.push(target);
                }
            } else {
                return Err(EofValidationError::InvalidSectionIndex);
            }
        }
        for (container_idx, child_mode) in outcome.referenced_containers {
            match container_modes.get_mut(container_idx) {
                Some(slot @ None) => {
                    *slot = Some(child_mode);
                    container_refs.push((container_idx, child_mode));
                }
                Some(Some(existing)) if *existing == child_mode => {}
                Some(Some(_)) => return Err(EofValidationError::ContainerModeConflict),
                None => return Err(EofValidationError::InvalidContainerIndex),
            }
        }
    }

    if codes_accessed.iter().any(|accessed| !accessed) {
        return Err(EofValidationError::CodeSectionNotAccessed);
    }
    if container_modes.iter().any(Option::is_none) {
        return Err(EofValidationError::ContainerNotAccessed);
    }

    Ok(container_refs)
}

struct SectionOutcome {
    called_sections: Vec<usize>,
    referenced_containers: Vec<(usize, Mode)>,
}

#[derive(Clone, Copy)]
struct InstrInfo {
    is_immediate: bool,
    is_jumpdest: bool,
    smallest: i32,
    biggest: i32,
}

impl Default for InstrInfo {
    fn default() -> Self {
        Self {
            is_immediate: false,
            is_jumpdest: false,
            smallest: i32::MAX,
            biggest: i32::MIN,
        }
    }
}

/// Validates one code section: opcode legality, relative-jump targets, `CALLF`
/// type-compatibility and the min/max reachable stack height at every instruction.
fn validate_code_section(
    code: &[u8],
    this_index: usize,
    data_size: usize,
    num_containers: usize,
    types: &[TypeSignature],
    this_mode: Mode,
) -> Result<SectionOutcome, EofValidationError> {
    let this_type = types
        .get(this_index)
        .ok_or(EofValidationError::InvalidSectionIndex)?;

    let mut slots = vec![InstrInfo::default(); code.len()];
    let mut is_after_termination = false;
    let mut next_smallest = i32::from(this_type.inputs);
    let mut next_biggest = i32::from(this_type.inputs);

    let mut called_sections = Vec::new();
    let mut referenced_containers = Vec::new();

    let mut i = 0usize;
    while i < code.len() {
        let opcode = *code.get(i).ok_or(EofValidationError::MissingImmediateBytes)?;
        if opcodes::disabled_in_eof(opcode) {
            return Err(EofValidationError::OpcodeDisabled);
        }

        {
            let slot = slots
                .get_mut(i)
                .ok_or(EofValidationError::MissingImmediateBytes)?;
            if !is_after_termination {
                slot.smallest = slot.smallest.min(next_smallest);
                slot.biggest = slot.biggest.max(next_biggest);
            }
        }
        let slot = *slots.get(i).ok_or(EofValidationError::MissingImmediateBytes)?;

        if is_after_termination && !slot.is_jumpdest {
            return Err(EofValidationError::UnreachableInstruction);
        }
        if slot.is_immediate {
            return Err(EofValidationError::JumpToImmediateBytes);
        }

        let (inputs, outputs, immediate_size): (u8, u8, usize) = match opcode {
            RETURN if this_mode == Mode::Initcode => {
                return Err(EofValidationError::OpcodeDisabled)
            }
            RETURNCONTRACT if this_mode != Mode::Initcode => {
                return Err(EofValidationError::ReturnContractOutsideInitcode)
            }
            RETURNCONTRACT => {
                let idx = usize::from(
                    *code
                        .get(i + 1)
                        .ok_or(EofValidationError::MissingImmediateBytes)?,
                );
                if idx >= num_containers {
                    return Err(EofValidationError::InvalidContainerIndex);
                }
                referenced_containers.push((idx, Mode::Runtime));
                (2, 0, 1)
            }
            EOFCREATE => {
                let idx = usize::from(
                    *code
                        .get(i + 1)
                        .ok_or(EofValidationError::MissingImmediateBytes)?,
                );
                if idx >= num_containers {
                    return Err(EofValidationError::InvalidContainerIndex);
                }
                referenced_containers.push((idx, Mode::Initcode));
                (4, 1, 1)
            }
            DATALOADN => {
                let offset = read_u16(code, i + 1)?;
                if usize::from(offset) + 32 > data_size {
                    return Err(EofValidationError::DataLoadOutOfBounds);
                }
                (0, 1, 2)
            }
            opcodes::CALLF => {
                let target = usize::from(read_u16(code, i + 1)?);
                let callee = types
                    .get(target)
                    .ok_or(EofValidationError::InvalidSectionIndex)?;
                if callee.is_non_returning() {
                    return Err(EofValidationError::CallfToNonReturning);
                }
                #[allow(clippy::arithmetic_side_effects)]
                let reachable =
                    slot.biggest + i32::from(callee.max_stack_height) - i32::from(callee.inputs);
                if reachable > i32::from(EOF_MAX_STACK_HEIGHT) + 1 {
                    return Err(EofValidationError::StackOverflow);
                }
                called_sections.push(target);
                (callee.inputs, callee.outputs, 2)
            }
            JUMPF => {
                let target = usize::from(read_u16(code, i + 1)?);
                let callee = types
                    .get(target)
                    .ok_or(EofValidationError::InvalidSectionIndex)?;
                called_sections.push(target);
                if callee.is_non_returning() {
                    check_stack_underflow(slot, callee.inputs)?;
                    (callee.inputs, 0, 2)
                } else {
                    if callee.outputs > this_type.outputs {
                        return Err(EofValidationError::UnknownOpcode);
                    }
                    #[allow(clippy::arithmetic_side_effects)]
                    let stack_height_required =
                        i32::from(callee.inputs) + i32::from(this_type.outputs)
                            - i32::from(callee.outputs);
                    if slot.smallest < stack_height_required {
                        return Err(EofValidationError::StackUnderflow);
                    }
                    (callee.inputs, callee.outputs, 2)
                }
            }
            RETF => {
                if slot.smallest < i32::from(this_type.outputs) {
                    return Err(EofValidationError::StackUnderflow);
                }
                (0, 0, 0)
            }
            RJUMP => {
                let target = relative_jump_target(code, i, 2)?;
                mark_jump_target(&mut slots, i, target, slot.smallest, slot.biggest)?;
                (0, 0, 2)
            }
            RJUMPI => {
                check_stack_underflow(slot, 1)?;
                let target = relative_jump_target(code, i, 2)?;
                #[allow(clippy::arithmetic_side_effects)]
                let (arriving_smallest, arriving_biggest) = (slot.smallest - 1, slot.biggest - 1);
                mark_jump_target(&mut slots, i, target, arriving_smallest, arriving_biggest)?;
                (1, 0, 2)
            }
            RJUMPV => {
                check_stack_underflow(slot, 1)?;
                let max_index = *code
                    .get(i + 1)
                    .ok_or(EofValidationError::MissingImmediateBytes)?;
                if max_index == 0 {
                    return Err(EofValidationError::RjumpvZeroMaxIndex);
                }
                #[allow(clippy::arithmetic_side_effects)]
                let count = usize::from(max_index) + 1;
                #[allow(clippy::arithmetic_side_effects)]
                let immediate_size = 1 + count * 2;
                #[allow(clippy::arithmetic_side_effects)]
                let after_instruction = i + 1 + immediate_size;
                #[allow(clippy::arithmetic_side_effects)]
                let (arriving_smallest, arriving_biggest) = (slot.smallest - 1, slot.biggest - 1);
                for k in 0..count {
                    #[allow(clippy::arithmetic_side_effects)]
                    let offset_pos = i + 2 + k * 2;
                    let rel = read_u16(code, offset_pos)? as i16;
                    let dest = apply_relative(after_instruction, rel)?;
                    mark_jump_target(&mut slots, i, dest, arriving_smallest, arriving_biggest)?;
                }
                (1, 0, immediate_size)
            }
            _ => match opcodes::opcode_info(opcode) {
                Some(info) => (info.inputs, info.outputs, usize::from(info.immediate_size)),
                None => return Err(EofValidationError::UnknownOpcode),
            },
        };

        check_stack_underflow(slot, inputs)?;
        #[allow(clippy::arithmetic_side_effects)]
        {
            next_smallest = slot.smallest - i32::from(inputs) + i32::from(outputs);
            next_biggest = slot.biggest - i32::from(inputs) + i32::from(outputs);
        }
        #[allow(clippy::arithmetic_side_effects)]
        if next_biggest > i32::from(EOF_MAX_STACK_HEIGHT) + 1 {
            return Err(EofValidationError::StackOverflow);
        }

        for k in 1..=immediate_size {
            let immediate_slot = slots
                .get_mut(i + k)
                .ok_or(EofValidationError::MissingImmediateBytes)?;
            if immediate_slot.is_jumpdest {
                return Err(EofValidationError::JumpToImmediateBytes);
            }
            immediate_slot.is_immediate = true;
        }

        is_after_termination = opcodes::ends_control_flow(opcode) || opcode == JUMPF;
        i += 1 + immediate_size;
    }

    if !is_after_termination {
        return Err(EofValidationError::SectionDoesNotTerminate);
    }

    let computed_max = slots.iter().map(|s| s.biggest).max().unwrap_or(0).max(0);
    #[allow(clippy::as_conversions)]
    if computed_max as u16 != this_type.max_stack_height {
        return Err(EofValidationError::MaxStackMismatch);
    }

    Ok(SectionOutcome {
        called_sections,
        referenced_containers,
    })
}

fn check_stack_underflow(slot: InstrInfo, required: u8) -> Result<(), EofValidationError> {
    if slot.smallest < i32::from(required) {
        return Err(EofValidationError::StackUnderflow);
    }
    Ok(())
}

fn read_u16(code: &[u8], at: usize) -> Result<u16, EofValidationError> {
    let hi = *code.get(at).ok_or(EofValidationError::MissingImmediateBytes)?;
    let lo = *code
        .get(at + 1)
        .ok_or(EofValidationError::MissingImmediateBytes)?;
    Ok(u16::from_be_bytes([hi, lo]))
}

fn relative_jump_target(
    code: &[u8],
    at: usize,
    immediate_size: usize,
) -> Result<usize, EofValidationError> {
    let rel = read_u16(code, at + 1)? as i16;
    apply_relative(at + 1 + immediate_size, rel)
}

fn apply_relative(from: usize, rel: i16) -> Result<usize, EofValidationError> {
    #[allow(clippy::as_conversions)]
    let target = from as i64 + i64::from(rel);
    if target < 0 {
        return Err(EofValidationError::JumpOutOfBounds);
    }
    #[allow(clippy::as_conversions)]
    Ok(target as usize)
}

/// Records that `target` is reached by a relative jump from `current_index`, with
/// `arriving_smallest`/`arriving_biggest` the reachable stack height bounds at the
/// point of the jump.
///
/// A forward jump (`target > current_index`) targets an instruction the main scan
/// hasn't visited yet, so the arriving bounds are simply merged in via min/max, the
/// same way the fallthrough edge is. A backward jump (`target <= current_index`)
/// targets an instruction the scan already passed and finalized — it won't be
/// revisited, so the arriving bounds must already agree with what was recorded
/// there, or the section has two control-flow paths disagreeing on stack height at
/// the same program point (EIP-5450).
fn mark_jump_target(
    slots: &mut [InstrInfo],
    current_index: usize,
    target: usize,
    arriving_smallest: i32,
    arriving_biggest: i32,
) -> Result<(), EofValidationError> {
    let slot = slots
        .get_mut(target)
        .ok_or(EofValidationError::JumpOutOfBounds)?;
    if slot.is_immediate {
        return Err(EofValidationError::JumpToImmediateBytes);
    }
    slot.is_jumpdest = true;
    if target <= current_index {
        if slot.smallest != arriving_smallest || slot.biggest != arriving_biggest {
            return Err(EofValidationError::StackHeightMismatch);
        }
    } else {
        slot.smallest = slot.smallest.min(arriving_smallest);
        slot.biggest = slot.biggest.max(arriving_biggest);
    }
    Ok(())
}

/// Validates a raw container fresh from the wire: decodes the header, then fully
/// validates it (and its sub-containers) in `mode`.
pub fn validate_raw_eof(raw: bytes::Bytes, mode: Mode) -> Result<Eof, EofError> {
    if raw.len() > MAX_CODE_SIZE && mode == Mode::Runtime {
        return Err(EofDecodeError::ContainerTooLarge.into());
    }
    let eof = Eof::decode(raw)?;
    validate_eof(&eof, mode)?;
    Ok(eof)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(hex_str: &str) -> Eof {
        Eof::decode(hex::decode(hex_str).unwrap().into()).unwrap()
    }

    #[test]
    fn minimal_container_validates_as_runtime() {
        let eof = decode("EF00010100040200010001040000000080000000");
        assert!(validate_eof(&eof, Mode::Runtime).is_ok());
    }

    #[test]
    fn static_relative_jump_loop_validates() {
        let eof = decode("EF000101000402000100030400000000800000E0FFFD");
        assert!(validate_eof(&eof, Mode::Runtime).is_ok());
    }

    #[test]
    fn returncontract_outside_initcode_is_rejected() {
        let header = "EF00010100040200010006030001001404000000";
        let types = "00800002";
        let code = "60006000EE00"; // PUSH1 0, PUSH1 0, RETURNCONTRACT 0
        let subcontainer = "EF00010100040200010001040000000080000000";
        let hex_str = format!("{header}{types}{code}{subcontainer}");
        let eof = decode(&hex_str);
        assert_eq!(
            validate_eof(&eof, Mode::Runtime),
            Err(EofValidationError::ReturnContractOutsideInitcode.into())
        );
        assert!(validate_eof(&eof, Mode::Initcode).is_ok());
    }

    #[test]
    fn dataloadn_out_of_bounds_is_rejected() {
        // DATALOADN 0xFFFF against a declared data size of 0.
        let eof = decode("EF000101000402000100030400000000800001D1FFFF");
        assert_eq!(
            validate_eof(&eof, Mode::Runtime),
            Err(EofValidationError::DataLoadOutOfBounds.into())
        );
    }

    #[test]
    fn return_is_legal_in_runtime_and_illegal_in_initcode() {
        // PUSH1 0, PUSH1 0, RETURN
        let eof = decode("EF00010100040200010005040000000080000260006000F3");
        assert!(validate_eof(&eof, Mode::Runtime).is_ok());
        assert_eq!(
            validate_eof(&eof, Mode::Initcode),
            Err(EofValidationError::OpcodeDisabled.into())
        );
    }

    #[test]
    fn backward_jump_with_disagreeing_stack_height_is_rejected() {
        // PUSH1 0; JUMPDEST; PUSH1 0; RJUMP back to the JUMPDEST. The JUMPDEST is
        // first reached by fallthrough at height 1, then by the backward jump at
        // height 2 -- the two paths disagree on the stack height at that point.
        let eof = decode("EF00010100040200010008040000000080000260005B6000E0FFFA");
        assert_eq!(
            validate_eof(&eof, Mode::Runtime),
            Err(EofValidationError::StackHeightMismatch.into())
        );
    }
}
