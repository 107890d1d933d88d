//! C3: the EOF header reader (§4.3).

use crate::constants::{EOF_MAX_STACK_HEIGHT, MAX_CONTAINER_SECTIONS};
use crate::errors::EofDecodeError;

pub const EOF_MAGIC: [u8; 2] = [0xEF, 0x00];
pub const EOF_VERSION: u8 = 0x01;

const KIND_TYPES: u8 = 0x01;
const KIND_CODE: u8 = 0x02;
const KIND_CONTAINER: u8 = 0x03;
const KIND_DATA: u8 = 0x04;
const KIND_TERMINATOR: u8 = 0x00;

/// One entry of the types section: a code section's arity and declared stack depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeSignature {
    pub inputs: u8,
    pub outputs: u8,
    pub max_stack_height: u16,
}

impl TypeSignature {
    /// `0x80` marks a function that never returns via `RETF` (its only way out is a
    /// terminating instruction or `JUMPF`).
    pub const NON_RETURNING: u8 = 0x80;

    #[inline]
    pub fn is_non_returning(&self) -> bool {
        self.outputs == Self::NON_RETURNING
    }
}

/// Parsed, structurally-checked EOF header. Offsets are absolute within the
/// container byte-string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EofHeader {
    pub version: u8,
    pub types: Vec<TypeSignature>,
    pub code_offsets: Vec<u32>,
    pub code_sizes: Vec<u16>,
    pub container_offsets: Vec<u32>,
    pub container_sizes: Vec<u16>,
    pub data_offset: u32,
    pub data_size: u16,
}

impl EofHeader {
    /// `true` iff `container` starts with the EOF magic bytes (§6.3: on earlier
    /// revisions, or if this check fails, the dispatcher falls back to legacy
    /// analysis instead of attempting EOF parsing).
    pub fn has_eof_magic(container: &[u8]) -> bool {
        container.starts_with(&EOF_MAGIC)
    }

    /// Number of code sections declared by this header.
    #[inline]
    pub fn num_code_sections(&self) -> usize {
        self.code_sizes.len()
    }

    #[inline]
    pub fn num_container_sections(&self) -> usize {
        self.container_sizes.len()
    }

    /// Byte range of the concatenated code sections: from the first section's
    /// offset to the last section's end (C5 extracts this as the executable slice).
    pub fn code_sections_range(&self) -> std::ops::Range<usize> {
        let start = *self.code_offsets.first().unwrap_or(&0) as usize;
        #[allow(clippy::as_conversions)]
        let end = self
            .code_offsets
            .last()
            .zip(self.code_sizes.last())
            .map(|(&off, &size)| off as usize + size as usize)
            .unwrap_or(start);
        start..end
    }
}

/// Parses and structurally validates an EOF header, failing with a precise reason
/// on the first violated invariant. Does not run the per-section instruction
/// validator (C4) — it only establishes that the container's wire framing is sound.
pub fn read_eof_header(container: &[u8]) -> Result<EofHeader, EofDecodeError> {
    if !EofHeader::has_eof_magic(container) {
        return Err(EofDecodeError::InvalidMagic);
    }
    let version = *container.get(2).ok_or(EofDecodeError::IncompleteSectionHeader)?;
    if version != EOF_VERSION {
        return Err(EofDecodeError::InvalidVersion);
    }

    let mut pos = 3usize;
    let mut types_size: Option<u16> = None;
    let mut code_sizes: Vec<u16> = Vec::new();
    let mut container_sizes: Vec<u16> = Vec::new();
    let mut data_size: Option<u16> = None;
    let mut terminated = false;

    // Section declarations must appear in this exact order: Types, Code,
    // [Container], Data, Terminator.
    let mut next_allowed = KIND_TYPES;

    while pos < container.len() {
        let kind = *container.get(pos).ok_or(EofDecodeError::IncompleteSectionHeader)?;

        if kind == KIND_TERMINATOR {
            pos += 1;
            terminated = true;
            break;
        }

        if kind != next_allowed && !(kind == KIND_DATA && next_allowed == KIND_CONTAINER) {
            return Err(EofDecodeError::InvalidSectionKind);
        }

        match kind {
            KIND_TYPES => {
                let size = read_u16(container, pos + 1)?;
                if size == 0 || size % 4 != 0 {
                    return Err(EofDecodeError::InvalidTypesSize);
                }
                types_size = Some(size);
                pos += 3;
                next_allowed = KIND_CODE;
            }
            KIND_CODE => {
                let count = read_u16(container, pos + 1)? as usize;
                if count == 0 {
                    return Err(EofDecodeError::InvalidCodeSize);
                }
                pos += 3;
                for _ in 0..count {
                    let size = read_u16(container, pos)?;
                    if size == 0 {
                        return Err(EofDecodeError::InvalidCodeSize);
                    }
                    code_sizes.push(size);
                    pos += 2;
                }
                next_allowed = KIND_CONTAINER;
            }
            KIND_CONTAINER => {
                let count = read_u16(container, pos + 1)? as usize;
                if count == 0 || count > MAX_CONTAINER_SECTIONS {
                    return Err(EofDecodeError::InvalidContainerSectionCount);
                }
                pos += 3;
                for _ in 0..count {
                    let size = read_u16(container, pos)?;
                    if size == 0 {
                        return Err(EofDecodeError::InvalidContainerSize);
                    }
                    container_sizes.push(size);
                    pos += 2;
                }
                next_allowed = KIND_DATA;
            }
            KIND_DATA => {
                let size = read_u16(container, pos + 1)?;
                data_size = Some(size);
                pos += 3;
                next_allowed = KIND_TERMINATOR;
            }
            _ => return Err(EofDecodeError::InvalidSectionKind),
        }
    }

    if !terminated {
        return Err(EofDecodeError::MissingTerminator);
    }
    let types_size = types_size.ok_or(EofDecodeError::IncompleteSectionHeader)?;
    if code_sizes.is_empty() {
        return Err(EofDecodeError::IncompleteSectionHeader);
    }
    let data_size = data_size.ok_or(EofDecodeError::IncompleteSectionHeader)?;

    if usize::from(types_size) != code_sizes.len() * 4 {
        return Err(EofDecodeError::TypesCodeMismatch);
    }

    let body_start = pos;
    let types_end = body_start + usize::from(types_size);
    if types_end > container.len() {
        return Err(EofDecodeError::SectionOutOfBounds);
    }

    let mut types = Vec::with_capacity(code_sizes.len());
    for i in 0..code_sizes.len() {
        let off = body_start + i * 4;
        let inputs = *container.get(off).ok_or(EofDecodeError::SectionOutOfBounds)?;
        let outputs = *container
            .get(off + 1)
            .ok_or(EofDecodeError::SectionOutOfBounds)?;
        let max_stack_height = read_u16(container, off + 2)?;
        if max_stack_height > EOF_MAX_STACK_HEIGHT {
            return Err(EofDecodeError::MaxStackHeightTooLarge);
        }
        types.push(TypeSignature {
            inputs,
            outputs,
            max_stack_height,
        });
    }
    if let Some(first) = types.first()
        && (first.inputs != 0 || !first.is_non_returning())
    {
        return Err(EofDecodeError::InvalidFirstSectionType);
    }

    #[allow(clippy::as_conversions)]
    let mut cursor = types_end as u32;
    let mut code_offsets = Vec::with_capacity(code_sizes.len());
    for &size in &code_sizes {
        code_offsets.push(cursor);
        cursor = cursor
            .checked_add(u32::from(size))
            .ok_or(EofDecodeError::SectionOutOfBounds)?;
    }
    if cursor as usize > container.len() {
        return Err(EofDecodeError::SectionOutOfBounds);
    }

    let mut container_offsets = Vec::with_capacity(container_sizes.len());
    for &size in &container_sizes {
        container_offsets.push(cursor);
        cursor = cursor
            .checked_add(u32::from(size))
            .ok_or(EofDecodeError::SectionOutOfBounds)?;
    }
    if cursor as usize > container.len() {
        return Err(EofDecodeError::SectionOutOfBounds);
    }

    let data_offset = cursor;
    // The data section is allowed to be shorter than declared ("truncated data"),
    // legal only for initcode containers (enforced by the mode-aware validator, not
    // here) — so we only require the declared offset itself to be in bounds.
    if data_offset as usize > container.len() {
        return Err(EofDecodeError::SectionOutOfBounds);
    }

    Ok(EofHeader {
        version,
        types,
        code_offsets,
        code_sizes,
        container_offsets,
        container_sizes,
        data_offset,
        data_size,
    })
}

fn read_u16(container: &[u8], offset: usize) -> Result<u16, EofDecodeError> {
    let hi = *container
        .get(offset)
        .ok_or(EofDecodeError::IncompleteSectionHeader)?;
    let lo = *container
        .get(offset + 1)
        .ok_or(EofDecodeError::IncompleteSectionHeader)?;
    Ok(u16::from_be_bytes([hi, lo]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_container() -> Vec<u8> {
        // EF00 01 010004 020001 0001 040000 00 | 00800000 | 00 (STOP)
        hex::decode("EF00010100040200010001040000000080000000").unwrap()
    }

    #[test]
    fn minimal_container_round_trips() {
        let bytes = minimal_container();
        let header = read_eof_header(&bytes).unwrap();
        assert_eq!(header.version, 1);
        assert_eq!(header.code_sizes, vec![1]);
        assert_eq!(header.data_size, 0);
        assert_eq!(header.types.len(), 1);
        assert_eq!(header.types[0].inputs, 0);
        assert!(header.types[0].is_non_returning());
        assert_eq!(header.types[0].max_stack_height, 0);
    }

    #[test]
    fn rejects_bad_magic() {
        let bytes = hex::decode("60006000").unwrap();
        assert_eq!(read_eof_header(&bytes), Err(EofDecodeError::InvalidMagic));
    }

    #[test]
    fn rejects_wrong_version() {
        let mut bytes = minimal_container();
        bytes[2] = 0x02;
        assert_eq!(read_eof_header(&bytes), Err(EofDecodeError::InvalidVersion));
    }

    #[test]
    fn rejects_types_size_not_multiple_of_four() {
        // Hand-rolled: types size = 5 (invalid).
        let bytes = hex::decode("EF0001010005020001000104000000").unwrap();
        assert_eq!(
            read_eof_header(&bytes),
            Err(EofDecodeError::InvalidTypesSize)
        );
    }

    #[test]
    fn rejects_missing_terminator() {
        let bytes = minimal_container();
        let without_terminator = &bytes[..14]; // everything up to, not including, the 0x00 terminator
        assert_eq!(
            read_eof_header(without_terminator),
            Err(EofDecodeError::MissingTerminator)
        );
    }

    #[test]
    fn code_sections_range_spans_all_code_sections() {
        let bytes = minimal_container();
        let header = read_eof_header(&bytes).unwrap();
        let range = header.code_sections_range();
        assert_eq!(range.len(), 1);
    }
}
