//! Binds a parsed [`EofHeader`] to its backing bytes and slices out sections on
//! demand. Also builds the deploy container `RETURNCONTRACT` assembles from a
//! sub-container plus freshly-produced aux data (§4.6.4).

use bytes::Bytes;

use crate::constants::MAX_CODE_SIZE;
use crate::errors::{EofDecodeError, EofError, VMError};

use super::header::{read_eof_header, EofHeader};

/// A decoded EOF container: its header plus the raw bytes it was parsed from.
/// Section accessors slice directly into `raw`, so decoding never copies the code,
/// container or data sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eof {
    pub header: EofHeader,
    pub raw: Bytes,
}

impl Eof {
    /// Parses `raw`'s header (C3) without recursing into sub-containers or running
    /// the instruction validator (C4).
    pub fn decode(raw: Bytes) -> Result<Self, EofDecodeError> {
        let header = read_eof_header(&raw)?;
        Ok(Self { header, raw })
    }

    pub fn code_section(&self, index: usize) -> Option<&[u8]> {
        let offset = *self.header.code_offsets.get(index)? as usize;
        let size = *self.header.code_sizes.get(index)? as usize;
        self.raw.get(offset..offset + size)
    }

    pub fn container_section(&self, index: usize) -> Option<&[u8]> {
        let offset = *self.header.container_offsets.get(index)? as usize;
        let size = *self.header.container_sizes.get(index)? as usize;
        self.raw.get(offset..offset + size)
    }

    /// Bytes of the data section that are physically present. May be shorter than
    /// [`EofHeader::data_size`] when the container is legal initcode with
    /// truncated data.
    pub fn data_section_present(&self) -> &[u8] {
        let offset = self.header.data_offset as usize;
        self.raw.get(offset..).unwrap_or(&[])
    }

    /// `true` iff fewer data bytes are physically present than declared. Legal only
    /// for a container being validated as initcode.
    pub fn data_is_truncated(&self) -> bool {
        self.data_section_present().len() < usize::from(self.header.data_size)
    }
}

/// Builds the deploy container for `RETURNCONTRACT <idx>`: appends `aux_data` to
/// `deploy_container`'s (already fully-present, by construction — it was validated
/// in [`crate::eof::validator::Mode::Runtime`]) data section.
///
/// `declared_data_size` in the resulting header's data section is left untouched;
/// only the actual bytes grow. Fails if the new actual data length no longer fits in
/// a `u16`, or if the resulting container exceeds the maximum contract size.
pub fn build_deploy_container(
    deploy_container: &[u8],
    aux_data: &[u8],
) -> Result<Bytes, VMError> {
    let header = read_eof_header(deploy_container).map_err(EofError::from)?;
    let present = deploy_container.len() - header.data_offset as usize;
    let new_present = present
        .checked_add(aux_data.len())
        .ok_or(VMError::SizeLimitExceeded)?;
    if new_present > usize::from(u16::MAX) {
        return Err(VMError::SizeLimitExceeded);
    }
    if usize::from(header.data_size) > new_present {
        return Err(VMError::ContractValidationFailure);
    }

    let mut out = Vec::with_capacity(deploy_container.len() + aux_data.len());
    out.extend_from_slice(deploy_container);
    out.extend_from_slice(aux_data);

    if out.len() > MAX_CODE_SIZE {
        return Err(VMError::SizeLimitExceeded);
    }
    Ok(Bytes::from(out))
}
