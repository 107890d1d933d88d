//! C5: dispatches a contract's bytecode to legacy or EOF handling depending on its
//! revision and its leading bytes (§4.5).

use bytes::Bytes;

use ethrex_common::Fork;

use crate::eof::{validate_raw_eof, Eof, EofHeader, Mode};
use crate::errors::EofError;

use super::jumpdest::JumpdestMap;
use super::padding::pad_code;

/// The result of analyzing a contract's code once, cached by callers keyed on the
/// code hash: either a padded legacy buffer with its jumpdest bitmap, or a validated
/// EOF container.
#[derive(Debug, Clone)]
pub enum CodeAnalysis {
    Legacy {
        padded_code: Bytes,
        jumpdests: JumpdestMap,
    },
    Eof(Box<Eof>),
}

impl CodeAnalysis {
    pub fn is_eof(&self) -> bool {
        matches!(self, Self::Eof(_))
    }
}

/// Fork at and after which EOF containers are recognized; on earlier forks, code
/// that happens to start with the EOF magic bytes is still treated as legacy.
const EOF_ENABLED_FROM: Fork = Fork::Prague;

/// Analyzes `code` under `fork`: if EOF is enabled for this revision and `code`
/// carries the EOF magic, decodes and fully validates it as runtime code; otherwise
/// runs legacy jumpdest analysis and pads the buffer.
pub fn analyze(fork: Fork, code: &[u8]) -> Result<CodeAnalysis, EofError> {
    if fork >= EOF_ENABLED_FROM && EofHeader::has_eof_magic(code) {
        let eof = validate_raw_eof(Bytes::copy_from_slice(code), Mode::Runtime)?;
        return Ok(CodeAnalysis::Eof(Box::new(eof)));
    }

    let jumpdests = JumpdestMap::analyze(code);
    let padded_code = pad_code(code);
    Ok(CodeAnalysis::Legacy {
        padded_code,
        jumpdests,
    })
}
