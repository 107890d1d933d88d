//! Transaction-admission checks that gate execution entirely (§6.2, §7): the
//! create-transaction EOF rule and building the per-transaction initcode registry
//! for the `initcodes` transaction type.

use ethrex_common::{Bytes, Fork, TxKind};

use crate::creation::InitcodeRegistry;
use crate::eof::EofHeader;
use crate::errors::TxValidationError;

/// A create transaction (`to == null`) whose `data` begins with the EOF magic bytes
/// is rejected outright, on every revision (§6.2 "Creation-transaction rule"). A
/// `Call` transaction is never subject to this rule, regardless of its data.
pub fn validate_create_transaction_data(kind: TxKind, data: &[u8]) -> Result<(), TxValidationError> {
    if kind != TxKind::Create {
        return Ok(());
    }
    if EofHeader::has_eof_magic(data) {
        tracing::debug!("rejecting create transaction: data begins with the EOF magic");
        return Err(TxValidationError::EofCreationTransaction);
    }
    Ok(())
}

/// Builds the transaction's [`InitcodeRegistry`] for an `initcodes`-type
/// transaction, or rejects it outright if the active revision doesn't support that
/// transaction type yet (§6.2, §6.3).
pub fn build_initcode_registry(
    fork: Fork,
    initcodes: Vec<Bytes>,
) -> Result<InitcodeRegistry, TxValidationError> {
    if fork < Fork::Prague {
        tracing::debug!(?fork, "initcodes transaction type is not supported yet");
        return Err(TxValidationError::TxTypeNotSupported);
    }
    InitcodeRegistry::build(initcodes).inspect_err(|err| {
        tracing::warn!(%err, "rejecting initcodes transaction");
    })
}
