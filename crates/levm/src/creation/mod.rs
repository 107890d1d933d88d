//! C6: the `EOFCREATE`/`TXCREATE` state machine (§4.6) — the core of the core.
//!
//! This module drives the contract-creation sub-flow up to the point where an
//! initcode frame is handed off for execution. It does not itself interpret
//! bytecode (that dispatch loop is out of scope, §1); callers supply an
//! [`InitcodeExecutor`] that runs the initcode and reports how it terminated.

pub mod registry;

pub use registry::InitcodeRegistry;

use ethrex_common::{AccountInfo, Address, Bytes, H256, U256};
use ethrex_crypto::keccak_hash;

use crate::constants::{EOFCREATE_GAS, INITCODE_WORD_GAS, MAX_CALL_DEPTH, word_count};
use crate::eof::{build_deploy_container, validate_eof, Eof, Mode};
use crate::errors::{EofError, InternalError, VMError};
use crate::gas::{memory_expansion_gas, split_call_gas};

/// Capability set the creation state machine needs from the surrounding host
/// (§6.1, §9 "dynamic dispatch"). Implemented by the embedder; no global state.
pub trait Host {
    fn get_balance(&self, addr: Address) -> U256;
    fn get_nonce(&self, addr: Address) -> u64;
    fn set_nonce(&mut self, addr: Address, nonce: u64);
    fn get_code_len(&self, addr: Address) -> usize;
    fn set_code(&mut self, addr: Address, code: Bytes);
    fn transfer(&mut self, from: Address, to: Address, value: U256) -> bool;
    fn memory_size(&self) -> u64;
    /// Combined account snapshot, used for the creation-address collision check
    /// (§6.2) via [`AccountInfo::has_no_code_and_no_nonce`].
    fn get_account_info(&self, addr: Address) -> AccountInfo;
}

/// How the initcode frame terminated, as reported by the embedder's dispatch loop.
#[derive(Debug, Clone)]
pub enum InitcodeTermination {
    /// `RETURNCONTRACT idx, mem_off, aux_size`: `aux_data` is the `aux_size` bytes
    /// already read from the frame's memory at `mem_off`.
    ReturnContract { container_index: usize, aux_data: Bytes },
    /// `STOP` or `INVALID`: both are hard failures for initcode (§4.6.3).
    Stop,
    Invalid,
    /// `REVERT mem_off, size`: `returndata` is the already-read memory slice.
    Revert { returndata: Bytes },
}

/// Runs one initcode frame to termination. `gas` is the budget handed to the
/// child; the returned `u64` is whatever of it the frame did not spend.
pub trait InitcodeExecutor {
    fn execute(
        &mut self,
        host: &mut dyn Host,
        initcode: &Eof,
        input: Bytes,
        gas: u64,
        depth: usize,
    ) -> (InitcodeTermination, u64);
}

/// Outcome of either `EOFCREATE` or `TXCREATE`. Every variant but [`Self::Success`]
/// pushes 0 on the caller's stack; only [`Self::Revert`] carries returndata.
#[derive(Debug, Clone)]
pub enum CreationOutcome {
    Success { address: Address },
    LightFailure,
    HardFailure,
    Revert { returndata: Bytes },
}

impl CreationOutcome {
    /// The value the creation opcode pushes onto the caller's stack.
    pub fn stack_value(&self) -> U256 {
        match self {
            Self::Success { address } => U256::from_big_endian(address.as_bytes()),
            _ => U256::zero(),
        }
    }

    /// The caller's returndata after the opcode returns (§4.6.4).
    pub fn returndata(&self) -> Bytes {
        match self {
            Self::Revert { returndata } => returndata.clone(),
            _ => Bytes::new(),
        }
    }
}

/// `addr = keccak256(0xFF || creator || salt || keccak256(initcode))[12..32]`
/// (§6.2).
pub fn derive_creation_address(creator: Address, salt: H256, initcode: &[u8]) -> Address {
    let initcode_hash = keccak_hash(initcode);
    let mut preimage = Vec::with_capacity(1 + 20 + 32 + 32);
    preimage.push(0xFFu8);
    preimage.extend_from_slice(creator.as_bytes());
    preimage.extend_from_slice(salt.as_bytes());
    preimage.extend_from_slice(&initcode_hash);
    let digest = keccak_hash(&preimage);
    Address::from_slice(&digest[12..])
}

/// Parameters common to both `EOFCREATE` and `TXCREATE`, read straight off the
/// caller's stack and memory (§4.6.1, §4.6.2).
pub struct CreationRequest<'a> {
    pub caller: Address,
    pub value: U256,
    pub salt: H256,
    pub input: Bytes,
    pub remaining_gas: u64,
    pub depth: usize,
    pub executor: &'a mut dyn InitcodeExecutor,
}

/// `EOFCREATE idx`: `idx` selects a sub-container of `current_container`, which by
/// construction (the validator recursed into it in [`Mode::Initcode`]) is already a
/// structurally valid initcode container — it is not re-validated here.
pub fn eofcreate(
    host: &mut dyn Host,
    current_container: &Eof,
    idx: usize,
    mem_off: u64,
    request: CreationRequest<'_>,
) -> Result<(CreationOutcome, u64), VMError> {
    let initcode_bytes = current_container
        .container_section(idx)
        .ok_or(VMError::Internal(InternalError::ArithmeticOverflow))?;
    let initcode = Eof::decode(Bytes::copy_from_slice(initcode_bytes)).map_err(EofError::from)?;

    run_creation(host, initcode, mem_off, request)
}

/// `TXCREATE`: same machine as `EOFCREATE`, except the initcode is looked up by
/// hash in the transaction's [`InitcodeRegistry`] and is validated here rather than
/// ahead of time (§4.6.2).
#[allow(clippy::too_many_arguments)]
pub fn txcreate(
    host: &mut dyn Host,
    registry: &InitcodeRegistry,
    tx_is_initcodes_type: bool,
    initcode_hash: H256,
    mem_off: u64,
    request: CreationRequest<'_>,
) -> Result<(CreationOutcome, u64), VMError> {
    if !tx_is_initcodes_type {
        return Ok((CreationOutcome::LightFailure, request.remaining_gas));
    }
    let Some(initcode_bytes) = registry.get(initcode_hash) else {
        return Ok((CreationOutcome::LightFailure, request.remaining_gas));
    };
    let raw = initcode_bytes.clone();

    // Charge-stage hashing cost needs the byte length regardless of validity, so
    // decode the header first; a header that doesn't even parse is the same hard
    // failure as one that parses but fails the structural validator.
    let initcode = match Eof::decode(raw) {
        Ok(eof) => eof,
        Err(_) => return Ok((CreationOutcome::HardFailure, request.remaining_gas)),
    };
    if validate_eof(&initcode, Mode::Initcode).is_err() {
        return Ok((CreationOutcome::HardFailure, request.remaining_gas));
    }

    run_creation(host, initcode, mem_off, request)
}

fn run_creation(
    host: &mut dyn Host,
    initcode: Eof,
    mem_off: u64,
    request: CreationRequest<'_>,
) -> Result<(CreationOutcome, u64), VMError> {
    let CreationRequest {
        caller,
        value,
        salt,
        input,
        remaining_gas,
        depth,
        executor,
    } = request;

    let input_len = u64::try_from(input.len()).unwrap_or(u64::MAX);
    let mem_gas = memory_expansion_gas(host.memory_size(), mem_off, input_len);
    let word_gas_count = u64::try_from(word_count(initcode.raw.len())).unwrap_or(u64::MAX);
    let hash_gas = INITCODE_WORD_GAS.saturating_mul(word_gas_count);
    let total_charge = EOFCREATE_GAS
        .checked_add(mem_gas)
        .and_then(|v| v.checked_add(hash_gas))
        .ok_or(VMError::Internal(InternalError::ArithmeticOverflow))?;

    if total_charge > remaining_gas {
        return Ok((CreationOutcome::HardFailure, 0));
    }

    if host.get_balance(caller) < value
        || host.get_nonce(caller) == u64::MAX
        || depth >= MAX_CALL_DEPTH
    {
        return Ok((CreationOutcome::LightFailure, remaining_gas));
    }

    // `total_charge <= remaining_gas` was just checked above, so this cannot underflow.
    #[allow(clippy::arithmetic_side_effects)]
    let gas_after_charge = remaining_gas - total_charge;
    #[allow(clippy::arithmetic_side_effects)]
    host.set_nonce(caller, host.get_nonce(caller) + 1);

    let child_address = derive_creation_address(caller, salt, &initcode.raw);
    let collision = !host.get_account_info(child_address).has_no_code_and_no_nonce();
    if collision {
        return Ok((CreationOutcome::HardFailure, 0));
    }

    if !host.transfer(caller, child_address, value) {
        return Ok((CreationOutcome::HardFailure, 0));
    }

    let (retained, child_gas) = split_call_gas(gas_after_charge);
    let (termination, child_gas_left) =
        executor.execute(host, &initcode, input, child_gas, depth + 1);

    match termination {
        InitcodeTermination::ReturnContract {
            container_index,
            aux_data,
        } => {
            // A `ContractValidationFailure` here (bad sub-container index, declared
            // data size left too large by the aux append, oversized deploy
            // container) is an execution-time outcome of the opcode, not an error
            // that escapes the call boundary (§7) — it folds into `HardFailure`
            // exactly like `STOP`/`INVALID` below.
            let built = initcode
                .container_section(container_index)
                .ok_or(VMError::ContractValidationFailure)
                .and_then(|deploy_source| build_deploy_container(deploy_source, &aux_data));

            match built {
                Ok(deploy_container) => {
                    host.set_code(child_address, deploy_container);
                    host.set_nonce(child_address, 1);
                    tracing::debug!(?child_address, "creation opcode deployed new contract");
                    Ok((
                        CreationOutcome::Success {
                            address: child_address,
                        },
                        retained + child_gas_left,
                    ))
                }
                Err(err) => {
                    tracing::warn!(?child_address, %err, "RETURNCONTRACT failed post-validation");
                    Ok((CreationOutcome::HardFailure, retained))
                }
            }
        }
        InitcodeTermination::Stop | InitcodeTermination::Invalid => {
            tracing::warn!(?child_address, "initcode halted without RETURNCONTRACT");
            Ok((CreationOutcome::HardFailure, retained))
        }
        InitcodeTermination::Revert { returndata } => {
            tracing::debug!(?child_address, len = returndata.len(), "initcode reverted");
            Ok((
                CreationOutcome::Revert { returndata },
                retained + child_gas_left,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeHost {
        balances: HashMap<Address, U256>,
        nonces: HashMap<Address, u64>,
        code_lens: HashMap<Address, usize>,
        codes: HashMap<Address, Bytes>,
    }

    impl Host for FakeHost {
        fn get_balance(&self, addr: Address) -> U256 {
            self.balances.get(&addr).copied().unwrap_or_default()
        }
        fn get_nonce(&self, addr: Address) -> u64 {
            self.nonces.get(&addr).copied().unwrap_or_default()
        }
        fn set_nonce(&mut self, addr: Address, nonce: u64) {
            self.nonces.insert(addr, nonce);
        }
        fn get_code_len(&self, addr: Address) -> usize {
            self.code_lens.get(&addr).copied().unwrap_or_default()
        }
        fn set_code(&mut self, addr: Address, code: Bytes) {
            self.code_lens.insert(addr, code.len());
            self.codes.insert(addr, code);
        }
        fn transfer(&mut self, _from: Address, _to: Address, _value: U256) -> bool {
            true
        }
        fn memory_size(&self) -> u64 {
            0
        }
        fn get_account_info(&self, addr: Address) -> AccountInfo {
            AccountInfo {
                nonce: self.get_nonce(addr),
                balance: self.get_balance(addr),
                bytecode: self.codes.get(&addr).cloned().unwrap_or_default(),
            }
        }
    }

    struct ReturnsContract(usize, Bytes);
    impl InitcodeExecutor for ReturnsContract {
        fn execute(
            &mut self,
            _host: &mut dyn Host,
            _initcode: &Eof,
            _input: Bytes,
            gas: u64,
            _depth: usize,
        ) -> (InitcodeTermination, u64) {
            (
                InitcodeTermination::ReturnContract {
                    container_index: self.0,
                    aux_data: self.1.clone(),
                },
                gas / 2,
            )
        }
    }

    const DEPLOY_CONTAINER: &str = "EF00010100040200010001040000000080000000"; // 20 bytes, STOP

    /// A container with one code section and one sub-container ([`DEPLOY_CONTAINER`]).
    /// Used both as "the initcode" (one level of `EOFCREATE`) and, wrapped one more
    /// level, as "the factory" whose sub-container 0 *is* that initcode.
    fn container_wrapping(subcontainer: &str) -> String {
        let sub_len = subcontainer.len() / 2;
        let size_hex = format!("{sub_len:04X}");
        let header = format!("EF00010100040200010001030001{size_hex}04000000");
        let types = "00800000";
        let code = "00"; // STOP (placeholder; the executor fakes the real terminator)
        format!("{header}{types}{code}{subcontainer}")
    }

    fn factory_initcode() -> Eof {
        let initcode_container = container_wrapping(DEPLOY_CONTAINER);
        let factory = container_wrapping(&initcode_container);
        Eof::decode(hex::decode(factory).unwrap().into()).unwrap()
    }

    #[test]
    fn successful_eofcreate_deploys_subcontainer_and_bumps_nonces() {
        let mut host = FakeHost::default();
        let caller = Address::from_low_u64_be(1);
        host.balances.insert(caller, U256::from(100u64));

        let container = factory_initcode();
        let mut executor = ReturnsContract(0, Bytes::new());
        let request = CreationRequest {
            caller,
            value: U256::zero(),
            salt: H256::zero(),
            input: Bytes::new(),
            remaining_gas: 1_000_000,
            depth: 0,
            executor: &mut executor,
        };
        let (outcome, gas_left) = eofcreate(&mut host, &container, 0, 0, request).unwrap();

        assert!(matches!(outcome, CreationOutcome::Success { .. }));
        assert_eq!(host.get_nonce(caller), 1);
        if let CreationOutcome::Success { address } = outcome {
            assert_eq!(host.get_nonce(address), 1);
            assert!(host.get_code_len(address) > 0);
        }
        assert!(gas_left > 0);
    }

    #[test]
    fn light_failure_on_insufficient_balance_does_not_bump_nonce() {
        let mut host = FakeHost::default();
        let caller = Address::from_low_u64_be(2);

        let container = factory_initcode();
        let mut executor = ReturnsContract(0, Bytes::new());
        let request = CreationRequest {
            caller,
            value: U256::from(1u64),
            salt: H256::zero(),
            input: Bytes::new(),
            remaining_gas: 1_000_000,
            depth: 0,
            executor: &mut executor,
        };
        let (outcome, gas_left) = eofcreate(&mut host, &container, 0, 0, request).unwrap();

        assert!(matches!(outcome, CreationOutcome::LightFailure));
        assert_eq!(host.get_nonce(caller), 0);
        assert_eq!(gas_left, 1_000_000);
    }

    #[test]
    fn hard_failure_on_insufficient_gas_consumes_everything() {
        let mut host = FakeHost::default();
        let caller = Address::from_low_u64_be(3);
        host.balances.insert(caller, U256::from(100u64));

        let container = factory_initcode();
        let mut executor = ReturnsContract(0, Bytes::new());
        let request = CreationRequest {
            caller,
            value: U256::zero(),
            salt: H256::zero(),
            input: Bytes::new(),
            remaining_gas: 1,
            depth: 0,
            executor: &mut executor,
        };
        let (outcome, gas_left) = eofcreate(&mut host, &container, 0, 0, request).unwrap();

        assert!(matches!(outcome, CreationOutcome::HardFailure));
        assert_eq!(gas_left, 0);
    }
}
