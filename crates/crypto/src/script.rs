use bitcoin::blockdata::opcodes::all as opcodes;
use bitcoin::blockdata::script::{Builder, PushBytesBuf, ScriptBuf};
use bitcoin::hashes::Hash;
use bitcoin::secp256k1::PublicKey;
use bitcoin::PubkeyHash;

use crate::address::PaymentAddress;
use crate::error::Error;

/// Builds the standard `OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG`
/// output script for a P2KH payment address.
pub fn p2kh_output_script(address: &PaymentAddress) -> ScriptBuf {
    let pubkey_hash = PubkeyHash::from_byte_array(address.hash);
    Builder::new()
        .push_opcode(opcodes::OP_DUP)
        .push_opcode(opcodes::OP_HASH160)
        .push_slice(pubkey_hash.as_byte_array())
        .push_opcode(opcodes::OP_EQUALVERIFY)
        .push_opcode(opcodes::OP_CHECKSIG)
        .into_script()
}

/// Builds the `OP_RETURN <40 bytes>` metadata output carrying a stealth
/// payment's ephemeral public key plus random padding (spec §4.E).
///
/// The payload is the ephemeral public key's x-only coordinate (32 bytes,
/// i.e. the compressed key with its parity-sign byte stripped) followed by
/// 8 bytes of random padding, matching the original stealth sender's
/// `metadata = ephemeral_public[1:] + random(8)`.
pub fn stealth_meta_script(ephemeral_public_x: &[u8; 32], padding: &[u8; 8]) -> ScriptBuf {
    let mut payload = Vec::with_capacity(40);
    payload.extend_from_slice(ephemeral_public_x);
    payload.extend_from_slice(padding);

    Builder::new().push_opcode(opcodes::OP_RETURN).push_slice(<&bitcoin::script::PushBytes>::try_from(payload.as_slice()).expect("40 bytes fits in a single push")).into_script()
}

/// Extracts the 40-byte payload from an `OP_RETURN` stealth metadata
/// script, if `script` matches that pattern.
pub fn parse_stealth_meta_script(script: &ScriptBuf) -> Result<[u8; 40], Error> {
    let mut instructions = script.instructions();
    let first = instructions.next().ok_or(Error::ScriptPatternMismatch)?.map_err(|_| Error::ScriptPatternMismatch)?;
    if first.opcode() != Some(opcodes::OP_RETURN) {
        return Err(Error::ScriptPatternMismatch);
    }
    let second = instructions.next().ok_or(Error::ScriptPatternMismatch)?.map_err(|_| Error::ScriptPatternMismatch)?;
    let bytes = second.push_bytes().ok_or(Error::ScriptPatternMismatch)?;
    if bytes.len() != 40 {
        return Err(Error::ScriptPatternMismatch);
    }
    if instructions.next().is_some() {
        return Err(Error::ScriptPatternMismatch);
    }
    let mut out = [0u8; 40];
    out.copy_from_slice(bytes.as_bytes());
    Ok(out)
}

/// Builds a P2KH input's scriptSig: `<endorsement> <pubkey>` (spec §4.G
/// step 6).
pub fn p2kh_sign_script(endorsement: &[u8], public_key: &PublicKey) -> Result<ScriptBuf, Error> {
    let endorsement = PushBytesBuf::try_from(endorsement.to_vec()).map_err(|_| Error::ScriptPatternMismatch)?;
    Ok(Builder::new().push_slice(endorsement).push_slice(public_key.serialize()).into_script())
}

/// True if `script` is the two-push `<sig> <pubkey>` P2KH sign pattern —
/// the assertion the spend pipeline makes right after building an input's
/// scriptSig (spec §4.G step 6).
pub fn is_p2kh_sign_pattern(script: &ScriptBuf) -> bool {
    let mut instructions = script.instructions();
    let Some(Ok(first)) = instructions.next() else { return false };
    if first.push_bytes().is_none() {
        return false;
    }
    let Some(Ok(second)) = instructions.next() else { return false };
    if second.push_bytes().is_none() {
        return false;
    }
    instructions.next().is_none()
}
