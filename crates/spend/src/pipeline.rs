use bitcoin::hashes::Hash;
use bitcoin::secp256k1::{PublicKey, Secp256k1};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::{absolute::LockTime, transaction, OutPoint, Sequence, Transaction, TxIn, TxOut, Txid, Witness};
use dw_account::{stealth as account_stealth, AddressValidator, PocketId, TxHash};
use dw_crypto::{Endorsement, PaymentAddress};
use dw_sync::SyncContext;
use rand::seq::SliceRandom;

use crate::error::Error;
use crate::selection;

/// One requested payment destination, in whole satoshi (spec §4.G).
#[derive(Debug, Clone)]
pub struct Destination {
    pub address: String,
    pub value: u64,
}

/// Validates destinations, selects inputs, assembles and signs the
/// transaction, broadcasts it, and journals the resulting pending payment
/// (spec §4.G, §4.H `send`).
///
/// Fails fast with [`Error::UpdatingHistory`] if a reorganisation-triggered
/// history rebuild is currently in progress (spec §4.G step 1, §5) — this is
/// the one place the spend pipeline coordinates with the control loops
/// rather than just sharing their locks.
pub async fn send(
    ctx: &SyncContext,
    destinations: Vec<Destination>,
    from_pocket: Option<&str>,
    fee: u64,
) -> Result<TxHash, Error> {
    if ctx.is_updating_history() {
        return Err(Error::UpdatingHistory);
    }

    if destinations.is_empty() {
        return Err(Error::InvalidAddress("at least one destination is required".to_string()));
    }

    let network = ctx.account.read().await.network();

    let validators: Vec<AddressValidator> = destinations
        .iter()
        .map(|dest| {
            let validator = AddressValidator::new(&dest.address);
            let network_matches = if network.is_testnet() { validator.is_testnet() } else { validator.is_mainnet() };
            if validator.is_valid() && network_matches && (validator.is_stealth() || validator.is_p2kh()) {
                Ok(validator)
            } else {
                Err(Error::InvalidAddress(dest.address.clone()))
            }
        })
        .collect::<Result<_, _>>()?;

    let required = destinations.iter().map(|d| d.value).sum::<u64>() + fee;

    let from_pocket_id = match from_pocket {
        Some(name) => {
            let account = ctx.account.read().await;
            Some(account.pocket(name).ok_or_else(|| Error::PocketNotFound(name.to_string()))?.id)
        }
        None => None,
    };

    let (chosen_points, change) = {
        let account = ctx.account.read().await;
        let candidates = account.all_unspent_inputs(from_pocket_id);
        let (chosen, change) = selection::select(&candidates, required).ok_or(Error::NotEnoughFunds)?;
        let points: Vec<(TxHash, u32)> = chosen.iter().map(|row| (row.hash, row.index)).collect();
        (points, change)
    };

    let mut outputs = build_outputs(&destinations, &validators, network)?;
    if change > 0 {
        outputs.push(build_change_output(ctx, from_pocket_id, change).await?);
    }
    outputs.shuffle(&mut rand::thread_rng());

    let inputs: Vec<TxIn> = chosen_points
        .iter()
        .map(|(hash, index)| TxIn {
            previous_output: OutPoint { txid: Txid::from_byte_array(*hash), vout: *index },
            script_sig: bitcoin::ScriptBuf::new(),
            sequence: Sequence::MAX,
            witness: Witness::default(),
        })
        .collect();

    let mut tx = Transaction { version: transaction::Version::ONE, lock_time: LockTime::ZERO, input: inputs, output: outputs };

    sign_inputs(ctx, &chosen_points, network, &mut tx).await?;

    let raw = bitcoin::consensus::encode::serialize(&tx);
    ctx.explorer.broadcast(&raw).await?;

    let tx_hash = tx.compute_txid().to_byte_array();
    let now = dw_common::time::now_secs();
    let journaled_destinations = destinations.into_iter().map(|d| (d.address, d.value)).collect();
    ctx.account.write().await.save_pending_transaction(journaled_destinations, tx_hash, raw, from_pocket_id, now);

    Ok(tx_hash)
}

fn build_outputs(
    destinations: &[Destination],
    validators: &[AddressValidator],
    network: dw_crypto::Network,
) -> Result<Vec<TxOut>, Error> {
    let mut outputs = Vec::with_capacity(destinations.len() + 1);

    for (dest, validator) in destinations.iter().zip(validators) {
        if let Some(stealth_address) = validator.stealth() {
            let (meta_script, send_address) = account_stealth::send_to_stealth_address(stealth_address, None, network)?;
            outputs.push(TxOut { value: bitcoin::Amount::from_sat(0), script_pubkey: meta_script });

            let payment = PaymentAddress::from_string(&send_address)?;
            outputs.push(TxOut {
                value: bitcoin::Amount::from_sat(dest.value),
                script_pubkey: dw_crypto::script::p2kh_output_script(&payment),
            });
        } else {
            let payment = validator.payment().expect("validated payment destinations always parse").clone();
            outputs.push(TxOut {
                value: bitcoin::Amount::from_sat(dest.value),
                script_pubkey: dw_crypto::script::p2kh_output_script(&payment),
            });
        }
    }

    Ok(outputs)
}

/// Picks a uniformly random unused address in the change pocket — the send
/// pocket if one was supplied, otherwise a uniformly random pocket (spec
/// §4.G step 5).
async fn build_change_output(ctx: &SyncContext, from_pocket_id: Option<PocketId>, change: u64) -> Result<TxOut, Error> {
    let account = ctx.account.read().await;

    let change_pocket_id = match from_pocket_id {
        Some(id) => id,
        None => account.random_pocket().ok_or(Error::NoChangeAddress)?.id,
    };

    let unused = account.unused_addresses_in_pocket(change_pocket_id);
    let address = unused.choose(&mut rand::thread_rng()).ok_or(Error::NoChangeAddress)?;
    let payment = PaymentAddress::from_string(address)?;

    Ok(TxOut { value: bitcoin::Amount::from_sat(change), script_pubkey: dw_crypto::script::p2kh_output_script(&payment) })
}

/// Signs each input against the right key: resolves the previous output's
/// script from the transaction cache, extracts its address, looks up the
/// matching private key (normal or stealth), signs with `SIGHASH_ALL`, and
/// asserts the built scriptSig matches the P2KH sign pattern (spec §4.G
/// step 6).
async fn sign_inputs(
    ctx: &SyncContext,
    chosen_points: &[(TxHash, u32)],
    network: dw_crypto::Network,
    tx: &mut Transaction,
) -> Result<(), Error> {
    let signers = {
        let account = ctx.account.read().await;
        let mut signers = Vec::with_capacity(chosen_points.len());
        for (hash, index) in chosen_points {
            let raw_prev = account.tx_cache_get(hash).ok_or(Error::MissingPreviousTransaction)?;
            let prev_tx: Transaction =
                bitcoin::consensus::deserialize(raw_prev).map_err(|_| Error::MissingPreviousTransaction)?;
            let prev_out = prev_tx.output.get(*index as usize).ok_or(Error::MissingPreviousTransaction)?;

            let address = PaymentAddress::extract_from_script(&prev_out.script_pubkey, network)
                .ok_or(Error::UnrecognisedPreviousOutput)?;
            let secret = account.find_key(&address.to_string()).ok_or(Error::MissingKey)?;

            signers.push((secret, prev_out.script_pubkey.clone()));
        }
        signers
    };

    let sighash_type = EcdsaSighashType::All;
    let sighashes: Vec<[u8; 32]> = {
        let cache = SighashCache::new(&*tx);
        signers
            .iter()
            .enumerate()
            .map(|(index, (_, script_pubkey))| {
                cache
                    .legacy_signature_hash(index, script_pubkey, sighash_type.to_u32())
                    .map(|h| h.to_byte_array())
                    .map_err(|e| Error::Sighash(e.to_string()))
            })
            .collect::<Result<_, _>>()?
    };

    let secp = Secp256k1::new();
    for (index, ((secret, _), sighash)) in signers.iter().zip(sighashes.iter()).enumerate() {
        let endorsement = Endorsement::sign(secret, sighash)?;
        let public = PublicKey::from_secret_key(&secp, secret);
        let script_sig = dw_crypto::script::p2kh_sign_script(&endorsement.0, &public)?;
        if !dw_crypto::script::is_p2kh_sign_pattern(&script_sig) {
            return Err(Error::SignPatternMismatch);
        }
        tx.input[index].script_sig = script_sig;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bitcoin::secp256k1::{PublicKey as Secp256PublicKey, Secp256k1, SecretKey};
    use bitcoin::Amount;
    use dw_account::{Account, HistoryRow};
    use dw_explorer::mock::MockExplorer;
    use tokio::sync::RwLock;

    use super::*;

    const TEST_WORDLIST: &[&str] =
        &["install", "oppose", "unique", "steel", "opera", "next", "add", "town", "warfare", "leave", "salt", "chimney"];

    fn account_with_utxo(value: u64) -> Account {
        let wordlist = TEST_WORDLIST.iter().map(|s| s.to_string()).collect();
        let mut account = Account::from_wordlist(wordlist, true).unwrap();
        account.add_pocket("master", 5).unwrap();
        let pocket_id = account.pocket("master").unwrap().id;
        let address = account.pocket("master").unwrap().keys[0].address.clone();

        let payment = PaymentAddress::from_string(&address).unwrap();
        let prev_tx = Transaction {
            version: transaction::Version::ONE,
            lock_time: LockTime::ZERO,
            input: vec![],
            output: vec![TxOut { value: Amount::from_sat(value), script_pubkey: dw_crypto::script::p2kh_output_script(&payment) }],
        };
        let prev_hash = prev_tx.compute_txid().to_byte_array();
        let raw_prev = bitcoin::consensus::encode::serialize(&prev_tx);
        account.tx_cache_insert(prev_hash, raw_prev);

        account.replace_history(
            &address,
            vec![HistoryRow {
                pocket_id,
                address,
                is_output: true,
                hash: prev_hash,
                index: 0,
                height: Some(100),
                value: value as i64,
                spend: None,
            }],
        );

        account
    }

    fn testnet_address(seed: u8) -> String {
        let secp = Secp256k1::new();
        let sk = SecretKey::from_slice(&[seed; 32]).unwrap();
        let pk = Secp256PublicKey::from_secret_key(&secp, &sk);
        PaymentAddress::p2kh_from_public_key(&pk, dw_crypto::Network::Testnet).to_string()
    }

    #[tokio::test]
    async fn sends_to_a_p2kh_destination_and_conserves_value() {
        let account = account_with_utxo(2000);
        let explorer = Arc::new(MockExplorer::new());
        let ctx = SyncContext::new(Arc::new(RwLock::new(account)), explorer.clone(), 5);

        let dest_address = testnet_address(77);
        let tx_hash = send(&ctx, vec![Destination { address: dest_address, value: 500 }], None, 50).await.unwrap();

        let broadcasts = explorer.broadcasts();
        assert_eq!(broadcasts.len(), 1);
        let broadcast_tx: Transaction = bitcoin::consensus::deserialize(&broadcasts[0]).unwrap();
        assert_eq!(broadcast_tx.compute_txid().to_byte_array(), tx_hash);

        let total_out: u64 = broadcast_tx.output.iter().map(|o| o.value.to_sat()).sum();
        assert_eq!(total_out, 500 + (2000 - 500 - 50));
        assert!(broadcast_tx.input.iter().all(|input| dw_crypto::script::is_p2kh_sign_pattern(&input.script_sig)));

        let account = ctx.account.read().await;
        assert_eq!(account.pending_payments(None).len(), 1);
    }

    #[tokio::test]
    async fn rejects_invalid_destination_address() {
        let account = account_with_utxo(2000);
        let ctx = SyncContext::new(Arc::new(RwLock::new(account)), Arc::new(MockExplorer::new()), 5);

        let result = send(&ctx, vec![Destination { address: "not-an-address".to_string(), value: 100 }], None, 0).await;
        assert!(matches!(result, Err(Error::InvalidAddress(_))));
    }

    #[tokio::test]
    async fn rejects_when_funds_are_insufficient() {
        let account = account_with_utxo(100);
        let ctx = SyncContext::new(Arc::new(RwLock::new(account)), Arc::new(MockExplorer::new()), 5);

        let dest_address = testnet_address(55);
        let result = send(&ctx, vec![Destination { address: dest_address, value: 5000 }], None, 0).await;
        assert!(matches!(result, Err(Error::NotEnoughFunds)));
    }

    #[tokio::test]
    async fn empty_destinations_rejected() {
        let account = account_with_utxo(2000);
        let ctx = SyncContext::new(Arc::new(RwLock::new(account)), Arc::new(MockExplorer::new()), 5);
        let result = send(&ctx, vec![], None, 0).await;
        assert!(matches!(result, Err(Error::InvalidAddress(_))));
    }

    #[tokio::test]
    async fn fails_fast_while_history_is_updating() {
        let account = account_with_utxo(2000);
        let ctx = SyncContext::new(Arc::new(RwLock::new(account)), Arc::new(MockExplorer::new()), 5);
        ctx.updating_history_flag().store(true, std::sync::atomic::Ordering::SeqCst);

        let dest_address = testnet_address(66);
        let result = send(&ctx, vec![Destination { address: dest_address, value: 500 }], None, 50).await;
        assert!(matches!(result, Err(Error::UpdatingHistory)));
    }
}
