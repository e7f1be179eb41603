use bitcoin::secp256k1::PublicKey;
use dw_account::stealth::StealthReceiver;
use dw_crypto::address::PaymentAddress;

use crate::context::SyncContext;
use crate::error::Error;

/// Stealth scan (spec §4.F loop 2): discovers incoming stealth payments by
/// asking the explorer for every stealth row since the oldest
/// per-pocket watermark, then testing each row's ephemeral key against
/// every pocket's stealth keypair.
pub async fn update(ctx: &SyncContext) -> Result<(), Error> {
    let (is_testnet, from_height, current_height, addresses) = {
        let account = ctx.account.read().await;
        let Some(current_index) = account.current_index else { return Ok(()) };

        let floor = dw_common::stealth_scan_floor(account.is_testnet);
        let from_height = account
            .pockets()
            .iter()
            .map(|p| account.tracker.get(&p.stealth.stealth_address).copied().unwrap_or(0))
            .min()
            .unwrap_or(0)
            .max(floor);

        let addresses: Vec<String> = account.pockets().iter().map(|p| p.stealth.stealth_address.clone()).collect();
        (account.is_testnet, from_height, current_index.height, addresses)
    };

    let network = dw_crypto::Network::from_is_testnet(is_testnet);
    let rows = ctx.explorer.stealth(&[], from_height).await?;

    let mut account = ctx.account.write().await;

    for row in &rows {
        let mut ephemeral_bytes = [0u8; 33];
        ephemeral_bytes[0] = 0x02;
        let mut reversed = row.ephemeral_key_x;
        reversed.reverse();
        ephemeral_bytes[1..].copy_from_slice(&reversed);
        let Ok(ephemeral_public) = PublicKey::from_slice(&ephemeral_bytes) else { continue };

        let mut reversed_hash = row.address_hash;
        reversed_hash.reverse();
        let observed_address =
            PaymentAddress { kind: payment_kind_for(network), version: version_for(network), hash: reversed_hash }
                .to_string();

        for pocket in account.pockets().to_vec().iter() {
            let receiver = StealthReceiver::new(&pocket.stealth);
            if let Some(candidate) = receiver.derive_address(&ephemeral_public, network) {
                if candidate == observed_address {
                    if let Ok(secret) = receiver.derive_private(&ephemeral_public) {
                        if let Some(pocket_mut) = account.pocket_by_id_mut(pocket.id) {
                            pocket_mut.stealth.recovered_keys.insert(observed_address.clone(), secret);
                        }
                    }
                }
            }
        }
    }

    // Advance every pocket's watermark to the current chain height on every
    // scan, not just ticks that actually found rows, or `from_height` would
    // stay pinned at the scan floor forever once the explorer reports no
    // new stealth activity.
    for address in &addresses {
        account.tracker.insert(address.clone(), current_height);
    }

    Ok(())
}

fn payment_kind_for(network: dw_crypto::Network) -> dw_crypto::AddressKind {
    if network.is_testnet() {
        dw_crypto::AddressKind::TestnetP2kh
    } else {
        dw_crypto::AddressKind::MainnetP2kh
    }
}

fn version_for(network: dw_crypto::Network) -> u8 {
    network.p2kh_version()
}
