use dw_account::{HistoryRow, PocketId, SpendRef};
use dw_explorer::HistoryEntry;

use crate::context::SyncContext;
use crate::error::Error;

/// History scan (spec §4.F loop 3): refreshes every `(pocket, address)`
/// whose tracker watermark is behind the current chain height. All
/// per-address fetches run concurrently.
pub async fn update(ctx: &SyncContext) -> Result<(), Error> {
    let (current_height, stale_addresses) = {
        let account = ctx.account.read().await;
        let Some(current_index) = account.current_index else { return Ok(()) };
        let current_height = current_index.height;

        let mut stale = Vec::new();
        for pocket in account.pockets() {
            for key in &pocket.keys {
                let last = account.tracker.get(&key.address).copied().unwrap_or(0);
                if last < current_height {
                    stale.push((pocket.id, key.address.clone()));
                }
            }
            // The stealth address itself is never paid directly — its
            // *derived* one-time addresses are, keyed in `recovered_keys`.
            for address in pocket.stealth.recovered_keys.keys() {
                let last = account.tracker.get(address).copied().unwrap_or(0);
                if last < current_height {
                    stale.push((pocket.id, address.clone()));
                }
            }
        }
        (current_height, stale)
    };

    if stale_addresses.is_empty() {
        return Ok(());
    }

    let fetches = stale_addresses.into_iter().map(|(pocket_id, address)| async move {
        let entries = ctx.explorer.history(&address).await;
        (pocket_id, address, entries)
    });
    let results = futures::future::join_all(fetches).await;

    let mut account = ctx.account.write().await;
    for (pocket_id, address, entries) in results {
        match entries {
            Ok(entries) => {
                let rows = entries.iter().flat_map(|entry| to_history_rows(pocket_id, &address, entry)).collect();
                account.replace_history(&address, rows);
                account.tracker.insert(address, current_height);
            }
            Err(err) => {
                tracing::warn!(%address, error = %err, "history fetch failed, will retry next tick");
            }
        }
    }

    Ok(())
}

/// Splits one explorer `(output, spend?)` pair into an output row and,
/// if spent, a matching spend row with the same `(hash, index)` and a
/// negated value (spec §4.F loop 3, §8 property 4). The output row's
/// `spend` field is the actual back-reference to the spending transaction.
fn to_history_rows(pocket_id: PocketId, address: &str, entry: &HistoryEntry) -> Vec<HistoryRow> {
    let output_row = HistoryRow {
        pocket_id,
        address: address.to_string(),
        is_output: true,
        hash: entry.output_point.hash,
        index: entry.output_point.index,
        height: entry.output_height,
        value: entry.value as i64,
        spend: entry.spend_point.map(|p| SpendRef { hash: p.hash, index: p.index }),
    };

    let mut rows = vec![output_row];
    if entry.spend_point.is_some() {
        rows.push(HistoryRow {
            pocket_id,
            address: address.to_string(),
            is_output: false,
            hash: entry.output_point.hash,
            index: entry.output_point.index,
            height: entry.spend_height,
            value: -(entry.value as i64),
            spend: None,
        });
    }
    rows
}
