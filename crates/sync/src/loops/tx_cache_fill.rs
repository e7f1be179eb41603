use std::collections::HashSet;

use dw_account::TxHash;

use crate::context::SyncContext;
use crate::error::Error;

/// Tx cache fill (spec §4.F loop 5): for every distinct `tx_hash` appearing
/// in any history row that isn't already in the transaction cache, fetches
/// the raw transaction and stores it. Fetches run concurrently; a single
/// failed fetch doesn't block the others, and is retried on the next tick.
pub async fn update(ctx: &SyncContext) -> Result<(), Error> {
    let missing: Vec<TxHash> = {
        let account = ctx.account.read().await;
        let distinct: HashSet<TxHash> = account.all_history().map(|row| row.hash).collect();
        account.tx_cache_missing(distinct.iter())
    };

    if missing.is_empty() {
        return Ok(());
    }

    let fetches = missing.into_iter().map(|hash| async move {
        let raw = ctx.explorer.transaction(&hash).await;
        (hash, raw)
    });
    let results = futures::future::join_all(fetches).await;

    let mut account = ctx.account.write().await;
    for (hash, raw) in results {
        match raw {
            Ok(raw) => account.tx_cache_insert(hash, raw),
            Err(err) => {
                tracing::warn!(hash = %hex::encode(hash), error = %err, "transaction fetch failed, will retry next tick");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dw_account::{Account, HistoryRow};
    use dw_explorer::mock::MockExplorer;
    use tokio::sync::RwLock;

    use super::*;

    const TEST_WORDLIST: &[&str] =
        &["install", "oppose", "unique", "steel", "opera", "next", "add", "town", "warfare", "leave", "salt", "chimney"];

    #[tokio::test]
    async fn fetches_and_caches_missing_transactions() {
        let wordlist = TEST_WORDLIST.iter().map(|s| s.to_string()).collect();
        let mut account = Account::from_wordlist(wordlist, true).unwrap();
        account.add_pocket("master", 5).unwrap();
        let pocket_id = account.pocket("master").unwrap().id;
        let address = account.pocket("master").unwrap().keys[0].address.clone();

        let tx_hash = [7u8; 32];
        account.replace_history(
            &address,
            vec![HistoryRow {
                pocket_id,
                address,
                is_output: true,
                hash: tx_hash,
                index: 0,
                height: Some(10),
                value: 1000,
                spend: None,
            }],
        );

        let explorer = MockExplorer::new();
        explorer.set_transaction(tx_hash, vec![0xde, 0xad, 0xbe, 0xef]);

        let ctx = SyncContext::new(Arc::new(RwLock::new(account)), Arc::new(explorer), 5);
        update(&ctx).await.unwrap();

        let account = ctx.account.read().await;
        assert_eq!(account.tx_cache_get(&tx_hash), Some(&vec![0xde, 0xad, 0xbe, 0xef]));
    }

    #[tokio::test]
    async fn no_op_when_nothing_missing() {
        let wordlist = TEST_WORDLIST.iter().map(|s| s.to_string()).collect();
        let mut account = Account::from_wordlist(wordlist, true).unwrap();
        account.add_pocket("master", 5).unwrap();

        let ctx = SyncContext::new(Arc::new(RwLock::new(account)), Arc::new(MockExplorer::new()), 5);
        update(&ctx).await.unwrap();
    }
}
