use crate::context::SyncContext;
use crate::error::Error;

/// Mark-confirmed (spec §4.F loop 4): walks the sent-payments journal and
/// flips `is_confirmed` for any entry whose `tx_hash` now appears as the
/// spending transaction of one of our own outputs. All of the actual work
/// lives in [`dw_account::Account::mark_any_confirmed_sent_payments`]; this
/// loop just calls it on every tick.
pub async fn update(ctx: &SyncContext) -> Result<(), Error> {
    ctx.account.write().await.mark_any_confirmed_sent_payments();
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dw_account::{Account, HistoryRow, SpendRef};
    use dw_explorer::mock::MockExplorer;
    use tokio::sync::RwLock;

    use super::*;

    const TEST_WORDLIST: &[&str] =
        &["install", "oppose", "unique", "steel", "opera", "next", "add", "town", "warfare", "leave", "salt", "chimney"];

    #[tokio::test]
    async fn flips_confirmed_once_spend_row_appears() {
        let wordlist = TEST_WORDLIST.iter().map(|s| s.to_string()).collect();
        let mut account = Account::from_wordlist(wordlist, true).unwrap();
        account.add_pocket("master", 5).unwrap();
        let pocket_id = account.pocket("master").unwrap().id;
        let address = account.pocket("master").unwrap().keys[0].address.clone();

        let sent_tx_hash = [9u8; 32];
        account.save_pending_transaction(vec![("1dest".to_string(), 1000)], sent_tx_hash, vec![1, 2, 3], Some(pocket_id), 0);
        assert!(!account.pending_payments(None).is_empty());

        account.replace_history(
            &address,
            vec![HistoryRow {
                pocket_id,
                address: address.clone(),
                is_output: true,
                hash: [1u8; 32],
                index: 0,
                height: Some(100),
                value: 1000,
                spend: Some(SpendRef { hash: sent_tx_hash, index: 0 }),
            }],
        );

        let ctx = SyncContext::new(Arc::new(RwLock::new(account)), Arc::new(MockExplorer::new()), 5);
        update(&ctx).await.unwrap();

        let account = ctx.account.read().await;
        assert!(account.pending_payments(None).is_empty());
        assert!(account.sent_payments().iter().all(|p| p.is_confirmed));
    }
}
