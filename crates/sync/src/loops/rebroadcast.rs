use std::time::Duration;

use crate::context::SyncContext;
use crate::error::Error;

/// Minimum wall-clock gap between rebroadcast attempts (spec §4.F loop 7).
pub const INTERVAL: Duration = Duration::from_secs(20 * 60);

/// Rebroadcast (spec §4.F loop 7): every `INTERVAL` of wall-clock, re-sends
/// the stored raw transaction for each unconfirmed sent payment. `last_run`
/// lives in the caller (the scheduler's dedicated rebroadcast task) rather
/// than in [`SyncContext`], since no other loop needs it.
pub async fn update(ctx: &SyncContext, last_run: &mut Option<Duration>) -> Result<(), Error> {
    let now = dw_common::time::now().unwrap_or_default();
    if let Some(last) = *last_run {
        if now.saturating_sub(last) < INTERVAL {
            return Ok(());
        }
    }

    let raws: Vec<Vec<u8>> = {
        let account = ctx.account.read().await;
        account.pending_payments(None).into_iter().map(|p| p.raw_tx.clone()).collect()
    };

    for raw in raws {
        if let Err(err) = ctx.explorer.broadcast(&raw).await {
            tracing::warn!(error = %err, "rebroadcast failed, will retry next tick");
        }
    }

    *last_run = Some(now);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dw_account::Account;
    use dw_explorer::mock::MockExplorer;
    use tokio::sync::RwLock;

    use super::*;

    const TEST_WORDLIST: &[&str] =
        &["install", "oppose", "unique", "steel", "opera", "next", "add", "town", "warfare", "leave", "salt", "chimney"];

    #[tokio::test]
    async fn rebroadcasts_unconfirmed_payments_on_first_tick() {
        let wordlist = TEST_WORDLIST.iter().map(|s| s.to_string()).collect();
        let mut account = Account::from_wordlist(wordlist, true).unwrap();
        account.save_pending_transaction(vec![("1dest".to_string(), 1000)], [1u8; 32], vec![9, 9, 9], None, 0);

        let explorer = Arc::new(MockExplorer::new());
        let ctx = SyncContext::new(Arc::new(RwLock::new(account)), explorer.clone(), 5);

        let mut last_run = None;
        update(&ctx, &mut last_run).await.unwrap();

        assert_eq!(explorer.broadcasts(), vec![vec![9, 9, 9]]);
        assert!(last_run.is_some());
    }

    #[tokio::test]
    async fn does_not_rebroadcast_before_the_interval_elapses() {
        let wordlist = TEST_WORDLIST.iter().map(|s| s.to_string()).collect();
        let mut account = Account::from_wordlist(wordlist, true).unwrap();
        account.save_pending_transaction(vec![("1dest".to_string(), 1000)], [1u8; 32], vec![9, 9, 9], None, 0);

        let explorer = Arc::new(MockExplorer::new());
        let ctx = SyncContext::new(Arc::new(RwLock::new(account)), explorer.clone(), 5);

        let mut last_run = Some(dw_common::time::now().unwrap());
        update(&ctx, &mut last_run).await.unwrap();

        assert!(explorer.broadcasts().is_empty());
    }
}
