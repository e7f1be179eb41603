use crate::context::SyncContext;
use crate::error::Error;

/// Gap-limit key generation (spec §4.F loop 6, §8 property 3): ensures every
/// pocket has `max_used_index + 1 + gap_limit` normal keys, appending as
/// needed. All of the actual work lives in
/// [`dw_account::Account::ensure_gap_limit`]; this loop just calls it on
/// every tick.
pub async fn update(ctx: &SyncContext) -> Result<(), Error> {
    ctx.account.write().await.ensure_gap_limit(ctx.gap_limit)?;
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
    async fn grows_keys_past_highest_used_index() {
        let wordlist = TEST_WORDLIST.iter().map(|s| s.to_string()).collect();
        let mut account = Account::from_wordlist(wordlist, true).unwrap();
        account.add_pocket("master", 5).unwrap();
        let pocket_id = account.pocket("master").unwrap().id;
        let used_address = account.pocket("master").unwrap().keys[2].address.clone();

        account.replace_history(
            &used_address,
            vec![HistoryRow {
                pocket_id,
                address: used_address,
                is_output: true,
                hash: [1u8; 32],
                index: 0,
                height: Some(100),
                value: 1000,
                spend: None,
            }],
        );

        let ctx = SyncContext::new(Arc::new(RwLock::new(account)), Arc::new(MockExplorer::new()), 5);
        update(&ctx).await.unwrap();

        let account = ctx.account.read().await;
        assert_eq!(account.pocket("master").unwrap().keys.len(), 2 + 1 + 5);
    }
}
