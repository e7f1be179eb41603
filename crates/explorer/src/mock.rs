//! An in-memory [`ExplorerClient`] double for tests, playing the role the
//! teacher's `andromeda_api::tests::wallet_mock` plays for higher-level
//! BDK-backed tests, but implementing the trait directly instead of
//! intercepting HTTP (since this boundary is a trait, not a fixed client).

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{BlockHeader, Error, ExplorerClient, HistoryEntry, StealthEntry, TxHash};

#[derive(Default)]
struct State {
    height: u64,
    headers: HashMap<u64, BlockHeader>,
    history: HashMap<String, Vec<HistoryEntry>>,
    transactions: HashMap<TxHash, Vec<u8>>,
    stealth_rows: Vec<StealthEntry>,
    broadcasts: Vec<Vec<u8>>,
    broadcast_should_fail: bool,
}

/// A fully scriptable, in-process explorer. Tests drive chain-head
/// movement, inject per-address history, and inspect every transaction
/// this wallet has broadcast.
pub struct MockExplorer {
    state: Mutex<State>,
}

impl Default for MockExplorer {
    fn default() -> Self {
        Self { state: Mutex::new(State::default()) }
    }
}

impl MockExplorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_header(&self, header: BlockHeader) {
        let mut state = self.state.lock().expect("mock explorer mutex poisoned");
        state.height = header.height;
        state.headers.insert(header.height, header);
    }

    pub fn set_history(&self, address: &str, rows: Vec<HistoryEntry>) {
        self.state.lock().expect("mock explorer mutex poisoned").history.insert(address.to_string(), rows);
    }

    pub fn set_transaction(&self, hash: TxHash, raw: Vec<u8>) {
        self.state.lock().expect("mock explorer mutex poisoned").transactions.insert(hash, raw);
    }

    pub fn set_stealth_rows(&self, rows: Vec<StealthEntry>) {
        self.state.lock().expect("mock explorer mutex poisoned").stealth_rows = rows;
    }

    pub fn fail_broadcasts(&self, should_fail: bool) {
        self.state.lock().expect("mock explorer mutex poisoned").broadcast_should_fail = should_fail;
    }

    pub fn broadcasts(&self) -> Vec<Vec<u8>> {
        self.state.lock().expect("mock explorer mutex poisoned").broadcasts.clone()
    }
}

#[async_trait]
impl ExplorerClient for MockExplorer {
    async fn last_height(&self) -> Result<u64, Error> {
        Ok(self.state.lock().expect("mock explorer mutex poisoned").height)
    }

    async fn block_header(&self, height: u64) -> Result<BlockHeader, Error> {
        self.state
            .lock()
            .expect("mock explorer mutex poisoned")
            .headers
            .get(&height)
            .cloned()
            .ok_or_else(|| Error::Malformed(format!("no header injected for height {height}")))
    }

    async fn history(&self, address: &str) -> Result<Vec<HistoryEntry>, Error> {
        Ok(self.state.lock().expect("mock explorer mutex poisoned").history.get(address).cloned().unwrap_or_default())
    }

    async fn transaction(&self, hash: &TxHash) -> Result<Vec<u8>, Error> {
        self.state
            .lock()
            .expect("mock explorer mutex poisoned")
            .transactions
            .get(hash)
            .cloned()
            .ok_or_else(|| Error::Malformed("no such transaction injected".to_string()))
    }

    async fn stealth(&self, _prefix: &[u8], _from_height: u64) -> Result<Vec<StealthEntry>, Error> {
        Ok(self.state.lock().expect("mock explorer mutex poisoned").stealth_rows.clone())
    }

    async fn broadcast(&self, raw_tx: &[u8]) -> Result<(), Error> {
        let mut state = self.state.lock().expect("mock explorer mutex poisoned");
        if state.broadcast_should_fail {
            return Err(Error::BroadcastRejected("mock explorer configured to reject broadcasts".to_string()));
        }
        state.broadcasts.push(raw_tx.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_broadcasts() {
        let explorer = MockExplorer::new();
        explorer.broadcast(&[1, 2, 3]).await.unwrap();
        assert_eq!(explorer.broadcasts(), vec![vec![1, 2, 3]]);
    }

    #[tokio::test]
    async fn can_be_configured_to_reject_broadcasts() {
        let explorer = MockExplorer::new();
        explorer.fail_broadcasts(true);
        assert!(explorer.broadcast(&[1, 2, 3]).await.is_err());
    }

    #[tokio::test]
    async fn returns_injected_history() {
        let explorer = MockExplorer::new();
        explorer.set_history(
            "1Some",
            vec![HistoryEntry {
                output_point: crate::OutputPoint { hash: [1u8; 32], index: 0 },
                output_height: Some(10),
                value: 5000,
                spend_point: None,
                spend_height: None,
            }],
        );
        let rows = explorer.history("1Some").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, 5000);
    }
}
