use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dw_account::Account;
use dw_explorer::ExplorerClient;
use tokio::sync::{watch, RwLock};

/// Everything the six control loops share: the account under a read/write
/// lock (spec §5's single shared resource), the explorer collaborator, the
/// tuning knobs loops need, and the fan-out wake-up channel.
pub struct SyncContext {
    pub account: Arc<RwLock<Account>>,
    pub explorer: Arc<dyn ExplorerClient>,
    pub gap_limit: u32,
    /// Maximum number of headers the reorg detector walks backwards before
    /// giving up and declaring a reorganisation (spec §4.F loop 1).
    pub max_rewind_depth: u32,
    /// Set between the reorg detector's `clear` and its final write of the
    /// new `current_index`; the spend pipeline checks this and fails with
    /// `updating_history` while it's set (spec §4.G step 1, §5).
    updating_history: Arc<AtomicBool>,
    wake_tx: watch::Sender<()>,
}

impl SyncContext {
    pub fn new(account: Arc<RwLock<Account>>, explorer: Arc<dyn ExplorerClient>, gap_limit: u32) -> Self {
        let (wake_tx, _wake_rx) = watch::channel(());
        Self { account, explorer, gap_limit, max_rewind_depth: 50, updating_history: Arc::new(AtomicBool::new(false)), wake_tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<()> {
        self.wake_tx.subscribe()
    }

    /// Fans the wake-up out to every loop's next tick. Only the reorg
    /// detector calls this, and only after it has durably written the new
    /// `current_index` (spec §4.F loop 1, §5).
    pub fn notify_all(&self) {
        let _ = self.wake_tx.send(());
    }

    pub fn is_updating_history(&self) -> bool {
        self.updating_history.load(Ordering::SeqCst)
    }

    pub(crate) fn set_updating_history(&self, value: bool) {
        self.updating_history.store(value, Ordering::SeqCst);
    }

    pub fn updating_history_flag(&self) -> Arc<AtomicBool> {
        self.updating_history.clone()
    }
}
