use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::context::SyncContext;
use crate::error::Error;
use crate::loops::{gap_limit, history_scan, mark_confirmed, rebroadcast, reorg, stealth_scan, tx_cache_fill};

/// Fallback wait between ticks when nothing wakes a loop early (spec §4.F:
/// "waits on its signal with a fallback timeout of 5 seconds").
const FALLBACK_TIMEOUT: Duration = Duration::from_secs(5);

/// Spawns all seven control loops against a shared [`SyncContext`],
/// cooperatively scheduled per spec §5: each loop runs its `update()`, then
/// waits on the shared wake-up (or the fallback timeout, whichever comes
/// first) before ticking again. `stop` cancels every loop task; loops treat
/// cancellation as terminal, never retrying mid-shutdown (spec §5).
pub struct Scheduler {
    handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    pub fn spawn(ctx: Arc<SyncContext>) -> Self {
        let handles = vec![
            spawn_loop(ctx.clone(), "reorg", reorg::update),
            spawn_loop(ctx.clone(), "stealth_scan", stealth_scan::update),
            spawn_loop(ctx.clone(), "history_scan", history_scan::update),
            spawn_loop(ctx.clone(), "mark_confirmed", mark_confirmed::update),
            spawn_loop(ctx.clone(), "tx_cache_fill", tx_cache_fill::update),
            spawn_loop(ctx.clone(), "gap_limit", gap_limit::update),
            spawn_rebroadcast(ctx),
        ];

        Self { handles }
    }

    pub fn stop(self) {
        for handle in self.handles {
            handle.abort();
        }
    }
}

fn spawn_loop<F, Fut>(ctx: Arc<SyncContext>, name: &'static str, update: F) -> JoinHandle<()>
where
    F: Fn(&SyncContext) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), Error>> + Send,
{
    tokio::spawn(async move {
        let mut wake_rx = ctx.subscribe();
        loop {
            if let Err(err) = update(&ctx).await {
                tracing::warn!(loop_name = name, error = %err, "loop tick failed, retrying next tick");
            }
            let _ = tokio::time::timeout(FALLBACK_TIMEOUT, wake_rx.changed()).await;
        }
    })
}

fn spawn_rebroadcast(ctx: Arc<SyncContext>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut wake_rx = ctx.subscribe();
        let mut last_run = None;
        loop {
            if let Err(err) = rebroadcast::update(&ctx, &mut last_run).await {
                tracing::warn!(loop_name = "rebroadcast", error = %err, "loop tick failed, retrying next tick");
            }
            let _ = tokio::time::timeout(FALLBACK_TIMEOUT, wake_rx.changed()).await;
        }
    })
}
