use dw_account::ChainIndex;

use crate::context::SyncContext;
use crate::error::Error;

/// Chain-head / reorganisation detector (spec §4.F loop 1). The only loop
/// that writes `current_index` and the only one allowed to fan the shared
/// wake-up — it does so exactly once it has durably recorded the new
/// watermark, so every other loop's next tick observes it consistently.
pub async fn update(ctx: &SyncContext) -> Result<(), Error> {
    let last_height = ctx.explorer.last_height().await?;
    let header = ctx.explorer.block_header(last_height).await?;
    let new_index = ChainIndex { height: header.height, hash: header.hash };

    let current = ctx.account.read().await.current_index;
    if current == Some(new_index) {
        return Ok(());
    }

    let reorg_detected = match current {
        None => {
            tracing::debug!(height = new_index.height, "initialising chain index");
            false
        }
        Some(idx) if header.previous_block_hash == idx.hash => {
            tracing::debug!(height = new_index.height, "single-block advance");
            false
        }
        Some(idx) => {
            let connected = walk_backward_for_ancestor(ctx, header.height, idx.hash).await?;
            if connected {
                tracing::debug!(from = idx.height, to = new_index.height, "multi-block advance, chain connected");
                false
            } else {
                tracing::warn!(from = idx.height, to = new_index.height, "reorganisation detected, clearing history");
                true
            }
        }
    };

    if reorg_detected {
        ctx.set_updating_history(true);
        ctx.account.write().await.clear_history();
    }

    ctx.account.write().await.current_index = Some(new_index);
    ctx.set_updating_history(false);
    ctx.notify_all();

    Ok(())
}

/// Walks backward from `from_height - 1` looking for a header whose
/// `previous_block_hash` is `target_hash`, i.e. a header that directly
/// extends the previously-known chain tip. Gives up — and reports "not
/// connected" — after `max_rewind_depth` steps or at genesis.
async fn walk_backward_for_ancestor(
    ctx: &SyncContext,
    from_height: u64,
    target_hash: [u8; 32],
) -> Result<bool, Error> {
    let mut height = from_height;
    for _ in 0..ctx.max_rewind_depth {
        if height == 0 {
            return Ok(false);
        }
        height -= 1;
        let ancestor = ctx.explorer.block_header(height).await?;
        if ancestor.previous_block_hash == target_hash {
            return Ok(true);
        }
    }
    Ok(false)
}
