//! Waiting for a transaction to be buried under a number of blocks

use std::{future::Future, time::Duration};

use tokio::time::{sleep, timeout};
use tracing::debug;

use crate::{
    constants::{CONFIRMATION_POLL_INTERVAL, CONFIRMATION_TIMEOUT, NUM_VERIFY_CONFIRMATIONS},
    errors::ScriptError,
    framework::BlockSource,
};

/// How deep to bury a transaction and how long to wait for it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    /// The number of confirmations, counting the block the transaction was mined in
    pub confirmations: u64,
    /// The delay between polls of the chain head
    pub poll_interval: Duration,
    /// The overall deadline
    pub timeout: Duration,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            confirmations: NUM_VERIFY_CONFIRMATIONS,
            poll_interval: CONFIRMATION_POLL_INTERVAL,
            timeout: CONFIRMATION_TIMEOUT,
        }
    }
}

impl ConfirmationPolicy {
    /// The block the head must reach for a transaction mined in `mined_block`
    /// to have the required confirmations
    pub fn target_block(&self, mined_block: u64) -> u64 {
        mined_block + self.confirmations.saturating_sub(1)
    }
}

/// Wait until the transaction mined in `mined_block` has the confirmations
/// required by `policy`, returning the head block number observed.
///
/// Fails with [`ScriptError::ConfirmationTimeout`] once the policy's deadline
/// passes, or with [`ScriptError::Cancelled`] as soon as `cancel` resolves.
pub async fn wait_for_confirmations<B: BlockSource>(
    source: &B,
    mined_block: u64,
    policy: &ConfirmationPolicy,
    cancel: impl Future<Output = ()>,
) -> Result<u64, ScriptError> {
    let target = policy.target_block(mined_block);

    tokio::select! {
        res = timeout(policy.timeout, poll_until(source, target, policy.poll_interval)) => {
            res.map_err(|_| {
                ScriptError::ConfirmationTimeout(format!(
                    "block {target} not reached within {:?}",
                    policy.timeout
                ))
            })?
        }
        _ = cancel => Err(ScriptError::Cancelled),
    }
}

/// Poll the chain head until it reaches `target`
async fn poll_until<B: BlockSource>(
    source: &B,
    target: u64,
    poll_interval: Duration,
) -> Result<u64, ScriptError> {
    loop {
        let head = source.block_number().await?;
        if head >= target {
            return Ok(head);
        }

        debug!(head, target, "waiting for confirmations");
        sleep(poll_interval).await;
    }
}
