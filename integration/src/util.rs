//! Utilities for sending transactions & checking their effects

use alloy::{
    contract::{CallBuilder, CallDecoder},
    network::Ethereum,
    primitives::TxHash,
    providers::{DynProvider, Provider},
    rpc::types::TransactionReceipt,
    sol_types::SolEvent,
};
use eyre::{bail, ensure, eyre, Result};

/// The call builder type for the tests
pub type TestCallBuilder<'a, C> = CallBuilder<&'a DynProvider, C, Ethereum>;

/// Send a transaction and ensure it was successful
pub async fn wait_for_tx_success<C: CallDecoder>(
    tx: TestCallBuilder<'_, C>,
) -> Result<TransactionReceipt> {
    let receipt = tx.send().await?.get_receipt().await?;
    ensure!(receipt.status(), "tx {} reverted", receipt.transaction_hash);
    Ok(receipt)
}

/// Send a transaction and ensure it reverts with a message containing `reason`
pub async fn expect_revert<C: CallDecoder>(tx: TestCallBuilder<'_, C>, reason: &str) -> Result<()> {
    match tx.send().await {
        // Gas estimation surfaces the revert reason before anything is broadcast
        Err(e) => {
            let msg = e.to_string();
            ensure!(msg.contains(reason), "expected revert with \"{reason}\", got: {msg}");
            Ok(())
        }
        Ok(pending) => {
            let receipt = pending.get_receipt().await?;
            if receipt.status() {
                bail!("expected revert with \"{reason}\", tx succeeded");
            }
            bail!("tx {} reverted without a readable reason", receipt.transaction_hash)
        }
    }
}

/// Send a transaction and ensure it does not succeed, whatever the reason
pub async fn expect_failure<C: CallDecoder>(tx: TestCallBuilder<'_, C>) -> Result<()> {
    match tx.send().await {
        Err(_) => Ok(()),
        Ok(pending) => {
            let receipt = pending.get_receipt().await?;
            ensure!(!receipt.status(), "tx {} unexpectedly succeeded", receipt.transaction_hash);
            Ok(())
        }
    }
}

/// Fetch the receipt of an already mined transaction
pub async fn fetch_receipt(provider: &DynProvider, tx: TxHash) -> Result<TransactionReceipt> {
    provider.get_transaction_receipt(tx).await?.ok_or_else(|| eyre!("no receipt for {tx}"))
}

/// Whether the receipt holds at least one log of the event `E`
pub fn emitted<E: SolEvent>(receipt: &TransactionReceipt) -> bool {
    receipt.logs().iter().any(|log| log.topics().first() == Some(&E::SIGNATURE_HASH))
}
