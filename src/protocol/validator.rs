//! The external transaction-validation interface the mempool consumes.
//!
//! The node does not interpret transaction payloads; an application-level
//! validator decides admissibility and assigns each transaction a priority,
//! a sender identity, and a gas requirement. The mempool calls the validator
//! outside of its own lock, so implementations are free to be slow, remote,
//! or both — they only need to be safe to call concurrently.

use async_trait::async_trait;

use crate::protocol::transaction::Transaction;

/// Response code signalling acceptance.
pub const CODE_OK: u32 = 0;

/// The validator's verdict on a single transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckTxResponse {
    /// [`CODE_OK`] accepts; any other value rejects.
    pub code: u32,
    /// Application-assigned preference; higher is better.
    pub priority: i64,
    /// Originator identity. Empty means "no sender"; non-empty senders are
    /// limited to one resident transaction at a time.
    pub sender: String,
    /// Gas the transaction expects to consume. Never negative.
    pub gas_wanted: i64,
    /// Human-readable detail, mostly useful on rejection.
    pub log: String,
    /// Application-defined result payload.
    pub data: Vec<u8>,
}

impl CheckTxResponse {
    pub fn is_ok(&self) -> bool {
        self.code == CODE_OK
    }
}

/// Application-level transaction validation, consumed by the mempool.
#[async_trait]
pub trait TxValidator: Send + Sync {
    /// Judge a candidate transaction for admission.
    async fn check_tx(&self, tx: &Transaction) -> CheckTxResponse;

    /// Re-judge a resident transaction after a block commit. Defaults to
    /// the admission check; implementations with cheaper revalidation can
    /// override.
    async fn recheck_tx(&self, tx: &Transaction) -> CheckTxResponse {
        self.check_tx(tx).await
    }
}
