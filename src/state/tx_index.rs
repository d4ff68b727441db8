//! Read-only view of the committed-transaction index.
//!
//! The block store (out of scope here) indexes committed transactions by
//! their id. The mempool's status query consults this interface to report
//! transactions that have already made it into a block.

use crate::protocol::transaction::TxId;

/// Errors surfaced by the committed-transaction index, not by the mempool
/// core.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum TxIndexError {
    #[error("transaction indexing is disabled on this node")]
    IndexingDisabled,

    #[error("transaction {0} not found in the index")]
    NotFound(TxId),
}

/// What the block store recorded about a committed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedTxInfo {
    /// Height of the block that includes the transaction.
    pub height: u64,
    /// Position within that block.
    pub index: u32,
    /// Execution result code.
    pub code: u32,
    /// Execution error detail, empty on success.
    pub error: String,
}

/// Lookup of committed transactions by id.
pub trait TxIndexReader: Send + Sync {
    /// Returns `Ok(None)` for transactions the index has never seen.
    fn load_tx_info(&self, id: &TxId) -> Result<Option<CommittedTxInfo>, TxIndexError>;
}
