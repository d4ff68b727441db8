//! Admission failure modes.

use crate::protocol::transaction::TxId;

/// Why the mempool refused a transaction.
///
/// The first four variants are returned synchronously from admission.
/// Verdict-dependent failures (`Rejected`, `PostCheck`, `SenderInFlight`,
/// `Full`) are delivered through the admission callback instead, because the
/// validator runs asynchronously and concurrent admissions share that path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum MempoolError {
    #[error("transaction of {actual} bytes exceeds the per-transaction limit of {max} bytes")]
    TxTooLarge { max: u64, actual: u64 },

    #[error("peer {peer_id} already delivered transaction {tx_id}")]
    DuplicatePeer { peer_id: u16, tx_id: TxId },

    #[error("pre-check failed: {0}")]
    PreCheck(String),

    #[error("mempool is full: {num_txs} transactions using {size_bytes} bytes")]
    Full { num_txs: usize, size_bytes: u64 },

    #[error("sender {sender:?} already has a transaction in the mempool")]
    SenderInFlight { sender: String },

    #[error("validator rejected transaction with code {code}: {log}")]
    Rejected { code: u32, log: String },

    #[error("post-check failed: {0}")]
    PostCheck(String),
}
