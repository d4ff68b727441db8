//! Operator-facing configuration for the transaction mempool.

use std::time::Duration;

use bytesize::ByteSize;
use serde::Deserialize;
use serde::Serialize;

/// Configuration for the priority mempool.
///
/// The defaults are sized for a production validator; tests and embedded
/// deployments override individual fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MempoolConfig {
    /// Maximum number of resident transactions.
    pub size: usize,

    /// Maximum aggregate size of all resident transactions, counted over
    /// their raw bytes.
    pub max_txs_bytes: ByteSize,

    /// Maximum size of a single transaction. Larger submissions are refused
    /// outright, before any validator traffic.
    pub max_tx_bytes: ByteSize,

    /// Capacity of the recently-seen fingerprint cache and of the
    /// evicted-recently set. Zero disables both.
    pub cache_size: usize,

    /// Wall-clock time-to-live for resident transactions. Zero disables.
    /// Expiry is enforced lazily, on block commit.
    pub ttl_duration: Duration,

    /// Block-height time-to-live for resident transactions. Zero disables.
    pub ttl_num_blocks: u64,

    /// Whether admitted transactions are offered to the gossip layer. The
    /// mempool itself only records which peers delivered a transaction; the
    /// gossip reactor is a separate component.
    pub broadcast: bool,

    /// Whether resident transactions are re-validated after every block
    /// commit.
    pub recheck: bool,
}

impl Default for MempoolConfig {
    fn default() -> Self {
        Self {
            size: 5_000,
            max_txs_bytes: ByteSize::gib(1),
            max_tx_bytes: ByteSize::mib(1),
            cache_size: 10_000,
            ttl_duration: Duration::ZERO,
            ttl_num_blocks: 0,
            broadcast: true,
            recheck: true,
        }
    }
}
