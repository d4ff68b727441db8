pub mod mempool;
pub mod tx_index;

pub use mempool::Mempool;
