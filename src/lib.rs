//! Meridian node fragment: the priority transaction mempool and the state it
//! hangs off of.
//!
//! The heart of this crate is [`state::mempool::Mempool`], an in-memory,
//! size- and byte-bounded staging area for pending transactions. Admission
//! goes through an external validator (see [`protocol::validator`]), room is
//! made by evicting lower-priority entries, and the consensus layer drains
//! the pool once per committed block while holding the pool's lock.
//!
//! Everything else a full node would carry — gossip, RPC, block storage —
//! lives behind the narrow collaborator interfaces in [`state::tx_index`]
//! and [`protocol::validator`].

pub mod application;
pub mod protocol;
pub mod state;
