//! Raw transactions and their content-addressed identity.
//!
//! A [`Transaction`] is an opaque byte string; the node never interprets the
//! payload. Identity is the SHA-256 digest of the raw bytes ([`TxId`]), so
//! equal ids denote identical transactions.
//!
//! Two envelope forms exist around raw transactions. A [`BlobTx`] couples a
//! transaction with the data blobs it pays for; the mempool stores the whole
//! envelope but keys it by the *inner* transaction. An [`IndexWrapper`] is
//! the form a blob transaction takes once a block producer has fixed the
//! shares its blobs occupy; block commits reference transactions in this
//! form. Both envelopes carry a marker prefix so that ordinary transactions
//! are never mistaken for them.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest as _;
use sha2::Sha256;

/// Marker prefix for serialized [`BlobTx`] envelopes.
const BLOB_TX_MARKER: &[u8] = b"MRDBLOB1";

/// Marker prefix for serialized [`IndexWrapper`] envelopes.
const INDEX_WRAPPER_MARKER: &[u8] = b"MRDINDX1";

/// Content-addressed identity of a transaction: the SHA-256 digest of its
/// raw bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxId([u8; Self::LEN]);

impl TxId {
    /// Digest width in bytes.
    pub const LEN: usize = 32;

    /// Compute the id of the given raw bytes.
    pub fn compute(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        Self(digest.into())
    }

    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }
}

impl From<[u8; TxId::LEN]> for TxId {
    fn from(bytes: [u8; TxId::LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({})", hex::encode(self.0))
    }
}

/// An opaque transaction payload, the unit of admission.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Transaction(Vec<u8>);

impl Transaction {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Identity of the raw bytes as submitted.
    pub fn id(&self) -> TxId {
        TxId::compute(&self.0)
    }

    /// Identity under which the mempool stores this transaction.
    ///
    /// For a [`BlobTx`] envelope this is the id of the inner transaction, so
    /// that the indexed form a block later commits resolves to the same
    /// entry. For everything else it is [`Transaction::id`].
    pub fn mempool_id(&self) -> TxId {
        match BlobTx::unmarshal(&self.0) {
            Some(blob_tx) => TxId::compute(&blob_tx.tx),
            None => self.id(),
        }
    }

    /// Identity a committed block entry resolves to.
    ///
    /// Block producers commit blob transactions in their [`IndexWrapper`]
    /// form; stripping the wrapper recovers the inner transaction whose id
    /// the mempool indexed at admission.
    pub fn committed_id(&self) -> TxId {
        match IndexWrapper::unmarshal(&self.0) {
            Some(wrapper) => TxId::compute(&wrapper.tx),
            None => self.id(),
        }
    }
}

impl From<&[u8]> for Transaction {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<Vec<u8>> for Transaction {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&str> for Transaction {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl AsRef<[u8]> for Transaction {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Payloads are opaque and possibly large; show the identity instead.
        write!(f, "Transaction({}, {} bytes)", self.id(), self.len())
    }
}

/// A data blob paid for by a transaction.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct Blob {
    pub namespace: Vec<u8>,
    pub data: Vec<u8>,
    pub share_version: u32,
}

/// A transaction coupled with the blobs it pays for.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct BlobTx {
    /// The inner transaction; its id is the envelope's mempool identity.
    pub tx: Vec<u8>,
    pub blobs: Vec<Blob>,
}

impl BlobTx {
    pub fn new(tx: Vec<u8>, blobs: Vec<Blob>) -> Self {
        Self { tx, blobs }
    }

    /// Serialize with the blob-envelope marker prefix.
    pub fn marshal(&self) -> Vec<u8> {
        marshal_with_marker(BLOB_TX_MARKER, self)
    }

    /// Parse an envelope, returning `None` for ordinary transactions.
    pub fn unmarshal(bytes: &[u8]) -> Option<Self> {
        unmarshal_with_marker(BLOB_TX_MARKER, bytes)
    }
}

/// A blob transaction with its block share positions fixed.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct IndexWrapper {
    /// The inner transaction, as it was keyed at admission.
    pub tx: Vec<u8>,
    pub share_indexes: Vec<u32>,
}

impl IndexWrapper {
    pub fn new(tx: Vec<u8>, share_indexes: Vec<u32>) -> Self {
        Self { tx, share_indexes }
    }

    /// Serialize with the index-wrapper marker prefix.
    pub fn marshal(&self) -> Vec<u8> {
        marshal_with_marker(INDEX_WRAPPER_MARKER, self)
    }

    /// Parse a wrapper, returning `None` for ordinary transactions.
    pub fn unmarshal(bytes: &[u8]) -> Option<Self> {
        unmarshal_with_marker(INDEX_WRAPPER_MARKER, bytes)
    }
}

fn marshal_with_marker<T: bincode::Encode>(marker: &[u8], value: &T) -> Vec<u8> {
    let mut out = marker.to_vec();
    let body = bincode::encode_to_vec(value, bincode::config::standard())
        .expect("encoding in-memory envelope cannot fail");
    out.extend_from_slice(&body);
    out
}

fn unmarshal_with_marker<T: bincode::Decode<()>>(marker: &[u8], bytes: &[u8]) -> Option<T> {
    let body = bytes.strip_prefix(marker)?;
    let (value, consumed) = bincode::decode_from_slice(body, bincode::config::standard()).ok()?;
    // Trailing garbage means this was not a well-formed envelope.
    (consumed == body.len()).then_some(value)
}
