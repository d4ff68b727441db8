//! An implementation of a mempool to stage pending transactions between
//! admission and block inclusion.
//!
//! The implementation maintains a mapping called `txs` between transaction
//! ids and the full admission records, as well as a double-ended priority
//! queue called `priority_index` containing sorted pairs of transaction ids
//! and admission priorities. The `txs` table provides fast random lookups,
//! while `priority_index` keeps ids ordered by priority. We are usually
//! interested in the transaction with either the highest priority (block
//! construction) or the lowest (eviction).
//!
//! Admission is driven by an external validator (see
//! [`crate::protocol::validator`]): the mempool performs its cheap local
//! checks under its lock, releases the lock for the validator round-trip,
//! then re-acquires it to insert or reject. The consensus layer takes the
//! same lock once per committed block, via [`Mempool::lock_guard_mut`], and
//! calls [`MempoolState::update`] while holding it.

pub mod mempool_error;
mod seen_cache;

use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use priority_queue::DoublePriorityQueue;
use tokio::sync::Mutex;
use tokio::sync::MutexGuard;
use tokio::sync::Notify;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use crate::application::config::MempoolConfig;
use crate::protocol::transaction::Transaction;
use crate::protocol::transaction::TxId;
use crate::protocol::validator::CheckTxResponse;
use crate::protocol::validator::TxValidator;
use crate::protocol::validator::CODE_OK;
use crate::state::mempool::mempool_error::MempoolError;
use crate::state::mempool::seen_cache::SeenTxCache;
use crate::state::tx_index::TxIndexError;
use crate::state::tx_index::TxIndexReader;

/// Admission-time hook run on the raw bytes before the validator is asked.
pub type PreCheckFn = Arc<dyn Fn(&Transaction) -> Result<(), String> + Send + Sync>;

/// Admission-time hook run on the validator's response. An error converts an
/// otherwise acceptable verdict into a rejection.
pub type PostCheckFn = Arc<dyn Fn(&Transaction, &CheckTxResponse) -> Result<(), String> + Send + Sync>;

/// Completion callback for one admission. Invoked exactly once, after all
/// state transitions for the admission have been applied.
pub type CheckTxCallback = Box<dyn FnOnce(CheckTxOutcome) + Send + 'static>;

/// Gossip-layer metadata accompanying a submitted transaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct TxInfo {
    /// Identifier of the peer that delivered the transaction; 0 for local
    /// submissions.
    pub sender_id: u16,
}

/// What an admission callback observes: the validator's response plus any
/// rejection the mempool itself produced after the verdict came back.
#[derive(Debug, Clone)]
pub struct CheckTxOutcome {
    pub response: CheckTxResponse,
    pub mempool_error: Option<MempoolError>,
}

/// Where a transaction stands from a client's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    /// Never seen, or seen so long ago that all record of it is gone.
    Unknown,
    /// Resident in the mempool, awaiting inclusion.
    Pending,
    /// Dropped by the mempool: evicted for room, expired, or rejected.
    Evicted,
    /// Included in a committed block.
    Committed { height: u64, index: u32 },
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unknown => "UNKNOWN",
            Self::Pending => "PENDING",
            Self::Evicted => "EVICTED",
            Self::Committed { .. } => "COMMITTED",
        };
        write!(f, "{s}")
    }
}

/// A resident transaction together with the admission metadata the mempool
/// tracks for it.
#[derive(Debug, Clone)]
struct MempoolTransaction {
    tx: Transaction,

    /// The validator-assigned preference; higher is better.
    priority: i64,

    /// Validator-reported originator. Empty means "no sender"; a non-empty
    /// sender is limited to one resident transaction.
    sender: String,

    /// Gas the transaction expects to consume, counted against reap budgets.
    gas_wanted: i64,

    /// When the entry was admitted. Drives the wall-clock TTL.
    admitted_at: Instant,

    /// Mempool height at admission. Drives the block-count TTL.
    height: u64,

    /// Admission sequence number, the tie-breaker among equal priorities.
    seq: u64,

    /// Peers known to have delivered this transaction, so the gossip layer
    /// can avoid echoing it back.
    peers: HashSet<u16>,
}

/// Ordering key for the priority index.
///
/// Among equal priorities, older admissions order *above* newer ones. One
/// comparator then serves both scan directions: ascending traversal visits
/// the lowest priority first with the newest first among equals (eviction
/// order), and descending traversal visits the highest priority first with
/// the oldest first among equals (reap order).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TxPriority {
    priority: i64,
    seq: u64,
}

impl Ord for TxPriority {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for TxPriority {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Handle to the shared mempool.
///
/// Cheap to clone; all clones refer to the same pool. Admission
/// ([`Mempool::check_tx`]) manages the internal lock itself, releasing it
/// around the validator round-trip. The consensus layer instead takes the
/// lock explicitly with [`Mempool::lock_guard_mut`] and drives
/// [`MempoolState::update`] under it, so that no admission can interleave
/// with a block commit.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use async_trait::async_trait;
/// use meridian_core::application::config::MempoolConfig;
/// use meridian_core::protocol::transaction::Transaction;
/// use meridian_core::protocol::validator::CheckTxResponse;
/// use meridian_core::protocol::validator::TxValidator;
/// use meridian_core::protocol::validator::CODE_OK;
/// use meridian_core::state::mempool::Mempool;
/// use meridian_core::state::mempool::TxInfo;
///
/// struct FlatFeeValidator;
///
/// #[async_trait]
/// impl TxValidator for FlatFeeValidator {
///     async fn check_tx(&self, _tx: &Transaction) -> CheckTxResponse {
///         CheckTxResponse {
///             code: CODE_OK,
///             priority: 10,
///             gas_wanted: 1,
///             ..Default::default()
///         }
///     }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let mempool = Mempool::new(MempoolConfig::default(), Arc::new(FlatFeeValidator));
///     mempool
///         .check_tx(Transaction::from("pay alice 5"), None, TxInfo::default())
///         .await
///         .unwrap();
///     assert_eq!(1, mempool.size().await);
/// }
/// ```
#[derive(Clone)]
pub struct Mempool {
    state: Arc<Mutex<MempoolState>>,
    validator: Arc<dyn TxValidator>,
    tx_index: Option<Arc<dyn TxIndexReader>>,
    txs_available: Arc<Notify>,
}

impl Mempool {
    /// Instantiate a new, empty mempool fed by the given validator.
    pub fn new(config: MempoolConfig, validator: Arc<dyn TxValidator>) -> Self {
        let txs_available = Arc::new(Notify::new());
        let cache_size = config.cache_size;
        let state = MempoolState {
            config,
            validator: validator.clone(),
            txs: HashMap::new(),
            priority_index: DoublePriorityQueue::new(),
            senders: HashMap::new(),
            size_bytes: 0,
            height: 0,
            admission_seq: 0,
            seen_cache: SeenTxCache::new(cache_size),
            evicted_cache: SeenTxCache::new(cache_size),
            pre_check: None,
            post_check: None,
            txs_available: txs_available.clone(),
            txs_available_enabled: false,
            notified_txs_available: false,
        };

        Self {
            state: Arc::new(Mutex::new(state)),
            validator,
            tx_index: None,
            txs_available,
        }
    }

    /// Install an admission pre-check hook. Construction-time only: must be
    /// called before the handle is cloned.
    pub fn with_pre_check(mut self, pre_check: PreCheckFn) -> Self {
        self.state_mut().pre_check = Some(pre_check);
        self
    }

    /// Install an admission post-check hook. Construction-time only.
    pub fn with_post_check(mut self, post_check: PostCheckFn) -> Self {
        self.state_mut().post_check = Some(post_check);
        self
    }

    /// Attach the committed-transaction index consulted by
    /// [`Mempool::status`]. Construction-time only.
    pub fn with_tx_index(mut self, tx_index: Arc<dyn TxIndexReader>) -> Self {
        self.tx_index = Some(tx_index);
        self
    }

    /// Start the height counter at the given block height, for nodes joining
    /// mid-chain. Construction-time only.
    pub fn at_height(mut self, height: u64) -> Self {
        self.state_mut().height = height;
        self
    }

    fn state_mut(&mut self) -> &mut MempoolState {
        Arc::get_mut(&mut self.state)
            .expect("construction-time builder called after the handle was cloned")
            .get_mut()
    }

    /// Acquire the pool's exclusive lock. The consensus layer brackets
    /// [`MempoolState::update`] and its proposal reaps with this guard; the
    /// lock is released when the guard drops, on every exit path.
    pub async fn lock_guard_mut(&self) -> MutexGuard<'_, MempoolState> {
        self.state.lock().await
    }

    /// Admit a candidate transaction.
    ///
    /// Performs the cheap local checks under the lock, consults the
    /// validator with the lock released, then re-acquires the lock to insert
    /// or reject. Size violations, duplicate peer deliveries, and pre-check
    /// failures are returned synchronously; everything downstream of the
    /// validator's verdict is reported through `callback`, which runs
    /// exactly once after all state transitions for this admission.
    ///
    /// A transaction already in the fingerprint cache short-circuits with
    /// `Ok` and no validator round-trip; its callback is not invoked.
    pub async fn check_tx(
        &self,
        tx: Transaction,
        callback: Option<CheckTxCallback>,
        tx_info: TxInfo,
    ) -> Result<(), MempoolError> {
        let tx_id = tx.mempool_id();

        {
            let mut state = self.state.lock().await;

            let max_tx_bytes = state.config.max_tx_bytes.as_u64();
            if tx.len() as u64 > max_tx_bytes {
                return Err(MempoolError::TxTooLarge {
                    max: max_tx_bytes,
                    actual: tx.len() as u64,
                });
            }

            if let Some(pre_check) = &state.pre_check {
                pre_check.as_ref()(&tx).map_err(MempoolError::PreCheck)?;
            }

            if !state.seen_cache.push(tx_id) {
                // Seen recently: skip revalidation. Record the new peer on
                // the resident entry, and refuse outright if this peer has
                // already delivered the same transaction.
                if let Some(entry) = state.txs.get_mut(&tx_id) {
                    if !entry.peers.insert(tx_info.sender_id) {
                        return Err(MempoolError::DuplicatePeer {
                            peer_id: tx_info.sender_id,
                            tx_id,
                        });
                    }
                }
                return Ok(());
            }
        }

        // The validator round-trip happens without the lock; concurrent
        // admissions and commits may interleave here.
        let response = self.validator.check_tx(&tx).await;

        let mempool_error = {
            let mut state = self.state.lock().await;
            state.add_new_transaction(tx, tx_id, &response, &tx_info)
        };

        if let Some(callback) = callback {
            callback(CheckTxOutcome {
                response,
                mempool_error,
            });
        }

        Ok(())
    }

    /// Where the given transaction stands: committed per the block store,
    /// resident, recently dropped, or unknown.
    pub async fn status(&self, tx_id: &TxId) -> TxStatus {
        if let Some(tx_index) = &self.tx_index {
            match tx_index.load_tx_info(tx_id) {
                Ok(Some(info)) => {
                    return TxStatus::Committed {
                        height: info.height,
                        index: info.index,
                    }
                }
                Ok(None) | Err(TxIndexError::NotFound(_)) => {}
                Err(TxIndexError::IndexingDisabled) => {
                    trace!("transaction index disabled; status falls back to mempool state");
                }
            }
        }

        let state = self.state.lock().await;
        if state.txs.contains_key(tx_id) {
            TxStatus::Pending
        } else if state.evicted_cache.contains(tx_id) {
            TxStatus::Evicted
        } else {
            TxStatus::Unknown
        }
    }

    /// Arm the availability signal. Until this is called, transitions to
    /// non-empty fire nothing.
    pub async fn enable_txs_available(&self) {
        self.state.lock().await.txs_available_enabled = true;
    }

    /// The availability notifier. Fires at most once per block height when
    /// the pool holds transactions; a missed wake-up only delays the next
    /// poll, so consumers should treat it as a hint.
    pub fn txs_available(&self) -> Arc<Notify> {
        self.txs_available.clone()
    }

    /// Number of resident transactions.
    pub async fn size(&self) -> usize {
        self.state.lock().await.len()
    }

    /// Total raw bytes of resident transactions.
    pub async fn size_bytes(&self) -> u64 {
        self.state.lock().await.size_bytes()
    }

    /// Whether the given transaction is resident.
    pub async fn contains(&self, tx_id: &TxId) -> bool {
        self.state.lock().await.contains(tx_id)
    }

    /// Snapshot of the highest-priority transactions fitting the given byte
    /// and gas budgets. See [`MempoolState::transactions_for_block`].
    pub async fn transactions_for_block(&self, max_bytes: i64, max_gas: i64) -> Vec<Transaction> {
        self.state
            .lock()
            .await
            .transactions_for_block(max_bytes, max_gas)
    }

    /// Snapshot of the `max` highest-priority transactions. See
    /// [`MempoolState::transactions_by_priority`].
    pub async fn transactions_by_priority(&self, max: i64) -> Vec<Transaction> {
        self.state.lock().await.transactions_by_priority(max)
    }
}

/// The lock-protected core of the mempool: primary store, sender index,
/// priority order, caches, and the availability latch.
pub struct MempoolState {
    config: MempoolConfig,
    validator: Arc<dyn TxValidator>,

    /// Primary store, one record per resident transaction.
    txs: HashMap<TxId, MempoolTransaction>,

    /// Secondary order over exactly the keys of `txs`.
    priority_index: DoublePriorityQueue<TxId, TxPriority>,

    /// Non-empty senders of resident transactions, at most one entry each.
    senders: HashMap<String, TxId>,

    /// Sum of raw byte lengths over `txs`.
    size_bytes: u64,

    /// Height of the last committed block this pool has seen.
    height: u64,

    /// Monotonic admission counter; breaks priority ties.
    admission_seq: u64,

    /// Recently seen transaction ids; short-circuits revalidation.
    seen_cache: SeenTxCache,

    /// Ids this mempool evicted or rejected, for status reporting.
    evicted_cache: SeenTxCache,

    pre_check: Option<PreCheckFn>,
    post_check: Option<PostCheckFn>,

    txs_available: Arc<Notify>,
    txs_available_enabled: bool,
    /// Set once the signal has fired for the current height.
    notified_txs_available: bool,
}

impl fmt::Debug for MempoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MempoolState")
            .field("len", &self.txs.len())
            .field("size_bytes", &self.size_bytes)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl MempoolState {
    /// Number of resident transactions. Computes in O(1).
    pub fn len(&self) -> usize {
        self.txs.len()
    }

    /// Check if the pool is empty. Computes in O(1).
    pub fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }

    /// Total raw bytes of resident transactions. Computes in O(1).
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Height of the last committed block applied to this pool.
    pub fn height(&self) -> u64 {
        self.height
    }

    /// Check if a transaction is resident. Computes in O(1).
    pub fn contains(&self, tx_id: &TxId) -> bool {
        self.txs.contains_key(tx_id)
    }

    /// Fetch a resident transaction. Computes in O(1).
    pub fn get_tx(&self, tx_id: &TxId) -> Option<&Transaction> {
        self.txs.get(tx_id).map(|entry| &entry.tx)
    }

    /// Whether this pool recently dropped the given transaction, for any
    /// reason: eviction under pressure, TTL expiry, or rejection.
    pub fn was_recently_evicted(&self, tx_id: &TxId) -> bool {
        self.evicted_cache.contains(tx_id)
    }

    /// Return copies of the highest-priority transactions whose cumulative
    /// raw size fits `max_bytes` and whose cumulative gas fits `max_gas`
    /// (negative budgets are unlimited). An entry that would overflow either
    /// budget is skipped and the walk continues, so one oversized
    /// transaction does not cut the result short. Among equal priorities,
    /// older admissions come first.
    pub fn transactions_for_block(&self, max_bytes: i64, max_gas: i64) -> Vec<Transaction> {
        let mut total_bytes: i64 = 0;
        let mut total_gas: i64 = 0;
        let mut keep = vec![];

        for (tx_id, _priority) in self.priority_index.clone().into_sorted_iter().rev() {
            let entry = &self.txs[&tx_id];
            if max_gas >= 0 && total_gas + entry.gas_wanted > max_gas {
                continue;
            }
            if max_bytes >= 0 && total_bytes + entry.tx.len() as i64 > max_bytes {
                continue;
            }
            total_gas += entry.gas_wanted;
            total_bytes += entry.tx.len() as i64;
            keep.push(entry.tx.clone());
        }

        keep
    }

    /// Return copies of the first `max` transactions in descending priority
    /// order; `-1` returns all. Among equal priorities, older admissions
    /// come first.
    pub fn transactions_by_priority(&self, max: i64) -> Vec<Transaction> {
        let limit = if max < 0 { self.txs.len() } else { max as usize };
        self.priority_index
            .clone()
            .into_sorted_iter()
            .rev()
            .take(limit)
            .map(|(tx_id, _)| self.txs[&tx_id].tx.clone())
            .collect()
    }

    /// Apply a committed block.
    ///
    /// Removes the committed transactions, optionally revalidates the
    /// survivors, prunes expired entries, and re-arms the availability
    /// signal for the new height. The caller holds the pool's lock for the
    /// whole call (see [`Mempool::lock_guard_mut`]); admissions cannot
    /// interleave. Called exactly once per committed block, with the per-tx
    /// execution result codes in block order. Replacement pre/post-check
    /// hooks take effect for subsequent admissions and rechecks.
    pub async fn update(
        &mut self,
        block_height: u64,
        block_txs: &[Transaction],
        tx_results: &[u32],
        pre_check: Option<PreCheckFn>,
        post_check: Option<PostCheckFn>,
    ) {
        if block_txs.len() != tx_results.len() {
            warn!(
                txs = block_txs.len(),
                results = tx_results.len(),
                "block commit with mismatched result count; extra entries ignored"
            );
        }

        self.height = block_height;
        self.notified_txs_available = false;

        if let Some(pre_check) = pre_check {
            self.pre_check = Some(pre_check);
        }
        if let Some(post_check) = post_check {
            self.post_check = Some(post_check);
        }

        for (tx, code) in block_txs.iter().zip(tx_results) {
            let tx_id = tx.committed_id();
            if *code == CODE_OK {
                // Suppress near-term resubmission of what was just
                // committed.
                self.seen_cache.push(tx_id);
            } else {
                // A failed transaction may be corrected and resubmitted.
                self.seen_cache.remove(&tx_id);
            }
            if self.remove_tx(&tx_id).is_some() {
                trace!(%tx_id, "removed committed transaction");
            }
        }

        if self.config.recheck && !self.txs.is_empty() {
            self.recheck_residents().await;
        }

        self.prune_expired_txs(block_height);

        self.notify_if_txs_available();
    }

    /// Delete all resident transactions and reset both caches.
    pub fn flush(&mut self) {
        self.txs.clear();
        self.priority_index.clear();
        self.senders.clear();
        self.size_bytes = 0;
        self.seen_cache.clear();
        self.evicted_cache.clear();
    }

    /// Second half of admission, entered with the validator's verdict in
    /// hand. Returns the rejection to report through the caller's callback,
    /// if any.
    fn add_new_transaction(
        &mut self,
        tx: Transaction,
        tx_id: TxId,
        response: &CheckTxResponse,
        tx_info: &TxInfo,
    ) -> Option<MempoolError> {
        let post_check_error = self
            .post_check
            .as_ref()
            .and_then(|post_check| post_check.as_ref()(&tx, response).err());

        if !response.is_ok() || post_check_error.is_some() {
            debug!(%tx_id, code = response.code, "refused transaction");
            self.seen_cache.remove(&tx_id);
            self.evicted_cache.push(tx_id);
            return Some(match post_check_error {
                Some(message) => MempoolError::PostCheck(message),
                None => MempoolError::Rejected {
                    code: response.code,
                    log: response.log.clone(),
                },
            });
        }

        // A racing admission of the same transaction may have inserted it
        // while the validator was running; treat this arrival as a
        // duplicate delivery.
        if let Some(entry) = self.txs.get_mut(&tx_id) {
            entry.peers.insert(tx_info.sender_id);
            return None;
        }

        if !response.sender.is_empty() && self.senders.contains_key(&response.sender) {
            debug!(%tx_id, sender = %response.sender, "sender already has a transaction in flight");
            self.evicted_cache.push(tx_id);
            return Some(MempoolError::SenderInFlight {
                sender: response.sender.clone(),
            });
        }

        let tx_len = tx.len() as u64;
        if !self.can_fit(tx_len) && !self.try_make_room(tx_len, response.priority) {
            debug!(%tx_id, priority = response.priority, "no room in the mempool");
            self.evicted_cache.push(tx_id);
            return Some(MempoolError::Full {
                num_txs: self.txs.len(),
                size_bytes: self.size_bytes,
            });
        }

        self.insert_entry(tx, tx_id, response, tx_info.sender_id);
        None
    }

    fn can_fit(&self, tx_len: u64) -> bool {
        self.txs.len() < self.config.size
            && self.size_bytes + tx_len <= self.config.max_txs_bytes.as_u64()
    }

    /// Evict lower-priority residents until the admission's byte and slot
    /// deficits against the pool limits are both covered. Candidates are
    /// every resident with priority strictly below `priority`, taken in
    /// ascending priority order, newest first among equals; the walk stops
    /// as soon as both deficits are met, so entries the limits do not force
    /// out survive. If the whole candidate set cannot cover both deficits,
    /// nothing is evicted and the incoming transaction loses.
    fn try_make_room(&mut self, tx_len: u64, priority: i64) -> bool {
        let max_txs_bytes = self.config.max_txs_bytes.as_u64();
        if tx_len > max_txs_bytes {
            return false;
        }

        let byte_deficit = (self.size_bytes + tx_len).saturating_sub(max_txs_bytes);
        let slot_deficit = (self.txs.len() + 1).saturating_sub(self.config.size);

        let mut victims = vec![];
        let mut victim_bytes: u64 = 0;
        for (tx_id, tx_priority) in self.priority_index.clone().into_sorted_iter() {
            if tx_priority.priority >= priority {
                break;
            }
            victim_bytes += self.txs[&tx_id].tx.len() as u64;
            victims.push(tx_id);
        }
        if victim_bytes < byte_deficit || victims.len() < slot_deficit {
            return false;
        }

        let mut freed_bytes: u64 = 0;
        let mut freed_slots: usize = 0;
        for tx_id in victims {
            if freed_bytes >= byte_deficit && freed_slots >= slot_deficit {
                break;
            }
            let entry = self
                .remove_tx(&tx_id)
                .expect("victim was just read from the priority index");
            debug!(%tx_id, priority = entry.priority, "evicting transaction to make room");
            self.seen_cache.remove(&tx_id);
            self.evicted_cache.push(tx_id);
            freed_bytes += entry.tx.len() as u64;
            freed_slots += 1;
        }
        true
    }

    fn insert_entry(
        &mut self,
        tx: Transaction,
        tx_id: TxId,
        response: &CheckTxResponse,
        peer_id: u16,
    ) {
        self.admission_seq += 1;
        let seq = self.admission_seq;

        let entry = MempoolTransaction {
            priority: response.priority,
            sender: response.sender.clone(),
            gas_wanted: response.gas_wanted.max(0),
            admitted_at: Instant::now(),
            height: self.height,
            seq,
            peers: HashSet::from([peer_id]),
            tx,
        };

        trace!(%tx_id, priority = entry.priority, bytes = entry.tx.len(), "admitted transaction");

        // A re-admitted transaction is no longer "recently dropped".
        self.evicted_cache.remove(&tx_id);

        self.size_bytes += entry.tx.len() as u64;
        if !entry.sender.is_empty() {
            self.senders.insert(entry.sender.clone(), tx_id);
        }
        self.priority_index.push(tx_id, TxPriority { priority: entry.priority, seq });
        self.txs.insert(tx_id, entry);

        assert_eq!(
            self.txs.len(),
            self.priority_index.len(),
            "mempool store and priority index must agree after insert"
        );

        self.notify_if_txs_available();
    }

    /// Remove a transaction from the store and every index. Does nothing if
    /// the transaction is not resident.
    fn remove_tx(&mut self, tx_id: &TxId) -> Option<MempoolTransaction> {
        let entry = self.txs.remove(tx_id)?;
        self.priority_index.remove(tx_id);
        if !entry.sender.is_empty() && self.senders.get(&entry.sender) == Some(tx_id) {
            self.senders.remove(&entry.sender);
        }
        self.size_bytes -= entry.tx.len() as u64;
        debug_assert_eq!(self.txs.len(), self.priority_index.len());
        Some(entry)
    }

    /// Re-run the validator over every resident transaction, dropping the
    /// ones whose verdict has soured since admission.
    async fn recheck_residents(&mut self) {
        let validator = self.validator.clone();
        let snapshot: Vec<(TxId, Transaction)> = self
            .txs
            .iter()
            .map(|(tx_id, entry)| (*tx_id, entry.tx.clone()))
            .collect();

        for (tx_id, tx) in snapshot {
            let response = validator.recheck_tx(&tx).await;
            let post_check_failed = self
                .post_check
                .as_ref()
                .is_some_and(|post_check| post_check.as_ref()(&tx, &response).is_err());
            if response.is_ok() && !post_check_failed {
                continue;
            }
            if self.remove_tx(&tx_id).is_some() {
                debug!(%tx_id, code = response.code, "recheck dropped transaction");
                self.seen_cache.remove(&tx_id);
                self.evicted_cache.push(tx_id);
            }
        }
    }

    /// Drop residents that have outlived either TTL. Expiry is evaluated
    /// here, on block commit, not on a timer.
    fn prune_expired_txs(&mut self, block_height: u64) {
        let ttl_blocks = self.config.ttl_num_blocks;
        let ttl_duration = self.config.ttl_duration;
        if ttl_blocks == 0 && ttl_duration.is_zero() {
            return;
        }

        let now = Instant::now();
        let expired: Vec<TxId> = self
            .txs
            .iter()
            .filter(|(_, entry)| {
                (ttl_blocks > 0 && block_height.saturating_sub(entry.height) >= ttl_blocks)
                    || (!ttl_duration.is_zero()
                        && now.duration_since(entry.admitted_at) >= ttl_duration)
            })
            .map(|(tx_id, _)| *tx_id)
            .collect();

        for tx_id in expired {
            debug!(%tx_id, "pruned expired transaction");
            self.remove_tx(&tx_id);
            self.seen_cache.remove(&tx_id);
            self.evicted_cache.push(tx_id);
        }
    }

    /// Fire the availability signal if armed, the pool is non-empty, and it
    /// has not already fired for the current height.
    fn notify_if_txs_available(&mut self) {
        if self.txs_available_enabled && !self.notified_txs_available && !self.txs.is_empty() {
            self.notified_txs_available = true;
            self.txs_available.notify_one();
        }
    }
}
