//! # Proof-of-Work Miner
//!
//! Turns a finished [`BlockTemplate`](crate::block::BlockTemplate) into a
//! sealed [`Block`](crate::block::Block) by searching the nonce space until
//! the header digest clears the difficulty target.
//!
//! ## Search procedure
//!
//! 1. Seed the header: `timestamp = now`, `nonce = 0`. Encode once, hash.
//! 2. While the digest misses the target: bump the nonce, patch its eight
//!    bytes into the encoded buffer, rehash. Nothing else in the buffer
//!    changes inside a sweep.
//! 3. If the nonce reaches `u64::MAX` without a winner, the sweep is
//!    exhausted: re-seed with a fresh timestamp and `nonce = 0`. The new
//!    timestamp shifts the whole search space, so exhaustion is transient
//!    and deliberately not an error. It is logged at warn level because a
//!    full sweep at sane difficulty means something odd is going on.
//! 4. On success the template is sealed with the exact header that hashed
//!    below target. `height` and `is_main_chain` are populated here and
//!    nowhere else.
//!
//! ## Cancellation
//!
//! The search is unbounded by design, so every entry point takes a
//! `tokio::sync::watch` receiver and checks it between nonce increments.
//! Sending `true` — or dropping the sender, when nobody is left to claim
//! the block — stops the search with [`MineError::Cancelled`]. The template
//! was consumed, its buffer is discarded, and no partially-mined state
//! escapes. Cancellation is the expected way to stop a miner, not a fault.
//!
//! [`Miner::spawn`] runs the search on the blocking thread pool and hands
//! back a [`MiningTask`] that owns the cancellation sender.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::block::{Block, BlockTemplate};
use crate::digest::{short_hex, Digest, DigestProvider};
use crate::header::BlockHeader;
use crate::params::MINING_LOG_INTERVAL;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tunable knobs for the mining loop.
#[derive(Debug, Clone)]
pub struct MinerConfig {
    /// Hash attempts between `debug!` progress events. Zero is treated
    /// as 1.
    pub progress_log_interval: u64,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            progress_log_interval: MINING_LOG_INTERVAL,
        }
    }
}

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Ways a mining attempt can end without a sealed block.
///
/// Exhausting the nonce space is absent on purpose: that restarts the
/// search internally and never surfaces.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MineError {
    /// The template never had its Merkle root committed. There is nothing
    /// coherent to hash, so this is caught before the first attempt.
    #[error("template has no committed merkle root, nothing to mine")]
    MissingMerkleRoot,

    /// The cancellation channel fired (or its sender vanished). The clean
    /// way to stop a miner, not a fault.
    #[error("mining cancelled before a winning nonce was found")]
    Cancelled,

    /// A spawned search ended without a verdict: the worker panicked or
    /// its task was aborted out from under it.
    #[error("mining worker stopped without producing a result")]
    WorkerLost,
}

// ---------------------------------------------------------------------------
// Difficulty check
// ---------------------------------------------------------------------------

/// Returns whether `digest` has at least `bits` leading zero bits.
///
/// Reads the digest as a big-endian bit string: the first `bits / 8` bytes
/// must be zero, and when `bits` is not byte-aligned the following byte
/// must fit in its remaining `8 - bits % 8` low bits. Callers guarantee
/// `0 < bits < 256`; templates cannot be built outside that range.
pub fn meets_target(digest: &Digest, bits: u32) -> bool {
    debug_assert!(
        crate::params::difficulty_in_range(bits),
        "difficulty {bits} outside (0, 256)"
    );

    let full_bytes = (bits / 8) as usize;
    if digest[..full_bytes].iter().any(|&byte| byte != 0) {
        return false;
    }

    let remainder_bits = bits % 8;
    if remainder_bits == 0 {
        return true;
    }

    // The boundary byte may use at most its low `8 - remainder_bits` bits.
    let limit = (1u16 << (8 - remainder_bits)) - 1;
    u16::from(digest[full_bytes]) <= limit
}

/// Counts the leading zero bits of a digest. Diagnostic companion to
/// [`meets_target`]; log lines report it so over- and near-target digests
/// are visible at a glance.
pub fn leading_zero_bits(digest: &Digest) -> u32 {
    let mut bits = 0;
    for &byte in digest {
        if byte == 0 {
            bits += 8;
        } else {
            bits += byte.leading_zeros();
            break;
        }
    }
    bits
}

// ---------------------------------------------------------------------------
// Miner
// ---------------------------------------------------------------------------

/// The nonce-search engine. Stateless between blocks: one miner can seal
/// any number of templates, sequentially or via spawned tasks.
#[derive(Debug, Clone)]
pub struct Miner<D> {
    provider: D,
    config: MinerConfig,
}

/// Outcome of one full-timestamp sweep of the nonce space.
enum SweepOutcome {
    /// A nonce cleared the target; the header and its digest are final.
    Sealed { header: BlockHeader, hash: Digest },
    /// All 2^64 nonces missed. The caller re-seeds the timestamp.
    Exhausted,
    /// The cancellation channel fired mid-sweep.
    Cancelled,
}

impl<D: DigestProvider> Miner<D> {
    /// Creates a miner over `provider` with default configuration.
    pub fn new(provider: D) -> Self {
        Self::with_config(provider, MinerConfig::default())
    }

    /// Creates a miner with explicit configuration.
    pub fn with_config(provider: D, config: MinerConfig) -> Self {
        Self { provider, config }
    }

    /// Runs the search to completion on the calling thread.
    ///
    /// Blocks until a winning nonce is found or `cancel` fires; at real
    /// difficulties that can be a very long time, so callers inside a
    /// runtime should prefer [`spawn`](Self::spawn). The template must
    /// have its Merkle root committed (which guarantees it holds at least
    /// one transaction).
    ///
    /// Returns the sealed block on success. The only error paths are the
    /// missing-root precondition and cancellation.
    pub fn mine(
        &self,
        template: BlockTemplate,
        cancel: watch::Receiver<bool>,
    ) -> Result<Block, MineError> {
        let merkle_root = template
            .merkle_root()
            .ok_or(MineError::MissingMerkleRoot)?;
        let bits = template.bits();

        info!(
            bits,
            txs = template.transaction_count(),
            parent_height = template.parent_height(),
            "mining started"
        );

        let started = Instant::now();
        let mut attempts: u64 = 0;

        loop {
            // Fresh seed per sweep: new wall-clock timestamp, nonce back
            // to zero.
            let seed = BlockHeader {
                version: template.version(),
                previous_hash: template.previous_hash(),
                merkle_root,
                bits,
                timestamp: unix_time_secs(),
                nonce: 0,
            };

            match self.sweep(seed, &cancel, &mut attempts) {
                SweepOutcome::Sealed { header, hash } => {
                    let block = template.seal(header, hash);
                    info!(
                        height = block.height,
                        nonce = header.nonce,
                        attempts,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        zero_bits = leading_zero_bits(&hash),
                        hash = %short_hex(&hash),
                        "block sealed"
                    );
                    return Ok(block);
                }
                SweepOutcome::Exhausted => {
                    warn!(
                        bits,
                        timestamp = seed.timestamp,
                        attempts,
                        "nonce space exhausted, re-seeding with a fresh timestamp"
                    );
                }
                SweepOutcome::Cancelled => {
                    debug!(
                        attempts,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "mining cancelled"
                    );
                    return Err(MineError::Cancelled);
                }
            }
        }
    }

    /// One sweep: hash `seed` as-is, then walk the nonce upward until a
    /// winner, exhaustion, or cancellation. `attempts` counts every digest
    /// computed, across sweeps.
    fn sweep(
        &self,
        mut header: BlockHeader,
        cancel: &watch::Receiver<bool>,
        attempts: &mut u64,
    ) -> SweepOutcome {
        let log_every = self.config.progress_log_interval.max(1);

        let mut buf = header.encode();
        let mut hash = self.provider.digest(&buf);
        *attempts += 1;

        loop {
            if meets_target(&hash, header.bits) {
                return SweepOutcome::Sealed { header, hash };
            }

            // A dropped sender means nobody is left to claim the block.
            if *cancel.borrow() || cancel.has_changed().is_err() {
                return SweepOutcome::Cancelled;
            }

            if header.nonce == u64::MAX {
                return SweepOutcome::Exhausted;
            }

            header.nonce += 1;
            BlockHeader::patch_nonce(&mut buf, header.nonce);
            hash = self.provider.digest(&buf);
            *attempts += 1;

            if *attempts % log_every == 0 {
                debug!(
                    attempts = *attempts,
                    nonce = header.nonce,
                    zero_bits = leading_zero_bits(&hash),
                    "mining in progress"
                );
            }
        }
    }
}

impl<D> Miner<D>
where
    D: DigestProvider + Clone + Send + 'static,
{
    /// Starts the search on tokio's blocking thread pool.
    ///
    /// The returned [`MiningTask`] owns the cancellation sender; dropping
    /// the task therefore cancels the search rather than leaving an
    /// orphaned worker grinding forever. Must be called from within a
    /// tokio runtime.
    pub fn spawn(&self, template: BlockTemplate) -> MiningTask {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let miner = self.clone();
        let handle = tokio::task::spawn_blocking(move || miner.mine(template, cancel_rx));

        MiningTask {
            cancel: cancel_tx,
            handle,
        }
    }
}

// ---------------------------------------------------------------------------
// MiningTask
// ---------------------------------------------------------------------------

/// Handle to a search running on the blocking pool: cancel it, poll it,
/// or await its verdict.
#[derive(Debug)]
pub struct MiningTask {
    cancel: watch::Sender<bool>,
    handle: tokio::task::JoinHandle<Result<Block, MineError>>,
}

impl MiningTask {
    /// Signals the worker to stop at its next iteration boundary. Safe to
    /// call more than once; a no-op if the search already finished.
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }

    /// Whether the worker has already returned (sealed or cancelled).
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the worker's verdict.
    pub async fn join(self) -> Result<Block, MineError> {
        match self.handle.await {
            Ok(result) => result,
            Err(_) => Err(MineError::WorkerLost),
        }
    }
}

/// Wall-clock seconds since the Unix epoch, the timestamp resolution of
/// the header format.
fn unix_time_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_secs()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
