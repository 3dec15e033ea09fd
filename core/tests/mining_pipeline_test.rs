//! Integration tests for the block pipeline.
//!
//! These tests exercise the full path across module boundaries the way an
//! embedding node would drive it: drain a transaction pool into a
//! template, commit the Merkle root, mine, validate, ship the block over
//! a wire, and extend the chain on top of it.

use lode_core::block::{Block, BlockTemplate};
use lode_core::digest::{Sha256Engine, ZERO_DIGEST};
use lode_core::merkle::transaction_root;
use lode_core::miner::{meets_target, Miner};
use lode_core::params::MAX_BLOCK_TRANSACTIONS;
use lode_core::transaction::{FifoPool, Transaction};
use lode_core::validate::{ValidationError, Validator};

/// Helper: a pool holding `count` transactions with distinct payloads.
fn seeded_pool(count: usize) -> FifoPool {
    let mut pool = FifoPool::new();
    for i in 0..count {
        pool.push(Transaction::new(
            &Sha256Engine,
            format!("transfer #{i}").into_bytes(),
        ));
    }
    pool
}

/// Helper: drains the pool into a fresh template on `parent` and mines it.
fn mine_next(parent: Option<&Block>, pool: &mut FifoPool, bits: u32) -> Block {
    let mut template = match parent {
        Some(parent) => BlockTemplate::extending(parent, bits).unwrap(),
        None => BlockTemplate::genesis(bits).unwrap(),
    };
    template.drain_pool(pool).unwrap();
    template.commit_merkle_root(&Sha256Engine).unwrap();

    let (_cancel, rx) = tokio::sync::watch::channel(false);
    Miner::new(Sha256Engine).mine(template, rx).unwrap()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ---------------------------------------------------------------------------
// Full Pipeline
// ---------------------------------------------------------------------------

#[test]
fn pool_to_sealed_genesis() {
    init_tracing();
    let mut pool = seeded_pool(5);

    // 1. Drain the pool into a genesis template.
    let mut template = BlockTemplate::genesis(8).unwrap();
    let taken = template.drain_pool(&mut pool).unwrap();
    assert_eq!(taken, 5);
    assert!(pool.is_empty());

    // 2. Commit the root and mine.
    template.commit_merkle_root(&Sha256Engine).unwrap();
    let (_cancel, rx) = tokio::sync::watch::channel(false);
    let block = Miner::new(Sha256Engine).mine(template, rx).unwrap();

    // 3. The sealed block carries everything the chain needs.
    assert_eq!(block.height, 0);
    assert!(block.is_genesis());
    assert_eq!(block.header.previous_hash, ZERO_DIGEST);
    assert!(block.is_main_chain);
    assert_eq!(block.tx_count(), 5);
    assert!(meets_target(&block.hash, 8));

    // 4. Pool order survived intact: first in, first committed.
    for (i, tx) in block.transactions.iter().enumerate() {
        assert_eq!(tx.payload, format!("transfer #{i}").into_bytes());
    }

    // 5. An independent validator agrees.
    let report = Validator::new(Sha256Engine).validate(&block, None);
    assert!(report.is_valid());
}

#[test]
fn chain_of_three_blocks() {
    init_tracing();
    let mut pool = seeded_pool(9);
    let validator = Validator::new(Sha256Engine);

    // Difficulty varies per block; linkage must not care.
    let genesis = mine_next(None, &mut pool, 8);
    let second = mine_next(Some(&genesis), &mut pool, 4);
    let third = mine_next(Some(&second), &mut pool, 12);

    assert_eq!(genesis.height, 0);
    assert_eq!(second.height, 1);
    assert_eq!(third.height, 2);

    assert_eq!(second.header.previous_hash, genesis.hash);
    assert_eq!(third.header.previous_hash, second.hash);

    assert!(validator.validate(&genesis, None).is_valid());
    assert!(validator.validate(&second, Some(&genesis)).is_valid());
    assert!(validator.validate(&third, Some(&second)).is_valid());

    // Each block cleared its own target.
    assert!(meets_target(&genesis.hash, 8));
    assert!(meets_target(&second.hash, 4));
    assert!(meets_target(&third.hash, 12));
}

#[test]
fn intake_is_capped_per_block() {
    let mut pool = seeded_pool(MAX_BLOCK_TRANSACTIONS + 6);

    let mut template = BlockTemplate::genesis(8).unwrap();
    let taken = template.drain_pool(&mut pool).unwrap();

    // The template fills to capacity; the overflow stays pooled for the
    // next block.
    assert_eq!(taken, MAX_BLOCK_TRANSACTIONS);
    assert_eq!(template.transaction_count(), MAX_BLOCK_TRANSACTIONS);
    assert_eq!(pool.len(), 6);
}

// ---------------------------------------------------------------------------
// Wire Transfer
// ---------------------------------------------------------------------------

#[test]
fn mined_block_survives_the_wire() {
    init_tracing();
    let mut pool = seeded_pool(3);
    let block = mine_next(None, &mut pool, 8);

    let json = serde_json::to_string(&block).unwrap();
    let restored: Block = serde_json::from_str(&json).unwrap();

    assert_eq!(restored, block);
    assert!(Validator::new(Sha256Engine)
        .validate(&restored, None)
        .is_valid());
}

#[test]
fn tampering_after_the_wire_is_caught() {
    init_tracing();
    let mut pool = seeded_pool(4);
    let genesis = mine_next(None, &mut pool, 8);

    let mut second_pool = seeded_pool(4);
    let block = mine_next(Some(&genesis), &mut second_pool, 8);

    let json = serde_json::to_string(&block).unwrap();
    let mut restored: Block = serde_json::from_str(&json).unwrap();

    // A relay swaps one transaction for its own.
    restored.transactions[2] = Transaction::new(&Sha256Engine, b"skimmed".to_vec());

    let report = Validator::new(Sha256Engine).validate(&restored, Some(&genesis));
    assert!(!report.is_valid());
    assert_eq!(report.errors(), &[ValidationError::MerkleRootMismatch]);

    // The recomputed root names the real list, not the forged one.
    let honest_root = transaction_root(&Sha256Engine, &block.transactions).unwrap();
    assert_eq!(honest_root, block.header.merkle_root);
}

// ---------------------------------------------------------------------------
// Concurrent Mining
// ---------------------------------------------------------------------------

#[tokio::test]
async fn two_miners_race_on_separate_templates() {
    init_tracing();
    let miner = Miner::new(Sha256Engine);

    let mut left_pool = seeded_pool(2);
    let mut left = BlockTemplate::genesis(8).unwrap();
    left.drain_pool(&mut left_pool).unwrap();
    left.commit_merkle_root(&Sha256Engine).unwrap();

    let mut right_pool = seeded_pool(3);
    let mut right = BlockTemplate::genesis(8).unwrap();
    right.drain_pool(&mut right_pool).unwrap();
    right.commit_merkle_root(&Sha256Engine).unwrap();

    let left_task = miner.spawn(left);
    let right_task = miner.spawn(right);

    let (left_block, right_block) = tokio::join!(left_task.join(), right_task.join());
    let left_block = left_block.unwrap();
    let right_block = right_block.unwrap();

    // Different transaction sets, different roots, both independently
    // valid.
    assert_ne!(left_block.header.merkle_root, right_block.header.merkle_root);
    let validator = Validator::new(Sha256Engine);
    assert!(validator.validate(&left_block, None).is_valid());
    assert!(validator.validate(&right_block, None).is_valid());
}

#[tokio::test]
async fn cancelled_miner_discards_the_attempt() {
    init_tracing();
    let miner = Miner::new(Sha256Engine);

    let mut pool = seeded_pool(1);
    let mut template = BlockTemplate::genesis(200).unwrap();
    template.drain_pool(&mut pool).unwrap();
    template.commit_merkle_root(&Sha256Engine).unwrap();

    let task = miner.spawn(template);
    tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
    task.cancel();

    // No block, no partial state. The next attempt starts from scratch.
    assert!(task.join().await.is_err());
}
