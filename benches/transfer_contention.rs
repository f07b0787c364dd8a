//! Benchmark suite for transfers under contention
//!
//! Compares uncontended transfers with transfers between a small number of
//! hot accounts, as given and in canonical latch order, using the divan
//! benchmarking framework.
//!
//! # Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench
//! ```

use rust_banking_engine::core::{
    precise_add, transfer_with_retry, AccountStore, ConstantBackoff, LockOrdering, RetryConfig,
    TransferOrchestrator,
};
use rust_banking_engine::types::{Account, TransferRequest};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const TRANSFERS_PER_THREAD: usize = 250;
const THREADS: usize = 4;

fn main() {
    divan::main();
}

fn setup(accounts: usize, canonical: bool) -> (TransferOrchestrator, Vec<String>) {
    let ordering = if canonical {
        LockOrdering::Canonical
    } else {
        LockOrdering::AsGiven
    };
    let store = Arc::new(AccountStore::new());
    let keys = (0..accounts)
        .map(|i| {
            let account = Account::new(format!("bench-{}", i), Decimal::new(1_000_000, 0));
            let key = account.key();
            store.create(account).expect("Duplicate bench account");
            key
        })
        .collect();
    (
        TransferOrchestrator::new(store).with_lock_ordering(ordering),
        keys,
    )
}

/// Run `THREADS` threads, each moving money round-robin between `keys`
fn run(orchestrator: &TransferOrchestrator, keys: &[String]) {
    let backoff = ConstantBackoff(Duration::from_micros(10));
    let config = RetryConfig::contention_only(u32::MAX);

    thread::scope(|scope| {
        for t in 0..THREADS {
            let backoff = &backoff;
            let config = &config;
            scope.spawn(move || {
                for i in 0..TRANSFERS_PER_THREAD {
                    let sender = &keys[(t + i) % keys.len()];
                    let receiver = &keys[(t + i + 1) % keys.len()];
                    let request = TransferRequest::new(sender.as_str(), receiver.as_str(), Decimal::ONE);
                    transfer_with_retry(orchestrator, &request, backoff, config)
                        .expect("Transfer failed");
                }
            });
        }
    });
}

/// Two accounts shared by every thread
#[divan::bench(args = [false, true])]
fn hot_pair(bencher: divan::Bencher, canonical: bool) {
    bencher
        .with_inputs(|| setup(2, canonical))
        .bench_local_values(|(orchestrator, keys)| run(&orchestrator, &keys));
}

/// Enough accounts that threads rarely meet
#[divan::bench(args = [false, true])]
fn spread(bencher: divan::Bencher, canonical: bool) {
    bencher
        .with_inputs(|| setup(64, canonical))
        .bench_local_values(|(orchestrator, keys)| run(&orchestrator, &keys));
}

#[divan::bench]
fn precise_add_cents() -> Option<Decimal> {
    let mut total = Decimal::ZERO;
    for _ in 0..1_000 {
        total = precise_add(divan::black_box(total), divan::black_box(Decimal::new(1, 2)))?;
    }
    Some(total)
}
