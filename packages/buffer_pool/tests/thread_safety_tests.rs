//! Thread safety integration tests for `buffer_pool`.
//!
//! These tests hammer one pool from many threads and then verify that no array was lost or
//! duplicated. They are ignored under Miri because they run for a fixed wall-clock duration.

use std::cell::RefCell;
use std::collections::HashSet;
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use buffer_pool::{Buffer, BufferPool, PooledBuffer, SharedBuffer};
use static_assertions::assert_impl_all;

assert_impl_all!(BufferPool<f32>: Send, Sync);
assert_impl_all!(PooledBuffer<f32>: Send, Sync);
assert_impl_all!(SharedBuffer<f32>: Send, Sync);
assert_impl_all!(Buffer<f32>: Send, Sync);

const THREAD_COUNT: usize = 8;
const LENGTHS: [usize; 4] = [1, 3, 64, 1000];
const STRESS_DURATION: Duration = Duration::from_millis(200);

#[cfg_attr(miri, ignore)]
#[test]
fn concurrent_borrowers_lose_nothing() {
    let pool = BufferPool::<u32>::new("stress", 4);
    let barrier = Barrier::new(THREAD_COUNT);

    thread::scope(|s| {
        for thread_index in 0..THREAD_COUNT {
            let pool = pool.clone();
            let barrier = &barrier;

            s.spawn(move || {
                barrier.wait();
                let started = Instant::now();
                let mut iteration = 0_usize;

                while started.elapsed() < STRESS_DURATION {
                    for (offset, length) in LENGTHS.iter().enumerate() {
                        let mut buffer = pool.get(*length).unwrap();
                        assert_eq!(buffer.len(), *length);

                        if let Some(first) = buffer.first_mut() {
                            *first = u32::try_from(thread_index).unwrap();
                        }

                        // Hold some buffers across the next request so buckets get contended.
                        if (iteration.wrapping_add(offset)) % 3 == 0 {
                            let second = pool.get(*length).unwrap();
                            drop(second);
                        }
                    }

                    iteration = iteration.wrapping_add(1);
                }
            });
        }
    });

    for length in LENGTHS {
        let stats = pool.bucket_stats(length).unwrap();

        assert_eq!(stats.lent(), 0, "length {length} has arrays lent out");
        assert_eq!(
            stats.idle(),
            stats.manufactured(),
            "length {length} lost or duplicated arrays"
        );
        assert_eq!(stats.manufactured() % pool.refill_batch_size(), 0);
    }
}

#[cfg_attr(miri, ignore)]
#[test]
fn concurrently_held_arrays_are_distinct() {
    const PER_THREAD: usize = 16;

    let pool = BufferPool::<u8>::new("distinct", 5);
    let addresses = Mutex::new(HashSet::new());
    let barrier = Barrier::new(THREAD_COUNT);

    thread::scope(|s| {
        for _ in 0..THREAD_COUNT {
            let pool = &pool;
            let addresses = &addresses;
            let barrier = &barrier;

            s.spawn(move || {
                barrier.wait();

                let held: Vec<_> = (0..PER_THREAD).map(|_| pool.get(32).unwrap()).collect();

                let mut addresses = addresses.lock().unwrap();
                for buffer in &held {
                    assert!(
                        addresses.insert(buffer.as_ptr() as usize),
                        "the same array was lent out twice"
                    );
                }
                drop(addresses);

                // Keep everything borrowed until every thread has recorded its arrays.
                barrier.wait();
                drop(held);
            });
        }
    });

    let stats = pool.bucket_stats(32).unwrap();
    assert_eq!(addresses.lock().unwrap().len(), THREAD_COUNT * PER_THREAD);
    assert_eq!(stats.idle(), stats.manufactured());
    assert!(stats.manufactured() >= THREAD_COUNT * PER_THREAD);
}

#[cfg_attr(miri, ignore)]
#[test]
fn shared_handles_return_from_whichever_thread_drops_last() {
    let pool = BufferPool::<u64>::new("fanout", 2);
    let shared = pool.get_shared(128).unwrap();
    let barrier = Arc::new(Barrier::new(THREAD_COUNT));

    let workers: Vec<_> = (0..THREAD_COUNT)
        .map(|_| {
            let clone = shared.clone();
            let barrier = Arc::clone(&barrier);

            thread::spawn(move || {
                barrier.wait();
                clone.iter().copied().sum::<u64>()
            })
        })
        .collect();

    drop(shared);

    for worker in workers {
        assert_eq!(worker.join().unwrap(), 0);
    }

    let stats = pool.bucket_stats(128).unwrap();
    assert_eq!(stats.idle(), 2);
    assert_eq!(stats.lent(), 0);
}

#[cfg_attr(miri, ignore)]
#[test]
fn pool_can_be_dropped_while_handles_live_on_other_threads() {
    let pool = BufferPool::<u8>::new("abandoned", 3);
    let buffers: Vec<_> = (0..3).map(|_| pool.get(10).unwrap()).collect();

    drop(pool);

    let workers: Vec<_> = buffers
        .into_iter()
        .map(|mut buffer| {
            thread::spawn(move || {
                buffer.fill(1);
                buffer.iter().map(|x| usize::from(*x)).sum::<usize>()
            })
        })
        .collect();

    for worker in workers {
        assert_eq!(worker.join().unwrap(), 10);
    }
}

thread_local! {
    static SCRATCH: RefCell<Option<PooledBuffer<u8>>> = const { RefCell::new(None) };
}

#[cfg_attr(miri, ignore)]
#[test]
fn handle_in_thread_local_returns_at_thread_exit() {
    let pool = BufferPool::<u8>::new("per_thread_scratch", 2);

    let worker_pool = pool.clone();
    thread::spawn(move || {
        // The scratch slot is registered before any pool activity on this thread, so it is
        // destroyed after everything the pool touches while it runs.
        SCRATCH.with(|slot| *slot.borrow_mut() = Some(worker_pool.get(8).unwrap()));

        let transient = worker_pool.get(8).unwrap();
        drop(transient);
    })
    .join()
    .unwrap();

    let stats = pool.bucket_stats(8).unwrap();
    assert_eq!(stats.lent(), 0);
    assert_eq!(stats.idle(), 2);
    assert_eq!(stats.idle(), stats.manufactured());
}
