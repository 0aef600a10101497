#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! This package provides [`BufferPool`], a thread-safe pool of reusable fixed-length arrays,
//! bucketed by element count.
//!
//! Hot loops such as streaming or signal-processing pipelines often allocate and free arrays
//! of the same few lengths over and over. A pool keeps those arrays around and hands them out
//! again instead, so the allocator is only involved when a bucket runs dry.
//!
//! # Features
//!
//! - **Exact-length buckets**: every requested element count gets its own bucket. Arrays are
//!   never shared between lengths and no rounding to size classes takes place.
//! - **Automatic return**: borrowed arrays go back to their bucket when the handle is dropped.
//!   [`PooledBuffer`] is the exclusive handle, [`SharedBuffer`] the cloneable one.
//! - **Cache-friendly reuse**: each bucket is a stack, so the most recently returned array is
//!   handed out first.
//! - **Batched refill**: an empty bucket is refilled with a configurable batch of arrays at
//!   once, amortizing the allocation cost over many requests.
//! - **Diagnostics**: each pool has a name that appears in its errors and log events, and
//!   [`BufferPool::stats()`] reports per-bucket counters.
//!
//! Buckets never shrink. Memory handed to a pool stays with it until the pool is dropped.
//!
//! # Example
//!
//! ```rust
//! use buffer_pool::BufferPool;
//!
//! let pool = BufferPool::<f32>::new("dsp_blocks", 8);
//!
//! for _ in 0..1000 {
//!     let mut block = pool.get(1024).unwrap();
//!
//!     // Arrays are not cleared between uses, so overwrite before reading.
//!     block.fill(0.0);
//!     block[0] = 1.0;
//! }
//!
//! // One refill served all 1000 requests.
//! let stats = pool.bucket_stats(1024).unwrap();
//! assert_eq!(stats.manufactured(), 8);
//! assert_eq!(stats.refills(), 1);
//! ```
//!
//! # Observability
//!
//! Refills and bucket creation are logged at `debug` level and every borrow and return at
//! `trace` level through the [`tracing`](https://docs.rs/tracing) facade. Process-wide counters
//! are published as [`nm`](https://docs.rs/nm) events named `buffer_pool_*`.

mod buffer;
mod builder;
mod error;
mod metrics;
mod pool;
mod pooled;
mod shared;
mod stats;

pub use buffer::*;
pub use builder::*;
pub use error::Error;
pub use pool::BufferPool;
pub use pooled::*;
pub use shared::*;
pub use stats::*;
