//! Metrics for buffer pools.
//!
//! These events are shared by every pool in the process. Per-pool numbers are available from
//! [`BufferPool::stats()`][crate::BufferPool::stats].

use std::thread::LocalKey;

use nm::{Event, Magnitude};

/// Histogram buckets for the element count requested from a pool.
///
/// Typical users request arrays sized for one block of samples or one network frame, so we
/// expect most requests to fall between a few dozen and a few thousand elements.
const GET_LENGTH_BUCKETS: &[Magnitude] = &[0, 16, 64, 256, 1024, 4096, 16384, 65536, 262_144];

thread_local! {
    /// Arrays handed out by any pool.
    pub(crate) static GETS: Event = Event::builder()
        .name("buffer_pool_gets")
        .build();

    /// Element count of each array handed out by any pool.
    pub(crate) static GET_LENGTH: Event = Event::builder()
        .name("buffer_pool_get_length")
        .histogram(GET_LENGTH_BUCKETS)
        .build();

    /// Refills of an empty bucket, whether or not they produced any arrays.
    pub(crate) static REFILLS: Event = Event::builder()
        .name("buffer_pool_refills")
        .build();

    /// Arrays manufactured by refills.
    pub(crate) static ARRAYS_MANUFACTURED: Event = Event::builder()
        .name("buffer_pool_arrays_manufactured")
        .build();

    /// Arrays returned to their pool by a dropped handle.
    pub(crate) static RETURNS: Event = Event::builder()
        .name("buffer_pool_returns")
        .build();
}

/// Records an observation on `event`, or does nothing if the calling thread has already
/// destroyed the event.
///
/// Handles may be dropped from the destructor of another thread-local, after our events are
/// gone. Returning the array must still succeed in that case, so the metric is skipped.
pub(crate) fn observe(event: &'static LocalKey<Event>, f: impl FnOnce(&Event)) {
    event.try_with(f).unwrap_or_default();
}

/// Converts an element count to a histogram magnitude, saturating at the largest magnitude.
pub(crate) fn length_magnitude(length: usize) -> Magnitude {
    Magnitude::try_from(length).unwrap_or(Magnitude::MAX)
}
