use std::any::type_name;
use std::sync::Arc;
use std::{fmt, iter};

use foldhash::{HashMap, HashMapExt};
use nm::Event;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::Result;
use crate::metrics::{
    ARRAYS_MANUFACTURED, GET_LENGTH, GETS, REFILLS, RETURNS, length_magnitude, observe,
};
use crate::{
    Buffer, BucketStats, BufferPoolBuilder, Error, PoolStats, PooledBuffer, SharedBuffer,
};

/// A thread-safe pool of reusable arrays, bucketed by exact element count.
///
/// Requesting an array of some length pops the most recently returned spare array of that
/// length. If the bucket for that length is empty, the pool first manufactures a batch of
/// `refill_batch_size` fresh arrays into it. Dropping the returned handle pushes the array back
/// into its bucket, ready to be handed out again.
///
/// Buckets grow lazily and never shrink: once manufactured, an array stays with the pool until
/// the pool itself is dropped.
///
/// This type is a cheap cloneable handle to shared pool state. The state is dropped when the
/// last `BufferPool` clone is dropped. Handles issued by the pool do not keep it alive; if a
/// handle outlives its pool, its array is released to the system allocator instead.
///
/// # Leftover contents
///
/// Returned arrays are not cleared. An array handed out by [`get()`][Self::get] may contain the
/// values written by its previous borrower. Overwrite the contents before reading them.
///
/// # Thread safety
///
/// One mutex guards all buckets of a pool. Borrowing, refilling and returning all serialize on
/// it, including the manufacture of a refill batch.
///
/// # Example
///
/// ```rust
/// use buffer_pool::BufferPool;
///
/// let pool = BufferPool::<i32>::new("TestPool", 5);
///
/// let mut buffer = pool.get(3).unwrap();
/// buffer[2] = 42;
/// drop(buffer);
///
/// // The same array comes back, leftover contents included.
/// let buffer = pool.get(3).unwrap();
/// assert_eq!(buffer[2], 42);
/// ```
pub struct BufferPool<T> {
    core: Arc<PoolCore<T>>,
}

impl<T> BufferPool<T> {
    /// Creates an empty pool with the given diagnostic name and refill batch size.
    ///
    /// No buckets exist until the first request. A `refill_batch_size` of zero is accepted here
    /// but makes every [`get()`][Self::get] fail with [`Error::FillPool`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use buffer_pool::BufferPool;
    ///
    /// let pool = BufferPool::<u8>::new("rx_frames", 32);
    ///
    /// assert_eq!(pool.name(), "rx_frames");
    /// assert_eq!(pool.refill_batch_size(), 32);
    /// ```
    #[must_use]
    pub fn new(name: impl Into<String>, refill_batch_size: usize) -> Self {
        Self::builder()
            .name(name)
            .refill_batch_size(refill_batch_size)
            .build()
    }

    /// Returns a builder for creating a pool with custom configuration.
    ///
    /// # Example
    ///
    /// ```rust
    /// use buffer_pool::BufferPool;
    ///
    /// let pool = BufferPool::<f64>::builder()
    ///     .name("fft_scratch")
    ///     .refill_batch_size(4)
    ///     .build();
    /// ```
    pub fn builder() -> BufferPoolBuilder<T> {
        BufferPoolBuilder::new()
    }

    pub(crate) fn new_inner(name: String, refill_batch_size: usize) -> Self {
        Self {
            core: Arc::new(PoolCore::new(name, refill_batch_size)),
        }
    }

    /// The diagnostic name of the pool.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.core.name
    }

    /// Number of arrays manufactured whenever a bucket is found empty.
    #[must_use]
    pub fn refill_batch_size(&self) -> usize {
        self.core.refill_batch_size
    }

    /// Returns a snapshot of the bucket for `length`, or `None` if that length was never
    /// requested from this pool.
    ///
    /// This operation may block if another thread is currently accessing the pool.
    #[must_use]
    pub fn bucket_stats(&self, length: usize) -> Option<BucketStats> {
        let buckets = self.core.buckets.lock();
        buckets.get(&length).map(Bucket::stats)
    }

    /// Returns a snapshot of every bucket in the pool.
    ///
    /// This operation may block if another thread is currently accessing the pool.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let buckets = {
            let buckets = self.core.buckets.lock();
            buckets.values().map(Bucket::stats).collect()
        };

        PoolStats::new(self.core.name.clone(), buckets)
    }
}

impl<T: Default> BufferPool<T> {
    /// Borrows an array of `length` elements from the pool.
    ///
    /// The most recently returned array of that length is handed out first. If none is
    /// available, the pool manufactures a batch of `refill_batch_size` arrays before serving
    /// the request. The array returns to the pool when the handle is dropped.
    ///
    /// The contents of the array are whatever the previous borrower left in it, or
    /// `T::default()` for a freshly manufactured array.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FillPool`] if the bucket is still empty after a refill, which happens
    /// when the pool is configured with a refill batch size of zero. This is not retried.
    ///
    /// # Example
    ///
    /// ```rust
    /// use buffer_pool::BufferPool;
    ///
    /// let pool = BufferPool::<u32>::new("counters", 8);
    ///
    /// let mut a = pool.get(16).unwrap();
    /// let b = pool.get(32).unwrap();
    ///
    /// a.fill(7);
    /// assert_eq!(a.len(), 16);
    /// assert_eq!(b.len(), 32);
    /// ```
    pub fn get(&self, length: usize) -> Result<PooledBuffer<T>> {
        let elements = self.core.withdraw(length)?;

        observe(&GETS, Event::observe_once);
        observe(&GET_LENGTH, |e| e.observe(length_magnitude(length)));

        Ok(PooledBuffer::new(length, elements, Arc::downgrade(&self.core)))
    }

    /// Borrows an array of `length` elements as a shared handle.
    ///
    /// The array returns to the pool when the last clone of the handle is dropped.
    ///
    /// # Errors
    ///
    /// Same as [`get()`][Self::get].
    ///
    /// # Example
    ///
    /// ```rust
    /// use buffer_pool::BufferPool;
    ///
    /// let pool = BufferPool::<u8>::new("broadcast", 2);
    ///
    /// let frame = pool.get_shared(1500).unwrap();
    /// let for_subscriber = frame.clone();
    ///
    /// assert_eq!(for_subscriber.len(), 1500);
    /// ```
    pub fn get_shared(&self, length: usize) -> Result<SharedBuffer<T>> {
        self.get(length).map(PooledBuffer::into_shared)
    }

    /// Ensures the bucket for `length` has at least one spare array, refilling it if it is
    /// empty, without handing anything out.
    ///
    /// Use this to move the cost of the first refill out of a latency-sensitive loop.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FillPool`] if the bucket is still empty after a refill.
    ///
    /// # Example
    ///
    /// ```rust
    /// use buffer_pool::BufferPool;
    ///
    /// let pool = BufferPool::<i16>::new("audio", 4);
    /// pool.prefill(480).unwrap();
    ///
    /// assert_eq!(pool.bucket_stats(480).unwrap().idle(), 4);
    /// ```
    pub fn prefill(&self, length: usize) -> Result<()> {
        let mut buckets = self.core.buckets.lock();
        let bucket = self.core.bucket_for(&mut buckets, length);

        self.core.ensure_not_empty(bucket, length)
    }
}

impl<T> Clone for BufferPool<T> {
    /// Creates another handle to the same pool.
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

impl<T> fmt::Debug for BufferPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("core", &self.core)
            .finish()
    }
}

/// The state shared by all clones of one [`BufferPool`].
///
/// Handles hold a `Weak` reference to this, so that returning an array never keeps the pool
/// alive.
pub(crate) struct PoolCore<T> {
    name: String,
    refill_batch_size: usize,

    /// We use foldhash for better performance with small hash tables.
    buckets: Mutex<HashMap<usize, Bucket<T>>>,
}

impl<T> PoolCore<T> {
    pub(crate) fn new(name: String, refill_batch_size: usize) -> Self {
        Self {
            name,
            refill_batch_size,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    fn bucket_for<'a>(
        &self,
        buckets: &'a mut HashMap<usize, Bucket<T>>,
        length: usize,
    ) -> &'a mut Bucket<T> {
        buckets.entry(length).or_insert_with(|| {
            debug!(pool = %self.name, length, "created bucket");
            Bucket::new(length)
        })
    }

    /// Pushes an array back onto the top of the bucket it was issued from.
    ///
    /// `length` is the length the array was requested with, recorded by the handle when it was
    /// issued. Only called from the teardown of a pool-issued handle.
    pub(crate) fn give_back(&self, length: usize, elements: Box<[T]>) -> Result<()> {
        let mut buckets = self.buckets.lock();

        let Some(bucket) = buckets.get_mut(&length) else {
            return Err(Error::ReturnPointer {
                pool_name: self.name.clone(),
                length,
            });
        };

        bucket.push(elements, &self.name)?;
        let idle = bucket.spares.len();
        drop(buckets);

        observe(&RETURNS, Event::observe_once);
        trace!(pool = %self.name, length, idle, "array returned");

        Ok(())
    }
}

impl<T: Default> PoolCore<T> {
    fn withdraw(&self, length: usize) -> Result<Box<[T]>> {
        let mut buckets = self.buckets.lock();
        let bucket = self.bucket_for(&mut buckets, length);

        self.ensure_not_empty(bucket, length)?;

        // Most recently returned first: it is the most likely to still be in the caches.
        let elements = bucket.spares.pop().ok_or_else(|| self.fill_failure(length))?;

        trace!(pool = %self.name, length, idle = bucket.spares.len(), "array withdrawn");

        Ok(elements)
    }

    fn ensure_not_empty(&self, bucket: &mut Bucket<T>, length: usize) -> Result<()> {
        if bucket.spares.is_empty() {
            self.refill(bucket, length);
        }

        if bucket.spares.is_empty() {
            return Err(self.fill_failure(length));
        }

        Ok(())
    }

    fn refill(&self, bucket: &mut Bucket<T>, length: usize) {
        let batch_size = self.refill_batch_size;

        // Build the whole batch before touching the bucket. If `T::default()` panics midway,
        // the bucket and its counters are left as they were.
        let mut batch: Vec<Box<[T]>> =
            iter::repeat_with(|| Buffer::<T>::new(length).into_elements())
                .take(batch_size)
                .collect();

        bucket.spares.append(&mut batch);
        bucket.manufactured = bucket.manufactured.saturating_add(batch_size);
        bucket.refills = bucket.refills.saturating_add(1);

        observe(&REFILLS, Event::observe_once);
        observe(&ARRAYS_MANUFACTURED, |e| e.batch(batch_size).observe_once());

        debug!(
            pool = %self.name,
            length,
            batch_size,
            manufactured = bucket.manufactured,
            "refilled bucket"
        );
    }

    fn fill_failure(&self, length: usize) -> Error {
        Error::FillPool {
            pool_name: self.name.clone(),
            length,
        }
    }
}

impl<T> fmt::Debug for PoolCore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bucket_count = self.buckets.lock().len();

        f.debug_struct(type_name::<Self>())
            .field("name", &self.name)
            .field("refill_batch_size", &self.refill_batch_size)
            .field("bucket_count", &bucket_count)
            .finish_non_exhaustive()
    }
}

/// The spare arrays of one element count, used as a stack.
struct Bucket<T> {
    length: usize,
    spares: Vec<Box<[T]>>,
    manufactured: usize,
    refills: usize,
}

impl<T> Bucket<T> {
    fn new(length: usize) -> Self {
        Self {
            length,
            spares: Vec::new(),
            manufactured: 0,
            refills: 0,
        }
    }

    /// Rejects an array whose length differs from the length the caller looked the bucket up by.
    fn push(&mut self, elements: Box<[T]>, pool_name: &str) -> Result<()> {
        if elements.len() != self.length {
            return Err(Error::LengthMismatch {
                pool_name: pool_name.to_string(),
                bucket_length: self.length,
                actual_length: elements.len(),
            });
        }

        self.spares.push(elements);
        Ok(())
    }

    fn stats(&self) -> BucketStats {
        BucketStats::new(
            self.length,
            self.spares.len(),
            self.manufactured,
            self.refills,
        )
    }
}
