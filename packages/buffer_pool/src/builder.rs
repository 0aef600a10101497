use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;

use crate::BufferPool;

/// Name given to pools that are built without an explicit name.
pub const DEFAULT_POOL_NAME: &str = "buffer_pool";

/// Number of arrays manufactured per refill when no batch size is configured.
pub const DEFAULT_REFILL_BATCH_SIZE: usize = 16;

/// Builder for creating an instance of [`BufferPool`].
///
/// You only need to use this builder if you want to rely on the default name or batch size,
/// or prefer naming each setting explicitly. [`BufferPool::new()`] covers the common case.
///
/// # Examples
///
/// ```
/// use buffer_pool::{BufferPool, DEFAULT_REFILL_BATCH_SIZE};
///
/// // Default name and batch size.
/// let pool = BufferPool::<u8>::builder().build();
/// assert_eq!(pool.refill_batch_size(), DEFAULT_REFILL_BATCH_SIZE);
///
/// // Custom configuration.
/// let pool = BufferPool::<f32>::builder()
///     .name("iq_samples")
///     .refill_batch_size(64)
///     .build();
/// assert_eq!(pool.name(), "iq_samples");
/// ```
#[must_use]
pub struct BufferPoolBuilder<T> {
    name: String,
    refill_batch_size: usize,

    _item: PhantomData<T>,
}

impl<T> fmt::Debug for BufferPoolBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("name", &self.name)
            .field("refill_batch_size", &self.refill_batch_size)
            .finish()
    }
}

impl<T> BufferPoolBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            name: DEFAULT_POOL_NAME.to_string(),
            refill_batch_size: DEFAULT_REFILL_BATCH_SIZE,
            _item: PhantomData,
        }
    }

    /// Sets the diagnostic name of the pool. The name is included in every error the pool
    /// reports and in its log events.
    ///
    /// # Examples
    ///
    /// ```
    /// use buffer_pool::BufferPool;
    ///
    /// let pool = BufferPool::<u8>::builder().name("tx_frames").build();
    /// assert_eq!(pool.name(), "tx_frames");
    /// ```
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the number of arrays the pool manufactures whenever it finds a bucket empty.
    ///
    /// Larger batches amortize the cost of refilling over more requests at the price of
    /// holding more idle memory. Zero is accepted but every request will then fail with
    /// [`Error::FillPool`][crate::Error::FillPool].
    ///
    /// # Examples
    ///
    /// ```
    /// use buffer_pool::BufferPool;
    ///
    /// let pool = BufferPool::<u8>::builder().refill_batch_size(2).build();
    /// assert_eq!(pool.refill_batch_size(), 2);
    /// ```
    pub fn refill_batch_size(mut self, refill_batch_size: usize) -> Self {
        self.refill_batch_size = refill_batch_size;
        self
    }

    /// Builds the pool with the specified configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use buffer_pool::BufferPool;
    ///
    /// let pool = BufferPool::<u8>::builder().build();
    /// assert!(pool.stats().buckets().is_empty());
    /// ```
    #[must_use]
    pub fn build(self) -> BufferPool<T> {
        BufferPool::new_inner(self.name, self.refill_batch_size)
    }
}
