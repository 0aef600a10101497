use std::any::type_name;
use std::borrow::{Borrow, BorrowMut};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Weak;
use std::thread;

use tracing::{error, trace};

use crate::pool::PoolCore;
use crate::{Buffer, SharedBuffer};

/// An array borrowed from a [`BufferPool`][crate::BufferPool], with exclusive access.
///
/// When the handle is dropped, the array is pushed back onto the free list of its originating
/// pool, keyed by its length. There is no way to detach the array from the pool.
///
/// The handle holds only a weak reference to the pool. If the pool has already been dropped
/// when the handle is dropped, the array is released to the system allocator instead.
///
/// To share the array between several owners, convert the handle with
/// [`into_shared()`][Self::into_shared].
///
/// # Leftover contents
///
/// A freshly borrowed array may contain values written by its previous borrower.
///
/// # Panics
///
/// Dropping the handle panics if the originating pool refuses the array, which means the
/// pool's internal state is inconsistent. If the thread is already panicking, the failure is
/// only logged.
///
/// # Example
///
/// ```rust
/// use buffer_pool::BufferPool;
///
/// let pool = BufferPool::<f32>::new("samples", 4);
///
/// let mut block = pool.get(8).unwrap();
/// block.copy_from_slice(&[1.0; 8]);
/// assert_eq!(block.iter().sum::<f32>(), 8.0);
///
/// // Dropping the handle returns the array to the pool.
/// drop(block);
/// assert_eq!(pool.bucket_stats(8).unwrap().idle(), 4);
/// ```
pub struct PooledBuffer<T> {
    buffer: Buffer<T>,

    /// The length the array was requested with, which selects the bucket it returns to.
    issued_length: usize,

    pool: Weak<PoolCore<T>>,
}

impl<T> PooledBuffer<T> {
    pub(crate) fn new(issued_length: usize, elements: Box<[T]>, pool: Weak<PoolCore<T>>) -> Self {
        Self {
            buffer: Buffer::from(elements),
            issued_length,
            pool,
        }
    }

    /// Number of elements in the array.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the array has zero elements.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Returns a shared view over the array.
    #[must_use]
    #[inline]
    pub fn view(&self) -> &[T] {
        self.buffer.view()
    }

    /// Returns an exclusive view over the array.
    #[must_use]
    #[inline]
    pub fn view_mut(&mut self) -> &mut [T] {
        self.buffer.view_mut()
    }

    /// Name of the pool the array will return to, or `None` if that pool no longer exists.
    ///
    /// # Example
    ///
    /// ```rust
    /// use buffer_pool::BufferPool;
    ///
    /// let pool = BufferPool::<u8>::new("origin", 1);
    /// let buffer = pool.get(4).unwrap();
    /// assert_eq!(buffer.pool_name().as_deref(), Some("origin"));
    ///
    /// drop(pool);
    /// assert_eq!(buffer.pool_name(), None);
    /// ```
    #[must_use]
    pub fn pool_name(&self) -> Option<String> {
        self.pool.upgrade().map(|pool| pool.name().to_string())
    }

    /// Converts the handle into one that can be cloned to share the array.
    ///
    /// The array returns to the pool when the last clone is dropped.
    ///
    /// # Example
    ///
    /// ```rust
    /// use buffer_pool::BufferPool;
    ///
    /// let pool = BufferPool::<u8>::new("frames", 2);
    ///
    /// let mut frame = pool.get(3).unwrap();
    /// frame.copy_from_slice(b"abc");
    ///
    /// let shared = frame.into_shared();
    /// let other = shared.clone();
    /// assert_eq!(&*other, b"abc");
    /// ```
    #[must_use]
    pub fn into_shared(self) -> SharedBuffer<T> {
        SharedBuffer::new(self)
    }
}

impl<T> Drop for PooledBuffer<T> {
    fn drop(&mut self) {
        let elements = self.buffer.take_elements();

        let Some(pool) = self.pool.upgrade() else {
            trace!(
                length = elements.len(),
                "pool no longer exists, releasing array"
            );
            return;
        };

        if let Err(e) = pool.give_back(self.issued_length, elements) {
            error!(error = %e, "pool refused a returned array");

            // A second panic during unwinding would abort the process.
            if !thread::panicking() {
                panic!("{e}");
            }
        }
    }
}

impl<T> Deref for PooledBuffer<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.buffer
    }
}

impl<T> DerefMut for PooledBuffer<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buffer
    }
}

impl<T> AsRef<[T]> for PooledBuffer<T> {
    fn as_ref(&self) -> &[T] {
        self.buffer.view()
    }
}

impl<T> AsMut<[T]> for PooledBuffer<T> {
    fn as_mut(&mut self) -> &mut [T] {
        self.buffer.view_mut()
    }
}

impl<T> Borrow<[T]> for PooledBuffer<T> {
    fn borrow(&self) -> &[T] {
        self.buffer.view()
    }
}

impl<T> BorrowMut<[T]> for PooledBuffer<T> {
    fn borrow_mut(&mut self) -> &mut [T] {
        self.buffer.view_mut()
    }
}

impl<T> fmt::Debug for PooledBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("len", &self.buffer.len())
            .field("issued_length", &self.issued_length)
            .field("pool_alive", &(self.pool.strong_count() > 0))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    #![allow(
        clippy::indexing_slicing,
        reason = "we do not need to worry about these things when writing test code"
    )]

    use std::sync::Arc;

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;
    use crate::BufferPool;

    assert_impl_all!(PooledBuffer<u64>: Send, Sync, fmt::Debug);
    assert_not_impl_any!(PooledBuffer<u64>: Clone);

    #[test]
    fn drop_returns_array_to_pool() {
        let pool = BufferPool::<u8>::new("return", 2);

        let buffer = pool.get(5).unwrap();
        assert_eq!(pool.bucket_stats(5).unwrap().idle(), 1);

        drop(buffer);
        assert_eq!(pool.bucket_stats(5).unwrap().idle(), 2);
    }

    #[test]
    fn returned_array_is_the_same_allocation() {
        let pool = BufferPool::<u8>::new("identity", 1);

        let buffer = pool.get(5).unwrap();
        let address = buffer.as_ptr();
        drop(buffer);

        let buffer = pool.get(5).unwrap();
        assert!(std::ptr::eq(address, buffer.as_ptr()));
    }

    #[test]
    fn outliving_the_pool_releases_the_array() {
        let pool = BufferPool::<u8>::new("short_lived", 2);

        let mut buffer = pool.get(5).unwrap();
        drop(pool);

        // Still usable; the array is owned by the handle.
        buffer[4] = 9;
        assert_eq!(buffer[4], 9);
        assert!(buffer.pool_name().is_none());

        drop(buffer);
    }

    #[test]
    fn views_see_the_same_elements() {
        let pool = BufferPool::<i64>::new("views", 1);

        let mut buffer = pool.get(3).unwrap();
        buffer.view_mut()[0] = -1;
        buffer.as_mut()[1] = -2;
        buffer[2] = -3;

        assert_eq!(buffer.view(), &[-1, -2, -3]);
        assert_eq!(buffer.as_ref(), &[-1, -2, -3]);
        assert_eq!(buffer.len(), 3);
        assert!(!buffer.is_empty());
    }

    #[test]
    #[should_panic(expected = "has no bucket for length 4")]
    fn foreign_array_panics_on_return() {
        let core = Arc::new(PoolCore::<u8>::new("foreign".to_string(), 1));

        // No length was ever requested from this pool, so it has no buckets.
        let buffer =
            PooledBuffer::new(4, vec![0_u8; 4].into_boxed_slice(), Arc::downgrade(&core));
        drop(buffer);
    }

    #[test]
    fn debug_reports_pool_liveness() {
        let pool = BufferPool::<u8>::new("dbg", 1);
        let buffer = pool.get(2).unwrap();

        assert!(format!("{buffer:?}").contains("pool_alive: true"));

        drop(pool);
        assert!(format!("{buffer:?}").contains("pool_alive: false"));
    }
}
