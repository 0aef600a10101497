use std::any::type_name;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::PooledBuffer;

/// An array borrowed from a [`BufferPool`][crate::BufferPool], shared between owners.
///
/// Cloning the handle is cheap and all clones alias the same array. The array returns to its
/// pool when the last clone is dropped.
///
/// Shared handles give read access. Mutable access is available through
/// [`get_mut()`][Self::get_mut] only while a single clone exists.
///
/// # Example
///
/// ```rust
/// use buffer_pool::BufferPool;
///
/// let pool = BufferPool::<u32>::new("fanout", 2);
///
/// let mut frame = pool.get_shared(4).unwrap();
/// frame.get_mut().unwrap().fill(5);
///
/// let subscriber = frame.clone();
/// assert!(frame.get_mut().is_none());
/// assert_eq!(&*subscriber, &[5, 5, 5, 5]);
///
/// drop(frame);
/// drop(subscriber);
/// assert_eq!(pool.bucket_stats(4).unwrap().idle(), 2);
/// ```
pub struct SharedBuffer<T> {
    inner: Arc<PooledBuffer<T>>,
}

impl<T> SharedBuffer<T> {
    pub(crate) fn new(pooled: PooledBuffer<T>) -> Self {
        Self {
            inner: Arc::new(pooled),
        }
    }

    /// Number of elements in the array.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the array has zero elements.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns a shared view over the array.
    #[must_use]
    #[inline]
    pub fn view(&self) -> &[T] {
        self.inner.view()
    }

    /// Returns an exclusive view over the array if this is the only clone of the handle.
    #[must_use]
    pub fn get_mut(&mut self) -> Option<&mut [T]> {
        Arc::get_mut(&mut self.inner).map(PooledBuffer::view_mut)
    }

    /// Number of clones of this handle that currently exist, including this one.
    #[must_use]
    pub fn owner_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl<T> Clone for SharedBuffer<T> {
    /// Creates another owner of the same array.
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Deref for SharedBuffer<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.inner.view()
    }
}

impl<T> AsRef<[T]> for SharedBuffer<T> {
    fn as_ref(&self) -> &[T] {
        self.inner.view()
    }
}

impl<T> From<PooledBuffer<T>> for SharedBuffer<T> {
    fn from(pooled: PooledBuffer<T>) -> Self {
        Self::new(pooled)
    }
}

impl<T> fmt::Debug for SharedBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("inner", &self.inner)
            .field("owner_count", &Arc::strong_count(&self.inner))
            .finish()
    }
}
