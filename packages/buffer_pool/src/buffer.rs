use std::any::type_name;
use std::borrow::{Borrow, BorrowMut};
use std::fmt;
use std::iter;
use std::mem;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// A fixed-length array of `T` that knows nothing about pooling.
///
/// The length is established at construction and never changes: the storage is a boxed slice,
/// which has no operations that grow or shrink it. Dropping a `Buffer` releases the array to the
/// system allocator.
///
/// For arrays that return themselves to a pool instead, see
/// [`PooledBuffer`][crate::PooledBuffer].
///
/// # Shared ownership
///
/// A `Buffer` is exclusively owned. To share one array between several owners, convert it with
/// [`into_shared()`][Self::into_shared]; the array then lives as long as the longest-lived clone
/// of the returned [`Arc`].
///
/// # Example
///
/// ```rust
/// use buffer_pool::Buffer;
///
/// let mut buffer = Buffer::<i32>::new(10);
/// buffer[3] = 5;
///
/// assert_eq!(buffer.len(), 10);
/// assert_eq!(buffer.view()[3], 5);
/// ```
pub struct Buffer<T> {
    elements: Box<[T]>,
}

impl<T: Default> Buffer<T> {
    /// Allocates a fresh array of `length` elements, each initialized with `T::default()`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use buffer_pool::Buffer;
    ///
    /// let buffer = Buffer::<f32>::new(4);
    /// assert_eq!(*buffer, [0.0; 4]);
    /// ```
    #[must_use]
    pub fn new(length: usize) -> Self {
        Self {
            elements: iter::repeat_with(T::default).take(length).collect(),
        }
    }
}

impl<T> Buffer<T> {
    /// Number of elements in the array.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the array has zero elements.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Returns a shared view over the array.
    #[must_use]
    #[inline]
    pub fn view(&self) -> &[T] {
        &self.elements
    }

    /// Returns an exclusive view over the array.
    ///
    /// The view can change the elements but never the length of the array.
    #[must_use]
    #[inline]
    pub fn view_mut(&mut self) -> &mut [T] {
        &mut self.elements
    }

    /// Converts the buffer into a shared-ownership handle.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::sync::Arc;
    ///
    /// use buffer_pool::Buffer;
    ///
    /// let shared = Buffer::<u8>::new(16).into_shared();
    /// let alias = Arc::clone(&shared);
    ///
    /// assert_eq!(alias.len(), 16);
    /// ```
    #[must_use]
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Moves the array out, leaving an empty (non-allocating) slice behind.
    ///
    /// Only used by pool-issued handles during teardown.
    pub(crate) fn take_elements(&mut self) -> Box<[T]> {
        mem::take(&mut self.elements)
    }

    pub(crate) fn into_elements(self) -> Box<[T]> {
        self.elements
    }
}

impl<T> From<Box<[T]>> for Buffer<T> {
    /// Adopts existing storage as the buffer's array.
    fn from(elements: Box<[T]>) -> Self {
        Self { elements }
    }
}

impl<T> From<Vec<T>> for Buffer<T> {
    /// Adopts the elements of a vector. Any spare capacity is released.
    fn from(elements: Vec<T>) -> Self {
        Self {
            elements: elements.into_boxed_slice(),
        }
    }
}

impl<T> Deref for Buffer<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.elements
    }
}

impl<T> DerefMut for Buffer<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.elements
    }
}

impl<T> AsRef<[T]> for Buffer<T> {
    fn as_ref(&self) -> &[T] {
        &self.elements
    }
}

impl<T> AsMut<[T]> for Buffer<T> {
    fn as_mut(&mut self) -> &mut [T] {
        &mut self.elements
    }
}

impl<T> Borrow<[T]> for Buffer<T> {
    fn borrow(&self) -> &[T] {
        &self.elements
    }
}

impl<T> BorrowMut<[T]> for Buffer<T> {
    fn borrow_mut(&mut self) -> &mut [T] {
        &mut self.elements
    }
}

impl<T> fmt::Debug for Buffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("len", &self.elements.len())
            .finish()
    }
}
