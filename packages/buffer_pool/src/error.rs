use thiserror::Error;

/// Errors that can occur when borrowing arrays from or returning arrays to a
/// [`BufferPool`][crate::BufferPool].
///
/// Every variant carries the name of the pool that reported it, so that failures can be
/// attributed to the right instance in processes that run several pools.
///
/// None of these conditions are retried by the pool. They indicate either a misconfigured pool
/// or a defect in the program that uses it.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The bucket for the requested length was still empty after the pool refilled it.
    ///
    /// This happens when the pool is configured with a refill batch size of zero.
    #[error(
        "buffer pool '{pool_name}' could not fill its bucket for length {length}: the bucket is still empty after a refill"
    )]
    FillPool {
        /// Name of the pool that failed to serve the request.
        pool_name: String,

        /// The element count that was requested.
        length: usize,
    },

    /// An array was returned to a pool that has no bucket for its length.
    ///
    /// This means the array was not issued by this pool.
    #[error(
        "buffer pool '{pool_name}' has no bucket for length {length}: the returned array was not issued by this pool"
    )]
    ReturnPointer {
        /// Name of the pool the array was returned to.
        pool_name: String,

        /// Length of the returned array.
        length: usize,
    },

    /// An array was about to be inserted into a bucket that holds arrays of a different length.
    #[error(
        "buffer pool '{pool_name}' refused an array of length {actual_length} destined for the bucket of length {bucket_length}"
    )]
    LengthMismatch {
        /// Name of the pool the array was returned to.
        pool_name: String,

        /// The element count that the target bucket holds.
        bucket_length: usize,

        /// The element count of the array that was returned.
        actual_length: usize,
    },
}

/// A specialized `Result` type for pool operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;
