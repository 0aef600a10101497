use std::fmt;

/// A snapshot of one bucket of a [`BufferPool`][crate::BufferPool].
///
/// A bucket holds the spare arrays of one element count. Every array the bucket ever
/// manufactured is either idle in the bucket or lent out in a live handle, so
/// `idle() + lent() == manufactured()`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BucketStats {
    length: usize,
    idle: usize,
    manufactured: usize,
    refills: usize,
}

impl BucketStats {
    pub(crate) fn new(length: usize, idle: usize, manufactured: usize, refills: usize) -> Self {
        Self {
            length,
            idle,
            manufactured,
            refills,
        }
    }

    /// The element count of the arrays in this bucket.
    #[must_use]
    pub fn length(&self) -> usize {
        self.length
    }

    /// Number of spare arrays waiting in the bucket.
    #[must_use]
    pub fn idle(&self) -> usize {
        self.idle
    }

    /// Number of arrays of this length currently lent out in live handles.
    #[must_use]
    pub fn lent(&self) -> usize {
        self.manufactured.saturating_sub(self.idle)
    }

    /// Total number of arrays ever manufactured for this bucket.
    #[must_use]
    pub fn manufactured(&self) -> usize {
        self.manufactured
    }

    /// Number of times the bucket was found empty and refilled.
    #[must_use]
    pub fn refills(&self) -> usize {
        self.refills
    }
}

/// A snapshot of all buckets of a [`BufferPool`][crate::BufferPool], ordered by length.
///
/// # Example
///
/// ```rust
/// use buffer_pool::BufferPool;
///
/// let pool = BufferPool::<f32>::new("samples", 4);
/// let _block = pool.get(256).unwrap();
///
/// let stats = pool.stats();
/// assert_eq!(stats.total_manufactured(), 4);
/// assert_eq!(stats.total_lent(), 1);
///
/// println!("{stats}");
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PoolStats {
    name: String,
    buckets: Vec<BucketStats>,
}

impl PoolStats {
    pub(crate) fn new(name: String, mut buckets: Vec<BucketStats>) -> Self {
        buckets.sort_unstable_by_key(BucketStats::length);

        Self { name, buckets }
    }

    /// Name of the pool the snapshot was taken from.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every bucket the pool has created, in ascending order of length.
    #[must_use]
    pub fn buckets(&self) -> &[BucketStats] {
        &self.buckets
    }

    /// Number of spare arrays across all buckets.
    #[must_use]
    pub fn total_idle(&self) -> usize {
        self.buckets.iter().map(BucketStats::idle).sum()
    }

    /// Number of arrays lent out across all buckets.
    #[must_use]
    pub fn total_lent(&self) -> usize {
        self.buckets.iter().map(BucketStats::lent).sum()
    }

    /// Number of arrays ever manufactured across all buckets.
    #[must_use]
    pub fn total_manufactured(&self) -> usize {
        self.buckets.iter().map(BucketStats::manufactured).sum()
    }
}

impl fmt::Display for PoolStats {
    #[cfg_attr(test, mutants::skip)] // Layout is for humans; tests only check key fragments.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "buffer pool '{}': {} buckets", self.name, self.buckets.len())?;

        for bucket in &self.buckets {
            writeln!(
                f,
                "  length {}: {} idle, {} lent, {} manufactured in {} refills",
                bucket.length,
                bucket.idle,
                bucket.lent(),
                bucket.manufactured,
                bucket.refills
            )?;
        }

        Ok(())
    }
}
