//! Unpacker limits and buffer sizing.

/// Default size of the first buffer allocation.
pub const DEFAULT_INITIAL_CAPACITY: usize = 8 * 1024;

/// Default ceiling on buffer growth (64 MiB).
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 64 * 1024 * 1024;

/// Default nesting limit for [`unpack_value`](super::Unpacker::unpack_value).
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Builder for configuring an [`Unpacker`](super::Unpacker).
///
/// ```
/// use rawpack::unpack::UnpackerConfig;
///
/// let config = UnpackerConfig::new()
///     .initial_capacity(1024)
///     .max_buffer_size(Some(1 << 20))
///     .max_depth(32);
/// assert_eq!(config.get_max_depth(), 32);
/// ```
#[derive(Debug, Clone)]
pub struct UnpackerConfig {
    initial_capacity: usize,
    max_buffer_size: Option<usize>,
    max_depth: usize,
}

impl Default for UnpackerConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            max_buffer_size: Some(DEFAULT_MAX_BUFFER_SIZE),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl UnpackerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the size of the first buffer allocation.
    pub fn initial_capacity(mut self, bytes: usize) -> Self {
        self.initial_capacity = bytes;
        self
    }

    /// Sets the largest size the buffer may grow to. `None` removes the cap.
    pub fn max_buffer_size(mut self, bytes: Option<usize>) -> Self {
        self.max_buffer_size = bytes;
        self
    }

    /// Sets how deeply arrays and maps may nest in dynamic reads.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn get_initial_capacity(&self) -> usize {
        self.initial_capacity
    }

    pub fn get_max_buffer_size(&self) -> Option<usize> {
        self.max_buffer_size
    }

    pub fn get_max_depth(&self) -> usize {
        self.max_depth
    }
}
