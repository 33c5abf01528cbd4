/// What to do when a string pool or resource map chunk shows up more than once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// The later chunk replaces the earlier one, with a warning.
    #[default]
    Replace,
    /// The document is rejected with [`crate::AxmlError::DuplicateChunk`].
    Reject,
}

/// Parser options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParserConfig {
    pub duplicate_chunks: DuplicatePolicy,
}

impl ParserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duplicate_chunks(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_chunks = policy;
        self
    }
}
