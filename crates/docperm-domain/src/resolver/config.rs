//! Configuration for the access resolver.

/// Configuration for the access resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Maximum number of ancestors a snapshot may carry.
    ///
    /// Guards against corrupt trees (e.g. a cycle flattened by a buggy
    /// store) rather than limiting legitimate nesting.
    pub max_depth: u32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { max_depth: 64 }
    }
}

impl ResolverConfig {
    /// Creates a new configuration with the specified max depth.
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }
}
