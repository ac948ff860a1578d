//! Lifecycle manager configuration.

/// Configuration for an [`crate::EntityLifecycleManager`].
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Whether removing an entity first removes all of its descendants.
    pub cascade_removal: bool,

    /// Deepest descendant level a cascading removal may reach.
    pub max_cascade_depth: usize,

    /// Whether `remove` installs the entity's component context around
    /// cleanup (otherwise the caller's current context is kept).
    pub switch_context_on_remove: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            cascade_removal: true,
            max_cascade_depth: 64,
            switch_context_on_remove: true,
        }
    }
}

impl ManagerConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether removal cascades to descendants.
    #[must_use]
    pub const fn cascade_removal(mut self, value: bool) -> Self {
        self.cascade_removal = value;
        self
    }

    /// Sets the maximum cascade depth.
    #[must_use]
    pub const fn max_cascade_depth(mut self, depth: usize) -> Self {
        self.max_cascade_depth = depth;
        self
    }

    /// Sets whether removal switches to the component's context.
    #[must_use]
    pub const fn switch_context_on_remove(mut self, value: bool) -> Self {
        self.switch_context_on_remove = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ManagerConfig::default();
        assert!(config.cascade_removal);
        assert!(config.switch_context_on_remove);
        assert_eq!(config.max_cascade_depth, 64);
    }

    #[test]
    fn builder_pattern() {
        let config = ManagerConfig::new()
            .cascade_removal(false)
            .switch_context_on_remove(false)
            .max_cascade_depth(3);

        assert!(!config.cascade_removal);
        assert!(!config.switch_context_on_remove);
        assert_eq!(config.max_cascade_depth, 3);
    }
}
