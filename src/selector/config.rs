// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Engine configuration

use crate::error::{Error, Result};

/// Default capacity of each string-keyed cache
pub const DEFAULT_CACHE_SIZE: usize = 50;

/// Default limit for nested `:not(...)` / `:has(...)` compilation
pub const DEFAULT_MAX_NESTING: usize = 32;

/// Selector engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum entries in each of the class-regex, token and compiled caches
    pub cache_size: usize,
    /// Use the DOM's id/tag/class lookups for single simple selectors
    pub native_lookups: bool,
    /// Maximum nesting depth of selector arguments
    pub max_nesting: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_size: DEFAULT_CACHE_SIZE,
            native_lookups: true,
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }
}

impl EngineConfig {
    /// Create a new engine config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set cache capacity
    pub fn cache_size(mut self, size: usize) -> Self {
        self.cache_size = size;
        self
    }

    /// Enable/disable native fast-path lookups
    pub fn native_lookups(mut self, enabled: bool) -> Self {
        self.native_lookups = enabled;
        self
    }

    /// Set the nesting limit
    pub fn max_nesting(mut self, depth: usize) -> Self {
        self.max_nesting = depth;
        self
    }

    /// Route every selector through the compiler
    pub fn without_fast_paths() -> Self {
        Self {
            native_lookups: false,
            ..Default::default()
        }
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.cache_size == 0 {
            return Err(Error::config("cache_size must be at least 1"));
        }
        if self.max_nesting == 0 {
            return Err(Error::config("max_nesting must be at least 1"));
        }
        Ok(())
    }
}
