// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_PAGE_SIZE: usize = 100;
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Page size bounds for connection fields.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PageLimits {
    /// Ceiling for `first`/`last`. A request above it is refused, never clamped.
    pub max_page_size: usize,
    /// Used when a request supplies neither `first` nor `last`.
    pub default_page_size: usize,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageLimits {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_page_size == 0 {
            return Err("max_page_size must be > 0".to_string());
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(format!(
                "default_page_size must be within 1..={}",
                self.max_page_size
            ));
        }
        Ok(())
    }
}
