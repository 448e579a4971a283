use serde::Serialize;

use crate::billing::models::Role;
use crate::config;
use crate::error::{AppError, AppResult};

/// key: quota-gate -> admission by input size
///
/// Runs before any provider is contacted. It never touches counters; the caller records
/// usage once the translation has actually completed.
#[derive(Clone, Copy, Debug)]
pub struct QuotaGate {
    free_line_limit: usize,
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct QuotaDecision {
    pub line_count: usize,
    /// `None` for unlimited tiers.
    pub limit: Option<usize>,
}

impl QuotaGate {
    pub fn new(free_line_limit: usize) -> Self {
        Self { free_line_limit }
    }

    pub fn from_config() -> Self {
        Self::new(*config::FREE_TIER_LINE_LIMIT)
    }

    pub fn free_line_limit(&self) -> usize {
        self.free_line_limit
    }

    pub fn authorize_translation(&self, role: Role, source_code: &str) -> AppResult<QuotaDecision> {
        let line_count = line_count(source_code);
        match role {
            Role::Premium => Ok(QuotaDecision {
                line_count,
                limit: None,
            }),
            Role::Free if line_count > self.free_line_limit => Err(AppError::QuotaExceeded {
                line_count,
                limit: self.free_line_limit,
            }),
            Role::Free => Ok(QuotaDecision {
                line_count,
                limit: Some(self.free_line_limit),
            }),
        }
    }
}

impl Default for QuotaGate {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Number of newline-delimited segments; a trailing newline opens one more (empty) segment.
pub fn line_count(text: &str) -> usize {
    text.split('\n').count()
}
