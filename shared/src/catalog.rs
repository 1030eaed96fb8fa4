use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::CampaignError;

/// A prize that can land under the pointer.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Reward {
    pub code: String,
    pub label: String,
}

impl Reward {
    pub fn new(code: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            label: label.into(),
        }
    }
}

/// Ordered reward list. The order is the order of the wheel segments, so
/// reordering a catalog changes every landing angle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    rewards: Vec<Reward>,
}

impl Catalog {
    pub fn new(rewards: Vec<Reward>) -> Result<Self, CampaignError> {
        if rewards.is_empty() {
            return Err(CampaignError::EmptyCatalog);
        }

        let mut seen = HashSet::with_capacity(rewards.len());
        for reward in &rewards {
            if !seen.insert(reward.code.as_str()) {
                return Err(CampaignError::DuplicateRewardCode(reward.code.clone()));
            }
        }

        Ok(Self { rewards })
    }

    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    /// Always false for a constructed catalog; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    pub fn position(&self, code: &str) -> Option<usize> {
        self.rewards.iter().position(|r| r.code == code)
    }

    pub fn get(&self, code: &str) -> Option<&Reward> {
        self.rewards.iter().find(|r| r.code == code)
    }

    pub fn at(&self, index: usize) -> Option<&Reward> {
        self.rewards.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reward> {
        self.rewards.iter()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.position(code).is_some()
    }
}
