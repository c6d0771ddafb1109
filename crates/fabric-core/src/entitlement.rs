use std::collections::HashMap;

use async_trait::async_trait;
use fabric_model::Tier;

use crate::{error::CollaboratorError, ports::TierResolver};

/// In-memory caller → tier table with a fallback tier.
#[derive(Debug, Clone, Default)]
pub struct StaticTierResolver {
    tiers: HashMap<String, Tier>,
    fallback: Tier,
}

impl StaticTierResolver {
    pub fn new(fallback: Tier) -> Self {
        Self {
            tiers: HashMap::new(),
            fallback,
        }
    }

    pub fn with(mut self, caller: impl Into<String>, tier: Tier) -> Self {
        self.tiers.insert(caller.into(), tier);
        self
    }

    pub fn insert(&mut self, caller: impl Into<String>, tier: Tier) -> Option<Tier> {
        self.tiers.insert(caller.into(), tier)
    }

    pub fn lookup(&self, caller: &str) -> &Tier {
        self.tiers.get(caller).unwrap_or(&self.fallback)
    }
}

#[async_trait]
impl TierResolver for StaticTierResolver {
    async fn resolve(&self, caller: &str) -> Result<Tier, CollaboratorError> {
        Ok(self.lookup(caller).clone())
    }
}
