//! Place-name lookup for coordinates. Display text only; never required.

use std::fmt::Debug;

use async_trait::async_trait;

use crate::location::Coordinates;

#[async_trait]
pub trait PlaceNameResolver: Send + Sync + Debug {
    async fn resolve(&self, coords: Coordinates) -> anyhow::Result<String>;
}

/// Resolves every location to the same name.
#[derive(Debug, Clone)]
pub struct FixedPlaceName {
    name: String,
}

impl FixedPlaceName {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl PlaceNameResolver for FixedPlaceName {
    async fn resolve(&self, _coords: Coordinates) -> anyhow::Result<String> {
        Ok(self.name.clone())
    }
}
