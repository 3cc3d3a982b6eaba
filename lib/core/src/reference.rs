//! Stranger reference vectors, loaded once per run

use crate::distance::euclidean_distance;
use crate::layout::LatentLayout;
use crate::loader::VectorLoader;
use crate::vector::CanonicalVector;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// Participant sex category, parsed case-insensitively from `f` / `m`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    Female,
    Male,
}

impl Sex {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            v if v.eq_ignore_ascii_case("f") => Some(Sex::Female),
            v if v.eq_ignore_ascii_case("m") => Some(Sex::Male),
            _ => None,
        }
    }

    /// The two strangers a participant of this sex is compared against
    pub fn strangers(self) -> (StrangerKey, StrangerKey) {
        match self {
            Sex::Female => (StrangerKey::Fu1, StrangerKey::Fu2),
            Sex::Male => (StrangerKey::Mu1, StrangerKey::Mu2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrangerKey {
    Fu1,
    Fu2,
    Mu1,
    Mu2,
}

impl StrangerKey {
    pub const ALL: [StrangerKey; 4] = [
        StrangerKey::Fu1,
        StrangerKey::Fu2,
        StrangerKey::Mu1,
        StrangerKey::Mu2,
    ];

    /// File identifier used by the naming convention
    pub fn id(self) -> &'static str {
        match self {
            StrangerKey::Fu1 => "fu1",
            StrangerKey::Fu2 => "fu2",
            StrangerKey::Mu1 => "mu1",
            StrangerKey::Mu2 => "mu2",
        }
    }

    fn slot(self) -> usize {
        match self {
            StrangerKey::Fu1 => 0,
            StrangerKey::Fu2 => 1,
            StrangerKey::Mu1 => 2,
            StrangerKey::Mu2 => 3,
        }
    }
}

impl fmt::Display for StrangerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Distances from one participant to the two sex-matched strangers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrangerDistances {
    pub u1: f64,
    pub u2: f64,
}

/// The four canonical stranger latents, immutable once built
#[derive(Debug, Clone)]
pub struct ReferenceSet {
    vectors: [CanonicalVector; 4],
}

impl ReferenceSet {
    /// Build from already canonical vectors, in `fu1, fu2, mu1, mu2` order
    pub fn new(
        fu1: CanonicalVector,
        fu2: CanonicalVector,
        mu1: CanonicalVector,
        mu2: CanonicalVector,
    ) -> Self {
        Self {
            vectors: [fu1, fu2, mu1, mu2],
        }
    }

    /// Load all four references; any failure aborts with the offending key
    pub fn load(layout: &LatentLayout, loader: &VectorLoader) -> Result<Self> {
        let load = |key: StrangerKey| -> Result<CanonicalVector> {
            let path = layout
                .resolve(key.id())
                .unwrap_or_else(|| layout.expected(key.id()));
            let vector = loader.load_canonical(&path).map_err(|e| Error::Reference {
                key: key.id().to_string(),
                source: Box::new(e),
            })?;
            info!(key = %key, path = %path.display(), "Loaded stranger reference");
            Ok(vector)
        };

        Ok(Self::new(
            load(StrangerKey::Fu1)?,
            load(StrangerKey::Fu2)?,
            load(StrangerKey::Mu1)?,
            load(StrangerKey::Mu2)?,
        ))
    }

    pub fn get(&self, key: StrangerKey) -> &CanonicalVector {
        &self.vectors[key.slot()]
    }

    /// Distances from `participant` to the strangers matching `sex`
    pub fn distances(&self, sex: Sex, participant: &CanonicalVector) -> StrangerDistances {
        let (first, second) = sex.strangers();
        StrangerDistances {
            u1: euclidean_distance(participant, self.get(first)),
            u2: euclidean_distance(participant, self.get(second)),
        }
    }
}
