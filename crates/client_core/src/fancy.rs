use std::collections::BTreeMap;

use serde_json::Value;
use shared::domain::FancyId;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompoundRgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl CompoundRgb {
    pub fn css(&self) -> String {
        format!("rgb({},{},{})", self.r, self.g, self.b)
    }
}

/// White-channel level of a fancy light, both values in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayLevel {
    pub intensity: f64,
    pub balance: f64,
}

#[derive(Debug, Error)]
pub enum ColorMathError {
    #[error("color math is unavailable")]
    Unavailable,
    #[error("color payload is missing field '{0}'")]
    MissingField(String),
    #[error("color payload is invalid: {0}")]
    Invalid(String),
}

/// Derivations from a fancy light color payload. Implemented outside this crate.
pub trait ColorMath: Send + Sync {
    fn compound_rgb(&self, payload: &Value) -> Result<CompoundRgb, ColorMathError>;
    fn day_level(&self, payload: &Value) -> Result<DayLevel, ColorMathError>;
}

pub struct MissingColorMath;

impl ColorMath for MissingColorMath {
    fn compound_rgb(&self, _payload: &Value) -> Result<CompoundRgb, ColorMathError> {
        Err(ColorMathError::Unavailable)
    }

    fn day_level(&self, _payload: &Value) -> Result<DayLevel, ColorMathError> {
        Err(ColorMathError::Unavailable)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedColor {
    pub rgb: CompoundRgb,
    pub day_level: DayLevel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompoundColorState {
    pub payload: Value,
    pub derived: Option<DerivedColor>,
}

pub struct FancyLightCache<M: ColorMath> {
    math: M,
    entries: BTreeMap<FancyId, CompoundColorState>,
}

impl<M: ColorMath> FancyLightCache<M> {
    pub fn new(math: M) -> Self {
        Self {
            math,
            entries: BTreeMap::new(),
        }
    }

    /// Replaces the entry for `fancy` with `payload`, then derives swatch and
    /// slider values. The payload stays cached when derivation fails.
    pub fn update_from_external(
        &mut self,
        fancy: FancyId,
        payload: Value,
    ) -> Result<DerivedColor, ColorMathError> {
        let derived = self.derive(&payload);
        self.entries.insert(
            fancy,
            CompoundColorState {
                payload,
                derived: derived.as_ref().ok().copied(),
            },
        );
        derived
    }

    pub fn get(&self, fancy: &FancyId) -> Option<&CompoundColorState> {
        self.entries.get(fancy)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FancyId, &CompoundColorState)> {
        self.entries.iter()
    }

    fn derive(&self, payload: &Value) -> Result<DerivedColor, ColorMathError> {
        Ok(DerivedColor {
            rgb: self.math.compound_rgb(payload)?,
            day_level: self.math.day_level(payload)?,
        })
    }
}
