//! Hyperparameter search space definitions and prior sampling.

use ht_types::{Assignment, ParamValue};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Describes how one flag is sampled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Distribution {
    /// Continuous uniform over [low, high].
    Uniform { low: f64, high: f64 },
    /// Integer uniform over [low, high] inclusive.
    UniformInt { low: i64, high: i64 },
    /// Uniform over [low, high], rounded to the nearest multiple of `step`.
    /// Stays float-typed; integral coercion is the encoder's concern.
    Quantized { low: f64, high: f64, step: f64 },
    /// Uniform pick from a fixed value set.
    Choice { values: Vec<ParamValue> },
}

impl Distribution {
    /// Draw one value from the prior.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> ParamValue {
        match self {
            Self::Uniform { low, high } => ParamValue::Float(rng.gen_range(*low..=*high)),
            Self::UniformInt { low, high } => ParamValue::Int(rng.gen_range(*low..=*high)),
            Self::Quantized { low, high, step } => {
                let raw: f64 = rng.gen_range(*low..=*high);
                ParamValue::Float((raw / step).round() * step)
            }
            Self::Choice { values } => values[rng.gen_range(0..values.len())],
        }
    }

    /// Numeric domain bounds, or `None` for categorical flags.
    pub fn numeric_bounds(&self) -> Option<(f64, f64)> {
        match self {
            Self::Uniform { low, high } => Some((*low, *high)),
            Self::UniformInt { low, high } => Some((*low as f64, *high as f64)),
            Self::Quantized { low, high, .. } => Some((*low, *high)),
            Self::Choice { .. } => None,
        }
    }

    /// Force a raw numeric candidate into this distribution's domain,
    /// rounding and clamping as the kind requires. `None` for categorical
    /// flags, which have no numeric embedding to constrain.
    pub fn constrain(&self, raw: f64) -> Option<ParamValue> {
        match self {
            Self::Uniform { low, high } => Some(ParamValue::Float(raw.clamp(*low, *high))),
            Self::UniformInt { low, high } => {
                Some(ParamValue::Int((raw.round() as i64).clamp(*low, *high)))
            }
            Self::Quantized { low, high, step } => {
                let quantized = (raw / step).round() * step;
                Some(ParamValue::Float(quantized.clamp(*low, *high)))
            }
            Self::Choice { .. } => None,
        }
    }
}

/// A single flag dimension in the search space. The name doubles as the
/// worker's command-line flag, so it is part of the worker contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagDef {
    pub name: String,
    pub distribution: Distribution,
}

/// The full search space: an ordered list of flag definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HyperparameterSpace {
    flags: Vec<FlagDef>,
}

impl HyperparameterSpace {
    pub fn new() -> Self {
        Self::default()
    }

    fn add(mut self, name: impl Into<String>, distribution: Distribution) -> Self {
        let name = name.into();
        debug_assert!(
            !self.flags.iter().any(|f| f.name == name),
            "duplicate flag {name}"
        );
        self.flags.push(FlagDef { name, distribution });
        self
    }

    pub fn add_uniform(self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.add(name, Distribution::Uniform { low, high })
    }

    pub fn add_uniform_int(self, name: impl Into<String>, low: i64, high: i64) -> Self {
        self.add(name, Distribution::UniformInt { low, high })
    }

    pub fn add_quantized(self, name: impl Into<String>, low: f64, high: f64, step: f64) -> Self {
        self.add(name, Distribution::Quantized { low, high, step })
    }

    pub fn add_choice(self, name: impl Into<String>, values: Vec<ParamValue>) -> Self {
        self.add(name, Distribution::Choice { values })
    }

    /// Present/absent boolean flag.
    pub fn add_switch(self, name: impl Into<String>) -> Self {
        self.add_choice(name, vec![ParamValue::Bool(true), ParamValue::Bool(false)])
    }

    pub fn flags(&self) -> &[FlagDef] {
        &self.flags
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Draw one full assignment from the prior, in flag order.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Assignment {
        self.flags
            .iter()
            .map(|flag| (flag.name.clone(), flag.distribution.sample(rng)))
            .collect()
    }
}
