//! Injectable randomness for node construction.
//!
//! Every random field is derived from a single uniform draw in `[0, 1)`, so a
//! `FixedSequence` fully determines a build.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::entities::{ChildType, GrandChildType, NumRange};

/// Source of uniform draws in `[0, 1)`.
pub trait RandomSource {
    fn next_unit(&mut self) -> f64;
}

/// `StdRng`-backed source, reproducible when seeded.
#[derive(Debug, Clone)]
pub struct SeededSource {
    rng: StdRng,
}

impl SeededSource {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded when `seed` is given, entropy otherwise.
    pub fn new(seed: Option<u64>) -> Self {
        seed.map(Self::from_seed).unwrap_or_else(Self::from_entropy)
    }
}

impl RandomSource for SeededSource {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Cycles through a fixed list of draws. An empty list always yields 0.
#[derive(Debug, Clone, Default)]
pub struct FixedSequence {
    values: Vec<f64>,
    cursor: usize,
}

impl FixedSequence {
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        Self {
            values: values.into(),
            cursor: 0,
        }
    }

    /// Number of draws taken so far.
    pub fn draws(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for FixedSequence {
    fn next_unit(&mut self) -> f64 {
        if self.values.is_empty() {
            self.cursor += 1;
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value
    }
}

fn third(u: f64) -> usize {
    if u < 1.0 / 3.0 {
        0
    } else if u < 2.0 / 3.0 {
        1
    } else {
        2
    }
}

pub fn draw_child_type(rng: &mut dyn RandomSource) -> ChildType {
    ChildType::ALL[third(rng.next_unit())]
}

pub fn draw_grandchild_type(rng: &mut dyn RandomSource) -> GrandChildType {
    GrandChildType::ALL[third(rng.next_unit())]
}

pub fn draw_in_range(rng: &mut dyn RandomSource, range: NumRange) -> f64 {
    range.min + rng.next_unit() * (range.max - range.min)
}
