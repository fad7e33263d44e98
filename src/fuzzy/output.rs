//! Output variables: implication, aggregation and centroid defuzzification

use indexmap::IndexMap;
use tracing::warn;

use super::membership::MembershipFunction;
use super::variable::{Domain, Variable};
use crate::error::{FuzzyError, FuzzyResult};

/// An output variable with per-set clip levels and an aggregated curve
#[derive(Debug, Clone)]
pub struct OutputVariable {
    variable: Variable,
    /// Activation level per set, 0 until a rule fires
    clips: IndexMap<String, f64>,
    /// Aggregated membership at every integer point of the domain
    aggregated: Vec<f64>,
}

impl OutputVariable {
    pub fn new(name: impl Into<String>, domain: Domain) -> Self {
        Self {
            variable: Variable::new(name, domain),
            clips: IndexMap::new(),
            aggregated: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.variable.name()
    }

    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    /// Add a set with a zero clip level; see [`Variable::add_set`]
    pub fn add_set(&mut self, name: impl Into<String>, shape: MembershipFunction) -> bool {
        let name = name.into();
        let accepted = self.variable.add_set(name.clone(), shape);
        if accepted {
            self.clips.insert(name, 0.0);
        }
        accepted
    }

    pub fn add_trapezoid(
        &mut self,
        name: impl Into<String>,
        min: f64,
        max: f64,
        flat_start: f64,
        flat_end: f64,
    ) -> bool {
        self.add_set(name, MembershipFunction::trapezoid(min, max, flat_start, flat_end))
    }

    pub fn add_triangular(&mut self, name: impl Into<String>, min: f64, peak: f64, max: f64) -> bool {
        self.add_set(name, MembershipFunction::triangular(min, peak, max))
    }

    /// Raise a set's activation to `level`; never lowers it
    pub fn clip(&mut self, set: &str, level: f64) -> FuzzyResult<()> {
        let current = self
            .clips
            .get_mut(set)
            .ok_or_else(|| FuzzyError::unknown_set(self.variable.name(), set))?;
        *current = current.max(level);
        Ok(())
    }

    pub fn clip_level(&self, set: &str) -> Option<f64> {
        self.clips.get(set).copied()
    }

    pub fn clip_levels(&self) -> &IndexMap<String, f64> {
        &self.clips
    }

    /// Union of the clipped sets sampled at every integer point of the domain
    pub fn aggregate_outputs(&mut self) {
        let clips = &self.clips;
        let sets = self.variable.sets();
        self.aggregated = self
            .variable
            .domain()
            .grid()
            .map(|x| {
                sets.iter()
                    .map(|set| {
                        let level = clips.get(&set.name).copied().unwrap_or(0.0);
                        set.membership_of(x).min(level)
                    })
                    .fold(0.0, f64::max)
            })
            .collect();
    }

    pub fn aggregated(&self) -> &[f64] {
        &self.aggregated
    }

    /// Centroid of the aggregated curve.
    ///
    /// `None` when nothing was aggregated or when the curve has no mass,
    /// i.e. no rule fired for this output.
    pub fn defuzzify(&self) -> Option<f64> {
        if self.aggregated.is_empty() {
            warn!(variable = %self.name(), "rule evaluations are not aggregated");
            return None;
        }

        let (numerator, denominator) = self
            .aggregated
            .iter()
            .zip(self.variable.domain().grid())
            .fold((0.0, 0.0), |(num, den), (mu, x)| (num + mu * x, den + mu));

        if denominator == 0.0 {
            return None;
        }
        Some(numerator / denominator)
    }

    pub fn clean_aggregated(&mut self) {
        self.aggregated.clear();
    }

    pub fn clean_clips(&mut self) {
        for level in self.clips.values_mut() {
            *level = 0.0;
        }
    }
}
