//! Linguistic variables: a named domain with an ordered list of fuzzy sets

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::membership::MembershipFunction;
use crate::error::{ErrorCode, FuzzyResult};
use crate::fuzzy_ensure;

/// Most integer sample points a domain may span
pub const MAX_GRID_POINTS: usize = 1_000_000;

/// Closed universe of discourse `[lo, hi]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Domain {
    lo: f64,
    hi: f64,
}

impl Domain {
    pub fn new(lo: f64, hi: f64) -> FuzzyResult<Self> {
        fuzzy_ensure!(
            lo.is_finite() && hi.is_finite(),
            ErrorCode::InvalidDomain,
            "domain bounds must be finite: [{}, {}]",
            lo,
            hi
        );
        fuzzy_ensure!(
            lo <= hi,
            ErrorCode::InvalidDomain,
            "domain lower bound {} exceeds upper bound {}",
            lo,
            hi
        );
        let span = hi.floor() - lo.ceil() + 1.0;
        fuzzy_ensure!(
            span <= MAX_GRID_POINTS as f64,
            ErrorCode::InvalidDomain,
            "domain [{}, {}] spans more than {} integer points",
            lo,
            hi,
            MAX_GRID_POINTS
        );
        Ok(Self { lo, hi })
    }

    pub fn lo(&self) -> f64 {
        self.lo
    }

    pub fn hi(&self) -> f64 {
        self.hi
    }

    /// Whether a set's support lies inside the domain
    pub fn contains_support(&self, support: (f64, f64)) -> bool {
        support.0 >= self.lo && support.1 <= self.hi
    }

    /// Integer sample points of the domain, inclusive, step 1
    pub fn grid(&self) -> impl Iterator<Item = f64> {
        let start = self.lo.ceil() as i64;
        let end = self.hi.floor() as i64;
        (start..=end).map(|x| x as f64)
    }

    /// Number of points yielded by [`Domain::grid`]
    pub fn grid_len(&self) -> usize {
        let start = self.lo.ceil() as i64;
        let end = self.hi.floor() as i64;
        end.checked_sub(start)
            .and_then(|d| d.checked_add(1))
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0)
    }
}

/// A named fuzzy set (term) of a variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzySet {
    pub name: String,
    pub shape: MembershipFunction,
}

impl FuzzySet {
    pub fn new(name: impl Into<String>, shape: MembershipFunction) -> Self {
        Self {
            name: name.into(),
            shape,
        }
    }

    pub fn membership_of(&self, x: f64) -> f64 {
        self.shape.evaluate(x)
    }
}

/// A linguistic variable with an ordered collection of sets
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    name: String,
    domain: Domain,
    sets: Vec<FuzzySet>,
}

impl Variable {
    pub fn new(name: impl Into<String>, domain: Domain) -> Self {
        Self {
            name: name.into(),
            domain,
            sets: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Sets in declaration order
    pub fn sets(&self) -> &[FuzzySet] {
        &self.sets
    }

    pub fn set(&self, name: &str) -> Option<&FuzzySet> {
        self.sets.iter().find(|s| s.name == name)
    }

    pub fn has_set(&self, name: &str) -> bool {
        self.set(name).is_some()
    }

    /// Add a set, returning whether it was accepted.
    ///
    /// A set whose support leaves the domain is discarded with a warning.
    /// Re-adding an existing name replaces that set in place.
    pub fn add_set(&mut self, name: impl Into<String>, shape: MembershipFunction) -> bool {
        let name = name.into();
        if !self.domain.contains_support(shape.support()) {
            warn!(
                variable = %self.name,
                set = %name,
                "set support {:?} is out of bounds for the universe of discourse [{}, {}]; set dropped",
                shape.support(),
                self.domain.lo,
                self.domain.hi
            );
            return false;
        }

        match self.sets.iter_mut().find(|s| s.name == name) {
            Some(existing) => {
                warn!(variable = %self.name, set = %name, "set redefined");
                existing.shape = shape;
            }
            None => self.sets.push(FuzzySet::new(name, shape)),
        }
        true
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

    /// Replace every set definition, keeping the ones that fit the domain
    pub fn replace_sets(&mut self, sets: &[FuzzySet]) {
        self.sets.clear();
        for set in sets {
            self.add_set(set.name.clone(), set.shape);
        }
    }

    /// Degree of membership of `x` in every set, in declaration order
    pub fn compute_membership(&self, x: f64) -> IndexMap<String, f64> {
        if self.sets.is_empty() {
            warn!(variable = %self.name, "no membership set is defined");
            return IndexMap::new();
        }
        self.sets
            .iter()
            .map(|set| (set.name.clone(), set.membership_of(x)))
            .collect()
    }
}
