//! Input variables and fuzzification state

use indexmap::IndexMap;
use tracing::warn;

use super::variable::{Domain, Variable};

/// An input variable holding the degrees of its latest fuzzification
#[derive(Debug, Clone)]
pub struct InputVariable {
    variable: Variable,
    degrees: IndexMap<String, f64>,
}

impl InputVariable {
    pub fn new(name: impl Into<String>, domain: Domain) -> Self {
        Self::from_variable(Variable::new(name, domain))
    }

    pub fn from_variable(variable: Variable) -> Self {
        Self {
            variable,
            degrees: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.variable.name()
    }

    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    pub fn variable_mut(&mut self) -> &mut Variable {
        &mut self.variable
    }

    /// Recompute degrees for every set, discarding the previous ones
    pub fn fuzzify(&mut self, crisp: f64) {
        self.degrees = self.variable.compute_membership(crisp);
        if self.degrees.is_empty() {
            warn!(variable = %self.name(), value = crisp, "fuzzification failed");
        }
    }

    /// Degrees from the latest fuzzification, `None` when not fuzzified
    pub fn degrees(&self) -> Option<&IndexMap<String, f64>> {
        if self.is_applicable() {
            Some(&self.degrees)
        } else {
            None
        }
    }

    pub fn degree(&self, set: &str) -> Option<f64> {
        self.degrees.get(set).copied()
    }

    /// True iff fuzzified since the last reset
    pub fn is_applicable(&self) -> bool {
        !self.degrees.is_empty()
    }

    pub fn clean_memberships(&mut self) {
        self.degrees.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> InputVariable {
        let mut var = InputVariable::new("test_input_var", Domain::new(0.0, 30.0).unwrap());
        var.variable_mut().add_trapezoid("kucuk", 0.0, 20.0, 5.0, 12.0);
        var.variable_mut().add_triangular("orta", 17.0, 22.0, 30.0);
        var
    }

    #[test]
    fn test_fuzzify_makes_applicable() {
        let mut var = sample();
        assert!(!var.is_applicable());
        assert!(var.degrees().is_none());

        var.fuzzify(18.0);
        assert!(var.is_applicable());
        assert!((var.degree("kucuk").unwrap() - 0.25).abs() < 1e-9);
        assert!((var.degree("orta").unwrap() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_fuzzify_replaces_previous_degrees() {
        let mut var = sample();
        var.fuzzify(18.0);
        var.fuzzify(8.0);
        assert_eq!(var.degree("kucuk"), Some(1.0));
        assert_eq!(var.degree("orta"), Some(0.0));
        assert_eq!(var.degrees().unwrap().len(), 2);
    }

    #[test]
    fn test_clean_memberships() {
        let mut var = sample();
        var.fuzzify(18.0);
        var.clean_memberships();
        assert!(!var.is_applicable());
        assert_eq!(var.degree("kucuk"), None);
    }

    #[test]
    fn test_fuzzify_without_sets_stays_inapplicable() {
        let mut var = InputVariable::new("bare", Domain::new(0.0, 10.0).unwrap());
        var.fuzzify(3.0);
        assert!(!var.is_applicable());
    }
}
