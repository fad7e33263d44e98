//! Fuzzy rules: `IF v1 IS s1 AND v2 IS s2 ... THEN out IS set`

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::registry::VariableRegistry;
use crate::error::{FuzzyError, FuzzyResult};

/// The THEN part of a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consequent {
    /// Output variable name
    pub variable: String,
    /// Output set name
    pub set: String,
}

/// A conjunctive rule over input variables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub consequent: Consequent,
    /// Variable name -> set name, ANDed together
    pub antecedent: IndexMap<String, String>,
    /// Explicit priority; falls back to the number of conditions
    priority: Option<i64>,
}

impl Rule {
    pub fn new(output_variable: impl Into<String>, output_set: impl Into<String>) -> Self {
        Self {
            consequent: Consequent {
                variable: output_variable.into(),
                set: output_set.into(),
            },
            antecedent: IndexMap::new(),
            priority: None,
        }
    }

    /// Add a condition; a variable named twice keeps the last set
    pub fn add_condition(&mut self, variable: impl Into<String>, set: impl Into<String>) {
        self.antecedent.insert(variable.into(), set.into());
    }

    pub fn with_condition(mut self, variable: impl Into<String>, set: impl Into<String>) -> Self {
        self.add_condition(variable, set);
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn set_priority(&mut self, priority: Option<i64>) {
        self.priority = priority;
    }

    pub fn priority(&self) -> i64 {
        self.priority.unwrap_or(self.antecedent.len() as i64)
    }

    pub fn condition_count(&self) -> usize {
        self.antecedent.len()
    }

    /// True iff every antecedent variable is an input fuzzified in this run
    pub fn is_applicable(&self, registry: &VariableRegistry) -> bool {
        self.antecedent.keys().all(|name| {
            registry
                .input(name)
                .map(|var| var.is_applicable())
                .unwrap_or(false)
        })
    }

    /// Firing strength: minimum degree over all conditions.
    ///
    /// Unknown variables, unfuzzified variables and unknown sets are
    /// configuration errors and abort the evaluation.
    pub fn evaluate(&self, registry: &VariableRegistry) -> FuzzyResult<f64> {
        let mut strength: f64 = 1.0;

        for (name, set) in &self.antecedent {
            let var = match registry.input(name) {
                Some(var) => var,
                None if registry.output(name).is_some() => {
                    return Err(FuzzyError::unknown_variable(name).with_hint(
                        "output variables are read through their derived input variable",
                    ));
                }
                None => return Err(FuzzyError::unknown_variable(name)),
            };

            if !var.is_applicable() {
                return Err(FuzzyError::not_fuzzified(name));
            }

            let degree = var
                .degree(set)
                .ok_or_else(|| FuzzyError::unknown_set(name, set))?;

            strength = strength.min(degree);
        }

        Ok(strength)
    }

    /// Human-readable rule text used in execution traces
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let conditions = if self.antecedent.is_empty() {
            "TRUE".to_string()
        } else {
            self.antecedent
                .iter()
                .map(|(var, set)| format!("{} IS {}", var, set))
                .collect::<Vec<_>>()
                .join(" AND ")
        };
        write!(
            f,
            "IF {} THEN {} IS {}",
            conditions, self.consequent.variable, self.consequent.set
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::fuzzy::input::InputVariable;
    use crate::fuzzy::output::OutputVariable;
    use crate::fuzzy::variable::Domain;

    fn registry() -> VariableRegistry {
        let mut registry = VariableRegistry::new();
        let mut var = InputVariable::new("test_input_var", Domain::new(0.0, 30.0).unwrap());
        var.variable_mut().add_trapezoid("kucuk", 0.0, 20.0, 5.0, 12.0);
        var.variable_mut().add_triangular("orta", 17.0, 22.0, 30.0);
        registry.register_input(var).unwrap();

        let mut other = InputVariable::new("other", Domain::new(0.0, 10.0).unwrap());
        other.variable_mut().add_triangular("mid", 0.0, 5.0, 10.0);
        registry.register_input(other).unwrap();

        let mut out = OutputVariable::new("out", Domain::new(0.0, 10.0).unwrap());
        out.add_triangular("high", 5.0, 10.0, 10.0);
        registry.register_output(out).unwrap();
        registry
    }

    #[test]
    fn test_conjunction_is_minimum() {
        let mut registry = registry();
        registry.input_mut("test_input_var").unwrap().fuzzify(18.0);

        let rule = Rule::new("out", "high")
            .with_condition("test_input_var", "kucuk")
            .with_condition("test_input_var", "orta");
        // same variable twice: last write wins
        assert_eq!(rule.condition_count(), 1);

        let kucuk_only = Rule::new("out", "high").with_condition("test_input_var", "kucuk");
        let strength_kucuk = kucuk_only.evaluate(&registry).unwrap();
        assert!((strength_kucuk - 0.25).abs() < 1e-9);

        let strength = rule.evaluate(&registry).unwrap();
        assert!((strength - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_two_conditions_take_min() {
        let mut registry = registry();
        registry.input_mut("test_input_var").unwrap().fuzzify(18.0);
        registry.input_mut("other").unwrap().fuzzify(4.0);

        let rule = Rule::new("out", "high")
            .with_condition("test_input_var", "kucuk")
            .with_condition("other", "mid");
        assert!((rule.evaluate(&registry).unwrap() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_applicability_requires_fuzzified_inputs() {
        let mut registry = registry();
        let rule = Rule::new("out", "high")
            .with_condition("test_input_var", "kucuk")
            .with_condition("other", "mid");
        assert!(!rule.is_applicable(&registry));

        registry.input_mut("test_input_var").unwrap().fuzzify(3.0);
        assert!(!rule.is_applicable(&registry));

        registry.input_mut("other").unwrap().fuzzify(3.0);
        assert!(rule.is_applicable(&registry));

        let unknown = Rule::new("out", "high").with_condition("ghost", "x");
        assert!(!unknown.is_applicable(&registry));
    }

    #[test]
    fn test_evaluate_fatal_conditions() {
        let mut registry = registry();

        let ghost = Rule::new("out", "high").with_condition("ghost", "x");
        assert_eq!(ghost.evaluate(&registry).unwrap_err().code, ErrorCode::UnknownVariable);

        let output_as_input = Rule::new("out", "high").with_condition("out", "high");
        assert_eq!(
            output_as_input.evaluate(&registry).unwrap_err().code,
            ErrorCode::UnknownVariable
        );

        let unfuzzified = Rule::new("out", "high").with_condition("other", "mid");
        assert_eq!(unfuzzified.evaluate(&registry).unwrap_err().code, ErrorCode::NotFuzzified);

        registry.input_mut("other").unwrap().fuzzify(5.0);
        let bad_set = Rule::new("out", "high").with_condition("other", "enormous");
        assert_eq!(bad_set.evaluate(&registry).unwrap_err().code, ErrorCode::UnknownSet);
    }

    #[test]
    fn test_default_priority_is_condition_count() {
        let rule = Rule::new("out", "high")
            .with_condition("a", "x")
            .with_condition("b", "y");
        assert_eq!(rule.priority(), 2);
        assert_eq!(rule.clone().with_priority(7).priority(), 7);
    }

    #[test]
    fn test_render() {
        let rule = Rule::new("loan", "approve")
            .with_condition("income", "high")
            .with_condition("computed_house", "good");
        assert_eq!(
            rule.render(),
            "IF income IS high AND computed_house IS good THEN loan IS approve"
        );
    }
}
