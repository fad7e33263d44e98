//! Variable registry owned by an engine instance
//!
//! Names are unique across input and output variables. Registering a name
//! twice is an error rather than a silent replacement.

use indexmap::IndexMap;

use super::input::InputVariable;
use super::output::OutputVariable;
use crate::error::{FuzzyError, FuzzyResult};

/// Name-keyed registry of input and output variables, in registration order
#[derive(Debug, Clone, Default)]
pub struct VariableRegistry {
    inputs: IndexMap<String, InputVariable>,
    outputs: IndexMap<String, OutputVariable>,
}

impl VariableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_input(&mut self, var: InputVariable) -> FuzzyResult<()> {
        self.ensure_unused(var.name())?;
        self.inputs.insert(var.name().to_string(), var);
        Ok(())
    }

    pub fn register_output(&mut self, var: OutputVariable) -> FuzzyResult<()> {
        self.ensure_unused(var.name())?;
        self.outputs.insert(var.name().to_string(), var);
        Ok(())
    }

    fn ensure_unused(&self, name: &str) -> FuzzyResult<()> {
        if self.contains(name) {
            return Err(FuzzyError::duplicate_variable(name));
        }
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inputs.contains_key(name) || self.outputs.contains_key(name)
    }

    /// Input variable by name; `None` lets the caller decide fatality
    pub fn input(&self, name: &str) -> Option<&InputVariable> {
        self.inputs.get(name)
    }

    pub fn input_mut(&mut self, name: &str) -> Option<&mut InputVariable> {
        self.inputs.get_mut(name)
    }

    pub fn output(&self, name: &str) -> Option<&OutputVariable> {
        self.outputs.get(name)
    }

    pub fn output_mut(&mut self, name: &str) -> Option<&mut OutputVariable> {
        self.outputs.get_mut(name)
    }

    pub fn inputs(&self) -> impl Iterator<Item = &InputVariable> {
        self.inputs.values()
    }

    pub fn outputs(&self) -> impl Iterator<Item = &OutputVariable> {
        self.outputs.values()
    }

    pub fn output_names(&self) -> impl Iterator<Item = &str> {
        self.outputs.keys().map(String::as_str)
    }

    /// Clear all per-run state: degrees, clip levels, aggregated curves
    pub fn reset(&mut self) {
        for var in self.inputs.values_mut() {
            var.clean_memberships();
        }
        for var in self.outputs.values_mut() {
            var.clean_aggregated();
            var.clean_clips();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::fuzzy::variable::Domain;

    fn domain() -> Domain {
        Domain::new(0.0, 10.0).unwrap()
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut registry = VariableRegistry::new();
        registry.register_input(InputVariable::new("x", domain())).unwrap();

        let err = registry.register_input(InputVariable::new("x", domain())).unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateVariable);

        let err = registry.register_output(OutputVariable::new("x", domain())).unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateVariable);
    }

    #[test]
    fn test_lookup_not_found_is_none() {
        let mut registry = VariableRegistry::new();
        registry.register_output(OutputVariable::new("y", domain())).unwrap();

        assert!(!registry.contains("nope"));
        assert!(registry.contains("y"));
        assert!(registry.input("y").is_none());
        assert_eq!(registry.output("y").unwrap().name(), "y");
    }

    #[test]
    fn test_reset_clears_run_state() {
        let mut registry = VariableRegistry::new();
        let mut input = InputVariable::new("x", domain());
        input.variable_mut().add_triangular("mid", 0.0, 5.0, 10.0);
        registry.register_input(input).unwrap();

        let mut output = OutputVariable::new("y", domain());
        output.add_triangular("mid", 0.0, 5.0, 10.0);
        registry.register_output(output).unwrap();

        registry.input_mut("x").unwrap().fuzzify(4.0);
        let out = registry.output_mut("y").unwrap();
        out.clip("mid", 0.7).unwrap();
        out.aggregate_outputs();

        registry.reset();
        assert!(!registry.input("x").unwrap().is_applicable());
        assert_eq!(registry.output("y").unwrap().clip_level("mid"), Some(0.0));
        assert!(registry.output("y").unwrap().aggregated().is_empty());
    }
}
