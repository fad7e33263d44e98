//! JSON system descriptions
//!
//! A system description declares the input and output variables with their
//! sets, and the rule stages that map inputs to outputs:
//!
//! ```json
//! {
//!   "InputSets": [
//!     { "var_name": "income", "x_range": [0, 100], "sets": [
//!         { "set_name": "low", "set_type": "trapezoid",
//!           "set_min_x": 0, "set_max_x": 40,
//!           "set_flatness_start_x": 0, "set_flatness_end_x": 20 } ] }
//!   ],
//!   "OutputSets": [ ... ],
//!   "RuleStages": {
//!     "LoanRules": {
//!       "output_variable_name": "loan",
//!       "priority": 1,
//!       "Rules": [
//!         { "aggregation_set_name": "reject", "priority": 2,
//!           "conditions": [
//!             { "input_variable_name": "income",
//!               "monotonic_selection_set_name": "low" } ] } ] } }
//! }
//! ```
//!
//! Stage declaration order is preserved and breaks ties between equal stage
//! priorities.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ErrorCode, FuzzyError, FuzzyResult};
use crate::fuzzy::input::InputVariable;
use crate::fuzzy::membership::MembershipFunction;
use crate::fuzzy::output::OutputVariable;
use crate::fuzzy::registry::VariableRegistry;
use crate::fuzzy::rule::Rule;
use crate::fuzzy::stage::{derived_name, RuleStage};
use crate::fuzzy::variable::{Domain, Variable};
use crate::fuzzy_bail;

/// System description loading errors
#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid system description: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown set type '{set_type}' for set '{set}' of variable '{variable}'")]
    UnknownSetType {
        variable: String,
        set: String,
        set_type: String,
    },

    #[error("Set '{set}' of variable '{variable}' is missing '{field}'")]
    MissingField {
        variable: String,
        set: String,
        field: &'static str,
    },
}

impl From<SystemError> for FuzzyError {
    fn from(err: SystemError) -> Self {
        match &err {
            SystemError::Io { path, source } => FuzzyError::new(
                ErrorCode::ConfigNotFound,
                format!("Failed to read {}", path.display()),
            )
            .with_context("path", path.display().to_string())
            .with_cause(source.to_string()),
            SystemError::Json(_) => FuzzyError::new(ErrorCode::InvalidJson, err.to_string()),
            SystemError::UnknownSetType { .. } => {
                FuzzyError::new(ErrorCode::UnknownSetType, err.to_string())
            }
            SystemError::MissingField { .. } => {
                FuzzyError::new(ErrorCode::MissingShapeField, err.to_string())
            }
        }
    }
}

// ============================================================================
// Schema
// ============================================================================

/// A complete system description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemDefinition {
    #[serde(rename = "InputSets", default)]
    pub inputs: Vec<VariableDefinition>,
    #[serde(rename = "OutputSets", default)]
    pub outputs: Vec<VariableDefinition>,
    #[serde(rename = "RuleStages", default)]
    pub stages: IndexMap<String, StageDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDefinition {
    pub var_name: String,
    pub x_range: [f64; 2],
    #[serde(default)]
    pub sets: Vec<SetDefinition>,
}

/// One membership set; which shape fields are required depends on `set_type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetDefinition {
    pub set_name: String,
    pub set_type: String,
    pub set_min_x: f64,
    pub set_max_x: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_flatness_start_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_flatness_end_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_peak_x: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDefinition {
    pub output_variable_name: String,
    #[serde(default)]
    pub priority: i64,
    #[serde(rename = "Rules", default)]
    pub rules: Vec<RuleDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub aggregation_set_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(default)]
    pub conditions: Vec<ConditionDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionDefinition {
    pub input_variable_name: String,
    pub monotonic_selection_set_name: String,
}

impl SetDefinition {
    /// Resolve the declared shape of this set
    pub fn shape(&self, variable: &str) -> Result<MembershipFunction, SystemError> {
        let require = |value: Option<f64>, field: &'static str| {
            value.ok_or_else(|| SystemError::MissingField {
                variable: variable.to_string(),
                set: self.set_name.clone(),
                field,
            })
        };

        match self.set_type.to_lowercase().as_str() {
            "trapezoid" | "trapezoidal" => Ok(MembershipFunction::trapezoid(
                self.set_min_x,
                self.set_max_x,
                require(self.set_flatness_start_x, "set_flatness_start_x")?,
                require(self.set_flatness_end_x, "set_flatness_end_x")?,
            )),
            "triangular" | "triangle" => Ok(MembershipFunction::triangular(
                self.set_min_x,
                require(self.set_peak_x, "set_peak_x")?,
                self.set_max_x,
            )),
            other => Err(SystemError::UnknownSetType {
                variable: variable.to_string(),
                set: self.set_name.clone(),
                set_type: other.to_string(),
            }),
        }
    }
}

impl VariableDefinition {
    pub fn domain(&self) -> FuzzyResult<Domain> {
        Domain::new(self.x_range[0], self.x_range[1])
            .map_err(|e| e.with_context("variable", self.var_name.clone()))
    }

    /// Build the variable; sets outside the domain are dropped with a warning
    fn build(&self) -> FuzzyResult<Variable> {
        let mut variable = Variable::new(self.var_name.clone(), self.domain()?);
        for set in &self.sets {
            variable.add_set(set.set_name.clone(), set.shape(&self.var_name)?);
        }
        Ok(variable)
    }
}

// ============================================================================
// Loading and validation
// ============================================================================

impl SystemDefinition {
    pub fn from_json_str(content: &str) -> Result<Self, SystemError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SystemError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SystemError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    pub fn to_json_pretty(&self) -> FuzzyResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the description for structural errors.
    ///
    /// Out-of-domain sets are not errors here; they are dropped with a
    /// warning when the variables are built, and rules concluding on them
    /// are excluded by the engine. A consequent set that is not declared at
    /// all is an error.
    pub fn validate(&self, derived_prefix: &str) -> FuzzyResult<()> {
        let mut names: HashSet<String> = HashSet::new();

        for def in self.inputs.iter().chain(self.outputs.iter()) {
            if !names.insert(def.var_name.clone()) {
                return Err(FuzzyError::duplicate_variable(&def.var_name));
            }
            def.domain()?;
            for set in &def.sets {
                set.shape(&def.var_name)?.validate().map_err(|e| {
                    e.with_context("variable", def.var_name.clone())
                        .with_context("set", set.set_name.clone())
                })?;
            }
        }

        for def in &self.outputs {
            let derived = derived_name(derived_prefix, &def.var_name);
            if !names.insert(derived.clone()) {
                return Err(FuzzyError::duplicate_variable(&derived)
                    .with_hint("a declared variable collides with a derived stage variable"));
            }
        }

        let mut claimed: HashSet<&str> = HashSet::new();
        for (stage_name, stage) in &self.stages {
            let output = stage.output_variable_name.as_str();
            let Some(def) = self.outputs.iter().find(|d| d.var_name == output) else {
                fuzzy_bail!(
                    ErrorCode::UnknownOutput,
                    "stage '{}' targets undeclared output variable '{}'",
                    stage_name,
                    output
                );
            };
            if !claimed.insert(output) {
                fuzzy_bail!(
                    ErrorCode::DuplicateStageOutput,
                    "output variable '{}' is produced by more than one stage",
                    output
                );
            }
            for rule in &stage.rules {
                if !def.sets.iter().any(|s| s.set_name == rule.aggregation_set_name) {
                    return Err(FuzzyError::unknown_set(output, &rule.aggregation_set_name)
                        .with_context("stage", stage_name.clone()));
                }
            }
        }

        Ok(())
    }

    /// Build the variable registry: declared inputs then declared outputs
    pub fn build_registry(&self) -> FuzzyResult<VariableRegistry> {
        let mut registry = VariableRegistry::new();
        for def in &self.inputs {
            registry.register_input(InputVariable::from_variable(def.build()?))?;
        }
        for def in &self.outputs {
            let mut output = OutputVariable::new(def.var_name.clone(), def.domain()?);
            for set in &def.sets {
                output.add_set(set.set_name.clone(), set.shape(&def.var_name)?);
            }
            registry.register_output(output)?;
        }
        Ok(registry)
    }

    /// Build rule stages in declaration order
    pub fn build_stages(&self) -> Vec<RuleStage> {
        self.stages
            .iter()
            .map(|(name, def)| {
                let mut stage = RuleStage::new(name.clone(), def.output_variable_name.clone(), def.priority);
                for rule_def in &def.rules {
                    let mut rule = Rule::new(def.output_variable_name.clone(), rule_def.aggregation_set_name.clone());
                    for condition in &rule_def.conditions {
                        if rule.antecedent.contains_key(&condition.input_variable_name) {
                            warn!(
                                stage = %name,
                                variable = %condition.input_variable_name,
                                "variable named twice in one rule; keeping the last set"
                            );
                        }
                        rule.add_condition(
                            condition.input_variable_name.clone(),
                            condition.monotonic_selection_set_name.clone(),
                        );
                    }
                    rule.set_priority(rule_def.priority);
                    stage.add_rule(rule);
                }
                stage
            })
            .collect()
    }
}
