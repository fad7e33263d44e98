//! Multi-stage Mamdani inference engine
//!
//! Each call runs the same pipeline:
//!
//! 1. reset every variable and the trace,
//! 2. fuzzify the supplied crisp inputs (absent values stay unfuzzified),
//! 3. for every stage in execution order, fire the applicable rules, clip
//!    the consequent sets, aggregate and defuzzify the stage output,
//! 4. feed the crisp result forward through the output's derived input
//!    variable so later stages can reason over it.
//!
//! A missing input disables every rule that reads it. A stage left with no
//! applicable rule, or with no aggregated mass, yields `None` for its output,
//! and a later stage reading that output's derived variable sees it as
//! missing too.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::{debug, info, trace, warn};

use super::input::InputVariable;
use super::registry::VariableRegistry;
use super::stage::{check_stage_order, derived_name, order_stages, RuleStage};
use super::trace::{round_strength, ExecutionTrace};
use super::variable::Variable;
use crate::config::InferenceSettings;
use crate::error::{ErrorCode, FuzzyError, FuzzyResult};
use crate::system::SystemDefinition;
use crate::{fuzzy_bail, fuzzy_error};

/// Crisp input values by variable name; `None` marks a missing measurement
pub type CrispInputs = IndexMap<String, Option<f64>>;

/// Crisp output values by variable name, in declaration order
pub type InferenceResult = IndexMap<String, Option<f64>>;

/// Inference engine owning its variables, stages and last trace
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    registry: VariableRegistry,
    /// Stages in execution order
    stages: Vec<RuleStage>,
    settings: InferenceSettings,
    trace: ExecutionTrace,
}

impl InferenceEngine {
    /// Validate a system description and build an engine from it
    pub fn new(system: &SystemDefinition, settings: InferenceSettings) -> FuzzyResult<Self> {
        system.validate(&settings.derived_prefix)?;
        let registry = system.build_registry()?;
        let stages = system.build_stages();
        Self::from_parts(registry, stages, settings)
    }

    /// Build an engine from an already populated registry.
    ///
    /// One derived input variable is registered per output variable, carrying
    /// a copy of the output's sets. Stages are put in execution order.
    pub fn from_parts(
        mut registry: VariableRegistry,
        mut stages: Vec<RuleStage>,
        settings: InferenceSettings,
    ) -> FuzzyResult<Self> {
        let mut claimed: HashSet<String> = HashSet::new();
        for stage in &mut stages {
            let Some(output) = registry.output(&stage.output) else {
                fuzzy_bail!(
                    ErrorCode::UnknownOutput,
                    "stage '{}' targets undeclared output variable '{}'",
                    stage.name,
                    stage.output
                );
            };
            if !claimed.insert(stage.output.clone()) {
                fuzzy_bail!(
                    ErrorCode::DuplicateStageOutput,
                    "output variable '{}' is produced by more than one stage",
                    stage.output
                );
            }
            if let Some(rule) = stage.rules.iter().find(|r| r.consequent.variable != stage.output) {
                return Err(FuzzyError::validation(format!(
                    "rule '{}' in stage '{}' does not conclude on '{}'",
                    rule, stage.name, stage.output
                )));
            }
            // a consequent set missing here was dropped for leaving the domain
            let stage_name = stage.name.clone();
            stage.rules.retain(|rule| {
                let keep = output.variable().has_set(&rule.consequent.set);
                if !keep {
                    warn!(
                        stage = %stage_name,
                        rule = %rule,
                        "consequent set is not defined on the output; rule excluded"
                    );
                }
                keep
            });
        }

        let derived: Vec<InputVariable> = registry
            .outputs()
            .map(|output| {
                let source = output.variable();
                let mut variable =
                    Variable::new(derived_name(&settings.derived_prefix, output.name()), source.domain());
                variable.replace_sets(source.sets());
                InputVariable::from_variable(variable)
            })
            .collect();
        for variable in derived {
            registry.register_input(variable)?;
        }

        for stage in &stages {
            for rule in &stage.rules {
                for (name, set) in &rule.antecedent {
                    match registry.input(name) {
                        None => warn!(
                            stage = %stage.name,
                            variable = %name,
                            "rule reads an unknown input variable and will never fire"
                        ),
                        Some(var) if !var.variable().has_set(set) => warn!(
                            stage = %stage.name,
                            variable = %name,
                            set = %set,
                            "rule names an unknown set"
                        ),
                        Some(_) => {}
                    }
                }
            }
        }

        order_stages(&mut stages);
        if settings.check_stage_order {
            check_stage_order(&stages, &settings.derived_prefix)?;
        }

        info!(
            inputs = registry.inputs().count(),
            outputs = registry.outputs().count(),
            stages = stages.len(),
            "inference engine ready"
        );

        Ok(Self {
            registry,
            stages,
            settings,
            trace: ExecutionTrace::new(),
        })
    }

    /// Run one inference over `inputs`.
    ///
    /// Returns every declared output, `None` where no decision was reached.
    /// Unknown input names, non-finite values and broken rule references
    /// abort the whole call.
    pub fn infer(&mut self, inputs: &CrispInputs) -> FuzzyResult<InferenceResult> {
        self.registry.reset();
        self.trace.clear();

        for (name, value) in inputs {
            let Some(variable) = self.registry.input_mut(name) else {
                return Err(FuzzyError::unknown_input(name));
            };
            match value {
                None => debug!(variable = %name, "input absent"),
                Some(x) if !x.is_finite() => {
                    return Err(fuzzy_error!(
                        ErrorCode::InvalidInputArgument,
                        "input '{}' is not a finite number: {}",
                        name,
                        x
                    ));
                }
                Some(x) => variable.fuzzify(*x),
            }
        }

        let mut result: InferenceResult = self
            .registry
            .output_names()
            .map(|name| (name.to_string(), None))
            .collect();

        for stage in &self.stages {
            let rules = stage.applicable_rules(&self.registry);
            if rules.is_empty() {
                debug!(stage = %stage.name, "no applicable rule");
                continue;
            }

            let mut fired = Vec::with_capacity(rules.len());
            for rule in rules {
                let strength = rule.evaluate(&self.registry)?;
                trace!(stage = %stage.name, rule = %rule, strength, "rule evaluated");
                if strength > 0.0 {
                    fired.push((rule, strength));
                }
            }

            let output = self.registry.output_mut(&stage.output).ok_or_else(|| {
                FuzzyError::internal(format!("output variable '{}' disappeared", stage.output))
                    .with_code(ErrorCode::UnexpectedState)
            })?;
            for (rule, strength) in fired {
                output.clip(&rule.consequent.set, strength)?;
                self.trace.push(
                    stage.name.clone(),
                    rule.render(),
                    round_strength(strength, self.settings.trace_precision),
                );
            }
            output.aggregate_outputs();
            let crisp = output.defuzzify();
            let sets = output.variable().sets().to_vec();

            let derived = derived_name(&self.settings.derived_prefix, &stage.output);
            if let Some(variable) = self.registry.input_mut(&derived) {
                variable.variable_mut().replace_sets(&sets);
                if let Some(x) = crisp {
                    variable.fuzzify(x);
                }
            }

            debug!(stage = %stage.name, output = %stage.output, value = ?crisp, "stage finished");
            result.insert(stage.output.clone(), crisp);
        }

        Ok(result)
    }

    /// Rules fired during the most recent call
    pub fn trace(&self) -> &ExecutionTrace {
        &self.trace
    }

    /// Stage names in execution order
    pub fn stage_order(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn stages(&self) -> &[RuleStage] {
        &self.stages
    }

    pub fn registry(&self) -> &VariableRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &InferenceSettings {
        &self.settings
    }

    /// Name of the derived input variable for `output`
    pub fn derived_name(&self, output: &str) -> String {
        derived_name(&self.settings.derived_prefix, output)
    }
}
