//! Rule stages and their execution order
//!
//! A stage groups the rules that share one output variable. Stages run in
//! descending stage priority; declaration order breaks ties. A stage may
//! read the derived variable of an earlier stage's output, so the priority
//! order is checked against that dependency graph before the engine runs.

use indexmap::IndexMap;

use super::registry::VariableRegistry;
use super::rule::Rule;
use crate::error::{ErrorCode, FuzzyResult};
use crate::fuzzy_bail;

/// A named group of rules sharing one consequent output variable
#[derive(Debug, Clone, PartialEq)]
pub struct RuleStage {
    pub name: String,
    /// Output variable every rule of the stage clips
    pub output: String,
    /// Stage-level priority; higher runs earlier
    pub priority: i64,
    pub rules: Vec<Rule>,
}

impl RuleStage {
    pub fn new(name: impl Into<String>, output: impl Into<String>, priority: i64) -> Self {
        Self {
            name: name.into(),
            output: output.into(),
            priority,
            rules: Vec::new(),
        }
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Rules whose inputs are all fuzzified, highest rule priority first
    pub fn applicable_rules<'a>(&'a self, registry: &VariableRegistry) -> Vec<&'a Rule> {
        let mut rules: Vec<&Rule> = self
            .rules
            .iter()
            .filter(|rule| rule.is_applicable(registry))
            .collect();
        rules.sort_by(|a, b| b.priority().cmp(&a.priority()));
        rules
    }

    /// Every variable named in some rule's antecedent, without repeats
    pub fn reads(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for rule in &self.rules {
            for name in rule.antecedent.keys() {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }
}

/// Name of the input variable that carries `output`'s crisp value forward
pub fn derived_name(prefix: &str, output: &str) -> String {
    format!("{}{}", prefix, output)
}

/// Sort stages by descending priority, stable on declaration order
pub fn order_stages(stages: &mut [RuleStage]) {
    stages.sort_by(|a, b| b.priority.cmp(&a.priority));
}

/// Check that `stages` (already in execution order) respect the derived
/// variable dependencies: a stage reading `<prefix><output>` must run after
/// the stage that produces `<output>`, and never read its own result.
pub fn check_stage_order(stages: &[RuleStage], prefix: &str) -> FuzzyResult<()> {
    let producers: IndexMap<String, usize> = stages
        .iter()
        .enumerate()
        .map(|(position, stage)| (derived_name(prefix, &stage.output), position))
        .collect();

    for (position, stage) in stages.iter().enumerate() {
        for read in stage.reads() {
            let Some(&producer) = producers.get(read) else {
                continue;
            };
            if producer == position {
                fuzzy_bail!(
                    ErrorCode::StageOrder,
                    "stage '{}' reads its own result '{}'",
                    stage.name,
                    read
                );
            }
            if producer > position {
                fuzzy_bail!(
                    ErrorCode::StageOrder,
                    "stage '{}' (priority {}) reads '{}' before stage '{}' (priority {}) produces it",
                    stage.name,
                    stage.priority,
                    read,
                    stages[producer].name,
                    stages[producer].priority
                );
            }
        }
    }
    Ok(())
}
