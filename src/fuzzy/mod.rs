//! Fuzzy variables, rules and the inference engine
//!
//! - [`membership`] - trapezoidal and triangular membership functions
//! - [`variable`] - domains, named sets and the shared variable core
//! - [`input`] / [`output`] - fuzzification and clip/aggregate/defuzzify
//! - [`registry`] - name-keyed variable storage owned by an engine
//! - [`rule`] / [`stage`] - conjunctive rules grouped per output variable
//! - [`engine`] - the multi-stage inference loop
//! - [`trace`] - record of fired rules

pub mod engine;
pub mod input;
pub mod membership;
pub mod output;
pub mod registry;
pub mod rule;
pub mod stage;
pub mod trace;
pub mod variable;

pub use engine::{CrispInputs, InferenceEngine, InferenceResult};
pub use input::InputVariable;
pub use membership::MembershipFunction;
pub use output::OutputVariable;
pub use registry::VariableRegistry;
pub use rule::{Consequent, Rule};
pub use stage::{check_stage_order, derived_name, order_stages, RuleStage};
pub use trace::{ExecutionTrace, TraceEntry};
pub use variable::{Domain, FuzzySet, Variable};
