//! Mamdani - multi-stage fuzzy inference
//!
//! A Mamdani fuzzy inference engine whose rules are grouped into prioritized
//! stages. Each stage produces one crisp output, which is fed forward as a
//! derived input variable (`computed_<output>`) to the stages after it.
//!
//! # Architecture
//!
//! - [`system::SystemDefinition`] - JSON description of variables and stages
//! - [`fuzzy::VariableRegistry`] - variables owned by one engine instance
//! - [`fuzzy::InferenceEngine`] - fuzzify, fire, aggregate, defuzzify, feed forward
//! - [`fuzzy::ExecutionTrace`] - the rules fired by the latest call
//! - [`config::MamdaniConfig`] - TOML configuration with environment overrides
//!
//! # Example
//!
//! ```rust,ignore
//! use mamdani::{CrispInputs, InferenceEngine, InferenceSettings, SystemDefinition};
//!
//! let system = SystemDefinition::from_file("demos/loan.json")?;
//! let mut engine = InferenceEngine::new(&system, InferenceSettings::default())?;
//!
//! let mut inputs = CrispInputs::new();
//! inputs.insert("market_value".into(), Some(120.0));
//! inputs.insert("location".into(), Some(8.0));
//! inputs.insert("income".into(), None);
//!
//! let result = engine.infer(&inputs)?;
//! println!("{:?}", result.get("loan"));
//! println!("{}", engine.trace().to_text());
//! ```

pub mod config;
pub mod error;
pub mod fuzzy;
pub mod system;

pub use config::{ConfigError, InferenceSettings, LogLevel, MamdaniConfig, OutputFormat};
pub use error::{ErrorCode, FuzzyError, FuzzyResult};
pub use fuzzy::{
    CrispInputs, Domain, ExecutionTrace, FuzzySet, InferenceEngine, InferenceResult,
    InputVariable, MembershipFunction, OutputVariable, Rule, RuleStage, TraceEntry, Variable,
    VariableRegistry,
};
pub use system::{SystemDefinition, SystemError};
