//! Execution trace of an inference call
//!
//! Records every rule that fired with a positive strength, in the order the
//! engine evaluated them. The trace is rebuilt on every call and can be
//! rendered as plain text, Markdown or JSON.

use serde::{Deserialize, Serialize};

/// One fired rule
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Stage the rule belongs to
    pub stage: String,
    /// Rendered rule text
    pub rule: String,
    /// Firing strength, rounded
    pub strength: f64,
}

/// Ordered log of the rules fired during the most recent call
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionTrace {
    entries: Vec<TraceEntry>,
}

impl ExecutionTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, stage: impl Into<String>, rule: impl Into<String>, strength: f64) {
        self.entries.push(TraceEntry {
            stage: stage.into(),
            rule: rule.into(),
            strength,
        });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &TraceEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries of a single stage
    pub fn for_stage<'a>(&'a self, stage: &'a str) -> impl Iterator<Item = &'a TraceEntry> + 'a {
        self.entries.iter().filter(move |e| e.stage == stage)
    }

    /// Format as plain text
    pub fn to_text(&self) -> String {
        let mut output = String::new();
        let mut current: Option<&str> = None;

        for entry in &self.entries {
            if current != Some(entry.stage.as_str()) {
                output.push_str(&format!("[{}]\n", entry.stage));
                current = Some(entry.stage.as_str());
            }
            output.push_str(&format!("  {:.4}  {}\n", entry.strength, entry.rule));
        }

        if self.entries.is_empty() {
            output.push_str("No rule fired.\n");
        }
        output
    }

    /// Format as Markdown
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str("## Execution Trace\n\n");
        if self.entries.is_empty() {
            output.push_str("_No rule fired._\n");
            return output;
        }

        output.push_str("| Stage | Rule | Strength |\n");
        output.push_str("|---|---|---|\n");
        for entry in &self.entries {
            output.push_str(&format!(
                "| {} | `{}` | {:.4} |\n",
                entry.stage, entry.rule, entry.strength
            ));
        }
        output
    }

    /// Format as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.entries).unwrap_or_else(|_| "[]".to_string())
    }
}

/// Largest number of decimal places kept in a trace
pub const MAX_TRACE_PRECISION: u32 = 15;

/// Round a strength to `places` decimal places, at most [`MAX_TRACE_PRECISION`]
pub fn round_strength(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places.min(MAX_TRACE_PRECISION) as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExecutionTrace {
        let mut trace = ExecutionTrace::new();
        trace.push("HouseRules", "IF location IS good THEN house IS high", 0.75);
        trace.push("HouseRules", "IF market_value IS low THEN house IS low", 0.2);
        trace.push("LoanRules", "IF computed_house IS high THEN loan IS approve", 0.6);
        trace
    }

    #[test]
    fn test_for_stage() {
        let trace = sample();
        assert_eq!(trace.for_stage("HouseRules").count(), 2);
        assert_eq!(trace.for_stage("LoanRules").count(), 1);
        assert_eq!(trace.for_stage("Other").count(), 0);
    }

    #[test]
    fn test_text_groups_by_stage() {
        let text = sample().to_text();
        assert_eq!(text.matches("[HouseRules]").count(), 1);
        assert!(text.contains("0.7500  IF location IS good THEN house IS high"));
        assert!(ExecutionTrace::new().to_text().contains("No rule fired"));
    }

    #[test]
    fn test_markdown_table() {
        let md = sample().to_markdown();
        assert!(md.contains("| Stage | Rule | Strength |"));
        assert!(md.contains("| LoanRules |"));
    }

    #[test]
    fn test_json_entries() {
        let json = sample().to_json();
        let parsed: Vec<TraceEntry> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[2].stage, "LoanRules");
    }

    #[test]
    fn test_round_strength() {
        assert_eq!(round_strength(0.123456, 4), 0.1235);
        assert_eq!(round_strength(0.2, 4), 0.2);
        assert_eq!(round_strength(0.66666, 2), 0.67);
    }

    #[test]
    fn test_round_strength_caps_places() {
        assert_eq!(round_strength(0.2, 400), 0.2);
        assert_eq!(round_strength(0.75, u32::MAX), 0.75);
        assert!(round_strength(1.0 / 3.0, 400).is_finite());
    }

    #[test]
    fn test_clear() {
        let mut trace = sample();
        trace.clear();
        assert!(trace.is_empty());
    }
}
