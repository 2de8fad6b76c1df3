//! Subprocess output classification
//!
//! Install/update commands fail for reasons that are not local bugs: the
//! tool may suggest a remediation command, or report that no compatible
//! version set exists. The classifier is an ordered list of pattern rules
//! so new signals can be added without touching orchestration control flow.
//!
//! The stock rules match bundler's English output lines, which is fragile
//! across tool versions and locales; behavior for non-matching output is to
//! surface the raw error unchanged.

use regex::Regex;

/// What a matched output pattern tells the caller to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputAction {
    /// Re-run the suggested command once before giving up
    RetryWith(String),
    /// The proposed update set is infeasible; report it, don't retry
    Infeasible,
}

/// How a rule's match is turned into an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleKind {
    /// Capture group 1 is the command to retry with
    RetrySuggested,
    /// Plain infeasibility marker
    Infeasible,
}

/// One pattern → action rule
#[derive(Debug, Clone)]
struct OutputRule {
    pattern: Regex,
    kind: RuleKind,
}

/// Ordered pattern rules classifying captured subprocess output
#[derive(Debug, Clone, Default)]
pub struct OutputClassifier {
    rules: Vec<OutputRule>,
}

impl OutputClassifier {
    /// Create a classifier with no rules (everything is unclassified)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Classifier for bundler-style install/update output
    pub fn bundler() -> Self {
        let mut classifier = Self::empty();
        classifier.retry_rule(r"(?m)^Try running `(.*)`$");
        classifier.infeasible_rule(r"(?m)^Bundler could not find compatible versions for gem");
        classifier
    }

    /// Append a rule whose first capture group is a remediation command
    pub fn retry_rule(&mut self, pattern: &str) -> &mut Self {
        self.rules.push(OutputRule {
            pattern: Regex::new(pattern).expect("invalid retry rule pattern"),
            kind: RuleKind::RetrySuggested,
        });
        self
    }

    /// Append an infeasibility-marker rule
    pub fn infeasible_rule(&mut self, pattern: &str) -> &mut Self {
        self.rules.push(OutputRule {
            pattern: Regex::new(pattern).expect("invalid infeasible rule pattern"),
            kind: RuleKind::Infeasible,
        });
        self
    }

    /// Match output against the rules in order; None means unclassified
    pub fn classify(&self, output: &str) -> Option<OutputAction> {
        for rule in &self.rules {
            match rule.kind {
                RuleKind::RetrySuggested => {
                    if let Some(caps) = rule.pattern.captures(output) {
                        let command = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                        return Some(OutputAction::RetryWith(command.to_string()));
                    }
                }
                RuleKind::Infeasible => {
                    if rule.pattern.is_match(output) {
                        return Some(OutputAction::Infeasible);
                    }
                }
            }
        }
        None
    }
}
