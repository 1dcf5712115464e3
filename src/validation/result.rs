use serde::{Deserialize, Serialize};

/// How serious a reported problem is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// One problem found in a topology, with an optional hint on how to fix it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    pub severity: Severity,
}

impl ValidationError {
    pub fn error(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
            severity: Severity::Error,
        }
    }
}

/// Outcome of basic or task validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    /// 0 to 100
    pub score: u32,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<String>,
    pub completed_requirements: Vec<String>,
    pub failed_requirements: Vec<String>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self {
            is_valid: true,
            score: 100,
            errors: Vec::new(),
            warnings: Vec::new(),
            completed_requirements: Vec::new(),
            failed_requirements: Vec::new(),
        }
    }
}

impl ValidationResult {
    /// Errors with [`Severity::Error`]
    pub fn hard_errors(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(|e| e.severity == Severity::Error)
    }

    pub fn has_errors(&self) -> bool {
        self.hard_errors().next().is_some()
    }
}
