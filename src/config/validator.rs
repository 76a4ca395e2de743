//! Config validator
//!
//! Checks the layer list and widget catalog for mistakes that would make a
//! layout unusable (errors) or surprising (warnings).

use super::Config;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    NoLayers,
    EmptyLayerId {
        index: usize,
    },
    DuplicateLayer {
        id: String,
    },
    NoModalLayer,
    DuplicateClass {
        name: String,
    },
    DuplicateSoftPath {
        path: String,
        classes: Vec<String>,
    },
    UnknownTheme {
        name: String,
    },
    InvalidTheme {
        problem: String,
    },
    InvalidLogLevel {
        level: String,
    },
}

impl ValidationIssue {
    pub fn severity(&self) -> ValidationSeverity {
        match self {
            ValidationIssue::NoLayers
            | ValidationIssue::EmptyLayerId { .. }
            | ValidationIssue::DuplicateLayer { .. }
            | ValidationIssue::DuplicateClass { .. }
            | ValidationIssue::DuplicateSoftPath { .. }
            | ValidationIssue::InvalidTheme { .. } => ValidationSeverity::Error,
            ValidationIssue::NoModalLayer
            | ValidationIssue::UnknownTheme { .. }
            | ValidationIssue::InvalidLogLevel { .. } => ValidationSeverity::Warning,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ValidationIssue::NoLayers => "No layers declared; a layout needs at least one".to_string(),
            ValidationIssue::EmptyLayerId { index } => {
                format!("Layer #{} has an empty id", index + 1)
            }
            ValidationIssue::DuplicateLayer { id } => {
                format!("Layer '{}' is declared more than once", id)
            }
            ValidationIssue::NoModalLayer => {
                "No modal layer declared; prompts will not block input to lower layers".to_string()
            }
            ValidationIssue::DuplicateClass { name } => {
                format!("Widget class '{}' is declared more than once", name)
            }
            ValidationIssue::DuplicateSoftPath { path, classes } => {
                format!(
                    "Soft path '{}' is claimed by multiple classes: {}",
                    path,
                    classes.join(", ")
                )
            }
            ValidationIssue::UnknownTheme { name } => {
                format!(
                    "Theme '{}' is not a built-in preset; colors not set in config stay unset",
                    name
                )
            }
            ValidationIssue::InvalidTheme { problem } => problem.clone(),
            ValidationIssue::InvalidLogLevel { level } => {
                format!("Log level '{}' is not a valid filter; falling back to 'info'", level)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        !self.has_errors()
    }

    pub fn has_errors(&self) -> bool {
        self.issues
            .iter()
            .any(|i| i.severity() == ValidationSeverity::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.issues
            .iter()
            .any(|i| i.severity() == ValidationSeverity::Warning)
    }

    pub fn errors(&self) -> Vec<&ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity() == ValidationSeverity::Error)
            .collect()
    }

    pub fn warnings(&self) -> Vec<&ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity() == ValidationSeverity::Warning)
            .collect()
    }
}

/// Validate layers, widget classes, theme and logging settings
pub fn validate_config(config: &Config) -> ValidationResult {
    let mut issues = Vec::new();

    check_layers(config, &mut issues);
    check_classes(config, &mut issues);

    if crate::theme::ThemePresets::get(&config.theme.name).is_none() {
        issues.push(ValidationIssue::UnknownTheme {
            name: config.theme.name.clone(),
        });
    }
    for problem in config.theme().validate() {
        issues.push(ValidationIssue::InvalidTheme { problem });
    }

    if tracing_subscriber::EnvFilter::try_new(&config.logging.level).is_err() {
        issues.push(ValidationIssue::InvalidLogLevel {
            level: config.logging.level.clone(),
        });
    }

    ValidationResult { issues }
}

fn check_layers(config: &Config, issues: &mut Vec<ValidationIssue>) {
    if config.layers.is_empty() {
        issues.push(ValidationIssue::NoLayers);
        return;
    }

    let mut seen = HashSet::new();
    for (index, layer) in config.layers.iter().enumerate() {
        let id = layer.id.as_str().trim();
        if id.is_empty() {
            issues.push(ValidationIssue::EmptyLayerId { index });
            continue;
        }
        if !seen.insert(id.to_string()) {
            issues.push(ValidationIssue::DuplicateLayer { id: id.to_string() });
        }
    }

    if !config.layers.iter().any(|l| l.policy.modal) {
        issues.push(ValidationIssue::NoModalLayer);
    }
}

fn check_classes(config: &Config, issues: &mut Vec<ValidationIssue>) {
    let mut names = HashSet::new();
    let mut by_path: HashMap<&str, Vec<String>> = HashMap::new();

    for class in &config.widgets.classes {
        if !names.insert(class.name.as_str()) {
            issues.push(ValidationIssue::DuplicateClass {
                name: class.name.clone(),
            });
        }
        if let Some(path) = &class.soft_path {
            by_path
                .entry(path.as_str())
                .or_default()
                .push(class.name.clone());
        }
    }

    let mut shared: Vec<_> = by_path
        .into_iter()
        .filter(|(_, classes)| classes.len() > 1)
        .collect();
    shared.sort();
    for (path, classes) in shared {
        issues.push(ValidationIssue::DuplicateSoftPath {
            path: path.to_string(),
            classes,
        });
    }
}
