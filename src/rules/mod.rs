use crate::config::Config;
use crate::syntax::SourceFile;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

mod imports;

pub use imports::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub rule: String,
    pub severity: Severity,
    pub message: String,
    pub location: Location,
    pub fix: Option<Fix>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fix {
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

pub struct RuleContext {
    pub file_path: PathBuf,
    pub content: String,
    pub tree: SourceFile,
    pub issues: Vec<Issue>,
}

pub trait Rule: Send + Sync {
    fn name(&self) -> &'static str;
    fn check(&self, ctx: &mut RuleContext);
}

impl RuleContext {
    pub fn new(file_path: PathBuf, content: String, tree: SourceFile) -> Self {
        Self {
            file_path,
            content,
            tree,
            issues: Vec::new(),
        }
    }

    pub fn report(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    /// 1-based line and column of a byte offset.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.content.len());
        let before = &self.content[..offset];
        let line = before.bytes().filter(|&b| b == b'\n').count() + 1;
        let column = before.rfind('\n').map(|p| offset - p).unwrap_or(offset + 1);
        (line, column)
    }
}

impl Severity {
    pub fn github_level(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "notice",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

impl Issue {
    pub fn display(&self) -> String {
        use colored::*;

        let severity_str = match self.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
            Severity::Info => "info".cyan().bold(),
        };

        format!(
            "  {}:{} {} [{}] {}",
            self.location.line,
            self.location.column,
            severity_str,
            self.rule.dimmed(),
            self.message
        )
    }
}

pub fn get_enabled_rules(config: &Config) -> Vec<Box<dyn Rule>> {
    let mut rules: Vec<Box<dyn Rule>> = vec![];

    if config.rules.check_order {
        rules.push(Box::new(UsingOrderRule::new(config.imports.clone())));
    }

    if config.rules.check_duplicates {
        rules.push(Box::new(UsingDuplicateRule::new(config.imports.clone())));
    }

    if config.rules.check_placement {
        rules.push(Box::new(UsingPlacementRule::new(config.imports.clone())));
    }

    rules
}
