//! Static screening of setup source text.
//!
//! A capability policy is a list of named patterns matched line by line
//! against the source before it is parsed. Pattern matching is not
//! tamper-proof: it is a cooperative safety net for well-behaved template
//! authors, not a security boundary.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::{SandboxError, SandboxResult};

/// One disallowed construct.
#[derive(Debug, Clone)]
pub struct ConstructRule {
    pub name: String,
    pub category: String,
    pattern: Regex,
}

impl ConstructRule {
    pub fn new(name: impl Into<String>, category: impl Into<String>, pattern: &str) -> SandboxResult<Self> {
        let name = name.into();
        let pattern = Regex::new(pattern).map_err(|e| {
            SandboxError::invalid_argument("policy", format!("invalid pattern for '{}': {}", name, e))
        })?;
        Ok(Self {
            name,
            category: category.into(),
            pattern,
        })
    }

    pub fn is_match(&self, line: &str) -> bool {
        self.pattern.is_match(line)
    }
}

/// Constructs rejected before setup code runs.
#[derive(Debug, Clone, Default)]
pub struct CapabilityPolicy {
    rules: Vec<ConstructRule>,
}

// An identifier boundary that is not a member access (`tools.options.require`).
const START: &str = r"(?:^|[^\w$.])";

static JAVASCRIPT: LazyLock<CapabilityPolicy> = LazyLock::new(|| {
    let rules = [
        (
            "import",
            "module inclusion",
            format!(r#"{START}import(?:\s*[({{*"']|\s+[\w$])"#),
        ),
        (
            "export from",
            "module inclusion",
            format!(r"{START}export\s*(?:\*|\{{[^}}]*\}})\s*from\b"),
        ),
        ("require", "module inclusion", format!(r"{START}require\s*\(")),
        ("eval", "dynamic evaluation", format!(r"{START}eval\s*\(")),
        (
            "Function",
            "dynamic function construction",
            format!(r"{START}(?:new\s+)?Function\s*\("),
        ),
    ];
    rules
        .iter()
        .try_fold(CapabilityPolicy::permissive(), |policy, (name, category, pattern)| {
            policy.deny(name, category, pattern)
        })
        .expect("unreachable error: invalid built-in construct pattern")
});

impl CapabilityPolicy {
    /// A policy that rejects nothing.
    pub fn permissive() -> Self {
        Self::default()
    }

    /// Disallowed constructs for JavaScript setup modules.
    pub fn javascript() -> Self {
        JAVASCRIPT.clone()
    }

    /// Add a rule.
    pub fn deny(mut self, name: &str, category: &str, pattern: &str) -> SandboxResult<Self> {
        self.rules.push(ConstructRule::new(name, category, pattern)?);
        Ok(self)
    }

    pub fn rules(&self) -> &[ConstructRule] {
        &self.rules
    }

    /// Reject `source` at the first line containing a disallowed construct.
    /// Lines that are `//` comments are skipped.
    pub fn screen(&self, source: &str) -> SandboxResult<()> {
        for (line_num, line) in source.lines().enumerate() {
            if line.trim_start().starts_with("//") {
                continue;
            }
            if let Some(rule) = self.rules.iter().find(|r| r.is_match(line)) {
                debug!("Rejected line {}: {}", line_num + 1, rule.name);
                return Err(SandboxError::DisallowedConstruct {
                    construct: rule.name.clone(),
                    category: rule.category.clone(),
                    line: line_num + 1,
                });
            }
        }
        Ok(())
    }
}
