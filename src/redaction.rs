//! Secret Redaction
//!
//! Scrubs credentials and key material from free text before it leaves the
//! service. Rules run as a sequential composition: rule `k` sees the output
//! of rule `k - 1`, so the order of [`REDACTION_RULES`] is part of the
//! redaction behaviour and must not be merged into a single pattern.

use regex::Regex;
use std::borrow::Cow;

/// Replacement written in place of every detected secret
pub const REDACTED: &str = "[REDACTED]";

/// A named detection pattern and its replacement template
#[derive(Debug, Clone, Copy)]
pub struct RedactionRule {
    pub name: &'static str,
    pub pattern: &'static str,
    pub replacement: &'static str,
}

/// Ordered rule list. The sentinel contains no characters these patterns
/// can start a match on, which keeps redaction idempotent.
pub const REDACTION_RULES: &[RedactionRule] = &[
    RedactionRule {
        name: "bearer_token",
        pattern: r"(?i)\bbearer\s+[A-Za-z0-9\-._~+/]+=*",
        replacement: REDACTED,
    },
    RedactionRule {
        name: "vendor_api_key",
        pattern: r"\b(?:sk-(?:ant-|proj-)?[A-Za-z0-9_\-]{16,}|gh[oprsu]_[A-Za-z0-9]{20,}|github_pat_[A-Za-z0-9_]{20,}|xox[abprs]-[A-Za-z0-9\-]{10,}|AKIA[0-9A-Z]{16}|AIza[0-9A-Za-z_\-]{35})",
        replacement: REDACTED,
    },
    RedactionRule {
        name: "pem_private_key",
        pattern: r"-----BEGIN [A-Z ]*PRIVATE KEY-----[\s\S]*?-----END [A-Z ]*PRIVATE KEY-----",
        replacement: REDACTED,
    },
    RedactionRule {
        name: "hex_blob",
        pattern: r"\b[A-Fa-f0-9]{40,}\b",
        replacement: REDACTED,
    },
    RedactionRule {
        name: "base64_blob",
        pattern: r"[A-Za-z0-9+/]{40,}={0,2}",
        replacement: REDACTED,
    },
    RedactionRule {
        name: "secret_assignment",
        pattern: r#"(?i)\b((?:api[_-]?)?key|passw(?:or)?d|secret|token)(\s*[=:]\s*)[^\s,;&"']+"#,
        replacement: "${1}${2}[REDACTED]",
    },
];

/// Compiled redaction pipeline
#[derive(Debug, Clone)]
pub struct Redactor {
    rules: Vec<(Regex, &'static str)>,
}

impl Redactor {
    pub fn new() -> Result<Self, regex::Error> {
        Self::with_rules(REDACTION_RULES)
    }

    pub fn with_rules(rules: &[RedactionRule]) -> Result<Self, regex::Error> {
        let rules = rules
            .iter()
            .map(|rule| Ok((Regex::new(rule.pattern)?, rule.replacement)))
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { rules })
    }

    /// Apply every rule in order and return the scrubbed text
    pub fn redact(&self, text: &str) -> String {
        let mut current = text.to_string();
        for (regex, replacement) in &self.rules {
            let replaced = match regex.replace_all(&current, *replacement) {
                Cow::Borrowed(_) => continue,
                Cow::Owned(replaced) => replaced,
            };
            current = replaced;
        }
        current
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}
