//! Decision and risk badge tables.
//!
//! Lookups are trimmed and case-insensitive. Values outside the known
//! enumerations keep a legible label (see [`humanize`]) with `Default`
//! severity, so new guard outcomes still render.

use std::sync::OnceLock;

use morph_core::i18n::Translate;
use regex::Regex;
use serde::Serialize;

use crate::normalize::UNKNOWN;

/// Display-priority bucket for a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Warning,
    Danger,
    Default,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Danger => "danger",
            Self::Default => "default",
        };
        f.write_str(s)
    }
}

/// A label plus the severity it is rendered with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub label: String,
    pub severity: Severity,
}

/// Guard decision recorded for an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    Allow,
    AllowWithRedaction,
    RequireApproval,
    Deny,
}

impl Decision {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "allow" => Some(Self::Allow),
            "allow_with_redaction" => Some(Self::AllowWithRedaction),
            "require_approval" => Some(Self::RequireApproval),
            "deny" => Some(Self::Deny),
            _ => None,
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            Self::Allow => Severity::Success,
            Self::AllowWithRedaction | Self::RequireApproval => Severity::Warning,
            Self::Deny => Severity::Danger,
        }
    }

    pub fn label_key(self) -> &'static str {
        match self {
            Self::Allow => "audit_decision_allow",
            Self::AllowWithRedaction => "audit_decision_redact",
            Self::RequireApproval => "audit_decision_require_approval",
            Self::Deny => "audit_decision_deny",
        }
    }
}

/// Risk level the guard assigned to an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            Self::Low => Severity::Success,
            Self::Medium => Severity::Warning,
            Self::High | Self::Critical => Severity::Danger,
        }
    }

    pub fn label_key(self) -> &'static str {
        match self {
            Self::Low => "audit_risk_low",
            Self::Medium => "audit_risk_medium",
            Self::High => "audit_risk_high",
            Self::Critical => "audit_risk_critical",
        }
    }
}

pub fn classify_decision(raw: &str, tr: &dyn Translate) -> Badge {
    match Decision::parse(raw) {
        Some(decision) => Badge {
            label: tr.t(decision.label_key(), &[]),
            severity: decision.severity(),
        },
        None => fallback_badge(raw),
    }
}

pub fn classify_risk(raw: &str, tr: &dyn Translate) -> Badge {
    match RiskLevel::parse(raw) {
        Some(risk) => Badge {
            label: tr.t(risk.label_key(), &[]),
            severity: risk.severity(),
        },
        None => fallback_badge(raw),
    }
}

fn fallback_badge(raw: &str) -> Badge {
    Badge {
        label: humanize(raw),
        severity: Severity::Default,
    }
}

/// Makes an enum-ish token readable: `_` becomes a space and a space is
/// inserted where a lowercase letter or digit meets an uppercase letter
/// (`requireApproval` -> `require Approval`). Blank input yields `-`.
pub fn humanize(raw: &str) -> String {
    let text = raw.trim();
    if text.is_empty() {
        return UNKNOWN.to_string();
    }
    split_camel(&text.replace('_', " "), camel_boundary())
}

fn split_camel(text: &str, boundary: Option<&Regex>) -> String {
    match boundary {
        Some(re) => re.replace_all(text, "$1 $2").into_owned(),
        None => text.to_string(),
    }
}

/// `None` if the pattern failed to build; labels then only lose underscores.
fn camel_boundary() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| match Regex::new(r"([a-z0-9])([A-Z])") {
        Ok(re) => Some(re),
        Err(err) => {
            tracing::warn!(error = %err, "camel-case splitting disabled");
            None
        }
    })
    .as_ref()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use morph_core::i18n::{Catalog, Locale};

    use super::*;

    fn en() -> Catalog {
        Catalog::new(Locale::En)
    }

    #[test]
    fn decision_table() {
        let cases = [
            ("allow", "Allow", Severity::Success),
            ("allow_with_redaction", "Allow+Redact", Severity::Warning),
            ("require_approval", "Require Approval", Severity::Warning),
            ("deny", "Deny", Severity::Danger),
        ];
        for (raw, label, severity) in cases {
            let badge = classify_decision(raw, &en());
            assert_eq!(badge.label, label, "raw={raw}");
            assert_eq!(badge.severity, severity, "raw={raw}");
        }
    }

    #[test]
    fn decision_lookup_is_trimmed_and_case_insensitive() {
        assert_eq!(classify_decision("  DENY ", &en()).severity, Severity::Danger);
        assert_eq!(
            classify_decision("Allow_With_Redaction", &en()).severity,
            Severity::Warning
        );
    }

    #[test]
    fn risk_table() {
        let cases = [
            ("low", Severity::Success),
            ("medium", Severity::Warning),
            ("high", Severity::Danger),
            ("Critical", Severity::Danger),
        ];
        for (raw, severity) in cases {
            assert_eq!(classify_risk(raw, &en()).severity, severity, "raw={raw}");
        }
        assert_eq!(classify_risk("critical", &en()).label, "Critical");
    }

    #[test]
    fn unknown_values_fall_back_to_default_severity() {
        let badge = classify_decision("needs_humanReview", &en());
        assert_eq!(badge.severity, Severity::Default);
        assert_eq!(badge.label, "needs human Review");

        let blank = classify_risk("", &en());
        assert_eq!(blank.severity, Severity::Default);
        assert_eq!(blank.label, "-");

        let numeric = classify_decision("42", &en());
        assert_eq!(numeric.severity, Severity::Default);
        assert_eq!(numeric.label, "42");
    }

    #[test]
    fn labels_follow_the_translator() {
        let zh = Catalog::new(Locale::Zh);
        assert_eq!(classify_decision("deny", &zh).label, "拒绝");
        assert_eq!(classify_risk("high", &zh).label, "高");
    }

    #[test]
    fn humanize_examples() {
        assert_eq!(humanize("actionType"), "action Type");
        assert_eq!(humanize("tool_call"), "tool call");
        assert_eq!(humanize("step2Done"), "step2 Done");
        assert_eq!(humanize("ALLCAPS"), "ALLCAPS");
        assert_eq!(humanize("   "), "-");
    }

    #[test]
    fn humanize_without_boundary_pattern_keeps_camel_case() {
        assert_eq!(split_camel("require Approval", None), "require Approval");
        assert_eq!(split_camel("actionType now", None), "actionType now");
        assert_eq!(
            split_camel("actionType now", camel_boundary()),
            "action Type now"
        );
    }

    #[test]
    fn severity_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Severity::Danger).unwrap(),
            "\"danger\""
        );
        assert_eq!(Severity::Default.to_string(), "default");
    }
}
