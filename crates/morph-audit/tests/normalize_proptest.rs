#![allow(clippy::expect_used, clippy::unwrap_used)]

//! Property tests for line normalization, badge classification and run
//! grouping. These hold for any window content:
//!
//! 1. N raw lines produce N events, indexed in order.
//! 2. Text that cannot be a JSON object is kept verbatim.
//! 3. Badge labels are never empty; known decisions keep their severity.
//! 4. Grouping preserves every event in order and never places two equal
//!    run ids in adjacent groups.

use morph_audit::classify::{classify_decision, classify_risk, Severity};
use morph_audit::group::group_by_run;
use morph_audit::normalize::{normalize, normalize_window, rendered_events, AuditEvent};
use morph_core::i18n::{Catalog, Locale};
use proptest::prelude::*;

// ── Strategies ──

fn run_id_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("r1".to_string())),
        Just(Some("r2".to_string())),
        Just(Some("  ".to_string())),
        "[a-z0-9-]{1,8}".prop_map(Some),
    ]
}

fn event_line_strategy() -> impl Strategy<Value = String> {
    (
        run_id_strategy(),
        prop_oneof![
            Just("allow"),
            Just("deny"),
            Just("require_approval"),
            Just("allow_with_redaction"),
            Just("weird"),
        ],
    )
        .prop_map(|(run_id, decision)| {
            let mut object = serde_json::Map::new();
            if let Some(run_id) = run_id {
                object.insert("run_id".into(), serde_json::Value::String(run_id));
            }
            object.insert("decision".into(), serde_json::Value::from(decision));
            serde_json::Value::Object(object).to_string()
        })
}

fn line_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => event_line_strategy(),
        1 => "[^{]{0,24}",
        1 => Just("[1,2,3]".to_string()),
    ]
}

fn locale_strategy() -> impl Strategy<Value = Locale> {
    prop_oneof![Just(Locale::En), Just(Locale::Zh), Just(Locale::Ja)]
}

// ── Normalization ──

proptest! {
    #[test]
    fn every_line_yields_one_event_in_order(lines in proptest::collection::vec(line_strategy(), 0..80)) {
        let events = normalize_window(&lines);
        prop_assert_eq!(events.len(), lines.len());
        for (i, event) in events.iter().enumerate() {
            prop_assert_eq!(event.index(), i);
        }

        let rendered = rendered_events(&lines);
        let indices: Vec<usize> = rendered.iter().map(AuditEvent::index).collect();
        let expected: Vec<usize> = (0..lines.len()).rev().collect();
        prop_assert_eq!(indices, expected);
    }

    #[test]
    fn non_object_text_is_kept_verbatim(raw in "[^{]{0,64}", index in 0usize..500) {
        match normalize(&raw, index) {
            AuditEvent::Unparsed(line) => {
                prop_assert_eq!(line.raw, raw);
                prop_assert_eq!(line.index, index);
            }
            AuditEvent::Parsed(event) => prop_assert!(false, "parsed {:?} from {:?}", event, raw),
        }
    }

    #[test]
    fn parsed_text_fields_are_never_blank(line in event_line_strategy()) {
        let AuditEvent::Parsed(event) = normalize(&line, 0) else {
            return Err(TestCaseError::fail("event lines must parse"));
        };
        prop_assert!(!event.run_id.trim().is_empty());
        prop_assert!(!event.event_id.trim().is_empty());
    }
}

// ── Classification ──

proptest! {
    #[test]
    fn badge_labels_are_never_empty(raw in ".{0,32}", locale in locale_strategy()) {
        let catalog = Catalog::new(locale);
        prop_assert!(!classify_decision(&raw, &catalog).label.is_empty());
        prop_assert!(!classify_risk(&raw, &catalog).label.is_empty());
    }

    #[test]
    fn known_decisions_ignore_case_and_padding(
        decision in prop_oneof![Just("allow"), Just("deny"), Just("require_approval")],
        upper in any::<bool>(),
        pad in " {0,3}",
    ) {
        let raw = if upper { decision.to_uppercase() } else { decision.to_string() };
        let padded = format!("{pad}{raw}{pad}");
        let badge = classify_decision(&padded, &Catalog::default());
        let expected = match decision {
            "allow" => Severity::Success,
            "deny" => Severity::Danger,
            _ => Severity::Warning,
        };
        prop_assert_eq!(badge.severity, expected);
    }
}

// ── Grouping ──

proptest! {
    #[test]
    fn grouping_conserves_events_and_splits_on_change(
        lines in proptest::collection::vec(line_strategy(), 0..80),
    ) {
        let events = rendered_events(&lines);
        let groups = group_by_run(&events);

        let flattened: Vec<AuditEvent> = groups.iter().flat_map(|g| g.items.clone()).collect();
        prop_assert_eq!(&flattened, &events);

        for group in &groups {
            prop_assert!(!group.items.is_empty());
            for item in &group.items {
                prop_assert_eq!(item.run_id(), group.run_id.as_str());
            }
        }
        for pair in groups.windows(2) {
            prop_assert_ne!(&pair[0].run_id, &pair[1].run_id);
        }

        let mut keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();
        keys.sort_unstable();
        keys.dedup();
        prop_assert_eq!(keys.len(), groups.len());
    }

    #[test]
    fn grouping_is_deterministic(lines in proptest::collection::vec(line_strategy(), 0..40)) {
        let events = rendered_events(&lines);
        prop_assert_eq!(group_by_run(&events), group_by_run(&events));
    }
}
