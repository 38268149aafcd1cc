use crate::model::{now_rfc3339, CaseRecord, ScriptFile};

pub const LANGUAGE: &str = "python";
pub const FRAMEWORK: &str = "pytest-playwright";
pub const TEMPLATE: &str = "scaffold";

/// Shared fixture file, written once per job and idempotently overwritten.
pub const CONFTEST: &str = r#"import pytest


@pytest.fixture(scope="session")
def browser_type_launch_args():
    return {"headless": True}
"#;

/// Derives a safe, collision-resistant identifier from a requirement id.
///
/// Pure and stable: the same input always yields the same output, so
/// re-generation overwrites files in place instead of accumulating
/// duplicates.
pub fn sanitize_identifier(raw: &str) -> String {
    let s: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if s.is_empty() {
        "item".to_string()
    } else {
        s
    }
}

pub fn script_file_name(requirement_id: &str) -> String {
    format!("test_{}.py", sanitize_identifier(requirement_id))
}

/// Groups cases by requirement id, preserving first-seen order so the
/// derived case keys are stable across re-runs.
pub fn group_cases(cases: &[CaseRecord]) -> Vec<(String, Vec<&CaseRecord>)> {
    let mut groups: Vec<(String, Vec<&CaseRecord>)> = Vec::new();
    for case in cases {
        match groups.iter_mut().find(|g| g.0 == case.requirement_id) {
            Some(group) => group.1.push(case),
            None => groups.push((case.requirement_id.clone(), vec![case])),
        }
    }
    groups
}

/// Stable per-case identity: `<sanitized requirement id>_<ordinal within
/// group>`. Test function names are `test_<key>`, which is how results are
/// matched back after execution.
pub fn case_keys(cases: &[CaseRecord]) -> Vec<String> {
    let mut keys = Vec::new();
    for (rid, members) in group_cases(cases) {
        for idx in 1..=members.len() {
            keys.push(format!("{}_{}", sanitize_identifier(&rid), idx));
        }
    }
    keys
}

/// Renders one source file per requirement group, one test function per
/// case. Output is a scaffold: steps and expected outcome are embedded as
/// literal data and only structural well-formedness is asserted.
pub fn render_scripts(cases: &[CaseRecord], actor: Option<&str>) -> Vec<ScriptFile> {
    let generated_at = now_rfc3339();
    group_cases(cases)
        .into_iter()
        .map(|(rid, members)| ScriptFile {
            filename: script_file_name(&rid),
            code: render_test_file(&rid, &members),
            requirement_id: rid,
            language: LANGUAGE.to_string(),
            framework: FRAMEWORK.to_string(),
            template: TEMPLATE.to_string(),
            generated_at: generated_at.clone(),
            actor: actor.map(str::to_string),
        })
        .collect()
}

fn render_test_file(requirement_id: &str, cases: &[&CaseRecord]) -> String {
    let mut lines = vec!["import pytest".to_string(), String::new(), String::new()];
    for (idx, case) in cases.iter().enumerate() {
        let test_fn = format!("test_{}_{}", sanitize_identifier(requirement_id), idx + 1);
        let title = case.title.replace('"', "'");
        lines.push(format!("def {test_fn}():"));
        lines.push(format!("    \"\"\"{title}\"\"\""));
        lines.push(format!("    steps = {}", py_list(&case.steps)));
        lines.push(format!("    expected = {}", py_str(&case.expected)));
        lines.push("    # Placeholder: wire real Playwright actions here.".to_string());
        lines.push("    assert isinstance(steps, list) and steps".to_string());
        lines.push("    assert expected is not None".to_string());
        lines.push(String::new());
    }
    lines.join("\n")
}

fn py_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

fn py_list(items: &[String]) -> String {
    let parts: Vec<String> = items.iter().map(|s| py_str(s)).collect();
    format!("[{}]", parts.join(", "))
}
