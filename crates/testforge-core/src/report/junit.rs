use crate::model::{ResultStatus, Totals};

/// Best-effort totals from a JUnit-style results manifest: count opening
/// tags rather than parse the document, so partially malformed output still
/// yields a usable summary. `passed` is always derived, never trusted.
pub fn summarize(content: &str) -> Totals {
    let total = content.matches("<testcase ").count() as u32;
    let failed = (content.matches("<failure").count() + content.matches("<error").count()) as u32;
    let skipped = content.matches("<skipped").count() as u32;
    Totals::from_counts(total, failed, skipped)
}

/// Best-effort per-case outcomes: for each `<testcase>` element, the test
/// name and whether a failure/error/skip marker occurs before the next one.
pub fn case_outcomes(content: &str) -> Vec<(String, ResultStatus)> {
    let mut outcomes = Vec::new();
    let starts: Vec<usize> = content
        .match_indices("<testcase ")
        .map(|(i, _)| i)
        .collect();
    for (n, &start) in starts.iter().enumerate() {
        let end = starts.get(n + 1).copied().unwrap_or(content.len());
        let segment = &content[start..end];
        let Some(name) = attr_value(segment, "name") else {
            continue;
        };
        let status = if segment.contains("<failure") || segment.contains("<error") {
            ResultStatus::Failed
        } else if segment.contains("<skipped") {
            ResultStatus::Skipped
        } else {
            ResultStatus::Passed
        };
        outcomes.push((name, status));
    }
    outcomes
}

fn attr_value(tag: &str, attr: &str) -> Option<String> {
    // leading space keeps `name` from matching inside `classname`
    let needle = format!(" {attr}=\"");
    let at = tag.find(&needle)? + needle.len();
    let rest = &tag[at..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<testsuite name="pytest" errors="0" failures="1" skipped="1" tests="3">
  <testcase classname="test_req_1" name="test_req_1_1" time="0.01"/>
  <testcase classname="test_req_1" name="test_req_1_2" time="0.02">
    <failure message="assert failed">trace</failure>
  </testcase>
  <testcase classname="test_req_2" name="test_req_2_1" time="0.00">
    <skipped message="not ready"/>
  </testcase>
</testsuite>
"#;

    #[test]
    fn totals_from_well_formed_manifest() {
        let t = summarize(SAMPLE);
        assert_eq!(t.total, 3);
        assert_eq!(t.failed, 1);
        assert_eq!(t.skipped, 1);
        assert_eq!(t.passed, 1);
    }

    #[test]
    fn passed_is_derived_even_when_counts_are_inconsistent() {
        // more failures than test cases: derived passed floors at zero
        let broken = "<testcase <failure <failure <failure";
        let t = summarize(broken);
        assert_eq!(t.total, 1);
        assert_eq!(t.passed, 0);
        assert_eq!(t.passed, t.total.saturating_sub(t.failed).saturating_sub(t.skipped));
    }

    #[test]
    fn empty_or_garbage_input_yields_zero_totals() {
        let t = summarize("not xml at all");
        assert_eq!(t, Totals::default());
    }

    #[test]
    fn per_case_outcomes_are_matched_by_name() {
        let outcomes = case_outcomes(SAMPLE);
        assert_eq!(
            outcomes,
            vec![
                ("test_req_1_1".to_string(), ResultStatus::Passed),
                ("test_req_1_2".to_string(), ResultStatus::Failed),
                ("test_req_2_1".to_string(), ResultStatus::Skipped),
            ]
        );
    }
}
