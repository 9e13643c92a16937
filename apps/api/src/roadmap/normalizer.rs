//! Response Normalizer — turns free-form model output into a validated `Roadmap`.
//!
//! Two phases, kept separate so their failures stay distinguishable:
//!
//! 1. **Locate**: scan the text once for balanced `[...]` / `{...}` spans, strictly
//!    parse each one as JSON and keep the candidate that looks most like a step
//!    list. Prose, code fences and trailing commentary around the payload are
//!    discarded. Nothing parseable → `NormalizeError::Parse`.
//! 2. **Shape**: coerce the payload into `Step`s. Bad elements → `NormalizeError::Shape`
//!    (every offending index is reported). No elements → `NormalizeError::Empty`.
//!
//! Step order is the model's order. It is never re-sorted.

use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::roadmap::{Roadmap, RoadmapRequest, Step};

/// Wrapper key some models put around the step array.
const STEPS_KEY: &str = "steps";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("no JSON payload could be located in the model output")]
    Parse,

    #[error("roadmap payload is malformed: {}", join_issues(.0))]
    Shape(Vec<ShapeIssue>),

    #[error("model output contained no roadmap steps")]
    Empty,
}

impl NormalizeError {
    /// What to tell the person who asked for the roadmap.
    pub fn user_message(&self) -> &'static str {
        match self {
            NormalizeError::Parse => {
                "The AI response could not be read as a roadmap. Please try again."
            }
            NormalizeError::Shape(_) => {
                "The AI returned a roadmap in an unexpected format. Please try again."
            }
            NormalizeError::Empty => {
                "The AI did not return any roadmap steps. Try rephrasing the job role."
            }
        }
    }
}

/// One problem found while shaping the payload.
/// `index` is `None` when the payload as a whole has the wrong shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeIssue {
    pub index: Option<usize>,
    pub field: Option<&'static str>,
    pub problem: String,
}

impl ShapeIssue {
    fn payload(problem: impl Into<String>) -> Self {
        Self {
            index: None,
            field: None,
            problem: problem.into(),
        }
    }

    fn at(index: usize, field: Option<&'static str>, problem: impl Into<String>) -> Self {
        Self {
            index: Some(index),
            field,
            problem: problem.into(),
        }
    }
}

impl fmt::Display for ShapeIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.index, self.field) {
            (Some(i), Some(field)) => write!(f, "step {i}: \"{field}\" {}", self.problem),
            (Some(i), None) => write!(f, "step {i}: {}", self.problem),
            (None, _) => write!(f, "{}", self.problem),
        }
    }
}

fn join_issues(issues: &[ShapeIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// ────────────────────────────────────────────────────────────────────────────
// Entry points
// ────────────────────────────────────────────────────────────────────────────

/// Normalizes model output into a roadmap for `request`.
pub fn normalize(raw: &str, request: &RoadmapRequest) -> Result<Roadmap, NormalizeError> {
    Ok(Roadmap {
        job_role: request.job_role.clone(),
        skill_level: request.skill_level,
        steps: normalize_steps(raw)?,
    })
}

/// Locates the payload in `raw` and shapes it into a non-empty, ordered step list.
pub fn normalize_steps(raw: &str) -> Result<Vec<Step>, NormalizeError> {
    let payload = locate_payload(raw).ok_or(NormalizeError::Parse)?;
    shape_steps(payload)
}

// ────────────────────────────────────────────────────────────────────────────
// Phase 1: locate
// ────────────────────────────────────────────────────────────────────────────

/// How much a parsed candidate looks like a step list. Higher wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Fit {
    Other,
    /// `[]` or `{"steps": []}`.
    Empty,
    /// Non-empty array holding at least one object.
    Objects,
    /// Array holding an object with a `title` or `description`.
    Steps,
}

fn fit_of(value: &Value) -> Fit {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(map) => match map.get(STEPS_KEY) {
            Some(Value::Array(items)) => items,
            _ => return Fit::Other,
        },
        _ => return Fit::Other,
    };

    if items.is_empty() {
        Fit::Empty
    } else if items
        .iter()
        .any(|item| item.get("title").is_some() || item.get("description").is_some())
    {
        Fit::Steps
    } else if items.iter().any(Value::is_object) {
        Fit::Objects
    } else {
        Fit::Other
    }
}

/// Returns the best JSON value embedded in `raw`.
///
/// The first candidate that carries step fields wins outright. Otherwise the
/// earliest candidate of the best `Fit` is used, so a stray `[]` in the prose
/// only matters when nothing better follows it.
pub fn locate_payload(raw: &str) -> Option<Value> {
    let mut best: Option<(Fit, Value)> = None;

    for (start, end) in candidate_spans(raw) {
        let Ok(value) = serde_json::from_str::<Value>(&raw[start..end]) else {
            continue;
        };
        let fit = fit_of(&value);
        if fit == Fit::Steps {
            return Some(value);
        }
        if best.as_ref().map_or(true, |(current, _)| fit > *current) {
            best = Some((fit, value));
        }
    }

    best.map(|(_, value)| value)
}

/// Byte ranges of every balanced `[...]` / `{...}` span, ordered by start.
///
/// One pass over the text with one stack. Quotes only open a string inside a
/// bracket, and a raw newline ends a string (JSON strings cannot hold one), so a
/// stray quote in prose cannot swallow the rest of the text. A closer of the
/// wrong kind discards every open bracket. All delimiters are ASCII, so every
/// offset is a char boundary.
fn candidate_spans(raw: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut open: Vec<(u8, usize)> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in raw.as_bytes().iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' || byte == b'\n' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' if !open.is_empty() => in_string = true,
            b'[' | b'{' => open.push((byte, offset)),
            b']' | b'}' => match open.pop() {
                Some((opener, start)) if (opener == b'[') == (byte == b']') => {
                    spans.push((start, offset + 1));
                }
                Some(_) => open.clear(),
                None => {}
            },
            _ => {}
        }
    }

    spans.sort_unstable_by_key(|&(start, _)| start);
    spans
}

// ────────────────────────────────────────────────────────────────────────────
// Phase 2: shape
// ────────────────────────────────────────────────────────────────────────────

fn shape_steps(payload: Value) -> Result<Vec<Step>, NormalizeError> {
    let items = step_items(payload)?;
    if items.is_empty() {
        return Err(NormalizeError::Empty);
    }

    let mut steps = Vec::with_capacity(items.len());
    let mut issues = Vec::new();

    for (index, item) in items.iter().enumerate() {
        let Value::Object(fields) = item else {
            issues.push(ShapeIssue::at(
                index,
                None,
                format!("expected an object, found {}", kind_of(item)),
            ));
            continue;
        };
        if let Some(step) = shape_step(index, fields, &mut issues) {
            steps.push(step);
        }
    }

    if !issues.is_empty() {
        return Err(NormalizeError::Shape(issues));
    }
    Ok(steps)
}

fn step_items(payload: Value) -> Result<Vec<Value>, NormalizeError> {
    match payload {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove(STEPS_KEY) {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(NormalizeError::Shape(vec![ShapeIssue::payload(
                "expected an array of steps or an object with a \"steps\" array",
            )])),
        },
        other => Err(NormalizeError::Shape(vec![ShapeIssue::payload(format!(
            "expected an array of steps, found {}",
            kind_of(&other)
        ))])),
    }
}

fn shape_step(
    index: usize,
    fields: &Map<String, Value>,
    issues: &mut Vec<ShapeIssue>,
) -> Option<Step> {
    let title = required_text(fields, "title");
    let description = required_text(fields, "description");
    let duration = lenient_duration(fields);

    match (title, description, duration) {
        (Ok(title), Ok(description), Ok(duration)) => Some(Step {
            title,
            duration,
            description,
        }),
        (title, description, duration) => {
            for (field, result) in [
                ("title", title.err()),
                ("duration", duration.err()),
                ("description", description.err()),
            ] {
                if let Some(problem) = result {
                    issues.push(ShapeIssue::at(index, Some(field), problem));
                }
            }
            None
        }
    }
}

fn required_text(fields: &Map<String, Value>, key: &str) -> Result<String, String> {
    match fields.get(key) {
        None | Some(Value::Null) => Err("is missing".to_string()),
        Some(Value::String(s)) if s.trim().is_empty() => Err("must not be empty".to_string()),
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        Some(other) => Err(format!("expected a string, found {}", kind_of(other))),
    }
}

/// Models are inconsistent about duration, so a missing one becomes "".
fn lenient_duration(fields: &Map<String, Value>) -> Result<String, String> {
    match fields.get("duration") {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(format!("expected a string, found {}", kind_of(other))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::roadmap::SkillLevel;

    fn step(title: &str, duration: &str, description: &str) -> Step {
        Step {
            title: title.to_string(),
            duration: duration.to_string(),
            description: description.to_string(),
        }
    }

    fn shape_issues(raw: &str) -> Vec<ShapeIssue> {
        match normalize_steps(raw) {
            Err(NormalizeError::Shape(issues)) => issues,
            other => panic!("expected Shape error, got {other:?}"),
        }
    }

    #[test]
    fn test_single_well_formed_step() {
        let steps =
            normalize_steps(r#"[{"title":"Learn X","duration":"1 week","description":"desc"}]"#)
                .unwrap();
        assert_eq!(steps, vec![step("Learn X", "1 week", "desc")]);
    }

    #[test]
    fn test_missing_duration_defaults_to_empty() {
        let steps = normalize_steps(r#"[{"title":"A","description":"d"}]"#).unwrap();
        assert_eq!(steps, vec![step("A", "", "d")]);
    }

    #[test]
    fn test_null_duration_defaults_to_empty() {
        let steps = normalize_steps(r#"[{"title":"A","duration":null,"description":"d"}]"#).unwrap();
        assert_eq!(steps[0].duration, "");
    }

    #[test]
    fn test_numeric_duration_is_rendered_as_text() {
        let steps = normalize_steps(r#"[{"title":"A","duration":3,"description":"d"}]"#).unwrap();
        assert_eq!(steps[0].duration, "3");
    }

    #[test]
    fn test_empty_array_is_empty_roadmap() {
        assert_eq!(normalize_steps("[]"), Err(NormalizeError::Empty));
        assert_eq!(
            normalize_steps(r#"Sorry, nothing fits: {"steps": []}"#),
            Err(NormalizeError::Empty)
        );
    }

    #[test]
    fn test_plain_prose_is_parse_error() {
        assert_eq!(normalize_steps("no json here"), Err(NormalizeError::Parse));
        assert_eq!(normalize_steps(""), Err(NormalizeError::Parse));
    }

    #[test]
    fn test_unbalanced_payload_is_parse_error() {
        let raw = r#"Here you go: [{"title":"A","descrip"#;
        assert_eq!(normalize_steps(raw), Err(NormalizeError::Parse));
    }

    #[test]
    fn test_missing_title_and_description_reports_index_zero() {
        let issues = shape_issues(r#"[{"duration":"1 week"}]"#);
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.index == Some(0)));
        assert_eq!(issues[0].field, Some("title"));
        assert_eq!(issues[1].field, Some("description"));
    }

    #[test]
    fn test_every_bad_step_is_reported() {
        let raw = r#"[
            {"title":"Ok","duration":"1w","description":"fine"},
            {"title":"","description":"blank title"},
            "not an object",
            {"title":"Bad duration","duration":["2","weeks"],"description":"d"}
        ]"#;
        let issues = shape_issues(raw);
        let indexes: Vec<Option<usize>> = issues.iter().map(|i| i.index).collect();
        assert_eq!(indexes, vec![Some(1), Some(2), Some(3)]);
        assert_eq!(issues[0].problem, "must not be empty");
        assert_eq!(issues[1].problem, "expected an object, found a string");
        assert_eq!(issues[2].field, Some("duration"));
    }

    #[test]
    fn test_wrong_type_title_is_shape_error() {
        let issues = shape_issues(r#"[{"title":42,"description":"d"}]"#);
        assert_eq!(issues[0].to_string(), "step 0: \"title\" expected a string, found a number");
    }

    #[test]
    fn test_scalar_array_is_shape_error() {
        let issues = shape_issues("Steps: [1, 2, 3]");
        assert_eq!(issues.len(), 3);
        assert_eq!(issues[0].index, Some(0));
    }

    #[test]
    fn test_object_without_steps_is_payload_shape_error() {
        let issues = shape_issues(r#"{"title":"A","description":"d"}"#);
        assert_eq!(issues[0].index, None);
    }

    #[test]
    fn test_code_fence_and_commentary_are_discarded() {
        let raw = "Sure! Here is your roadmap:\n```json\n[\n  {\"title\": \"HTML\", \"duration\": \"1 week\", \"description\": \"Markup basics\"}\n]\n```\nGood luck on your journey!";
        let steps = normalize_steps(raw).unwrap();
        assert_eq!(steps, vec![step("HTML", "1 week", "Markup basics")]);
    }

    #[test]
    fn test_steps_wrapper_object_is_accepted() {
        let raw = r#"{"role":"QA","steps":[{"title":"Testing basics","duration":"2 weeks","description":"d"}]}"#;
        let steps = normalize_steps(raw).unwrap();
        assert_eq!(steps[0].title, "Testing basics");
    }

    #[test]
    fn test_nested_array_is_found_inside_unrelated_object() {
        let raw = r#"{"roadmap": [{"title":"A","description":"first"},{"title":"B","description":"second"}]}"#;
        let titles: Vec<String> = normalize_steps(raw)
            .unwrap()
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, vec!["A", "B"]);
    }

    #[test]
    fn test_citation_brackets_before_payload_are_skipped() {
        let raw = r#"Based on [1] and [industry data], here: [{"title":"A","description":"d"}]"#;
        assert_eq!(normalize_steps(raw).unwrap(), vec![step("A", "", "d")]);
    }

    #[test]
    fn test_brackets_inside_strings_do_not_end_the_payload() {
        let raw = r#"[{"title":"Arrays [] and maps {}","duration":"1 week","description":"Quote \" and ] inside"}] trailing ]"#;
        let steps = normalize_steps(raw).unwrap();
        assert_eq!(steps[0].title, "Arrays [] and maps {}");
        assert_eq!(steps[0].description, "Quote \" and ] inside");
    }

    #[test]
    fn test_candidate_spans_pair_matching_brackets() {
        assert!(candidate_spans("[}").is_empty());
        assert_eq!(candidate_spans("[{}]"), vec![(0, 4), (1, 3)]);
        assert_eq!(candidate_spans("ab{\"x\":[1]}cd"), vec![(2, 11), (7, 10)]);
        assert_eq!(candidate_spans("x] [1]"), vec![(3, 6)]);
    }

    #[test]
    fn test_stray_empty_brackets_do_not_hide_payload() {
        let raw = r#"I left the optional [] resources out. Here it is: [{"title":"HTML","duration":"1 week","description":"Markup"}]"#;
        assert_eq!(
            normalize_steps(raw).unwrap(),
            vec![step("HTML", "1 week", "Markup")]
        );

        let raw = r#"Previously: {"steps": []}. Now: {"steps": [{"title":"A","description":"d"}]}"#;
        assert_eq!(normalize_steps(raw).unwrap(), vec![step("A", "", "d")]);
    }

    #[test]
    fn test_empty_brackets_win_over_scalar_noise() {
        assert_eq!(normalize_steps("See [1]. Steps: []"), Err(NormalizeError::Empty));
    }

    #[test]
    fn test_object_noise_before_payload_is_skipped() {
        let raw = r#"Config {} and [{}] ignored: [{"title":"A","description":"d"}]"#;
        assert_eq!(normalize_steps(raw).unwrap(), vec![step("A", "", "d")]);
    }

    #[test]
    fn test_stray_quote_in_prose_does_not_hide_payload() {
        let raw = "Note [he said \"maybe]\n[{\"title\":\"A\",\"description\":\"d\"}]";
        assert_eq!(normalize_steps(raw).unwrap(), vec![step("A", "", "d")]);
    }

    #[test]
    fn test_long_unbalanced_input_is_scanned_once() {
        let started = std::time::Instant::now();
        let raw = "[".repeat(200_000);
        assert_eq!(normalize_steps(&raw), Err(NormalizeError::Parse));

        let raw = "[{\"title\":".repeat(50_000);
        assert_eq!(normalize_steps(&raw), Err(NormalizeError::Parse));
        assert!(started.elapsed() < std::time::Duration::from_secs(2));
    }

    #[test]
    fn test_non_ascii_prose_is_handled() {
        let raw = "Voilà — votre parcours 🚀: [{\"title\":\"Bases\",\"description\":\"Découvrir\"}] ✨";
        assert_eq!(normalize_steps(raw).unwrap(), vec![step("Bases", "", "Découvrir")]);
    }

    #[test]
    fn test_order_is_preserved() {
        let raw = r#"[
            {"title":"Zeta","description":"z"},
            {"title":"Alpha","description":"a"},
            {"title":"Mu","description":"m"}
        ]"#;
        let titles: Vec<String> = normalize_steps(raw)
            .unwrap()
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, vec!["Zeta", "Alpha", "Mu"]);
    }

    #[test]
    fn test_values_are_trimmed() {
        let steps =
            normalize_steps(r#"[{"title":"  Git  ","duration":" 3 days ","description":"\nBranching\n"}]"#)
                .unwrap();
        assert_eq!(steps, vec![step("Git", "3 days", "Branching")]);
    }

    #[test]
    fn test_normalize_attaches_request_fields() {
        let request = RoadmapRequest {
            job_role: "Game Developer".to_string(),
            skill_level: SkillLevel::Intermediate,
        };
        let roadmap = normalize(r#"[{"title":"Unity","description":"Engine"}]"#, &request).unwrap();
        assert_eq!(roadmap.job_role, "Game Developer");
        assert_eq!(roadmap.skill_level, SkillLevel::Intermediate);
        assert_eq!(roadmap.steps.len(), 1);
    }

    #[test]
    fn test_user_messages_differ_per_kind() {
        let parse = NormalizeError::Parse.user_message();
        let shape = NormalizeError::Shape(vec![]).user_message();
        let empty = NormalizeError::Empty.user_message();
        assert_ne!(parse, shape);
        assert_ne!(shape, empty);
        assert_ne!(parse, empty);
    }
}
