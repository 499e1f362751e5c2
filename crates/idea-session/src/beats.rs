//! Storyboard beat labels derived from a script outline.

use once_cell::sync::Lazy;
use regex::Regex;

/// Labels returned when the outline has no recognizable structure.
pub const DEFAULT_BEATS: [&str; 3] = ["Hook", "Build", "Payoff"];

const MAX_BEATS: usize = 3;
const MIN_LABEL_CHARS: usize = 3;
const MAX_LABEL_CHARS: usize = 80;

static EMPHASIS_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\*\*([^*]+)\*\*|__([^_]+)__)$").expect("emphasis regex is valid")
});

static HEADING_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#{2,3}[ \t]+(.+)$").expect("heading regex is valid"));

static EMPHASIS_MARKERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*+|__").expect("marker regex is valid"));

/// Derives one to three beat labels from `outline`.
///
/// Bold-wrapped lines win; headings are the fallback; `DEFAULT_BEATS` is
/// returned when neither yields a label.
pub fn extract_beats(outline: &str) -> Vec<String> {
    let beats = collect_labels(outline, emphasis_label);
    if !beats.is_empty() {
        return beats;
    }
    let beats = collect_labels(outline, heading_label);
    if !beats.is_empty() {
        return beats;
    }
    DEFAULT_BEATS.iter().map(|beat| beat.to_string()).collect()
}

fn collect_labels(outline: &str, label: fn(&str) -> Option<String>) -> Vec<String> {
    let mut labels: Vec<String> = Vec::with_capacity(MAX_BEATS);
    for line in outline.lines() {
        let Some(candidate) = label(line.trim()) else {
            continue;
        };
        if labels.contains(&candidate) {
            continue;
        }
        labels.push(candidate);
        if labels.len() == MAX_BEATS {
            break;
        }
    }
    labels
}

fn emphasis_label(line: &str) -> Option<String> {
    let captures = EMPHASIS_LINE.captures(line)?;
    let inner = captures.get(1).or_else(|| captures.get(2))?.as_str().trim();
    let chars = inner.chars().count();
    (MIN_LABEL_CHARS..=MAX_LABEL_CHARS)
        .contains(&chars)
        .then(|| inner.to_string())
}

fn heading_label(line: &str) -> Option<String> {
    let captures = HEADING_LINE.captures(line)?;
    let text = EMPHASIS_MARKERS.replace_all(&captures[1], "");
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
