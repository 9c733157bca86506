//! Best-effort decoding of free-text model answers.
//!
//! Nothing here fails: a missing section yields its default value and a line
//! that does not match its pattern is skipped. Every degradation is logged so
//! it can be told apart from a genuinely empty answer.
//!
//! Section markers are recognised at the start of a line, case-insensitively,
//! after optional Markdown decoration (`#`, `*`, `>`, `_`) or a list number,
//! with or without accents. A section's body runs from the end of its marker
//! to the start of the next marker of the same response type.

use super::{
    ImpactAnalysis, ImpactAssessment, MonitoringItem, Pges, PrioritizedImpact, Priority,
    ProjectAnalysis, Recommendation, SuggestedImpact,
};
use regex::{Captures, Regex};
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Magnitude used when an unscored answer carries none.
pub const DEFAULT_MAGNITUDE: i32 = 0;
/// Importance used when an unscored answer carries none.
pub const DEFAULT_IMPORTANCE: i32 = 5;

fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    // Patterns are literals in this module and covered by its tests.
    cell.get_or_init(|| Regex::new(pattern).expect("decoder pattern must compile"))
}

const MARKER_PREFIX: &str = r"(?mi)^[ \t>#*_]*(?:\d+[.)][ \t]*)?[*_]*[ \t]*";
const MARKER_SUFFIX: &str = r"[ \t*_]*:[ \t*_]*";

fn marker_regex(alternatives: &[(&str, &str)]) -> String {
    let body = alternatives
        .iter()
        .map(|(name, pat)| format!("(?P<{name}>{pat})"))
        .collect::<Vec<_>>()
        .join("|");
    format!("{MARKER_PREFIX}(?:{body}){MARKER_SUFFIX}")
}

/// Located sections of one response, in document order.
struct Sections<'a> {
    text: &'a str,
    /// (name, marker start, body start)
    marks: Vec<(&'static str, usize, usize)>,
}

impl<'a> Sections<'a> {
    fn split(text: &'a str, re: &Regex, names: &[&'static str]) -> Self {
        let mut marks = Vec::new();
        for caps in re.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            if let Some(name) = names.iter().copied().find(|n| caps.name(n).is_some()) {
                marks.push((name, whole.start(), whole.end()));
            }
        }
        Self { text, marks }
    }

    /// Body of the first section named `name`, up to the next marker.
    fn get(&self, name: &str) -> Option<&'a str> {
        let i = self.marks.iter().position(|m| m.0 == name)?;
        let end = self.marks.get(i + 1).map_or(self.text.len(), |m| m.1);
        Some(&self.text[self.marks[i].2..end])
    }

    /// Body of the first section named `name`, up to the next marker named
    /// in `stops`. Other markers inside are part of the body.
    fn get_until(&self, name: &str, stops: &[&str]) -> Option<&'a str> {
        let i = self.marks.iter().position(|m| m.0 == name)?;
        let end = self.marks[i + 1..]
            .iter()
            .find(|m| stops.contains(&m.0))
            .map_or(self.text.len(), |m| m.1);
        Some(&self.text[self.marks[i].2..end])
    }
}

/// Strips whitespace, Markdown emphasis and template brackets around a value.
fn clean(value: &str) -> String {
    value
        .trim()
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '*' | '_' | '`' | '[' | ']'))
        .to_string()
}

fn leading_int(body: &str) -> Option<i32> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = compiled(&RE, r"^[\s*_\[]*([+-]?\d+)");
    re.captures(body)?.get(1)?.as_str().parse().ok()
}

/// Template echoes such as `[etc.]` or `...` that carry no content.
fn is_filler(text: &str) -> bool {
    let t = text.trim();
    t.eq_ignore_ascii_case("etc.")
        || t.eq_ignore_ascii_case("etc")
        || (!t.is_empty() && t.chars().all(|c| matches!(c, '.' | '…')))
}

fn bullet(line: &str) -> Option<&str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = compiled(&RE, r"^\s*(?:[-•]\s*|\*\s+|\d+[.)]\s+)(.*)$");
    re.captures(line).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// Splits a bulleted block into items. A non-bullet line continues the
/// previous item; after a blank line it starts a new one.
fn split_bullets(body: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    let mut open = false;
    for line in body.lines() {
        if line.trim().is_empty() {
            open = false;
            continue;
        }
        if let Some(text) = bullet(line) {
            let text = clean(text);
            if text.is_empty() || is_filler(&text) {
                open = false;
                continue;
            }
            items.push(text);
            open = true;
            continue;
        }
        let text = clean(line);
        if text.is_empty() || is_filler(&text) {
            continue;
        }
        match items.last_mut() {
            Some(last) if open => {
                last.push(' ');
                last.push_str(&text);
            }
            _ => {
                items.push(text);
                open = true;
            }
        }
    }
    items
}

fn parse_int(caps: &Captures<'_>, idx: usize) -> Option<i32> {
    caps.get(idx)?.as_str().parse().ok()
}

// --- single impact ----------------------------------------------------------

fn impact_markers() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let pattern = marker_regex(&[
            ("magnitude", "MAGNITUDE"),
            ("importance", "IMPORTANCE"),
            ("justification", "JUSTIFICATION"),
            ("analysis", "ANALYSE"),
            ("measures", r"MESURES[ \t]+D['’ ]?[ \t]*ATT[ÉE]NUATION"),
        ]);
        Regex::new(&pattern).expect("impact marker pattern must compile")
    })
}

fn magnitude_anywhere() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, r"(?i)MAGNITUDE[ \t*_]*:[ \t*_]*\[?([+-]?\d+)")
}

fn importance_anywhere() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, r"(?i)IMPORTANCE[ \t*_]*:[ \t*_]*\[?([+-]?\d+)")
}

/// A score written mid-line, e.g. `MAGNITUDE: -3, IMPORTANCE: 7`.
fn score_anywhere(content: &str, re: &Regex) -> Option<i32> {
    re.captures(content)?.get(1)?.as_str().parse().ok()
}

const IMPACT_SECTIONS: [&str; 5] = [
    "magnitude",
    "importance",
    "justification",
    "analysis",
    "measures",
];

/// Decodes a single-impact answer. Scores of a `Scored` request are kept
/// as given; an `Unscored` request takes them from the answer, falling back to
/// `DEFAULT_MAGNITUDE` / `DEFAULT_IMPORTANCE`.
pub fn decode_impact_analysis(content: &str, assessment: ImpactAssessment) -> ImpactAnalysis {
    let sections = Sections::split(content, impact_markers(), &IMPACT_SECTIONS);

    let (magnitude, importance) = match assessment {
        ImpactAssessment::Scored {
            magnitude,
            importance,
        } => (magnitude, importance),
        ImpactAssessment::Unscored => {
            let magnitude = sections
                .get("magnitude")
                .and_then(leading_int)
                .or_else(|| score_anywhere(content, magnitude_anywhere()));
            let importance = sections
                .get("importance")
                .and_then(leading_int)
                .or_else(|| score_anywhere(content, importance_anywhere()));
            if magnitude.is_none() {
                debug!(target: "decoder", "no MAGNITUDE in answer, using default");
            }
            if importance.is_none() {
                debug!(target: "decoder", "no IMPORTANCE in answer, using default");
            }
            (
                magnitude.unwrap_or(DEFAULT_MAGNITUDE),
                importance.unwrap_or(DEFAULT_IMPORTANCE),
            )
        }
    };

    let justification = match sections.get("justification") {
        Some(body) => body.trim().to_string(),
        None => {
            debug!(target: "decoder", "no JUSTIFICATION section");
            String::new()
        }
    };

    // The analysis runs to the measures marker only; a line such as
    // "Importance: ..." inside it is prose. Without an ANALYSE section the
    // whole answer is kept.
    let analysis = match sections.get_until("analysis", &["measures"]) {
        Some(body) => body.trim().to_string(),
        None => {
            debug!(target: "decoder", "no ANALYSE section, keeping full answer");
            content.trim().to_string()
        }
    };

    let mitigation_measures = match sections.get("measures") {
        Some(body) => split_bullets(body),
        None => {
            debug!(target: "decoder", "no MESURES D'ATTÉNUATION section");
            Vec::new()
        }
    };

    ImpactAnalysis {
        analysis,
        magnitude,
        importance,
        mitigation_measures,
        justification,
    }
}

// --- project analysis -------------------------------------------------------

fn project_markers() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let pattern = marker_regex(&[
            ("impacts", r"IMPACTS[ \t]+SUGG[ÉE]R[ÉE]S"),
            ("summary", r"SYNTH[ÈE]SE(?:[ \t]+NARRATIVE)?"),
        ]);
        Regex::new(&pattern).expect("project marker pattern must compile")
    })
}

fn suggested_impact_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(
        &RE,
        r"(?i)Activit[ée][ \t]*ID[ \t*_]*:\s*([^,\n]+),\s*Composante[ \t]*ID[ \t*_]*:\s*([^,\n]+),\s*Magnitude[ \t*_]*:\s*\[?([+-]?\d+)\]?,\s*Importance[ \t*_]*:\s*\[?(\d+)\]?,\s*Justification[ \t*_]*:\s*(.+)$",
    )
}

/// Parses one `Activité ID: .., Composante ID: .., Magnitude: .., Importance: ..,
/// Justification: ..` line.
pub fn parse_suggested_impact(line: &str) -> Option<SuggestedImpact> {
    let caps = suggested_impact_line().captures(line)?;
    let activity_id = clean(caps.get(1)?.as_str());
    let component_id = clean(caps.get(2)?.as_str());
    if activity_id.is_empty() || component_id.is_empty() {
        return None;
    }
    Some(SuggestedImpact {
        activity_id,
        component_id,
        magnitude: parse_int(&caps, 3)?,
        importance: parse_int(&caps, 4)?,
        justification: clean(caps.get(5)?.as_str()),
    })
}

pub fn decode_project_analysis(content: &str) -> ProjectAnalysis {
    let sections = Sections::split(content, project_markers(), &["impacts", "summary"]);

    let impacts_text = match sections.get("impacts") {
        Some(body) => body,
        None => {
            debug!(target: "decoder", "no IMPACTS SUGGÉRÉS section, scanning whole answer");
            content
        }
    };

    let mut suggested_impacts = Vec::new();
    for line in impacts_text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_suggested_impact(line) {
            Some(s) => suggested_impacts.push(s),
            None => debug!(target: "decoder", line=%line.trim(), "skipping unparsable suggestion line"),
        }
    }
    if suggested_impacts.is_empty() {
        warn!(target: "decoder", "project analysis answer contained no usable suggestion");
    }

    let summary = match sections.get("summary") {
        Some(body) => body.trim().to_string(),
        None => {
            debug!(target: "decoder", "no SYNTHÈSE section");
            String::new()
        }
    };

    ProjectAnalysis {
        suggested_impacts,
        summary,
    }
}

// --- PGES -------------------------------------------------------------------

fn pges_markers() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let pattern = marker_regex(&[
            ("summary", r"SYNTH[ÈE]SE"),
            ("priorities", r"PRIORISATION[ \t]+DES[ \t]+IMPACTS"),
            ("recommendations", "RECOMMANDATIONS"),
            ("monitoring", r"PLAN[ \t]+DE[ \t]+SUIVI"),
        ]);
        Regex::new(&pattern).expect("PGES marker pattern must compile")
    })
}

fn prioritized_impact_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(
        &RE,
        r"(?i)Activit[ée][ \t*_]*:\s*([^,\n]+),\s*Composante[ \t*_]*:\s*([^,\n]+),\s*Magnitude[ \t*_]*:\s*\[?([+-]?\d+)\]?,\s*Importance[ \t*_]*:\s*\[?(\d+)\]?,\s*Priorit[ée][ \t*_]*:\s*\[?\s*(\w+)",
    )
}

fn category_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(
        &RE,
        r"(?i)^\s*(?:\d+[.)]\s*)?[*_]*\s*Cat[ée]gorie[ \t*_]*:\s*(.+)$",
    )
}

fn monitoring_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(
        &RE,
        r"(?i)Indicateur[ \t*_]*:\s*([^,\n]+),\s*Fr[ée]quence[ \t*_]*:\s*([^,\n]+),\s*Responsable[ \t*_]*:\s*(.+)$",
    )
}

pub fn parse_prioritized_impact(line: &str) -> Option<PrioritizedImpact> {
    let caps = prioritized_impact_line().captures(line)?;
    let priority = match caps.get(5)?.as_str().parse::<Priority>() {
        Ok(p) => p,
        Err(e) => {
            debug!(target: "decoder", error=%e, "skipping prioritized impact");
            return None;
        }
    };
    Some(PrioritizedImpact {
        activity_name: clean(caps.get(1)?.as_str()),
        component_name: clean(caps.get(2)?.as_str()),
        magnitude: parse_int(&caps, 3)?,
        importance: parse_int(&caps, 4)?,
        priority,
    })
}

pub fn parse_monitoring_item(line: &str) -> Option<MonitoringItem> {
    let caps = monitoring_line().captures(line)?;
    Some(MonitoringItem {
        indicator: clean(caps.get(1)?.as_str()),
        frequency: clean(caps.get(2)?.as_str()),
        responsible_party: clean(caps.get(3)?.as_str()),
    })
}

/// Category blocks: a `Catégorie:` line opens a block and every bullet until
/// the next one belongs to it.
fn parse_recommendations(body: &str) -> Vec<Recommendation> {
    let mut out: Vec<Recommendation> = Vec::new();
    let mut block: Option<(String, Vec<&str>)> = None;
    for line in body.lines() {
        if let Some(caps) = category_line().captures(line) {
            if let Some((category, lines)) = block.take() {
                out.push(Recommendation {
                    category,
                    measures: split_bullets(&lines.join("\n")),
                });
            }
            let category = caps.get(1).map(|m| clean(m.as_str())).unwrap_or_default();
            block = Some((category, Vec::new()));
            continue;
        }
        match block.as_mut() {
            Some((_, lines)) => lines.push(line),
            None if !line.trim().is_empty() => {
                debug!(target: "decoder", line=%line.trim(), "recommendation outside any category");
            }
            None => {}
        }
    }
    if let Some((category, lines)) = block {
        out.push(Recommendation {
            category,
            measures: split_bullets(&lines.join("\n")),
        });
    }
    out
}

fn parse_lines<T>(body: &str, what: &str, parse: fn(&str) -> Option<T>) -> Vec<T> {
    let mut out = Vec::new();
    for line in body.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match parse(line) {
            Some(item) => out.push(item),
            None => debug!(target: "decoder", kind=%what, line=%line.trim(), "skipping unparsable line"),
        }
    }
    out
}

pub fn decode_pges(content: &str) -> Pges {
    let sections = Sections::split(
        content,
        pges_markers(),
        &["summary", "priorities", "recommendations", "monitoring"],
    );

    let summary = sections
        .get("summary")
        .map(|b| b.trim().to_string())
        .unwrap_or_else(|| {
            debug!(target: "decoder", "no SYNTHÈSE section");
            String::new()
        });

    let prioritized_impacts = sections
        .get("priorities")
        .map(|b| parse_lines(b, "prioritized impact", parse_prioritized_impact))
        .unwrap_or_else(|| {
            debug!(target: "decoder", "no PRIORISATION DES IMPACTS section");
            Vec::new()
        });

    let recommendations = sections
        .get("recommendations")
        .map(parse_recommendations)
        .unwrap_or_else(|| {
            debug!(target: "decoder", "no RECOMMANDATIONS section");
            Vec::new()
        });

    let monitoring_plan = sections
        .get("monitoring")
        .map(|b| parse_lines(b, "monitoring item", parse_monitoring_item))
        .unwrap_or_else(|| {
            debug!(target: "decoder", "no PLAN DE SUIVI section");
            Vec::new()
        });

    if prioritized_impacts.is_empty() && recommendations.is_empty() && monitoring_plan.is_empty()
    {
        warn!(target: "decoder", "PGES answer contained no structured section");
    }

    Pges {
        summary,
        prioritized_impacts,
        recommendations,
        monitoring_plan,
    }
}
