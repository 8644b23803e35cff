//! Cue-phrase and lexicon based field recognition.
//!
//! Extraction is best-effort: every field is either recognized or reported as
//! absent. Nothing is defaulted here; deciding whether a value is acceptable
//! is the validator's job.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Introduces the lead's name: `lead:`, `named`, `name:`, `name is`.
static NAME_CUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:lead\s*:|named\b|name\s*:|name\s+is\b)\s*").unwrap()
});

static CITY_CUE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bfrom\s+").unwrap());

/// Ends a free-text field: the next field cue or clause punctuation.
static FIELD_STOP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|\s+)(?:from|phone|source|notes?)\b|[,;.!?]").unwrap()
});

static SOURCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bsource\b(?:\s+is\b)?\s*:?\s*([A-Za-z][A-Za-z0-9_-]*)").unwrap()
});

/// Digits separated only by spaces or dashes.
static DIGIT_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d(?:[ -]*\d)*").unwrap());

static LEAD_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\blead(?:\s+id)?(?:\s*[:#]\s*|\s+)([A-Za-z0-9][A-Za-z0-9_-]*)").unwrap()
});

/// ISO-8601-like date, optional time, optional offset after the time.
static TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b\d{4}-\d{2}-\d{2}(?:[Tt ]\d{2}:\d{2}(?::\d{2}(?:\.\d+)?)?(?:\s?(?:[Zz]\b|[+-]\d{2}:?\d{2}\b))?)?",
    )
    .unwrap()
});

const STATUS_WORDS: &str = r"in[ _-]?progress|follow[ _-]?up|contacted|new|won|lost";

static STATUS_CUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:to|as|status(?:\s+(?:to|is|of))?\s*:?)\s+({STATUS_WORDS})\b"
    ))
    .unwrap()
});

static STATUS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)\b({STATUS_WORDS})\b")).unwrap());

/// A bare status word right after the lead id: "lead L123 won".
static TRAILING_STATUS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)^\s*[:,-]?\s*({STATUS_WORDS})\b")).unwrap()
});

static NOTES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)\bnotes?\s*[:-]\s*(.+)$").unwrap());

/// Raw values recognized in one transcript. `None` means "not found".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractedFields {
    pub name: Option<String>,
    pub city: Option<String>,
    /// Digits only; separators already removed.
    pub phone: Option<String>,
    pub source: Option<String>,
    pub lead_id: Option<String>,
    /// Unparsed candidate; may lack an offset.
    pub timestamp: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

impl ExtractedFields {
    /// Names of the fields that were recognized, for logging.
    pub fn present(&self) -> Vec<&'static str> {
        [
            ("name", self.name.is_some()),
            ("city", self.city.is_some()),
            ("phone", self.phone.is_some()),
            ("source", self.source.is_some()),
            ("leadId", self.lead_id.is_some()),
            ("scheduledAt", self.timestamp.is_some()),
            ("status", self.status.is_some()),
            ("notes", self.notes.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, found)| found.then_some(name))
        .collect()
    }
}

pub fn extract(transcript: &str) -> ExtractedFields {
    // Notes are free text and may mention anything, so every other field is
    // looked up only in the part before them.
    let (body, notes) = split_notes(transcript);

    let timestamp = TIMESTAMP_RE.find(body);
    let lead_id = find_lead_id(body);

    ExtractedFields {
        name: extract_name(body),
        city: extract_city(body),
        phone: extract_phone(body, timestamp.as_ref().map(|m| m.range())),
        source: SOURCE_RE
            .captures(body)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string()),
        lead_id: lead_id.map(|m| m.as_str().to_string()),
        timestamp: timestamp.map(|m| m.as_str().trim().to_string()),
        status: extract_status(body, lead_id.map(|m| m.end())),
        notes,
    }
}

fn split_notes(transcript: &str) -> (&str, Option<String>) {
    match NOTES_RE.captures(transcript) {
        Some(caps) => {
            let start = caps.get(0).map(|m| m.start()).unwrap_or(transcript.len());
            let notes = caps
                .get(1)
                .map(|m| m.as_str().trim().trim_end_matches('.').trim().to_string())
                .filter(|n| !n.is_empty());
            (&transcript[..start], notes)
        }
        None => (transcript, None),
    }
}

fn text_until_stop(rest: &str) -> Option<String> {
    let end = FIELD_STOP_RE
        .find(rest)
        .map(|m| m.start())
        .unwrap_or(rest.len());
    let value = rest[..end].trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn extract_name(body: &str) -> Option<String> {
    let cue = NAME_CUE_RE.find(body)?;
    text_until_stop(&body[cue.end()..])
}

fn extract_city(body: &str) -> Option<String> {
    let cue = CITY_CUE_RE.find(body)?;
    text_until_stop(&body[cue.end()..])
}

/// First run of exactly ten digits. Runs glued to letters, overlapping a
/// timestamp, or holding more digits than a phone number are skipped rather
/// than truncated. A leading `+<country code>` group is dropped.
fn extract_phone(body: &str, timestamp: Option<Range<usize>>) -> Option<String> {
    for run in DIGIT_RUN_RE.find_iter(body) {
        if let Some(ts) = &timestamp {
            if run.start() < ts.end && ts.start < run.end() {
                continue;
            }
        }

        let before = body[..run.start()].chars().next_back();
        let after = body[run.end()..].chars().next();
        if before.is_some_and(|c| c.is_ascii_alphanumeric())
            || after.is_some_and(|c| c.is_ascii_alphanumeric() || c == ':')
        {
            continue;
        }

        let mut text = run.as_str();
        if before == Some('+') {
            match text.find([' ', '-']) {
                Some(idx) => text = &text[idx..],
                None => continue,
            }
        }

        let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.len() == 10 {
            return Some(digits);
        }
    }
    None
}

fn find_lead_id(body: &str) -> Option<regex::Match<'_>> {
    LEAD_ID_RE
        .captures_iter(body)
        .filter_map(|caps| caps.get(1))
        .find(|m| {
            let candidate = m.as_str();
            candidate.chars().any(|c| c.is_ascii_digit())
                && STATUS_RE
                    .find(candidate)
                    .map_or(true, |s| s.range() != (0..candidate.len()))
                && !TIMESTAMP_RE
                    .find(&body[m.start()..])
                    .is_some_and(|ts| ts.start() == 0)
        })
}

fn extract_status(body: &str, lead_id_end: Option<usize>) -> Option<String> {
    if let Some(m) = STATUS_CUE_RE.captures(body).and_then(|c| c.get(1)) {
        return Some(m.as_str().to_string());
    }

    // Without a cue only the word straight after the lead id counts, so
    // "the new office" or "a new lead" never read as a status.
    let rest = &body[lead_id_end?..];
    TRAILING_STATUS_RE
        .captures(rest)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
