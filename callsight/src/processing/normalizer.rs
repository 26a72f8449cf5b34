use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::Result;
use crate::models::{NormalizedTranscript, SectionTag, Segment, SpeakerRole, Transcript};

/// Title keywords that mark a speaker as management even when the roster
/// does not list them by name.
const MANAGEMENT_TITLES: &[&str] = &[
    "chief executive officer",
    "chief financial officer",
    "chief operating officer",
    "chief medical officer",
    "chief scientific officer",
    "chief commercial officer",
    "ceo",
    "cfo",
    "coo",
    "cmo",
    "president",
    "founder",
    "chairman",
    "investor relations",
];

const FINANCIAL_KEYWORDS: &[&str] = &[
    "revenue", "earnings", "margin", "guidance", "cash", "expenses", "eps", "operating income",
    "gross profit", "burn rate",
];

const PRODUCT_KEYWORDS: &[&str] = &[
    "product", "pipeline", "launch", "trial", "study", "enrollment", "phase", "candidate",
    "platform", "device",
];

const REGULATORY_KEYWORDS: &[&str] = &[
    "fda", "regulatory", "approval", "clearance", "submission", "nda", "bla", "510(k)",
    "compliance",
];

/// Cleans raw transcript text and segments it into speaker turns, falling
/// back to sentence segmentation when no speaker markers are present.
pub struct TextNormalizer {
    html_tags: Regex,
    smart_quotes: Regex,
    smart_apostrophes: Regex,
    dash_runs: Regex,
    whitespace: Regex,
    multi_periods: Regex,
    speaker_turn: Regex,
    qa_marker: Regex,
}

impl TextNormalizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            html_tags: Regex::new(r"<[^>]+>")?,
            smart_quotes: Regex::new("[\u{201c}\u{201d}\u{201e}]")?,
            smart_apostrophes: Regex::new("[\u{2018}\u{2019}]")?,
            dash_runs: Regex::new(r"\s*--\s*")?,
            whitespace: Regex::new(r"[ \t]+")?,
            multi_periods: Regex::new(r"\.{2,}")?,
            // "Jane Doe: ..." or "Jane Doe -- Chief Executive Officer: ..."
            // at the start of a line.
            speaker_turn: Regex::new(
                r"(?m)^([A-Z][A-Za-z.'\- ]{1,60}?)(?:\s*--\s*([A-Za-z.,'&\- ]{1,80}?))?\s*:\s+",
            )?,
            qa_marker: Regex::new(
                r"(?i)question[\s-]and[\s-]answer|q\s*&\s*a\s+session|now\s+(?:take|open|begin)\s+questions?|open\s+(?:the\s+)?(?:floor|line)\s*(?:for|to)\s+questions?|turn\s+(?:it\s+)?over\s+(?:to|for)\s+questions?",
            )?,
        })
    }

    pub fn normalize(&self, transcript: &Transcript) -> NormalizedTranscript {
        // Strip markup before any structural work; turn boundaries rely on
        // the original line structure, so whitespace is collapsed per turn.
        let text = self.html_tags.replace_all(&transcript.raw_text, " ");

        if text.trim().is_empty() {
            return NormalizedTranscript {
                cleaned_text: String::new(),
                word_count: 0,
                segments: Vec::new(),
            };
        }

        let cleaned_text = self.clean_text(&text);
        let word_count = cleaned_text.split_whitespace().count();
        let segments = self.segment(&text, &transcript.management_roster);

        NormalizedTranscript {
            cleaned_text,
            word_count,
            segments,
        }
    }

    /// Normalize quotes, dashes and whitespace without touching sentence
    /// structure.
    pub fn clean_text(&self, text: &str) -> String {
        let text = self.smart_quotes.replace_all(text, "\"");
        let text = self.smart_apostrophes.replace_all(&text, "'");
        let text = self.dash_runs.replace_all(&text, " ");
        let text = self.multi_periods.replace_all(&text, ".");
        let text = self.whitespace.replace_all(&text, " ");
        text.split('\n')
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }

    fn segment(&self, text: &str, roster: &[String]) -> Vec<Segment> {
        let qa_start = self.qa_marker.find(text).map(|m| m.start());

        let turns = self.split_speaker_turns(text);
        if !turns.is_empty() {
            return turns
                .into_iter()
                .filter(|turn| !turn.body.trim().is_empty())
                .enumerate()
                .map(|(index, turn)| {
                    let body = self.clean_inline(&turn.body);
                    let role = resolve_role(
                        &turn.speaker,
                        turn.title.as_deref(),
                        roster,
                        qa_start.map(|qa| turn.offset >= qa).unwrap_or(false),
                    );
                    let section = classify_section(&body);
                    let token_count = body.split_whitespace().count();
                    Segment {
                        index,
                        text: body,
                        speaker: Some(turn.speaker),
                        role,
                        section,
                        token_count,
                    }
                })
                .collect();
        }

        // No speaker markers: sentence segmentation, speakers unresolved.
        self.split_into_sentences(&self.clean_inline(text))
            .into_iter()
            .enumerate()
            .map(|(index, sentence)| {
                let section = classify_section(&sentence);
                let token_count = sentence.split_whitespace().count();
                Segment {
                    index,
                    text: sentence,
                    speaker: None,
                    role: SpeakerRole::Unknown,
                    section,
                    token_count,
                }
            })
            .collect()
    }

    fn clean_inline(&self, text: &str) -> String {
        self.clean_text(text).replace('\n', " ")
    }

    fn split_speaker_turns(&self, text: &str) -> Vec<SpeakerTurn> {
        let matches: Vec<_> = self.speaker_turn.captures_iter(text).collect();
        let mut turns = Vec::with_capacity(matches.len());

        for (i, caps) in matches.iter().enumerate() {
            let Some(whole) = caps.get(0) else { continue };
            let speaker = caps
                .get(1)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default();
            let title = caps.get(2).map(|m| m.as_str().trim().to_string());
            let body_start = whole.end();
            let body_end = matches
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map(|m| m.start())
                .unwrap_or(text.len());

            turns.push(SpeakerTurn {
                speaker,
                title,
                body: text[body_start..body_end].to_string(),
                offset: whole.start(),
            });
        }

        turns
    }

    fn split_into_sentences(&self, text: &str) -> Vec<String> {
        let mut sentences = Vec::new();
        let mut current = String::new();

        for grapheme in text.graphemes(true) {
            current.push_str(grapheme);

            if is_sentence_boundary(&current) {
                let trimmed = current.trim().to_string();
                if !trimmed.is_empty() {
                    sentences.push(trimmed);
                }
                current.clear();
            }
        }

        if !current.trim().is_empty() {
            sentences.push(current.trim().to_string());
        }

        sentences
    }
}

struct SpeakerTurn {
    speaker: String,
    title: Option<String>,
    body: String,
    offset: usize,
}

fn is_sentence_boundary(text: &str) -> bool {
    let trimmed = text.trim_end();
    if trimmed.is_empty() {
        return false;
    }

    let Some(last_char) = trimmed.chars().last() else {
        return false;
    };

    if !matches!(last_char, '.' | '!' | '?' | '\n') {
        return false;
    }

    if last_char == '\n' {
        return true;
    }

    let words: Vec<&str> = trimmed.split_whitespace().collect();
    if let Some(last_word) = words.last() {
        let abbreviations = [
            "Mr.", "Mrs.", "Ms.", "Dr.", "Prof.", "Sr.", "Jr.", "vs.", "etc.", "i.e.", "e.g.",
            "Inc.", "Ltd.", "Corp.", "Co.", "No.", "Vol.", "Q.", "U.S.",
        ];

        if abbreviations.contains(last_word) {
            return false;
        }
    }

    true
}

fn resolve_role(
    speaker: &str,
    title: Option<&str>,
    roster: &[String],
    in_qa_section: bool,
) -> SpeakerRole {
    let speaker_lower = speaker.to_lowercase();

    if speaker_lower == "operator" {
        return SpeakerRole::Unknown;
    }

    let roster_match = roster.iter().any(|entry| {
        let entry = entry.to_lowercase();
        entry.contains(&speaker_lower) || speaker_lower.contains(&entry)
    });
    if roster_match {
        return SpeakerRole::Management;
    }

    if let Some(title) = title {
        let title_lower = title.to_lowercase();
        if MANAGEMENT_TITLES
            .iter()
            .any(|keyword| title_lower.contains(keyword))
        {
            return SpeakerRole::Management;
        }
        // Sell-side speakers announce their firm rather than an officer title.
        if title_lower.contains("analyst")
            || title_lower.contains("securities")
            || title_lower.contains("capital")
            || title_lower.contains("research")
        {
            return SpeakerRole::Analyst;
        }
    }

    if in_qa_section {
        SpeakerRole::Analyst
    } else {
        SpeakerRole::Unknown
    }
}

fn classify_section(text: &str) -> SectionTag {
    let lower = text.to_lowercase();
    let count_hits =
        |keywords: &[&str]| keywords.iter().filter(|k| lower.contains(*k)).count();

    let financial = count_hits(FINANCIAL_KEYWORDS);
    let product = count_hits(PRODUCT_KEYWORDS);
    let regulatory = count_hits(REGULATORY_KEYWORDS);

    let max = financial.max(product).max(regulatory);
    if max == 0 {
        SectionTag::General
    } else if financial == max {
        SectionTag::Financial
    } else if product == max {
        SectionTag::Product
    } else {
        SectionTag::Regulatory
    }
}
