use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::protect::{Session, MARKUP_TAG_RE};

/// Bracket notation: an optional word delimiter (space or U+00A0, emitted by
/// the reading generator and consumed by the match), `base`, an optional `!`
/// hiding the base, then `[reading]` with an optional `!` at either edge of
/// the bracket group hiding the reading. Unbalanced brackets fail to match
/// and stay literal text. The base class admits nestable placeholder tokens
/// (cloze spans belong inside a base) but stops at opaque token delimiters,
/// markup, and word delimiters.
pub static FURIGANA_BRACKETS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"[ \x{A0}]?(?P<base>[^ \x{A0}<>\[\]\x{FFF9}\x{FFFA}]+?)(?P<base_hide>!?)\[(?P<reading_hide>!?)(?P<reading>[^\[\]]+?)\](?P<reading_tail>!?)",
    )
    .unwrap()
});

/// The parsed form of one `base[reading]` occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuriganaUnit {
    pub base: String,
    pub reading: String,
    pub base_hidden: bool,
    pub reading_hidden: bool,
    /// Set when the occurrence was found inside a shielded cloze interior
    pub inside_cloze: bool,
}

impl FuriganaUnit {
    /// Build a unit from a bracket-notation match. When a session is given,
    /// placeholders inside base and reading are resolved first so rendering
    /// and title construction see real content, not tokens.
    pub fn from_brackets(caps: &Captures, session: Option<&Session>, inside_cloze: bool) -> Self {
        let raw_base = &caps["base"];
        let raw_reading = &caps["reading"];
        let (base, reading) = match session {
            Some(s) => (s.restore(raw_base), s.restore(raw_reading)),
            None => (raw_base.to_string(), raw_reading.to_string()),
        };
        Self {
            base,
            reading,
            base_hidden: &caps["base_hide"] == "!",
            // the trailing marker attaches to the bracket group it follows
            reading_hidden: &caps["reading_hide"] == "!" || &caps["reading_tail"] == "!",
            inside_cloze,
        }
    }

    /// Render as ruby markup. Hidden sides carry `class="hidden"` on their
    /// slot element; the title attribute is `base(reading)` stripped to plain
    /// text.
    pub fn render(&self) -> String {
        let base_attr = if self.base_hidden {
            r#" class="hidden""#
        } else {
            ""
        };
        let reading_attr = if self.reading_hidden {
            r#" class="hidden""#
        } else {
            ""
        };
        let title = strip_markup(&format!("{}({})", self.base, self.reading));
        format!(
            r#"<ruby title="{title}"><rb{base_attr}>{base}</rb><rt{reading_attr}>{reading}</rt></ruby>"#,
            base = self.base,
            reading = self.reading,
        )
    }

    /// Canonical bracket text, U+00A0-delimited, hidden markers in their
    /// canonical positions (`base!` and `[!reading]`).
    pub fn to_brackets(&self) -> String {
        let base_mark = if self.base_hidden { "!" } else { "" };
        let reading_mark = if self.reading_hidden { "!" } else { "" };
        format!(
            "\u{a0}{}{base_mark}[{reading_mark}{}]",
            self.base, self.reading
        )
    }

    /// Discard the reading, keeping the base text. Delete path.
    pub fn strip(&self) -> String {
        self.base.clone()
    }
}

/// Remove markup tags, leaving plain text
pub fn strip_markup(text: &str) -> String {
    MARKUP_TAG_RE.replace_all(text, "").into_owned()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Plain(String),
    Unit(FuriganaUnit),
}

/// Split a fragment into plain spans and parsed furigana units
pub fn parse_brackets(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last = 0;
    for caps in FURIGANA_BRACKETS_RE.captures_iter(text) {
        let m = caps.get(0).unwrap();
        if m.start() > last {
            segments.push(Segment::Plain(text[last..m.start()].to_string()));
        }
        segments.push(Segment::Unit(FuriganaUnit::from_brackets(
            &caps, None, false,
        )));
        last = m.end();
    }
    if last < text.len() {
        segments.push(Segment::Plain(text[last..].to_string()));
    }
    segments
}
