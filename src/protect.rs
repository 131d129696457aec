use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Error, Result};

// Lazy-compiled rule patterns (compiled once, reused).
// Priority order when shielding: fill-in-blank fields > sound references >
// cloze spans (markup form, then brace form) > line breaks > raw markup tags.
// Higher-priority syntax is shielded before lower-priority syntax is scanned,
// so a lower-priority pattern never matches inside a not-yet-shielded span.
pub static TYPEIN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{type:[^{}]+\}\}").unwrap());
pub static SOUND_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[sound:[^\[\]]+\]").unwrap());
pub static CLOZE_SPAN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)<span class="?cloze"?[^>]*>(.+?)</span>"#).unwrap());
pub static CLOZE_BRACES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{\{c\d+::(.+?)\}\}").unwrap());
pub static LINEBREAK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<br\s*/?>").unwrap());
pub static MARKUP_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^<>]+>").unwrap());

/// Process-wide counter feeding placeholder tokens. Placeholders stay unique
/// across chained and nested sessions, so an outer restore can never match an
/// inner session's still-unresolved token.
static NEXT_TOKEN: AtomicUsize = AtomicUsize::new(0);

/// Nestable-token delimiter: transparent to the bracket grammar, so a cloze
/// token may sit inside a `base[reading]` base and ride into the base slot.
const NESTABLE_MARK: char = '\u{feff}';
/// Opaque-token delimiters: excluded from the bracket grammar's base class,
/// so a shielded tag, line break, or ruby element is never swallowed into a
/// neighbouring base.
const OPAQUE_OPEN: char = '\u{fff9}';
const OPAQUE_CLOSE: char = '\u{fffa}';

fn next_placeholder(tag: &str, open: char, close: char) -> String {
    let id = NEXT_TOKEN.fetch_add(1, Ordering::Relaxed);
    format!("{open}fg{tag}{id}{close}")
}

/// One shielded span: the token left in the text and the value that replaces
/// it on restore.
#[derive(Debug, Clone)]
pub struct Shielded {
    pub placeholder: String,
    pub stored: String,
    pub tag: &'static str,
}

/// Placeholder substitution session. Created per top-level conversion call,
/// consumed exactly once by the matching restore, then discarded. Sessions
/// chain: last protected, first restored.
#[derive(Debug, Default)]
pub struct Session {
    segments: Vec<Shielded>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every non-overlapping match of `pattern` with a fresh opaque
    /// placeholder, storing the match verbatim. Zero matches is a no-op.
    pub fn shield(&mut self, text: &str, pattern: &Regex, tag: &'static str) -> String {
        self.shield_with(text, pattern, tag, |caps: &Captures| caps[0].to_string())
    }

    /// As `shield`, but the stored value is `transform(&caps)` rather than the
    /// raw match. Used where a matched span must be rewritten before it goes
    /// behind its token (ruby-to-bracket conversion).
    pub fn shield_with(
        &mut self,
        text: &str,
        pattern: &Regex,
        tag: &'static str,
        transform: impl FnMut(&Captures) -> String,
    ) -> String {
        self.shield_inner(text, pattern, tag, OPAQUE_OPEN, OPAQUE_CLOSE, transform)
    }

    /// As `shield_with`, but the token is nestable: the bracket grammar will
    /// accept it inside a base. Cloze spans need this so a cloze forming part
    /// of an annotated base survives into the base slot.
    pub fn shield_nestable_with(
        &mut self,
        text: &str,
        pattern: &Regex,
        tag: &'static str,
        transform: impl FnMut(&Captures) -> String,
    ) -> String {
        self.shield_inner(text, pattern, tag, NESTABLE_MARK, NESTABLE_MARK, transform)
    }

    fn shield_inner(
        &mut self,
        text: &str,
        pattern: &Regex,
        tag: &'static str,
        open: char,
        close: char,
        mut transform: impl FnMut(&Captures) -> String,
    ) -> String {
        let segments = &mut self.segments;
        pattern
            .replace_all(text, |caps: &Captures| {
                let placeholder = next_placeholder(tag, open, close);
                segments.push(Shielded {
                    placeholder: placeholder.clone(),
                    stored: transform(caps),
                    tag,
                });
                placeholder
            })
            .into_owned()
    }

    /// Replace every stored placeholder present in `text` with its stored
    /// value. Restores in reverse order of creation so a restored span that
    /// contains an earlier token is resolved on a later iteration, never
    /// re-matched. Text without known placeholders is returned unchanged.
    pub fn restore(&self, text: &str) -> String {
        let mut result = text.to_string();
        for seg in self.segments.iter().rev() {
            result = result.replace(&seg.placeholder, &seg.stored);
        }
        result
    }

    /// Check that every placeholder of this session survived an external pass
    /// byte-for-byte, exactly once. Run at the generator boundary before the
    /// session's own restore; a corrupted token aborts the whole call.
    pub fn verify(&self, text: &str) -> Result<()> {
        for seg in &self.segments {
            if text.matches(seg.placeholder.as_str()).count() != 1 {
                return Err(Error::PlaceholderCorrupted {
                    token: seg
                        .placeholder
                        .trim_matches(|c| matches!(c, NESTABLE_MARK | OPAQUE_OPEN | OPAQUE_CLOSE))
                        .to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn segments(&self) -> &[Shielded] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Shield all structural syntax in one session, in fixed priority order.
/// Each cloze match (either syntax) is passed through `on_cloze` before being
/// stored, which is where bracket occurrences inside a cloze interior are
/// processed before the cloze as a whole disappears behind its token.
pub fn shield_structural(
    text: &str,
    mut on_cloze: impl FnMut(&Captures) -> String,
) -> (String, Session) {
    let mut session = Session::new();
    let mut result = session.shield(text, &TYPEIN_RE, "typein");
    result = session.shield(&result, &SOUND_RE, "sound");
    result = session.shield_nestable_with(&result, &CLOZE_SPAN_RE, "cloze", &mut on_cloze);
    result = session.shield_nestable_with(&result, &CLOZE_BRACES_RE, "clozeb", &mut on_cloze);
    result = session.shield(&result, &LINEBREAK_RE, "br");
    result = session.shield(&result, &MARKUP_TAG_RE, "tag");
    (result, session)
}
