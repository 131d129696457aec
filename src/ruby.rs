use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::grammar::{FuriganaUnit, FURIGANA_BRACKETS_RE};
use crate::protect::{shield_structural, Session};

/// Rendered annotation markup: a ruby element whose base and reading slots
/// may each carry a hidden-class attribute.
pub static FURIGANA_HTML_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?s)<ruby[^>]*><rb(?P<base_attrs>[^>]*)>(?P<base>.+?)</rb><rt(?P<reading_attrs>[^>]*)>(?P<reading>.+?)</rt></ruby>",
    )
    .unwrap()
});

fn unit_from_markup(caps: &Captures) -> FuriganaUnit {
    FuriganaUnit {
        base: caps["base"].to_string(),
        reading: caps["reading"].to_string(),
        base_hidden: caps["base_attrs"].contains("hidden"),
        reading_hidden: caps["reading_attrs"].contains("hidden"),
        inside_cloze: false,
    }
}

/// Rewrite every bracket occurrence through `apply`, shielding structural
/// markup around them. Bracket occurrences inside a cloze interior are
/// rewritten in place before the cloze as a whole is shielded, so annotation
/// markup ends up correctly nested inside the cloze delimiters. Returns the
/// rewritten text and how many occurrences (top-level plus inside-cloze)
/// were rewritten.
fn rewrite_brackets(
    html: &str,
    mut apply: impl FnMut(&FuriganaUnit) -> String,
) -> (String, usize) {
    let mut count = 0usize;
    let (shielded, session) = shield_structural(html, |caps: &Captures| {
        let whole = caps.get(0).unwrap();
        let interior = match caps.get(1) {
            Some(m) if !m.as_str().is_empty() => m,
            _ => return whole.as_str().to_string(),
        };
        let converted = FURIGANA_BRACKETS_RE
            .replace_all(interior.as_str(), |c: &Captures| {
                count += 1;
                apply(&FuriganaUnit::from_brackets(c, None, true))
            })
            .into_owned();
        // splice by position so delimiter bytes that happen to repeat the
        // interior text are never touched
        let start = interior.start() - whole.start();
        let end = interior.end() - whole.start();
        let text = whole.as_str();
        format!("{}{}{}", &text[..start], converted, &text[end..])
    });
    let rewritten = FURIGANA_BRACKETS_RE
        .replace_all(&shielded, |c: &Captures| {
            count += 1;
            apply(&FuriganaUnit::from_brackets(c, Some(&session), false))
        })
        .into_owned();
    (session.restore(&rewritten), count)
}

/// Convert every bracket occurrence to annotation markup
pub fn brackets_to_markup(html: &str) -> (String, usize) {
    rewrite_brackets(html, |unit| unit.render())
}

/// Remove every bracket reading, keeping the base text
pub fn strip_readings(html: &str) -> (String, usize) {
    rewrite_brackets(html, |unit| unit.strip())
}

/// Shield every ruby element, storing it as canonical bracket text. Restoring
/// the returned session materializes the bracket notation; until then the
/// elements are opaque tokens that no other pattern can touch.
pub fn markup_to_brackets(html: &str) -> (String, Session) {
    let mut session = Session::new();
    let text = session.shield_with(html, &FURIGANA_HTML_RE, "ruby", bracket_text_for);
    (text, session)
}

fn bracket_text_for(caps: &Captures) -> String {
    let unit = unit_from_markup(caps);
    // Scrub word delimiters out of the base so the bracket grammar can match
    // it again; shielded interiors (cloze spans, tags) keep their bytes.
    let (shielded_base, inner) = shield_structural(&unit.base, |c: &Captures| c[0].to_string());
    let cleaned = shielded_base.replace('\u{a0}', "").replace(' ', "");
    let base = inner.restore(&cleaned);
    FuriganaUnit { base, ..unit }.to_brackets()
}

/// Swap the two annotation representations in one pass: existing ruby markup
/// becomes bracket notation while existing bracket notation becomes ruby
/// markup. Applying it twice canonicalizes both.
pub fn convert_markup(html: &str) -> String {
    let (text, session) = markup_to_brackets(html);
    let (text, _count) = brackets_to_markup(&text);
    session.restore(&text)
}
