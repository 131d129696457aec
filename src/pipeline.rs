use crate::config::{Config, ReadingsPattern};
use crate::detector;
use crate::error::Result;
use crate::generator::ReadingGenerator;
use crate::grammar::FURIGANA_BRACKETS_RE;
use crate::protect::{shield_structural, Session};
use crate::ruby::{brackets_to_markup, convert_markup, strip_readings, FURIGANA_HTML_RE};

#[derive(Debug)]
pub struct GenerateOutcome {
    pub html: String,
    /// False means "nothing to generate": the output is textually identical
    /// to the input. An informational notice, never an error.
    pub changed: bool,
}

#[derive(Debug)]
pub struct DeleteOutcome {
    pub html: String,
    /// Zero means "no readings found", likewise informational.
    pub removed: usize,
}

/// Annotate the selected fragment with readings from the generator.
///
/// Pattern A (`ruby`) wraps generation in `convert_markup` passes, so
/// pre-existing annotations are canonicalized through the bracket grammar on
/// both sides. Pattern B (`brackets`) leaves pre-existing markup
/// byte-identical. Both finish with a render pass that turns every remaining
/// bracket occurrence, the generator's new ones included, into ruby markup.
pub fn generate_ruby(
    selected: &str,
    config: &Config,
    generator: &impl ReadingGenerator,
) -> Result<GenerateOutcome> {
    let mut html = selected.to_string();
    if config.readings_pattern == ReadingsPattern::Ruby {
        html = convert_markup(&html);
    }
    html = annotate(&html, generator)?;
    if config.readings_pattern == ReadingsPattern::Ruby {
        html = convert_markup(&html);
    }
    let (html, _rendered) = brackets_to_markup(&html);
    Ok(GenerateOutcome {
        changed: html != selected,
        html,
    })
}

/// Protect -> generate -> verify -> restore. The generator sees only plain
/// annotatable text and opaque tokens: existing ruby elements, structural
/// syntax (cloze interiors ride along verbatim inside their tokens), and
/// existing bracket notation are all shielded first. Restoration runs in
/// strict reverse order of protection, each session verified on the text it
/// is about to be restored into.
fn annotate(html: &str, generator: &impl ReadingGenerator) -> Result<String> {
    let mut ruby_session = Session::new();
    let shielded = ruby_session.shield(html, &FURIGANA_HTML_RE, "ruby");
    let (shielded, structural) =
        shield_structural(&shielded, |caps: &regex::Captures| caps[0].to_string());
    let mut bracket_session = Session::new();
    let shielded = bracket_session.shield(&shielded, &FURIGANA_BRACKETS_RE, "fb");
    // raw newlines are editor noise; markup line breaks are already tokenized
    let shielded = shielded.replace('\n', "");

    if !detector::contains_kanji(&shielded) {
        return Ok(html.to_string());
    }

    let annotated = generator.annotate(&shielded)?;

    bracket_session.verify(&annotated)?;
    let annotated = bracket_session.restore(&annotated);
    structural.verify(&annotated)?;
    let annotated = structural.restore(&annotated);
    ruby_session.verify(&annotated)?;
    Ok(ruby_session.restore(&annotated))
}

/// Strip readings from the selected fragment, in both representations.
/// Each round removes every bracket reading, then converts surviving ruby
/// markup to bracket notation for the next round, until a round finds
/// nothing to strip and nothing left to convert.
pub fn delete_ruby(selected: &str) -> DeleteOutcome {
    let mut html = selected.to_string();
    let mut removed = 0;
    loop {
        let (stripped, count) = strip_readings(&html);
        removed += count;
        html = convert_markup(&stripped);
        if count == 0 && html == stripped {
            break;
        }
    }
    DeleteOutcome { html, removed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::cell::Cell;

    fn annotate_kanji(from: &str, to: &str) -> impl Fn(&str) -> Result<String> {
        let (from, to) = (from.to_string(), to.to_string());
        move |text: &str| Ok(text.replace(&from, &to))
    }

    #[test]
    fn test_generate_basic() {
        let config = Config::default();
        let gen = annotate_kanji("漢字", "\u{a0}漢字[かんじ]");
        let outcome = generate_ruby("漢字", &config, &gen).unwrap();
        assert!(outcome.changed);
        assert_eq!(
            outcome.html,
            r#"<ruby title="漢字(かんじ)"><rb>漢字</rb><rt>かんじ</rt></ruby>"#
        );
    }

    #[test]
    fn test_generate_noop_without_kanji() {
        let config = Config::default();
        let called = Cell::new(false);
        let gen = |text: &str| -> Result<String> {
            called.set(true);
            Ok(text.to_string())
        };
        let outcome = generate_ruby("ひらがなとカタカナ", &config, &gen).unwrap();
        assert!(!outcome.changed);
        assert_eq!(outcome.html, "ひらがなとカタカナ");
        assert!(!called.get(), "generator must not run without kanji");
    }

    #[test]
    fn test_generate_noop_when_kanji_already_annotated() {
        let config = Config {
            readings_pattern: ReadingsPattern::Brackets,
            ..Config::default()
        };
        let called = Cell::new(false);
        let gen = |text: &str| -> Result<String> {
            called.set(true);
            Ok(text.to_string())
        };
        let outcome = generate_ruby("\u{a0}漢字[かんじ]", &config, &gen).unwrap();
        assert!(!called.get(), "shielded brackets hide their kanji");
        // the final render pass still converts the existing brackets
        assert!(outcome.changed);
        assert!(outcome.html.contains("<rt>かんじ</rt>"));
    }

    #[test]
    fn test_generate_skips_cloze_interiors() {
        let config = Config::default();
        let called = Cell::new(false);
        let gen = |text: &str| -> Result<String> {
            called.set(true);
            Ok(text.to_string())
        };
        let outcome = generate_ruby("{{c1::漢字}}", &config, &gen).unwrap();
        assert!(!called.get());
        assert!(!outcome.changed);
    }

    #[test]
    fn test_generate_placeholder_corruption_is_fatal() {
        let config = Config::default();
        let gen = |text: &str| -> Result<String> { Ok(text.replace('\u{fff9}', "")) };
        let err = generate_ruby("<br>漢字", &config, &gen).unwrap_err();
        assert!(matches!(err, Error::PlaceholderCorrupted { .. }));
    }

    #[test]
    fn test_generate_preserves_structural_markup() {
        let config = Config::default();
        let gen = annotate_kanji("猫", "\u{a0}猫[ねこ]");
        let outcome = generate_ruby("<b>猫</b><br>{{type:Reading}}", &config, &gen).unwrap();
        assert!(outcome.changed);
        assert!(outcome.html.contains("<br>{{type:Reading}}"));
        assert!(outcome.html.contains("<rt>ねこ</rt>"));
        assert!(outcome.html.starts_with("<b>"));
    }

    #[test]
    fn test_pattern_ruby_canonicalizes_existing_markup() {
        let config = Config {
            readings_pattern: ReadingsPattern::Ruby,
            ..Config::default()
        };
        let input = concat!(
            r#"<ruby title="stale"><rb>猫</rb><rt>ねこ</rt></ruby>"#,
            "\u{a0}犬"
        );
        let gen = annotate_kanji("犬", "\u{a0}犬[いぬ]");
        let outcome = generate_ruby(input, &config, &gen).unwrap();
        assert!(outcome.html.contains(r#"title="猫(ねこ)""#));
        assert!(outcome.html.contains(r#"title="犬(いぬ)""#));
    }

    #[test]
    fn test_pattern_brackets_keeps_existing_markup_bytes() {
        let config = Config {
            readings_pattern: ReadingsPattern::Brackets,
            ..Config::default()
        };
        let element = r#"<ruby title="stale"><rb>猫</rb><rt>ねこ</rt></ruby>"#;
        let input = format!("{element}\u{a0}犬");
        let gen = annotate_kanji("犬", "\u{a0}犬[いぬ]");
        let outcome = generate_ruby(&input, &config, &gen).unwrap();
        assert!(outcome.html.contains(element));
        assert!(outcome.html.contains(r#"title="犬(いぬ)""#));
    }

    #[test]
    fn test_generate_cloze_interior_brackets_render_nested() {
        // a reading already typed inside a cloze still reaches the viewer as
        // ruby markup nested in the cloze span
        let config = Config {
            readings_pattern: ReadingsPattern::Brackets,
            ..Config::default()
        };
        let gen = annotate_kanji("犬", "\u{a0}犬[いぬ]");
        let outcome = generate_ruby("{{c1::猫[ねこ]}}\u{a0}犬", &config, &gen).unwrap();
        assert!(outcome.html.starts_with("{{c1::<ruby"));
        assert!(outcome.html.contains("<rt>ねこ</rt>"));
        assert!(outcome.html.contains(r#"title="犬(いぬ)""#));
    }

    #[test]
    fn test_delete_markup_with_hidden_base() {
        let input = r#"<ruby title="猫(ねこ)"><rb class="hidden">猫</rb><rt>ねこ</rt></ruby>"#;
        let outcome = delete_ruby(input);
        assert_eq!(outcome.html, "猫");
        assert_eq!(outcome.removed, 1);
    }

    #[test]
    fn test_delete_bracket_notation() {
        let outcome = delete_ruby("\u{a0}漢字[かんじ]です");
        assert_eq!(outcome.html, "漢字です");
        assert_eq!(outcome.removed, 1);
    }

    #[test]
    fn test_delete_mixed_representations() {
        let input = concat!(
            r#"<ruby title="猫(ねこ)"><rb>猫</rb><rt>ねこ</rt></ruby>"#,
            "と\u{a0}犬[いぬ]"
        );
        let outcome = delete_ruby(input);
        assert_eq!(outcome.html, "猫と犬");
        assert_eq!(outcome.removed, 2);
    }

    #[test]
    fn test_delete_noop() {
        let outcome = delete_ruby("ただのテキスト");
        assert_eq!(outcome.html, "ただのテキスト");
        assert_eq!(outcome.removed, 0);
    }

    #[test]
    fn test_delete_inside_cloze() {
        let outcome = delete_ruby("{{c1::猫[ねこ]}}");
        assert_eq!(outcome.html, "{{c1::猫}}");
        assert_eq!(outcome.removed, 1);
    }
}
