use crate::detector::is_word_char;
use crate::grammar::strip_markup;

/// A finalized fragment with its boundary-space bookkeeping, consumed by the
/// editing-surface adapter to keep cursor lengths correct after the splice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub html: String,
    pub space_left: bool,
    pub space_right: bool,
}

fn first_visible(fragment: &str) -> Option<char> {
    strip_markup(fragment).chars().next()
}

fn last_visible(fragment: &str) -> Option<char> {
    strip_markup(fragment).chars().last()
}

/// Decide whether splicing `html` between `before` and `after` verbatim would
/// fuse word-forming characters across a boundary, and compensate with a
/// U+00A0 on the side that needs one. Ideographic neighbours never need a
/// boundary space; markup tags are invisible to the check. Pure function.
pub fn normalize_boundaries(html: &str, before: &str, after: &str) -> Normalized {
    let fuses = |a: Option<char>, b: Option<char>| {
        matches!((a, b), (Some(a), Some(b)) if is_word_char(a) && is_word_char(b))
    };
    let space_left = fuses(last_visible(before), first_visible(html));
    let space_right = fuses(last_visible(html), first_visible(after));

    let mut adjusted =
        String::with_capacity(html.len() + space_left as usize + space_right as usize);
    if space_left {
        adjusted.push('\u{a0}');
    }
    adjusted.push_str(html);
    if space_right {
        adjusted.push('\u{a0}');
    }
    Normalized {
        html: adjusted,
        space_left,
        space_right,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_characters_fuse_left() {
        let n = normalize_boundaries("abc", "word", "");
        assert!(n.space_left);
        assert!(!n.space_right);
        assert_eq!(n.html, "\u{a0}abc");
    }

    #[test]
    fn test_word_characters_fuse_right() {
        let n = normalize_boundaries("abc", "", "word");
        assert!(!n.space_left);
        assert!(n.space_right);
        assert_eq!(n.html, "abc\u{a0}");
    }

    #[test]
    fn test_ideographic_neighbours_need_no_space() {
        let n = normalize_boundaries("漢字", "猫", "犬");
        assert!(!n.space_left);
        assert!(!n.space_right);
        assert_eq!(n.html, "漢字");
    }

    #[test]
    fn test_markup_is_invisible_to_the_check() {
        let n = normalize_boundaries("<b>abc</b>", "word<br>", "x");
        // the <br> tag is invisible; "word" still touches "abc"
        assert!(n.space_left);
        assert!(n.space_right);
        assert_eq!(n.html, "\u{a0}<b>abc</b>\u{a0}");
    }

    #[test]
    fn test_ruby_markup_first_visible_is_base_text() {
        let html = r#"<ruby title="ABC(xyz)"><rb>ABC</rb><rt>xyz</rt></ruby>"#;
        let n = normalize_boundaries(html, "word", "");
        assert!(n.space_left);
    }

    #[test]
    fn test_empty_context_never_compensates() {
        let n = normalize_boundaries("abc", "", "");
        assert!(!n.space_left);
        assert!(!n.space_right);
        assert_eq!(n.html, "abc");
    }

    #[test]
    fn test_existing_space_prevents_compensation() {
        let n = normalize_boundaries("abc", "word ", " word");
        assert!(!n.space_left);
        assert!(!n.space_right);
    }

    #[test]
    fn test_empty_fragment() {
        let n = normalize_boundaries("", "word", "word");
        assert!(!n.space_left);
        assert!(!n.space_right);
        assert_eq!(n.html, "");
    }
}
