use crate::error::Result;
use crate::normalizer::Normalized;

/// The three markup fragments reported by the editing surface for one user
/// action: what precedes the selection, the selection itself, and what
/// follows. Captured fresh per action, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionContext {
    pub before: String,
    pub selected: String,
    pub after: String,
}

impl SelectionContext {
    /// All three fragments share one normalization before any pattern
    /// matching: `&nbsp;` entities become U+00A0.
    pub fn new(
        before: impl Into<String>,
        selected: impl Into<String>,
        after: impl Into<String>,
    ) -> Self {
        fn normalize(fragment: String) -> String {
            fragment.replace("&nbsp;", "\u{a0}")
        }
        Self {
            before: normalize(before.into()),
            selected: normalize(selected.into()),
            after: normalize(after.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.selected.trim().is_empty()
    }
}

/// How the replacement fragment should be spliced over the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpliceStrategy {
    /// Length-based in-place substitution.
    Inline,
    /// Document-fragment-level replacement; required when the selection
    /// boundary touches ruby markup, which the inline path corrupts.
    Fragment,
}

impl SpliceStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::Fragment => "fragment",
        }
    }
}

/// Pick the splice path for a replacement. The inline path is only safe when
/// neither the replacement nor the selection ends on a ruby element, the
/// following fragment starts with neither a ruby nor a block element, both
/// surrounding fragments are non-empty, and the preceding fragment does not
/// end on a block close.
pub fn splice_strategy(ctx: &SelectionContext, replacement: &str) -> SpliceStrategy {
    let inline_safe = !replacement.ends_with("</ruby>")
        && !ctx.selected.ends_with("</ruby>")
        && !ctx.after.starts_with("<ruby")
        && !ctx.after.starts_with("<div")
        && !ctx.after.is_empty()
        && !ctx.before.is_empty()
        && !ctx.before.ends_with("</div>");
    if inline_safe {
        SpliceStrategy::Inline
    } else {
        SpliceStrategy::Fragment
    }
}

/// Narrow synchronous port to the host editing surface. The engine itself
/// never suspends; asynchronous hosts adapt behind this trait.
pub trait EditorPort {
    /// Report the current selection context; hosts retry with a select-all
    /// fallback when the initial selection is empty.
    fn selection(&mut self) -> Result<SelectionContext>;

    /// Splice the normalized replacement over the current selection.
    fn replace_selection(&mut self, normalized: &Normalized, strategy: SpliceStrategy)
        -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(before: &str, selected: &str, after: &str) -> SelectionContext {
        SelectionContext::new(before, selected, after)
    }

    #[test]
    fn test_nbsp_normalization_covers_all_fragments() {
        let ctx = ctx("a&nbsp;", "b&nbsp;c", "&nbsp;d");
        assert_eq!(ctx.before, "a\u{a0}");
        assert_eq!(ctx.selected, "b\u{a0}c");
        assert_eq!(ctx.after, "\u{a0}d");
    }

    #[test]
    fn test_empty_selection() {
        assert!(ctx("x", "  ", "y").is_empty());
        assert!(!ctx("x", "猫", "y").is_empty());
    }

    #[test]
    fn test_inline_when_no_boundary_touches_ruby() {
        let ctx = ctx("before", "猫", "after");
        assert_eq!(splice_strategy(&ctx, "犬"), SpliceStrategy::Inline);
    }

    #[test]
    fn test_fragment_when_replacement_ends_with_ruby() {
        let ctx = ctx("before", "猫", "after");
        let replacement = r#"<ruby title="猫(ねこ)"><rb>猫</rb><rt>ねこ</rt></ruby>"#;
        assert_eq!(splice_strategy(&ctx, replacement), SpliceStrategy::Fragment);
    }

    #[test]
    fn test_fragment_when_selection_ends_with_ruby() {
        let ctx = ctx("b", "x</ruby>", "a");
        assert_eq!(splice_strategy(&ctx, "y"), SpliceStrategy::Fragment);
    }

    #[test]
    fn test_fragment_when_following_fragment_opens_ruby_or_block() {
        assert_eq!(
            splice_strategy(&ctx("b", "x", "<ruby>…"), "y"),
            SpliceStrategy::Fragment
        );
        assert_eq!(
            splice_strategy(&ctx("b", "x", "<div>…"), "y"),
            SpliceStrategy::Fragment
        );
    }

    #[test]
    fn test_fragment_at_document_edges() {
        assert_eq!(splice_strategy(&ctx("", "x", "a"), "y"), SpliceStrategy::Fragment);
        assert_eq!(splice_strategy(&ctx("b", "x", ""), "y"), SpliceStrategy::Fragment);
    }

    #[test]
    fn test_fragment_after_block_close() {
        assert_eq!(
            splice_strategy(&ctx("…</div>", "x", "a"), "y"),
            SpliceStrategy::Fragment
        );
    }
}
