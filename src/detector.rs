#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Han,
    Hiragana,
    Katakana,
    Other,
}

/// Classify one character by Japanese script block
pub fn script_of(ch: char) -> Script {
    match ch {
        // CJK Unified Ideographs (main block + extensions)
        '\u{4E00}'..='\u{9FFF}' |  // CJK Unified Ideographs
        '\u{3400}'..='\u{4DBF}' |  // CJK Extension A
        '\u{20000}'..='\u{2A6DF}'| // CJK Extension B
        '\u{2A700}'..='\u{2B73F}'| // CJK Extension C
        '\u{2B740}'..='\u{2B81F}'| // CJK Extension D
        '\u{2B820}'..='\u{2CEAF}'| // CJK Extension E
        '\u{2CEB0}'..='\u{2EBEF}'| // CJK Extension F
        '\u{30000}'..='\u{3134F}'| // CJK Extension G
        '\u{F900}'..='\u{FAFF}'    // CJK Compatibility Ideographs
            => Script::Han,
        '\u{3040}'..='\u{309F}' => Script::Hiragana,
        '\u{30A0}'..='\u{30FF}' |  // Katakana
        '\u{31F0}'..='\u{31FF}'    // Katakana Phonetic Extensions
            => Script::Katakana,
        _ => Script::Other,
    }
}

pub fn is_han(ch: char) -> bool {
    script_of(ch) == Script::Han
}

pub fn is_kana(ch: char) -> bool {
    matches!(script_of(ch), Script::Hiragana | Script::Katakana)
}

/// Check if character belongs to any CJK block, including symbols,
/// punctuation, and half/fullwidth forms
pub fn is_cjk(ch: char) -> bool {
    matches!(ch,
        '\u{3000}'..='\u{303F}' |  // CJK Symbols and Punctuation
        '\u{FF00}'..='\u{FFEF}'    // Halfwidth and Fullwidth Forms
    ) || is_han(ch)
        || is_kana(ch)
}

/// Word-forming in the spacing sense: an alphanumeric character that needs a
/// visible boundary against its neighbour. Ideographic neighbours never do.
pub fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() && !is_cjk(ch)
}

/// The generator only annotates ideographic base text; kana is already
/// phonetic. Zero Han characters means there is nothing to generate.
pub fn contains_kanji(text: &str) -> bool {
    text.chars().any(is_han)
}

#[derive(Debug, Default)]
pub struct ScriptProfile {
    pub han: usize,
    pub kana: usize,
    pub total: usize,
}

impl ScriptProfile {
    /// Share of non-whitespace characters that are annotatable base text
    pub fn annotatable_ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.han as f64 / self.total as f64
        }
    }
}

/// Count script membership over a fragment, ignoring whitespace
pub fn profile(text: &str) -> ScriptProfile {
    let mut counts = ScriptProfile::default();
    for ch in text.chars() {
        if ch.is_whitespace() {
            continue;
        }
        counts.total += 1;
        match script_of(ch) {
            Script::Han => counts.han += 1,
            Script::Hiragana | Script::Katakana => counts.kana += 1,
            Script::Other => {}
        }
    }
    counts
}
