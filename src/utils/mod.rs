use regex::Regex;
use std::sync::LazyLock;

static EXCESS_BREAKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n(?:[ \t]*\n){2,}").expect("valid excess-breaks regex"));

static DATE_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:\d{4}[-/]\d{1,2}[-/]\d{1,2}|\d{1,2}[-/]\d{1,2}[-/]\d{2,4}|\d{1,2}\.\d{1,2}\.\d{4})\b",
    )
    .expect("valid date regex")
});

static DECIMAL_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:[.,]\d+)*$").expect("valid number regex"));

static STRUCTURAL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:CAP[IÍ]TULO|T[IÍ]TULO|PARTE|SE[CÇ][AÃ]O|ANEXO|AP[EÊ]NDICE)\s+(?:(?-i:[IVXLCDM]+)|\d+)\b\s*[-–—:.]?\s*",
    )
    .expect("valid structural prefix regex")
});

static LEADING_NUMBERING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{1,3}(?:\.\d{1,3})*\.?\s*[-–—)]?\s*").expect("valid numbering regex")
});

static ROMAN_NUMERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^M{0,3}(?:CM|CD|D?C{0,3})(?:XC|XL|L?X{0,3})(?:IX|IV|V?I{0,3})$")
        .expect("valid roman numeral regex")
});

/// Words kept lowercase when they are not the first word of a title.
const CONNECTORS: &[&str] = &[
    "a", "o", "e", "ou", "de", "da", "do", "das", "dos", "em", "no", "na", "nos", "nas", "ao",
    "aos", "à", "às", "para", "por", "com",
];

fn is_title_punctuation(c: char) -> bool {
    c.is_whitespace()
        || matches!(
            c,
            '-' | '–' | '—' | '‒' | '_' | ':' | ';' | ',' | '.' | '*' | '•' | '·' | '|'
        )
}

/// Brings every line break to `\n` and collapses runs of two or more
/// blank lines, whitespace-only ones included, into a single blank line.
///
/// Must run before any line-based matching: PDF extractors mix CRLF, bare CR,
/// form feeds at page breaks and Unicode separators.
pub fn normalize_line_breaks(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace(
        ['\r', '\u{000B}', '\u{000C}', '\u{0085}', '\u{2028}', '\u{2029}'],
        "\n",
    );
    EXCESS_BREAKS.replace_all(&unified, "\n\n").into_owned()
}

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

pub fn is_date_like(line: &str) -> bool {
    DATE_LIKE.is_match(line.trim())
}

pub fn is_decimal_number(line: &str) -> bool {
    DECIMAL_NUMBER.is_match(line.trim())
}

pub fn starts_lowercase(line: &str) -> bool {
    line.chars().next().is_some_and(|c| c.is_lowercase())
}

pub fn starts_uppercase(line: &str) -> bool {
    line.chars().next().is_some_and(|c| c.is_uppercase())
}

/// Lowercase letters that have an uppercase form; ordinal marks such as
/// `º` and `ª` do not count.
fn is_cased_lowercase(c: char) -> bool {
    c.is_lowercase() && c.to_uppercase().next() != Some(c)
}

/// True when the line carries letters and none of them is lowercase.
pub fn is_upper_line(line: &str) -> bool {
    let mut letters = 0usize;
    for c in line.chars() {
        if c.is_alphabetic() {
            if is_cased_lowercase(c) {
                return false;
            }
            letters += 1;
        }
    }
    letters >= 2
}

/// Capitalizes each word, keeping Portuguese connectors lowercase and
/// Roman numerals untouched.
pub fn capitalize_words(text: &str) -> String {
    text.split_whitespace()
        .enumerate()
        .map(|(idx, word)| {
            if ROMAN_NUMERAL.is_match(word) {
                return word.to_string();
            }
            let lower = word.to_lowercase();
            if idx > 0 && CONNECTORS.contains(&lower.as_str()) {
                return lower;
            }
            let mut capitalized = String::with_capacity(lower.len());
            let mut done = false;
            for c in lower.chars() {
                if !done && c.is_alphabetic() {
                    capitalized.extend(c.to_uppercase());
                    done = true;
                } else {
                    capitalized.push(c);
                }
            }
            capitalized
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Turns a raw heading capture into a display title: structural prefixes
/// and leading numbering removed, dash-like edges trimmed, words
/// capitalized.
pub fn clean_title(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_prefix = STRUCTURAL_PREFIX.replace(trimmed, "");
    let without_numbering = LEADING_NUMBERING.replace(&without_prefix, "");
    let stripped = without_numbering.trim_matches(is_title_punctuation);

    let chosen = if char_len(stripped) >= 2 {
        stripped
    } else {
        trimmed.trim_matches(is_title_punctuation)
    };
    capitalize_words(chosen)
}
