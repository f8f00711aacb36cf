//! Title detection for linearized edital text.
//!
//! Each heading family is an independent rule; rules are evaluated in
//! priority order and the first one whose capture survives validation wins.
//! Lines no rule claims still get a contextual keyword check.

use crate::utils::{
    char_len, clean_title, is_date_like, is_decimal_number, is_upper_line, starts_lowercase,
};
use regex::Regex;
use std::sync::LazyLock;

static STRUCTURAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(CAP[IÍ]TULO|T[IÍ]TULO|PARTE|SE[CÇ][AÃ]O|ANEXO|AP[EÊ]NDICE)\s+(?:(?-i:[IVXLCDM]+)|\d+)\b\s*(?:[-–—:.]\s*)?(.*)$",
    )
    .expect("valid structural regex")
});

static DECIMAL_OUTLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,3}(?:\.\d{1,2}){0,3})(\.)?\s+(\p{L}.*)$").expect("valid outline regex")
});

static PREPOSITION_OPENER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:DO|DA|DOS|DAS|NO|NA|NOS|NAS|DE|DES)\s+\p{Lu}{3,}")
        .expect("valid preposition regex")
});

static DOMAIN_ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:DISPOSI[CÇ][OÕ]ES\s+(?:GERAIS|FINAIS|PRELIMINARES)|CRONOGRAMA|RECURSOS|IMPUGNA[CÇ][OÕ]ES|INSCRI[CÇ][OÕ]ES|PROVAS|AVALIA[CÇ][AÃ]O|RESULTADOS?|CLASSIFICA[CÇ][AÃ]O|NOMEA[CÇ][AÃ]O|HOMOLOGA[CÇ][AÃ]O)\b",
    )
    .expect("valid domain anchor regex")
});

static CAPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\p{Lu}[\p{Lu}\d\s]{3,}\p{Lu})\s*(?::|\s[-–—]\s)").expect("valid caption regex")
});

/// Keywords that mark a line as a heading even when no structural rule
/// matched. Also drives section title inference in the fallback tiers.
pub const CONTEXT_KEYWORDS: &[&str] = &[
    "EDITAL",
    "CONCURSO",
    "SELEÇÃO",
    "PROCESSO SELETIVO",
    "REQUISITOS",
    "ATRIBUIÇÕES",
    "REMUNERAÇÃO",
    "SALÁRIO",
    "INSCRIÇÃO",
    "TAXA",
    "DOCUMENTAÇÃO",
    "CRONOGRAMA",
    "PROVA",
    "EXAME",
    "AVALIAÇÃO",
    "TESTE",
    "RESULTADO",
    "CLASSIFICAÇÃO",
    "CONVOCAÇÃO",
    "POSSE",
    "EXERCÍCIO",
    "LOTAÇÃO",
    "IMPUGNAÇÃO",
    "RECURSO",
    "QUESTIONAMENTO",
];

const MIN_LINE_CHARS: usize = 3;
const MAX_LINE_CHARS: usize = 200;
const PROSE_LINE_CHARS: usize = 50;
const MIN_TITLE_CHARS: usize = 2;
const MAX_TITLE_CHARS: usize = 150;

/// Heading families, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleRule {
    /// `CAPÍTULO II - ...`, `SEÇÃO 3`, `ANEXO I`.
    Structural,
    /// `2.`, `2.1`, `2.1.3`, `2.1.3.4` followed by text.
    DecimalOutline,
    /// `DAS INSCRIÇÕES`, `DO CARGO`.
    PrepositionOpener,
    /// `CRONOGRAMA`, `DISPOSIÇÕES GERAIS`.
    DomainAnchor,
    /// Free-standing all-caps line.
    UpperCaseLine,
    /// All-caps label followed by a colon or dash.
    Caption,
    /// Contains a domain keyword; contextual fallback.
    ContextKeyword,
    /// Short all-caps line ending in a colon; contextual fallback.
    ContextColon,
}

/// What a rule captured before cleaning and level assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTitle {
    pub text: String,
    /// Keyword or numbering the level is derived from, when the rule has one.
    pub marker: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleMatch {
    pub rule: TitleRule,
    pub title: String,
    pub level: u32,
}

type RuleFn = fn(&str) -> Option<RawTitle>;

const PATTERN_RULES: &[(TitleRule, RuleFn)] = &[
    (TitleRule::Structural, match_structural),
    (TitleRule::DecimalOutline, match_decimal_outline),
    (TitleRule::PrepositionOpener, match_preposition_opener),
    (TitleRule::DomainAnchor, match_domain_anchor),
    (TitleRule::UpperCaseLine, match_upper_case_line),
    (TitleRule::Caption, match_caption),
];

const CONTEXT_RULES: &[(TitleRule, RuleFn)] = &[
    (TitleRule::ContextKeyword, match_context_keyword),
    (TitleRule::ContextColon, match_context_colon),
];

fn whole_line(line: &str) -> RawTitle {
    RawTitle {
        text: line.to_string(),
        marker: None,
    }
}

fn match_structural(line: &str) -> Option<RawTitle> {
    let caps = STRUCTURAL.captures(line)?;
    Some(RawTitle {
        text: line.to_string(),
        marker: Some(caps[1].to_uppercase()),
    })
}

fn match_decimal_outline(line: &str) -> Option<RawTitle> {
    let caps = DECIMAL_OUTLINE.captures(line)?;
    let numbering = &caps[1];
    // A bare `N` needs its trailing dot to count as outline numbering.
    if !numbering.contains('.') && caps.get(2).is_none() {
        return None;
    }
    Some(RawTitle {
        text: caps[3].to_string(),
        marker: Some(numbering.to_string()),
    })
}

fn match_preposition_opener(line: &str) -> Option<RawTitle> {
    is_preposition_opener(line).then(|| whole_line(line))
}

fn match_domain_anchor(line: &str) -> Option<RawTitle> {
    is_domain_anchor(line).then(|| whole_line(line))
}

fn match_upper_case_line(line: &str) -> Option<RawTitle> {
    (char_len(line) >= 9 && is_upper_line(line)).then(|| whole_line(line))
}

fn match_caption(line: &str) -> Option<RawTitle> {
    let caps = CAPTION.captures(line)?;
    Some(RawTitle {
        text: caps[1].to_string(),
        marker: None,
    })
}

fn match_context_keyword(line: &str) -> Option<RawTitle> {
    let len = char_len(line);
    ((5..=100).contains(&len) && contains_context_keyword(line)).then(|| whole_line(line))
}

fn match_context_colon(line: &str) -> Option<RawTitle> {
    let len = char_len(line);
    ((5..=80).contains(&len) && line.ends_with(':') && is_upper_line(line))
        .then(|| whole_line(line))
}

pub fn is_preposition_opener(line: &str) -> bool {
    PREPOSITION_OPENER.is_match(line)
}

pub fn is_domain_anchor(line: &str) -> bool {
    DOMAIN_ANCHOR.is_match(line)
}

pub fn contains_context_keyword(line: &str) -> bool {
    CONTEXT_KEYWORDS.iter().any(|keyword| line.contains(keyword))
}

/// Lines that can never be headings, whatever they look like.
pub fn is_rejected_line(line: &str) -> bool {
    let len = char_len(line);
    len < MIN_LINE_CHARS
        || len > MAX_LINE_CHARS
        || is_date_like(line)
        || is_decimal_number(line)
        || (starts_lowercase(line) && len > PROSE_LINE_CHARS)
}

/// Minimal post-match filter: length bounds plus lines that are mostly
/// digits or mostly punctuation.
fn is_valid_title(title: &str, source: &str) -> bool {
    let len = char_len(title);
    if !(MIN_TITLE_CHARS..=MAX_TITLE_CHARS).contains(&len) {
        return false;
    }

    let visible: Vec<char> = source.chars().filter(|c| !c.is_whitespace()).collect();
    if visible.is_empty() {
        return false;
    }
    let digits = visible.iter().filter(|c| c.is_numeric()).count();
    let alphanumeric = visible.iter().filter(|c| c.is_alphanumeric()).count();
    digits * 2 <= visible.len() && alphanumeric * 2 >= visible.len()
}

/// Maps a matched rule to its hierarchy depth.
pub fn assign_level(rule: TitleRule, raw: &RawTitle, line: &str) -> u32 {
    match rule {
        TitleRule::Structural => match raw.marker.as_deref() {
            Some(marker) if is_top_level_keyword(marker) => 1,
            _ => 2,
        },
        TitleRule::DecimalOutline => raw
            .marker
            .as_deref()
            .map(|numbering| numbering.split('.').count() as u32 + 1)
            .unwrap_or(2),
        TitleRule::UpperCaseLine => {
            if char_len(line) <= 50 {
                2
            } else {
                3
            }
        }
        TitleRule::ContextColon => 3,
        TitleRule::PrepositionOpener
        | TitleRule::DomainAnchor
        | TitleRule::Caption
        | TitleRule::ContextKeyword => 2,
    }
}

fn is_top_level_keyword(marker: &str) -> bool {
    matches!(marker, "CAPÍTULO" | "CAPITULO" | "TÍTULO" | "TITULO" | "PARTE")
}

fn evaluate(rules: &[(TitleRule, RuleFn)], line: &str) -> Option<TitleMatch> {
    rules.iter().find_map(|(rule, matcher)| {
        let raw = matcher(line)?;
        let title = clean_title(&raw.text);
        if !is_valid_title(&title, &raw.text) {
            return None;
        }
        Some(TitleMatch {
            rule: *rule,
            level: assign_level(*rule, &raw, line),
            title,
        })
    })
}

/// Classifies a single line as a heading, returning its display title and
/// level.
pub fn detect_title(line: &str) -> Option<TitleMatch> {
    let line = line.trim();
    if is_rejected_line(line) {
        return None;
    }
    evaluate(PATTERN_RULES, line).or_else(|| evaluate(CONTEXT_RULES, line))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(line: &str) -> TitleMatch {
        detect_title(line).unwrap_or_else(|| panic!("expected a title for {line:?}"))
    }

    #[test]
    fn structural_chapter_is_level_one() {
        let found = detect("CAPÍTULO II - Das Inscrições");
        assert_eq!(found.rule, TitleRule::Structural);
        assert_eq!(found.title, "Das Inscrições");
        assert_eq!(found.level, 1);
    }

    #[test]
    fn structural_annex_is_level_two() {
        let found = detect("ANEXO III – CONTEÚDO PROGRAMÁTICO");
        assert_eq!(found.rule, TitleRule::Structural);
        assert_eq!(found.title, "Conteúdo Programático");
        assert_eq!(found.level, 2);

        let bare = detect("Seção 4");
        assert_eq!(bare.title, "Seção 4");
        assert_eq!(bare.level, 2);
    }

    #[test]
    fn decimal_outline_depth_maps_to_level() {
        assert_eq!(detect("2. DOS REQUISITOS").level, 2);
        let found = detect("2.1 Requisitos Básicos");
        assert_eq!(found.rule, TitleRule::DecimalOutline);
        assert_eq!(found.title, "Requisitos Básicos");
        assert_eq!(found.level, 3);
        assert_eq!(detect("2.1.3 Escolaridade").level, 4);
        assert_eq!(detect("2.1.3.4. Comprovação").level, 5);
    }

    #[test]
    fn thousands_separator_is_not_outline_numbering() {
        assert!(detect_title("1.000 candidatos inscritos").is_none());
        assert!(detect_title("2.500 vagas").is_none());
        assert_eq!(detect("2.10 Recursos").level, 3);
    }

    #[test]
    fn lowercase_numeral_words_are_not_structural() {
        for line in ["Parte mil vezes", "Título civil aplicável", "Seção vi"] {
            let rule = detect_title(line).map(|found| found.rule);
            assert_ne!(rule, Some(TitleRule::Structural), "{line:?}");
        }
        assert_eq!(detect("Capítulo IV").rule, TitleRule::Structural);
        assert_eq!(detect("PARTE XII - DISPOSIÇÕES").level, 1);
    }

    #[test]
    fn bare_number_without_dot_is_not_outline() {
        assert!(match_decimal_outline("2 candidatos aprovados").is_none());
    }

    #[test]
    fn preposition_opener_survives_validation() {
        let found = detect("DAS INSCRIÇÕES");
        assert_eq!(found.rule, TitleRule::PrepositionOpener);
        assert_eq!(found.title, "Das Inscrições");
        assert_eq!(found.level, 2);
    }

    #[test]
    fn domain_anchor_is_level_two() {
        let found = detect("CRONOGRAMA");
        assert_eq!(found.rule, TitleRule::DomainAnchor);
        assert_eq!(found.level, 2);
        assert_eq!(detect("DISPOSIÇÕES FINAIS").title, "Disposições Finais");
    }

    #[test]
    fn upper_case_line_level_depends_on_length() {
        let short = detect("CONTEÚDO PROGRAMÁTICO");
        assert_eq!(short.rule, TitleRule::UpperCaseLine);
        assert_eq!(short.level, 2);

        let long = detect("CONHECIMENTOS ESPECÍFICOS PARA O CARGO DE ANALISTA JUDICIÁRIO");
        assert_eq!(long.rule, TitleRule::UpperCaseLine);
        assert_eq!(long.level, 3);
    }

    #[test]
    fn caption_takes_the_label_before_the_separator() {
        let found = detect("VAGAS: distribuídas conforme o quadro abaixo");
        assert_eq!(found.rule, TitleRule::Caption);
        assert_eq!(found.title, "Vagas");
    }

    #[test]
    fn context_keyword_fallback_is_level_two() {
        let found = detect("Edital de abertura do CONCURSO público");
        assert_eq!(found.rule, TitleRule::ContextKeyword);
        assert_eq!(found.level, 2);
    }

    #[test]
    fn dates_and_numbers_are_never_titles() {
        assert!(detect_title("01/03/2024").is_none());
        assert!(detect_title("2024-03-01").is_none());
        assert!(detect_title("3,14").is_none());
        assert!(detect_title("12").is_none());
    }

    #[test]
    fn long_lowercase_prose_is_never_a_title() {
        let prose: String = "o candidato deverá comparecer ao local de prova com antecedência "
            .repeat(5)
            .chars()
            .take(300)
            .collect();
        assert!(detect_title(&prose).is_none());
    }

    #[test]
    fn length_bounds_are_enforced() {
        assert!(detect_title("AB").is_none());
        let huge = "A".repeat(201);
        assert!(detect_title(&huge).is_none());
    }

    #[test]
    fn mostly_numeric_or_punctuation_lines_are_rejected() {
        assert!(detect_title("1.1 A 10 20 30 40 50 60").is_none());
        assert!(detect_title("--- *** ---").is_none());
    }

    #[test]
    fn plain_sentence_is_not_a_title() {
        assert!(detect_title("O candidato deverá levar documento com foto.").is_none());
    }
}
