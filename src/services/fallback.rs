//! Escalation strategies for documents whose headings the title rules miss.
//!
//! Neither strategy trusts the line it breaks on as a heading; section
//! titles are inferred from the first lines of each resulting section.

use crate::models::TitleChunk;
use crate::services::chunker::{ChunkingStrategy, Draft, SourceLine, compact, into_chunks};
use crate::services::patterns::{
    contains_context_keyword, is_domain_anchor, is_preposition_opener,
};
use crate::utils::{char_len, clean_title, is_upper_line, starts_uppercase};
use regex::Regex;
use std::sync::LazyLock;

pub const GENERIC_SECTION_TITLES: &[&str] = &[
    "Preâmbulo",
    "Informações do Concurso",
    "Das Inscrições",
    "Das Provas e Avaliação",
    "Do Resultado e Classificação",
    "Das Disposições Gerais",
    "Anexos e Complementos",
];

const TITLE_SCAN_LINES: usize = 10;

static NUMBERED_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+[.-]\s*\p{Lu}").expect("valid numbered break regex"));

static STRONG_ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:EDITAL|CONCURSO|ABERTURA|INSCRI[CÇ]|PROVA|RESULTADO|CRONOGRAMA|DISPOSI[CÇ]|ANEXO|CARGO|VAGA|REQUISITO|ATRIBUI[CÇ])",
    )
    .expect("valid anchor regex")
});

static LEGISLATIVE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:LEI|DECRETO|PORTARIA|RESOLU[CÇ][AÃ]O|INSTRU[CÇ][AÃ]O)\b")
        .expect("valid legislative regex")
});

/// Looser break rules used when no heading structure was found.
pub fn is_semantic_break(line: &str, previous_blank: bool) -> bool {
    if line.is_empty() {
        return false;
    }
    let len = char_len(line);
    ((15..=150).contains(&len) && is_upper_line(line))
        || NUMBERED_BREAK.is_match(line)
        || STRONG_ANCHOR.is_match(line)
        || is_preposition_opener(line)
        || LEGISLATIVE_REFERENCE.is_match(line)
        || (previous_blank && starts_uppercase(line))
}

/// Picks a heading for a section that was not cut on a title line.
pub fn infer_section_title(content: &str, index: usize) -> String {
    let head: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(TITLE_SCAN_LINES)
        .collect();

    let keyword_line = head
        .iter()
        .find(|line| {
            char_len(line) <= 150 && (contains_context_keyword(line) || is_domain_anchor(line))
        });
    let upper_line = || {
        head.iter()
            .find(|line| (15..=80).contains(&char_len(line)) && is_upper_line(line))
    };
    let opener_line = || head.iter().find(|line| is_preposition_opener(line));

    match keyword_line.or_else(upper_line).or_else(opener_line) {
        Some(line) => clean_title(line),
        None => generic_title(index),
    }
}

pub fn generic_title(index: usize) -> String {
    GENERIC_SECTION_TITLES
        .get(index)
        .map(|title| title.to_string())
        .unwrap_or_else(|| format!("Seção {}", index + 1))
}

fn name_sections(drafts: Vec<Draft>) -> Vec<TitleChunk> {
    let named = drafts
        .into_iter()
        .enumerate()
        .map(|(index, mut draft)| {
            draft.title = infer_section_title(&draft.content, index);
            draft.level = 1;
            draft
        })
        .collect();
    into_chunks(named)
}

/// Tier 1: cuts on loose structural cues once a section is big enough, and
/// unconditionally once it grows too big.
pub struct SemanticStrategy {
    min_chars: usize,
    max_chars: usize,
}

impl SemanticStrategy {
    pub fn new(min_chars: usize, max_chars: usize) -> Self {
        Self {
            min_chars,
            max_chars,
        }
    }
}

impl ChunkingStrategy for SemanticStrategy {
    fn name(&self) -> &'static str {
        "semantic"
    }

    fn chunk(&self, lines: &[SourceLine<'_>]) -> Vec<TitleChunk> {
        let mut drafts = Vec::new();
        let mut current = Draft::untitled(lines.first().map_or(0, |line| line.start));
        let mut previous_blank = false;

        for line in lines {
            let trimmed = line.trimmed();
            if !current.is_empty() {
                let cue = current.chars > self.min_chars && is_semantic_break(trimmed, previous_blank);
                if cue || current.chars > self.max_chars {
                    drafts.push(std::mem::replace(&mut current, Draft::untitled(line.start)));
                }
            }
            current.push(line);
            previous_blank = trimmed.is_empty();
        }
        drafts.push(current);

        name_sections(compact(drafts))
    }
}

/// Tier 2: contiguous line groups of roughly equal size.
pub struct FixedSizeStrategy {
    target_sections: usize,
    safety_split_chars: usize,
}

impl FixedSizeStrategy {
    pub fn new(target_sections: usize, safety_split_chars: usize) -> Self {
        Self {
            target_sections: target_sections.max(1),
            safety_split_chars,
        }
    }
}

impl ChunkingStrategy for FixedSizeStrategy {
    fn name(&self) -> &'static str {
        "fixed-size"
    }

    fn chunk(&self, lines: &[SourceLine<'_>]) -> Vec<TitleChunk> {
        if lines.is_empty() {
            return Vec::new();
        }

        let per_group = lines.len().div_ceil(self.target_sections).max(1);
        let mut drafts = compact(lines.chunks(per_group).map(Draft::from_lines).collect());

        let total_chars: usize = lines.iter().map(|line| line.chars).sum();
        if drafts.len() < 2 && total_chars > self.safety_split_chars {
            if let Some(halves) = midpoint_split(lines) {
                drafts = halves;
            }
        }

        name_sections(drafts)
    }
}

/// Splits the text in two around its middle: at the middle non-blank line
/// when there are several, otherwise at the whitespace nearest to the middle
/// of the only non-blank line.
pub(crate) fn midpoint_split(lines: &[SourceLine<'_>]) -> Option<Vec<Draft>> {
    let filled: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| !line.trimmed().is_empty())
        .map(|(index, _)| index)
        .collect();

    if filled.len() >= 2 {
        let cut = filled[filled.len() / 2];
        let (head, tail) = lines.split_at(cut);
        return Some(vec![Draft::from_lines(head), Draft::from_lines(tail)]);
    }

    let only = *filled.first()?;
    let line = &lines[only];
    let cut = split_point(line.text)?;
    let (left, right) = line.text.split_at(cut);

    let mut head = Draft::from_lines(&lines[..only]);
    if lines[..only].is_empty() {
        head.start = line.start;
    }
    head.push_str(left);

    let mut tail = Draft::untitled(head.start + head.chars);
    tail.push_str(right);
    for rest in &lines[only + 1..] {
        tail.push(rest);
    }

    Some(vec![head, tail])
}

/// Byte index to split a single line at, leaving non-whitespace on both
/// sides.
fn split_point(text: &str) -> Option<usize> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let first = chars.iter().position(|(_, c)| !c.is_whitespace())?;
    let last = chars.iter().rposition(|(_, c)| !c.is_whitespace())?;
    if last <= first {
        return None;
    }

    let middle = (first + last) / 2;
    let whitespace_near_middle = (0..=(last - first)).find_map(|distance| {
        [middle + distance, middle.saturating_sub(distance)]
            .into_iter()
            .find(|&candidate| {
                candidate > first && candidate < last && chars[candidate].1.is_whitespace()
            })
    });

    let cut = whitespace_near_middle.unwrap_or(middle + 1);
    Some(chars[cut].0)
}
