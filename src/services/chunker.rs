use crate::models::{DocumentSummary, ProcessedContent, TitleChunk};
use crate::services::fallback::{FixedSizeStrategy, SemanticStrategy};
use crate::services::patterns::detect_title;
use crate::utils::{char_len, is_blank, normalize_line_breaks};
use chrono::Utc;
use tracing::debug;

pub const PREAMBLE_TITLE: &str = "Preâmbulo";

/// Thresholds that steer escalation between chunking strategies.
#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    /// Title-driven result is accepted with at least this many chunks.
    pub primary_min_sections: usize,
    /// Semantic result is accepted with at least this many chunks.
    pub semantic_min_sections: usize,
    /// A semantic break is only honored past this many characters.
    pub semantic_min_chars: usize,
    /// A semantic section is cut regardless of break rules past this size.
    pub semantic_max_chars: usize,
    pub fixed_target_sections: usize,
    /// Texts longer than this never come back as a single chunk.
    pub safety_split_chars: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            primary_min_sections: 2,
            semantic_min_sections: 3,
            semantic_min_chars: 800,
            semantic_max_chars: 3000,
            fixed_target_sections: 4,
            safety_split_chars: 1000,
        }
    }
}

/// One line of normalized text, trailing `\n` included.
#[derive(Debug, Clone, Copy)]
pub struct SourceLine<'a> {
    pub text: &'a str,
    /// Character offset of the line in the normalized text.
    pub start: usize,
    pub chars: usize,
}

impl SourceLine<'_> {
    pub fn trimmed(&self) -> &str {
        self.text.trim()
    }
}

pub fn split_lines(text: &str) -> Vec<SourceLine<'_>> {
    let mut offset = 0;
    text.split_inclusive('\n')
        .map(|text| {
            let chars = char_len(text);
            let line = SourceLine {
                text,
                start: offset,
                chars,
            };
            offset += chars;
            line
        })
        .collect()
}

/// A section under construction.
#[derive(Debug, Clone)]
pub(crate) struct Draft {
    pub title: String,
    pub level: u32,
    pub content: String,
    pub start: usize,
    pub chars: usize,
}

impl Draft {
    pub fn new(title: impl Into<String>, level: u32, start: usize) -> Self {
        Self {
            title: title.into(),
            level,
            content: String::new(),
            start,
            chars: 0,
        }
    }

    pub fn untitled(start: usize) -> Self {
        Self::new(String::new(), 1, start)
    }

    pub fn from_lines(lines: &[SourceLine<'_>]) -> Self {
        let mut draft = Self::untitled(lines.first().map_or(0, |line| line.start));
        for line in lines {
            draft.push(line);
        }
        draft
    }

    pub fn push(&mut self, line: &SourceLine<'_>) {
        self.push_str(line.text);
    }

    pub fn push_str(&mut self, text: &str) {
        self.content.push_str(text);
        self.chars += char_len(text);
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn is_blank(&self) -> bool {
        is_blank(&self.content)
    }

    fn append(&mut self, next: Draft) {
        self.content.push_str(&next.content);
        self.chars += next.chars;
    }

    fn prepend(&mut self, previous: Draft) {
        self.start = previous.start;
        self.chars += previous.chars;
        self.content.insert_str(0, &previous.content);
    }

    fn into_chunk(self, index: usize) -> TitleChunk {
        TitleChunk {
            id: format!("chunk-{index}"),
            title: self.title,
            level: self.level,
            start_position: self.start,
            end_position: self.start + self.chars,
            content: self.content,
            parent_id: None,
        }
    }
}

/// Folds whitespace-only drafts into their neighbours so every surviving
/// section has content while offsets stay contiguous.
pub(crate) fn compact(drafts: Vec<Draft>) -> Vec<Draft> {
    let mut out: Vec<Draft> = Vec::with_capacity(drafts.len());
    let mut leading: Option<Draft> = None;

    for mut draft in drafts {
        if draft.is_empty() {
            continue;
        }
        if draft.is_blank() {
            match out.last_mut() {
                Some(last) => last.append(draft),
                None => match leading.as_mut() {
                    Some(pending) => pending.append(draft),
                    None => leading = Some(draft),
                },
            }
            continue;
        }
        if let Some(pending) = leading.take() {
            draft.prepend(pending);
        }
        out.push(draft);
    }

    out
}

pub(crate) fn into_chunks(drafts: Vec<Draft>) -> Vec<TitleChunk> {
    drafts
        .into_iter()
        .enumerate()
        .map(|(index, draft)| draft.into_chunk(index))
        .collect()
}

/// A way of cutting a document into sections.
pub trait ChunkingStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn chunk(&self, lines: &[SourceLine<'_>]) -> Vec<TitleChunk>;
}

/// Cuts at every detected heading line.
pub struct TitleStrategy;

impl ChunkingStrategy for TitleStrategy {
    fn name(&self) -> &'static str {
        "titles"
    }

    fn chunk(&self, lines: &[SourceLine<'_>]) -> Vec<TitleChunk> {
        let mut drafts = Vec::new();
        let mut current = Draft::new(
            PREAMBLE_TITLE,
            1,
            lines.first().map_or(0, |line| line.start),
        );

        for line in lines {
            if let Some(found) = detect_title(line.text) {
                let next = Draft::new(found.title, found.level, line.start);
                drafts.push(std::mem::replace(&mut current, next));
            }
            current.push(line);
        }
        drafts.push(current);

        into_chunks(compact(drafts))
    }
}

struct Stage {
    strategy: Box<dyn ChunkingStrategy>,
    min_sections: usize,
}

/// Links every chunk to the nearest earlier chunk with a smaller level.
pub fn link_parents(chunks: &mut [TitleChunk]) {
    for index in 0..chunks.len() {
        let level = chunks[index].level;
        let parent = chunks[..index]
            .iter()
            .rev()
            .find(|candidate| candidate.level < level)
            .map(|candidate| candidate.id.clone());
        chunks[index].parent_id = parent;
    }
}

/// Stateless title chunker; cheap to construct per call.
#[derive(Debug, Clone, Default)]
pub struct TitleChunker {
    config: ChunkerConfig,
}

impl TitleChunker {
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    fn stages(&self) -> Vec<Stage> {
        vec![
            Stage {
                strategy: Box::new(TitleStrategy),
                min_sections: self.config.primary_min_sections,
            },
            Stage {
                strategy: Box::new(SemanticStrategy::new(
                    self.config.semantic_min_chars,
                    self.config.semantic_max_chars,
                )),
                min_sections: self.config.semantic_min_sections,
            },
            Stage {
                strategy: Box::new(FixedSizeStrategy::new(
                    self.config.fixed_target_sections,
                    self.config.safety_split_chars,
                )),
                min_sections: 0,
            },
        ]
    }

    /// Chunks text that is already normalized.
    pub fn chunk_normalized(&self, text: &str) -> Vec<TitleChunk> {
        if is_blank(text) {
            return Vec::new();
        }

        let lines = split_lines(text);
        let mut chunks = Vec::new();
        for stage in self.stages() {
            chunks = stage.strategy.chunk(&lines);
            if chunks.len() >= stage.min_sections {
                debug!(
                    strategy = stage.strategy.name(),
                    chunks = chunks.len(),
                    "chunking strategy accepted"
                );
                break;
            }
            debug!(
                strategy = stage.strategy.name(),
                chunks = chunks.len(),
                required = stage.min_sections,
                "chunking strategy too coarse, escalating"
            );
        }

        link_parents(&mut chunks);
        chunks
    }

    pub fn chunk_text(&self, text: &str) -> Vec<TitleChunk> {
        self.chunk_normalized(&normalize_line_breaks(text))
    }

    pub fn chunk_document(&self, full_text: &str, file_name: &str) -> DocumentSummary {
        let structure = self.chunk_text(full_text);
        debug!(
            document = file_name,
            chunks = structure.len(),
            "document chunked"
        );
        DocumentSummary {
            document_name: file_name.to_string(),
            total_chunks: structure.len(),
            structure,
            extracted_at: Utc::now(),
        }
    }

    pub fn process_content(&self, text: &str) -> ProcessedContent {
        let document_structure = self.chunk_text(text);
        ProcessedContent {
            title_chunks: document_structure
                .iter()
                .map(|chunk| chunk.content.clone())
                .collect(),
            document_structure,
        }
    }
}

pub fn chunk_document(full_text: &str, file_name: &str) -> DocumentSummary {
    TitleChunker::default().chunk_document(full_text, file_name)
}

pub fn process_content(text: &str) -> ProcessedContent {
    TitleChunker::default().process_content(text)
}
