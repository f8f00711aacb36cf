use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One section of a chunked document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleChunk {
    pub id: String,
    pub title: String,
    pub level: u32,
    pub content: String,
    /// Character offset into the normalized text.
    pub start_position: usize,
    pub end_position: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub document_name: String,
    pub total_chunks: usize,
    pub structure: Vec<TitleChunk>,
    pub extracted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedContent {
    pub title_chunks: Vec<String>,
    pub document_structure: Vec<TitleChunk>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkAnalysis {
    pub summary: String,
    #[serde(default)]
    pub key_points: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedChunk {
    pub chunk_id: String,
    pub title: String,
    pub analysis: Option<ChunkAnalysis>,
}
