use crate::models::{AnalyzedChunk, ChunkAnalysis, TitleChunk};
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

/// Section text beyond this many characters is not sent to the model.
const MAX_PROMPT_CONTENT_CHARS: usize = 8000;

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Client for the text-analysis model that summarizes chunked sections.
pub struct LLMClient {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
}

impl LLMClient {
    pub fn new(api_url: &str, api_key: Option<&str>, model: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("failed to build HTTP client")?;

        Ok(LLMClient {
            client,
            api_url: api_url.to_string(),
            api_key: api_key.map(str::to_string),
            model: model.to_string(),
        })
    }

    pub async fn analyze_chunk(&self, chunk: &TitleChunk) -> Result<ChunkAnalysis> {
        let prompt = build_prompt(chunk);

        let mut request_builder = self
            .client
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .json(&json!({
                "model": self.model,
                "prompt": prompt,
                "stream": false,
                "options": {
                    "temperature": 0.1
                }
            }));

        if let Some(api_key) = &self.api_key {
            request_builder = request_builder.header("Authorization", format!("Bearer {api_key}"));
        }

        let response = request_builder
            .send()
            .await
            .with_context(|| format!("analysis request failed for {}", chunk.id))?
            .error_for_status()
            .with_context(|| format!("analysis endpoint rejected {}", chunk.id))?;

        let body = response.text().await?;
        debug!(chunk = %chunk.id, bytes = body.len(), "analysis received");
        Ok(parse_analysis(&body))
    }

    /// Analyzes every chunk in order; a failed chunk is reported without an
    /// analysis instead of failing the batch.
    pub async fn analyze_all(&self, chunks: &[TitleChunk]) -> Vec<AnalyzedChunk> {
        let mut analyzed = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let analysis = match self.analyze_chunk(chunk).await {
                Ok(analysis) => Some(analysis),
                Err(e) => {
                    warn!(chunk = %chunk.id, error = %e, "chunk analysis failed");
                    None
                }
            };
            analyzed.push(AnalyzedChunk {
                chunk_id: chunk.id.clone(),
                title: chunk.title.clone(),
                analysis,
            });
        }
        analyzed
    }
}

fn build_prompt(chunk: &TitleChunk) -> String {
    let content: String = chunk.content.chars().take(MAX_PROMPT_CONTENT_CHARS).collect();
    format!(
        "You are reading one section of a Brazilian public exam announcement (edital), written in Portuguese.\n\nSection title: {}\n\nContent: {}\n\nRespond with JSON only: {{\"summary\": string, \"keyPoints\": [string]}}. Write the summary and key points in Portuguese.",
        chunk.title, content
    )
}

/// Reads the model output leniently: Ollama envelopes are unwrapped, JSON
/// embedded in prose is extracted, anything else becomes a plain summary.
pub fn parse_analysis(body: &str) -> ChunkAnalysis {
    let text = serde_json::from_str::<GenerateResponse>(body)
        .map(|envelope| envelope.response)
        .unwrap_or_else(|_| body.to_string());

    embedded_json(&text)
        .and_then(|candidate| serde_json::from_str::<ChunkAnalysis>(candidate).ok())
        .unwrap_or_else(|| ChunkAnalysis {
            summary: text.trim().to_string(),
            key_points: Vec::new(),
        })
}

fn embedded_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}
