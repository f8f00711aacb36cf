use crate::error::ApiError;
use crate::models::{AnalyzedChunk, DocumentSummary, ProcessedContent};
use crate::services::chunker::TitleChunker;
use crate::services::llm::LLMClient;
use crate::services::render::render_outline;
use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartError},
    http::StatusCode,
    response::{Html, Json},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

const DEFAULT_FILE_NAME: &str = "documento.txt";
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

#[derive(Clone)]
pub struct AppState {
    pub chunker: TitleChunker,
    pub llm_client: Arc<LLMClient>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChunkRequest {
    text: String,
    #[serde(default = "default_file_name")]
    file_name: String,
}

#[derive(Debug, Deserialize)]
struct ProcessRequest {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    success: bool,
    request_id: Uuid,
    summary: DocumentSummary,
    analyses: Option<Vec<AnalyzedChunk>>,
}

fn default_file_name() -> String {
    DEFAULT_FILE_NAME.to_string()
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/upload", post(upload_file))
        .route("/chunk", post(chunk))
        .route("/process", post(process))
        .route("/outline", post(outline))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::AllowMethods::any())
                .allow_headers(tower_http::cors::AllowHeaders::any()),
        )
}

async fn index() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Edital Chunker</title>
    <meta charset="utf-8">
    <style>
        body { font-family: Arial, sans-serif; margin: 40px; }
        .endpoint { background-color: #f5f5f5; padding: 10px; margin: 10px 0; border-radius: 4px; font-family: monospace; }
    </style>
</head>
<body>
    <h1>Edital Chunker</h1>
    <p>Splits the extracted text of an exam announcement into hierarchical sections.</p>
    <h2>Available Endpoints:</h2>
    <div class="endpoint">GET /health - Health check</div>
    <div class="endpoint">POST /upload - multipart form with a 'text_file' field and optional 'analyze'</div>
    <div class="endpoint">POST /chunk - JSON {"text", "fileName"}, returns the document summary</div>
    <div class="endpoint">POST /process - JSON {"text"}, returns chunk contents and structure</div>
    <div class="endpoint">POST /outline - JSON {"text", "fileName"}, returns a plain-text outline</div>
</body>
</html>
"#,
    )
}

async fn health_check() -> &'static str {
    "OK"
}

fn multipart_error(error: MultipartError) -> ApiError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        ApiError::BadRequest(error.body_text())
    }
}

/// Decodes an uploaded text file, skipping a UTF-8 byte order mark.
fn decode_text(bytes: &[u8]) -> Result<String, ApiError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    String::from_utf8(bytes.to_vec())
        .map_err(|_| ApiError::BadRequest("text_file is not valid UTF-8".to_string()))
}

fn require_text(text: &str) -> Result<(), ApiError> {
    if text.trim().is_empty() {
        return Err(ApiError::BadRequest("text cannot be empty".to_string()));
    }
    Ok(())
}

async fn summarize(
    chunker: &TitleChunker,
    text: String,
    file_name: String,
) -> Result<DocumentSummary, ApiError> {
    let chunker = chunker.clone();
    tokio::task::spawn_blocking(move || chunker.chunk_document(&text, &file_name))
        .await
        .map_err(|e| ApiError::Internal(format!("chunking task failed: {e}")))
}

async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    let mut upload: Option<(String, String)> = None;
    let mut analyze = false;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "text_file" => {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .unwrap_or_else(default_file_name);
                let data = field.bytes().await.map_err(multipart_error)?;
                upload = Some((file_name, decode_text(&data)?));
            }
            "analyze" => {
                let value = field.text().await.map_err(multipart_error)?;
                analyze = matches!(value.trim(), "true" | "1" | "yes");
            }
            _ => {}
        }
    }

    let (file_name, text) =
        upload.ok_or_else(|| ApiError::BadRequest("missing text_file field".to_string()))?;
    require_text(&text)?;
    info!(%request_id, document = %file_name, chars = text.len(), "upload received");

    let summary = summarize(&state.chunker, text, file_name).await?;
    let analyses = if analyze {
        Some(state.llm_client.analyze_all(&summary.structure).await)
    } else {
        None
    };

    info!(%request_id, chunks = summary.total_chunks, "upload chunked");
    Ok(Json(UploadResponse {
        success: true,
        request_id,
        summary,
        analyses,
    }))
}

async fn chunk(
    State(state): State<AppState>,
    Json(req): Json<ChunkRequest>,
) -> Result<Json<DocumentSummary>, ApiError> {
    require_text(&req.text)?;
    let summary = summarize(&state.chunker, req.text, req.file_name).await?;
    Ok(Json(summary))
}

async fn process(
    State(state): State<AppState>,
    Json(req): Json<ProcessRequest>,
) -> Result<Json<ProcessedContent>, ApiError> {
    require_text(&req.text)?;
    let chunker = state.chunker.clone();
    let processed = tokio::task::spawn_blocking(move || chunker.process_content(&req.text))
        .await
        .map_err(|e| ApiError::Internal(format!("chunking task failed: {e}")))?;
    Ok(Json(processed))
}

async fn outline(
    State(state): State<AppState>,
    Json(req): Json<ChunkRequest>,
) -> Result<String, ApiError> {
    require_text(&req.text)?;
    let summary = summarize(&state.chunker, req.text, req.file_name).await?;
    Ok(render_outline(&summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use http::{Request, header};
    use serde_json::Value;
    use tower::ServiceExt;

    const EDITAL: &str = "CAPÍTULO I - DAS INSCRIÇÕES\n\
As inscrições serão realizadas pela internet.\n\
\n\
2. DAS PROVAS\n\
As provas serão aplicadas em domingo.\n\
\n\
2.1 Prova Objetiva\n\
Cinquenta questões de múltipla escolha.\n";

    fn app() -> Router {
        let llm_client =
            LLMClient::new("http://127.0.0.1:9/api/generate", None, "llama2").expect("client");
        let state = AppState {
            chunker: TitleChunker::default(),
            llm_client: Arc::new(llm_client),
        };
        router(state, 1024 * 1024)
    }

    fn json_request(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn read_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        assert_eq!(&bytes[..], b"OK");
    }

    #[tokio::test]
    async fn chunk_returns_summary_with_hierarchy() {
        let response = app()
            .oneshot(json_request(
                "/chunk",
                serde_json::json!({ "text": EDITAL, "fileName": "edital.pdf" }),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = read_json(response).await;
        assert_eq!(body["documentName"], "edital.pdf");
        assert_eq!(body["totalChunks"], 3);
        assert_eq!(body["structure"][0]["title"], "Das Inscrições");
        assert_eq!(body["structure"][0]["level"], 1);
        assert!(body["structure"][0].get("parentId").is_none());
        assert_eq!(body["structure"][2]["title"], "Prova Objetiva");
        assert_eq!(body["structure"][2]["parentId"], "chunk-1");
        assert!(body["extractedAt"].is_string());
    }

    #[tokio::test]
    async fn blank_text_is_rejected() {
        let response = app()
            .oneshot(json_request("/chunk", serde_json::json!({ "text": "  \n " })))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert!(body["error"].as_str().unwrap_or_default().contains("empty"));
    }

    #[tokio::test]
    async fn process_returns_contents_and_structure() {
        let response = app()
            .oneshot(json_request("/process", serde_json::json!({ "text": EDITAL })))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = read_json(response).await;
        assert_eq!(body["titleChunks"].as_array().map(Vec::len), Some(3));
        assert_eq!(body["documentStructure"].as_array().map(Vec::len), Some(3));
        assert_eq!(body["titleChunks"][1], body["documentStructure"][1]["content"]);
    }

    #[tokio::test]
    async fn outline_is_plain_text() {
        let response = app()
            .oneshot(json_request("/outline", serde_json::json!({ "text": EDITAL })))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let text = String::from_utf8(bytes.to_vec()).expect("utf8");
        assert!(text.starts_with("documento.txt (3 seções)"));
        assert!(text.contains("- [1] Das Inscrições"));
        assert!(text.contains("    - [3] Prova Objetiva"));
    }

    fn multipart_request(parts: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
        let boundary = "edital-boundary";
        let mut body = Vec::new();
        for (name, file_name, data) in parts {
            body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            let disposition = match file_name {
                Some(file_name) => format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: text/plain\r\n\r\n"
                ),
                None => format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"),
            };
            body.extend_from_slice(disposition.as_bytes());
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .expect("request")
    }

    #[tokio::test]
    async fn upload_strips_bom_and_uses_file_name() {
        let mut data = UTF8_BOM.to_vec();
        data.extend_from_slice(EDITAL.as_bytes());

        let response = app()
            .oneshot(multipart_request(&[("text_file", Some("edital.txt"), data.as_slice())]))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = read_json(response).await;
        assert_eq!(body["success"], true);
        assert!(body["requestId"].is_string());
        assert!(body["analyses"].is_null());
        assert_eq!(body["summary"]["documentName"], "edital.txt");
        assert_eq!(body["summary"]["totalChunks"], 3);
        let first = body["summary"]["structure"][0]["content"]
            .as_str()
            .unwrap_or_default();
        assert!(first.starts_with("CAPÍTULO I"));
    }

    #[tokio::test]
    async fn upload_without_text_file_is_rejected() {
        let response = app()
            .oneshot(multipart_request(&[("analyze", None, b"false".as_slice())]))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn upload_rejects_invalid_utf8() {
        let response = app()
            .oneshot(multipart_request(&[(
                "text_file",
                Some("edital.txt"),
                [0xffu8, 0xfe, 0x00, 0x41].as_slice(),
            )]))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn decode_text_handles_bom() {
        let mut data = UTF8_BOM.to_vec();
        data.extend_from_slice("DAS VAGAS".as_bytes());
        assert_eq!(decode_text(&data).expect("text"), "DAS VAGAS");
        assert_eq!(decode_text(b"sem bom").expect("text"), "sem bom");
    }
}
