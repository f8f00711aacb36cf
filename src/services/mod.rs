pub mod chunker;
pub mod fallback;
pub mod llm;
pub mod patterns;
pub mod render;
