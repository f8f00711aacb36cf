//! Title-based chunking of exam announcement (edital) text into
//! hierarchically linked sections, served over HTTP.

pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

pub use services::chunker::{chunk_document, process_content};
