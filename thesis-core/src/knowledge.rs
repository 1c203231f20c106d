//! Resume knowledge source
//!
//! Loads a document once at startup and splits it into overlapping
//! character windows that the resume agent can look up by keyword.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::{debug, info};

use crate::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};

/// Errors from loading a knowledge source
#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("Knowledge file not found: {0}")]
    NotFound(PathBuf),

    #[error("Unsupported knowledge format: {0}")]
    UnsupportedFormat(String),

    #[error("Text extraction failed: {0}")]
    Extraction(String),

    #[error("Invalid chunking: size {size}, overlap {overlap}")]
    InvalidChunking { size: usize, overlap: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Chunk window configuration (in characters)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    pub size: usize,
    pub overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl ChunkConfig {
    fn validate(&self) -> Result<(), KnowledgeError> {
        if self.size == 0 || self.overlap >= self.size {
            return Err(KnowledgeError::InvalidChunking {
                size: self.size,
                overlap: self.overlap,
            });
        }
        Ok(())
    }
}

/// A window of the source document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub index: usize,
    pub text: String,
    /// Character offsets `[start, end)` into the source text
    pub offset: (usize, usize),
}

impl Chunk {
    fn new(source: &str, index: usize, text: String, offset: (usize, usize)) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        hasher.update(offset.0.to_le_bytes());
        hasher.update(text.as_bytes());
        let digest = hasher.finalize();
        let id = digest[..8].iter().map(|b| format!("{:02x}", b)).collect();

        Self {
            id,
            index,
            text,
            offset,
        }
    }
}

/// A chunked, read-only document
#[derive(Debug, Clone)]
pub struct KnowledgeSource {
    source: String,
    chunks: Vec<Chunk>,
}

impl KnowledgeSource {
    /// Load and chunk a document from disk.
    ///
    /// `.txt` and `.md` are read directly; `.pdf` goes through `pdftotext`.
    pub fn from_path<P: AsRef<Path>>(path: P, config: ChunkConfig) -> Result<Self, KnowledgeError> {
        let path = path.as_ref();
        config.validate()?;

        if !path.is_file() {
            return Err(KnowledgeError::NotFound(path.to_path_buf()));
        }

        let text = read_document(path)?;
        let source = path.display().to_string();
        let knowledge = Self::from_text(&source, &text, config)?;

        info!(
            "Loaded knowledge source {} ({} chars, {} chunks)",
            source,
            text.chars().count(),
            knowledge.chunks.len()
        );

        Ok(knowledge)
    }

    /// Chunk text that is already in memory
    pub fn from_text(source: &str, text: &str, config: ChunkConfig) -> Result<Self, KnowledgeError> {
        config.validate()?;

        Ok(Self {
            source: source.to_string(),
            chunks: chunk_text(source, text, config),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Return the `limit` chunks sharing the most terms with `query`, in
    /// document order. Falls back to the leading chunks when nothing scores.
    pub fn query(&self, query: &str, limit: usize) -> Vec<&Chunk> {
        let terms = tokenize(query);

        let mut scored: Vec<(usize, &Chunk)> = self
            .chunks
            .iter()
            .map(|chunk| {
                let chunk_terms = tokenize(&chunk.text);
                (terms.intersection(&chunk_terms).count(), chunk)
            })
            .filter(|(score, _)| *score > 0)
            .collect();

        if scored.is_empty() {
            debug!("No chunk matched query terms, using leading chunks");
            return self.chunks.iter().take(limit).collect();
        }

        // Stable sort keeps document order among equal scores
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        let mut best: Vec<&Chunk> = scored.into_iter().take(limit).map(|(_, c)| c).collect();
        best.sort_by_key(|c| c.index);
        best
    }
}

fn read_document(path: &Path) -> Result<String, KnowledgeError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "txt" | "md" => Ok(std::fs::read_to_string(path)?),
        "pdf" => pdf_to_text(path),
        other => Err(KnowledgeError::UnsupportedFormat(other.to_string())),
    }
}

/// Extract PDF text with poppler's `pdftotext`, writing to stdout
fn pdf_to_text(path: &Path) -> Result<String, KnowledgeError> {
    let output = Command::new("pdftotext")
        .arg("-layout")
        .arg("-enc")
        .arg("UTF-8")
        .arg(path)
        .arg("-")
        .output()
        .map_err(|e| KnowledgeError::Extraction(format!("failed to run pdftotext: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(KnowledgeError::Extraction(format!(
            "pdftotext exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Split text into `size`-character windows advancing by `size - overlap`
fn chunk_text(source: &str, text: &str, config: ChunkConfig) -> Vec<Chunk> {
    let chars: Vec<char> = text.chars().collect();
    let step = config.size - config.overlap;

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + config.size).min(chars.len());
        let window: String = chars[start..end].iter().collect();
        chunks.push(Chunk::new(source, chunks.len(), window, (start, end)));

        if end == chars.len() {
            break;
        }
        start += step;
    }

    chunks
}

fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 3)
        .map(|t| t.to_lowercase())
        .collect()
}
