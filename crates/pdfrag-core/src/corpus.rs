//! Corpus building and the JSON corpus file.

use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::chunker::{chunk_text_by_tokens, ChunkingConfig};
use crate::clean::clean_text;
use crate::error::{Error, Result};
use crate::extract::pdf_to_text;
use crate::types::ChunkRecord;

/// Extract, clean and chunk one PDF, stamping each chunk with the file's base name.
pub fn process_pdf(pdf_path: &Path, config: &ChunkingConfig) -> Result<Vec<ChunkRecord>> {
    let raw_text = pdf_to_text(pdf_path)?;
    let cleaned = clean_text(&raw_text);
    let source = source_name(pdf_path);
    let chunks = chunk_text_by_tokens(&cleaned, config)?
        .into_iter()
        .enumerate()
        .map(|(chunk_id, text)| ChunkRecord { text, source: source.clone(), chunk_id })
        .collect();
    Ok(chunks)
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// A PDF that could not be read. The build continues past it.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: Error,
}

#[derive(Debug, Default)]
pub struct BuildReport {
    pub chunks: Vec<ChunkRecord>,
    pub files_processed: usize,
    pub failures: Vec<FileFailure>,
    /// Sources that parsed but had no text layer and produced no chunks.
    pub empty_documents: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CorpusBuilder {
    chunking: ChunkingConfig,
}

impl CorpusBuilder {
    pub fn new(chunking: ChunkingConfig) -> Result<Self> {
        chunking.validate()?;
        Ok(Self { chunking })
    }

    /// Process every `.pdf` directly inside `pdf_dir`, in file name order.
    pub fn build(&self, pdf_dir: &Path) -> Result<BuildReport> {
        if !pdf_dir.is_dir() {
            return Err(Error::NotFound(format!("input directory {}", pdf_dir.display())));
        }
        let files = list_pdf_files(pdf_dir);
        if files.is_empty() {
            tracing::warn!("No .pdf files found under {}", pdf_dir.display());
        }
        let mut report = BuildReport::default();
        for pdf_path in files {
            tracing::info!("Processing PDF: {}", pdf_path.display());
            match process_pdf(&pdf_path, &self.chunking) {
                Ok(chunks) if chunks.is_empty() => {
                    let source = source_name(&pdf_path);
                    tracing::warn!("{} has no extractable text; no chunks produced", source);
                    report.empty_documents.push(source);
                    report.files_processed += 1;
                }
                Ok(chunks) => {
                    tracing::debug!(chunks = chunks.len(), "chunked {}", pdf_path.display());
                    report.chunks.extend(chunks);
                    report.files_processed += 1;
                }
                Err(error) => {
                    tracing::warn!("Skipping {}: {}", pdf_path.display(), error);
                    report.failures.push(FileFailure { path: pdf_path, error });
                }
            }
        }
        tracing::info!(
            "Processed {} files into {} chunks ({} failed)",
            report.files_processed,
            report.chunks.len(),
            report.failures.len()
        );
        Ok(report)
    }
}

/// Files with a case-insensitive `.pdf` extension directly inside `root`, sorted.
pub fn list_pdf_files(root: &Path) -> Vec<PathBuf> {
    let mut pdf_files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|p| p.extension().and_then(|s| s.to_str()).is_some_and(|ext| ext.eq_ignore_ascii_case("pdf")))
        .collect();
    pdf_files.sort();
    pdf_files
}

/// Write the corpus as one pretty-printed JSON array, creating parent directories.
pub fn save_corpus(path: &Path, chunks: &[ChunkRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(fs::File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, chunks)?;
    writer.flush()?;
    Ok(())
}

pub fn load_corpus(path: &Path) -> Result<Vec<ChunkRecord>> {
    let file = fs::File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::NotFound(format!("corpus file {}", path.display())),
        _ => Error::Io(e),
    })?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}
