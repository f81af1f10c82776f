//! `matric ingest` — Embed and upload study material to the vector index.
//!
//! Walks a directory for `.txt` files, splits each into paragraph-packed
//! chunks, embeds the chunks as retrieval documents, and upserts them with
//! the tag metadata the chat pipeline filters on.

use std::path::{Path, PathBuf};

use matric_config::AppConfig;
use matric_core::index::{PassageMetadata, PassageRecord, VectorIndex};
use matric_core::model::{EmbeddingRequest, GenerativeModel};
use matric_core::tags::ContextTags;
use regex::Regex;
use walkdir::WalkDir;

/// Files whose trimmed content is at or under this many characters are noise
/// (placeholder files, titles) and are skipped.
const MIN_FILE_CHARS: usize = 50;

/// Gemini batchEmbedContents accepts at most 100 requests per call.
const EMBED_BATCH: usize = 100;

pub async fn run(
    dir: &Path,
    curriculum: &str,
    grade: &str,
    subject: &str,
    chunk_chars: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    if chunk_chars == 0 {
        return Err("--chunk-chars must be at least 1".into());
    }

    let tags = ContextTags {
        curriculum: curriculum
            .parse()
            .map_err(|e: String| format!("--curriculum: {e}"))?,
        grade: grade.parse().map_err(|e: String| format!("--grade: {e}"))?,
        subject: subject.parse().map_err(|e: String| format!("--subject: {e}"))?,
    };

    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    config.require_credentials()?;

    let model = matric_clients::gemini_from_config(&config)?;
    let index = matric_clients::pinecone_from_config(&config).await?;

    let files = discover_txt_files(dir);
    println!("🚀 matric ingest — {}", tags);
    println!("📝 Found {} .txt file(s) under {}", files.len(), dir.display());

    let sanitize = Regex::new(r"[^a-zA-Z0-9]").expect("sanitize pattern should compile");
    let prefix = id_prefix(&tags);

    let mut total_chunks = 0usize;
    let mut total_files = 0usize;
    let mut skipped = 0usize;

    for path in &files {
        let content = std::fs::read_to_string(path)?;
        let trimmed = content.trim();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if trimmed.chars().count() <= MIN_FILE_CHARS {
            println!("  ⚠️  Skipping {filename}: under {MIN_FILE_CHARS} characters");
            skipped += 1;
            continue;
        }

        println!("  📖 {filename}");
        let chunks = chunk_text(trimmed, chunk_chars);

        let mut vectors = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(EMBED_BATCH) {
            let request = EmbeddingRequest::documents(&config.gemini.embed_model, batch.to_vec());
            let response = model.embed(request).await?;
            vectors.extend(response.vectors);
        }

        let sanitized = sanitize.replace_all(&filename, "_");
        let mut records = Vec::with_capacity(chunks.len());
        for (i, (chunk, values)) in chunks.iter().zip(vectors).enumerate() {
            records.push(PassageRecord {
                id: format!("{prefix}_{sanitized}_{i}"),
                values,
                metadata: PassageMetadata::study_material(chunk.clone(), &tags, &filename),
            });
        }

        let accepted = index.upsert(records).await?;
        println!("     ✅ {accepted} chunk(s) uploaded");
        total_chunks += accepted;
        total_files += 1;
    }

    println!();
    println!("🎉 Ingest complete: {total_chunks} chunks from {total_files} file(s), {skipped} skipped");

    Ok(())
}

fn discover_txt_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| {
            entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "txt")
        })
        .map(|entry| entry.into_path())
        .collect()
}

/// Record id prefix. Tag values are stripped to ASCII alphanumerics, so
/// "life-science" appears as "lifescience".
fn id_prefix(tags: &ContextTags) -> String {
    let subject: String = tags
        .subject
        .as_str()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    format!("{}_{}_{}", tags.curriculum, tags.grade, subject)
}

/// Pack trimmed paragraphs into chunks of at most `max_chars` characters,
/// preserving paragraph breaks within a chunk.
fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        for piece in split_oversized(paragraph, max_chars) {
            let needed = piece.chars().count();
            let have = current.chars().count();
            let sep = if current.is_empty() { 0 } else { 2 };
            if !current.is_empty() && have + sep + needed > max_chars {
                chunks.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(&piece);
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Split a paragraph longer than `max_chars` on word boundaries. A single
/// word longer than the cap stays whole.
fn split_oversized(paragraph: &str, max_chars: usize) -> Vec<String> {
    if paragraph.chars().count() <= max_chars {
        return vec![paragraph.to_string()];
    }

    let mut pieces = Vec::new();
    let mut piece = String::new();
    for word in paragraph.split_whitespace() {
        let sep = if piece.is_empty() { 0 } else { 1 };
        if !piece.is_empty() && piece.chars().count() + sep + word.chars().count() > max_chars {
            pieces.push(std::mem::take(&mut piece));
        }
        if !piece.is_empty() {
            piece.push(' ');
        }
        piece.push_str(word);
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use matric_core::tags::{Curriculum, Grade, Subject};

    #[test]
    fn short_text_stays_one_chunk() {
        let chunks = chunk_text("Osmosis is the movement of water.", 100);
        assert_eq!(chunks, vec!["Osmosis is the movement of water.".to_string()]);
    }

    #[test]
    fn paragraphs_pack_under_the_limit() {
        let text = "First paragraph here.\n\nSecond paragraph here.\n\nThird paragraph here.";
        let chunks = chunk_text(text, 48);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "First paragraph here.\n\nSecond paragraph here.");
        assert_eq!(chunks[1], "Third paragraph here.");
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 48);
        }
    }

    #[test]
    fn oversized_paragraph_splits_on_word_boundaries() {
        let paragraph = "word ".repeat(50);
        let chunks = chunk_text(paragraph.trim(), 32);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 32, "chunk too long: {chunk:?}");
        }
        let rejoined: Vec<&str> = chunks
            .iter()
            .flat_map(|c| c.split_whitespace())
            .collect();
        assert_eq!(rejoined.len(), 50);
        assert!(rejoined.iter().all(|w| *w == "word"));
    }

    #[test]
    fn blank_paragraphs_are_dropped() {
        let chunks = chunk_text("One.\n\n\n\n   \n\nTwo.", 100);
        assert_eq!(chunks, vec!["One.\n\nTwo.".to_string()]);
    }

    #[test]
    fn id_prefix_strips_subject_punctuation() {
        let tags = ContextTags {
            curriculum: Curriculum::Caps,
            grade: Grade::Grade12,
            subject: Subject::LifeScience,
        };
        assert_eq!(id_prefix(&tags), "caps_grade12_lifescience");
    }

    #[test]
    fn sanitized_filename_in_record_id() {
        let sanitize = Regex::new(r"[^a-zA-Z0-9]").unwrap();
        let sanitized = sanitize.replace_all("photo synthesis-notes.txt", "_");
        assert_eq!(sanitized, "photo_synthesis_notes_txt");
    }

    #[test]
    fn discover_finds_nested_txt_files_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("cells.txt"), "cells").unwrap();
        std::fs::write(dir.path().join("nested/dna.txt"), "dna").unwrap();
        std::fs::write(dir.path().join("notes.md"), "markdown").unwrap();

        let files = discover_txt_files(dir.path());
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|p| p.extension().unwrap() == "txt"));
    }
}
