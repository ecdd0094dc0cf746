//! TSV corpus reader.
//!
//! The corpus is one row per document chunk with a fixed four-column header.
//! Header validation is strict: a renamed or missing column fails the whole
//! ingestion run before anything is embedded.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context};

pub const REQUIRED_COLUMNS: [&str; 4] = [
    "Moon Name",
    "Document Title",
    "Document Content",
    "Source URL",
];

/// One corpus row: a single document chunk about one moon.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentChunk {
    pub moon_name: String,
    pub title: String,
    pub content: String,
    pub source_url: String,
}

impl DocumentChunk {
    /// The text that gets embedded: every field folded into one block so the
    /// vector captures the moon name and source alongside the content.
    pub fn combined_text(&self) -> String {
        format!(
            "Moon: {}\nTitle: {}\nContent: {}\nSource: {}",
            self.moon_name, self.title, self.content, self.source_url
        )
    }
}

/// Reads and parses the corpus file at `path`.
pub fn read_corpus(path: &Path) -> anyhow::Result<Vec<DocumentChunk>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read corpus file {}", path.display()))?;
    parse_corpus(&raw)
}

pub fn parse_corpus(raw: &str) -> anyhow::Result<Vec<DocumentChunk>> {
    let mut lines = raw.lines();
    let header = lines.next().context("corpus file is empty")?;
    let columns: Vec<&str> = header.split('\t').collect();
    if columns != REQUIRED_COLUMNS {
        bail!(
            "corpus header mismatch: expected {:?}, found {:?}",
            REQUIRED_COLUMNS,
            columns
        );
    }

    let mut chunks = Vec::new();
    for (offset, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != REQUIRED_COLUMNS.len() {
            // offset is zero-based and the header was line 1.
            bail!(
                "corpus line {}: expected {} tab-separated fields, found {}",
                offset + 2,
                REQUIRED_COLUMNS.len(),
                fields.len()
            );
        }
        chunks.push(DocumentChunk {
            moon_name: fields[0].trim().to_string(),
            title: fields[1].trim().to_string(),
            content: fields[2].trim().to_string(),
            source_url: fields[3].trim().to_string(),
        });
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "Moon Name\tDocument Title\tDocument Content\tSource URL";

    #[test]
    fn parses_rows_and_skips_blank_lines() {
        let raw = format!(
            "{HEADER}\nIo\tVolcanism\tIo has active volcanoes.\thttp://example.com/io\n\n\
             Europa\tOcean\tA subsurface ocean.\thttp://example.com/europa\n"
        );

        let chunks = parse_corpus(&raw).unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].moon_name, "Io");
        assert_eq!(chunks[1].source_url, "http://example.com/europa");
    }

    #[test]
    fn rejects_a_renamed_column() {
        let raw = "Moon\tDocument Title\tDocument Content\tSource URL\nIo\ta\tb\tc\n";

        let err = parse_corpus(raw).unwrap_err();

        assert!(err.to_string().contains("header mismatch"));
    }

    #[test]
    fn rejects_a_row_with_missing_fields_naming_the_line() {
        let raw = format!("{HEADER}\nIo\tVolcanism\tmissing the url\n");

        let err = parse_corpus(&raw).unwrap_err();

        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn empty_file_is_an_error() {
        assert!(parse_corpus("").is_err());
    }

    #[test]
    fn combined_text_folds_every_field() {
        let chunk = DocumentChunk {
            moon_name: "Io".to_string(),
            title: "Volcanism".to_string(),
            content: "Io has active volcanoes.".to_string(),
            source_url: "http://example.com/io".to_string(),
        };

        assert_eq!(
            chunk.combined_text(),
            "Moon: Io\nTitle: Volcanism\nContent: Io has active volcanoes.\nSource: http://example.com/io"
        );
    }

    #[test]
    fn reads_a_corpus_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        writeln!(file, "Ganymede\tSize\tThe largest moon.\thttp://example.com/ganymede").unwrap();

        let chunks = read_corpus(file.path()).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].moon_name, "Ganymede");
    }
}
