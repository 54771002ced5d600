// ============================================================
// Layer 4 — Corpus Materializer
// ============================================================
// Writes every caption to its own numbered text file so the
// tokenizer trainer can read the corpus from disk:
//
//   text_split/
//     0.txt   ← captions[0]
//     1.txt   ← captions[1]
//     ...
//
// Numbering starts at a caller-supplied `prefix` and the next
// free index is returned, so a second call with that index
// appends to the corpus instead of overwriting it.
//
// Each file holds the caption's raw UTF-8 bytes with nothing
// appended. The file handle lives inside `write_entry` and is
// closed on every exit path when it drops.
//
// Failure policy per row:
//   BestEffort → log the caption and the error, keep going
//   FailFast   → return the error
// A failed row still consumes its index under both policies.
// A missing output directory is always fatal: it is never
// created here.
//
// Reference: Rust Book §9 (Error Handling), §12 (I/O)

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use crate::domain::caption::Caption;
use crate::domain::traits::CorpusSink;

/// What to do when a single corpus entry cannot be written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WritePolicy {
    /// Log and skip the row
    #[default]
    BestEffort,
    /// Abort the batch on the first failing row
    FailFast,
}

/// Writes captions into a pre-existing corpus directory.
/// Implements the CorpusSink trait from Layer 3.
pub struct CorpusWriter {
    dir:    PathBuf,
    policy: WritePolicy,
}

impl CorpusWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir:    dir.into(),
            policy: WritePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: WritePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Path of the corpus entry with the given index
    pub fn entry_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("{index}.txt"))
    }

    fn write_entry(&self, index: usize, caption: &Caption) -> Result<()> {
        let text = caption
            .as_text()
            .ok_or_else(|| anyhow!("caption is not a string"))?;

        let path = self.entry_path(index);
        let mut file = fs::File::create(&path)
            .with_context(|| format!("Cannot create '{}'", path.display()))?;
        file.write_all(text.as_bytes())
            .with_context(|| format!("Cannot write '{}'", path.display()))?;

        tracing::trace!("Wrote corpus entry '{}'", path.display());
        Ok(())
    }
}

impl CorpusSink for CorpusWriter {
    fn write_all(&self, captions: &[Caption], prefix: usize) -> Result<usize> {
        let mut skipped = 0usize;

        for (offset, caption) in captions.iter().enumerate() {
            let index = prefix + offset;

            let Err(e) = self.write_entry(index, caption) else {
                continue;
            };

            if !self.dir.is_dir() {
                return Err(e.context(format!(
                    "Corpus directory '{}' does not exist",
                    self.dir.display()
                )));
            }

            match self.policy {
                WritePolicy::FailFast => {
                    return Err(e.context(format!("Failed to write corpus entry {index}")));
                }
                WritePolicy::BestEffort => {
                    tracing::warn!("Skipping corpus entry {index} ({caption}): {e:#}");
                    skipped += 1;
                }
            }
        }

        tracing::info!(
            "Corpus '{}': wrote {} of {} captions (indices {}..{})",
            self.dir.display(),
            captions.len() - skipped,
            captions.len(),
            prefix,
            prefix + captions.len(),
        );

        Ok(prefix + captions.len())
    }
}

/// List the corpus `.txt` files in `dir`, ordered by numeric index.
/// Files whose stem is not a number sort after the numbered ones.
pub fn list_corpus_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();

    for entry in fs::read_dir(dir)
        .with_context(|| format!("Cannot read corpus directory '{}'", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("txt") {
            files.push(path);
        }
    }

    files.sort_by_key(|p| {
        let stem = p.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        (stem.parse::<usize>().unwrap_or(usize::MAX), stem.to_string())
    });
    Ok(files)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn texts(items: &[&str]) -> Vec<Caption> {
        items.iter().map(|s| Caption::from(*s)).collect()
    }

    #[test]
    fn test_numbering_continues_from_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let writer = CorpusWriter::new(dir.path());

        let next = writer.write_all(&texts(&["a", "b", "c"]), 0).unwrap();
        assert_eq!(next, 3);

        let next = writer.write_all(&texts(&["d", "e"]), next).unwrap();
        assert_eq!(next, 5);

        for (i, expected) in ["a", "b", "c", "d", "e"].iter().enumerate() {
            let got = fs::read_to_string(dir.path().join(format!("{i}.txt"))).unwrap();
            assert_eq!(&got, expected);
        }
        assert!(!dir.path().join("5.txt").exists());
    }

    #[test]
    fn test_bytes_round_trip_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let captions = texts(&["ends with newline\n", "ünïcödé ✓", ""]);

        CorpusWriter::new(dir.path()).write_all(&captions, 0).unwrap();

        for (i, caption) in captions.iter().enumerate() {
            let bytes = fs::read(dir.path().join(format!("{i}.txt"))).unwrap();
            assert_eq!(bytes, caption.as_text().unwrap().as_bytes());
        }
    }

    #[test]
    fn test_best_effort_skips_non_string_rows() {
        let dir = tempfile::tempdir().unwrap();
        let captions = vec![
            Caption::from("before"),
            Caption::Other(json!(12)),
            Caption::from("after"),
        ];

        let next = CorpusWriter::new(dir.path()).write_all(&captions, 0).unwrap();

        assert_eq!(next, 3);
        assert!(dir.path().join("0.txt").exists());
        assert!(!dir.path().join("1.txt").exists());
        assert_eq!(fs::read_to_string(dir.path().join("2.txt")).unwrap(), "after");
    }

    #[test]
    fn test_fail_fast_stops_on_bad_row() {
        let dir = tempfile::tempdir().unwrap();
        let captions = vec![
            Caption::from("before"),
            Caption::Other(json!(null)),
            Caption::from("after"),
        ];

        let writer = CorpusWriter::new(dir.path()).with_policy(WritePolicy::FailFast);
        assert!(writer.write_all(&captions, 0).is_err());
        assert!(dir.path().join("0.txt").exists());
        assert!(!dir.path().join("2.txt").exists());
    }

    #[test]
    fn test_best_effort_skips_unwritable_entry() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("1.txt")).unwrap();

        let next = CorpusWriter::new(dir.path())
            .write_all(&texts(&["first", "second", "third"]), 0)
            .unwrap();

        assert_eq!(next, 3);
        assert_eq!(fs::read_to_string(dir.path().join("0.txt")).unwrap(), "first");
        assert!(dir.path().join("1.txt").is_dir());
        assert_eq!(fs::read_to_string(dir.path().join("2.txt")).unwrap(), "third");
    }

    #[test]
    fn test_fail_fast_stops_on_unwritable_entry() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("1.txt")).unwrap();

        let writer = CorpusWriter::new(dir.path()).with_policy(WritePolicy::FailFast);
        let err = writer.write_all(&texts(&["first", "second", "third"]), 0).unwrap_err();

        assert!(format!("{err:#}").contains("corpus entry 1"));
        assert_eq!(fs::read_to_string(dir.path().join("0.txt")).unwrap(), "first");
        assert!(!dir.path().join("2.txt").exists());
    }

    #[test]
    fn test_missing_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let writer = CorpusWriter::new(dir.path().join("missing"));
        assert!(writer.write_all(&texts(&["a"]), 0).is_err());
        assert!(!dir.path().join("missing").exists());
    }

    #[test]
    fn test_overwrites_existing_entry() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("0.txt"), "old content").unwrap();

        CorpusWriter::new(dir.path()).write_all(&texts(&["new"]), 0).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("0.txt")).unwrap(), "new");
    }

    #[test]
    fn test_list_corpus_files_numeric_order() {
        let dir = tempfile::tempdir().unwrap();
        let captions = texts(&["a"; 12]);
        CorpusWriter::new(dir.path()).write_all(&captions, 0).unwrap();
        fs::write(dir.path().join("notes.md"), "ignored").unwrap();

        let files = list_corpus_files(dir.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 12);
        assert_eq!(names[2], "2.txt");
        assert_eq!(names[10], "10.txt");
    }
}
