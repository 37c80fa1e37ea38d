//! Zipf and Heaps statistics of a raw text collection.

use std::path::{Path, PathBuf};

use tracing::{error, info};
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::{
    data::corpus_files,
    error::{Error, Result},
    utils::fs::ensure_dir,
    vectorizer::token::TokenFrequency,
};

pub const FREQUENCIES_FILE: &str = "Frequencies.csv";
pub const HEAPS_FILE: &str = "Heaps.csv";

/// Lowercase, decompose, drop combining marks and split on whitespace
pub fn normalize(text: &str) -> Vec<String> {
    let folded: String = text
        .to_lowercase()
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect();
    folded.split_whitespace().map(str::to_string).collect()
}

#[derive(Debug, Clone, Default)]
pub struct TextStatistics {
    /// term counts over the whole collection
    pub frequencies: TokenFrequency,
    /// distinct terms seen after each document
    pub heaps: Vec<usize>,
}

impl TextStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_document(&mut self, text: &str) {
        self.frequencies.add_tokens(&normalize(text));
        self.heaps.push(self.frequencies.token_num());
    }

    /// Every readable file under `dir`, in file-name order
    pub fn from_dir(dir: &Path) -> Self {
        let mut stats = Self::new();
        for path in corpus_files(dir) {
            match std::fs::read_to_string(&path) {
                Ok(text) => stats.add_document(&text),
                Err(e) => error!(path = %path.display(), error = %e, "failed to read document"),
            }
        }
        stats
    }

    /// Terms by descending frequency (rank order)
    pub fn zipf(&self) -> Vec<(String, u64)> {
        self.frequencies.sorted_frequency_vector()
    }

    /// Write `Frequencies.csv` and `Heaps.csv` into `dir`
    pub fn write(&self, dir: &Path) -> Result<()> {
        ensure_dir(dir)?;

        let path = dir.join(FREQUENCIES_FILE);
        let mut wtr = csv::Writer::from_path(&path)?;
        wtr.write_record(["Term", "Frequency"])?;
        for (term, count) in self.zipf() {
            wtr.write_record([term, count.to_string()])?;
        }
        wtr.flush().map_err(|e| Error::io(&path, e))?;
        info!(path = %path.display(), terms = self.frequencies.token_num(), "frequencies saved");

        let path = dir.join(HEAPS_FILE);
        let mut wtr = csv::Writer::from_path(&path)?;
        wtr.write_record(["Documents", "Terms"])?;
        for (i, terms) in self.heaps.iter().enumerate() {
            wtr.write_record([(i + 1).to_string(), terms.to_string()])?;
        }
        wtr.flush().map_err(|e| Error::io(&path, e))?;
        info!(path = %path.display(), documents = self.heaps.len(), "heaps series saved");
        Ok(())
    }
}

/// Compute statistics for `dir` and write them to `{output}/{dir name}/`.
/// Returns the directory written, or `None` when `dir` does not exist.
pub fn run(dir: &Path, output: &Path) -> Result<Option<PathBuf>> {
    if !dir.exists() {
        error!(path = %dir.display(), "directory does not exist");
        return Ok(None);
    }
    info!(path = %dir.display(), "computing text statistics");
    let name = dir
        .file_name()
        .map_or_else(|| "corpus".to_string(), |n| n.to_string_lossy().into_owned());
    let target = output.join(name);
    TextStatistics::from_dir(dir).write(&target)?;
    Ok(Some(target))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_case_and_accents() {
        assert_eq!(normalize("Élan  VITAL\nnaïve"), vec!["elan", "vital", "naive"]);
    }

    #[test]
    fn heaps_counts_distinct_terms_per_document() {
        let mut stats = TextStatistics::new();
        stats.add_document("a b a");
        stats.add_document("b c");
        stats.add_document("a");
        assert_eq!(stats.heaps, vec![2, 3, 3]);
        assert_eq!(stats.zipf()[0], ("a".to_string(), 3));
    }

    #[test]
    fn writes_both_tables() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = dir.path().join("papers");
        std::fs::create_dir_all(corpus.join("cs")).unwrap();
        std::fs::write(corpus.join("cs").join("1.txt"), "Graph graph, tree").unwrap();
        std::fs::write(corpus.join("cs").join("2.txt"), "tree graph").unwrap();

        let out = run(&corpus, &dir.path().join("Text Statistics")).unwrap().unwrap();
        assert!(out.ends_with("papers"));
        let freq = std::fs::read_to_string(out.join(FREQUENCIES_FILE)).unwrap();
        assert_eq!(freq, "Term,Frequency\ngraph,2\ntree,2\n\"graph,\",1\n");
        let heaps = std::fs::read_to_string(out.join(HEAPS_FILE)).unwrap();
        assert_eq!(heaps, "Documents,Terms\n1,3\n2,3\n");

        assert_eq!(run(&dir.path().join("missing"), dir.path()).unwrap(), None);
    }
}
