//! Corpus loading and tokenisation.

pub mod statistics;

use std::{
    borrow::Cow,
    path::{Path, PathBuf},
};

use rayon::prelude::*;
use tracing::{debug, error, info, warn};
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};
use walkdir::WalkDir;

pub const MIN_TOKEN_LEN: usize = 2;
pub const MAX_TOKEN_LEN: usize = 15;

/// Decompose (NFKD) and drop combining marks, so `café` becomes `cafe`
pub fn strip_accents(text: &str) -> String {
    text.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Lowercase `text` and split it into runs of letters or `_`.
/// Tokens shorter than 2 or longer than 15 characters, and tokens starting
/// with `_`, are dropped.
///
/// # Arguments
/// * `text` - raw document text
/// * `deaccent` - strip accents before tokenising
pub fn simple_preprocess(text: &str, deaccent: bool) -> Vec<String> {
    let text = if deaccent {
        Cow::Owned(strip_accents(text))
    } else {
        Cow::Borrowed(text)
    };
    text.to_lowercase()
        .split(|c: char| !(c.is_alphabetic() || c == '_'))
        .filter(|token| {
            let len = token.chars().count();
            (MIN_TOKEN_LEN..=MAX_TOKEN_LEN).contains(&len) && !token.starts_with('_')
        })
        .map(str::to_string)
        .collect()
}

/// Every regular file under `dir`, sorted by file name at each level
pub fn corpus_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect()
}

/// Load a labelled corpus: each file is a document, labelled with the name
/// of the folder directly containing it.
///
/// A missing `dir` is logged and yields empty vectors. Unreadable files are
/// logged and skipped.
pub fn load_corpus(dir: &Path) -> (Vec<Vec<String>>, Vec<String>) {
    load_corpus_with(dir, false)
}

pub fn load_corpus_with(dir: &Path, deaccent: bool) -> (Vec<Vec<String>>, Vec<String>) {
    if !dir.exists() {
        error!(path = %dir.display(), "corpus directory does not exist");
        return (Vec::new(), Vec::new());
    }
    let documents: Vec<(Vec<String>, String)> = corpus_files(dir)
        .par_iter()
        .filter_map(|path| {
            let text = match std::fs::read_to_string(path) {
                Ok(text) => text,
                Err(e) => {
                    error!(path = %path.display(), error = %e, "failed to read document");
                    return None;
                }
            };
            let tokens = simple_preprocess(&text, deaccent);
            let label = path
                .parent()
                .and_then(Path::file_name)
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            debug!(path = %path.display(), words = tokens.len(), "document loaded");
            Some((tokens, label))
        })
        .collect();
    let (corpus, labels): (Vec<_>, Vec<_>) = documents.into_iter().unzip();
    info!(path = %dir.display(), documents = corpus.len(), "corpus loaded");
    (corpus, labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preprocess_keeps_alphabetic_runs() {
        let tokens = simple_preprocess("The R2D2 robot's x-ray_scan: a _hidden, supercalifragilistic word!", false);
        assert_eq!(tokens, vec!["the", "robot", "ray_scan", "word"]);
    }

    #[test]
    fn deaccenting_is_optional() {
        assert_eq!(simple_preprocess("Café naïve", false), vec!["café", "naïve"]);
        assert_eq!(simple_preprocess("Café naïve", true), vec!["cafe", "naive"]);
        assert_eq!(strip_accents("Ångström"), "Angstrom");
    }

    #[test]
    fn labels_come_from_parent_folder() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("physics")).unwrap();
        std::fs::create_dir_all(root.join("math").join("algebra")).unwrap();
        std::fs::write(root.join("physics").join("b.txt"), "quantum field theory").unwrap();
        std::fs::write(root.join("physics").join("a.txt"), "gravity waves").unwrap();
        std::fs::write(root.join("math").join("algebra").join("c.txt"), "group rings").unwrap();

        let (corpus, labels) = load_corpus(root);
        assert_eq!(labels, vec!["algebra", "physics", "physics"]);
        assert_eq!(corpus[1], vec!["gravity", "waves"]);
        assert_eq!(corpus.len(), labels.len());
    }

    #[test]
    fn missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let (corpus, labels) = load_corpus(&dir.path().join("nope"));
        assert!(corpus.is_empty() && labels.is_empty());
    }
}
