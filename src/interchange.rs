//! Word-vector text format.
//!
//! ```text
//! {count} {dimension}
//! {id} {v1} {v2} ... {vdimension}
//! ```
//! Ids are tokens for word vectors and `doc_{i}` for document embeddings.

use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use tracing::info;

use crate::{
    error::{Error, Result},
    utils::fs::ensure_parent,
};

/// Write `ids[i]` with `vectors[i]`. The dimension is taken from the first vector.
pub fn write_vectors<S, V>(path: &Path, ids: &[S], vectors: &[V]) -> Result<()>
where
    S: AsRef<str>,
    V: AsRef<[f32]>,
{
    ensure_parent(path)?;
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut out = BufWriter::new(file);
    let dim = vectors.first().map_or(0, |v| v.as_ref().len());
    let io = |e| Error::io(path, e);

    writeln!(out, "{} {}", vectors.len(), dim).map_err(io)?;
    for (id, vector) in ids.iter().zip(vectors) {
        write!(out, "{}", id.as_ref()).map_err(io)?;
        for v in vector.as_ref() {
            write!(out, " {v}").map_err(io)?;
        }
        writeln!(out).map_err(io)?;
    }
    out.flush().map_err(io)?;
    info!(path = %path.display(), count = vectors.len(), dim, "embeddings saved");
    Ok(())
}

/// Read a file written by `write_vectors`.
/// Malformed numbers become an `InvalidData` io error.
pub fn read_vectors(path: &Path) -> Result<(Vec<String>, Vec<Vec<f32>>)> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut ids = Vec::new();
    let mut vectors = Vec::new();
    for line in BufReader::new(file).lines().skip(1) {
        let line = line.map_err(|e| Error::io(path, e))?;
        let mut fields = line.split_whitespace();
        let Some(id) = fields.next() else { continue };
        let vector = fields
            .map(str::parse::<f32>)
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(|e| Error::io(path, std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
        ids.push(id.to_string());
        vectors.push(vector);
    }
    Ok((ids, vectors))
}

/// Sort the body lines of an embedding file by id, keeping the header line first
pub fn sort_vectors_file(path: &Path) -> Result<()> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let mut lines = contents.lines();
    let header = lines.next().unwrap_or_default();
    let mut body: Vec<&str> = lines.filter(|l| !l.trim().is_empty()).collect();
    body.sort_by(|a, b| first_field(a).cmp(first_field(b)));

    let mut sorted = String::with_capacity(contents.len() + 1);
    sorted.push_str(header);
    sorted.push('\n');
    for line in body {
        sorted.push_str(line);
        sorted.push('\n');
    }
    std::fs::write(path, sorted).map_err(|e| Error::io(path, e))?;
    info!(path = %path.display(), "embeddings sorted");
    Ok(())
}

fn first_field(line: &str) -> &str {
    line.split_whitespace().next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("vectors.txt");
        write_vectors(&path, &["cat", "dog"], &[vec![0.5f32, -1.0], vec![2.0, 0.25]]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "2 2\ncat 0.5 -1\ndog 2 0.25\n");
        let (ids, vectors) = read_vectors(&path).unwrap();
        assert_eq!(ids, vec!["cat", "dog"]);
        assert_eq!(vectors[1], vec![2.0, 0.25]);
    }

    #[test]
    fn sort_keeps_header_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("v.txt");
        std::fs::write(&path, "3 1\nzebra 1\napple 2\nmango 3\n").unwrap();
        sort_vectors_file(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "3 1\napple 2\nmango 3\nzebra 1\n");
    }
}
