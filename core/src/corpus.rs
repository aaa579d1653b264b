use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::Result;
use crate::index::{Indexer, InvertedIndex};
use crate::DocId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: DocId,
    pub text: String,
}

/// Regular files under `root`, sorted, each paired with its id: the path
/// relative to `root`, with `/` separators.
pub fn list_files<P: AsRef<Path>>(root: P) -> Result<Vec<(DocId, PathBuf)>> {
    let root = root.as_ref();
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let id = rel.components().map(|c| c.as_os_str().to_string_lossy()).collect::<Vec<_>>().join("/");
        files.push((id, entry.path().to_path_buf()));
    }
    Ok(files)
}

pub fn read_dir<P: AsRef<Path>>(root: P) -> Result<Vec<Document>> {
    list_files(root)?
        .into_iter()
        .map(|(id, path)| Ok(Document { id, text: std::fs::read_to_string(path)? }))
        .collect()
}

impl Indexer {
    /// Indexes every file under `root`, reading each one line by line.
    pub fn index_dir<P: AsRef<Path>>(&self, root: P) -> Result<InvertedIndex> {
        let mut index = InvertedIndex::new();
        for (id, path) in list_files(root)? {
            let f = File::open(&path)?;
            self.add_reader(&mut index, &id, BufReader::new(f))?;
            tracing::debug!(doc_id = %id, "indexed file");
        }
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("b.txt"), "dog").unwrap();
        std::fs::write(dir.path().join("a.txt"), "cat").unwrap();
        std::fs::write(dir.path().join("sub/c.txt"), "bird").unwrap();
        let ids: Vec<String> = read_dir(dir.path()).unwrap().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["a.txt", "b.txt", "sub/c.txt"]);
    }

    #[test]
    fn index_dir_matches_in_memory_index() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("doc1"), "cat dog\ncat\n").unwrap();
        std::fs::write(dir.path().join("doc2"), "dog bird").unwrap();
        let indexer = Indexer::default();
        let from_disk = indexer.index_dir(dir.path()).unwrap();
        let in_memory = indexer.index([("doc1", "cat dog cat"), ("doc2", "dog bird")]);
        assert_eq!(from_disk, in_memory);
    }

    #[test]
    fn missing_dir_is_an_io_error() {
        let err = Indexer::default().index_dir("/nonexistent/corpus/dir").unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }
}
