//! Detector class labels.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Class names in the detector's output order.
///
/// `index_offset` reconciles detector class ids with the names file when the
/// model's class axis starts past a leading background column (the quantized
/// graph shifts every id by one).
#[derive(Debug, Clone)]
pub struct LabelMap {
    names: Vec<String>,
    index_offset: usize,
}

impl LabelMap {
    pub fn new(names: Vec<String>, index_offset: usize) -> Self {
        LabelMap {
            names,
            index_offset,
        }
    }

    /// Reads a file with one class name per line.
    pub fn from_file(filepath: &Path, index_offset: usize) -> io::Result<Self> {
        let names = BufReader::new(File::open(filepath)?)
            .lines()
            .collect::<io::Result<Vec<String>>>()?;
        Ok(LabelMap::new(names, index_offset))
    }

    pub fn name_of(&self, class_id: usize) -> Option<&str> {
        self.names
            .get(class_id + self.index_offset)
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
