//! Prior box sizes.

use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnchorError {
    #[error("failed to read anchor file: {0}")]
    Io(#[from] std::io::Error),

    #[error("anchor file entry `{0}` is not a number")]
    Parse(String),

    #[error(
        "anchor file holds {got} values, expected {expected} \
         ({scales} scales x {per_scale} anchors x 2)"
    )]
    WrongLength {
        got: usize,
        expected: usize,
        scales: usize,
        per_scale: usize,
    },
}

/// Prior box sizes in network-input pixels, indexed by scale and anchor.
///
/// Loaded once at startup and shared read-only for the life of the process.
/// The file format is a single line of comma-separated floats, width/height
/// pairs grouped by scale.
#[derive(Debug, Clone)]
pub struct AnchorSet {
    sizes: Vec<(f32, f32)>,
    anchors_per_scale: usize,
}

impl AnchorSet {
    pub fn from_file(
        path: &Path,
        num_scales: usize,
        anchors_per_scale: usize,
    ) -> Result<Self, AnchorError> {
        let line = fs::read_to_string(path)?;
        AnchorSet::parse(&line, num_scales, anchors_per_scale)
    }

    pub fn parse(
        line: &str,
        num_scales: usize,
        anchors_per_scale: usize,
    ) -> Result<Self, AnchorError> {
        let values = line
            .trim()
            .split(',')
            .map(|token| {
                let token = token.trim();
                token
                    .parse::<f32>()
                    .map_err(|_| AnchorError::Parse(token.to_string()))
            })
            .collect::<Result<Vec<f32>, AnchorError>>()?;

        let expected = num_scales * anchors_per_scale * 2;
        if values.len() != expected {
            return Err(AnchorError::WrongLength {
                got: values.len(),
                expected,
                scales: num_scales,
                per_scale: anchors_per_scale,
            });
        }

        let sizes = values.chunks(2).map(|pair| (pair[0], pair[1])).collect();
        Ok(AnchorSet {
            sizes,
            anchors_per_scale,
        })
    }

    pub fn num_scales(&self) -> usize {
        self.sizes.len() / self.anchors_per_scale
    }

    pub fn anchors_per_scale(&self) -> usize {
        self.anchors_per_scale
    }

    /// `(width, height)` prior for `anchor` at `scale`.
    pub fn size(&self, scale: usize, anchor: usize) -> (f32, f32) {
        self.sizes[scale * self.anchors_per_scale + anchor]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YOLOV4_ANCHORS: &str =
        "12,16, 19,36, 40,28, 36,75, 76,55, 72,146, 142,110, 192,243, 459,401";

    #[test]
    fn parses_the_standard_anchor_line() {
        let anchors = AnchorSet::parse(YOLOV4_ANCHORS, 3, 3).unwrap();
        assert_eq!(anchors.num_scales(), 3);
        assert_eq!(anchors.anchors_per_scale(), 3);
        assert_eq!(anchors.size(0, 0), (12.0, 16.0));
        assert_eq!(anchors.size(1, 2), (72.0, 146.0));
        assert_eq!(anchors.size(2, 2), (459.0, 401.0));
    }

    #[test]
    fn wrong_count_is_a_configuration_error() {
        let err = AnchorSet::parse("12,16, 19,36", 3, 3).unwrap_err();
        assert!(matches!(
            err,
            AnchorError::WrongLength { got: 4, expected: 18, .. }
        ));
    }

    #[test]
    fn non_numeric_entry_is_a_configuration_error() {
        let err = AnchorSet::parse("12,sixteen", 1, 1).unwrap_err();
        assert!(matches!(err, AnchorError::Parse(token) if token == "sixteen"));
    }
}
