//! COCO-format annotation parsing.

use crate::annotations::ground_truth::GroundTruthBox;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

/// Structural problems with an annotation file. All of these are fatal:
/// a malformed dataset invalidates the whole run.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read annotation file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse annotation file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("annotation {id} has a bbox with {len} values, expected 4")]
    InvalidBoundingBox { id: u64, len: usize },

    #[error("annotation {id} references unknown category {category_id}")]
    UnknownCategory { id: u64, category_id: u64 },
}

/// One image entry from the annotation file.
#[derive(Debug, Clone, Deserialize)]
pub struct CocoImage {
    pub id: u64,
    pub file_name: String,
    pub height: u32,
    pub width: u32,
}

/// One ground-truth annotation.
#[derive(Debug, Clone, Deserialize)]
pub struct CocoAnnotation {
    pub id: u64,
    pub image_id: u64,
    pub category_id: u64,
    /// `[x, y, width, height]` in image pixels.
    pub bbox: Vec<f32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CocoCategory {
    pub id: u64,
    pub name: String,
}

/// A parsed annotation file.
///
/// Category ids in COCO are not necessarily consecutive, so lookups go
/// through [`CocoDataset::category_name`] rather than indexing.
#[derive(Debug, Clone, Deserialize)]
pub struct CocoDataset {
    pub images: Vec<CocoImage>,
    pub annotations: Vec<CocoAnnotation>,
    pub categories: Vec<CocoCategory>,
}

impl CocoDataset {
    pub fn from_file(path: &Path) -> Result<Self, DatasetError> {
        let reader = BufReader::new(File::open(path)?);
        let dataset: CocoDataset = serde_json::from_reader(reader)?;
        dataset.validate()?;
        Ok(dataset)
    }

    pub fn from_json(json: &str) -> Result<Self, DatasetError> {
        let dataset: CocoDataset = serde_json::from_str(json)?;
        dataset.validate()?;
        Ok(dataset)
    }

    fn validate(&self) -> Result<(), DatasetError> {
        for ann in &self.annotations {
            if ann.bbox.len() != 4 {
                return Err(DatasetError::InvalidBoundingBox {
                    id: ann.id,
                    len: ann.bbox.len(),
                });
            }
            if self.category_name(ann.category_id).is_none() {
                return Err(DatasetError::UnknownCategory {
                    id: ann.id,
                    category_id: ann.category_id,
                });
            }
        }
        Ok(())
    }

    /// Category name for a dataset category id.
    pub fn category_name(&self, category_id: u64) -> Option<&str> {
        self.categories
            .iter()
            .find(|category| category.id == category_id)
            .map(|category| category.name.as_str())
    }

    /// Ground-truth boxes for one image, in corner form with resolved
    /// category names.
    pub fn ground_truth_for_image(&self, image_id: u64) -> Result<Vec<GroundTruthBox>, DatasetError> {
        self.annotations
            .iter()
            .filter(|ann| ann.image_id == image_id)
            .map(|ann| {
                let name = self
                    .category_name(ann.category_id)
                    .ok_or(DatasetError::UnknownCategory {
                        id: ann.id,
                        category_id: ann.category_id,
                    })?;
                Ok(GroundTruthBox::from_xywh(
                    name.to_string(),
                    ann.bbox[0],
                    ann.bbox[1],
                    ann.bbox[2],
                    ann.bbox[3],
                ))
            })
            .collect()
    }
}
