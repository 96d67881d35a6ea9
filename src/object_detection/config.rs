//! Fixed pipeline configuration.

use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown suppression method `{0}`, expected `nms` or `soft-nms`")]
    UnknownSuppressionMethod(String),
}

/// Score decay applied by soft suppression; see the soft-NMS paper
/// (https://arxiv.org/pdf/1704.04503).
pub const DEFAULT_SOFT_NMS_SIGMA: f32 = 0.3;

/// How overlapping same-class detections are down-weighted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SuppressionMethod {
    /// Zero the score of any box overlapping a kept box beyond the IoU
    /// threshold.
    Nms,
    /// Decay every remaining score by `exp(-iou^2 / sigma)` instead of
    /// cutting it off.
    SoftNms { sigma: f32 },
}

impl FromStr for SuppressionMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nms" => Ok(SuppressionMethod::Nms),
            "soft-nms" => Ok(SuppressionMethod::SoftNms {
                sigma: DEFAULT_SOFT_NMS_SIGMA,
            }),
            other => Err(ConfigError::UnknownSuppressionMethod(other.to_string())),
        }
    }
}

/// Which form the raw model outputs take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMode {
    /// Per-scale grid tensors holding pre-activation offsets; the decoder
    /// applies the anchor math.
    Full,
    /// The graph already decoded boxes and class scores into two flat
    /// arrays; objectness is an implicit 1.
    Quantized,
}

impl DecodeMode {
    /// Offset added to a detection's class id when resolving its name.
    ///
    /// The quantized graph's usable class axis starts one past a leading
    /// background column, so its ids are shifted by one relative to the
    /// names file.
    pub fn class_index_offset(&self) -> usize {
        match self {
            DecodeMode::Full => 0,
            DecodeMode::Quantized => 1,
        }
    }
}

/// Decode-and-filter parameters for one model.
///
/// The defaults are the YOLOv4/COCO values the shipped anchor file was
/// built for.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Pixels per grid cell, one entry per detection scale.
    pub strides: Vec<f32>,
    /// Center-offset scaling per scale; re-centers the grid-cell boundary
    /// bias of the raw sigmoid offsets.
    pub xy_scales: Vec<f32>,
    /// Side of the square network input in pixels.
    pub input_size: u32,
    /// Detections must score strictly above this to survive filtering.
    pub score_threshold: f32,
    /// Overlap beyond this suppresses (or decays) a same-class box.
    pub iou_threshold: f32,
    pub method: SuppressionMethod,
    pub mode: DecodeMode,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            strides: vec![8.0, 16.0, 32.0],
            xy_scales: vec![1.2, 1.1, 1.05],
            input_size: 416,
            score_threshold: 0.25,
            iou_threshold: 0.213,
            method: SuppressionMethod::Nms,
            mode: DecodeMode::Full,
        }
    }
}
