//! Raw prediction tensors to candidate boxes in network-input pixels.

use itertools::iproduct;
use ndarray::{Array2, ArrayD, ArrayView5, Ix3, Ix5, s};
use thiserror::Error;

use crate::object_detection::anchors::AnchorSet;
use crate::object_detection::config::{DecodeMode, PipelineConfig};

/// Channels preceding the class probabilities in a candidate row:
/// center x/y, width, height, objectness.
pub const BOX_CHANNELS: usize = 5;

/// Shape problems between the model outputs and the configured anchors and
/// scale parameters. These mean the model and configuration were not built
/// for each other, so the whole run is invalid.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(
        "model produced {outputs} output tensors for {strides} strides, \
         {xy_scales} xy-scales and {anchor_scales} anchor scales"
    )]
    ScaleMismatch {
        outputs: usize,
        strides: usize,
        xy_scales: usize,
        anchor_scales: usize,
    },

    #[error("scale {scale}: expected a [1, rows, cols, anchors, channels] tensor, got shape {shape:?}")]
    BadShape { scale: usize, shape: Vec<usize> },

    #[error("scale {scale}: {got} anchors per cell, anchor set holds {expected}")]
    AnchorMismatch {
        scale: usize,
        got: usize,
        expected: usize,
    },

    #[error("scale {scale}: {got} channels per anchor, other scales have {expected}")]
    ChannelMismatch {
        scale: usize,
        got: usize,
        expected: usize,
    },

    #[error("scale {scale}: {channels} channels per anchor leave no class probabilities")]
    NoClassChannels { scale: usize, channels: usize },

    #[error("quantized model produced {got} outputs, expected a box and a score tensor")]
    QuantizedArity { got: usize },

    #[error(
        "quantized outputs: expected [1, n, 4] boxes and [1, n, classes] scores, \
         got {boxes:?} and {scores:?}"
    )]
    QuantizedShape {
        boxes: Vec<usize>,
        scores: Vec<usize>,
    },
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Decode raw model outputs into one flat candidate arena.
///
/// Each row is `[cx, cy, w, h, objectness, probs..]` in network-input
/// pixels. In [`DecodeMode::Full`] the per-scale grid/anchor math is
/// applied; in [`DecodeMode::Quantized`] the already-decoded box/score pair
/// is restitched into the same layout, so everything downstream is
/// variant-agnostic.
pub fn decode_predictions(
    predictions: &[ArrayD<f32>],
    anchors: &AnchorSet,
    config: &PipelineConfig,
) -> Result<Array2<f32>, DecodeError> {
    match config.mode {
        DecodeMode::Full => decode_grid_predictions(predictions, anchors, config),
        DecodeMode::Quantized => flatten_quantized_predictions(predictions),
    }
}

/// The full decode: for every grid cell and anchor,
///
/// `center = (sigmoid(dxdy) * xy_scale - 0.5 * (xy_scale - 1) + cell) * stride`
/// `size   = exp(dwdh) * anchor_size`
///
/// The objectness and class channels are copied through unchanged; the
/// exported graph has already activated them.
fn decode_grid_predictions(
    predictions: &[ArrayD<f32>],
    anchors: &AnchorSet,
    config: &PipelineConfig,
) -> Result<Array2<f32>, DecodeError> {
    if predictions.len() != config.strides.len()
        || predictions.len() != config.xy_scales.len()
        || predictions.len() != anchors.num_scales()
    {
        return Err(DecodeError::ScaleMismatch {
            outputs: predictions.len(),
            strides: config.strides.len(),
            xy_scales: config.xy_scales.len(),
            anchor_scales: anchors.num_scales(),
        });
    }

    // First pass: validate every scale's shape and size the arena.
    let mut views: Vec<ArrayView5<f32>> = Vec::with_capacity(predictions.len());
    let mut channels = 0;
    let mut total_rows = 0;
    for (scale, pred) in predictions.iter().enumerate() {
        let view = pred
            .view()
            .into_dimensionality::<Ix5>()
            .map_err(|_| DecodeError::BadShape {
                scale,
                shape: pred.shape().to_vec(),
            })?;
        let (batch, rows, cols, per_cell, chans) = view.dim();
        if batch != 1 {
            return Err(DecodeError::BadShape {
                scale,
                shape: pred.shape().to_vec(),
            });
        }
        if per_cell != anchors.anchors_per_scale() {
            return Err(DecodeError::AnchorMismatch {
                scale,
                got: per_cell,
                expected: anchors.anchors_per_scale(),
            });
        }
        if chans <= BOX_CHANNELS {
            return Err(DecodeError::NoClassChannels {
                scale,
                channels: chans,
            });
        }
        if scale == 0 {
            channels = chans;
        } else if chans != channels {
            return Err(DecodeError::ChannelMismatch {
                scale,
                got: chans,
                expected: channels,
            });
        }
        total_rows += rows * cols * per_cell;
        views.push(view);
    }

    let mut arena = Array2::<f32>::zeros((total_rows, channels));
    let mut next = 0;
    for (scale, view) in views.iter().enumerate() {
        let (_, rows, cols, per_cell, _) = view.dim();
        let stride = config.strides[scale];
        let xy_scale = config.xy_scales[scale];
        for (row, col, anchor) in iproduct!(0..rows, 0..cols, 0..per_cell) {
            let cell = view.slice(s![0usize, row, col, anchor, ..]);
            let (anchor_width, anchor_height) = anchors.size(scale, anchor);

            let mut out = arena.row_mut(next);
            out[0] = (sigmoid(cell[0]) * xy_scale - 0.5 * (xy_scale - 1.0) + col as f32) * stride;
            out[1] = (sigmoid(cell[1]) * xy_scale - 0.5 * (xy_scale - 1.0) + row as f32) * stride;
            out[2] = cell[2].exp() * anchor_width;
            out[3] = cell[3].exp() * anchor_height;
            for channel in 4..channels {
                out[channel] = cell[channel];
            }
            next += 1;
        }
    }
    Ok(arena)
}

/// Restitch the quantized graph's `[1, n, 4]` box tensor and `[1, n, c]`
/// score tensor into the common `[n, 5 + classes]` arena.
///
/// The graph emits no objectness, so that column is fixed to 1. Its score
/// axis leads with a background column that is dropped here; the resulting
/// one-off class ids are reconciled by the label map's index offset.
fn flatten_quantized_predictions(predictions: &[ArrayD<f32>]) -> Result<Array2<f32>, DecodeError> {
    let [boxes, scores] = predictions else {
        return Err(DecodeError::QuantizedArity {
            got: predictions.len(),
        });
    };

    let shape_err = || DecodeError::QuantizedShape {
        boxes: boxes.shape().to_vec(),
        scores: scores.shape().to_vec(),
    };
    let boxes_view = boxes
        .view()
        .into_dimensionality::<Ix3>()
        .map_err(|_| shape_err())?;
    let scores_view = scores
        .view()
        .into_dimensionality::<Ix3>()
        .map_err(|_| shape_err())?;

    let (box_batch, num_boxes, coords) = boxes_view.dim();
    let (score_batch, num_scored, score_channels) = scores_view.dim();
    if box_batch != 1
        || score_batch != 1
        || coords != 4
        || num_boxes != num_scored
        || score_channels < 2
    {
        return Err(shape_err());
    }

    let channels = BOX_CHANNELS + (score_channels - 1);
    let mut arena = Array2::<f32>::zeros((num_boxes, channels));
    for index in 0..num_boxes {
        let mut out = arena.row_mut(index);
        for coord in 0..4 {
            out[coord] = boxes_view[[0, index, coord]];
        }
        out[4] = 1.0;
        for class in 1..score_channels {
            out[BOX_CHANNELS + class - 1] = scores_view[[0, index, class]];
        }
    }
    Ok(arena)
}
