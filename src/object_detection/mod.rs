pub mod anchors;
pub mod config;
pub mod decode;
pub mod filter;
pub mod nms;
pub mod ort_inference_session;
pub mod yolov4;
