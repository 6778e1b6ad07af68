pub mod anchor_generator;
pub mod assignment;
pub mod box_coder;
pub mod inference_process;
pub mod iou;
pub mod nms;
