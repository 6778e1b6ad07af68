mod anchor_box;
mod ground_truth;
mod image_detections;
mod multibox_detection;
mod multibox_target;

pub use anchor_box::*;
pub use ground_truth::*;
pub use image_detections::*;
pub use multibox_detection::*;
pub use multibox_target::*;
