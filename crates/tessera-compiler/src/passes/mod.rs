//! Compiler passes for shape inference and fusion.

mod op_fusion;
mod shape_inference;

pub use op_fusion::{FUSION_GROUP_ATTR, OpFusionPass};
pub use shape_inference::ShapeInferencePass;
