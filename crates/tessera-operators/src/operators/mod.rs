//! Individual operator implementations that don't fit into families.

pub mod bias_add;
pub mod cast;
pub mod constant;
pub mod conv;
pub mod matmul;
pub mod shape;
pub mod softmax;

// Re-export all operators
pub use bias_add::BiasAddOp;
pub use cast::CastOp;
pub use constant::ConstantOp;
pub use conv::Conv2dOp;
pub use matmul::{BatchMatmulOp, DenseOp};
pub use shape::{
    BatchFlattenOp, ConcatenateOp, ExpandDimsOp, ReshapeOp, SqueezeOp, TransposeOp,
};
pub use softmax::SoftmaxOp;
