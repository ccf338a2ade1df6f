//! Collapsed operator families.
//!
//! These families group operators that share one shape rule and differ only
//! in name.

pub mod binary_elementwise;
pub mod pooling;
pub mod reduction;
pub mod unary_elementwise;

pub use binary_elementwise::BinaryElementwiseOp;
pub use pooling::{GlobalAvgPool2dOp, Pool2dOp};
pub use reduction::ReductionOp;
pub use unary_elementwise::UnaryElementwiseOp;
