//! The `relay` operator dialect for Tessera.
//!
//! This crate provides Relay-style tensor operators and their shape rules,
//! using collapsed operator families where several operators share one rule.
//!
//! # Operator Families
//!
//! - **Unary elementwise**: nn.relu, negative, exp, sqrt, sigmoid, tanh
//! - **Binary elementwise**: add, subtract, multiply, divide, maximum, minimum
//! - **Reduction**: sum, mean, max
//! - **Pooling**: nn.max_pool2d, nn.avg_pool2d, nn.global_avg_pool2d
//!
//! # Individual Operators
//!
//! - Shape manipulation (reshape, transpose, expand_dims, squeeze, concatenate, nn.batch_flatten)
//! - Neural network (nn.bias_add, nn.softmax, nn.dense, nn.batch_matmul, nn.conv2d)
//! - Type conversion (cast)
//! - Constants (constant, no shape rule)

pub mod families;
pub mod operators;

mod helpers;
mod registry;

// Re-export operator types
pub use families::{
    BinaryElementwiseOp, GlobalAvgPool2dOp, Pool2dOp, ReductionOp, UnaryElementwiseOp,
};
pub use registry::{RELAY_DIALECT, relay_operator_registry};

/// Result type for operator operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for operator operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Operator error: {0}")]
    Operator(String),

    #[error(transparent)]
    Core(#[from] tessera_core::Error),
}
