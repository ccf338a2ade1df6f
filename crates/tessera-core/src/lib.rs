//! Core intermediate representation, operator traits and pass contract for Tessera.
//!
//! This crate provides the foundational abstractions that the other Tessera crates depend on:
//! - Typed SSA IR (`Module`, `Function`, `Operation`, `Value`) backed by a petgraph `StableGraph`
//! - `FunctionBuilder` for importers and tests
//! - Verification and MLIR-style textual printing
//! - The `Operator` trait and its `InferShapedType` shape-inference capability
//! - The `Pass` trait and ordered compilation `Stage`s
//! - An operator registry that passes query for capabilities

pub mod attribute;
pub mod broadcast;
pub mod builder;
pub mod context;
pub mod ir;
pub mod operator;
pub mod pass;
pub mod printer;
pub mod registry;
pub mod types;
pub mod verify;

// Re-export commonly used types
pub use attribute::AttributeValue;
pub use broadcast::{broadcast_dims, broadcast_shape};
pub use builder::{FunctionBuilder, OpBuilder};
pub use context::InferenceCtx;
pub use ir::{Function, Module, OpId, OpName, Operation, RETURN_OP, Value, ValueDef, ValueId};
pub use operator::{InferShapedType, OpPattern, Operator};
pub use pass::{Pass, PassScope, Stage};
pub use registry::OperatorRegistry;
pub use types::{Dim, ElementType, FunctionType, ShapedTypeComponents, TensorType, Type};

/// Result type using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for tessera-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid graph structure: {0}")]
    InvalidGraph(String),

    #[error("Malformed IR: {0}")]
    Malformed(String),

    #[error("Attribute error: {0}")]
    Attribute(String),

    #[error("Shape inference error: {0}")]
    ShapeInference(String),

    #[error("Pass error: {0}")]
    Pass(String),
}
