//! Shape inference and pass pipeline for Tessera.
//!
//! This crate takes modules of `relay` dialect tensor operations, resolves
//! every result type and prepares them for lowering to loop nests.
//!
//! The compiler is organized as a pipeline of passes that run in stages:
//! 1. **Inference** - Propagate tensor shapes through each function and
//!    reconcile its signature
//! 2. **Fusion** - Group fusable producer/consumer chains
//! 3. **Lowering** - Loop nests, structured control flow, parallel
//!    constructs and the target IR (caller-supplied passes)
//!
//! Every stage may assume the postcondition of the previous one: fusion and
//! lowering see fully resolved types.
//!
//! # Example
//!
//! ```
//! use tessera_compiler::infer_shapes;
//! use tessera_core::{Dim, ElementType, FunctionBuilder, Module, Type};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut builder = FunctionBuilder::new("main");
//! let a = builder
//!     .op("relay.constant")
//!     .result(Type::tensor(ElementType::F32, vec![Dim::Known(4), Dim::Dynamic]))
//!     .build()?[0];
//! let b = builder
//!     .op("relay.reshape")
//!     .operand(a)
//!     .attr("newshape", vec![2i64, 2])
//!     .result(Type::tensor(ElementType::F32, vec![Dim::Dynamic, Dim::Dynamic]))
//!     .build()?[0];
//! builder.ret(&[b])?;
//!
//! let mut module = Module::new();
//! module.add_function(builder.finish()?);
//! infer_shapes(&mut module)?;
//!
//! let main = module.function("main")?;
//! assert_eq!(main.value_type(b)?.to_string(), "tensor<2x2xf32>");
//! # Ok(())
//! # }
//! ```

pub mod diagnostics;
pub mod passes;
pub mod pipeline;

pub use diagnostics::{Diagnostic, DiagnosticSink, Severity, TracingSink};
pub use passes::{FUSION_GROUP_ATTR, OpFusionPass, ShapeInferencePass};
pub use pipeline::{
    IrUnit, Pipeline, PipelineError, PipelineOptions, PipelineReport, SnapshotConfig,
    SnapshotPredicate,
};

// Re-export commonly used types from tessera-core
pub use tessera_core::{Module, Pass, PassScope, Stage};

use tessera_operators::relay_operator_registry;

/// Convenience function: runs shape inference alone over a module.
///
/// Uses the `relay` operator registry and default options. Build a
/// [`Pipeline`] to add fusion, lowering, verification or snapshots.
///
/// # Errors
///
/// Returns an error if any operation's shape cannot be inferred or a
/// function is malformed.
#[tracing::instrument(skip_all)]
pub fn infer_shapes(module: &mut Module) -> Result<PipelineReport, PipelineError> {
    let mut pipeline = Pipeline::new(relay_operator_registry());
    pipeline.add_pass(ShapeInferencePass::new());
    pipeline.run(module)
}

/// Build the standard pipeline over the `relay` registry.
pub fn relay_pipeline(options: PipelineOptions) -> Pipeline {
    Pipeline::standard(relay_operator_registry(), options)
}
