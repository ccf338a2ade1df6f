//! Common test utilities for operator shape-rule tests.
//!
//! Builds a single-operation function around the operator under test and
//! invokes its shape-inference capability directly.

#![allow(dead_code)]

use tessera_core::{
    AttributeValue, Dim, ElementType, FunctionBuilder, InferenceCtx, Result, ShapedTypeComponents,
    Type,
};
use tessera_operators::relay_operator_registry;

/// Marker for a dynamic dimension in `dims` / `tensor`.
pub const DYN: i64 = -1;

/// Convert a compact dimension list (`DYN` for dynamic) to `Dim`s.
pub fn dims(values: &[i64]) -> Vec<Dim> {
    values
        .iter()
        .map(|&v| if v < 0 { Dim::Dynamic } else { Dim::Known(v as usize) })
        .collect()
}

/// An f32 tensor type.
pub fn tensor(values: &[i64]) -> Type {
    Type::tensor(ElementType::F32, dims(values))
}

/// Run the shape rule of `op` on operands of the given types.
pub fn infer(
    op: &str,
    operands: &[Type],
    attrs: &[(&str, AttributeValue)],
) -> Result<Vec<ShapedTypeComponents>> {
    let mut builder = FunctionBuilder::new("test");
    let args: Vec<_> = operands.iter().map(|ty| builder.arg(ty.clone())).collect();

    let mut op_builder = builder.op(op).operands(&args);
    for (key, value) in attrs {
        op_builder = op_builder.attr(key, value.clone());
    }
    let results = op_builder.result(Type::Scalar(ElementType::F32)).build()?;
    builder.ret(&results)?;
    let function = builder.finish()?;

    let registry = relay_operator_registry();
    let operator = registry
        .get(op)
        .unwrap_or_else(|| panic!("{} is not registered", op));
    let capability = operator
        .shape_inference()
        .unwrap_or_else(|| panic!("{} has no shape rule", op));

    let op_id = function.op_ids()[0];
    let ctx = InferenceCtx::new(function.op(op_id)?, &function);
    capability.infer_return_shapes(&ctx)
}

/// Run the shape rule and return the single result's dims.
pub fn infer_dims(op: &str, operands: &[Type], attrs: &[(&str, AttributeValue)]) -> Vec<Dim> {
    let mut components = infer(op, operands, attrs).unwrap();
    assert_eq!(components.len(), 1, "{} should produce one result", op);
    components.remove(0).dims
}

/// Shorthand for an `Ints` attribute.
pub fn ints(values: &[i64]) -> AttributeValue {
    AttributeValue::Ints(values.to_vec())
}
