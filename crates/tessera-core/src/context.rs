//! Read-only view of one operation during shape inference.
//!
//! Operators see their operands' current types and their own attributes
//! through `InferenceCtx`, never the mutable function.

use crate::attribute::AttributeValue;
use crate::ir::{Function, Operation, ValueDef};
use crate::types::{Dim, ElementType, TensorType, Type};
use crate::{Error, Result};

/// Context for shape inference operations.
///
/// Provides read-only access to:
/// - Operand types (as resolved so far in program order)
/// - Declared result types
/// - Operation attributes
pub struct InferenceCtx<'a> {
    /// The operation being processed.
    pub op: &'a Operation,

    /// The function containing the operation.
    pub function: &'a Function,
}

impl<'a> InferenceCtx<'a> {
    /// Create a new inference context.
    pub fn new(op: &'a Operation, function: &'a Function) -> Self {
        Self { op, function }
    }

    /// Get the number of operands.
    pub fn operand_count(&self) -> usize {
        self.op.operands.len()
    }

    /// Get the number of results.
    pub fn result_count(&self) -> usize {
        self.op.results.len()
    }

    /// Get the current type of an operand.
    pub fn operand_type(&self, index: usize) -> Result<&'a Type> {
        let id = self.op.operands.get(index).ok_or_else(|| {
            self.shape_error(format!(
                "expected at least {} operands, got {}",
                index + 1,
                self.operand_count()
            ))
        })?;
        self.function.value_type(*id)
    }

    /// Get an operand's tensor type.
    ///
    /// Returns an error if the operand is a scalar.
    pub fn operand_tensor(&self, index: usize) -> Result<&'a TensorType> {
        self.operand_type(index)?
            .as_tensor()
            .ok_or_else(|| self.shape_error(format!("operand {} must be a tensor", index)))
    }

    /// Get an operand's dimensions.
    pub fn operand_dims(&self, index: usize) -> Result<&'a [Dim]> {
        Ok(&self.operand_tensor(index)?.dims)
    }

    /// Get static dimensions of an operand.
    ///
    /// Returns an error if any dimension is dynamic.
    pub fn require_static(&self, index: usize) -> Result<Vec<usize>> {
        self.operand_tensor(index)?.static_dims().ok_or_else(|| {
            self.shape_error(format!("operand {} must have a static shape", index))
        })
    }

    /// Get the declared (pre-inference) type of a result.
    pub fn result_type(&self, index: usize) -> Result<&'a Type> {
        let id = self.op.results.get(index).ok_or_else(|| {
            self.shape_error(format!("result {} out of range", index))
        })?;
        self.function.value_type(*id)
    }

    // --- Attribute accessors ---

    fn attr(&self, key: &str) -> Result<&'a AttributeValue> {
        self.op.get_attribute(key).ok_or_else(|| {
            Error::Attribute(format!("{}: missing attribute '{}'", self.op.describe(), key))
        })
    }

    fn convert<T>(&self, key: &str, value: &AttributeValue) -> Result<T>
    where
        T: TryFrom<AttributeValue, Error = String>,
    {
        T::try_from(value.clone()).map_err(|msg| {
            Error::Attribute(format!(
                "{}: attribute '{}': {}",
                self.op.describe(),
                key,
                msg
            ))
        })
    }

    fn attr_as<T>(&self, key: &str) -> Result<T>
    where
        T: TryFrom<AttributeValue, Error = String>,
    {
        self.convert(key, self.attr(key)?)
    }

    /// Missing attributes yield `default`; present but ill-typed ones are errors.
    fn attr_as_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: TryFrom<AttributeValue, Error = String>,
    {
        match self.op.get_attribute(key) {
            Some(value) => self.convert(key, value),
            None => Ok(default),
        }
    }

    /// Get an i64 attribute.
    pub fn attr_i64(&self, key: &str) -> Result<i64> {
        self.attr_as(key)
    }

    /// Get a bool attribute.
    pub fn attr_bool(&self, key: &str) -> Result<bool> {
        self.attr_as(key)
    }

    /// Get an i64 array attribute. A single int is read as a one-element list.
    pub fn attr_ints(&self, key: &str) -> Result<Vec<i64>> {
        self.attr_as(key)
    }

    /// Get an element type attribute (`Type` or its textual form).
    pub fn attr_type(&self, key: &str) -> Result<ElementType> {
        self.attr_as(key)
    }

    /// Get an optional i64 attribute with a default value.
    pub fn attr_i64_or(&self, key: &str, default: i64) -> Result<i64> {
        self.attr_as_or(key, default)
    }

    /// Get an optional bool attribute with a default value.
    pub fn attr_bool_or(&self, key: &str, default: bool) -> Result<bool> {
        self.attr_as_or(key, default)
    }

    /// Get an optional i64 array attribute with a default value.
    pub fn attr_ints_or(&self, key: &str, default: Vec<i64>) -> Result<Vec<i64>> {
        self.attr_as_or(key, default)
    }

    /// Check if an attribute exists.
    pub fn has_attr(&self, key: &str) -> bool {
        self.op.get_attribute(key).is_some()
    }

    // --- Error reporting ---

    /// Create a shape inference error carrying the operation and its operands.
    ///
    /// ```text
    /// Shape inference failed for relay.reshape at model.py:4
    ///
    ///   Operands:
    ///     0: %arg0 : tensor<4x?xf32> (argument 0)
    ///
    ///   Error: cannot infer -1 from a dynamic input shape
    /// ```
    pub fn shape_error(&self, message: impl Into<String>) -> Error {
        let mut error_msg = format!("Shape inference failed for {}\n\n", self.op.describe());

        error_msg.push_str("  Operands:\n");
        for i in 0..self.operand_count() {
            error_msg.push_str(&format!("    {}\n", self.operand_details(i)));
        }

        error_msg.push_str("\n  Error: ");
        error_msg.push_str(&message.into());

        Error::ShapeInference(error_msg)
    }

    fn operand_details(&self, index: usize) -> String {
        let Some(&id) = self.op.operands.get(index) else {
            return format!("{}: <missing>", index);
        };
        let Ok(value) = self.function.value(id) else {
            return format!("{}: %{} <unknown value>", index, id.index());
        };
        let source = match value.def {
            ValueDef::Argument(n) => format!("argument {}", n),
            ValueDef::Result { op, index } => match self.function.op(op) {
                Ok(producer) => format!("result {} of {}", index, producer.name),
                Err(_) => format!("result {} of <erased op>", index),
            },
            ValueDef::Erased => "result of <erased op>".to_string(),
        };
        format!("{}: %{} : {} ({})", index, id.index(), value.ty, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::FunctionBuilder;
    use crate::ir::OpId;

    fn sample() -> (Function, OpId) {
        let mut builder = FunctionBuilder::new("main");
        let x = builder.arg(Type::tensor(ElementType::F32, vec![Dim::Known(4), Dim::Dynamic]));
        let y = builder
            .op("relay.reshape")
            .operand(x)
            .attr("newshape", vec![2i64, 2])
            .attr("axis", 1i64)
            .attr("dtype", "i32")
            .loc("model.py:4")
            .result(Type::tensor(ElementType::F32, vec![Dim::Dynamic, Dim::Dynamic]))
            .build()
            .unwrap()[0];
        builder.ret(&[y]).unwrap();
        let function = builder.finish().unwrap();
        let id = function.op_ids()[0];
        (function, id)
    }

    #[test]
    fn test_operand_access() {
        let (function, id) = sample();
        let ctx = InferenceCtx::new(function.op(id).unwrap(), &function);

        assert_eq!(ctx.operand_count(), 1);
        assert_eq!(ctx.result_count(), 1);
        assert_eq!(ctx.operand_dims(0).unwrap(), &[Dim::Known(4), Dim::Dynamic]);
        assert!(ctx.require_static(0).is_err());
        assert!(ctx.operand_type(1).is_err());
        assert_eq!(ctx.result_type(0).unwrap().element_type(), ElementType::F32);
    }

    #[test]
    fn test_attribute_access() {
        let (function, id) = sample();
        let ctx = InferenceCtx::new(function.op(id).unwrap(), &function);

        assert_eq!(ctx.attr_ints("newshape").unwrap(), vec![2, 2]);
        assert_eq!(ctx.attr_ints("axis").unwrap(), vec![1]);
        assert_eq!(ctx.attr_i64("axis").unwrap(), 1);
        assert_eq!(ctx.attr_type("dtype").unwrap(), ElementType::I32);
        assert!(ctx.attr_i64("missing").is_err());
        assert_eq!(ctx.attr_i64_or("missing", 7).unwrap(), 7);
        assert!(!ctx.attr_bool_or("keepdims", false).unwrap());
        // Present but ill-typed attributes are not replaced by the default.
        assert!(ctx.attr_i64_or("newshape", 0).is_err());
        assert!(ctx.has_attr("axis"));
    }

    #[test]
    fn test_string_attributes_are_element_types() {
        let (function, id) = sample();
        let ctx = InferenceCtx::new(function.op(id).unwrap(), &function);

        // textual attributes are only consumed as dtypes
        assert_eq!(ctx.attr_type("dtype").unwrap(), ElementType::I32);
        let err = ctx.attr_ints("dtype").unwrap_err();
        assert!(err.to_string().contains("string"), "{}", err);
        assert!(ctx.attr_bool_or("dtype", false).is_err());
    }

    #[test]
    fn test_shape_error_lists_operands() {
        let (function, id) = sample();
        let ctx = InferenceCtx::new(function.op(id).unwrap(), &function);

        let msg = ctx.shape_error("boom").to_string();
        assert!(msg.contains("relay.reshape at model.py:4"));
        assert!(msg.contains("tensor<4x?xf32> (argument 0)"));
        assert!(msg.contains("Error: boom"));
    }
}
