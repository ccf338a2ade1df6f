//! Fluent construction of functions.
//!
//! Importers and tests build functions op by op:
//!
//! ```
//! use tessera_core::{Dim, ElementType, FunctionBuilder, Type};
//!
//! # fn main() -> tessera_core::Result<()> {
//! let mut builder = FunctionBuilder::new("main");
//! let x = builder.arg(Type::tensor(ElementType::F32, vec![Dim::Known(4), Dim::Dynamic]));
//! let y = builder
//!     .op("relay.reshape")
//!     .operand(x)
//!     .attr("newshape", vec![2i64, 2])
//!     .result(Type::tensor(ElementType::F32, vec![Dim::Dynamic, Dim::Dynamic]))
//!     .build()?[0];
//! builder.ret(&[y])?;
//! let function = builder.finish()?;
//! assert_eq!(function.op_count(), 2);
//! # Ok(())
//! # }
//! ```

use crate::attribute::AttributeValue;
use crate::ir::{Function, Operation, RETURN_OP, ValueId};
use crate::types::{FunctionType, Type};
use crate::Result;

/// Builds a `Function` in program order.
pub struct FunctionBuilder {
    function: Function,
    declared_outputs: Option<Vec<Type>>,
}

impl FunctionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            function: Function::new(name),
            declared_outputs: None,
        }
    }

    /// Add a function argument.
    pub fn arg(&mut self, ty: Type) -> ValueId {
        self.function.add_argument(ty)
    }

    /// Start building an operation.
    pub fn op(&mut self, name: impl Into<String>) -> OpBuilder<'_> {
        OpBuilder {
            function: &mut self.function,
            op: Operation::new(name),
            result_types: Vec::new(),
        }
    }

    /// Append the `func.return` terminator.
    pub fn ret(&mut self, values: &[ValueId]) -> Result<()> {
        let mut op = Operation::new(RETURN_OP);
        op.operands = values.to_vec();
        self.function.push_op(op, Vec::new())?;
        Ok(())
    }

    /// Declare output types explicitly instead of deriving them from the
    /// return operands. Importers use this to record a signature that
    /// still contains dynamic dimensions.
    pub fn declare_outputs(&mut self, outputs: Vec<Type>) -> &mut Self {
        self.declared_outputs = Some(outputs);
        self
    }

    /// Finish the function and compute its declared signature.
    pub fn finish(mut self) -> Result<Function> {
        let outputs = match self.declared_outputs.take() {
            Some(outputs) => outputs,
            None => {
                let terminator = self.function.terminator()?;
                let operands = self.function.op(terminator)?.operands.clone();
                operands
                    .iter()
                    .map(|&id| self.function.value_type(id).cloned())
                    .collect::<Result<Vec<_>>>()?
            }
        };
        let inputs = self.function.argument_types();
        self.function.set_signature(FunctionType::new(inputs, outputs));
        Ok(self.function)
    }
}

/// Builds a single operation; see [`FunctionBuilder::op`].
pub struct OpBuilder<'a> {
    function: &'a mut Function,
    op: Operation,
    result_types: Vec<Type>,
}

impl OpBuilder<'_> {
    pub fn operand(mut self, value: ValueId) -> Self {
        self.op.operands.push(value);
        self
    }

    pub fn operands(mut self, values: &[ValueId]) -> Self {
        self.op.operands.extend_from_slice(values);
        self
    }

    pub fn attr(mut self, key: &str, value: impl Into<AttributeValue>) -> Self {
        self.op.set_attribute(key, value.into());
        self
    }

    /// Add a result with its declared (possibly partially dynamic) type.
    pub fn result(mut self, ty: Type) -> Self {
        self.result_types.push(ty);
        self
    }

    pub fn loc(mut self, loc: impl Into<String>) -> Self {
        self.op.loc = Some(loc.into());
        self
    }

    /// Append the operation and return its result values.
    pub fn build(self) -> Result<Vec<ValueId>> {
        let id = self.function.push_op(self.op, self.result_types)?;
        Ok(self.function.op(id)?.results.clone())
    }
}
