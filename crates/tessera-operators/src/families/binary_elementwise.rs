//! Binary elementwise operator family.
//!
//! Covers: add, subtract, multiply, divide, maximum, minimum

use tessera_core::{
    Dim, InferShapedType, InferenceCtx, OpPattern, Operator, Result, ShapedTypeComponents, Type,
    broadcast_dims,
};

/// Binary elementwise operator family.
///
/// All members share NumPy-style broadcasting for shape inference. Scalar
/// operands broadcast as rank-0 tensors.
pub struct BinaryElementwiseOp {
    name: &'static str,
}

impl BinaryElementwiseOp {
    pub fn add() -> Self {
        Self { name: "relay.add" }
    }

    pub fn subtract() -> Self {
        Self {
            name: "relay.subtract",
        }
    }

    pub fn multiply() -> Self {
        Self {
            name: "relay.multiply",
        }
    }

    pub fn divide() -> Self {
        Self {
            name: "relay.divide",
        }
    }

    pub fn maximum() -> Self {
        Self {
            name: "relay.maximum",
        }
    }

    pub fn minimum() -> Self {
        Self {
            name: "relay.minimum",
        }
    }

    /// All members of the family.
    pub fn all() -> Vec<Self> {
        vec![
            Self::add(),
            Self::subtract(),
            Self::multiply(),
            Self::divide(),
            Self::maximum(),
            Self::minimum(),
        ]
    }
}

fn operand_dims<'a>(ctx: &InferenceCtx<'a>, index: usize) -> Result<&'a [Dim]> {
    let dims: &'a [Dim] = match ctx.operand_type(index)? {
        Type::Scalar(_) => &[],
        Type::Tensor(tensor) => tensor.dims.as_slice(),
    };
    Ok(dims)
}

impl Operator for BinaryElementwiseOp {
    fn name(&self) -> &str {
        self.name
    }

    fn pattern(&self) -> OpPattern {
        OpPattern::Broadcast
    }

    fn shape_inference(&self) -> Option<&dyn InferShapedType> {
        Some(self)
    }
}

impl InferShapedType for BinaryElementwiseOp {
    fn infer_return_shapes(&self, ctx: &InferenceCtx) -> Result<Vec<ShapedTypeComponents>> {
        if ctx.operand_count() != 2 {
            return Err(ctx.shape_error(format!(
                "expected 2 operands, got {}",
                ctx.operand_count()
            )));
        }
        let lhs = operand_dims(ctx, 0)?;
        let rhs = operand_dims(ctx, 1)?;
        let dims = broadcast_dims(lhs, rhs).map_err(|e| ctx.shape_error(e.to_string()))?;
        Ok(vec![ShapedTypeComponents::new(dims)])
    }
}
