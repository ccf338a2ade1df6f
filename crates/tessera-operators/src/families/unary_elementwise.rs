//! Unary elementwise operator family.
//!
//! Covers: nn.relu, negative, exp, sqrt, sigmoid, tanh

use tessera_core::{InferShapedType, InferenceCtx, OpPattern, Operator, Result, ShapedTypeComponents};

/// Unary elementwise operator family.
///
/// Every member maps each element independently, so the result has exactly
/// the operand's dimensions. Only the name differs.
pub struct UnaryElementwiseOp {
    name: &'static str,
}

impl UnaryElementwiseOp {
    pub fn relu() -> Self {
        Self { name: "relay.nn.relu" }
    }

    pub fn negative() -> Self {
        Self {
            name: "relay.negative",
        }
    }

    pub fn exp() -> Self {
        Self { name: "relay.exp" }
    }

    pub fn sqrt() -> Self {
        Self { name: "relay.sqrt" }
    }

    pub fn sigmoid() -> Self {
        Self {
            name: "relay.sigmoid",
        }
    }

    pub fn tanh() -> Self {
        Self { name: "relay.tanh" }
    }

    /// All members of the family.
    pub fn all() -> Vec<Self> {
        vec![
            Self::relu(),
            Self::negative(),
            Self::exp(),
            Self::sqrt(),
            Self::sigmoid(),
            Self::tanh(),
        ]
    }
}

impl Operator for UnaryElementwiseOp {
    fn name(&self) -> &str {
        self.name
    }

    fn pattern(&self) -> OpPattern {
        OpPattern::ElemWise
    }

    fn shape_inference(&self) -> Option<&dyn InferShapedType> {
        Some(self)
    }
}

impl InferShapedType for UnaryElementwiseOp {
    fn infer_return_shapes(&self, ctx: &InferenceCtx) -> Result<Vec<ShapedTypeComponents>> {
        if ctx.operand_count() != 1 {
            return Err(ctx.shape_error(format!(
                "expected 1 operand, got {}",
                ctx.operand_count()
            )));
        }
        Ok(vec![ShapedTypeComponents::new(ctx.operand_dims(0)?.to_vec())])
    }
}
