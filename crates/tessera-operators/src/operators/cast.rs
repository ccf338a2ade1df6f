//! Type conversion.

use tessera_core::{InferShapedType, InferenceCtx, OpPattern, Operator, Result, ShapedTypeComponents};

/// `cast(data, dtype)`: same shape, element type from `dtype`.
///
/// The only operator that overrides the result element type.
pub struct CastOp;

impl Operator for CastOp {
    fn name(&self) -> &str {
        "relay.cast"
    }

    fn pattern(&self) -> OpPattern {
        OpPattern::ElemWise
    }

    fn shape_inference(&self) -> Option<&dyn InferShapedType> {
        Some(self)
    }
}

impl InferShapedType for CastOp {
    fn infer_return_shapes(&self, ctx: &InferenceCtx) -> Result<Vec<ShapedTypeComponents>> {
        let dims = ctx.operand_dims(0)?.to_vec();
        let dtype = ctx.attr_type("dtype")?;
        Ok(vec![ShapedTypeComponents::new(dims).with_element(dtype)])
    }
}
