//! Softmax operator.

use tessera_core::{InferShapedType, InferenceCtx, OpPattern, Operator, Result, ShapedTypeComponents};

use crate::helpers::{InCtx, normalize_axis};

/// Softmax along `axis` (default -1). Shape is unchanged.
pub struct SoftmaxOp;

impl Operator for SoftmaxOp {
    fn name(&self) -> &str {
        "relay.nn.softmax"
    }

    fn pattern(&self) -> OpPattern {
        OpPattern::OutEWiseFusable
    }

    fn shape_inference(&self) -> Option<&dyn InferShapedType> {
        Some(self)
    }
}

impl InferShapedType for SoftmaxOp {
    fn infer_return_shapes(&self, ctx: &InferenceCtx) -> Result<Vec<ShapedTypeComponents>> {
        let dims = ctx.operand_dims(0)?;
        normalize_axis(ctx.attr_i64_or("axis", -1)?, dims.len()).in_ctx(ctx)?;
        Ok(vec![ShapedTypeComponents::new(dims.to_vec())])
    }
}
