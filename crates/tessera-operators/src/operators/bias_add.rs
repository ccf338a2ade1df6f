//! Bias addition along a channel axis.

use tessera_core::{InferShapedType, InferenceCtx, OpPattern, Operator, Result, ShapedTypeComponents};

use crate::helpers::{InCtx, normalize_axis, unify_dims};

/// `nn.bias_add(data, bias)`: adds a rank-1 `bias` along `axis` (default 1).
///
/// The result has the data's shape; a dynamic channel dim is refined by the
/// bias length.
pub struct BiasAddOp;

impl Operator for BiasAddOp {
    fn name(&self) -> &str {
        "relay.nn.bias_add"
    }

    fn pattern(&self) -> OpPattern {
        OpPattern::Broadcast
    }

    fn shape_inference(&self) -> Option<&dyn InferShapedType> {
        Some(self)
    }
}

impl InferShapedType for BiasAddOp {
    fn infer_return_shapes(&self, ctx: &InferenceCtx) -> Result<Vec<ShapedTypeComponents>> {
        let data = ctx.operand_dims(0)?;
        let bias = ctx.operand_dims(1)?;
        let [channels] = bias else {
            return Err(ctx.shape_error(format!("bias must have rank 1, got {}", bias.len())));
        };

        let axis = normalize_axis(ctx.attr_i64_or("axis", 1)?, data.len()).in_ctx(ctx)?;
        let mut out = data.to_vec();
        out[axis] = unify_dims(data[axis], *channels).ok_or_else(|| {
            ctx.shape_error(format!(
                "bias length {} does not match data dim {} on axis {}",
                channels, data[axis], axis
            ))
        })?;
        Ok(vec![ShapedTypeComponents::new(out)])
    }
}
