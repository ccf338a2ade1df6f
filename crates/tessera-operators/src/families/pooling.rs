//! 2D pooling operator family (NCHW).
//!
//! Covers: nn.max_pool2d, nn.avg_pool2d, nn.global_avg_pool2d

use tessera_core::{
    Dim, InferShapedType, InferenceCtx, OpPattern, Operator, Result, ShapedTypeComponents,
};

use crate::helpers::{InCtx, padding_2d, spatial_pair, window_output_dim};

/// Windowed 2D pooling.
///
/// Attributes: `pool_size` (required), `strides` (default 1),
/// `padding` (default 0; 1, 2 or 4 values), `ceil_mode` (default false).
pub struct Pool2dOp {
    name: &'static str,
}

impl Pool2dOp {
    pub fn max_pool2d() -> Self {
        Self {
            name: "relay.nn.max_pool2d",
        }
    }

    pub fn avg_pool2d() -> Self {
        Self {
            name: "relay.nn.avg_pool2d",
        }
    }
}

impl Operator for Pool2dOp {
    fn name(&self) -> &str {
        self.name
    }

    fn pattern(&self) -> OpPattern {
        OpPattern::OutEWiseFusable
    }

    fn shape_inference(&self) -> Option<&dyn InferShapedType> {
        Some(self)
    }
}

impl InferShapedType for Pool2dOp {
    fn infer_return_shapes(&self, ctx: &InferenceCtx) -> Result<Vec<ShapedTypeComponents>> {
        let data = ctx.operand_dims(0)?;
        let [n, c, h, w] = data else {
            return Err(ctx.shape_error(format!(
                "expected NCHW input of rank 4, got rank {}",
                data.len()
            )));
        };

        let pool = spatial_pair(&ctx.attr_ints("pool_size")?, "pool_size").in_ctx(ctx)?;
        let strides =
            spatial_pair(&ctx.attr_ints_or("strides", vec![1])?, "strides").in_ctx(ctx)?;
        let pad = padding_2d(&ctx.attr_ints_or("padding", vec![0])?).in_ctx(ctx)?;
        let ceil_mode = ctx.attr_bool_or("ceil_mode", false)?;

        let out_h =
            window_output_dim(*h, pool[0], strides[0], 1, (pad[0], pad[2]), ceil_mode).in_ctx(ctx)?;
        let out_w =
            window_output_dim(*w, pool[1], strides[1], 1, (pad[1], pad[3]), ceil_mode).in_ctx(ctx)?;

        Ok(vec![ShapedTypeComponents::new(vec![*n, *c, out_h, out_w])])
    }
}

/// Global average pooling: `[N, C, H, W]` to `[N, C, 1, 1]`.
pub struct GlobalAvgPool2dOp;

impl Operator for GlobalAvgPool2dOp {
    fn name(&self) -> &str {
        "relay.nn.global_avg_pool2d"
    }

    fn pattern(&self) -> OpPattern {
        OpPattern::OutEWiseFusable
    }

    fn shape_inference(&self) -> Option<&dyn InferShapedType> {
        Some(self)
    }
}

impl InferShapedType for GlobalAvgPool2dOp {
    fn infer_return_shapes(&self, ctx: &InferenceCtx) -> Result<Vec<ShapedTypeComponents>> {
        let data = ctx.operand_dims(0)?;
        let [n, c, _, _] = data else {
            return Err(ctx.shape_error(format!(
                "expected NCHW input of rank 4, got rank {}",
                data.len()
            )));
        };
        Ok(vec![ShapedTypeComponents::new(vec![
            *n,
            *c,
            Dim::Known(1),
            Dim::Known(1),
        ])])
    }
}
