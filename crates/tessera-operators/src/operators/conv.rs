//! 2D convolution.

use tessera_core::{
    Dim, InferShapedType, InferenceCtx, OpPattern, Operator, Result, ShapedTypeComponents,
};

use crate::helpers::{InCtx, checked_dim_mul, padding_2d, spatial_pair, window_output_dim};

/// `nn.conv2d(data, weight)` in NCHW / OIHW layout.
///
/// Attributes: `strides`, `dilation` (default 1), `padding` (default 0;
/// 1, 2 or 4 values), `groups` (default 1), optional `channels` and
/// `kernel_size` which must agree with the weight.
pub struct Conv2dOp;

impl Operator for Conv2dOp {
    fn name(&self) -> &str {
        "relay.nn.conv2d"
    }

    fn pattern(&self) -> OpPattern {
        OpPattern::OutEWiseFusable
    }

    fn shape_inference(&self) -> Option<&dyn InferShapedType> {
        Some(self)
    }
}

impl InferShapedType for Conv2dOp {
    fn infer_return_shapes(&self, ctx: &InferenceCtx) -> Result<Vec<ShapedTypeComponents>> {
        let data = ctx.operand_dims(0)?;
        let weight = ctx.operand_dims(1)?;
        let ([n, c, h, w], [o, i, kh, kw]) = (data, weight) else {
            return Err(ctx.shape_error(format!(
                "conv2d expects rank 4 data and weight, got {} and {}",
                data.len(),
                weight.len()
            )));
        };

        let groups = ctx.attr_i64_or("groups", 1)?;
        if groups <= 0 {
            return Err(ctx.shape_error(format!("groups must be positive, got {}", groups)));
        }
        let groups = groups as usize;
        if let (Dim::Known(c), Dim::Known(i)) = (c, i)
            && *c != checked_dim_mul(*i, groups).in_ctx(ctx)?
        {
            return Err(ctx.shape_error(format!(
                "input channels {} do not match weight channels {} x groups {}",
                c, i, groups
            )));
        }

        if ctx.has_attr("channels") {
            let channels = ctx.attr_i64("channels")?;
            if let Dim::Known(o) = o
                && *o as i64 != channels
            {
                return Err(ctx.shape_error(format!(
                    "channels={} but weight has {} output channels",
                    channels, o
                )));
            }
        }

        let (Dim::Known(kh), Dim::Known(kw)) = (kh, kw) else {
            return Err(ctx.shape_error("kernel spatial dims must be static"));
        };
        if ctx.has_attr("kernel_size") {
            let kernel = spatial_pair(&ctx.attr_ints("kernel_size")?, "kernel_size").in_ctx(ctx)?;
            if kernel != [*kh, *kw] {
                return Err(ctx.shape_error(format!(
                    "kernel_size {:?} does not match weight {}x{}",
                    kernel, kh, kw
                )));
            }
        }

        let strides = spatial_pair(&ctx.attr_ints_or("strides", vec![1])?, "strides").in_ctx(ctx)?;
        let dilation =
            spatial_pair(&ctx.attr_ints_or("dilation", vec![1])?, "dilation").in_ctx(ctx)?;
        let pad = padding_2d(&ctx.attr_ints_or("padding", vec![0])?).in_ctx(ctx)?;

        let out_h = window_output_dim(*h, *kh, strides[0], dilation[0], (pad[0], pad[2]), false)
            .in_ctx(ctx)?;
        let out_w = window_output_dim(*w, *kw, strides[1], dilation[1], (pad[1], pad[3]), false)
            .in_ctx(ctx)?;

        Ok(vec![ShapedTypeComponents::new(vec![*n, *o, out_h, out_w])])
    }
}
