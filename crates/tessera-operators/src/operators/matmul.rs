//! Matrix multiplication operators.

use tessera_core::{
    Dim, InferShapedType, InferenceCtx, OpPattern, Operator, Result, ShapedTypeComponents,
};

use crate::helpers::unify_dims;

/// Fully connected layer: `data [.., K] x weight [N, K] -> [.., N]`.
///
/// The optional `units` attribute names `N` and must agree with the weight.
pub struct DenseOp;

impl Operator for DenseOp {
    fn name(&self) -> &str {
        "relay.nn.dense"
    }

    fn pattern(&self) -> OpPattern {
        OpPattern::OutEWiseFusable
    }

    fn shape_inference(&self) -> Option<&dyn InferShapedType> {
        Some(self)
    }
}

impl InferShapedType for DenseOp {
    fn infer_return_shapes(&self, ctx: &InferenceCtx) -> Result<Vec<ShapedTypeComponents>> {
        let data = ctx.operand_dims(0)?;
        let weight = ctx.operand_dims(1)?;

        let Some((&k_data, batch)) = data.split_last() else {
            return Err(ctx.shape_error("dense data must have rank >= 1"));
        };
        let [n, k_weight] = weight else {
            return Err(ctx.shape_error(format!(
                "dense weight must have rank 2, got {}",
                weight.len()
            )));
        };
        if unify_dims(k_data, *k_weight).is_none() {
            return Err(ctx.shape_error(format!(
                "reduction dims differ: data has {}, weight has {}",
                k_data, k_weight
            )));
        }

        let mut units = *n;
        if ctx.has_attr("units") {
            let requested = ctx.attr_i64("units")?;
            if requested <= 0 {
                return Err(ctx.shape_error(format!("units must be positive, got {}", requested)));
            }
            units = unify_dims(*n, Dim::Known(requested as usize)).ok_or_else(|| {
                ctx.shape_error(format!("units={} but weight has {} rows", requested, n))
            })?;
        }

        let mut out = batch.to_vec();
        out.push(units);
        Ok(vec![ShapedTypeComponents::new(out)])
    }
}

/// Batched matmul with transposed rhs: `[B, M, K] x [B, N, K] -> [B, M, N]`.
///
/// A batch of 1 on either side broadcasts.
pub struct BatchMatmulOp;

impl Operator for BatchMatmulOp {
    fn name(&self) -> &str {
        "relay.nn.batch_matmul"
    }

    fn pattern(&self) -> OpPattern {
        OpPattern::OutEWiseFusable
    }

    fn shape_inference(&self) -> Option<&dyn InferShapedType> {
        Some(self)
    }
}

impl InferShapedType for BatchMatmulOp {
    fn infer_return_shapes(&self, ctx: &InferenceCtx) -> Result<Vec<ShapedTypeComponents>> {
        let lhs = ctx.operand_dims(0)?;
        let rhs = ctx.operand_dims(1)?;
        let ([b1, m, k1], [b2, n, k2]) = (lhs, rhs) else {
            return Err(ctx.shape_error(format!(
                "batch_matmul expects rank 3 operands, got {} and {}",
                lhs.len(),
                rhs.len()
            )));
        };

        if unify_dims(*k1, *k2).is_none() {
            return Err(ctx.shape_error(format!("reduction dims differ: {} vs {}", k1, k2)));
        }
        let batch = match (*b1, *b2) {
            (Dim::Known(1), other) | (other, Dim::Known(1)) => other,
            (a, b) => unify_dims(a, b).ok_or_else(|| {
                ctx.shape_error(format!("batch dims differ: {} vs {}", a, b))
            })?,
        };

        Ok(vec![ShapedTypeComponents::new(vec![batch, *m, *n])])
    }
}
