//! Shape manipulation operators.
//!
//! reshape, transpose, expand_dims, squeeze, concatenate, nn.batch_flatten

use tessera_core::{
    Dim, InferShapedType, InferenceCtx, OpPattern, Operator, Result, ShapedTypeComponents,
};

use crate::helpers::{
    InCtx, MAX_RANK, checked_dim_add, checked_dim_mul, dim_product, normalize_axis, unify_dims,
};

macro_rules! injective_operator {
    ($ty:ident, $name:literal) => {
        impl Operator for $ty {
            fn name(&self) -> &str {
                $name
            }

            fn pattern(&self) -> OpPattern {
                OpPattern::Injective
            }

            fn shape_inference(&self) -> Option<&dyn InferShapedType> {
                Some(self)
            }
        }
    };
}

// ── Reshape ──

/// Reshape to `newshape`.
///
/// Special values in `newshape`:
/// - `0`: copy the input dimension at the same position
/// - `-1`: infer from the remaining element count (at most one)
/// - `-2`: copy all remaining input dimensions
pub struct ReshapeOp;

injective_operator!(ReshapeOp, "relay.reshape");

impl InferShapedType for ReshapeOp {
    fn infer_return_shapes(&self, ctx: &InferenceCtx) -> Result<Vec<ShapedTypeComponents>> {
        let input = ctx.operand_dims(0)?;
        let newshape = ctx.attr_ints("newshape")?;

        let mut out: Vec<Dim> = Vec::with_capacity(newshape.len());
        let mut infer_at = None;
        let mut src = 0;

        for &value in &newshape {
            match value {
                v if v > 0 => {
                    out.push(Dim::Known(v as usize));
                    src += 1;
                }
                0 => {
                    let dim = input.get(src).ok_or_else(|| {
                        ctx.shape_error(format!("newshape copies input dim {} of rank {}", src, input.len()))
                    })?;
                    out.push(*dim);
                    src += 1;
                }
                -1 => {
                    if infer_at.is_some() {
                        return Err(ctx.shape_error("newshape may contain at most one -1"));
                    }
                    infer_at = Some(out.len());
                    out.push(Dim::Dynamic);
                    src += 1;
                }
                -2 => {
                    out.extend(input.iter().skip(src).copied());
                    src = input.len();
                }
                other => {
                    return Err(ctx.shape_error(format!("unsupported newshape value {}", other)));
                }
            }
        }

        let input_count = dim_product(input).in_ctx(ctx)?;
        if let Some(index) = infer_at {
            let Dim::Known(total) = input_count else {
                return Err(ctx.shape_error("cannot infer -1 from a dynamic input shape"));
            };
            let mut known = 1;
            for (i, dim) in out.iter().enumerate() {
                if i != index {
                    let dim = dim.as_known().ok_or_else(|| {
                        ctx.shape_error("cannot infer -1 next to a dynamic output dimension")
                    })?;
                    known = checked_dim_mul(known, dim).in_ctx(ctx)?;
                }
            }
            if known == 0 || total % known != 0 {
                return Err(ctx.shape_error(format!(
                    "cannot reshape {} elements into newshape {:?}",
                    total, newshape
                )));
            }
            out[index] = Dim::Known(total / known);
        } else if let (Dim::Known(before), Dim::Known(after)) =
            (input_count, dim_product(&out).in_ctx(ctx)?)
            && before != after
        {
            return Err(ctx.shape_error(format!(
                "cannot reshape {} elements into {} elements",
                before, after
            )));
        }

        Ok(vec![ShapedTypeComponents::new(out)])
    }
}

// ── Transpose ──

/// Permute axes by `axes` (default: reverse all axes).
pub struct TransposeOp;

injective_operator!(TransposeOp, "relay.transpose");

impl InferShapedType for TransposeOp {
    fn infer_return_shapes(&self, ctx: &InferenceCtx) -> Result<Vec<ShapedTypeComponents>> {
        let input = ctx.operand_dims(0)?;
        let rank = input.len();

        let perm: Vec<usize> = if ctx.has_attr("axes") {
            ctx.attr_ints("axes")?
                .into_iter()
                .map(|axis| normalize_axis(axis, rank))
                .collect::<crate::Result<Vec<_>>>()
                .in_ctx(ctx)?
        } else {
            (0..rank).rev().collect()
        };

        let mut seen = vec![false; rank];
        if perm.len() != rank {
            return Err(ctx.shape_error(format!(
                "axes has {} entries for rank {}",
                perm.len(),
                rank
            )));
        }
        for &axis in &perm {
            if std::mem::replace(&mut seen[axis], true) {
                return Err(ctx.shape_error(format!("axes {:?} is not a permutation", perm)));
            }
        }

        let out = perm.iter().map(|&axis| input[axis]).collect();
        Ok(vec![ShapedTypeComponents::new(out)])
    }
}

// ── ExpandDims ──

/// Insert `num_newaxis` (default 1) unit axes at `axis`.
///
/// Negative `axis` counts from `rank + 1`. The result rank may not exceed
/// [`MAX_RANK`].
pub struct ExpandDimsOp;

injective_operator!(ExpandDimsOp, "relay.expand_dims");

impl InferShapedType for ExpandDimsOp {
    fn infer_return_shapes(&self, ctx: &InferenceCtx) -> Result<Vec<ShapedTypeComponents>> {
        let input = ctx.operand_dims(0)?;
        let axis = normalize_axis(ctx.attr_i64("axis")?, input.len() + 1).in_ctx(ctx)?;
        let count = ctx.attr_i64_or("num_newaxis", 1)?;
        if count < 0 {
            return Err(ctx.shape_error(format!("num_newaxis must be non-negative, got {}", count)));
        }
        let count = count as usize;
        if count > MAX_RANK.saturating_sub(input.len()) {
            return Err(ctx.shape_error(format!(
                "expand_dims to rank {} exceeds the maximum rank {}",
                input.len().saturating_add(count),
                MAX_RANK
            )));
        }

        let mut out = input.to_vec();
        out.splice(axis..axis, std::iter::repeat_n(Dim::Known(1), count));
        Ok(vec![ShapedTypeComponents::new(out)])
    }
}

// ── Squeeze ──

/// Remove unit axes.
///
/// With an `axis` list, exactly those axes are removed and each must be 1
/// (a dynamic dim is assumed to be 1). Without it, every known unit axis is
/// removed; a dynamic dim makes the result ambiguous.
pub struct SqueezeOp;

injective_operator!(SqueezeOp, "relay.squeeze");

impl InferShapedType for SqueezeOp {
    fn infer_return_shapes(&self, ctx: &InferenceCtx) -> Result<Vec<ShapedTypeComponents>> {
        let input = ctx.operand_dims(0)?;
        let rank = input.len();

        let remove: Vec<bool> = if ctx.has_attr("axis") {
            let mut remove = vec![false; rank];
            for axis in ctx.attr_ints("axis")? {
                let axis = normalize_axis(axis, rank).in_ctx(ctx)?;
                if let Dim::Known(n) = input[axis]
                    && n != 1
                {
                    return Err(ctx.shape_error(format!(
                        "cannot squeeze axis {} of size {}",
                        axis, n
                    )));
                }
                remove[axis] = true;
            }
            remove
        } else {
            if input.contains(&Dim::Dynamic) {
                return Err(ctx.shape_error(
                    "squeeze without axis is ambiguous for dynamic dimensions",
                ));
            }
            input.iter().map(|&d| d == Dim::Known(1)).collect()
        };

        let out = input
            .iter()
            .zip(&remove)
            .filter(|(_, removed)| !**removed)
            .map(|(dim, _)| *dim)
            .collect();
        Ok(vec![ShapedTypeComponents::new(out)])
    }
}

// ── Concatenate ──

/// Join operands along `axis` (default 0).
///
/// All operands share a rank; non-axis dims are unified and the axis dim is
/// the sum (dynamic if any part is dynamic).
pub struct ConcatenateOp;

injective_operator!(ConcatenateOp, "relay.concatenate");

impl InferShapedType for ConcatenateOp {
    fn infer_return_shapes(&self, ctx: &InferenceCtx) -> Result<Vec<ShapedTypeComponents>> {
        if ctx.operand_count() == 0 {
            return Err(ctx.shape_error("concatenate needs at least one operand"));
        }

        let first = ctx.operand_dims(0)?;
        let rank = first.len();
        let axis = normalize_axis(ctx.attr_i64_or("axis", 0)?, rank).in_ctx(ctx)?;

        let mut out = first.to_vec();
        for index in 1..ctx.operand_count() {
            let dims = ctx.operand_dims(index)?;
            if dims.len() != rank {
                return Err(ctx.shape_error(format!(
                    "operand {} has rank {}, expected {}",
                    index,
                    dims.len(),
                    rank
                )));
            }
            for (i, &dim) in dims.iter().enumerate() {
                out[i] = if i == axis {
                    match (out[i], dim) {
                        (Dim::Known(a), Dim::Known(b)) => {
                            Dim::Known(checked_dim_add(a, b).in_ctx(ctx)?)
                        }
                        _ => Dim::Dynamic,
                    }
                } else {
                    unify_dims(out[i], dim).ok_or_else(|| {
                        ctx.shape_error(format!(
                            "operand {} dim {} is {}, expected {}",
                            index, i, dim, out[i]
                        ))
                    })?
                };
            }
        }

        Ok(vec![ShapedTypeComponents::new(out)])
    }
}

// ── BatchFlatten ──

/// Flatten all but the first axis: `[d0, d1, ...]` to `[d0, d1 * ...]`.
pub struct BatchFlattenOp;

injective_operator!(BatchFlattenOp, "relay.nn.batch_flatten");

impl InferShapedType for BatchFlattenOp {
    fn infer_return_shapes(&self, ctx: &InferenceCtx) -> Result<Vec<ShapedTypeComponents>> {
        let input = ctx.operand_dims(0)?;
        let Some((&batch, rest)) = input.split_first() else {
            return Err(ctx.shape_error("batch_flatten needs rank >= 1"));
        };
        let flat = dim_product(rest).in_ctx(ctx)?;
        Ok(vec![ShapedTypeComponents::new(vec![batch, flat])])
    }
}
