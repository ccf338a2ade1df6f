//! Reduction operator family.
//!
//! Covers: sum, mean, max

use std::collections::BTreeSet;

use tessera_core::{InferShapedType, InferenceCtx, OpPattern, Operator, Result, ShapedTypeComponents};

use crate::helpers::{InCtx, normalize_axis};

/// Reduction operator family.
///
/// All reductions share the same shape rule:
/// - `axis`: axes to reduce (default: all axes)
/// - `keepdims`: keep reduced axes as size 1 (default: false)
/// - `exclude`: reduce every axis *except* the listed ones (default: false)
pub struct ReductionOp {
    name: &'static str,
}

impl ReductionOp {
    pub fn sum() -> Self {
        Self { name: "relay.sum" }
    }

    pub fn mean() -> Self {
        Self { name: "relay.mean" }
    }

    pub fn max() -> Self {
        Self { name: "relay.max" }
    }

    /// All members of the family.
    pub fn all() -> Vec<Self> {
        vec![Self::sum(), Self::mean(), Self::max()]
    }
}

impl Operator for ReductionOp {
    fn name(&self) -> &str {
        self.name
    }

    fn pattern(&self) -> OpPattern {
        OpPattern::CommReduce
    }

    fn shape_inference(&self) -> Option<&dyn InferShapedType> {
        Some(self)
    }
}

impl InferShapedType for ReductionOp {
    fn infer_return_shapes(&self, ctx: &InferenceCtx) -> Result<Vec<ShapedTypeComponents>> {
        let dims = ctx.operand_dims(0)?;
        let rank = dims.len();
        let keepdims = ctx.attr_bool_or("keepdims", false)?;
        let exclude = ctx.attr_bool_or("exclude", false)?;

        let listed: BTreeSet<usize> = if ctx.has_attr("axis") {
            ctx.attr_ints("axis")?
                .into_iter()
                .map(|axis| normalize_axis(axis, rank))
                .collect::<crate::Result<BTreeSet<usize>>>()
                .in_ctx(ctx)?
        } else {
            (0..rank).collect()
        };

        let reduced = |i: usize| listed.contains(&i) != exclude;

        let mut out = Vec::with_capacity(rank);
        for (i, &dim) in dims.iter().enumerate() {
            if !reduced(i) {
                out.push(dim);
            } else if keepdims {
                out.push(tessera_core::Dim::Known(1));
            }
        }
        Ok(vec![ShapedTypeComponents::new(out)])
    }
}
