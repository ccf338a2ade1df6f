//! Helper functions for operator shape rules.

use tessera_core::{Dim, InferenceCtx};

use crate::{Error, Result};

/// Largest rank a shape rule may produce.
pub const MAX_RANK: usize = 64;

fn overflow() -> Error {
    Error::Operator("shape overflows usize".to_string())
}

/// Multiply two extents, failing instead of wrapping.
pub fn checked_dim_mul(a: usize, b: usize) -> Result<usize> {
    a.checked_mul(b).ok_or_else(overflow)
}

/// Add two extents, failing instead of wrapping.
pub fn checked_dim_add(a: usize, b: usize) -> Result<usize> {
    a.checked_add(b).ok_or_else(overflow)
}

/// Attach operand context to operator-level errors.
///
/// `Error::Operator` messages become [`InferenceCtx::shape_error`]s; core
/// errors pass through unchanged.
pub(crate) trait InCtx<T> {
    fn in_ctx(self, ctx: &InferenceCtx) -> tessera_core::Result<T>;
}

impl<T> InCtx<T> for Result<T> {
    fn in_ctx(self, ctx: &InferenceCtx) -> tessera_core::Result<T> {
        self.map_err(|err| match err {
            Error::Core(err) => err,
            Error::Operator(msg) => ctx.shape_error(msg),
        })
    }
}

/// Normalize a possibly negative axis against `rank`.
///
/// Accepts `-rank..rank`.
pub fn normalize_axis(axis: i64, rank: usize) -> Result<usize> {
    let rank_i = rank as i64;
    let normalized = if axis < 0 { axis + rank_i } else { axis };
    if normalized < 0 || normalized >= rank_i {
        return Err(Error::Operator(format!(
            "axis {} out of range for rank {}",
            axis, rank
        )));
    }
    Ok(normalized as usize)
}

/// Unify two dimensions that must describe the same extent.
///
/// A dynamic dimension adopts the other side; two known dimensions must agree.
pub fn unify_dims(a: Dim, b: Dim) -> Option<Dim> {
    match (a, b) {
        (Dim::Known(x), Dim::Known(y)) if x == y => Some(Dim::Known(x)),
        (Dim::Known(_), Dim::Known(_)) => None,
        (Dim::Dynamic, other) | (other, Dim::Dynamic) => Some(other),
    }
}

/// Product of dimensions; dynamic if any factor is dynamic.
pub fn dim_product(dims: &[Dim]) -> Result<Dim> {
    let mut product = 1usize;
    for dim in dims {
        let Some(n) = dim.as_known() else {
            return Ok(Dim::Dynamic);
        };
        product = checked_dim_mul(product, n)?;
    }
    Ok(Dim::Known(product))
}

/// Read a positive integer, rejecting negatives and zero.
fn positive(value: i64, what: &str) -> Result<usize> {
    if value <= 0 {
        return Err(Error::Operator(format!(
            "{} must be positive, got {}",
            what, value
        )));
    }
    Ok(value as usize)
}

/// Expand a one- or two-element list to `[h, w]` (strides, dilation, pool size).
pub fn spatial_pair(values: &[i64], what: &str) -> Result<[usize; 2]> {
    match values {
        [v] => {
            let v = positive(*v, what)?;
            Ok([v, v])
        }
        [h, w] => Ok([positive(*h, what)?, positive(*w, what)?]),
        _ => Err(Error::Operator(format!(
            "{} expects 1 or 2 values, got {}",
            what,
            values.len()
        ))),
    }
}

/// Expand 2D padding to `[top, left, bottom, right]`.
///
/// One value pads every side, two values are `[vertical, horizontal]`.
pub fn padding_2d(values: &[i64]) -> Result<[usize; 4]> {
    if let Some(&v) = values.iter().find(|&&v| v < 0) {
        return Err(Error::Operator(format!("padding must be non-negative, got {}", v)));
    }
    let v: Vec<usize> = values.iter().map(|&v| v as usize).collect();
    match v.as_slice() {
        [p] => Ok([*p, *p, *p, *p]),
        [h, w] => Ok([*h, *w, *h, *w]),
        [t, l, b, r] => Ok([*t, *l, *b, *r]),
        _ => Err(Error::Operator(format!(
            "padding expects 1, 2 or 4 values, got {}",
            values.len()
        ))),
    }
}

/// Output extent of a sliding window along one spatial axis.
///
/// Dynamic inputs stay dynamic. With `ceil_mode` the last partial window
/// counts as an output position.
pub fn window_output_dim(
    input: Dim,
    window: usize,
    stride: usize,
    dilation: usize,
    padding: (usize, usize),
    ceil_mode: bool,
) -> Result<Dim> {
    let Some(input) = input.as_known() else {
        return Ok(Dim::Dynamic);
    };
    if window == 0 {
        return Err(Error::Operator("window size must be positive".to_string()));
    }
    let effective = checked_dim_add(checked_dim_mul(dilation, window - 1)?, 1)?;
    let padded = checked_dim_add(checked_dim_add(input, padding.0)?, padding.1)?;
    if padded < effective {
        return Err(Error::Operator(format!(
            "window of size {} does not fit padded extent {}",
            effective, padded
        )));
    }
    let span = padded - effective;
    let steps = if ceil_mode {
        span.div_ceil(stride)
    } else {
        span / stride
    };
    Ok(Dim::Known(steps + 1))
}
