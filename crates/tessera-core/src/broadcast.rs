//! Broadcasting shape helpers for shape inference.

use crate::types::Dim;
use crate::{Error, Result};

/// Compute NumPy-style broadcast output shape from two static shapes.
///
/// Implements NumPy broadcasting rules:
/// - Shapes are aligned from the rightmost dimension
/// - Dimensions match if they are equal or one of them is 1
/// - Missing dimensions in shorter shapes are treated as 1
///
/// # Example
///
/// ```text
/// broadcast_shape(&[2, 3, 4], &[3, 4])    -> [2, 3, 4]
/// broadcast_shape(&[8, 1, 6, 1], &[7, 1, 5]) -> [8, 7, 6, 5]
/// ```
pub fn broadcast_shape(a: &[usize], b: &[usize]) -> Result<Vec<usize>> {
    let a: Vec<Dim> = a.iter().map(|&d| Dim::Known(d)).collect();
    let b: Vec<Dim> = b.iter().map(|&d| Dim::Known(d)).collect();
    let dims = broadcast_dims(&a, &b)?;
    // Broadcasting two static shapes never produces a dynamic dim.
    Ok(dims.iter().filter_map(Dim::as_known).collect())
}

/// Broadcast two shapes that may contain dynamic dimensions.
///
/// Per aligned dimension pair:
/// - `n` vs `n` or `1` -> `n`
/// - `?` vs `1` -> `?`
/// - `?` vs `n` (n > 1) -> `n`
/// - `?` vs `?` -> `?`
/// - `n` vs `m` with n != m, neither 1 -> error
pub fn broadcast_dims(a: &[Dim], b: &[Dim]) -> Result<Vec<Dim>> {
    let max_rank = a.len().max(b.len());
    let mut result = Vec::with_capacity(max_rank);

    for i in 0..max_rank {
        let da = if i < max_rank - a.len() {
            Dim::Known(1)
        } else {
            a[i - (max_rank - a.len())]
        };
        let db = if i < max_rank - b.len() {
            Dim::Known(1)
        } else {
            b[i - (max_rank - b.len())]
        };

        let dim = match (da, db) {
            (Dim::Known(x), Dim::Known(y)) if x == y => Dim::Known(x),
            (Dim::Known(1), other) | (other, Dim::Known(1)) => other,
            (Dim::Dynamic, Dim::Known(n)) | (Dim::Known(n), Dim::Dynamic) => Dim::Known(n),
            (Dim::Dynamic, Dim::Dynamic) => Dim::Dynamic,
            (Dim::Known(_), Dim::Known(_)) => {
                return Err(Error::ShapeInference(format!(
                    "Cannot broadcast shapes [{}] and [{}] at dimension {i}",
                    crate::types::join(a),
                    crate::types::join(b)
                )));
            }
        };
        result.push(dim);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    const Q: Dim = Dim::Dynamic;

    fn k(n: usize) -> Dim {
        Dim::Known(n)
    }

    #[test]
    fn test_broadcast_same_shape() {
        assert_eq!(
            broadcast_shape(&[2, 3, 4], &[2, 3, 4]).unwrap(),
            vec![2, 3, 4]
        );
    }

    #[test]
    fn test_broadcast_missing_dims() {
        assert_eq!(broadcast_shape(&[2, 3, 4], &[3, 4]).unwrap(), vec![2, 3, 4]);
    }

    #[test]
    fn test_broadcast_complex() {
        assert_eq!(
            broadcast_shape(&[8, 1, 6, 1], &[7, 1, 5]).unwrap(),
            vec![8, 7, 6, 5]
        );
    }

    #[test]
    fn test_broadcast_incompatible() {
        assert!(broadcast_shape(&[2, 3], &[2, 4]).is_err());
        assert!(broadcast_dims(&[Q, k(3)], &[k(4)]).is_err());
    }

    #[test]
    fn test_broadcast_dynamic() {
        assert_eq!(broadcast_dims(&[Q, k(3)], &[k(1), k(3)]).unwrap(), vec![Q, k(3)]);
        assert_eq!(broadcast_dims(&[Q], &[k(5)]).unwrap(), vec![k(5)]);
        assert_eq!(broadcast_dims(&[Q, Q], &[Q]).unwrap(), vec![Q, Q]);
        assert_eq!(broadcast_dims(&[k(2), Q], &[]).unwrap(), vec![k(2), Q]);
    }
}
