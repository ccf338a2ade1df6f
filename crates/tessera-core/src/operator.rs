//! Operator trait and the shape-inference capability.

use crate::Result;
use crate::context::InferenceCtx;
use crate::types::ShapedTypeComponents;

/// Fusion classification of an operator.
///
/// Ordered from most to least fusable; fusion passes compare patterns with
/// `<=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OpPattern {
    /// One-to-one elementwise mapping (`relu`, `exp`).
    ElemWise,

    /// Elementwise with broadcasting (`add`, `bias_add`).
    Broadcast,

    /// Output index maps to a single input index (`reshape`, `transpose`).
    Injective,

    /// Commutative reduction (`sum`, `max`).
    CommReduce,

    /// Complex op whose output can absorb elementwise consumers (`conv2d`, `dense`).
    OutEWiseFusable,

    /// Never fused.
    Opaque,
}

/// Shape-inference capability.
///
/// Given the current operand types and the operation's attributes, compute
/// one `ShapedTypeComponents` per result. Must be pure: the same operand
/// types and attributes always yield the same answer.
///
/// Returning an error means the shape could not be inferred, either because
/// a needed dimension is dynamic or because the attributes are malformed.
/// Use [`InferenceCtx::shape_error`] to build errors with operand context.
pub trait InferShapedType {
    fn infer_return_shapes(&self, ctx: &InferenceCtx) -> Result<Vec<ShapedTypeComponents>>;
}

/// Trait for implementing dialect operators.
///
/// # Example
///
/// ```ignore
/// struct ExpOp;
///
/// impl Operator for ExpOp {
///     fn name(&self) -> &str {
///         "relay.exp"
///     }
///
///     fn pattern(&self) -> OpPattern {
///         OpPattern::ElemWise
///     }
///
///     fn shape_inference(&self) -> Option<&dyn InferShapedType> {
///         Some(self)
///     }
/// }
///
/// impl InferShapedType for ExpOp {
///     fn infer_return_shapes(&self, ctx: &InferenceCtx) -> Result<Vec<ShapedTypeComponents>> {
///         Ok(vec![ShapedTypeComponents::new(ctx.operand_dims(0)?.to_vec())])
///     }
/// }
/// ```
pub trait Operator: Send + Sync {
    /// Fully qualified operator name (e.g., "relay.nn.conv2d").
    fn name(&self) -> &str;

    /// Fusion classification. Defaults to `Opaque`.
    fn pattern(&self) -> OpPattern {
        OpPattern::Opaque
    }

    /// The shape-inference capability, if this operator has one.
    ///
    /// Operators returning `None` are left untouched by shape inference.
    fn shape_inference(&self) -> Option<&dyn InferShapedType> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Dim;

    struct OpaqueOp;

    impl Operator for OpaqueOp {
        fn name(&self) -> &str {
            "test.opaque"
        }
    }

    struct FixedShapeOp;

    impl Operator for FixedShapeOp {
        fn name(&self) -> &str {
            "test.fixed"
        }

        fn pattern(&self) -> OpPattern {
            OpPattern::Injective
        }

        fn shape_inference(&self) -> Option<&dyn InferShapedType> {
            Some(self)
        }
    }

    impl InferShapedType for FixedShapeOp {
        fn infer_return_shapes(&self, _ctx: &InferenceCtx) -> Result<Vec<ShapedTypeComponents>> {
            Ok(vec![ShapedTypeComponents::new(vec![Dim::Known(3)])])
        }
    }

    #[test]
    fn test_operator_defaults() {
        let op: Box<dyn Operator> = Box::new(OpaqueOp);
        assert_eq!(op.name(), "test.opaque");
        assert_eq!(op.pattern(), OpPattern::Opaque);
        assert!(op.shape_inference().is_none());
    }

    #[test]
    fn test_capability_query() {
        let op: Box<dyn Operator> = Box::new(FixedShapeOp);
        assert_eq!(op.pattern(), OpPattern::Injective);
        assert!(op.shape_inference().is_some());
    }

    #[test]
    fn test_pattern_ordering() {
        assert!(OpPattern::ElemWise < OpPattern::Broadcast);
        assert!(OpPattern::Broadcast < OpPattern::Injective);
        assert!(OpPattern::Injective < OpPattern::CommReduce);
        assert!(OpPattern::CommReduce < OpPattern::OutEWiseFusable);
        assert!(OpPattern::OutEWiseFusable < OpPattern::Opaque);
    }
}
