//! Constant tensors.

use tessera_core::Operator;

/// `relay.constant`: a tensor whose type is fixed by the importer.
///
/// Has no shape-inference capability; its declared result type (possibly
/// partially dynamic) is what consumers see.
pub struct ConstantOp;

impl Operator for ConstantOp {
    fn name(&self) -> &str {
        "relay.constant"
    }
}
