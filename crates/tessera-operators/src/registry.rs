//! Relay operator registry.

use tessera_core::{Operator, OperatorRegistry};

use crate::families::{
    BinaryElementwiseOp, GlobalAvgPool2dOp, Pool2dOp, ReductionOp, UnaryElementwiseOp,
};
use crate::operators::{
    BatchFlattenOp, BatchMatmulOp, BiasAddOp, CastOp, ConcatenateOp, ConstantOp, Conv2dOp,
    DenseOp, ExpandDimsOp, ReshapeOp, SoftmaxOp, SqueezeOp, TransposeOp,
};

/// Namespace of every operator in this crate.
pub const RELAY_DIALECT: &str = "relay";

/// Returns an operator registry pre-populated with the relay dialect.
///
/// Custom operators can be added to the returned registry via
/// `registry.register(name, operator)`.
pub fn relay_operator_registry() -> OperatorRegistry {
    let mut registry = OperatorRegistry::new();

    // Families register under their own names
    for op in UnaryElementwiseOp::all() {
        let name = op.name().to_string();
        registry.register(&name, op);
    }
    for op in BinaryElementwiseOp::all() {
        let name = op.name().to_string();
        registry.register(&name, op);
    }
    for op in ReductionOp::all() {
        let name = op.name().to_string();
        registry.register(&name, op);
    }
    registry.register("relay.nn.max_pool2d", Pool2dOp::max_pool2d());
    registry.register("relay.nn.avg_pool2d", Pool2dOp::avg_pool2d());
    registry.register("relay.nn.global_avg_pool2d", GlobalAvgPool2dOp);

    // Shape manipulation
    registry.register("relay.reshape", ReshapeOp);
    registry.register("relay.transpose", TransposeOp);
    registry.register("relay.expand_dims", ExpandDimsOp);
    registry.register("relay.squeeze", SqueezeOp);
    registry.register("relay.concatenate", ConcatenateOp);
    registry.register("relay.nn.batch_flatten", BatchFlattenOp);

    // Neural network
    registry.register("relay.nn.bias_add", BiasAddOp);
    registry.register("relay.nn.softmax", SoftmaxOp);
    registry.register("relay.nn.dense", DenseOp);
    registry.register("relay.nn.batch_matmul", BatchMatmulOp);
    registry.register("relay.nn.conv2d", Conv2dOp);

    // Misc
    registry.register("relay.cast", CastOp);
    registry.register("relay.constant", ConstantOp);

    registry
}
