//! Operator fusion pass.
//!
//! Partitions the dialect operations of a fully typed function into fusion
//! groups and records the group on each operation as a `fusion_group`
//! attribute. Later lowering emits one loop nest per group.

use std::collections::HashMap;

use tessera_core::{
    AttributeValue, Error, Function, OpId, OpPattern, OperatorRegistry, Pass, Result, Stage,
};
use tessera_operators::RELAY_DIALECT;

/// Attribute holding an operation's fusion group.
pub const FUSION_GROUP_ATTR: &str = "fusion_group";

/// Greedy producer/consumer fusion over a single function.
///
/// Operations are visited in program order. An operation joins the group of
/// its first operand's producer when that producer is in the same dialect,
/// its result feeds only this operation and the operation may follow the
/// group's anchor; otherwise it opens a new group. The anchor is the most
/// restrictive pattern among the group's members, so a `dense` group keeps
/// rejecting injective consumers after an elementwise epilogue. Unregistered
/// operations are `Opaque`.
pub struct OpFusionPass {
    dialect: String,
}

impl OpFusionPass {
    pub fn new() -> Self {
        Self::for_dialect(RELAY_DIALECT)
    }

    pub fn for_dialect(dialect: impl Into<String>) -> Self {
        Self {
            dialect: dialect.into(),
        }
    }

    /// Fail unless every argument and result type is fully static.
    fn check_static(&self, function: &Function) -> Result<()> {
        for &arg in function.arguments() {
            let ty = function.value_type(arg)?;
            if !ty.is_fully_static() {
                return Err(Error::Pass(format!(
                    "@{}: argument %{} has unresolved type {}",
                    function.name(),
                    arg.index(),
                    ty
                )));
            }
        }
        for (_, op) in function.ops() {
            for &result in &op.results {
                let ty = function.value_type(result)?;
                if !ty.is_fully_static() {
                    return Err(Error::Pass(format!(
                        "@{}: result %{} of {} has unresolved type {}",
                        function.name(),
                        result.index(),
                        op.describe(),
                        ty
                    )));
                }
            }
        }
        Ok(())
    }

    /// Group of the first operand's producer, if this operation may join it.
    fn fusable_group(
        &self,
        function: &Function,
        op_id: OpId,
        pattern: OpPattern,
        groups: &HashMap<OpId, usize>,
        anchors: &[OpPattern],
    ) -> Result<Option<usize>> {
        let op = function.op(op_id)?;
        let Some(&first) = op.operands.first() else {
            return Ok(None);
        };
        let Some(producer) = function.producer(first)? else {
            return Ok(None);
        };
        let Some(&group) = groups.get(&producer) else {
            return Ok(None);
        };
        if function.consumers(first)?.len() != 1 {
            return Ok(None);
        }
        Ok(can_fuse(anchors[group], pattern).then_some(group))
    }
}

/// Whether a consumer with pattern `consumer` may join a group anchored at
/// `anchor`.
fn can_fuse(anchor: OpPattern, consumer: OpPattern) -> bool {
    if consumer > OpPattern::Injective {
        return false;
    }
    anchor <= OpPattern::Injective
        || (anchor == OpPattern::OutEWiseFusable && consumer <= OpPattern::Broadcast)
}

impl Pass for OpFusionPass {
    fn name(&self) -> &str {
        "op_fusion"
    }

    fn stage(&self) -> Stage {
        Stage::Fusion
    }

    fn run_on_function(&self, function: &mut Function, registry: &OperatorRegistry) -> Result<bool> {
        self.check_static(function)?;

        let mut groups: HashMap<OpId, usize> = HashMap::new();
        // most restrictive pattern per group, indexed by group
        let mut anchors: Vec<OpPattern> = Vec::new();
        let order = function.op_ids().to_vec();

        for &op_id in &order {
            let op = function.op(op_id)?;
            if op.is_return() || op.name.namespace() != self.dialect {
                continue;
            }
            let pattern = registry.pattern(op.name.as_str());

            let group = match self.fusable_group(function, op_id, pattern, &groups, &anchors)? {
                Some(group) => {
                    anchors[group] = anchors[group].max(pattern);
                    group
                }
                None => {
                    anchors.push(pattern);
                    anchors.len() - 1
                }
            };
            groups.insert(op_id, group);
        }

        let mut changed = false;
        for op_id in order {
            let Some(&group) = groups.get(&op_id) else {
                continue;
            };
            let op = function.op_mut(op_id)?;
            let value = AttributeValue::Int(group as i64);
            if op.get_attribute(FUSION_GROUP_ATTR) != Some(&value) {
                tracing::trace!(op = %op.name, group, "assigned fusion group");
                op.set_attribute(FUSION_GROUP_ATTR, value);
                changed = true;
            }
        }

        tracing::debug!(function = function.name(), groups = anchors.len(), changed, "fusion done");
        Ok(changed)
    }
}

impl Default for OpFusionPass {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::{Dim, ElementType, FunctionBuilder, Type, ValueId};
    use tessera_operators::relay_operator_registry;

    fn f32_tensor(dims: &[usize]) -> Type {
        Type::tensor(ElementType::F32, dims.iter().map(|&d| Dim::Known(d)).collect())
    }

    fn group_of(function: &Function, value: ValueId) -> Option<i64> {
        let producer = function.producer(value).unwrap()?;
        match function.op(producer).unwrap().get_attribute(FUSION_GROUP_ATTR) {
            Some(AttributeValue::Int(group)) => Some(*group),
            _ => None,
        }
    }

    #[test]
    fn test_can_fuse() {
        assert!(can_fuse(OpPattern::ElemWise, OpPattern::Injective));
        assert!(can_fuse(OpPattern::OutEWiseFusable, OpPattern::Broadcast));
        assert!(!can_fuse(OpPattern::OutEWiseFusable, OpPattern::Injective));
        assert!(!can_fuse(OpPattern::ElemWise, OpPattern::CommReduce));
        assert!(!can_fuse(OpPattern::CommReduce, OpPattern::ElemWise));
        assert!(!can_fuse(OpPattern::Opaque, OpPattern::ElemWise));
    }

    #[test]
    fn test_dense_bias_relu_chain_fuses() {
        let mut builder = FunctionBuilder::new("main");
        let x = builder.arg(f32_tensor(&[1, 8]));
        let w = builder.arg(f32_tensor(&[4, 8]));
        let b = builder.arg(f32_tensor(&[4]));
        let dense = builder.op("relay.nn.dense").operands(&[x, w]).result(f32_tensor(&[1, 4])).build().unwrap()[0];
        let biased = builder.op("relay.nn.bias_add").operands(&[dense, b]).attr("axis", 1i64).result(f32_tensor(&[1, 4])).build().unwrap()[0];
        let relu = builder.op("relay.nn.relu").operand(biased).result(f32_tensor(&[1, 4])).build().unwrap()[0];
        let sum = builder.op("relay.sum").operand(relu).result(f32_tensor(&[])).build().unwrap()[0];
        builder.ret(&[sum]).unwrap();
        let mut function = builder.finish().unwrap();

        let registry = relay_operator_registry();
        assert!(OpFusionPass::new().run_on_function(&mut function, &registry).unwrap());

        assert_eq!(group_of(&function, dense), Some(0));
        assert_eq!(group_of(&function, biased), Some(0));
        assert_eq!(group_of(&function, relu), Some(0));
        assert_eq!(group_of(&function, sum), Some(1));

        // Second run changes nothing
        assert!(!OpFusionPass::new().run_on_function(&mut function, &registry).unwrap());
    }

    #[test]
    fn test_anchor_pattern_limits_later_members() {
        let mut builder = FunctionBuilder::new("main");
        let x = builder.arg(f32_tensor(&[1, 8]));
        let w = builder.arg(f32_tensor(&[4, 8]));
        let b = builder.arg(f32_tensor(&[4]));
        let dense = builder.op("relay.nn.dense").operands(&[x, w]).result(f32_tensor(&[1, 4])).build().unwrap()[0];
        let biased = builder.op("relay.nn.bias_add").operands(&[dense, b]).attr("axis", 1i64).result(f32_tensor(&[1, 4])).build().unwrap()[0];
        let reshaped = builder.op("relay.reshape").operand(biased).attr("newshape", vec![4i64]).result(f32_tensor(&[4])).build().unwrap()[0];
        let relu = builder.op("relay.nn.relu").operand(reshaped).result(f32_tensor(&[4])).build().unwrap()[0];
        builder.ret(&[relu]).unwrap();
        let mut function = builder.finish().unwrap();

        OpFusionPass::new()
            .run_on_function(&mut function, &relay_operator_registry())
            .unwrap();

        assert_eq!(group_of(&function, dense), Some(0));
        assert_eq!(group_of(&function, biased), Some(0));
        // bias_add is broadcast but the group is still anchored at dense
        assert_eq!(group_of(&function, reshaped), Some(1));
        assert_eq!(group_of(&function, relu), Some(1));
    }

    #[test]
    fn test_shared_result_breaks_group() {
        let mut builder = FunctionBuilder::new("main");
        let x = builder.arg(f32_tensor(&[4]));
        let e = builder.op("relay.exp").operand(x).result(f32_tensor(&[4])).build().unwrap()[0];
        let n = builder.op("relay.negative").operand(e).result(f32_tensor(&[4])).build().unwrap()[0];
        let s = builder.op("relay.add").operands(&[e, n]).result(f32_tensor(&[4])).build().unwrap()[0];
        builder.ret(&[s]).unwrap();
        let mut function = builder.finish().unwrap();

        OpFusionPass::new()
            .run_on_function(&mut function, &relay_operator_registry())
            .unwrap();

        // exp feeds two operations so neither joins its group
        assert_eq!(group_of(&function, e), Some(0));
        assert_eq!(group_of(&function, n), Some(1));
        // add's first operand is exp's result, which is shared
        assert_eq!(group_of(&function, s), Some(2));
    }

    #[test]
    fn test_foreign_ops_are_not_grouped() {
        let mut builder = FunctionBuilder::new("main");
        let x = builder.arg(f32_tensor(&[4]));
        let y = builder.op("test.opaque").operand(x).result(f32_tensor(&[4])).build().unwrap()[0];
        let z = builder.op("relay.exp").operand(y).result(f32_tensor(&[4])).build().unwrap()[0];
        builder.ret(&[z]).unwrap();
        let mut function = builder.finish().unwrap();

        OpFusionPass::new()
            .run_on_function(&mut function, &relay_operator_registry())
            .unwrap();

        assert_eq!(group_of(&function, y), None);
        assert_eq!(group_of(&function, z), Some(0));
    }

    #[test]
    fn test_requires_static_types() {
        let mut builder = FunctionBuilder::new("main");
        let x = builder.arg(f32_tensor(&[4]));
        let y = builder
            .op("relay.exp")
            .operand(x)
            .result(Type::tensor(ElementType::F32, vec![Dim::Dynamic]))
            .build()
            .unwrap()[0];
        builder.ret(&[y]).unwrap();
        let mut function = builder.finish().unwrap();

        let err = OpFusionPass::new()
            .run_on_function(&mut function, &relay_operator_registry())
            .unwrap_err();
        assert!(matches!(err, Error::Pass(_)));
        assert!(err.to_string().contains("relay.exp"));
    }
}
