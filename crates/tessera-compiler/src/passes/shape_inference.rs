//! Shape inference pass.
//!
//! Single forward walk in program order that calls each operator's
//! `InferShapedType` capability and rewrites result types in place, then
//! reconciles the function signature with the values actually returned.

use tessera_core::{
    Error, Function, FunctionType, InferShapedType, InferenceCtx, OpId, OperatorRegistry, Pass,
    Result, Stage, Type,
};
use tessera_operators::RELAY_DIALECT;

/// Pass that infers result types for every operation of one dialect.
///
/// Operations are visited once, in definition order; because the IR is in
/// SSA form every operand is resolved before its users, so no fixpoint is
/// needed. Operations are skipped when:
/// - their namespace is not the configured dialect
/// - their operator is unregistered or has no shape-inference capability
///
/// Inferred dimensions replace the result type's dimensions; the element type
/// is kept unless the operator returns one explicitly (casts). A result
/// declared as a scalar stays a scalar when the inferred rank is 0, and
/// becomes a tensor otherwise.
pub struct ShapeInferencePass {
    dialect: String,
}

impl ShapeInferencePass {
    /// Create a shape inference pass for the `relay` dialect.
    pub fn new() -> Self {
        Self::for_dialect(RELAY_DIALECT)
    }

    /// Create a shape inference pass responsible for another dialect.
    pub fn for_dialect(dialect: impl Into<String>) -> Self {
        Self {
            dialect: dialect.into(),
        }
    }

    pub fn dialect(&self) -> &str {
        &self.dialect
    }

    /// Infer and write back the result types of a single operation.
    fn infer_op(
        &self,
        function: &mut Function,
        op_id: OpId,
        capability: &dyn InferShapedType,
    ) -> Result<bool> {
        let op = function.op(op_id)?;
        let ctx = InferenceCtx::new(op, function);

        let components = capability.infer_return_shapes(&ctx).map_err(|e| match e {
            Error::ShapeInference(_) => e,
            other => Error::ShapeInference(format!("{}: {}", op.describe(), other)),
        })?;

        if components.len() != op.results.len() {
            return Err(Error::ShapeInference(format!(
                "{} inferred {} result types but has {} results",
                op.describe(),
                components.len(),
                op.results.len()
            )));
        }

        let name = op.name.clone();
        let mut updates = Vec::with_capacity(components.len());
        for (&result, component) in op.results.iter().zip(components) {
            let old = function.value_type(result)?;
            let element = component.element.unwrap_or_else(|| old.element_type());
            let new = match old {
                Type::Scalar(_) if component.dims.is_empty() => Type::Scalar(element),
                _ => Type::tensor(element, component.dims),
            };
            if *old != new {
                updates.push((result, new));
            }
        }

        let changed = !updates.is_empty();
        for (result, ty) in updates {
            tracing::trace!(op = %name, value = result.index(), ty = %ty, "inferred result type");
            function.set_value_type(result, ty)?;
        }
        Ok(changed)
    }
}

impl Pass for ShapeInferencePass {
    fn name(&self) -> &str {
        "shape_inference"
    }

    fn stage(&self) -> Stage {
        Stage::Inference
    }

    fn run_on_function(&self, function: &mut Function, registry: &OperatorRegistry) -> Result<bool> {
        // Rejects zero or multiple returns before anything is rewritten.
        let terminator = function.terminator()?;

        let mut changed = false;
        let mut inferred = 0usize;
        let order = function.op_ids().to_vec();

        for op_id in order {
            if op_id == terminator {
                continue;
            }
            let op = function.op(op_id)?;

            if op.name.namespace() != self.dialect {
                tracing::trace!(op = %op.name, "skipping operation outside dialect");
                continue;
            }
            let Some(capability) = registry.shape_inference(op.name.as_str()) else {
                tracing::trace!(op = %op.name, "skipping operation without shape inference");
                continue;
            };

            changed |= self.infer_op(function, op_id, capability)?;
            inferred += 1;
        }

        let returned = function.op(terminator)?.operands.clone();
        let outputs = returned
            .iter()
            .map(|&id| function.value_type(id).cloned())
            .collect::<Result<Vec<_>>>()?;
        let signature = FunctionType::new(function.argument_types(), outputs);
        if *function.signature() != signature {
            tracing::debug!(function = function.name(), %signature, "updated signature");
            function.set_signature(signature);
            changed = true;
        }

        tracing::debug!(function = function.name(), inferred, changed, "shape inference done");
        Ok(changed)
    }
}

impl Default for ShapeInferencePass {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::{
        Dim, ElementType, FunctionBuilder, OpPattern, Operator, ShapedTypeComponents,
    };

    // Mock operator that doubles the leading dimension
    struct MockDoubleOperator;

    impl Operator for MockDoubleOperator {
        fn name(&self) -> &str {
            "mock.double"
        }

        fn pattern(&self) -> OpPattern {
            OpPattern::Injective
        }

        fn shape_inference(&self) -> Option<&dyn InferShapedType> {
            Some(self)
        }
    }

    impl InferShapedType for MockDoubleOperator {
        fn infer_return_shapes(&self, ctx: &InferenceCtx) -> Result<Vec<ShapedTypeComponents>> {
            let mut dims = ctx.operand_dims(0)?.to_vec();
            if let Some(Dim::Known(n)) = dims.first_mut() {
                *n *= 2;
            }
            Ok(vec![ShapedTypeComponents::new(dims)])
        }
    }

    // Mock operator that claims two results
    struct MockTwoResults;

    impl Operator for MockTwoResults {
        fn name(&self) -> &str {
            "mock.pair"
        }

        fn shape_inference(&self) -> Option<&dyn InferShapedType> {
            Some(self)
        }
    }

    impl InferShapedType for MockTwoResults {
        fn infer_return_shapes(&self, _ctx: &InferenceCtx) -> Result<Vec<ShapedTypeComponents>> {
            Ok(vec![
                ShapedTypeComponents::from_static(&[1]),
                ShapedTypeComponents::from_static(&[1]),
            ])
        }
    }

    fn mock_registry() -> OperatorRegistry {
        let mut registry = OperatorRegistry::new();
        registry.register("mock.double", MockDoubleOperator);
        registry.register("mock.pair", MockTwoResults);
        registry
    }

    fn unknown(element: ElementType) -> Type {
        Type::tensor(element, vec![Dim::Dynamic])
    }

    #[test]
    fn test_shape_inference_propagates_through_chain() {
        let mut builder = FunctionBuilder::new("main");
        let x = builder.arg(Type::tensor(ElementType::F32, vec![Dim::Known(3)]));
        let a = builder.op("mock.double").operand(x).result(unknown(ElementType::F32)).build().unwrap()[0];
        let b = builder.op("mock.double").operand(a).result(unknown(ElementType::F32)).build().unwrap()[0];
        builder.ret(&[b]).unwrap();
        let mut function = builder.finish().unwrap();

        let pass = ShapeInferencePass::for_dialect("mock");
        assert!(pass.run_on_function(&mut function, &mock_registry()).unwrap());

        let expected = Type::tensor(ElementType::F32, vec![Dim::Known(12)]);
        assert_eq!(function.value_type(b).unwrap(), &expected);
        assert_eq!(function.signature().outputs, vec![expected]);
    }

    #[test]
    fn test_shape_inference_keeps_element_type() {
        let mut builder = FunctionBuilder::new("main");
        let x = builder.arg(Type::tensor(ElementType::F32, vec![Dim::Known(2)]));
        let y = builder.op("mock.double").operand(x).result(unknown(ElementType::I8)).build().unwrap()[0];
        builder.ret(&[y]).unwrap();
        let mut function = builder.finish().unwrap();

        ShapeInferencePass::for_dialect("mock")
            .run_on_function(&mut function, &mock_registry())
            .unwrap();

        assert_eq!(
            function.value_type(y).unwrap(),
            &Type::tensor(ElementType::I8, vec![Dim::Known(4)])
        );
    }

    #[test]
    fn test_shape_inference_result_count_mismatch() {
        let mut builder = FunctionBuilder::new("main");
        let x = builder.arg(Type::tensor(ElementType::F32, vec![Dim::Known(2)]));
        let y = builder.op("mock.pair").operand(x).result(unknown(ElementType::F32)).build().unwrap()[0];
        builder.ret(&[y]).unwrap();
        let mut function = builder.finish().unwrap();

        let err = ShapeInferencePass::for_dialect("mock")
            .run_on_function(&mut function, &mock_registry())
            .unwrap_err();
        assert!(err.to_string().contains("inferred 2 result types but has 1 results"));
    }

    #[test]
    fn test_shape_inference_rejects_missing_return() {
        let mut function = Function::new("main");
        function.add_argument(Type::Scalar(ElementType::F32));

        let err = ShapeInferencePass::new()
            .run_on_function(&mut function, &mock_registry())
            .unwrap_err();
        assert!(matches!(err, Error::Malformed(_)));
    }

    #[test]
    fn test_shape_inference_unchanged_when_resolved() {
        let mut builder = FunctionBuilder::new("main");
        let x = builder.arg(Type::tensor(ElementType::F32, vec![Dim::Known(2)]));
        let y = builder
            .op("mock.double")
            .operand(x)
            .result(Type::tensor(ElementType::F32, vec![Dim::Known(4)]))
            .build()
            .unwrap()[0];
        builder.ret(&[y]).unwrap();
        let mut function = builder.finish().unwrap();

        let pass = ShapeInferencePass::for_dialect("mock");
        assert!(!pass.run_on_function(&mut function, &mock_registry()).unwrap());
    }
}
