//! Compiler pass trait and stage definitions.

use crate::Result;
use crate::ir::{Function, Module};
use crate::registry::OperatorRegistry;

/// Compilation stage for ordering passes.
///
/// Passes run in stage order. Within a stage, passes run in the order they
/// were registered. Each stage may assume the postcondition of the previous
/// one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Shape and type inference (earliest stage).
    ///
    /// Afterwards every capability-supporting operation has resolved result
    /// types and every function signature matches its return.
    Inference,

    /// Operator fusion over fully typed tensor operations.
    Fusion,

    /// Tensor operations to loop nests.
    LoopLowering,

    /// Loop nest optimization (tiling, interchange).
    LoopOptimization,

    /// Loop nests to structured control flow.
    StructuredLowering,

    /// Structured control flow to parallel constructs.
    ParallelLowering,

    /// Lowering to the target IR (latest stage).
    TargetLowering,
}

/// Unit of IR a pass operates on.
///
/// Determines how the pipeline drives the pass and what a debug snapshot
/// covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PassScope {
    /// Run once per function, in module order.
    #[default]
    Function,

    /// Run once on the whole module.
    Module,
}

/// Trait for implementing compiler passes.
///
/// A pass is a transformation that runs during a specific compilation stage.
/// Passes are standalone objects holding only configuration.
///
/// # Return Value
///
/// `run_on_function()` and `run_on_module()` return `Ok(true)` if the pass
/// changed the IR, or `Ok(false)` if it left it untouched.
///
/// # Example
///
/// ```ignore
/// struct DeadCodeEliminationPass;
///
/// impl Pass for DeadCodeEliminationPass {
///     fn name(&self) -> &str {
///         "dead_code_elimination"
///     }
///
///     fn stage(&self) -> Stage {
///         Stage::Fusion
///     }
///
///     fn run_on_function(&self, function: &mut Function, registry: &OperatorRegistry) -> Result<bool> {
///         let mut changed = false;
///         // Erase operations whose results have no users...
///         Ok(changed)
///     }
/// }
/// ```
pub trait Pass: Send + Sync {
    /// Get the pass name (used for logging, snapshots and diagnostics).
    fn name(&self) -> &str;

    /// Get the compilation stage this pass belongs to.
    fn stage(&self) -> Stage;

    /// Get the unit of IR this pass runs on.
    fn scope(&self) -> PassScope {
        PassScope::Function
    }

    /// Run the pass on a single function.
    fn run_on_function(&self, function: &mut Function, registry: &OperatorRegistry)
    -> Result<bool>;

    /// Run the pass on a whole module.
    ///
    /// The default runs `run_on_function` on every function in order and
    /// stops at the first error.
    fn run_on_module(&self, module: &mut Module, registry: &OperatorRegistry) -> Result<bool> {
        let mut changed = false;
        for function in module.functions_mut() {
            changed |= self.run_on_function(function, registry)?;
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    struct NoOpPass;

    impl Pass for NoOpPass {
        fn name(&self) -> &str {
            "noop"
        }

        fn stage(&self) -> Stage {
            Stage::LoopOptimization
        }

        fn run_on_function(&self, _function: &mut Function, _registry: &OperatorRegistry) -> Result<bool> {
            Ok(false)
        }
    }

    // Reports a change on functions named "main", fails on "bad".
    struct SelectivePass;

    impl Pass for SelectivePass {
        fn name(&self) -> &str {
            "selective"
        }

        fn stage(&self) -> Stage {
            Stage::Fusion
        }

        fn run_on_function(&self, function: &mut Function, _registry: &OperatorRegistry) -> Result<bool> {
            match function.name() {
                "main" => Ok(true),
                "bad" => Err(Error::Pass("bad function".to_string())),
                _ => Ok(false),
            }
        }
    }

    #[test]
    fn test_pass_trait() {
        let pass: Box<dyn Pass> = Box::new(NoOpPass);
        assert_eq!(pass.name(), "noop");
        assert_eq!(pass.stage(), Stage::LoopOptimization);
        assert_eq!(pass.scope(), PassScope::Function);
    }

    #[test]
    fn test_stage_ordering() {
        assert!(Stage::Inference < Stage::Fusion);
        assert!(Stage::Fusion < Stage::LoopLowering);
        assert!(Stage::LoopLowering < Stage::LoopOptimization);
        assert!(Stage::LoopOptimization < Stage::StructuredLowering);
        assert!(Stage::StructuredLowering < Stage::ParallelLowering);
        assert!(Stage::ParallelLowering < Stage::TargetLowering);
    }

    #[test]
    fn test_default_run_on_module() {
        let registry = OperatorRegistry::new();

        let mut module = Module::new();
        module.add_function(Function::new("helper"));
        module.add_function(Function::new("main"));
        assert!(SelectivePass.run_on_module(&mut module, &registry).unwrap());

        let mut module = Module::new();
        module.add_function(Function::new("bad"));
        module.add_function(Function::new("main"));
        assert!(SelectivePass.run_on_module(&mut module, &registry).is_err());
    }
}
