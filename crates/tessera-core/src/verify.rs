//! Structural verification of functions and modules.

use crate::ir::{Function, Module, ValueDef};
use crate::{Error, Result};
use std::collections::HashSet;

impl Function {
    /// Check that the function is well-formed SSA with a single terminator.
    ///
    /// - every operand refers to an argument or to a result of an earlier
    ///   operation in program order
    /// - exactly one `func.return`, and it is the last operation
    /// - the def-use graph is acyclic
    pub fn verify(&self) -> Result<()> {
        let position = self.positions();

        for (index, (op_id, op)) in self.ops().enumerate() {
            for &operand in &op.operands {
                let value = self.value(operand).map_err(|_| {
                    Error::Malformed(format!(
                        "@{}: {} uses unknown value %{}",
                        self.name(),
                        op.describe(),
                        operand.index()
                    ))
                })?;
                if value.def == ValueDef::Erased {
                    return Err(Error::Malformed(format!(
                        "@{}: {} uses %{} of an erased operation",
                        self.name(),
                        op.describe(),
                        operand.index()
                    )));
                }
                if let ValueDef::Result { op: producer, .. } = value.def {
                    let defined_before = position
                        .get(&producer)
                        .is_some_and(|&p| p < index);
                    if !defined_before {
                        return Err(Error::Malformed(format!(
                            "@{}: {} uses %{} before its definition",
                            self.name(),
                            op.describe(),
                            operand.index()
                        )));
                    }
                }
            }

            if op.is_return() && op_id != *self.op_ids().last().unwrap_or(&op_id) {
                return Err(Error::Malformed(format!(
                    "@{}: {} is not the last operation of the body",
                    self.name(),
                    op.describe()
                )));
            }
        }

        self.terminator()?;

        if petgraph::algo::is_cyclic_directed(self.graph()) {
            return Err(Error::Malformed(format!(
                "@{}: def-use graph contains a cycle",
                self.name()
            )));
        }

        Ok(())
    }
}

impl Module {
    /// Verify every function and reject duplicate function names.
    pub fn verify(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for function in self.functions() {
            if !seen.insert(function.name()) {
                return Err(Error::Malformed(format!(
                    "duplicate function @{}",
                    function.name()
                )));
            }
            function.verify()?;
        }
        Ok(())
    }
}
