//! Intermediate representation: values, operations, functions and modules.
//!
//! A `Function` owns two arenas:
//! - **Values** (`Value`) live in a `Vec` indexed by `ValueId`. Each value is
//!   a function argument or the result of exactly one operation.
//! - **Operations** (`Operation`) live in a petgraph `StableGraph` indexed by
//!   `OpId`. Graph edges run from a value's producer to each consumer and are
//!   weighted with the `ValueId` that flows along them.
//!
//! Program (definition) order is kept separately in `order`. Passes that need
//! to see producers before consumers walk `ops()`.

use crate::attribute::AttributeValue;
use crate::types::{FunctionType, Type};
use crate::{Error, Result};
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableGraph;
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use std::fmt;

/// Operation name of the function terminator.
pub const RETURN_OP: &str = "func.return";

/// Identifier of an operation inside its function.
pub type OpId = NodeIndex;

/// Identifier of a value inside its function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub usize);

impl ValueId {
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

/// Fully qualified operator name, `namespace.op` (e.g. `relay.nn.conv2d`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OpName(String);

impl OpName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Dialect namespace: everything before the first `.`.
    ///
    /// Names without a dot have an empty namespace.
    pub fn namespace(&self) -> &str {
        match self.0.split_once('.') {
            Some((namespace, _)) => namespace,
            None => "",
        }
    }

    /// Operator name without the namespace.
    pub fn op(&self) -> &str {
        match self.0.split_once('.') {
            Some((_, op)) => op,
            None => &self.0,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OpName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OpName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Where a value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueDef {
    /// The nth function argument.
    Argument(usize),

    /// The nth result of an operation.
    Result { op: OpId, index: usize },

    /// A result whose operation was erased. Operation ids are reused, so the
    /// old producer is forgotten.
    Erased,
}

/// An SSA value.
#[derive(Debug, Clone)]
pub struct Value {
    pub ty: Type,
    pub def: ValueDef,
}

/// An operation: operator name, operands, owned results and attributes.
#[derive(Debug, Clone)]
pub struct Operation {
    pub name: OpName,

    /// Operand values (defined elsewhere, never owned).
    pub operands: Vec<ValueId>,

    /// Result values owned by this operation.
    pub results: Vec<ValueId>,

    pub attributes: HashMap<String, AttributeValue>,

    /// Optional source location, shown in diagnostics.
    pub loc: Option<String>,
}

impl Operation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: OpName::new(name),
            operands: Vec::new(),
            results: Vec::new(),
            attributes: HashMap::new(),
            loc: None,
        }
    }

    /// Check if this is the function terminator.
    pub fn is_return(&self) -> bool {
        self.name.as_str() == RETURN_OP
    }

    pub fn get_attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.attributes.insert(key.into(), value);
    }

    /// Name plus location, for error messages.
    pub fn describe(&self) -> String {
        match &self.loc {
            Some(loc) => format!("{} at {}", self.name, loc),
            None => self.name.to_string(),
        }
    }
}

// ──────────────────────────────── Function ───────────────────────────────

/// A function: typed arguments, a body of operations and a signature.
#[derive(Debug, Clone)]
pub struct Function {
    name: String,
    arguments: Vec<ValueId>,
    signature: FunctionType,
    values: Vec<Value>,
    graph: StableGraph<Operation, ValueId>,
    order: Vec<OpId>,
}

impl Function {
    /// Create an empty function with no arguments and an empty signature.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
            signature: FunctionType::default(),
            values: Vec::new(),
            graph: StableGraph::new(),
            order: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ── Signature ──

    pub fn signature(&self) -> &FunctionType {
        &self.signature
    }

    /// Replace the declared signature.
    pub fn set_signature(&mut self, signature: FunctionType) {
        self.signature = signature;
    }

    /// Current types of the argument values.
    pub fn argument_types(&self) -> Vec<Type> {
        self.arguments
            .iter()
            .map(|id| self.values[id.index()].ty.clone())
            .collect()
    }

    pub fn arguments(&self) -> &[ValueId] {
        &self.arguments
    }

    /// Append an argument and add its type to the declared inputs.
    pub fn add_argument(&mut self, ty: Type) -> ValueId {
        let id = ValueId::new(self.values.len());
        self.values.push(Value {
            ty: ty.clone(),
            def: ValueDef::Argument(self.arguments.len()),
        });
        self.arguments.push(id);
        self.signature.inputs.push(ty);
        id
    }

    // ── Values ──

    pub fn value(&self, id: ValueId) -> Result<&Value> {
        self.values
            .get(id.index())
            .ok_or_else(|| Error::InvalidGraph(format!("Value {:?} not found in @{}", id, self.name)))
    }

    pub fn value_type(&self, id: ValueId) -> Result<&Type> {
        Ok(&self.value(id)?.ty)
    }

    /// Overwrite the type of a value in place.
    pub fn set_value_type(&mut self, id: ValueId, ty: Type) -> Result<()> {
        let name = &self.name;
        let value = self
            .values
            .get_mut(id.index())
            .ok_or_else(|| Error::InvalidGraph(format!("Value {:?} not found in @{}", id, name)))?;
        value.ty = ty;
        Ok(())
    }

    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    /// Operation producing a value, or `None` for arguments.
    pub fn producer(&self, id: ValueId) -> Result<Option<OpId>> {
        match self.value(id)?.def {
            ValueDef::Argument(_) => Ok(None),
            ValueDef::Result { op, .. } => Ok(Some(op)),
            ValueDef::Erased => Err(Error::InvalidGraph(format!(
                "Value {:?} in @{} belongs to an erased operation",
                id, self.name
            ))),
        }
    }

    /// Operations using a value, in program order, without duplicates.
    pub fn consumers(&self, id: ValueId) -> Result<Vec<OpId>> {
        let mut users: Vec<OpId> = match self.producer(id)? {
            Some(producer) => self
                .graph
                .edges_directed(producer, Direction::Outgoing)
                .filter(|edge| *edge.weight() == id)
                .map(|edge| edge.target())
                .collect(),
            None => self
                .order
                .iter()
                .copied()
                .filter(|&op| {
                    self.graph
                        .node_weight(op)
                        .is_some_and(|o| o.operands.contains(&id))
                })
                .collect(),
        };
        let position = self.positions();
        users.sort_by_key(|op| position.get(op).copied().unwrap_or(usize::MAX));
        users.dedup();
        Ok(users)
    }

    // ── Operations ──

    /// Append an operation to the end of the body.
    ///
    /// Creates one result value per entry of `result_types` and records the
    /// def-use edges from every operand's producer. Operands must already
    /// exist in this function and must not belong to an erased operation.
    pub fn push_op(&mut self, mut op: Operation, result_types: Vec<Type>) -> Result<OpId> {
        for &operand in &op.operands {
            match self.values.get(operand.index()) {
                None => {
                    return Err(Error::InvalidGraph(format!(
                        "Operation {} in @{} uses undefined value {:?}",
                        op.name, self.name, operand
                    )));
                }
                Some(Value {
                    def: ValueDef::Erased,
                    ..
                }) => {
                    return Err(Error::InvalidGraph(format!(
                        "Operation {} in @{} uses erased value {:?}",
                        op.name, self.name, operand
                    )));
                }
                Some(_) => {}
            }
        }

        let operands = op.operands.clone();
        op.results.clear();
        let op_id = self.graph.add_node(op);

        let mut results = Vec::with_capacity(result_types.len());
        for (index, ty) in result_types.into_iter().enumerate() {
            let id = ValueId::new(self.values.len());
            self.values.push(Value {
                ty,
                def: ValueDef::Result { op: op_id, index },
            });
            results.push(id);
        }
        self.graph[op_id].results = results;

        for operand in operands {
            if let ValueDef::Result { op: producer, .. } = self.values[operand.index()].def {
                self.graph.add_edge(producer, op_id, operand);
            }
        }

        self.order.push(op_id);
        Ok(op_id)
    }

    /// Remove an operation whose results have no remaining users.
    ///
    /// Its result values stay allocated but are marked [`ValueDef::Erased`].
    pub fn erase_op(&mut self, id: OpId) -> Result<()> {
        let results = self.op(id)?.results.clone();
        for &result in &results {
            if !self.consumers(result)?.is_empty() {
                return Err(Error::InvalidGraph(format!(
                    "Cannot erase {}: result {:?} still has users",
                    self.graph[id].name, result
                )));
            }
        }
        self.graph.remove_node(id);
        self.order.retain(|&op| op != id);
        for result in results {
            self.values[result.index()].def = ValueDef::Erased;
        }
        Ok(())
    }

    pub fn op(&self, id: OpId) -> Result<&Operation> {
        self.graph
            .node_weight(id)
            .ok_or_else(|| Error::InvalidGraph(format!("Operation {:?} not found in @{}", id, self.name)))
    }

    pub fn op_mut(&mut self, id: OpId) -> Result<&mut Operation> {
        let name = &self.name;
        self.graph
            .node_weight_mut(id)
            .ok_or_else(|| Error::InvalidGraph(format!("Operation {:?} not found in @{}", id, name)))
    }

    /// Operation ids in program order.
    pub fn op_ids(&self) -> &[OpId] {
        &self.order
    }

    /// Operations in program order.
    pub fn ops(&self) -> impl Iterator<Item = (OpId, &Operation)> {
        self.order
            .iter()
            .filter_map(|&id| self.graph.node_weight(id).map(|op| (id, op)))
    }

    pub fn op_count(&self) -> usize {
        self.order.len()
    }

    /// All `func.return` operations, in program order.
    pub fn returns(&self) -> Vec<OpId> {
        self.ops()
            .filter(|(_, op)| op.is_return())
            .map(|(id, _)| id)
            .collect()
    }

    /// The single terminating return operation.
    ///
    /// Errors if the body has no return or more than one.
    pub fn terminator(&self) -> Result<OpId> {
        match self.returns().as_slice() {
            [id] => Ok(*id),
            [] => Err(Error::Malformed(format!(
                "Function @{} has no terminating {}",
                self.name, RETURN_OP
            ))),
            many => Err(Error::Malformed(format!(
                "Function @{} has {} {} operations; exactly one is supported",
                self.name,
                many.len(),
                RETURN_OP
            ))),
        }
    }

    /// Position of every live operation in program order.
    pub(crate) fn positions(&self) -> HashMap<OpId, usize> {
        self.order
            .iter()
            .enumerate()
            .map(|(position, &id)| (id, position))
            .collect()
    }

    pub(crate) fn graph(&self) -> &StableGraph<Operation, ValueId> {
        &self.graph
    }
}

// ──────────────────────────────── Module ─────────────────────────────────

/// Top-level container of functions.
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub name: Option<String>,
    functions: Vec<Function>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            functions: Vec::new(),
        }
    }

    pub fn add_function(&mut self, function: Function) -> &mut Self {
        self.functions.push(function);
        self
    }

    pub fn function(&self, name: &str) -> Result<&Function> {
        self.functions
            .iter()
            .find(|f| f.name() == name)
            .ok_or_else(|| Error::InvalidGraph(format!("Function @{} not found", name)))
    }

    pub fn function_mut(&mut self, name: &str) -> Result<&mut Function> {
        self.functions
            .iter_mut()
            .find(|f| f.name() == name)
            .ok_or_else(|| Error::InvalidGraph(format!("Function @{} not found", name)))
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    pub fn functions_mut(&mut self) -> &mut [Function] {
        &mut self.functions
    }
}
