//! Name-keyed operator lookup for passes.

use std::collections::HashMap;

use crate::operator::{InferShapedType, OpPattern, Operator};

/// Operators keyed by fully qualified name (`relay.add`, `relay.nn.conv2d`).
///
/// Passes never hold operators directly; they ask the registry what an
/// operation's operator can do. An unregistered name answers every query the
/// way an operator without that capability would.
#[derive(Default)]
pub struct OperatorRegistry {
    operators: HashMap<String, Box<dyn Operator>>,
}

impl OperatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `operator` under `name`; a later registration wins.
    pub fn register<O>(&mut self, name: &str, operator: O) -> &mut Self
    where
        O: Operator + 'static,
    {
        self.operators.insert(name.to_string(), Box::new(operator));
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn Operator> {
        self.operators.get(name).map(|op| op.as_ref())
    }

    /// Shape-inference capability of `name`, if registered and provided.
    pub fn shape_inference(&self, name: &str) -> Option<&dyn InferShapedType> {
        self.get(name).and_then(|operator| operator.shape_inference())
    }

    /// Fusion pattern of `name`; unregistered operators are `Opaque`.
    pub fn pattern(&self, name: &str) -> OpPattern {
        self.get(name).map_or(OpPattern::Opaque, |operator| operator.pattern())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.operators.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    /// Registered names, in no particular order.
    pub fn operator_names(&self) -> impl Iterator<Item = &str> {
        self.operators.keys().map(String::as_str)
    }
}
