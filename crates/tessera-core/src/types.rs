//! Core types for element types, tensor shapes and function signatures.

use crate::{Error, Result};
use std::fmt;

/// Scalar element type of a value or of a tensor's elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    F16,
    F32,
    F64,
    I8,
    I16,
    I32,
    I64,
    U8,
    Bool,
}

impl ElementType {
    /// Parse an element type from its textual form (`f32`, `i64`, `i1`, ...).
    ///
    /// `bool` is accepted as an alias for `i1`.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "f16" | "float16" => Ok(ElementType::F16),
            "f32" | "float32" => Ok(ElementType::F32),
            "f64" | "float64" => Ok(ElementType::F64),
            "i8" | "int8" => Ok(ElementType::I8),
            "i16" | "int16" => Ok(ElementType::I16),
            "i32" | "int32" => Ok(ElementType::I32),
            "i64" | "int64" => Ok(ElementType::I64),
            "ui8" | "uint8" => Ok(ElementType::U8),
            "i1" | "bool" => Ok(ElementType::Bool),
            other => Err(Error::Attribute(format!("unknown element type '{}'", other))),
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ElementType::F16 => "f16",
            ElementType::F32 => "f32",
            ElementType::F64 => "f64",
            ElementType::I8 => "i8",
            ElementType::I16 => "i16",
            ElementType::I32 => "i32",
            ElementType::I64 => "i64",
            ElementType::U8 => "ui8",
            ElementType::Bool => "i1",
        };
        f.write_str(s)
    }
}

/// A single tensor dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dim {
    /// Size known at compile time.
    Known(usize),

    /// Size not known at compile time.
    Dynamic,
}

impl Dim {
    /// Check if the dimension size is known.
    pub fn is_known(&self) -> bool {
        matches!(self, Dim::Known(_))
    }

    /// Get the known size, if any.
    pub fn as_known(&self) -> Option<usize> {
        match self {
            Dim::Known(n) => Some(*n),
            Dim::Dynamic => None,
        }
    }
}

impl From<usize> for Dim {
    fn from(n: usize) -> Self {
        Dim::Known(n)
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dim::Known(n) => write!(f, "{}", n),
            Dim::Dynamic => f.write_str("?"),
        }
    }
}

/// Ranked tensor type: element type plus one `Dim` per axis.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TensorType {
    pub element: ElementType,
    pub dims: Vec<Dim>,
}

impl TensorType {
    /// Create a tensor type from arbitrary dimensions.
    pub fn new(element: ElementType, dims: Vec<Dim>) -> Self {
        Self { element, dims }
    }

    /// Create a fully static tensor type.
    pub fn ranked_static(element: ElementType, dims: &[usize]) -> Self {
        Self {
            element,
            dims: dims.iter().map(|&d| Dim::Known(d)).collect(),
        }
    }

    /// Number of axes.
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Check if every dimension is known.
    pub fn is_static(&self) -> bool {
        self.dims.iter().all(Dim::is_known)
    }

    /// Get the dimensions as plain sizes when the type is fully static.
    pub fn static_dims(&self) -> Option<Vec<usize>> {
        self.dims.iter().map(Dim::as_known).collect()
    }

    /// Total element count when the type is fully static.
    pub fn num_elements(&self) -> Option<usize> {
        self.static_dims().map(|dims| dims.iter().product())
    }
}

impl fmt::Display for TensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("tensor<")?;
        for dim in &self.dims {
            write!(f, "{}x", dim)?;
        }
        write!(f, "{}>", self.element)
    }
}

/// Type carried by every SSA value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Scalar(ElementType),
    Tensor(TensorType),
}

impl Type {
    /// Shorthand for a tensor type with the given dimensions.
    pub fn tensor(element: ElementType, dims: Vec<Dim>) -> Self {
        Type::Tensor(TensorType::new(element, dims))
    }

    /// Element type of a scalar, or of a tensor's elements.
    pub fn element_type(&self) -> ElementType {
        match self {
            Type::Scalar(element) => *element,
            Type::Tensor(tensor) => tensor.element,
        }
    }

    /// Get the tensor type, if this is a tensor.
    pub fn as_tensor(&self) -> Option<&TensorType> {
        match self {
            Type::Tensor(tensor) => Some(tensor),
            Type::Scalar(_) => None,
        }
    }

    /// Scalars are always static; tensors are static when every dim is known.
    pub fn is_fully_static(&self) -> bool {
        match self {
            Type::Scalar(_) => true,
            Type::Tensor(tensor) => tensor.is_static(),
        }
    }
}

impl From<TensorType> for Type {
    fn from(tensor: TensorType) -> Self {
        Type::Tensor(tensor)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Scalar(element) => write!(f, "{}", element),
            Type::Tensor(tensor) => write!(f, "{}", tensor),
        }
    }
}

/// Function signature: ordered input and output types.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FunctionType {
    pub inputs: Vec<Type>,
    pub outputs: Vec<Type>,
}

impl FunctionType {
    pub fn new(inputs: Vec<Type>, outputs: Vec<Type>) -> Self {
        Self { inputs, outputs }
    }
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) -> ({})", join(&self.inputs), join(&self.outputs))
    }
}

pub(crate) fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Inferred shape of one operation result.
///
/// Shape inference produces dimensions only. The element type is left as
/// `None` so the pass keeps the result's original element type; casting
/// operators set it explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapedTypeComponents {
    pub dims: Vec<Dim>,
    pub element: Option<ElementType>,
}

impl ShapedTypeComponents {
    /// Components with inferred dimensions and no element type override.
    pub fn new(dims: Vec<Dim>) -> Self {
        Self {
            dims,
            element: None,
        }
    }

    /// Components for a fully static shape.
    pub fn from_static(dims: &[usize]) -> Self {
        Self::new(dims.iter().map(|&d| Dim::Known(d)).collect())
    }

    /// Override the element type (type-casting operators only).
    pub fn with_element(mut self, element: ElementType) -> Self {
        self.element = Some(element);
        self
    }
}
