//! Common test utilities for pipeline integration tests.

#![allow(dead_code)]

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use tessera_core::{
    Dim, ElementType, Function, InferShapedType, InferenceCtx, Operator, OperatorRegistry, Pass,
    Result, ShapedTypeComponents, Stage, Type,
};
use tessera_operators::relay_operator_registry;

/// Marker for a dynamic dimension in `dims` / `tensor`.
pub const DYN: i64 = -1;

/// Initialize tracing for a test, ignoring repeat initialization.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .with_test_writer()
        .try_init();
}

/// Convert a compact dimension list (`DYN` for dynamic) to `Dim`s.
pub fn dims(values: &[i64]) -> Vec<Dim> {
    values
        .iter()
        .map(|&v| if v < 0 { Dim::Dynamic } else { Dim::Known(v as usize) })
        .collect()
}

/// An f32 tensor type.
pub fn tensor(values: &[i64]) -> Type {
    Type::tensor(ElementType::F32, dims(values))
}

/// A tensor type of the given element type.
pub fn typed(element: ElementType, values: &[i64]) -> Type {
    Type::tensor(element, dims(values))
}

/// Fully dynamic placeholder type of the given rank.
pub fn unknown(rank: usize) -> Type {
    Type::tensor(ElementType::F32, vec![Dim::Dynamic; rank])
}

// ── Operators ──

/// Operator whose shape rule always fails.
pub struct AlwaysFailOp;

impl Operator for AlwaysFailOp {
    fn name(&self) -> &str {
        "relay.test.always_fail"
    }

    fn shape_inference(&self) -> Option<&dyn InferShapedType> {
        Some(self)
    }
}

impl InferShapedType for AlwaysFailOp {
    fn infer_return_shapes(&self, ctx: &InferenceCtx) -> Result<Vec<ShapedTypeComponents>> {
        Err(ctx.shape_error("refusing to infer"))
    }
}

/// The relay registry plus the test operators.
pub fn test_registry() -> OperatorRegistry {
    let mut registry = relay_operator_registry();
    registry.register("relay.test.always_fail", AlwaysFailOp);
    registry
}

// ── Passes ──

/// Shared log of pass runs as "pass:@function".
pub type RunLog = Arc<Mutex<Vec<String>>>;

/// Pass that only records which functions it ran on.
pub struct RecordingPass {
    pub name: &'static str,
    pub stage: Stage,
    pub log: RunLog,
}

impl RecordingPass {
    pub fn new(name: &'static str, stage: Stage, log: &RunLog) -> Self {
        Self {
            name,
            stage,
            log: Arc::clone(log),
        }
    }
}

impl Pass for RecordingPass {
    fn name(&self) -> &str {
        self.name
    }

    fn stage(&self) -> Stage {
        self.stage
    }

    fn run_on_function(&self, function: &mut Function, _registry: &OperatorRegistry) -> Result<bool> {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:@{}", self.name, function.name()));
        Ok(false)
    }
}

pub fn new_log() -> RunLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &RunLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

// ── Snapshot sinks ──

/// In-memory snapshot sink readable after the pipeline took ownership.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Sink whose writes always fail.
pub struct BrokenSink;

impl Write for BrokenSink {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::other("sink closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::other("sink closed"))
    }
}
