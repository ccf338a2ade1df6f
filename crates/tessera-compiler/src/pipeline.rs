//! Pass pipeline with stage ordering, verification and IR snapshots.

use std::fmt;
use std::io::{self, Write};

use tessera_core::{Error, Function, Module, OperatorRegistry, Pass, PassScope};

use crate::diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
use crate::passes::{OpFusionPass, ShapeInferencePass};

/// Unit of IR a pass ran on, as seen by snapshot predicates.
#[derive(Debug, Clone, Copy)]
pub enum IrUnit<'a> {
    Module(&'a Module),
    Function(&'a Function),
}

impl fmt::Display for IrUnit<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrUnit::Module(module) => match &module.name {
                Some(name) => write!(f, "module @{}", name),
                None => write!(f, "module"),
            },
            IrUnit::Function(function) => write!(f, "@{}", function.name()),
        }
    }
}

/// Decides whether to dump IR for a (pass, unit) pair.
pub type SnapshotPredicate = Box<dyn Fn(&dyn Pass, IrUnit<'_>) -> bool + Send + Sync>;

/// Textual IR dumps taken around pass runs.
///
/// Snapshots only read the IR; a failing write is logged and ignored.
pub struct SnapshotConfig {
    before: SnapshotPredicate,
    after: SnapshotPredicate,
    module_scope: bool,
    after_only_on_change: bool,
    sink: Box<dyn Write + Send>,
}

impl SnapshotConfig {
    /// Configuration that never dumps anything.
    pub fn never() -> Self {
        Self {
            before: Box::new(|_, _| false),
            after: Box::new(|_, _| false),
            module_scope: false,
            after_only_on_change: false,
            sink: Box::new(io::sink()),
        }
    }

    /// Dump the whole module after every pass, once per pass: on
    /// module-scoped runs and on the run over `main`.
    pub fn print_module_once(sink: impl Write + Send + 'static) -> Self {
        Self {
            before: Box::new(|_, _| false),
            after: Box::new(|_, unit| match unit {
                IrUnit::Module(_) => true,
                IrUnit::Function(function) => function.name() == "main",
            }),
            module_scope: true,
            after_only_on_change: false,
            sink: Box::new(sink),
        }
    }

    pub fn before(
        mut self,
        predicate: impl Fn(&dyn Pass, IrUnit<'_>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.before = Box::new(predicate);
        self
    }

    pub fn after(
        mut self,
        predicate: impl Fn(&dyn Pass, IrUnit<'_>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.after = Box::new(predicate);
        self
    }

    /// Print the enclosing module instead of just the unit.
    pub fn module_scope(mut self, enabled: bool) -> Self {
        self.module_scope = enabled;
        self
    }

    /// Skip "after" dumps for runs that left the IR unchanged.
    pub fn after_only_on_change(mut self, enabled: bool) -> Self {
        self.after_only_on_change = enabled;
        self
    }

    pub fn sink(mut self, sink: impl Write + Send + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    fn before_pass(&mut self, pass: &dyn Pass, unit: IrUnit<'_>, module: &Module) {
        if (self.before)(pass, unit) {
            self.dump("Before", pass, unit, module);
        }
    }

    fn after_pass(&mut self, pass: &dyn Pass, unit: IrUnit<'_>, module: &Module, changed: bool) {
        if self.after_only_on_change && !changed {
            return;
        }
        if (self.after)(pass, unit) {
            self.dump("After", pass, unit, module);
        }
    }

    fn dump(&mut self, when: &str, pass: &dyn Pass, unit: IrUnit<'_>, module: &Module) {
        let body = match (self.module_scope, unit) {
            (true, _) | (false, IrUnit::Module(_)) => module.to_string(),
            (false, IrUnit::Function(function)) => function.to_string(),
        };
        let written = writeln!(
            self.sink,
            "// -----// IR Dump {} {} ({}) //----- //\n{}",
            when,
            pass.name(),
            unit,
            body
        )
        .and_then(|_| self.sink.flush());
        if let Err(e) = written {
            tracing::warn!(pass = pass.name(), %unit, "failed to write IR snapshot: {}", e);
        }
    }
}

/// Construction-time pipeline configuration.
#[derive(Default)]
pub struct PipelineOptions {
    /// Verify each unit after every pass; a verification failure counts as
    /// a failure of that pass.
    pub verify_each: bool,

    pub snapshot: Option<SnapshotConfig>,
}

/// Outcome of a successful pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub passes_run: usize,

    /// Whether each pass changed the IR, in execution order.
    pub changed: Vec<bool>,
}

impl PipelineReport {
    pub fn any_changed(&self) -> bool {
        self.changed.iter().any(|&c| c)
    }
}

/// A pass failed; no later pass ran.
#[derive(Debug, thiserror::Error)]
#[error("pass #{index} '{pass}' failed on {unit}: {source}")]
pub struct PipelineError {
    /// Position of the failing pass in execution order.
    pub index: usize,
    pub pass: String,
    pub unit: String,
    #[source]
    pub source: Error,
}

/// Compiler pipeline with pluggable passes.
///
/// Passes are kept sorted by stage; within a stage they run in the order
/// they were added. The order is fixed once the pipeline is built and a run
/// stops at the first failing pass, leaving that pass's partial work in the
/// module.
pub struct Pipeline {
    passes: Vec<Box<dyn Pass>>,
    registry: OperatorRegistry,
    options: PipelineOptions,
    diagnostics: Box<dyn DiagnosticSink + Send>,
}

impl Pipeline {
    /// Create an empty pipeline.
    pub fn new(registry: OperatorRegistry) -> Self {
        Self::with_options(registry, PipelineOptions::default())
    }

    pub fn with_options(registry: OperatorRegistry, options: PipelineOptions) -> Self {
        Self {
            passes: Vec::new(),
            registry,
            options,
            diagnostics: Box::new(TracingSink),
        }
    }

    /// Create a pipeline with the built-in passes:
    /// - `ShapeInferencePass` (Inference stage)
    /// - `OpFusionPass` (Fusion stage)
    ///
    /// Lowering passes are added by the caller via `add_pass()`.
    pub fn standard(registry: OperatorRegistry, options: PipelineOptions) -> Self {
        let mut pipeline = Self::with_options(registry, options);
        pipeline
            .add_pass(ShapeInferencePass::new())
            .add_pass(OpFusionPass::new());
        pipeline
    }

    /// Replace the diagnostics sink (default: `TracingSink`).
    pub fn with_diagnostics(mut self, sink: impl DiagnosticSink + Send + 'static) -> Self {
        self.diagnostics = Box::new(sink);
        self
    }

    /// Add a pass after every pass of the same or an earlier stage.
    ///
    /// # Returns
    ///
    /// Returns a mutable reference to self for method chaining.
    pub fn add_pass(&mut self, pass: impl Pass + 'static) -> &mut Self {
        let stage = pass.stage();
        let at = self
            .passes
            .iter()
            .position(|p| p.stage() > stage)
            .unwrap_or(self.passes.len());
        self.passes.insert(at, Box::new(pass));
        self
    }

    /// Pass names in execution order.
    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    pub fn registry(&self) -> &OperatorRegistry {
        &self.registry
    }

    /// Run every pass over the module in execution order.
    ///
    /// # Errors
    ///
    /// Returns the first pass failure (including `verify_each` failures)
    /// after reporting it to the diagnostics sink.
    #[tracing::instrument(skip_all, fields(passes = self.passes.len(), functions = module.functions().len()))]
    pub fn run(&mut self, module: &mut Module) -> Result<PipelineReport, PipelineError> {
        let Self {
            passes,
            registry,
            options,
            diagnostics,
        } = self;
        let mut report = PipelineReport::default();

        for (index, pass) in passes.iter().enumerate() {
            let pass = pass.as_ref();
            let _span =
                tracing::debug_span!("pass", name = pass.name(), stage = ?pass.stage()).entered();

            let changed = match pass.scope() {
                PassScope::Module => run_module_scope(pass, module, registry, options),
                PassScope::Function => run_function_scope(pass, module, registry, options),
            }
            .map_err(|(unit, source)| {
                let error = PipelineError {
                    index,
                    pass: pass.name().to_string(),
                    unit,
                    source,
                };
                diagnostics.emit(
                    &Diagnostic::error(error.source.to_string())
                        .with_pass(&error.pass)
                        .with_unit(&error.unit),
                );
                error
            })?;

            tracing::debug!(changed, "pass complete");
            report.passes_run += 1;
            report.changed.push(changed);
        }

        Ok(report)
    }
}

/// Run a module-scoped pass; errors carry the unit label.
fn run_module_scope(
    pass: &dyn Pass,
    module: &mut Module,
    registry: &OperatorRegistry,
    options: &mut PipelineOptions,
) -> Result<bool, (String, Error)> {
    let unit = IrUnit::Module(&*module).to_string();
    let _span = tracing::trace_span!("unit", %unit).entered();

    if let Some(snapshot) = options.snapshot.as_mut() {
        snapshot.before_pass(pass, IrUnit::Module(&*module), &*module);
    }

    let changed = pass
        .run_on_module(module, registry)
        .and_then(|changed| {
            if options.verify_each {
                module.verify()?;
            }
            Ok(changed)
        })
        .map_err(|e| (unit, e))?;

    if let Some(snapshot) = options.snapshot.as_mut() {
        snapshot.after_pass(pass, IrUnit::Module(&*module), &*module, changed);
    }
    Ok(changed)
}

/// Run a function-scoped pass on each function in module order.
fn run_function_scope(
    pass: &dyn Pass,
    module: &mut Module,
    registry: &OperatorRegistry,
    options: &mut PipelineOptions,
) -> Result<bool, (String, Error)> {
    let mut changed = false;

    for i in 0..module.functions().len() {
        let unit = IrUnit::Function(&module.functions()[i]).to_string();
        let _span = tracing::trace_span!("unit", %unit).entered();

        if let Some(snapshot) = options.snapshot.as_mut() {
            snapshot.before_pass(pass, IrUnit::Function(&module.functions()[i]), module);
        }

        let function = &mut module.functions_mut()[i];
        let unit_changed = pass
            .run_on_function(function, registry)
            .and_then(|changed| {
                if options.verify_each {
                    function.verify()?;
                }
                Ok(changed)
            })
            .map_err(|e| (unit, e))?;
        changed |= unit_changed;

        if let Some(snapshot) = options.snapshot.as_mut() {
            snapshot.after_pass(
                pass,
                IrUnit::Function(&module.functions()[i]),
                module,
                unit_changed,
            );
        }
    }

    Ok(changed)
}
