//! IR snapshots taken around pass runs.

mod common;

use common::{BrokenSink, SharedBuffer, tensor, test_registry, unknown};
use tessera_compiler::{
    IrUnit, OpFusionPass, Pipeline, PipelineOptions, ShapeInferencePass, SnapshotConfig,
};
use tessera_core::{FunctionBuilder, Module, Pass};

/// Module with `helper` and `main`, each `x:[3] -> exp -> return`.
fn two_function_module() -> Module {
    let mut module = Module::named("net");
    for name in ["helper", "main"] {
        let mut builder = FunctionBuilder::new(name);
        let x = builder.arg(tensor(&[3]));
        let y = builder
            .op("relay.exp")
            .operand(x)
            .result(unknown(1))
            .build()
            .unwrap()[0];
        builder.ret(&[y]).unwrap();
        module.add_function(builder.finish().unwrap());
    }
    module
}

fn pipeline_with(snapshot: SnapshotConfig) -> Pipeline {
    let options = PipelineOptions {
        verify_each: false,
        snapshot: Some(snapshot),
    };
    let mut pipeline = Pipeline::with_options(test_registry(), options);
    pipeline
        .add_pass(ShapeInferencePass::new())
        .add_pass(OpFusionPass::new());
    pipeline
}

#[test]
fn test_print_module_once_after_each_pass() {
    let buffer = SharedBuffer::default();
    let mut pipeline = pipeline_with(SnapshotConfig::print_module_once(buffer.clone()));
    pipeline.run(&mut two_function_module()).unwrap();

    let dump = buffer.contents();
    let headers: Vec<&str> = dump.lines().filter(|l| l.starts_with("// -----//")).collect();
    assert_eq!(
        headers,
        vec![
            "// -----// IR Dump After shape_inference (@main) //----- //",
            "// -----// IR Dump After op_fusion (@main) //----- //",
        ]
    );
    // module scope prints both functions
    assert!(dump.contains("module @net {"));
    assert!(dump.contains("func.func @helper"));
    // the shape inference dump already shows resolved types
    assert!(dump.contains("tensor<3xf32>"));
    assert!(!dump.contains("tensor<?xf32>"));
}

#[test]
fn test_before_snapshot_shows_unresolved_ir() {
    let buffer = SharedBuffer::default();
    let config = SnapshotConfig::never()
        .sink(buffer.clone())
        .before(|pass, unit| {
            pass.name() == "shape_inference" && matches!(unit, IrUnit::Function(f) if f.name() == "helper")
        });
    pipeline_with(config).run(&mut two_function_module()).unwrap();

    let dump = buffer.contents();
    assert!(dump.starts_with("// -----// IR Dump Before shape_inference (@helper) //----- //\n"));
    // function scope prints the function only
    assert!(!dump.contains("module"));
    assert!(dump.contains("func.func @helper"));
    assert!(!dump.contains("func.func @main"));
    assert!(dump.contains("tensor<?xf32>"));
}

#[test]
fn test_after_only_on_change() {
    let buffer = SharedBuffer::default();
    let config = SnapshotConfig::never()
        .sink(buffer.clone())
        .after(|_: &dyn Pass, _| true)
        .after_only_on_change(true);
    let mut pipeline = pipeline_with(config);
    let mut module = two_function_module();

    pipeline.run(&mut module).unwrap();
    let first = buffer.contents();
    assert_eq!(first.matches("IR Dump After").count(), 4);

    // Nothing changes on the second run, so nothing is printed
    pipeline.run(&mut module).unwrap();
    assert_eq!(buffer.contents(), first);
}

#[test]
fn test_never_prints_nothing() {
    let buffer = SharedBuffer::default();
    pipeline_with(SnapshotConfig::never().sink(buffer.clone()))
        .run(&mut two_function_module())
        .unwrap();
    assert!(buffer.contents().is_empty());
}

#[test]
fn test_broken_sink_does_not_fail_pipeline() {
    let mut module = two_function_module();
    let report = pipeline_with(SnapshotConfig::print_module_once(BrokenSink))
        .run(&mut module)
        .unwrap();
    assert_eq!(report.passes_run, 2);
    assert_eq!(
        module.function("main").unwrap().signature().outputs,
        vec![tensor(&[3])]
    );
}
