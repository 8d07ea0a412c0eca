use super::fixtures::{counting_loop, diamond, function, straight_line, with_dead_block};
use crate::analysis::{
    analyze_function, analyze_program, AnalysisKind, ConstValue, EngineConfig, LatticeValue,
};
use crate::function::Program;
use crate::instructions::Literal;
use crate::DflowError;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::BTreeSet;

fn run(function: &crate::Function, kind: AnalysisKind) -> crate::FunctionReport {
    analyze_function(function, kind, &EngineConfig::default()).unwrap()
}

fn set(items: &[&str]) -> LatticeValue {
    LatticeValue::Set(items.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>())
}

fn known(value: i64) -> ConstValue {
    ConstValue::Known(Literal::Int(value))
}

#[test]
fn test_cprop_tracks_redefinitions_along_a_chain() {
    let report = run(&straight_line(), AnalysisKind::Cprop);

    let entry = report.block("entry").unwrap();
    assert_eq!(entry.output.as_map().unwrap()["x"], known(4));

    let b1 = report.block("b1").unwrap();
    assert_eq!(b1.input.as_map().unwrap()["x"], known(4));
    assert_eq!(b1.output.as_map().unwrap()["x"], known(5));

    let exit = report.block("exit").unwrap();
    assert_eq!(exit.output.to_string(), "x: 5");
}

#[test]
fn test_cprop_conflicting_predecessors_become_unknown() {
    let report = run(&diamond(), AnalysisKind::Cprop);

    let merge = report.block("merge").unwrap();
    let facts = merge.input.as_map().unwrap();
    assert_eq!(facts["y"], ConstValue::Unknown);
    assert_eq!(facts["s"], ConstValue::Unknown);
    assert_eq!(facts["c"], ConstValue::Known(Literal::Bool(true)));
}

#[test]
fn test_dead_block_is_unreachable_for_every_analysis() {
    let function = with_dead_block();

    for kind in AnalysisKind::ALL {
        let report = run(&function, kind);
        let dead = report.block("dead").unwrap();
        assert!(!dead.reachable, "{} reached the dead block", kind);
        assert!(dead.input.is_empty(), "{} gave the dead block facts", kind);
        assert!(dead.output.is_empty(), "{} gave the dead block facts", kind);

        assert!(report.block("entry").unwrap().reachable);
        assert!(report.block("exit").unwrap().reachable);
    }
}

#[test]
fn test_unreachable_marker_matches_value_shape() {
    let function = with_dead_block();

    let cprop = run(&function, AnalysisKind::Cprop);
    assert_eq!(cprop.block("dead").unwrap().input, LatticeValue::Map(Default::default()));

    // The universe is the init value, not what an unreachable block reports.
    let available = run(&function, AnalysisKind::Available);
    assert_eq!(available.block("dead").unwrap().output, set(&[]));
}

#[test]
fn test_live_reads_before_writes_are_live_in() {
    let function = function(json!({
        "name": "single",
        "instrs": [
            {"op": "add", "dest": "b", "type": "int", "args": ["a", "a"]},
            {"op": "print", "args": ["b"]}
        ]
    }));

    let report = run(&function, AnalysisKind::Live);
    let block = report.block("b0").unwrap();
    assert_eq!(block.input, set(&["a"]));
    assert_eq!(block.output, set(&[]));
}

#[test]
fn test_live_variables_around_a_loop() {
    let report = run(&counting_loop(), AnalysisKind::Live);

    assert_eq!(report.block("header").unwrap().input, set(&["i", "n", "one"]));
    assert_eq!(report.block("body").unwrap().output, set(&["i", "n", "one"]));
    assert_eq!(report.block("done").unwrap().input, set(&["i"]));
    assert_eq!(report.block("b0").unwrap().input, set(&[]));
}

#[test]
fn test_defined_variables_accumulate() {
    let report = run(&diamond(), AnalysisKind::Defined);

    assert_eq!(report.block("b0").unwrap().input, set(&[]));
    assert_eq!(report.block("b0").unwrap().output, set(&["c"]));
    assert_eq!(report.block("merge").unwrap().input, set(&["c", "s", "y"]));
}

#[test]
fn test_reaching_definitions_through_loop() {
    let report = run(&counting_loop(), AnalysisKind::Rdefs);

    assert_eq!(
        report.block("header").unwrap().input,
        set(&["cond@header.0", "i@b0.0", "i@body.0", "n@b0.1", "one@b0.2"])
    );
    assert_eq!(
        report.block("body").unwrap().output,
        set(&["cond@header.0", "i@body.0", "n@b0.1", "one@b0.2"])
    );
}

#[test]
fn test_available_expressions_intersect_at_merge() {
    let report = run(&diamond(), AnalysisKind::Available);

    // Both arms compute add over {c, y}; canonical ordering makes them the same expression.
    assert_eq!(report.block("left").unwrap().output, set(&["add(c,y)"]));
    assert_eq!(report.block("merge").unwrap().input, set(&["add(c,y)"]));

    // Entry has no predecessors, so it starts from the whole universe.
    assert_eq!(report.block("b0").unwrap().input, set(&["add(c,y)"]));
}

#[test]
fn test_available_expressions_killed_by_redefinition() {
    let function = function(json!({
        "name": "kill",
        "instrs": [
            {"op": "add", "dest": "x", "type": "int", "args": ["a", "b"]},
            {"op": "jmp", "labels": ["next"]},
            {"label": "next"},
            {"op": "const", "dest": "a", "type": "int", "value": 3},
            {"op": "mul", "dest": "y", "type": "int", "args": ["x", "x"]}
        ]
    }));

    let report = run(&function, AnalysisKind::Available);
    assert_eq!(report.block("b0").unwrap().output, set(&["add(a,b)"]));
    assert_eq!(report.block("next").unwrap().output, set(&["mul(x,x)"]));
}

#[test]
fn test_empty_function_reports_no_blocks() {
    let function = function(json!({"name": "nothing", "instrs": []}));
    for kind in AnalysisKind::ALL {
        let report = run(&function, kind);
        assert!(report.is_empty());
        assert_eq!(report.function, "nothing");
    }
}

#[test]
fn test_structural_error_is_isolated_to_its_function() {
    let program: Program = serde_json::from_value(json!({
        "functions": [
            {"name": "bad", "instrs": [{"op": "jmp", "labels": ["nowhere"]}]},
            {"name": "good", "instrs": [{"op": "const", "dest": "x", "type": "int", "value": 1}]}
        ]
    }))
    .unwrap();

    let results = analyze_program(&program, AnalysisKind::Defined, &EngineConfig::default());
    assert_eq!(results.len(), 2);

    assert_eq!(results[0].0, "bad");
    assert_eq!(
        results[0].1.as_ref().unwrap_err(),
        &DflowError::UnknownLabel {
            block: "b0".to_string(),
            label: "nowhere".to_string(),
        }
    );

    let good = results[1].1.as_ref().unwrap();
    assert_eq!(good.block("b0").unwrap().output, set(&["x"]));
}

#[test]
fn test_analysis_names_round_trip() {
    for kind in AnalysisKind::ALL {
        assert_eq!(kind.name().parse::<AnalysisKind>().unwrap(), kind);
    }
    assert_eq!(
        "reaching".parse::<AnalysisKind>(),
        Err(DflowError::UnknownAnalysis {
            name: "reaching".to_string()
        })
    );
}

#[test]
fn test_report_serializes_in_and_out() {
    let report = run(&straight_line(), AnalysisKind::Cprop);
    let value = serde_json::to_value(&report).unwrap();

    assert_eq!(value["analysis"], json!("cprop"));
    assert_eq!(value["blocks"][0]["name"], json!("entry"));
    assert_eq!(value["blocks"][0]["in"], json!({}));
    assert_eq!(value["blocks"][0]["out"], json!({"x": 4}));
    assert_eq!(value["blocks"][0]["reachable"], json!(true));
}
