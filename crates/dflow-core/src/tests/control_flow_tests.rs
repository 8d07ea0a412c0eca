use super::fixtures::{cfg, counting_loop, diamond, with_dead_block};
use crate::analysis::control_flow::{back_edges, is_reducible, path_lengths, reverse_postorder};
use crate::analysis::{ControlFlowShape, DominatorTree};
use crate::cfg::ControlFlowGraph;
use pretty_assertions::assert_eq;
use serde_json::json;

fn names(cfg: &ControlFlowGraph, blocks: &[usize]) -> Vec<String> {
    blocks.iter().map(|&b| cfg.name(b).to_string()).collect()
}

#[test]
fn test_path_lengths_skip_unreachable_blocks() {
    let cfg = ControlFlowGraph::from_function(&with_dead_block()).unwrap();
    let lengths = path_lengths(&cfg);

    assert_eq!(lengths.get("entry"), Some(&0));
    assert_eq!(lengths.get("exit"), Some(&1));
    assert_eq!(lengths.get("dead"), None);
}

#[test]
fn test_path_lengths_take_shortest_route() {
    let cfg = ControlFlowGraph::from_function(&diamond()).unwrap();
    let lengths: Vec<(String, usize)> = path_lengths(&cfg).into_iter().collect();

    assert_eq!(
        lengths,
        vec![
            ("b0".to_string(), 0),
            ("left".to_string(), 1),
            ("right".to_string(), 1),
            ("merge".to_string(), 2),
        ]
    );
}

#[test]
fn test_reverse_postorder_puts_entry_first() {
    let cfg = ControlFlowGraph::from_function(&counting_loop()).unwrap();
    let order = names(&cfg, &reverse_postorder(&cfg));

    assert_eq!(order.first().map(String::as_str), Some("b0"));
    assert_eq!(order.len(), 4);
    let header = order.iter().position(|n| n == "header").unwrap();
    let body = order.iter().position(|n| n == "body").unwrap();
    let done = order.iter().position(|n| n == "done").unwrap();
    assert!(header < body);
    assert!(header < done);
}

#[test]
fn test_loop_back_edge_and_dominators() {
    let cfg = ControlFlowGraph::from_function(&counting_loop()).unwrap();

    let edges: Vec<(String, String)> = back_edges(&cfg)
        .into_iter()
        .map(|(a, b)| (cfg.name(a).to_string(), cfg.name(b).to_string()))
        .collect();
    assert_eq!(edges, vec![("body".to_string(), "header".to_string())]);

    let dom = DominatorTree::build(&cfg);
    let header = cfg.index_of("header").unwrap();
    let body = cfg.index_of("body").unwrap();
    let done = cfg.index_of("done").unwrap();
    assert!(dom.dominates(0, body));
    assert!(dom.dominates(header, body));
    assert!(!dom.dominates(body, done));
    assert_eq!(dom.immediate_dominator(body), Some(header));
    assert_eq!(dom.immediate_dominator(done), Some(header));
    assert_eq!(dom.immediate_dominator(0), None);

    assert!(is_reducible(&cfg));
}

#[test]
fn test_irreducible_graph_is_detected() {
    // Two blocks jump into each other and both are entered from the entry.
    let cfg = cfg(json!({
        "name": "irreducible",
        "instrs": [
            {"label": "entry"},
            {"op": "br", "args": ["c"], "labels": ["x", "y"]},
            {"label": "x"},
            {"op": "br", "args": ["c"], "labels": ["y", "out"]},
            {"label": "y"},
            {"op": "jmp", "labels": ["x"]},
            {"label": "out"},
            {"op": "ret"}
        ]
    }));

    assert!(!is_reducible(&cfg));
}

#[test]
fn test_shape_summary() {
    let cfg = ControlFlowGraph::from_function(&counting_loop()).unwrap();
    let shape = ControlFlowShape::analyze(&cfg);

    assert!(shape.reducible);
    assert_eq!(shape.back_edges, vec![("body".to_string(), "header".to_string())]);
    assert_eq!(shape.path_lengths["done"], 2);
    assert_eq!(shape.reverse_postorder.len(), 4);
}

#[test]
fn test_empty_graph_shape() {
    let cfg = cfg(json!({"name": "empty", "instrs": []}));
    let shape = ControlFlowShape::analyze(&cfg);

    assert!(shape.path_lengths.is_empty());
    assert!(shape.reverse_postorder.is_empty());
    assert!(shape.back_edges.is_empty());
    assert!(shape.reducible);
}
