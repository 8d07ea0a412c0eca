use super::fixtures::{arb_function, counting_loop, diamond, with_dead_block};
use crate::analysis::{
    solve, solve_seeded, Analysis, AnalysisKind, AvailableExpressions, ConstantPropagation,
    DefinedVariables, EngineConfig, LiveVariables, ReachingDefinitions, WorklistOrder,
};
use crate::cfg::ControlFlowGraph;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn assert_idempotent<A: Analysis>(cfg: &ControlFlowGraph, analysis: &A) {
    let config = EngineConfig::default();
    let first = solve(cfg, analysis, &config);
    let again = solve_seeded(cfg, analysis, &config, &first);
    assert_eq!(first.input, again.input);
    assert_eq!(first.output, again.output);
}

fn check_all_idempotent(cfg: &ControlFlowGraph) {
    assert_idempotent(cfg, &DefinedVariables);
    assert_idempotent(cfg, &LiveVariables);
    assert_idempotent(cfg, &ConstantPropagation);
    assert_idempotent(cfg, &ReachingDefinitions::new(cfg));
    assert_idempotent(cfg, &AvailableExpressions::new(cfg));
}

fn orders() -> Vec<EngineConfig> {
    vec![
        EngineConfig::default(),
        EngineConfig::default().with_order(WorklistOrder::Lifo),
        EngineConfig::default().with_order(WorklistOrder::Shuffled { seed: 7 }),
        EngineConfig::default()
            .with_order(WorklistOrder::Shuffled { seed: 1234 })
            .with_dedup(true),
        EngineConfig::default().with_dedup(true),
    ]
}

#[test]
fn test_fixed_point_is_stable_when_reseeded() {
    for function in [counting_loop(), diamond(), with_dead_block()] {
        let cfg = ControlFlowGraph::from_function(&function).unwrap();
        check_all_idempotent(&cfg);
    }
}

#[test]
fn test_processing_order_does_not_change_results() {
    let cfg = ControlFlowGraph::from_function(&counting_loop()).unwrap();
    for kind in AnalysisKind::ALL {
        let baseline = kind.run("loop", &cfg, &EngineConfig::default());
        for config in orders() {
            assert_eq!(kind.run("loop", &cfg, &config), baseline, "{:?}", config);
        }
    }
}

#[test]
fn test_backward_solution_is_reported_in_program_terms() {
    let cfg = ControlFlowGraph::from_function(&counting_loop()).unwrap();
    let solution = solve(&cfg, &LiveVariables, &EngineConfig::default());

    // The exit block is the start of a backward analysis: nothing is live after it.
    assert!(solution.output["done"].is_empty());
    assert!(solution.input["done"].contains("i"));
}

#[test]
fn test_unreachable_blocks_are_absent_from_solution() {
    let cfg = ControlFlowGraph::from_function(&with_dead_block()).unwrap();
    let solution = solve(&cfg, &DefinedVariables, &EngineConfig::default());

    assert!(!solution.is_reachable("dead"));
    assert!(!solution.input.contains_key("dead"));
    assert_eq!(solution.output.len(), 2);
    assert!(solution.visits >= 2);
}

#[test]
fn test_entry_without_predecessors_sees_universe() {
    let cfg = ControlFlowGraph::from_function(&diamond()).unwrap();
    let analysis = AvailableExpressions::new(&cfg);
    let solution = solve(&cfg, &analysis, &EngineConfig::default());

    assert_eq!(&solution.input["b0"], analysis.universe());
    assert!(!analysis.universe().is_empty());
}

#[test]
fn test_empty_graph_solves_to_nothing() {
    let cfg = ControlFlowGraph::from_function(&crate::Function::new("empty")).unwrap();
    let solution = solve(&cfg, &ConstantPropagation, &EngineConfig::default());
    assert!(solution.input.is_empty());
    assert!(solution.output.is_empty());
    assert_eq!(solution.visits, 0);
}

proptest! {
    #[test]
    fn prop_fixed_point_is_idempotent(function in arb_function()) {
        let cfg = ControlFlowGraph::from_function(&function).unwrap();
        check_all_idempotent(&cfg);
    }

    #[test]
    fn prop_order_independence(function in arb_function(), seed in any::<u64>()) {
        let cfg = ControlFlowGraph::from_function(&function).unwrap();
        for kind in AnalysisKind::ALL {
            let fifo = kind.run("random", &cfg, &EngineConfig::default());
            let lifo = kind.run(
                "random",
                &cfg,
                &EngineConfig::default().with_order(WorklistOrder::Lifo),
            );
            let shuffled = kind.run(
                "random",
                &cfg,
                &EngineConfig::default().with_order(WorklistOrder::Shuffled { seed }),
            );
            prop_assert_eq!(&fifo, &lifo);
            prop_assert_eq!(&fifo, &shuffled);
        }
    }

    #[test]
    fn prop_unreachable_blocks_report_empty_facts(function in arb_function()) {
        let cfg = ControlFlowGraph::from_function(&function).unwrap();
        for kind in AnalysisKind::ALL {
            let reachable = cfg.reachable(kind.direction());
            let report = kind.run("random", &cfg, &EngineConfig::default());
            for (index, block) in report.blocks.iter().enumerate() {
                prop_assert_eq!(block.reachable, reachable[index]);
                if !block.reachable {
                    prop_assert!(block.input.is_empty());
                    prop_assert!(block.output.is_empty());
                }
            }
        }
    }

    #[test]
    fn prop_reaching_gen_kill_partition(function in arb_function()) {
        let cfg = ControlFlowGraph::from_function(&function).unwrap();
        let rdefs = ReachingDefinitions::new(&cfg);

        for (name, block) in cfg.blocks().iter() {
            let gen_set = rdefs.gen_set(name).unwrap();
            let kill_set = rdefs.kill_set(name).unwrap();

            for var in block.defs() {
                let sites: Vec<usize> = block
                    .iter()
                    .enumerate()
                    .filter(|(_, op)| op.dest.as_deref() == Some(var.as_str()))
                    .map(|(i, _)| i)
                    .collect();
                let last = *sites.last().unwrap();

                let generated: Vec<usize> = gen_set
                    .iter()
                    .filter(|d| d.var == var)
                    .map(|d| d.index)
                    .collect();
                prop_assert_eq!(generated, vec![last]);

                let killed_here: BTreeSet<usize> = kill_set
                    .iter()
                    .filter(|d| d.var == var && d.block == *name)
                    .map(|d| d.index)
                    .collect();
                let expected: BTreeSet<usize> =
                    sites[..sites.len() - 1].iter().copied().collect();
                prop_assert_eq!(killed_here, expected);

                let killed_elsewhere = kill_set
                    .iter()
                    .filter(|d| d.var == var && d.block != *name)
                    .count();
                let defined_elsewhere = cfg
                    .blocks()
                    .iter()
                    .filter(|(other, _)| *other != name)
                    .flat_map(|(_, b)| b.iter())
                    .filter(|op| op.dest.as_deref() == Some(var.as_str()))
                    .count();
                prop_assert_eq!(killed_elsewhere, defined_elsewhere);
            }
        }
    }
}
