use super::dominator::DominatorTree;
use crate::cfg::ControlFlowGraph;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::VecDeque;

/// Shortest edge count from the entry block to every block it reaches, in program order.
pub fn path_lengths(cfg: &ControlFlowGraph) -> IndexMap<String, usize> {
    let Some(entry) = cfg.entry() else {
        return IndexMap::new();
    };

    let mut distances: Vec<Option<usize>> = vec![None; cfg.len()];
    distances[entry] = Some(0);
    let mut queue = VecDeque::from([entry]);

    while let Some(current) = queue.pop_front() {
        let next_dist = distances[current].unwrap_or_default() + 1;
        for &succ in cfg.successors(current) {
            if distances[succ].is_none() {
                distances[succ] = Some(next_dist);
                queue.push_back(succ);
            }
        }
    }

    distances
        .into_iter()
        .enumerate()
        .filter_map(|(block, dist)| dist.map(|d| (cfg.name(block).to_string(), d)))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    Active,
    Done,
}

struct DepthFirst {
    postorder: Vec<usize>,
    retreating: Vec<(usize, usize)>,
}

fn depth_first(cfg: &ControlFlowGraph) -> DepthFirst {
    let mut result = DepthFirst {
        postorder: Vec::with_capacity(cfg.len()),
        retreating: Vec::new(),
    };
    let Some(entry) = cfg.entry() else {
        return result;
    };

    let mut state = vec![Visit::New; cfg.len()];
    state[entry] = Visit::Active;
    let mut stack = vec![(entry, 0usize)];

    while let Some(&(block, next)) = stack.last() {
        match cfg.successors(block).get(next) {
            Some(&succ) => {
                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }
                match state[succ] {
                    Visit::New => {
                        state[succ] = Visit::Active;
                        stack.push((succ, 0));
                    }
                    Visit::Active => result.retreating.push((block, succ)),
                    Visit::Done => {}
                }
            }
            None => {
                state[block] = Visit::Done;
                result.postorder.push(block);
                stack.pop();
            }
        }
    }

    result
}

/// Reachable blocks in reverse postorder of a depth-first walk from the entry.
pub fn reverse_postorder(cfg: &ControlFlowGraph) -> Vec<usize> {
    let mut order = depth_first(cfg).postorder;
    order.reverse();
    order
}

/// Edges whose target is still on the depth-first stack when the edge is taken.
pub fn back_edges(cfg: &ControlFlowGraph) -> Vec<(usize, usize)> {
    depth_first(cfg).retreating
}

/// A CFG is reducible when every retreating edge points at a block that dominates its source.
pub fn is_reducible(cfg: &ControlFlowGraph) -> bool {
    let retreating = back_edges(cfg);
    if retreating.is_empty() {
        return true;
    }
    let dom = DominatorTree::build(cfg);
    retreating
        .iter()
        .all(|&(from, to)| dom.dominates(to, from))
}

/// Structural facts about a function's CFG, by block name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlFlowShape {
    pub path_lengths: IndexMap<String, usize>,
    pub reverse_postorder: Vec<String>,
    pub back_edges: Vec<(String, String)>,
    pub reducible: bool,
}

impl ControlFlowShape {
    pub fn analyze(cfg: &ControlFlowGraph) -> Self {
        let name = |block: usize| cfg.name(block).to_string();
        Self {
            path_lengths: path_lengths(cfg),
            reverse_postorder: reverse_postorder(cfg).into_iter().map(name).collect(),
            back_edges: back_edges(cfg)
                .into_iter()
                .map(|(from, to)| (name(from), name(to)))
                .collect(),
            reducible: is_reducible(cfg),
        }
    }
}
