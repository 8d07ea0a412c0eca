//! The worklist fixed-point solver.
//!
//! Runs any [`Analysis`] over a [`ControlFlowGraph`] in the analysis' own direction and hands
//! back IN/OUT tables in program terms: IN is always what flows into a block, OUT what flows out
//! of it. Only blocks reachable from the start node (entry for forward analyses, the last block
//! for backward ones) take part; the others are simply absent from the tables.
//!
//! Termination relies on the analysis: `merge` and `transfer` must be monotone over a lattice of
//! finite height. The solver does not check this.

use super::Analysis;
use crate::cfg::{ControlFlowGraph, Direction};
use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Which pending block is processed next. Any order reaches the same fixed point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorklistOrder {
    #[default]
    Fifo,
    Lifo,
    Shuffled {
        seed: u64,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub order: WorklistOrder,
    /// Skip pushing a block that is already waiting in the worklist.
    pub dedup_worklist: bool,
}

impl EngineConfig {
    pub fn with_order(mut self, order: WorklistOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_dedup(mut self, dedup: bool) -> Self {
        self.dedup_worklist = dedup;
        self
    }
}

struct Worklist {
    queue: VecDeque<usize>,
    queued: Vec<bool>,
    order: WorklistOrder,
    dedup: bool,
    rng: Option<StdRng>,
}

impl Worklist {
    fn new(size: usize, config: &EngineConfig) -> Self {
        let rng = match config.order {
            WorklistOrder::Shuffled { seed } => Some(StdRng::seed_from_u64(seed)),
            WorklistOrder::Fifo | WorklistOrder::Lifo => None,
        };
        Self {
            queue: VecDeque::with_capacity(size),
            queued: vec![false; size],
            order: config.order,
            dedup: config.dedup_worklist,
            rng,
        }
    }

    fn push(&mut self, node: usize) {
        if self.dedup && self.queued[node] {
            return;
        }
        self.queued[node] = true;
        self.queue.push_back(node);
    }

    fn pop(&mut self) -> Option<usize> {
        let node = match (self.order, self.rng.as_mut()) {
            (WorklistOrder::Shuffled { .. }, Some(rng)) if !self.queue.is_empty() => {
                let index = rng.gen_range(0..self.queue.len());
                self.queue.swap_remove_back(index)
            }
            (WorklistOrder::Lifo, _) => self.queue.pop_back(),
            (WorklistOrder::Shuffled { .. }, _) | (WorklistOrder::Fifo, _) => {
                self.queue.pop_front()
            }
        }?;
        self.queued[node] = false;
        Some(node)
    }
}

/// Fixed-point IN/OUT tables for the reachable blocks, keyed by block name in program order.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution<V> {
    pub input: IndexMap<String, V>,
    pub output: IndexMap<String, V>,
    /// Number of blocks popped from the worklist.
    pub visits: usize,
}

impl<V> Solution<V> {
    pub fn empty() -> Self {
        Self {
            input: IndexMap::new(),
            output: IndexMap::new(),
            visits: 0,
        }
    }

    pub fn is_reachable(&self, block: &str) -> bool {
        self.output.contains_key(block)
    }
}

pub fn solve<A: Analysis>(
    cfg: &ControlFlowGraph,
    analysis: &A,
    config: &EngineConfig,
) -> Solution<A::Value> {
    run(cfg, analysis, config, None)
}

/// Like [`solve`], but starts every reachable block from the facts in `seed` rather than from
/// `init`. Seeding with a previous fixed point returns that same fixed point.
pub fn solve_seeded<A: Analysis>(
    cfg: &ControlFlowGraph,
    analysis: &A,
    config: &EngineConfig,
    seed: &Solution<A::Value>,
) -> Solution<A::Value> {
    let flowing_out = match analysis.direction() {
        Direction::Forward => &seed.output,
        Direction::Backward => &seed.input,
    };
    run(cfg, analysis, config, Some(flowing_out))
}

fn run<A: Analysis>(
    cfg: &ControlFlowGraph,
    analysis: &A,
    config: &EngineConfig,
    seed: Option<&IndexMap<String, A::Value>>,
) -> Solution<A::Value> {
    let direction = analysis.direction();
    let Some(start) = cfg.start(direction) else {
        return Solution::empty();
    };

    let reachable = cfg.reachable_from(start, direction);
    let init = analysis.init();

    // `flow_in`/`flow_out` follow the analysis direction; they are swapped back at the end.
    let mut flow_in: Vec<Option<A::Value>> = vec![None; cfg.len()];
    flow_in[start] = Some(init.clone());
    let mut flow_out: Vec<Option<A::Value>> = (0..cfg.len())
        .map(|node| {
            reachable[node].then(|| {
                seed.and_then(|s| s.get(cfg.name(node)).cloned())
                    .unwrap_or_else(|| init.clone())
            })
        })
        .collect();

    let mut worklist = Worklist::new(cfg.len(), config);
    let seeding: Box<dyn Iterator<Item = usize>> = match direction {
        Direction::Forward => Box::new(0..cfg.len()),
        Direction::Backward => Box::new((0..cfg.len()).rev()),
    };
    for node in seeding.filter(|&n| reachable[n]) {
        worklist.push(node);
    }

    let mut visits = 0;
    while let Some(node) = worklist.pop() {
        visits += 1;
        let Some(block) = cfg.block(node) else {
            continue;
        };

        let incoming: Vec<&A::Value> = cfg
            .flow_in(node, direction)
            .iter()
            .filter(|&&p| reachable[p])
            .filter_map(|&p| flow_out[p].as_ref())
            .collect();
        let input = if node == start && incoming.is_empty() {
            init.clone()
        } else {
            analysis.merge(&incoming)
        };

        let output = analysis.transfer(cfg.name(node), block, &input);
        flow_in[node] = Some(input);

        if flow_out[node].as_ref() != Some(&output) {
            trace!(block = cfg.name(node), "facts changed");
            flow_out[node] = Some(output);
            for &next in cfg.flow_out(node, direction) {
                if reachable[next] {
                    worklist.push(next);
                }
            }
        }
    }

    debug!(
        analysis = analysis.name(),
        blocks = cfg.len(),
        reachable = reachable.iter().filter(|&&r| r).count(),
        visits,
        "reached fixed point"
    );

    let into_table = |states: Vec<Option<A::Value>>| -> IndexMap<String, A::Value> {
        states
            .into_iter()
            .enumerate()
            .filter_map(|(node, state)| state.map(|v| (cfg.name(node).to_string(), v)))
            .collect()
    };
    let (flow_in, flow_out) = (into_table(flow_in), into_table(flow_out));

    match direction {
        Direction::Forward => Solution {
            input: flow_in,
            output: flow_out,
            visits,
        },
        Direction::Backward => Solution {
            input: flow_out,
            output: flow_in,
            visits,
        },
    }
}
