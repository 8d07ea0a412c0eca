use super::control_flow::reverse_postorder;
use crate::cfg::ControlFlowGraph;
use std::collections::{HashMap, HashSet};

/// Dominators of the blocks reachable from the entry.
#[derive(Debug, Clone, Default)]
pub struct DominatorTree {
    dominators: HashMap<usize, HashSet<usize>>,
    immediate_dominators: HashMap<usize, usize>,
}

impl DominatorTree {
    pub fn build(cfg: &ControlFlowGraph) -> Self {
        let order = reverse_postorder(cfg);
        let Some((&entry, rest)) = order.split_first() else {
            return Self::default();
        };

        let all: HashSet<usize> = order.iter().copied().collect();
        let mut dominators = HashMap::new();
        dominators.insert(entry, HashSet::from([entry]));
        for &block in rest {
            dominators.insert(block, all.clone());
        }

        let mut changed = true;
        while changed {
            changed = false;

            for &block in rest {
                let mut preds = cfg
                    .predecessors(block)
                    .iter()
                    .filter_map(|p| dominators.get(p));

                let mut new_doms = match preds.next() {
                    Some(first) => {
                        let mut acc = first.clone();
                        for pred_doms in preds {
                            acc.retain(|d| pred_doms.contains(d));
                        }
                        acc
                    }
                    None => HashSet::new(),
                };
                new_doms.insert(block);

                if dominators.get(&block) != Some(&new_doms) {
                    dominators.insert(block, new_doms);
                    changed = true;
                }
            }
        }

        let immediate_dominators = Self::compute_immediate_dominators(&dominators, entry);

        Self {
            dominators,
            immediate_dominators,
        }
    }

    // Strict dominators form a chain; the immediate one has the most dominators itself.
    fn compute_immediate_dominators(
        dominators: &HashMap<usize, HashSet<usize>>,
        entry: usize,
    ) -> HashMap<usize, usize> {
        let mut idoms = HashMap::new();

        for (&block, doms) in dominators {
            if block == entry {
                continue;
            }

            let idom = doms
                .iter()
                .filter(|&&d| d != block)
                .max_by_key(|&&d| dominators.get(&d).map(|s| s.len()).unwrap_or(0));

            if let Some(&idom) = idom {
                idoms.insert(block, idom);
            }
        }

        idoms
    }

    pub fn dominates(&self, a: usize, b: usize) -> bool {
        self.dominators
            .get(&b)
            .map(|doms| doms.contains(&a))
            .unwrap_or(false)
    }

    pub fn immediate_dominator(&self, block: usize) -> Option<usize> {
        self.immediate_dominators.get(&block).copied()
    }

    pub fn is_reachable(&self, block: usize) -> bool {
        self.dominators.contains_key(&block)
    }
}
