use super::lattice::union;
use super::{Analysis, Direction};
use crate::block::BasicBlock;
use crate::cfg::ControlFlowGraph;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// One assignment in the function: variable `var` written by instruction `index` of `block`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DefSite {
    pub var: String,
    pub block: String,
    pub index: usize,
}

impl DefSite {
    pub fn new(var: impl Into<String>, block: impl Into<String>, index: usize) -> Self {
        Self {
            var: var.into(),
            block: block.into(),
            index,
        }
    }
}

impl fmt::Display for DefSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}.{}", self.var, self.block, self.index)
    }
}

/// Which assignments may still be in effect at each point.
///
/// GEN and KILL are computed once per function when the analysis is built.
#[derive(Debug, Clone, Default)]
pub struct ReachingDefinitions {
    gen_sets: IndexMap<String, BTreeSet<DefSite>>,
    kill_sets: IndexMap<String, BTreeSet<DefSite>>,
}

impl ReachingDefinitions {
    pub fn new(cfg: &ControlFlowGraph) -> Self {
        let mut defs_by_var: BTreeMap<&str, BTreeSet<DefSite>> = BTreeMap::new();
        for (name, block) in cfg.blocks().iter() {
            for (index, op) in block.iter().enumerate() {
                if let Some(var) = &op.dest {
                    defs_by_var
                        .entry(var.as_str())
                        .or_default()
                        .insert(DefSite::new(var.as_str(), name.as_str(), index));
                }
            }
        }

        let mut gen_sets = IndexMap::new();
        let mut kill_sets = IndexMap::new();
        for (name, block) in cfg.blocks().iter() {
            let gen_b = Self::last_definitions(name, block);

            let mut kill_b = BTreeSet::new();
            for site in &gen_b {
                if let Some(all) = defs_by_var.get(site.var.as_str()) {
                    kill_b.extend(all.iter().filter(|d| *d != site).cloned());
                }
            }

            gen_sets.insert(name.clone(), gen_b);
            kill_sets.insert(name.clone(), kill_b);
        }

        Self {
            gen_sets,
            kill_sets,
        }
    }

    /// The final write of each variable assigned in `block`.
    fn last_definitions(name: &str, block: &BasicBlock) -> BTreeSet<DefSite> {
        let mut seen = BTreeSet::new();
        let mut out = BTreeSet::new();
        for (index, op) in block.iter().enumerate().rev() {
            if let Some(var) = &op.dest {
                if seen.insert(var.as_str()) {
                    out.insert(DefSite::new(var.as_str(), name, index));
                }
            }
        }
        out
    }

    pub fn gen_set(&self, block: &str) -> Option<&BTreeSet<DefSite>> {
        self.gen_sets.get(block)
    }

    pub fn kill_set(&self, block: &str) -> Option<&BTreeSet<DefSite>> {
        self.kill_sets.get(block)
    }
}

impl Analysis for ReachingDefinitions {
    type Value = BTreeSet<DefSite>;

    fn name(&self) -> &'static str {
        "rdefs"
    }

    fn direction(&self) -> Direction {
        Direction::Forward
    }

    fn init(&self) -> Self::Value {
        BTreeSet::new()
    }

    fn merge(&self, values: &[&Self::Value]) -> Self::Value {
        union(values)
    }

    fn transfer(&self, name: &str, _block: &BasicBlock, input: &Self::Value) -> Self::Value {
        let mut out: BTreeSet<DefSite> = match self.kill_sets.get(name) {
            Some(kill) => input.difference(kill).cloned().collect(),
            None => input.clone(),
        };
        if let Some(generated) = self.gen_sets.get(name) {
            out.extend(generated.iter().cloned());
        }
        out
    }
}
