use super::lattice::union;
use super::{Analysis, Direction};
use crate::block::BasicBlock;
use std::collections::BTreeSet;

/// Variables that may be read along some path before being overwritten.
///
/// Flows backward: `transfer` receives the facts leaving the block and returns those entering it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveVariables;

impl Analysis for LiveVariables {
    type Value = BTreeSet<String>;

    fn name(&self) -> &'static str {
        "live"
    }

    fn direction(&self) -> Direction {
        Direction::Backward
    }

    fn init(&self) -> Self::Value {
        BTreeSet::new()
    }

    fn merge(&self, values: &[&Self::Value]) -> Self::Value {
        union(values)
    }

    fn transfer(&self, _name: &str, block: &BasicBlock, out: &Self::Value) -> Self::Value {
        let defs = block.defs();
        let mut live = block.upward_exposed_uses();
        live.extend(out.iter().filter(|v| !defs.contains(*v)).cloned());
        live
    }
}
