use super::lattice::union;
use super::{Analysis, Direction};
use crate::block::BasicBlock;
use std::collections::BTreeSet;

/// Variables that have been assigned on some path to this point.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefinedVariables;

impl Analysis for DefinedVariables {
    type Value = BTreeSet<String>;

    fn name(&self) -> &'static str {
        "defined"
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

    fn transfer(&self, _name: &str, block: &BasicBlock, input: &Self::Value) -> Self::Value {
        let mut out = input.clone();
        out.extend(block.defs());
        out
    }
}
