use super::lattice::{ConstEnv, ConstValue};
use super::{Analysis, Direction};
use crate::block::BasicBlock;

/// Tracks which variables hold a single known literal.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantPropagation;

impl Analysis for ConstantPropagation {
    type Value = ConstEnv;

    fn name(&self) -> &'static str {
        "cprop"
    }

    fn direction(&self) -> Direction {
        Direction::Forward
    }

    fn init(&self) -> Self::Value {
        ConstEnv::new()
    }

    /// Per variable: agreeing literals survive, anything else becomes unknown.
    fn merge(&self, values: &[&Self::Value]) -> Self::Value {
        let mut out = ConstEnv::new();
        for env in values {
            for (name, value) in env.iter() {
                match out.get(name) {
                    None => {
                        out.insert(name.clone(), value.clone());
                    }
                    Some(existing) if existing != value => {
                        out.insert(name.clone(), ConstValue::Unknown);
                    }
                    Some(_) => {}
                }
            }
        }
        out
    }

    fn transfer(&self, _name: &str, block: &BasicBlock, input: &Self::Value) -> Self::Value {
        let mut out = input.clone();
        for op in block {
            let Some(dest) = &op.dest else {
                continue;
            };
            let value = match (&op.value, op.is_const()) {
                (Some(lit), true) => ConstValue::Known(lit.clone()),
                _ => ConstValue::Unknown,
            };
            out.insert(dest.clone(), value);
        }
        out
    }
}
