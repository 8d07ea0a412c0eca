use super::lattice::intersection;
use super::{Analysis, Direction};
use crate::block::BasicBlock;
use crate::cfg::ControlFlowGraph;
use crate::instructions::Operation;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// A pure computation keyed by opcode and operands. Operands of commutative opcodes are sorted,
/// so `add a b` and `add b a` are the same expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Expr {
    pub op: String,
    pub operands: Vec<String>,
}

impl Expr {
    /// The expression `op` computes, if it is one: it must write a destination, read at least
    /// one variable, and be neither a constant nor a call.
    pub fn from_operation(op: &Operation) -> Option<Self> {
        if op.dest.is_none() || op.args.is_empty() || op.is_const() || op.op == "call" {
            return None;
        }
        let mut operands = op.args.clone();
        if op.is_commutative() {
            operands.sort();
        }
        Some(Self {
            op: op.op.clone(),
            operands,
        })
    }

    pub fn mentions(&self, var: &str) -> bool {
        self.operands.iter().any(|v| v == var)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.op, self.operands.join(","))
    }
}

/// Expressions computed on every path to this point and not invalidated since.
///
/// Starts from the universe of all expressions in the function and meets by intersection; a
/// block with no incoming facts sees the whole universe.
#[derive(Debug, Clone, Default)]
pub struct AvailableExpressions {
    universe: BTreeSet<Expr>,
    gen_sets: IndexMap<String, BTreeSet<Expr>>,
    kill_sets: IndexMap<String, BTreeSet<Expr>>,
}

impl AvailableExpressions {
    pub fn new(cfg: &ControlFlowGraph) -> Self {
        let universe: BTreeSet<Expr> = cfg
            .blocks()
            .iter()
            .flat_map(|(_, block)| block.iter())
            .filter_map(Expr::from_operation)
            .collect();

        let mut gen_sets = IndexMap::new();
        let mut kill_sets = IndexMap::new();
        for (name, block) in cfg.blocks().iter() {
            gen_sets.insert(name.clone(), Self::generated(block));
            kill_sets.insert(name.clone(), Self::killed(block, &universe));
        }

        Self {
            universe,
            gen_sets,
            kill_sets,
        }
    }

    /// Expressions computed in `block` whose operands are not overwritten later in it.
    fn generated(block: &BasicBlock) -> BTreeSet<Expr> {
        let mut out = BTreeSet::new();
        let mut defined_after = BTreeSet::new();
        for op in block.iter().rev() {
            if let Some(dest) = &op.dest {
                defined_after.insert(dest.as_str());
            }
            if let Some(expr) = Expr::from_operation(op) {
                if !expr.operands.iter().any(|v| defined_after.contains(v.as_str())) {
                    out.insert(expr);
                }
            }
        }
        out
    }

    /// Every expression in the universe that reads a variable `block` writes.
    fn killed(block: &BasicBlock, universe: &BTreeSet<Expr>) -> BTreeSet<Expr> {
        let defs = block.defs();
        if defs.is_empty() {
            return BTreeSet::new();
        }
        universe
            .iter()
            .filter(|expr| defs.iter().any(|d| expr.mentions(d)))
            .cloned()
            .collect()
    }

    pub fn universe(&self) -> &BTreeSet<Expr> {
        &self.universe
    }

    pub fn gen_set(&self, block: &str) -> Option<&BTreeSet<Expr>> {
        self.gen_sets.get(block)
    }

    pub fn kill_set(&self, block: &str) -> Option<&BTreeSet<Expr>> {
        self.kill_sets.get(block)
    }
}

impl Analysis for AvailableExpressions {
    type Value = BTreeSet<Expr>;

    fn name(&self) -> &'static str {
        "available"
    }

    fn direction(&self) -> Direction {
        Direction::Forward
    }

    fn init(&self) -> Self::Value {
        self.universe.clone()
    }

    fn merge(&self, values: &[&Self::Value]) -> Self::Value {
        intersection(&self.universe, values)
    }

    fn transfer(&self, name: &str, _block: &BasicBlock, input: &Self::Value) -> Self::Value {
        let mut out: BTreeSet<Expr> = match self.kill_sets.get(name) {
            Some(kill) => input.difference(kill).cloned().collect(),
            None => input.clone(),
        };
        if let Some(generated) = self.gen_sets.get(name) {
            out.extend(generated.iter().cloned());
        }
        out
    }
}
