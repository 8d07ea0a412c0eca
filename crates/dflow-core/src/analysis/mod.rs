/*! Dataflow analyses and the machinery to run them.
 *
 * Every analysis is a direction, an initial fact, a merge and a per-block transfer. The engine
 * iterates those to a fixed point over the reachable part of the CFG; the report layer turns the
 * result into one row per block for printers.
 */

pub mod available;
pub mod control_flow;
pub mod cprop;
pub mod defined;
pub mod dominator;
pub mod engine;
pub mod lattice;
pub mod live;
pub mod reaching;

pub use crate::cfg::Direction;
pub use available::{AvailableExpressions, Expr};
pub use control_flow::ControlFlowShape;
pub use cprop::ConstantPropagation;
pub use defined::DefinedVariables;
pub use dominator::DominatorTree;
pub use engine::{solve, solve_seeded, EngineConfig, Solution, WorklistOrder};
pub use lattice::{ConstEnv, ConstValue, LatticeValue};
pub use live::LiveVariables;
pub use reaching::{DefSite, ReachingDefinitions};

use crate::block::BasicBlock;
use crate::cfg::ControlFlowGraph;
use crate::function::{Function, Program};
use crate::{DflowError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// A forward or backward dataflow problem.
///
/// `merge` and `transfer` must not mutate shared state and must return fresh values; the engine
/// compares old and new facts to decide whether to keep iterating. Both must be monotone over a
/// finite-height lattice or the engine may not terminate.
pub trait Analysis {
    type Value: Clone + PartialEq + fmt::Debug + Default + Into<LatticeValue>;

    fn name(&self) -> &'static str;

    fn direction(&self) -> Direction;

    /// The fact every reachable block starts from.
    fn init(&self) -> Self::Value;

    /// The empty fact printed for blocks the analysis never reaches. Not a lattice element the
    /// engine ever computes with.
    fn empty(&self) -> Self::Value {
        Self::Value::default()
    }

    fn merge(&self, values: &[&Self::Value]) -> Self::Value;

    fn transfer(&self, name: &str, block: &BasicBlock, input: &Self::Value) -> Self::Value;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    Defined,
    Live,
    Cprop,
    Rdefs,
    Available,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 5] = [
        AnalysisKind::Defined,
        AnalysisKind::Live,
        AnalysisKind::Cprop,
        AnalysisKind::Rdefs,
        AnalysisKind::Available,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AnalysisKind::Defined => "defined",
            AnalysisKind::Live => "live",
            AnalysisKind::Cprop => "cprop",
            AnalysisKind::Rdefs => "rdefs",
            AnalysisKind::Available => "available",
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            AnalysisKind::Live => Direction::Backward,
            AnalysisKind::Defined
            | AnalysisKind::Cprop
            | AnalysisKind::Rdefs
            | AnalysisKind::Available => Direction::Forward,
        }
    }

    /// Run this analysis on an already-built CFG.
    pub fn run(
        self,
        function: &str,
        cfg: &ControlFlowGraph,
        config: &EngineConfig,
    ) -> FunctionReport {
        match self {
            AnalysisKind::Defined => report(function, self, cfg, &DefinedVariables, config),
            AnalysisKind::Live => report(function, self, cfg, &LiveVariables, config),
            AnalysisKind::Cprop => report(function, self, cfg, &ConstantPropagation, config),
            AnalysisKind::Rdefs => {
                report(function, self, cfg, &ReachingDefinitions::new(cfg), config)
            }
            AnalysisKind::Available => {
                report(function, self, cfg, &AvailableExpressions::new(cfg), config)
            }
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AnalysisKind {
    type Err = DflowError;

    fn from_str(s: &str) -> Result<Self> {
        AnalysisKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| DflowError::UnknownAnalysis {
                name: s.to_string(),
            })
    }
}

/// Facts for one block. Unreachable blocks carry the analysis' empty value on both sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockFacts {
    pub name: String,
    #[serde(rename = "in")]
    pub input: LatticeValue,
    #[serde(rename = "out")]
    pub output: LatticeValue,
    pub reachable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionReport {
    pub function: String,
    pub analysis: AnalysisKind,
    pub blocks: Vec<BlockFacts>,
}

impl FunctionReport {
    pub fn block(&self, name: &str) -> Option<&BlockFacts> {
        self.blocks.iter().find(|b| b.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Solve `analysis` on `cfg` and lay the result out in program order.
pub fn report<A: Analysis>(
    function: &str,
    kind: AnalysisKind,
    cfg: &ControlFlowGraph,
    analysis: &A,
    config: &EngineConfig,
) -> FunctionReport {
    let solution = solve(cfg, analysis, config);

    let blocks = (0..cfg.len())
        .map(|index| {
            let name = cfg.name(index);
            match (solution.input.get(name), solution.output.get(name)) {
                (Some(input), Some(output)) => BlockFacts {
                    name: name.to_string(),
                    input: input.clone().into(),
                    output: output.clone().into(),
                    reachable: true,
                },
                _ => BlockFacts {
                    name: name.to_string(),
                    input: analysis.empty().into(),
                    output: analysis.empty().into(),
                    reachable: false,
                },
            }
        })
        .collect();

    FunctionReport {
        function: function.to_string(),
        analysis: kind,
        blocks,
    }
}

/// Build the CFG for `function` and run `kind` over it.
///
/// A function with no instructions yields a report with no blocks.
pub fn analyze_function(
    function: &Function,
    kind: AnalysisKind,
    config: &EngineConfig,
) -> Result<FunctionReport> {
    let cfg = ControlFlowGraph::from_function(function)?;
    debug!(
        function = %function.name,
        analysis = %kind,
        blocks = cfg.len(),
        "analyzing function"
    );
    Ok(kind.run(&function.name, &cfg, config))
}

/// Analyze every function independently. A structural error in one function is reported in its
/// slot and does not affect the others.
pub fn analyze_program(
    program: &Program,
    kind: AnalysisKind,
    config: &EngineConfig,
) -> Vec<(String, Result<FunctionReport>)> {
    program
        .functions
        .iter()
        .map(|function| {
            let result = analyze_function(function, kind, config);
            if let Err(err) = &result {
                warn!(function = %function.name, error = %err, "skipping function");
            }
            (function.name.clone(), result)
        })
        .collect()
}
