/*! Control-flow graphs and fixed-point dataflow facts for Bril-style functions.
 *
 * A function arrives as a flat list of labels and operations. This crate cuts it into basic
 * blocks, wires the blocks into a control-flow graph, and runs worklist analyses (defined
 * variables, liveness, constant propagation, reaching definitions, available expressions) to a
 * fixed point. It never rewrites the program; it only reports facts per block.
 */

pub mod analysis;
pub mod block;
pub mod cfg;
pub mod function;
pub mod instructions;

pub use analysis::{
    analyze_function, analyze_program, Analysis, AnalysisKind, BlockFacts, ConstValue,
    ControlFlowShape, Direction, DominatorTree, EngineConfig, FunctionReport, LatticeValue,
    Solution, WorklistOrder,
};
pub use block::{form_blocks, BasicBlock, Blocks};
pub use cfg::{BlockMap, ControlFlowGraph};
pub use function::{Argument, Function, Program};
pub use instructions::{Instruction, Literal, Operation, Type};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DflowError {
    #[error("Synthetic block name `{name}` collides with a label")]
    NamingConflict { name: String },
    #[error("Label `{label}` is defined more than once")]
    DuplicateLabel { label: String },
    #[error("Block `{block}` branches to unknown label `{label}`")]
    UnknownLabel { block: String, label: String },
    #[error("Unknown analysis `{name}` (expected defined, live, cprop, rdefs or available)")]
    UnknownAnalysis { name: String },
}

pub type Result<T> = std::result::Result<T, DflowError>;

#[cfg(test)]
mod tests;
