/*! One import for reading Bril programs, analyzing them and printing the results.
 *
 * Re-exports the core CFG and analysis types, the JSON/text readers and the printers.
 */

pub use dflow_core as core;
pub use dflow_emit as emit;
pub use dflow_parser as parser;

pub use dflow_core::{
    analysis::{AnalysisKind, EngineConfig, FunctionReport, LatticeValue, WorklistOrder},
    analyze_function, analyze_program,
    block::{form_blocks, BasicBlock},
    cfg::{BlockMap, ControlFlowGraph, Direction},
    function::{Function, Program},
    instructions::{Instruction, Operation},
    DflowError,
};

pub use dflow_emit::{DotEmitter, EmitterConfig, FactEmitter};

pub use dflow_parser::{load, parse_json, parse_text, Syntax};
