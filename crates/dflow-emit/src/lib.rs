/*! Render analysis results and control-flow graphs.
 *
 * Facts print as a short indented listing per block, graphs as Graphviz DOT, and both can be
 * dumped as JSON for other tools.
 */

pub mod config;
pub mod dot;
pub mod emitter;
pub mod facts;
pub mod output;

pub use config::{EmitterConfig, IndentStyle};
pub use dot::DotEmitter;
pub use emitter::{EmitResult, Emitter};
pub use facts::FactEmitter;
pub use output::{JsonFormatter, OutputFormat};
