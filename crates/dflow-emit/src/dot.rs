use crate::config::EmitterConfig;
use crate::emitter::EmitResult;
use anyhow::Result;
use dflow_core::ControlFlowGraph;
use std::io::Write;

/// Graphviz output: one node per block in program order, then one edge per successor.
pub struct DotEmitter {
    config: EmitterConfig,
}

impl DotEmitter {
    pub fn new(config: EmitterConfig) -> Self {
        Self { config }
    }

    pub fn emit_graph<W: Write>(
        &self,
        function: &str,
        cfg: &ControlFlowGraph,
        writer: &mut W,
    ) -> EmitResult {
        let indent = self.config.indent.as_str();
        writeln!(writer, "digraph {} {{", quote(function))?;
        for name in cfg.blocks().names() {
            writeln!(writer, "{}{};", indent, quote(name))?;
        }
        for (from, to) in cfg.edges() {
            writeln!(
                writer,
                "{}{} -> {};",
                indent,
                quote(cfg.name(from)),
                quote(cfg.name(to))
            )?;
        }
        writeln!(writer, "}}")?;
        Ok(())
    }

    pub fn graph_to_string(&self, function: &str, cfg: &ControlFlowGraph) -> Result<String> {
        let mut buffer = Vec::new();
        self.emit_graph(function, cfg, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl Default for DotEmitter {
    fn default() -> Self {
        Self::new(EmitterConfig::plain())
    }
}

fn quote(name: &str) -> String {
    format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
}
