use crate::config::EmitterConfig;
use crate::emitter::{EmitResult, Emitter};
use colored::Colorize;
use dflow_core::{BlockFacts, FunctionReport};
use std::io::Write;

/// Prints per-block IN/OUT facts:
///
/// ```text
/// entry:
///   in:  ∅
///   out: x: 4
/// ```
pub struct FactEmitter {
    config: EmitterConfig,
}

impl FactEmitter {
    pub fn new(config: EmitterConfig) -> Self {
        Self { config }
    }

    fn emit_block<W: Write>(&self, block: &BlockFacts, writer: &mut W) -> EmitResult {
        let indent = self.config.indent.as_str();
        let name = if self.config.use_colors {
            block.name.bold().to_string()
        } else {
            block.name.clone()
        };
        writeln!(writer, "{}:", name)?;

        let input = block.input.to_string();
        let output = block.output.to_string();
        if !block.reachable && self.config.show_unreachable_tag {
            let tag = if self.config.use_colors {
                "(unreachable)".dimmed().to_string()
            } else {
                "(unreachable)".to_string()
            };
            writeln!(writer, "{}in:  {}  {}", indent, input, tag)?;
            writeln!(writer, "{}out: {}  {}", indent, output, tag)?;
        } else {
            writeln!(writer, "{}in:  {}", indent, input)?;
            writeln!(writer, "{}out: {}", indent, output)?;
        }
        Ok(())
    }

    /// Several reports in a row. Each gets an `@name:` header when there is more than one.
    pub fn emit_all<W: Write>(&self, reports: &[FunctionReport], writer: &mut W) -> EmitResult {
        let headers = reports.len() > 1;
        for (i, report) in reports.iter().enumerate() {
            if headers {
                if i > 0 {
                    writeln!(writer)?;
                }
                let header = format!("@{}:", report.function);
                if self.config.use_colors {
                    writeln!(writer, "{}", header.cyan())?;
                } else {
                    writeln!(writer, "{}", header)?;
                }
            }
            self.emit(report, writer)?;
        }
        Ok(())
    }
}

impl Default for FactEmitter {
    fn default() -> Self {
        Self::new(EmitterConfig::default())
    }
}

impl Emitter for FactEmitter {
    type Item = FunctionReport;

    fn emit<W: Write>(&self, report: &FunctionReport, writer: &mut W) -> EmitResult {
        for block in &report.blocks {
            self.emit_block(block, writer)?;
        }
        Ok(())
    }
}
