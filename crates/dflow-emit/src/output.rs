use anyhow::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Dot,
}

pub struct JsonFormatter;

impl JsonFormatter {
    pub fn format_object<W: Write, T: Serialize + ?Sized>(writer: &mut W, obj: &T) -> Result<()> {
        serde_json::to_writer_pretty(&mut *writer, obj)?;
        writeln!(writer)?;
        Ok(())
    }

    pub fn to_string<T: Serialize + ?Sized>(obj: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(obj)?)
    }
}
