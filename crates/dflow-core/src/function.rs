use crate::instructions::{Instruction, Type};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub functions: Vec<Function>,
}

impl Program {
    pub fn new(functions: Vec<Function>) -> Self {
        Self { functions }
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Argument>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<Type>,
    #[serde(default)]
    pub instrs: Vec<Instruction>,
}

impl Function {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            return_type: None,
            instrs: Vec::new(),
        }
    }

    pub fn with_instructions<I>(name: impl Into<String>, instrs: I) -> Self
    where
        I: IntoIterator<Item = Instruction>,
    {
        Self {
            instrs: instrs.into_iter().collect(),
            ..Self::new(name)
        }
    }

    pub fn push(&mut self, instr: impl Into<Instruction>) {
        self.instrs.push(instr.into());
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
}

impl Argument {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}
