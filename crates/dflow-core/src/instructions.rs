use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Opcodes that end a basic block.
pub const TERMINATORS: &[&str] = &["jmp", "br", "ret", "call"];

/// Opcodes that transfer control explicitly. A block ending in anything else falls through.
pub const CONTROL_OPS: &[&str] = &["jmp", "br", "ret"];

/// Opcodes whose operands may be reordered without changing the result.
pub const COMMUTATIVE_OPS: &[&str] = &["add", "mul", "and", "or", "eq", "fadd", "fmul", "feq"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Instruction {
    Label { label: String },
    Op(Operation),
}

impl Instruction {
    pub fn label(name: impl Into<String>) -> Self {
        Instruction::Label { label: name.into() }
    }

    pub fn as_operation(&self) -> Option<&Operation> {
        match self {
            Instruction::Op(op) => Some(op),
            Instruction::Label { .. } => None,
        }
    }
}

impl From<Operation> for Instruction {
    fn from(op: Operation) -> Self {
        Instruction::Op(op)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Operation {
    pub op: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<Type>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub funcs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Literal>,
}

impl Operation {
    pub fn new(op: impl Into<String>) -> Self {
        Self {
            op: op.into(),
            ..Self::default()
        }
    }

    pub fn constant(dest: impl Into<String>, value: impl Into<Literal>) -> Self {
        let value = value.into();
        Self {
            op: "const".to_string(),
            dest: Some(dest.into()),
            ty: Some(value.ty()),
            value: Some(value),
            ..Self::default()
        }
    }

    pub fn value_op<I, S>(op: impl Into<String>, dest: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            op: op.into(),
            dest: Some(dest.into()),
            args: args.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn effect_op<I, S>(op: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            op: op.into(),
            args: args.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn jump(target: impl Into<String>) -> Self {
        Self {
            op: "jmp".to_string(),
            labels: vec![target.into()],
            ..Self::default()
        }
    }

    pub fn branch(
        condition: impl Into<String>,
        then_label: impl Into<String>,
        else_label: impl Into<String>,
    ) -> Self {
        Self {
            op: "br".to_string(),
            args: vec![condition.into()],
            labels: vec![then_label.into(), else_label.into()],
            ..Self::default()
        }
    }

    pub fn ret() -> Self {
        Self::new("ret")
    }

    pub fn with_type(mut self, ty: Type) -> Self {
        self.ty = Some(ty);
        self
    }

    pub fn is_terminator(&self) -> bool {
        TERMINATORS.contains(&self.op.as_str())
    }

    /// True for `jmp`, `br` and `ret`, which decide the block's successors themselves.
    pub fn is_control(&self) -> bool {
        CONTROL_OPS.contains(&self.op.as_str())
    }

    pub fn is_const(&self) -> bool {
        self.op == "const"
    }

    pub fn is_commutative(&self) -> bool {
        COMMUTATIVE_OPS.contains(&self.op.as_str())
    }
}

/// A literal carried by `const`. Floats compare by bit pattern so equality stays total.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
}

impl Literal {
    pub fn ty(&self) -> Type {
        let name = match self {
            Literal::Bool(_) => "bool",
            Literal::Int(_) => "int",
            Literal::Float(_) => "float",
            Literal::Char(_) => "char",
        };
        Type::Primitive(name.to_string())
    }
}

impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Literal::Bool(a), Literal::Bool(b)) => a == b,
            (Literal::Int(a), Literal::Int(b)) => a == b,
            (Literal::Float(a), Literal::Float(b)) => a.to_bits() == b.to_bits(),
            (Literal::Char(a), Literal::Char(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Literal {}

impl Hash for Literal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Literal::Bool(b) => b.hash(state),
            Literal::Int(i) => i.hash(state),
            Literal::Float(f) => f.to_bits().hash(state),
            Literal::Char(c) => c.hash(state),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Float(x) => write!(f, "{:?}", x),
            Literal::Char(c) => write!(f, "'{}'", c),
        }
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Int(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Float(value)
    }
}

impl From<char> for Literal {
    fn from(value: char) -> Self {
        Literal::Char(value)
    }
}

/// Bril types: a primitive name such as `int`, or a parameterized one such as `{"ptr": "int"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Type {
    Primitive(String),
    Parameterized(BTreeMap<String, Box<Type>>),
}

impl Type {
    pub fn primitive(name: impl Into<String>) -> Self {
        Type::Primitive(name.into())
    }

    pub fn parameterized(name: impl Into<String>, inner: Type) -> Self {
        Type::Parameterized(BTreeMap::from([(name.into(), Box::new(inner))]))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(name) => write!(f, "{}", name),
            Type::Parameterized(params) => {
                for (name, inner) in params {
                    write!(f, "{}<{}>", name, inner)?;
                }
                Ok(())
            }
        }
    }
}
