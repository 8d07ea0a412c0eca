use crate::instructions::{Instruction, Operation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A straight-line run of operations with a single entry.
///
/// `label` is the label marker that opened the block in the instruction stream, if any. The
/// marker itself is never part of `instructions`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub instructions: Vec<Operation>,
}

impl BasicBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            instructions: Vec::new(),
        }
    }

    pub fn add_instruction(&mut self, inst: Operation) {
        self.instructions.push(inst);
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.instructions.iter()
    }

    /// The trailing terminator, if the block ends in one.
    pub fn terminator(&self) -> Option<&Operation> {
        self.instructions.last().filter(|op| op.is_terminator())
    }

    /// The trailing `jmp`/`br`/`ret`, i.e. a terminator that decides successors on its own.
    pub fn control(&self) -> Option<&Operation> {
        self.instructions.last().filter(|op| op.is_control())
    }

    /// Variables written anywhere in the block.
    pub fn defs(&self) -> BTreeSet<String> {
        self.instructions
            .iter()
            .filter_map(|op| op.dest.clone())
            .collect()
    }

    /// Variables read before the block writes them.
    pub fn upward_exposed_uses(&self) -> BTreeSet<String> {
        let mut defined = BTreeSet::new();
        let mut used = BTreeSet::new();

        for op in &self.instructions {
            for arg in &op.args {
                if !defined.contains(arg) {
                    used.insert(arg.clone());
                }
            }
            if let Some(dest) = &op.dest {
                defined.insert(dest.clone());
            }
        }

        used
    }
}

impl<'a> IntoIterator for &'a BasicBlock {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

/// Lazily partitions an instruction stream into basic blocks.
///
/// Cloning the iterator restarts partitioning from the clone's position.
#[derive(Debug, Clone)]
pub struct Blocks<'a> {
    remaining: &'a [Instruction],
}

impl<'a> Iterator for Blocks<'a> {
    type Item = BasicBlock;

    fn next(&mut self) -> Option<BasicBlock> {
        let mut current: Option<BasicBlock> = None;

        while let Some((first, rest)) = self.remaining.split_first() {
            match first {
                Instruction::Label { label } => {
                    if current.is_some() {
                        return current;
                    }
                    current = Some(BasicBlock::labeled(label.clone()));
                    self.remaining = rest;
                }
                Instruction::Op(op) => {
                    self.remaining = rest;
                    current
                        .get_or_insert_with(BasicBlock::new)
                        .add_instruction(op.clone());
                    if op.is_terminator() {
                        return current;
                    }
                }
            }
        }

        current
    }
}

impl std::iter::FusedIterator for Blocks<'_> {}

/// Split `instrs` at labels and after terminators. An empty stream yields no blocks.
pub fn form_blocks(instrs: &[Instruction]) -> Blocks<'_> {
    Blocks { remaining: instrs }
}
