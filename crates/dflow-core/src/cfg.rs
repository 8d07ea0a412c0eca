use crate::block::{form_blocks, BasicBlock};
use crate::function::Function;
use crate::instructions::Operation;
use crate::{DflowError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// Which way facts flow through the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub fn is_forward(self) -> bool {
        matches!(self, Direction::Forward)
    }
}

/// Blocks keyed by name, in program order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMap {
    blocks: IndexMap<String, BasicBlock>,
}

impl BlockMap {
    /// Name each block after its label, or `b<index>` when it has none.
    pub fn build<I>(blocks: I) -> Result<Self>
    where
        I: IntoIterator<Item = BasicBlock>,
    {
        let blocks: Vec<BasicBlock> = blocks.into_iter().collect();

        let mut labels = HashSet::new();
        for label in blocks.iter().filter_map(|b| b.label.as_deref()) {
            if !labels.insert(label) {
                return Err(DflowError::DuplicateLabel {
                    label: label.to_string(),
                });
            }
        }

        let mut out = IndexMap::with_capacity(blocks.len());
        for (index, block) in blocks.iter().enumerate() {
            let name = match &block.label {
                Some(label) => label.clone(),
                None => {
                    let synthetic = format!("b{}", index);
                    if labels.contains(synthetic.as_str()) {
                        return Err(DflowError::NamingConflict { name: synthetic });
                    }
                    synthetic
                }
            };
            out.insert(name, block.clone());
        }

        Ok(Self { blocks: out })
    }

    pub fn from_function(function: &Function) -> Result<Self> {
        Self::build(form_blocks(&function.instrs))
    }

    /// Give every block an explicit `jmp`/`br`/`ret` at its end.
    ///
    /// A block without one jumps to its lexical successor, and the last block returns.
    pub fn add_terminators(&mut self) {
        let names: Vec<String> = self.blocks.keys().cloned().collect();
        let last = names.len().saturating_sub(1);

        for (index, block) in self.blocks.values_mut().enumerate() {
            if block.control().is_some() {
                continue;
            }
            let synthesized = if index == last {
                Operation::ret()
            } else {
                Operation::jump(names[index + 1].clone())
            };
            block.add_instruction(synthesized);
        }
    }

    pub fn get(&self, name: &str) -> Option<&BasicBlock> {
        self.blocks.get(name)
    }

    pub fn get_index(&self, index: usize) -> Option<(&String, &BasicBlock)> {
        self.blocks.get_index(index)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.blocks.get_index_of(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.blocks.keys().map(String::as_str)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, BasicBlock> {
        self.blocks.iter()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// A block map plus the edges implied by each block's terminator.
///
/// Blocks are addressed by their position in program order; `successors` keeps target order as
/// written, `predecessors` is the deduplicated inverse in program order.
#[derive(Debug, Clone)]
pub struct ControlFlowGraph {
    blocks: BlockMap,
    successors: Vec<Vec<usize>>,
    predecessors: Vec<Vec<usize>>,
}

impl ControlFlowGraph {
    pub fn new(blocks: BlockMap) -> Result<Self> {
        let count = blocks.len();
        let mut successors = Vec::with_capacity(count);

        for (index, (name, block)) in blocks.iter().enumerate() {
            let succs = match block.control() {
                Some(op) if op.op == "ret" => Vec::new(),
                Some(op) => op
                    .labels
                    .iter()
                    .map(|label| {
                        blocks
                            .index_of(label)
                            .ok_or_else(|| DflowError::UnknownLabel {
                                block: name.clone(),
                                label: label.clone(),
                            })
                    })
                    .collect::<Result<Vec<_>>>()?,
                None if index + 1 < count => vec![index + 1],
                None => Vec::new(),
            };
            successors.push(succs);
        }

        let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); count];
        for (from, succs) in successors.iter().enumerate() {
            for &to in succs {
                if !predecessors[to].contains(&from) {
                    predecessors[to].push(from);
                }
            }
        }
        for preds in &mut predecessors {
            preds.sort_unstable();
        }

        Ok(Self {
            blocks,
            successors,
            predecessors,
        })
    }

    /// Partition, name, normalize and wire up a function body.
    pub fn from_function(function: &Function) -> Result<Self> {
        let mut blocks = BlockMap::from_function(function)?;
        blocks.add_terminators();
        Self::new(blocks)
    }

    pub fn blocks(&self) -> &BlockMap {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn name(&self, index: usize) -> &str {
        self.blocks
            .get_index(index)
            .map(|(name, _)| name.as_str())
            .unwrap_or_default()
    }

    pub fn block(&self, index: usize) -> Option<&BasicBlock> {
        self.blocks.get_index(index).map(|(_, block)| block)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.blocks.index_of(name)
    }

    /// The first block in program order.
    pub fn entry(&self) -> Option<usize> {
        (!self.is_empty()).then_some(0)
    }

    /// The last block in program order.
    pub fn exit(&self) -> Option<usize> {
        self.len().checked_sub(1)
    }

    pub fn successors(&self, index: usize) -> &[usize] {
        self.successors
            .get(index)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn predecessors(&self, index: usize) -> &[usize] {
        self.predecessors
            .get(index)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Edges leading into `index` when facts flow in `direction`.
    pub fn flow_in(&self, index: usize, direction: Direction) -> &[usize] {
        match direction {
            Direction::Forward => self.predecessors(index),
            Direction::Backward => self.successors(index),
        }
    }

    /// Edges leading out of `index` when facts flow in `direction`.
    pub fn flow_out(&self, index: usize, direction: Direction) -> &[usize] {
        match direction {
            Direction::Forward => self.successors(index),
            Direction::Backward => self.predecessors(index),
        }
    }

    /// Where an analysis flowing in `direction` starts: entry for forward, exit for backward.
    pub fn start(&self, direction: Direction) -> Option<usize> {
        match direction {
            Direction::Forward => self.entry(),
            Direction::Backward => self.exit(),
        }
    }

    /// Blocks reachable from `start` following edges in `direction`.
    pub fn reachable_from(&self, start: usize, direction: Direction) -> Vec<bool> {
        let mut visited = vec![false; self.len()];
        if start >= self.len() {
            return visited;
        }

        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            if visited[current] {
                continue;
            }
            visited[current] = true;
            for &next in self.flow_out(current, direction) {
                if !visited[next] {
                    queue.push_back(next);
                }
            }
        }

        visited
    }

    /// Blocks an analysis flowing in `direction` will visit.
    pub fn reachable(&self, direction: Direction) -> Vec<bool> {
        match self.start(direction) {
            Some(start) => self.reachable_from(start, direction),
            None => Vec::new(),
        }
    }

    pub fn successor_names(&self, name: &str) -> Vec<&str> {
        self.index_of(name)
            .map(|i| self.successors(i).iter().map(|&s| self.name(s)).collect())
            .unwrap_or_default()
    }

    pub fn predecessor_names(&self, name: &str) -> Vec<&str> {
        self.index_of(name)
            .map(|i| self.predecessors(i).iter().map(|&p| self.name(p)).collect())
            .unwrap_or_default()
    }

    /// Block name to successor names, in program order.
    pub fn successor_map(&self) -> IndexMap<&str, Vec<&str>> {
        (0..self.len())
            .map(|i| {
                let succs = self.successors(i).iter().map(|&s| self.name(s)).collect();
                (self.name(i), succs)
            })
            .collect()
    }

    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.successors
            .iter()
            .enumerate()
            .flat_map(|(from, succs)| succs.iter().map(move |&to| (from, to)))
    }
}
