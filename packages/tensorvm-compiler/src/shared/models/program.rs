//! Program tree
//!
//! The single piece of mutable state that flows through the pipeline:
//!
//! ```text
//! ProgramTree
//!   └─ Operation*            (kind, attributes, location)
//!        └─ Region*
//!             └─ Block*
//!                  └─ Operation*   (recursively)
//! ```
//!
//! Ownership is strict: every op, region and block has exactly one owner.
//! Traversal is always pre-order: an op is visited before anything it owns,
//! siblings in stored order.

use super::diagnostic::Diagnostic;
use super::location::Location;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════════
// Attributes
// ═══════════════════════════════════════════════════════════════════════════

/// Attribute value attached to an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Presence-only attribute (serialized as `null`)
    Unit,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<AttributeValue>),
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<()> for AttributeValue {
    fn from(_: ()) -> Self {
        Self::Unit
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Tree nodes
// ═══════════════════════════════════════════════════════════════════════════

/// A single operation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Operation {
    /// Dialect-qualified kind, e.g. `func.func` or `linalg.generic`
    pub kind: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, AttributeValue>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub regions: Vec<Region>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

/// An ordered list of blocks owned by an operation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Region {
    #[serde(default)]
    pub blocks: Vec<Block>,
}

/// An ordered list of operations
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub operations: Vec<Operation>,
}

impl Operation {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_region(mut self, region: Region) -> Self {
        self.regions.push(region);
        self
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }

    pub fn has_attr(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    pub fn attr(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn remove_attr(&mut self, key: &str) -> Option<AttributeValue> {
        self.attributes.remove(key)
    }
}

impl Region {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    /// Region holding exactly one block with the given ops
    pub fn single_block(operations: Vec<Operation>) -> Self {
        Self::new(vec![Block::new(operations)])
    }
}

impl Block {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self { operations }
    }

    pub fn push(&mut self, op: Operation) {
        self.operations.push(op);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Op paths
// ═══════════════════════════════════════════════════════════════════════════

/// Structural address of an op inside a tree
///
/// The first index selects a root op; every further step is a
/// `(region, block, op)` triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpPath(Vec<usize>);

impl OpPath {
    pub fn from_indices(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Nesting depth (1 for a root op)
    pub fn depth(&self) -> usize {
        (self.0.len() + 2) / 3
    }

    /// Translate a path taken inside a scoped tree back into the enclosing tree
    ///
    /// `anchor` is where the scoped tree's first root op sits in the enclosing
    /// tree; root index `i` of the scoped tree maps to `anchor`'s sibling `i`
    /// positions further on.
    pub fn rebased(&self, anchor: &OpPath) -> OpPath {
        let Some((first, rest)) = self.0.split_first() else {
            return anchor.clone();
        };
        let mut indices = anchor.0.clone();
        match indices.last_mut() {
            Some(last) => *last += first,
            None => indices.push(*first),
        }
        indices.extend_from_slice(rest);
        OpPath(indices)
    }
}

impl fmt::Display for OpPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, idx) in self.0.iter().enumerate() {
            match i % 3 {
                0 if i == 0 => write!(f, "op#{}", idx)?,
                0 => write!(f, "/op#{}", idx)?,
                1 => write!(f, "/region#{}", idx)?,
                _ => write!(f, "/block#{}", idx)?,
            }
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Walking
// ═══════════════════════════════════════════════════════════════════════════

/// Signal returned by a visitor to the walk driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkControl {
    /// Keep walking
    Continue,
    /// Stop immediately, surfacing the diagnostic
    Stop(Diagnostic),
}

impl WalkControl {
    pub fn is_stop(&self) -> bool {
        matches!(self, Self::Stop(_))
    }
}

fn walk_op<F>(op: &Operation, path: &mut OpPath, visit: &mut F) -> WalkControl
where
    F: FnMut(&Operation, &OpPath) -> WalkControl,
{
    if let stop @ WalkControl::Stop(_) = visit(op, &*path) {
        return stop;
    }
    for (r, region) in op.regions.iter().enumerate() {
        for (b, block) in region.blocks.iter().enumerate() {
            for (o, child) in block.operations.iter().enumerate() {
                path.0.extend_from_slice(&[r, b, o]);
                let control = walk_op(child, path, visit);
                path.0.truncate(path.0.len() - 3);
                if control.is_stop() {
                    return control;
                }
            }
        }
    }
    WalkControl::Continue
}

fn walk_op_mut<F>(op: &mut Operation, visit: &mut F)
where
    F: FnMut(&mut Operation),
{
    visit(op);
    for region in &mut op.regions {
        for block in &mut region.blocks {
            for child in &mut block.operations {
                walk_op_mut(child, visit);
            }
        }
    }
}

fn retain_in<F>(ops: &mut Vec<Operation>, keep: &mut F) -> usize
where
    F: FnMut(&Operation) -> bool,
{
    let before = ops.len();
    ops.retain(|op| keep(op));
    let mut removed = before - ops.len();
    for op in ops.iter_mut() {
        for region in &mut op.regions {
            for block in &mut region.blocks {
                removed += retain_in(&mut block.operations, keep);
            }
        }
    }
    removed
}

// ═══════════════════════════════════════════════════════════════════════════
// ProgramTree
// ═══════════════════════════════════════════════════════════════════════════

/// Root container owning a forest of operations
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProgramTree {
    #[serde(default)]
    pub operations: Vec<Operation>,
}

impl ProgramTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_operations(operations: Vec<Operation>) -> Self {
        Self { operations }
    }

    pub fn push(&mut self, op: Operation) {
        self.operations.push(op);
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Pre-order walk; stops at the first `WalkControl::Stop` and returns it
    pub fn walk<F>(&self, mut visit: F) -> WalkControl
    where
        F: FnMut(&Operation, &OpPath) -> WalkControl,
    {
        let mut path = OpPath::default();
        for (i, op) in self.operations.iter().enumerate() {
            path.0.push(i);
            let control = walk_op(op, &mut path, &mut visit);
            path.0.pop();
            if control.is_stop() {
                return control;
            }
        }
        WalkControl::Continue
    }

    /// Pre-order mutable walk over every op
    pub fn walk_mut<F>(&mut self, mut visit: F)
    where
        F: FnMut(&mut Operation),
    {
        for op in &mut self.operations {
            walk_op_mut(op, &mut visit);
        }
    }

    /// Remove every op (with its subtree) for which `keep` returns false
    ///
    /// Returns the number of ops removed directly (subtrees are not counted).
    pub fn retain_ops<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&Operation) -> bool,
    {
        retain_in(&mut self.operations, &mut keep)
    }

    /// Total number of ops in the tree
    pub fn op_count(&self) -> usize {
        let mut count = 0;
        self.walk(|_, _| {
            count += 1;
            WalkControl::Continue
        });
        count
    }

    /// Resolve an op path
    pub fn op_at(&self, path: &OpPath) -> Option<&Operation> {
        let (first, rest) = path.0.split_first()?;
        let mut op = self.operations.get(*first)?;
        for step in rest.chunks(3) {
            let &[r, b, o] = step else {
                return None;
            };
            op = op.regions.get(r)?.blocks.get(b)?.operations.get(o)?;
        }
        Some(op)
    }

    pub fn from_json(source: &str) -> serde_json::Result<Self> {
        serde_json::from_str(source)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
