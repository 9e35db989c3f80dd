//! Node records stored in the graph arena.

use std::collections::{BTreeMap, BTreeSet};

use smallvec::SmallVec;

use crate::attr::AttrValue;
use crate::types::{ATTR_INDEX, ATTR_VALUE, CONSTANT_TYPES, DATA, InAnchor, NET_OUTPUT, NodeId, NodeIo};

/// A single operator in a [`ComputeGraph`](crate::ComputeGraph).
///
/// Edges are stored on both endpoints: each input slot records its producer
/// and each output port records its consumers, so neighbour lookup is O(1)
/// in either direction. Only the owning graph mutates edge fields.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) op_type: String,
    pub(crate) inputs: SmallVec<[Option<NodeIo>; 4]>,
    pub(crate) outputs: SmallVec<[SmallVec<[InAnchor; 2]>; 2]>,
    pub(crate) control_inputs: SmallVec<[NodeId; 2]>,
    pub(crate) control_outputs: SmallVec<[NodeId; 2]>,
    pub(crate) attrs: BTreeMap<String, AttrValue>,
    /// Names of attributes defined by the operator itself, as opposed to
    /// private/extension attributes stamped by passes.
    pub(crate) ir_attrs: BTreeSet<String>,
    pub(crate) subgraphs: Vec<String>,
    pub(crate) dynamic_io: bool,
}

impl Node {
    pub(crate) fn new(id: NodeId, name: String, op_type: String, num_inputs: usize, num_outputs: usize) -> Self {
        Self {
            id,
            name,
            op_type,
            inputs: smallvec::smallvec![None; num_inputs],
            outputs: (0..num_outputs).map(|_| SmallVec::new()).collect(),
            control_inputs: SmallVec::new(),
            control_outputs: SmallVec::new(),
            attrs: BTreeMap::new(),
            ir_attrs: BTreeSet::new(),
            subgraphs: Vec::new(),
            dynamic_io: false,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn op_type(&self) -> &str {
        &self.op_type
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Producer feeding input `index`, if connected.
    pub fn input(&self, index: usize) -> Option<NodeIo> {
        self.inputs.get(index).copied().flatten()
    }

    pub fn inputs(&self) -> &[Option<NodeIo>] {
        &self.inputs
    }

    /// Consumers of output port `index`.
    pub fn consumers(&self, index: usize) -> &[InAnchor] {
        self.outputs.get(index).map(|c| c.as_slice()).unwrap_or(&[])
    }

    /// All data consumers across every output port, paired with the port.
    pub fn all_consumers(&self) -> impl Iterator<Item = (NodeIo, InAnchor)> + '_ {
        self.outputs
            .iter()
            .enumerate()
            .flat_map(move |(port, cs)| cs.iter().map(move |c| (NodeIo::new(self.id, port as u32), *c)))
    }

    pub fn output(&self, index: usize) -> Option<NodeIo> {
        (index < self.outputs.len()).then(|| NodeIo::new(self.id, index as u32))
    }

    pub fn control_inputs(&self) -> &[NodeId] {
        &self.control_inputs
    }

    pub fn control_outputs(&self) -> &[NodeId] {
        &self.control_outputs
    }

    pub fn has_control_edges(&self) -> bool {
        !self.control_inputs.is_empty() || !self.control_outputs.is_empty()
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    pub fn attrs(&self) -> &BTreeMap<String, AttrValue> {
        &self.attrs
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        self.attrs.insert(name.into(), value.into());
    }

    /// Set an operator-defined attribute. These take part in attribute matching.
    pub fn set_ir_attr(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        let name = name.into();
        self.ir_attrs.insert(name.clone());
        self.attrs.insert(name, value.into());
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<AttrValue> {
        self.ir_attrs.remove(name);
        self.attrs.remove(name)
    }

    /// Operator-defined attributes with their values. A declared name with no
    /// value yields `None`.
    pub fn ir_attrs(&self) -> impl Iterator<Item = (&str, Option<&AttrValue>)> {
        self.ir_attrs.iter().map(|n| (n.as_str(), self.attrs.get(n)))
    }

    pub fn ir_attr_names(&self) -> &BTreeSet<String> {
        &self.ir_attrs
    }

    pub fn subgraphs(&self) -> &[String] {
        &self.subgraphs
    }

    pub fn add_subgraph(&mut self, name: impl Into<String>) {
        self.subgraphs.push(name.into());
    }

    /// Whether input or output arity is decided at runtime.
    pub fn has_dynamic_io(&self) -> bool {
        self.dynamic_io
    }

    pub fn set_dynamic_io(&mut self, dynamic: bool) {
        self.dynamic_io = dynamic;
    }

    pub fn is_data(&self) -> bool {
        self.op_type == DATA
    }

    pub fn is_net_output(&self) -> bool {
        self.op_type == NET_OUTPUT
    }

    pub fn is_constant(&self) -> bool {
        CONSTANT_TYPES.contains(&self.op_type.as_str())
    }

    /// Input index declared by a `Data` node.
    pub fn data_index(&self) -> Option<i64> {
        if !self.is_data() {
            return None;
        }
        self.attr(ATTR_INDEX).and_then(AttrValue::as_int)
    }

    /// Payload of a constant node.
    pub fn constant_value(&self) -> Option<&AttrValue> {
        if !self.is_constant() {
            return None;
        }
        self.attr(ATTR_VALUE)
    }
}
