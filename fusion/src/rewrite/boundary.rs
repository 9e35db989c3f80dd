//! External connectivity of a graph region.
//!
//! A [`SubgraphBoundary`] names, per slot, the tensor entering the region
//! ([`SubgraphInput`]) and the tensor leaving it ([`SubgraphOutput`]). The
//! enclosed region itself is implicit: everything reachable backwards from
//! the output producers without crossing a registered input consumer.

use std::collections::{BTreeMap, BTreeSet};

use graft_ir::{ComputeGraph, InAnchor, NodeId, NodeIo};
use snafu::{OptionExt, ResultExt, ensure};

use crate::error::*;

/// One boundary input: a single external producer and the enclosed input
/// anchors it feeds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubgraphInput {
    producer: Option<NodeIo>,
    consumers: Vec<InAnchor>,
}

impl SubgraphInput {
    /// Register `consumer`. The first consumer fixes the producer; every later
    /// consumer must be fed by the same tensor. On error nothing changes.
    pub fn add_input(&mut self, graph: &ComputeGraph, consumer: InAnchor) -> Result<()> {
        let actual = graph.producer(consumer).context(UnconnectedInputSnafu { consumer })?;
        if let Some(expected) = self.producer {
            ensure!(expected == actual, ProducerConflictSnafu { consumer, expected, actual });
        }
        ensure!(!self.consumers.contains(&consumer), DuplicateConsumerSnafu { consumer });

        self.producer = Some(actual);
        self.consumers.push(consumer);
        Ok(())
    }

    pub fn producer(&self) -> Option<NodeIo> {
        self.producer
    }

    pub fn consumers(&self) -> &[InAnchor] {
        &self.consumers
    }
}

/// One boundary output: the enclosed tensor that leaves the region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubgraphOutput {
    producer: Option<NodeIo>,
}

impl SubgraphOutput {
    /// Set the producer. Settable once; must name an existing port.
    pub fn set_output(&mut self, graph: &ComputeGraph, producer: NodeIo) -> Result<()> {
        if let Some(current) = self.producer {
            return OutputAlreadySetSnafu { current }.fail();
        }
        graph.check_output(producer).context(DanglingAnchorSnafu { anchor: producer })?;
        self.producer = Some(producer);
        Ok(())
    }

    pub fn producer(&self) -> Option<NodeIo> {
        self.producer
    }
}

/// Indexed boundary inputs and outputs of a region to be replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubgraphBoundary {
    inputs: BTreeMap<usize, SubgraphInput>,
    outputs: BTreeMap<usize, SubgraphOutput>,
}

impl SubgraphBoundary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_input(&mut self, index: usize, input: SubgraphInput) -> Result<()> {
        ensure!(!self.inputs.contains_key(&index), IndexAlreadyUsedSnafu { kind: "input", index });
        self.inputs.insert(index, input);
        Ok(())
    }

    pub fn add_output(&mut self, index: usize, output: SubgraphOutput) -> Result<()> {
        ensure!(!self.outputs.contains_key(&index), IndexAlreadyUsedSnafu { kind: "output", index });
        self.outputs.insert(index, output);
        Ok(())
    }

    pub fn input(&self, index: usize) -> Result<&SubgraphInput> {
        self.inputs.get(&index).context(InputNotFoundSnafu { index })
    }

    pub fn output(&self, index: usize) -> Result<&SubgraphOutput> {
        self.outputs.get(&index).context(OutputNotFoundSnafu { index })
    }

    pub fn inputs(&self) -> &BTreeMap<usize, SubgraphInput> {
        &self.inputs
    }

    pub fn outputs(&self) -> &BTreeMap<usize, SubgraphOutput> {
        &self.outputs
    }

    pub(crate) fn input_producer(&self, index: usize) -> Result<NodeIo> {
        self.input(index)?.producer().context(EmptySlotSnafu { kind: "input", index })
    }

    pub(crate) fn output_producer(&self, index: usize) -> Result<NodeIo> {
        self.output(index)?.producer().context(EmptySlotSnafu { kind: "output", index })
    }

    /// Every node referenced by the boundary.
    pub(crate) fn referenced_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        let inputs = self
            .inputs
            .values()
            .flat_map(|i| i.producer.iter().map(|p| p.node).chain(i.consumers.iter().map(|c| c.node)));
        inputs.chain(self.outputs.values().filter_map(|o| o.producer.map(|p| p.node)))
    }

    /// Nodes enclosed by the boundary, in creation order.
    ///
    /// Walks backwards from the output producers, stopping at registered input
    /// consumers. Output producers that are also input producers are passed
    /// through and not enclosed.
    pub fn enclosed_nodes(&self, graph: &ComputeGraph) -> Result<BTreeSet<NodeId>> {
        let stops: BTreeSet<InAnchor> = self.inputs.values().flat_map(|i| i.consumers.iter().copied()).collect();
        let external: BTreeSet<NodeIo> = self.inputs.values().filter_map(|i| i.producer).collect();

        let mut enclosed = BTreeSet::new();
        let mut stack: Vec<NodeId> = self
            .outputs
            .values()
            .filter_map(|o| o.producer)
            .filter(|p| !external.contains(p))
            .map(|p| p.node)
            .collect();
        stack.extend(stops.iter().map(|c| c.node));

        while let Some(id) = stack.pop() {
            if !enclosed.insert(id) {
                continue;
            }
            let node = graph.try_node(id).context(GraphSnafu)?;
            for (index, producer) in node.inputs().iter().enumerate() {
                let anchor = InAnchor::new(id, index as u32);
                if let Some(producer) = producer
                    && !stops.contains(&anchor)
                {
                    stack.push(producer.node);
                }
            }
        }
        Ok(enclosed)
    }

    /// Verify that the enclosed region has no undeclared external data edge.
    pub fn check_self_contained(&self, graph: &ComputeGraph) -> Result<()> {
        let enclosed = self.enclosed_nodes(graph)?;
        let declared: BTreeSet<NodeIo> = self.outputs.values().filter_map(|o| o.producer).collect();

        for &id in &enclosed {
            let node = graph.try_node(id).context(GraphSnafu)?;
            for (producer, consumer) in node.all_consumers() {
                ensure!(
                    enclosed.contains(&consumer.node) || declared.contains(&producer),
                    NotSelfContainedSnafu { producer, consumer: consumer.to_string() }
                );
            }
        }
        for &output in graph.outputs() {
            ensure!(
                !enclosed.contains(&output.node) || declared.contains(&output),
                NotSelfContainedSnafu { producer: output, consumer: "graph output" }
            );
        }
        for (index, input) in &self.inputs {
            if let Some(producer) = input.producer {
                ensure!(
                    !enclosed.contains(&producer.node),
                    NotSelfContainedSnafu { producer, consumer: format!("boundary input {index}") }
                );
            }
        }
        Ok(())
    }
}
