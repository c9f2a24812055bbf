use crate::internal::*;
use crate::ops::Op;
use crate::ops::source::Source;
use std::fmt;

/// Main model class.
///
/// Nodes are appended in topological order: a node can only consume outlets
/// of nodes created before it.
#[derive(Clone, Debug, Default)]
pub struct TypedModel {
    /// all nodes in the model
    nodes: Vec<Node>,
    /// model inputs
    inputs: Vec<OutletId>,
    /// model outputs
    outputs: Vec<OutletId>,
    /// node name to node id
    names: HashMap<String, usize>,
}

impl TypedModel {
    pub fn add_source(&mut self, name: impl Into<String>, fact: TypedFact) -> NetResult<OutletId> {
        let id = self.add_node(name, Source::new(fact.clone()), tvec!(fact))?;
        let id = OutletId::new(id, 0);
        self.inputs.push(id);
        Ok(id)
    }

    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        op: impl Into<Box<dyn Op>>,
        output_facts: TVec<TypedFact>,
    ) -> NetResult<usize> {
        let name = name.into();
        if self.names.contains_key(&name) {
            bail!("A node named {:?} already exists in the model", name)
        }
        let id = self.nodes.len();
        let outputs =
            output_facts.into_iter().map(|fact| Outlet { fact, successors: tvec!() }).collect();
        let node = Node { id, name: name.clone(), op: op.into(), inputs: vec![], outputs };
        trace!("Adding node {node}");
        self.nodes.push(node);
        self.names.insert(name, id);
        Ok(id)
    }

    /// Connect a node outlet to a node inlet.
    pub fn add_edge(&mut self, outlet: OutletId, inlet: InletId) -> NetResult<()> {
        ensure!(
            outlet.node < inlet.node,
            "Edges must go forward in the graph, got {:?} to {:?}",
            outlet,
            inlet
        );
        self.outlet_fact(outlet)?;
        let succ = &mut self.nodes[inlet.node];
        if inlet.slot != succ.inputs.len() {
            bail!(
                "Edges must be added in order and consecutive. Trying to connect input {:?} of node {}",
                inlet.slot,
                succ
            )
        }
        succ.inputs.push(outlet);
        self.nodes[outlet.node].outputs[outlet.slot].successors.push(inlet);
        Ok(())
    }

    /// Add a node, computing its output facts from its inputs, and connect it.
    pub fn wire_node(
        &mut self,
        name: impl Into<String>,
        op: impl Into<Box<dyn Op>>,
        inputs: &[OutletId],
    ) -> NetResult<TVec<OutletId>> {
        let name = name.into();
        let op = op.into();
        let output_facts = {
            let input_facts =
                inputs.iter().map(|o| self.outlet_fact(*o)).collect::<NetResult<TVec<_>>>()?;
            op.output_facts(&input_facts)
                .with_context(|| format!("Wiring node {:?}, {}", name, op.name()))?
        };
        let id = self.add_node(name, op, output_facts)?;
        for (ix, i) in inputs.iter().enumerate() {
            self.add_edge(*i, InletId::new(id, ix))?;
        }
        Ok((0..self.nodes[id].outputs.len()).map(|slot| OutletId::new(id, slot)).collect())
    }

    /// Drop every node created after the model had `len` nodes.
    ///
    /// Used to make multi-node building steps atomic.
    pub fn rollback(&mut self, len: usize) {
        if len >= self.nodes.len() {
            return;
        }
        debug!("Rolling back {} node(s)", self.nodes.len() - len);
        for node in self.nodes.drain(len..) {
            self.names.remove(&node.name);
        }
        for node in &mut self.nodes {
            for outlet in node.outputs.iter_mut() {
                outlet.successors.retain(|s| s.node < len);
            }
        }
        self.inputs.retain(|o| o.node < len);
        self.outputs.retain(|o| o.node < len);
    }

    pub fn input_outlets(&self) -> &[OutletId] {
        &self.inputs
    }

    pub fn output_outlets(&self) -> &[OutletId] {
        &self.outputs
    }

    pub fn set_output_outlets(&mut self, outputs: &[OutletId]) -> NetResult<()> {
        for o in outputs {
            self.outlet_fact(*o)?;
        }
        self.outputs = outputs.to_vec();
        Ok(())
    }

    pub fn with_output_outlets(mut self, outputs: &[OutletId]) -> NetResult<Self> {
        self.set_output_outlets(outputs)?;
        Ok(self)
    }

    pub fn input_fact(&self, ix: usize) -> NetResult<&TypedFact> {
        let input = *self.inputs.get(ix).with_context(|| format!("No input #{ix}"))?;
        self.outlet_fact(input)
    }

    pub fn output_fact(&self, ix: usize) -> NetResult<&TypedFact> {
        let output = *self.outputs.get(ix).with_context(|| format!("No output #{ix}"))?;
        self.outlet_fact(output)
    }

    pub fn outlet_fact(&self, outlet: OutletId) -> NetResult<&TypedFact> {
        let node = self
            .nodes
            .get(outlet.node)
            .with_context(|| format!("Invalid outlet reference: {outlet:?}"))?;
        Ok(&node
            .outputs
            .get(outlet.slot)
            .with_context(|| format!("Invalid outlet reference: {outlet:?}"))?
            .fact)
    }

    pub fn node(&self, id: usize) -> &Node {
        &self.nodes[id]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nodes_len(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_by_name(&self, name: impl AsRef<str>) -> NetResult<&Node> {
        let id = self.names.get(name.as_ref()).with_context(|| {
            format!("No node found for name: \"{}\"", name.as_ref())
        })?;
        Ok(&self.nodes[*id])
    }

    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| &*n.name)
    }

    /// Number of trainable scalars across all ops.
    pub fn parameter_count(&self) -> NetResult<usize> {
        let mut total = 0;
        for node in &self.nodes {
            let inputs = node
                .inputs
                .iter()
                .map(|o| self.outlet_fact(*o))
                .collect::<NetResult<TVec<_>>>()?;
            total += node.op.params(&inputs)?.trainable;
        }
        Ok(total)
    }
}

impl fmt::Display for TypedModel {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        for node in &self.nodes {
            writeln!(fmt, "{}", node.summary())?;
        }
        Ok(())
    }
}
