use crate::internal::*;
use crate::ops::Op;
use itertools::Itertools;
use std::fmt;

/// A node in the network graph.
#[derive(Debug, Clone)]
pub struct Node {
    /// node id in the model
    ///
    /// Caution: this id will not be persistent during networks transformation
    pub id: usize,
    /// name of the node
    ///
    /// This will usually come from the builder name scopes, like
    /// `incept_v3_a0/conv5`.
    pub name: String,
    /// A list of incoming tensors, identified by the node outlet that creates
    /// them.
    pub inputs: Vec<OutletId>,
    /// The actual operation the node performs.
    pub op: Box<dyn Op>,
    /// List of ouputs, with their descendant and tensor type information.
    pub outputs: TVec<Outlet>,
}

impl fmt::Display for Node {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "#{} \"{}\" {}", self.id, self.name, self.op.name())
    }
}

impl Node {
    pub fn op(&self) -> &dyn Op {
        &*self.op
    }

    /// Try to downcast the node operation to O.
    pub fn op_as<O: Op>(&self) -> Option<&O> {
        self.op().downcast_ref::<O>()
    }

    /// Check if the node operation is of type O.
    pub fn op_is<O: Op>(&self) -> bool {
        self.op_as::<O>().is_some()
    }

    /// One line summary: id, name, op, output shapes.
    pub fn summary(&self) -> String {
        format!("{} -> {}", self, self.outputs.iter().map(|o| format!("{:?}", o.fact)).join(" "))
    }
}

/// Information for each outlet of a node
#[derive(Clone, Debug)]
pub struct Outlet {
    /// the tensor type information
    pub fact: TypedFact,
    /// where this outlet is used.
    pub successors: TVec<InletId>,
}

/// Identifier for a node output in the graph.
///
/// This happens to be a unique identifier of any variable tensor in the graph
/// (as the graph typically connect one single node output to one or several
/// inputs slots)
#[derive(Clone, Copy, PartialEq, Eq, Hash, new, Default, PartialOrd, Ord)]
pub struct OutletId {
    /// node identifier in the graph
    pub node: usize,
    /// rank of the input in the node
    pub slot: usize,
}

impl fmt::Debug for OutletId {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}/{}>", self.node, self.slot)
    }
}

/// Identifier for a node input in the graph.
#[derive(Clone, Copy, PartialEq, Eq, Hash, new, Ord, PartialOrd)]
pub struct InletId {
    /// node identifier in the graph
    pub node: usize,
    /// rank of the input in the node
    pub slot: usize,
}

impl fmt::Debug for InletId {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, ">{}/{}", self.node, self.slot)
    }
}
