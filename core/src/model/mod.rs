//! ## Models and their lifecycle
//!
//! A [`TypedModel`] is a directed acyclic graph of [`Node`]s. Each node wraps
//! an op and has one or more outlets, every outlet carrying a fully
//! determined [`TypedFact`] computed when the node is wired.
//!
//! Models are usually not assembled by hand but through the
//! [`ConvNetBuilder`](crate::builder::ConvNetBuilder).
mod fact;
mod graph;
mod node;

pub use self::fact::{DatumType, TypedFact};
pub use self::graph::TypedModel;
pub use self::node::{InletId, Node, Outlet, OutletId};
