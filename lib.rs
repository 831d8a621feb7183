/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Transactional node-graph core for authoring scene blueprints.
//!
//! The crate is the editing model behind a visual blueprint editor: a
//! mutable node/port/edge graph, a command layer with exact undo/redo,
//! and the subgraph encapsulation algorithm that folds a node selection
//! behind a single boundary node (and unfolds it again).
//!
//! Layering, leaves first:
//! - [`graph`]: the store — nodes, ports, edges, subgraph frames,
//!   comments, with direct mutation primitives and indexed queries
//! - [`subgraph`]: boundary-port inference and edge rewiring, plus the
//!   exact inverses used by undo
//! - [`commands`]: the `Command` enum, compound transactions, and the
//!   undo/redo history
//! - [`persistence`]: serializable snapshot types consumed by external
//!   save/load collaborators
//!
//! Rendering, layout, and input handling live in higher layers; they
//! consume this crate through queries, command execution, and change
//! notices only.

pub mod commands;
pub mod graph;
pub mod persistence;
pub mod subgraph;

pub use commands::history::{ChangeNotice, CommandHistory, NoticeOrigin};
pub use commands::{ChangeClass, Command};
pub use graph::{Graph, IdGen, Node, Port};
