/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Undo/redo history over [`Command`]s.
//!
//! Linear history: executing a new command clears the redo stack, the
//! undo stack is trimmed from the oldest end at [`DEFAULT_MAX_HISTORY`].
//! Transactions accumulate sub-commands into one atomic
//! [`CompoundCommand`] entry; nesting is depth-counted and only the
//! outermost commit pushes. Sub-commands still execute immediately so
//! intermediate state stays visible while a transaction is open.
//!
//! One [`ChangeNotice`] is emitted per committed entry and per
//! undo/redo, carrying the entry's [`ChangeClass`] so downstream passes
//! can tell "recompute" from "just repaint".

use crossbeam_channel::Sender;
use log::warn;

use super::{ChangeClass, Command, CompoundCommand};
use crate::graph::Graph;

/// Default history depth; oldest entries are dropped beyond it.
pub const DEFAULT_MAX_HISTORY: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeOrigin {
    Execute,
    Undo,
    Redo,
}

/// Emitted to the notification sink for every committed history step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeNotice {
    pub class: ChangeClass,
    pub origin: NoticeOrigin,
}

pub struct CommandHistory {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
    max_history: usize,

    /// Accumulator for the open transaction, if any.
    active_compound: Option<CompoundCommand>,
    /// Re-entrant transaction depth; only depth 0→1 opens and 1→0
    /// commits.
    compound_depth: usize,

    notices: Option<Sender<ChangeNotice>>,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::with_max_history(DEFAULT_MAX_HISTORY)
    }

    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_history,
            active_compound: None,
            compound_depth: 0,
            notices: None,
        }
    }

    /// Route change notices to a sink. Load/save and other `*_direct`
    /// writes bypass the history and therefore never notify.
    pub fn set_notice_sender(&mut self, sender: Sender<ChangeNotice>) {
        self.notices = Some(sender);
    }

    pub fn undo_stack_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_stack_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn in_transaction(&self) -> bool {
        self.compound_depth > 0
    }

    /// Run a command and record it. Inside an open transaction the
    /// command executes immediately but lands in the accumulator
    /// instead of the undo stack.
    pub fn execute(&mut self, graph: &mut Graph, mut command: Command) {
        command.execute(graph);
        self.redo_stack.clear();

        if let Some(compound) = &mut self.active_compound {
            compound.commands.push(command);
            return;
        }

        self.notify(command.change_class(), NoticeOrigin::Execute);
        if let Some(top) = self.undo_stack.last_mut()
            && top.try_merge(&command)
        {
            return;
        }
        self.undo_stack.push(command);
        self.trim();
    }

    /// Undo one history entry. Returns false on an empty stack or while
    /// a transaction is open.
    pub fn undo(&mut self, graph: &mut Graph) -> bool {
        if self.active_compound.is_some() {
            warn!("undo ignored: a transaction is open");
            return false;
        }
        let Some(mut command) = self.undo_stack.pop() else {
            return false;
        };
        command.undo(graph);
        self.notify(command.change_class(), NoticeOrigin::Undo);
        self.redo_stack.push(command);
        true
    }

    /// Redo the most recently undone entry by replaying its execute.
    pub fn redo(&mut self, graph: &mut Graph) -> bool {
        if self.active_compound.is_some() {
            warn!("redo ignored: a transaction is open");
            return false;
        }
        let Some(mut command) = self.redo_stack.pop() else {
            return false;
        };
        command.execute(graph);
        self.notify(command.change_class(), NoticeOrigin::Redo);
        self.undo_stack.push(command);
        true
    }

    /// Open (or nest into) a transaction. Pair every call with
    /// [`Self::commit_transaction`]; prefer [`Self::transaction`] which
    /// cannot leave the scope open.
    pub fn begin_transaction(&mut self, description: &str) {
        if self.compound_depth == 0 {
            self.active_compound = Some(CompoundCommand {
                description: description.to_string(),
                commands: Vec::new(),
            });
        }
        self.compound_depth += 1;
    }

    /// Close one transaction level. The outermost commit pushes the
    /// accumulated compound as a single undo entry; an empty compound
    /// is discarded.
    pub fn commit_transaction(&mut self) {
        if self.compound_depth == 0 {
            warn!("commit_transaction without an open transaction");
            return;
        }
        self.compound_depth -= 1;
        if self.compound_depth > 0 {
            return;
        }
        let Some(compound) = self.active_compound.take() else {
            return;
        };
        if compound.commands.is_empty() {
            return;
        }
        let command = Command::Compound(compound);
        self.notify(command.change_class(), NoticeOrigin::Execute);
        self.undo_stack.push(command);
        self.trim();
    }

    /// Scoped transaction: the commit runs on every exit path of the
    /// closure.
    pub fn transaction<R>(&mut self, description: &str, f: impl FnOnce(&mut Self) -> R) -> R {
        self.begin_transaction(description);
        let result = f(self);
        self.commit_transaction();
        result
    }

    fn trim(&mut self) {
        if self.undo_stack.len() > self.max_history {
            let excess = self.undo_stack.len() - self.max_history;
            self.undo_stack.drain(0..excess);
        }
    }

    fn notify(&self, class: ChangeClass, origin: NoticeOrigin) {
        if let Some(sender) = &self.notices {
            let _ = sender.send(ChangeNotice { class, origin });
        }
    }
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new()
    }
}
