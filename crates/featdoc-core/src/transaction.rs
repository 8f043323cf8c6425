//! Undo/redo log
//!
//! A transaction is a named list of semantic deltas. Opening one only records
//! its name; the first recorded delta materializes it on the undo stack. The
//! deltas themselves are replayed by the document, which owns the state they
//! describe.

use featdoc_property::{Property, PropertyPath, PropertyValue};

use crate::object::DocumentObject;

/// One reversible change
#[derive(Debug, Clone)]
pub enum TransactionOp {
    ObjectCreated(Box<DocumentObject>),
    ObjectDeleted(Box<DocumentObject>),
    PropertyChanged {
        object: String,
        property: String,
        old: PropertyValue,
        new: PropertyValue,
    },
    PropertyAdded {
        object: String,
        property: Property,
    },
    PropertyRemoved {
        object: String,
        property: Property,
    },
    ExtensionAdded {
        object: String,
        kind: String,
        properties: Vec<String>,
    },
    ExtensionRemoved {
        object: String,
        kind: String,
        properties: Vec<Property>,
    },
    ExpressionChanged {
        object: String,
        path: PropertyPath,
        old: Option<String>,
        new: Option<String>,
    },
}

/// Named list of deltas, oldest first
#[derive(Debug, Clone)]
pub struct Transaction {
    name: String,
    ops: Vec<TransactionOp>,
}

impl Transaction {
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn ops(&self) -> &[TransactionOp] {
        &self.ops
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Outcome of [`UndoManager::record`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Recorded {
    /// No transaction pending or active
    Dropped,
    /// Appended to the active transaction
    Appended,
    /// Materialized the pending transaction with this name
    Opened(String),
}

/// Undo and redo stacks of one document
#[derive(Debug)]
pub(crate) struct UndoManager {
    enabled: bool,
    max_depth: usize,
    undo: Vec<Transaction>,
    redo: Vec<Transaction>,
    pending: Option<String>,
    /// Top of `undo` still accepts deltas
    active: bool,
}

impl UndoManager {
    pub(crate) fn new(enabled: bool, max_depth: usize) -> Self {
        Self {
            enabled,
            max_depth,
            undo: Vec::new(),
            redo: Vec::new(),
            pending: None,
            active: false,
        }
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Switching mode in either direction starts from empty stacks
    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.clear();
        }
    }

    pub(crate) fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.pending = None;
        self.active = false;
    }

    /// Record intent to open; returns true if an active transaction was
    /// committed to make room
    pub(crate) fn open(&mut self, name: &str) -> bool {
        if !self.enabled {
            return false;
        }
        let committed = std::mem::take(&mut self.active);
        self.pending = Some(name.to_string());
        committed
    }

    pub(crate) fn record(&mut self, op: TransactionOp) -> Recorded {
        if !self.enabled {
            return Recorded::Dropped;
        }
        if self.active {
            if let Some(top) = self.undo.last_mut() {
                top.ops.push(op);
                return Recorded::Appended;
            }
            self.active = false;
        }
        let Some(name) = self.pending.take() else {
            return Recorded::Dropped;
        };
        self.redo.clear();
        self.undo.push(Transaction {
            name: name.clone(),
            ops: vec![op],
        });
        if self.max_depth > 0 && self.undo.len() > self.max_depth {
            let excess = self.undo.len() - self.max_depth;
            self.undo.drain(..excess);
        }
        self.active = true;
        Recorded::Opened(name)
    }

    /// A change happened outside any transaction
    pub(crate) fn discard_redo(&mut self) {
        self.redo.clear();
    }

    /// Finalize; returns true if anything was pending or active
    pub(crate) fn commit(&mut self) -> bool {
        if !self.enabled {
            return false;
        }
        let had = self.active || self.pending.is_some();
        self.active = false;
        self.pending = None;
        had
    }

    /// Drop the pending name and pop the active transaction, if any.
    /// The outer `Option` is `None` when there was nothing to abort.
    pub(crate) fn abort(&mut self) -> Option<Option<Transaction>> {
        if !self.enabled {
            return None;
        }
        let had_pending = self.pending.take().is_some();
        if std::mem::take(&mut self.active) {
            return Some(self.undo.pop());
        }
        had_pending.then_some(None)
    }

    pub(crate) fn has_pending(&self) -> bool {
        self.active || self.pending.is_some()
    }

    pub(crate) fn pop_undo(&mut self) -> Option<Transaction> {
        if !self.enabled {
            return None;
        }
        self.undo.pop()
    }

    pub(crate) fn pop_redo(&mut self) -> Option<Transaction> {
        if !self.enabled {
            return None;
        }
        self.redo.pop()
    }

    pub(crate) fn push_undo(&mut self, t: Transaction) {
        self.undo.push(t);
    }

    pub(crate) fn push_redo(&mut self, t: Transaction) {
        self.redo.push(t);
    }

    pub(crate) fn undo_count(&self) -> usize {
        self.undo.len()
    }

    pub(crate) fn redo_count(&self) -> usize {
        self.redo.len()
    }

    /// Most recent first
    pub(crate) fn undo_names(&self) -> Vec<String> {
        self.undo.iter().rev().map(|t| t.name.clone()).collect()
    }

    /// Most recent first
    pub(crate) fn redo_names(&self) -> Vec<String> {
        self.redo.iter().rev().map(|t| t.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(n: i64) -> TransactionOp {
        TransactionOp::PropertyChanged {
            object: "Obj".into(),
            property: "Integer".into(),
            old: PropertyValue::Integer(n - 1),
            new: PropertyValue::Integer(n),
        }
    }

    #[test]
    fn open_without_changes_leaves_stack_untouched() {
        let mut m = UndoManager::new(true, 0);
        m.open("nothing");
        assert!(m.commit());
        assert_eq!(m.undo_count(), 0);
        assert!(m.undo_names().is_empty());
    }

    #[test]
    fn first_change_materializes() {
        let mut m = UndoManager::new(true, 0);
        m.open("first");
        assert_eq!(m.record(op(1)), Recorded::Opened("first".into()));
        assert_eq!(m.record(op(2)), Recorded::Appended);
        m.commit();
        assert_eq!(m.record(op(3)), Recorded::Dropped);
        assert_eq!(m.undo_count(), 1);
        assert_eq!(m.undo.last().map(Transaction::len), Some(2));
    }

    #[test]
    fn reopening_commits_active() {
        let mut m = UndoManager::new(true, 0);
        m.open("a");
        m.record(op(1));
        assert!(m.open("b"));
        m.record(op(2));
        m.commit();
        assert_eq!(m.undo_names(), vec!["b", "a"]);
    }

    #[test]
    fn abort_pops_only_the_active_transaction() {
        let mut m = UndoManager::new(true, 0);
        m.open("keep");
        m.record(op(1));
        m.commit();
        m.push_redo(Transaction {
            name: "redo".into(),
            ops: vec![op(9)],
        });
        m.open("drop");
        assert!(matches!(m.abort(), Some(None)));
        assert_eq!(m.abort().map(|t| t.is_some()), None);
        assert_eq!(m.undo_count(), 1);
        assert_eq!(m.redo_count(), 1);
    }

    #[test]
    fn depth_limit_drops_oldest() {
        let mut m = UndoManager::new(true, 2);
        for (i, name) in ["a", "b", "c"].iter().enumerate() {
            m.open(name);
            m.record(op(i64::try_from(i).unwrap()));
            m.commit();
        }
        assert_eq!(m.undo_names(), vec!["c", "b"]);
    }

    #[test]
    fn disabled_manager_is_inert() {
        let mut m = UndoManager::new(false, 0);
        m.open("x");
        assert_eq!(m.record(op(1)), Recorded::Dropped);
        assert!(!m.commit());
        assert!(m.abort().is_none());
        assert_eq!(m.undo_count(), 0);
    }
}
