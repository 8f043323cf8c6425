//! Transactions, undo and redo

use featdoc_expr::{Binding, Expression};
use featdoc_property::PropertyPath;

use super::{Document, Origin};
use crate::error::Result;
use crate::notify::DocumentEvent;
use crate::object::DocumentObject;
use crate::transaction::{Transaction, TransactionOp};

/// Direction a transaction is replayed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Replay {
    /// Put back the state before the transaction
    Revert,
    /// Put back the state after the transaction
    Reapply,
}

impl Document {
    /// Enable or disable undo; either switch starts from empty stacks
    pub fn set_undo_mode(&mut self, enabled: bool) {
        self.undo.set_enabled(enabled);
    }

    #[inline]
    #[must_use]
    pub fn undo_mode(&self) -> bool {
        self.undo.is_enabled()
    }

    /// Announce a transaction; it materializes on the first recorded change
    ///
    /// An active transaction is committed first.
    pub fn open_transaction(&mut self, name: &str) {
        if self.undo.open(name) {
            self.emit(DocumentEvent::TransactionCommitted {
                document: self.name.clone(),
            });
        }
        tracing::debug!(document = %self.name, transaction = name, "transaction pending");
    }

    /// Finalize the pending or active transaction
    pub fn commit_transaction(&mut self) {
        if self.undo.commit() {
            tracing::debug!(document = %self.name, "transaction committed");
            self.emit(DocumentEvent::TransactionCommitted {
                document: self.name.clone(),
            });
        }
    }

    /// Revert and drop the active transaction; the redo stack is kept
    ///
    /// # Errors
    /// Only on internal inconsistencies while replaying.
    pub fn abort_transaction(&mut self) -> Result<()> {
        let Some(active) = self.undo.abort() else {
            return Ok(());
        };
        if let Some(transaction) = active {
            tracing::debug!(document = %self.name, transaction = transaction.name(), "transaction aborted");
            self.replay(&transaction, Replay::Revert)?;
        }
        self.emit(DocumentEvent::TransactionAborted {
            document: self.name.clone(),
        });
        Ok(())
    }

    /// Revert the most recent transaction
    ///
    /// Returns `false` if there was nothing to undo.
    ///
    /// # Errors
    /// Only on internal inconsistencies while replaying.
    pub fn undo(&mut self) -> Result<bool> {
        self.commit_transaction();
        let Some(transaction) = self.undo.pop_undo() else {
            return Ok(false);
        };
        tracing::debug!(document = %self.name, transaction = transaction.name(), "undo");
        self.replay(&transaction, Replay::Revert)?;
        self.undo.push_redo(transaction);
        self.emit(DocumentEvent::Undo {
            document: self.name.clone(),
        });
        Ok(true)
    }

    /// Reapply the most recently undone transaction
    ///
    /// Returns `false` if there was nothing to redo.
    ///
    /// # Errors
    /// Only on internal inconsistencies while replaying.
    pub fn redo(&mut self) -> Result<bool> {
        self.commit_transaction();
        let Some(transaction) = self.undo.pop_redo() else {
            return Ok(false);
        };
        tracing::debug!(document = %self.name, transaction = transaction.name(), "redo");
        self.replay(&transaction, Replay::Reapply)?;
        self.undo.push_undo(transaction);
        self.emit(DocumentEvent::Redo {
            document: self.name.clone(),
        });
        Ok(true)
    }

    #[inline]
    #[must_use]
    pub fn undo_count(&self) -> usize {
        self.undo.undo_count()
    }

    #[inline]
    #[must_use]
    pub fn redo_count(&self) -> usize {
        self.undo.redo_count()
    }

    /// Names on the undo stack, most recent first
    #[must_use]
    pub fn undo_names(&self) -> Vec<String> {
        self.undo.undo_names()
    }

    /// Names on the redo stack, most recent first
    #[must_use]
    pub fn redo_names(&self) -> Vec<String> {
        self.undo.redo_names()
    }

    /// Empty both stacks; object state is untouched
    pub fn clear_undos(&mut self) {
        self.undo.clear();
    }

    /// True while a transaction is announced or active
    #[inline]
    #[must_use]
    pub fn has_pending_transaction(&self) -> bool {
        self.undo.has_pending()
    }

    fn replay(&mut self, transaction: &Transaction, direction: Replay) -> Result<()> {
        match direction {
            Replay::Revert => {
                for op in transaction.ops().iter().rev() {
                    self.revert(op)?;
                }
            }
            Replay::Reapply => {
                for op in transaction.ops() {
                    self.reapply(op)?;
                }
            }
        }
        self.rebuild_all_edges()
    }

    fn revert(&mut self, op: &TransactionOp) -> Result<()> {
        match op {
            TransactionOp::ObjectCreated(object) => self.drop_object(object.name()),
            TransactionOp::ObjectDeleted(object) => self.restore_object(object),
            TransactionOp::PropertyChanged {
                object,
                property,
                old,
                ..
            } => self.write_property(object, property, old.clone(), Origin::Replay),
            TransactionOp::PropertyAdded { object, property } => {
                self.require_mut(object)?.properties.take(property.name());
                Ok(())
            }
            TransactionOp::PropertyRemoved { object, property } => {
                self.require_mut(object)?.properties.insert(property.clone());
                Ok(())
            }
            TransactionOp::ExtensionAdded {
                object,
                kind,
                properties,
            } => {
                let target = self.require_mut(object)?;
                target.extensions.retain(|k| k != kind);
                for name in properties {
                    target.properties.take(name);
                }
                Ok(())
            }
            TransactionOp::ExtensionRemoved {
                object,
                kind,
                properties,
            } => {
                let target = self.require_mut(object)?;
                target.extensions.push(kind.clone());
                for property in properties {
                    target.properties.insert(property.clone());
                }
                Ok(())
            }
            TransactionOp::ExpressionChanged {
                object, path, old, ..
            } => self.rebind(object, path, old.as_deref()),
        }
    }

    fn reapply(&mut self, op: &TransactionOp) -> Result<()> {
        match op {
            TransactionOp::ObjectCreated(object) => self.restore_object(object),
            TransactionOp::ObjectDeleted(object) => self.drop_object(object.name()),
            TransactionOp::PropertyChanged {
                object,
                property,
                new,
                ..
            } => self.write_property(object, property, new.clone(), Origin::Replay),
            TransactionOp::PropertyAdded { object, property } => {
                self.require_mut(object)?.properties.insert(property.clone());
                Ok(())
            }
            TransactionOp::PropertyRemoved { object, property } => {
                self.require_mut(object)?.properties.take(property.name());
                Ok(())
            }
            TransactionOp::ExtensionAdded {
                object,
                kind,
                properties,
            } => {
                let specs = self.registry.read().extension_properties(kind);
                let target = self.require_mut(object)?;
                target.extensions.push(kind.clone());
                for spec in specs.into_iter().filter(|s| properties.contains(&s.name)) {
                    target.properties.add(spec, false)?;
                }
                Ok(())
            }
            TransactionOp::ExtensionRemoved {
                object,
                kind,
                properties,
            } => {
                let target = self.require_mut(object)?;
                target.extensions.retain(|k| k != kind);
                for property in properties {
                    target.properties.take(property.name());
                }
                Ok(())
            }
            TransactionOp::ExpressionChanged {
                object, path, new, ..
            } => self.rebind(object, path, new.as_deref()),
        }
    }

    fn drop_object(&mut self, name: &str) -> Result<()> {
        let Some(removed) = self.objects.shift_remove(name) else {
            return Ok(());
        };
        self.ids.remove(&removed.id());
        self.graph.remove_node(removed.id());
        if self.active_object.as_deref() == Some(name) {
            self.active_object = None;
        }
        self.emit(DocumentEvent::ObjectDeleted {
            document: self.name.clone(),
            object: name.to_string(),
        });
        Ok(())
    }

    fn restore_object(&mut self, object: &DocumentObject) -> Result<()> {
        let name = object.name().to_string();
        self.insert_object(object.clone())?;
        self.emit(DocumentEvent::ObjectCreated {
            document: self.name.clone(),
            object: name,
        });
        Ok(())
    }

    /// Replace a binding during replay; unresolvable references keep the
    /// formula but lose their edges until the next successful bind
    pub(crate) fn rebind(
        &mut self,
        object: &str,
        path: &PropertyPath,
        source: Option<&str>,
    ) -> Result<()> {
        let Some(source) = source else {
            self.require_mut(object)?.expressions.unbind(path);
            return Ok(());
        };
        let expression = Expression::parse(source)?;
        let dependencies = match expression.resolve(&self.scope_for(object)) {
            Ok(deps) => deps,
            Err(e) => {
                tracing::warn!(document = %self.name, object, error = %e, "replayed expression does not resolve");
                Vec::new()
            }
        };
        self.require_mut(object)?.expressions.bind(Binding {
            target: path.clone(),
            expression,
            dependencies,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use featdoc_property::PropertyValue;

    use super::*;

    #[test]
    fn undo_and_redo_property_change() {
        let mut doc = Document::new("Undo");
        let obj = doc.add_object("App::FeatureTest", Some("Obj")).unwrap();
        doc.open_transaction("set");
        doc.set_property(&obj, "Integer", 1).unwrap();
        doc.commit_transaction();

        assert!(doc.undo().unwrap());
        assert_eq!(doc.property(&obj, "Integer").unwrap(), &PropertyValue::Integer(4711));
        assert!(doc.redo().unwrap());
        assert_eq!(doc.property(&obj, "Integer").unwrap(), &PropertyValue::Integer(1));
        assert!(!doc.redo().unwrap());
    }

    #[test]
    fn abort_reverts_without_touching_redo() {
        let mut doc = Document::new("Abort");
        let obj = doc.add_object("App::FeatureTest", Some("Obj")).unwrap();
        doc.open_transaction("first");
        doc.set_property(&obj, "Integer", 1).unwrap();
        doc.commit_transaction();
        doc.undo().unwrap();

        doc.open_transaction("second");
        doc.set_property(&obj, "Integer", 2).unwrap();
        assert_eq!(doc.redo_count(), 0);
        doc.abort_transaction().unwrap();
        assert_eq!(doc.property(&obj, "Integer").unwrap(), &PropertyValue::Integer(4711));
        assert_eq!(doc.undo_count(), 0);
    }

    #[test]
    fn undo_restores_removed_object_and_links() {
        let mut doc = Document::new("Removed");
        let a = doc.add_object("App::FeatureTest", Some("A")).unwrap();
        let b = doc.add_object("App::FeatureTest", Some("B")).unwrap();
        doc.set_property(&a, "LinkList", PropertyValue::LinkList(vec![b.clone()]))
            .unwrap();
        let id = doc.object(&b).unwrap().id();

        doc.open_transaction("remove");
        doc.remove_object(&b).unwrap();
        doc.commit_transaction();
        doc.undo().unwrap();

        assert_eq!(doc.object(&b).unwrap().id(), id);
        assert_eq!(doc.out_list(&a).unwrap(), vec!["B"]);
        doc.redo().unwrap();
        assert!(doc.object(&b).is_none());
        assert!(doc.out_list(&a).unwrap().is_empty());
    }

    #[test]
    fn disabling_undo_clears_stacks() {
        let mut doc = Document::new("Mode");
        let obj = doc.add_object("App::FeatureTest", Some("Obj")).unwrap();
        doc.open_transaction("t");
        doc.set_property(&obj, "Integer", 1).unwrap();
        doc.commit_transaction();
        assert_eq!(doc.undo_count(), 1);
        doc.set_undo_mode(false);
        assert_eq!(doc.undo_count(), 0);
        doc.open_transaction("ignored");
        doc.set_property(&obj, "Integer", 2).unwrap();
        assert!(!doc.undo().unwrap());
        assert!(!doc.has_pending_transaction());
    }
}
