//! Recompute scheduling and object status

use featdoc_graph::ObjectId;
use featdoc_property::LinkScope;

use super::{Document, Origin};
use crate::error::Result;
use crate::exec::{ExecContext, ExecError};
use crate::registry::Executor;
use crate::notify::DocumentEvent;
use crate::status::ObjectStatus;

impl Document {
    /// Execute every object that needs it, dependencies first
    ///
    /// An object runs when it is enforced, invalid, or changed in a way that
    /// needs execution. An object that was only touched does not run but
    /// forces everything referencing it. Each successful execution forces
    /// the objects referencing it in turn. Failures mark the object invalid
    /// and do not stop the pass. Members of dependency cycles are marked
    /// invalid without running.
    ///
    /// Returns the number of successful executions.
    ///
    /// # Errors
    /// Only on internal inconsistencies; execution failures are not errors.
    pub fn recompute(&mut self) -> Result<usize> {
        tracing::debug!(document = %self.name, objects = self.objects.len(), "recompute started");
        let cyclic = self.graph.cyclic_nodes();
        let mut executed = 0;

        for id in self.graph.execution_order() {
            let Some(name) = self.name_of(id).map(ToString::to_string) else {
                continue;
            };
            if cyclic.contains(&id) {
                tracing::warn!(document = %self.name, object = %name, "object is part of a dependency cycle");
                self.require_mut(&name)?
                    .touch(ObjectStatus::TOUCHED | ObjectStatus::INVALID);
                continue;
            }

            let status = self.require(&name)?.status();
            if !status.must_recompute() {
                if status.contains(ObjectStatus::TOUCHED) {
                    self.enforce_dependents(id)?;
                    self.require_mut(&name)?.purge();
                }
                continue;
            }

            if self.crosses_geo_boundary(&name)? {
                tracing::warn!(document = %self.name, object = %name, "local link leaves the geo feature group");
                self.require_mut(&name)?
                    .touch(ObjectStatus::TOUCHED | ObjectStatus::INVALID);
                continue;
            }

            if self.run_object(&name)? {
                self.enforce_dependents(id)?;
                executed += 1;
            }
        }

        tracing::info!(document = %self.name, executed, "recompute finished");
        self.emit(DocumentEvent::DocumentRecomputed {
            document: self.name.clone(),
            executed,
        });
        Ok(executed)
    }

    /// Execute one object regardless of its status
    ///
    /// Returns `false` if the execution failed; the object is then invalid.
    ///
    /// # Errors
    /// Missing object.
    pub fn recompute_object(&mut self, name: &str) -> Result<bool> {
        let id = self.require(name)?.id();
        let ok = self.run_object(name)?;
        if ok {
            self.enforce_dependents(id)?;
        }
        Ok(ok)
    }

    /// Mark an object changed without requiring its own execution
    ///
    /// # Errors
    /// Missing object.
    pub fn touch(&mut self, name: &str) -> Result<()> {
        self.require_mut(name)?.touch(ObjectStatus::TOUCHED);
        Ok(())
    }

    /// Force execution of an object on the next recompute
    ///
    /// # Errors
    /// Missing object.
    pub fn enforce_recompute(&mut self, name: &str) -> Result<()> {
        self.require_mut(name)?
            .touch(ObjectStatus::TOUCHED | ObjectStatus::ENFORCED);
        Ok(())
    }

    /// True if the object would run, or something it depends on changed
    ///
    /// # Errors
    /// Missing object.
    pub fn must_execute(&self, name: &str) -> Result<bool> {
        let object = self.require(name)?;
        if object.status().must_recompute() {
            return Ok(true);
        }
        Ok(self
            .graph
            .out_list_recursive(object.id())
            .into_iter()
            .filter_map(|id| self.object_by_id(id))
            .any(|o| o.is_touched()))
    }

    /// `["Up-to-date"]` or the list of pending states
    ///
    /// # Errors
    /// Missing object.
    pub fn object_state(&self, name: &str) -> Result<Vec<&'static str>> {
        Ok(self.require(name)?.status().state_names())
    }

    /// Exclude an object from recompute unless it is enforced
    ///
    /// # Errors
    /// Missing object.
    pub fn set_no_recompute_tag(&mut self, name: &str, tagged: bool) -> Result<()> {
        self.require_mut(name)?
            .status
            .set(ObjectStatus::NO_RECOMPUTE, tagged);
        Ok(())
    }

    fn enforce_dependents(&mut self, id: ObjectId) -> Result<()> {
        for dependent in self.graph.in_list(id) {
            if let Some(name) = self.name_of(dependent).map(ToString::to_string) {
                self.require_mut(&name)?
                    .touch(ObjectStatus::TOUCHED | ObjectStatus::ENFORCED);
            }
        }
        Ok(())
    }

    /// True if a local-scope link points outside the object's geo group
    fn crosses_geo_boundary(&self, name: &str) -> Result<bool> {
        let home = self.parent_geo_feature_group(name)?;
        for prop in self.require(name)?.properties().iter() {
            if prop.kind().link_scope() != Some(LinkScope::Local) {
                continue;
            }
            for target in prop.value().linked_names() {
                if self.object(target).is_some() && self.parent_geo_feature_group(target)? != home {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Run expressions, the type executor and the proxy, then apply results
    fn run_object(&mut self, name: &str) -> Result<bool> {
        let executor = {
            let object = self.require(name)?;
            self.registry.read().executor(object.type_name())
        };
        self.require_mut(name)?.exec_count += 1;

        let outcome = {
            let object = self.require(name)?;
            let mut ctx = ExecContext::new(self, object);
            execute_in(&mut ctx, executor.as_ref()).map(|()| ctx.into_writes())
        };

        let applied = outcome.and_then(|writes| {
            for (property, value) in writes {
                self.write_property(name, &property, value, Origin::Internal)
                    .map_err(|e| ExecError::new(e.to_string()))?;
            }
            Ok(())
        });

        match applied {
            Ok(()) => {
                self.require_mut(name)?.purge();
                self.emit(DocumentEvent::ObjectRecomputed {
                    document: self.name.clone(),
                    object: name.to_string(),
                });
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(document = %self.name, object = name, error = %e, "execution failed");
                self.require_mut(name)?
                    .touch(ObjectStatus::TOUCHED | ObjectStatus::INVALID);
                Ok(false)
            }
        }
    }
}

/// Expressions first, in dependency order, then the executor, then the proxy
fn execute_in(ctx: &mut ExecContext<'_>, executor: Option<&Executor>) -> Result<(), ExecError> {
    let object = ctx.object();
    for binding in object.expressions().evaluation_order(object.name()) {
        let value = binding.expression.evaluate(&*ctx)?;
        ctx.set_component(&binding.target, &value)?;
    }
    if let Some(executor) = executor {
        executor(ctx)?;
    }
    if let Some(proxy) = object.proxy() {
        proxy.execute(ctx)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use featdoc_property::PropertyValue;

    use super::*;

    #[test]
    fn touch_forces_dependents_only() {
        let mut doc = Document::new("Touch");
        let child = doc.add_object("App::FeatureTest", Some("Child")).unwrap();
        let parent = doc.add_object("App::FeatureTest", Some("Parent")).unwrap();
        doc.set_property(&parent, "Source1", PropertyValue::Link(Some(child.clone())))
            .unwrap();
        assert_eq!(doc.recompute().unwrap(), 1);

        doc.touch(&child).unwrap();
        assert_eq!(doc.object_state(&child).unwrap(), vec!["Touched"]);
        assert!(doc.must_execute(&parent).unwrap());
        assert_eq!(doc.recompute().unwrap(), 1);
        assert_eq!(doc.object(&child).unwrap().exec_count(), 0);
        assert_eq!(doc.object(&parent).unwrap().exec_count(), 2);
        assert_eq!(doc.object_state(&child).unwrap(), vec!["Up-to-date"]);
    }

    #[test]
    fn failed_execution_marks_invalid_and_continues() {
        let mut doc = Document::new("Fail");
        let bad = doc.add_object("App::FeatureTest", Some("Bad")).unwrap();
        let good = doc.add_object("App::FeatureTest", Some("Good")).unwrap();
        doc.set_property(&bad, "ExceptionType", 1).unwrap();
        doc.set_property(&good, "Integer", 1).unwrap();
        assert_eq!(doc.recompute().unwrap(), 1);
        assert!(!doc.object(&bad).unwrap().is_valid());
        assert_eq!(doc.object_state(&bad).unwrap(), vec!["Touched", "Invalid"]);
        assert!(!doc.recompute_object(&bad).unwrap());

        doc.set_property(&bad, "ExceptionType", 0).unwrap();
        assert!(doc.recompute_object(&bad).unwrap());
        assert!(doc.object(&bad).unwrap().is_valid());
    }

    #[test]
    fn no_recompute_tag_skips_unless_enforced() {
        let mut doc = Document::new("Tag");
        let obj = doc.add_object("App::FeatureTest", Some("Obj")).unwrap();
        doc.set_no_recompute_tag(&obj, true).unwrap();
        doc.set_property(&obj, "Integer", 2).unwrap();
        assert_eq!(doc.recompute().unwrap(), 0);
        doc.enforce_recompute(&obj).unwrap();
        assert_eq!(doc.recompute().unwrap(), 1);
        assert_eq!(doc.object_state(&obj).unwrap(), vec!["NoRecompute"]);
    }

    #[test]
    fn link_cycles_are_invalid_not_fatal() {
        let mut doc = Document::new("Cycle");
        let a = doc.add_object("App::FeatureTest", Some("A")).unwrap();
        let b = doc.add_object("App::FeatureTest", Some("B")).unwrap();
        doc.set_property(&a, "Link", PropertyValue::Link(Some(b.clone()))).unwrap();
        doc.set_property(&b, "Link", PropertyValue::Link(Some(a.clone()))).unwrap();
        assert_eq!(doc.recompute().unwrap(), 0);
        assert!(!doc.object(&a).unwrap().is_valid());
        assert_eq!(doc.topological_sorted_objects().len(), 2);
    }
}
