//! Expression bindings on document objects

use featdoc_expr::{check_cycle, Binding, EvalContext, Expression, Scope, Target};
use featdoc_property::{PropertyError, PropertyPath, Scalar};

use super::{Document, Origin};
use crate::error::{DocumentError, Result};
use crate::status::ObjectStatus;
use crate::transaction::TransactionOp;

/// The document as seen by a formula owned by one object
pub(crate) struct DocScope<'a> {
    document: &'a Document,
    owner: &'a str,
}

impl Scope for DocScope<'_> {
    fn owner(&self) -> &str {
        self.owner
    }

    fn has_object(&self, name: &str) -> bool {
        self.document.object(name).is_some()
    }

    fn object_by_label(&self, label: &str) -> Option<String> {
        self.document
            .object_by_label(label)
            .map(|o| o.name().to_string())
    }

    fn has_property(&self, object: &str, property: &str) -> bool {
        self.document
            .object(object)
            .is_some_and(|o| o.properties().contains(property))
    }
}

impl EvalContext for DocScope<'_> {
    fn read(&self, target: &Target) -> Option<Scalar> {
        self.document
            .object(&target.object)?
            .properties()
            .value(target.path.property_name())
            .ok()?
            .component(target.path.component())
    }
}

impl Document {
    pub(crate) fn scope_for<'a>(&'a self, owner: &'a str) -> DocScope<'a> {
        DocScope {
            document: self,
            owner,
        }
    }

    /// Bind a formula to a property path, or clear the binding with `None`
    ///
    /// The path may start with `.` and may address a component such as
    /// `Placement.Base.x`. A rejected binding leaves the previous one in
    /// place.
    ///
    /// # Errors
    /// Missing object or property, malformed formulas, unknown references,
    /// and bindings that would make a value depend on itself.
    pub fn set_expression(&mut self, object: &str, path: &str, formula: Option<&str>) -> Result<()> {
        let path: PropertyPath = path
            .trim_start_matches('.')
            .parse()
            .map_err(PropertyError::from)?;
        let owner = self.require(object)?;
        let owner_id = owner.id();
        owner.properties.require(path.property_name())?;
        let old = owner
            .expressions
            .get(&path)
            .map(|b| b.expression.source().to_string());

        let Some(formula) = formula else {
            if self.require_mut(object)?.expressions.unbind(&path).is_some() {
                self.record(
                    TransactionOp::ExpressionChanged {
                        object: object.to_string(),
                        path,
                        old,
                        new: None,
                    },
                    Origin::External,
                );
                self.refresh_edges(object)?;
            }
            return Ok(());
        };

        let expression = Expression::parse(formula)?;
        let dependencies = expression.resolve(&self.scope_for(object))?;

        for dep in dependencies.iter().filter(|d| d.object != object) {
            if let Some(dep_id) = self.id_of(&dep.object) {
                if self.graph.would_cycle(owner_id, dep_id) {
                    return Err(DocumentError::DependencyCycle {
                        from: object.to_string(),
                        to: dep.object.clone(),
                    });
                }
            }
        }
        let target = Target::new(object, path.clone());
        let existing: Vec<(Target, Vec<Target>)> = self
            .objects
            .values()
            .flat_map(|o| {
                o.expressions.iter().map(move |b| {
                    (Target::new(o.name(), b.target.clone()), b.dependencies.clone())
                })
            })
            .collect();
        check_cycle(
            &target,
            &dependencies,
            existing.iter().map(|(t, d)| (t, d.as_slice())),
        )?;

        let new = expression.source().to_string();
        self.require_mut(object)?.expressions.bind(Binding {
            target: path.clone(),
            expression,
            dependencies,
        });
        self.record(
            TransactionOp::ExpressionChanged {
                object: object.to_string(),
                path,
                old,
                new: Some(new),
            },
            Origin::External,
        );
        self.refresh_edges(object)?;
        self.require_mut(object)?
            .touch(ObjectStatus::TOUCHED | ObjectStatus::MUST_EXECUTE);
        Ok(())
    }

    /// Bound paths and formula texts of an object, in binding order
    ///
    /// # Errors
    /// Missing object.
    pub fn expressions(&self, object: &str) -> Result<Vec<(String, String)>> {
        Ok(self
            .require(object)?
            .expressions
            .iter()
            .map(|b| (b.target.to_string(), b.expression.source().to_string()))
            .collect())
    }

    /// Evaluate a formula in the context of an object without binding it
    ///
    /// # Errors
    /// Missing object, malformed formulas and evaluation failures.
    pub fn eval_expression(&self, object: &str, formula: &str) -> Result<Scalar> {
        self.require(object)?;
        let expression = Expression::parse(formula)?;
        Ok(expression.evaluate(&self.scope_for(object))?)
    }
}
