//! Per-object binding table and cycle detection

use std::collections::HashSet;

use featdoc_property::PropertyPath;
use indexmap::IndexMap;

use crate::error::ExpressionError;
use crate::expression::Expression;
use crate::target::Target;

/// Formula bound to one property path, with its resolved dependencies
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub target: PropertyPath,
    pub expression: Expression,
    pub dependencies: Vec<Target>,
}

/// Bindings owned by one object, keyed by target path
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpressionEngine {
    bindings: IndexMap<PropertyPath, Binding>,
}

impl ExpressionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a binding, returning the one it replaces
    pub fn bind(&mut self, binding: Binding) -> Option<Binding> {
        self.bindings.insert(binding.target.clone(), binding)
    }

    /// Drop the binding of `target`
    pub fn unbind(&mut self, target: &PropertyPath) -> Option<Binding> {
        self.bindings.shift_remove(target)
    }

    /// Drop every binding whose target lives in `property`
    pub fn unbind_property(&mut self, property: &str) -> Vec<Binding> {
        let doomed: Vec<PropertyPath> = self
            .bindings
            .keys()
            .filter(|p| p.property_name() == property)
            .cloned()
            .collect();
        doomed
            .iter()
            .filter_map(|p| self.bindings.shift_remove(p))
            .collect()
    }

    pub fn get(&self, target: &PropertyPath) -> Option<&Binding> {
        self.bindings.get(target)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.values()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Names of every object referenced by some binding, duplicates removed
    pub fn referenced_objects(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.bindings
            .values()
            .flat_map(|b| b.dependencies.iter())
            .map(|t| t.object.as_str())
            .filter(|o| seen.insert(*o))
            .collect()
    }

    /// Bindings ordered so that one reading another's target runs after it
    ///
    /// `owner` is the name of the object holding this engine. Bindings caught
    /// in a cycle keep their insertion order at the end.
    pub fn evaluation_order(&self, owner: &str) -> Vec<&Binding> {
        let all: Vec<&Binding> = self.bindings.values().collect();
        let mut done: Vec<bool> = vec![false; all.len()];
        let mut order = Vec::with_capacity(all.len());

        while order.len() < all.len() {
            let mut progressed = false;
            for (i, b) in all.iter().enumerate() {
                if done[i] {
                    continue;
                }
                let blocked = all.iter().enumerate().any(|(j, other)| {
                    j != i
                        && !done[j]
                        && b.dependencies
                            .iter()
                            .any(|d| d.object == owner && d.path.overlaps(&other.target))
                });
                if !blocked {
                    done[i] = true;
                    order.push(*b);
                    progressed = true;
                }
            }
            if !progressed {
                for (i, b) in all.iter().enumerate() {
                    if !done[i] {
                        done[i] = true;
                        order.push(*b);
                    }
                }
            }
        }
        order
    }
}

/// Check whether binding `target` to `dependencies` closes a cycle
///
/// `existing` lists every binding in the document as (target, dependencies).
/// A binding for `target` itself is ignored, since the new one replaces it.
/// Paths conflict when one is a prefix of the other, so `Placement.Base.x`
/// and `Placement.Base.y` are independent while `Placement` is not.
///
/// # Errors
/// [`ExpressionError::Cycle`] naming the dependency that leads back.
pub fn check_cycle<'a, I>(
    target: &Target,
    dependencies: &[Target],
    existing: I,
) -> Result<(), ExpressionError>
where
    I: IntoIterator<Item = (&'a Target, &'a [Target])>,
{
    let existing: Vec<(&Target, &[Target])> = existing
        .into_iter()
        .filter(|(t, _)| *t != target)
        .collect();

    for start in dependencies {
        let mut stack = vec![start];
        let mut visited: HashSet<&Target> = HashSet::new();
        while let Some(node) = stack.pop() {
            if node.overlaps(target) {
                return Err(ExpressionError::Cycle {
                    target: target.clone(),
                    through: start.clone(),
                });
            }
            if !visited.insert(node) {
                continue;
            }
            for (t, deps) in &existing {
                if t.overlaps(node) {
                    stack.extend(deps.iter());
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> Target {
        let (object, path) = s.split_once('.').unwrap();
        Target::new(object, path.parse().unwrap())
    }

    fn binding(target: &str, deps: &[&str]) -> Binding {
        let target: PropertyPath = target.parse().unwrap();
        Binding {
            expression: Expression::parse("0").unwrap(),
            target,
            dependencies: deps.iter().map(|d| t(d)).collect(),
        }
    }

    #[test]
    fn mutual_reference_is_a_cycle() {
        let x = t("A.X");
        let y = t("A.Y");
        let existing = [(x.clone(), vec![y.clone()])];
        let err = check_cycle(
            &y,
            std::slice::from_ref(&x),
            existing.iter().map(|(t, d)| (t, d.as_slice())),
        )
        .unwrap_err();
        assert!(matches!(err, ExpressionError::Cycle { .. }));
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let x = t("A.X");
        assert!(check_cycle(&x, std::slice::from_ref(&x), std::iter::empty()).is_err());
    }

    #[test]
    fn sibling_components_are_independent() {
        let bx = t("A.Placement.Base.x");
        let by = t("A.Placement.Base.y");
        let existing = [(bx.clone(), vec![by.clone()])];
        let err = check_cycle(
            &by,
            std::slice::from_ref(&bx),
            existing.iter().map(|(t, d)| (t, d.as_slice())),
        );
        assert!(err.is_err());

        let bz = t("A.Placement.Base.z");
        assert!(check_cycle(
            &bz,
            std::slice::from_ref(&by),
            existing.iter().map(|(t, d)| (t, d.as_slice())),
        )
        .is_ok());
    }

    #[test]
    fn rebinding_ignores_old_binding_of_same_target() {
        let x = t("A.X");
        let y = t("B.Y");
        let existing = [(x.clone(), vec![y.clone()])];
        assert!(check_cycle(
            &x,
            std::slice::from_ref(&t("C.Z")),
            existing.iter().map(|(t, d)| (t, d.as_slice())),
        )
        .is_ok());
    }

    #[test]
    fn transitive_cycle_across_objects() {
        let existing = [
            (t("B.V"), vec![t("C.W")]),
            (t("C.W"), vec![t("A.U")]),
        ];
        let err = check_cycle(
            &t("A.U"),
            &[t("B.V")],
            existing.iter().map(|(t, d)| (t, d.as_slice())),
        );
        assert!(err.is_err());
    }

    #[test]
    fn evaluation_order_follows_internal_dependencies() {
        let mut engine = ExpressionEngine::new();
        engine.bind(binding("Z", &["Obj.Y"]));
        engine.bind(binding("Y", &["Obj.X"]));
        engine.bind(binding("W", &["Other.Q"]));
        let order: Vec<String> = engine
            .evaluation_order("Obj")
            .iter()
            .map(|b| b.target.to_string())
            .collect();
        assert_eq!(order, vec!["Y", "W", "Z"]);
    }

    #[test]
    fn unbind_property_removes_component_bindings() {
        let mut engine = ExpressionEngine::new();
        engine.bind(binding("Placement.Base.x", &["Obj.Y"]));
        engine.bind(binding("Placement.Base.y", &["Obj.Y"]));
        engine.bind(binding("Y", &["Other.Q"]));
        assert_eq!(engine.unbind_property("Placement").len(), 2);
        assert_eq!(engine.len(), 1);
        assert_eq!(engine.referenced_objects(), vec!["Other"]);
    }
}
