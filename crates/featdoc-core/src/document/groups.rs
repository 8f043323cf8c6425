//! Plain groups and geo feature groups
//!
//! An object is a member of at most one plain group and at most one geo
//! feature group. Geo feature groups additionally pull in everything tied to
//! a new member by local-scope links, in either direction, so that no local
//! link ever crosses their boundary.

use std::collections::{HashSet, VecDeque};

use featdoc_property::{LinkScope, PropertyValue};

use super::{Document, Origin};
use crate::error::{DocumentError, Result};
use crate::extension::{GroupRole, GEO_FEATURE_GROUP_EXTENSION, GROUP_EXTENSION};

const GROUP_PROPERTY: &str = "Group";

impl Document {
    /// Kind of container an object is, if any
    ///
    /// # Errors
    /// Missing object.
    pub fn group_role(&self, name: &str) -> Result<Option<GroupRole>> {
        let object = self.require(name)?;
        let registry = self.registry.read();
        let mut role = None;
        for kind in object.extensions() {
            if registry.extension_is_a(kind, GEO_FEATURE_GROUP_EXTENSION) {
                return Ok(Some(GroupRole::Geo));
            }
            if registry.extension_is_a(kind, GROUP_EXTENSION) {
                role = Some(GroupRole::Plain);
            }
        }
        Ok(role)
    }

    fn require_group(&self, name: &str) -> Result<GroupRole> {
        self.group_role(name)?
            .ok_or_else(|| DocumentError::WrongObjectKind {
                object: name.to_string(),
                expected: "group",
            })
    }

    /// Direct members of a group
    ///
    /// # Errors
    /// Missing object, or an object that is not a group.
    pub fn group_objects(&self, group: &str) -> Result<Vec<&str>> {
        self.require_group(group)?;
        Ok(self.members(group))
    }

    fn members(&self, group: &str) -> Vec<&str> {
        self.object(group)
            .and_then(|o| o.value(GROUP_PROPERTY))
            .and_then(PropertyValue::as_link_list)
            .map(|names| names.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    fn set_members(&mut self, group: &str, members: Vec<String>) -> Result<()> {
        self.write_property(
            group,
            GROUP_PROPERTY,
            PropertyValue::LinkList(members),
            Origin::Cascade,
        )
    }

    /// Groups of one role that list `member` directly
    fn containers_of(&self, member: &str, role: GroupRole) -> Vec<String> {
        self.objects
            .keys()
            .filter(|g| g.as_str() != member)
            .filter(|g| matches!(self.group_role(g), Ok(Some(r)) if r == role))
            .filter(|g| self.members(g).contains(&member))
            .cloned()
            .collect()
    }

    /// Add an object to a group; returns the names that became members
    ///
    /// Moving into a group takes the object out of any other group of the
    /// same kind. A geo feature group brings along every object linked to
    /// the new member by local links. Objects the group's proxy refuses are
    /// skipped silently.
    ///
    /// # Errors
    /// Not a group (type error); adding a group to itself or to one of its
    /// own descendants (structural error).
    pub fn group_add_object(&mut self, group: &str, object: &str) -> Result<Vec<String>> {
        let role = self.require_group(group)?;
        self.require(object)?;
        if group == object || self.contains_recursive(object, group) {
            return Err(DocumentError::structural(format!(
                "cannot add '{object}' to '{group}': it would contain itself"
            )));
        }
        if !self.allows(group, object)? {
            tracing::debug!(document = %self.name, group, object, "group refused object");
            return Ok(Vec::new());
        }

        let incoming = match role {
            GroupRole::Plain => vec![object.to_string()],
            GroupRole::Geo => self.geo_closure(object, group)?,
        };
        let mut members: Vec<String> = self.members(group).into_iter().map(String::from).collect();
        let mut added = Vec::new();
        for name in incoming {
            for other in self.containers_of(&name, role) {
                if other != group {
                    self.detach(&other, &name)?;
                }
            }
            if !members.contains(&name) {
                members.push(name.clone());
                added.push(name);
            }
        }
        if !added.is_empty() {
            self.set_members(group, members)?;
        }
        Ok(added)
    }

    /// Remove an object from a group; returns the names that left
    ///
    /// A geo feature group releases the whole local-link closure of the
    /// object.
    ///
    /// # Errors
    /// Not a group, or a missing object.
    pub fn group_remove_object(&mut self, group: &str, object: &str) -> Result<Vec<String>> {
        let role = self.require_group(group)?;
        self.require(object)?;
        let leaving: Vec<String> = match role {
            GroupRole::Plain => vec![object.to_string()],
            GroupRole::Geo => self.geo_closure(object, group)?,
        };
        let members: Vec<String> = self.members(group).into_iter().map(String::from).collect();
        let mut removed: Vec<String> = Vec::new();
        for member in &members {
            if leaving.contains(member) && !removed.contains(member) {
                removed.push(member.clone());
            }
        }
        if !removed.is_empty() {
            let kept = members.into_iter().filter(|m| !leaving.contains(m)).collect();
            self.set_members(group, kept)?;
        }
        Ok(removed)
    }

    fn detach(&mut self, group: &str, member: &str) -> Result<()> {
        let kept = self
            .members(group)
            .into_iter()
            .filter(|m| *m != member)
            .map(String::from)
            .collect();
        self.set_members(group, kept)
    }

    /// True if `object` is a member of `group`, optionally through nested groups
    ///
    /// # Errors
    /// Not a group, or a missing object.
    pub fn group_has_object(&self, group: &str, object: &str, recursive: bool) -> Result<bool> {
        self.require_group(group)?;
        self.require(object)?;
        if recursive {
            Ok(self.contains_recursive(group, object))
        } else {
            Ok(self.members(group).contains(&object))
        }
    }

    /// Cycle-safe recursive membership; false for non-groups
    fn contains_recursive(&self, group: &str, object: &str) -> bool {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([group]);
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) || !matches!(self.group_role(current), Ok(Some(_))) {
                continue;
            }
            for member in self.members(current) {
                if member == object {
                    return true;
                }
                queue.push_back(member);
            }
        }
        false
    }

    /// Plain group listing this object, if any
    ///
    /// # Errors
    /// Missing object.
    pub fn parent_group(&self, object: &str) -> Result<Option<&str>> {
        self.require(object)?;
        Ok(self
            .objects
            .keys()
            .map(String::as_str)
            .find(|g| {
                *g != object
                    && matches!(self.group_role(g), Ok(Some(GroupRole::Plain)))
                    && self.members(g).contains(&object)
            }))
    }

    /// Geo feature group the object lives in, directly or through plain groups
    ///
    /// # Errors
    /// Missing object.
    pub fn parent_geo_feature_group(&self, object: &str) -> Result<Option<&str>> {
        self.require(object)?;
        let mut visited: HashSet<&str> = HashSet::new();
        let mut current = object;
        loop {
            if !visited.insert(current) {
                return Ok(None);
            }
            let direct = self.objects.keys().map(String::as_str).find(|g| {
                *g != current
                    && matches!(self.group_role(g), Ok(Some(GroupRole::Geo)))
                    && self.members(g).contains(&current)
            });
            if direct.is_some() {
                return Ok(direct);
            }
            match self.parent_group(current)? {
                Some(parent) => current = parent,
                None => return Ok(None),
            }
        }
    }

    /// Objects that must share a geo feature group with `start`
    ///
    /// Undirected closure over local-scope links plus plain group children.
    /// Geo feature groups other than `start` are neither entered nor included.
    fn geo_closure(&self, start: &str, target: &str) -> Result<Vec<String>> {
        let mut seen: Vec<String> = Vec::new();
        let mut queue: VecDeque<String> = VecDeque::from([start.to_string()]);
        while let Some(current) = queue.pop_front() {
            if current == target || seen.contains(&current) || self.object(&current).is_none() {
                continue;
            }
            let role = self.group_role(&current)?;
            if role == Some(GroupRole::Geo) && current != start {
                continue;
            }
            seen.push(current.clone());
            if role == Some(GroupRole::Geo) {
                continue;
            }
            if role == Some(GroupRole::Plain) {
                queue.extend(self.members(&current).into_iter().map(String::from));
            }
            let object = self.require(&current)?;
            for prop in object.properties().iter() {
                if prop.kind().link_scope() == Some(LinkScope::Local) {
                    queue.extend(prop.value().linked_names().into_iter().map(String::from));
                }
            }
            for other in self.objects.values() {
                let links_here = other.properties().iter().any(|p| {
                    p.kind().link_scope() == Some(LinkScope::Local)
                        && p.value().linked_names().contains(&current.as_str())
                });
                if links_here {
                    queue.push_back(other.name().to_string());
                }
            }
        }
        Ok(seen)
    }

    fn allows(&self, group: &str, candidate: &str) -> Result<bool> {
        let group_object = self.require(group)?;
        let candidate_object = self.require(candidate)?;
        Ok(group_object
            .proxy()
            .map_or(true, |p| p.allow_object(group_object, candidate_object)))
    }

    /// Reject a direct `Group` assignment that breaks exclusivity
    pub(crate) fn check_group_assignment(&self, group: &str, value: &PropertyValue) -> Result<()> {
        let Some(role) = self.group_role(group)? else {
            return Ok(());
        };
        for member in value.linked_names() {
            if member == group {
                return Err(DocumentError::structural(format!(
                    "group '{group}' cannot contain itself"
                )));
            }
            if let Some(other) = self
                .containers_of(member, role)
                .into_iter()
                .find(|g| g != group)
            {
                return Err(DocumentError::structural(format!(
                    "'{member}' is already in {} '{other}'",
                    role.describe()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_group_membership_is_exclusive() {
        let mut doc = Document::new("Plain");
        let obj = doc.add_object("App::FeatureTest", Some("obj1")).unwrap();
        let g1 = doc.add_object("App::DocumentObjectGroup", Some("Group1")).unwrap();
        let g2 = doc.add_object("App::DocumentObjectGroup", Some("Group2")).unwrap();

        doc.group_add_object(&g1, &obj).unwrap();
        assert_eq!(doc.parent_group(&obj).unwrap(), Some("Group1"));
        doc.group_add_object(&g2, &obj).unwrap();
        assert!(!doc.group_has_object(&g1, &obj, false).unwrap());
        assert!(doc.group_has_object(&g2, &obj, false).unwrap());

        let err = doc
            .set_property(&g1, "Group", PropertyValue::LinkList(vec![obj.clone()]))
            .unwrap_err();
        assert!(err.is_structural_error());
    }

    #[test]
    fn group_cannot_contain_itself() {
        let mut doc = Document::new("Self");
        let g1 = doc.add_object("App::DocumentObjectGroup", Some("G1")).unwrap();
        let g2 = doc.add_object("App::DocumentObjectGroup", Some("G2")).unwrap();
        assert!(doc.group_add_object(&g1, &g1).unwrap_err().is_structural_error());
        doc.group_add_object(&g1, &g2).unwrap();
        assert!(doc.group_add_object(&g2, &g1).unwrap_err().is_structural_error());
    }

    #[test]
    fn non_groups_are_type_errors() {
        let mut doc = Document::new("Kind");
        let a = doc.add_object("App::FeatureTest", Some("A")).unwrap();
        let b = doc.add_object("App::FeatureTest", Some("B")).unwrap();
        assert!(doc.group_add_object(&a, &b).unwrap_err().is_type_error());
    }

    #[test]
    fn geo_group_pulls_in_linked_objects() {
        let mut doc = Document::new("Geo");
        let names: Vec<String> = ["box", "cyl", "sph", "fus1", "fus2"]
            .iter()
            .map(|n| doc.add_object("App::FeatureTest", Some(n)).unwrap())
            .collect();
        doc.set_property("fus1", "LinkList", PropertyValue::LinkList(vec![names[0].clone(), names[1].clone()]))
            .unwrap();
        doc.set_property("fus2", "LinkList", PropertyValue::LinkList(vec![names[2].clone(), names[1].clone()]))
            .unwrap();
        let part = doc.add_object("App::Part", None).unwrap();

        let added = doc.group_add_object(&part, "fus1").unwrap();
        assert_eq!(added.len(), 5);
        assert_eq!(doc.parent_geo_feature_group("fus2").unwrap(), Some(part.as_str()));

        doc.group_remove_object(&part, "fus1").unwrap();
        assert!(doc.group_objects(&part).unwrap().is_empty());
    }
}
