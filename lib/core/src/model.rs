//! Compiled schema object model.
//!
//! A [`CompiledSchema`] is produced once per invocation by a schema compiler
//! and is never mutated afterwards. Consumers fold over it to build output.

/// Distinguishes the two kinds of members a definition can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// A stored relation such as `relation writer: user`.
    Relation,
    /// A computed permission such as `permission edit = writer`.
    Permission,
}

/// A named member of an object definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDefinition {
    /// Member name, unique within the owning definition.
    pub name: String,
    /// Whether this member is a relation or a permission.
    pub kind: RelationKind,
}

impl RelationDefinition {
    /// Creates a new member.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: RelationKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Creates a relation-kind member.
    #[must_use]
    pub fn relation(name: impl Into<String>) -> Self {
        Self::new(name, RelationKind::Relation)
    }

    /// Creates a permission-kind member.
    #[must_use]
    pub fn permission(name: impl Into<String>) -> Self {
        Self::new(name, RelationKind::Permission)
    }

    /// Returns true if clients may check this member as a permission.
    #[must_use]
    pub fn is_permission(&self) -> bool {
        match self.kind {
            RelationKind::Permission => true,
            RelationKind::Relation => false,
        }
    }
}

/// An object type declared by the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDefinition {
    /// Type name, including any prefix (e.g. `acme/document`).
    pub name: String,
    /// Members in declaration order.
    pub relations: Vec<RelationDefinition>,
}

impl ObjectDefinition {
    /// Creates a definition with no members.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            relations: Vec::new(),
        }
    }

    /// Appends a relation-kind member.
    #[must_use]
    pub fn with_relation(mut self, name: impl Into<String>) -> Self {
        self.relations.push(RelationDefinition::relation(name));
        self
    }

    /// Appends a permission-kind member.
    #[must_use]
    pub fn with_permission(mut self, name: impl Into<String>) -> Self {
        self.relations.push(RelationDefinition::permission(name));
        self
    }

    /// Returns the permission-kind members in declaration order.
    pub fn permissions(&self) -> impl Iterator<Item = &RelationDefinition> {
        self.relations.iter().filter(|rel| rel.is_permission())
    }
}

/// A caveat declared by the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaveatDefinition {
    /// Caveat name.
    pub name: String,
}

impl CaveatDefinition {
    /// Creates a caveat definition.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// The validated output of a schema compiler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledSchema {
    /// Object definitions in declaration order.
    pub object_definitions: Vec<ObjectDefinition>,
    /// Caveat definitions in declaration order.
    pub caveat_definitions: Vec<CaveatDefinition>,
}

impl CompiledSchema {
    /// Creates a compiled schema from object definitions alone.
    #[must_use]
    pub fn from_definitions(object_definitions: Vec<ObjectDefinition>) -> Self {
        Self {
            object_definitions,
            caveat_definitions: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> ObjectDefinition {
        ObjectDefinition::new("document")
            .with_relation("writer")
            .with_relation("reader")
            .with_permission("edit")
            .with_permission("view")
    }

    #[test]
    fn permissions_filters_relations() {
        let names: Vec<_> = document().permissions().map(|p| p.name.clone()).collect();
        assert_eq!(names, vec!["edit", "view"]);
    }

    #[test]
    fn permissions_preserve_declaration_order() {
        let def = ObjectDefinition::new("folder")
            .with_permission("view")
            .with_relation("parent")
            .with_permission("admin");
        let names: Vec<_> = def.permissions().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["view", "admin"]);
    }

    #[test]
    fn member_kinds() {
        let def = document();
        let kinds: Vec<_> = def.relations.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RelationKind::Relation,
                RelationKind::Relation,
                RelationKind::Permission,
                RelationKind::Permission,
            ]
        );
        assert!(!def.relations[0].is_permission());
        assert!(def.relations[2].is_permission());
    }
}
