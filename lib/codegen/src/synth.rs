//! Synthesis of the TypeScript definition module.
//!
//! The output is a pure function of the object definitions: the same
//! definitions always produce byte-identical text.

use crate::template::{
    IMPORT_HEADER, PERMISSION_MAP_CLOSE, PERMISSION_MAP_OPEN, PERMISSION_REQUEST_CLASS,
    RESOURCE_TYPE_DECLARATION,
};
use std::fmt;
use zed_typegen_core::ObjectDefinition;

/// A resource type and the permissions checkable on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEntry<'a> {
    resource_type: &'a str,
    permissions: Vec<&'a str>,
}

impl<'a> ResourceEntry<'a> {
    /// Builds the entry for one object definition.
    #[must_use]
    pub fn from_definition(definition: &'a ObjectDefinition) -> Self {
        Self {
            resource_type: &definition.name,
            permissions: definition
                .permissions()
                .map(|permission| permission.name.as_str())
                .collect(),
        }
    }

    /// Returns the resource type name.
    #[must_use]
    pub fn resource_type(&self) -> &'a str {
        self.resource_type
    }

    /// Returns the permission names in declaration order.
    #[must_use]
    pub fn permissions(&self) -> &[&'a str] {
        &self.permissions
    }
}

/// Renders `type: "a" | "b",`, or `type: "",` when there are no permissions.
impl fmt::Display for ResourceEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_property_key(f, self.resource_type)?;
        f.write_str(": ")?;

        if self.permissions.is_empty() {
            // An empty union is not valid TypeScript.
            f.write_str("\"\"")?;
        } else {
            for (idx, permission) in self.permissions.iter().enumerate() {
                if idx > 0 {
                    f.write_str(" | ")?;
                }
                write_string_literal(f, permission)?;
            }
        }

        f.write_str(",")
    }
}

/// Mapping from every resource type to the permissions valid on it.
///
/// Entries follow schema declaration order. The `Display` impl renders the
/// `ResourcePermissionMap` TypeScript type declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePermissionMap<'a> {
    entries: Vec<ResourceEntry<'a>>,
}

impl<'a> ResourcePermissionMap<'a> {
    /// Builds the mapping for `definitions`, one entry per definition.
    #[must_use]
    pub fn from_definitions(definitions: &'a [ObjectDefinition]) -> Self {
        Self {
            entries: definitions
                .iter()
                .map(ResourceEntry::from_definition)
                .collect(),
        }
    }

    /// Returns the entries in declaration order.
    #[must_use]
    pub fn entries(&self) -> &[ResourceEntry<'a>] {
        &self.entries
    }

    /// Returns the resource type names in declaration order.
    pub fn resource_types(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.entries.iter().map(ResourceEntry::resource_type)
    }

    /// Returns the permissions of `resource_type`, if it is a key.
    #[must_use]
    pub fn permissions(&self, resource_type: &str) -> Option<&[&'a str]> {
        self.entries
            .iter()
            .find(|entry| entry.resource_type == resource_type)
            .map(ResourceEntry::permissions)
    }

    /// Returns the number of resource types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the schema declared no resource types.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for ResourcePermissionMap<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(PERMISSION_MAP_OPEN)?;
        for entry in &self.entries {
            write!(f, "\n  {entry}")?;
        }
        f.write_str(PERMISSION_MAP_CLOSE)
    }
}

/// Generates the complete TypeScript module for `definitions`.
///
/// The module contains, in order: the client import, the
/// `ResourcePermissionMap` type, the `ResourceType` key type and the
/// `PermissionRequest` builder class.
#[must_use]
pub fn synthesize_definitions(definitions: &[ObjectDefinition]) -> String {
    let map = ResourcePermissionMap::from_definitions(definitions);
    format!("{IMPORT_HEADER}\n{map}\n{RESOURCE_TYPE_DECLARATION}\n{PERMISSION_REQUEST_CLASS}")
}

/// Returns true if `name` can be used as an unquoted TypeScript property key.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn write_property_key(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    if is_identifier(name) {
        f.write_str(name)
    } else {
        write_string_literal(f, name)
    }
}

/// JSON string syntax is also valid TypeScript string literal syntax.
fn write_string_literal(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    let literal = serde_json::to_string(value).map_err(|_| fmt::Error)?;
    f.write_str(&literal)
}
