//! Semantic checks over the parsed schema and lowering into the object model.
//!
//! Checks performed:
//! - Definition, caveat and member names are well formed
//! - Definition and caveat names are unique
//! - Member names are unique within a definition
//! - Subject types, subject relations and caveats referenced by relations exist
//! - Permission expressions only reference members of their own definition
//! - Arrows walk relations (never permissions) toward members that exist on
//!   at least one subject type

use std::collections::{HashMap, HashSet};

use zed_typegen_core::{
    CaveatDefinition, CompiledSchema, ObjectDefinition, RelationDefinition, SchemaDiagnostic,
};

use crate::ast::{
    AllowedType, ArrowFunction, CaveatAst, DefinitionAst, Expression, Item, Member, RelationAst,
    Spanned, SubjectKind,
};

/// Features that can be enabled with a `use` directive.
const KNOWN_FEATURES: &[&str] = &["expiration"];

/// Trait name enabled by `use expiration`.
const EXPIRATION_TRAIT: &str = "expiration";

/// Base types allowed for caveat parameters.
const CAVEAT_PARAMETER_TYPES: &[&str] = &[
    "any",
    "int",
    "uint",
    "bool",
    "string",
    "double",
    "bytes",
    "duration",
    "timestamp",
    "list",
    "map",
    "ipaddress",
];

/// Length bounds of a name, or of each segment of a prefixed type name.
const NAME_LENGTH: std::ops::RangeInclusive<usize> = 3..=64;

const NAME_RULE: &str = "names must be 3 to 64 lowercase letters, digits or underscores, \
starting with a letter and not ending with an underscore";

type CheckResult<T = ()> = Result<T, SchemaDiagnostic>;

/// Returns true if `name` is a valid relation, permission or type name segment.
fn is_valid_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    let (Some(first), Some(last)) = (bytes.first(), bytes.last()) else {
        return false;
    };
    NAME_LENGTH.contains(&bytes.len())
        && first.is_ascii_lowercase()
        && (last.is_ascii_lowercase() || last.is_ascii_digit())
        && bytes
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'_')
}

/// Returns true if every `/`-separated segment of `name` is a valid name.
fn is_valid_type_name(name: &str) -> bool {
    name.split('/').all(is_valid_name)
}

/// Checks parsed items and lowers them into a [`CompiledSchema`].
pub(crate) fn check(source: &str, items: &[Item<'_>]) -> CheckResult<CompiledSchema> {
    Checker::collect(source, items)?.lower(items)
}

struct Checker<'s, 'a> {
    source: &'s str,
    definitions: HashMap<&'a str, &'a DefinitionAst<'a>>,
    caveats: HashSet<&'a str>,
    features: HashSet<&'a str>,
}

impl<'s, 'a> Checker<'s, 'a> {
    /// Registers every top-level name, rejecting duplicates.
    fn collect(source: &'s str, items: &'a [Item<'a>]) -> CheckResult<Self> {
        let mut checker = Self {
            source,
            definitions: HashMap::new(),
            caveats: HashSet::new(),
            features: HashSet::new(),
        };
        let mut seen: HashSet<&str> = HashSet::new();

        for item in items {
            match item {
                Item::Use(feature) => {
                    if !KNOWN_FEATURES.contains(&feature.value) {
                        return Err(checker.error(
                            feature,
                            format!("unknown feature `{}`", feature.value),
                        ));
                    }
                    checker.features.insert(feature.value);
                }
                Item::Caveat(caveat) => {
                    checker.check_type_name("caveat", &caveat.name)?;
                    if !seen.insert(caveat.name.value) {
                        return Err(checker.error(
                            &caveat.name,
                            format!(
                                "found name reused between multiple definitions and/or caveats: `{}`",
                                caveat.name.value
                            ),
                        ));
                    }
                    checker.check_caveat(caveat)?;
                    checker.caveats.insert(caveat.name.value);
                }
                Item::Definition(definition) => {
                    checker.check_type_name("definition", &definition.name)?;
                    if !seen.insert(definition.name.value) {
                        return Err(checker.error(
                            &definition.name,
                            format!(
                                "found name reused between multiple definitions and/or caveats: `{}`",
                                definition.name.value
                            ),
                        ));
                    }
                    checker.check_unique_members(definition)?;
                    checker.definitions.insert(definition.name.value, definition);
                }
            }
        }

        Ok(checker)
    }

    /// Resolves every reference and produces the object model.
    fn lower(&self, items: &'a [Item<'a>]) -> CheckResult<CompiledSchema> {
        let mut schema = CompiledSchema::default();

        for item in items {
            match item {
                Item::Use(_) => {}
                Item::Caveat(caveat) => {
                    schema
                        .caveat_definitions
                        .push(CaveatDefinition::new(caveat.name.value));
                }
                Item::Definition(definition) => {
                    let mut object = ObjectDefinition::new(definition.name.value);
                    for member in &definition.members {
                        match member {
                            Member::Relation(relation) => {
                                self.check_relation(definition, relation)?;
                                object
                                    .relations
                                    .push(RelationDefinition::relation(relation.name.value));
                            }
                            Member::Permission(permission) => {
                                self.check_expression(
                                    definition,
                                    permission.name.value,
                                    &permission.expression,
                                )?;
                                object
                                    .relations
                                    .push(RelationDefinition::permission(permission.name.value));
                            }
                        }
                    }
                    schema.object_definitions.push(object);
                }
            }
        }

        Ok(schema)
    }

    fn check_caveat(&self, caveat: &CaveatAst<'_>) -> CheckResult {
        let mut parameters = HashSet::new();
        for parameter in &caveat.parameters {
            if !parameters.insert(parameter.name) {
                return Err(self.error(
                    &caveat.name,
                    format!(
                        "duplicate parameter `{}` in caveat `{}`",
                        parameter.name, caveat.name.value
                    ),
                ));
            }
            let base = parameter
                .type_name
                .split('<')
                .next()
                .unwrap_or(parameter.type_name);
            if !CAVEAT_PARAMETER_TYPES.contains(&base) {
                return Err(self.error(
                    &caveat.name,
                    format!(
                        "unknown type `{}` for parameter `{}` in caveat `{}`",
                        parameter.type_name, parameter.name, caveat.name.value
                    ),
                ));
            }
        }
        if caveat.expression.trim().is_empty() {
            return Err(self.error(
                &caveat.name,
                format!("caveat `{}` has an empty expression", caveat.name.value),
            ));
        }
        Ok(())
    }

    fn check_type_name(&self, kind: &str, name: &Spanned<&str>) -> CheckResult {
        if is_valid_type_name(name.value) {
            return Ok(());
        }
        Err(self.error(
            name,
            format!("invalid {kind} name `{}`: {NAME_RULE}", name.value),
        ))
    }

    fn check_unique_members(&self, definition: &DefinitionAst<'_>) -> CheckResult {
        let mut names = HashSet::new();
        for member in &definition.members {
            let name = member.name();
            if !is_valid_name(name.value) {
                return Err(self.error(
                    &name,
                    format!(
                        "invalid relation/permission name `{}` under definition `{}`: {NAME_RULE}",
                        name.value, definition.name.value
                    ),
                ));
            }
            if !names.insert(name.value) {
                return Err(self.error(
                    &name,
                    format!(
                        "found duplicate relation/permission name `{}` under definition `{}`",
                        name.value, definition.name.value
                    ),
                ));
            }
        }
        Ok(())
    }

    fn check_relation(
        &self,
        definition: &DefinitionAst<'_>,
        relation: &RelationAst<'_>,
    ) -> CheckResult {
        for allowed in &relation.allowed_types {
            self.check_allowed_type(definition, relation, allowed)?;
        }
        Ok(())
    }

    fn check_allowed_type(
        &self,
        definition: &DefinitionAst<'_>,
        relation: &RelationAst<'_>,
        allowed: &AllowedType<'_>,
    ) -> CheckResult {
        let Some(target) = self.definitions.get(allowed.type_name.value) else {
            return Err(self.error(
                &allowed.type_name,
                format!(
                    "relation `{}#{}` references unknown definition `{}`",
                    definition.name.value, relation.name.value, allowed.type_name.value
                ),
            ));
        };

        if let SubjectKind::Relation(subject_relation) = &allowed.subject {
            if target.member(subject_relation.value).is_none() {
                return Err(self.error(
                    subject_relation,
                    format!(
                        "relation `{}#{}` references unknown relation or permission `{}#{}`",
                        definition.name.value,
                        relation.name.value,
                        target.name.value,
                        subject_relation.value
                    ),
                ));
            }
        }

        for trait_name in &allowed.traits {
            if trait_name.value == EXPIRATION_TRAIT {
                if !self.features.contains(EXPIRATION_TRAIT) {
                    return Err(self.error(
                        trait_name,
                        "expiration trait is not enabled; add `use expiration` to the schema",
                    ));
                }
            } else if !self.caveats.contains(trait_name.value) {
                return Err(self.error(
                    trait_name,
                    format!(
                        "relation `{}#{}` references unknown caveat `{}`",
                        definition.name.value, relation.name.value, trait_name.value
                    ),
                ));
            }
        }

        Ok(())
    }

    fn check_expression(
        &self,
        definition: &DefinitionAst<'_>,
        permission: &str,
        expression: &Expression<'_>,
    ) -> CheckResult {
        match expression {
            Expression::Nil => Ok(()),
            Expression::Reference(name) => {
                if definition.member(name.value).is_none() {
                    return Err(self.unknown_member(definition, permission, name));
                }
                Ok(())
            }
            Expression::Arrow {
                function,
                tupleset,
                computed,
            } => self.check_arrow(definition, permission, *function, tupleset, computed),
            Expression::Union(children) | Expression::Intersection(children) => children
                .iter()
                .try_for_each(|child| self.check_expression(definition, permission, child)),
            Expression::Exclusion(base, subtract) => {
                self.check_expression(definition, permission, base)?;
                self.check_expression(definition, permission, subtract)
            }
        }
    }

    fn check_arrow(
        &self,
        definition: &DefinitionAst<'_>,
        permission: &str,
        function: ArrowFunction,
        tupleset: &Spanned<&str>,
        computed: &Spanned<&str>,
    ) -> CheckResult {
        let relation = match definition.member(tupleset.value) {
            None => return Err(self.unknown_member(definition, permission, tupleset)),
            Some(Member::Permission(_)) => {
                return Err(self.error(
                    tupleset,
                    format!(
                        "under permission `{}#{}`: permissions cannot be used on the left side of {}: `{}`",
                        definition.name.value,
                        permission,
                        arrow_label(function),
                        tupleset.value
                    ),
                ));
            }
            Some(Member::Relation(relation)) => relation,
        };

        let targets: Vec<&DefinitionAst<'_>> = relation
            .allowed_types
            .iter()
            .filter(|allowed| allowed.subject != SubjectKind::Wildcard)
            .filter_map(|allowed| self.definitions.get(allowed.type_name.value).copied())
            .collect();

        if !targets.is_empty() && !targets.iter().any(|t| t.member(computed.value).is_some()) {
            return Err(self.error(
                computed,
                format!(
                    "under permission `{}#{}`: `{}` is not defined on any subject type of relation `{}`",
                    definition.name.value, permission, computed.value, tupleset.value
                ),
            ));
        }

        Ok(())
    }

    fn unknown_member(
        &self,
        definition: &DefinitionAst<'_>,
        permission: &str,
        name: &Spanned<&str>,
    ) -> SchemaDiagnostic {
        self.error(
            name,
            format!(
                "under permission `{}#{}`: relation or permission `{}` not found",
                definition.name.value, permission, name.value
            ),
        )
    }

    fn error<T>(&self, at: &Spanned<T>, message: impl Into<String>) -> SchemaDiagnostic {
        SchemaDiagnostic::at_offset(message, self.source, at.offset(self.source))
    }
}

fn arrow_label(function: ArrowFunction) -> &'static str {
    match function {
        ArrowFunction::Arrow => "an arrow",
        ArrowFunction::Any => "`.any`",
        ArrowFunction::All => "`.all`",
    }
}
