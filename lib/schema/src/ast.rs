//! Syntax tree produced by the parser.
//!
//! Nodes borrow from the schema text. Names are wrapped in [`Spanned`] so the
//! checker can point diagnostics at them.

/// A value together with where it starts in the schema text.
///
/// The location is stored as the number of bytes remaining from the start of
/// the value to the end of the text, which the parser knows without access to
/// the full input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Spanned<T> {
    pub value: T,
    pub tail: usize,
}

impl<T> Spanned<T> {
    /// Returns the byte offset of this value within `source`.
    pub fn offset(&self, source: &str) -> usize {
        source.len().saturating_sub(self.tail)
    }
}

/// A top-level schema item.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Item<'a> {
    Use(Spanned<&'a str>),
    Caveat(CaveatAst<'a>),
    Definition(DefinitionAst<'a>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CaveatAst<'a> {
    pub name: Spanned<&'a str>,
    pub parameters: Vec<CaveatParameter<'a>>,
    pub expression: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CaveatParameter<'a> {
    pub name: &'a str,
    pub type_name: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DefinitionAst<'a> {
    pub name: Spanned<&'a str>,
    pub members: Vec<Member<'a>>,
}

impl<'a> DefinitionAst<'a> {
    pub fn member(&self, name: &str) -> Option<&Member<'a>> {
        self.members.iter().find(|member| member.name().value == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Member<'a> {
    Relation(RelationAst<'a>),
    Permission(PermissionAst<'a>),
}

impl<'a> Member<'a> {
    pub fn name(&self) -> Spanned<&'a str> {
        match self {
            Self::Relation(relation) => relation.name,
            Self::Permission(permission) => permission.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RelationAst<'a> {
    pub name: Spanned<&'a str>,
    pub allowed_types: Vec<AllowedType<'a>>,
}

/// One `|`-separated alternative in a relation's type annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AllowedType<'a> {
    pub type_name: Spanned<&'a str>,
    pub subject: SubjectKind<'a>,
    /// Names following `with`, such as a caveat or `expiration`.
    pub traits: Vec<Spanned<&'a str>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SubjectKind<'a> {
    /// `user`
    Object,
    /// `user:*`
    Wildcard,
    /// `group#member`
    Relation(Spanned<&'a str>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PermissionAst<'a> {
    pub name: Spanned<&'a str>,
    pub expression: Expression<'a>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArrowFunction {
    /// `parent->view`
    Arrow,
    /// `parent.any(view)`
    Any,
    /// `parent.all(view)`
    All,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expression<'a> {
    Nil,
    Reference(Spanned<&'a str>),
    Arrow {
        function: ArrowFunction,
        tupleset: Spanned<&'a str>,
        computed: Spanned<&'a str>,
    },
    Union(Vec<Expression<'a>>),
    Intersection(Vec<Expression<'a>>),
    Exclusion(Box<Expression<'a>>, Box<Expression<'a>>),
}
