//! Typed AST layer over CST
//!
//! Ergonomic, type-safe wrappers over the raw CST nodes the rename needs to
//! inspect. Each wrapper implements `cast()` to safely convert from a CST
//! node; accessors return `None` when the parser had to recover from an error
//! and the child is missing.
//!
//! # Example
//!
//! ```ignore
//! use legacynator_core::cst::{parse_csharp, ast::{AstNode, CompilationUnit}};
//!
//! let parsed = parse_csharp("using Moq.Language;");
//! let unit = CompilationUnit::cast(parsed.syntax).unwrap();
//! let using = unit.usings().next().unwrap();
//!
//! assert_eq!(using.name().unwrap().segment_texts(), vec!["Moq", "Language"]);
//! ```

use super::{CsSyntaxKind, CsSyntaxNode, CsSyntaxToken};

/// Helper trait for casting CST nodes to typed wrappers
pub trait AstNode: Sized {
    fn can_cast(kind: CsSyntaxKind) -> bool;
    fn cast(node: CsSyntaxNode) -> Option<Self>;
    fn syntax(&self) -> &CsSyntaxNode;
}

/// Helper function to find first child of a specific kind
fn child_of_kind(parent: &CsSyntaxNode, kind: CsSyntaxKind) -> Option<CsSyntaxNode> {
    parent.children().find(|n| n.kind() == kind)
}

/// Helper function to find first token of a specific kind
fn token_of_kind(parent: &CsSyntaxNode, kind: CsSyntaxKind) -> Option<CsSyntaxToken> {
    parent
        .children_with_tokens()
        .filter_map(|e| e.into_token())
        .find(|t| t.kind() == kind)
}

/// First child that sits in a type position
pub fn type_child(parent: &CsSyntaxNode) -> Option<CsSyntaxNode> {
    parent.children().find(|n| n.kind().is_type())
}

/// Node text with all trivia removed
pub fn text_without_trivia(node: &CsSyntaxNode) -> String {
    node.descendants_with_tokens()
        .filter_map(|e| e.into_token())
        .filter(|t| !t.kind().is_trivia())
        .map(|t| t.text().to_string())
        .collect()
}

// ============================================================================
// Compilation unit and directives
// ============================================================================

/// Root of one parsed file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationUnit {
    syntax: CsSyntaxNode,
}

impl AstNode for CompilationUnit {
    fn can_cast(kind: CsSyntaxKind) -> bool {
        kind == CsSyntaxKind::CompilationUnit
    }

    fn cast(node: CsSyntaxNode) -> Option<Self> {
        if Self::can_cast(node.kind()) {
            Some(Self { syntax: node })
        } else {
            None
        }
    }

    fn syntax(&self) -> &CsSyntaxNode {
        &self.syntax
    }
}

impl CompilationUnit {
    /// Using directives anywhere in the file, including inside namespaces
    pub fn usings(&self) -> impl Iterator<Item = UsingDirective> {
        self.syntax.descendants().filter_map(UsingDirective::cast)
    }

    /// Namespace declarations anywhere in the file
    pub fn namespaces(&self) -> impl Iterator<Item = NamespaceDeclaration> {
        self.syntax.descendants().filter_map(NamespaceDeclaration::cast)
    }

    pub fn cref_attributes(&self) -> impl Iterator<Item = XmlCrefAttribute> {
        self.syntax.descendants().filter_map(XmlCrefAttribute::cast)
    }
}

/// `using X;`, `using static X;`, `using A = X;`, `global using X;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsingDirective {
    syntax: CsSyntaxNode,
}

impl AstNode for UsingDirective {
    fn can_cast(kind: CsSyntaxKind) -> bool {
        kind == CsSyntaxKind::UsingDirective
    }

    fn cast(node: CsSyntaxNode) -> Option<Self> {
        if Self::can_cast(node.kind()) {
            Some(Self { syntax: node })
        } else {
            None
        }
    }

    fn syntax(&self) -> &CsSyntaxNode {
        &self.syntax
    }
}

impl UsingDirective {
    /// The imported name (for an alias, the aliased target)
    pub fn name(&self) -> Option<Name> {
        self.syntax.children().find_map(Name::cast)
    }

    pub fn alias(&self) -> Option<String> {
        child_of_kind(&self.syntax, CsSyntaxKind::NameEquals)
            .and_then(|n| token_of_kind(&n, CsSyntaxKind::Ident))
            .map(|t| t.text().to_string())
    }

    pub fn is_static(&self) -> bool {
        token_of_kind(&self.syntax, CsSyntaxKind::StaticKw).is_some()
    }
}

/// Block-bodied or file-scoped namespace declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDeclaration {
    syntax: CsSyntaxNode,
}

impl AstNode for NamespaceDeclaration {
    fn can_cast(kind: CsSyntaxKind) -> bool {
        matches!(
            kind,
            CsSyntaxKind::NamespaceDeclaration | CsSyntaxKind::FileScopedNamespaceDeclaration
        )
    }

    fn cast(node: CsSyntaxNode) -> Option<Self> {
        if Self::can_cast(node.kind()) {
            Some(Self { syntax: node })
        } else {
            None
        }
    }

    fn syntax(&self) -> &CsSyntaxNode {
        &self.syntax
    }
}

impl NamespaceDeclaration {
    pub fn name(&self) -> Option<Name> {
        self.syntax.children().find_map(Name::cast)
    }

    pub fn is_file_scoped(&self) -> bool {
        self.syntax.kind() == CsSyntaxKind::FileScopedNamespaceDeclaration
    }
}

// ============================================================================
// Names
// ============================================================================

/// Any name: `A`, `A<T>`, `A.B`, `alias::A`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    syntax: CsSyntaxNode,
}

impl AstNode for Name {
    fn can_cast(kind: CsSyntaxKind) -> bool {
        kind.is_name()
    }

    fn cast(node: CsSyntaxNode) -> Option<Self> {
        if Self::can_cast(node.kind()) {
            Some(Self { syntax: node })
        } else {
            None
        }
    }

    fn syntax(&self) -> &CsSyntaxNode {
        &self.syntax
    }
}

impl Name {
    /// Simple-name nodes from left to right, read along the left spine
    ///
    /// An alias qualifier (`global::`) is not a segment: `global::Moq.Times`
    /// has the segments `Moq` and `Times`.
    pub fn segments(&self) -> Vec<CsSyntaxNode> {
        let mut right_parts = Vec::new();
        let mut current = self.syntax.clone();

        loop {
            match current.kind() {
                CsSyntaxKind::QualifiedName => {
                    let mut parts = current.children().filter(|n| n.kind().is_name());
                    let (Some(left), Some(right)) = (parts.next(), parts.next()) else {
                        break;
                    };
                    right_parts.push(right);
                    current = left;
                }
                CsSyntaxKind::AliasQualifiedName => {
                    if let Some(right) = current.children().filter(|n| n.kind().is_name()).nth(1)
                    {
                        right_parts.push(right);
                    }
                    break;
                }
                CsSyntaxKind::IdentifierName | CsSyntaxKind::GenericName => {
                    right_parts.push(current);
                    break;
                }
                _ => break,
            }
        }

        right_parts.reverse();
        right_parts
    }

    /// Identifier text of each segment, without type arguments or trivia
    pub fn segment_texts(&self) -> Vec<String> {
        self.segments()
            .iter()
            .filter_map(simple_name_identifier)
            .collect()
    }

    /// The leftmost segment node
    pub fn leftmost(&self) -> Option<CsSyntaxNode> {
        self.segments().into_iter().next()
    }

    pub fn is_qualified(&self) -> bool {
        self.segments().len() > 1
    }
}

/// Identifier of an `IdentifierName` or `GenericName`
pub fn simple_name_identifier(node: &CsSyntaxNode) -> Option<String> {
    match node.kind() {
        CsSyntaxKind::IdentifierName | CsSyntaxKind::GenericName => {
            token_of_kind(node, CsSyntaxKind::Ident).map(|t| t.text().to_string())
        }
        _ => None,
    }
}

// ============================================================================
// Declarations with type slots
// ============================================================================

/// `private Moq.Times times = ..., other;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDeclaration {
    syntax: CsSyntaxNode,
}

impl AstNode for FieldDeclaration {
    fn can_cast(kind: CsSyntaxKind) -> bool {
        kind == CsSyntaxKind::FieldDeclaration
    }

    fn cast(node: CsSyntaxNode) -> Option<Self> {
        if Self::can_cast(node.kind()) {
            Some(Self { syntax: node })
        } else {
            None
        }
    }

    fn syntax(&self) -> &CsSyntaxNode {
        &self.syntax
    }
}

impl FieldDeclaration {
    pub fn declaration(&self) -> Option<VariableDeclaration> {
        self.syntax.children().find_map(VariableDeclaration::cast)
    }

    /// The declared type
    pub fn ty(&self) -> Option<CsSyntaxNode> {
        self.declaration().and_then(|d| d.ty())
    }
}

/// Type plus declarators, shared by fields and field-like events
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDeclaration {
    syntax: CsSyntaxNode,
}

impl AstNode for VariableDeclaration {
    fn can_cast(kind: CsSyntaxKind) -> bool {
        kind == CsSyntaxKind::VariableDeclaration
    }

    fn cast(node: CsSyntaxNode) -> Option<Self> {
        if Self::can_cast(node.kind()) {
            Some(Self { syntax: node })
        } else {
            None
        }
    }

    fn syntax(&self) -> &CsSyntaxNode {
        &self.syntax
    }
}

impl VariableDeclaration {
    pub fn ty(&self) -> Option<CsSyntaxNode> {
        type_child(&self.syntax)
    }

    pub fn names(&self) -> Vec<String> {
        self.syntax
            .children()
            .filter(|n| n.kind() == CsSyntaxKind::VariableDeclarator)
            .filter_map(|n| token_of_kind(&n, CsSyntaxKind::Ident))
            .map(|t| t.text().to_string())
            .collect()
    }
}

/// `event Moq.Handler Raised;` or `event Moq.Handler Raised { add; remove; }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDeclaration {
    syntax: CsSyntaxNode,
}

impl AstNode for EventDeclaration {
    fn can_cast(kind: CsSyntaxKind) -> bool {
        kind == CsSyntaxKind::EventDeclaration
    }

    fn cast(node: CsSyntaxNode) -> Option<Self> {
        if Self::can_cast(node.kind()) {
            Some(Self { syntax: node })
        } else {
            None
        }
    }

    fn syntax(&self) -> &CsSyntaxNode {
        &self.syntax
    }
}

impl EventDeclaration {
    pub fn ty(&self) -> Option<CsSyntaxNode> {
        type_child(&self.syntax).or_else(|| {
            self.syntax
                .children()
                .find_map(VariableDeclaration::cast)
                .and_then(|d| d.ty())
        })
    }
}

/// One parameter of a method, constructor, delegate, operator or indexer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    syntax: CsSyntaxNode,
}

impl AstNode for Parameter {
    fn can_cast(kind: CsSyntaxKind) -> bool {
        kind == CsSyntaxKind::Parameter
    }

    fn cast(node: CsSyntaxNode) -> Option<Self> {
        if Self::can_cast(node.kind()) {
            Some(Self { syntax: node })
        } else {
            None
        }
    }

    fn syntax(&self) -> &CsSyntaxNode {
        &self.syntax
    }
}

impl Parameter {
    pub fn ty(&self) -> Option<CsSyntaxNode> {
        type_child(&self.syntax)
    }

    pub fn name(&self) -> Option<String> {
        token_of_kind(&self.syntax, CsSyntaxKind::Ident).map(|t| t.text().to_string())
    }
}

/// `: Base, IFoo, IBar<T>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseList {
    syntax: CsSyntaxNode,
}

impl AstNode for BaseList {
    fn can_cast(kind: CsSyntaxKind) -> bool {
        kind == CsSyntaxKind::BaseList
    }

    fn cast(node: CsSyntaxNode) -> Option<Self> {
        if Self::can_cast(node.kind()) {
            Some(Self { syntax: node })
        } else {
            None
        }
    }

    fn syntax(&self) -> &CsSyntaxNode {
        &self.syntax
    }
}

impl BaseList {
    /// Entry types in source order
    pub fn types(&self) -> impl Iterator<Item = CsSyntaxNode> {
        self.syntax
            .children()
            .filter(|n| n.kind() == CsSyntaxKind::SimpleBaseType)
            .filter_map(|n| type_child(&n))
    }
}

// ============================================================================
// Documentation crefs
// ============================================================================

/// `cref="..."` inside a `///` comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlCrefAttribute {
    syntax: CsSyntaxNode,
}

impl AstNode for XmlCrefAttribute {
    fn can_cast(kind: CsSyntaxKind) -> bool {
        kind == CsSyntaxKind::XmlCrefAttribute
    }

    fn cast(node: CsSyntaxNode) -> Option<Self> {
        if Self::can_cast(node.kind()) {
            Some(Self { syntax: node })
        } else {
            None
        }
    }

    fn syntax(&self) -> &CsSyntaxNode {
        &self.syntax
    }
}

impl XmlCrefAttribute {
    pub fn cref(&self) -> Option<Cref> {
        self.syntax.children().find_map(|node| match node.kind() {
            CsSyntaxKind::QualifiedCref => QualifiedCref::cast(node).map(Cref::Qualified),
            CsSyntaxKind::NameMemberCref => NameMemberCref::cast(node).map(Cref::Member),
            _ => None,
        })
    }
}

/// The parsed value of a cref attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cref {
    /// `Container.Member(params)`
    Qualified(QualifiedCref),
    /// `Member(params)`
    Member(NameMemberCref),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedCref {
    syntax: CsSyntaxNode,
}

impl AstNode for QualifiedCref {
    fn can_cast(kind: CsSyntaxKind) -> bool {
        kind == CsSyntaxKind::QualifiedCref
    }

    fn cast(node: CsSyntaxNode) -> Option<Self> {
        if Self::can_cast(node.kind()) {
            Some(Self { syntax: node })
        } else {
            None
        }
    }

    fn syntax(&self) -> &CsSyntaxNode {
        &self.syntax
    }
}

impl QualifiedCref {
    /// Everything before the last dot
    pub fn container(&self) -> Option<Name> {
        self.syntax.children().find_map(Name::cast)
    }

    pub fn member(&self) -> Option<NameMemberCref> {
        self.syntax.children().find_map(NameMemberCref::cast)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameMemberCref {
    syntax: CsSyntaxNode,
}

impl AstNode for NameMemberCref {
    fn can_cast(kind: CsSyntaxKind) -> bool {
        kind == CsSyntaxKind::NameMemberCref
    }

    fn cast(node: CsSyntaxNode) -> Option<Self> {
        if Self::can_cast(node.kind()) {
            Some(Self { syntax: node })
        } else {
            None
        }
    }

    fn syntax(&self) -> &CsSyntaxNode {
        &self.syntax
    }
}

impl NameMemberCref {
    pub fn name(&self) -> Option<Name> {
        self.syntax.children().find_map(Name::cast)
    }

    pub fn has_parameters(&self) -> bool {
        child_of_kind(&self.syntax, CsSyntaxKind::CrefParameterList).is_some()
    }

    pub fn parameters(&self) -> Vec<CrefParameter> {
        child_of_kind(&self.syntax, CsSyntaxKind::CrefParameterList)
            .map(|list| list.children().filter_map(CrefParameter::cast).collect())
            .unwrap_or_default()
    }
}

/// A parameter type inside a cref: `Setup(Moq.Times)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrefParameter {
    syntax: CsSyntaxNode,
}

impl AstNode for CrefParameter {
    fn can_cast(kind: CsSyntaxKind) -> bool {
        kind == CsSyntaxKind::CrefParameter
    }

    fn cast(node: CsSyntaxNode) -> Option<Self> {
        if Self::can_cast(node.kind()) {
            Some(Self { syntax: node })
        } else {
            None
        }
    }

    fn syntax(&self) -> &CsSyntaxNode {
        &self.syntax
    }
}

impl CrefParameter {
    pub fn ty(&self) -> Option<CsSyntaxNode> {
        type_child(&self.syntax)
    }
}
