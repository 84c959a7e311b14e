//! Structure-preserving rename over a whole syntax tree
//!
//! The walk is depth-first. At each node the rule for its kind runs first;
//! the (possibly replaced) node is then descended into. Results come back up
//! as `Option<GreenNode>`, `None` meaning "unchanged", so only the nodes on
//! a path to a rewrite are rebuilt and every other subtree is shared with the
//! input.

use std::fmt;

use rowan::{GreenNode, NodeOrToken};
use tracing::trace;

use super::matcher::{QualifierMatcher, RenameRule};
use crate::cst::ast::{
    self, AstNode, BaseList, Cref, CrefParameter, EventDeclaration, FieldDeclaration, Name,
    Parameter, XmlCrefAttribute,
};
use crate::cst::{CsSyntaxKind, CsSyntaxNode, edit};

/// The construct a rewrite happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RewriteKind {
    Namespace,
    Using,
    Field,
    Parameter,
    Cref,
    CrefParameter,
    BaseType,
    MemberType,
    TypeArgument,
    ElementType,
    TupleElement,
    Constraint,
}

impl fmt::Display for RewriteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RewriteKind::Namespace => "namespace",
            RewriteKind::Using => "using",
            RewriteKind::Field => "field type",
            RewriteKind::Parameter => "parameter type",
            RewriteKind::Cref => "cref",
            RewriteKind::CrefParameter => "cref parameter",
            RewriteKind::BaseType => "base type",
            RewriteKind::MemberType => "member type",
            RewriteKind::TypeArgument => "type argument",
            RewriteKind::ElementType => "element type",
            RewriteKind::TupleElement => "tuple element",
            RewriteKind::Constraint => "constraint",
        };
        f.write_str(label)
    }
}

/// One rewritten reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteEvent {
    pub kind: RewriteKind,
    pub before: String,
    pub after: String,
}

impl fmt::Display for RewriteEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.kind, self.before, self.after)
    }
}

/// Renames every reference to the rule's root namespace in a tree
///
/// # Example
///
/// ```rust,ignore
/// use legacynator_core::cst::parse_csharp;
/// use legacynator_core::rename::LegacyRewriter;
///
/// let parsed = parse_csharp("using Moq;");
/// let mut rewriter = LegacyRewriter::new();
/// let output = rewriter.rewrite(&parsed.syntax);
/// assert_eq!(output.text().to_string(), "using Moq.Legacy;");
/// ```
#[derive(Debug, Default)]
pub struct LegacyRewriter {
    matcher: QualifierMatcher,
    events: Vec<RewriteEvent>,
}

impl LegacyRewriter {
    pub fn new() -> Self {
        Self::with_rule(RenameRule::MOQ_LEGACY)
    }

    pub fn with_rule(rule: RenameRule) -> Self {
        Self {
            matcher: QualifierMatcher::new(rule),
            events: Vec::new(),
        }
    }

    /// Rewrite a tree, returning a new root; `root` itself is not modified
    pub fn rewrite(&mut self, root: &CsSyntaxNode) -> CsSyntaxNode {
        match self.visit(root) {
            Some(green) => CsSyntaxNode::new_root(green),
            None => root.clone(),
        }
    }

    /// Rewrites recorded so far, in visiting order
    pub fn events(&self) -> &[RewriteEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<RewriteEvent> {
        self.events
    }

    fn visit(&mut self, node: &CsSyntaxNode) -> Option<GreenNode> {
        match self.rewrite_node(node) {
            Some(green) => {
                // Descend into the replacement so nested slots are still seen
                let replaced = CsSyntaxNode::new_root(green.clone());
                Some(self.visit_children(&replaced).unwrap_or(green))
            }
            None => self.visit_children(node),
        }
    }

    fn visit_children(&mut self, node: &CsSyntaxNode) -> Option<GreenNode> {
        let mut rebuilt: Option<GreenNode> = None;
        for child in node.children() {
            if let Some(new_child) = self.visit(&child) {
                let current = rebuilt.unwrap_or_else(|| node.green().into_owned());
                rebuilt = Some(current.replace_child(child.index(), NodeOrToken::Node(new_child)));
            }
        }
        rebuilt
    }

    /// The rule for one node kind
    fn rewrite_node(&mut self, node: &CsSyntaxNode) -> Option<GreenNode> {
        use CsSyntaxKind as K;

        match node.kind() {
            K::NamespaceDeclaration | K::FileScopedNamespaceDeclaration => {
                self.rewrite_dotted_name(node, RewriteKind::Namespace)
            }
            K::UsingDirective => self.rewrite_dotted_name(node, RewriteKind::Using),

            K::FieldDeclaration => {
                let ty = FieldDeclaration::cast(node.clone()).and_then(|f| f.ty());
                self.rewrite_types(node, ty, RewriteKind::Field)
            }
            K::Parameter => {
                let ty = Parameter::cast(node.clone()).and_then(|p| p.ty());
                self.rewrite_types(node, ty, RewriteKind::Parameter)
            }
            K::XmlCrefAttribute => self.rewrite_cref(node),
            K::CrefParameter => {
                let ty = CrefParameter::cast(node.clone()).and_then(|p| p.ty());
                self.rewrite_types(node, ty, RewriteKind::CrefParameter)
            }
            K::BaseList => {
                let types = BaseList::cast(node.clone())
                    .map(|list| list.types().collect::<Vec<_>>())
                    .unwrap_or_default();
                self.rewrite_types(node, types, RewriteKind::BaseType)
            }

            K::MethodDeclaration
            | K::DelegateDeclaration
            | K::OperatorDeclaration
            | K::ConversionOperatorDeclaration
            | K::PropertyDeclaration
            | K::IndexerDeclaration => {
                self.rewrite_types(node, ast::type_child(node), RewriteKind::MemberType)
            }
            K::EventDeclaration => {
                let ty = EventDeclaration::cast(node.clone()).and_then(|e| e.ty());
                self.rewrite_types(node, ty, RewriteKind::MemberType)
            }
            K::TypeArgumentList => {
                let types: Vec<_> = node.children().filter(|n| n.kind().is_type()).collect();
                self.rewrite_types(node, types, RewriteKind::TypeArgument)
            }
            K::ArrayType | K::NullableType | K::PointerType => {
                self.rewrite_types(node, ast::type_child(node), RewriteKind::ElementType)
            }
            K::TupleElement => {
                self.rewrite_types(node, ast::type_child(node), RewriteKind::TupleElement)
            }
            K::TypeConstraint => {
                self.rewrite_types(node, ast::type_child(node), RewriteKind::Constraint)
            }

            // Nothing to rewrite at these kinds; their children are still visited
            K::Whitespace
            | K::Newline
            | K::CommentLine
            | K::CommentBlock
            | K::Directive
            | K::NamespaceKw
            | K::UsingKw
            | K::StaticKw
            | K::ClassKw
            | K::StructKw
            | K::InterfaceKw
            | K::EnumKw
            | K::DelegateKw
            | K::EventKw
            | K::OperatorKw
            | K::ImplicitKw
            | K::ExplicitKw
            | K::ThisKw
            | K::ExternKw
            | K::PublicKw
            | K::PrivateKw
            | K::ProtectedKw
            | K::InternalKw
            | K::AbstractKw
            | K::SealedKw
            | K::VirtualKw
            | K::OverrideKw
            | K::ReadonlyKw
            | K::ConstKw
            | K::VolatileKw
            | K::UnsafeKw
            | K::NewKw
            | K::FixedKw
            | K::RefKw
            | K::OutKw
            | K::InKw
            | K::ParamsKw
            | K::BoolKw
            | K::ByteKw
            | K::SbyteKw
            | K::ShortKw
            | K::UshortKw
            | K::IntKw
            | K::UintKw
            | K::LongKw
            | K::UlongKw
            | K::CharKw
            | K::FloatKw
            | K::DoubleKw
            | K::DecimalKw
            | K::StringKw
            | K::ObjectKw
            | K::VoidKw
            | K::LBrace
            | K::RBrace
            | K::LParen
            | K::RParen
            | K::LBracket
            | K::RBracket
            | K::Lt
            | K::Gt
            | K::Semicolon
            | K::Comma
            | K::Dot
            | K::Colon
            | K::ColonColon
            | K::Equals
            | K::Question
            | K::Asterisk
            | K::Arrow
            | K::Tilde
            | K::Punct
            | K::Ident
            | K::String
            | K::Char
            | K::Number
            | K::DocCommentStart
            | K::XmlText
            | K::XmlAttributeName
            | K::XmlQuote
            | K::CompilationUnit
            | K::NameEquals
            | K::ExternAliasDirective
            | K::AttributeList
            | K::GlobalStatement
            | K::ClassDeclaration
            | K::StructDeclaration
            | K::InterfaceDeclaration
            | K::RecordDeclaration
            | K::EnumDeclaration
            | K::TypeParameterList
            | K::SimpleBaseType
            | K::TypeParameterConstraintClause
            | K::EnumBody
            | K::VariableDeclaration
            | K::VariableDeclarator
            | K::ConstructorDeclaration
            | K::DestructorDeclaration
            | K::MemberName
            | K::ParameterList
            | K::BracketedParameterList
            | K::Block
            | K::ExpressionSoup
            | K::PredefinedType
            | K::IdentifierName
            | K::GenericName
            | K::QualifiedName
            | K::AliasQualifiedName
            | K::ArrayRankSpecifier
            | K::TupleType
            | K::DocumentationComment
            | K::QualifiedCref
            | K::NameMemberCref
            | K::CrefParameterList
            | K::Error
            | K::Unknown
            | K::ParsedName => None,
        }
    }

    /// Namespace and using names: the bare root also matches, and the name
    /// is rebuilt from text
    fn rewrite_dotted_name(&mut self, node: &CsSyntaxNode, kind: RewriteKind) -> Option<GreenNode> {
        let name = node.children().find_map(Name::cast)?;
        let name = name.syntax();
        if !self.matcher.is_renamable_namespace_or_import_name(name) {
            return None;
        }

        let replacement = self.matcher.to_legacy_name(name);
        self.record(kind, name, &replacement);
        Some(edit::replace_descendant(node, name, replacement))
    }

    /// Rewrite every renamable type among `slots`, all of which lie inside
    /// `node`
    fn rewrite_types(
        &mut self,
        node: &CsSyntaxNode,
        slots: impl IntoIterator<Item = CsSyntaxNode>,
        kind: RewriteKind,
    ) -> Option<GreenNode> {
        let mut rebuilt: Option<GreenNode> = None;

        for slot in slots {
            if !self.matcher.is_renamable(&slot) {
                continue;
            }
            let Some(path) = edit::path_to(node, &slot) else {
                continue;
            };

            let replacement = self.matcher.to_legacy(&slot);
            self.record(kind, &slot, &replacement);

            // Sibling indices are stable, so paths from the original node
            // stay valid after earlier replacements
            let current = rebuilt.unwrap_or_else(|| node.green().into_owned());
            rebuilt = Some(edit::replace_at_path(&current, &path, replacement).unwrap_or(current));
        }

        rebuilt
    }

    /// `Moq.X.Member` → `Moq.Legacy.X.Member`, and the bare namespace cref
    /// `Moq` → `Moq.Legacy`
    fn rewrite_cref(&mut self, node: &CsSyntaxNode) -> Option<GreenNode> {
        let cref = XmlCrefAttribute::cast(node.clone())?.cref()?;

        match cref {
            Cref::Qualified(qualified) => {
                let container = qualified.container()?;
                let container = container.syntax();

                if self.matcher.is_renamable(container) {
                    let replacement = self.matcher.to_legacy(container);
                    self.record(RewriteKind::Cref, container, &replacement);
                    return Some(edit::replace_descendant(node, container, replacement));
                }

                // `Moq.Times` or `global::Moq.Times`: the container is the
                // root itself. `Moq.Legacy` has the same shape and is already
                // rewritten.
                let member_is_marker = qualified
                    .member()
                    .filter(|m| !m.has_parameters())
                    .and_then(|m| m.name())
                    .map(|n| n.segment_texts())
                    .is_some_and(|texts| texts == [self.matcher.rule().marker]);
                if self.matcher.is_root_reference(container) && !member_is_marker {
                    let replacement = self.matcher.to_legacy(container);
                    self.record(RewriteKind::Cref, container, &replacement);
                    return Some(edit::replace_descendant(node, container, replacement));
                }

                None
            }
            Cref::Member(member) => {
                if member.has_parameters() {
                    return None;
                }
                let name = member.name()?;
                let name = name.syntax();
                if self.matcher.is_legacy_root(name) {
                    let replacement = self.matcher.legacy_root_cref_green();
                    self.record(RewriteKind::Cref, member.syntax(), &replacement);
                    return Some(edit::replace_descendant(node, member.syntax(), replacement));
                }
                if self.matcher.is_root_reference(name) {
                    // global::Moq
                    let replacement = self.matcher.to_legacy(name);
                    self.record(RewriteKind::Cref, name, &replacement);
                    return Some(edit::replace_descendant(node, name, replacement));
                }
                None
            }
        }
    }

    fn record(&mut self, kind: RewriteKind, before: &CsSyntaxNode, after: &GreenNode) {
        let event = RewriteEvent {
            kind,
            before: before.text().to_string(),
            after: CsSyntaxNode::new_root(after.clone()).text().to_string(),
        };
        trace!(%event, "Rewrote reference");
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::parse_csharp;

    fn rewrite(source: &str) -> String {
        let parsed = parse_csharp(source);
        assert!(!parsed.has_errors(), "{source}: {:?}", parsed.errors);
        LegacyRewriter::new()
            .rewrite(&parsed.syntax)
            .text()
            .to_string()
    }

    fn events(source: &str) -> Vec<RewriteEvent> {
        let parsed = parse_csharp(source);
        let mut rewriter = LegacyRewriter::new();
        rewriter.rewrite(&parsed.syntax);
        rewriter.into_events()
    }

    #[test]
    fn test_namespace_and_field() {
        assert_eq!(
            rewrite("namespace Moq.Core { public class Mock { Moq.Times times; } }"),
            "namespace Moq.Legacy.Core { public class Mock { Moq.Legacy.Times times; } }"
        );
    }

    #[test]
    fn test_using_directives() {
        assert_eq!(rewrite("using Moq;"), "using Moq.Legacy;");
        assert_eq!(rewrite("using Moq.Legacy;"), "using Moq.Legacy;");
        assert_eq!(rewrite("using static Moq.It;"), "using static Moq.Legacy.It;");
        assert_eq!(
            rewrite("using Setup = Moq.Language.ISetup;"),
            "using Setup = Moq.Legacy.Language.ISetup;"
        );
        assert_eq!(rewrite("global using Moq;"), "global using Moq.Legacy;");
        assert_eq!(rewrite("using System;"), "using System;");
    }

    #[test]
    fn test_base_list_rewrites_only_matching_entries() {
        assert_eq!(
            rewrite("class Mock<T> : Moq.IMock, IDisposable { }"),
            "class Mock<T> : Moq.Legacy.IMock, IDisposable { }"
        );
        assert_eq!(
            rewrite("class Mock : Moq.IMock , /* keep */ Moq.IFluentInterface { }"),
            "class Mock : Moq.Legacy.IMock , /* keep */ Moq.Legacy.IFluentInterface { }"
        );
    }

    #[test]
    fn test_unrelated_field_is_unchanged() {
        let source = "class C { System.String name; Moquery.Times t; }";
        assert_eq!(rewrite(source), source);
    }

    #[test]
    fn test_cref_rules() {
        assert_eq!(
            rewrite("/// <see cref=\"Moq\"/>\nclass C { }"),
            "/// <see cref=\"Moq.Legacy\"/>\nclass C { }"
        );
        assert_eq!(
            rewrite("/// <see cref=\"Moq.Times\"/>\nclass C { }"),
            "/// <see cref=\"Moq.Legacy.Times\"/>\nclass C { }"
        );
        assert_eq!(
            rewrite("/// <see cref=\"Moq.Language.IReturns{TMock, TResult}.Returns\"/>\nclass C { }"),
            "/// <see cref=\"Moq.Legacy.Language.IReturns{TMock, TResult}.Returns\"/>\nclass C { }"
        );
        assert_eq!(
            rewrite("/// <exception cref='Moq.MockException'>x</exception>\nclass C { }"),
            "/// <exception cref='Moq.Legacy.MockException'>x</exception>\nclass C { }"
        );
    }

    #[test]
    fn test_cref_parameters() {
        assert_eq!(
            rewrite("/// <see cref=\"Mock.Verify(Moq.Times, ref Moq.Times)\"/>\nclass C { }"),
            "/// <see cref=\"Mock.Verify(Moq.Legacy.Times, ref Moq.Legacy.Times)\"/>\nclass C { }"
        );
    }

    #[test]
    fn test_cref_parameters_with_nested_generics() {
        assert_eq!(
            rewrite(
                "/// <see cref=\"Mock.Setup(System.Action{System.Func{Moq.Times}})\"/>\nclass C { }"
            ),
            "/// <see cref=\"Mock.Setup(System.Action{System.Func{Moq.Legacy.Times}})\"/>\nclass C { }"
        );
        assert_eq!(
            rewrite(
                "/// <see cref=\"Mock{T}.Setup(Expression{Func{T, Moq.Times}}, Moq.It[])\"/>\nclass C { }"
            ),
            "/// <see cref=\"Mock{T}.Setup(Expression{Func{T, Moq.Legacy.Times}}, Moq.Legacy.It[])\"/>\nclass C { }"
        );
    }

    #[test]
    fn test_alias_qualified_crefs() {
        assert_eq!(
            rewrite("/// <see cref=\"global::Moq.Times\"/>\nclass C { }"),
            "/// <see cref=\"global::Moq.Legacy.Times\"/>\nclass C { }"
        );
        assert_eq!(
            rewrite("/// <see cref=\"global::Moq.Language.ISetup{T}\"/>\nclass C { }"),
            "/// <see cref=\"global::Moq.Legacy.Language.ISetup{T}\"/>\nclass C { }"
        );
        assert_eq!(
            rewrite("/// <see cref=\"global::Moq\"/>\nclass C { }"),
            "/// <see cref=\"global::Moq.Legacy\"/>\nclass C { }"
        );
        for source in [
            "/// <see cref=\"global::Moq.Legacy.Times\"/>\nclass C { }",
            "/// <see cref=\"global::Moq.Legacy\"/>\nclass C { }",
            "/// <see cref=\"global::System.String\"/>\nclass C { }",
        ] {
            assert_eq!(rewrite(source), source);
        }
    }

    #[test]
    fn test_cref_leaves_non_root_references() {
        for source in [
            "/// <see cref=\"Moq.Legacy\"/>\nclass C { }",
            "/// <see cref=\"Moq.Legacy.Times\"/>\nclass C { }",
            "/// <see cref=\"Moq(int)\"/>\nclass C { }",
            "/// <see cref=\"System.Moq\"/>\nclass C { }",
            "/// <see cref=\"T:Moq.Times\"/>\nclass C { }",
            "/// <see cref=\"Moqx\"/>\nclass C { }",
        ] {
            assert_eq!(rewrite(source), source);
        }
    }

    #[test]
    fn test_parameter_and_member_types() {
        assert_eq!(
            rewrite(
                "interface I { Moq.ISetup<T> Setup(Moq.Times times, out Moq.Mock mock); Moq.Times Times { get; } event Moq.Handler Raised; }"
            ),
            "interface I { Moq.Legacy.ISetup<T> Setup(Moq.Legacy.Times times, out Moq.Legacy.Mock mock); Moq.Legacy.Times Times { get; } event Moq.Legacy.Handler Raised; }"
        );
    }

    #[test]
    fn test_nested_type_positions() {
        assert_eq!(
            rewrite(
                "class C<T> where T : Moq.IMock { List<Moq.Times> a; Moq.Times[] b; Moq.Times? c; (Moq.Times x, int) d; }"
            ),
            "class C<T> where T : Moq.Legacy.IMock { List<Moq.Legacy.Times> a; Moq.Legacy.Times[] b; Moq.Legacy.Times? c; (Moq.Legacy.Times x, int) d; }"
        );
    }

    #[test]
    fn test_type_arguments_inside_rewritten_type() {
        assert_eq!(
            rewrite("class C { Moq.Mock<Moq.Times> mock; }"),
            "class C { Moq.Legacy.Mock<Moq.Legacy.Times> mock; }"
        );
    }

    #[test]
    fn test_bodies_are_not_touched() {
        let source = "class C { void M() { Moq.Times t = Moq.Times.Once(); if (t is Moq.Times x) { Run(x); } } }";
        assert_eq!(rewrite(source), source);
    }

    #[test]
    fn test_local_function_parameters() {
        assert_eq!(
            rewrite("class C { void M() { void Local(Moq.Times t, int n) { } Local(t, 1); } }"),
            "class C { void M() { void Local(Moq.Legacy.Times t, int n) { } Local(t, 1); } }"
        );
        assert_eq!(
            rewrite("class C { void M() { int Count(ref Moq.Times t) => 1; } }"),
            "class C { void M() { int Count(ref Moq.Legacy.Times t) => 1; } }"
        );
    }

    #[test]
    fn test_explicitly_typed_lambda_and_anonymous_method_parameters() {
        assert_eq!(
            rewrite("class C { void M() { Run((Moq.Times t) => { }); } }"),
            "class C { void M() { Run((Moq.Legacy.Times t) => { }); } }"
        );
        assert_eq!(
            rewrite("class C { void M() { Run(delegate (Moq.Mock<T> m, int n) { return; }); } }"),
            "class C { void M() { Run(delegate (Moq.Legacy.Mock<T> m, int n) { return; }); } }"
        );
        assert_eq!(
            rewrite("class C { Func<Moq.Times, bool> f = (Moq.Times t) => true; }"),
            "class C { Func<Moq.Legacy.Times, bool> f = (Moq.Legacy.Times t) => true; }"
        );
    }

    #[test]
    fn test_implicitly_typed_lambdas_stay_plain() {
        let source = "class C { void M() { Run((t, n) => t); Run(x => (x)); } }";
        assert_eq!(rewrite(source), source);
    }

    #[test]
    fn test_trivia_is_preserved() {
        assert_eq!(
            rewrite("namespace Moq . Core // ns\n{\n    Moq  .  Times /* t */ times;\n}\n"),
            "namespace Moq.Legacy . Core // ns\n{\n    Moq.Legacy  .  Times /* t */ times;\n}\n"
        );
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let source = "using Moq;\n/// <see cref=\"Moq\"/> <see cref=\"Moq.Times\"/>\nnamespace Moq.Core { class Mock : Moq.IMock { Moq.Times t; void M(Moq.Times t) { } } }";
        let once = rewrite(source);
        assert_eq!(rewrite(&once), once);
        assert!(events(&once).is_empty());
    }

    #[test]
    fn test_untouched_tree_is_returned_as_is() {
        let parsed = parse_csharp("class C { int x; }");
        let output = LegacyRewriter::new().rewrite(&parsed.syntax);
        assert_eq!(output, parsed.syntax);
    }

    #[test]
    fn test_events_record_each_rewrite() {
        let events = events("using Moq;\nclass C : Moq.IMock { Moq.Times t; }");
        let summary: Vec<_> = events.iter().map(ToString::to_string).collect();
        assert_eq!(
            summary,
            vec![
                "using: Moq -> Moq.Legacy",
                "base type: Moq.IMock -> Moq.Legacy.IMock",
                "field type: Moq.Times -> Moq.Legacy.Times",
            ]
        );
    }
}
