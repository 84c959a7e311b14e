//! Qualified-name predicates and rewrites for a single rename rule
//!
//! Works on one node at a time and never walks the tree; the rewriter decides
//! where to ask.

use rowan::GreenNode;
use tracing::warn;

use crate::cst::ast::{AstNode, Name, simple_name_identifier};
use crate::cst::{CsSyntaxKind, CsSyntaxNode, CstBuilder, edit, parse_name};

/// A root namespace and the segment inserted directly after it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenameRule {
    /// Leftmost segment that marks a reference to the library (`Moq`)
    pub root: &'static str,
    /// Segment inserted after the root (`Legacy`)
    pub marker: &'static str,
}

impl RenameRule {
    /// `Moq` → `Moq.Legacy`
    pub const MOQ_LEGACY: RenameRule = RenameRule {
        root: "Moq",
        marker: "Legacy",
    };

    /// The rewritten root as dotted text, e.g. `Moq.Legacy`
    pub fn target(&self) -> String {
        format!("{}.{}", self.root, self.marker)
    }
}

impl Default for RenameRule {
    fn default() -> Self {
        Self::MOQ_LEGACY
    }
}

/// Decides whether a name refers to the renamed library and builds its
/// legacy form
///
/// Matching is segment based and case sensitive: `Moquery.Times` and
/// `moq.Times` never match, and `Moq.Legacy.Times` is already rewritten.
#[derive(Debug, Clone, Copy, Default)]
pub struct QualifierMatcher {
    rule: RenameRule,
}

impl QualifierMatcher {
    pub fn new(rule: RenameRule) -> Self {
        Self { rule }
    }

    pub fn rule(&self) -> RenameRule {
        self.rule
    }

    /// True for a qualified type reference `Moq.X...` whose second segment is
    /// not already the marker
    ///
    /// Non-name types (arrays, nullables, tuples) are never renamable
    /// themselves; their element types are visited separately.
    pub fn is_renamable(&self, ty: &CsSyntaxNode) -> bool {
        let Some(name) = Name::cast(ty.clone()) else {
            return false;
        };
        let segments = name.segments();
        segments.len() >= 2 && self.is_rooted(&segments)
    }

    /// Like [`is_renamable`](Self::is_renamable), but the bare root `Moq`
    /// also matches (`namespace Moq`, `using Moq;`)
    pub fn is_renamable_namespace_or_import_name(&self, name: &CsSyntaxNode) -> bool {
        let Some(name) = Name::cast(name.clone()) else {
            return false;
        };
        let segments = name.segments();
        !segments.is_empty() && self.is_rooted(&segments)
    }

    /// True iff `name` is exactly the bare root identifier
    pub fn is_legacy_root(&self, name: &CsSyntaxNode) -> bool {
        name.kind() == CsSyntaxKind::IdentifierName
            && simple_name_identifier(name).as_deref() == Some(self.rule.root)
    }

    /// True for the root namespace on its own, with or without an alias
    /// qualifier: `Moq`, `global::Moq`
    pub fn is_root_reference(&self, name: &CsSyntaxNode) -> bool {
        let Some(name) = Name::cast(name.clone()) else {
            return false;
        };
        matches!(name.segments().as_slice(), [only] if self.is_legacy_root(only))
    }

    fn is_rooted(&self, segments: &[CsSyntaxNode]) -> bool {
        let Some(first) = segments.first() else {
            return false;
        };
        if !self.is_legacy_root(first) {
            return false;
        }
        match segments.get(1) {
            Some(second) => simple_name_identifier(second).as_deref() != Some(self.rule.marker),
            None => true,
        }
    }

    /// Replace the leftmost `Moq` of a type reference with `Moq.Legacy`
    ///
    /// Only the root identifier node is swapped; every other segment, type
    /// argument and trivia token is reused as is.
    pub fn to_legacy(&self, ty: &CsSyntaxNode) -> GreenNode {
        let leftmost = Name::cast(ty.clone()).and_then(|name| name.leftmost());
        match leftmost {
            Some(root) if self.is_legacy_root(&root) => {
                edit::replace_descendant(ty, &root, self.legacy_root_green())
            }
            _ => ty.green().into_owned(),
        }
    }

    /// Rewrite a whole dotted name by splicing the marker into its text and
    /// parsing the result again
    ///
    /// Falls back to the unchanged name if the spliced text does not parse.
    pub fn to_legacy_name(&self, name: &CsSyntaxNode) -> GreenNode {
        let original = name.green().into_owned();
        let Some(root) = Name::cast(name.clone()).and_then(|n| n.leftmost()) else {
            return original;
        };
        if !self.is_legacy_root(&root) {
            return original;
        }

        let text = name.text().to_string();
        let offset = usize::from(root.text_range().start() - name.text_range().start());
        let root_end = offset + self.rule.root.len();
        let spliced = format!(
            "{}{}{}",
            &text[..offset],
            self.rule.target(),
            &text[root_end..]
        );

        match parse_name(&spliced) {
            Some(parsed) => parsed.green().into_owned(),
            None => {
                warn!(name = %text, "Rewritten name failed to parse, leaving it unchanged");
                original
            }
        }
    }

    /// `Moq.Legacy` as a qualified name node
    pub fn legacy_root_green(&self) -> GreenNode {
        let mut builder = CstBuilder::new();
        builder.start_node(CsSyntaxKind::QualifiedName);
        push_identifier_name(&mut builder, self.rule.root);
        builder.token(CsSyntaxKind::Dot, ".");
        push_identifier_name(&mut builder, self.rule.marker);
        builder.finish_node();
        builder.finish_green()
    }

    /// `Moq.Legacy` as a cref: container `Moq`, member `Legacy`
    pub fn legacy_root_cref_green(&self) -> GreenNode {
        let mut builder = CstBuilder::new();
        builder.start_node(CsSyntaxKind::QualifiedCref);
        push_identifier_name(&mut builder, self.rule.root);
        builder.token(CsSyntaxKind::Dot, ".");
        builder.start_node(CsSyntaxKind::NameMemberCref);
        push_identifier_name(&mut builder, self.rule.marker);
        builder.finish_node();
        builder.finish_node();
        builder.finish_green()
    }
}

fn push_identifier_name(builder: &mut CstBuilder, text: &str) {
    builder.start_node(CsSyntaxKind::IdentifierName);
    builder.token(CsSyntaxKind::Ident, text);
    builder.finish_node();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::parse_csharp;

    fn matcher() -> QualifierMatcher {
        QualifierMatcher::new(RenameRule::MOQ_LEGACY)
    }

    /// The declared type of the single field in `class C { <ty> x; }`
    fn field_type(ty: &str) -> CsSyntaxNode {
        let source = format!("class C {{ {ty} x; }}");
        let parsed = parse_csharp(&source);
        assert!(!parsed.has_errors(), "{source}: {:?}", parsed.errors);
        parsed
            .syntax
            .descendants()
            .find(|n| n.kind() == CsSyntaxKind::VariableDeclaration)
            .and_then(|d| d.first_child())
            .unwrap()
    }

    fn name(text: &str) -> CsSyntaxNode {
        parse_name(text).unwrap()
    }

    fn rewritten(green: GreenNode) -> String {
        CsSyntaxNode::new_root(green).text().to_string()
    }

    #[test]
    fn test_is_renamable_requires_qualified_moq_root() {
        let m = matcher();
        assert!(m.is_renamable(&field_type("Moq.Times")));
        assert!(m.is_renamable(&field_type("Moq.Language.Flow.ISetup<T>")));
        assert!(m.is_renamable(&field_type("global::Moq.Times")));

        assert!(!m.is_renamable(&field_type("Moq")));
        assert!(!m.is_renamable(&field_type("Moq.Legacy.Times")));
        assert!(!m.is_renamable(&field_type("System.String")));
        assert!(!m.is_renamable(&field_type("Moquery.Times")));
        assert!(!m.is_renamable(&field_type("moq.Times")));
        assert!(!m.is_renamable(&field_type("Other.Moq.Times")));
        assert!(!m.is_renamable(&field_type("Moq.Times[]")));
        assert!(!m.is_renamable(&field_type("int")));
    }

    #[test]
    fn test_namespace_or_import_name_accepts_bare_root() {
        let m = matcher();
        assert!(m.is_renamable_namespace_or_import_name(&name("Moq")));
        assert!(m.is_renamable_namespace_or_import_name(&name("Moq.Core")));
        assert!(!m.is_renamable_namespace_or_import_name(&name("Moq.Legacy")));
        assert!(!m.is_renamable_namespace_or_import_name(&name("Moq.Legacy.Core")));
        assert!(!m.is_renamable_namespace_or_import_name(&name("Moqs")));
    }

    #[test]
    fn test_is_legacy_root() {
        let m = matcher();
        assert!(m.is_legacy_root(&name("Moq")));
        assert!(!m.is_legacy_root(&name("Moq.Times")));
        assert!(!m.is_legacy_root(&name("Moq<T>")));
    }

    #[test]
    fn test_is_root_reference() {
        let m = matcher();
        assert!(m.is_root_reference(&name("Moq")));
        assert!(m.is_root_reference(&name("global::Moq")));
        assert!(!m.is_root_reference(&name("global::Moq.Times")));
        assert!(!m.is_root_reference(&name("Moq.Times")));
        assert!(!m.is_root_reference(&name("global::System")));
        assert_eq!(rewritten(m.to_legacy(&name("global::Moq"))), "global::Moq.Legacy");
    }

    #[test]
    fn test_to_legacy_replaces_only_the_root() {
        let m = matcher();
        assert_eq!(rewritten(m.to_legacy(&field_type("Moq.Times"))), "Moq.Legacy.Times");
        assert_eq!(
            rewritten(m.to_legacy(&field_type("Moq.Mock<Moq.Times>"))),
            "Moq.Legacy.Mock<Moq.Times>"
        );
        assert_eq!(
            rewritten(m.to_legacy(&field_type("global::Moq.Times"))),
            "global::Moq.Legacy.Times"
        );
    }

    #[test]
    fn test_to_legacy_keeps_inner_trivia() {
        let m = matcher();
        let ty = field_type("Moq . /* times */ Times");
        assert_eq!(rewritten(m.to_legacy(&ty)), "Moq.Legacy . /* times */ Times");
    }

    #[test]
    fn test_to_legacy_result_is_no_longer_renamable() {
        let m = matcher();
        let once = CsSyntaxNode::new_root(m.to_legacy(&field_type("Moq.Language.IReturns")));
        assert_eq!(once.kind(), CsSyntaxKind::QualifiedName);
        assert!(!m.is_renamable(&once));
    }

    #[test]
    fn test_to_legacy_name() {
        let m = matcher();
        assert_eq!(rewritten(m.to_legacy_name(&name("Moq"))), "Moq.Legacy");
        assert_eq!(rewritten(m.to_legacy_name(&name("Moq.Core"))), "Moq.Legacy.Core");
        assert_eq!(
            rewritten(m.to_legacy_name(&name("global::Moq.Core"))),
            "global::Moq.Legacy.Core"
        );

        let legacy = CsSyntaxNode::new_root(m.to_legacy_name(&name("Moq.Core")));
        assert_eq!(legacy.kind(), CsSyntaxKind::QualifiedName);
        assert!(!m.is_renamable_namespace_or_import_name(&legacy));
    }

    #[test]
    fn test_to_legacy_name_leaves_other_names() {
        let m = matcher();
        assert_eq!(rewritten(m.to_legacy_name(&name("System.Linq"))), "System.Linq");
    }

    #[test]
    fn test_legacy_root_cref_shape() {
        let m = matcher();
        let cref = CsSyntaxNode::new_root(m.legacy_root_cref_green());
        assert_eq!(cref.kind(), CsSyntaxKind::QualifiedCref);
        assert_eq!(cref.text().to_string(), "Moq.Legacy");
        assert_eq!(
            cref.last_child().map(|n| n.kind()),
            Some(CsSyntaxKind::NameMemberCref)
        );
    }
}
