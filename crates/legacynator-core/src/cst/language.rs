//! Rowan language implementation for C#
//!
//! Connects the `CsSyntaxKind` enum to Rowan's generic CST infrastructure.

use rowan::Language;

use super::CsSyntaxKind;

/// Language implementation for C# source files
///
/// Zero-sized marker type; all tree types are parameterised by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CsLanguage;

impl Language for CsLanguage {
    type Kind = CsSyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        match raw.0 {
            // Trivia (0-9)
            0 => CsSyntaxKind::Whitespace,
            1 => CsSyntaxKind::Newline,
            2 => CsSyntaxKind::CommentLine,
            3 => CsSyntaxKind::CommentBlock,
            4 => CsSyntaxKind::Directive,

            // Keywords (10-99)
            10 => CsSyntaxKind::NamespaceKw,
            11 => CsSyntaxKind::UsingKw,
            12 => CsSyntaxKind::StaticKw,
            13 => CsSyntaxKind::ClassKw,
            14 => CsSyntaxKind::StructKw,
            15 => CsSyntaxKind::InterfaceKw,
            16 => CsSyntaxKind::EnumKw,
            17 => CsSyntaxKind::DelegateKw,
            18 => CsSyntaxKind::EventKw,
            19 => CsSyntaxKind::OperatorKw,
            20 => CsSyntaxKind::ImplicitKw,
            21 => CsSyntaxKind::ExplicitKw,
            22 => CsSyntaxKind::ThisKw,
            23 => CsSyntaxKind::ExternKw,
            30 => CsSyntaxKind::PublicKw,
            31 => CsSyntaxKind::PrivateKw,
            32 => CsSyntaxKind::ProtectedKw,
            33 => CsSyntaxKind::InternalKw,
            34 => CsSyntaxKind::AbstractKw,
            35 => CsSyntaxKind::SealedKw,
            36 => CsSyntaxKind::VirtualKw,
            37 => CsSyntaxKind::OverrideKw,
            38 => CsSyntaxKind::ReadonlyKw,
            39 => CsSyntaxKind::ConstKw,
            40 => CsSyntaxKind::VolatileKw,
            41 => CsSyntaxKind::UnsafeKw,
            42 => CsSyntaxKind::NewKw,
            43 => CsSyntaxKind::FixedKw,
            50 => CsSyntaxKind::RefKw,
            51 => CsSyntaxKind::OutKw,
            52 => CsSyntaxKind::InKw,
            53 => CsSyntaxKind::ParamsKw,

            // Predefined type keywords (60-79)
            60 => CsSyntaxKind::BoolKw,
            61 => CsSyntaxKind::ByteKw,
            62 => CsSyntaxKind::SbyteKw,
            63 => CsSyntaxKind::ShortKw,
            64 => CsSyntaxKind::UshortKw,
            65 => CsSyntaxKind::IntKw,
            66 => CsSyntaxKind::UintKw,
            67 => CsSyntaxKind::LongKw,
            68 => CsSyntaxKind::UlongKw,
            69 => CsSyntaxKind::CharKw,
            70 => CsSyntaxKind::FloatKw,
            71 => CsSyntaxKind::DoubleKw,
            72 => CsSyntaxKind::DecimalKw,
            73 => CsSyntaxKind::StringKw,
            74 => CsSyntaxKind::ObjectKw,
            75 => CsSyntaxKind::VoidKw,

            // Punctuation (100-149)
            100 => CsSyntaxKind::LBrace,
            101 => CsSyntaxKind::RBrace,
            102 => CsSyntaxKind::LParen,
            103 => CsSyntaxKind::RParen,
            104 => CsSyntaxKind::LBracket,
            105 => CsSyntaxKind::RBracket,
            106 => CsSyntaxKind::Lt,
            107 => CsSyntaxKind::Gt,
            108 => CsSyntaxKind::Semicolon,
            109 => CsSyntaxKind::Comma,
            110 => CsSyntaxKind::Dot,
            111 => CsSyntaxKind::Colon,
            112 => CsSyntaxKind::ColonColon,
            113 => CsSyntaxKind::Equals,
            114 => CsSyntaxKind::Question,
            115 => CsSyntaxKind::Asterisk,
            116 => CsSyntaxKind::Arrow,
            117 => CsSyntaxKind::Tilde,
            118 => CsSyntaxKind::Punct,

            // Literals & identifiers (150-199)
            150 => CsSyntaxKind::Ident,
            151 => CsSyntaxKind::String,
            152 => CsSyntaxKind::Char,
            153 => CsSyntaxKind::Number,

            // Documentation comment tokens (180-199)
            180 => CsSyntaxKind::DocCommentStart,
            181 => CsSyntaxKind::XmlText,
            182 => CsSyntaxKind::XmlAttributeName,
            183 => CsSyntaxKind::XmlQuote,

            // Structure nodes (200-299)
            200 => CsSyntaxKind::CompilationUnit,
            201 => CsSyntaxKind::UsingDirective,
            202 => CsSyntaxKind::NameEquals,
            203 => CsSyntaxKind::NamespaceDeclaration,
            204 => CsSyntaxKind::FileScopedNamespaceDeclaration,
            205 => CsSyntaxKind::ExternAliasDirective,
            206 => CsSyntaxKind::AttributeList,
            207 => CsSyntaxKind::GlobalStatement,
            210 => CsSyntaxKind::ClassDeclaration,
            211 => CsSyntaxKind::StructDeclaration,
            212 => CsSyntaxKind::InterfaceDeclaration,
            213 => CsSyntaxKind::RecordDeclaration,
            214 => CsSyntaxKind::EnumDeclaration,
            215 => CsSyntaxKind::DelegateDeclaration,
            216 => CsSyntaxKind::TypeParameterList,
            217 => CsSyntaxKind::BaseList,
            218 => CsSyntaxKind::SimpleBaseType,
            219 => CsSyntaxKind::TypeParameterConstraintClause,
            220 => CsSyntaxKind::TypeConstraint,
            221 => CsSyntaxKind::EnumBody,
            230 => CsSyntaxKind::FieldDeclaration,
            231 => CsSyntaxKind::VariableDeclaration,
            232 => CsSyntaxKind::VariableDeclarator,
            233 => CsSyntaxKind::MethodDeclaration,
            234 => CsSyntaxKind::ConstructorDeclaration,
            235 => CsSyntaxKind::DestructorDeclaration,
            236 => CsSyntaxKind::PropertyDeclaration,
            237 => CsSyntaxKind::IndexerDeclaration,
            238 => CsSyntaxKind::EventDeclaration,
            239 => CsSyntaxKind::OperatorDeclaration,
            240 => CsSyntaxKind::ConversionOperatorDeclaration,
            241 => CsSyntaxKind::MemberName,
            250 => CsSyntaxKind::ParameterList,
            251 => CsSyntaxKind::BracketedParameterList,
            252 => CsSyntaxKind::Parameter,
            253 => CsSyntaxKind::Block,
            254 => CsSyntaxKind::ExpressionSoup,

            // Type nodes (300-349)
            300 => CsSyntaxKind::PredefinedType,
            301 => CsSyntaxKind::IdentifierName,
            302 => CsSyntaxKind::GenericName,
            303 => CsSyntaxKind::QualifiedName,
            304 => CsSyntaxKind::AliasQualifiedName,
            305 => CsSyntaxKind::TypeArgumentList,
            306 => CsSyntaxKind::ArrayType,
            307 => CsSyntaxKind::ArrayRankSpecifier,
            308 => CsSyntaxKind::NullableType,
            309 => CsSyntaxKind::PointerType,
            310 => CsSyntaxKind::TupleType,
            311 => CsSyntaxKind::TupleElement,

            // Documentation nodes (350-379)
            350 => CsSyntaxKind::DocumentationComment,
            351 => CsSyntaxKind::XmlCrefAttribute,
            352 => CsSyntaxKind::QualifiedCref,
            353 => CsSyntaxKind::NameMemberCref,
            354 => CsSyntaxKind::CrefParameterList,
            355 => CsSyntaxKind::CrefParameter,

            // Special (400+)
            400 => CsSyntaxKind::Error,
            401 => CsSyntaxKind::Unknown,
            402 => CsSyntaxKind::ParsedName,

            _ => {
                tracing::warn!("Unknown syntax kind: {}", raw.0);
                CsSyntaxKind::Unknown
            }
        }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        let kinds = [
            CsSyntaxKind::Whitespace,
            CsSyntaxKind::NamespaceKw,
            CsSyntaxKind::VoidKw,
            CsSyntaxKind::Ident,
            CsSyntaxKind::XmlQuote,
            CsSyntaxKind::QualifiedName,
            CsSyntaxKind::CrefParameter,
            CsSyntaxKind::ParsedName,
        ];

        for &kind in &kinds {
            let raw = CsLanguage::kind_to_raw(kind);
            let back = CsLanguage::kind_from_raw(raw);
            assert_eq!(kind, back, "Roundtrip failed for {kind:?}");
        }
    }

    #[test]
    fn test_kind_values() {
        assert_eq!(CsLanguage::kind_to_raw(CsSyntaxKind::Whitespace).0, 0);
        assert_eq!(CsLanguage::kind_to_raw(CsSyntaxKind::NamespaceKw).0, 10);
        assert_eq!(CsLanguage::kind_to_raw(CsSyntaxKind::LBrace).0, 100);
        assert_eq!(CsLanguage::kind_to_raw(CsSyntaxKind::CompilationUnit).0, 200);
    }

    #[test]
    fn test_unknown_raw_kind_maps_to_unknown() {
        assert_eq!(
            CsLanguage::kind_from_raw(rowan::SyntaxKind(9999)),
            CsSyntaxKind::Unknown
        );
    }
}
