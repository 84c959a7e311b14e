//! Syntax kinds for the C# concrete syntax tree
//!
//! Every token and node in the tree carries one of these kinds. The numeric
//! values are grouped by category so that raw kinds read back from Rowan can
//! be mapped without a lookup table.

/// All token and node kinds produced by the lexer and parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum CsSyntaxKind {
    // Trivia (0-9)
    Whitespace = 0,
    Newline = 1,
    CommentLine = 2,
    CommentBlock = 3,
    Directive = 4,

    // Keywords (10-99)
    NamespaceKw = 10,
    UsingKw = 11,
    StaticKw = 12,
    ClassKw = 13,
    StructKw = 14,
    InterfaceKw = 15,
    EnumKw = 16,
    DelegateKw = 17,
    EventKw = 18,
    OperatorKw = 19,
    ImplicitKw = 20,
    ExplicitKw = 21,
    ThisKw = 22,
    ExternKw = 23,
    PublicKw = 30,
    PrivateKw = 31,
    ProtectedKw = 32,
    InternalKw = 33,
    AbstractKw = 34,
    SealedKw = 35,
    VirtualKw = 36,
    OverrideKw = 37,
    ReadonlyKw = 38,
    ConstKw = 39,
    VolatileKw = 40,
    UnsafeKw = 41,
    NewKw = 42,
    FixedKw = 43,
    RefKw = 50,
    OutKw = 51,
    InKw = 52,
    ParamsKw = 53,

    // Predefined type keywords (60-79)
    BoolKw = 60,
    ByteKw = 61,
    SbyteKw = 62,
    ShortKw = 63,
    UshortKw = 64,
    IntKw = 65,
    UintKw = 66,
    LongKw = 67,
    UlongKw = 68,
    CharKw = 69,
    FloatKw = 70,
    DoubleKw = 71,
    DecimalKw = 72,
    StringKw = 73,
    ObjectKw = 74,
    VoidKw = 75,

    // Punctuation (100-149)
    LBrace = 100,
    RBrace = 101,
    LParen = 102,
    RParen = 103,
    LBracket = 104,
    RBracket = 105,
    Lt = 106,
    Gt = 107,
    Semicolon = 108,
    Comma = 109,
    Dot = 110,
    Colon = 111,
    ColonColon = 112,
    Equals = 113,
    Question = 114,
    Asterisk = 115,
    Arrow = 116,
    Tilde = 117,
    Punct = 118,

    // Literals & identifiers (150-199)
    Ident = 150,
    String = 151,
    Char = 152,
    Number = 153,

    // Documentation comment tokens (180-199)
    DocCommentStart = 180,
    XmlText = 181,
    XmlAttributeName = 182,
    XmlQuote = 183,

    // Structure nodes (200-299)
    CompilationUnit = 200,
    UsingDirective = 201,
    NameEquals = 202,
    NamespaceDeclaration = 203,
    FileScopedNamespaceDeclaration = 204,
    ExternAliasDirective = 205,
    AttributeList = 206,
    GlobalStatement = 207,
    ClassDeclaration = 210,
    StructDeclaration = 211,
    InterfaceDeclaration = 212,
    RecordDeclaration = 213,
    EnumDeclaration = 214,
    DelegateDeclaration = 215,
    TypeParameterList = 216,
    BaseList = 217,
    SimpleBaseType = 218,
    TypeParameterConstraintClause = 219,
    TypeConstraint = 220,
    EnumBody = 221,
    FieldDeclaration = 230,
    VariableDeclaration = 231,
    VariableDeclarator = 232,
    MethodDeclaration = 233,
    ConstructorDeclaration = 234,
    DestructorDeclaration = 235,
    PropertyDeclaration = 236,
    IndexerDeclaration = 237,
    EventDeclaration = 238,
    OperatorDeclaration = 239,
    ConversionOperatorDeclaration = 240,
    MemberName = 241,
    ParameterList = 250,
    BracketedParameterList = 251,
    Parameter = 252,
    Block = 253,
    ExpressionSoup = 254,

    // Type nodes (300-349)
    PredefinedType = 300,
    IdentifierName = 301,
    GenericName = 302,
    QualifiedName = 303,
    AliasQualifiedName = 304,
    TypeArgumentList = 305,
    ArrayType = 306,
    ArrayRankSpecifier = 307,
    NullableType = 308,
    PointerType = 309,
    TupleType = 310,
    TupleElement = 311,

    // Documentation nodes (350-379)
    DocumentationComment = 350,
    XmlCrefAttribute = 351,
    QualifiedCref = 352,
    NameMemberCref = 353,
    CrefParameterList = 354,
    CrefParameter = 355,

    // Special (400+)
    Error = 400,
    Unknown = 401,
    ParsedName = 402,
}

impl CsSyntaxKind {
    /// Whitespace, newlines, comments and preprocessor lines
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            CsSyntaxKind::Whitespace
                | CsSyntaxKind::Newline
                | CsSyntaxKind::CommentLine
                | CsSyntaxKind::CommentBlock
                | CsSyntaxKind::Directive
        )
    }

    /// Keywords that name a built-in type
    pub fn is_predefined_type(self) -> bool {
        (CsSyntaxKind::BoolKw as u16..=CsSyntaxKind::VoidKw as u16).contains(&(self as u16))
    }

    /// Keywords that may precede a member or type declaration
    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            CsSyntaxKind::PublicKw
                | CsSyntaxKind::PrivateKw
                | CsSyntaxKind::ProtectedKw
                | CsSyntaxKind::InternalKw
                | CsSyntaxKind::AbstractKw
                | CsSyntaxKind::SealedKw
                | CsSyntaxKind::VirtualKw
                | CsSyntaxKind::OverrideKw
                | CsSyntaxKind::ReadonlyKw
                | CsSyntaxKind::ConstKw
                | CsSyntaxKind::VolatileKw
                | CsSyntaxKind::UnsafeKw
                | CsSyntaxKind::NewKw
                | CsSyntaxKind::FixedKw
                | CsSyntaxKind::StaticKw
                | CsSyntaxKind::ExternKw
                | CsSyntaxKind::RefKw
        )
    }

    /// Node kinds that hold a (possibly qualified) name
    pub fn is_name(self) -> bool {
        matches!(
            self,
            CsSyntaxKind::IdentifierName
                | CsSyntaxKind::GenericName
                | CsSyntaxKind::QualifiedName
                | CsSyntaxKind::AliasQualifiedName
        )
    }

    /// Node kinds that can appear in a type position
    pub fn is_type(self) -> bool {
        self.is_name()
            || matches!(
                self,
                CsSyntaxKind::PredefinedType
                    | CsSyntaxKind::ArrayType
                    | CsSyntaxKind::NullableType
                    | CsSyntaxKind::PointerType
                    | CsSyntaxKind::TupleType
            )
    }

    /// Keyword lookup for an identifier-shaped word
    pub fn from_keyword(text: &str) -> Option<CsSyntaxKind> {
        let kind = match text {
            "namespace" => CsSyntaxKind::NamespaceKw,
            "using" => CsSyntaxKind::UsingKw,
            "static" => CsSyntaxKind::StaticKw,
            "class" => CsSyntaxKind::ClassKw,
            "struct" => CsSyntaxKind::StructKw,
            "interface" => CsSyntaxKind::InterfaceKw,
            "enum" => CsSyntaxKind::EnumKw,
            "delegate" => CsSyntaxKind::DelegateKw,
            "event" => CsSyntaxKind::EventKw,
            "operator" => CsSyntaxKind::OperatorKw,
            "implicit" => CsSyntaxKind::ImplicitKw,
            "explicit" => CsSyntaxKind::ExplicitKw,
            "this" => CsSyntaxKind::ThisKw,
            "extern" => CsSyntaxKind::ExternKw,
            "public" => CsSyntaxKind::PublicKw,
            "private" => CsSyntaxKind::PrivateKw,
            "protected" => CsSyntaxKind::ProtectedKw,
            "internal" => CsSyntaxKind::InternalKw,
            "abstract" => CsSyntaxKind::AbstractKw,
            "sealed" => CsSyntaxKind::SealedKw,
            "virtual" => CsSyntaxKind::VirtualKw,
            "override" => CsSyntaxKind::OverrideKw,
            "readonly" => CsSyntaxKind::ReadonlyKw,
            "const" => CsSyntaxKind::ConstKw,
            "volatile" => CsSyntaxKind::VolatileKw,
            "unsafe" => CsSyntaxKind::UnsafeKw,
            "new" => CsSyntaxKind::NewKw,
            "fixed" => CsSyntaxKind::FixedKw,
            "ref" => CsSyntaxKind::RefKw,
            "out" => CsSyntaxKind::OutKw,
            "in" => CsSyntaxKind::InKw,
            "params" => CsSyntaxKind::ParamsKw,
            "bool" => CsSyntaxKind::BoolKw,
            "byte" => CsSyntaxKind::ByteKw,
            "sbyte" => CsSyntaxKind::SbyteKw,
            "short" => CsSyntaxKind::ShortKw,
            "ushort" => CsSyntaxKind::UshortKw,
            "int" => CsSyntaxKind::IntKw,
            "uint" => CsSyntaxKind::UintKw,
            "long" => CsSyntaxKind::LongKw,
            "ulong" => CsSyntaxKind::UlongKw,
            "char" => CsSyntaxKind::CharKw,
            "float" => CsSyntaxKind::FloatKw,
            "double" => CsSyntaxKind::DoubleKw,
            "decimal" => CsSyntaxKind::DecimalKw,
            "string" => CsSyntaxKind::StringKw,
            "object" => CsSyntaxKind::ObjectKw,
            "void" => CsSyntaxKind::VoidKw,
            _ => return None,
        };
        Some(kind)
    }
}

impl From<CsSyntaxKind> for rowan::SyntaxKind {
    fn from(kind: CsSyntaxKind) -> Self {
        Self(kind as u16)
    }
}
