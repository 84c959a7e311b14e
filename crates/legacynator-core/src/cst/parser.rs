//! Hierarchical parser for C# declarations
//!
//! Builds a structured CST from the token stream produced by
//! [`lex_with_trivia`](super::lex_with_trivia). Everything that can hold a
//! type name is parsed into name nodes: namespace and using directives, base
//! lists, constraints, member signatures, and documentation comment crefs.
//! Statement and expression bodies stay flat (`Block`, `ExpressionSoup`)
//! because the rename never looks inside them.
//!
//! The parser never fails. Tokens it cannot place end up in `Error` nodes so
//! the tree still covers the whole input.

use super::lexer::{CstSpan, LexerError};
use super::{CstBuilder, CstToken, CsSyntaxKind, CsSyntaxNode};

/// A structural problem found while parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub span: CstSpan,
}

/// Result of parsing one C# source file
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub syntax: CsSyntaxNode,
    pub lexer_errors: Vec<LexerError>,
    pub errors: Vec<ParseError>,
}

impl ParsedFile {
    pub fn has_errors(&self) -> bool {
        !self.lexer_errors.is_empty() || !self.errors.is_empty()
    }
}

/// Parse C# source into a `CompilationUnit` tree
///
/// # Example
///
/// ```rust,ignore
/// use legacynator_core::cst::parse_csharp;
///
/// let source = "namespace Moq.Core { class Mock { Moq.Times times; } }";
/// let parsed = parse_csharp(source);
/// assert!(!parsed.has_errors());
/// assert_eq!(parsed.syntax.text().to_string(), source);
/// ```
pub fn parse_csharp(source: &str) -> ParsedFile {
    let (tokens, lexer_errors) = super::lex_with_trivia(source);
    let mut parser = Parser::new(&tokens);
    parser.parse_compilation_unit();
    let (syntax, errors) = parser.finish();
    ParsedFile {
        syntax,
        lexer_errors,
        errors,
    }
}

/// Parse text that must consist of exactly one name (with optional
/// surrounding trivia)
///
/// Returns the name node, or `None` when the text is not a single clean name.
pub fn parse_name(text: &str) -> Option<CsSyntaxNode> {
    let (tokens, lexer_errors) = super::lex_with_trivia(text);
    if !lexer_errors.is_empty() {
        return None;
    }

    let mut parser = Parser::new(&tokens);
    parser.builder.start_node(CsSyntaxKind::ParsedName);
    parser.consume_trivia();
    if parser.at(CsSyntaxKind::Ident) {
        parser.parse_name(NameMode::Type, None);
    } else {
        parser.error("expected name");
    }
    parser.consume_trivia();
    let complete = parser.at_end();
    while !parser.at_end() {
        parser.bump();
    }
    parser.builder.finish_node();

    let (root, errors) = parser.finish();
    if !complete || !errors.is_empty() {
        return None;
    }
    root.children().find(|node| node.kind().is_name())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameMode {
    /// Ordinary source: generics use `<...>`
    Type,
    /// Inside a cref value: generics may also use `{...}`
    Cref,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemberContext {
    Namespace,
    Type,
}

/// What follows a member's type, decided by lookahead
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemberShape {
    Field,
    Method,
    Property,
    Indexer,
    Unknown,
}

/// Contextual words that are followed by `(` in statements and expressions
const STATEMENT_WORDS: &[&str] = &[
    "if", "else", "while", "for", "foreach", "switch", "lock", "catch", "when", "return",
    "await", "yield", "throw", "nameof", "typeof", "sizeof", "default", "checked",
    "unchecked", "is", "as", "and", "or", "not", "with", "var",
];

/// Tokens a type can end with
fn ends_type(token: &CstToken) -> bool {
    match token.kind {
        CsSyntaxKind::Ident => !STATEMENT_WORDS.contains(&token.text.as_str()),
        CsSyntaxKind::Gt
        | CsSyntaxKind::RBracket
        | CsSyntaxKind::RParen
        | CsSyntaxKind::Question
        | CsSyntaxKind::Asterisk => true,
        kind => kind.is_predefined_type(),
    }
}

/// Token stream parser
struct Parser<'a> {
    tokens: &'a [CstToken],
    pos: usize,
    /// Exclusive upper bound; narrowed while parsing a cref value
    limit: usize,
    builder: CstBuilder,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [CstToken]) -> Self {
        Self {
            tokens,
            pos: 0,
            limit: tokens.len(),
            builder: CstBuilder::new(),
            errors: Vec::new(),
        }
    }

    fn finish(self) -> (CsSyntaxNode, Vec<ParseError>) {
        (self.builder.finish(), self.errors)
    }

    // ------------------------------------------------------------------
    // Top level
    // ------------------------------------------------------------------

    fn parse_compilation_unit(&mut self) {
        self.builder.start_node(CsSyntaxKind::CompilationUnit);

        loop {
            self.consume_trivia();
            if self.at_end() {
                break;
            }
            let before = self.pos;
            self.parse_namespace_item();
            if self.pos == before {
                self.error_and_recover("unexpected token");
            }
        }

        self.builder.finish_node(); // COMPILATION_UNIT
    }

    /// Anything that may appear directly in a compilation unit or namespace
    fn parse_namespace_item(&mut self) {
        match self.current_kind() {
            Some(CsSyntaxKind::UsingKw) if self.at_using_directive(0) => {
                self.parse_using_directive()
            }
            Some(CsSyntaxKind::Ident)
                if self.at_contextual("global")
                    && self.nth_kind(1) == Some(CsSyntaxKind::UsingKw)
                    && self.at_using_directive(1) =>
            {
                self.parse_using_directive()
            }
            Some(CsSyntaxKind::ExternKw) if self.nth_text(1) == Some("alias") => {
                self.parse_extern_alias()
            }
            Some(CsSyntaxKind::NamespaceKw) => self.parse_namespace(),
            Some(CsSyntaxKind::Semicolon) => self.bump(),
            Some(CsSyntaxKind::RBrace) => self.error_and_recover("unbalanced '}'"),
            Some(_) => self.parse_member(MemberContext::Namespace),
            None => {}
        }
    }

    /// `using (...)` and `using var x = ...;` are statements, not directives
    fn at_using_directive(&self, using_index: usize) -> bool {
        match self.nth_kind(using_index + 1) {
            Some(CsSyntaxKind::LParen) => false,
            Some(CsSyntaxKind::Ident) => {
                !(self.nth_text(using_index + 1) == Some("var")
                    && self.nth_kind(using_index + 2) == Some(CsSyntaxKind::Ident))
            }
            _ => true,
        }
    }

    /// Grammar: `[global] using [static] [Alias =] Name ;`
    fn parse_using_directive(&mut self) {
        self.builder.start_node(CsSyntaxKind::UsingDirective);

        if self.at_contextual("global") {
            self.bump();
            self.consume_trivia();
        }
        self.expect(CsSyntaxKind::UsingKw);
        self.consume_trivia();

        if self.at(CsSyntaxKind::StaticKw) {
            self.bump();
            self.consume_trivia();
        }

        if self.at(CsSyntaxKind::Ident) && self.nth_kind(1) == Some(CsSyntaxKind::Equals) {
            self.builder.start_node(CsSyntaxKind::NameEquals);
            self.bump();
            self.consume_trivia();
            self.bump();
            self.builder.finish_node();
            self.consume_trivia();
        }

        if self.at_type_start() {
            self.parse_type();
        } else {
            self.error("expected name in using directive");
        }
        self.consume_trivia();
        self.expect(CsSyntaxKind::Semicolon);

        self.builder.finish_node(); // USING_DIRECTIVE
    }

    fn parse_extern_alias(&mut self) {
        self.builder.start_node(CsSyntaxKind::ExternAliasDirective);
        self.bump_balanced_until(|kind| kind == CsSyntaxKind::Semicolon);
        self.expect(CsSyntaxKind::Semicolon);
        self.builder.finish_node();
    }

    /// Block-bodied or file-scoped namespace; the kind is only known once
    /// the token after the name has been seen
    fn parse_namespace(&mut self) {
        let cp = self.builder.checkpoint();
        self.bump(); // namespace
        self.consume_trivia();

        if self.at(CsSyntaxKind::Ident) {
            self.parse_name(NameMode::Type, None);
        } else {
            self.error("expected namespace name");
        }
        self.consume_trivia();

        if self.at(CsSyntaxKind::Semicolon) {
            self.builder
                .start_node_at(cp, CsSyntaxKind::FileScopedNamespaceDeclaration);
            self.bump();
            // A file-scoped namespace owns the rest of the file
            loop {
                self.consume_trivia();
                if self.at_end() {
                    break;
                }
                let before = self.pos;
                self.parse_namespace_item();
                if self.pos == before {
                    self.error_and_recover("unexpected token");
                }
            }
            self.builder.finish_node();
            return;
        }

        self.builder
            .start_node_at(cp, CsSyntaxKind::NamespaceDeclaration);
        if self.at(CsSyntaxKind::LBrace) {
            self.bump();
            loop {
                self.consume_trivia();
                if self.at_end() || self.at(CsSyntaxKind::RBrace) {
                    break;
                }
                let before = self.pos;
                self.parse_namespace_item();
                if self.pos == before {
                    self.error_and_recover("unexpected token");
                }
            }
            self.expect(CsSyntaxKind::RBrace);
        } else {
            self.error("expected '{' or ';' after namespace name");
        }
        self.builder.finish_node();
    }

    // ------------------------------------------------------------------
    // Members
    // ------------------------------------------------------------------

    /// Attributes, modifiers, then a declaration whose kind is decided after
    /// the fact; the node is wrapped at a checkpoint taken before the
    /// attributes
    fn parse_member(&mut self, context: MemberContext) {
        let cp = self.builder.checkpoint();
        let mut has_prefix = false;

        while self.at(CsSyntaxKind::LBracket) {
            self.parse_attribute_list();
            self.consume_trivia();
            has_prefix = true;
        }
        while self.at_modifier() {
            self.bump();
            self.consume_trivia();
            has_prefix = true;
        }

        let Some(kind) = self.current_kind() else {
            return;
        };

        match kind {
            CsSyntaxKind::ClassKw
            | CsSyntaxKind::StructKw
            | CsSyntaxKind::InterfaceKw
            | CsSyntaxKind::EnumKw => return self.parse_type_declaration(cp),
            CsSyntaxKind::Ident if self.at_record_keyword() => {
                return self.parse_type_declaration(cp);
            }
            CsSyntaxKind::DelegateKw => return self.parse_delegate(cp),
            CsSyntaxKind::RBrace | CsSyntaxKind::NamespaceKw | CsSyntaxKind::UsingKw
                if has_prefix =>
            {
                // Assembly attributes before a namespace, or a dangling prefix
                return;
            }
            _ => {}
        }

        if context == MemberContext::Namespace && !has_prefix {
            return self.parse_global_statement(cp);
        }

        match kind {
            CsSyntaxKind::EventKw => self.parse_event(cp),
            CsSyntaxKind::Tilde => self.parse_destructor(cp),
            CsSyntaxKind::ImplicitKw | CsSyntaxKind::ExplicitKw => {
                self.parse_conversion_operator(cp)
            }
            CsSyntaxKind::Ident if self.nth_kind(1) == Some(CsSyntaxKind::LParen) => {
                self.parse_constructor(cp)
            }
            _ if self.at_type_start() => self.parse_typed_member(cp),
            _ => self.error_and_recover("expected member declaration"),
        }
    }

    /// Members that start with a type: fields, methods, properties,
    /// indexers and operators
    fn parse_typed_member(&mut self, cp: rowan::Checkpoint) {
        let type_cp = self.builder.checkpoint();
        self.parse_type();
        self.consume_trivia();

        match self.current_kind() {
            Some(CsSyntaxKind::OperatorKw) => {
                self.builder
                    .start_node_at(cp, CsSyntaxKind::OperatorDeclaration);
                self.bump();
                self.consume_trivia();
                self.bump_balanced_until(|kind| kind == CsSyntaxKind::LParen);
                self.parse_parameter_list();
                self.parse_member_body();
                self.builder.finish_node();
            }
            Some(CsSyntaxKind::ThisKw) => {
                self.builder
                    .start_node_at(cp, CsSyntaxKind::IndexerDeclaration);
                self.parse_indexer_rest();
                self.builder.finish_node();
            }
            Some(CsSyntaxKind::Ident) => match self.scan_member_shape() {
                MemberShape::Field => {
                    self.builder.start_node_at(cp, CsSyntaxKind::FieldDeclaration);
                    self.builder
                        .start_node_at(type_cp, CsSyntaxKind::VariableDeclaration);
                    self.parse_variable_declarators();
                    self.builder.finish_node(); // VARIABLE_DECLARATION
                    self.consume_trivia();
                    self.expect(CsSyntaxKind::Semicolon);
                    self.builder.finish_node(); // FIELD_DECLARATION
                }
                MemberShape::Method => {
                    self.builder.start_node_at(cp, CsSyntaxKind::MethodDeclaration);
                    self.parse_member_name();
                    self.consume_trivia();
                    self.parse_parameter_list();
                    self.parse_constraint_clauses();
                    self.parse_member_body();
                    self.builder.finish_node();
                }
                MemberShape::Property => {
                    self.builder
                        .start_node_at(cp, CsSyntaxKind::PropertyDeclaration);
                    self.parse_member_name();
                    self.parse_property_rest();
                    self.builder.finish_node();
                }
                MemberShape::Indexer => {
                    self.builder
                        .start_node_at(cp, CsSyntaxKind::IndexerDeclaration);
                    self.parse_member_name();
                    self.consume_trivia();
                    self.parse_indexer_rest();
                    self.builder.finish_node();
                }
                MemberShape::Unknown => {
                    self.builder.start_node_at(cp, CsSyntaxKind::Error);
                    self.builder.finish_node();
                    self.error_and_recover("unrecognized member declaration");
                }
            },
            _ => {
                self.builder.start_node_at(cp, CsSyntaxKind::Error);
                self.builder.finish_node();
                self.error_and_recover("expected member name");
            }
        }
    }

    /// Look past a member name (which may be qualified for explicit
    /// interface implementations, or generic for methods) to see what it
    /// names
    fn scan_member_shape(&self) -> MemberShape {
        let mut i = 1;
        loop {
            match self.nth_kind(i) {
                Some(CsSyntaxKind::Dot) => match self.nth_kind(i + 1) {
                    Some(CsSyntaxKind::ThisKw) => return MemberShape::Indexer,
                    Some(CsSyntaxKind::Ident) => i += 2,
                    _ => return MemberShape::Unknown,
                },
                Some(CsSyntaxKind::Lt) => {
                    let mut depth = 0usize;
                    loop {
                        match self.nth_kind(i) {
                            Some(CsSyntaxKind::Lt) => depth += 1,
                            Some(CsSyntaxKind::Gt) => {
                                depth -= 1;
                                if depth == 0 {
                                    break;
                                }
                            }
                            Some(
                                CsSyntaxKind::Semicolon
                                | CsSyntaxKind::LBrace
                                | CsSyntaxKind::RBrace,
                            )
                            | None => return MemberShape::Unknown,
                            _ => {}
                        }
                        i += 1;
                    }
                    i += 1;
                }
                _ => break,
            }
        }

        match self.nth_kind(i) {
            Some(CsSyntaxKind::Equals | CsSyntaxKind::Semicolon | CsSyntaxKind::Comma)
                if i == 1 =>
            {
                MemberShape::Field
            }
            // Fixed-size buffer: `fixed int buffer[16];`
            Some(CsSyntaxKind::LBracket) if i == 1 => MemberShape::Field,
            Some(CsSyntaxKind::LParen) => MemberShape::Method,
            Some(CsSyntaxKind::LBrace | CsSyntaxKind::Arrow) => MemberShape::Property,
            _ => MemberShape::Unknown,
        }
    }

    /// Method, property or explicit interface member name, kept as soup
    fn parse_member_name(&mut self) {
        self.builder.start_node(CsSyntaxKind::MemberName);
        self.bump(); // identifier
        loop {
            match self.nth_kind(0) {
                Some(CsSyntaxKind::Dot) if self.nth_kind(1) == Some(CsSyntaxKind::Ident) => {
                    self.consume_trivia();
                    self.bump();
                    self.consume_trivia();
                    self.bump();
                }
                Some(CsSyntaxKind::Dot) if self.nth_kind(1) == Some(CsSyntaxKind::ThisKw) => {
                    // `this` belongs to the indexer, the dot to the interface name
                    self.consume_trivia();
                    self.bump();
                    break;
                }
                Some(CsSyntaxKind::Lt) => {
                    self.consume_trivia();
                    self.parse_type_parameter_list();
                }
                _ => break,
            }
        }
        self.builder.finish_node();
    }

    /// Declarators after a field or event-field type:
    /// `a = 1, b, c = Compute()`
    fn parse_variable_declarators(&mut self) {
        loop {
            self.consume_trivia();
            if !self.at(CsSyntaxKind::Ident) {
                self.error("expected variable name");
                break;
            }

            self.builder.start_node(CsSyntaxKind::VariableDeclarator);
            self.bump();
            if matches!(
                self.nth_kind(0),
                Some(CsSyntaxKind::Equals | CsSyntaxKind::LBracket)
            ) {
                self.consume_trivia();
                if self.at(CsSyntaxKind::Equals) {
                    self.bump();
                    self.consume_trivia();
                }
                self.parse_expression_soup(|kind| {
                    matches!(kind, CsSyntaxKind::Comma | CsSyntaxKind::Semicolon)
                });
            }
            self.builder.finish_node();

            if self.nth_kind(0) == Some(CsSyntaxKind::Comma) {
                self.consume_trivia();
                self.bump();
            } else {
                break;
            }
        }
    }

    fn parse_property_rest(&mut self) {
        self.consume_trivia();
        match self.current_kind() {
            Some(CsSyntaxKind::LBrace) => {
                self.parse_block();
                if self.nth_kind(0) == Some(CsSyntaxKind::Equals) {
                    self.consume_trivia();
                    self.bump();
                    self.consume_trivia();
                    self.parse_expression_soup(|kind| kind == CsSyntaxKind::Semicolon);
                    self.expect(CsSyntaxKind::Semicolon);
                }
            }
            Some(CsSyntaxKind::Arrow) => self.parse_expression_body(),
            _ => self.error("expected property body"),
        }
    }

    /// `this [params] { accessors }` or `this [params] => expr;`
    fn parse_indexer_rest(&mut self) {
        self.expect(CsSyntaxKind::ThisKw);
        self.consume_trivia();
        if self.at(CsSyntaxKind::LBracket) {
            self.parse_parameters(
                CsSyntaxKind::BracketedParameterList,
                CsSyntaxKind::LBracket,
                CsSyntaxKind::RBracket,
            );
        } else {
            self.error("expected indexer parameters");
        }
        self.parse_property_rest();
    }

    fn parse_event(&mut self, cp: rowan::Checkpoint) {
        self.builder.start_node_at(cp, CsSyntaxKind::EventDeclaration);
        self.bump(); // event
        self.consume_trivia();

        if !self.at_type_start() {
            self.error("expected event type");
            self.builder.finish_node();
            return;
        }

        let type_cp = self.builder.checkpoint();
        self.parse_type();
        self.consume_trivia();

        if self.at(CsSyntaxKind::Ident) && self.scan_member_shape() == MemberShape::Field {
            self.builder
                .start_node_at(type_cp, CsSyntaxKind::VariableDeclaration);
            self.parse_variable_declarators();
            self.builder.finish_node();
            self.consume_trivia();
            self.expect(CsSyntaxKind::Semicolon);
        } else if self.at(CsSyntaxKind::Ident) {
            self.parse_member_name();
            self.consume_trivia();
            if self.at(CsSyntaxKind::LBrace) {
                self.parse_block();
            } else {
                self.error("expected event accessors");
            }
        } else {
            self.error("expected event name");
        }

        self.builder.finish_node();
    }

    fn parse_constructor(&mut self, cp: rowan::Checkpoint) {
        self.builder
            .start_node_at(cp, CsSyntaxKind::ConstructorDeclaration);
        self.bump(); // name
        self.consume_trivia();
        self.parse_parameter_list();

        if self.nth_kind(0) == Some(CsSyntaxKind::Colon) {
            // `: base(...)` / `: this(...)`
            self.consume_trivia();
            self.builder.start_node(CsSyntaxKind::ExpressionSoup);
            self.bump();
            self.bump_balanced_until(|kind| {
                matches!(
                    kind,
                    CsSyntaxKind::LBrace | CsSyntaxKind::Arrow | CsSyntaxKind::Semicolon
                )
            });
            self.builder.finish_node();
        }

        self.parse_member_body();
        self.builder.finish_node();
    }

    fn parse_destructor(&mut self, cp: rowan::Checkpoint) {
        self.builder
            .start_node_at(cp, CsSyntaxKind::DestructorDeclaration);
        self.bump(); // ~
        self.consume_trivia();
        self.expect(CsSyntaxKind::Ident);
        self.consume_trivia();
        self.parse_parameter_list();
        self.parse_member_body();
        self.builder.finish_node();
    }

    /// `implicit operator T(...)` / `explicit operator T(...)`
    fn parse_conversion_operator(&mut self, cp: rowan::Checkpoint) {
        self.builder
            .start_node_at(cp, CsSyntaxKind::ConversionOperatorDeclaration);
        self.bump();
        self.consume_trivia();
        self.expect(CsSyntaxKind::OperatorKw);
        self.consume_trivia();
        if self.at_type_start() {
            self.parse_type();
        } else {
            self.error("expected conversion target type");
        }
        self.consume_trivia();
        self.parse_parameter_list();
        self.parse_member_body();
        self.builder.finish_node();
    }

    /// Grammar: `delegate ReturnType Name<T>(params) where ... ;`
    fn parse_delegate(&mut self, cp: rowan::Checkpoint) {
        self.builder.start_node_at(cp, CsSyntaxKind::DelegateDeclaration);
        self.bump(); // delegate
        self.consume_trivia();

        if self.at_type_start() {
            self.parse_type();
        } else {
            self.error("expected delegate return type");
        }
        self.consume_trivia();
        self.expect(CsSyntaxKind::Ident);
        if self.nth_kind(0) == Some(CsSyntaxKind::Lt) {
            self.consume_trivia();
            self.parse_type_parameter_list();
        }
        self.consume_trivia();
        self.parse_parameter_list();
        self.parse_constraint_clauses();
        self.consume_trivia();
        self.expect(CsSyntaxKind::Semicolon);

        self.builder.finish_node();
    }

    /// Block, expression body, or bare `;`
    fn parse_member_body(&mut self) {
        self.consume_trivia();
        match self.current_kind() {
            Some(CsSyntaxKind::LBrace) => self.parse_block(),
            Some(CsSyntaxKind::Arrow) => self.parse_expression_body(),
            Some(CsSyntaxKind::Semicolon) => self.bump(),
            _ => self.error("expected member body"),
        }
    }

    fn parse_expression_body(&mut self) {
        self.bump(); // =>
        self.consume_trivia();
        self.parse_expression_soup(|kind| kind == CsSyntaxKind::Semicolon);
        self.expect(CsSyntaxKind::Semicolon);
    }

    fn parse_global_statement(&mut self, cp: rowan::Checkpoint) {
        self.builder.start_node_at(cp, CsSyntaxKind::GlobalStatement);
        loop {
            let before = self.pos;
            self.bump_balanced_until(|kind| {
                matches!(kind, CsSyntaxKind::Semicolon | CsSyntaxKind::RBrace)
            });
            if self.at(CsSyntaxKind::Semicolon) {
                self.bump();
                break;
            }
            // Stopped at a closing brace of an enclosing scope, or ran out
            if self.pos == before || self.at_end() || self.at(CsSyntaxKind::RBrace) {
                break;
            }
        }
        self.builder.finish_node();
    }

    // ------------------------------------------------------------------
    // Type declarations
    // ------------------------------------------------------------------

    /// class / struct / interface / record / enum
    fn parse_type_declaration(&mut self, cp: rowan::Checkpoint) {
        let node_kind = match self.current_kind() {
            Some(CsSyntaxKind::ClassKw) => CsSyntaxKind::ClassDeclaration,
            Some(CsSyntaxKind::StructKw) => CsSyntaxKind::StructDeclaration,
            Some(CsSyntaxKind::InterfaceKw) => CsSyntaxKind::InterfaceDeclaration,
            Some(CsSyntaxKind::EnumKw) => CsSyntaxKind::EnumDeclaration,
            _ => CsSyntaxKind::RecordDeclaration,
        };
        self.builder.start_node_at(cp, node_kind);

        self.bump(); // keyword
        self.consume_trivia();
        if node_kind == CsSyntaxKind::RecordDeclaration
            && matches!(
                self.current_kind(),
                Some(CsSyntaxKind::ClassKw | CsSyntaxKind::StructKw)
            )
        {
            self.bump();
            self.consume_trivia();
        }

        self.expect(CsSyntaxKind::Ident);
        if self.nth_kind(0) == Some(CsSyntaxKind::Lt) {
            self.consume_trivia();
            self.parse_type_parameter_list();
        }
        if self.nth_kind(0) == Some(CsSyntaxKind::LParen) {
            // Primary constructor
            self.consume_trivia();
            self.parse_parameter_list();
        }
        if self.nth_kind(0) == Some(CsSyntaxKind::Colon) {
            self.consume_trivia();
            self.parse_base_list();
        }
        self.parse_constraint_clauses();
        self.consume_trivia();

        match self.current_kind() {
            Some(CsSyntaxKind::LBrace) if node_kind == CsSyntaxKind::EnumDeclaration => {
                self.builder.start_node(CsSyntaxKind::EnumBody);
                self.bump();
                self.bump_balanced_until(|kind| kind == CsSyntaxKind::RBrace);
                self.expect(CsSyntaxKind::RBrace);
                self.builder.finish_node();
            }
            Some(CsSyntaxKind::LBrace) => {
                self.bump();
                loop {
                    self.consume_trivia();
                    if self.at_end() || self.at(CsSyntaxKind::RBrace) {
                        break;
                    }
                    if self.at(CsSyntaxKind::Semicolon) {
                        self.bump();
                        continue;
                    }
                    let before = self.pos;
                    self.parse_member(MemberContext::Type);
                    if self.pos == before {
                        self.error_and_recover("unexpected token in type body");
                    }
                }
                self.expect(CsSyntaxKind::RBrace);
            }
            Some(CsSyntaxKind::Semicolon) => self.bump(),
            _ => self.error("expected type body"),
        }

        self.builder.finish_node();
    }

    /// Grammar: `: Base(args)?, IFoo, IBar<T>`
    fn parse_base_list(&mut self) {
        self.builder.start_node(CsSyntaxKind::BaseList);
        self.bump(); // :

        loop {
            self.consume_trivia();
            if !self.at_type_start() {
                self.error("expected base type");
                break;
            }

            self.builder.start_node(CsSyntaxKind::SimpleBaseType);
            self.parse_type();
            if self.nth_kind(0) == Some(CsSyntaxKind::LParen) {
                // Record base with arguments
                self.consume_trivia();
                self.builder.start_node(CsSyntaxKind::ExpressionSoup);
                self.bump();
                self.bump_balanced_until(|kind| kind == CsSyntaxKind::RParen);
                self.expect(CsSyntaxKind::RParen);
                self.builder.finish_node();
            }
            self.builder.finish_node();

            if self.nth_kind(0) == Some(CsSyntaxKind::Comma) {
                self.consume_trivia();
                self.bump();
            } else {
                break;
            }
        }

        self.builder.finish_node();
    }

    /// Zero or more `where T : constraint, ...` clauses
    fn parse_constraint_clauses(&mut self) {
        while self.nth_text(0) == Some("where")
            && self.nth_kind(1) == Some(CsSyntaxKind::Ident)
            && self.nth_kind(2) == Some(CsSyntaxKind::Colon)
        {
            self.consume_trivia();
            self.builder
                .start_node(CsSyntaxKind::TypeParameterConstraintClause);
            self.bump(); // where
            self.consume_trivia();
            self.bump(); // type parameter
            self.consume_trivia();
            self.bump(); // :

            loop {
                self.consume_trivia();
                if self.at_special_constraint() || !self.at_type_start() {
                    // class, struct, new(), unmanaged, notnull, default
                    self.bump_balanced_until(|kind| {
                        matches!(
                            kind,
                            CsSyntaxKind::Comma
                                | CsSyntaxKind::LBrace
                                | CsSyntaxKind::Semicolon
                                | CsSyntaxKind::Arrow
                        )
                    });
                } else {
                    self.builder.start_node(CsSyntaxKind::TypeConstraint);
                    self.parse_type();
                    self.builder.finish_node();
                }

                if self.nth_kind(0) == Some(CsSyntaxKind::Comma) {
                    self.consume_trivia();
                    self.bump();
                } else {
                    break;
                }
            }

            self.builder.finish_node();
        }
    }

    fn at_special_constraint(&self) -> bool {
        match self.current_kind() {
            Some(CsSyntaxKind::ClassKw | CsSyntaxKind::StructKw | CsSyntaxKind::NewKw) => true,
            Some(CsSyntaxKind::Ident) => matches!(
                self.nth_text(0),
                Some("unmanaged" | "notnull" | "default" | "allows")
            ) && !matches!(
                self.nth_kind(1),
                Some(CsSyntaxKind::Dot | CsSyntaxKind::Lt | CsSyntaxKind::ColonColon)
            ),
            _ => false,
        }
    }

    /// `<in T, out U>` on a type, method or delegate
    fn parse_type_parameter_list(&mut self) {
        self.builder.start_node(CsSyntaxKind::TypeParameterList);
        self.bump(); // <
        self.bump_balanced_until(|kind| {
            matches!(
                kind,
                CsSyntaxKind::Gt | CsSyntaxKind::LBrace | CsSyntaxKind::Semicolon
            )
        });
        self.expect(CsSyntaxKind::Gt);
        self.builder.finish_node();
    }

    fn parse_parameter_list(&mut self) {
        if self.at(CsSyntaxKind::LParen) {
            self.parse_parameters(
                CsSyntaxKind::ParameterList,
                CsSyntaxKind::LParen,
                CsSyntaxKind::RParen,
            );
        } else {
            self.error("expected parameter list");
        }
    }

    fn parse_parameters(&mut self, list: CsSyntaxKind, open: CsSyntaxKind, close: CsSyntaxKind) {
        self.builder.start_node(list);
        self.expect(open);

        loop {
            self.consume_trivia();
            if self.at_end() || self.at(close) {
                break;
            }
            let before = self.pos;
            self.parse_parameter(close);
            self.consume_trivia();
            if self.at(CsSyntaxKind::Comma) {
                self.bump();
            } else if self.pos == before || !self.at(close) {
                // Garbage inside the list: keep it and give up on the rest
                self.builder.start_node(CsSyntaxKind::Error);
                self.bump_balanced_until(|kind| kind == close);
                self.builder.finish_node();
                self.error("malformed parameter");
                break;
            }
        }

        self.expect(close);
        self.builder.finish_node();
    }

    /// Grammar: `[attrs] (ref|out|in|params|this|scoped)* Type name (= default)?`
    fn parse_parameter(&mut self, close: CsSyntaxKind) {
        if !self.at(CsSyntaxKind::LBracket)
            && !self.at_parameter_modifier()
            && !self.at_type_start()
        {
            return;
        }

        self.builder.start_node(CsSyntaxKind::Parameter);
        while self.at(CsSyntaxKind::LBracket) {
            self.parse_attribute_list();
            self.consume_trivia();
        }
        while self.at_parameter_modifier() {
            self.bump();
            self.consume_trivia();
        }
        if self.at_type_start() {
            self.parse_type();
        }
        if self.nth_kind(0) == Some(CsSyntaxKind::Ident) {
            self.consume_trivia();
            self.bump();
        }
        if self.nth_kind(0) == Some(CsSyntaxKind::Equals) {
            self.consume_trivia();
            self.bump();
            self.consume_trivia();
            self.parse_expression_soup(|kind| kind == CsSyntaxKind::Comma || kind == close);
        }
        self.builder.finish_node();
    }

    fn at_parameter_modifier(&self) -> bool {
        match self.current_kind() {
            Some(
                CsSyntaxKind::RefKw
                | CsSyntaxKind::OutKw
                | CsSyntaxKind::InKw
                | CsSyntaxKind::ParamsKw
                | CsSyntaxKind::ThisKw
                | CsSyntaxKind::ReadonlyKw,
            ) => true,
            Some(CsSyntaxKind::Ident) => {
                self.nth_text(0) == Some("scoped")
                    && matches!(
                        self.nth_kind(1),
                        Some(CsSyntaxKind::Ident | CsSyntaxKind::RefKw)
                    )
                    && self.nth_kind(2) != Some(CsSyntaxKind::Comma)
            }
            _ => false,
        }
    }

    fn parse_attribute_list(&mut self) {
        self.builder.start_node(CsSyntaxKind::AttributeList);
        self.bump(); // [
        self.bump_balanced_until(|kind| kind == CsSyntaxKind::RBracket);
        self.expect(CsSyntaxKind::RBracket);
        self.builder.finish_node();
    }

    fn parse_block(&mut self) {
        self.builder.start_node(CsSyntaxKind::Block);
        self.bump(); // {
        self.bump_balanced_until(|kind| kind == CsSyntaxKind::RBrace);
        self.expect(CsSyntaxKind::RBrace);
        self.builder.finish_node();
    }

    fn parse_expression_soup(&mut self, stop: impl Fn(CsSyntaxKind) -> bool) {
        self.builder.start_node(CsSyntaxKind::ExpressionSoup);
        self.bump_balanced_until(stop);
        self.builder.finish_node();
    }

    // ------------------------------------------------------------------
    // Types and names
    // ------------------------------------------------------------------

    fn at_type_start(&self) -> bool {
        match self.current_kind() {
            Some(kind) => {
                kind == CsSyntaxKind::Ident
                    || kind == CsSyntaxKind::LParen
                    || kind.is_predefined_type()
            }
            None => false,
        }
    }

    fn parse_type(&mut self) {
        self.parse_type_in(NameMode::Type);
    }

    /// A type with its `?`, `*` and `[]` suffixes
    ///
    /// In [`NameMode::Cref`] generic arguments may use braces at any depth.
    fn parse_type_in(&mut self, mode: NameMode) {
        let cp = self.builder.checkpoint();

        match self.current_kind() {
            Some(kind) if kind.is_predefined_type() => {
                self.builder.start_node(CsSyntaxKind::PredefinedType);
                self.bump();
                self.builder.finish_node();
            }
            Some(CsSyntaxKind::LParen) => self.parse_tuple_type(),
            Some(CsSyntaxKind::Ident) => self.parse_name(mode, None),
            _ => {
                self.error("expected type");
                return;
            }
        }

        loop {
            match self.nth_kind(0) {
                Some(CsSyntaxKind::Question) => {
                    self.consume_trivia();
                    self.builder.start_node_at(cp, CsSyntaxKind::NullableType);
                    self.bump();
                    self.builder.finish_node();
                }
                Some(CsSyntaxKind::Asterisk) => {
                    self.consume_trivia();
                    self.builder.start_node_at(cp, CsSyntaxKind::PointerType);
                    self.bump();
                    self.builder.finish_node();
                }
                Some(CsSyntaxKind::LBracket)
                    if matches!(
                        self.nth_kind(1),
                        Some(CsSyntaxKind::RBracket | CsSyntaxKind::Comma)
                    ) =>
                {
                    self.consume_trivia();
                    self.builder.start_node_at(cp, CsSyntaxKind::ArrayType);
                    self.builder.start_node(CsSyntaxKind::ArrayRankSpecifier);
                    self.bump();
                    self.bump_balanced_until(|kind| kind == CsSyntaxKind::RBracket);
                    self.expect(CsSyntaxKind::RBracket);
                    self.builder.finish_node();
                    self.builder.finish_node();
                }
                _ => break,
            }
        }
    }

    /// Grammar: `(Type name?, Type name?, ...)`
    fn parse_tuple_type(&mut self) {
        self.builder.start_node(CsSyntaxKind::TupleType);
        self.bump(); // (

        loop {
            self.consume_trivia();
            if !self.at_type_start() {
                break;
            }
            self.builder.start_node(CsSyntaxKind::TupleElement);
            self.parse_type();
            if self.nth_kind(0) == Some(CsSyntaxKind::Ident) {
                self.consume_trivia();
                self.bump();
            }
            self.builder.finish_node();

            if self.nth_kind(0) == Some(CsSyntaxKind::Comma) {
                self.consume_trivia();
                self.bump();
            } else {
                break;
            }
        }

        self.consume_trivia();
        self.expect(CsSyntaxKind::RParen);
        self.builder.finish_node();
    }

    /// Left-associative qualified name: `A.B.C` parses as `(A.B).C`
    ///
    /// `alias::A` forms the first segment. With `max_segments` set, stops
    /// after that many segments so a cref's member part is left for the
    /// caller. Trivia is only consumed when the name continues, so a name
    /// node never ends in trivia.
    fn parse_name(&mut self, mode: NameMode, max_segments: Option<usize>) {
        let cp = self.builder.checkpoint();
        self.parse_simple_name(mode);

        if self.nth_kind(0) == Some(CsSyntaxKind::ColonColon)
            && self.nth_kind(1) == Some(CsSyntaxKind::Ident)
        {
            self.consume_trivia();
            self.builder
                .start_node_at(cp, CsSyntaxKind::AliasQualifiedName);
            self.bump();
            self.consume_trivia();
            self.parse_simple_name(mode);
            self.builder.finish_node();
        }

        let mut segments = 1;
        while self.nth_kind(0) == Some(CsSyntaxKind::Dot)
            && self.nth_kind(1) == Some(CsSyntaxKind::Ident)
            && max_segments.is_none_or(|max| segments < max)
        {
            self.consume_trivia();
            self.builder.start_node_at(cp, CsSyntaxKind::QualifiedName);
            self.bump();
            self.consume_trivia();
            self.parse_simple_name(mode);
            self.builder.finish_node();
            segments += 1;
        }
    }

    /// `Ident` or `Ident<TypeArgs>`
    fn parse_simple_name(&mut self, mode: NameMode) {
        let close = match (self.nth_kind(1), mode) {
            (Some(CsSyntaxKind::Lt), _) => Some(CsSyntaxKind::Gt),
            (Some(CsSyntaxKind::LBrace), NameMode::Cref) => Some(CsSyntaxKind::RBrace),
            _ => None,
        };

        let Some(close) = close else {
            self.builder.start_node(CsSyntaxKind::IdentifierName);
            self.expect(CsSyntaxKind::Ident);
            self.builder.finish_node();
            return;
        };

        self.builder.start_node(CsSyntaxKind::GenericName);
        self.expect(CsSyntaxKind::Ident);
        self.consume_trivia();

        self.builder.start_node(CsSyntaxKind::TypeArgumentList);
        self.bump(); // < or {
        loop {
            self.consume_trivia();
            if self.at_end() || self.at(close) {
                break;
            }
            if self.at(CsSyntaxKind::Comma) {
                // Unbound generic: Foo<,>
                self.bump();
                continue;
            }
            if !self.at_type_start() {
                self.error("expected type argument");
                break;
            }
            self.parse_type_in(mode);
        }
        self.expect(close);
        self.builder.finish_node(); // TYPE_ARGUMENT_LIST

        self.builder.finish_node(); // GENERIC_NAME
    }

    // ------------------------------------------------------------------
    // Documentation comments
    // ------------------------------------------------------------------

    /// One `///` line; `cref` attributes get structure, the rest is text
    fn parse_doc_comment(&mut self) {
        self.builder.start_node(CsSyntaxKind::DocumentationComment);
        self.bump(); // ///

        while let Some(kind) = self.current_kind() {
            match kind {
                CsSyntaxKind::Newline => break,
                CsSyntaxKind::XmlAttributeName => self.parse_cref_attribute(),
                _ => self.bump(),
            }
        }

        self.builder.finish_node();
    }

    /// Grammar: `cref = "<cref>"`
    fn parse_cref_attribute(&mut self) {
        self.builder.start_node(CsSyntaxKind::XmlCrefAttribute);
        self.bump(); // cref
        self.consume_trivia();
        self.expect(CsSyntaxKind::Equals);
        self.consume_trivia();
        self.expect(CsSyntaxKind::XmlQuote);

        let value_end = self.tokens[self.pos..self.limit]
            .iter()
            .position(|t| matches!(t.kind, CsSyntaxKind::XmlQuote | CsSyntaxKind::Newline))
            .map_or(self.limit, |offset| self.pos + offset);

        let outer_limit = self.limit;
        self.limit = value_end;
        self.parse_cref();
        if !self.at_end() {
            self.builder.start_node(CsSyntaxKind::Error);
            while !self.at_end() {
                self.bump();
            }
            self.builder.finish_node();
        }
        self.limit = outer_limit;

        self.expect(CsSyntaxKind::XmlQuote);
        self.builder.finish_node();
    }

    /// `Name`, `Name(params)`, or `Container.Member(params)`
    ///
    /// Id-string crefs (`T:Moq.Times`) and operator or indexer crefs
    /// without a container are left unparsed.
    fn parse_cref(&mut self) {
        self.consume_trivia();
        if !self.at(CsSyntaxKind::Ident) || self.nth_kind(1) == Some(CsSyntaxKind::Colon) {
            return;
        }

        let segments = self.count_cref_segments();
        if segments <= 1 {
            self.parse_member_cref();
            return;
        }

        let cp = self.builder.checkpoint();
        self.parse_name(NameMode::Cref, Some(segments - 1));
        if self.nth_kind(0) != Some(CsSyntaxKind::Dot) {
            return;
        }
        self.consume_trivia();
        self.builder.start_node_at(cp, CsSyntaxKind::QualifiedCref);
        self.bump(); // .
        self.consume_trivia();
        if self.at(CsSyntaxKind::Ident) {
            self.parse_member_cref();
        } else {
            // this[...], operator +, ...
            self.builder.start_node(CsSyntaxKind::Error);
            while !self.at_end() {
                self.bump();
            }
            self.builder.finish_node();
        }
        self.builder.finish_node();
    }

    /// Number of dot-separated segments before the parameter list
    fn count_cref_segments(&self) -> usize {
        let mut depth = 0usize;
        let mut segments = 1;
        for token in &self.tokens[self.pos..self.limit] {
            match token.kind {
                CsSyntaxKind::Lt | CsSyntaxKind::LBrace => depth += 1,
                CsSyntaxKind::Gt | CsSyntaxKind::RBrace => depth = depth.saturating_sub(1),
                CsSyntaxKind::LParen | CsSyntaxKind::LBracket if depth == 0 => break,
                CsSyntaxKind::Dot if depth == 0 => segments += 1,
                _ => {}
            }
        }
        segments
    }

    fn parse_member_cref(&mut self) {
        self.builder.start_node(CsSyntaxKind::NameMemberCref);
        // One segment, but `global::Moq` stays a single name
        self.parse_name(NameMode::Cref, Some(1));

        let close = match self.nth_kind(0) {
            Some(CsSyntaxKind::LParen) => Some(CsSyntaxKind::RParen),
            Some(CsSyntaxKind::LBracket) => Some(CsSyntaxKind::RBracket),
            _ => None,
        };
        if let Some(close) = close {
            self.consume_trivia();
            self.builder.start_node(CsSyntaxKind::CrefParameterList);
            self.bump();
            loop {
                self.consume_trivia();
                if self.at_end() || self.at(close) {
                    break;
                }
                if self.at(CsSyntaxKind::Comma) {
                    self.bump();
                    continue;
                }
                self.builder.start_node(CsSyntaxKind::CrefParameter);
                while matches!(
                    self.current_kind(),
                    Some(CsSyntaxKind::RefKw | CsSyntaxKind::OutKw | CsSyntaxKind::InKw)
                ) {
                    self.bump();
                    self.consume_trivia();
                }
                let has_type = self.at_type_start();
                if has_type {
                    self.parse_type_in(NameMode::Cref);
                } else {
                    self.error("expected cref parameter type");
                }
                self.builder.finish_node();
                if !has_type {
                    break;
                }
            }
            self.expect(close);
            self.builder.finish_node();
        }

        self.builder.finish_node();
    }

    // ------------------------------------------------------------------
    // Token helpers
    // ------------------------------------------------------------------

    fn at_end(&self) -> bool {
        self.pos >= self.limit
    }

    fn current(&self) -> Option<&CstToken> {
        if self.at_end() {
            None
        } else {
            self.tokens.get(self.pos)
        }
    }

    fn current_kind(&self) -> Option<CsSyntaxKind> {
        self.current().map(|t| t.kind)
    }

    fn at(&self, kind: CsSyntaxKind) -> bool {
        self.current_kind() == Some(kind)
    }

    fn at_contextual(&self, word: &str) -> bool {
        self.current()
            .is_some_and(|t| t.kind == CsSyntaxKind::Ident && t.text == word)
    }

    /// Index of the `n`th significant token at or after the cursor,
    /// skipping trivia and whole documentation comment lines
    fn nth_index(&self, n: usize) -> Option<usize> {
        let mut i = self.pos;
        let mut remaining = n;
        while i < self.limit {
            let kind = self.tokens[i].kind;
            if kind.is_trivia() {
                i += 1;
            } else if kind == CsSyntaxKind::DocCommentStart {
                while i < self.limit && self.tokens[i].kind != CsSyntaxKind::Newline {
                    i += 1;
                }
            } else if remaining == 0 {
                return Some(i);
            } else {
                remaining -= 1;
                i += 1;
            }
        }
        None
    }

    fn nth_kind(&self, n: usize) -> Option<CsSyntaxKind> {
        self.nth_index(n).map(|i| self.tokens[i].kind)
    }

    fn nth_text(&self, n: usize) -> Option<&str> {
        self.nth_index(n).map(|i| self.tokens[i].text.as_str())
    }

    fn at_modifier(&self) -> bool {
        match self.current_kind() {
            Some(kind) if kind.is_modifier() => {
                // `new()` starts an expression
                !(kind == CsSyntaxKind::NewKw && self.nth_kind(1) == Some(CsSyntaxKind::LParen))
            }
            Some(CsSyntaxKind::Ident) => {
                matches!(
                    self.nth_text(0),
                    Some("partial" | "async" | "required" | "file")
                ) && self.nth_kind(1).is_some_and(|next| {
                    next == CsSyntaxKind::Ident
                        || next.is_modifier()
                        || next.is_predefined_type()
                        || matches!(
                            next,
                            CsSyntaxKind::ClassKw
                                | CsSyntaxKind::StructKw
                                | CsSyntaxKind::InterfaceKw
                                | CsSyntaxKind::EnumKw
                                | CsSyntaxKind::DelegateKw
                                | CsSyntaxKind::LParen
                        )
                }) && !matches!(
                    self.nth_kind(2),
                    Some(CsSyntaxKind::Semicolon | CsSyntaxKind::Equals | CsSyntaxKind::Comma)
                )
            }
            _ => false,
        }
    }

    /// `record Foo`, `record class Foo`, `record struct Foo`
    fn at_record_keyword(&self) -> bool {
        if !self.at_contextual("record") {
            return false;
        }
        match self.nth_kind(1) {
            Some(CsSyntaxKind::ClassKw | CsSyntaxKind::StructKw) => true,
            Some(CsSyntaxKind::Ident) => !matches!(
                self.nth_kind(2),
                Some(
                    CsSyntaxKind::Semicolon
                        | CsSyntaxKind::Equals
                        | CsSyntaxKind::Comma
                        | CsSyntaxKind::LBrace
                        | CsSyntaxKind::Arrow
                )
            ),
            _ => false,
        }
    }

    fn bump(&mut self) {
        if self.at_end() {
            return;
        }
        let tokens = self.tokens;
        if let Some(token) = tokens.get(self.pos) {
            self.builder.token(token.kind, &token.text);
            self.pos += 1;
        }
    }

    fn expect(&mut self, kind: CsSyntaxKind) {
        if self.at(kind) {
            self.bump();
        } else {
            self.error(&format!("expected {kind:?}"));
        }
    }

    /// Consume trivia and documentation comments into the current node
    fn consume_trivia(&mut self) {
        while let Some(kind) = self.current_kind() {
            if kind.is_trivia() {
                self.bump();
            } else if kind == CsSyntaxKind::DocCommentStart {
                self.parse_doc_comment();
            } else {
                break;
            }
        }
    }

    /// Consume tokens until `stop` matches at bracket depth zero, or an
    /// unmatched closing bracket is reached
    fn bump_balanced_until(&mut self, stop: impl Fn(CsSyntaxKind) -> bool) {
        let mut depth = 0usize;
        while let Some(kind) = self.current_kind() {
            if depth == 0 && stop(kind) {
                break;
            }
            match kind {
                CsSyntaxKind::LParen if self.at_embedded_parameter_list() => {
                    self.parse_parameter_list();
                    continue;
                }
                CsSyntaxKind::LParen | CsSyntaxKind::LBracket | CsSyntaxKind::LBrace => {
                    depth += 1
                }
                CsSyntaxKind::RParen | CsSyntaxKind::RBracket | CsSyntaxKind::RBrace => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                CsSyntaxKind::DocCommentStart => {
                    self.parse_doc_comment();
                    continue;
                }
                _ => {}
            }
            self.bump();
        }
    }

    /// An explicitly typed parameter list inside a body or initializer
    ///
    /// Lambdas `(Moq.Times t) => ...`, anonymous methods
    /// `delegate (Moq.Times t) { }` and local functions
    /// `void Local(Moq.Times t) { }`. Implicitly typed lambdas and calls stay
    /// plain tokens.
    fn at_embedded_parameter_list(&self) -> bool {
        if !self.at(CsSyntaxKind::LParen) {
            return false;
        }
        let Some(close) = self.matching_paren(self.pos) else {
            return false;
        };
        if !self.looks_like_parameters(self.pos + 1, close) {
            return false;
        }

        match self.significant_after(close) {
            Some(CsSyntaxKind::Arrow) => true,
            Some(CsSyntaxKind::LBrace) => match self.significant_before(0) {
                Some(token) if token.kind == CsSyntaxKind::DelegateKw => true,
                Some(token) if token.kind == CsSyntaxKind::Ident => {
                    !STATEMENT_WORDS.contains(&token.text.as_str())
                        && self.significant_before(1).is_some_and(ends_type)
                }
                _ => false,
            },
            _ => false,
        }
    }

    fn matching_paren(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (i, token) in self.tokens[open..self.limit].iter().enumerate() {
            match token.kind {
                CsSyntaxKind::LParen => depth += 1,
                CsSyntaxKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(open + i);
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Every comma-separated entry is `modifiers Type name`
    fn looks_like_parameters(&self, start: usize, end: usize) -> bool {
        let mut nesting = 0usize;
        let mut entry_len = 0;
        let mut last = None;

        for token in &self.tokens[start..end] {
            let kind = token.kind;
            if kind.is_trivia() {
                continue;
            }
            match kind {
                CsSyntaxKind::LParen | CsSyntaxKind::LBracket | CsSyntaxKind::Lt => nesting += 1,
                CsSyntaxKind::RParen | CsSyntaxKind::RBracket | CsSyntaxKind::Gt => {
                    let Some(outer) = nesting.checked_sub(1) else {
                        return false;
                    };
                    nesting = outer;
                }
                CsSyntaxKind::Comma if nesting == 0 => {
                    if entry_len < 2 || last != Some(CsSyntaxKind::Ident) {
                        return false;
                    }
                    entry_len = 0;
                    last = None;
                    continue;
                }
                _ if nesting > 0 => {}
                CsSyntaxKind::Ident
                | CsSyntaxKind::Dot
                | CsSyntaxKind::ColonColon
                | CsSyntaxKind::Question
                | CsSyntaxKind::Asterisk
                | CsSyntaxKind::RefKw
                | CsSyntaxKind::OutKw
                | CsSyntaxKind::InKw
                | CsSyntaxKind::ParamsKw
                | CsSyntaxKind::ReadonlyKw => {}
                _ if kind.is_predefined_type() => {}
                _ => return false,
            }
            entry_len += 1;
            last = Some(kind);
        }

        nesting == 0 && entry_len >= 2 && last == Some(CsSyntaxKind::Ident)
    }

    /// Kind of the first significant token after `index`
    fn significant_after(&self, index: usize) -> Option<CsSyntaxKind> {
        self.tokens[index + 1..self.limit]
            .iter()
            .map(|t| t.kind)
            .find(|kind| !kind.is_trivia())
    }

    /// The `n`th significant token before the cursor, nearest first
    fn significant_before(&self, n: usize) -> Option<&CstToken> {
        self.tokens[..self.pos]
            .iter()
            .rev()
            .filter(|t| !t.kind.is_trivia())
            .nth(n)
    }

    fn error(&mut self, message: &str) {
        let span = match self.current() {
            Some(token) => token.span.clone(),
            None => {
                let end = self
                    .pos
                    .checked_sub(1)
                    .and_then(|i| self.tokens.get(i))
                    .map_or(0, |t| t.span.end);
                end..end
            }
        };
        self.errors.push(ParseError {
            message: message.to_string(),
            span,
        });
    }

    /// Wrap the offending token, and the rest of its statement, in an
    /// `Error` node
    fn error_and_recover(&mut self, message: &str) {
        self.error(message);
        self.builder.start_node(CsSyntaxKind::Error);
        if self.at(CsSyntaxKind::DocCommentStart) {
            self.parse_doc_comment();
        } else {
            self.bump();
        }
        self.bump_balanced_until(|kind| {
            matches!(kind, CsSyntaxKind::Semicolon | CsSyntaxKind::RBrace)
        });
        if self.at(CsSyntaxKind::Semicolon) {
            self.bump();
        }
        self.builder.finish_node();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> CsSyntaxNode {
        let parsed = parse_csharp(source);
        assert!(
            parsed.errors.is_empty(),
            "unexpected parse errors: {:?}",
            parsed.errors
        );
        assert_eq!(parsed.syntax.text().to_string(), source);
        parsed.syntax
    }

    fn first(root: &CsSyntaxNode, kind: CsSyntaxKind) -> CsSyntaxNode {
        root.descendants()
            .find(|n| n.kind() == kind)
            .unwrap_or_else(|| panic!("no {kind:?} in tree"))
    }

    #[test]
    fn test_parse_using_directive() {
        let root = parse_ok("using Moq;\n");
        let using = first(&root, CsSyntaxKind::UsingDirective);
        assert_eq!(using.text().to_string(), "using Moq;");
        let name = using.children().find(|n| n.kind().is_name()).unwrap();
        assert_eq!(name.kind(), CsSyntaxKind::IdentifierName);
    }

    #[test]
    fn test_parse_global_static_and_alias_usings() {
        let root = parse_ok(
            "global using Moq.Language;\nusing static Moq.It;\nusing Times = Moq.Times;\n",
        );
        let usings: Vec<_> = root
            .children()
            .filter(|n| n.kind() == CsSyntaxKind::UsingDirective)
            .collect();
        assert_eq!(usings.len(), 3);
        assert!(usings[2]
            .children()
            .any(|n| n.kind() == CsSyntaxKind::NameEquals));
    }

    #[test]
    fn test_qualified_name_is_left_associative() {
        let root = parse_ok("namespace Moq.Language.Flow { }");
        let ns = first(&root, CsSyntaxKind::NamespaceDeclaration);
        let name = ns.children().find(|n| n.kind().is_name()).unwrap();
        assert_eq!(name.kind(), CsSyntaxKind::QualifiedName);
        let left = name.first_child().unwrap();
        assert_eq!(left.kind(), CsSyntaxKind::QualifiedName);
        assert_eq!(left.text().to_string(), "Moq.Language");
        assert_eq!(
            left.first_child().unwrap().kind(),
            CsSyntaxKind::IdentifierName
        );
    }

    #[test]
    fn test_file_scoped_namespace_owns_rest_of_file() {
        let root = parse_ok("namespace Moq;\n\npublic class Mock { }\n");
        let ns = first(&root, CsSyntaxKind::FileScopedNamespaceDeclaration);
        assert!(ns
            .children()
            .any(|n| n.kind() == CsSyntaxKind::ClassDeclaration));
    }

    #[test]
    fn test_field_declaration_structure() {
        let root = parse_ok("class Mock { private Moq.Times times = Moq.Times.Once(), other; }");
        let field = first(&root, CsSyntaxKind::FieldDeclaration);
        let declaration = field
            .children()
            .find(|n| n.kind() == CsSyntaxKind::VariableDeclaration)
            .unwrap();
        let ty = declaration.first_child().unwrap();
        assert_eq!(ty.kind(), CsSyntaxKind::QualifiedName);
        assert_eq!(ty.text().to_string(), "Moq.Times");
        assert_eq!(
            declaration
                .children()
                .filter(|n| n.kind() == CsSyntaxKind::VariableDeclarator)
                .count(),
            2
        );
    }

    #[test]
    fn test_member_kinds() {
        let source = r#"public partial class Mock<T> : Moq.Mock, IFluentInterface where T : class
{
    public Mock(Moq.MockBehavior behavior) : base(behavior) { }
    ~Mock() { }
    public virtual Moq.Times Times { get; set; } = Moq.Times.Never();
    public Moq.ISetup<T> Setup<TResult>(Moq.Expression<T> expression) where TResult : Moq.IMock => null;
    public int this[Moq.Key key] => 0;
    public event Moq.Handler Raised;
    public static implicit operator Moq.Times(Mock<T> mock) => default;
    public static Mock<T> operator +(Mock<T> a, Mock<T> b) => a;
    void IDisposable.Dispose() { }
    public delegate Moq.Result Callback(Moq.Arg arg);
    public enum Kind : byte { A, B = 2 }
}
"#;
        let root = parse_ok(source);
        for kind in [
            CsSyntaxKind::ConstructorDeclaration,
            CsSyntaxKind::DestructorDeclaration,
            CsSyntaxKind::PropertyDeclaration,
            CsSyntaxKind::MethodDeclaration,
            CsSyntaxKind::IndexerDeclaration,
            CsSyntaxKind::EventDeclaration,
            CsSyntaxKind::ConversionOperatorDeclaration,
            CsSyntaxKind::OperatorDeclaration,
            CsSyntaxKind::DelegateDeclaration,
            CsSyntaxKind::EnumDeclaration,
            CsSyntaxKind::BaseList,
            CsSyntaxKind::TypeParameterConstraintClause,
        ] {
            first(&root, kind);
        }
        assert_eq!(
            root.descendants()
                .filter(|n| n.kind() == CsSyntaxKind::MethodDeclaration)
                .count(),
            2
        );
    }

    #[test]
    fn test_type_suffixes() {
        let root = parse_ok("class C { Moq.Times?[] a; int* b; (Moq.Times t, int) c; }");
        let array = first(&root, CsSyntaxKind::ArrayType);
        assert_eq!(array.first_child().unwrap().kind(), CsSyntaxKind::NullableType);
        first(&root, CsSyntaxKind::PointerType);
        let tuple = first(&root, CsSyntaxKind::TupleType);
        assert_eq!(
            tuple
                .children()
                .filter(|n| n.kind() == CsSyntaxKind::TupleElement)
                .count(),
            2
        );
    }

    #[test]
    fn test_bodies_are_soup() {
        let root = parse_ok("class C { void M() { var x = new Moq.Times(); if (x) { } } }");
        let block = first(&root, CsSyntaxKind::Block);
        assert!(block.children().all(|n| !n.kind().is_name()));
    }

    #[test]
    fn test_doc_comment_crefs() {
        let source = "/// <see cref=\"Moq.Mock{T}.Setup(Moq.Times)\"/> and <see cref=\"Moq\"/>\nclass C { }\n";
        let root = parse_ok(source);
        let crefs: Vec<_> = root
            .descendants()
            .filter(|n| n.kind() == CsSyntaxKind::XmlCrefAttribute)
            .collect();
        assert_eq!(crefs.len(), 2);

        let qualified = first(&crefs[0], CsSyntaxKind::QualifiedCref);
        let container = qualified.first_child().unwrap();
        assert_eq!(container.kind(), CsSyntaxKind::QualifiedName);
        assert_eq!(container.text().to_string(), "Moq.Mock{T}");
        let parameter = first(&qualified, CsSyntaxKind::CrefParameter);
        assert_eq!(parameter.text().to_string(), "Moq.Times");

        let member = first(&crefs[1], CsSyntaxKind::NameMemberCref);
        assert_eq!(member.text().to_string(), "Moq");
    }

    #[test]
    fn test_id_string_cref_is_left_alone() {
        let root = parse_ok("/// <see cref=\"T:Moq.Times\"/>\nclass C { }\n");
        let cref = first(&root, CsSyntaxKind::XmlCrefAttribute);
        assert!(cref.children().any(|n| n.kind() == CsSyntaxKind::Error));
        assert!(cref.descendants().all(|n| !n.kind().is_name()));
    }

    #[test]
    fn test_doc_comment_braces_do_not_unbalance_bodies() {
        let source = "class C {\n    /// <see cref=\"Mock{T\"/>\n    void M() { }\n}\n";
        let parsed = parse_csharp(source);
        assert_eq!(parsed.syntax.text().to_string(), source);
        let method = first(&parsed.syntax, CsSyntaxKind::MethodDeclaration);
        assert_eq!(method.parent().unwrap().kind(), CsSyntaxKind::ClassDeclaration);
    }

    #[test]
    fn test_typed_parameter_lists_inside_bodies() {
        let source = "class C { void M() { void Local(Moq.Times t) { } if (t is Moq.Times x) { } Run((a, b) => a, (int n) => n); } }";
        let root = parse_ok(source);
        let body = first(&root, CsSyntaxKind::Block);
        let lists: Vec<String> = body
            .descendants()
            .filter(|n| n.kind() == CsSyntaxKind::ParameterList)
            .map(|n| n.text().to_string())
            .collect();
        assert_eq!(lists, vec!["(Moq.Times t)", "(int n)"]);
        assert_eq!(root.text().to_string(), source);
    }

    #[test]
    fn test_attributes_and_directives() {
        let source = "[assembly: InternalsVisibleTo(\"Moq.Tests\")]\n#if NET6_0\nnamespace Moq\n{\n    [Serializable]\n    internal sealed class C { }\n}\n#endif\n";
        let root = parse_ok(source);
        first(&root, CsSyntaxKind::AttributeList);
        let class = first(&root, CsSyntaxKind::ClassDeclaration);
        assert!(class
            .children()
            .any(|n| n.kind() == CsSyntaxKind::AttributeList));
    }

    #[test]
    fn test_top_level_statements() {
        let source = "using Moq;\nvar mock = new Mock<IFoo>();\nif (mock != null) { Console.WriteLine(); }\n";
        let root = parse_ok(source);
        assert_eq!(
            root.children()
                .filter(|n| n.kind() == CsSyntaxKind::GlobalStatement)
                .count(),
            2
        );
    }

    #[test]
    fn test_malformed_input_is_lossless() {
        for source in [
            "class {",
            "namespace",
            "}}} using ;",
            "class C { public ) ; }",
            "/// <see cref=\"",
            "class C { Moq.Times",
        ] {
            let parsed = parse_csharp(source);
            assert_eq!(parsed.syntax.text().to_string(), source);
        }
    }

    #[test]
    fn test_parse_name() {
        let name = parse_name("Moq.Legacy.Times").unwrap();
        assert_eq!(name.kind(), CsSyntaxKind::QualifiedName);
        assert_eq!(name.text().to_string(), "Moq.Legacy.Times");

        let generic = parse_name("Moq.Mock<Moq.Times>").unwrap();
        assert_eq!(generic.kind(), CsSyntaxKind::QualifiedName);

        assert!(parse_name("Moq.").is_none());
        assert!(parse_name("Moq Times").is_none());
        assert!(parse_name("").is_none());
    }
}
