//! Concrete Syntax Tree (CST) for C# sources
//!
//! This module implements a lossless syntax tree using the Rowan library.
//! The CST preserves all source information including whitespace, comments,
//! preprocessor lines and documentation comments, which is what allows a
//! namespace rename to touch only the names it rewrites.
//!
//! ## Architecture
//!
//! The CST uses Rowan's green/red tree pattern:
//!
//! - **Green Tree**: Immutable, position-independent storage
//!   - Stores actual source text with trivia
//!   - Cheap to clone (uses Arc internally), so unchanged subtrees are shared
//!     between a tree and its rewritten copy
//!
//! - **Red Tree**: Dynamically constructed view with parent pointers
//!   - Created on-demand for traversal
//!   - Provides the typed API in [`ast`]
//!
//! ## Coverage
//!
//! Declarations are parsed structurally down to every type slot: namespaces,
//! using directives, type declarations with base lists and constraints, and
//! member signatures. Member bodies, initializers and attribute arguments are
//! kept as flat token soup. Documentation comment `cref` values are parsed
//! into qualified and member crefs.
//!
//! This enables lossless representation: `parse(source).text() == source`
//!
//! ## Example
//!
//! ```rust,ignore
//! use legacynator_core::cst::{CsSyntaxKind, parse_csharp};
//!
//! let parsed = parse_csharp("using Moq; // mocks\n");
//! assert_eq!(parsed.syntax.text().to_string(), "using Moq; // mocks\n");
//!
//! for node in parsed.syntax.descendants() {
//!     if node.kind() == CsSyntaxKind::UsingDirective {
//!         println!("Found using: {}", node.text());
//!     }
//! }
//! ```

mod builder;
mod language;
mod lexer;
mod parser;
mod syntax_kind;

pub mod ast;
pub mod edit;

pub use builder::CstBuilder;
pub use language::CsLanguage;
pub use lexer::{CstLexResult, CstSpan, CstToken, LexerError, lex_with_trivia};
pub use parser::{ParseError, ParsedFile, parse_csharp, parse_name};
pub use syntax_kind::CsSyntaxKind;

/// Red tree node
pub type CsSyntaxNode = rowan::SyntaxNode<CsLanguage>;
/// Red tree token
pub type CsSyntaxToken = rowan::SyntaxToken<CsLanguage>;
/// Either a node or a token
pub type CsSyntaxElement = rowan::SyntaxElement<CsLanguage>;

#[cfg(test)]
mod tests;
