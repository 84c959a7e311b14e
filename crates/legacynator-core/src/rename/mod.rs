//! Renaming the `Moq` namespace to `Moq.Legacy`
//!
//! [`QualifierMatcher`] answers single-node questions ("does this name start
//! at `Moq`?") and builds replacement nodes; [`LegacyRewriter`] walks a whole
//! tree and asks those questions at every position that can hold a type or
//! namespace reference.

pub mod matcher;
pub mod rewriter;

pub use matcher::{QualifierMatcher, RenameRule};
pub use rewriter::{LegacyRewriter, RewriteEvent, RewriteKind};

use tracing::warn;

use crate::cst::{LexerError, ParseError, parse_csharp};

const BOM: char = '\u{feff}';

/// Result of rewriting one source text
#[derive(Debug, Clone, Default)]
pub struct RewriteOutput {
    /// Rewritten text, byte-identical to the input where nothing matched
    pub text: String,
    pub events: Vec<RewriteEvent>,
    pub lexer_errors: Vec<LexerError>,
    pub parse_errors: Vec<ParseError>,
}

impl RewriteOutput {
    pub fn changed(&self) -> bool {
        !self.events.is_empty()
    }

    pub fn rewrite_count(&self) -> usize {
        self.events.len()
    }
}

/// Parse, rewrite and print one C# source text
///
/// A leading byte-order mark is kept. Malformed input is still rewritten
/// wherever the parser recognised structure; diagnostics are returned
/// alongside the text.
pub fn rewrite_source(source: &str) -> RewriteOutput {
    let (bom, body) = match source.strip_prefix(BOM) {
        Some(rest) => (true, rest),
        None => (false, source),
    };

    let parsed = parse_csharp(body);
    for error in &parsed.lexer_errors {
        warn!(span = ?error.span, "{}", error.message);
    }

    let mut rewriter = LegacyRewriter::new();
    let rewritten = rewriter.rewrite(&parsed.syntax);

    let mut text = String::with_capacity(source.len() + 16);
    if bom {
        text.push(BOM);
    }
    text.push_str(&rewritten.text().to_string());

    RewriteOutput {
        text,
        events: rewriter.into_events(),
        lexer_errors: parsed.lexer_errors,
        parse_errors: parsed.errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_source_reports_changes() {
        let output = rewrite_source("using Moq;\nusing System;\n");
        assert_eq!(output.text, "using Moq.Legacy;\nusing System;\n");
        assert!(output.changed());
        assert_eq!(output.rewrite_count(), 1);
        assert!(output.lexer_errors.is_empty());
    }

    #[test]
    fn test_rewrite_source_without_matches_is_identity() {
        let source = "namespace System.Linq\n{\n    // Moq.Times in a comment\n    class C { string s = \"Moq.Times\"; }\n}\n";
        let output = rewrite_source(source);
        assert_eq!(output.text, source);
        assert!(!output.changed());
    }

    #[test]
    fn test_rewrite_source_keeps_bom() {
        let output = rewrite_source("\u{feff}namespace Moq { }");
        assert_eq!(output.text, "\u{feff}namespace Moq.Legacy { }");
    }

    #[test]
    fn test_rewrite_source_survives_malformed_input() {
        let output = rewrite_source("using Moq;\nclass C { Moq.Times t; void M( { }\n§");
        assert!(output.text.starts_with("using Moq.Legacy;\n"));
        assert!(output.text.ends_with('§'));
        assert!(!output.lexer_errors.is_empty());
    }

    #[test]
    fn test_rewrite_moq_file() {
        let source = r#"using System;
using Moq.Language.Flow;

namespace Moq.Protected
{
    /// <summary>
    ///   Allows setups for protected members. See <see cref="Moq.Mock{T}.Setup"/>
    ///   and the <see cref="Moq"/> namespace.
    /// </summary>
    /// <exception cref="Moq.MockException">Verification failed.</exception>
    internal class ProtectedMock<T> : IProtectedMock<T>, Moq.IFluentInterface
        where T : class
    {
        private readonly Moq.Mock<T> mock;

        public ProtectedMock(Moq.Mock<T> mock, Moq.Times? times = null)
        {
            this.mock = mock;
        }

        public Moq.Language.ISetupGetter<T, TResult> SetupGet<TResult>(string name)
            => new Moq.Language.SetupGetter<T, TResult>(mock, name);
    }
}
"#;
        let output = rewrite_source(source);
        insta::assert_snapshot!(output.text, @r#"
        using System;
        using Moq.Legacy.Language.Flow;

        namespace Moq.Legacy.Protected
        {
            /// <summary>
            ///   Allows setups for protected members. See <see cref="Moq.Legacy.Mock{T}.Setup"/>
            ///   and the <see cref="Moq.Legacy"/> namespace.
            /// </summary>
            /// <exception cref="Moq.Legacy.MockException">Verification failed.</exception>
            internal class ProtectedMock<T> : IProtectedMock<T>, Moq.Legacy.IFluentInterface
                where T : class
            {
                private readonly Moq.Legacy.Mock<T> mock;

                public ProtectedMock(Moq.Legacy.Mock<T> mock, Moq.Legacy.Times? times = null)
                {
                    this.mock = mock;
                }

                public Moq.Legacy.Language.ISetupGetter<T, TResult> SetupGet<TResult>(string name)
                    => new Moq.Language.SetupGetter<T, TResult>(mock, name);
            }
        }
        "#);
        assert_eq!(output.rewrite_count(), 10);
    }
}
