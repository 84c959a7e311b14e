//! Tests for CST construction and the lossless round trip

use super::*;
use crate::cst::ast::{AstNode, CompilationUnit};

const MOQ_SAMPLE: &str = r#"// Copyright (c) 2007, Clarius Consulting, Manas Technology Solutions, InSTEDD.
// All rights reserved. Licensed under the BSD 3-Clause License; see License.txt.

using System;
using System.Linq.Expressions;
using Moq.Language.Flow;
using static Moq.It;

#pragma warning disable CS1591

namespace Moq.Protected
{
	/// <summary>
	///   Allows setups to be specified for protected members by using their name.
	///   See <see cref="Moq.Protected.IProtectedMock{TMock}.Setup(string, object[])"/>
	///   and <seealso cref='Moq'/>.
	/// </summary>
	internal class ProtectedMock<T> : IProtectedMock<T>, Moq.IFluentInterface
		where T : class
	{
		private Moq.Mock<T> mock;

		public ProtectedMock(Moq.Mock<T> mock)
		{
			this.mock = mock;
		}

		public ISetup<T> Setup(string methodName, params object[] args)
		{
			return this.InternalSetup(methodName, null, args);
		}

		internal Moq.Language.ISetupGetter<T, TProperty> SetupGet<TProperty>(string propertyName)
			=> new Moq.Language.SetupGetter<T, TProperty>(mock, propertyName);
	}
}
"#;

#[test]
fn test_moq_sample_round_trips() {
    let parsed = parse_csharp(MOQ_SAMPLE);
    assert!(parsed.lexer_errors.is_empty(), "{:?}", parsed.lexer_errors);
    assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
    assert_eq!(parsed.syntax.text().to_string(), MOQ_SAMPLE);
}

#[test]
fn test_moq_sample_structure() {
    let unit = CompilationUnit::cast(parse_csharp(MOQ_SAMPLE).syntax).unwrap();

    assert_eq!(unit.usings().count(), 4);
    assert_eq!(unit.namespaces().count(), 1);
    assert_eq!(unit.cref_attributes().count(), 2);

    let syntax = unit.syntax();
    let count = |kind: CsSyntaxKind| syntax.descendants().filter(|n| n.kind() == kind).count();
    assert_eq!(count(CsSyntaxKind::ClassDeclaration), 1);
    assert_eq!(count(CsSyntaxKind::FieldDeclaration), 1);
    assert_eq!(count(CsSyntaxKind::ConstructorDeclaration), 1);
    assert_eq!(count(CsSyntaxKind::MethodDeclaration), 2);
    assert_eq!(count(CsSyntaxKind::DocumentationComment), 4);
}

#[test]
fn test_crlf_and_tabs_round_trip() {
    let source = "namespace Moq\r\n{\r\n\tpublic interface IMock\r\n\t{\r\n\t\tMoq.Times Times { get; }\r\n\t}\r\n}\r\n";
    let parsed = parse_csharp(source);
    assert!(!parsed.has_errors());
    assert_eq!(parsed.syntax.text().to_string(), source);
}

#[test]
fn test_every_prefix_of_sample_round_trips() {
    // Truncated input exercises every recovery path
    let mut end = 0;
    while end <= MOQ_SAMPLE.len() {
        if MOQ_SAMPLE.is_char_boundary(end) {
            let prefix = &MOQ_SAMPLE[..end];
            assert_eq!(parse_csharp(prefix).syntax.text().to_string(), prefix);
        }
        end += 7;
    }
}

#[test]
fn test_string_contents_are_opaque() {
    let source = "class C { string s = \"namespace Moq.Core { }\"; char c = '}'; }";
    let parsed = parse_csharp(source);
    assert!(!parsed.has_errors());
    let namespaces = parsed
        .syntax
        .descendants()
        .filter(|n| n.kind() == CsSyntaxKind::NamespaceDeclaration)
        .count();
    assert_eq!(namespaces, 0);
}

#[test]
fn test_using_tree_shape() {
    let parsed = parse_csharp("using Moq;");
    insta::assert_snapshot!(format!("{:#?}", parsed.syntax), @r#"
    CompilationUnit@0..10
      UsingDirective@0..10
        UsingKw@0..5 "using"
        Whitespace@5..6 " "
        IdentifierName@6..9
          Ident@6..9 "Moq"
        Semicolon@9..10 ";"
    "#);
}
