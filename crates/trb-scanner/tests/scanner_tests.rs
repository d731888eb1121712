use trb_scanner::{SyntaxKind, tokenize};

fn kinds(source: &str) -> Vec<SyntaxKind> {
    tokenize(source).tokens.iter().map(|t| t.kind).collect()
}

fn texts(source: &str) -> Vec<String> {
    tokenize(source)
        .tokens
        .iter()
        .map(|t| t.text(source).to_string())
        .collect()
}

#[test]
fn scans_a_method_header() {
    let source = "def greet(name: String): String";
    assert_eq!(
        kinds(source),
        vec![
            SyntaxKind::DefKeyword,
            SyntaxKind::Identifier,
            SyntaxKind::LeftParenToken,
            SyntaxKind::Identifier,
            SyntaxKind::ColonToken,
            SyntaxKind::ConstantName,
            SyntaxKind::RightParenToken,
            SyntaxKind::ColonToken,
            SyntaxKind::ConstantName,
            SyntaxKind::EndOfFile,
        ]
    );
}

#[test]
fn token_spans_cover_the_source() {
    let source = "x = 1 + 2\n";
    let result = tokenize(source);
    assert!(result.diagnostics.is_empty());
    // Concatenated token texts, with whitespace elided, reproduce the source.
    let concatenated: String = result
        .tokens
        .iter()
        .map(|t| t.text(source))
        .collect::<Vec<_>>()
        .join("");
    assert_eq!(concatenated, "x=1+2\n");
}

#[test]
fn scans_integer_and_float_literals() {
    assert_eq!(
        kinds("1 1_000 3.14 2e10 1.5e-3"),
        vec![
            SyntaxKind::IntegerLiteral,
            SyntaxKind::IntegerLiteral,
            SyntaxKind::FloatLiteral,
            SyntaxKind::FloatLiteral,
            SyntaxKind::FloatLiteral,
            SyntaxKind::EndOfFile,
        ]
    );
}

#[test]
fn integer_dot_method_call_is_not_a_float() {
    assert_eq!(
        kinds("1.upto"),
        vec![
            SyntaxKind::IntegerLiteral,
            SyntaxKind::DotToken,
            SyntaxKind::Identifier,
            SyntaxKind::EndOfFile,
        ]
    );
}

#[test]
fn scans_plain_string_literal() {
    let source = "\"hello\"";
    let result = tokenize(source);
    assert_eq!(result.tokens[0].kind, SyntaxKind::StringLiteral);
    assert_eq!(result.tokens[0].text(source), "\"hello\"");
}

#[test]
fn scans_interpolated_string_as_fragments() {
    let source = "\"Hello, #{name}!\"";
    assert_eq!(
        kinds(source),
        vec![
            SyntaxKind::StringFragment,
            SyntaxKind::InterpolationStart,
            SyntaxKind::Identifier,
            SyntaxKind::InterpolationEnd,
            SyntaxKind::StringFragment,
            SyntaxKind::EndOfFile,
        ]
    );
    let t = texts(source);
    assert_eq!(t[0], "\"Hello, ");
    assert_eq!(t[1], "#{");
    assert_eq!(t[2], "name");
    assert_eq!(t[3], "}");
    assert_eq!(t[4], "!\"");
}

#[test]
fn interpolation_with_nested_braces() {
    let source = "\"#{h.fetch(:k) { 0 }}\"";
    let result = tokenize(source);
    assert!(result.diagnostics.is_empty());
    let interpolation_ends = result
        .tokens
        .iter()
        .filter(|t| t.kind == SyntaxKind::InterpolationEnd)
        .count();
    assert_eq!(interpolation_ends, 1);
    assert_eq!(result.tokens.last().unwrap().kind, SyntaxKind::EndOfFile);
}

#[test]
fn multiple_interpolations_in_one_string() {
    let source = "\"#{a} and #{b}\"";
    let fragment_count = tokenize(source)
        .tokens
        .iter()
        .filter(|t| t.kind == SyntaxKind::StringFragment)
        .count();
    assert_eq!(fragment_count, 3);
}

#[test]
fn unterminated_string_reports_a_diagnostic() {
    let result = tokenize("\"oops");
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(
        result.diagnostics[0].code,
        trb_common::diagnostics::codes::UNTERMINATED_STRING
    );
}

#[test]
fn scans_symbols_and_keywords() {
    assert_eq!(
        kinds(":active if unless"),
        vec![
            SyntaxKind::SymbolLiteral,
            SyntaxKind::IfKeyword,
            SyntaxKind::UnlessKeyword,
            SyntaxKind::EndOfFile,
        ]
    );
}

#[test]
fn scans_variable_sigils() {
    assert_eq!(
        kinds("@name @@count $stderr CONST"),
        vec![
            SyntaxKind::InstanceVariable,
            SyntaxKind::ClassVariable,
            SyntaxKind::GlobalVariable,
            SyntaxKind::ConstantName,
            SyntaxKind::EndOfFile,
        ]
    );
}

#[test]
fn method_names_may_end_in_question_or_bang() {
    let source = "empty? save!";
    let t = texts(source);
    assert_eq!(t[0], "empty?");
    assert_eq!(t[1], "save!");
}

#[test]
fn constant_followed_by_question_stays_two_tokens() {
    assert_eq!(
        kinds("Integer?"),
        vec![
            SyntaxKind::ConstantName,
            SyntaxKind::QuestionToken,
            SyntaxKind::EndOfFile,
        ]
    );
}

#[test]
fn less_than_is_always_a_plain_operator() {
    // `Array<T>` and `a < b` lex identically; the parser disambiguates.
    assert_eq!(
        kinds("Array<T>"),
        vec![
            SyntaxKind::ConstantName,
            SyntaxKind::LessThanToken,
            SyntaxKind::ConstantName,
            SyntaxKind::GreaterThanToken,
            SyntaxKind::EndOfFile,
        ]
    );
}

#[test]
fn scans_compound_operators_longest_first() {
    assert_eq!(
        kinds("<=> <= << ||= && &. ** -> =>"),
        vec![
            SyntaxKind::SpaceshipToken,
            SyntaxKind::LessThanEqualsToken,
            SyntaxKind::LessThanLessThanToken,
            SyntaxKind::BarBarEqualsToken,
            SyntaxKind::AmpersandAmpersandToken,
            SyntaxKind::SafeNavigationToken,
            SyntaxKind::StarStarToken,
            SyntaxKind::ArrowToken,
            SyntaxKind::FatArrowToken,
            SyntaxKind::EndOfFile,
        ]
    );
}

#[test]
fn comments_are_tokens() {
    let source = "x = 1 # assign\n";
    let result = tokenize(source);
    let comment = result
        .tokens
        .iter()
        .find(|t| t.kind == SyntaxKind::Comment)
        .expect("comment token");
    assert_eq!(comment.text(source), "# assign");
}

#[test]
fn newlines_are_tokens() {
    let newline_count = tokenize("a\nb\n")
        .tokens
        .iter()
        .filter(|t| t.kind == SyntaxKind::Newline)
        .count();
    assert_eq!(newline_count, 2);
}

#[test]
fn hash_inside_string_is_not_a_comment() {
    let source = "'#not a comment'";
    let result = tokenize(source);
    assert_eq!(result.tokens[0].kind, SyntaxKind::StringLiteral);
    assert!(!result.tokens.iter().any(|t| t.kind == SyntaxKind::Comment));
}
