//! Lexer integration tests: token display format, literal handling, error
//! interleaving, and line tracking.

use loxide::scanner::Scanner;
use loxide::token::{Token, TokenType};

fn scan_ok(source: &str) -> Vec<Token<'_>> {
    Scanner::new(source)
        .map(|token| token.unwrap())
        .collect()
}

fn display_lines(source: &str) -> Vec<String> {
    scan_ok(source).iter().map(|t| t.to_string()).collect()
}

#[test]
fn punctuation_and_operators() {
    let lines = display_lines("(){};,+-*!===<=>=!=<>/.");

    assert_eq!(
        lines,
        vec![
            "LEFT_PAREN ( null",
            "RIGHT_PAREN ) null",
            "LEFT_BRACE { null",
            "RIGHT_BRACE } null",
            "SEMICOLON ; null",
            "COMMA , null",
            "PLUS + null",
            "MINUS - null",
            "STAR * null",
            "BANG_EQUAL != null",
            "EQUAL_EQUAL == null",
            "LESS_EQUAL <= null",
            "GREATER_EQUAL >= null",
            "BANG_EQUAL != null",
            "LESS < null",
            "GREATER > null",
            "SLASH / null",
            "DOT . null",
            "EOF  null",
        ]
    );
}

#[test]
fn integral_numbers_display_with_fractional_part() {
    assert_eq!(display_lines("123"), vec!["NUMBER 123 123.0", "EOF  null"]);
}

#[test]
fn fractional_numbers_display_verbatim() {
    assert_eq!(
        display_lines("45.67"),
        vec!["NUMBER 45.67 45.67", "EOF  null"]
    );
}

#[test]
fn number_followed_by_method_style_dot() {
    // `123.` is NUMBER then DOT: the dot only joins with a digit after it.
    let lines = display_lines("123.sqrt");

    assert_eq!(
        lines,
        vec![
            "NUMBER 123 123.0",
            "DOT . null",
            "IDENTIFIER sqrt null",
            "EOF  null",
        ]
    );
}

#[test]
fn string_literal_strips_quotes() {
    assert_eq!(
        display_lines("\"hello\""),
        vec!["STRING \"hello\" hello", "EOF  null"]
    );
}

#[test]
fn multi_line_string_advances_line_counter() {
    let tokens = scan_ok("\"a\nb\"\nx");

    // The identifier after the two-line string sits on line 3.
    let ident = &tokens[1];
    assert_eq!(ident.lexeme, "x");
    assert_eq!(ident.line, 3);
}

#[test]
fn unterminated_string_is_an_error() {
    let results: Vec<_> = Scanner::new("\"oops").collect();

    let err = results[0].as_ref().unwrap_err();
    assert_eq!(err.to_string(), "[line 1] Error: Unterminated string.");

    // EOF is still emitted after the error.
    assert!(results[1].is_ok());
}

#[test]
fn keywords_resolve_identifiers_pass_through() {
    let tokens = scan_ok("class classy var variable");

    assert_eq!(tokens[0].token_type, TokenType::CLASS);
    assert_eq!(tokens[1].token_type, TokenType::IDENTIFIER);
    assert_eq!(tokens[1].lexeme, "classy");
    assert_eq!(tokens[2].token_type, TokenType::VAR);
    assert_eq!(tokens[3].token_type, TokenType::IDENTIFIER);
}

#[test]
fn comments_and_whitespace_produce_no_tokens() {
    let lines = display_lines("// nothing here\n\t  \r\n// more\n");

    assert_eq!(lines, vec!["EOF  null"]);
}

#[test]
fn comment_runs_to_end_of_line_only() {
    let tokens = scan_ok("1 // ignored\n2");

    assert_eq!(tokens[0].to_string(), "NUMBER 1 1.0");
    assert_eq!(tokens[1].to_string(), "NUMBER 2 2.0");
    assert_eq!(tokens[1].line, 2);
}

#[test]
fn unexpected_character_reported_and_scanning_continues() {
    let results: Vec<_> = Scanner::new("@ 1").collect();

    let err = results[0].as_ref().unwrap_err();
    assert_eq!(err.to_string(), "[line 1] Error: Unexpected character: @");

    let token = results[1].as_ref().unwrap();
    assert_eq!(token.to_string(), "NUMBER 1 1.0");
}

#[test]
fn exactly_one_eof_then_exhausted() {
    let mut scanner = Scanner::new("");

    let first = scanner.next().unwrap().unwrap();
    assert_eq!(first.token_type, TokenType::EOF);

    assert!(scanner.next().is_none());
    assert!(scanner.next().is_none());
}
