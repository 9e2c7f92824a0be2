use treelox::scanner::Scanner;
use treelox::token::{Token, TokenType};

fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
    let scanner = Scanner::new(source.as_bytes());
    let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

    assert_eq!(tokens.len(), expected.len());

    for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
        assert_eq!(actual.token_type, *expected_type);
        assert_eq!(actual.lexeme, *expected_lexeme);
    }
}

#[test]
fn test_scanner_symbols() {
    assert_token_sequence(
        "({*.,+*})",
        &[
            (TokenType::LEFT_PAREN, "("),
            (TokenType::LEFT_BRACE, "{"),
            (TokenType::STAR, "*"),
            (TokenType::DOT, "."),
            (TokenType::COMMA, ","),
            (TokenType::PLUS, "+"),
            (TokenType::STAR, "*"),
            (TokenType::RIGHT_BRACE, "}"),
            (TokenType::RIGHT_PAREN, ")"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn test_scanner_one_and_two_char_operators() {
    assert_token_sequence(
        "! != = == < <= > >= / ? :",
        &[
            (TokenType::BANG, "!"),
            (TokenType::BANG_EQUAL, "!="),
            (TokenType::EQUAL, "="),
            (TokenType::EQUAL_EQUAL, "=="),
            (TokenType::LESS, "<"),
            (TokenType::LESS_EQUAL, "<="),
            (TokenType::GREATER, ">"),
            (TokenType::GREATER_EQUAL, ">="),
            (TokenType::SLASH, "/"),
            (TokenType::QUESTION_MARK, "?"),
            (TokenType::COLON, ":"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn test_scanner_keywords_and_identifiers() {
    assert_token_sequence(
        "var _x = while_y and break",
        &[
            (TokenType::VAR, "var"),
            (TokenType::IDENTIFIER, "_x"),
            (TokenType::EQUAL, "="),
            (TokenType::IDENTIFIER, "while_y"),
            (TokenType::AND, "and"),
            (TokenType::BREAK, "break"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn test_scanner_number_literals() {
    let tokens: Vec<Token> = Scanner::new("42 3.14".as_bytes())
        .filter_map(Result::ok)
        .collect();

    assert_eq!(tokens.len(), 3);

    match tokens[0].token_type {
        TokenType::NUMBER(n) => assert_eq!(n, 42.0),
        ref other => panic!("expected NUMBER, got {:?}", other),
    }

    match tokens[1].token_type {
        TokenType::NUMBER(n) => assert_eq!(n, 3.14),
        ref other => panic!("expected NUMBER, got {:?}", other),
    }
}

#[test]
fn test_scanner_string_literal() {
    let tokens: Vec<Token> = Scanner::new("\"hello world\"".as_bytes())
        .filter_map(Result::ok)
        .collect();

    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].lexeme, "\"hello world\"");

    match &tokens[0].token_type {
        TokenType::STRING(s) => assert_eq!(s, "hello world"),
        other => panic!("expected STRING, got {:?}", other),
    }
}

#[test]
fn test_scanner_multiline_string_advances_line() {
    let tokens: Vec<Token> = Scanner::new("\"a\nb\" x".as_bytes())
        .filter_map(Result::ok)
        .collect();

    // string, identifier, EOF
    assert_eq!(tokens.len(), 3);
    assert_eq!(tokens[1].lexeme, "x");
    assert_eq!(tokens[1].line, 2);
}

#[test]
fn test_scanner_comments_and_whitespace() {
    assert_token_sequence(
        "// a comment\nprint 1; // trailing",
        &[
            (TokenType::PRINT, "print"),
            (TokenType::NUMBER(1.0), "1"),
            (TokenType::SEMICOLON, ";"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn test_scanner_unterminated_string_reports_but_finishes() {
    let results: Vec<_> = Scanner::new("var s = \"oops".as_bytes()).collect();

    let errors: Vec<String> = results
        .iter()
        .filter_map(|r| r.as_ref().err().map(|e| e.to_string()))
        .collect();

    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Unterminated string."));

    // the stream still terminates with EOF
    let last = results.last().unwrap().as_ref().unwrap();
    assert_eq!(last.token_type, TokenType::EOF);
}

#[test]
fn test_scanner_unexpected_chars_interleave_with_tokens() {
    let results: Vec<_> = Scanner::new(",.$(#".as_bytes()).collect();

    // COMMA, DOT, error for '$', LEFT_PAREN, error for '#', EOF
    assert_eq!(results.len(), 6);

    let error_count = results.iter().filter(|r| r.is_err()).count();
    assert_eq!(error_count, 2);

    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(
            err.to_string().contains("Unexpected character"),
            "unexpected message: {}",
            err
        );
    }

    let kinds: Vec<TokenType> = results
        .iter()
        .filter_map(|r| r.as_ref().ok().map(|t| t.token_type.clone()))
        .collect();

    assert_eq!(
        kinds,
        vec![
            TokenType::COMMA,
            TokenType::DOT,
            TokenType::LEFT_PAREN,
            TokenType::EOF,
        ]
    );
}

#[test]
fn test_scanner_empty_source_yields_eof() {
    let tokens: Vec<Token> = Scanner::new("".as_bytes()).filter_map(Result::ok).collect();

    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].token_type, TokenType::EOF);
}
