use larix::lexer::{tokenize, NumberValue, Token, TokenStream};
use larix::parse_table::{ParseTable, TableError};
use larix::parser::{ParseError, Parser};
use larix::syntax;
use std::cell::RefCell;
use std::rc::Rc;

const ARITHMETIC: &str = r#"
    term = add;
    add = add "+" mul -> on_add | mul;
    mul = mul "*" unary -> on_mul | unary;
    unary = INT -> on_int | "(" add ")";
"#;

/// Evaluate an arithmetic expression through the parse callbacks, using a
/// shared value stack captured by the handlers.
fn eval(input: &str) -> i64 {
    let grammar = syntax::parse(ARITHMETIC).unwrap();
    let table = ParseTable::generate(&grammar).unwrap();

    let values = Rc::new(RefCell::new(Vec::<i64>::new()));
    let mut parser = Parser::new(&table);
    {
        let values = values.clone();
        parser.on("on_int", move |tokens| {
            let value = tokens[0].lexeme.parse().unwrap();
            values.borrow_mut().push(value);
        });
    }
    {
        let values = values.clone();
        parser.on("on_add", move |_| {
            let mut values = values.borrow_mut();
            let right = values.pop().unwrap();
            let left = values.pop().unwrap();
            values.push(left + right);
        });
    }
    {
        let values = values.clone();
        parser.on("on_mul", move |_| {
            let mut values = values.borrow_mut();
            let right = values.pop().unwrap();
            let left = values.pop().unwrap();
            values.push(left * right);
        });
    }

    let mut tokens = TokenStream::new(tokenize(input).unwrap());
    parser.parse(&mut tokens).unwrap();

    let values = values.borrow();
    assert_eq!(values.len(), 1);
    values[0]
}

#[test]
fn arithmetic_grouping() {
    assert_eq!(eval("2 * (3+4)"), 14);
}

#[test]
fn arithmetic_precedence_and_associativity() {
    assert_eq!(eval("1 + 2 * 3"), 7);
}

#[test]
fn arithmetic_two_groups() {
    assert_eq!(eval("(1+2)*(3+4)"), 21);
}

#[test]
fn nested_recursion_fires_callback_once() {
    let grammar = syntax::parse(
        r#"
        z = s;
        s = s "b";
        s = "b" a "a";
        a = "a" s "c";
        a = "a";
        a = "a" s INT -> blub;
        "#,
    )
    .unwrap();
    let table = ParseTable::generate(&grammar).unwrap();

    let calls = Rc::new(RefCell::new(Vec::<Vec<Token>>::new()));
    let mut parser = Parser::new(&table);
    {
        let calls = calls.clone();
        parser.on("blub", move |tokens| {
            calls.borrow_mut().push(tokens.to_vec());
        });
    }

    let mut tokens = TokenStream::new(tokenize("b a b a a 42 a").unwrap());
    parser.parse(&mut tokens).unwrap();

    let calls = calls.borrow();
    assert_eq!(calls.len(), 1);
    // The covered terminals in right-hand-side order; the nonterminal
    // between them is skipped.
    let tokens = &calls[0];
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].lexeme, "a");
    assert_eq!(tokens[1].lexeme, "42");
    assert_eq!(tokens[1].number, Some(NumberValue::Int(42)));
}

#[test]
fn baseless_left_recursion_rejects_every_input() {
    let grammar = syntax::parse(r#"x = x "a";"#).unwrap();
    // Table construction succeeds; there is just no way into `x`.
    let table = ParseTable::generate(&grammar).unwrap();

    for input in ["a", "a a", "a a a"] {
        let mut parser = Parser::new(&table);
        let mut tokens = TokenStream::new(tokenize(input).unwrap());
        let err = parser.parse(&mut tokens).unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { lexeme, .. } if lexeme == "a"));
    }
}

#[test]
fn degenerate_cycle_is_rejected_before_parsing() {
    let grammar = syntax::parse(r#"s = s; s = "a";"#).unwrap();
    let err = ParseTable::generate(&grammar).unwrap_err();
    assert!(matches!(
        err,
        TableError::ReduceReduceConflict { .. } | TableError::ShiftReduceConflict { .. }
    ));
}

#[test]
fn tables_are_deterministic() {
    let grammar = syntax::parse(ARITHMETIC).unwrap();
    let first = ParseTable::generate(&grammar).unwrap().to_string();
    let second = ParseTable::generate(&grammar).unwrap().to_string();
    assert_eq!(first, second);
}
