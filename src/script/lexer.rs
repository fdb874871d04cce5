use crate::{
    errors::JSONPathError,
    script::token::{Token, TokenType, EOQ},
};

use std::str::CharIndices;

enum State {
    Error,
    EndOfExpression,
    LexExpression,
    LexMember,
    LexSubject,
    LexInsideSingleQuotedString,
    LexInsideDoubleQuotedString,
}

/// A tokenizer for filter and dynamic-key expressions.
struct Lexer<'q> {
    expr: &'q str,
    offset: usize,
    tokens: Vec<Token>,

    chars: CharIndices<'q>,
    start: usize,
    pos: usize,
}

impl<'q> Lexer<'q> {
    fn new(expr: &'q str, offset: usize) -> Self {
        Self {
            expr,
            offset,
            tokens: Vec::new(),
            start: 0,
            pos: 0,
            chars: expr.char_indices(),
        }
    }

    fn run(&mut self) {
        let mut state = State::LexExpression;
        loop {
            match state {
                State::Error | State::EndOfExpression => break,
                State::LexExpression => state = lex_expression(self),
                State::LexMember => state = lex_member(self),
                State::LexSubject => state = lex_subject(self),
                State::LexInsideSingleQuotedString => state = lex_string(self, '\''),
                State::LexInsideDoubleQuotedString => state = lex_string(self, '"'),
            }
        }
    }

    fn emit(&mut self, t: TokenType) {
        self.tokens.push(Token::new(
            t,
            self.offset + self.start,
            self.offset + self.pos,
        ));
        self.start = self.pos;
    }

    fn value(&self) -> &str {
        self.expr.get(self.start..self.pos).unwrap_or_default()
    }

    fn boxed_value(&self) -> Box<str> {
        self.value().to_string().into_boxed_str()
    }

    fn next(&mut self) -> Option<char> {
        if let Some((pos, ch)) = self.chars.next() {
            self.pos = pos + ch.len_utf8();
            Some(ch)
        } else {
            None
        }
    }

    fn ignore(&mut self) {
        self.start = self.pos;
    }

    fn peek(&mut self) -> char {
        if let Some((_, ch)) = self.chars.clone().next() {
            ch
        } else {
            EOQ
        }
    }

    fn accept(&mut self, ch: char) -> bool {
        if self.peek() == ch {
            self.next();
            true
        } else {
            false
        }
    }

    fn accept_if(&mut self, pred: impl FnOnce(char) -> bool) -> bool {
        if pred(self.peek()) {
            self.next();
            true
        } else {
            false
        }
    }

    fn accept_run(&mut self, pred: impl Fn(char) -> bool) -> bool {
        let mut accepted = false;
        while pred(self.peek()) {
            self.next();
            accepted = true;
        }
        accepted
    }

    fn ignore_whitespace(&mut self) -> bool {
        if self.accept_run(is_whitespace_char) {
            self.ignore();
            true
        } else {
            false
        }
    }

    fn error(&mut self, msg: String) -> State {
        self.tokens.push(Token::new(
            TokenType::Error {
                msg: msg.into_boxed_str(),
            },
            self.offset + self.start,
            self.offset + self.pos,
        ));
        State::Error
    }
}

pub fn tokenize(expr: &str, offset: usize) -> Vec<Token> {
    let mut lexer = Lexer::new(expr, offset);
    lexer.run();
    lexer.tokens
}

pub fn lex(expr: &str, offset: usize) -> Result<Vec<Token>, JSONPathError> {
    let tokens = tokenize(expr, offset);

    match tokens.last() {
        Some(Token {
            kind: TokenType::Error { msg },
            span,
        }) => Err(JSONPathError::syntax((*msg).to_string(), *span)),
        _ => Ok(tokens),
    }
}

fn lex_expression(l: &mut Lexer) -> State {
    l.ignore_whitespace();

    match l.peek() {
        EOQ => {
            l.emit(TokenType::Eoq);
            State::EndOfExpression
        }
        '@' => {
            l.next();
            State::LexSubject
        }
        '.' => {
            l.next();
            l.emit(TokenType::Dot);
            State::LexMember
        }
        '[' => {
            l.next();
            l.emit(TokenType::LBracket);
            State::LexExpression
        }
        ']' => {
            l.next();
            l.emit(TokenType::RBracket);
            State::LexExpression
        }
        '(' => {
            l.next();
            l.emit(TokenType::LParen);
            State::LexExpression
        }
        ')' => {
            l.next();
            l.emit(TokenType::RParen);
            State::LexExpression
        }
        '\'' => {
            l.next();
            State::LexInsideSingleQuotedString
        }
        '"' => {
            l.next();
            State::LexInsideDoubleQuotedString
        }
        '!' => {
            l.next();
            if l.accept('=') {
                if l.accept('=') {
                    l.emit(TokenType::StrictNe);
                } else {
                    l.emit(TokenType::Ne);
                }
            } else {
                l.emit(TokenType::Not);
            }
            State::LexExpression
        }
        '=' => {
            l.next();
            if l.accept('=') {
                if l.accept('=') {
                    l.emit(TokenType::StrictEq);
                } else {
                    l.emit(TokenType::Eq);
                }
                State::LexExpression
            } else {
                l.error(String::from("assignment is not allowed, did you mean '=='?"))
            }
        }
        '<' => {
            l.next();
            if l.accept('=') {
                l.emit(TokenType::Le);
            } else {
                l.emit(TokenType::Lt);
            }
            State::LexExpression
        }
        '>' => {
            l.next();
            if l.accept('=') {
                l.emit(TokenType::Ge);
            } else {
                l.emit(TokenType::Gt);
            }
            State::LexExpression
        }
        '&' => {
            l.next();
            if l.accept('&') {
                l.emit(TokenType::And);
                State::LexExpression
            } else {
                l.error(String::from("unexpected '&', did you mean '&&'?"))
            }
        }
        '|' => {
            l.next();
            if l.accept('|') {
                l.emit(TokenType::Or);
                State::LexExpression
            } else {
                l.error(String::from("unexpected '|', did you mean '||'?"))
            }
        }
        '+' => {
            l.next();
            l.emit(TokenType::Plus);
            State::LexExpression
        }
        '-' => {
            l.next();
            l.emit(TokenType::Minus);
            State::LexExpression
        }
        '*' => {
            l.next();
            l.emit(TokenType::Star);
            State::LexExpression
        }
        '/' => {
            l.next();
            l.emit(TokenType::Slash);
            State::LexExpression
        }
        '%' => {
            l.next();
            l.emit(TokenType::Percent);
            State::LexExpression
        }
        ch if is_digit(ch) => lex_number(l),
        ch if is_name_first(ch) => {
            l.accept_run(is_name_char);
            match l.value() {
                "true" => l.emit(TokenType::True),
                "false" => l.emit(TokenType::False),
                "null" => l.emit(TokenType::Null),
                "undefined" => l.emit(TokenType::Undefined),
                _ => l.emit(TokenType::Name {
                    value: l.boxed_value(),
                }),
            }
            State::LexExpression
        }
        ch => {
            l.next();
            l.error(format!("unexpected expression token '{ch}'"))
        }
    }
}

fn lex_subject(l: &mut Lexer) -> State {
    if !l.accept_if(is_name_first) {
        l.emit(TokenType::Current);
        return State::LexExpression;
    }

    l.accept_run(is_name_char);
    match l.value() {
        "@parent" => l.emit(TokenType::Parent),
        "@parentProperty" => l.emit(TokenType::ParentProperty),
        "@property" => l.emit(TokenType::Property),
        "@path" => l.emit(TokenType::Path),
        other => {
            let msg = format!("unknown subject reference '{other}'");
            return l.error(msg);
        }
    }
    State::LexExpression
}

fn lex_member(l: &mut Lexer) -> State {
    if l.accept_run(is_name_char) {
        l.emit(TokenType::Name {
            value: l.boxed_value(),
        });
        State::LexExpression
    } else {
        let msg = format!("expected a member name after '.', found '{}'", l.peek());
        l.error(msg)
    }
}

fn lex_string(l: &mut Lexer, quote: char) -> State {
    l.ignore(); // ignore open quote

    loop {
        match l.peek() {
            '\\' => {
                l.next();
                if !l.accept_if(|c| is_escape_char(c) || c == quote) {
                    return l.error(String::from("invalid escape sequence"));
                }
            }
            EOQ => {
                let msg = format!("unclosed string, expected '{quote}'");
                return l.error(msg);
            }
            ch => {
                if ch == quote {
                    let value = l.boxed_value();
                    l.emit(match quote {
                        '\'' => TokenType::SingleQuoteString { value },
                        _ => TokenType::DoubleQuoteString { value },
                    });
                    l.next();
                    l.ignore(); // ignore closing quote
                    return State::LexExpression;
                }
                l.next();
            }
        }
    }
}

fn lex_number(l: &mut Lexer) -> State {
    l.accept_run(is_digit);

    if l.accept('.') && !l.accept_run(is_digit) {
        return l.error(String::from(
            "a fractional digit is required after a decimal point",
        ));
    }

    if l.accept('e') || l.accept('E') {
        l.accept_if(|ch| ch == '+' || ch == '-');
        if !l.accept_run(is_digit) {
            return l.error(String::from("at least one exponent digit is required"));
        }
    }

    l.emit(TokenType::Number {
        value: l.boxed_value(),
    });
    State::LexExpression
}

fn is_name_first(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}

fn is_name_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}

fn is_digit(ch: char) -> bool {
    ch.is_ascii_digit()
}

fn is_escape_char(ch: char) -> bool {
    matches!(ch, 'b' | 'f' | 'n' | 'r' | 't' | 'u' | '/' | '\\')
}

fn is_whitespace_char(ch: char) -> bool {
    matches!(ch, ' ' | '\n' | '\r' | '\t')
}
