//! Turn path expression strings into [`Segment`]s.
//!
//! Compiled paths are cached by their source text, so compiling the same
//! string twice returns the same shared slice.
use std::{
    num::NonZeroUsize,
    str::CharIndices,
    sync::{Arc, Mutex, PoisonError},
};

use lazy_static::lazy_static;
use log::debug;
use lru::LruCache;
use regex::Regex;

use crate::{
    errors::JSONPathError,
    script,
    segment::{Kind, Segment},
};

const EOQ: char = '\0';
const CACHE_SIZE: usize = 256;

lazy_static! {
    static ref CACHE: Mutex<LruCache<String, Arc<[Segment]>>> =
        Mutex::new(LruCache::new(NonZeroUsize::new(CACHE_SIZE).unwrap()));
    static ref SLICE: Regex = Regex::new(r"^(-?[0-9]*):(-?[0-9]*):?(-?[0-9]*)$").unwrap();
    static ref KIND: Regex = Regex::new(r"^@([A-Za-z]+)\(\)").unwrap();
}

/// Compile a path expression, or return the cached result of an earlier
/// compilation of the same string.
pub fn compile(expr: &str) -> Result<Arc<[Segment]>, JSONPathError> {
    let mut cache = CACHE.lock().unwrap_or_else(PoisonError::into_inner);

    if let Some(segments) = cache.get(expr) {
        return Ok(Arc::clone(segments));
    }

    debug!("compiling path {expr:?}");
    let segments: Arc<[Segment]> = Compiler::new(expr).compile()?.into();
    cache.put(expr.to_owned(), Arc::clone(&segments));
    Ok(segments)
}

struct Compiler<'p> {
    path: &'p str,
    chars: CharIndices<'p>,
    pos: usize,
    segments: Vec<Segment>,
}

impl<'p> Compiler<'p> {
    fn new(path: &'p str) -> Self {
        Self {
            path,
            chars: path.char_indices(),
            pos: 0,
            segments: Vec::new(),
        }
    }

    fn compile(mut self) -> Result<Vec<Segment>, JSONPathError> {
        if self.path.trim().is_empty() {
            return Err(JSONPathError::syntax(
                String::from("empty path expression"),
                (0, self.path.len()),
            ));
        }

        // A leading root is implicit unless it is all there is.
        if self.accept('$') && self.peek() == EOQ {
            return Ok(vec![Segment::Root]);
        }

        loop {
            match self.peek() {
                EOQ => break,
                '.' => {
                    let start = self.pos;
                    self.next();
                    if self.accept('.') {
                        self.accept('.');
                        self.segments.push(Segment::Descendant);
                        continue;
                    }

                    match self.peek() {
                        EOQ => {
                            return Err(JSONPathError::syntax(
                                String::from("unexpected end of path after '.'"),
                                (start, self.pos),
                            ))
                        }
                        '[' => continue,
                        _ => self.lex_dotted()?,
                    }
                }
                '[' => self.lex_bracketed()?,
                ']' => {
                    return Err(JSONPathError::syntax(
                        String::from("unexpected ']'"),
                        (self.pos, self.pos + 1),
                    ))
                }
                '^' => {
                    self.next();
                    self.segments.push(Segment::Parent);
                }
                '~' => {
                    self.next();
                    self.segments.push(Segment::PropertyName);
                }
                _ => self.lex_dotted()?,
            }
        }

        Ok(self.segments)
    }

    fn next(&mut self) -> Option<char> {
        if let Some((pos, ch)) = self.chars.next() {
            self.pos = pos + ch.len_utf8();
            Some(ch)
        } else {
            None
        }
    }

    fn peek(&self) -> char {
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

    fn rest(&self) -> &'p str {
        self.path.get(self.pos..).unwrap_or_default()
    }

    fn skip(&mut self, len: usize) {
        let target = self.pos + len;
        while self.pos < target && self.next().is_some() {}
    }

    /// A type predicate starting at the current position.
    fn kind_ahead(&self) -> Option<(Kind, usize)> {
        let caps = KIND.captures(self.rest())?;
        let kind = Kind::from_name(caps.get(1)?.as_str())?;
        Some((kind, caps.get(0)?.len()))
    }

    /// A name following a dot, or the first name of a relative path.
    fn lex_dotted(&mut self) -> Result<(), JSONPathError> {
        if let Some((kind, len)) = self.kind_ahead() {
            self.skip(len);
            self.segments.push(Segment::Kind(kind));
            return Ok(());
        }

        let start = self.pos;
        loop {
            match self.peek() {
                EOQ | '.' | '[' | ']' | '~' | '^' => break,
                '@' if self.pos > start && self.kind_ahead().is_some() => break,
                _ => {
                    self.next();
                }
            }
        }

        let segment = match &self.path[start..self.pos] {
            "" => {
                return Err(JSONPathError::syntax(
                    format!("expected a name, found '{}'", self.peek()),
                    (start, start + 1),
                ))
            }
            "*" => Segment::Wildcard,
            "$" => Segment::Root,
            name => Segment::Name(name.to_owned()),
        };

        self.segments.push(segment);
        Ok(())
    }

    fn lex_bracketed(&mut self) -> Result<(), JSONPathError> {
        let open = self.pos;
        self.next(); // eat '['
        let content_start = self.pos;
        let mut closers = vec![']'];

        loop {
            let at = self.pos;
            match self.next() {
                None => {
                    return Err(JSONPathError::syntax(
                        format!("expected '{}'", closers.last().copied().unwrap_or(']')),
                        (open, self.path.len()),
                    ))
                }
                Some(quote @ ('\'' | '"')) => self.skip_quoted(quote, at)?,
                Some('[') => closers.push(']'),
                Some('(') => closers.push(')'),
                Some('{') => closers.push('}'),
                Some(ch @ (']' | ')' | '}')) => match closers.pop() {
                    Some(expected) if expected == ch => {
                        if closers.is_empty() {
                            break;
                        }
                    }
                    Some(expected) => {
                        return Err(JSONPathError::syntax(
                            format!("expected '{expected}'"),
                            (at, at + 1),
                        ))
                    }
                    None => {
                        return Err(JSONPathError::syntax(
                            format!("unexpected '{ch}'"),
                            (at, at + 1),
                        ))
                    }
                },
                Some(_) => (),
            }
        }

        let content = &self.path[content_start..self.pos - 1];
        let segment = bracketed_segment(content, content_start)?;
        self.segments.push(segment);
        Ok(())
    }

    fn skip_quoted(&mut self, quote: char, start: usize) -> Result<(), JSONPathError> {
        loop {
            match self.next() {
                None => {
                    return Err(JSONPathError::syntax(
                        format!("expected '{quote}'"),
                        (start, self.path.len()),
                    ))
                }
                Some('\\') => {
                    self.next();
                }
                Some(ch) if ch == quote => return Ok(()),
                Some(_) => (),
            }
        }
    }
}

/// Compile the contents of a pair of square brackets. `offset` is the byte
/// position of `content` in the path.
fn bracketed_segment(content: &str, offset: usize) -> Result<Segment, JSONPathError> {
    let alternatives = split_top_level(content);

    if alternatives.len() == 1 {
        return bracketed_item(content, offset);
    }

    alternatives
        .into_iter()
        .map(|(start, item)| bracketed_item(item, offset + start))
        .collect::<Result<Vec<_>, _>>()
        .map(Segment::Union)
}

fn bracketed_item(item: &str, offset: usize) -> Result<Segment, JSONPathError> {
    let offset = offset + (item.len() - item.trim_start().len());
    let item = item.trim();
    let span = (offset, offset + item.len());

    if item.is_empty() {
        return Err(JSONPathError::syntax(
            String::from("empty bracketed segment"),
            span,
        ));
    }

    if let Some(source) = item.strip_prefix("?(") {
        let source = source.strip_suffix(')').ok_or_else(|| {
            JSONPathError::syntax(String::from("expected ')'"), (span.1, span.1))
        })?;
        return Ok(Segment::Filter {
            expression: script::parse(source, offset + 2)?,
            source: source.to_owned(),
            span,
        });
    }

    if let Some(source) = item.strip_prefix('(') {
        let source = source.strip_suffix(')').ok_or_else(|| {
            JSONPathError::syntax(String::from("expected ')'"), (span.1, span.1))
        })?;
        return Ok(Segment::Dynamic {
            expression: script::parse(source, offset + 1)?,
            source: source.to_owned(),
            span,
        });
    }

    if let Some(name) = unquote(item) {
        return Ok(Segment::Name(name));
    }

    if item == "*" {
        return Ok(Segment::Wildcard);
    }

    if let Some(caps) = SLICE.captures(item) {
        let bound = |i: usize| -> Result<Option<i64>, JSONPathError> {
            match caps.get(i).map(|m| m.as_str()) {
                None | Some("") => Ok(None),
                Some(s) => s.parse::<i64>().map(Some).map_err(|_| {
                    JSONPathError::syntax(format!("invalid slice bound '{s}'"), span)
                }),
            }
        };

        let step = bound(3)?;
        if matches!(step, Some(s) if s < 0) {
            return Err(JSONPathError::syntax(
                String::from("slice step must not be negative"),
                span,
            ));
        }

        return Ok(Segment::Slice {
            start: bound(1)?,
            end: bound(2)?,
            step,
        });
    }

    Ok(Segment::Name(item.to_owned()))
}

/// Strip matching quotes and resolve backslash escapes.
fn unquote(item: &str) -> Option<String> {
    let quote = item.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    let inner = item.strip_prefix(quote)?.strip_suffix(quote)?;

    let mut rv = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    rv.push(escaped);
                }
            }
            c => rv.push(c),
        }
    }
    Some(rv)
}

/// Split on commas that are not inside quotes, parentheses or brackets.
/// Returns each piece with its byte offset.
fn split_top_level(content: &str) -> Vec<(usize, &str)> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;

    for (i, ch) in content.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }

        match ch {
            '\'' | '"' => quote = Some(ch),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push((start, &content[start..i]));
                start = i + 1;
            }
            _ => (),
        }
    }

    parts.push((start, &content[start..]));
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(n: &str) -> Segment {
        Segment::Name(String::from(n))
    }

    fn compiled(expr: &str) -> Vec<Segment> {
        compile(expr).unwrap().to_vec()
    }

    #[test]
    fn dotted_names() {
        assert_eq!(
            compiled("$.store.book[0].title"),
            vec![name("store"), name("book"), name("0"), name("title")]
        );
    }

    #[test]
    fn root_alone() {
        assert_eq!(compiled("$"), vec![Segment::Root]);
    }

    #[test]
    fn relative_path() {
        assert_eq!(compiled("store.book"), vec![name("store"), name("book")]);
    }

    #[test]
    fn recursive_descent() {
        assert_eq!(
            compiled("$..author"),
            vec![Segment::Descendant, name("author")]
        );
        assert_eq!(compiled("$..*"), vec![Segment::Descendant, Segment::Wildcard]);
        assert_eq!(compiled("$...a"), vec![Segment::Descendant, name("a")]);
    }

    #[test]
    fn quoted_names_keep_separators() {
        assert_eq!(
            compiled("$['a.b'][\"c~d\"]['e^f']"),
            vec![name("a.b"), name("c~d"), name("e^f")]
        );
    }

    #[test]
    fn quoted_names_with_escapes() {
        assert_eq!(compiled(r"$['it\'s']"), vec![name("it's")]);
    }

    #[test]
    fn quoted_star_is_a_name() {
        assert_eq!(compiled("$['*']"), vec![name("*")]);
        assert_eq!(compiled("$[*]"), vec![Segment::Wildcard]);
        assert_eq!(compiled("$.*"), vec![Segment::Wildcard]);
    }

    #[test]
    fn slices() {
        assert_eq!(
            compiled("$[1:3]"),
            vec![Segment::Slice {
                start: Some(1),
                end: Some(3),
                step: None
            }]
        );
        assert_eq!(
            compiled("$[-2:]"),
            vec![Segment::Slice {
                start: Some(-2),
                end: None,
                step: None
            }]
        );
        assert_eq!(
            compiled("$[::2]"),
            vec![Segment::Slice {
                start: None,
                end: None,
                step: Some(2)
            }]
        );
    }

    #[test]
    fn negative_slice_step() {
        let err = compile("$[::-1]").unwrap_err();
        assert_eq!(err.msg, "slice step must not be negative");
    }

    #[test]
    fn unions() {
        assert_eq!(
            compiled("$[0, 1]"),
            vec![Segment::Union(vec![name("0"), name("1")])]
        );
        assert_eq!(
            compiled("$['a','b,c']"),
            vec![Segment::Union(vec![name("a"), name("b,c")])]
        );
    }

    #[test]
    fn parent_markers() {
        assert_eq!(
            compiled("$.a.b^^"),
            vec![name("a"), name("b"), Segment::Parent, Segment::Parent]
        );
    }

    #[test]
    fn property_name_request() {
        assert_eq!(
            compiled("$.a.*~"),
            vec![name("a"), Segment::Wildcard, Segment::PropertyName]
        );
    }

    #[test]
    fn type_predicates() {
        assert_eq!(
            compiled("$..*@string()"),
            vec![
                Segment::Descendant,
                Segment::Wildcard,
                Segment::Kind(Kind::String)
            ]
        );
        assert_eq!(
            compiled("$.a.@number()"),
            vec![name("a"), Segment::Kind(Kind::Number)]
        );
        assert_eq!(compiled("$.a@b()"), vec![name("a@b()")]);
    }

    #[test]
    fn mid_path_root() {
        assert_eq!(compiled("$.a.$"), vec![name("a"), Segment::Root]);
    }

    #[test]
    fn filters_and_dynamic_keys() {
        match compiled("$.book[?(@.price < 10)]").as_slice() {
            [Segment::Name(n), Segment::Filter { source, span, .. }] => {
                assert_eq!(n, "book");
                assert_eq!(source, "@.price < 10");
                assert_eq!(*span, (7, 22));
            }
            other => panic!("unexpected segments {other:?}"),
        }

        match compiled("$.book[(@.length-1)]").as_slice() {
            [_, Segment::Dynamic { source, .. }] => assert_eq!(source, "@.length-1"),
            other => panic!("unexpected segments {other:?}"),
        }
    }

    #[test]
    fn filter_containing_brackets_and_quotes() {
        match compiled("$[?(@['a]'] == ']')]").as_slice() {
            [Segment::Filter { source, .. }] => assert_eq!(source, "@['a]'] == ']'"),
            other => panic!("unexpected segments {other:?}"),
        }
    }

    #[test]
    fn compile_is_cached() {
        let a = compile("$.cached..path[0]").unwrap();
        let b = compile("$.cached..path[0]").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn unclosed_bracket() {
        let err = compile("$['a'").unwrap_err();
        assert_eq!(err.msg, "expected ']'");
    }

    #[test]
    fn mismatched_delimiters() {
        assert_eq!(compile("$[?(@.a]").unwrap_err().msg, "expected ')'");
        assert_eq!(compile("$[{]").unwrap_err().msg, "expected '}'");
        assert_eq!(compile("$[(@.a}]").unwrap_err().msg, "expected ')'");
    }

    #[test]
    fn unclosed_quote() {
        assert_eq!(compile("$['abc]").unwrap_err().msg, "expected '''");
    }

    #[test]
    fn unexpected_closing_bracket() {
        assert_eq!(compile("$.a]").unwrap_err().msg, "unexpected ']'");
    }

    #[test]
    fn trailing_dot() {
        assert!(compile("$.a.").is_err());
    }

    #[test]
    fn empty_path() {
        assert!(compile("").is_err());
        assert!(compile("$[]").is_err());
    }

    #[test]
    fn bad_filter_expression() {
        assert!(compile("$[?(@.a = 1)]").is_err());
    }
}
