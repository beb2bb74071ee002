//! Minimal CSS selector engine for the in-memory page.
//!
//! Supports what the exerciser's default selectors use: selector lists,
//! type and universal selectors, `.class`, `#id`, attribute selectors
//! (`[a]`, `[a=v]`, `[a*=v]`, `[a^=v]`, `[a$=v]`, `[a~=v]`) and
//! `:not(<compound>)`. Combinators are rejected.

use std::collections::BTreeMap;

use super::types::{PageError, PageResult};

#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList {
    compounds: Vec<Compound>,
}

#[derive(Debug, Clone, PartialEq)]
struct Compound {
    tag: Option<String>,
    conditions: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Class(String),
    Id(String),
    Attr { name: String, test: Option<(AttrOp, String)> },
    Not(Box<Compound>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum AttrOp {
    Equals,
    Contains,
    Prefix,
    Suffix,
    Word,
}

impl SelectorList {
    pub fn parse(selector: &str) -> PageResult<Self> {
        Parser::new(selector).parse_list()
    }

    /// Whether an element with this tag and these attributes matches any selector in the list
    pub fn matches(&self, tag: &str, attributes: &BTreeMap<String, String>) -> bool {
        self.compounds.iter().any(|c| c.matches(tag, attributes))
    }
}

impl Compound {
    fn matches(&self, tag: &str, attributes: &BTreeMap<String, String>) -> bool {
        if let Some(expected) = &self.tag {
            if !expected.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        self.conditions.iter().all(|c| c.matches(tag, attributes))
    }
}

impl Condition {
    fn matches(&self, tag: &str, attributes: &BTreeMap<String, String>) -> bool {
        match self {
            Condition::Class(class) => attributes
                .get("class")
                .is_some_and(|v| v.split_whitespace().any(|token| token == class)),
            Condition::Id(id) => attributes.get("id").is_some_and(|v| v == id),
            Condition::Attr { name, test: None } => attributes.contains_key(name),
            Condition::Attr { name, test: Some((op, expected)) } => match attributes.get(name) {
                Some(actual) => op.test(actual, expected),
                None => false,
            },
            Condition::Not(inner) => !inner.matches(tag, attributes),
        }
    }
}

impl AttrOp {
    fn test(self, actual: &str, expected: &str) -> bool {
        match self {
            AttrOp::Equals => actual == expected,
            // substring operators never match an empty needle
            AttrOp::Contains => !expected.is_empty() && actual.contains(expected),
            AttrOp::Prefix => !expected.is_empty() && actual.starts_with(expected),
            AttrOp::Suffix => !expected.is_empty() && actual.ends_with(expected),
            AttrOp::Word => actual.split_whitespace().any(|w| w == expected),
        }
    }
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> PageError {
        PageError::Selector {
            selector: self.source.to_string(),
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn eat(&mut self, expected: char) -> PageResult<()> {
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(self.error(format!("expected '{}', found '{}'", expected, c))),
            None => Err(self.error(format!("expected '{}', found end of input", expected))),
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn parse_list(&mut self) -> PageResult<SelectorList> {
        let mut compounds = Vec::new();
        loop {
            self.skip_ws();
            compounds.push(self.parse_compound()?);
            self.skip_ws();
            match self.bump() {
                None => break,
                Some(',') => continue,
                Some(c) => {
                    return Err(self.error(format!("combinators are not supported (found '{}')", c)));
                }
            }
        }
        Ok(SelectorList { compounds })
    }

    fn parse_compound(&mut self) -> PageResult<Compound> {
        let start = self.pos;
        let mut tag = None;

        match self.peek() {
            Some('*') => {
                self.bump();
            }
            Some(c) if is_ident_char(c) => tag = Some(self.ident()?.to_ascii_lowercase()),
            _ => {}
        }

        let mut conditions = Vec::new();
        loop {
            match self.peek() {
                Some('.') => {
                    self.bump();
                    conditions.push(Condition::Class(self.ident()?));
                }
                Some('#') => {
                    self.bump();
                    conditions.push(Condition::Id(self.ident()?));
                }
                Some('[') => conditions.push(self.attribute()?),
                Some(':') => conditions.push(self.pseudo()?),
                _ => break,
            }
        }

        if self.pos == start {
            return Err(self.error("expected a selector"));
        }
        Ok(Compound { tag, conditions })
    }

    fn attribute(&mut self) -> PageResult<Condition> {
        self.eat('[')?;
        self.skip_ws();
        let name = self.ident()?.to_ascii_lowercase();
        self.skip_ws();

        if self.peek() == Some(']') {
            self.bump();
            return Ok(Condition::Attr { name, test: None });
        }

        let op = match self.bump() {
            Some('=') => AttrOp::Equals,
            Some(c @ ('*' | '^' | '$' | '~')) => {
                self.eat('=')?;
                match c {
                    '*' => AttrOp::Contains,
                    '^' => AttrOp::Prefix,
                    '$' => AttrOp::Suffix,
                    _ => AttrOp::Word,
                }
            }
            Some(c) => return Err(self.error(format!("unsupported attribute operator '{}'", c))),
            None => return Err(self.error("unterminated attribute selector")),
        };

        self.skip_ws();
        let value = match self.peek() {
            Some(q @ ('"' | '\'')) => {
                self.bump();
                let mut value = String::new();
                loop {
                    match self.bump() {
                        Some(c) if c == q => break,
                        Some(c) => value.push(c),
                        None => return Err(self.error("unterminated string")),
                    }
                }
                value
            }
            _ => self.ident()?,
        };
        self.skip_ws();
        self.eat(']')?;

        Ok(Condition::Attr {
            name,
            test: Some((op, value)),
        })
    }

    fn pseudo(&mut self) -> PageResult<Condition> {
        self.eat(':')?;
        let name = self.ident()?;
        if !name.eq_ignore_ascii_case("not") {
            return Err(self.error(format!("unsupported pseudo-class ':{}'", name)));
        }
        self.eat('(')?;
        self.skip_ws();
        let inner = self.parse_compound()?;
        self.skip_ws();
        self.eat(')')?;
        Ok(Condition::Not(Box::new(inner)))
    }

    fn ident(&mut self) -> PageResult<String> {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if !is_ident_char(c) {
                break;
            }
            out.push(c);
            self.pos += 1;
        }
        if out.is_empty() {
            Err(self.error("expected an identifier"))
        } else {
            Ok(out)
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}
