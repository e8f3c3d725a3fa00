//! Name tests of an XPath 1.0 expression.
//!
//! XPath 1.0 has no default element namespace: an unprefixed name test only
//! matches elements in no namespace. Templates written against a default
//! namespace expect `item` to match their own `item` elements, so before
//! evaluation the unprefixed element name tests are qualified with a prefix
//! bound to that namespace. Finding them takes the lexical disambiguation
//! rules of XPath 1.0 (section 3.7) and nothing else; parsing and evaluation
//! stay with sxd-xpath.

/// The node kind a name test selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Principal {
    Element,
    Attribute,
    Namespace,
}

/// A name test found in an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NameTest<'a> {
    /// Byte offset of the test.
    pub offset: usize,
    pub prefix: Option<&'a str>,
    /// Local name, or `*`.
    pub local: &'a str,
    pub principal: Principal,
}

impl NameTest<'_> {
    /// Whether the test only matches no-namespace elements under XPath 1.0.
    pub fn is_unprefixed_element_name(&self) -> bool {
        self.prefix.is_none() && self.local != "*" && self.principal == Principal::Element
    }
}

const OPERATOR_NAMES: &[&str] = &["and", "or", "div", "mod"];

/// Every name test of `expression`, in source order.
///
/// Unterminated literals and other malformed input are skipped over; the
/// XPath parser reports them.
pub(crate) fn name_tests(expression: &str) -> Vec<NameTest<'_>> {
    let mut tests = Vec::new();
    let mut scanner = Scanner::new(expression);
    // Whether the previous token lets a name or `*` start a step.
    let mut operand = true;
    let mut principal = Principal::Element;

    while let Some(c) = scanner.peek() {
        let start = scanner.position;
        match c {
            c if c.is_whitespace() => scanner.bump(),
            '\'' | '"' => {
                scanner.skip_literal(c);
                operand = false;
            }
            '0'..='9' => {
                scanner.skip_number();
                operand = false;
            }
            '.' => {
                if scanner.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
                    scanner.skip_number();
                } else {
                    scanner.skip_while(|c| c == '.');
                }
                operand = false;
            }
            '(' | '[' | ',' => {
                scanner.bump();
                operand = true;
            }
            ')' | ']' => {
                scanner.bump();
                operand = false;
            }
            '@' => {
                scanner.bump();
                operand = true;
                principal = Principal::Attribute;
            }
            '$' => {
                scanner.bump();
                scanner.skip_qname();
                operand = false;
            }
            '*' => {
                scanner.bump();
                if operand {
                    tests.push(NameTest {
                        offset: start,
                        prefix: None,
                        local: "*",
                        principal,
                    });
                    principal = Principal::Element;
                }
                operand = !operand;
            }
            c if is_name_start(c) => {
                let name = scanner.take_ncname();
                if !operand && OPERATOR_NAMES.contains(&name) {
                    operand = true;
                    continue;
                }
                let qualified = scanner.peek() == Some(':')
                    && scanner
                        .peek_at(1)
                        .is_some_and(|c| is_name_start(c) || c == '*');
                let (prefix, local) = if qualified {
                    scanner.bump();
                    if scanner.peek() == Some('*') {
                        scanner.bump();
                        (Some(name), "*")
                    } else {
                        (Some(name), scanner.take_ncname())
                    }
                } else {
                    (None, name)
                };

                match scanner.next_significant() {
                    // function name or node type test
                    (Some('('), _) => {
                        principal = Principal::Element;
                        operand = false;
                    }
                    (Some(':'), Some(':')) => {
                        principal = match local {
                            "attribute" => Principal::Attribute,
                            "namespace" => Principal::Namespace,
                            _ => Principal::Element,
                        };
                        operand = true;
                    }
                    _ => {
                        tests.push(NameTest {
                            offset: start,
                            prefix,
                            local,
                            principal,
                        });
                        principal = Principal::Element;
                        operand = false;
                    }
                }
            }
            // `::`, `/`, `//`, `|` and the other operators
            _ => {
                scanner.bump();
                operand = true;
            }
        }
    }
    tests
}

/// Prefix every unprefixed element name test of `expression` with `prefix`.
pub(crate) fn qualify_element_names(expression: &str, prefix: &str) -> String {
    let mut qualified = String::with_capacity(expression.len() + 16);
    let mut copied = 0;
    for test in name_tests(expression) {
        if test.is_unprefixed_element_name() {
            qualified.push_str(&expression[copied..test.offset]);
            qualified.push_str(prefix);
            qualified.push(':');
            copied = test.offset;
        }
    }
    qualified.push_str(&expression[copied..]);
    qualified
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '\u{b7}')
}

struct Scanner<'a> {
    source: &'a str,
    position: usize,
}

impl<'a> Scanner<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            position: 0,
        }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.position..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.position += c.len_utf8();
        }
    }

    fn skip_while(&mut self, matches: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&matches) {
            self.bump();
        }
    }

    fn take_ncname(&mut self) -> &'a str {
        let start = self.position;
        self.skip_while(is_name_char);
        &self.source[start..self.position]
    }

    fn skip_qname(&mut self) {
        self.take_ncname();
        if self.peek() == Some(':') && self.peek_at(1).is_some_and(is_name_start) {
            self.bump();
            self.take_ncname();
        }
    }

    fn skip_literal(&mut self, quote: char) {
        self.bump();
        self.skip_while(|c| c != quote);
        self.bump();
    }

    fn skip_number(&mut self) {
        self.skip_while(|c| c.is_ascii_digit() || c == '.');
    }

    /// The next two characters after any whitespace.
    fn next_significant(&self) -> (Option<char>, Option<char>) {
        let mut chars = self.rest().chars().skip_while(|c| c.is_whitespace());
        (chars.next(), chars.next())
    }
}
