//! Boolean keyword queries.
//!
//! A query is a flat run of terms joined by the whole-word operators `AND`,
//! `OR` and `NOT` (any case). There is no precedence and there are no
//! parentheses: operators apply strictly left to right, each one combining
//! everything to its left with the single term to its right. So
//! `a OR b AND NOT c` means `((a OR b) AND NOT c)`, which is not what standard
//! boolean precedence would give. `NOT` between two terms means `AND NOT`; a
//! query may also start with `NOT term`.
//!
//! A term matches when it appears, case-insensitively, as a substring of the
//! searched text. Double quotes are decoration only.

use std::fmt;

use tracing::{debug, warn};

use crate::error::QueryCompileError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    And,
    Or,
    Not,
}

impl Operator {
    fn from_word(word: &str) -> Option<Self> {
        if word.eq_ignore_ascii_case("and") {
            Some(Operator::And)
        } else if word.eq_ignore_ascii_case("or") {
            Some(Operator::Or)
        } else if word.eq_ignore_ascii_case("not") {
            Some(Operator::Not)
        } else {
            None
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::Not => "NOT",
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    Op(Operator),
    Term(&'a str),
}

/// Splits on whitespace-delimited operator words. Consecutive non-operator
/// words form a single term, sliced from the query text so inner spacing
/// survives.
fn tokenize(query: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut term_span: Option<(usize, usize)> = None;

    for (start, word) in words(query) {
        match Operator::from_word(word) {
            Some(op) => {
                if let Some((s, e)) = term_span.take() {
                    tokens.push(Token::Term(&query[s..e]));
                }
                tokens.push(Token::Op(op));
            }
            None => {
                let end = start + word.len();
                term_span = Some(match term_span {
                    Some((s, _)) => (s, end),
                    None => (start, end),
                });
            }
        }
    }
    if let Some((s, e)) = term_span {
        tokens.push(Token::Term(&query[s..e]));
    }
    tokens
}

fn words(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.split_whitespace().map(move |word| {
        // split_whitespace yields subslices of `text`, so the offset is exact
        let start = word.as_ptr() as usize - text.as_ptr() as usize;
        (start, word)
    })
}

fn clean_term(raw: &str) -> String {
    let unquoted: String = raw
        .chars()
        .filter(|c| !matches!(c, '"' | '\u{201C}' | '\u{201D}'))
        .collect();
    unquoted
        .trim()
        .trim_matches(|c| matches!(c, '\'' | '\u{2018}' | '\u{2019}'))
        .trim()
        .to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Clause {
    // already lowercased
    needle: String,
    negated: bool,
}

impl Clause {
    fn eval(&self, haystack: &str) -> bool {
        haystack.contains(self.needle.as_str()) != self.negated
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Connective {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Body {
    Never,
    Chain {
        head: Clause,
        rest: Vec<(Connective, Clause)>,
    },
}

/// A compiled query. Immutable and cheap to share across tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryExpression {
    source: String,
    body: Body,
}

impl QueryExpression {
    /// Compiles `query`, failing on malformed input.
    pub fn parse(query: &str) -> Result<Self, QueryCompileError> {
        let tokens = tokenize(query);
        if tokens.is_empty() {
            return Err(QueryCompileError::Empty);
        }

        let mut iter = tokens.into_iter().enumerate().peekable();

        let head = match iter.next() {
            Some((_, Token::Op(Operator::Not))) => match iter.next() {
                Some((pos, Token::Term(raw))) => clause(raw, pos, true)?,
                _ => return Err(dangling(Operator::Not, 0)),
            },
            Some((pos, Token::Op(op))) => return Err(dangling(op, pos)),
            Some((pos, Token::Term(raw))) => clause(raw, pos, false)?,
            None => return Err(QueryCompileError::Empty),
        };

        let mut rest = Vec::new();
        // tokenize merges adjacent words into one term, so every term is
        // followed by an operator or the end of input
        while let Some((op_pos, Token::Op(op))) = iter.next() {

            let (connective, mut negated) = match op {
                Operator::And => (Connective::And, false),
                Operator::Or => (Connective::Or, false),
                Operator::Not => (Connective::And, true),
            };
            if op != Operator::Not {
                if let Some((_, Token::Op(Operator::Not))) = iter.peek() {
                    iter.next();
                    negated = true;
                }
            }

            match iter.next() {
                Some((pos, Token::Term(raw))) => rest.push((connective, clause(raw, pos, negated)?)),
                _ => return Err(dangling(op, op_pos)),
            }
        }

        Ok(Self {
            source: query.to_string(),
            body: Body::Chain { head, rest },
        })
    }

    /// Compiles `query`, degrading a malformed one to an expression that
    /// never matches. The error is returned so the caller can report it.
    pub fn compile(query: &str) -> (Self, Option<QueryCompileError>) {
        match Self::parse(query) {
            Ok(expr) => {
                debug!("Compiled query: {}", expr);
                (expr, None)
            }
            Err(e) => {
                warn!("Query {:?} did not compile ({}); it will match nothing", query, e);
                (Self::never(query), Some(e))
            }
        }
    }

    pub fn never(query: &str) -> Self {
        Self {
            source: query.to_string(),
            body: Body::Never,
        }
    }

    /// The query text this expression was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_never(&self) -> bool {
        self.body == Body::Never
    }

    pub fn matches(&self, text: &str) -> bool {
        self.matches_lowercase(&text.to_lowercase())
    }

    /// Same as [`matches`](Self::matches) for text the caller already lowercased.
    pub fn matches_lowercase(&self, haystack: &str) -> bool {
        match &self.body {
            Body::Never => false,
            Body::Chain { head, rest } => rest.iter().fold(head.eval(haystack), |acc, (conn, clause)| match conn {
                Connective::And => acc && clause.eval(haystack),
                Connective::Or => acc || clause.eval(haystack),
            }),
        }
    }
}

fn clause(raw: &str, position: usize, negated: bool) -> Result<Clause, QueryCompileError> {
    let needle = clean_term(raw);
    if needle.is_empty() {
        return Err(QueryCompileError::EmptyTerm { position });
    }
    Ok(Clause { needle, negated })
}

fn dangling(op: Operator, position: usize) -> QueryCompileError {
    QueryCompileError::DanglingOperator {
        operator: op.as_str().to_string(),
        position,
    }
}

/// Renders the evaluation order explicitly, e.g. `(("a" OR "b") AND NOT "c")`.
impl fmt::Display for QueryExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_clause(f: &mut fmt::Formatter<'_>, clause: &Clause) -> fmt::Result {
            if clause.negated {
                write!(f, "NOT ")?;
            }
            write!(f, "{:?}", clause.needle)
        }

        match &self.body {
            Body::Never => write!(f, "<never>"),
            Body::Chain { head, rest } => {
                for _ in rest {
                    write!(f, "(")?;
                }
                write_clause(f, head)?;
                for (conn, clause) in rest {
                    match conn {
                        Connective::And => write!(f, " AND ")?,
                        Connective::Or => write!(f, " OR ")?,
                    }
                    write_clause(f, clause)?;
                    write!(f, ")")?;
                }
                Ok(())
            }
        }
    }
}
