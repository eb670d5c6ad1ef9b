use rulex_model::{Comparator, LabelMatcher, Labels, MatchOp};

use crate::{
    ast::{
        Aggregation, AggregationOp, BinaryOperation, BinaryOperator, Expr, FunctionCall, GroupSide,
        Grouping, InstantSelector, MatchingKind, RangeSelector, StringLiteral,
        UnaryOperation, UnaryOperator, VectorMatching,
    },
    error::{QueryError, QueryResult},
    lexer::{Token, TokenKind, tokenize},
};

/// Parse query text into an [`Expr`].
///
/// Empty or whitespace-only input is rejected with [`QueryError::Empty`].
///
/// # Examples
/// ```rust
/// use rulex_query::{Expr, parse};
///
/// let Expr::Binary(op) = parse("sum(rate(http_requests_total[5m])) > 10").unwrap() else {
///     panic!("expected a comparison");
/// };
/// assert!(op.operator.as_comparator().is_some());
/// assert!(matches!(*op.left_hand, Expr::Aggregation(_)));
/// ```
pub fn parse(source: &str) -> QueryResult<Expr> {
    if source.trim().is_empty() {
        return Err(QueryError::Empty);
    }

    let mut parser = Parser {
        tokens: tokenize(source)?,
        cursor: 0,
        depth: 0,
    };
    let expr = parser.expr(0)?;
    parser.expect(|k| matches!(k, TokenKind::Eof), "end of input")?;
    Ok(expr)
}

/// Nesting bound for parentheses, unary signs, call arguments and
/// right-associative chains. Keeps recursion well inside a thread's stack.
pub const MAX_NESTING: usize = 64;

struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        // `tokenize` always terminates the stream with Eof.
        &self.tokens[self.cursor.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.cursor < self.tokens.len() - 1 {
            self.cursor += 1;
        }
        token
    }

    fn unexpected<T>(&self, expected: &'static str) -> QueryResult<T> {
        let token = self.peek();
        Err(QueryError::UnexpectedToken {
            pos: token.pos,
            found: token.kind.to_string(),
            expected,
        })
    }

    fn expect(
        &mut self,
        accept: impl Fn(&TokenKind) -> bool,
        expected: &'static str,
    ) -> QueryResult<Token> {
        if accept(self.peek_kind()) {
            Ok(self.advance())
        } else {
            self.unexpected(expected)
        }
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek_kind() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek_kind(), TokenKind::Ident(s) if s.eq_ignore_ascii_case(keyword))
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.at_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn kind_at(&self, offset: usize) -> &TokenKind {
        let idx = (self.cursor + offset).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    /// Every recursive descent passes through here, so this is where nesting
    /// is bounded.
    fn expr(&mut self, min_precedence: u8) -> QueryResult<Expr> {
        if self.depth >= MAX_NESTING {
            return Err(QueryError::TooDeep {
                pos: self.peek().pos,
                limit: MAX_NESTING,
            });
        }
        self.depth += 1;
        let expr = self.climb(min_precedence);
        self.depth -= 1;
        expr
    }

    /// Precedence climbing over binary operators.
    fn climb(&mut self, min_precedence: u8) -> QueryResult<Expr> {
        let mut lhs = self.unary()?;

        while let Some(operator) = self.binary_operator() {
            let precedence = operator.precedence();
            if precedence < min_precedence {
                break;
            }
            self.advance();

            let return_bool = operator.as_comparator().is_some() && self.eat_keyword("bool");
            let matching = self.vector_matching()?;
            let next_min = if operator.is_right_associative() {
                precedence
            } else {
                precedence + 1
            };
            let rhs = self.expr(next_min)?;

            lhs = Expr::Binary(BinaryOperation {
                operator,
                left_hand: Box::new(lhs),
                right_hand: Box::new(rhs),
                return_bool,
                matching,
            });
        }

        Ok(lhs)
    }

    fn binary_operator(&self) -> Option<BinaryOperator> {
        let op = match self.peek_kind() {
            TokenKind::Add => BinaryOperator::Add,
            TokenKind::Sub => BinaryOperator::Sub,
            TokenKind::Mul => BinaryOperator::Mul,
            TokenKind::Div => BinaryOperator::Div,
            TokenKind::Mod => BinaryOperator::Mod,
            TokenKind::Pow => BinaryOperator::Pow,
            TokenKind::EqlEql => BinaryOperator::Compare(Comparator::Eq),
            TokenKind::Neq => BinaryOperator::Compare(Comparator::Ne),
            TokenKind::Gtr => BinaryOperator::Compare(Comparator::Gt),
            TokenKind::Lss => BinaryOperator::Compare(Comparator::Lt),
            TokenKind::Gte => BinaryOperator::Compare(Comparator::Ge),
            TokenKind::Lte => BinaryOperator::Compare(Comparator::Le),
            TokenKind::Ident(s) => match s.to_ascii_lowercase().as_str() {
                "and" => BinaryOperator::And,
                "or" => BinaryOperator::Or,
                "unless" => BinaryOperator::Unless,
                "atan2" => BinaryOperator::Atan2,
                _ => return None,
            },
            _ => return None,
        };
        Some(op)
    }

    fn vector_matching(&mut self) -> QueryResult<Option<VectorMatching>> {
        let kind = if self.eat_keyword("on") {
            MatchingKind::On
        } else if self.eat_keyword("ignoring") {
            MatchingKind::Ignoring
        } else {
            return Ok(None);
        };
        let labels = self.label_list()?;

        let side = if self.eat_keyword("group_left") {
            Some(GroupSide::Left)
        } else if self.eat_keyword("group_right") {
            Some(GroupSide::Right)
        } else {
            None
        };
        let group = match side {
            Some(side) if matches!(self.peek_kind(), TokenKind::LParen) => {
                Some((side, self.label_list()?))
            }
            Some(side) => Some((side, Vec::new())),
            None => None,
        };

        Ok(Some(VectorMatching {
            kind,
            labels,
            group,
        }))
    }

    /// `-x` binds looser than `^` and tighter than everything else.
    fn unary(&mut self) -> QueryResult<Expr> {
        let operator = match self.peek_kind() {
            TokenKind::Sub => UnaryOperator::Minus,
            TokenKind::Add => UnaryOperator::Plus,
            _ => return self.postfix(),
        };
        self.advance();

        let operand = self.expr(BinaryOperator::Pow.precedence())?;
        Ok(match (operator, operand) {
            (UnaryOperator::Minus, Expr::Scalar(s)) => Expr::scalar(-s.value),
            (UnaryOperator::Plus, Expr::Scalar(s)) => Expr::Scalar(s),
            (operator, operand) => Expr::Unary(UnaryOperation {
                operator,
                expr: Box::new(operand),
            }),
        })
    }

    fn postfix(&mut self) -> QueryResult<Expr> {
        let mut expr = self.primary()?;

        loop {
            let pos = self.peek().pos;
            if self.eat(&TokenKind::LBracket) {
                let Expr::InstantSelector(selector) = expr else {
                    return Err(QueryError::InvalidModifier { pos });
                };
                if selector.offset.is_some() {
                    return Err(QueryError::InvalidModifier { pos });
                }
                let range = self.duration("range duration")?;
                self.expect(|k| matches!(k, TokenKind::RBracket), "\"]\"")?;
                expr = Expr::RangeSelector(RangeSelector {
                    selector,
                    range,
                    offset: None,
                });
            } else if self.eat_keyword("offset") {
                let offset = self.duration("offset duration")?;
                expr = match expr {
                    Expr::InstantSelector(mut s) if s.offset.is_none() => {
                        s.offset = Some(offset);
                        Expr::InstantSelector(s)
                    }
                    Expr::RangeSelector(mut r) if r.offset.is_none() => {
                        r.offset = Some(offset);
                        Expr::RangeSelector(r)
                    }
                    _ => return Err(QueryError::InvalidModifier { pos }),
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn duration(&mut self, expected: &'static str) -> QueryResult<String> {
        match self.peek_kind() {
            TokenKind::Duration(d) => {
                let d = d.clone();
                self.advance();
                Ok(d)
            }
            _ => self.unexpected(expected),
        }
    }

    fn primary(&mut self) -> QueryResult<Expr> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Number(value) => {
                self.advance();
                Ok(Expr::scalar(value))
            }
            TokenKind::Str(value) => {
                self.advance();
                Ok(Expr::StringLiteral(StringLiteral { value }))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.expr(0)?;
                self.expect(|k| matches!(k, TokenKind::RParen), "\")\"")?;
                Ok(Expr::Paren(Box::new(inner)))
            }
            TokenKind::LBrace => {
                let labels = self.label_matchers()?;
                if labels.is_empty() {
                    return Err(QueryError::EmptySelector { pos: token.pos });
                }
                Ok(Expr::InstantSelector(InstantSelector {
                    selector_name: None,
                    labels,
                    offset: None,
                }))
            }
            TokenKind::Ident(name) => self.identifier(name, token.pos),
            _ => self.unexpected("expression"),
        }
    }

    fn identifier(&mut self, name: String, pos: usize) -> QueryResult<Expr> {
        let next_is_paren = matches!(self.kind_at(1), TokenKind::LParen);
        let next_is_brace = matches!(self.kind_at(1), TokenKind::LBrace);
        let next_is_grouping = matches!(self.kind_at(1), TokenKind::Ident(k)
            if k.eq_ignore_ascii_case("by") || k.eq_ignore_ascii_case("without"));

        if let Some(op) = AggregationOp::from_ident(&name) {
            if next_is_paren || next_is_grouping {
                self.advance();
                return self.aggregation(op, pos);
            }
        }

        if next_is_paren {
            self.advance();
            let args = self.call_args()?;
            return Ok(Expr::Function(FunctionCall { name, args }));
        }

        if !next_is_brace {
            if name.eq_ignore_ascii_case("inf") {
                self.advance();
                return Ok(Expr::scalar(f64::INFINITY));
            }
            if name.eq_ignore_ascii_case("nan") {
                self.advance();
                return Ok(Expr::scalar(f64::NAN));
            }
        }

        self.advance();
        let labels = if next_is_brace {
            self.label_matchers()?
        } else {
            Labels::new()
        };
        Ok(Expr::InstantSelector(InstantSelector {
            selector_name: Some(name),
            labels,
            offset: None,
        }))
    }

    fn aggregation(&mut self, op: AggregationOp, pos: usize) -> QueryResult<Expr> {
        let mut grouping = self.grouping()?;
        let mut args = self.call_args()?;
        if grouping.is_none() {
            grouping = self.grouping()?;
        }

        let expected = if op.takes_param() { 2 } else { 1 };
        if args.len() != expected {
            return Err(QueryError::AggregationArity {
                pos,
                op: op.as_str(),
                expected,
                got: args.len(),
            });
        }

        let expr = Box::new(args.pop().unwrap_or_else(|| Expr::scalar(0.0)));
        let param = args.pop().map(Box::new);
        Ok(Expr::Aggregation(Aggregation {
            op,
            param,
            expr,
            grouping,
        }))
    }

    fn grouping(&mut self) -> QueryResult<Option<Grouping>> {
        if self.eat_keyword("by") {
            Ok(Some(Grouping::By(self.label_list()?)))
        } else if self.eat_keyword("without") {
            Ok(Some(Grouping::Without(self.label_list()?)))
        } else {
            Ok(None)
        }
    }

    /// `( expr, expr, ... )`
    fn call_args(&mut self) -> QueryResult<Vec<Expr>> {
        self.expect(|k| matches!(k, TokenKind::LParen), "\"(\"")?;
        let mut args = Vec::new();
        if self.eat(&TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.expr(0)?);
            if self.eat(&TokenKind::Comma) {
                continue;
            }
            self.expect(|k| matches!(k, TokenKind::RParen), "\",\" or \")\"")?;
            return Ok(args);
        }
    }

    /// `( name, name, ... )`, possibly empty, trailing comma allowed.
    fn label_list(&mut self) -> QueryResult<Vec<String>> {
        self.expect(|k| matches!(k, TokenKind::LParen), "\"(\"")?;
        let mut names = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::RParen => {
                    self.advance();
                    return Ok(names);
                }
                TokenKind::Ident(name) => {
                    names.push(name.clone());
                    self.advance();
                    if !self.eat(&TokenKind::Comma) {
                        self.expect(|k| matches!(k, TokenKind::RParen), "\",\" or \")\"")?;
                        return Ok(names);
                    }
                }
                _ => return self.unexpected("label name"),
            }
        }
    }

    /// `{ name op "value", ... }`, possibly empty, trailing comma allowed.
    fn label_matchers(&mut self) -> QueryResult<Labels> {
        self.expect(|k| matches!(k, TokenKind::LBrace), "\"{\"")?;
        let mut labels = Labels::new();
        loop {
            let token = self.advance();
            let name = match token.kind {
                TokenKind::RBrace => return Ok(labels),
                TokenKind::Ident(name) => name,
                _ => {
                    return Err(QueryError::UnexpectedToken {
                        pos: token.pos,
                        found: token.kind.to_string(),
                        expected: "label name",
                    });
                }
            };

            let op = match self.peek_kind() {
                TokenKind::Eql => MatchOp::Equal,
                TokenKind::Neq => MatchOp::NotEqual,
                TokenKind::EqlRegex => MatchOp::Regex,
                TokenKind::NeqRegex => MatchOp::NotRegex,
                _ => return self.unexpected("label match operator"),
            };
            self.advance();

            let value = match self.peek_kind() {
                TokenKind::Str(value) => value.clone(),
                _ => return self.unexpected("label value string"),
            };
            self.advance();

            if labels.contains(&name) {
                return Err(QueryError::DuplicateLabel {
                    pos: token.pos,
                    name,
                });
            }
            labels.insert_matcher(LabelMatcher::with_op(name, op, value));

            if !self.eat(&TokenKind::Comma) {
                self.expect(|k| matches!(k, TokenKind::RBrace), "\",\" or \"}\"")?;
                return Ok(labels);
            }
        }
    }
}
