// Expression parser - converts tokens to an expression tree

use super::lexer::Lexer;
use super::token::{Spanned, Token};
use crate::expression::{
    BinaryOperator, Expression, ExpressionError, ExpressionResult, UnaryOperator, Value,
};

pub struct Parser {
    tokens: Vec<Spanned>,
    position: usize,
    depth: usize,
    max_depth: usize,
}

impl Parser {
    /// Tokenize `source`; lexical errors surface here
    pub fn new(source: &str, max_depth: usize) -> ExpressionResult<Self> {
        let tokens = Lexer::new(source).tokenize()?;
        Ok(Parser {
            tokens,
            position: 0,
            depth: 0,
            max_depth,
        })
    }

    /// Parse a complete expression; trailing tokens are an error
    pub fn parse(&mut self) -> ExpressionResult<Expression> {
        if self.match_token(&Token::Eof) {
            return Err(self.error("empty expression"));
        }

        let expr = self.parse_expression()?;

        if !self.match_token(&Token::Eof) {
            return Err(self.error(&format!(
                "unexpected {} after end of expression",
                self.current_token().describe()
            )));
        }

        Ok(expr)
    }

    /// Account for one more level of the tree being built.
    ///
    /// Every chained operator nests the tree built so far one level deeper,
    /// so chains count against the limit the same way parentheses do.
    fn enter(&mut self) -> ExpressionResult<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(self.error(&format!(
                "expression nested deeper than {} levels",
                self.max_depth
            )));
        }
        Ok(())
    }

    fn parse_expression(&mut self) -> ExpressionResult<Expression> {
        self.enter()?;
        let expr = self.parse_or();
        self.depth -= 1;
        expr
    }

    /// Parse OR expression
    fn parse_or(&mut self) -> ExpressionResult<Expression> {
        let base = self.depth;
        let mut left = self.parse_and()?;

        while self.match_token(&Token::Or) {
            self.advance();
            self.enter()?;
            let right = self.parse_and()?;
            left = Expression::binary_op(BinaryOperator::Or, left, right);
        }

        self.depth = base;
        Ok(left)
    }

    /// Parse AND expression
    fn parse_and(&mut self) -> ExpressionResult<Expression> {
        let base = self.depth;
        let mut left = self.parse_comparison()?;

        while self.match_token(&Token::And) {
            self.advance();
            self.enter()?;
            let right = self.parse_comparison()?;
            left = Expression::binary_op(BinaryOperator::And, left, right);
        }

        self.depth = base;
        Ok(left)
    }

    /// Parse comparison expression (non-associative)
    fn parse_comparison(&mut self) -> ExpressionResult<Expression> {
        let left = self.parse_additive()?;

        let op = match self.current_token() {
            Token::Equal => BinaryOperator::Eq,
            Token::NotEqual => BinaryOperator::Ne,
            Token::Less => BinaryOperator::Lt,
            Token::Greater => BinaryOperator::Gt,
            Token::LessEqual => BinaryOperator::Le,
            Token::GreaterEqual => BinaryOperator::Ge,
            Token::RegexMatch => BinaryOperator::RegexMatch,
            Token::RegexNotMatch => BinaryOperator::RegexNotMatch,
            _ => return Ok(left),
        };
        self.advance();

        let right = self.parse_additive()?;
        Ok(Expression::binary_op(op, left, right))
    }

    /// Parse addition/subtraction expression
    fn parse_additive(&mut self) -> ExpressionResult<Expression> {
        let base = self.depth;
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current_token() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Sub,
                _ => break,
            };
            self.advance();
            self.enter()?;

            let right = self.parse_multiplicative()?;
            left = Expression::binary_op(op, left, right);
        }

        self.depth = base;
        Ok(left)
    }

    /// Parse multiplication/division/modulo expression
    fn parse_multiplicative(&mut self) -> ExpressionResult<Expression> {
        let base = self.depth;
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current_token() {
                Token::Star => BinaryOperator::Mul,
                Token::Slash => BinaryOperator::Div,
                Token::Percent => BinaryOperator::Mod,
                _ => break,
            };
            self.advance();
            self.enter()?;

            let right = self.parse_unary()?;
            left = Expression::binary_op(op, left, right);
        }

        self.depth = base;
        Ok(left)
    }

    /// Parse unary expression
    fn parse_unary(&mut self) -> ExpressionResult<Expression> {
        let op = match self.current_token() {
            Token::Bang => UnaryOperator::Not,
            Token::Minus => UnaryOperator::Minus,
            _ => return self.parse_primary(),
        };
        self.advance();

        self.enter()?;
        let operand = self.parse_unary();
        self.depth -= 1;

        Ok(Expression::unary_op(op, operand?))
    }

    /// Parse primary expression
    fn parse_primary(&mut self) -> ExpressionResult<Expression> {
        match self.current_token() {
            Token::Number(n) => {
                let literal = self.parse_number(&n)?;
                self.advance();
                Ok(Expression::literal(literal))
            }
            Token::String(s) => {
                self.advance();
                Ok(Expression::literal(s))
            }
            Token::True => {
                self.advance();
                Ok(Expression::literal(true))
            }
            Token::False => {
                self.advance();
                Ok(Expression::literal(false))
            }
            Token::Identifier(name) => {
                self.advance();

                // Check for function call
                if self.match_token(&Token::LeftParen) {
                    self.advance();
                    let args = if self.match_token(&Token::RightParen) {
                        vec![]
                    } else {
                        self.parse_expression_list()?
                    };
                    self.expect_token(Token::RightParen)?;
                    Ok(Expression::call(name, args))
                } else {
                    Ok(Expression::Identifier(name))
                }
            }
            Token::LeftParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect_token(Token::RightParen)?;
                Ok(expr)
            }
            other => Err(self.error(&format!("unexpected {}", other.describe()))),
        }
    }

    /// Integers stay integers; anything with a dot is a float
    fn parse_number(&self, n: &str) -> ExpressionResult<Value> {
        if n.contains('.') {
            n.parse::<f64>()
                .map(Value::Float)
                .map_err(|_| self.error(&format!("invalid number: {}", n)))
        } else {
            n.parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| self.error(&format!("integer literal out of range: {}", n)))
        }
    }

    /// Parse list of call arguments
    fn parse_expression_list(&mut self) -> ExpressionResult<Vec<Expression>> {
        let mut expressions = vec![];

        loop {
            expressions.push(self.parse_expression()?);
            if !self.match_token(&Token::Comma) {
                break;
            }
            self.advance();
        }

        Ok(expressions)
    }

    // Helper methods

    /// Get current token
    fn current_token(&self) -> Token {
        self.tokens
            .get(self.position)
            .map(|s| s.token.clone())
            .unwrap_or(Token::Eof)
    }

    /// Offset of the current token
    fn current_offset(&self) -> usize {
        self.tokens
            .get(self.position)
            .or_else(|| self.tokens.last())
            .map(|s| s.offset)
            .unwrap_or(0)
    }

    /// Advance to next token
    fn advance(&mut self) {
        if self.position + 1 < self.tokens.len() {
            self.position += 1;
        }
    }

    /// Check if current token matches
    fn match_token(&self, token: &Token) -> bool {
        self.tokens
            .get(self.position)
            .is_some_and(|s| s.token == *token)
    }

    /// Expect a specific token
    fn expect_token(&mut self, token: Token) -> ExpressionResult<()> {
        if self.match_token(&token) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(&format!(
                "expected {}, found {}",
                token.describe(),
                self.current_token().describe()
            )))
        }
    }

    fn error(&self, message: &str) -> ExpressionError {
        ExpressionError::Syntax {
            offset: self.current_offset(),
            message: message.to_string(),
        }
    }
}

/// Parse `source` into an expression tree
pub fn parse(source: &str, max_depth: usize) -> ExpressionResult<Expression> {
    Parser::new(source, max_depth)?.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEPTH: usize = 64;

    #[test]
    fn test_parse_function_call() {
        let expr = parse(r#"regexMatch(tag, "^JIRA:[A-Za-z]{3}[A-Za-z]*$")"#, DEPTH).unwrap();

        assert_eq!(
            expr,
            Expression::call(
                "regexMatch",
                vec![
                    Expression::identifier("tag"),
                    Expression::literal("^JIRA:[A-Za-z]{3}[A-Za-z]*$"),
                ]
            )
        );
    }

    #[test]
    fn test_parse_nested_subexpression_literal() {
        let expr = parse(
            r#"any("regexMatch(Value, \"^JIRA:[A-Za-z]{3}[A-Za-z]*$\")", Tags)"#,
            DEPTH,
        )
        .unwrap();

        match expr {
            Expression::FunctionCall { name, args } => {
                assert_eq!(name, "any");
                assert_eq!(
                    args[0],
                    Expression::literal(r#"regexMatch(Value, "^JIRA:[A-Za-z]{3}[A-Za-z]*$")"#)
                );
                assert_eq!(args[1], Expression::identifier("Tags"));
            }
            _ => panic!("Expected function call"),
        }
    }

    #[test]
    fn test_precedence() {
        // a || b && c  ==  a || (b && c)
        let expr = parse("a || b && c", DEPTH).unwrap();
        assert_eq!(
            expr,
            Expression::or(
                Expression::identifier("a"),
                Expression::and(Expression::identifier("b"), Expression::identifier("c"))
            )
        );

        // 1 + 2 * 3 > 6  ==  (1 + (2 * 3)) > 6
        let expr = parse("1 + 2 * 3 > 6", DEPTH).unwrap();
        assert_eq!(
            expr,
            Expression::gt(
                Expression::binary_op(
                    BinaryOperator::Add,
                    Expression::literal(1i64),
                    Expression::binary_op(
                        BinaryOperator::Mul,
                        Expression::literal(2i64),
                        Expression::literal(3i64)
                    )
                ),
                Expression::literal(6i64)
            )
        );

        // !a && b  ==  (!a) && b
        let expr = parse("!a && b", DEPTH).unwrap();
        assert_eq!(
            expr,
            Expression::and(
                Expression::not_expr(Expression::identifier("a")),
                Expression::identifier("b")
            )
        );
    }

    #[test]
    fn test_parse_literals() {
        assert_eq!(parse("2.5", DEPTH).unwrap(), Expression::literal(2.5));
        assert_eq!(parse("true", DEPTH).unwrap(), Expression::literal(true));
        assert_eq!(
            parse("-3", DEPTH).unwrap(),
            Expression::unary_op(UnaryOperator::Minus, Expression::literal(3i64))
        );
        assert_eq!(
            parse("now()", DEPTH).unwrap(),
            Expression::call("now", vec![])
        );
    }

    #[test]
    fn test_syntax_errors_carry_offsets() {
        let err = parse("ID > ", DEPTH).unwrap_err();
        assert_eq!(
            err,
            ExpressionError::Syntax {
                offset: 5,
                message: "unexpected end of input".to_string()
            }
        );

        let err = parse("(ID > 1", DEPTH).unwrap_err();
        assert!(matches!(err, ExpressionError::Syntax { offset: 7, .. }));

        let err = parse("ID > 1 2", DEPTH).unwrap_err();
        assert!(matches!(err, ExpressionError::Syntax { offset: 7, .. }));

        let err = parse("any(\"x\",)", DEPTH).unwrap_err();
        assert!(matches!(err, ExpressionError::Syntax { offset: 8, .. }));

        let err = parse("", DEPTH).unwrap_err();
        assert!(matches!(err, ExpressionError::Syntax { offset: 0, .. }));

        let err = parse("a == b == c", DEPTH).unwrap_err();
        assert!(matches!(err, ExpressionError::Syntax { offset: 7, .. }));

        let err = parse("99999999999999999999", DEPTH).unwrap_err();
        assert!(matches!(err, ExpressionError::Syntax { offset: 0, .. }));
    }

    #[test]
    fn test_depth_limit() {
        let source = format!("{}true{}", "(".repeat(10), ")".repeat(10));
        assert!(parse(&source, 64).is_ok());
        assert!(matches!(
            parse(&source, 5),
            Err(ExpressionError::Syntax { .. })
        ));

        let source = format!("{}true", "!".repeat(10));
        assert!(parse(&source, 5).is_err());
    }

    #[test]
    fn test_operator_chains_count_toward_depth() {
        assert!(parse("a || b || c && d && e", 64).is_ok());
        assert!(parse("1 + 2 - 3 * 4 / 5", 5).is_ok());

        let source = vec!["ID == 1"; 100].join(" || ");
        assert!(matches!(
            parse(&source, 64),
            Err(ExpressionError::Syntax { .. })
        ));

        let source = vec!["1"; 100].join(" * ");
        assert!(parse(&source, 64).is_err());
        let source = vec!["1"; 100].join(" + ");
        assert!(parse(&source, 64).is_err());
        let source = vec!["true"; 100].join(" && ");
        assert!(parse(&source, 64).is_err());

        // Depth is released once a chain ends
        let chain = vec!["x"; 40].join(" && ");
        let source = format!("({}) || ({})", chain, chain);
        assert!(parse(&source, 64).is_ok());
    }
}
