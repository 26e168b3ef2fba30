//! Expression parsing using precedence climbing (a restricted form of
//! Pratt parsing: this grammar has no user-definable operators, so there
//! is no operator table, just a fixed ladder of binding powers).
//!
//! # Binding power (lowest to highest)
//!
//! | Level | Operators | Notes |
//! |-------|-----------|-------|
//! | `Term` | `+`, `-` | left-associative |
//! | `Mult` | `*` | left-associative |
//! | `Div`  | `/` | left-associative, binds *tighter* than `*` |
//! | `Power`| `^` | right-associative in effect: each recursive call re-enters at `Power` |
//!
//! `/` binding tighter than `*` is not a typo: it mirrors the grammar
//! this parser was built against. `a*b/c` parses as `a*(b/c)`.

use graphjit_util::{DiagnosticBuilder, Handler, Span, Symbol};

use crate::arena::Arena;
use crate::ast::{BinaryOp, Node, UnaryOp};
use graphjit_lex::{Token, TokenKind};

/// Binding power levels used by [`Parser::parse_expression_bp`].
#[doc(hidden)]
pub mod bp {
    /// Start-of-expression / "no operator seen yet" level.
    pub const MIN: u8 = 0;
    /// Additive: `+`, `-`.
    pub const TERM: u8 = 1;
    /// Multiplicative: `*`.
    pub const MULT: u8 = 2;
    /// Division: `/` (tighter than `*` in this grammar).
    pub const DIV: u8 = 3;
    /// Exponentiation: `^`.
    pub const POWER: u8 = 4;
}

/// The sixteen single-argument `math.h` functions this grammar recognizes.
pub const FUNCTION_NAMES: &[&str] = &[
    "sin", "cos", "tan", "acos", "asin", "atan", "cosh", "sinh", "tanh", "log", "log10", "sqrt",
    "ceil", "fabs", "floor", "round",
];

const EULER: f64 = std::f64::consts::E;
const PI: f64 = std::f64::consts::PI;

/// Recursive-descent / precedence-climbing parser over a flat token slice.
pub struct Parser<'tok, 'arena> {
    tokens: &'tok [Token<'tok>],
    pos: usize,
    arena: &'arena Arena,
    handler: &'tok mut Handler,
    had_error: bool,
}

impl<'tok, 'arena> Parser<'tok, 'arena> {
    pub fn new(tokens: &'tok [Token<'tok>], arena: &'arena Arena, handler: &'tok mut Handler) -> Self {
        Self {
            tokens,
            pos: 0,
            arena,
            handler,
            had_error: false,
        }
    }

    /// Whether any call to this parser produced an `Error` node.
    pub fn had_error(&self) -> bool {
        self.had_error
    }

    fn current(&self) -> Token<'tok> {
        self.tokens
            .get(self.pos)
            .copied()
            .unwrap_or_else(|| *self.tokens.last().expect("token stream always ends in Eof"))
    }

    fn advance(&mut self) -> Token<'tok> {
        let tok = self.current();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn error_node(&mut self, message: impl Into<String>) -> &'arena Node<'arena> {
        self.had_error = true;
        DiagnosticBuilder::error(message).span(Span::DUMMY).emit(self.handler);
        self.arena.alloc(Node::Error)
    }

    fn binding_power(kind: TokenKind) -> u8 {
        match kind {
            TokenKind::Plus | TokenKind::Minus => bp::TERM,
            TokenKind::Star => bp::MULT,
            TokenKind::Slash => bp::DIV,
            TokenKind::Caret => bp::POWER,
            _ => bp::MIN,
        }
    }

    fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
        match kind {
            TokenKind::Plus => Some(BinaryOp::Add),
            TokenKind::Minus => Some(BinaryOp::Sub),
            TokenKind::Star => Some(BinaryOp::Mul),
            TokenKind::Slash => Some(BinaryOp::Div),
            TokenKind::Caret => Some(BinaryOp::Pow),
            _ => None,
        }
    }

    /// Entry point: parses a complete expression at the lowest binding power.
    pub fn parse_expression(&mut self) -> &'arena Node<'arena> {
        self.parse_expression_bp(bp::MIN)
    }

    /// Precedence-climbing core: parses a prefix expression, then keeps
    /// folding in infix operators whose binding power exceeds `min_bp`.
    fn parse_expression_bp(&mut self, min_bp: u8) -> &'arena Node<'arena> {
        let mut left = self.parse_prefix_expr();

        loop {
            let op_bp = Self::binding_power(self.current().kind);
            if op_bp == bp::MIN || op_bp <= min_bp {
                break;
            }
            let op_tok = self.advance();
            left = self.parse_infix_expr(op_tok, left);
        }

        left
    }

    fn parse_infix_expr(
        &mut self,
        op_tok: Token<'tok>,
        left: &'arena Node<'arena>,
    ) -> &'arena Node<'arena> {
        let Some(op) = Self::binary_op(op_tok.kind) else {
            return self.error_node(format!("expected an operator, found {}", op_tok.kind));
        };
        let right = self.parse_expression_bp(Self::binding_power(op_tok.kind));
        fold_binary(self.arena, op, left, right)
    }

    fn parse_prefix_expr(&mut self) -> &'arena Node<'arena> {
        let tok = self.current();
        let mut node = match tok.kind {
            TokenKind::Ident => self.parse_ident(),
            TokenKind::Number => self.parse_number(),
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression_bp(bp::MIN);
                if self.current().kind == TokenKind::RParen {
                    self.advance();
                }
                inner
            }
            TokenKind::Plus => {
                self.advance();
                let operand = self.parse_prefix_expr();
                self.arena.alloc(Node::Unary {
                    op: UnaryOp::Positive,
                    operand,
                })
            }
            TokenKind::Minus => {
                self.advance();
                let operand = self.parse_prefix_expr();
                self.arena.alloc(Node::Unary {
                    op: UnaryOp::Negative,
                    operand,
                })
            }
            other => return self.error_node(format!("unexpected token {other}")),
        };

        // Implicit multiplication: "5(1+5)" means 5*(1+5), "5pi" means 5*pi.
        let next = self.current().kind;
        if matches!(next, TokenKind::Number | TokenKind::Ident | TokenKind::LParen) {
            let right = self.parse_expression_bp(bp::DIV);
            node = self.arena.alloc(Node::Binary {
                op: BinaryOp::Mul,
                left: node,
                right,
            });
        }
        node
    }

    fn parse_number(&mut self) -> &'arena Node<'arena> {
        let tok = self.advance();
        let value = tok.lexeme.parse::<f64>().unwrap_or(0.0);
        self.arena.alloc(Node::Number(value))
    }

    fn parse_ident(&mut self) -> &'arena Node<'arena> {
        let name = self.current().lexeme;
        if FUNCTION_NAMES.contains(&name) {
            return self.parse_function_call();
        }
        self.advance();
        match name {
            "e" => self.arena.alloc(Node::Number(EULER)),
            "pi" => self.arena.alloc(Node::Number(PI)),
            "x" => self.arena.alloc(Node::Variable),
            _ => self.error_node(format!("unknown identifier \"{name}\"")),
        }
    }

    fn parse_function_call(&mut self) -> &'arena Node<'arena> {
        let name = self.intern_str(self.current().lexeme);
        self.advance();

        if self.current().kind != TokenKind::LParen {
            return self.error_node(format!("expected \"(\" after function name \"{name}\""));
        }
        self.advance();

        let argument = self.parse_expression_bp(bp::MIN);

        if self.current().kind == TokenKind::RParen {
            self.advance();
        } else {
            return self.error_node(format!("unterminated argument list for \"{name}\""));
        }

        self.arena.alloc(Node::Function { name, argument })
    }

    /// Interns `s` into the process-wide symbol table and returns its
    /// `'static` string, which outlives (and so coerces to) `'arena`.
    fn intern_str(&self, s: &str) -> &'arena str {
        Symbol::intern(s).as_str()
    }
}

/// Applies the power-lowering rewrite `pow(pow(b,e1),e2) -> pow(b,e1*e2)`,
/// then constant-folds if both sides are literal numbers, before falling
/// back to an ordinary binary node.
fn fold_binary<'a>(
    arena: &'a Arena,
    op: BinaryOp,
    left: &'a Node<'a>,
    right: &'a Node<'a>,
) -> &'a Node<'a> {
    if let (Node::Number(a), Node::Number(b)) = (left, right) {
        let folded = match op {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            BinaryOp::Pow => a.powf(*b),
        };
        return arena.alloc(Node::Number(folded));
    }

    if op == BinaryOp::Pow {
        if let Node::Binary {
            op: BinaryOp::Pow,
            left: base,
            right: inner_exp,
        } = left
        {
            let combined_exp = arena.alloc(Node::Binary {
                op: BinaryOp::Mul,
                left: inner_exp,
                right,
            });
            return arena.alloc(Node::Binary {
                op: BinaryOp::Pow,
                left: base,
                right: combined_exp,
            });
        }
    }

    arena.alloc(Node::Binary { op, left, right })
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphjit_lex::{strip_whitespace, Lexer};

    fn parse_expr_source(source: &str) -> (String, bool) {
        let cleaned = strip_whitespace(source);
        let mut handler = Handler::new();
        let tokens = Lexer::new(&cleaned, &mut handler)
            .lex_all()
            .expect("balanced parens");
        let arena = Arena::new();
        let mut parser = Parser::new(&tokens, &arena, &mut handler);
        let node = parser.parse_expression();
        let mut out = String::new();
        crate::ast::debug_dump_tree(node, &mut out).unwrap();
        (out, parser.had_error())
    }

    // ===== precedence =====

    #[test]
    fn test_addition_left_associative() {
        let (tree, err) = parse_expr_source("1-2-3");
        assert!(!err);
        assert!(tree.starts_with("Binary(-)"));
    }

    #[test]
    fn test_div_binds_tighter_than_mul() {
        // a*b/c should parse as a*(b/c), not (a*b)/c.
        let (tree, err) = parse_expr_source("2*3/4");
        assert!(!err);
        let lines: Vec<&str> = tree.lines().collect();
        assert_eq!(lines[0], "Binary(*)");
        assert_eq!(lines[1], "  Number(2)");
        assert_eq!(lines[2], "  Binary(/)");
    }

    #[test]
    fn test_power_higher_than_mult() {
        let (tree, err) = parse_expr_source("2*3^2");
        assert!(!err);
        assert_eq!(tree.lines().next().unwrap(), "Binary(*)");
    }

    // ===== implicit multiplication =====

    #[test]
    fn test_implicit_mult_before_paren() {
        let (tree, err) = parse_expr_source("5(1+5)");
        assert!(!err);
        assert_eq!(tree.lines().next().unwrap(), "Binary(*)");
    }

    #[test]
    fn test_implicit_mult_before_ident() {
        let (tree, err) = parse_expr_source("5pi");
        assert!(!err);
        assert_eq!(tree.lines().next().unwrap(), "Binary(*)");
    }

    // ===== literals and idents =====

    #[test]
    fn test_e_and_pi_are_numbers() {
        let (tree, err) = parse_expr_source("e");
        assert!(!err);
        assert!(tree.contains("Number("));
        let (tree, err) = parse_expr_source("pi");
        assert!(!err);
        assert!(tree.contains("Number("));
    }

    #[test]
    fn test_x_is_variable() {
        let (tree, err) = parse_expr_source("x");
        assert!(!err);
        assert_eq!(tree.trim(), "Variable(x)");
    }

    #[test]
    fn test_unknown_ident_is_error() {
        let (_, err) = parse_expr_source("zz");
        assert!(err);
    }

    // ===== function calls =====

    #[test]
    fn test_function_call_basic() {
        let (tree, err) = parse_expr_source("sin(x)");
        assert!(!err);
        assert!(tree.starts_with("Function(sin)"));
    }

    #[test]
    fn test_function_missing_paren_is_error() {
        let (_, err) = parse_expr_source("sin x");
        assert!(err);
    }

    #[test]
    fn test_unterminated_call_is_error() {
        let (_, err) = parse_expr_source("sin(x");
        assert!(err);
    }

    // ===== power rewrite and constant folding =====

    #[test]
    fn test_constant_fold_add() {
        let (tree, err) = parse_expr_source("2+3");
        assert!(!err);
        assert_eq!(tree.trim(), "Number(5)");
    }

    #[test]
    fn test_nested_pow_rewritten_to_single_pow() {
        let (tree, err) = parse_expr_source("(x^2)^3");
        assert!(!err);
        let lines: Vec<&str> = tree.lines().collect();
        assert_eq!(lines[0], "Binary(^)");
        assert_eq!(lines[1], "  Variable(x)");
        // Exponents fold to a constant 2*3 = 6.
        assert!(lines[2].contains("Number(6)"));
    }

    // ===== unary =====

    #[test]
    fn test_unary_minus() {
        let (tree, err) = parse_expr_source("-x");
        assert!(!err);
        assert!(tree.starts_with("Unary(Negative)"));
    }

    #[test]
    fn test_double_unary_minus_constant_folds_via_positive() {
        let (tree, err) = parse_expr_source("+5");
        assert!(!err);
        assert!(tree.starts_with("Unary(Positive)"));
    }

    // ===== parens =====

    #[test]
    fn test_parens_group_expression() {
        let (tree, err) = parse_expr_source("(1+2)*3");
        assert!(!err);
        assert_eq!(tree.lines().next().unwrap(), "Binary(*)");
    }

    #[test]
    fn test_missing_close_paren_is_tolerated_silently() {
        // Mirrors the source grammar: a missing ')' after a grouping or
        // function-argument list does not itself raise an error at that
        // point, it simply stops consuming tokens.
        let cleaned = strip_whitespace("(1+2");
        let mut handler = Handler::new();
        let tokens = Lexer::new(&cleaned, &mut handler).lex_all();
        // Unbalanced parens are caught by the lexer before the parser runs.
        assert!(tokens.is_none());
    }
}
