use crate::error;
use crate::expr::{Expr, NodeId};
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Literal, Token, TokenType, TokenType::*};
use crate::value::Object;
use std::rc::Rc;

/// Marks that a parse rule hit a syntax error it already reported through
/// `error::error_at_token`. Carries no data — the only thing a caller can
/// do with it is bail out to the nearest statement boundary via
/// `synchronize`, which is what `declaration()` does.
#[derive(Debug)]
struct ParseError;

const MAX_ARGS: usize = 255;

/// Recursive-descent parser over the token stream the scanner produces.
/// Builds the `Expr`/`Stmt` trees `spec.md` §3 describes, one NodeId at a
/// time for every variable-bearing expression (`Variable`, `Assign`,
/// `This`, `Super`, `SuperCall`) so the resolver has stable keys to hang
/// distances off without needing an arena.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    next_id: NodeId,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, current: 0, next_id: 0 }
    }

    fn next_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// program -> declaration* EOF ;
    pub fn parse(&mut self) -> Vec<Stmt> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }
        statements
    }

    fn declaration(&mut self) -> Option<Stmt> {
        let result = if self.match_types(&[CLASS]) {
            self.class_declaration()
        } else if self.match_types(&[FUN]) {
            self.function_declaration("function")
        } else if self.match_types(&[VAR]) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),
            Err(ParseError) => {
                self.synchronize();
                None
            }
        }
    }

    /// classDecl -> "class" IDENTIFIER ( "<" IDENTIFIER )? "{" member* "}" ;
    /// member     -> "static"? ( "get" IDENTIFIER block | IDENTIFIER "(" params? ")" block ) ;
    fn class_declaration(&mut self) -> Result<Stmt, ParseError> {
        let name = self.consume(IDENTIFIER, "Expect class name.")?;

        let superclass = if self.match_types(&[LESS]) {
            self.consume(IDENTIFIER, "Expect superclass name.")?;
            let name = self.previous();
            Some(Expr::Variable { id: self.next_id(), name })
        } else {
            None
        };

        self.consume(LEFT_BRACE, "Expect '{' before class body.")?;

        let mut methods = Vec::new();
        let mut getters = Vec::new();
        let mut static_methods = Vec::new();
        let mut static_getters = Vec::new();

        while !self.check(RIGHT_BRACE) && !self.is_at_end() {
            let is_static = self.match_types(&[STATIC]);
            if self.match_types(&[GET]) {
                let decl = self.function_body("getter", false)?;
                if is_static {
                    static_getters.push(decl);
                } else {
                    getters.push(decl);
                }
            } else {
                let decl = self.function_body("method", true)?;
                if is_static {
                    static_methods.push(decl);
                } else {
                    methods.push(decl);
                }
            }
        }

        self.consume(RIGHT_BRACE, "Expect '}' after class body.")?;

        Ok(Stmt::Class { name, superclass, methods, getters, static_methods, static_getters })
    }

    /// funDecl -> "fun" function ;
    fn function_declaration(&mut self, kind: &str) -> Result<Stmt, ParseError> {
        let decl = self.function_body(kind, true)?;
        Ok(Stmt::Function { decl })
    }

    /// function -> IDENTIFIER ( "(" parameters? ")" )? block ;
    /// Getters omit the parameter list entirely (`allow_params = false`).
    fn function_body(&mut self, kind: &str, allow_params: bool) -> Result<Rc<FunctionDecl>, ParseError> {
        let name = Some(self.consume(IDENTIFIER, &format!("Expect {kind} name."))?);
        self.function_body_from(name, allow_params)
    }

    /// Anonymous variant for `fun (params) { body }` function expressions,
    /// which have no name token to consume at all.
    fn anonymous_function_body(&mut self) -> Result<Rc<FunctionDecl>, ParseError> {
        self.function_body_from(None, true)
    }

    fn function_body_from(&mut self, name: Option<Token>, allow_params: bool) -> Result<Rc<FunctionDecl>, ParseError> {
        let kind = if name.is_some() { "function" } else { "anonymous function" };
        let mut params = Vec::new();

        if allow_params {
            let paren_message = match &name {
                Some(n) => format!("Expect '(' after {kind} name '{}'.", n.lexeme),
                None => "Expect '(' after 'fun'.".to_string(),
            };
            self.consume(LEFT_PAREN, &paren_message)?;
            if !self.check(RIGHT_PAREN) {
                loop {
                    if params.len() >= MAX_ARGS {
                        self.error(self.peek(), "Can't have more than 255 parameters.");
                    }
                    params.push(self.consume(IDENTIFIER, "Expect parameter name.")?);
                    if !self.match_types(&[COMMA]) {
                        break;
                    }
                }
            }
            self.consume(RIGHT_PAREN, "Expect ')' after parameters.")?;
        }

        self.consume(LEFT_BRACE, &format!("Expect '{{' before {kind} body."))?;
        let body = self.block()?;
        Ok(Rc::new(FunctionDecl { name, params, body }))
    }

    /// varDecl -> "var" IDENTIFIER ( "=" expression )? ";" ;
    fn var_declaration(&mut self) -> Result<Stmt, ParseError> {
        let name = self.consume(IDENTIFIER, "Expect variable name.")?;
        let initializer = if self.match_types(&[EQUAL]) { Some(self.expression()?) } else { None };
        self.consume(SEMICOLON, "Expect ';' after variable declaration.")?;
        Ok(Stmt::Var { name, initializer })
    }

    /// statement -> exprStmt | forStmt | ifStmt | printStmt | returnStmt
    ///            | whileStmt | breakStmt | continueStmt | block ;
    fn statement(&mut self) -> Result<Stmt, ParseError> {
        if self.match_types(&[FOR]) {
            self.for_statement()
        } else if self.match_types(&[IF]) {
            self.if_statement()
        } else if self.match_types(&[PRINT]) {
            self.print_statement()
        } else if self.match_types(&[RETURN]) {
            self.return_statement()
        } else if self.match_types(&[WHILE]) {
            self.while_statement()
        } else if self.match_types(&[BREAK]) {
            let keyword = self.previous();
            self.consume(SEMICOLON, "Expect ';' after 'break'.")?;
            Ok(Stmt::Break { keyword })
        } else if self.match_types(&[CONTINUE]) {
            let keyword = self.previous();
            self.consume(SEMICOLON, "Expect ';' after 'continue'.")?;
            Ok(Stmt::Continue { keyword })
        } else if self.match_types(&[LEFT_BRACE]) {
            Ok(Stmt::Block { statements: self.block()? })
        } else {
            self.expression_statement()
        }
    }

    /// forStmt desugars into a `While` statement tagged `is_for`/
    /// `has_increment` per spec.md §3/§4.5: the body becomes a block whose
    /// second statement (when present) is the increment, so `continue`
    /// inside a desugared `for` can re-run it before re-testing the
    /// condition.
    fn for_statement(&mut self) -> Result<Stmt, ParseError> {
        self.consume(LEFT_PAREN, "Expect '(' after 'for'.")?;

        let initializer = if self.match_types(&[SEMICOLON]) {
            None
        } else if self.match_types(&[VAR]) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check(SEMICOLON) { Some(self.expression()?) } else { None };
        self.consume(SEMICOLON, "Expect ';' after loop condition.")?;

        let increment = if !self.check(RIGHT_PAREN) { Some(self.expression()?) } else { None };
        self.consume(RIGHT_PAREN, "Expect ')' after for clauses.")?;

        let has_increment = increment.is_some();
        let mut body = self.statement()?;

        if let Some(incr) = increment {
            body = Stmt::Block { statements: vec![body, Stmt::Expression { expression: incr }] };
        }

        let condition = condition.unwrap_or(Expr::Literal(Object::Boolean(true)));
        body = Stmt::While { condition, body: Box::new(body), is_for: true, has_increment };

        if let Some(init) = initializer {
            body = Stmt::Block { statements: vec![init, body] };
        }

        Ok(body)
    }

    /// ifStmt -> "if" "(" expression ")" statement ( "else" statement )? ;
    fn if_statement(&mut self) -> Result<Stmt, ParseError> {
        self.consume(LEFT_PAREN, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(RIGHT_PAREN, "Expect ')' after if condition.")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch =
            if self.match_types(&[ELSE]) { Some(Box::new(self.statement()?)) } else { None };

        Ok(Stmt::If { condition, then_branch, else_branch })
    }

    /// printStmt -> "print" expression ";" ;
    fn print_statement(&mut self) -> Result<Stmt, ParseError> {
        let value = self.expression()?;
        self.consume(SEMICOLON, "Expect ';' after value.")?;
        Ok(Stmt::Print { expression: value })
    }

    /// returnStmt -> "return" expression? ";" ;
    fn return_statement(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.previous();
        let value = if !self.check(SEMICOLON) { Some(self.expression()?) } else { None };
        self.consume(SEMICOLON, "Expect ';' after return value.")?;
        Ok(Stmt::Return { keyword, value })
    }

    /// whileStmt -> "while" "(" expression ")" statement ;
    fn while_statement(&mut self) -> Result<Stmt, ParseError> {
        self.consume(LEFT_PAREN, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(RIGHT_PAREN, "Expect ')' after condition.")?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::While { condition, body, is_for: false, has_increment: false })
    }

    /// block -> "{" declaration* "}" ;
    fn block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut statements = Vec::new();
        while !self.check(RIGHT_BRACE) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }
        self.consume(RIGHT_BRACE, "Expect '}' after block.")?;
        Ok(statements)
    }

    fn expression_statement(&mut self) -> Result<Stmt, ParseError> {
        let expr = self.expression()?;
        self.consume(SEMICOLON, "Expect ';' after expression.")?;
        Ok(Stmt::Expression { expression: expr })
    }

    fn expression(&mut self) -> Result<Expr, ParseError> {
        self.assignment()
    }

    /// assignment -> ( call "." )? IDENTIFIER "=" assignment | logic_or ;
    /// The left side is parsed as an ordinary expression first and only
    /// reinterpreted as an assignment target afterward — every valid
    /// target also happens to be valid expression syntax, so there's no
    /// need to special-case the grammar up front.
    fn assignment(&mut self) -> Result<Expr, ParseError> {
        let expr = self.or()?;

        if self.match_types(&[EQUAL]) {
            let equals = self.previous();
            let value = Box::new(self.assignment()?);

            return match expr {
                Expr::Variable { name, .. } => Ok(Expr::Assign { id: self.next_id(), name, value }),
                Expr::Get { object, name } => Ok(Expr::Set { object, name, value }),
                _ => {
                    self.error(&equals, "Invalid assignment target.");
                    Ok(*value)
                }
            };
        }

        Ok(expr)
    }

    /// logic_or -> logic_and ( "or" logic_and )* ;
    fn or(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.and()?;
        while self.match_types(&[OR]) {
            let operator = self.previous();
            let right = self.and()?;
            expr = Expr::Logical { left: Box::new(expr), operator, right: Box::new(right) };
        }
        Ok(expr)
    }

    /// logic_and -> equality ( "and" equality )* ;
    fn and(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.equality()?;
        while self.match_types(&[AND]) {
            let operator = self.previous();
            let right = self.equality()?;
            expr = Expr::Logical { left: Box::new(expr), operator, right: Box::new(right) };
        }
        Ok(expr)
    }

    /// equality -> comparison ( ( "!=" | "==" ) comparison )* ;
    fn equality(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.comparison()?;
        while self.match_types(&[BANG_EQUAL, EQUAL_EQUAL]) {
            let operator = self.previous();
            let right = self.comparison()?;
            expr = Expr::Binary { left: Box::new(expr), operator, right: Box::new(right) };
        }
        Ok(expr)
    }

    /// comparison -> term ( ( ">" | ">=" | "<" | "<=" ) term )* ;
    fn comparison(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.term()?;
        while self.match_types(&[GREATER, GREATER_EQUAL, LESS, LESS_EQUAL]) {
            let operator = self.previous();
            let right = self.term()?;
            expr = Expr::Binary { left: Box::new(expr), operator, right: Box::new(right) };
        }
        Ok(expr)
    }

    /// term -> factor ( ( "-" | "+" ) factor )* ;
    fn term(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.factor()?;
        while self.match_types(&[MINUS, PLUS]) {
            let operator = self.previous();
            let right = self.factor()?;
            expr = Expr::Binary { left: Box::new(expr), operator, right: Box::new(right) };
        }
        Ok(expr)
    }

    /// factor -> unary ( ( "/" | "*" ) unary )* ;
    fn factor(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.unary()?;
        while self.match_types(&[SLASH, STAR]) {
            let operator = self.previous();
            let right = self.unary()?;
            expr = Expr::Binary { left: Box::new(expr), operator, right: Box::new(right) };
        }
        Ok(expr)
    }

    /// unary -> ( "!" | "-" ) unary | call ;
    fn unary(&mut self) -> Result<Expr, ParseError> {
        if self.match_types(&[BANG, MINUS]) {
            let operator = self.previous();
            let right = self.unary()?;
            return Ok(Expr::Unary { operator, right: Box::new(right) });
        }
        self.call()
    }

    /// call -> primary ( "(" arguments? ")" | "." IDENTIFIER )* ;
    fn call(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.primary()?;

        loop {
            if self.match_types(&[LEFT_PAREN]) {
                expr = self.finish_call(expr)?;
            } else if self.match_types(&[DOT]) {
                let name = self.consume(IDENTIFIER, "Expect property name after '.'.")?;
                expr = Expr::Get { object: Box::new(expr), name };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// arguments -> expression ( "," expression )* ;
    fn finish_call(&mut self, callee: Expr) -> Result<Expr, ParseError> {
        let mut arguments = Vec::new();
        if !self.check(RIGHT_PAREN) {
            loop {
                if arguments.len() >= MAX_ARGS {
                    self.error(self.peek(), "Can't have more than 255 arguments.");
                }
                arguments.push(self.expression()?);
                if !self.match_types(&[COMMA]) {
                    break;
                }
            }
        }
        let paren = self.consume(RIGHT_PAREN, "Expect ')' after arguments.")?;
        Ok(Expr::Call { callee: Box::new(callee), paren, arguments })
    }

    /// primary -> NUMBER | STRING | "true" | "false" | "nil" | "this"
    ///          | "(" expression ")" | IDENTIFIER
    ///          | "super" ( "." IDENTIFIER | "(" arguments? ")" )
    ///          | "fun" "(" parameters? ")" block ;
    fn primary(&mut self) -> Result<Expr, ParseError> {
        if self.match_types(&[FALSE]) {
            return Ok(Expr::Literal(Object::Boolean(false)));
        }
        if self.match_types(&[TRUE]) {
            return Ok(Expr::Literal(Object::Boolean(true)));
        }
        if self.match_types(&[NIL]) {
            return Ok(Expr::Literal(Object::Nil));
        }
        if self.match_types(&[NUMBER]) {
            return match self.previous().literal {
                Some(Literal::Number(n)) => Ok(Expr::Literal(Object::Number(n))),
                _ => unreachable!("scanner guarantees a NUMBER token carries a Literal::Number"),
            };
        }
        if self.match_types(&[STRING]) {
            return match self.previous().literal {
                Some(Literal::Str(ref s)) => Ok(Expr::Literal(Object::String(s.clone()))),
                _ => unreachable!("scanner guarantees a STRING token carries a Literal::Str"),
            };
        }
        if self.match_types(&[THIS]) {
            return Ok(Expr::This { id: self.next_id(), keyword: self.previous() });
        }
        if self.match_types(&[SUPER]) {
            let keyword = self.previous();
            if self.match_types(&[LEFT_PAREN]) {
                let mut arguments = Vec::new();
                if !self.check(RIGHT_PAREN) {
                    loop {
                        if arguments.len() >= MAX_ARGS {
                            self.error(self.peek(), "Can't have more than 255 arguments.");
                        }
                        arguments.push(self.expression()?);
                        if !self.match_types(&[COMMA]) {
                            break;
                        }
                    }
                }
                self.consume(RIGHT_PAREN, "Expect ')' after superclass constructor arguments.")?;
                return Ok(Expr::SuperCall { id: self.next_id(), keyword, arguments });
            }
            self.consume(DOT, "Expect '.' after 'super'.")?;
            let method = self.consume(IDENTIFIER, "Expect superclass method name.")?;
            return Ok(Expr::Super { id: self.next_id(), keyword, method });
        }
        if self.match_types(&[IDENTIFIER]) {
            return Ok(Expr::Variable { id: self.next_id(), name: self.previous() });
        }
        if self.match_types(&[LEFT_PAREN]) {
            let expr = self.expression()?;
            self.consume(RIGHT_PAREN, "Expect ')' after expression.")?;
            return Ok(Expr::Grouping(Box::new(expr)));
        }
        if self.match_types(&[FUN]) {
            let decl = self.anonymous_function_body()?;
            return Ok(Expr::FunctionExpr(decl));
        }

        Err(self.error(self.peek(), "Expect expression."))
    }

    // --- token-stream plumbing ---

    fn match_types(&mut self, types: &[TokenType]) -> bool {
        for &t in types {
            if self.check(t) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn check(&self, token_type: TokenType) -> bool {
        !self.is_at_end() && self.peek().token_type == token_type
    }

    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == EOF
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> Token {
        self.tokens[self.current - 1].clone()
    }

    fn consume(&mut self, token_type: TokenType, message: &str) -> Result<Token, ParseError> {
        if self.check(token_type) {
            return Ok(self.advance());
        }
        Err(self.error(self.peek(), message))
    }

    fn error(&self, token: &Token, message: &str) -> ParseError {
        error::error_at_token(token, message);
        ParseError
    }

    /// Discards tokens until it finds what looks like the start of the
    /// next statement, so one syntax error doesn't cascade into a wall of
    /// spurious follow-on errors.
    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if self.tokens[self.current - 1].token_type == SEMICOLON {
                return;
            }
            match self.peek().token_type {
                CLASS | FUN | VAR | FOR | IF | WHILE | PRINT | RETURN => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Scanner;

    fn parse(src: &str) -> Vec<Stmt> {
        let tokens = Scanner::new(src).scan_tokens();
        Parser::new(tokens).parse()
    }

    #[test]
    fn parses_arithmetic_precedence() {
        let stmts = parse("1 + 2 * 3;");
        match &stmts[0] {
            Stmt::Expression { expression: Expr::Binary { operator, .. } } => {
                assert_eq!(operator.lexeme, "+");
            }
            other => panic!("expected a binary expression statement, got {other:?}"),
        }
    }

    #[test]
    fn for_loop_desugars_to_a_tagged_while() {
        let stmts = parse("for (var i = 0; i < 3; i = i + 1) print i;");
        match &stmts[0] {
            Stmt::Block { statements } => match &statements[1] {
                Stmt::While { is_for, has_increment, .. } => {
                    assert!(*is_for);
                    assert!(*has_increment);
                }
                other => panic!("expected the desugared while, got {other:?}"),
            },
            other => panic!("expected a block wrapping the for-loop, got {other:?}"),
        }
    }

    #[test]
    fn class_with_getter_and_static_method() {
        let stmts = parse("class C { get g { return 1; } static s() { return 2; } }");
        match &stmts[0] {
            Stmt::Class { getters, static_methods, .. } => {
                assert_eq!(getters.len(), 1);
                assert_eq!(static_methods.len(), 1);
            }
            other => panic!("expected a class declaration, got {other:?}"),
        }
    }

    #[test]
    fn super_call_is_distinct_from_super_property() {
        let stmts = parse("class B < A { init() { super(1); } } ");
        match &stmts[0] {
            Stmt::Class { methods, .. } => match methods[0].body.first() {
                Some(Stmt::Expression { expression: Expr::SuperCall { arguments, .. } }) => {
                    assert_eq!(arguments.len(), 1);
                }
                other => panic!("expected a super call statement, got {other:?}"),
            },
            other => panic!("expected a class declaration, got {other:?}"),
        }
    }
}
