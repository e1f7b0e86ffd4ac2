//! Reference executor for generated function bodies.
//!
//! Interprets the subset of the host language the generator emits (short
//! variable declarations, `for`/`if` statements, immediately invoked
//! function literals, series and `math` calls) against an in-memory bar
//! fixture. Series record which slots were written, so a read of a slot no
//! statement has written yet on its bar is reported instead of silently
//! yielding NaN.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

/// One OHLCV bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Deterministic bars with swings in both directions.
pub fn fixture(count: usize) -> Vec<Bar> {
    let mut bars = Vec::with_capacity(count);
    let mut prev_close = 100.0;
    for i in 0..count {
        let t = i as f64;
        let close = 100.0 + 8.0 * (t * 0.45).sin() + 3.0 * (t * 1.7).cos() + (i % 5) as f64 * 0.25;
        let open = prev_close + 0.6 * (t * 2.3).sin();
        let high = open.max(close) + 0.5 + (i % 3) as f64 * 0.4;
        let low = open.min(close) - 0.5 - (i % 4) as f64 * 0.3;
        bars.push(Bar {
            time: 1_700_000_000_000 + i as i64 * 60_000,
            open,
            high,
            low,
            close,
            volume: 1000.0 + (i * 37 % 11) as f64 * 10.0,
        });
        prev_close = close;
    }
    bars
}

/// A strategy call made while executing.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub bar: usize,
    pub action: String,
    pub id: String,
}

/// Everything observable after a run.
#[derive(Debug, Default)]
pub struct Run {
    /// Every series value by storage name, one slot per bar.
    pub series: BTreeMap<String, Vec<f64>>,
    /// Plotted values by title, one per bar.
    pub plots: BTreeMap<String, Vec<f64>>,
    pub trades: Vec<Trade>,
    /// Reads of series slots that had not been written.
    pub unwritten_reads: Vec<String>,
}

impl Run {
    /// Values of one series, panicking when it was never declared.
    pub fn series(&self, storage: &str) -> &[f64] {
        self.series
            .get(storage)
            .unwrap_or_else(|| panic!("no series {storage}; have {:?}", self.series.keys()))
    }
}

/// Execute a generated body over `bars`.
pub fn execute(body: &str, bars: &[Bar]) -> Run {
    let tokens = tokenize(body);
    let program = Parser { tokens, pos: 0 }.program();
    let mut machine = Machine {
        bars,
        bar_index: 0,
        scopes: vec![HashMap::new()],
        run: Run::default(),
    };
    match machine.exec_block(&program) {
        Flow::Normal => {}
        other => panic!("function body ended with {other:?}"),
    }
    let globals = machine.scopes.swap_remove(0);
    for (name, value) in globals {
        if let Value::Series(cell) = value {
            machine.run.series.insert(name, cell.borrow().values.clone());
        }
    }
    machine.run
}

/// Float equality where NaN equals NaN.
pub fn same(a: f64, b: f64) -> bool {
    (a.is_nan() && b.is_nan()) || (a - b).abs() <= 1e-9 * a.abs().max(1.0)
}

/// Assert two per-bar series agree, NaN included.
pub fn assert_series_eq(actual: &[f64], expected: &[f64], what: &str) {
    assert_eq!(actual.len(), expected.len(), "{what}: length");
    for (bar, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(same(*a, *e), "{what}: bar {bar} is {a}, expected {e}");
    }
}

// ==========================================================================
// Tokens
// ==========================================================================

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    Punct(&'static str),
    Semi,
}

const PUNCTS: &[&str] = &[
    ":=", "==", "!=", "<=", ">=", "&&", "||", "++", "--", "+=", "-=", "*=", "/=", "(", ")", "{",
    "}", "[", "]", ".", ",", "+", "-", "*", "/", "%", "<", ">", "!", "=",
];

fn ends_statement(tok: Option<&Tok>) -> bool {
    match tok {
        Some(Tok::Ident(_) | Tok::Int(_) | Tok::Float(_) | Tok::Str(_)) => true,
        Some(Tok::Punct(p)) => matches!(*p, ")" | "]" | "}" | "++" | "--"),
        _ => false,
    }
}

fn tokenize(src: &str) -> Vec<Tok> {
    let chars: Vec<char> = src.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '\n' {
            if ends_statement(out.last()) {
                out.push(Tok::Semi);
            }
            i += 1;
        } else if c.is_whitespace() {
            i += 1;
        } else if c == '/' && chars.get(i + 1) == Some(&'/') {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
        } else if c == '/' && chars.get(i + 1) == Some(&'*') {
            i += 2;
            while !(chars[i] == '*' && chars[i + 1] == '/') {
                i += 1;
            }
            i += 2;
        } else if c == ';' {
            out.push(Tok::Semi);
            i += 1;
        } else if c == '"' {
            let mut s = String::new();
            i += 1;
            while chars[i] != '"' {
                if chars[i] == '\\' {
                    i += 1;
                    s.push(match chars[i] {
                        'n' => '\n',
                        't' => '\t',
                        other => other,
                    });
                } else {
                    s.push(chars[i]);
                }
                i += 1;
            }
            i += 1;
            out.push(Tok::Str(s));
        } else if c.is_ascii_digit() {
            let start = i;
            let mut float = false;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                float |= chars[i] == '.';
                i += 1;
            }
            if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                float = true;
                i += 1;
                if matches!(chars[i], '+' | '-') {
                    i += 1;
                }
                while chars[i].is_ascii_digit() {
                    i += 1;
                }
            }
            let text: String = chars[start..i].iter().collect();
            out.push(if float {
                Tok::Float(text.parse().unwrap())
            } else {
                Tok::Int(text.parse().unwrap())
            });
        } else if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            out.push(Tok::Ident(chars[start..i].iter().collect()));
        } else {
            let rest: String = chars[i..(i + 2).min(chars.len())].iter().collect();
            let punct = PUNCTS
                .iter()
                .find(|p| rest.starts_with(**p))
                .unwrap_or_else(|| panic!("unexpected character {c:?}"));
            i += punct.len();
            out.push(Tok::Punct(punct));
        }
    }
    if ends_statement(out.last()) {
        out.push(Tok::Semi);
    }
    out
}

// ==========================================================================
// Syntax
// ==========================================================================

#[derive(Debug, Clone)]
enum Expr {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    Member(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Call(Box<Expr>, Vec<Expr>),
    Unary(&'static str, Box<Expr>),
    Binary(&'static str, Box<Expr>, Box<Expr>),
    Func(Vec<Stmt>),
}

#[derive(Debug, Clone)]
enum Stmt {
    Define(String, Expr),
    Assign(Expr, &'static str, Expr),
    Step(Expr, &'static str),
    Expr(Expr),
    Var(String, Option<Expr>),
    If {
        init: Option<Box<Stmt>>,
        cond: Expr,
        then: Vec<Stmt>,
        otherwise: Option<Box<Stmt>>,
    },
    For {
        init: Box<Stmt>,
        cond: Expr,
        post: Box<Stmt>,
        body: Vec<Stmt>,
    },
    Block(Vec<Stmt>),
    Return(Option<Expr>),
    Break,
    Continue,
}

struct Parser {
    tokens: Vec<Tok>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Tok {
        let tok = self.tokens[self.pos].clone();
        self.pos += 1;
        tok
    }

    fn is_punct(&self, p: &str) -> bool {
        matches!(self.peek(), Some(Tok::Punct(q)) if *q == p)
    }

    fn is_keyword(&self, k: &str) -> bool {
        matches!(self.peek(), Some(Tok::Ident(name)) if name == k)
    }

    fn expect(&mut self, p: &str) {
        match self.next() {
            Tok::Punct(q) if q == p => {}
            other => panic!("expected `{p}`, found {other:?} at token {}", self.pos),
        }
    }

    fn ident(&mut self) -> String {
        match self.next() {
            Tok::Ident(name) => name,
            other => panic!("expected identifier, found {other:?}"),
        }
    }

    fn skip_semis(&mut self) {
        while self.peek() == Some(&Tok::Semi) {
            self.pos += 1;
        }
    }

    fn program(mut self) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        self.skip_semis();
        while self.peek().is_some() {
            stmts.push(self.stmt());
            self.skip_semis();
        }
        stmts
    }

    fn block(&mut self) -> Vec<Stmt> {
        self.expect("{");
        let mut stmts = Vec::new();
        self.skip_semis();
        while !self.is_punct("}") {
            stmts.push(self.stmt());
            self.skip_semis();
        }
        self.expect("}");
        stmts
    }

    fn stmt(&mut self) -> Stmt {
        if self.is_punct("{") {
            return Stmt::Block(self.block());
        }
        let keyword = match self.peek() {
            Some(Tok::Ident(name)) => name.clone(),
            _ => String::new(),
        };
        match keyword.as_str() {
            "var" | "const" => {
                self.pos += 1;
                let name = self.ident();
                if self.is_punct("=") {
                    self.pos += 1;
                    Stmt::Var(name, Some(self.expr()))
                } else {
                    // A type: `*series.Series` or `security.BarEvaluator`.
                    while !matches!(self.peek(), Some(Tok::Semi) | None) {
                        self.pos += 1;
                    }
                    Stmt::Var(name, None)
                }
            }
            "if" => self.if_stmt(),
            "for" => {
                self.pos += 1;
                let init = Box::new(self.simple());
                self.expect_semi();
                let cond = self.expr();
                self.expect_semi();
                let post = Box::new(self.simple());
                let body = self.block();
                Stmt::For {
                    init,
                    cond,
                    post,
                    body,
                }
            }
            "return" => {
                self.pos += 1;
                if matches!(self.peek(), Some(Tok::Semi)) || self.is_punct("}") {
                    Stmt::Return(None)
                } else {
                    Stmt::Return(Some(self.expr()))
                }
            }
            "break" => {
                self.pos += 1;
                Stmt::Break
            }
            "continue" => {
                self.pos += 1;
                Stmt::Continue
            }
            _ => self.simple(),
        }
    }

    fn expect_semi(&mut self) {
        match self.next() {
            Tok::Semi => {}
            other => panic!("expected `;`, found {other:?}"),
        }
    }

    fn if_stmt(&mut self) -> Stmt {
        self.pos += 1;
        let first = self.simple();
        let (init, cond) = if self.peek() == Some(&Tok::Semi) {
            self.pos += 1;
            (Some(Box::new(first)), self.expr())
        } else {
            match first {
                Stmt::Expr(cond) => (None, cond),
                other => panic!("if condition is not an expression: {other:?}"),
            }
        };
        let then = self.block();
        let otherwise = if self.is_keyword("else") {
            self.pos += 1;
            if self.is_keyword("if") {
                Some(Box::new(self.if_stmt()))
            } else {
                Some(Box::new(Stmt::Block(self.block())))
            }
        } else {
            None
        };
        Stmt::If {
            init,
            cond,
            then,
            otherwise,
        }
    }

    fn simple(&mut self) -> Stmt {
        let lhs = self.expr();
        let op = match self.peek() {
            Some(Tok::Punct(p)) => *p,
            _ => return Stmt::Expr(lhs),
        };
        match op {
            ":=" => {
                self.pos += 1;
                let Expr::Ident(name) = lhs else {
                    panic!("cannot define {lhs:?}");
                };
                Stmt::Define(name, self.expr())
            }
            "=" | "+=" | "-=" | "*=" | "/=" => {
                self.pos += 1;
                Stmt::Assign(lhs, op, self.expr())
            }
            "++" | "--" => {
                self.pos += 1;
                Stmt::Step(lhs, op)
            }
            _ => Stmt::Expr(lhs),
        }
    }

    fn expr(&mut self) -> Expr {
        self.binary(1)
    }

    fn binary(&mut self, min: u8) -> Expr {
        let mut left = self.unary();
        loop {
            let (op, prec) = match self.peek() {
                Some(Tok::Punct(p)) => match *p {
                    "||" => ("||", 1),
                    "&&" => ("&&", 2),
                    "==" | "!=" | "<" | "<=" | ">" | ">=" => (*p, 3),
                    "+" | "-" => (*p, 4),
                    "*" | "/" | "%" => (*p, 5),
                    _ => break,
                },
                _ => break,
            };
            if prec < min {
                break;
            }
            self.pos += 1;
            let right = self.binary(prec + 1);
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        left
    }

    fn unary(&mut self) -> Expr {
        for op in ["!", "-", "+"] {
            if self.is_punct(op) {
                self.pos += 1;
                return Expr::Unary(op, Box::new(self.unary()));
            }
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Expr {
        let mut expr = self.operand();
        loop {
            if self.is_punct(".") {
                self.pos += 1;
                expr = Expr::Member(Box::new(expr), self.ident());
            } else if self.is_punct("(") {
                self.pos += 1;
                let mut args = Vec::new();
                while !self.is_punct(")") {
                    args.push(self.expr());
                    if self.is_punct(",") {
                        self.pos += 1;
                    }
                }
                self.expect(")");
                expr = Expr::Call(Box::new(expr), args);
            } else if self.is_punct("[") {
                self.pos += 1;
                let index = self.expr();
                self.expect("]");
                expr = Expr::Index(Box::new(expr), Box::new(index));
            } else {
                return expr;
            }
        }
    }

    fn operand(&mut self) -> Expr {
        match self.next() {
            Tok::Int(n) => Expr::Int(n),
            Tok::Float(f) => Expr::Float(f),
            Tok::Str(s) => Expr::Str(s),
            Tok::Ident(name) if name == "func" => {
                self.expect("(");
                self.expect(")");
                self.ident(); // result type
                Expr::Func(self.block())
            }
            Tok::Ident(name) => Expr::Ident(name),
            Tok::Punct("(") => {
                let inner = self.expr();
                self.expect(")");
                inner
            }
            other => panic!("unexpected {other:?} at token {}", self.pos),
        }
    }
}

// ==========================================================================
// Evaluation
// ==========================================================================

#[derive(Debug)]
struct SeriesCell {
    name: String,
    values: Vec<f64>,
    written: Vec<bool>,
    cursor: usize,
}

#[derive(Debug, Clone)]
enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Nil,
    Series(Rc<RefCell<SeriesCell>>),
    Bar(usize),
    Data,
    Host(&'static str),
}

impl Value {
    fn num(&self) -> f64 {
        match self {
            Value::Int(n) => *n as f64,
            Value::Float(f) => *f,
            other => panic!("expected a number, found {other:?}"),
        }
    }

    fn int(&self) -> i64 {
        match self {
            Value::Int(n) => *n,
            other => panic!("expected an int, found {other:?}"),
        }
    }

    fn truth(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            other => panic!("condition is not a bool: {other:?}"),
        }
    }
}

const HOSTS: &[&str] = &["ctx", "strat", "collector", "math", "series", "value", "strategy"];

#[derive(Debug)]
enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

struct Machine<'a> {
    bars: &'a [Bar],
    bar_index: i64,
    scopes: Vec<HashMap<String, Value>>,
    run: Run,
}

impl Machine<'_> {
    fn exec_block(&mut self, stmts: &[Stmt]) -> Flow {
        for stmt in stmts {
            match self.exec(stmt) {
                Flow::Normal => {}
                flow => return flow,
            }
        }
        Flow::Normal
    }

    fn scoped(&mut self, stmts: &[Stmt]) -> Flow {
        self.scopes.push(HashMap::new());
        let flow = self.exec_block(stmts);
        self.scopes.pop();
        flow
    }

    fn exec(&mut self, stmt: &Stmt) -> Flow {
        match stmt {
            Stmt::Define(name, expr) | Stmt::Var(name, Some(expr)) => {
                let value = self.eval(expr);
                self.define(name, value);
            }
            Stmt::Var(name, None) => self.define(name, Value::Nil),
            Stmt::Assign(target, op, expr) => {
                let value = self.eval(expr);
                let value = match *op {
                    "=" => value,
                    compound => {
                        let current = self.eval(target);
                        arith(&compound[..1], &current, &value)
                    }
                };
                self.assign(target, value);
            }
            Stmt::Step(target, op) => {
                let current = self.eval(target);
                let delta = Value::Int(if *op == "++" { 1 } else { -1 });
                self.assign(target, arith("+", &current, &delta));
            }
            Stmt::Expr(expr) => {
                self.eval(expr);
            }
            Stmt::If {
                init,
                cond,
                then,
                otherwise,
            } => {
                self.scopes.push(HashMap::new());
                if let Some(init) = init {
                    self.exec(init);
                }
                let flow = if self.eval(cond).truth() {
                    self.scoped(then)
                } else {
                    match otherwise {
                        Some(stmt) => self.exec(stmt),
                        None => Flow::Normal,
                    }
                };
                self.scopes.pop();
                return flow;
            }
            Stmt::For {
                init,
                cond,
                post,
                body,
            } => {
                self.scopes.push(HashMap::new());
                self.exec(init);
                let mut flow = Flow::Normal;
                while self.eval(cond).truth() {
                    match self.scoped(body) {
                        Flow::Break => break,
                        Flow::Normal | Flow::Continue => {}
                        ret @ Flow::Return(_) => {
                            flow = ret;
                            break;
                        }
                    }
                    self.exec(post);
                }
                self.scopes.pop();
                return flow;
            }
            Stmt::Block(stmts) => return self.scoped(stmts),
            Stmt::Return(expr) => {
                let value = expr.as_ref().map_or(Value::Nil, |e| self.eval(e));
                return Flow::Return(value);
            }
            Stmt::Break => return Flow::Break,
            Stmt::Continue => return Flow::Continue,
        }
        Flow::Normal
    }

    fn define(&mut self, name: &str, value: Value) {
        self.scopes
            .last_mut()
            .expect("scope")
            .insert(name.to_string(), value);
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    fn assign(&mut self, target: &Expr, value: Value) {
        match target {
            Expr::Ident(name) => {
                if let Value::Series(cell) = &value {
                    let mut cell = cell.borrow_mut();
                    if cell.name.is_empty() {
                        cell.name = name.clone();
                    }
                }
                let slot = self
                    .scopes
                    .iter_mut()
                    .rev()
                    .find_map(|scope| scope.get_mut(name))
                    .unwrap_or_else(|| panic!("assignment to undeclared `{name}`"));
                *slot = value;
            }
            Expr::Member(object, field) if field == "BarIndex" => {
                assert!(matches!(**object, Expr::Ident(ref n) if n == "ctx"));
                self.bar_index = value.int();
            }
            other => panic!("cannot assign to {other:?}"),
        }
    }

    fn eval(&mut self, expr: &Expr) -> Value {
        match expr {
            Expr::Int(n) => Value::Int(*n),
            Expr::Float(f) => Value::Float(*f),
            Expr::Str(s) => Value::Str(s.clone()),
            Expr::Ident(name) => match name.as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                "nil" => Value::Nil,
                _ => match self.lookup(name) {
                    Some(value) => value.clone(),
                    None => match HOSTS.iter().find(|h| **h == name) {
                        Some(host) => Value::Host(host),
                        None => panic!("undefined `{name}`"),
                    },
                },
            },
            Expr::Member(object, field) => {
                let object = self.eval(object);
                self.member(&object, field)
            }
            Expr::Index(object, index) => {
                let object = self.eval(object);
                let index = self.eval(index).int();
                match object {
                    Value::Data => {
                        let index = usize::try_from(index)
                            .ok()
                            .filter(|&i| i < self.bars.len())
                            .unwrap_or_else(|| panic!("ctx.Data[{index}] out of range"));
                        Value::Bar(index)
                    }
                    other => panic!("cannot index {other:?}"),
                }
            }
            Expr::Call(callee, args) => self.call(callee, args),
            Expr::Unary(op, operand) => {
                let value = self.eval(operand);
                match *op {
                    "!" => Value::Bool(!value.truth()),
                    "-" => match value {
                        Value::Int(n) => Value::Int(-n),
                        other => Value::Float(-other.num()),
                    },
                    _ => value,
                }
            }
            Expr::Binary(op, left, right) => match *op {
                "&&" => Value::Bool(self.eval(left).truth() && self.eval(right).truth()),
                "||" => Value::Bool(self.eval(left).truth() || self.eval(right).truth()),
                _ => {
                    let l = self.eval(left);
                    let r = self.eval(right);
                    arith(op, &l, &r)
                }
            },
            Expr::Func(_) => panic!("function literal used as a value"),
        }
    }

    fn member(&self, object: &Value, field: &str) -> Value {
        match (object, field) {
            (Value::Host("ctx"), "Data") => Value::Data,
            (Value::Host("ctx"), "BarIndex") => Value::Int(self.bar_index),
            (Value::Host("strategy"), "Long") => Value::Str("long".into()),
            (Value::Host("strategy"), "Short") => Value::Str("short".into()),
            (Value::Bar(i), field) => {
                let bar = &self.bars[*i];
                match field {
                    "Open" => Value::Float(bar.open),
                    "High" => Value::Float(bar.high),
                    "Low" => Value::Float(bar.low),
                    "Close" => Value::Float(bar.close),
                    "Volume" => Value::Float(bar.volume),
                    "Time" => Value::Int(bar.time),
                    other => panic!("bar has no field {other}"),
                }
            }
            (object, field) => panic!("no member {field} on {object:?}"),
        }
    }

    fn call(&mut self, callee: &Expr, args: &[Expr]) -> Value {
        if let Expr::Func(body) = callee {
            return match self.scoped(body) {
                Flow::Return(value) => value,
                flow => panic!("function literal ended with {flow:?}"),
            };
        }
        let args: Vec<Value> = args.iter().map(|a| self.eval(a)).collect();
        match callee {
            Expr::Ident(name) if self.lookup(name).is_none() => match name.as_str() {
                "float64" => Value::Float(args[0].num()),
                "int" => Value::Int(args[0].num().trunc() as i64),
                "len" => match args[0] {
                    Value::Data => Value::Int(self.bars.len() as i64),
                    ref other => panic!("len of {other:?}"),
                },
                other => panic!("unknown function {other}"),
            },
            Expr::Member(object, method) => {
                let object = self.eval(object);
                self.method(&object, method, &args)
            }
            other => panic!("cannot call {other:?}"),
        }
    }

    fn method(&mut self, object: &Value, method: &str, args: &[Value]) -> Value {
        match object {
            Value::Host("math") => Value::Float(match (method, args) {
                ("NaN", []) => f64::NAN,
                ("IsNaN", [x]) => return Value::Bool(x.num().is_nan()),
                ("Abs", [x]) => x.num().abs(),
                ("Sqrt", [x]) => x.num().sqrt(),
                ("Floor", [x]) => x.num().floor(),
                ("Ceil", [x]) => x.num().ceil(),
                ("Round", [x]) => x.num().round(),
                ("Log", [x]) => x.num().ln(),
                ("Exp", [x]) => x.num().exp(),
                ("Pow", [x, y]) => x.num().powf(y.num()),
                ("Max", [x, y]) => go_max(x.num(), y.num()),
                ("Min", [x, y]) => go_min(x.num(), y.num()),
                ("Mod", [x, y]) => x.num() % y.num(),
                (other, _) => panic!("math.{other}"),
            }),
            Value::Host("value") if method == "Nz" => {
                let x = args[0].num();
                Value::Float(if x.is_nan() { args[1].num() } else { x })
            }
            Value::Host("series") if method == "NewSeries" => {
                let len = args[0].int() as usize;
                Value::Series(Rc::new(RefCell::new(SeriesCell {
                    name: String::new(),
                    values: vec![f64::NAN; len],
                    written: vec![false; len],
                    cursor: 0,
                })))
            }
            Value::Host("collector") if method == "Add" => {
                let Value::Str(title) = &args[0] else {
                    panic!("plot title {:?}", args[0]);
                };
                self.run
                    .plots
                    .entry(title.clone())
                    .or_default()
                    .push(args[2].num());
                Value::Nil
            }
            Value::Host("strat") => {
                if matches!(method, "Entry" | "Close" | "CloseAll") {
                    let id = match args.first() {
                        Some(Value::Str(id)) if method != "CloseAll" => id.clone(),
                        _ => String::new(),
                    };
                    self.run.trades.push(Trade {
                        bar: self.bar_index as usize,
                        action: method.to_string(),
                        id,
                    });
                }
                Value::Float(0.0)
            }
            Value::Series(cell) => self.series_method(cell, method, args),
            other => panic!("no method {method} on {other:?}"),
        }
    }

    fn series_method(&mut self, cell: &Rc<RefCell<SeriesCell>>, method: &str, args: &[Value]) -> Value {
        let mut series = cell.borrow_mut();
        let cursor = series.cursor;
        match method {
            "Set" => {
                series.values[cursor] = args[0].num();
                series.written[cursor] = true;
                Value::Nil
            }
            "Get" | "GetCurrent" => {
                let offset = if method == "Get" { args[0].int() } else { 0 };
                let Some(slot) = usize::try_from(offset).ok().and_then(|k| cursor.checked_sub(k)) else {
                    return Value::Float(f64::NAN);
                };
                if !series.written[slot] {
                    self.run.unwritten_reads.push(format!(
                        "{}.{method}({offset}) on bar {}",
                        series.name, self.bar_index
                    ));
                }
                Value::Float(series.values[slot])
            }
            "Next" => {
                series.cursor += 1;
                Value::Nil
            }
            other => panic!("series has no method {other}"),
        }
    }
}

fn go_max(x: f64, y: f64) -> f64 {
    if x.is_nan() || y.is_nan() { f64::NAN } else { x.max(y) }
}

fn go_min(x: f64, y: f64) -> f64 {
    if x.is_nan() || y.is_nan() { f64::NAN } else { x.min(y) }
}

fn arith(op: &str, l: &Value, r: &Value) -> Value {
    match (l, r) {
        (Value::Int(a), Value::Int(b)) => match op {
            "+" => Value::Int(a + b),
            "-" => Value::Int(a - b),
            "*" => Value::Int(a * b),
            "/" => Value::Int(a / b),
            "%" => Value::Int(a % b),
            _ => compare(op, *a as f64, *b as f64),
        },
        (Value::Bool(a), Value::Bool(b)) => match op {
            "==" => Value::Bool(a == b),
            "!=" => Value::Bool(a != b),
            _ => panic!("`{op}` on bools"),
        },
        (Value::Str(a), Value::Str(b)) => match op {
            "==" => Value::Bool(a == b),
            "!=" => Value::Bool(a != b),
            _ => panic!("`{op}` on strings"),
        },
        _ => {
            let (a, b) = (l.num(), r.num());
            match op {
                "+" => Value::Float(a + b),
                "-" => Value::Float(a - b),
                "*" => Value::Float(a * b),
                "/" => Value::Float(a / b),
                "%" => Value::Float(a % b),
                _ => compare(op, a, b),
            }
        }
    }
}

fn compare(op: &str, a: f64, b: f64) -> Value {
    Value::Bool(match op {
        "==" => a == b,
        "!=" => a != b,
        "<" => a < b,
        "<=" => a <= b,
        ">" => a > b,
        ">=" => a >= b,
        other => panic!("unknown operator {other}"),
    })
}
