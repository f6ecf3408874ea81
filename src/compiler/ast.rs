use std::fmt::{Debug, Formatter};
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use crate::compiler::lexer::Token;

static NEXT_EXPR_ID: AtomicUsize = AtomicUsize::new(0);

/// Identity of a variable or assignment expression, the key of the resolver's side table.
/// Ids are unique for the whole process, so tables from separate parses never collide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ExprId(usize);

impl ExprId {
    pub fn next() -> ExprId {
        ExprId(NEXT_EXPR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Clone, PartialEq)]
pub enum LiteralValue {
    Nil,
    Boolean(bool),
    Number(f64),
    String(Rc<str>),
}

#[derive(Clone, PartialEq)]
pub enum Expr {
    Literal(LiteralValue),

    Variable {
        id: ExprId,
        name: Token,
    },
    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },

    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },
    Unary {
        operator: Token,
        expr: Box<Expr>,
    },
    Grouping(Box<Expr>),

    Call {
        callee: Box<Expr>,
        paren: Token,
        args: Vec<Expr>,
    },
    Index {
        target: Box<Expr>,
        bracket: Token,
        index: Box<Expr>,
    },
}

#[derive(PartialEq)]
pub struct FunctionDecl {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

#[derive(Clone, PartialEq)]
pub enum Stmt {
    Expression(Expr),
    Print(Expr),
    Var {
        name: Token,
        initializer: Option<Expr>,
    },
    Block(Vec<Stmt>),
    If {
        condition: Expr,
        then: Box<Stmt>,
        otherwise: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    // Shared with every closure created from this declaration
    Function(Rc<FunctionDecl>),
    Return {
        keyword: Token,
        value: Option<Expr>,
    },
}

impl Stmt {
    /// Whether running this statement can create a function value, which keeps its body's
    /// expressions reachable after the statement finishes.
    pub fn declares_function(&self) -> bool {
        match self {
            Stmt::Function(_) => true,
            Stmt::Block(statements) => statements.iter().any(Stmt::declares_function),
            Stmt::If { then, otherwise, .. } =>
                then.declares_function() || otherwise.as_ref().map_or(false, |otherwise| otherwise.declares_function()),
            Stmt::While { body, .. } => body.declares_function(),
            Stmt::Expression(_) | Stmt::Print(_) | Stmt::Var { .. } | Stmt::Return { .. } => false,
        }
    }
}

impl Debug for LiteralValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LiteralValue::Nil => write!(f, "nil"),
            LiteralValue::Boolean(value) => write!(f, "{}", value),
            LiteralValue::Number(value) => write!(f, "{}", value),
            LiteralValue::String(value) => write!(f, "\"{}\"", value),
        }
    }
}

impl Debug for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Literal(value) => write!(f, "{:?}", value),
            Expr::Variable { name, .. } => write!(f, "{}", name.source()),
            Expr::Assign { name, value, .. } => write!(f, "(= {} {:?})", name.source(), value),
            Expr::Binary { left, operator, right } | Expr::Logical { left, operator, right } =>
                write!(f, "({} {:?} {:?})", operator.source(), left, right),
            Expr::Unary { operator, expr } => write!(f, "({} {:?})", operator.source(), expr),
            Expr::Grouping(expr) => write!(f, "(group {:?})", expr),
            Expr::Call { callee, args, .. } => write!(f, "(call {:?}{})", callee,
                                                      args.iter().map(|arg| format!(" {:?}", arg)).collect::<String>()),
            Expr::Index { target, index, .. } => write!(f, "(index {:?} {:?})", target, index),
        }
    }
}

impl Debug for FunctionDecl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "fun {}({}) {{ {} }}", self.name.source(),
               self.params.iter().map(|param| param.source().to_owned()).collect::<Vec<String>>().join(", "),
               self.body.iter().map(|stmt| format!("{:?}", stmt)).collect::<Vec<String>>().join(" "))
    }
}

impl Debug for Stmt {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Stmt::Expression(expr) => write!(f, "{:?};", expr),
            Stmt::Print(expr) => write!(f, "print {:?};", expr),
            Stmt::Var { name, initializer: Some(initializer) } => write!(f, "var {} = {:?};", name.source(), initializer),
            Stmt::Var { name, initializer: None } => write!(f, "var {};", name.source()),
            Stmt::Block(statements) => write!(f, "{{ {} }}", statements.iter().map(|stmt| format!("{:?}", stmt))
                .collect::<Vec<String>>().join(" ")),
            Stmt::If { condition, then, otherwise } => {
                write!(f, "if ({:?}) {:?}", condition, then)?;

                if let Some(otherwise) = otherwise {
                    write!(f, " else {:?}", otherwise)?;
                }

                Ok(())
            },
            Stmt::While { condition, body } => write!(f, "while ({:?}) {:?}", condition, body),
            Stmt::Function(function) => write!(f, "{:?}", function),
            Stmt::Return { value: Some(value), .. } => write!(f, "return {:?};", value),
            Stmt::Return { value: None, .. } => write!(f, "return;"),
        }
    }
}
