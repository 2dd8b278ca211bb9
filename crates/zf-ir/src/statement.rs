//! Statements appearing inside block expressions

use crate::error::{IrError, IrResult};
use crate::expr::Expr;
use crate::types::Type;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Statement {
    /// `let [mut] name[: ty] [= init];`
    Let {
        name: String,
        mutable: bool,
        ty: Option<Type>,
        init: Option<Expr>,
    },
    /// `expr;`
    Expression(Expr),
}

impl Statement {
    /// `let name = init;` with the type taken from the initializer
    pub fn binding(name: impl Into<String>, init: Expr, mutable: bool) -> Self {
        Statement::Let {
            name: name.into(),
            mutable,
            ty: init.ty().cloned(),
            init: Some(init),
        }
    }

    /// `let name: ty = init;`, failing when the initializer has another type
    pub fn typed_binding(
        name: impl Into<String>,
        ty: Type,
        init: Expr,
        mutable: bool,
    ) -> IrResult<Self> {
        let name = name.into();
        let actual = init.get_type()?;
        if !actual.same_type(&ty) {
            return Err(IrError::mismatch(format!("let {name}"), &ty, actual));
        }
        Ok(Statement::Let {
            name,
            mutable,
            ty: Some(ty),
            init: Some(init),
        })
    }

    /// `let name: ty;`
    pub fn declaration(name: impl Into<String>, ty: Type, mutable: bool) -> Self {
        Statement::Let {
            name: name.into(),
            mutable,
            ty: Some(ty),
            init: None,
        }
    }

    pub fn expression(expr: Expr) -> Self {
        Statement::Expression(expr)
    }
}

impl std::fmt::Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Statement::Let {
                name,
                mutable,
                ty,
                init,
            } => {
                write!(f, "let {}{name}", if *mutable { "mut " } else { "" })?;
                if let Some(ty) = ty {
                    write!(f, ": {ty}")?;
                }
                if let Some(init) = init {
                    write!(f, " = {init}")?;
                }
                write!(f, ";")
            }
            Statement::Expression(expr) => write!(f, "{expr};"),
        }
    }
}
