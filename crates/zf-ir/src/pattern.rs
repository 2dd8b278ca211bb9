//! Patterns used by closure parameters, `for` loops and match arms

use crate::error::{IrError, IrResult};
use crate::expr::Expr;
use crate::types::Type;

/// A binding pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Pattern {
    /// Binds a single name
    Identifier { name: String, mutable: bool },
    /// `_`
    Wildcard,
    /// Destructures a tuple or raw tuple
    Tuple(Vec<Pattern>),
    /// Matches a constant
    Literal(Expr),
}

impl Pattern {
    pub fn identifier(name: impl Into<String>) -> Self {
        Pattern::Identifier {
            name: name.into(),
            mutable: false,
        }
    }

    pub fn tuple(fields: Vec<Pattern>) -> Self {
        Pattern::Tuple(fields)
    }

    /// Number of components a tuple pattern destructures
    pub fn arity(&self) -> Option<usize> {
        match self {
            Pattern::Tuple(fields) => Some(fields.len()),
            _ => None,
        }
    }

    /// Verify that the pattern's implied shape fits `ty`. References are
    /// looked through at every level.
    pub fn check_against(&self, ty: &Type) -> IrResult<()> {
        match self {
            Pattern::Tuple(fields) => {
                let target = ty.deref();
                let types = target
                    .tuple_fields()
                    .ok_or_else(|| IrError::mismatch("tuple pattern", "tuple type", ty))?;
                if types.len() != fields.len() {
                    return Err(IrError::malformed(
                        format!("pattern {self}"),
                        format!(
                            "pattern has {} components but type {ty} has {}",
                            fields.len(),
                            types.len()
                        ),
                    ));
                }
                fields
                    .iter()
                    .zip(types)
                    .try_for_each(|(pattern, field)| pattern.check_against(field))
            }
            Pattern::Literal(value) => {
                let literal = value.get_type()?;
                if literal.kind() != ty.deref().kind() {
                    return Err(IrError::mismatch("literal pattern", ty, literal));
                }
                Ok(())
            }
            Pattern::Identifier { .. } | Pattern::Wildcard => Ok(()),
        }
    }

    /// Names bound by this pattern, left to right
    pub fn bound_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Pattern::Identifier { name, .. } => names.push(name),
            Pattern::Tuple(fields) => fields.iter().for_each(|f| f.collect_names(names)),
            Pattern::Wildcard | Pattern::Literal(_) => {}
        }
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pattern::Identifier { name, mutable } => {
                write!(f, "{}{name}", if *mutable { "mut " } else { "" })
            }
            Pattern::Wildcard => write!(f, "_"),
            Pattern::Tuple(fields) => {
                write!(f, "(")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{field}")?;
                }
                write!(f, ")")
            }
            Pattern::Literal(value) => write!(f, "{value}"),
        }
    }
}
