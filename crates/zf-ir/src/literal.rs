//! Literal values carried by literal expressions

use crate::error::{IrError, IrResult};
use crate::types::{integer_range, Type, TypeKind};
use chrono::{NaiveDate, NaiveDateTime};
use ordered_float::OrderedFloat;

/// A non-NULL literal value. SQL NULL is represented by the absence of a
/// value on a nullable type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LiteralValue {
    Bool(bool),
    /// Integer of any width; range is checked against the literal's type
    Int(i128),
    Float(OrderedFloat<f64>),
    /// Exact decimal kept in its textual form
    Decimal(String),
    String(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    /// Interval in the unit of its type
    Interval(i64),
    GeoPoint(OrderedFloat<f64>, OrderedFloat<f64>),
}

impl LiteralValue {
    /// Check that this value can inhabit `ty`
    pub(crate) fn check(&self, ty: &Type) -> IrResult<()> {
        let ok = match (self, ty.kind()) {
            (LiteralValue::Bool(_), TypeKind::Bool) => true,
            (LiteralValue::Int(v), TypeKind::Integer { bits, signed }) => {
                let (min, max) = integer_range(*bits, *signed);
                if *v < min || *v > max {
                    return Err(IrError::malformed(
                        format!("literal of type {ty}"),
                        format!("value {v} out of range"),
                    ));
                }
                true
            }
            (LiteralValue::Float(_), TypeKind::Float { .. }) => true,
            (LiteralValue::Decimal(_), TypeKind::Decimal) => true,
            (LiteralValue::String(_), TypeKind::String | TypeKind::Str) => true,
            (LiteralValue::Date(_), TypeKind::Date) => true,
            (LiteralValue::Timestamp(_), TypeKind::Timestamp) => true,
            (LiteralValue::Interval(_), TypeKind::Interval(_)) => true,
            (LiteralValue::GeoPoint(..), TypeKind::GeoPoint) => true,
            _ => false,
        };
        if ok {
            Ok(())
        } else {
            Err(IrError::mismatch("literal", ty, self.describe()))
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            LiteralValue::Bool(_) => "bool value",
            LiteralValue::Int(_) => "integer value",
            LiteralValue::Float(_) => "float value",
            LiteralValue::Decimal(_) => "decimal value",
            LiteralValue::String(_) => "string value",
            LiteralValue::Date(_) => "date value",
            LiteralValue::Timestamp(_) => "timestamp value",
            LiteralValue::Interval(_) => "interval value",
            LiteralValue::GeoPoint(..) => "geo point value",
        }
    }
}

impl std::fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LiteralValue::Bool(b) => write!(f, "{b}"),
            LiteralValue::Int(v) => write!(f, "{v}"),
            LiteralValue::Float(v) => write!(f, "{:?}", v.into_inner()),
            LiteralValue::Decimal(d) => write!(f, "Decimal::from_str({d:?})"),
            LiteralValue::String(s) => write!(f, "{s:?}"),
            LiteralValue::Date(d) => write!(f, "Date::from({:?})", d.to_string()),
            LiteralValue::Timestamp(t) => write!(f, "Timestamp::from({:?})", t.to_string()),
            LiteralValue::Interval(v) => write!(f, "Interval::new({v})"),
            LiteralValue::GeoPoint(x, y) => {
                write!(f, "GeoPoint::new({:?}, {:?})", x.into_inner(), y.into_inner())
            }
        }
    }
}
