//! Type IR for circuit expressions and operators

use crate::error::{IrError, IrResult};
use crate::expr::Expr;
use crate::literal::LiteralValue;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Valid bit widths for integer types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IntBitWidth {
    /// 8-bit (TINYINT)
    I8,
    /// 16-bit (SMALLINT)
    I16,
    /// 32-bit (INTEGER)
    I32,
    /// 64-bit (BIGINT)
    I64,
}

impl IntBitWidth {
    /// Width in bits
    pub fn bits(self) -> u32 {
        match self {
            IntBitWidth::I8 => 8,
            IntBitWidth::I16 => 16,
            IntBitWidth::I32 => 32,
            IntBitWidth::I64 => 64,
        }
    }
}

impl std::fmt::Display for IntBitWidth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.bits())
    }
}

/// Valid bit widths for floating-point types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FloatBitWidth {
    /// 32-bit (REAL)
    F32,
    /// 64-bit (DOUBLE)
    F64,
}

impl std::fmt::Display for FloatBitWidth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FloatBitWidth::F32 => write!(f, "32"),
            FloatBitWidth::F64 => write!(f, "64"),
        }
    }
}

/// Resolution of an interval type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntervalUnit {
    /// Day-time intervals, counted in milliseconds
    Millis,
    /// Year-month intervals, counted in months
    Months,
}

/// Named field of a struct type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructField {
    pub name: String,
    pub ty: Type,
}

/// The shape of a type, without its nullability
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    Bool,
    Integer { bits: IntBitWidth, signed: bool },
    Float { bits: FloatBitWidth },
    Decimal,
    /// Owned string
    String,
    /// Borrowed string slice
    Str,
    Date,
    Timestamp,
    Interval(IntervalUnit),
    GeoPoint,
    /// Type of the NULL literal; always nullable
    Null,
    /// Placeholder for a type that is inferred later
    Any,
    /// Named tuple type (`TupN<..>`)
    Tuple(Vec<Type>),
    /// Anonymous tuple `(A, B)`; the empty raw tuple is the unit type
    RawTuple(Vec<Type>),
    Struct {
        name: String,
        fields: Vec<StructField>,
    },
    Vec(Box<Type>),
    ZSet {
        element: Box<Type>,
        weight: Box<Type>,
    },
    IndexedZSet {
        key: Box<Type>,
        value: Box<Type>,
        weight: Box<Type>,
    },
    /// Function type; `result` is `None` when the body has no value
    Function {
        result: Option<Box<Type>>,
        params: Vec<Type>,
    },
    /// Reference type; never nullable
    Reference { inner: Box<Type>, mutable: bool },
    /// Nominal type from the runtime library
    User { name: String, args: Vec<Type> },
}

/// A type in the circuit IR
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "SerializedType")]
pub struct Type {
    kind: TypeKind,
    may_be_null: bool,
}

/// Unchecked form of [`Type`]; deserialized types go through
/// [`Type::set_may_be_null`]
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SerializedType {
    kind: TypeKind,
    may_be_null: bool,
}

impl TryFrom<SerializedType> for Type {
    type Error = IrError;

    fn try_from(serialized: SerializedType) -> IrResult<Type> {
        Type::new(serialized.kind).set_may_be_null(serialized.may_be_null)
    }
}

#[derive(Clone, Copy)]
enum NumericConstant {
    Zero,
    One,
    Min,
    Max,
}

/// Inclusive value range of an integer type
pub(crate) fn integer_range(bits: IntBitWidth, signed: bool) -> (i128, i128) {
    let width = bits.bits();
    if signed {
        let half = 1i128 << (width - 1);
        (-half, half - 1)
    } else {
        (0, (1i128 << width) - 1)
    }
}

impl Type {
    /// Create a non-nullable type of the given kind (`Null` is always nullable)
    pub fn new(kind: TypeKind) -> Self {
        let may_be_null = matches!(kind, TypeKind::Null);
        Self { kind, may_be_null }
    }

    pub fn bool() -> Self {
        Self::new(TypeKind::Bool)
    }

    pub fn integer(bits: IntBitWidth, signed: bool) -> Self {
        Self::new(TypeKind::Integer { bits, signed })
    }

    pub fn signed32() -> Self {
        Self::integer(IntBitWidth::I32, true)
    }

    pub fn signed64() -> Self {
        Self::integer(IntBitWidth::I64, true)
    }

    pub fn float(bits: FloatBitWidth) -> Self {
        Self::new(TypeKind::Float { bits })
    }

    pub fn double() -> Self {
        Self::float(FloatBitWidth::F64)
    }

    pub fn string() -> Self {
        Self::new(TypeKind::String)
    }

    pub fn null() -> Self {
        Self::new(TypeKind::Null)
    }

    pub fn any() -> Self {
        Self::new(TypeKind::Any)
    }

    /// The unit type `()`
    pub fn unit() -> Self {
        Self::raw_tuple(Vec::new())
    }

    pub fn tuple(fields: Vec<Type>) -> Self {
        Self::new(TypeKind::Tuple(fields))
    }

    pub fn raw_tuple(fields: Vec<Type>) -> Self {
        Self::new(TypeKind::RawTuple(fields))
    }

    pub fn structure(name: impl Into<String>, fields: Vec<StructField>) -> Self {
        Self::new(TypeKind::Struct {
            name: name.into(),
            fields,
        })
    }

    pub fn vec(element: Type) -> Self {
        Self::new(TypeKind::Vec(Box::new(element)))
    }

    /// The weight type shared by every Z-set in a compilation
    pub fn weight() -> Self {
        Self::signed64()
    }

    pub fn zset(element: Type) -> Self {
        Self::new(TypeKind::ZSet {
            element: Box::new(element),
            weight: Box::new(Self::weight()),
        })
    }

    pub fn indexed_zset(key: Type, value: Type) -> Self {
        Self::new(TypeKind::IndexedZSet {
            key: Box::new(key),
            value: Box::new(value),
            weight: Box::new(Self::weight()),
        })
    }

    pub fn function(result: Option<Type>, params: Vec<Type>) -> Self {
        Self::new(TypeKind::Function {
            result: result.map(Box::new),
            params,
        })
    }

    pub fn reference(inner: Type, mutable: bool) -> Self {
        Self::new(TypeKind::Reference {
            inner: Box::new(inner),
            mutable,
        })
    }

    pub fn user(name: impl Into<String>, args: Vec<Type>) -> Self {
        Self::new(TypeKind::User {
            name: name.into(),
            args,
        })
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    pub fn may_be_null(&self) -> bool {
        self.may_be_null
    }

    /// Deep structural equality, including nullability
    pub fn same_type(&self, other: &Type) -> bool {
        self == other
    }

    /// Return a copy of this type with the given nullability.
    ///
    /// Fails for nullable references and non-nullable `Null`.
    pub fn set_may_be_null(&self, may_be_null: bool) -> IrResult<Type> {
        if self.may_be_null == may_be_null {
            return Ok(self.clone());
        }
        match self.kind {
            TypeKind::Reference { .. } if may_be_null => Err(IrError::malformed(
                format!("type {self}"),
                "reference types cannot be nullable",
            )),
            TypeKind::Null if !may_be_null => Err(IrError::malformed(
                "type ()",
                "the NULL type is always nullable",
            )),
            _ => Ok(Type {
                kind: self.kind.clone(),
                may_be_null,
            }),
        }
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.kind, TypeKind::Bool)
    }

    pub fn is_integer(&self) -> bool {
        matches!(self.kind, TypeKind::Integer { .. })
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::Integer { .. } | TypeKind::Float { .. } | TypeKind::Decimal
        )
    }

    /// Types a cast converts between
    pub fn is_scalar(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::Bool
                | TypeKind::Integer { .. }
                | TypeKind::Float { .. }
                | TypeKind::Decimal
                | TypeKind::String
                | TypeKind::Str
                | TypeKind::Date
                | TypeKind::Timestamp
                | TypeKind::Interval(_)
        )
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.kind, TypeKind::Reference { .. })
    }

    /// True for the empty raw tuple
    pub fn is_unit(&self) -> bool {
        matches!(&self.kind, TypeKind::RawTuple(fields) if fields.is_empty())
    }

    /// Strip one level of reference, if any
    pub fn deref(&self) -> &Type {
        match &self.kind {
            TypeKind::Reference { inner, .. } => inner,
            _ => self,
        }
    }

    /// Field types of a tuple or raw tuple
    pub fn tuple_fields(&self) -> Option<&[Type]> {
        match &self.kind {
            TypeKind::Tuple(fields) | TypeKind::RawTuple(fields) => Some(fields),
            _ => None,
        }
    }

    /// Element type of a collection: the element of a Z-set, or the raw
    /// tuple `(key, value)` of an indexed Z-set
    pub fn element_type(&self) -> Option<Type> {
        match &self.kind {
            TypeKind::ZSet { element, .. } => Some(element.as_ref().clone()),
            TypeKind::IndexedZSet { key, value, .. } => Some(Type::raw_tuple(vec![
                key.as_ref().clone(),
                value.as_ref().clone(),
            ])),
            _ => None,
        }
    }

    /// Unify two types for comparison or join keys by numeric promotion.
    /// The result is nullable when either input is.
    pub fn reduce(&self, other: &Type) -> IrResult<Type> {
        use TypeKind::*;
        let nullable = self.may_be_null || other.may_be_null;
        let kind = match (&self.kind, &other.kind) {
            (Null, k) | (k, Null) => k.clone(),
            (
                Integer {
                    bits: left,
                    signed: left_signed,
                },
                Integer {
                    bits: right,
                    signed: right_signed,
                },
            ) => Integer {
                bits: (*left).max(*right),
                signed: *left_signed || *right_signed,
            },
            (Float { bits: left }, Float { bits: right }) => Float {
                bits: (*left).max(*right),
            },
            (Integer { .. }, Float { bits }) | (Float { bits }, Integer { .. }) => {
                Float { bits: *bits }
            }
            (Decimal, Integer { .. }) | (Integer { .. }, Decimal) => Decimal,
            (Decimal, Float { bits }) | (Float { bits }, Decimal) => Float { bits: *bits },
            (left, right) if left == right => left.clone(),
            _ => return Err(IrError::mismatch("type unification", self, other)),
        };
        Type::new(kind).set_may_be_null(nullable)
    }

    /// Literal zero of this numeric type
    pub fn zero(&self) -> IrResult<Expr> {
        self.numeric_constant(NumericConstant::Zero)
    }

    /// Literal one of this numeric type
    pub fn one(&self) -> IrResult<Expr> {
        self.numeric_constant(NumericConstant::One)
    }

    /// Smallest value representable by this numeric type
    pub fn min_value(&self) -> IrResult<Expr> {
        self.numeric_constant(NumericConstant::Min)
    }

    /// Largest value representable by this numeric type
    pub fn max_value(&self) -> IrResult<Expr> {
        self.numeric_constant(NumericConstant::Max)
    }

    fn numeric_constant(&self, which: NumericConstant) -> IrResult<Expr> {
        let value = match (&self.kind, which) {
            (TypeKind::Integer { bits, signed }, which) => {
                let (min, max) = integer_range(*bits, *signed);
                LiteralValue::Int(match which {
                    NumericConstant::Zero => 0,
                    NumericConstant::One => 1,
                    NumericConstant::Min => min,
                    NumericConstant::Max => max,
                })
            }
            (TypeKind::Float { bits }, which) => {
                let (min, max) = match bits {
                    FloatBitWidth::F32 => (f64::from(f32::MIN), f64::from(f32::MAX)),
                    FloatBitWidth::F64 => (f64::MIN, f64::MAX),
                };
                LiteralValue::Float(OrderedFloat(match which {
                    NumericConstant::Zero => 0.0,
                    NumericConstant::One => 1.0,
                    NumericConstant::Min => min,
                    NumericConstant::Max => max,
                }))
            }
            (TypeKind::Decimal, NumericConstant::Zero) => LiteralValue::Decimal("0".to_string()),
            (TypeKind::Decimal, NumericConstant::One) => LiteralValue::Decimal("1".to_string()),
            _ => {
                return Err(IrError::unimplemented(format!(
                    "numeric constant for type {self}"
                )))
            }
        };
        Expr::literal(Some(value), self.clone())
    }
}

fn write_list(f: &mut std::fmt::Formatter<'_>, types: &[Type]) -> std::fmt::Result {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{ty}")?;
    }
    Ok(())
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let wrap = self.may_be_null && !matches!(self.kind, TypeKind::Null);
        if wrap {
            write!(f, "Option<")?;
        }
        match &self.kind {
            TypeKind::Bool => write!(f, "bool")?,
            TypeKind::Integer { bits, signed } => {
                write!(f, "{}{}", if *signed { "i" } else { "u" }, bits)?
            }
            TypeKind::Float { bits } => write!(f, "f{bits}")?,
            TypeKind::Decimal => write!(f, "Decimal")?,
            TypeKind::String => write!(f, "String")?,
            TypeKind::Str => write!(f, "str")?,
            TypeKind::Date => write!(f, "Date")?,
            TypeKind::Timestamp => write!(f, "Timestamp")?,
            TypeKind::Interval(IntervalUnit::Millis) => write!(f, "ShortInterval")?,
            TypeKind::Interval(IntervalUnit::Months) => write!(f, "LongInterval")?,
            TypeKind::GeoPoint => write!(f, "GeoPoint")?,
            TypeKind::Null => write!(f, "()")?,
            TypeKind::Any => write!(f, "_")?,
            TypeKind::Tuple(fields) => {
                write!(f, "Tup{}", fields.len())?;
                if !fields.is_empty() {
                    write!(f, "<")?;
                    write_list(f, fields)?;
                    write!(f, ">")?;
                }
            }
            TypeKind::RawTuple(fields) => {
                write!(f, "(")?;
                write_list(f, fields)?;
                if fields.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")?;
            }
            TypeKind::Struct { name, .. } => write!(f, "{name}")?,
            TypeKind::Vec(element) => write!(f, "Vec<{element}>")?,
            TypeKind::ZSet { element, weight } => write!(f, "OrdZSet<{element}, {weight}>")?,
            TypeKind::IndexedZSet { key, value, weight } => {
                write!(f, "OrdIndexedZSet<{key}, {value}, {weight}>")?
            }
            TypeKind::Function { result, params } => {
                write!(f, "fn(")?;
                write_list(f, params)?;
                write!(f, ")")?;
                if let Some(result) = result {
                    write!(f, " -> {result}")?;
                }
            }
            TypeKind::Reference { inner, mutable } => {
                write!(f, "&{}{inner}", if *mutable { "mut " } else { "" })?
            }
            TypeKind::User { name, args } => {
                write!(f, "{name}")?;
                if !args.is_empty() {
                    write!(f, "<")?;
                    write_list(f, args)?;
                    write!(f, ">")?;
                }
            }
        }
        if wrap {
            write!(f, ">")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
