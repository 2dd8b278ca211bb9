//! Reference evaluator for circuits
//!
//! Runs a circuit one step at a time over in-memory Z-sets. It interprets the
//! expression IR directly and is meant for checking compiled circuits in
//! tests, not for production use.

use crate::circuit::Circuit;
use crate::error::{CircuitError, CircuitResult};
use crate::operator::{OperatorId, OperatorKind};
use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use std::collections::HashMap;
use zf_ir::{
    BinaryOp, Expr, ExprKind, LiteralValue, Pattern, Statement, Type, TypeKind, UnaryOp,
    ZSetLiteral,
};

/// Runtime value of an expression. NULL is [`Value::Null`]; tuples, raw
/// tuples and structs are all [`Value::Tuple`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i128),
    Float(OrderedFloat<f64>),
    Decimal(String),
    String(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    Interval(i64),
    GeoPoint(OrderedFloat<f64>, OrderedFloat<f64>),
    Tuple(Vec<Value>),
    Vec(Vec<Value>),
}

impl Value {
    pub fn tuple(fields: impl IntoIterator<Item = Value>) -> Self {
        Value::Tuple(fields.into_iter().collect())
    }

    pub fn int(value: i64) -> Self {
        Value::Int(value.into())
    }

    pub fn float(value: f64) -> Self {
        Value::Float(OrderedFloat(value))
    }

    fn unit() -> Self {
        Value::Tuple(Vec::new())
    }
}

impl From<&LiteralValue> for Value {
    fn from(value: &LiteralValue) -> Self {
        match value {
            LiteralValue::Bool(b) => Value::Bool(*b),
            LiteralValue::Int(i) => Value::Int(*i),
            LiteralValue::Float(f) => Value::Float(*f),
            LiteralValue::Decimal(d) => Value::Decimal(d.clone()),
            LiteralValue::String(s) => Value::String(s.clone()),
            LiteralValue::Date(d) => Value::Date(*d),
            LiteralValue::Timestamp(t) => Value::Timestamp(*t),
            LiteralValue::Interval(i) => Value::Interval(*i),
            LiteralValue::GeoPoint(x, y) => Value::GeoPoint(*x, *y),
        }
    }
}

/// Z-set of runtime values. Indexed Z-sets hold `(key, value)` tuples.
pub type ZSetValue = IndexMap<Value, i64>;

fn fail(message: impl Into<String>) -> CircuitError {
    CircuitError::Evaluation(message.into())
}

fn add_weight(set: &mut ZSetValue, value: Value, weight: i64) -> CircuitResult<()> {
    if weight == 0 {
        return Ok(());
    }
    let current = set.get(&value).copied().unwrap_or(0);
    let total = current
        .checked_add(weight)
        .ok_or_else(|| fail("weight overflow"))?;
    if total == 0 {
        set.shift_remove(&value);
    } else {
        set.insert(value, total);
    }
    Ok(())
}

fn merge(into: &mut ZSetValue, from: &ZSetValue, sign: i64) -> CircuitResult<()> {
    for (value, weight) in from {
        let weight = weight
            .checked_mul(sign)
            .ok_or_else(|| fail("weight overflow"))?;
        add_weight(into, value.clone(), weight)?;
    }
    Ok(())
}

fn as_pair(value: &Value) -> CircuitResult<(&Value, &Value)> {
    match value {
        Value::Tuple(fields) if fields.len() == 2 => Ok((&fields[0], &fields[1])),
        other => Err(fail(format!("expected a (key, value) pair, found {other:?}"))),
    }
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> CircuitResult<Value> {
    let result = match (left, right) {
        (Value::Int(l), Value::Int(r)) => {
            let value = match op {
                BinaryOp::Add => l.checked_add(*r),
                BinaryOp::Sub => l.checked_sub(*r),
                BinaryOp::Mul => l.checked_mul(*r),
                BinaryOp::Div if *r == 0 => return Err(fail("division by zero")),
                BinaryOp::Div => l.checked_div(*r),
                BinaryOp::Mod if *r == 0 => return Err(fail("division by zero")),
                BinaryOp::Mod => l.checked_rem(*r),
                _ => return Err(fail(format!("{op} is not arithmetic"))),
            };
            Value::Int(value.ok_or_else(|| fail(format!("overflow in {l} {op} {r}")))?)
        }
        (Value::Int(l), Value::Float(_)) => {
            return arithmetic(op, &Value::float(*l as f64), right)
        }
        (Value::Float(_), Value::Int(r)) => {
            return arithmetic(op, left, &Value::float(*r as f64))
        }
        (Value::Float(l), Value::Float(r)) => Value::Float(match op {
            BinaryOp::Add => *l + *r,
            BinaryOp::Sub => *l - *r,
            BinaryOp::Mul => *l * *r,
            BinaryOp::Div => *l / *r,
            BinaryOp::Mod => *l % *r,
            _ => return Err(fail(format!("{op} is not arithmetic"))),
        }),
        (Value::String(l), Value::String(r)) if op == BinaryOp::Concat => {
            Value::String(format!("{l}{r}"))
        }
        _ => return Err(fail(format!("cannot apply {op} to {left:?} and {right:?}"))),
    };
    Ok(result)
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> CircuitResult<Value> {
    let ordering = match (left, right) {
        (Value::Int(l), Value::Float(r)) => OrderedFloat(*l as f64).cmp(r),
        (Value::Float(l), Value::Int(r)) => l.cmp(&OrderedFloat(*r as f64)),
        _ if std::mem::discriminant(left) == std::mem::discriminant(right) => left.cmp(right),
        _ => return Err(fail(format!("cannot compare {left:?} with {right:?}"))),
    };
    let result = match op {
        BinaryOp::Eq => ordering.is_eq(),
        BinaryOp::Neq => ordering.is_ne(),
        BinaryOp::Lt => ordering.is_lt(),
        BinaryOp::Lte => ordering.is_le(),
        BinaryOp::Gt => ordering.is_gt(),
        BinaryOp::Gte => ordering.is_ge(),
        _ => return Err(fail(format!("{op} is not a comparison"))),
    };
    Ok(Value::Bool(result))
}

fn logical(op: BinaryOp, left: &Value, right: &Value) -> CircuitResult<Value> {
    let absorbing = op == BinaryOp::Or;
    match (left, right) {
        (Value::Bool(l), _) if *l == absorbing => Ok(Value::Bool(absorbing)),
        (_, Value::Bool(r)) if *r == absorbing => Ok(Value::Bool(absorbing)),
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
        (Value::Bool(_), Value::Bool(_)) => Ok(Value::Bool(!absorbing)),
        _ => Err(fail(format!("cannot apply {op} to {left:?} and {right:?}"))),
    }
}

/// Aggregate combinators skip NULL operands
fn aggregate(op: BinaryOp, left: &Value, right: &Value) -> CircuitResult<Value> {
    match (left, right) {
        (Value::Null, other) | (other, Value::Null) => Ok(other.clone()),
        _ => match op {
            BinaryOp::AggPlus => arithmetic(BinaryOp::Add, left, right),
            BinaryOp::AggMin => Ok(if compare(BinaryOp::Lte, left, right)? == Value::Bool(true) {
                left.clone()
            } else {
                right.clone()
            }),
            _ => Ok(if compare(BinaryOp::Gte, left, right)? == Value::Bool(true) {
                left.clone()
            } else {
                right.clone()
            }),
        },
    }
}

fn cast(value: Value, ty: &Type) -> CircuitResult<Value> {
    if value == Value::Null {
        return Ok(Value::Null);
    }
    let result = match (ty.kind(), value) {
        (TypeKind::Integer { .. }, Value::Int(i)) => Value::Int(i),
        (TypeKind::Integer { .. }, Value::Float(f)) => Value::Int(f.0.trunc() as i128),
        (TypeKind::Integer { .. }, Value::Bool(b)) => Value::Int(b.into()),
        (TypeKind::Float { .. }, Value::Int(i)) => Value::float(i as f64),
        (TypeKind::Float { .. }, Value::Float(f)) => Value::Float(f),
        (TypeKind::Float { .. }, Value::String(s)) => Value::float(
            s.trim()
                .parse()
                .map_err(|_| fail(format!("cannot cast {s:?} to {ty}")))?,
        ),
        (TypeKind::Integer { .. }, Value::String(s)) => Value::Int(
            s.trim()
                .parse()
                .map_err(|_| fail(format!("cannot cast {s:?} to {ty}")))?,
        ),
        (TypeKind::String | TypeKind::Str, Value::Int(i)) => Value::String(i.to_string()),
        (TypeKind::String | TypeKind::Str, Value::Float(f)) => Value::String(f.to_string()),
        (TypeKind::String | TypeKind::Str, Value::Bool(b)) => Value::String(b.to_string()),
        (TypeKind::Bool, Value::Int(i)) => Value::Bool(i != 0),
        (_, other) => other,
    };
    Ok(result)
}

/// Expression interpreter with lexical scopes
#[derive(Default)]
struct Interpreter {
    scopes: Vec<HashMap<String, Value>>,
}

impl Interpreter {
    fn lookup(&self, name: &str) -> CircuitResult<Value> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .cloned()
            .ok_or_else(|| fail(format!("unbound variable '{name}'")))
    }

    fn variable_mut(&mut self, name: &str) -> CircuitResult<&mut Value> {
        self.scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.get_mut(name))
            .ok_or_else(|| fail(format!("unbound variable '{name}'")))
    }

    fn bind(&mut self, name: &str, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), value);
        }
    }

    /// Run `body` in a fresh scope
    fn scoped<T>(
        &mut self,
        body: impl FnOnce(&mut Self) -> CircuitResult<T>,
    ) -> CircuitResult<T> {
        self.scopes.push(HashMap::new());
        let result = body(self);
        self.scopes.pop();
        result
    }

    /// Bind `pattern` to `value` in the innermost scope. Returns false when
    /// the value does not match.
    fn bind_pattern(&mut self, pattern: &Pattern, value: &Value) -> CircuitResult<bool> {
        match pattern {
            Pattern::Identifier { name, .. } => {
                self.bind(name, value.clone());
                Ok(true)
            }
            Pattern::Wildcard => Ok(true),
            Pattern::Tuple(fields) => match value {
                Value::Tuple(values) if values.len() == fields.len() => {
                    for (field, value) in fields.iter().zip(values) {
                        if !self.bind_pattern(field, value)? {
                            return Ok(false);
                        }
                    }
                    Ok(true)
                }
                _ => Ok(false),
            },
            Pattern::Literal(expr) => Ok(self.eval(expr)? == *value),
        }
    }

    fn apply(&mut self, function: &Expr, args: &[Value]) -> CircuitResult<Value> {
        let ExprKind::Closure { params, body } = function.kind() else {
            return Err(fail(format!("{function} is not a closure")));
        };
        if params.len() != args.len() {
            return Err(fail(format!(
                "closure takes {} argument(s), got {}",
                params.len(),
                args.len()
            )));
        }
        self.scoped(|this| {
            for (param, arg) in params.iter().zip(args) {
                if !this.bind_pattern(&param.pattern, arg)? {
                    return Err(fail(format!("argument does not match {}", param.pattern)));
                }
            }
            this.eval(body)
        })
    }

    fn statement(&mut self, statement: &Statement) -> CircuitResult<()> {
        match statement {
            Statement::Let { name, init, .. } => {
                let value = match init {
                    Some(init) => self.eval(init)?,
                    None => Value::Null,
                };
                self.bind(name, value);
            }
            Statement::Expression(expr) => {
                self.eval(expr)?;
            }
        }
        Ok(())
    }

    /// Location assigned to by `target`: a variable, or nested fields of one
    fn place(&mut self, target: &Expr) -> CircuitResult<&mut Value> {
        match target.kind() {
            ExprKind::Variable(name) => self.variable_mut(name),
            ExprKind::Field { expr, index } => match self.place(expr)? {
                Value::Tuple(fields) => fields
                    .get_mut(*index)
                    .ok_or_else(|| fail(format!("no field {index}"))),
                other => Err(fail(format!("cannot assign a field of {other:?}"))),
            },
            ExprKind::Deref(inner) => self.place(inner),
            _ => Err(fail(format!("cannot assign to {target}"))),
        }
    }

    fn eval(&mut self, expr: &Expr) -> CircuitResult<Value> {
        let value = match expr.kind() {
            ExprKind::Literal(None) => Value::Null,
            ExprKind::Literal(Some(value)) => value.into(),
            ExprKind::Variable(name) => self.lookup(name)?,
            ExprKind::Field { expr, index } => match self.eval(expr)? {
                Value::Null => Value::Null,
                Value::Tuple(mut fields) if *index < fields.len() => fields.swap_remove(*index),
                other => return Err(fail(format!("no field {index} in {other:?}"))),
            },
            ExprKind::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                if op.is_logical() {
                    logical(*op, &left, &right)?
                } else if op.is_aggregate() {
                    aggregate(*op, &left, &right)?
                } else if left == Value::Null || right == Value::Null {
                    Value::Null
                } else if op.is_comparison() {
                    compare(*op, &left, &right)?
                } else {
                    arithmetic(*op, &left, &right)?
                }
            }
            ExprKind::Unary { op, operand } => {
                let operand = self.eval(operand)?;
                match (op, operand) {
                    (UnaryOp::IsNull, v) => Value::Bool(v == Value::Null),
                    (UnaryOp::IsNotNull, v) => Value::Bool(v != Value::Null),
                    (UnaryOp::WrapBool, v) => Value::Bool(v == Value::Bool(true)),
                    (_, Value::Null) => Value::Null,
                    (UnaryOp::Not, Value::Bool(b)) => Value::Bool(!b),
                    (UnaryOp::Neg, Value::Int(i)) => Value::Int(-i),
                    (UnaryOp::Neg, Value::Float(f)) => Value::Float(-f),
                    (UnaryOp::Plus, v @ (Value::Int(_) | Value::Float(_))) => v,
                    (op, v) => return Err(fail(format!("cannot apply {op} to {v:?}"))),
                }
            }
            ExprKind::Cast { expr: inner } => {
                let value = self.eval(inner)?;
                match expr.ty() {
                    Some(ty) => cast(value, ty)?,
                    None => value,
                }
            }
            ExprKind::Apply { .. } | ExprKind::Path(_) => {
                return Err(fail(format!("cannot evaluate {expr}")))
            }
            ExprKind::Closure { .. } => return Err(fail("closures are not values")),
            ExprKind::Block { statements, last } => self.scoped(|this| {
                for statement in statements {
                    this.statement(statement)?;
                }
                match last {
                    Some(last) => this.eval(last),
                    None => Ok(Value::unit()),
                }
            })?,
            ExprKind::If {
                condition,
                positive,
                negative,
            } => {
                if self.eval(condition)? == Value::Bool(true) {
                    self.eval(positive)?
                } else if let Some(negative) = negative {
                    self.eval(negative)?
                } else {
                    Value::unit()
                }
            }
            ExprKind::Match { matched, cases } => {
                let matched = self.eval(matched)?;
                let mut result = None;
                for case in cases {
                    let outcome = self.scoped(|this| {
                        if this.bind_pattern(&case.pattern, &matched)? {
                            this.eval(&case.result).map(Some)
                        } else {
                            Ok(None)
                        }
                    })?;
                    if outcome.is_some() {
                        result = outcome;
                        break;
                    }
                }
                result.ok_or_else(|| fail(format!("no case matches {matched:?}")))?
            }
            ExprKind::For {
                pattern,
                iterated,
                block,
            } => {
                let items = match self.eval(iterated)? {
                    Value::Vec(items) => items,
                    other => return Err(fail(format!("cannot iterate over {other:?}"))),
                };
                for item in &items {
                    self.scoped(|this| {
                        if !this.bind_pattern(pattern, item)? {
                            return Err(fail(format!("{item:?} does not match {pattern}")));
                        }
                        this.eval(block)
                    })?;
                }
                Value::unit()
            }
            ExprKind::Assign { target, value } => {
                let value = self.eval(value)?;
                *self.place(target)? = value;
                Value::unit()
            }
            ExprKind::Tuple(fields) | ExprKind::RawTuple(fields) | ExprKind::Struct { fields } => {
                Value::Tuple(
                    fields
                        .iter()
                        .map(|field| self.eval(field))
                        .collect::<CircuitResult<_>>()?,
                )
            }
            ExprKind::QualifyType { expr, .. } => self.eval(expr)?,
            ExprKind::Borrow { expr, .. } | ExprKind::Deref(expr) => self.eval(expr)?,
            ExprKind::ZSet(_) => return Err(fail("Z-set literals are not row values")),
        };
        Ok(value)
    }
}

/// Evaluate a closed expression
pub fn evaluate(expr: &Expr) -> CircuitResult<Value> {
    Interpreter::default().eval(expr)
}

/// Call a closure expression on `args`
pub fn apply(function: &Expr, args: &[Value]) -> CircuitResult<Value> {
    Interpreter::default().apply(function, args)
}

/// Runtime contents of a Z-set literal
pub fn literal_value(literal: &ZSetLiteral) -> CircuitResult<ZSetValue> {
    let mut set = ZSetValue::new();
    for (element, weight) in literal.iter() {
        add_weight(&mut set, evaluate(element)?, weight)?;
    }
    Ok(set)
}

fn value_expr(value: &Value, ty: &Type) -> CircuitResult<Expr> {
    let expr = match (value, ty.kind()) {
        (Value::Null, _) => Expr::null(ty)?,
        (Value::Tuple(values), TypeKind::Tuple(types) | TypeKind::RawTuple(types))
            if values.len() == types.len() =>
        {
            let fields = values
                .iter()
                .zip(types)
                .map(|(v, t)| value_expr(v, t))
                .collect::<CircuitResult<Vec<_>>>()?;
            if matches!(ty.kind(), TypeKind::Tuple(_)) {
                Expr::tuple(fields)?
            } else {
                Expr::raw_tuple(fields)?
            }
        }
        (Value::Bool(b), _) => Expr::literal(Some(LiteralValue::Bool(*b)), ty.clone())?,
        (Value::Int(i), _) => Expr::literal(Some(LiteralValue::Int(*i)), ty.clone())?,
        (Value::Float(f), _) => Expr::literal(Some(LiteralValue::Float(*f)), ty.clone())?,
        (Value::Decimal(d), _) => Expr::literal(Some(LiteralValue::Decimal(d.clone())), ty.clone())?,
        (Value::String(s), _) => Expr::literal(Some(LiteralValue::String(s.clone())), ty.clone())?,
        (Value::Date(d), _) => Expr::literal(Some(LiteralValue::Date(*d)), ty.clone())?,
        (Value::Timestamp(t), _) => Expr::literal(Some(LiteralValue::Timestamp(*t)), ty.clone())?,
        (Value::Interval(i), _) => Expr::literal(Some(LiteralValue::Interval(*i)), ty.clone())?,
        (Value::GeoPoint(x, y), _) => {
            Expr::literal(Some(LiteralValue::GeoPoint(*x, *y)), ty.clone())?
        }
        (other, _) => return Err(fail(format!("cannot express {other:?} as {ty}"))),
    };
    Ok(expr)
}

/// Convert runtime contents back into a Z-set literal of `element_type`
pub fn to_literal(set: &ZSetValue, element_type: &Type) -> CircuitResult<ZSetLiteral> {
    let mut literal = ZSetLiteral::empty(element_type.clone());
    for (value, weight) in set {
        literal = literal.add_element(value_expr(value, element_type)?, *weight)?;
    }
    Ok(literal)
}

/// Steps a circuit over in-memory Z-sets, keeping the state of integrals and
/// differentials between steps
pub struct CircuitEvaluator<'a> {
    circuit: &'a Circuit,
    integrals: HashMap<OperatorId, ZSetValue>,
    previous: HashMap<OperatorId, ZSetValue>,
}

impl<'a> CircuitEvaluator<'a> {
    pub fn new(circuit: &'a Circuit) -> Self {
        Self {
            circuit,
            integrals: HashMap::new(),
            previous: HashMap::new(),
        }
    }

    /// Run one step. `inputs` maps table names to the Z-set fed to their
    /// source; missing tables receive the empty Z-set. Returns the contents
    /// of every sink by name.
    pub fn step(
        &mut self,
        inputs: &HashMap<String, ZSetValue>,
    ) -> CircuitResult<IndexMap<String, ZSetValue>> {
        let circuit = self.circuit;
        let mut streams: Vec<ZSetValue> = Vec::with_capacity(circuit.len());
        let mut outputs = IndexMap::new();
        let mut interpreter = Interpreter::default();
        for (id, op) in circuit.iter() {
            let input = |n: usize| -> CircuitResult<&ZSetValue> {
                op.inputs()
                    .get(n)
                    .and_then(|input| streams.get(input.index()))
                    .ok_or_else(|| fail(format!("{id} reads a missing input")))
            };
            let function = || {
                op.function()
                    .ok_or_else(|| fail(format!("{id} has no function")))
            };
            let mut out = ZSetValue::new();
            match op.kind() {
                OperatorKind::Source { table, .. } => {
                    if let Some(data) = inputs.get(table) {
                        out = data.clone();
                    }
                }
                OperatorKind::Constant { value } => out = literal_value(value)?,
                OperatorKind::Map { .. } => {
                    for (row, weight) in input(0)? {
                        let mapped = interpreter.apply(function()?, std::slice::from_ref(row))?;
                        add_weight(&mut out, mapped, *weight)?;
                    }
                }
                OperatorKind::Filter => {
                    for (row, weight) in input(0)? {
                        let keep = interpreter.apply(function()?, std::slice::from_ref(row))?;
                        if keep == Value::Bool(true) {
                            add_weight(&mut out, row.clone(), *weight)?;
                        }
                    }
                }
                OperatorKind::Index { .. } => {
                    for (row, weight) in input(0)? {
                        let pair = interpreter.apply(function()?, std::slice::from_ref(row))?;
                        let (key, value) = as_pair(&pair)?;
                        add_weight(&mut out, Value::tuple([key.clone(), value.clone()]), *weight)?;
                    }
                }
                OperatorKind::Aggregate { .. } => {
                    let mut groups: IndexMap<Value, Vec<Value>> = IndexMap::new();
                    for (pair, weight) in input(0)? {
                        let (key, value) = as_pair(pair)?;
                        groups
                            .entry(key.clone())
                            .or_default()
                            .push(Value::tuple([value.clone(), Value::int(*weight)]));
                    }
                    for (key, group) in groups {
                        let result =
                            interpreter.apply(function()?, &[key.clone(), Value::Vec(group)])?;
                        add_weight(&mut out, Value::tuple([key, result]), 1)?;
                    }
                }
                OperatorKind::Join { .. } => {
                    let right = input(1)?;
                    for (left_pair, left_weight) in input(0)? {
                        let (key, left_value) = as_pair(left_pair)?;
                        for (right_pair, right_weight) in right {
                            let (right_key, right_value) = as_pair(right_pair)?;
                            if right_key != key {
                                continue;
                            }
                            let joined = interpreter.apply(
                                function()?,
                                &[key.clone(), left_value.clone(), right_value.clone()],
                            )?;
                            let weight = left_weight
                                .checked_mul(*right_weight)
                                .ok_or_else(|| fail("weight overflow"))?;
                            add_weight(&mut out, joined, weight)?;
                        }
                    }
                }
                OperatorKind::Sum => {
                    for n in 0..op.inputs().len() {
                        merge(&mut out, input(n)?, 1)?;
                    }
                }
                OperatorKind::Subtract => {
                    merge(&mut out, input(0)?, 1)?;
                    merge(&mut out, input(1)?, -1)?;
                }
                OperatorKind::Negate => merge(&mut out, input(0)?, -1)?,
                OperatorKind::Distinct => {
                    for (row, weight) in input(0)? {
                        if *weight > 0 {
                            out.insert(row.clone(), 1);
                        }
                    }
                }
                OperatorKind::Integral => {
                    let state = self.integrals.entry(id).or_default();
                    merge(state, input(0)?, 1)?;
                    out = state.clone();
                }
                OperatorKind::Differential => {
                    let current = input(0)?.clone();
                    out = current.clone();
                    if let Some(previous) = self.previous.insert(id, current) {
                        merge(&mut out, &previous, -1)?;
                    }
                }
                OperatorKind::Noop => out = input(0)?.clone(),
                OperatorKind::Sink { name, .. } => {
                    out = input(0)?.clone();
                    outputs.insert(name.clone(), out.clone());
                }
            }
            streams.push(out);
        }
        Ok(outputs)
    }

    /// [`Self::step`] with inputs given as Z-set literals
    pub fn step_literals(
        &mut self,
        inputs: &IndexMap<String, ZSetLiteral>,
    ) -> CircuitResult<IndexMap<String, ZSetValue>> {
        let inputs = inputs
            .iter()
            .map(|(table, literal)| -> CircuitResult<(String, ZSetValue)> {
                Ok((table.clone(), literal_value(literal)?))
            })
            .collect::<CircuitResult<HashMap<_, _>>>()?;
        self.step(&inputs)
    }
}

#[cfg(test)]
#[path = "eval_test.rs"]
mod tests;
