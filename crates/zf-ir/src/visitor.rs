//! Traversal over the expression IR
//!
//! [`InnerVisitor`] has one preorder/postorder pair per concrete node variant.
//! When [`InnerVisitor::visit_super`] is true, an unoverridden variant hook
//! delegates to the hook of its structural family, up to
//! [`InnerVisitor::preorder_node`]. When it is false, unoverridden hooks just
//! continue the traversal.
//!
//! Traversal order: the node's type (for expressions), then children left to
//! right. A block visits its statements, then its trailing expression. A
//! `for` visits the iterated expression before its pattern. Each match arm
//! is bracketed by the match-case hooks. A preorder hook returning `false`
//! skips the children and the postorder hook of that node.

use crate::expr::{Expr, ExprKind, MatchCase};
use crate::pattern::Pattern;
use crate::statement::Statement;
use crate::types::{Type, TypeKind};
use indexmap::IndexSet;

/// Any node of the inner IR
#[derive(Debug, Clone, Copy)]
pub enum InnerNode<'a> {
    Type(&'a Type),
    Expr(&'a Expr),
    Pattern(&'a Pattern),
    Statement(&'a Statement),
}

impl InnerNode<'_> {
    pub fn accept<V: InnerVisitor + ?Sized>(&self, visitor: &mut V) {
        match self {
            InnerNode::Type(ty) => ty.accept(visitor),
            InnerNode::Expr(expr) => expr.accept(visitor),
            InnerNode::Pattern(pattern) => pattern.accept(visitor),
            InnerNode::Statement(statement) => statement.accept(visitor),
        }
    }
}

/// Generates variant hooks that fall through to a parent hook when
/// `visit_super` is set
macro_rules! delegating_hooks {
    ($node:ty => $parent_pre:ident, $parent_post:ident { $($pre:ident, $post:ident;)* }) => {
        $(
            fn $pre(&mut self, node: &$node) -> bool {
                !self.visit_super() || self.$parent_pre(node)
            }

            fn $post(&mut self, node: &$node) {
                if self.visit_super() {
                    self.$parent_post(node)
                }
            }
        )*
    };
}

pub trait InnerVisitor {
    /// Whether variant hooks delegate to their family hooks
    fn visit_super(&self) -> bool {
        false
    }

    fn start_visit(&mut self) {}

    fn end_visit(&mut self) {}

    /// Visit `node` between `start_visit` and `end_visit`
    fn traverse(&mut self, node: InnerNode<'_>) {
        self.start_visit();
        node.accept(self);
        self.end_visit();
    }

    fn preorder_node(&mut self, _node: InnerNode<'_>) -> bool {
        true
    }

    fn postorder_node(&mut self, _node: InnerNode<'_>) {}

    fn preorder_type(&mut self, ty: &Type) -> bool {
        !self.visit_super() || self.preorder_node(InnerNode::Type(ty))
    }

    fn postorder_type(&mut self, ty: &Type) {
        if self.visit_super() {
            self.postorder_node(InnerNode::Type(ty))
        }
    }

    fn preorder_expr(&mut self, expr: &Expr) -> bool {
        !self.visit_super() || self.preorder_node(InnerNode::Expr(expr))
    }

    fn postorder_expr(&mut self, expr: &Expr) {
        if self.visit_super() {
            self.postorder_node(InnerNode::Expr(expr))
        }
    }

    fn preorder_pattern(&mut self, pattern: &Pattern) -> bool {
        !self.visit_super() || self.preorder_node(InnerNode::Pattern(pattern))
    }

    fn postorder_pattern(&mut self, pattern: &Pattern) {
        if self.visit_super() {
            self.postorder_node(InnerNode::Pattern(pattern))
        }
    }

    fn preorder_statement(&mut self, statement: &Statement) -> bool {
        !self.visit_super() || self.preorder_node(InnerNode::Statement(statement))
    }

    fn postorder_statement(&mut self, statement: &Statement) {
        if self.visit_super() {
            self.postorder_node(InnerNode::Statement(statement))
        }
    }

    delegating_hooks!(Type => preorder_type, postorder_type {
        preorder_base_type, postorder_base_type;
        preorder_tuple_base_type, postorder_tuple_base_type;
        preorder_user_base_type, postorder_user_base_type;
        preorder_struct_type, postorder_struct_type;
        preorder_function_type, postorder_function_type;
        preorder_reference_type, postorder_reference_type;
    });

    delegating_hooks!(Type => preorder_base_type, postorder_base_type {
        preorder_bool_type, postorder_bool_type;
        preorder_integer_type, postorder_integer_type;
        preorder_float_type, postorder_float_type;
        preorder_decimal_type, postorder_decimal_type;
        preorder_string_type, postorder_string_type;
        preorder_str_type, postorder_str_type;
        preorder_date_type, postorder_date_type;
        preorder_timestamp_type, postorder_timestamp_type;
        preorder_interval_type, postorder_interval_type;
        preorder_geo_point_type, postorder_geo_point_type;
        preorder_null_type, postorder_null_type;
        preorder_any_type, postorder_any_type;
    });

    delegating_hooks!(Type => preorder_tuple_base_type, postorder_tuple_base_type {
        preorder_tuple_type, postorder_tuple_type;
        preorder_raw_tuple_type, postorder_raw_tuple_type;
    });

    delegating_hooks!(Type => preorder_user_base_type, postorder_user_base_type {
        preorder_vec_type, postorder_vec_type;
        preorder_zset_type, postorder_zset_type;
        preorder_indexed_zset_type, postorder_indexed_zset_type;
        preorder_user_type, postorder_user_type;
    });

    delegating_hooks!(Expr => preorder_expr, postorder_expr {
        preorder_literal, postorder_literal;
        preorder_variable, postorder_variable;
        preorder_field, postorder_field;
        preorder_binary, postorder_binary;
        preorder_unary, postorder_unary;
        preorder_cast, postorder_cast;
        preorder_apply, postorder_apply;
        preorder_closure, postorder_closure;
        preorder_block, postorder_block;
        preorder_if, postorder_if;
        preorder_match, postorder_match;
        preorder_for, postorder_for;
        preorder_assign, postorder_assign;
        preorder_tuple_base, postorder_tuple_base;
        preorder_struct, postorder_struct;
        preorder_path, postorder_path;
        preorder_qualify_type, postorder_qualify_type;
        preorder_borrow, postorder_borrow;
        preorder_deref, postorder_deref;
        preorder_zset_literal, postorder_zset_literal;
    });

    delegating_hooks!(Expr => preorder_tuple_base, postorder_tuple_base {
        preorder_tuple, postorder_tuple;
        preorder_raw_tuple, postorder_raw_tuple;
    });

    delegating_hooks!(Pattern => preorder_pattern, postorder_pattern {
        preorder_identifier_pattern, postorder_identifier_pattern;
        preorder_wildcard_pattern, postorder_wildcard_pattern;
        preorder_tuple_pattern, postorder_tuple_pattern;
        preorder_literal_pattern, postorder_literal_pattern;
    });

    /// Called around each arm of a match; `false` skips the arm
    fn preorder_match_case(&mut self, _case: &MatchCase) -> bool {
        true
    }

    fn postorder_match_case(&mut self, _case: &MatchCase) {}

    delegating_hooks!(Statement => preorder_statement, postorder_statement {
        preorder_let, postorder_let;
        preorder_expression_statement, postorder_expression_statement;
    });
}

fn preorder_type<V: InnerVisitor + ?Sized>(visitor: &mut V, ty: &Type) -> bool {
    match ty.kind() {
        TypeKind::Bool => visitor.preorder_bool_type(ty),
        TypeKind::Integer { .. } => visitor.preorder_integer_type(ty),
        TypeKind::Float { .. } => visitor.preorder_float_type(ty),
        TypeKind::Decimal => visitor.preorder_decimal_type(ty),
        TypeKind::String => visitor.preorder_string_type(ty),
        TypeKind::Str => visitor.preorder_str_type(ty),
        TypeKind::Date => visitor.preorder_date_type(ty),
        TypeKind::Timestamp => visitor.preorder_timestamp_type(ty),
        TypeKind::Interval(_) => visitor.preorder_interval_type(ty),
        TypeKind::GeoPoint => visitor.preorder_geo_point_type(ty),
        TypeKind::Null => visitor.preorder_null_type(ty),
        TypeKind::Any => visitor.preorder_any_type(ty),
        TypeKind::Tuple(_) => visitor.preorder_tuple_type(ty),
        TypeKind::RawTuple(_) => visitor.preorder_raw_tuple_type(ty),
        TypeKind::Struct { .. } => visitor.preorder_struct_type(ty),
        TypeKind::Vec(_) => visitor.preorder_vec_type(ty),
        TypeKind::ZSet { .. } => visitor.preorder_zset_type(ty),
        TypeKind::IndexedZSet { .. } => visitor.preorder_indexed_zset_type(ty),
        TypeKind::Function { .. } => visitor.preorder_function_type(ty),
        TypeKind::Reference { .. } => visitor.preorder_reference_type(ty),
        TypeKind::User { .. } => visitor.preorder_user_type(ty),
    }
}

fn postorder_type<V: InnerVisitor + ?Sized>(visitor: &mut V, ty: &Type) {
    match ty.kind() {
        TypeKind::Bool => visitor.postorder_bool_type(ty),
        TypeKind::Integer { .. } => visitor.postorder_integer_type(ty),
        TypeKind::Float { .. } => visitor.postorder_float_type(ty),
        TypeKind::Decimal => visitor.postorder_decimal_type(ty),
        TypeKind::String => visitor.postorder_string_type(ty),
        TypeKind::Str => visitor.postorder_str_type(ty),
        TypeKind::Date => visitor.postorder_date_type(ty),
        TypeKind::Timestamp => visitor.postorder_timestamp_type(ty),
        TypeKind::Interval(_) => visitor.postorder_interval_type(ty),
        TypeKind::GeoPoint => visitor.postorder_geo_point_type(ty),
        TypeKind::Null => visitor.postorder_null_type(ty),
        TypeKind::Any => visitor.postorder_any_type(ty),
        TypeKind::Tuple(_) => visitor.postorder_tuple_type(ty),
        TypeKind::RawTuple(_) => visitor.postorder_raw_tuple_type(ty),
        TypeKind::Struct { .. } => visitor.postorder_struct_type(ty),
        TypeKind::Vec(_) => visitor.postorder_vec_type(ty),
        TypeKind::ZSet { .. } => visitor.postorder_zset_type(ty),
        TypeKind::IndexedZSet { .. } => visitor.postorder_indexed_zset_type(ty),
        TypeKind::Function { .. } => visitor.postorder_function_type(ty),
        TypeKind::Reference { .. } => visitor.postorder_reference_type(ty),
        TypeKind::User { .. } => visitor.postorder_user_type(ty),
    }
}

fn preorder_expr<V: InnerVisitor + ?Sized>(visitor: &mut V, expr: &Expr) -> bool {
    match expr.kind() {
        ExprKind::Literal(_) => visitor.preorder_literal(expr),
        ExprKind::Variable(_) => visitor.preorder_variable(expr),
        ExprKind::Field { .. } => visitor.preorder_field(expr),
        ExprKind::Binary { .. } => visitor.preorder_binary(expr),
        ExprKind::Unary { .. } => visitor.preorder_unary(expr),
        ExprKind::Cast { .. } => visitor.preorder_cast(expr),
        ExprKind::Apply { .. } => visitor.preorder_apply(expr),
        ExprKind::Closure { .. } => visitor.preorder_closure(expr),
        ExprKind::Block { .. } => visitor.preorder_block(expr),
        ExprKind::If { .. } => visitor.preorder_if(expr),
        ExprKind::Match { .. } => visitor.preorder_match(expr),
        ExprKind::For { .. } => visitor.preorder_for(expr),
        ExprKind::Assign { .. } => visitor.preorder_assign(expr),
        ExprKind::Tuple(_) => visitor.preorder_tuple(expr),
        ExprKind::RawTuple(_) => visitor.preorder_raw_tuple(expr),
        ExprKind::Struct { .. } => visitor.preorder_struct(expr),
        ExprKind::Path(_) => visitor.preorder_path(expr),
        ExprKind::QualifyType { .. } => visitor.preorder_qualify_type(expr),
        ExprKind::Borrow { .. } => visitor.preorder_borrow(expr),
        ExprKind::Deref(_) => visitor.preorder_deref(expr),
        ExprKind::ZSet(_) => visitor.preorder_zset_literal(expr),
    }
}

fn postorder_expr<V: InnerVisitor + ?Sized>(visitor: &mut V, expr: &Expr) {
    match expr.kind() {
        ExprKind::Literal(_) => visitor.postorder_literal(expr),
        ExprKind::Variable(_) => visitor.postorder_variable(expr),
        ExprKind::Field { .. } => visitor.postorder_field(expr),
        ExprKind::Binary { .. } => visitor.postorder_binary(expr),
        ExprKind::Unary { .. } => visitor.postorder_unary(expr),
        ExprKind::Cast { .. } => visitor.postorder_cast(expr),
        ExprKind::Apply { .. } => visitor.postorder_apply(expr),
        ExprKind::Closure { .. } => visitor.postorder_closure(expr),
        ExprKind::Block { .. } => visitor.postorder_block(expr),
        ExprKind::If { .. } => visitor.postorder_if(expr),
        ExprKind::Match { .. } => visitor.postorder_match(expr),
        ExprKind::For { .. } => visitor.postorder_for(expr),
        ExprKind::Assign { .. } => visitor.postorder_assign(expr),
        ExprKind::Tuple(_) => visitor.postorder_tuple(expr),
        ExprKind::RawTuple(_) => visitor.postorder_raw_tuple(expr),
        ExprKind::Struct { .. } => visitor.postorder_struct(expr),
        ExprKind::Path(_) => visitor.postorder_path(expr),
        ExprKind::QualifyType { .. } => visitor.postorder_qualify_type(expr),
        ExprKind::Borrow { .. } => visitor.postorder_borrow(expr),
        ExprKind::Deref(_) => visitor.postorder_deref(expr),
        ExprKind::ZSet(_) => visitor.postorder_zset_literal(expr),
    }
}

impl Type {
    /// Visit this type and its component types
    pub fn accept<V: InnerVisitor + ?Sized>(&self, visitor: &mut V) {
        if !preorder_type(visitor, self) {
            return;
        }
        match self.kind() {
            TypeKind::Tuple(fields) | TypeKind::RawTuple(fields) => {
                fields.iter().for_each(|field| field.accept(visitor))
            }
            TypeKind::Struct { fields, .. } => {
                fields.iter().for_each(|field| field.ty.accept(visitor))
            }
            TypeKind::Vec(element) => element.accept(visitor),
            TypeKind::ZSet { element, weight } => {
                element.accept(visitor);
                weight.accept(visitor);
            }
            TypeKind::IndexedZSet { key, value, weight } => {
                key.accept(visitor);
                value.accept(visitor);
                weight.accept(visitor);
            }
            TypeKind::Function { result, params } => {
                if let Some(result) = result {
                    result.accept(visitor);
                }
                params.iter().for_each(|param| param.accept(visitor));
            }
            TypeKind::Reference { inner, .. } => inner.accept(visitor),
            TypeKind::User { args, .. } => args.iter().for_each(|arg| arg.accept(visitor)),
            _ => {}
        }
        postorder_type(visitor, self);
    }
}

impl Expr {
    /// Visit this expression, its type and its sub-expressions
    pub fn accept<V: InnerVisitor + ?Sized>(&self, visitor: &mut V) {
        if !preorder_expr(visitor, self) {
            return;
        }
        if let Some(ty) = self.ty() {
            ty.accept(visitor);
        }
        match self.kind() {
            ExprKind::Literal(_) | ExprKind::Variable(_) | ExprKind::Path(_) => {}
            ExprKind::Field { expr, .. }
            | ExprKind::Cast { expr }
            | ExprKind::Borrow { expr, .. }
            | ExprKind::Deref(expr) => expr.accept(visitor),
            ExprKind::Binary { left, right, .. } => {
                left.accept(visitor);
                right.accept(visitor);
            }
            ExprKind::Unary { operand, .. } => operand.accept(visitor),
            ExprKind::Apply { function, args } => {
                function.accept(visitor);
                args.iter().for_each(|arg| arg.accept(visitor));
            }
            ExprKind::Closure { params, body } => {
                for param in params {
                    param.pattern.accept(visitor);
                    if let Some(ty) = &param.ty {
                        ty.accept(visitor);
                    }
                }
                body.accept(visitor);
            }
            ExprKind::Block { statements, last } => {
                statements.iter().for_each(|s| s.accept(visitor));
                if let Some(last) = last {
                    last.accept(visitor);
                }
            }
            ExprKind::If {
                condition,
                positive,
                negative,
            } => {
                condition.accept(visitor);
                positive.accept(visitor);
                if let Some(negative) = negative {
                    negative.accept(visitor);
                }
            }
            ExprKind::Match { matched, cases } => {
                matched.accept(visitor);
                for case in cases {
                    if visitor.preorder_match_case(case) {
                        case.pattern.accept(visitor);
                        case.result.accept(visitor);
                        visitor.postorder_match_case(case);
                    }
                }
            }
            ExprKind::For {
                pattern,
                iterated,
                block,
            } => {
                iterated.accept(visitor);
                pattern.accept(visitor);
                block.accept(visitor);
            }
            ExprKind::Assign { target, value } => {
                target.accept(visitor);
                value.accept(visitor);
            }
            ExprKind::Tuple(fields)
            | ExprKind::RawTuple(fields)
            | ExprKind::Struct { fields } => fields.iter().for_each(|f| f.accept(visitor)),
            ExprKind::QualifyType { expr, types } => {
                expr.accept(visitor);
                types.iter().for_each(|ty| ty.accept(visitor));
            }
            ExprKind::ZSet(literal) => {
                for (element, _) in literal.iter() {
                    element.accept(visitor);
                }
            }
        }
        postorder_expr(visitor, self);
    }
}

impl Pattern {
    pub fn accept<V: InnerVisitor + ?Sized>(&self, visitor: &mut V) {
        let enter = match self {
            Pattern::Identifier { .. } => visitor.preorder_identifier_pattern(self),
            Pattern::Wildcard => visitor.preorder_wildcard_pattern(self),
            Pattern::Tuple(_) => visitor.preorder_tuple_pattern(self),
            Pattern::Literal(_) => visitor.preorder_literal_pattern(self),
        };
        if !enter {
            return;
        }
        match self {
            Pattern::Tuple(fields) => fields.iter().for_each(|f| f.accept(visitor)),
            Pattern::Literal(value) => value.accept(visitor),
            Pattern::Identifier { .. } | Pattern::Wildcard => {}
        }
        match self {
            Pattern::Identifier { .. } => visitor.postorder_identifier_pattern(self),
            Pattern::Wildcard => visitor.postorder_wildcard_pattern(self),
            Pattern::Tuple(_) => visitor.postorder_tuple_pattern(self),
            Pattern::Literal(_) => visitor.postorder_literal_pattern(self),
        }
    }
}

impl Statement {
    pub fn accept<V: InnerVisitor + ?Sized>(&self, visitor: &mut V) {
        match self {
            Statement::Let { ty, init, .. } => {
                if !visitor.preorder_let(self) {
                    return;
                }
                if let Some(ty) = ty {
                    ty.accept(visitor);
                }
                if let Some(init) = init {
                    init.accept(visitor);
                }
                visitor.postorder_let(self);
            }
            Statement::Expression(expr) => {
                if !visitor.preorder_expression_statement(self) {
                    return;
                }
                expr.accept(visitor);
                visitor.postorder_expression_statement(self);
            }
        }
    }
}

/// Collects variables that are not bound by an enclosing closure parameter,
/// `let`, loop pattern or match arm.
#[derive(Debug, Default)]
pub struct FreeVariables {
    scopes: Vec<Vec<String>>,
    free: IndexSet<String>,
}

impl FreeVariables {
    /// Free variable names of `expr` in order of first use
    pub fn of(expr: &Expr) -> Vec<String> {
        let mut visitor = Self::default();
        visitor.traverse(InnerNode::Expr(expr));
        visitor.free.into_iter().collect()
    }

    fn bind(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.push(name.to_string());
        }
    }

    fn is_bound(&self, name: &str) -> bool {
        self.scopes
            .iter()
            .any(|scope| scope.iter().any(|bound| bound == name))
    }

    fn open_scope(&mut self) -> bool {
        self.scopes.push(Vec::new());
        true
    }

    fn close_scope(&mut self) {
        self.scopes.pop();
    }
}

impl InnerVisitor for FreeVariables {
    fn preorder_closure(&mut self, _expr: &Expr) -> bool {
        self.open_scope()
    }

    fn postorder_closure(&mut self, _expr: &Expr) {
        self.close_scope()
    }

    fn preorder_block(&mut self, _expr: &Expr) -> bool {
        self.open_scope()
    }

    fn postorder_block(&mut self, _expr: &Expr) {
        self.close_scope()
    }

    fn preorder_for(&mut self, _expr: &Expr) -> bool {
        self.open_scope()
    }

    fn postorder_for(&mut self, _expr: &Expr) {
        self.close_scope()
    }

    fn preorder_match_case(&mut self, _case: &MatchCase) -> bool {
        self.open_scope()
    }

    fn postorder_match_case(&mut self, _case: &MatchCase) {
        self.close_scope()
    }

    fn preorder_identifier_pattern(&mut self, pattern: &Pattern) -> bool {
        if let Pattern::Identifier { name, .. } = pattern {
            self.bind(name);
        }
        true
    }

    // bound after the initializer so `let x = x` sees the outer `x`
    fn postorder_let(&mut self, statement: &Statement) {
        if let Statement::Let { name, .. } = statement {
            self.bind(name);
        }
    }

    fn preorder_variable(&mut self, expr: &Expr) -> bool {
        if let ExprKind::Variable(name) = expr.kind() {
            if !self.is_bound(name) {
                self.free.insert(name.clone());
            }
        }
        true
    }
}

#[cfg(test)]
#[path = "visitor_test.rs"]
mod tests;
