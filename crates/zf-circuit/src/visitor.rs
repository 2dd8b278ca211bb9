//! Outer visitor over circuit operators
//!
//! Per-kind hooks delegate to the unary, binary or generic operator hook, and
//! from there to [`CircuitVisitor::preorder_node`], when
//! [`CircuitVisitor::visit_super`] is true. With delegation off every default
//! hook simply continues the traversal.

use crate::circuit::Circuit;
use crate::operator::{Operator, OperatorId, OperatorKind};
use zf_ir::InnerVisitor;

/// An operator together with its position in the circuit
#[derive(Debug, Clone, Copy)]
pub struct OperatorRef<'a> {
    pub id: OperatorId,
    pub op: &'a Operator,
}

macro_rules! delegating_hooks {
    ($parent_pre:ident, $parent_post:ident { $($pre:ident, $post:ident;)* }) => {
        $(
            fn $pre(&mut self, node: OperatorRef<'_>) -> bool {
                !self.visit_super() || self.$parent_pre(node)
            }

            fn $post(&mut self, node: OperatorRef<'_>) {
                if self.visit_super() {
                    self.$parent_post(node)
                }
            }
        )*
    };
}

pub trait CircuitVisitor {
    fn visit_super(&self) -> bool {
        false
    }

    fn start_visit(&mut self) {}

    fn end_visit(&mut self) {}

    /// Return false to skip every operator
    fn preorder_circuit(&mut self, _circuit: &Circuit) -> bool {
        true
    }

    fn postorder_circuit(&mut self, _circuit: &Circuit) {}

    fn preorder_node(&mut self, _node: OperatorRef<'_>) -> bool {
        true
    }

    fn postorder_node(&mut self, _node: OperatorRef<'_>) {}

    /// Expression visitor applied to each operator's output type and
    /// function before its postorder hook
    fn inner_visitor(&mut self) -> Option<&mut dyn InnerVisitor> {
        None
    }

    delegating_hooks!(preorder_node, postorder_node {
        preorder_operator, postorder_operator;
    });

    delegating_hooks!(preorder_operator, postorder_operator {
        preorder_unary_operator, postorder_unary_operator;
        preorder_binary_operator, postorder_binary_operator;
        preorder_source, postorder_source;
        preorder_constant, postorder_constant;
        preorder_sum, postorder_sum;
    });

    delegating_hooks!(preorder_unary_operator, postorder_unary_operator {
        preorder_map, postorder_map;
        preorder_filter, postorder_filter;
        preorder_index, postorder_index;
        preorder_aggregate, postorder_aggregate;
        preorder_negate, postorder_negate;
        preorder_distinct, postorder_distinct;
        preorder_integral, postorder_integral;
        preorder_differential, postorder_differential;
        preorder_noop, postorder_noop;
        preorder_sink, postorder_sink;
    });

    delegating_hooks!(preorder_binary_operator, postorder_binary_operator {
        preorder_join, postorder_join;
        preorder_subtract, postorder_subtract;
    });
}

fn preorder<V: CircuitVisitor + ?Sized>(visitor: &mut V, node: OperatorRef<'_>) -> bool {
    match node.op.kind() {
        OperatorKind::Source { .. } => visitor.preorder_source(node),
        OperatorKind::Constant { .. } => visitor.preorder_constant(node),
        OperatorKind::Map { .. } => visitor.preorder_map(node),
        OperatorKind::Filter => visitor.preorder_filter(node),
        OperatorKind::Index { .. } => visitor.preorder_index(node),
        OperatorKind::Aggregate { .. } => visitor.preorder_aggregate(node),
        OperatorKind::Join { .. } => visitor.preorder_join(node),
        OperatorKind::Sum => visitor.preorder_sum(node),
        OperatorKind::Subtract => visitor.preorder_subtract(node),
        OperatorKind::Negate => visitor.preorder_negate(node),
        OperatorKind::Distinct => visitor.preorder_distinct(node),
        OperatorKind::Integral => visitor.preorder_integral(node),
        OperatorKind::Differential => visitor.preorder_differential(node),
        OperatorKind::Noop => visitor.preorder_noop(node),
        OperatorKind::Sink { .. } => visitor.preorder_sink(node),
    }
}

fn postorder<V: CircuitVisitor + ?Sized>(visitor: &mut V, node: OperatorRef<'_>) {
    match node.op.kind() {
        OperatorKind::Source { .. } => visitor.postorder_source(node),
        OperatorKind::Constant { .. } => visitor.postorder_constant(node),
        OperatorKind::Map { .. } => visitor.postorder_map(node),
        OperatorKind::Filter => visitor.postorder_filter(node),
        OperatorKind::Index { .. } => visitor.postorder_index(node),
        OperatorKind::Aggregate { .. } => visitor.postorder_aggregate(node),
        OperatorKind::Join { .. } => visitor.postorder_join(node),
        OperatorKind::Sum => visitor.postorder_sum(node),
        OperatorKind::Subtract => visitor.postorder_subtract(node),
        OperatorKind::Negate => visitor.postorder_negate(node),
        OperatorKind::Distinct => visitor.postorder_distinct(node),
        OperatorKind::Integral => visitor.postorder_integral(node),
        OperatorKind::Differential => visitor.postorder_differential(node),
        OperatorKind::Noop => visitor.postorder_noop(node),
        OperatorKind::Sink { .. } => visitor.postorder_sink(node),
    }
}

/// Visit every operator of `circuit` in arena order, which puts inputs
/// before consumers. A preorder hook returning false skips the operator's
/// inner visit and postorder hook.
pub fn traverse<V: CircuitVisitor + ?Sized>(circuit: &Circuit, visitor: &mut V) {
    visitor.start_visit();
    if visitor.preorder_circuit(circuit) {
        for (id, op) in circuit.iter() {
            let node = OperatorRef { id, op };
            if !preorder(visitor, node) {
                continue;
            }
            if let Some(inner) = visitor.inner_visitor() {
                op.output_type().accept(&mut *inner);
                if let Some(function) = op.function() {
                    function.accept(&mut *inner);
                }
            }
            postorder(visitor, node);
        }
        visitor.postorder_circuit(circuit);
    }
    visitor.end_visit();
}
