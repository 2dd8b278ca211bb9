//! Constant weighted multisets (Z-sets) with semiring arithmetic

use crate::error::{IrError, IrResult};
use crate::expr::Expr;
use crate::types::Type;
use indexmap::IndexMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// An immutable Z-set literal: distinct element expressions mapped to
/// non-zero weights.
///
/// Every combinator returns a new literal. A weight that reaches zero removes
/// its element, so no zero weight is ever stored. Equality ignores insertion
/// order.
#[derive(Debug, Clone)]
pub struct ZSetLiteral {
    element_type: Type,
    entries: Arc<IndexMap<Expr, i64>>,
}

impl ZSetLiteral {
    /// Empty Z-set over `element_type`
    pub fn empty(element_type: Type) -> Self {
        Self {
            element_type,
            entries: Arc::new(IndexMap::new()),
        }
    }

    /// Z-set holding each element with weight one per occurrence. The element
    /// type is taken from the first element.
    pub fn from_elements(elements: Vec<Expr>) -> IrResult<Self> {
        let first = elements.first().ok_or_else(|| {
            IrError::malformed("Z-set literal", "cannot infer element type from no elements")
        })?;
        let mut result = Self::empty(first.get_type()?.clone());
        for element in elements {
            result = result.add_element(element, 1)?;
        }
        Ok(result)
    }

    pub fn element_type(&self) -> &Type {
        &self.element_type
    }

    /// Type of this literal as a collection
    pub fn zset_type(&self) -> Type {
        Type::zset(self.element_type.clone())
    }

    /// Number of distinct elements
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Weight of `element`, zero when absent
    pub fn weight(&self, element: &Expr) -> i64 {
        self.entries.get(element).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Expr, i64)> {
        self.entries.iter().map(|(element, weight)| (element, *weight))
    }

    /// Add `weight` copies of `element`
    pub fn add_element(&self, element: Expr, weight: i64) -> IrResult<Self> {
        let element_type = element.get_type()?;
        if !element_type.same_type(&self.element_type) {
            return Err(IrError::mismatch(
                "Z-set element",
                &self.element_type,
                element_type,
            ));
        }
        let mut result = self.clone();
        Arc::make_mut(&mut result.entries).merge(element, weight)?;
        Ok(result)
    }

    /// Element-wise sum of two literals over the same element type
    pub fn add(&self, other: &ZSetLiteral) -> IrResult<Self> {
        if !other.element_type.same_type(&self.element_type) {
            return Err(IrError::mismatch(
                "Z-set addition",
                &self.element_type,
                &other.element_type,
            ));
        }
        let mut result = self.clone();
        let entries = Arc::make_mut(&mut result.entries);
        for (element, weight) in other.entries.iter() {
            entries.merge(element.clone(), *weight)?;
        }
        Ok(result)
    }

    /// Every weight with its sign flipped
    pub fn negate(&self) -> IrResult<Self> {
        let entries = self
            .entries
            .iter()
            .map(|(element, weight)| {
                weight
                    .checked_neg()
                    .map(|w| (element.clone(), w))
                    .ok_or_else(|| IrError::WeightOverflow {
                        element: element.to_string(),
                    })
            })
            .collect::<IrResult<IndexMap<_, _>>>()?;
        Ok(Self {
            element_type: self.element_type.clone(),
            entries: Arc::new(entries),
        })
    }

    /// `self + (-other)`
    pub fn minus(&self, other: &ZSetLiteral) -> IrResult<Self> {
        self.add(&other.negate()?)
    }
}

trait MergeWeight {
    fn merge(&mut self, element: Expr, weight: i64) -> IrResult<()>;
}

impl MergeWeight for IndexMap<Expr, i64> {
    fn merge(&mut self, element: Expr, weight: i64) -> IrResult<()> {
        if weight == 0 {
            return Ok(());
        }
        let current = self.get(&element).copied().unwrap_or(0);
        let updated = current
            .checked_add(weight)
            .ok_or_else(|| IrError::WeightOverflow {
                element: element.to_string(),
            })?;
        if updated == 0 {
            self.shift_remove(&element);
        } else {
            self.insert(element, updated);
        }
        Ok(())
    }
}

impl PartialEq for ZSetLiteral {
    fn eq(&self, other: &Self) -> bool {
        self.element_type == other.element_type
            && self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .all(|(element, weight)| other.entries.get(element) == Some(weight))
    }
}

impl Eq for ZSetLiteral {}

impl Hash for ZSetLiteral {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.element_type.hash(state);
        self.entries.len().hash(state);
    }
}

impl std::fmt::Display for ZSetLiteral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "zset!(")?;
        for (i, (element, weight)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{element} => {weight}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
#[path = "zset_test.rs"]
mod tests;
