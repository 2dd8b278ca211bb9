//! Translation of relational plans into a circuit
//!
//! [`CircuitCompiler`] consumes frontend statements in program order. Tables
//! become sources, views become sinks fed by the translated plan, and
//! constant inserts and deletes accumulate into per-table contents.

use crate::aggregate::{empty_group_row, fold_function};
use crate::config::CompilerOptions;
use crate::context::{CompilationContext, Diagnostic, Severity};
use crate::error::{CompileError, CompileResult};
use crate::expr_compiler::ExprCompiler;
use crate::join::{ConditionDecomposition, JoinConditionAnalyzer};
use crate::rel::{
    AggregateCall, FrontendStatement, JoinType, RelExpr, RelNode, RelSchema, SetOpKind,
};
use indexmap::{IndexMap, IndexSet};
use zf_circuit::{
    Circuit, CircuitPass, DeadCode, Incrementalize, OperatorId, PassManager, SimplifyFunctions,
};
use zf_ir::{Expr, Parameter, Type, UnaryOp, ZSetLiteral};

/// Diagnostic code: ORDER BY has no effect on a Z-set
pub const ORDER_IGNORED: &str = "Z001";
/// Diagnostic code: join without equality keys
pub const CROSS_JOIN: &str = "Z002";

/// Result of compiling a program
#[derive(Debug)]
pub struct Compilation {
    pub circuit: Circuit,
    /// Initial table contents from constant inserts and deletes
    pub contents: IndexMap<String, ZSetLiteral>,
    pub diagnostics: Vec<Diagnostic>,
}

struct Table {
    source: OperatorId,
    schema: RelSchema,
}

/// Closure `|t: &row_type| body(t)`
fn row_closure(
    row_type: &Type,
    body: impl FnOnce(&Expr) -> CompileResult<Expr>,
) -> CompileResult<Expr> {
    let param_type = Type::reference(row_type.clone(), false);
    let row = Expr::var("t", param_type.clone());
    let body = body(&row)?;
    Ok(Expr::closure(vec![Parameter::named("t", param_type)], body)?)
}

/// Tuple of `fields`, each converted to its column type in `schema`
fn schema_tuple(fields: Vec<Expr>, schema: &RelSchema) -> CompileResult<Expr> {
    if fields.len() != schema.len() {
        return Err(CompileError::malformed(
            "row",
            format!("{} values for {} columns", fields.len(), schema.len()),
        ));
    }
    let fields = fields
        .into_iter()
        .zip(&schema.columns)
        .map(|(field, column)| Ok(Expr::cast_if_needed(field, &column.ty)?))
        .collect::<CompileResult<Vec<_>>>()?;
    Ok(Expr::tuple(fields)?)
}

fn columns(row: &Expr, count: usize) -> CompileResult<Vec<Expr>> {
    (0..count)
        .map(|i| Ok(Expr::field(row.clone(), i)?))
        .collect()
}

/// Compiles frontend statements into one circuit
pub struct CircuitCompiler {
    context: CompilationContext,
    circuit: Circuit,
    tables: IndexMap<String, Table>,
    views: IndexSet<String>,
    contents: IndexMap<String, ZSetLiteral>,
}

impl CircuitCompiler {
    pub fn new(options: CompilerOptions) -> Self {
        let circuit = Circuit::new(options.function_name.clone());
        Self {
            context: CompilationContext::new(options),
            circuit,
            tables: IndexMap::new(),
            views: IndexSet::new(),
            contents: IndexMap::new(),
        }
    }

    /// Compile a whole program
    pub fn compile(
        options: CompilerOptions,
        statements: &[FrontendStatement],
    ) -> CompileResult<Compilation> {
        let mut compiler = Self::new(options);
        for statement in statements {
            compiler.compile_statement(statement)?;
        }
        compiler.finish()
    }

    pub fn context(&self) -> &CompilationContext {
        &self.context
    }

    pub fn compile_statement(&mut self, statement: &FrontendStatement) -> CompileResult<()> {
        match statement {
            FrontendStatement::CreateTable { name, schema } => {
                if self.tables.contains_key(name) {
                    return Err(CompileError::DuplicateTable { name: name.clone() });
                }
                let source = self.circuit.add_source(name.clone(), schema.row_type())?;
                self.tables.insert(
                    name.clone(),
                    Table {
                        source,
                        schema: schema.clone(),
                    },
                );
            }
            FrontendStatement::CreateView {
                name,
                query,
                comment,
                plan,
            } => {
                if !self.views.insert(name.clone()) {
                    return Err(CompileError::DuplicateView { name: name.clone() });
                }
                log::debug!("Compiling view {name}");
                let output = self.compile_node(plan)?;
                self.circuit
                    .add_sink(output, name.clone(), query.clone(), comment.clone())?;
            }
            FrontendStatement::Insert { table, rows } => self.add_rows(table, rows, 1)?,
            FrontendStatement::Delete { table, rows } => self.add_rows(table, rows, -1)?,
        }
        Ok(())
    }

    fn add_rows(&mut self, table: &str, rows: &[Vec<RelExpr>], weight: i64) -> CompileResult<()> {
        let schema = &self
            .tables
            .get(table)
            .ok_or_else(|| CompileError::UnknownTable {
                name: table.to_string(),
            })?
            .schema;
        let compiler = ExprCompiler::constant();
        let mut contents = match self.contents.get(table) {
            Some(existing) => existing.clone(),
            None => ZSetLiteral::empty(schema.row_type()),
        };
        for row in rows {
            let fields = row
                .iter()
                .map(|value| compiler.compile(value))
                .collect::<CompileResult<Vec<_>>>()?;
            contents = contents.add_element(schema_tuple(fields, schema)?, weight)?;
        }
        self.contents.insert(table.to_string(), contents);
        Ok(())
    }

    fn compile_node(&mut self, node: &RelNode) -> CompileResult<OperatorId> {
        match node {
            RelNode::Scan { table, schema } => {
                let found = self
                    .tables
                    .get(table)
                    .ok_or_else(|| CompileError::UnknownTable {
                        name: table.clone(),
                    })?;
                if found.schema.row_type() != schema.row_type() {
                    return Err(CompileError::malformed(
                        format!("scan of {table}"),
                        "schema differs from the table definition",
                    ));
                }
                Ok(found.source)
            }
            RelNode::Filter {
                input, condition, ..
            } => {
                let source = self.compile_node(input)?;
                let predicate = row_closure(&input.schema().row_type(), |row| {
                    ExprCompiler::new(row.clone()).compile_predicate(condition)
                })?;
                Ok(self.circuit.filter(source, predicate)?)
            }
            RelNode::Project {
                input,
                exprs,
                schema,
            } => {
                let source = self.compile_node(input)?;
                let function = row_closure(&input.schema().row_type(), |row| {
                    let compiler = ExprCompiler::new(row.clone());
                    let fields = exprs
                        .iter()
                        .map(|e| compiler.compile(e))
                        .collect::<CompileResult<Vec<_>>>()?;
                    schema_tuple(fields, schema)
                })?;
                Ok(self.circuit.map(source, function, schema.row_type())?)
            }
            RelNode::Join {
                left,
                right,
                join_type,
                condition,
                schema,
            } => self.compile_join(left, right, *join_type, condition.as_ref(), schema),
            RelNode::Aggregate {
                input,
                group_keys,
                aggregates,
                schema,
            } => self.compile_aggregate(input, group_keys, aggregates, schema),
            RelNode::Sort { input, .. } => {
                let source = self.compile_node(input)?;
                self.context.report(
                    ORDER_IGNORED,
                    Severity::Info,
                    "ORDER BY has no effect on an unordered result and was dropped",
                    Some(node.name().to_string()),
                );
                Ok(self.circuit.noop(source)?)
            }
            RelNode::Limit { fetch, .. } => {
                Err(CompileError::unimplemented(format!("LIMIT {fetch}")))
            }
            RelNode::SetOp {
                kind,
                inputs,
                schema,
            } => self.compile_set_op(*kind, inputs, schema),
        }
    }

    /// Map `source` from `from` to the row type of `to` when they differ
    fn conform(
        &mut self,
        source: OperatorId,
        from: &RelSchema,
        to: &RelSchema,
    ) -> CompileResult<OperatorId> {
        if from.row_type() == to.row_type() {
            return Ok(source);
        }
        let function = row_closure(&from.row_type(), |row| {
            schema_tuple(columns(row, from.len())?, to)
        })?;
        Ok(self.circuit.map(source, function, to.row_type())?)
    }

    /// Drop rows whose key columns hold NULL, then index the rest by key
    fn index_by_key(
        &mut self,
        source: OperatorId,
        schema: &RelSchema,
        key_columns: &[usize],
        key_types: &[Type],
    ) -> CompileResult<OperatorId> {
        let row_type = schema.row_type();
        let nullable: Vec<usize> = key_columns
            .iter()
            .copied()
            .filter(|c| schema.columns.get(*c).is_some_and(|col| col.ty.may_be_null()))
            .collect();
        let source = if nullable.is_empty() {
            source
        } else {
            let predicate = row_closure(&row_type, |row| {
                let mut all: Option<Expr> = None;
                for column in &nullable {
                    let check = Expr::unary(
                        UnaryOp::IsNotNull,
                        Expr::field(row.clone(), *column)?,
                        Type::bool(),
                    )?;
                    all = Some(match all {
                        Some(previous) => Expr::and(previous, check)?,
                        None => check,
                    });
                }
                Ok(all.unwrap_or_else(|| Expr::bool_literal(true)))
            })?;
            self.circuit.filter(source, predicate)?
        };
        let key_type = Type::tuple(key_types.to_vec());
        let function = row_closure(&row_type, |row| {
            let key = key_columns
                .iter()
                .zip(key_types)
                .map(|(c, ty)| Ok(Expr::cast_if_needed(Expr::field(row.clone(), *c)?, ty)?))
                .collect::<CompileResult<Vec<_>>>()?;
            Ok(Expr::raw_tuple(vec![
                Expr::tuple(key)?,
                Expr::deref(row.clone())?,
            ])?)
        })?;
        Ok(self.circuit.index(source, function, key_type, row_type)?)
    }

    /// Join two key-indexed inputs, producing `schema` rows of left columns
    /// followed by right columns
    fn join_indexed(
        &mut self,
        left: OperatorId,
        right: OperatorId,
        key_type: &Type,
        left_type: &Type,
        right_type: &Type,
        schema: &RelSchema,
    ) -> CompileResult<OperatorId> {
        let l = Expr::var("l", Type::reference(left_type.clone(), false));
        let r = Expr::var("r", Type::reference(right_type.clone(), false));
        let left_count = left_type.tuple_fields().map_or(0, <[Type]>::len);
        let right_count = right_type.tuple_fields().map_or(0, <[Type]>::len);
        let mut fields = columns(&l, left_count)?;
        fields.extend(columns(&r, right_count)?);
        let function = Expr::closure(
            vec![
                Parameter::named("k", Type::reference(key_type.clone(), false)),
                Parameter::named("l", Type::reference(left_type.clone(), false)),
                Parameter::named("r", Type::reference(right_type.clone(), false)),
            ],
            schema_tuple(fields, schema)?,
        )?;
        Ok(self
            .circuit
            .join(left, right, function, key_type.clone(), schema.row_type())?)
    }

    fn compile_join(
        &mut self,
        left: &RelNode,
        right: &RelNode,
        join_type: JoinType,
        condition: Option<&RelExpr>,
        schema: &RelSchema,
    ) -> CompileResult<OperatorId> {
        if !matches!(join_type, JoinType::Inner | JoinType::Cross) {
            return Err(CompileError::unimplemented(format!("{join_type} JOIN")));
        }
        let left_schema = left.schema();
        let right_schema = right.schema();
        let decomposition = match condition {
            Some(condition) => JoinConditionAnalyzer::new(left_schema.len(), right_schema.len())
                .analyze(condition)?,
            None => ConditionDecomposition {
                equalities: Vec::new(),
                residual: None,
            },
        };
        if decomposition.equalities.is_empty() {
            self.context.report(
                CROSS_JOIN,
                Severity::Info,
                "join has no equality keys and is computed as a Cartesian product",
                Some("Join".to_string()),
            );
        }

        let left_source = self.compile_node(left)?;
        let right_source = self.compile_node(right)?;
        let key_types: Vec<Type> = decomposition
            .equalities
            .iter()
            .map(|e| e.result_type.clone())
            .collect();
        let left_keys: Vec<usize> = decomposition.equalities.iter().map(|e| e.left_column).collect();
        let right_keys: Vec<usize> = decomposition.equalities.iter().map(|e| e.right_column).collect();
        let left_index = self.index_by_key(left_source, left_schema, &left_keys, &key_types)?;
        let right_index = self.index_by_key(right_source, right_schema, &right_keys, &key_types)?;

        let joined_schema = RelSchema::merge(left_schema, right_schema);
        let joined = self.join_indexed(
            left_index,
            right_index,
            &Type::tuple(key_types),
            &left_schema.row_type(),
            &right_schema.row_type(),
            &joined_schema,
        )?;
        let filtered = match &decomposition.residual {
            Some(residual) => {
                let predicate = row_closure(&joined_schema.row_type(), |row| {
                    ExprCompiler::new(row.clone()).compile_predicate(residual)
                })?;
                self.circuit.filter(joined, predicate)?
            }
            None => joined,
        };
        self.conform(filtered, &joined_schema, schema)
    }

    fn compile_aggregate(
        &mut self,
        input: &RelNode,
        group_keys: &[usize],
        aggregates: &[AggregateCall],
        schema: &RelSchema,
    ) -> CompileResult<OperatorId> {
        let source = self.compile_node(input)?;
        let input_schema = input.schema();
        let row_type = input_schema.row_type();
        let key_types = group_keys
            .iter()
            .map(|k| {
                input_schema
                    .columns
                    .get(*k)
                    .map(|c| c.ty.clone())
                    .ok_or_else(|| {
                        CompileError::malformed("Aggregate", format!("no group column ${k}"))
                    })
            })
            .collect::<CompileResult<Vec<_>>>()?;
        let key_type = Type::tuple(key_types);

        let index_function = row_closure(&row_type, |row| {
            let key = group_keys
                .iter()
                .map(|k| Ok(Expr::field(row.clone(), *k)?))
                .collect::<CompileResult<Vec<_>>>()?;
            Ok(Expr::raw_tuple(vec![
                Expr::tuple(key)?,
                Expr::deref(row.clone())?,
            ])?)
        })?;
        let indexed = self
            .circuit
            .index(source, index_function, key_type.clone(), row_type.clone())?;

        let (fold, accumulated) = fold_function(&key_type, &row_type, aggregates)?;
        let aggregated = self
            .circuit
            .aggregate(indexed, fold, key_type.clone(), accumulated.clone())?;

        let pair_type = Type::raw_tuple(vec![key_type, accumulated]);
        let flatten = row_closure(&pair_type, |pair| {
            let key = Expr::field(pair.clone(), 0)?;
            let values = Expr::field(pair.clone(), 1)?;
            let mut fields = columns(&key, group_keys.len())?;
            fields.extend(columns(&values, aggregates.len())?);
            schema_tuple(fields, schema)
        })?;
        let mapped = self.circuit.map(aggregated, flatten, schema.row_type())?;
        if !group_keys.is_empty() {
            return Ok(mapped);
        }

        // Without grouping an empty input still yields one row
        let default_row = empty_group_row(aggregates)?;
        let constant = self.circuit.constant(
            ZSetLiteral::empty(schema.row_type()).add_element(default_row.clone(), 1)?,
        )?;
        let replace = row_closure(&schema.row_type(), |_| Ok(default_row))?;
        let present = self.circuit.map(mapped, replace, schema.row_type())?;
        let missing = self.circuit.subtract(constant, present)?;
        Ok(self.circuit.sum(vec![mapped, missing])?)
    }

    /// Index rows by the whole row, for set operations
    fn index_by_row(&mut self, source: OperatorId, schema: &RelSchema) -> CompileResult<OperatorId> {
        let row_type = schema.row_type();
        let function = row_closure(&row_type, |row| {
            Ok(Expr::raw_tuple(vec![Expr::deref(row.clone())?, Expr::unit()])?)
        })?;
        Ok(self.circuit.index(source, function, row_type, Type::unit())?)
    }

    fn compile_set_op(
        &mut self,
        kind: SetOpKind,
        inputs: &[RelNode],
        schema: &RelSchema,
    ) -> CompileResult<OperatorId> {
        if inputs.is_empty() {
            return Err(CompileError::malformed(format!("{kind}"), "no inputs"));
        }
        let mut sources = Vec::with_capacity(inputs.len());
        for input in inputs {
            let source = self.compile_node(input)?;
            sources.push(self.conform(source, input.schema(), schema)?);
        }
        match kind {
            SetOpKind::UnionAll => Ok(self.circuit.sum(sources)?),
            SetOpKind::Union => {
                let sum = self.circuit.sum(sources)?;
                Ok(self.circuit.distinct(sum)?)
            }
            SetOpKind::Except => {
                let mut result = self.circuit.distinct(sources[0])?;
                for source in &sources[1..] {
                    let removed = self.circuit.distinct(*source)?;
                    result = self.circuit.subtract(result, removed)?;
                }
                Ok(self.circuit.distinct(result)?)
            }
            SetOpKind::Intersect => {
                let row_type = schema.row_type();
                let mut result = self.circuit.distinct(sources[0])?;
                for source in &sources[1..] {
                    let other = self.circuit.distinct(*source)?;
                    let left = self.index_by_row(result, schema)?;
                    let right = self.index_by_row(other, schema)?;
                    let key = Expr::var("k", Type::reference(row_type.clone(), false));
                    let function = Expr::closure(
                        vec![
                            Parameter::named("k", Type::reference(row_type.clone(), false)),
                            Parameter::named("l", Type::reference(Type::unit(), false)),
                            Parameter::named("r", Type::reference(Type::unit(), false)),
                        ],
                        Expr::deref(key)?,
                    )?;
                    result = self
                        .circuit
                        .join(left, right, function, row_type.clone(), row_type.clone())?;
                }
                Ok(self.circuit.distinct(result)?)
            }
        }
    }

    /// Optimize the circuit and hand over the results
    pub fn finish(self) -> CompileResult<Compilation> {
        let mut passes: Vec<Box<dyn CircuitPass>> = vec![Box::new(SimplifyFunctions)];
        if self.context.options().incrementalize {
            passes.push(Box::new(Incrementalize));
        }
        passes.push(Box::new(DeadCode));
        let circuit = PassManager::new(passes).run(&self.circuit, None)?;
        Ok(Compilation {
            circuit,
            contents: self.contents,
            diagnostics: self.context.into_diagnostics(),
        })
    }
}

#[cfg(test)]
#[path = "translate_test.rs"]
mod tests;
