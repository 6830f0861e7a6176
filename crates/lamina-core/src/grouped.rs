//! Grouping and aggregation for series and tables
//!
//! Groups are discovered in a single left-to-right scan and kept in the order
//! each distinct key was first seen; rows inside a group keep their source
//! order. Elements whose value (or key) is null belong to no group.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use crate::dataframe::DataFrame;
use crate::error::{DataError, DataResult};
use crate::series::Series;
use crate::value::Value;

/// Hashable stand-in for a value used as a group key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupKey {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    /// Bit pattern, so float keys hash consistently
    Double(u64),
    Str(Arc<str>),
    List(Vec<GroupKey>),
    /// Runtime type name plus opaque payload
    Obj(String, String),
}

fn group_key(value: &Value) -> GroupKey {
    match value {
        Value::Null => GroupKey::Null,
        Value::Bool(b) => GroupKey::Bool(*b),
        Value::Int(i) => GroupKey::Int(*i),
        Value::Long(i) => GroupKey::Long(*i),
        Value::Double(f) => GroupKey::Double(f.to_bits()),
        Value::Str(s) => GroupKey::Str(Arc::clone(s)),
        Value::List(items) => GroupKey::List(items.iter().map(group_key).collect()),
        Value::Obj(obj) => GroupKey::Obj(
            obj.runtime_type().name().to_string(),
            obj.repr().to_string(),
        ),
    }
}

/// Aggregation operation type
#[derive(Debug, Clone, PartialEq)]
pub enum AggOp {
    /// First value of the group in source order
    First,
    /// Last value of the group in source order
    Last,
    /// Number of rows in the group
    Count,
    /// Sum of non-null values
    Sum,
    /// Mean of non-null values
    Mean,
    /// Minimum non-null value
    Min,
    /// Maximum non-null value
    Max,
    /// Stringify every value in source order and join with the separator
    Concat(String),
}

impl AggOp {
    /// Get the operation name
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            AggOp::First => "first",
            AggOp::Last => "last",
            AggOp::Count => "count",
            AggOp::Sum => "sum",
            AggOp::Mean => "mean",
            AggOp::Min => "min",
            AggOp::Max => "max",
            AggOp::Concat(_) => "concat",
        }
    }
}

/// One aggregate expression: an operation, an optional source-column
/// reference and an optional output alias.
///
/// The output column name is the alias when set, else the source-column
/// reference, else a positional label assigned in order across the name-less
/// expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct AggExpr {
    op: AggOp,
    column: Option<String>,
    alias: Option<String>,
}

impl AggExpr {
    fn with_op(op: AggOp) -> Self {
        Self {
            op,
            column: None,
            alias: None,
        }
    }

    /// First value of each group, in source order
    #[must_use]
    pub fn first() -> Self {
        Self::with_op(AggOp::First)
    }

    /// Last value of each group, in source order
    #[must_use]
    pub fn last() -> Self {
        Self::with_op(AggOp::Last)
    }

    /// Number of rows in each group
    #[must_use]
    pub fn count() -> Self {
        Self::with_op(AggOp::Count)
    }

    /// Sum of each group's non-null values
    #[must_use]
    pub fn sum() -> Self {
        Self::with_op(AggOp::Sum)
    }

    /// Mean of each group's non-null values
    #[must_use]
    pub fn mean() -> Self {
        Self::with_op(AggOp::Mean)
    }

    /// Minimum of each group's non-null values
    #[must_use]
    pub fn min() -> Self {
        Self::with_op(AggOp::Min)
    }

    /// Maximum of each group's non-null values
    #[must_use]
    pub fn max() -> Self {
        Self::with_op(AggOp::Max)
    }

    /// Join each group's stringified values with `separator`, in source order
    #[must_use]
    pub fn concat(separator: impl Into<String>) -> Self {
        Self::with_op(AggOp::Concat(separator.into()))
    }

    /// Bind the expression to a source column.
    ///
    /// Required when aggregating a grouped table (except for [`AggExpr::count`]);
    /// over a grouped series it only provides the default output name.
    #[must_use]
    pub fn col(mut self, name: impl Into<String>) -> Self {
        self.column = Some(name.into());
        self
    }

    /// Set an explicit output column name
    #[must_use]
    pub fn alias(mut self, name: impl Into<String>) -> Self {
        self.alias = Some(name.into());
        self
    }

    /// Get the operation
    #[must_use]
    pub fn op(&self) -> &AggOp {
        &self.op
    }

    /// Get the source-column reference, if any
    #[must_use]
    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    /// Output column name, when one can be derived from the expression itself
    fn name_hint(&self) -> Option<String> {
        self.alias.clone().or_else(|| self.column.clone())
    }

    /// Evaluate the expression over one group's sub-series
    fn evaluate(&self, group: &Series) -> DataResult<Value> {
        match &self.op {
            AggOp::First => Ok(group.iter().next().cloned().unwrap_or(Value::Null)),
            AggOp::Last => Ok(group.iter().last().cloned().unwrap_or(Value::Null)),
            #[allow(clippy::cast_possible_wrap)]
            AggOp::Count => Ok(Value::Long(group.len() as i64)),
            AggOp::Sum => group.sum(),
            AggOp::Mean => group.mean(),
            AggOp::Min => group.min(),
            AggOp::Max => group.max(),
            AggOp::Concat(sep) => {
                let joined = group
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(sep.as_str());
                Ok(Value::string(joined))
            }
        }
    }
}

/// A series partitioned into ordered groups
#[derive(Debug, Clone)]
pub struct GroupedSeries {
    /// The series the groups index into
    source: Series,
    /// Distinct keys, in first-occurrence order
    keys: Vec<Value>,
    /// Row indices per group, aligned with `keys`, in source order
    groups: Vec<Vec<usize>>,
}

impl GroupedSeries {
    pub(crate) fn by_identity(source: &Series) -> Self {
        Self::by_key_fn(source, Clone::clone)
    }

    pub(crate) fn by_key_fn<F>(source: &Series, key_fn: F) -> Self
    where
        F: Fn(&Value) -> Value,
    {
        let mut slots: HashMap<GroupKey, usize> = HashMap::new();
        let mut keys = Vec::new();
        let mut groups: Vec<Vec<usize>> = Vec::new();

        for (row, value) in source.iter().enumerate() {
            // Null never reaches the key function
            if value.is_null() {
                continue;
            }
            let key = key_fn(value);
            let slot = match slots.entry(group_key(&key)) {
                Entry::Occupied(entry) => *entry.get(),
                Entry::Vacant(entry) => {
                    let slot = keys.len();
                    keys.push(key);
                    groups.push(Vec::new());
                    entry.insert(slot);
                    slot
                }
            };
            groups[slot].push(row);
        }

        Self {
            source: source.clone(),
            keys,
            groups,
        }
    }

    /// Group `values` positions by the parallel element of `keys`.
    ///
    /// Positions whose key is null belong to no group.
    ///
    /// # Errors
    /// Returns error if the two series differ in length
    pub fn by_key(keys: &Series, values: &Series) -> DataResult<Self> {
        if keys.len() != values.len() {
            return Err(DataError::InvalidShape(format!(
                "key series has {} rows, value series has {}",
                keys.len(),
                values.len()
            )));
        }

        let mut slots: HashMap<GroupKey, usize> = HashMap::new();
        let mut key_values = Vec::new();
        let mut groups: Vec<Vec<usize>> = Vec::new();

        for (row, key) in keys.iter().enumerate() {
            if key.is_null() {
                continue;
            }
            let slot = match slots.entry(group_key(key)) {
                Entry::Occupied(entry) => *entry.get(),
                Entry::Vacant(entry) => {
                    let slot = key_values.len();
                    key_values.push(key.clone());
                    groups.push(Vec::new());
                    entry.insert(slot);
                    slot
                }
            };
            groups[slot].push(row);
        }

        Ok(Self {
            source: values.clone(),
            keys: key_values,
            groups,
        })
    }

    /// Get the number of groups
    #[must_use]
    pub fn num_groups(&self) -> usize {
        self.keys.len()
    }

    /// Check if there are no groups
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Distinct keys, in first-occurrence order
    #[must_use]
    pub fn keys(&self) -> &[Value] {
        &self.keys
    }

    /// Row indices of the group at `index`, in source order
    #[must_use]
    pub fn indices(&self, index: usize) -> Option<&[usize]> {
        self.groups.get(index).map(Vec::as_slice)
    }

    /// Sub-series of the group at `index`, in source order
    #[must_use]
    pub fn group_at(&self, index: usize) -> Option<Series> {
        self.groups.get(index).map(|g| self.source.gather(g))
    }

    /// Sub-series of the group with the given key
    #[must_use]
    pub fn group(&self, key: &Value) -> Option<Series> {
        let slot = self.keys.iter().position(|k| k == key)?;
        self.group_at(slot)
    }

    /// One representative per group: the group's first element in source
    /// order, with groups in first-occurrence order.
    ///
    /// Grouping by identity, this recovers the distinct values of the source
    /// in order of appearance.
    #[must_use]
    pub fn to_series(&self) -> Series {
        let indices: Vec<usize> = self.groups.iter().map(|g| g[0]).collect();
        self.source.gather(&indices)
    }

    /// Evaluate one aggregate expression per group.
    ///
    /// The result holds one value per group, in group order.
    ///
    /// # Errors
    /// Returns error if the expression fails over any group
    pub fn agg(&self, expr: &AggExpr) -> DataResult<Series> {
        let mut results = Vec::with_capacity(self.groups.len());
        for indices in &self.groups {
            results.push(expr.evaluate(&self.source.gather(indices))?);
        }
        let name = expr.name_hint().unwrap_or_else(|| "0".to_string());
        Ok(Series::from_values(name, results))
    }

    /// Evaluate several aggregate expressions per group, producing a table
    /// with one column per expression and one row per group.
    ///
    /// # Errors
    /// Returns error if no expression is supplied or any expression fails
    pub fn agg_multiple(&self, exprs: &[AggExpr]) -> DataResult<DataFrame> {
        if exprs.is_empty() {
            return Err(DataError::Configuration(
                "at least one aggregate expression is required".to_string(),
            ));
        }

        let mut columns = Vec::with_capacity(exprs.len());
        let mut unnamed = 0;
        for expr in exprs {
            let mut results = Vec::with_capacity(self.groups.len());
            for indices in &self.groups {
                results.push(expr.evaluate(&self.source.gather(indices))?);
            }
            columns.push(Series::from_values(fallback_name(expr, &mut unnamed), results));
        }

        DataFrame::from_series(columns)
    }
}

/// A table partitioned by key columns, in first-occurrence key order
#[derive(Debug, Clone)]
pub struct GroupedDataFrame {
    /// The table the groups index into
    source: DataFrame,
    /// The columns the keys were drawn from
    key_columns: Vec<String>,
    /// Distinct key tuples, in first-occurrence order
    keys: Vec<Vec<Value>>,
    /// Row indices per group, aligned with `keys`, in source order
    groups: Vec<Vec<usize>>,
}

impl GroupedDataFrame {
    /// Partition `source` by the given key columns.
    ///
    /// Rows with a null in any key component belong to no group.
    ///
    /// # Errors
    /// Returns error if any key column does not exist
    pub(crate) fn new(source: &DataFrame, key_columns: &[&str]) -> DataResult<Self> {
        let key_series: Vec<Series> = key_columns
            .iter()
            .map(|name| source.column(name))
            .collect::<DataResult<Vec<_>>>()?;

        let mut slots: HashMap<Vec<GroupKey>, usize> = HashMap::new();
        let mut keys = Vec::new();
        let mut groups: Vec<Vec<usize>> = Vec::new();

        for row in 0..source.num_rows() {
            let tuple: Vec<Value> = key_series
                .iter()
                .map(|s| s.get(row))
                .collect::<DataResult<Vec<_>>>()?;
            if tuple.iter().any(Value::is_null) {
                continue;
            }

            let hashed: Vec<GroupKey> = tuple.iter().map(group_key).collect();
            let slot = match slots.entry(hashed) {
                Entry::Occupied(entry) => *entry.get(),
                Entry::Vacant(entry) => {
                    let slot = keys.len();
                    keys.push(tuple);
                    groups.push(Vec::new());
                    entry.insert(slot);
                    slot
                }
            };
            groups[slot].push(row);
        }

        Ok(Self {
            source: source.clone(),
            key_columns: key_columns.iter().map(ToString::to_string).collect(),
            keys,
            groups,
        })
    }

    /// Get the number of groups
    #[must_use]
    pub fn num_groups(&self) -> usize {
        self.keys.len()
    }

    /// Get the key column names
    #[must_use]
    pub fn key_columns(&self) -> &[String] {
        &self.key_columns
    }

    /// Distinct key tuples, in first-occurrence order
    #[must_use]
    pub fn keys(&self) -> &[Vec<Value>] {
        &self.keys
    }

    /// Sub-table of the group at `index`, rows in source order
    ///
    /// # Errors
    /// Returns error if `index` is past the last group
    pub fn group_at(&self, index: usize) -> DataResult<DataFrame> {
        let indices = self.groups.get(index).ok_or(DataError::OutOfBounds {
            index,
            length: self.groups.len(),
        })?;
        self.source.filter_by_indices(indices)
    }

    /// Apply aggregations and return a table: key columns first, then one
    /// column per expression, one row per group in group order.
    ///
    /// # Errors
    /// Returns error if no expression is supplied, an expression references a
    /// missing column, or an expression other than `count` has no column
    pub fn aggregate(&self, exprs: &[AggExpr]) -> DataResult<DataFrame> {
        if exprs.is_empty() {
            return Err(DataError::Configuration(
                "at least one aggregate expression is required".to_string(),
            ));
        }

        let mut columns = Vec::with_capacity(self.key_columns.len() + exprs.len());

        for (component, name) in self.key_columns.iter().enumerate() {
            let values: Vec<Value> = self.keys.iter().map(|k| k[component].clone()).collect();
            columns.push(Series::from_values(name.clone(), values));
        }

        let mut unnamed = 0;
        for expr in exprs {
            let values = match (&expr.op, expr.column()) {
                #[allow(clippy::cast_possible_wrap)]
                (AggOp::Count, None) => self
                    .groups
                    .iter()
                    .map(|g| Value::Long(g.len() as i64))
                    .collect::<Vec<_>>(),
                (_, None) => {
                    return Err(DataError::Configuration(format!(
                        "{} requires a source column",
                        expr.op.name()
                    )));
                }
                (_, Some(col)) => {
                    let series = self.source.column(col)?;
                    let mut results = Vec::with_capacity(self.groups.len());
                    for indices in &self.groups {
                        results.push(expr.evaluate(&series.gather(indices))?);
                    }
                    results
                }
            };
            columns.push(Series::from_values(fallback_name(expr, &mut unnamed), values));
        }

        DataFrame::from_series(columns)
    }
}

/// Name an aggregate output column: the expression's own hint, or the next
/// positional label for expressions with no derivable name.
fn fallback_name(expr: &AggExpr, unnamed: &mut usize) -> String {
    expr.name_hint().unwrap_or_else(|| {
        let name = unnamed.to_string();
        *unnamed += 1;
        name
    })
}
