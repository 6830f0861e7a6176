//! Per-row expressions and column-set expansion
//!
//! Expansion reshapes a sequence-valued column into scalar columns. Targets
//! are either declared up front (static mode) or derived from the data when
//! the target list is empty (dynamic mode).

use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;

use crate::dataframe::DataFrame;
use crate::error::{DataError, DataResult};
use crate::parallel::should_parallelize;
use crate::series::Series;
use crate::value::Value;

/// A pure per-row expression over a table.
///
/// An expression reads one source column (or a constant) and optionally maps
/// each value through a composed function. Mappings never see null: a null
/// input propagates to a null output.
#[derive(Clone)]
pub struct ColExpr {
    source: Source,
    map: Option<Arc<dyn Fn(&Value) -> Value + Send + Sync>>,
}

#[derive(Clone)]
enum Source {
    Col(String),
    Val(Value),
}

impl ColExpr {
    /// Expression reading the named column.
    ///
    /// The column is resolved at evaluation time; a missing name fails the
    /// evaluating operation with a reference error.
    #[must_use]
    pub fn col(name: impl Into<String>) -> Self {
        Self {
            source: Source::Col(name.into()),
            map: None,
        }
    }

    /// Expression producing the same value for every row
    #[must_use]
    pub fn val(value: Value) -> Self {
        Self {
            source: Source::Val(value),
            map: None,
        }
    }

    /// Compose a mapping over the expression's non-null outputs
    #[must_use]
    pub fn map_val<F>(self, f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        let prev = self.map;
        let composed: Arc<dyn Fn(&Value) -> Value + Send + Sync> = match prev {
            None => Arc::new(f),
            Some(g) => Arc::new(move |v| {
                let mid = g(v);
                if mid.is_null() {
                    Value::Null
                } else {
                    f(&mid)
                }
            }),
        };
        Self {
            source: self.source,
            map: Some(composed),
        }
    }

    /// Evaluate the expression over every row of `df`
    ///
    /// # Errors
    /// Returns error if the source column does not exist
    pub(crate) fn eval(&self, df: &DataFrame) -> DataResult<Vec<Value>> {
        let base: Vec<Value> = match &self.source {
            Source::Col(name) => df.column(name)?.to_values(),
            Source::Val(value) => vec![value.clone(); df.num_rows()],
        };

        match &self.map {
            None => Ok(base),
            Some(f) => Ok(base
                .iter()
                .map(|v| if v.is_null() { Value::Null } else { f(v) })
                .collect()),
        }
    }
}

impl fmt::Debug for ColExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match &self.source {
            Source::Col(name) => format!("col({name})"),
            Source::Val(value) => format!("val({value})"),
        };
        write!(
            f,
            "ColExpr {{ source: {source}, mapped: {} }}",
            self.map.is_some()
        )
    }
}

/// Expand a sequence-valued expression into scalar columns of `df`.
///
/// With declared `targets`, sequence position `i` feeds target column `i`:
/// a null sequence nulls every target for that row, short sequences null-pad
/// the remaining targets, extra trailing elements are discarded. Target names
/// matching existing columns overwrite them in place; new names are appended.
///
/// With no `targets` (dynamic mode), the output width is the maximum sequence
/// length across all rows and the new columns are appended after the existing
/// ones, named by their absolute 0-based column index.
pub(crate) fn expand(
    df: &DataFrame,
    targets: &[&str],
    expr: &ColExpr,
) -> DataResult<DataFrame> {
    let seqs = expr
        .eval(df)?
        .into_iter()
        .map(|v| match v {
            Value::Null => Ok(None),
            Value::List(items) => Ok(Some(items)),
            other => Err(DataError::TypeMismatch {
                expected: "sequence".to_string(),
                found: other.type_name().to_string(),
            }),
        })
        .collect::<DataResult<Vec<Option<Arc<Vec<Value>>>>>>()?;

    let start = df.num_columns();
    let generated: Vec<String>;
    let names: Vec<&str> = if targets.is_empty() {
        let width = seqs.iter().map(|s| s.as_ref().map_or(0, |v| v.len())).max().unwrap_or(0);
        generated = (start..start + width).map(|i| i.to_string()).collect();
        generated.iter().map(String::as_str).collect()
    } else {
        targets.to_vec()
    };

    let element_column = |position: usize| -> Vec<Value> {
        seqs.iter()
            .map(|s| {
                s.as_ref()
                    .and_then(|items| items.get(position))
                    .cloned()
                    .unwrap_or(Value::Null)
            })
            .collect()
    };

    let extracted: Vec<Vec<Value>> = if should_parallelize(df.num_rows() * names.len()) {
        (0..names.len()).into_par_iter().map(element_column).collect()
    } else {
        (0..names.len()).map(element_column).collect()
    };

    let mut columns: Vec<Series> = df.iter_columns().cloned().collect();
    for (name, values) in names.iter().zip(extracted) {
        let series = Series::from_values(*name, values);
        match columns.iter().position(|c| c.name() == *name) {
            Some(existing) => columns[existing] = series,
            None => columns.push(series),
        }
    }

    DataFrame::from_series(columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_column_frame(rows: Vec<(i32, &str)>) -> DataFrame {
        let (a, b): (Vec<i32>, Vec<&str>) = rows.into_iter().unzip();
        DataFrame::from_series(vec![
            Series::from_ints("a", a),
            Series::from_strings("b", b),
        ])
        .unwrap()
    }

    fn by_length(v: &Value) -> Value {
        // 1 -> [one], 2 -> [one, two], 3 -> [one, two, three]
        match v {
            Value::Int(1) => Value::list(vec![Value::string("one")]),
            Value::Int(2) => Value::list(vec![Value::string("one"), Value::string("two")]),
            Value::Int(3) => Value::list(vec![
                Value::string("one"),
                Value::string("two"),
                Value::string("three"),
            ]),
            _ => Value::Null,
        }
    }

    #[test]
    fn test_expand_constant_overwrites_and_appends() {
        let df = two_column_frame(vec![(1, "x"), (2, "y")]);
        let expanded = df
            .expand(
                &["c", "b"],
                &ColExpr::val(Value::list(vec![
                    Value::string("one"),
                    Value::string("two"),
                ])),
            )
            .unwrap();

        // "b" is overwritten in place, "c" is appended
        assert_eq!(expanded.columns(), vec!["a", "b", "c"]);
        assert_eq!(expanded.row(0).unwrap(), vec![
            Value::Int(1),
            Value::string("two"),
            Value::string("one"),
        ]);
        assert_eq!(expanded.row(1).unwrap(), vec![
            Value::Int(2),
            Value::string("two"),
            Value::string("one"),
        ]);
    }

    #[test]
    fn test_expand_varying_sizes() {
        let df = two_column_frame(vec![(1, "x"), (2, "y"), (3, "z")]);
        let expanded = df
            .expand(&["b", "c"], &ColExpr::col("a").map_val(by_length))
            .unwrap();

        assert_eq!(expanded.columns(), vec!["a", "b", "c"]);
        // Short sequences null-pad, long sequences lose trailing elements
        assert_eq!(expanded.row(0).unwrap(), vec![
            Value::Int(1),
            Value::string("one"),
            Value::Null,
        ]);
        assert_eq!(expanded.row(1).unwrap(), vec![
            Value::Int(2),
            Value::string("one"),
            Value::string("two"),
        ]);
        assert_eq!(expanded.row(2).unwrap(), vec![
            Value::Int(3),
            Value::string("one"),
            Value::string("two"),
        ]);
    }

    #[test]
    fn test_expand_null_sequence_nulls_every_target() {
        let df = two_column_frame(vec![(1, "x"), (2, "y"), (3, "z")]);
        let expanded = df
            .expand(
                &["b", "c"],
                &ColExpr::col("a").map_val(|v| match v {
                    Value::Int(1) => Value::list(vec![Value::string("one")]),
                    Value::Int(3) => Value::list(vec![
                        Value::string("one"),
                        Value::string("two"),
                        Value::string("three"),
                    ]),
                    _ => Value::Null,
                }),
            )
            .unwrap();

        assert_eq!(expanded.row(1).unwrap(), vec![
            Value::Int(2),
            Value::Null,
            Value::Null,
        ]);
        assert_eq!(expanded.row(2).unwrap(), vec![
            Value::Int(3),
            Value::string("one"),
            Value::string("two"),
        ]);
    }

    #[test]
    fn test_expand_dynamic_width_and_names() {
        let df = two_column_frame(vec![(1, "x"), (2, "y"), (3, "z")]);
        let expanded = df
            .expand(&[], &ColExpr::col("a").map_val(by_length))
            .unwrap();

        // Width is the maximum observed length; names are absolute indices
        assert_eq!(expanded.columns(), vec!["a", "b", "2", "3", "4"]);
        assert_eq!(expanded.row(0).unwrap(), vec![
            Value::Int(1),
            Value::string("x"),
            Value::string("one"),
            Value::Null,
            Value::Null,
        ]);
        assert_eq!(expanded.row(1).unwrap(), vec![
            Value::Int(2),
            Value::string("y"),
            Value::string("one"),
            Value::string("two"),
            Value::Null,
        ]);
        assert_eq!(expanded.row(2).unwrap(), vec![
            Value::Int(3),
            Value::string("z"),
            Value::string("one"),
            Value::string("two"),
            Value::string("three"),
        ]);
    }

    #[test]
    fn test_expand_dynamic_all_null_adds_nothing() {
        let df = two_column_frame(vec![(7, "x"), (8, "y")]);
        let expanded = df
            .expand(&[], &ColExpr::col("a").map_val(|_| Value::Null))
            .unwrap();
        assert_eq!(expanded.columns(), vec!["a", "b"]);
    }

    #[test]
    fn test_expand_rejects_scalar_sequence() {
        let df = two_column_frame(vec![(1, "x")]);
        let result = df.expand(&["c"], &ColExpr::col("a"));
        assert!(matches!(result, Err(DataError::TypeMismatch { .. })));
    }

    #[test]
    fn test_expand_unknown_source_column() {
        let df = two_column_frame(vec![(1, "x")]);
        let result = df.expand(&["c"], &ColExpr::col("missing"));
        assert!(matches!(result, Err(DataError::Reference(name)) if name == "missing"));
    }

    #[test]
    fn test_map_val_composes_and_skips_nulls() {
        let df = DataFrame::from_series(vec![Series::from_optional_ints(
            "a",
            vec![Some(1), None],
        )])
        .unwrap();

        let expr = ColExpr::col("a")
            .map_val(|v| match v {
                Value::Int(i) => Value::Int(i + 1),
                _ => Value::Null,
            })
            .map_val(|v| match v {
                Value::Int(i) => Value::list(vec![Value::Int(*i * 10)]),
                _ => Value::Null,
            });

        let values = expr.eval(&df).unwrap();
        assert_eq!(
            values,
            vec![Value::list(vec![Value::Int(20)]), Value::Null]
        );
    }
}
