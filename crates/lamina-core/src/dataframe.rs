//! DataFrame: an ordered set of uniquely-named, equal-length columns

use std::collections::HashSet;
use std::fmt;

use rayon::prelude::*;

use crate::error::{DataError, DataResult};
use crate::expand::{self, ColExpr};
use crate::grouped::GroupedDataFrame;
use crate::parallel::should_parallelize;
use crate::series::Series;
use crate::value::{Kind, Value};

/// A two-dimensional, column-oriented table.
///
/// Columns are uniquely named and equal-length. A table is immutable after
/// construction: every transform builds a fresh table and shares no mutable
/// state with its inputs.
#[derive(Clone)]
pub struct DataFrame {
    columns: Vec<Series>,
}

impl DataFrame {
    /// Create a table with no columns
    #[must_use]
    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    /// Create a table from a vector of columns
    ///
    /// # Errors
    /// Returns error if columns differ in length or share a name
    pub fn from_series(columns: Vec<Series>) -> DataResult<Self> {
        if let Some(first) = columns.first() {
            let len = first.len();
            for col in &columns {
                if col.len() != len {
                    return Err(DataError::InvalidShape(format!(
                        "column '{}' has {} rows, expected {}",
                        col.name(),
                        col.len(),
                        len
                    )));
                }
            }
        }

        let mut seen = HashSet::new();
        for col in &columns {
            if !seen.insert(col.name().to_string()) {
                return Err(DataError::DuplicateColumn(col.name().to_string()));
            }
        }

        Ok(Self { columns })
    }

    /// Create a table from row-major values folded under the given names.
    ///
    /// `values` is consumed row by row: with names `["a", "b"]`, the input
    /// `[1, "x", 2, "y"]` yields two rows. Column kinds are derived from the
    /// values, as in [`Series::from_values`].
    ///
    /// # Errors
    /// Returns error if no names are given or the value count does not fill
    /// whole rows
    pub fn fold_by_row(names: &[&str], values: Vec<Value>) -> DataResult<Self> {
        if names.is_empty() {
            return Err(DataError::Configuration(
                "at least one column name is required".to_string(),
            ));
        }
        if values.len() % names.len() != 0 {
            return Err(DataError::InvalidShape(format!(
                "{} values cannot fill whole rows of {} columns",
                values.len(),
                names.len()
            )));
        }

        let width = names.len();
        let mut cells: Vec<Vec<Value>> = vec![Vec::with_capacity(values.len() / width); width];
        for (i, value) in values.into_iter().enumerate() {
            cells[i % width].push(value);
        }

        let columns = names
            .iter()
            .zip(cells)
            .map(|(name, values)| Series::from_values(*name, values))
            .collect();
        Self::from_series(columns)
    }

    /// Get column names
    #[must_use]
    pub fn columns(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name().to_string()).collect()
    }

    /// Get the number of columns
    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Get the number of rows
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, Series::len)
    }

    /// Check if the table has no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    /// Get a column by name
    ///
    /// # Errors
    /// Returns error if the column does not exist
    pub fn column(&self, name: &str) -> DataResult<Series> {
        self.columns
            .iter()
            .find(|c| c.name() == name)
            .cloned()
            .ok_or_else(|| DataError::Reference(name.to_string()))
    }

    /// Get a column by index
    ///
    /// # Errors
    /// Returns error if the index is out of bounds
    pub fn column_by_index(&self, index: usize) -> DataResult<Series> {
        self.columns
            .get(index)
            .cloned()
            .ok_or(DataError::OutOfBounds {
                index,
                length: self.columns.len(),
            })
    }

    /// Iterate over the columns
    pub fn iter_columns(&self) -> std::slice::Iter<'_, Series> {
        self.columns.iter()
    }

    /// Get one row as a vector of cell values, in column order
    ///
    /// # Errors
    /// Returns error if the index is out of bounds
    pub fn row(&self, index: usize) -> DataResult<Vec<Value>> {
        if index >= self.num_rows() {
            return Err(DataError::OutOfBounds {
                index,
                length: self.num_rows(),
            });
        }
        self.columns.iter().map(|c| c.get(index)).collect()
    }

    /// Select specific columns by name
    ///
    /// # Errors
    /// Returns error if any column is not found
    pub fn select(&self, names: &[&str]) -> DataResult<Self> {
        let columns: Vec<Series> = names
            .iter()
            .map(|name| self.column(name))
            .collect::<DataResult<Vec<_>>>()?;
        Self::from_series(columns)
    }

    /// Drop columns by name
    ///
    /// # Errors
    /// Returns error if the result would have no columns
    pub fn drop_columns(&self, names: &[&str]) -> DataResult<Self> {
        let keep: Vec<Series> = self
            .columns
            .iter()
            .filter(|c| !names.contains(&c.name()))
            .cloned()
            .collect();

        if keep.is_empty() {
            return Err(DataError::InvalidShape(
                "dropping every column leaves an empty table".to_string(),
            ));
        }
        Self::from_series(keep)
    }

    /// Rename a column, keeping its position
    ///
    /// # Errors
    /// Returns error if the column is not found
    pub fn rename_column(&self, old_name: &str, new_name: &str) -> DataResult<Self> {
        if !self.columns.iter().any(|c| c.name() == old_name) {
            return Err(DataError::Reference(old_name.to_string()));
        }
        let columns = self
            .columns
            .iter()
            .map(|c| {
                if c.name() == old_name {
                    c.clone().rename(new_name)
                } else {
                    c.clone()
                }
            })
            .collect();
        Self::from_series(columns)
    }

    /// Get the first n rows
    #[must_use]
    pub fn head(&self, n: usize) -> Self {
        let take = n.min(self.num_rows());
        let indices: Vec<usize> = (0..take).collect();
        self.gather(&indices)
    }

    /// Get the last n rows
    #[must_use]
    pub fn tail(&self, n: usize) -> Self {
        let total = self.num_rows();
        let skip = total.saturating_sub(n);
        let indices: Vec<usize> = (skip..total).collect();
        self.gather(&indices)
    }

    fn gather(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.iter().map(|c| c.gather(indices)).collect(),
        }
    }

    /// Build a new table from the rows at the given indices, in order.
    ///
    /// Column work moves to the thread pool for large selections.
    ///
    /// # Errors
    /// Returns error if any index is out of bounds
    pub fn filter_by_indices(&self, indices: &[usize]) -> DataResult<Self> {
        let num_rows = self.num_rows();
        for &idx in indices {
            if idx >= num_rows {
                return Err(DataError::OutOfBounds {
                    index: idx,
                    length: num_rows,
                });
            }
        }

        let columns: Vec<Series> = if should_parallelize(indices.len() * self.num_columns()) {
            self.columns.par_iter().map(|c| c.gather(indices)).collect()
        } else {
            self.columns.iter().map(|c| c.gather(indices)).collect()
        };

        Ok(Self { columns })
    }

    /// Partition the table by the given key columns, in first-occurrence key
    /// order. Rows with a null key component belong to no group.
    ///
    /// # Errors
    /// Returns error if any key column does not exist
    pub fn group_by(&self, key_columns: &[&str]) -> DataResult<GroupedDataFrame> {
        GroupedDataFrame::new(self, key_columns)
    }

    /// Expand a sequence-valued expression into the given target columns (or
    /// into data-derived columns when `targets` is empty).
    ///
    /// See the expansion rules on [`ColExpr`] and the crate docs.
    ///
    /// # Errors
    /// Returns error if the expression fails or produces non-sequence values
    pub fn expand(&self, targets: &[&str], expr: &ColExpr) -> DataResult<Self> {
        expand::expand(self, targets, expr)
    }

    // ========================================================================
    // Structural equality
    // ========================================================================

    /// Compare two tables cell by cell.
    ///
    /// The result has the same shape with boolean cells; null equals null,
    /// null never equals a value.
    ///
    /// # Errors
    /// Returns error if the tables differ in column names or row count
    pub fn eq(&self, other: &DataFrame) -> DataResult<Self> {
        self.compare(other, false)
    }

    /// Cell-wise negation of [`DataFrame::eq`], under the same shape checks
    ///
    /// # Errors
    /// Returns error if the tables differ in column names or row count
    pub fn ne(&self, other: &DataFrame) -> DataResult<Self> {
        self.compare(other, true)
    }

    fn compare(&self, other: &DataFrame, negate: bool) -> DataResult<Self> {
        self.check_same_shape(other)?;

        let build = |(left, right): &(&Series, &Series)| -> Series {
            let values = left
                .iter()
                .zip(right.iter())
                .map(|(a, b)| Value::Bool((a == b) != negate))
                .collect();
            Series::with_kind(left.name().to_string(), Kind::Bool, values)
        };

        let pairs: Vec<(&Series, &Series)> =
            self.columns.iter().zip(other.columns.iter()).collect();
        let columns: Vec<Series> = if should_parallelize(self.num_rows() * self.num_columns()) {
            pairs.par_iter().map(build).collect()
        } else {
            pairs.iter().map(build).collect()
        };

        Ok(Self { columns })
    }

    fn check_same_shape(&self, other: &DataFrame) -> DataResult<()> {
        let left = self.columns();
        let right = other.columns();
        if left != right {
            return Err(DataError::InvalidShape(format!(
                "column names differ: expected [{}], found [{}]",
                left.join(", "),
                right.join(", ")
            )));
        }
        if self.num_rows() != other.num_rows() {
            return Err(DataError::InvalidShape(format!(
                "row counts differ: {} vs {}",
                self.num_rows(),
                other.num_rows()
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for DataFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DataFrame {{ columns: {:?}, rows: {} }}",
            self.columns(),
            self.num_rows()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ab_frame(values: Vec<Value>) -> DataFrame {
        DataFrame::fold_by_row(&["a", "b"], values).unwrap()
    }

    #[test]
    fn test_from_series() {
        let names = Series::from_strings("name", vec!["Alice", "Bob", "Charlie"]);
        let ages = Series::from_ints("age", vec![25, 30, 35]);

        let df = DataFrame::from_series(vec![names, ages]).unwrap();
        assert_eq!(df.num_columns(), 2);
        assert_eq!(df.num_rows(), 3);
        assert_eq!(df.columns(), vec!["name", "age"]);
    }

    #[test]
    fn test_from_series_length_mismatch() {
        let a = Series::from_ints("a", vec![1, 2, 3]);
        let b = Series::from_ints("b", vec![1]);
        assert!(matches!(
            DataFrame::from_series(vec![a, b]),
            Err(DataError::InvalidShape(_))
        ));
    }

    #[test]
    fn test_from_series_duplicate_names() {
        let a = Series::from_ints("a", vec![1]);
        let also_a = Series::from_ints("a", vec![2]);
        assert_eq!(
            DataFrame::from_series(vec![a, also_a]).err(),
            Some(DataError::DuplicateColumn("a".to_string()))
        );
    }

    #[test]
    fn test_fold_by_row() {
        let df = ab_frame(vec![
            Value::Int(1),
            Value::string("x"),
            Value::Int(2),
            Value::string("y"),
        ]);

        assert_eq!(df.num_rows(), 2);
        assert_eq!(df.row(0).unwrap(), vec![Value::Int(1), Value::string("x")]);
        assert_eq!(df.row(1).unwrap(), vec![Value::Int(2), Value::string("y")]);
    }

    #[test]
    fn test_fold_by_row_ragged_input() {
        assert!(matches!(
            DataFrame::fold_by_row(&["a", "b"], vec![Value::Int(1)]),
            Err(DataError::InvalidShape(_))
        ));
        assert!(matches!(
            DataFrame::fold_by_row(&[], vec![]),
            Err(DataError::Configuration(_))
        ));
    }

    #[test]
    fn test_column_access() {
        let df = ab_frame(vec![Value::Int(1), Value::string("x")]);

        assert_eq!(df.column("a").unwrap().to_values(), vec![Value::Int(1)]);
        assert!(matches!(
            df.column("nope"),
            Err(DataError::Reference(_))
        ));
        assert_eq!(df.column_by_index(1).unwrap().name(), "b");
        assert!(df.column_by_index(2).is_err());
    }

    #[test]
    fn test_select_and_drop() {
        let df = DataFrame::from_series(vec![
            Series::from_ints("a", vec![1, 2]),
            Series::from_ints("b", vec![3, 4]),
            Series::from_ints("c", vec![5, 6]),
        ])
        .unwrap();

        let selected = df.select(&["c", "a"]).unwrap();
        assert_eq!(selected.columns(), vec!["c", "a"]);

        let dropped = df.drop_columns(&["b"]).unwrap();
        assert_eq!(dropped.columns(), vec!["a", "c"]);

        assert!(df.drop_columns(&["a", "b", "c"]).is_err());
    }

    #[test]
    fn test_rename_column() {
        let df = ab_frame(vec![Value::Int(1), Value::string("x")]);
        let renamed = df.rename_column("b", "label").unwrap();
        assert_eq!(renamed.columns(), vec!["a", "label"]);
        assert!(df.rename_column("zzz", "w").is_err());
    }

    #[test]
    fn test_head_tail() {
        let df = DataFrame::from_series(vec![Series::from_ints(
            "n",
            vec![1, 2, 3, 4, 5],
        )])
        .unwrap();

        assert_eq!(df.head(2).column("n").unwrap().to_values(), vec![
            Value::Int(1),
            Value::Int(2)
        ]);
        assert_eq!(df.tail(2).column("n").unwrap().to_values(), vec![
            Value::Int(4),
            Value::Int(5)
        ]);
        assert_eq!(df.head(10).num_rows(), 5);
    }

    #[test]
    fn test_filter_by_indices() {
        let df = ab_frame(vec![
            Value::Int(1),
            Value::string("x"),
            Value::Int(2),
            Value::string("y"),
            Value::Int(3),
            Value::string("z"),
        ]);

        let picked = df.filter_by_indices(&[2, 0]).unwrap();
        assert_eq!(picked.row(0).unwrap(), vec![Value::Int(3), Value::string("z")]);
        assert_eq!(picked.row(1).unwrap(), vec![Value::Int(1), Value::string("x")]);

        assert!(df.filter_by_indices(&[3]).is_err());
    }

    // ===== eq / ne =====

    #[test]
    fn test_eq_identical() {
        let df1 = ab_frame(vec![
            Value::Int(1),
            Value::string("x"),
            Value::Int(2),
            Value::string("y"),
        ]);
        let df2 = ab_frame(vec![
            Value::Int(1),
            Value::string("x"),
            Value::Int(2),
            Value::string("y"),
        ]);

        let eq = df1.eq(&df2).unwrap();
        assert_eq!(eq.columns(), vec!["a", "b"]);
        assert_eq!(eq.row(0).unwrap(), vec![Value::Bool(true), Value::Bool(true)]);
        assert_eq!(eq.row(1).unwrap(), vec![Value::Bool(true), Value::Bool(true)]);
    }

    #[test]
    fn test_eq_one_cell_differs() {
        let df1 = ab_frame(vec![
            Value::Int(1),
            Value::string("x"),
            Value::Int(2),
            Value::string("y"),
        ]);
        let df2 = ab_frame(vec![
            Value::Int(1),
            Value::string("X"),
            Value::Int(2),
            Value::string("y"),
        ]);

        let eq = df1.eq(&df2).unwrap();
        assert_eq!(eq.row(0).unwrap(), vec![Value::Bool(true), Value::Bool(false)]);
        assert_eq!(eq.row(1).unwrap(), vec![Value::Bool(true), Value::Bool(true)]);
    }

    #[test]
    fn test_ne_is_cellwise_negation() {
        let df1 = ab_frame(vec![
            Value::Int(1),
            Value::string("x"),
            Value::Int(2),
            Value::string("y"),
        ]);
        let df2 = ab_frame(vec![
            Value::Int(1),
            Value::string("x"),
            Value::Int(2),
            Value::string("Y"),
        ]);

        let eq = df1.eq(&df2).unwrap();
        let ne = df1.ne(&df2).unwrap();
        for row in 0..eq.num_rows() {
            let eq_row = eq.row(row).unwrap();
            let ne_row = ne.row(row).unwrap();
            for (e, n) in eq_row.iter().zip(ne_row.iter()) {
                match (e, n) {
                    (Value::Bool(e), Value::Bool(n)) => assert_eq!(*e, !n),
                    _ => panic!("expected boolean cells"),
                }
            }
        }
        assert_eq!(ne.row(1).unwrap(), vec![Value::Bool(false), Value::Bool(true)]);
    }

    #[test]
    fn test_eq_null_semantics() {
        let df1 = ab_frame(vec![Value::Null, Value::Null, Value::Int(2), Value::string("y")]);
        let df2 = ab_frame(vec![Value::Null, Value::string("x"), Value::Int(2), Value::Null]);

        let eq = df1.eq(&df2).unwrap();
        // null == null, null != value
        assert_eq!(eq.row(0).unwrap(), vec![Value::Bool(true), Value::Bool(false)]);
        assert_eq!(eq.row(1).unwrap(), vec![Value::Bool(true), Value::Bool(false)]);
    }

    #[test]
    fn test_eq_column_mismatch() {
        let df1 = ab_frame(vec![Value::Int(1), Value::string("x")]);
        let df2 = DataFrame::fold_by_row(&["a", "B"], vec![Value::Int(1), Value::string("x")])
            .unwrap();

        assert!(matches!(df1.ne(&df2), Err(DataError::InvalidShape(_))));
        assert!(matches!(df1.eq(&df2), Err(DataError::InvalidShape(_))));
    }

    #[test]
    fn test_eq_row_count_mismatch() {
        let df1 = ab_frame(vec![
            Value::Int(1),
            Value::string("x"),
            Value::Int(2),
            Value::string("y"),
        ]);
        let df2 = ab_frame(vec![Value::Int(2), Value::string("Y")]);

        assert!(matches!(df1.ne(&df2), Err(DataError::InvalidShape(_))));
    }

    #[test]
    fn test_eq_column_order_matters() {
        let df1 = ab_frame(vec![Value::Int(1), Value::string("x")]);
        let df2 = DataFrame::fold_by_row(&["b", "a"], vec![Value::string("x"), Value::Int(1)])
            .unwrap();

        assert!(matches!(df1.eq(&df2), Err(DataError::InvalidShape(_))));
    }
}
