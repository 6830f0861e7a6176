//! Series: a single named column of nullable values

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::error::{DataError, DataResult};
use crate::grouped::GroupedSeries;
use crate::types::{self, TypeRef};
use crate::value::{Kind, Value};

/// A single column of nullable values with a declared element kind.
///
/// A series is immutable after construction; every transform produces a new
/// series. The backing store is reference-counted, so cloning a series shares
/// data (and the inferred-type cache) without copying.
#[derive(Clone)]
pub struct Series {
    /// Column name
    name: String,
    /// Declared element kind
    kind: Kind,
    /// The cell values (shared, never mutated)
    values: Arc<Vec<Value>>,
    /// Narrowest common runtime ancestor of the non-null cells, computed on
    /// first request
    inferred: Arc<OnceLock<TypeRef>>,
}

impl Series {
    pub(crate) fn with_kind(name: impl Into<String>, kind: Kind, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            kind,
            values: Arc::new(values),
            inferred: Arc::new(OnceLock::new()),
        }
    }

    /// Create a series from a vector of 32-bit integers
    #[must_use]
    pub fn from_ints(name: impl Into<String>, values: Vec<i32>) -> Self {
        let values = values.into_iter().map(Value::Int).collect();
        Self::with_kind(name, Kind::Int, values)
    }

    /// Create a series from a vector of optional 32-bit integers
    #[must_use]
    pub fn from_optional_ints(name: impl Into<String>, values: Vec<Option<i32>>) -> Self {
        let values = values
            .into_iter()
            .map(|v| v.map_or(Value::Null, Value::Int))
            .collect();
        Self::with_kind(name, Kind::Int, values)
    }

    /// Create a series from a vector of 64-bit integers
    #[must_use]
    pub fn from_longs(name: impl Into<String>, values: Vec<i64>) -> Self {
        let values = values.into_iter().map(Value::Long).collect();
        Self::with_kind(name, Kind::Long, values)
    }

    /// Create a series from a vector of optional 64-bit integers
    #[must_use]
    pub fn from_optional_longs(name: impl Into<String>, values: Vec<Option<i64>>) -> Self {
        let values = values
            .into_iter()
            .map(|v| v.map_or(Value::Null, Value::Long))
            .collect();
        Self::with_kind(name, Kind::Long, values)
    }

    /// Create a series from a vector of floats
    #[must_use]
    pub fn from_doubles(name: impl Into<String>, values: Vec<f64>) -> Self {
        let values = values.into_iter().map(Value::Double).collect();
        Self::with_kind(name, Kind::Double, values)
    }

    /// Create a series from a vector of optional floats
    #[must_use]
    pub fn from_optional_doubles(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        let values = values
            .into_iter()
            .map(|v| v.map_or(Value::Null, Value::Double))
            .collect();
        Self::with_kind(name, Kind::Double, values)
    }

    /// Create a series from a vector of booleans
    #[must_use]
    pub fn from_bools(name: impl Into<String>, values: Vec<bool>) -> Self {
        let values = values.into_iter().map(Value::Bool).collect();
        Self::with_kind(name, Kind::Bool, values)
    }

    /// Create a series from a vector of optional booleans
    #[must_use]
    pub fn from_optional_bools(name: impl Into<String>, values: Vec<Option<bool>>) -> Self {
        let values = values
            .into_iter()
            .map(|v| v.map_or(Value::Null, Value::Bool))
            .collect();
        Self::with_kind(name, Kind::Bool, values)
    }

    /// Create a series from a vector of strings
    #[must_use]
    pub fn from_strings(name: impl Into<String>, values: Vec<&str>) -> Self {
        let values = values.into_iter().map(Value::string).collect();
        Self::with_kind(name, Kind::Str, values)
    }

    /// Create a series from a vector of optional strings
    #[must_use]
    pub fn from_optional_strings(name: impl Into<String>, values: Vec<Option<&str>>) -> Self {
        let values = values
            .into_iter()
            .map(|v| v.map_or(Value::Null, Value::string))
            .collect();
        Self::with_kind(name, Kind::Str, values)
    }

    /// Create a series from arbitrary values.
    ///
    /// The declared kind is taken from the first non-null value; when later
    /// values disagree (or the input is empty or all-null) the series is
    /// declared [`Kind::Obj`].
    #[must_use]
    pub fn from_values(name: impl Into<String>, values: Vec<Value>) -> Self {
        let mut kinds = values.iter().filter_map(Value::kind);
        let kind = match kinds.next() {
            Some(first) if kinds.all(|k| k == first) => first,
            _ => Kind::Obj,
        };
        Self::with_kind(name, kind, values)
    }

    /// Get the column name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the series
    #[must_use]
    pub fn rename(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Get the declared element kind
    #[must_use]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Get the number of elements
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the series is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get a value at the given index
    ///
    /// # Errors
    /// Returns error if index is out of bounds
    pub fn get(&self, index: usize) -> DataResult<Value> {
        self.values
            .get(index)
            .cloned()
            .ok_or(DataError::OutOfBounds {
                index,
                length: self.values.len(),
            })
    }

    /// Check if the value at index is null
    #[must_use]
    pub fn is_null(&self, index: usize) -> bool {
        self.values[index].is_null()
    }

    /// Iterate over the cell values
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }

    /// Get the number of null values
    #[must_use]
    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    /// Count non-null values
    #[must_use]
    pub fn count(&self) -> usize {
        self.len() - self.null_count()
    }

    /// Convert to a vector of values
    #[must_use]
    pub fn to_values(&self) -> Vec<Value> {
        self.values.as_ref().clone()
    }

    /// Get the narrowest common runtime ancestor of the non-null elements.
    ///
    /// An empty or all-null series reports the root [`types::object`] type.
    /// The result does not depend on element order and is computed once per
    /// series instance; clones share the cache.
    #[must_use]
    pub fn inferred_type(&self) -> TypeRef {
        self.inferred
            .get_or_init(|| {
                types::common_ancestor(self.values.iter().filter_map(Value::runtime_type))
            })
            .clone()
    }

    /// Build a new series from the rows at the given indices, in order
    ///
    /// # Errors
    /// Returns error if any index is out of bounds
    pub fn take(&self, indices: &[usize]) -> DataResult<Self> {
        let mut taken = Vec::with_capacity(indices.len());
        for &idx in indices {
            taken.push(self.get(idx)?);
        }
        Ok(Self::with_kind(self.name.clone(), self.kind, taken))
    }

    /// `take` for indices already known to be in range (group machinery)
    pub(crate) fn gather(&self, indices: &[usize]) -> Self {
        let taken = indices.iter().map(|&idx| self.values[idx].clone()).collect();
        Self::with_kind(self.name.clone(), self.kind, taken)
    }

    // ========================================================================
    // Scalar aggregates
    // ========================================================================

    /// Sum of the non-null values
    ///
    /// Integer kinds sum to `Long`, floats to `Double`. Returns `Null` when
    /// there is nothing to sum.
    ///
    /// # Errors
    /// Returns error for non-numeric kinds
    pub fn sum(&self) -> DataResult<Value> {
        self.check_numeric("sum")?;

        if self.kind == Kind::Double {
            let mut sum = 0.0;
            let mut seen = false;
            for v in self.values.iter() {
                if let Some(f) = numeric_f64(v)? {
                    sum += f;
                    seen = true;
                }
            }
            return Ok(if seen { Value::Double(sum) } else { Value::Null });
        }

        let mut sum: i64 = 0;
        let mut seen = false;
        for v in self.values.iter() {
            if let Some(i) = numeric_i64(v)? {
                sum += i;
                seen = true;
            }
        }
        Ok(if seen { Value::Long(sum) } else { Value::Null })
    }

    /// Mean of the non-null values, or `Null` when there are none
    ///
    /// # Errors
    /// Returns error for non-numeric kinds
    pub fn mean(&self) -> DataResult<Value> {
        self.check_numeric("mean")?;

        let mut sum = 0.0;
        let mut count: usize = 0;
        for v in self.values.iter() {
            if let Some(f) = numeric_f64(v)? {
                sum += f;
                count += 1;
            }
        }

        if count == 0 {
            Ok(Value::Null)
        } else {
            #[allow(clippy::cast_precision_loss)]
            Ok(Value::Double(sum / count as f64))
        }
    }

    /// Minimum non-null value, or `Null` when there are none
    ///
    /// # Errors
    /// Returns error for non-numeric kinds
    pub fn min(&self) -> DataResult<Value> {
        self.check_numeric("min")?;
        self.fold_extreme(|candidate, current| candidate < current)
    }

    /// Maximum non-null value, or `Null` when there are none
    ///
    /// # Errors
    /// Returns error for non-numeric kinds
    pub fn max(&self) -> DataResult<Value> {
        self.check_numeric("max")?;
        self.fold_extreme(|candidate, current| candidate > current)
    }

    fn fold_extreme(&self, replaces: impl Fn(f64, f64) -> bool) -> DataResult<Value> {
        let mut best: Option<(f64, Value)> = None;
        for v in self.values.iter() {
            let Some(f) = numeric_f64(v)? else { continue };
            match &best {
                Some((current, _)) if !replaces(f, *current) => {}
                _ => best = Some((f, v.clone())),
            }
        }
        Ok(best.map_or(Value::Null, |(_, v)| v))
    }

    fn check_numeric(&self, op: &str) -> DataResult<()> {
        if self.kind.is_numeric() {
            Ok(())
        } else {
            Err(DataError::TypeMismatch {
                expected: format!("numeric kind for {op}"),
                found: self.kind.name().to_string(),
            })
        }
    }

    // ========================================================================
    // Grouping
    // ========================================================================

    /// Group the series by its own values.
    ///
    /// Null elements belong to no group. Group order is the order in which
    /// each distinct value was first seen.
    #[must_use]
    pub fn group(&self) -> GroupedSeries {
        GroupedSeries::by_identity(self)
    }

    /// Group the series by a key derived from each non-null element.
    ///
    /// Null elements are skipped before `key_fn` runs, so it never sees a
    /// null. Keys are compared by equality of the function's output, which
    /// may put distinct source values into one bucket.
    #[must_use]
    pub fn group_by<F>(&self, key_fn: F) -> GroupedSeries
    where
        F: Fn(&Value) -> Value,
    {
        GroupedSeries::by_key_fn(self, key_fn)
    }
}

fn numeric_i64(value: &Value) -> DataResult<Option<i64>> {
    match value {
        Value::Int(i) => Ok(Some(i64::from(*i))),
        Value::Long(i) => Ok(Some(*i)),
        Value::Null => Ok(None),
        other => Err(DataError::TypeMismatch {
            expected: "numeric value".to_string(),
            found: other.type_name().to_string(),
        }),
    }
}

fn numeric_f64(value: &Value) -> DataResult<Option<f64>> {
    match value {
        Value::Int(i) => Ok(Some(f64::from(*i))),
        #[allow(clippy::cast_precision_loss)]
        Value::Long(i) => Ok(Some(*i as f64)),
        Value::Double(f) => Ok(Some(*f)),
        Value::Null => Ok(None),
        other => Err(DataError::TypeMismatch {
            expected: "numeric value".to_string(),
            found: other.type_name().to_string(),
        }),
    }
}

impl fmt::Debug for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Series {{ name: {:?}, kind: {:?}, len: {} }}",
            self.name,
            self.kind,
            self.len()
        )
    }
}
