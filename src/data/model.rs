use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::NaiveDateTime;

// ---------------------------------------------------------------------------
// Value – a single cell of a loaded table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value after coercion.
/// Using `BTreeMap` / `BTreeSet` downstream so `Value` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Number(f64),
    Date(NaiveDateTime),
    Null,
}

static NULL: Value = Value::Null;

// -- Manual Eq/Ord so we can put Value in BTreeSet --

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Null => 0,
                Number(_) => 1,
                Date(_) => 2,
                Text(_) => 3,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Number(a), Number(b)) => a.total_cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Text(s) => s.hash(state),
            Value::Number(f) => f.to_bits().hash(state),
            Value::Date(d) => d.hash(state),
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{s}"),
            Value::Number(v) if v.fract() == 0.0 && v.abs() < 1e15 => write!(f, "{v:.0}"),
            Value::Number(v) => write!(f, "{v:.2}"),
            Value::Date(d) if d.time() == chrono::NaiveTime::MIN => {
                write!(f, "{}", d.format("%Y-%m-%d"))
            }
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d %H:%M")),
            Value::Null => write!(f, "<null>"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Record – one row of a source file
// ---------------------------------------------------------------------------

/// A single parsed row: column_name → value. Absent columns read as `Null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    cells: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `column`, or `Null` when the row has no such column.
    pub fn get(&self, column: &str) -> &Value {
        self.cells.get(column).unwrap_or(&NULL)
    }

    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        self.cells.insert(column.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.cells.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Record {
            cells: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – a loaded (or filtered) table
// ---------------------------------------------------------------------------

/// An ordered collection of records sharing a (not strictly fixed) column set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// All rows, in arrival order.
    pub records: Vec<Record>,
    /// Union of column names across all sources, in first-seen order.
    pub column_names: Vec<String>,
}

impl Dataset {
    pub fn new(records: Vec<Record>, column_names: Vec<String>) -> Self {
        Dataset {
            records,
            column_names,
        }
    }

    /// Build from records alone, collecting column names as they appear.
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut seen = HashSet::new();
        let mut column_names = Vec::new();
        for rec in &records {
            for (col, _) in rec.iter() {
                if seen.insert(col.clone()) {
                    column_names.push(col.clone());
                }
            }
        }
        Dataset {
            records,
            column_names,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_names.iter().any(|c| c == column)
    }

    /// Iterate over one column, yielding `Null` for rows that lack it.
    pub fn column<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.records.iter().map(move |r| r.get(column))
    }

    /// Distinct non-null values of `column` in first-seen order.
    pub fn unique_values(&self, column: &str) -> Vec<Value> {
        let mut seen = HashSet::new();
        self.column(column)
            .filter(|v| !v.is_null())
            .filter(|v| seen.insert((*v).clone()))
            .cloned()
            .collect()
    }

    /// New dataset holding the rows at `indices`, same column set.
    pub fn select(&self, indices: &[usize]) -> Dataset {
        Dataset {
            records: indices
                .iter()
                .filter_map(|&i| self.records.get(i).cloned())
                .collect(),
            column_names: self.column_names.clone(),
        }
    }

    /// Smallest and largest numeric value of `column`.
    pub fn number_bounds(&self, column: &str) -> Option<(f64, f64)> {
        self.column(column)
            .filter_map(Value::as_f64)
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Earliest and latest date of `column`.
    pub fn date_bounds(&self, column: &str) -> Option<(NaiveDateTime, NaiveDateTime)> {
        self.column(column)
            .filter_map(Value::as_date)
            .fold(None, |acc, d| match acc {
                None => Some((d, d)),
                Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
            })
    }
}
