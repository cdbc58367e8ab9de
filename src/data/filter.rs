use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use thiserror::Error;

use super::model::{Dataset, Value};
use super::schema::{Capabilities, FilterKind};

/// Sentinel label the selection widgets use for "no restriction".
pub const ALL: &str = "All";

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// Restriction on one column.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// No restriction; rows with `Null` are kept.
    All,
    /// Keep rows whose value is in the set. An empty set restricts nothing.
    OneOf(BTreeSet<Value>),
    /// Keep rows whose number lies in `[low, high]`. `Null` rows are dropped.
    NumberRange { low: f64, high: f64 },
    /// Keep rows whose calendar date lies in `[start, end]`. `Null` rows are
    /// dropped.
    DateRange { start: NaiveDate, end: NaiveDate },
}

impl Predicate {
    /// Build a categorical predicate from widget labels; a selection that is
    /// empty or contains [`ALL`] restricts nothing.
    pub fn from_selection<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for label in labels {
            let label = label.as_ref();
            if label == ALL {
                return Predicate::All;
            }
            set.insert(Value::Text(label.to_string()));
        }
        if set.is_empty() {
            Predicate::All
        } else {
            Predicate::OneOf(set)
        }
    }

    /// Whether this predicate can drop any row at all.
    pub fn is_restrictive(&self) -> bool {
        match self {
            Predicate::All => false,
            Predicate::OneOf(set) => !set.is_empty(),
            Predicate::NumberRange { .. } | Predicate::DateRange { .. } => true,
        }
    }

    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Predicate::All => true,
            Predicate::OneOf(set) => set.is_empty() || set.contains(value),
            Predicate::NumberRange { low, high } => value
                .as_f64()
                .is_some_and(|v| *low <= v && v <= *high),
            Predicate::DateRange { start, end } => value.as_date().is_some_and(|d| {
                let day = d.date();
                *start <= day && day <= *end
            }),
        }
    }

    /// Every non-null cell must have the type an interval compares against.
    fn check(&self, column: &str, dataset: &Dataset) -> Result<(), FilterError> {
        let expected = match self {
            Predicate::NumberRange { .. } => "number",
            Predicate::DateRange { .. } => "date",
            Predicate::All | Predicate::OneOf(_) => return Ok(()),
        };
        let bad = dataset.column(column).find(|v| match v {
            Value::Null => false,
            Value::Number(_) => expected != "number",
            Value::Date(_) => expected != "date",
            Value::Text(_) => true,
        });
        match bad {
            Some(found) => Err(FilterError::TypeMismatch {
                column: column.to_string(),
                expected,
                found: found.to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("column '{column}' holds {found:?}, which is not a {expected}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: String,
    },
}

// ---------------------------------------------------------------------------
// FilterSpec
// ---------------------------------------------------------------------------

/// Active predicates per column, combined with logical AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    predicates: BTreeMap<String, Predicate>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, predicate: Predicate) -> Self {
        self.set(column, predicate);
        self
    }

    pub fn set(&mut self, column: impl Into<String>, predicate: Predicate) {
        self.predicates.insert(column.into(), predicate);
    }

    pub fn get(&self, column: &str) -> Option<&Predicate> {
        self.predicates.get(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Predicate)> {
        self.predicates.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Starting filters for a freshly loaded dataset: categorical widgets on
    /// "All", ranges spanning the full observed extent of their column.
    ///
    /// Ranges are active from the start, so rows with no value in a ranged
    /// column are hidden unless the user clears that range.
    pub fn initial(dataset: &Dataset, capabilities: &Capabilities) -> Self {
        let mut spec = FilterSpec::new();
        for def in capabilities.filters() {
            let predicate = match def.kind {
                FilterKind::MultiSelect | FilterKind::SingleSelect => Some(Predicate::All),
                FilterKind::NumberRange => dataset
                    .number_bounds(def.column)
                    .map(|(low, high)| Predicate::NumberRange { low, high }),
                FilterKind::DateRange => {
                    dataset
                        .date_bounds(def.column)
                        .map(|(lo, hi)| Predicate::DateRange {
                            start: lo.date(),
                            end: hi.date(),
                        })
                }
            };
            if let Some(p) = predicate {
                spec.set(def.column, p);
            }
        }
        spec
    }
}

// ---------------------------------------------------------------------------
// Applying filters
// ---------------------------------------------------------------------------

/// Return indices of rows that pass every active predicate.
///
/// A predicate on a column the dataset does not have is skipped.
pub fn filtered_indices(dataset: &Dataset, spec: &FilterSpec) -> Result<Vec<usize>, FilterError> {
    let active: Vec<(&str, &Predicate)> = spec
        .iter()
        .filter(|(col, p)| p.is_restrictive() && dataset.has_column(col))
        .map(|(col, p)| (col.as_str(), p))
        .collect();

    for (col, p) in &active {
        p.check(col, dataset)?;
    }

    Ok(dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| active.iter().all(|(col, p)| p.matches(rec.get(col))))
        .map(|(i, _)| i)
        .collect())
}

/// The subset of `dataset` that passes `spec`.
pub fn apply(dataset: &Dataset, spec: &FilterSpec) -> Result<Dataset, FilterError> {
    let indices = filtered_indices(dataset, spec)?;
    Ok(dataset.select(&indices))
}

/// Result of [`apply_or_unfiltered`].
#[derive(Debug, Clone)]
pub struct Filtered {
    pub dataset: Dataset,
    /// Set when filtering failed and `dataset` is the unfiltered input.
    pub degraded: Option<FilterError>,
}

/// Apply `spec`, falling back to the whole dataset when a predicate cannot
/// be evaluated. The failure is logged and handed back to the caller.
pub fn apply_or_unfiltered(dataset: &Dataset, spec: &FilterSpec) -> Filtered {
    match apply(dataset, spec) {
        Ok(filtered) => Filtered {
            dataset: filtered,
            degraded: None,
        },
        Err(e) => {
            log::warn!("filter failed, showing unfiltered data: {e}");
            Filtered {
                dataset: dataset.clone(),
                degraded: Some(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Record;
    use crate::data::schema::APPLICANT;

    fn dataset(rows: &[&[(&str, Value)]]) -> Dataset {
        Dataset::from_records(
            rows.iter()
                .map(|r| r.iter().map(|(k, v)| (*k, v.clone())).collect::<Record>())
                .collect(),
        )
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn sample() -> Dataset {
        dataset(&[
            &[("Level", "UG".into()), ("Income", 10.0.into())],
            &[("Level", "PG".into()), ("Income", 20.0.into())],
            &[("Level", Value::Null), ("Income", Value::Null)],
            &[("Level", "UG".into()), ("Income", 30.0.into())],
        ])
    }

    #[test]
    fn empty_spec_is_identity() {
        let ds = sample();
        assert_eq!(apply(&ds, &FilterSpec::new()).unwrap(), ds);
    }

    #[test]
    fn absent_column_drops_nothing() {
        let ds = sample();
        let spec = FilterSpec::new()
            .with("Religion", Predicate::from_selection(["Hindu"]))
            .with("Score", Predicate::NumberRange { low: 0.0, high: 1.0 });
        assert_eq!(apply(&ds, &spec).unwrap().len(), ds.len());
    }

    #[test]
    fn all_sentinel_keeps_null_rows() {
        let ds = sample();
        for p in [
            Predicate::All,
            Predicate::from_selection([ALL, "UG"]),
            Predicate::from_selection(Vec::<String>::new()),
            Predicate::OneOf(BTreeSet::new()),
        ] {
            let spec = FilterSpec::new().with("Level", p);
            assert_eq!(filtered_indices(&ds, &spec).unwrap(), vec![0, 1, 2, 3]);
        }
    }

    #[test]
    fn categorical_membership() {
        let spec = FilterSpec::new().with("Level", Predicate::from_selection(["UG"]));
        assert_eq!(filtered_indices(&sample(), &spec).unwrap(), vec![0, 3]);
    }

    #[test]
    fn number_range_is_inclusive_and_drops_nulls() {
        let ds = sample();
        let spec = FilterSpec::new().with("Income", Predicate::NumberRange { low: 10.0, high: 20.0 });
        assert_eq!(filtered_indices(&ds, &spec).unwrap(), vec![0, 1]);

        let wide = FilterSpec::new().with(
            "Income",
            Predicate::NumberRange {
                low: f64::MIN,
                high: f64::MAX,
            },
        );
        assert_eq!(filtered_indices(&ds, &wide).unwrap(), vec![0, 1, 3]);
    }

    #[test]
    fn date_range_includes_whole_end_day() {
        let ds = dataset(&[
            &[("When", Value::Date(day(1).and_hms_opt(9, 0, 0).unwrap()))],
            &[("When", Value::Date(day(5).and_hms_opt(23, 59, 0).unwrap()))],
            &[("When", Value::Date(day(6).and_hms_opt(0, 0, 0).unwrap()))],
            &[("When", Value::Null)],
        ]);
        let spec = FilterSpec::new().with(
            "When",
            Predicate::DateRange {
                start: day(1),
                end: day(5),
            },
        );
        assert_eq!(filtered_indices(&ds, &spec).unwrap(), vec![0, 1]);
    }

    #[test]
    fn predicates_combine_with_and_in_any_order() {
        let ds = sample();
        let level = Predicate::from_selection(["UG"]);
        let income = Predicate::NumberRange { low: 25.0, high: 40.0 };

        let mut a = FilterSpec::new();
        a.set("Level", level.clone());
        a.set("Income", income.clone());
        let mut b = FilterSpec::new();
        b.set("Income", income);
        b.set("Level", level);

        assert_eq!(filtered_indices(&ds, &a).unwrap(), vec![3]);
        assert_eq!(filtered_indices(&ds, &a).unwrap(), filtered_indices(&ds, &b).unwrap());
    }

    #[test]
    fn mixed_types_fall_back_to_unfiltered() {
        let ds = dataset(&[
            &[("Income", 10.0.into())],
            &[("Income", "lots".into())],
        ]);
        let spec = FilterSpec::new().with("Income", Predicate::NumberRange { low: 0.0, high: 5.0 });

        assert!(matches!(apply(&ds, &spec), Err(FilterError::TypeMismatch { .. })));
        let out = apply_or_unfiltered(&ds, &spec);
        assert_eq!(out.dataset, ds);
        assert!(out.degraded.is_some());
    }

    #[test]
    fn initial_spec_spans_observed_ranges() {
        let ds = dataset(&[
            &[("Level", "UG".into()), ("College", "North".into())],
            &[("Level", "PG".into()), ("College", "South".into())],
        ]);
        let caps = APPLICANT.check(ds.column_names.iter().map(String::as_str));
        let spec = FilterSpec::initial(&ds, &caps);

        assert_eq!(spec.get("Level"), Some(&Predicate::All));
        assert_eq!(spec.get("Discipline"), None);
        assert_eq!(apply(&ds, &spec).unwrap().len(), 2);
    }
}
