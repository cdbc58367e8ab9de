//! Descriptive aggregates over a (possibly filtered) dataset.
//!
//! Every function is total: an empty dataset or an absent column yields an
//! empty result, zero, or `None`, never a panic or a NaN.

use std::collections::{BTreeSet, HashMap};

use super::model::{Dataset, Value};

/// Number of rows.
pub fn count(ds: &Dataset) -> usize {
    ds.len()
}

/// Arithmetic mean of the numeric cells of `column`.
/// `None` when the column is absent or has no numeric value.
pub fn mean(ds: &Dataset, column: &str) -> Option<f64> {
    mean_of(ds.column(column).filter_map(Value::as_f64))
}

fn mean_of(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Rows whose `column` equals `value`.
pub fn count_equal(ds: &Dataset, column: &str, value: &Value) -> usize {
    ds.column(column).filter(|v| *v == value).count()
}

/// Number of distinct non-null values of `column`.
pub fn distinct_count(ds: &Dataset, column: &str) -> usize {
    ds.column(column)
        .filter(|v| !v.is_null())
        .collect::<BTreeSet<_>>()
        .len()
}

/// First-seen distinct values with their counts.
fn tally<'a>(values: impl Iterator<Item = &'a Value>) -> Vec<(Value, usize)> {
    let mut index: HashMap<&Value, usize> = HashMap::new();
    let mut out: Vec<(Value, usize)> = Vec::new();
    for v in values.filter(|v| !v.is_null()) {
        match index.get(v) {
            Some(&i) => out[i].1 += 1,
            None => {
                index.insert(v, out.len());
                out.push((v.clone(), 1));
            }
        }
    }
    out
}

/// `(value, count)` pairs, most frequent first; ties keep first-seen order.
/// `Null` is not counted.
pub fn value_counts(ds: &Dataset, column: &str, top_n: Option<usize>) -> Vec<(Value, usize)> {
    let mut counts = tally(ds.column(column));
    // stable sort keeps first-seen order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    if let Some(n) = top_n {
        counts.truncate(n);
    }
    counts
}

/// Counts ordered by value rather than frequency, for time series such as
/// `Month` or `Hour`.
pub fn sorted_counts(ds: &Dataset, column: &str) -> Vec<(Value, usize)> {
    let mut counts = tally(ds.column(column));
    counts.sort_by(|a, b| a.0.cmp(&b.0));
    counts
}

/// Mean of `value` per distinct `group`, in first-seen group order.
///
/// Rows with a `Null` group are ignored, `Null` values are left out of the
/// mean, and a group with no numeric value gets no entry.
pub fn grouped_mean(ds: &Dataset, group: &str, value: &str) -> Vec<(Value, f64)> {
    let mut index: HashMap<&Value, usize> = HashMap::new();
    let mut acc: Vec<(&Value, f64, usize)> = Vec::new();
    for rec in &ds.records {
        let g = rec.get(group);
        if g.is_null() {
            continue;
        }
        let i = *index.entry(g).or_insert_with(|| {
            acc.push((g, 0.0, 0));
            acc.len() - 1
        });
        if let Some(v) = rec.get(value).as_f64() {
            acc[i].1 += v;
            acc[i].2 += 1;
        }
    }
    acc.into_iter()
        .filter(|(_, _, n)| *n > 0)
        .map(|(g, sum, n)| (g.clone(), sum / n as f64))
        .collect()
}

/// Count matrix over two categorical columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrossTab {
    /// Distinct values of the row column, sorted.
    pub rows: Vec<Value>,
    /// Distinct values of the column column, sorted.
    pub columns: Vec<Value>,
    /// `counts[r][c]`, zero where a combination never occurs.
    pub counts: Vec<Vec<usize>>,
}

impl CrossTab {
    pub fn get(&self, row: &Value, column: &Value) -> usize {
        let r = self.rows.iter().position(|v| v == row);
        let c = self.columns.iter().position(|v| v == column);
        match (r, c) {
            (Some(r), Some(c)) => self.counts[r][c],
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Largest single cell, for colour scaling.
    pub fn max(&self) -> usize {
        self.counts.iter().flatten().copied().max().unwrap_or(0)
    }
}

/// Counts per `(row, col)` pair. Rows with `Null` in either column are left
/// out.
pub fn cross_tab(ds: &Dataset, row: &str, col: &str) -> CrossTab {
    let pairs: Vec<(&Value, &Value)> = ds
        .records
        .iter()
        .map(|r| (r.get(row), r.get(col)))
        .filter(|(a, b)| !a.is_null() && !b.is_null())
        .collect();

    let rows: Vec<Value> = pairs
        .iter()
        .map(|(a, _)| *a)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .cloned()
        .collect();
    let columns: Vec<Value> = pairs
        .iter()
        .map(|(_, b)| *b)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .cloned()
        .collect();

    let row_index: HashMap<&Value, usize> = rows.iter().enumerate().map(|(i, v)| (v, i)).collect();
    let col_index: HashMap<&Value, usize> =
        columns.iter().enumerate().map(|(i, v)| (v, i)).collect();

    let mut counts = vec![vec![0; columns.len()]; rows.len()];
    for (a, b) in pairs {
        counts[row_index[a]][col_index[b]] += 1;
    }

    CrossTab {
        rows,
        columns,
        counts,
    }
}

/// Percentage of rows per `group` whose `status` equals `status_value`.
///
/// The denominator is the group's rows with a non-null status. Groups with
/// no such rows get no entry. Output follows first-seen group order.
pub fn rate(ds: &Dataset, group: &str, status: &str, status_value: &Value) -> Vec<(Value, f64)> {
    let mut index: HashMap<&Value, usize> = HashMap::new();
    let mut acc: Vec<(&Value, usize, usize)> = Vec::new();
    for rec in &ds.records {
        let g = rec.get(group);
        let s = rec.get(status);
        if g.is_null() || s.is_null() {
            continue;
        }
        let i = *index.entry(g).or_insert_with(|| {
            acc.push((g, 0, 0));
            acc.len() - 1
        });
        acc[i].2 += 1;
        if s == status_value {
            acc[i].1 += 1;
        }
    }
    acc.into_iter()
        .filter(|(_, _, total)| *total > 0)
        .map(|(g, hits, total)| (g.clone(), hits as f64 / total as f64 * 100.0))
        .collect()
}

/// Share of the whole table held by each `(group, status_value)` cell, as a
/// percentage.
///
/// Unlike [`rate`], the denominator is every row with a non-null group and
/// status, not the group's own rows. Empty when `status_value` never occurs.
/// Output follows the sorted group order of [`cross_tab`].
pub fn joint_share(ds: &Dataset, group: &str, status: &str, status_value: &Value) -> Vec<(Value, f64)> {
    let table = cross_tab(ds, group, status);
    let Some(c) = table.columns.iter().position(|v| v == status_value) else {
        return Vec::new();
    };
    let total: usize = table.counts.iter().flatten().sum();
    table
        .rows
        .into_iter()
        .zip(&table.counts)
        .map(|(g, row)| (g, row[c] as f64 / total as f64 * 100.0))
        .collect()
}

/// Pairwise Pearson correlation matrix.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Correlation {
    pub columns: Vec<String>,
    /// `matrix[i][j]`; `None` where fewer than two rows hold both values or
    /// either side is constant.
    pub matrix: Vec<Vec<Option<f64>>>,
}

impl Correlation {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Correlate every pair of `columns`, each pair over the rows where both
/// cells are numeric.
pub fn correlation(ds: &Dataset, columns: &[&str]) -> Correlation {
    let series: Vec<Vec<Option<f64>>> = columns
        .iter()
        .map(|c| ds.column(c).map(Value::as_f64).collect())
        .collect();
    let matrix = series
        .iter()
        .map(|a| series.iter().map(|b| pearson(a, b)).collect())
        .collect();
    Correlation {
        columns: columns.iter().map(|c| c.to_string()).collect(),
        matrix,
    }
}

fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let (dx, dy) = (x - mean_x, y - mean_y);
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some((cov / (var_x * var_y).sqrt()).clamp(-1.0, 1.0))
}

/// Columns whose non-null cells are all numbers, with at least one.
pub fn numeric_columns(ds: &Dataset) -> Vec<&str> {
    ds.column_names
        .iter()
        .map(String::as_str)
        .filter(|c| {
            let mut cells = ds.column(c).filter(|v| !v.is_null()).peekable();
            cells.peek().is_some() && cells.all(|v| matches!(v, Value::Number(_)))
        })
        .collect()
}

/// One bucket of a [`histogram`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

impl Bin {
    pub fn mid(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.end - self.start
    }
}

/// Equal-width histogram of the numeric cells of `column`. The last bin is
/// closed on the right. A column with a single distinct value gets one bin.
pub fn histogram(ds: &Dataset, column: &str, bins: usize) -> Vec<Bin> {
    let Some((lo, hi)) = ds.number_bounds(column) else {
        return Vec::new();
    };
    if bins == 0 {
        return Vec::new();
    }
    if hi <= lo {
        return vec![Bin {
            start: lo,
            end: hi,
            count: ds.column(column).filter_map(Value::as_f64).count(),
        }];
    }

    let width = (hi - lo) / bins as f64;
    let mut out: Vec<Bin> = (0..bins)
        .map(|i| Bin {
            start: lo + width * i as f64,
            end: lo + width * (i + 1) as f64,
            count: 0,
        })
        .collect();
    for v in ds.column(column).filter_map(Value::as_f64) {
        let i = (((v - lo) / width) as usize).min(bins - 1);
        out[i].count += 1;
    }
    out
}

/// `[x, y]` pairs for rows where both columns are numeric.
pub fn points(ds: &Dataset, x: &str, y: &str) -> Vec<[f64; 2]> {
    ds.records
        .iter()
        .filter_map(|r| Some([r.get(x).as_f64()?, r.get(y).as_f64()?]))
        .collect()
}

/// Sort `(key, number)` pairs by number, largest first, and keep `n`.
pub fn top_by_value<K>(mut pairs: Vec<(K, f64)>, n: usize) -> Vec<(K, f64)> {
    pairs.sort_by(|a, b| b.1.total_cmp(&a.1));
    pairs.truncate(n);
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Record;

    fn column(name: &str, values: &[Value]) -> Dataset {
        Dataset::from_records(
            values
                .iter()
                .map(|v| [(name, v.clone())].into_iter().collect::<Record>())
                .collect(),
        )
    }

    fn pairs(a: &str, b: &str, rows: &[(&str, &str)]) -> Dataset {
        Dataset::from_records(
            rows.iter()
                .map(|(x, y)| [(a, Value::from(*x)), (b, Value::from(*y))].into_iter().collect::<Record>())
                .collect(),
        )
    }

    #[test]
    fn value_counts_orders_by_count_then_first_seen() {
        let ds = column(
            "c",
            &["A", "A", "B", "C", "B", "B"].map(Value::from),
        );
        assert_eq!(
            value_counts(&ds, "c", None),
            vec![(Value::from("B"), 3), (Value::from("A"), 2), (Value::from("C"), 1)]
        );
        assert_eq!(value_counts(&ds, "c", Some(1)), vec![(Value::from("B"), 3)]);
    }

    #[test]
    fn value_counts_ties_keep_first_seen() {
        let ds = column("c", &["Y", "X", "X", "Y", "Z"].map(Value::from));
        let keys: Vec<_> = value_counts(&ds, "c", None).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![Value::from("Y"), Value::from("X"), Value::from("Z")]);
    }

    #[test]
    fn cross_tab_zero_fills() {
        let ds = pairs("L", "S", &[("L1", "S1"), ("L1", "S2"), ("L2", "S1")]);
        let ct = cross_tab(&ds, "L", "S");

        assert_eq!(ct.rows.len(), 2);
        assert_eq!(ct.columns.len(), 2);
        assert_eq!(ct.get(&"L2".into(), &"S2".into()), 0);
        assert_eq!(ct.get(&"L1".into(), &"S1".into()), 1);
        assert_eq!(ct.max(), 1);
    }

    #[test]
    fn rate_is_percentage_per_group() {
        let ds = pairs(
            "Level",
            "Status",
            &[("L1", "Allotted"), ("L1", "Rejected"), ("L2", "Allotted"), ("L2", "Allotted")],
        );
        assert_eq!(
            rate(&ds, "Level", "Status", &"Allotted".into()),
            vec![(Value::from("L1"), 50.0), (Value::from("L2"), 100.0)]
        );
    }

    #[test]
    fn rate_skips_groups_without_status() {
        let ds = Dataset::from_records(vec![
            [("g", Value::from("A")), ("s", Value::Null)].into_iter().collect(),
            [("g", Value::from("B")), ("s", Value::from("ok"))].into_iter().collect(),
        ]);
        assert_eq!(rate(&ds, "g", "s", &"ok".into()), vec![(Value::from("B"), 100.0)]);
    }

    #[test]
    fn joint_share_divides_by_grand_total() {
        let ds = pairs(
            "Discipline",
            "Status",
            &[
                ("Physics", "Allotted"),
                ("Physics", "Not Allotted"),
                ("History", "Allotted"),
                ("History", "Allotted"),
            ],
        );
        assert_eq!(
            joint_share(&ds, "Discipline", "Status", &"Allotted".into()),
            vec![(Value::from("History"), 50.0), (Value::from("Physics"), 25.0)]
        );
        assert!(joint_share(&ds, "Discipline", "Status", &"Waitlist".into()).is_empty());
    }

    #[test]
    fn correlation_is_pairwise_pearson() {
        let ds = Dataset::from_records(vec![
            [("a", Value::from(1.0)), ("b", Value::from(2.0)), ("c", Value::from(5.0))].into_iter().collect(),
            [("a", Value::from(2.0)), ("b", Value::from(4.0)), ("c", Value::from(5.0))].into_iter().collect(),
            [("a", Value::from(3.0)), ("b", Value::from(6.0)), ("c", Value::Null)].into_iter().collect(),
            [("a", Value::from(4.0)), ("b", Value::Null), ("c", Value::Null)].into_iter().collect(),
        ]);
        let corr = correlation(&ds, &["a", "b", "c"]);

        assert_eq!(corr.columns, vec!["a", "b", "c"]);
        assert!((corr.matrix[0][1].unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(corr.matrix[0][1], corr.matrix[1][0]);
        assert_eq!(corr.matrix[0][0], Some(1.0));
        // constant over its rows
        assert_eq!(corr.matrix[0][2], None);
        assert_eq!(corr.matrix[2][2], None);
    }

    #[test]
    fn correlation_detects_inverse_relation() {
        let ds = Dataset::from_records(
            [(1.0, 3.0), (2.0, 2.0), (3.0, 1.0)]
                .iter()
                .map(|&(x, y)| {
                    [("x", Value::from(x)), ("y", Value::from(y))]
                        .into_iter()
                        .collect::<Record>()
                })
                .collect(),
        );
        let r = correlation(&ds, &["x", "y"]).matrix[0][1].unwrap();
        assert!((r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn numeric_columns_skip_text_and_empty() {
        let ds = Dataset::from_records(vec![
            [("n", Value::from(1.0)), ("t", Value::from("x")), ("e", Value::Null)].into_iter().collect(),
            [("n", Value::Null), ("t", Value::from(2.0)), ("e", Value::Null)].into_iter().collect(),
        ]);
        assert_eq!(numeric_columns(&ds), vec!["n"]);
    }

    #[test]
    fn mean_sentinel_on_empty_and_absent() {
        let empty = Dataset::default();
        assert_eq!(mean(&empty, "Income"), None);

        let ds = column("Income", &[Value::Null, Value::from(10.0), Value::from(30.0)]);
        assert_eq!(mean(&ds, "Income"), Some(20.0));
        assert_eq!(mean(&ds, "Score"), None);
    }

    #[test]
    fn grouped_mean_excludes_nulls() {
        let ds = Dataset::from_records(vec![
            [("g", Value::from("A")), ("v", Value::from(1.0))].into_iter().collect(),
            [("g", Value::from("A")), ("v", Value::Null)].into_iter().collect(),
            [("g", Value::from("B")), ("v", Value::from(4.0))].into_iter().collect(),
            [("g", Value::Null), ("v", Value::from(100.0))].into_iter().collect(),
            [("g", Value::from("C")), ("v", Value::Null)].into_iter().collect(),
            [("g", Value::from("A")), ("v", Value::from(3.0))].into_iter().collect(),
        ]);
        assert_eq!(
            grouped_mean(&ds, "g", "v"),
            vec![(Value::from("A"), 2.0), (Value::from("B"), 4.0)]
        );
    }

    #[test]
    fn everything_is_total_over_empty_dataset() {
        let ds = Dataset::default();
        assert_eq!(count(&ds), 0);
        assert!(value_counts(&ds, "x", Some(10)).is_empty());
        assert!(grouped_mean(&ds, "x", "y").is_empty());
        assert!(cross_tab(&ds, "x", "y").is_empty());
        assert!(rate(&ds, "x", "y", &"z".into()).is_empty());
        assert!(histogram(&ds, "x", 10).is_empty());
        assert_eq!(distinct_count(&ds, "x"), 0);
        assert!(joint_share(&ds, "x", "y", &"z".into()).is_empty());
        assert!(numeric_columns(&ds).is_empty());
        let corr = correlation(&ds, &["x", "y"]);
        assert_eq!(corr.matrix, vec![vec![None, None], vec![None, None]]);
    }

    #[test]
    fn histogram_covers_range() {
        let ds = column("n", &[0.0, 1.0, 2.0, 9.0, 10.0].map(Value::from));
        let bins = histogram(&ds, "n", 5);

        assert_eq!(bins.len(), 5);
        assert_eq!(bins[0].count, 2);
        assert_eq!(bins[4].count, 2);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 5);

        let flat = column("n", &[3.0, 3.0].map(Value::from));
        assert_eq!(histogram(&flat, "n", 5)[0].count, 2);
    }

    #[test]
    fn sorted_counts_follow_value_order() {
        let ds = column("m", &["2025-03", "2025-01", "2025-03"].map(Value::from));
        assert_eq!(
            sorted_counts(&ds, "m"),
            vec![(Value::from("2025-01"), 1), (Value::from("2025-03"), 2)]
        );
    }

    #[test]
    fn points_need_both_coordinates() {
        let ds = Dataset::from_records(vec![
            [("x", Value::from(1.0)), ("y", Value::from(2.0))].into_iter().collect(),
            [("x", Value::from(1.0)), ("y", Value::Null)].into_iter().collect(),
        ]);
        assert_eq!(points(&ds, "x", "y"), vec![[1.0, 2.0]]);
    }

    #[test]
    fn top_by_value_sorts_descending() {
        let top = top_by_value(vec![("a", 1.0), ("b", 3.0), ("c", 2.0)], 2);
        assert_eq!(top, vec![("b", 3.0), ("c", 2.0)]);
    }
}
