use crate::data::aggregate::{self as agg, Bin};
use crate::data::model::{Dataset, Value};
use crate::data::schema::Capabilities;

use super::{share, Counts, Measures};

const INCOME: &str = "Family Annual Income";
const SCORE: &str = "Prequalification Percentage";
const STATE: &str = "erp20may_State";

/// Everything the admission tab shows for the current filters.
#[derive(Debug, Clone, Default)]
pub struct AdmissionReport {
    pub total: usize,
    pub avg_income: Option<f64>,
    pub avg_score: Option<f64>,
    /// Male and female counts; `None` without a `Gender` column.
    pub gender_ratio: Option<(usize, usize)>,
    pub avg_days_to_admission: Option<f64>,
    pub avg_age: Option<f64>,
    /// Percentage of `Active` students; `None` without `Student Status`.
    pub active_share: Option<f64>,

    pub program_levels: Counts,
    pub genders: Counts,
    pub statuses: Counts,
    pub categories: Counts,
    pub religions: Counts,
    pub age_histogram: Vec<Bin>,
    pub top_programmes: Counts,

    pub monthly_admissions: Counts,
    pub monthly_scores: Measures,

    pub top_states: Counts,
    pub state_income: Measures,

    pub income_histogram: Vec<Bin>,
    pub income_vs_score: Vec<[f64; 2]>,
    pub category_income: Measures,
}

impl AdmissionReport {
    pub fn compute(ds: &Dataset, caps: &Capabilities, top_n: usize) -> Self {
        let total = agg::count(ds);

        let gender_ratio = caps.has("Gender").then(|| {
            (
                agg::count_equal(ds, "Gender", &Value::from("Male")),
                agg::count_equal(ds, "Gender", &Value::from("Female")),
            )
        });
        let active_share = if caps.has("Student Status") {
            share(agg::count_equal(ds, "Student Status", &Value::from("Active")), total)
        } else {
            None
        };

        let mut monthly_scores = agg::grouped_mean(ds, "Month", SCORE);
        monthly_scores.sort_by(|a, b| a.0.cmp(&b.0));

        AdmissionReport {
            total,
            avg_income: agg::mean(ds, INCOME),
            avg_score: agg::mean(ds, SCORE),
            gender_ratio,
            avg_days_to_admission: agg::mean(ds, "Days_to_Admission"),
            avg_age: agg::mean(ds, "Age"),
            active_share,

            program_levels: agg::value_counts(ds, "Program Level", None),
            genders: agg::value_counts(ds, "Gender", None),
            statuses: agg::value_counts(ds, "Student Status", None),
            categories: agg::value_counts(ds, "Category", None),
            religions: agg::value_counts(ds, "Religion", None),
            age_histogram: agg::histogram(ds, "Age", 20),
            top_programmes: agg::value_counts(ds, "Programme Name", Some(top_n)),

            monthly_admissions: agg::sorted_counts(ds, "Month"),
            monthly_scores,

            top_states: agg::value_counts(ds, STATE, Some(top_n)),
            state_income: agg::top_by_value(agg::grouped_mean(ds, STATE, INCOME), top_n),

            income_histogram: agg::histogram(ds, INCOME, 30),
            income_vs_score: agg::points(ds, INCOME, SCORE),
            category_income: agg::top_by_value(
                agg::grouped_mean(ds, "Category", INCOME),
                usize::MAX,
            ),
        }
    }
}
