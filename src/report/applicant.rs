use crate::data::aggregate::{self as agg, Correlation, CrossTab};
use crate::data::model::{Dataset, Value};
use crate::data::schema::Capabilities;

use super::{share, Counts, Measures};

const STATUS: &str = "Allotment Status";
const ALLOTTED: &str = "Allotted";
const NOT_ALLOTTED: &str = "Not Allotted";
const STATUS_CODE: &str = "Allotment_Status_Num";
const LEVEL_CODE: &str = "Level_Num";

/// Everything the applicant tab shows for the current filters.
#[derive(Debug, Clone, Default)]
pub struct ApplicantReport {
    pub total: usize,
    pub allotted: usize,
    pub not_allotted: usize,
    /// Distinct programs applied for; zero without a `Program` column.
    pub programs: usize,

    pub allotment: Counts,
    pub levels: Counts,
    pub top_disciplines: Counts,
    pub colleges: Counts,
    pub allotment_by_level: CrossTab,

    /// Allotment rates, only computed when both outcomes occur.
    pub discipline_rates: Measures,
    pub college_rates: Measures,
    pub top_programs: Counts,

    /// Allotted applicants per discipline as a share of all applicants.
    pub discipline_success: Measures,
    /// Distinct programs per applicant, as a percentage; `None` without a
    /// `Program` column.
    pub program_diversity: Option<f64>,
    /// Numeric columns, plus allotment and level codes, correlated pairwise.
    /// Empty when fewer than two such columns exist.
    pub correlation: Correlation,

    /// Required columns the loaded files lack.
    pub missing_required: Vec<&'static str>,
}

impl ApplicantReport {
    pub fn compute(ds: &Dataset, caps: &Capabilities, top_n: usize) -> Self {
        let allotted = Value::from(ALLOTTED);
        let not_allotted = Value::from(NOT_ALLOTTED);

        let allotted_count = agg::count_equal(ds, STATUS, &allotted);
        let not_allotted_count = agg::count_equal(ds, STATUS, &not_allotted);
        let both_outcomes = allotted_count > 0 && not_allotted_count > 0;

        let ranked_rate = |group: &str| -> Measures {
            if both_outcomes {
                agg::top_by_value(agg::rate(ds, group, STATUS, &allotted), top_n)
            } else {
                Vec::new()
            }
        };

        let has_program = caps.has("Program");
        let programs = if has_program {
            agg::distinct_count(ds, "Program")
        } else {
            0
        };

        let coded = with_codes(ds, caps);
        let numeric = agg::numeric_columns(&coded);
        let correlation = if numeric.len() > 1 {
            agg::correlation(&coded, &numeric)
        } else {
            Correlation::default()
        };

        ApplicantReport {
            total: agg::count(ds),
            allotted: allotted_count,
            not_allotted: not_allotted_count,
            programs,

            allotment: agg::value_counts(ds, STATUS, None),
            levels: agg::value_counts(ds, "Level", None),
            top_disciplines: agg::value_counts(ds, "Discipline", Some(top_n)),
            colleges: agg::value_counts(ds, "College", None),
            allotment_by_level: agg::cross_tab(ds, "Level", STATUS),

            discipline_rates: ranked_rate("Discipline"),
            college_rates: ranked_rate("College"),
            top_programs: if has_program {
                agg::value_counts(ds, "Program", Some(top_n))
            } else {
                Vec::new()
            },

            discipline_success: agg::top_by_value(
                agg::joint_share(ds, "Discipline", STATUS, &allotted),
                top_n,
            ),
            program_diversity: has_program.then(|| share(programs, agg::count(ds)).unwrap_or(0.0)),
            correlation,

            missing_required: caps.missing_required.clone(),
        }
    }
}

/// Copy of `ds` with numeric codes for the categorical columns that take part
/// in the correlation matrix: allotment as 1/0 and level by first-seen index.
fn with_codes(ds: &Dataset, caps: &Capabilities) -> Dataset {
    let mut out = ds.clone();
    if caps.has(STATUS) {
        for rec in &mut out.records {
            let code = match rec.get(STATUS).as_str() {
                Some(ALLOTTED) => Value::Number(1.0),
                Some(NOT_ALLOTTED) => Value::Number(0.0),
                _ => Value::Null,
            };
            rec.insert(STATUS_CODE, code);
        }
        out.column_names.push(STATUS_CODE.to_string());
    }
    if caps.has("Level") {
        let levels = ds.unique_values("Level");
        for rec in &mut out.records {
            let code = levels
                .iter()
                .position(|l| l == rec.get("Level"))
                .map_or(Value::Null, |i| Value::Number(i as f64));
            rec.insert(LEVEL_CODE, code);
        }
        out.column_names.push(LEVEL_CODE.to_string());
    }
    out
}
