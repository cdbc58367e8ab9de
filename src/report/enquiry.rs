use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::data::aggregate::{self as agg, CrossTab};
use crate::data::model::{Dataset, Record, Value};
use crate::data::schema::Capabilities;

use super::Counts;

/// Everything the enquiry tab shows for the current filters.
#[derive(Debug, Clone, Default)]
pub struct EnquiryReport {
    pub total: usize,
    pub allotted: usize,
    pub admission: usize,
    pub specializations: usize,
    pub walk_in: usize,
    pub online: usize,
    pub male: usize,
    pub female: usize,

    /// Enquiries per calendar day, oldest first.
    pub daily: Vec<(NaiveDate, usize)>,
    pub colleges: Counts,
    pub top_specializations: Counts,
    pub types: Counts,
    pub statuses: Counts,
    pub genders: Counts,

    /// Enquiries per `(year, month)`, oldest first.
    pub monthly: Vec<((i32, u32), usize)>,
    /// Enquiries per hour of day, by hour.
    pub hourly: Counts,
    pub college_specialization: CrossTab,
}

impl EnquiryReport {
    pub fn compute(ds: &Dataset, caps: &Capabilities, top_n: usize) -> Self {
        let eq = |column: &str, value: &str| -> usize {
            if caps.has(column) {
                agg::count_equal(ds, column, &Value::from(value))
            } else {
                0
            }
        };

        EnquiryReport {
            total: agg::count(ds),
            allotted: eq("Allotment Status", "Allotted"),
            admission: eq("Allotment Status", "Admission"),
            specializations: agg::distinct_count(ds, "Specialization"),
            walk_in: eq("Enquiry Type", "Walk-in"),
            online: eq("Enquiry Type", "Online"),
            male: eq("Gender", "Male"),
            female: eq("Gender", "Female"),

            daily: daily_counts(ds),
            colleges: agg::value_counts(ds, "College", None),
            top_specializations: agg::value_counts(ds, "Specialization", Some(top_n)),
            types: agg::value_counts(ds, "Enquiry Type", None),
            statuses: agg::value_counts(ds, "Allotment Status", None),
            genders: agg::value_counts(ds, "Gender", None),

            monthly: monthly_counts(ds),
            hourly: agg::sorted_counts(ds, "Hour"),
            college_specialization: agg::cross_tab(ds, "College", "Specialization"),
        }
    }
}

/// `(year, month, day)` from the derived columns, when all are present.
fn calendar(rec: &Record) -> Option<(i32, u32, u32)> {
    let part = |column: &str| rec.get(column).as_f64();
    Some((
        part("Year")? as i32,
        part("Month")? as u32,
        part("Day")? as u32,
    ))
}

fn daily_counts(ds: &Dataset) -> Vec<(NaiveDate, usize)> {
    let mut days: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for (y, m, d) in ds.records.iter().filter_map(calendar) {
        if let Some(day) = NaiveDate::from_ymd_opt(y, m, d) {
            *days.entry(day).or_insert(0) += 1;
        }
    }
    days.into_iter().collect()
}

fn monthly_counts(ds: &Dataset) -> Vec<((i32, u32), usize)> {
    let mut months: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    for (y, m, _) in ds.records.iter().filter_map(calendar) {
        *months.entry((y, m)).or_insert(0) += 1;
    }
    months.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::{load_sources, LoadOptions, Source};
    use crate::data::schema::Domain;

    const CSV: &str = "\
Enquiry No.,Enquiry Date,College,Specialization,Enquiry Type,Allotment Status,Gender
E1,20-Feb-2025 2:40 PM,North,CSE,Walk-in,Allotted,Male
E2,20-Feb-2025 9:15 AM,North,ECE,Online,Admission,Female
E3,03-Mar-2025 2:05 PM,South,CSE,Online,Pending,Female
";

    fn report() -> EnquiryReport {
        let source = Source::Memory {
            name: "enq.csv".into(),
            bytes: CSV.as_bytes().to_vec(),
        };
        let loaded = load_sources(Domain::Enquiry, &[source], LoadOptions::default());
        EnquiryReport::compute(&loaded.dataset.unwrap(), &loaded.capabilities, 10)
    }

    #[test]
    fn kpis() {
        let r = report();
        assert_eq!(r.total, 3);
        assert_eq!((r.allotted, r.admission), (1, 1));
        assert_eq!((r.walk_in, r.online), (1, 2));
        assert_eq!((r.male, r.female), (1, 2));
        assert_eq!(r.specializations, 2);
    }

    #[test]
    fn time_series() {
        let r = report();
        let feb20 = NaiveDate::from_ymd_opt(2025, 2, 20).unwrap();
        let mar3 = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();

        assert_eq!(r.daily, vec![(feb20, 2), (mar3, 1)]);
        assert_eq!(r.monthly, vec![((2025, 2), 2), ((2025, 3), 1)]);
        assert_eq!(
            r.hourly,
            vec![(Value::Number(9.0), 1), (Value::Number(14.0), 2)]
        );
    }

    #[test]
    fn calendar_series_read_derived_columns() {
        let rec = |y: f64, m: f64, d: f64| -> Record {
            [
                ("Year", Value::Number(y)),
                ("Month", Value::Number(m)),
                ("Day", Value::Number(d)),
            ]
            .into_iter()
            .collect()
        };
        let ds = Dataset::from_records(vec![
            rec(2025.0, 1.0, 31.0),
            rec(2024.0, 12.0, 5.0),
            rec(2025.0, 1.0, 31.0),
            [("Year", Value::Number(2025.0))].into_iter().collect(),
        ]);
        let caps = crate::data::schema::ENQUIRY.check(["Year", "Month", "Day"]);
        let r = EnquiryReport::compute(&ds, &caps, 10);

        assert_eq!(r.monthly, vec![((2024, 12), 1), ((2025, 1), 2)]);
        let jan31 = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        assert_eq!(r.daily.last(), Some(&(jan31, 2)));
        assert_eq!(r.daily.len(), 2);
    }

    #[test]
    fn college_by_specialization() {
        let r = report();
        let ct = &r.college_specialization;
        assert_eq!(ct.get(&"North".into(), &"CSE".into()), 1);
        assert_eq!(ct.get(&"South".into(), &"ECE".into()), 0);
    }
}
