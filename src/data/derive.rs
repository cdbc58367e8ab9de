use chrono::{Datelike, Timelike};

use super::model::{Record, Value};
use super::schema::Domain;

/// Columns added by [`derive`] for each domain.
pub fn derived_columns(domain: Domain) -> &'static [&'static str] {
    match domain {
        Domain::Admission => &["Age", "Month", "Days_to_Admission"],
        Domain::Applicant => &[],
        Domain::Enquiry => &["Year", "Month", "Day", "Hour"],
    }
}

/// Compute derived columns for one coerced record. Each derived value is
/// `Null` when its source columns are.
pub fn derive(domain: Domain, record: &mut Record, reference_year: i32) {
    match domain {
        Domain::Admission => derive_admission(record, reference_year),
        Domain::Applicant => {}
        Domain::Enquiry => derive_enquiry(record),
    }
}

fn derive_admission(record: &mut Record, reference_year: i32) {
    let birth = record.get("Date of Birth").as_date();
    let admitted = record.get("Date of Admission").as_date();
    let enquired = record.get("enquiry date").as_date();

    let age = birth
        .map(|b| Value::Number(f64::from(reference_year - b.year())))
        .unwrap_or(Value::Null);
    let month = admitted
        .map(|d| Value::Text(d.format("%Y-%m").to_string()))
        .unwrap_or(Value::Null);
    let days = match (admitted, enquired) {
        // whole days, rounded down
        (Some(a), Some(e)) => Value::Number((a - e).num_seconds().div_euclid(86_400) as f64),
        _ => Value::Null,
    };

    record.insert("Age", age);
    record.insert("Month", month);
    record.insert("Days_to_Admission", days);
}

fn derive_enquiry(record: &mut Record) {
    let stamp = record.get("Enquiry Date").as_date();
    let number = |v: Option<u32>| v.map(|n| Value::Number(f64::from(n))).unwrap_or(Value::Null);

    let year = stamp
        .map(|d| Value::Number(f64::from(d.year())))
        .unwrap_or(Value::Null);
    let month = number(stamp.map(|d| d.month()));
    let day = number(stamp.map(|d| d.day()));
    let hour = number(stamp.map(|d| d.hour()));

    record.insert("Year", year);
    record.insert("Month", month);
    record.insert("Day", day);
    record.insert("Hour", hour);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> Value {
        Value::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap())
    }

    #[test]
    fn admission_age_month_and_elapsed_days() {
        let mut rec: Record = [
            ("Date of Birth", date(2006, 8, 1)),
            ("Date of Admission", date(2025, 7, 10)),
            ("enquiry date", date(2025, 6, 30)),
        ]
        .into_iter()
        .collect();
        derive(Domain::Admission, &mut rec, 2025);

        assert_eq!(rec.get("Age"), &Value::Number(19.0));
        assert_eq!(rec.get("Month"), &Value::Text("2025-07".into()));
        assert_eq!(rec.get("Days_to_Admission"), &Value::Number(10.0));
    }

    #[test]
    fn elapsed_days_round_down() {
        let at = |d: u32, h: u32| {
            Value::Date(NaiveDate::from_ymd_opt(2025, 6, d).unwrap().and_hms_opt(h, 0, 0).unwrap())
        };
        let mut rec: Record = [("enquiry date", at(10, 12)), ("Date of Admission", at(10, 0))]
            .into_iter()
            .collect();
        derive(Domain::Admission, &mut rec, 2025);
        assert_eq!(rec.get("Days_to_Admission"), &Value::Number(-1.0));

        let mut rec: Record = [("enquiry date", at(10, 12)), ("Date of Admission", at(12, 6))]
            .into_iter()
            .collect();
        derive(Domain::Admission, &mut rec, 2025);
        assert_eq!(rec.get("Days_to_Admission"), &Value::Number(1.0));
    }

    #[test]
    fn missing_sources_give_null_derivations() {
        let mut rec: Record = [("Date of Admission", date(2025, 7, 10))].into_iter().collect();
        derive(Domain::Admission, &mut rec, 2025);

        assert!(rec.get("Age").is_null());
        assert!(rec.get("Days_to_Admission").is_null());
        assert!(!rec.get("Month").is_null());
    }

    #[test]
    fn enquiry_time_parts() {
        let stamp = NaiveDate::from_ymd_opt(2025, 2, 20).unwrap().and_hms_opt(14, 40, 0).unwrap();
        let mut rec: Record = [("Enquiry Date", Value::Date(stamp))].into_iter().collect();
        derive(Domain::Enquiry, &mut rec, 2025);

        assert_eq!(rec.get("Year"), &Value::Number(2025.0));
        assert_eq!(rec.get("Month"), &Value::Number(2.0));
        assert_eq!(rec.get("Day"), &Value::Number(20.0));
        assert_eq!(rec.get("Hour"), &Value::Number(14.0));
    }
}
