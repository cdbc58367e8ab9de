//! Per-dashboard reports: the fixed set of aggregates each tab displays,
//! computed in one pass from the filtered dataset.

pub mod admission;
pub mod applicant;
pub mod enquiry;

use crate::data::model::{Dataset, Value};
use crate::data::schema::{Capabilities, Domain};

pub use admission::AdmissionReport;
pub use applicant::ApplicantReport;
pub use enquiry::EnquiryReport;

/// `(category, count)` pairs ready for a bar or pie chart.
pub type Counts = Vec<(Value, usize)>;
/// `(category, number)` pairs such as group means or rates.
pub type Measures = Vec<(Value, f64)>;

#[derive(Debug, Clone)]
pub enum Report {
    Admission(AdmissionReport),
    Applicant(ApplicantReport),
    Enquiry(EnquiryReport),
}

impl Report {
    pub fn compute(domain: Domain, ds: &Dataset, caps: &Capabilities, top_n: usize) -> Self {
        match domain {
            Domain::Admission => Report::Admission(AdmissionReport::compute(ds, caps, top_n)),
            Domain::Applicant => Report::Applicant(ApplicantReport::compute(ds, caps, top_n)),
            Domain::Enquiry => Report::Enquiry(EnquiryReport::compute(ds, caps, top_n)),
        }
    }
}

/// `part` as a percentage of `total`; `None` when `total` is zero.
pub fn share(part: usize, total: usize) -> Option<f64> {
    (total > 0).then(|| part as f64 / total as f64 * 100.0)
}
