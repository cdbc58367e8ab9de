//! Central-panel layout of each dashboard. Everything drawn here comes from
//! a precomputed report; no aggregation happens in this module.

use eframe::egui::{CollapsingHeader, ScrollArea, Ui};

use crate::data::model::{Dataset, Value};
use crate::report::{AdmissionReport, ApplicantReport, EnquiryReport, Report};
use crate::ui::charts::{self, or_na, rupees};

pub fn show(ui: &mut Ui, report: &Report, visible: &Dataset, preview_rows: usize) {
    if visible.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No data available with current filters");
        });
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            match report {
                Report::Admission(r) => admission(ui, r),
                Report::Applicant(r) => applicant(ui, r),
                Report::Enquiry(r) => enquiry(ui, r),
            }
            ui.add_space(12.0);
            CollapsingHeader::new("Filtered data")
                .default_open(false)
                .show(ui, |ui: &mut Ui| charts::preview(ui, "preview", visible, preview_rows));
        });
}

/// Two charts next to each other.
fn pair(ui: &mut Ui, left: impl FnOnce(&mut Ui), right: impl FnOnce(&mut Ui)) {
    ui.columns(2, |cols| {
        left(&mut cols[0]);
        right(&mut cols[1]);
    });
    ui.add_space(8.0);
}

fn labelled<N: Copy>(items: &[(Value, N)], to_f64: impl Fn(N) -> f64) -> Vec<(String, f64)> {
    items.iter().map(|(v, n)| (v.to_string(), to_f64(*n))).collect()
}

// ---------------------------------------------------------------------------
// Admission
// ---------------------------------------------------------------------------

fn admission(ui: &mut Ui, r: &AdmissionReport) {
    let ratio = match r.gender_ratio {
        Some((male, female)) => format!("{male}:{female}"),
        None => "N/A".to_string(),
    };
    charts::kpi_row(
        ui,
        &[
            ("Total admissions", r.total.to_string()),
            ("Avg family income", or_na(r.avg_income, rupees)),
            ("Avg score", or_na(r.avg_score, |v| format!("{v:.1}%"))),
            ("Gender ratio (M:F)", ratio),
            ("Avg days to admission", or_na(r.avg_days_to_admission, |v| format!("{v:.0}"))),
            ("Avg age", or_na(r.avg_age, |v| format!("{v:.1}"))),
            ("Active students", or_na(r.active_share, |v| format!("{v:.1}%"))),
        ],
    );
    ui.separator();

    ui.heading("Overview");
    pair(
        ui,
        |ui| charts::counts(ui, "adm_levels", "Program levels", &r.program_levels),
        |ui| charts::counts(ui, "adm_gender", "Gender", &r.genders),
    );
    pair(
        ui,
        |ui| charts::counts(ui, "adm_status", "Student status", &r.statuses),
        |ui| charts::histogram(ui, "adm_age", "Age distribution", "Age", &r.age_histogram),
    );
    charts::counts(ui, "adm_programmes", "Top programmes", &r.top_programmes);

    ui.heading("Trends");
    pair(
        ui,
        |ui| {
            let monthly = labelled(&r.monthly_admissions, |n| n as f64);
            charts::series(ui, "adm_monthly", "Admissions per month", &monthly);
        },
        |ui| {
            let scores = labelled(&r.monthly_scores, |v| v);
            charts::series(ui, "adm_monthly_score", "Average score per month", &scores);
        },
    );

    ui.heading("Geography");
    pair(
        ui,
        |ui| charts::counts(ui, "adm_states", "Top states", &r.top_states),
        |ui| charts::bars(ui, "adm_state_income", "Average income by state", &r.state_income),
    );

    ui.heading("Demographics");
    pair(
        ui,
        |ui| charts::counts(ui, "adm_category", "Category", &r.categories),
        |ui| charts::counts(ui, "adm_religion", "Religion", &r.religions),
    );

    ui.heading("Financial");
    pair(
        ui,
        |ui| {
            charts::histogram(
                ui,
                "adm_income",
                "Family income distribution",
                "Family annual income",
                &r.income_histogram,
            )
        },
        |ui| {
            charts::scatter(
                ui,
                "adm_income_score",
                "Income vs score",
                ("Family annual income", "Prequalification %"),
                &r.income_vs_score,
            )
        },
    );
    charts::bars(ui, "adm_category_income", "Average income by category", &r.category_income);
}

// ---------------------------------------------------------------------------
// Applicant
// ---------------------------------------------------------------------------

fn applicant(ui: &mut Ui, r: &ApplicantReport) {
    if !r.missing_required.is_empty() {
        ui.colored_label(
            ui.visuals().warn_fg_color,
            format!("Missing required columns: {}", r.missing_required.join(", ")),
        );
    }

    let programs = if r.programs > 0 {
        r.programs.to_string()
    } else {
        "N/A".to_string()
    };
    charts::kpi_row(
        ui,
        &[
            ("Total applicants", r.total.to_string()),
            ("Allotted", r.allotted.to_string()),
            ("Not allotted", r.not_allotted.to_string()),
            ("Programs", programs),
        ],
    );
    ui.separator();

    pair(
        ui,
        |ui| charts::counts(ui, "app_status", "Allotment status", &r.allotment),
        |ui| charts::counts(ui, "app_level", "Applicants by level", &r.levels),
    );
    pair(
        ui,
        |ui| charts::counts(ui, "app_disciplines", "Top disciplines", &r.top_disciplines),
        |ui| charts::counts(ui, "app_colleges", "Applicants by college", &r.colleges),
    );
    charts::cross_tab(ui, "app_level_status", "Allotment status by level", &r.allotment_by_level);
    ui.add_space(8.0);

    if r.discipline_rates.is_empty() {
        ui.label("Allotment rates need both Allotted and Not Allotted applicants.");
    } else {
        pair(
            ui,
            |ui| charts::bars(ui, "app_disc_rate", "Allotment rate by discipline (%)", &r.discipline_rates),
            |ui| charts::bars(ui, "app_college_rate", "Allotment rate by college (%)", &r.college_rates),
        );
    }
    if !r.top_programs.is_empty() {
        charts::counts(ui, "app_programs", "Top programs", &r.top_programs);
    }

    ui.heading("Advanced analysis");
    pair(
        ui,
        |ui| {
            charts::bars(
                ui,
                "app_disc_success",
                "Discipline success (% of all applicants)",
                &r.discipline_success,
            )
        },
        |ui| charts::correlation(ui, "app_corr", "Correlation matrix", &r.correlation),
    );
    if let Some(diversity) = r.program_diversity {
        ui.label(format!(
            "Program diversity: {} unique programs, {diversity:.2}% of applicants",
            r.programs
        ));
    }
}

// ---------------------------------------------------------------------------
// Enquiry
// ---------------------------------------------------------------------------

fn enquiry(ui: &mut Ui, r: &EnquiryReport) {
    charts::kpi_row(
        ui,
        &[
            ("Total enquiries", r.total.to_string()),
            ("Allotted", r.allotted.to_string()),
            ("Admission", r.admission.to_string()),
            ("Specializations", r.specializations.to_string()),
        ],
    );
    charts::kpi_row(
        ui,
        &[
            ("Walk-in", r.walk_in.to_string()),
            ("Online", r.online.to_string()),
            ("Male", r.male.to_string()),
            ("Female", r.female.to_string()),
        ],
    );
    ui.separator();

    let daily: Vec<(String, f64)> = r
        .daily
        .iter()
        .map(|(d, n)| (d.format("%Y-%m-%d").to_string(), *n as f64))
        .collect();
    charts::series(ui, "enq_daily", "Daily enquiries", &daily);

    pair(
        ui,
        |ui| charts::counts(ui, "enq_college", "Enquiries by college", &r.colleges),
        |ui| charts::counts(ui, "enq_spec", "Top specializations", &r.top_specializations),
    );
    pair(
        ui,
        |ui| charts::counts(ui, "enq_type", "Enquiry type", &r.types),
        |ui| charts::counts(ui, "enq_status", "Allotment status", &r.statuses),
    );
    pair(
        ui,
        |ui| charts::counts(ui, "enq_gender", "Gender", &r.genders),
        |ui| {
            let hourly = labelled(&r.hourly, |n| n as f64);
            charts::series(ui, "enq_hourly", "Enquiries by hour", &hourly);
        },
    );

    let monthly: Vec<(String, f64)> = r
        .monthly
        .iter()
        .map(|((y, m), n)| (format!("{y}-{m:02}"), *n as f64))
        .collect();
    charts::series(ui, "enq_monthly", "Monthly enquiries", &monthly);
    charts::cross_tab(
        ui,
        "enq_college_spec",
        "College × specialization",
        &r.college_specialization,
    );
}
