//! Writes deterministic sample CSVs for all three dashboards.
//!
//! Usage: `generate_sample [output-dir]` (defaults to the current directory).
//! The file names match the dashboard's default data paths.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n.max(1)
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len() as u64) as usize]
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

const GENDERS: &[&str] = &["Male", "Female"];
const STATES: &[&str] = &[
    "Kerala", "Tamil Nadu", "Karnataka", "Maharashtra", "Goa", "Andhra Pradesh", "Telangana",
];
const CATEGORIES: &[&str] = &["GEN", "OBC", "SC", "ST", "EWS"];
const RELIGIONS: &[&str] = &["Hindu", "Christian", "Muslim", "Other"];
const LEVELS: &[&str] = &["UG", "PG"];
const PROGRAMMES: &[&str] = &[
    "B.Sc Physics",
    "B.Sc Chemistry",
    "B.Com",
    "BA English",
    "BBA",
    "M.Sc Physics",
    "M.Com",
    "MBA",
];
const SOURCES: &[&str] = &["Walk-in", "Online", "Referral", "Agent"];
const COLLEGES: &[&str] = &["North Campus", "South Campus", "City College"];
const DISCIPLINES: &[&str] = &["Physics", "Chemistry", "Commerce", "English", "Management"];
const SPECIALIZATIONS: &[&str] = &[
    "Computer Science",
    "Data Science",
    "Finance",
    "Marketing",
    "Literature",
];

fn date(y: i32, m: u32, d: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d).with_context(|| format!("invalid date {y}-{m}-{d}"))
}

fn writer(path: &Path) -> Result<csv::Writer<std::fs::File>> {
    csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))
}

/// Spreadsheet-style text cell, e.g. `="Allotted"`.
fn excel(text: &str) -> String {
    format!("=\"{text}\"")
}

/// `250000` → `₹2,50,000`
fn rupees(amount: u64) -> String {
    let digits = amount.to_string();
    let (head, tail) = digits.split_at(digits.len().saturating_sub(3));
    let mut out = String::from("₹");
    for (i, ch) in head.chars().enumerate() {
        if i > 0 && (head.len() - i) % 2 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if !head.is_empty() {
        out.push(',');
    }
    out.push_str(tail);
    out
}

fn write_admissions(dir: &Path, rng: &mut SimpleRng) -> Result<PathBuf> {
    let path = dir.join("2025 admissions  - primary only (1).csv");
    let mut w = writer(&path)?;
    w.write_record([
        "Date of Admission",
        "enquiry date",
        "Date of Birth",
        "Family Annual Income",
        "Prequalification Percentage",
        "Gender",
        "Category",
        "Religion",
        "Programme Name",
        "Program Level",
        "Student Status",
        "erp20may_State",
        "Source",
    ])?;

    let season = date(2025, 5, 1)?;
    for _ in 0..400 {
        let admitted = season + Duration::days(rng.below(120) as i64);
        let enquired = admitted - Duration::days(rng.below(60) as i64);
        let programme = rng.pick(PROGRAMMES);
        let level = if programme.starts_with('M') { "PG" } else { "UG" };
        let born = date(if level == "PG" { 2002 } else { 2006 }, 1, 1)?
            + Duration::days(rng.below(3 * 365) as i64);
        let income = (rng.gauss(450_000.0, 180_000.0).max(60_000.0) / 1000.0).round() as u64 * 1000;
        let score = rng.gauss(72.0, 10.0).clamp(35.0, 99.5);

        let income_cell = if rng.chance(0.03) {
            String::new()
        } else {
            rupees(income)
        };
        let status = if rng.chance(0.9) { "Active" } else { "Left" };

        w.write_record([
            admitted.format("%m-%d-%Y").to_string(),
            enquired.format("%m-%d-%Y").to_string(),
            born.format("%m-%d-%Y").to_string(),
            income_cell,
            format!("{score:.1}%"),
            rng.pick(GENDERS).to_string(),
            rng.pick(CATEGORIES).to_string(),
            rng.pick(RELIGIONS).to_string(),
            programme.to_string(),
            level.to_string(),
            status.to_string(),
            rng.pick(STATES).to_string(),
            rng.pick(SOURCES).to_string(),
        ])?;
    }
    w.flush()?;
    Ok(path)
}

/// Two exports: one with spreadsheet `="..."` cells and a `Program` column,
/// one plain without it.
fn write_applicants(dir: &Path, rng: &mut SimpleRng) -> Result<Vec<PathBuf>> {
    let sub = dir.join("applicant data");
    std::fs::create_dir_all(&sub).with_context(|| format!("creating {}", sub.display()))?;

    let first = sub.join("applicants_round1.csv");
    let mut w = writer(&first)?;
    w.write_record(
        ["Allotment Status", "Level", "Discipline", "College", "Program"]
            .iter()
            .map(|h| excel(h)),
    )?;
    for _ in 0..250 {
        let status = if rng.chance(0.55) { "Allotted" } else { "Not Allotted" };
        let discipline = rng.pick(DISCIPLINES);
        let level = rng.pick(LEVELS);
        w.write_record([
            excel(status),
            excel(level),
            excel(discipline),
            excel(rng.pick(COLLEGES)),
            excel(&format!("{level} {discipline}")),
        ])?;
    }
    w.flush()?;

    let second = sub.join("applicants_round2.csv");
    let mut w = writer(&second)?;
    w.write_record(["Allotment Status", "Level", "Discipline", "College"])?;
    for _ in 0..150 {
        let status = if rng.chance(0.4) { "Allotted" } else { "Not Allotted" };
        w.write_record([
            status,
            rng.pick(LEVELS),
            rng.pick(DISCIPLINES),
            rng.pick(COLLEGES),
        ])?;
    }
    w.flush()?;

    Ok(vec![first, second])
}

fn enquiry_row(no: usize, at: NaiveDateTime, rng: &mut SimpleRng) -> [String; 7] {
    let status = match rng.below(10) {
        0..=2 => "Allotted",
        3..=4 => "Admission",
        _ => "Pending",
    };
    let kind = if rng.chance(0.45) { "Walk-in" } else { "Online" };
    [
        format!("ENQ{no:05}"),
        at.format("%d-%b-%Y %I:%M %p").to_string(),
        rng.pick(COLLEGES).to_string(),
        rng.pick(SPECIALIZATIONS).to_string(),
        kind.to_string(),
        status.to_string(),
        rng.pick(GENDERS).to_string(),
    ]
}

/// The main export plus a later one that repeats some enquiry numbers.
fn write_enquiries(dir: &Path, rng: &mut SimpleRng) -> Result<Vec<PathBuf>> {
    const HEADER: [&str; 7] = [
        "Enquiry No.",
        "Enquiry Date",
        "College",
        "Specialization",
        "Enquiry Type",
        "Allotment Status",
        "Gender",
    ];
    let start = date(2025, 1, 6)?.and_hms_opt(8, 0, 0).context("invalid time")?;
    let timestamp = |rng: &mut SimpleRng| {
        start
            + Duration::days(rng.below(150) as i64)
            + Duration::minutes(rng.below(11 * 60) as i64)
    };

    let main = dir.join("enquiry_data.csv");
    let mut w = writer(&main)?;
    w.write_record(HEADER)?;
    for no in 1..=500 {
        let at = timestamp(rng);
        w.write_record(enquiry_row(no, at, rng))?;
    }
    w.write_record(["ENQ00501", "not recorded", "North Campus", "Finance", "Online", "Pending", "Male"])?;
    w.flush()?;

    let late = dir.join("enquiry_data_late.csv");
    let mut w = writer(&late)?;
    w.write_record(HEADER)?;
    for no in 481..=560 {
        let at = timestamp(rng);
        w.write_record(enquiry_row(no, at, rng))?;
    }
    w.flush()?;

    Ok(vec![main, late])
}

fn main() -> Result<()> {
    let dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut rng = SimpleRng::new(42);
    let mut written = vec![write_admissions(&dir, &mut rng)?];
    written.extend(write_applicants(&dir, &mut rng)?);
    written.extend(write_enquiries(&dir, &mut rng)?);

    for path in &written {
        println!("Wrote {}", path.display());
    }
    Ok(())
}
