//! Declared column layout per dashboard domain.
//!
//! Each domain lists the columns it knows about, how they are coerced, which
//! ones are required, the legacy names they may appear under, and the filter
//! widgets offered over them. The loader checks the layout once and produces
//! [`Capabilities`], which the rest of the pipeline consumes instead of
//! probing column names ad hoc.

use std::collections::BTreeSet;
use std::fmt;

// ---------------------------------------------------------------------------
// Domain
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Domain {
    Admission,
    Applicant,
    Enquiry,
}

impl Domain {
    pub const ALL: [Domain; 3] = [Domain::Admission, Domain::Applicant, Domain::Enquiry];

    pub fn schema(self) -> &'static Schema {
        match self {
            Domain::Admission => &ADMISSION,
            Domain::Applicant => &APPLICANT,
            Domain::Enquiry => &ENQUIRY,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Domain::Admission => "Admission",
            Domain::Applicant => "Applicant",
            Domain::Enquiry => "Enquiry",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

// ---------------------------------------------------------------------------
// Column and filter declarations
// ---------------------------------------------------------------------------

/// How raw text in a column is coerced at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Kept as text.
    Category,
    /// Best-effort date/time parsing, cell by cell.
    Date,
    /// Ordered list of enquiry export formats, chosen once per column.
    StampedDate,
    /// Money amount with optional symbol and separators.
    Currency,
    /// Number with optional trailing `%`.
    Percentage,
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub required: bool,
    /// Legacy names renamed to `name` when `name` itself is absent.
    pub aliases: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// Checkbox list with an "All" entry.
    MultiSelect,
    /// Combo box with an "All …" entry.
    SingleSelect,
    NumberRange,
    DateRange,
}

#[derive(Debug, Clone, Copy)]
pub struct FilterDef {
    pub column: &'static str,
    pub label: &'static str,
    pub kind: FilterKind,
}

/// Full declared layout of one domain.
#[derive(Debug)]
pub struct Schema {
    pub domain: Domain,
    pub columns: &'static [ColumnSpec],
    /// Natural unique key used to de-duplicate concatenated files.
    pub key: Option<&'static str>,
    pub filters: &'static [FilterDef],
}

const fn col(name: &'static str, kind: ColumnKind) -> ColumnSpec {
    ColumnSpec {
        name,
        kind,
        required: false,
        aliases: &[],
    }
}

const fn required(name: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        kind: ColumnKind::Category,
        required: true,
        aliases: &[],
    }
}

const fn aliased(
    name: &'static str,
    kind: ColumnKind,
    aliases: &'static [&'static str],
) -> ColumnSpec {
    ColumnSpec {
        name,
        kind,
        required: false,
        aliases,
    }
}

const fn filter(column: &'static str, label: &'static str, kind: FilterKind) -> FilterDef {
    FilterDef {
        column,
        label,
        kind,
    }
}

pub static ADMISSION: Schema = Schema {
    domain: Domain::Admission,
    columns: &[
        aliased("Date of Admission", ColumnKind::Date, &["Date of Joining"]),
        col("enquiry date", ColumnKind::Date),
        col("Date of Birth", ColumnKind::Date),
        aliased("Family Annual Income", ColumnKind::Currency, &["Guardian Annual Income"]),
        aliased(
            "Prequalification Percentage",
            ColumnKind::Percentage,
            &["Pre. Inst. Percentage of Mark"],
        ),
        col("Gender", ColumnKind::Category),
        col("Category", ColumnKind::Category),
        col("Religion", ColumnKind::Category),
        aliased("Programme Name", ColumnKind::Category, &["Course Name"]),
        aliased("Program Level", ColumnKind::Category, &["Year"]),
        col("Student Status", ColumnKind::Category),
        aliased("erp20may_State", ColumnKind::Category, &["State"]),
        col("Source", ColumnKind::Category),
    ],
    key: None,
    filters: &[
        filter("Date of Admission", "Admission date", FilterKind::DateRange),
        filter("erp20may_State", "State", FilterKind::MultiSelect),
        filter("Gender", "Gender", FilterKind::MultiSelect),
        filter("Program Level", "Program level", FilterKind::MultiSelect),
        filter("Category", "Category", FilterKind::MultiSelect),
        filter("Religion", "Religion", FilterKind::MultiSelect),
        filter("Source", "Admission source", FilterKind::MultiSelect),
        filter("Student Status", "Student status", FilterKind::MultiSelect),
        filter("Family Annual Income", "Family annual income (₹)", FilterKind::NumberRange),
        filter("Prequalification Percentage", "Prequalification score (%)", FilterKind::NumberRange),
    ],
};

pub static APPLICANT: Schema = Schema {
    domain: Domain::Applicant,
    columns: &[
        required("Allotment Status"),
        required("Level"),
        required("Discipline"),
        required("College"),
        col("Program", ColumnKind::Category),
    ],
    key: None,
    filters: &[
        filter("Allotment Status", "Allotment status", FilterKind::MultiSelect),
        filter("Level", "Level", FilterKind::MultiSelect),
        filter("Discipline", "Discipline", FilterKind::MultiSelect),
        filter("College", "College", FilterKind::MultiSelect),
    ],
};

pub static ENQUIRY: Schema = Schema {
    domain: Domain::Enquiry,
    columns: &[
        col("Enquiry No.", ColumnKind::Category),
        col("Enquiry Date", ColumnKind::StampedDate),
        col("College", ColumnKind::Category),
        col("Specialization", ColumnKind::Category),
        col("Enquiry Type", ColumnKind::Category),
        col("Allotment Status", ColumnKind::Category),
        col("Gender", ColumnKind::Category),
    ],
    key: Some("Enquiry No."),
    filters: &[
        filter("College", "College", FilterKind::SingleSelect),
        filter("Specialization", "Specialization", FilterKind::SingleSelect),
        filter("Enquiry Type", "Enquiry type", FilterKind::SingleSelect),
        filter("Enquiry Date", "Enquiry date", FilterKind::DateRange),
    ],
};

impl Schema {
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Map a raw header to its canonical name if it is a declared alias and
    /// the canonical column is not also present in `headers`.
    pub fn canonical_name<'a>(&self, header: &'a str, headers: &[String]) -> &'a str {
        for spec in self.columns {
            if spec.aliases.iter().any(|a| *a == header) && !headers.iter().any(|h| h == spec.name) {
                return spec.name;
            }
        }
        header
    }

    /// Check which declared columns a loaded header set provides.
    pub fn check<'h>(&self, headers: impl IntoIterator<Item = &'h str>) -> Capabilities {
        let present: BTreeSet<String> = headers.into_iter().map(str::to_string).collect();
        let missing = self
            .columns
            .iter()
            .filter(|c| !present.contains(c.name))
            .map(|c| c.name)
            .collect();
        let missing_required = self
            .columns
            .iter()
            .filter(|c| c.required && !present.contains(c.name))
            .map(|c| c.name)
            .collect();
        Capabilities {
            domain: self.domain,
            present,
            missing,
            missing_required,
        }
    }

    /// Names of every declared column, for "expected schema" guidance.
    pub fn expected_columns(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// Which columns a loaded dataset actually carries, computed once per load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    pub domain: Domain,
    /// All columns present after alias resolution and derivation.
    pub present: BTreeSet<String>,
    /// Declared columns the sources did not provide.
    pub missing: Vec<&'static str>,
    /// Subset of `missing` the dashboard cannot work without.
    pub missing_required: Vec<&'static str>,
}

impl Capabilities {
    pub fn empty(domain: Domain) -> Self {
        domain.schema().check(std::iter::empty())
    }

    pub fn has(&self, column: &str) -> bool {
        self.present.contains(column)
    }

    /// Filter widgets whose column is available.
    pub fn filters(&self) -> impl Iterator<Item = &'static FilterDef> + '_ {
        self.domain
            .schema()
            .filters
            .iter()
            .filter(move |f| self.has(f.column))
    }
}
