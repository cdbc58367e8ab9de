use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::SystemTime;

use crate::config::DashboardConfig;
use crate::data::filter::{apply_or_unfiltered, FilterError, FilterSpec, Predicate};
use crate::data::loader::{load_sources, resolve_sources, LoadReport, Source};
use crate::data::model::{Dataset, Value};
use crate::data::schema::Domain;
use crate::report::Report;

// ---------------------------------------------------------------------------
// Load cache
// ---------------------------------------------------------------------------

/// Identity of one source as far as caching is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum SourceKey {
    File {
        path: PathBuf,
        len: u64,
        modified: Option<SystemTime>,
    },
    Memory {
        name: String,
        digest: u64,
    },
}

impl SourceKey {
    fn of(source: &Source) -> Self {
        match source {
            Source::Path(path) => {
                let meta = std::fs::metadata(path).ok();
                SourceKey::File {
                    path: path.clone(),
                    len: meta.as_ref().map_or(0, |m| m.len()),
                    modified: meta.and_then(|m| m.modified().ok()),
                }
            }
            Source::Memory { name, bytes } => {
                let mut hasher = DefaultHasher::new();
                bytes.hash(&mut hasher);
                SourceKey::Memory {
                    name: name.clone(),
                    digest: hasher.finish(),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    domain: Domain,
    reference_year: i32,
    sources: Vec<SourceKey>,
}

// ---------------------------------------------------------------------------
// Per-dashboard state
// ---------------------------------------------------------------------------

/// State of one dashboard tab: what was loaded, the active filters, and the
/// report for the rows that pass them.
pub struct Pane {
    pub domain: Domain,
    /// Files the user opened; empty means "use the default path".
    pub uploads: Vec<Source>,
    /// Last load, shared with the cache.
    pub loaded: Option<Rc<LoadReport>>,
    pub filters: FilterSpec,
    /// Rows passing `filters` (or every row, when filtering failed).
    pub visible: Dataset,
    /// Why the last filter pass fell back to the unfiltered data.
    pub degraded: Option<FilterError>,
    pub report: Option<Report>,
    top_n: usize,
}

impl Pane {
    fn new(domain: Domain, top_n: usize) -> Self {
        Self {
            domain,
            uploads: Vec::new(),
            loaded: None,
            filters: FilterSpec::new(),
            visible: Dataset::default(),
            degraded: None,
            report: None,
            top_n,
        }
    }

    /// The loaded dataset, if the last load produced one.
    pub fn dataset(&self) -> Option<&Dataset> {
        self.loaded.as_ref().and_then(|l| l.dataset.as_ref())
    }

    /// Ingest a load result and start from the initial filters.
    fn set_loaded(&mut self, loaded: Rc<LoadReport>) {
        self.filters = match &loaded.dataset {
            Some(ds) => FilterSpec::initial(ds, &loaded.capabilities),
            None => FilterSpec::new(),
        };
        self.loaded = Some(loaded);
        self.refilter();
    }

    /// Recompute the visible rows and the report after a filter change.
    pub fn refilter(&mut self) {
        let Some(loaded) = self.loaded.clone() else {
            return;
        };
        let Some(ds) = &loaded.dataset else {
            self.visible = Dataset::default();
            self.degraded = None;
            self.report = None;
            return;
        };

        let filtered = apply_or_unfiltered(ds, &self.filters);
        self.report = Some(Report::compute(
            self.domain,
            &filtered.dataset,
            &loaded.capabilities,
            self.top_n,
        ));
        self.visible = filtered.dataset;
        self.degraded = filtered.degraded;
    }

    pub fn set_predicate(&mut self, column: &str, predicate: Predicate) {
        if self.filters.get(column) == Some(&predicate) {
            return;
        }
        self.filters.set(column, predicate);
        self.refilter();
    }

    /// Toggle one value of a categorical filter. Toggling off the last
    /// selected value returns the filter to "All".
    pub fn toggle_filter_value(&mut self, column: &str, value: &Value) {
        let mut selected = match self.filters.get(column) {
            Some(Predicate::OneOf(set)) => set.clone(),
            _ => Default::default(),
        };
        if !selected.remove(value) {
            selected.insert(value.clone());
        }
        let predicate = if selected.is_empty() {
            Predicate::All
        } else {
            Predicate::OneOf(selected)
        };
        self.set_predicate(column, predicate);
    }

    /// Drop any restriction on `column`.
    pub fn select_all(&mut self, column: &str) {
        self.set_predicate(column, Predicate::All);
    }

    /// Back to the filters a fresh load starts with.
    pub fn reset_filters(&mut self) {
        if let Some(loaded) = self.loaded.clone() {
            self.set_loaded(loaded);
        }
    }

    /// `(loaded, visible)` row counts.
    pub fn row_counts(&self) -> Option<(usize, usize)> {
        self.dataset().map(|ds| (ds.len(), self.visible.len()))
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Everything the dashboards hold between frames.
pub struct Session {
    pub config: DashboardConfig,
    pub active: Domain,
    panes: Vec<Pane>,
    cache: HashMap<CacheKey, Rc<LoadReport>>,
}

impl Session {
    pub fn new(config: DashboardConfig) -> Self {
        let panes = Domain::ALL
            .iter()
            .map(|&d| Pane::new(d, config.top_n))
            .collect();
        Self {
            config,
            active: Domain::Admission,
            panes,
            cache: HashMap::new(),
        }
    }

    pub fn pane(&self, domain: Domain) -> &Pane {
        &self.panes[Self::slot(domain)]
    }

    pub fn pane_mut(&mut self, domain: Domain) -> &mut Pane {
        &mut self.panes[Self::slot(domain)]
    }

    fn slot(domain: Domain) -> usize {
        match domain {
            Domain::Admission => 0,
            Domain::Applicant => 1,
            Domain::Enquiry => 2,
        }
    }

    /// Load every dashboard from its current uploads or default path.
    pub fn load_all(&mut self) {
        for domain in Domain::ALL {
            self.load(domain);
        }
    }

    /// Replace the uploads of `domain` and load them.
    pub fn open(&mut self, domain: Domain, sources: Vec<Source>) {
        self.pane_mut(domain).uploads = sources;
        self.load(domain);
    }

    /// Forget the uploads of `domain` and go back to its default data.
    pub fn use_default(&mut self, domain: Domain) {
        self.open(domain, Vec::new());
    }

    /// (Re)load `domain`, reusing a cached result when the sources are
    /// unchanged.
    pub fn load(&mut self, domain: Domain) {
        let uploads = self.pane(domain).uploads.clone();
        let sources = resolve_sources(domain, &uploads, self.config.default_path(domain));
        let key = CacheKey {
            domain,
            reference_year: self.config.reference_year,
            sources: sources.iter().map(SourceKey::of).collect(),
        };

        let loaded = match self.cache.get(&key) {
            Some(hit) => {
                log::debug!("{domain}: reusing cached load");
                Rc::clone(hit)
            }
            None => {
                let report = Rc::new(load_sources(domain, &sources, self.config.load_options()));
                match &report.dataset {
                    Some(ds) => log::info!(
                        "{domain}: loaded {} rows from {} file(s)",
                        ds.len(),
                        report.files.len()
                    ),
                    None => log::info!("{domain}: no data"),
                }
                self.cache.insert(key, Rc::clone(&report));
                report
            }
        };
        self.pane_mut(domain).set_loaded(loaded);
    }
}
