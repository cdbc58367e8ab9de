use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::data::filter::{Predicate, ALL};
use crate::data::loader::Source;
use crate::data::model::{Dataset, Value};
use crate::data::schema::{Domain, FilterDef, FilterKind};
use crate::session::{Pane, Session};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the filter panel of the active dashboard.
pub fn side_panel(ui: &mut Ui, pane: &mut Pane) {
    ui.heading("Filters");
    ui.separator();

    let Some(loaded) = pane.loaded.clone() else {
        ui.label("Nothing loaded yet.");
        return;
    };
    let Some(dataset) = &loaded.dataset else {
        ui.label("No dataset loaded.");
        return;
    };

    if ui.button("Reset filters").clicked() {
        pane.reset_filters();
    }
    ui.add_space(4.0);

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for def in loaded.capabilities.filters() {
                match def.kind {
                    FilterKind::MultiSelect => multi_select(ui, pane, dataset, def),
                    FilterKind::SingleSelect => single_select(ui, pane, dataset, def),
                    FilterKind::NumberRange => number_range(ui, pane, dataset, def),
                    FilterKind::DateRange => date_range(ui, pane, dataset, def),
                }
                ui.add_space(6.0);
            }
        });
}

fn sorted_values(dataset: &Dataset, column: &str) -> Vec<Value> {
    let mut values = dataset.unique_values(column);
    values.sort();
    values
}

/// Checkbox list with an "All" entry; ticking "All" clears the selection.
fn multi_select(ui: &mut Ui, pane: &mut Pane, dataset: &Dataset, def: &FilterDef) {
    let values = sorted_values(dataset, def.column);
    let selected = match pane.filters.get(def.column) {
        Some(Predicate::OneOf(set)) => set.clone(),
        _ => Default::default(),
    };
    let header = if selected.is_empty() {
        format!("{}  (all)", def.label)
    } else {
        format!("{}  ({}/{})", def.label, selected.len(), values.len())
    };

    egui::CollapsingHeader::new(RichText::new(header).strong())
        .id_salt(def.column)
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            let mut all = selected.is_empty();
            if ui.checkbox(&mut all, ALL).changed() && all {
                pane.select_all(def.column);
            }
            for val in &values {
                let mut checked = selected.contains(val);
                if ui.checkbox(&mut checked, val.to_string()).changed() {
                    pane.toggle_filter_value(def.column, val);
                }
            }
        });
}

/// Combo box whose first entry is "All <label>".
fn single_select(ui: &mut Ui, pane: &mut Pane, dataset: &Dataset, def: &FilterDef) {
    let values = sorted_values(dataset, def.column);
    let all_label = format!("{ALL} {}", def.label);
    let current = match pane.filters.get(def.column) {
        Some(Predicate::OneOf(set)) => set.iter().next().cloned(),
        _ => None,
    };

    ui.strong(def.label);
    let selected_text = current
        .as_ref()
        .map(Value::to_string)
        .unwrap_or_else(|| all_label.clone());
    egui::ComboBox::from_id_salt(def.column)
        .selected_text(selected_text)
        .width(ui.available_width())
        .show_ui(ui, |ui: &mut Ui| {
            let mut picked = None;
            if ui.selectable_label(current.is_none(), &all_label).clicked() {
                picked = Some(ALL.to_string());
            }
            for val in &values {
                if ui
                    .selectable_label(current.as_ref() == Some(val), val.to_string())
                    .clicked()
                {
                    picked = Some(val.to_string());
                }
            }
            if let Some(label) = picked {
                pane.set_predicate(def.column, Predicate::from_selection([label]));
            }
        });
}

fn number_range(ui: &mut Ui, pane: &mut Pane, dataset: &Dataset, def: &FilterDef) {
    let Some((min, max)) = dataset.number_bounds(def.column) else {
        return;
    };
    let (mut low, mut high) = match pane.filters.get(def.column) {
        Some(Predicate::NumberRange { low, high }) => (*low, *high),
        _ => (min, max),
    };
    let active = pane.filters.get(def.column).is_some_and(Predicate::is_restrictive);

    ui.strong(def.label);
    let speed = ((max - min) / 200.0).max(0.1);
    let mut changed = false;
    ui.horizontal(|ui: &mut Ui| {
        changed |= ui
            .add(egui::DragValue::new(&mut low).range(min..=high).speed(speed))
            .changed();
        ui.label("to");
        changed |= ui
            .add(egui::DragValue::new(&mut high).range(low..=max).speed(speed))
            .changed();
    });
    if changed {
        pane.set_predicate(def.column, Predicate::NumberRange { low, high });
    }
    range_toggle(ui, pane, def, active, Predicate::NumberRange { low: min, high: max });
}

fn date_range(ui: &mut Ui, pane: &mut Pane, dataset: &Dataset, def: &FilterDef) {
    let Some((min, max)) = dataset.date_bounds(def.column) else {
        return;
    };
    let (mut start, mut end) = match pane.filters.get(def.column) {
        Some(Predicate::DateRange { start, end }) => (*start, *end),
        _ => (min.date(), max.date()),
    };
    let active = pane.filters.get(def.column).is_some_and(Predicate::is_restrictive);

    ui.strong(def.label);
    let mut changed = false;
    ui.horizontal(|ui: &mut Ui| {
        changed |= ui
            .add(DatePickerButton::new(&mut start).id_salt(&format!("{}_start", def.column)))
            .changed();
        ui.label("to");
        changed |= ui
            .add(DatePickerButton::new(&mut end).id_salt(&format!("{}_end", def.column)))
            .changed();
    });
    if changed {
        if start > end {
            std::mem::swap(&mut start, &mut end);
        }
        pane.set_predicate(def.column, Predicate::DateRange { start, end });
    }
    range_toggle(
        ui,
        pane,
        def,
        active,
        Predicate::DateRange {
            start: min.date(),
            end: max.date(),
        },
    );
}

/// Ranges hide rows without a value while active; this lets the user switch
/// a range off entirely, or back on at the full extent.
fn range_toggle(ui: &mut Ui, pane: &mut Pane, def: &FilterDef, active: bool, full: Predicate) {
    let mut on = active;
    if ui
        .checkbox(&mut on, "Hide rows without a value")
        .changed()
    {
        if on {
            pane.set_predicate(def.column, full);
        } else {
            pane.select_all(def.column);
        }
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the menu bar: file actions, dashboard tabs and status line.
pub fn top_bar(ui: &mut Ui, session: &mut Session) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            for domain in Domain::ALL {
                if ui.button(format!("Open {domain} CSV…")).clicked() {
                    open_file_dialog(session, domain);
                    ui.close_menu();
                }
            }
            ui.separator();
            let active = session.active;
            if ui.button(format!("Use default {domain} data", domain = active)).clicked() {
                session.use_default(active);
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                session.load(active);
                ui.close_menu();
            }
        });

        ui.separator();

        for domain in Domain::ALL {
            if ui
                .selectable_label(session.active == domain, domain.title())
                .clicked()
            {
                session.active = domain;
            }
        }

        ui.separator();

        let pane = session.pane(session.active);
        if let Some((loaded, visible)) = pane.row_counts() {
            ui.label(format!("{loaded} rows loaded, {visible} visible"));
        }
        if let Some(e) = &pane.degraded {
            ui.label(RichText::new(format!("Filters ignored: {e}")).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// No-data guidance
// ---------------------------------------------------------------------------

/// Shown in place of a dashboard when nothing could be loaded.
pub fn no_data(ui: &mut Ui, pane: &Pane, default_path: &std::path::Path) {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.add_space(40.0);
        ui.heading(format!("No {} data loaded", pane.domain));
        ui.label(format!(
            "Open one or more CSV files with File → Open {} CSV…, or place them at {}.",
            pane.domain,
            default_path.display()
        ));
    });
    ui.add_space(12.0);
    ui.strong("Expected columns");
    for col in pane.domain.schema().expected_columns() {
        ui.label(format!("• {col}"));
    }

    if let Some(loaded) = &pane.loaded {
        if !loaded.warnings.is_empty() {
            ui.add_space(12.0);
            ui.strong("Problems while loading");
            for w in &loaded.warnings {
                ui.label(RichText::new(w.to_string()).color(Color32::RED));
            }
        }
    }
}

/// Load-time notes shown above a dashboard.
pub fn load_notes(ui: &mut Ui, pane: &Pane) {
    let Some(loaded) = &pane.loaded else {
        return;
    };
    if !loaded.files.is_empty() {
        ui.label(RichText::new(format!("Files: {}", loaded.files.join(", "))).weak());
    }
    for w in &loaded.warnings {
        ui.label(RichText::new(format!("Skipped: {w}")).color(Color32::RED));
    }
    if loaded.duplicates_removed > 0 {
        ui.label(format!("{} duplicate rows removed", loaded.duplicates_removed));
    }
    if loaded.undated_dropped > 0 {
        ui.label(format!(
            "{} rows without a readable date were dropped",
            loaded.undated_dropped
        ));
    }
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(session: &mut Session, domain: Domain) {
    let files = rfd::FileDialog::new()
        .set_title(format!("Open {domain} data"))
        .add_filter("CSV", &["csv"])
        .pick_files();

    if let Some(paths) = files {
        log::info!("{domain}: opening {} file(s)", paths.len());
        session.open(domain, paths.into_iter().map(Source::Path).collect());
        session.active = domain;
    }
}
