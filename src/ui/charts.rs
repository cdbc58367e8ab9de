use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, Points};

use crate::color::{ColorMap, ACCENT};
use crate::data::aggregate::{Bin, Correlation, CrossTab};
use crate::data::model::{Dataset, Value};

const CHART_HEIGHT: f32 = 240.0;

// ---------------------------------------------------------------------------
// KPI cards
// ---------------------------------------------------------------------------

/// A row of headline figures, each in its own framed card.
pub fn kpi_row(ui: &mut Ui, cards: &[(&str, String)]) {
    ui.horizontal_wrapped(|ui: &mut Ui| {
        for (label, value) in cards {
            egui::Frame::group(ui.style())
                .inner_margin(10.0)
                .show(ui, |ui: &mut Ui| {
                    ui.set_min_width(140.0);
                    ui.vertical(|ui: &mut Ui| {
                        ui.label(RichText::new(*label).small().weak());
                        ui.label(RichText::new(value).size(20.0).strong());
                    });
                });
        }
    });
}

/// Format an optional number, or "N/A" when it could not be computed.
pub fn or_na(value: Option<f64>, format: impl Fn(f64) -> String) -> String {
    value.map(format).unwrap_or_else(|| "N/A".to_string())
}

/// `1234567.8` → `"12,34,568"` (Indian digit grouping, no decimals).
pub fn rupees(value: f64) -> String {
    let whole = value.round().abs() as u64;
    let digits = whole.to_string();
    let (head, tail) = digits.split_at(digits.len().saturating_sub(3));
    let mut out = String::new();
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
    let sign = if value < -0.5 { "-" } else { "" };
    format!("{sign}₹{out}")
}

// ---------------------------------------------------------------------------
// Plots
// ---------------------------------------------------------------------------

fn title(ui: &mut Ui, text: &str) {
    ui.label(RichText::new(text).strong());
}

fn empty(ui: &mut Ui) {
    ui.label(RichText::new("No data").weak());
}

/// Vertical bars, one per category, labelled on the x axis.
pub fn bars(ui: &mut Ui, id: &str, heading: &str, items: &[(Value, f64)]) {
    title(ui, heading);
    if items.is_empty() {
        empty(ui);
        return;
    }

    let colors = ColorMap::new(items.iter().map(|(v, _)| v));
    let labels: Vec<String> = items.iter().map(|(v, _)| v.to_string()).collect();
    let chart = BarChart::new(
        items
            .iter()
            .enumerate()
            .map(|(i, (v, n))| {
                Bar::new(i as f64, *n)
                    .name(v.to_string())
                    .fill(colors.color_for(v))
            })
            .collect(),
    )
    .width(0.7);

    Plot::new(id)
        .height(CHART_HEIGHT)
        .allow_scroll(false)
        .x_axis_formatter(move |mark, _range| category_label(&labels, mark.value))
        .show(ui, |plot_ui| plot_ui.bar_chart(chart));
}

/// [`bars`] over `(category, count)` pairs.
pub fn counts(ui: &mut Ui, id: &str, heading: &str, items: &[(Value, usize)]) {
    let items: Vec<(Value, f64)> = items.iter().map(|(v, n)| (v.clone(), *n as f64)).collect();
    bars(ui, id, heading, &items);
}

fn category_label(labels: &[String], x: f64) -> String {
    if (x - x.round()).abs() > f64::EPSILON || x < 0.0 {
        return String::new();
    }
    labels.get(x.round() as usize).cloned().unwrap_or_default()
}

/// Categories joined by a line, in the order given (time series).
pub fn series(ui: &mut Ui, id: &str, heading: &str, items: &[(String, f64)]) {
    title(ui, heading);
    if items.is_empty() {
        empty(ui);
        return;
    }

    let labels: Vec<String> = items.iter().map(|(l, _)| l.clone()).collect();
    let points: PlotPoints = items
        .iter()
        .enumerate()
        .map(|(i, (_, n))| [i as f64, *n])
        .collect();

    Plot::new(id)
        .height(CHART_HEIGHT)
        .allow_scroll(false)
        .x_axis_formatter(move |mark, _range| category_label(&labels, mark.value))
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(points).color(ACCENT).width(2.0).name(heading));
        });
}

pub fn histogram(ui: &mut Ui, id: &str, heading: &str, x_label: &str, bins: &[Bin]) {
    title(ui, heading);
    if bins.is_empty() {
        empty(ui);
        return;
    }

    let chart = BarChart::new(
        bins.iter()
            .map(|b| {
                Bar::new(b.mid(), b.count as f64)
                    .width(b.width().max(f64::EPSILON))
                    .fill(ACCENT)
            })
            .collect(),
    );

    Plot::new(id)
        .height(CHART_HEIGHT)
        .allow_scroll(false)
        .x_axis_label(x_label)
        .y_axis_label("Count")
        .show(ui, |plot_ui| plot_ui.bar_chart(chart));
}

pub fn scatter(ui: &mut Ui, id: &str, heading: &str, axes: (&str, &str), points: &[[f64; 2]]) {
    title(ui, heading);
    if points.is_empty() {
        empty(ui);
        return;
    }

    let series: PlotPoints = points.iter().copied().collect();
    Plot::new(id)
        .height(CHART_HEIGHT)
        .allow_scroll(false)
        .legend(Legend::default())
        .x_axis_label(axes.0)
        .y_axis_label(axes.1)
        .show(ui, |plot_ui| {
            plot_ui.points(
                Points::new(series)
                    .radius(2.5)
                    .color(ACCENT.gamma_multiply(0.7))
                    .name(format!("{} rows", points.len())),
            );
        });
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Count matrix, cells shaded by their share of the largest cell.
pub fn cross_tab(ui: &mut Ui, id: &str, heading: &str, table: &CrossTab) {
    title(ui, heading);
    if table.is_empty() {
        empty(ui);
        return;
    }

    let max = table.max().max(1) as f32;
    ScrollArea::horizontal().id_salt(id).show(ui, |ui: &mut Ui| {
        egui::Grid::new(id).striped(true).show(ui, |ui: &mut Ui| {
            ui.label("");
            for c in &table.columns {
                ui.label(RichText::new(c.to_string()).strong());
            }
            ui.end_row();

            for (r, row) in table.rows.iter().zip(&table.counts) {
                ui.label(RichText::new(r.to_string()).strong());
                for &n in row {
                    let shade = Color32::from_rgba_unmultiplied(
                        ACCENT.r(),
                        ACCENT.g(),
                        ACCENT.b(),
                        (n as f32 / max * 200.0) as u8,
                    );
                    egui::Frame::default().fill(shade).inner_margin(4.0).show(ui, |ui: &mut Ui| {
                        ui.label(n.to_string());
                    });
                }
                ui.end_row();
            }
        });
    });
}

/// Cell colour for a correlation coefficient: accent for positive, red for
/// negative, stronger with magnitude.
fn correlation_fill(r: Option<f64>) -> Color32 {
    let Some(r) = r else {
        return Color32::TRANSPARENT;
    };
    let base = if r >= 0.0 {
        ACCENT
    } else {
        Color32::from_rgb(214, 39, 40)
    };
    let alpha = (r.abs().min(1.0) * 200.0) as u8;
    Color32::from_rgba_unmultiplied(base.r(), base.g(), base.b(), alpha)
}

/// Correlation matrix as a shaded grid.
pub fn correlation(ui: &mut Ui, id: &str, heading: &str, table: &Correlation) {
    title(ui, heading);
    if table.is_empty() {
        ui.label(RichText::new("Not enough numeric columns to correlate").weak());
        return;
    }

    ScrollArea::horizontal().id_salt(id).show(ui, |ui: &mut Ui| {
        egui::Grid::new(id).show(ui, |ui: &mut Ui| {
            ui.label("");
            for c in &table.columns {
                ui.label(RichText::new(c).strong());
            }
            ui.end_row();

            for (name, row) in table.columns.iter().zip(&table.matrix) {
                ui.label(RichText::new(name).strong());
                for &r in row {
                    egui::Frame::default()
                        .fill(correlation_fill(r))
                        .inner_margin(4.0)
                        .show(ui, |ui: &mut Ui| {
                            ui.label(or_na(r, |v| format!("{v:.2}")));
                        });
                }
                ui.end_row();
            }
        });
    });
}

/// First `limit` rows of the filtered data.
pub fn preview(ui: &mut Ui, id: &str, dataset: &Dataset, limit: usize) {
    ui.label(format!(
        "Showing {} of {} rows",
        dataset.len().min(limit),
        dataset.len()
    ));
    ScrollArea::both()
        .id_salt(id)
        .max_height(320.0)
        .auto_shrink([false, true])
        .show(ui, |ui: &mut Ui| {
            egui::Grid::new(id).striped(true).show(ui, |ui: &mut Ui| {
                for col in &dataset.column_names {
                    ui.label(RichText::new(col).strong());
                }
                ui.end_row();
                for rec in dataset.records.iter().take(limit) {
                    for col in &dataset.column_names {
                        match rec.get(col) {
                            Value::Null => ui.label(""),
                            v => ui.label(v.to_string()),
                        };
                    }
                    ui.end_row();
                }
            });
        });
}
