use crate::auth::Session;
use crate::config::Settings;
use crate::elasticity::{estimate_elasticity, WINDOW_DAYS};
use crate::loader::{load_files, parse_date};
use crate::model::{ElasticityResult, RollingPoint, Transaction};
use crate::stats::{aggregate_daily, item_series, rolling_metrics, unique_items, within_dates, ROLLING_WINDOW};
use chrono::NaiveDate;
use eframe::egui;
use egui::{Color32, Context, FontFamily, FontId, Margin, RichText, Stroke, Visuals};
use egui_extras::{Column, TableBuilder};
use std::path::PathBuf;
use tracing::{info, warn};

const ACCENT: Color32 = Color32::from_rgb(120, 190, 255);
const MUTED: Color32 = Color32::from_rgb(160, 170, 185);
const ERROR: Color32 = Color32::from_rgb(255, 110, 110);
const WARNING: Color32 = Color32::from_rgb(255, 200, 90);
const GOOD: Color32 = Color32::from_rgb(120, 230, 140);

// (style, size, family) applied on top of egui's defaults.
const TEXT_SIZES: [(egui::TextStyle, f32, FontFamily); 4] = [
    (egui::TextStyle::Body, 15.0, FontFamily::Proportional),
    (egui::TextStyle::Heading, 21.0, FontFamily::Proportional),
    (egui::TextStyle::Button, 15.0, FontFamily::Proportional),
    (egui::TextStyle::Monospace, 14.0, FontFamily::Monospace),
];

/// Dark slate theme with a blue accent for hovered, active and selected widgets.
pub fn set_custom_style(ctx: &Context) {
    let shade = |v: u8| Color32::from_rgb(v, v + v / 4, v + v / 2);

    let mut visuals = Visuals::dark();
    visuals.panel_fill = shade(18);
    visuals.window_fill = shade(24);
    visuals.faint_bg_color = shade(26);
    visuals.extreme_bg_color = shade(30);

    let widgets = &mut visuals.widgets;
    for (w, fill, stroke) in [
        (&mut widgets.inactive, 36, Stroke::new(1.0, shade(60))),
        (&mut widgets.hovered, 48, Stroke::new(2.0, ACCENT)),
        (&mut widgets.active, 58, Stroke::new(2.0, Color32::from_rgb(170, 215, 255))),
    ] {
        w.bg_fill = shade(fill);
        w.bg_stroke = stroke;
    }

    visuals.selection.bg_fill = Color32::from_rgb(50, 80, 120);
    visuals.selection.stroke = Stroke::new(1.0, ACCENT);
    ctx.set_visuals(visuals);

    let mut style = (*ctx.style()).clone();
    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.window_margin = Margin::same(12);
    style.spacing.button_padding = egui::vec2(10.0, 6.0);
    for (text_style, size, family) in TEXT_SIZES {
        style.text_styles.insert(text_style, FontId::new(size, family));
    }
    ctx.set_style(style);
}

pub struct DashboardApp {
    settings: Settings,
    session: Session,

    // Login form
    username: String,
    password: String,
    login_error: Option<String>,

    // Inputs
    file_input: String,
    files: Vec<PathBuf>,

    loaded: bool,
    combined: Vec<Transaction>,
    load_errors: Vec<String>,
    daily: Vec<Transaction>,
    items: Vec<String>,

    // Selection
    selected_item: Option<String>,
    date_from: String,
    date_to: String,
    date_error: Option<String>,

    // Views of the selected item
    series: Vec<RollingPoint>,
    elasticity: Vec<ElasticityResult>,
}

impl DashboardApp {
    pub fn new(settings: Settings) -> Self {
        let files = settings.files.clone();
        Self {
            settings,
            session: Session::anonymous(),

            username: String::new(),
            password: String::new(),
            login_error: None,

            file_input: String::new(),
            files,

            loaded: false,
            combined: vec![],
            load_errors: vec![],
            daily: vec![],
            items: vec![],

            selected_item: None,
            date_from: String::new(),
            date_to: String::new(),
            date_error: None,

            series: vec![],
            elasticity: vec![],
        }
    }

    fn try_login(&mut self) {
        match self.session.login(&self.settings.credentials, &self.username, &self.password) {
            Ok(session) => {
                self.session = session;
                self.login_error = None;
            }
            Err(e) => self.login_error = Some(e.to_string()),
        }
        self.password.clear();
    }

    fn logout(&mut self) {
        self.session = self.session.logout();
        self.username.clear();
    }

    fn add_file(&mut self) {
        let path = self.file_input.trim();
        if path.is_empty() {
            return;
        }
        let path = PathBuf::from(path);
        if !self.files.contains(&path) {
            self.files.push(path);
        }
        self.file_input.clear();
    }

    fn load_data(&mut self) {
        let report = load_files(&self.files);
        if report.is_empty() {
            warn!(files = self.files.len(), "no valid rows after parsing");
        }

        self.load_errors = report
            .errors
            .iter()
            .map(|(file, e)| format!("Error processing file {}: {}", file, e))
            .collect();
        self.combined = report.transactions;
        self.daily = aggregate_daily(&self.combined);
        self.items = unique_items(&self.daily);

        let keep = self
            .selected_item
            .as_ref()
            .is_some_and(|s| self.items.contains(s));
        if !keep {
            self.selected_item = self.items.first().cloned();
        }

        info!(
            rows = self.combined.len(),
            items = self.items.len(),
            failed_files = self.load_errors.len(),
            "sales data combined"
        );

        self.loaded = true;
        self.refresh_item();
    }

    /// Recomputes the selected item's series from the current selection.
    fn refresh_item(&mut self) {
        self.series.clear();
        self.elasticity.clear();

        let (from, from_err) = date_bound(&self.date_from, "From");
        let (to, to_err) = date_bound(&self.date_to, "To");
        self.date_error = from_err.or(to_err);

        let Some(item) = self.selected_item.as_deref() else {
            return;
        };

        let series = within_dates(&item_series(&self.daily, item), from, to);
        self.series = rolling_metrics(&series);
        self.elasticity = estimate_elasticity(&series);
    }

    fn login_form(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(80.0);
            ui.heading(RichText::new("Sign in").color(ACCENT).strong());
            ui.add_space(12.0);

            ui.add(
                egui::TextEdit::singleline(&mut self.username)
                    .hint_text("Username")
                    .desired_width(260.0),
            );
            let pw = ui.add(
                egui::TextEdit::singleline(&mut self.password)
                    .password(true)
                    .hint_text("Password")
                    .desired_width(260.0),
            );
            ui.add_space(6.0);

            let enter = pw.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("Login").clicked() || enter {
                self.try_login();
            }

            if let Some(err) = &self.login_error {
                ui.add_space(6.0);
                ui.label(RichText::new(err).color(ERROR));
            }
        });
    }

    fn file_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading(RichText::new("Sales files").color(ACCENT));
        ui.label(RichText::new("CSV with Date, Description, Unit Price, Units Sold").color(MUTED).small());
        ui.separator();

        ui.horizontal(|ui| {
            let resp = ui.add(
                egui::TextEdit::singleline(&mut self.file_input)
                    .hint_text("path/to/sales.csv")
                    .desired_width(200.0),
            );
            let enter = resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("Add").clicked() || enter {
                self.add_file();
            }
        });

        ui.add_space(6.0);

        let mut remove = None;
        for (i, path) in self.files.iter().enumerate() {
            ui.horizontal(|ui| {
                if ui.small_button("✖").on_hover_text("Remove").clicked() {
                    remove = Some(i);
                }
                ui.label(path.display().to_string());
            });
        }
        if let Some(i) = remove {
            self.files.remove(i);
        }

        ui.add_space(8.0);
        if ui
            .add_enabled(!self.files.is_empty(), egui::Button::new(RichText::new("Load").strong()))
            .clicked()
        {
            self.load_data();
        }

        if !self.load_errors.is_empty() {
            ui.add_space(10.0);
            ui.separator();
            for err in &self.load_errors {
                ui.label(RichText::new(err).color(ERROR));
            }
        }
    }

    fn selection_controls(&mut self, ui: &mut egui::Ui) {
        let mut changed = false;

        ui.horizontal(|ui| {
            ui.label("Select an item:");
            egui::ComboBox::from_id_salt("item")
                .selected_text(self.selected_item.clone().unwrap_or_default())
                .show_ui(ui, |ui| {
                    for item in &self.items {
                        if ui
                            .selectable_value(&mut self.selected_item, Some(item.clone()), item.as_str())
                            .clicked()
                        {
                            changed = true;
                        }
                    }
                });

            ui.separator();
            ui.label("From");
            changed |= ui
                .add(egui::TextEdit::singleline(&mut self.date_from).hint_text("YYYY-MM-DD").desired_width(100.0))
                .lost_focus();
            ui.label("To");
            changed |= ui
                .add(egui::TextEdit::singleline(&mut self.date_to).hint_text("YYYY-MM-DD").desired_width(100.0))
                .lost_focus();
        });

        if changed {
            self.refresh_item();
        }

        if let Some(err) = &self.date_error {
            ui.label(RichText::new(err).color(WARNING));
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.heading(RichText::new("Sales Data Dashboard").color(ACCENT).strong().size(23.0));

                if let Some(user) = self.session.user().map(str::to_string) {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Logout").clicked() {
                            self.logout();
                        }
                        ui.label(RichText::new(format!("Logged in as {}", user)).color(GOOD));
                    });
                }
            });
            ui.add_space(4.0);
        });

        if !self.session.is_authenticated() {
            egui::CentralPanel::default().show(ctx, |ui| self.login_form(ui));
            return;
        }

        egui::SidePanel::left("files")
            .min_width(260.0)
            .max_width(380.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.file_panel(ui));
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            if !self.loaded {
                ui.centered_and_justified(|ui| {
                    ui.label(RichText::new("Add one or more CSV files and press 'Load'").color(MUTED).size(18.0));
                });
                return;
            }

            if self.combined.is_empty() {
                ui.label(RichText::new("No valid data to display.").color(WARNING).size(17.0));
                return;
            }

            ui.label(RichText::new("Data successfully combined!").color(GOOD));
            ui.label(RichText::new("Combined Data Preview:").strong());
            let preview = &self.combined[..self.combined.len().min(self.settings.preview_rows)];
            ui.push_id("preview", |ui| preview_table(ui, preview));

            ui.add_space(8.0);
            ui.separator();
            self.selection_controls(ui);

            if let Some(item) = &self.selected_item {
                ui.add_space(6.0);
                ui.label(RichText::new(format!("Data for {}:", item)).strong());
            }
            ui.push_id("series", |ui| series_table(ui, &self.series));

            ui.add_space(8.0);
            ui.separator();
            ui.label(
                RichText::new(format!("Price changes ({}-day windows)", WINDOW_DAYS)).strong(),
            );
            if self.elasticity.is_empty() {
                ui.label(RichText::new("No price change with sales on both sides.").color(MUTED));
            } else {
                ui.push_id("elasticity", |ui| elasticity_table(ui, &self.elasticity));
            }
        });
    }
}

// Blank means unbounded; an unreadable date is ignored and flagged.
fn date_bound(raw: &str, label: &str) -> (Option<NaiveDate>, Option<String>) {
    if raw.trim().is_empty() {
        return (None, None);
    }
    match parse_date(raw) {
        Some(d) => (Some(d), None),
        None => (
            None,
            Some(format!("{} date '{}' not recognised; ignoring it.", label, raw.trim())),
        ),
    }
}

fn header_row(header: &mut egui_extras::TableRow<'_, '_>, titles: &[&str]) {
    for title in titles {
        header.col(|ui| {
            ui.label(RichText::new(*title).color(MUTED).strong());
        });
    }
}

fn preview_table(ui: &mut egui::Ui, rows: &[Transaction]) {
    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .column(Column::exact(110.0))
        .column(Column::remainder().at_least(160.0).clip(true))
        .columns(Column::exact(110.0), 2)
        .header(26.0, |mut header| {
            header_row(&mut header, &["Date", "Description", "Unit Price", "Units Sold"]);
        })
        .body(|body| {
            body.rows(22.0, rows.len(), |mut row| {
                let t = &rows[row.index()];
                row.col(|ui| { ui.label(t.date.to_string()); });
                row.col(|ui| { ui.label(t.description.as_str()); });
                row.col(|ui| { ui.label(format!("{:.2}", t.unit_price)); });
                row.col(|ui| { ui.label(format_units(t.units_sold)); });
            });
        });
}

fn series_table(ui: &mut egui::Ui, points: &[RollingPoint]) {
    let mean_title = format!("{}-row mean", ROLLING_WINDOW);

    TableBuilder::new(ui)
        .striped(true)
        .vscroll(true)
        .max_scroll_height(260.0)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .column(Column::exact(110.0))
        .columns(Column::exact(120.0), 4)
        .header(26.0, |mut header| {
            header_row(
                &mut header,
                &["Date", "Units Sold", "Unit Price", mean_title.as_str(), "Price Δ"],
            );
        })
        .body(|body| {
            body.rows(22.0, points.len(), |mut row| {
                let p = &points[row.index()];
                row.col(|ui| { ui.label(p.record.date.to_string()); });
                row.col(|ui| { ui.label(format_units(p.record.units_sold)); });
                row.col(|ui| { ui.label(format!("{:.2}", p.record.unit_price)); });
                row.col(|ui| { ui.label(format_opt(p.rolling_units, 2)); });
                row.col(|ui| {
                    let text = format_opt(p.price_change, 2);
                    let color = match p.price_change {
                        Some(d) if d > 0.0 => GOOD,
                        Some(d) if d < 0.0 => ERROR,
                        _ => MUTED,
                    };
                    ui.label(RichText::new(text).color(color));
                });
            });
        });
}

fn elasticity_table(ui: &mut egui::Ui, results: &[ElasticityResult]) {
    TableBuilder::new(ui)
        .striped(true)
        .vscroll(true)
        .max_scroll_height(220.0)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .column(Column::exact(110.0))
        .columns(Column::exact(105.0), 7)
        .header(26.0, |mut header| {
            header_row(
                &mut header,
                &[
                    "Change Date",
                    "Old Price",
                    "New Price",
                    "Sales Before",
                    "Sales After",
                    "Qty Δ %",
                    "Price Δ %",
                    "Elasticity",
                ],
            );
        })
        .body(|body| {
            body.rows(22.0, results.len(), |mut row| {
                let r = &results[row.index()];
                row.col(|ui| { ui.label(r.change_date.to_string()); });
                row.col(|ui| { ui.label(format!("{:.2}", r.old_price)); });
                row.col(|ui| { ui.label(format!("{:.2}", r.new_price)); });
                row.col(|ui| { ui.label(format_units(r.before_sales)); });
                row.col(|ui| { ui.label(format_units(r.after_sales)); });
                row.col(|ui| { ui.label(format_pct(r.quantity_change_pct)); });
                row.col(|ui| { ui.label(format_pct(r.price_change_pct)); });
                row.col(|ui| {
                    ui.label(RichText::new(format_opt(r.elasticity, 2)).color(ACCENT).strong());
                });
            });
        });
}

fn format_opt(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", decimals, v),
        None => "—".to_string(),
    }
}

fn format_pct(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:+.1}%", v * 100.0),
        None => "—".to_string(),
    }
}

fn format_units(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}
