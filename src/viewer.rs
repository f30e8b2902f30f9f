//! Report window: metrics table, PSNR and SSIM bar charts, image strip

use crate::core::report::{BarSeries, Report};
use crate::io::image_loader::to_luma8;
use crate::types::{DenoiseError, DenoiseResult, ImageSet, IntensityImage, Method};
use eframe::egui::{self, Color32, RichText, TextureHandle, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, Legend, Plot, PlotPoint, Text};

const CHART_HEIGHT: f32 = 280.0;
const THUMBNAIL_SIDE: f32 = 256.0;

fn method_color(method: &str) -> Color32 {
    match method {
        "Noisy" => Color32::from_rgb(214, 96, 77),
        "Traditional" => Color32::from_rgb(67, 147, 195),
        _ => Color32::from_rgb(90, 174, 97),
    }
}

/// Open the report window and block until it is closed
pub fn show_report(images: &ImageSet, report: &Report) -> DenoiseResult<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 900.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    let app = ReportApp::new(images.clone(), report.clone());

    eframe::run_native(
        "Denoising comparison",
        options,
        Box::new(|_cc| Ok(Box::new(app))),
    )
    .map_err(|e| DenoiseError::Viewer(e.to_string()))
}

struct ReportApp {
    images: ImageSet,
    report: Report,
    textures: Vec<(String, TextureHandle)>,
}

impl ReportApp {
    fn new(images: ImageSet, report: Report) -> Self {
        Self {
            images,
            report,
            textures: Vec::new(),
        }
    }

    fn ensure_textures(&mut self, ctx: &egui::Context) {
        if !self.textures.is_empty() {
            return;
        }

        let mut named: Vec<(String, &IntensityImage)> =
            vec![("Original".to_string(), &self.images.original)];
        for method in Method::REPORT_ORDER {
            named.push((method.to_string(), self.images.candidate(method)));
        }

        self.textures = named
            .into_iter()
            .map(|(name, image)| {
                let luma = to_luma8(image);
                let size = [luma.width() as usize, luma.height() as usize];
                let color = egui::ColorImage::from_gray(size, luma.as_raw());
                let handle = ctx.load_texture(name.clone(), color, egui::TextureOptions::NEAREST);
                (name, handle)
            })
            .collect();
    }

    fn metrics_table(&self, ui: &mut Ui) {
        TableBuilder::new(ui)
            .striped(true)
            .column(Column::auto().at_least(120.0))
            .column(Column::auto().at_least(100.0))
            .column(Column::auto().at_least(100.0))
            .header(20.0, |mut header| {
                header.col(|ui| {
                    ui.strong("Method");
                });
                header.col(|ui| {
                    ui.strong("PSNR (dB)");
                });
                header.col(|ui| {
                    ui.strong("SSIM");
                });
            })
            .body(|mut body| {
                for entry in self.report.entries() {
                    body.row(18.0, |mut row| {
                        row.col(|ui| {
                            ui.label(entry.method.to_string());
                        });
                        row.col(|ui| {
                            ui.monospace(crate::core::report::format_metric(entry.metrics.psnr, 4));
                        });
                        row.col(|ui| {
                            ui.monospace(format!("{:.4}", entry.metrics.ssim));
                        });
                    });
                }
            });
    }

    fn image_strip(&self, ui: &mut Ui) {
        ui.horizontal_wrapped(|ui| {
            for (name, texture) in &self.textures {
                ui.vertical(|ui| {
                    ui.label(RichText::new(name).strong());
                    let [w, h] = texture.size();
                    let scale = THUMBNAIL_SIDE / w.max(h).max(1) as f32;
                    let size = egui::vec2(w as f32 * scale, h as f32 * scale);
                    ui.image((texture.id(), size));
                });
            }
        });
    }
}

/// Bar chart with one bar per method and the rounded value above it
fn metric_chart(ui: &mut Ui, id: &str, y_label: &str, series: &[BarSeries], y_max: f64) {
    Plot::new(id)
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .y_axis_label(y_label)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .include_y(0.0)
        .include_y(y_max)
        .show(ui, |plot_ui| {
            for (i, bar) in series.iter().enumerate() {
                let x = i as f64;
                let color = method_color(&bar.label);
                let chart = BarChart::new(vec![Bar::new(x, bar.value).width(0.6).fill(color)])
                    .name(&bar.label)
                    .color(color);
                plot_ui.bar_chart(chart);
                plot_ui.text(
                    Text::new(PlotPoint::new(x, bar.value), RichText::new(&bar.annotation).strong())
                        .anchor(egui::Align2::CENTER_BOTTOM),
                );
            }
        });
}

impl eframe::App for ReportApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ensure_textures(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Denoising comparison");
                ui.add_space(8.0);
                self.metrics_table(ui);
                ui.add_space(12.0);

                let psnr = self.report.psnr_series();
                let ssim = self.report.ssim_series();
                let psnr_max = psnr.iter().map(|b| b.value).fold(0.0, f64::max) * 1.15;

                ui.columns(2, |columns| {
                    columns[0].label(RichText::new("PSNR per method").strong());
                    metric_chart(&mut columns[0], "psnr_chart", "PSNR (dB)", &psnr, psnr_max);
                    columns[1].label(RichText::new("SSIM per method").strong());
                    metric_chart(&mut columns[1], "ssim_chart", "SSIM", &ssim, 1.0);
                });

                ui.add_space(12.0);
                self.image_strip(ui);
            });
        });
    }
}
