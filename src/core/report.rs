use crate::core::metrics::evaluate;
use crate::types::{DenoiseError, DenoiseResult, ImageSet, MetricPair, Method};
use serde::Serialize;
use std::fmt;

/// Height used for bars whose PSNR is infinite
pub const INFINITE_PSNR_BAR_DB: f64 = 100.0;

/// One report row
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReportEntry {
    pub method: Method,
    pub metrics: MetricPair,
}

/// Metrics of every candidate, in report order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    entries: Vec<ReportEntry>,
}

/// One bar of a metric chart
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    pub label: String,
    /// Bar height
    pub value: f64,
    /// Rounded value printed above the bar
    pub annotation: String,
}

impl Report {
    /// Evaluate the noisy, traditional and AI images against the original
    pub fn from_images(images: &ImageSet) -> DenoiseResult<Self> {
        let mut entries = Vec::with_capacity(Method::REPORT_ORDER.len());
        for method in Method::REPORT_ORDER {
            let metrics = evaluate(images.candidate(method), &images.original)?;
            log::info!(
                "{}: PSNR {:.4} dB, SSIM {:.4}",
                method,
                metrics.psnr,
                metrics.ssim
            );
            entries.push(ReportEntry { method, metrics });
        }
        Ok(Self { entries })
    }

    /// Build from precomputed metrics, one pair per method in any order
    pub fn from_metrics(
        metrics: impl IntoIterator<Item = (Method, MetricPair)>,
    ) -> DenoiseResult<Self> {
        let mut slots: [Option<MetricPair>; 3] = [None; 3];
        for (method, pair) in metrics {
            let slot = &mut slots[report_rank(method)];
            if slot.is_some() {
                return Err(DenoiseError::InvalidParameter(format!(
                    "Duplicate metrics for {}",
                    method
                )));
            }
            *slot = Some(pair);
        }

        let mut entries = Vec::with_capacity(Method::REPORT_ORDER.len());
        for (method, slot) in Method::REPORT_ORDER.into_iter().zip(slots) {
            let metrics = slot.ok_or_else(|| {
                DenoiseError::InvalidParameter(format!("Missing metrics for {}", method))
            })?;
            entries.push(ReportEntry { method, metrics });
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    pub fn get(&self, method: Method) -> Option<&MetricPair> {
        self.entries
            .iter()
            .find(|e| e.method == method)
            .map(|e| &e.metrics)
    }

    /// Fixed-width table with 4-decimal metrics
    pub fn to_table(&self) -> String {
        self.to_string()
    }

    /// PSNR bars, annotated with 2 decimals
    pub fn psnr_series(&self) -> Vec<BarSeries> {
        self.entries
            .iter()
            .map(|e| BarSeries {
                label: e.method.to_string(),
                value: if e.metrics.psnr.is_finite() {
                    e.metrics.psnr
                } else {
                    INFINITE_PSNR_BAR_DB
                },
                annotation: format_metric(e.metrics.psnr, 2),
            })
            .collect()
    }

    /// SSIM bars, annotated with 4 decimals
    pub fn ssim_series(&self) -> Vec<BarSeries> {
        self.entries
            .iter()
            .map(|e| BarSeries {
                label: e.method.to_string(),
                value: e.metrics.ssim,
                annotation: format_metric(e.metrics.ssim, 4),
            })
            .collect()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<12} {:>12} {:>10}", "Method", "PSNR (dB)", "SSIM")?;
        writeln!(f, "{}", "-".repeat(36))?;
        for entry in &self.entries {
            writeln!(
                f,
                "{:<12} {:>12} {:>10.4}",
                entry.method.to_string(),
                format_metric(entry.metrics.psnr, 4),
                entry.metrics.ssim
            )?;
        }
        Ok(())
    }
}

fn report_rank(method: Method) -> usize {
    match method {
        Method::Noisy => 0,
        Method::Traditional => 1,
        Method::Ai => 2,
    }
}

/// Format with `decimals` places, `inf` for infinite values
pub fn format_metric(value: f64, decimals: usize) -> String {
    if value.is_infinite() && value > 0.0 {
        "inf".to_string()
    } else {
        format!("{:.*}", decimals, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(psnr: f64, ssim: f64) -> MetricPair {
        MetricPair { psnr, ssim }
    }

    #[test]
    fn test_from_metrics_orders_rows() {
        let report = Report::from_metrics([
            (Method::Ai, pair(30.0, 0.9)),
            (Method::Noisy, pair(20.0, 0.5)),
            (Method::Traditional, pair(25.0, 0.7)),
        ])
        .unwrap();

        let order: Vec<Method> = report.entries().iter().map(|e| e.method).collect();
        assert_eq!(order, Method::REPORT_ORDER.to_vec());
        assert_eq!(report.get(Method::Traditional), Some(&pair(25.0, 0.7)));
    }

    #[test]
    fn test_table_format() {
        let report = Report::from_metrics([
            (Method::Noisy, pair(20.123456, 0.512345)),
            (Method::Traditional, pair(f64::INFINITY, 1.0)),
            (Method::Ai, pair(31.5, 0.93)),
        ])
        .unwrap();
        let table = report.to_table();
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("Method"));
        assert!(lines[2].contains("20.1235"));
        assert!(lines[2].contains("0.5123"));
        assert!(lines[3].contains("inf"));
        assert!(lines[3].contains("1.0000"));
        assert!(lines[4].starts_with("AI"));
        assert!(lines.iter().skip(2).all(|l| l.len() == lines[2].len()));
        assert_eq!(format!("{}", report), table);
    }

    #[test]
    fn test_from_metrics_requires_each_method_once() {
        let missing = Report::from_metrics([
            (Method::Noisy, pair(20.0, 0.5)),
            (Method::Ai, pair(30.0, 0.9)),
        ]);
        assert!(matches!(missing, Err(DenoiseError::InvalidParameter(_))));

        let duplicate = Report::from_metrics([
            (Method::Noisy, pair(20.0, 0.5)),
            (Method::Traditional, pair(25.0, 0.7)),
            (Method::Traditional, pair(26.0, 0.8)),
            (Method::Ai, pair(30.0, 0.9)),
        ]);
        assert!(matches!(duplicate, Err(DenoiseError::InvalidParameter(_))));

        assert!(Report::from_metrics(Vec::<(Method, MetricPair)>::new()).is_err());
    }

    #[test]
    fn test_chart_series_annotations() {
        let report = Report::from_metrics([
            (Method::Noisy, pair(f64::INFINITY, 1.0)),
            (Method::Traditional, pair(27.456, 0.876543)),
            (Method::Ai, pair(30.0, 0.9)),
        ])
        .unwrap();

        let psnr = report.psnr_series();
        assert_eq!(psnr[0].value, INFINITE_PSNR_BAR_DB);
        assert_eq!(psnr[0].annotation, "inf");
        assert_eq!(psnr[1].annotation, "27.46");
        assert_eq!(psnr[2].label, "AI");

        let ssim = report.ssim_series();
        assert_eq!(ssim[1].annotation, "0.8765");
        assert_eq!(ssim[0].annotation, "1.0000");
    }
}
