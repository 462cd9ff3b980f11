//! SVG Chart Generator
//!
//! Renders training-history line charts and top-k prediction bar charts as
//! standalone SVG files, suitable for reports without a plotting dependency.

use std::fs;
use std::path::Path;

const CHART_WIDTH: f64 = 800.0;
const CHART_HEIGHT: f64 = 500.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_RIGHT: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 120.0;
const MARGIN_LEFT: f64 = 80.0;

const COLOR_PRIMARY: &str = "#3498db";
const COLOR_SECONDARY: &str = "#2ecc71";
const COLOR_BAR: &str = "#95a5a6";
const COLOR_TRUTH: &str = "#2ecc71";
const COLOR_GRID: &str = "#ecf0f1";
const COLOR_AXIS: &str = "#2c3e50";
const COLOR_TEXT: &str = "#2c3e50";

/// A named series of (x, y) points for line charts
#[derive(Debug, Clone)]
pub struct DataSeries {
    pub name: String,
    pub points: Vec<(f64, f64)>,
    pub color: String,
}

impl DataSeries {
    /// Build a series from per-epoch values (x = epoch number, 1-based)
    pub fn from_epochs(name: &str, values: &[f64], color: &str) -> Self {
        Self {
            name: name.to_string(),
            points: values
                .iter()
                .enumerate()
                .map(|(i, &v)| ((i + 1) as f64, v))
                .collect(),
            color: color.to_string(),
        }
    }
}

/// Render the training history (loss and validation accuracy per epoch)
pub fn training_history_chart(
    train_losses: &[f64],
    val_accuracies: &[f64],
    output_path: &Path,
) -> std::io::Result<()> {
    let series = [
        DataSeries::from_epochs("Train loss", train_losses, COLOR_PRIMARY),
        DataSeries::from_epochs(
            "Val accuracy",
            &val_accuracies.iter().map(|a| a * 100.0).collect::<Vec<_>>(),
            COLOR_SECONDARY,
        ),
    ];
    line_chart("Training History", "Epoch", "Value", &series, output_path)
}

/// Render a line chart SVG
pub fn line_chart(
    title: &str,
    x_label: &str,
    y_label: &str,
    series: &[DataSeries],
    output_path: &Path,
) -> std::io::Result<()> {
    let plot_width = CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;

    let x_max = series
        .iter()
        .flat_map(|s| s.points.iter().map(|p| p.0))
        .fold(1.0_f64, f64::max);
    let y_max = series
        .iter()
        .flat_map(|s| s.points.iter().map(|p| p.1))
        .fold(1.0_f64, f64::max);
    let y_min = 0.0;

    let mut svg = svg_header(title);

    // Horizontal grid and y-axis ticks
    for i in 0..=5 {
        let y = MARGIN_TOP + plot_height - (i as f64 / 5.0) * plot_height;
        let value = y_min + (i as f64 / 5.0) * (y_max - y_min);
        svg.push_str(&format!(
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="1"/>"#,
            MARGIN_LEFT,
            y,
            MARGIN_LEFT + plot_width,
            y,
            COLOR_GRID
        ));
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" text-anchor="end" font-family="Arial, sans-serif" font-size="12" fill="{}">{:.1}</text>"#,
            MARGIN_LEFT - 10.0,
            y + 4.0,
            COLOR_TEXT,
            value
        ));
    }

    svg.push_str(&axes(plot_width, plot_height));
    svg.push_str(&axis_labels(x_label, y_label, plot_width));

    // Polylines
    for s in series {
        let points: Vec<String> = s
            .points
            .iter()
            .map(|&(x, y)| {
                let px = MARGIN_LEFT + (x / x_max) * plot_width;
                let py = MARGIN_TOP + plot_height - ((y - y_min) / (y_max - y_min)) * plot_height;
                format!("{:.1},{:.1}", px, py)
            })
            .collect();
        svg.push_str(&format!(
            r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="2"/>"#,
            points.join(" "),
            s.color
        ));
    }

    // Legend
    for (i, s) in series.iter().enumerate() {
        let y = MARGIN_TOP + 10.0 + i as f64 * 20.0;
        svg.push_str(&format!(
            r#"<rect x="{}" y="{}" width="12" height="12" fill="{}"/>"#,
            MARGIN_LEFT + 10.0,
            y,
            s.color
        ));
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" font-family="Arial, sans-serif" font-size="12" fill="{}">{}</text>"#,
            MARGIN_LEFT + 28.0,
            y + 10.0,
            COLOR_TEXT,
            escape_xml(&s.name)
        ));
    }

    svg.push_str("</svg>");
    fs::write(output_path, svg)
}

/// Render a top-k prediction confidence bar chart.
///
/// Bars are drawn in descending probability order; the bar whose label
/// matches `truth` is highlighted green, everything else stays grey.
pub fn top_k_chart(
    title: &str,
    entries: &[(String, f32)],
    truth: Option<&str>,
    output_path: &Path,
) -> std::io::Result<()> {
    let plot_width = CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;

    let max_prob = entries.iter().map(|e| e.1 as f64).fold(0.01_f64, f64::max);

    let mut svg = svg_header(title);

    for i in 0..=5 {
        let y = MARGIN_TOP + plot_height - (i as f64 / 5.0) * plot_height;
        let value = (i as f64 / 5.0) * max_prob * 100.0;
        svg.push_str(&format!(
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="1"/>"#,
            MARGIN_LEFT,
            y,
            MARGIN_LEFT + plot_width,
            y,
            COLOR_GRID
        ));
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" text-anchor="end" font-family="Arial, sans-serif" font-size="12" fill="{}">{:.0}%</text>"#,
            MARGIN_LEFT - 10.0,
            y + 4.0,
            COLOR_TEXT,
            value
        ));
    }

    svg.push_str(&axes(plot_width, plot_height));

    let n = entries.len().max(1);
    let slot = plot_width / n as f64;
    let bar_width = slot * 0.7;

    for (i, (label, prob)) in entries.iter().enumerate() {
        let height = (*prob as f64 / max_prob) * plot_height;
        let x = MARGIN_LEFT + i as f64 * slot + (slot - bar_width) / 2.0;
        let y = MARGIN_TOP + plot_height - height;

        let color = match truth {
            Some(t) if t == label => COLOR_TRUTH,
            _ => COLOR_BAR,
        };

        svg.push_str(&format!(
            r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}"/>"#,
            x, y, bar_width, height, color
        ));

        // Rotated tick label beneath the bar
        let label_x = x + bar_width / 2.0;
        let label_y = MARGIN_TOP + plot_height + 12.0;
        svg.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" text-anchor="end" font-family="Arial, sans-serif" font-size="11" fill="{}" transform="rotate(-45 {:.1} {:.1})">{}</text>"#,
            label_x,
            label_y,
            COLOR_TEXT,
            label_x,
            label_y,
            escape_xml(label)
        ));
    }

    svg.push_str("</svg>");
    fs::write(output_path, svg)
}

fn svg_header(title: &str) -> String {
    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}" width="{}" height="{}">"#,
        CHART_WIDTH, CHART_HEIGHT, CHART_WIDTH, CHART_HEIGHT
    ));
    svg.push_str(&format!(
        r#"<rect width="{}" height="{}" fill="white"/>"#,
        CHART_WIDTH, CHART_HEIGHT
    ));
    svg.push_str(&format!(
        r#"<text x="{}" y="35" text-anchor="middle" font-family="Arial, sans-serif" font-size="18" font-weight="bold" fill="{}">{}</text>"#,
        CHART_WIDTH / 2.0,
        COLOR_TEXT,
        escape_xml(title)
    ));
    svg
}

fn axes(plot_width: f64, plot_height: f64) -> String {
    format!(
        r#"<line x1="{l}" y1="{b}" x2="{r}" y2="{b}" stroke="{c}" stroke-width="2"/><line x1="{l}" y1="{t}" x2="{l}" y2="{b}" stroke="{c}" stroke-width="2"/>"#,
        l = MARGIN_LEFT,
        r = MARGIN_LEFT + plot_width,
        t = MARGIN_TOP,
        b = MARGIN_TOP + plot_height,
        c = COLOR_AXIS
    )
}

fn axis_labels(x_label: &str, y_label: &str, plot_width: f64) -> String {
    format!(
        r#"<text x="{}" y="{}" text-anchor="middle" font-family="Arial, sans-serif" font-size="14" fill="{c}">{x}</text><text x="20" y="{mid}" text-anchor="middle" font-family="Arial, sans-serif" font-size="14" fill="{c}" transform="rotate(-90 20 {mid})">{y}</text>"#,
        MARGIN_LEFT + plot_width / 2.0,
        CHART_HEIGHT - 20.0,
        c = COLOR_TEXT,
        x = escape_xml(x_label),
        mid = CHART_HEIGHT / 2.0,
        y = escape_xml(y_label),
    )
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
    }

    #[test]
    fn test_top_k_chart_writes_svg() {
        let entries = vec![
            ("beagle".to_string(), 0.7f32),
            ("pug".to_string(), 0.2),
            ("boxer".to_string(), 0.1),
        ];
        let path = std::env::temp_dir().join("dogbreed_topk_test.svg");
        top_k_chart("Top predictions", &entries, Some("pug"), &path).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("beagle"));
        assert!(svg.contains(COLOR_TRUTH));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_training_history_chart_writes_svg() {
        let path = std::env::temp_dir().join("dogbreed_history_test.svg");
        training_history_chart(&[2.0, 1.5, 1.1], &[0.4, 0.55, 0.6], &path).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("polyline"));
        assert!(svg.contains("Val accuracy"));
        let _ = std::fs::remove_file(&path);
    }
}
