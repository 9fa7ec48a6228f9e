//! Bar-chart rendering of a prediction vector.
//!
//! The chart is drawn server-side as inline SVG (the markup fragment).  A
//! small script fragment carries the same categories and values as JSON and
//! adds hover read-outs; the chart is complete without it.

use serde::Serialize;

use crate::error::{AppError, Result};

/// Embeddable chart: drop `markup` where the chart goes and `script` after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartArtifact {
    pub script: String,
    pub markup: String,
}

pub trait ChartRenderer: Send + Sync {
    /// `labels` and `values` are index-aligned.
    fn render(&self, labels: &[String], values: &[f64]) -> Result<ChartArtifact>;
}

/// One bar in SVG user units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Vertical bar chart with the y axis fixed to [0, 1] and category labels
/// rotated 90°.
#[derive(Debug, Clone)]
pub struct SvgBarChart {
    pub width: f64,
    pub height: f64,
    pub element_id: String,
}

impl Default for SvgBarChart {
    fn default() -> Self {
        SvgBarChart { width: 400.0, height: 300.0, element_id: "prediction-chart".into() }
    }
}

const PAD_L: f64 = 44.0;
const PAD_R: f64 = 12.0;
const PAD_T: f64 = 12.0;
/// Room for the rotated category labels.
const PAD_B: f64 = 96.0;
const BAR_FILL: f64 = 0.8;

const BAR_COLOR: &str = "#1e40af";
const GRID_COLOR: &str = "#f0f2f5";
const AXIS_COLOR: &str = "#999";
const TEXT_COLOR: &str = "#333";

#[derive(Serialize)]
struct ChartData<'a> {
    categories: &'a [String],
    values: &'a [f64],
}

impl SvgBarChart {
    fn plot_width(&self) -> f64 {
        self.width - PAD_L - PAD_R
    }

    fn plot_height(&self) -> f64 {
        self.height - PAD_T - PAD_B
    }

    fn baseline(&self) -> f64 {
        PAD_T + self.plot_height()
    }

    /// Bar rectangles, in category order.  Values are clamped to [0, 1].
    pub fn bars(&self, values: &[f64]) -> Vec<Bar> {
        let slot = self.plot_width() / values.len().max(1) as f64;
        values.iter().enumerate().map(|(i, &v)| {
            let height = v.clamp(0.0, 1.0) * self.plot_height();
            Bar {
                x: PAD_L + slot * i as f64 + slot * (1.0 - BAR_FILL) / 2.0,
                y: self.baseline() - height,
                width: slot * BAR_FILL,
                height,
            }
        }).collect()
    }

    fn y_axis(&self) -> String {
        (0..=4).map(|g| {
            let frac = g as f64 / 4.0;
            let y = self.baseline() - frac * self.plot_height();
            format!(
                "<line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"{}\" stroke-width=\"1\"/>\n\
                 <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\" fill=\"{}\" font-size=\"10\">{:.2}</text>",
                PAD_L, y, self.width - PAD_R, y, GRID_COLOR,
                PAD_L - 4.0, y + 3.5, AXIS_COLOR, frac
            )
        }).collect::<Vec<_>>().join("\n")
    }

    fn svg(&self, labels: &[String], values: &[f64]) -> String {
        let bars = self.bars(values);

        let rects: String = bars.iter().zip(labels.iter().zip(values)).map(|(b, (label, v))| {
            format!(
                "<rect class=\"chart-bar\" data-label=\"{}\" data-value=\"{:.4}\" x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{}\"><title>{}: {:.1}%</title></rect>",
                html_escape(label), v, b.x, b.y, b.width, b.height, BAR_COLOR,
                html_escape(label), v * 100.0
            )
        }).collect::<Vec<_>>().join("\n");

        // Labels hang below the axis, rotated to read bottom-to-top.
        let ticks: String = bars.iter().zip(labels).map(|(b, label)| {
            let x = b.x + b.width / 2.0;
            let y = self.baseline() + 6.0;
            format!(
                "<text x=\"{:.1}\" y=\"{:.1}\" transform=\"rotate(-90 {:.1} {:.1})\" text-anchor=\"end\" dominant-baseline=\"middle\" fill=\"{}\" font-size=\"11\">{}</text>",
                x, y, x, y, TEXT_COLOR, html_escape(label)
            )
        }).collect::<Vec<_>>().join("\n");

        format!(
            "<svg class=\"chart-svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" xmlns=\"http://www.w3.org/2000/svg\">\n\
             {grid}\n\
             <line x1=\"{l:.1}\" y1=\"{base:.1}\" x2=\"{r:.1}\" y2=\"{base:.1}\" stroke=\"{axis}\" stroke-width=\"1\"/>\n\
             {rects}\n\
             {ticks}\n\
             </svg>",
            w = self.width, h = self.height,
            grid = self.y_axis(),
            l = PAD_L, r = self.width - PAD_R, base = self.baseline(), axis = AXIS_COLOR,
            rects = rects, ticks = ticks,
        )
    }

    fn script(&self, labels: &[String], values: &[f64]) -> Result<String> {
        let data = serde_json::to_string(&ChartData { categories: labels, values })
            .map_err(|e| AppError::Render(e.to_string()))?;
        let id = serde_json::to_string(&self.element_id)
            .map_err(|e| AppError::Render(e.to_string()))?;
        Ok(format!(
            r#"<script>
(function () {{
  var data = {data};
  var root = document.getElementById({id});
  if (!root) {{ return; }}
  var readout = root.querySelector(".chart-readout");
  root.querySelectorAll(".chart-bar").forEach(function (bar, i) {{
    bar.addEventListener("mouseenter", function () {{
      readout.textContent = data.categories[i] + ": " + (data.values[i] * 100).toFixed(1) + "%";
    }});
    bar.addEventListener("mouseleave", function () {{ readout.textContent = ""; }});
  }});
}})();
</script>"#,
            // A label containing "</script>" must not end the element early.
            data = data.replace("</", "<\\/"),
            id = id.replace("</", "<\\/"),
        ))
    }
}

impl ChartRenderer for SvgBarChart {
    fn render(&self, labels: &[String], values: &[f64]) -> Result<ChartArtifact> {
        if labels.len() != values.len() {
            return Err(AppError::Render(format!(
                "{} values for {} labels",
                values.len(),
                labels.len()
            )));
        }
        let markup = format!(
            "<div id=\"{id}\" class=\"chart\">\n{svg}\n<div class=\"chart-readout\"></div>\n</div>",
            id = html_escape(&self.element_id),
            svg = self.svg(labels, values),
        );
        Ok(ChartArtifact { script: self.script(labels, values)?, markup })
    }
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
     .replace('<', "&lt;")
     .replace('>', "&gt;")
     .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pokemon() -> Vec<String> {
        crate::config::DEFAULT_LABELS.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn chart_carries_every_label_in_order() {
        let labels = pokemon();
        let art = SvgBarChart::default().render(&labels, &[0.7, 0.1, 0.1, 0.1]).unwrap();

        let mut last = 0;
        for label in &labels {
            let pos = art.markup[last..].find(&format!("data-label=\"{}\"", label)).unwrap();
            last += pos;
            assert!(art.script.contains(&format!("\"{}\"", label)));
        }
        assert!(art.script.contains("[0.7,0.1,0.1,0.1]"));
        assert!(art.markup.contains("rotate(-90"));
    }

    #[test]
    fn first_label_gets_the_tallest_bar() {
        let chart = SvgBarChart::default();
        let bars = chart.bars(&[0.7, 0.1, 0.1, 0.1]);
        assert_eq!(bars.len(), 4);
        assert!(bars[1..].iter().all(|b| bars[0].height > b.height));
        // Bars share a baseline.
        for b in &bars {
            assert!((b.y + b.height - chart.baseline()).abs() < 1e-9);
        }
    }

    #[test]
    fn bars_are_proportional_and_clamped() {
        let chart = SvgBarChart::default();
        let bars = chart.bars(&[1.0, 0.5, 1.7, -0.2]);
        assert!((bars[0].height - chart.plot_height()).abs() < 1e-9);
        assert!((bars[1].height * 2.0 - bars[0].height).abs() < 1e-9);
        assert_eq!(bars[2].height, bars[0].height);
        assert_eq!(bars[3].height, 0.0);
    }

    #[test]
    fn rendering_is_deterministic() {
        let chart = SvgBarChart::default();
        let a = chart.render(&pokemon(), &[0.25; 4]).unwrap();
        let b = chart.render(&pokemon(), &[0.25; 4]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn hostile_labels_are_escaped() {
        let labels = vec!["<b>x</b>".to_string(), "</script><script>alert(1)".to_string()];
        let art = SvgBarChart::default().render(&labels, &[0.5, 0.5]).unwrap();
        assert!(!art.markup.contains("<b>x</b>"));
        assert_eq!(art.script.matches("</script>").count(), 1);
    }

    #[test]
    fn length_mismatch_is_an_error() {
        assert!(SvgBarChart::default().render(&pokemon(), &[1.0]).is_err());
    }
}
