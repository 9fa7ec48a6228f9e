use ferrite_vision::chart::{html_escape, ChartArtifact};
use ferrite_vision::error::AppError;
use ferrite_vision::upload::{is_allowed_file, resolve_stored};

use crate::render::{render_page, Page};
use crate::routes::{self, HttpResponse};
use crate::state::App;
use crate::util::form::{url_decode, url_encode};

/// `GET /predict/{filename}`
pub fn handle(raw_name: &str, app: &App) -> HttpResponse {
    let name = url_decode(raw_name);
    let path = match resolve_stored(&app.config.upload_dir, &name) {
        Some(p) if is_allowed_file(&name, &app.config.allowed_extensions) => p,
        _ => return routes::redirect_with_flash("/", "File not found."),
    };

    let probabilities = match app.predictions.predict_file(&path) {
        Ok(p) => p,
        Err(AppError::NotFound(_)) => {
            return routes::redirect_with_flash("/", &format!("File not found: {}", name));
        }
        Err(e) => {
            log::error!("prediction for {} failed: {}", name, e);
            return routes::server_error();
        }
    };

    let labels = &app.config.labels;
    let chart = match app.chart.render(labels, &probabilities) {
        Ok(c) => c,
        Err(e) => {
            log::error!("chart for {} failed: {}", name, e);
            return routes::server_error();
        }
    };

    let (best, confidence) = top_label(labels, &probabilities);
    log::info!("{} classified as {} ({:.1}%)", name, best, confidence * 100.0);

    let image_url = format!("/images/{}", url_encode(&name));
    routes::html_response(render_page(
        Page::Predict,
        None,
        &result_content(&image_url, best, confidence, &chart),
    ))
}

fn top_label<'a>(labels: &'a [String], probabilities: &[f64]) -> (&'a str, f64) {
    labels.iter()
        .zip(probabilities)
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(l, &p)| (l.as_str(), p))
        .unwrap_or(("", 0.0))
}

fn result_content(image_url: &str, best: &str, confidence: f64, chart: &ChartArtifact) -> String {
    format!(
        r#"<div class="card">
<h1>Prediction</h1>
<div class="result">
  <img src="{url}" alt="uploaded image">
  <div>
    <div class="prediction-hero">{best}</div>
    <p class="hint">Confidence: {conf:.1}%</p>
    {markup}
  </div>
</div>
<p><a class="btn btn-primary" href="/">Classify another image</a></p>
</div>
{script}"#,
        url = html_escape(image_url),
        best = html_escape(best),
        conf = confidence * 100.0,
        markup = chart.markup,
        script = chart.script,
    )
}
