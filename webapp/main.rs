/// ferrite-vision web app
///
/// Upload an image, have it center-cropped to the classifier's thumbnail
/// size, and see the class probabilities as a bar chart.  Served by a
/// synchronous tiny_http server.
///
/// Run with:
///   cargo run --bin webapp --release -- [config.json]
/// Then open http://127.0.0.1:7878
///
/// Routes:
///   GET  /                  upload form
///   POST /                  upload (multipart field `image`)
///   GET  /images/{name}     stored thumbnail
///   GET  /predict/{name}    prediction chart

mod state;
mod render;
mod routes;
mod handlers;
mod util;


use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use tiny_http::Server;

use ferrite_vision::{AppConfig, AppError, NetworkClassifier, PredictionService, SvgBarChart};

use state::{App, SharedApp};

fn build_app(config: AppConfig) -> Result<App, AppError> {
    std::fs::create_dir_all(&config.upload_dir)?;

    let classifier = NetworkClassifier::load(&config.model_path, config.thumbnail_size, &config.labels)?;
    let predictions = PredictionService::new(Arc::new(classifier), config.thumbnail_size, config.labels.len());

    Ok(App::new(config, predictions, Box::new(SvgBarChart::default())))
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = match AppConfig::load(config_path.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    log::info!("loading model from {}", config.model_path.display());
    let app: SharedApp = match build_app(config) {
        Ok(a) => Arc::new(a),
        Err(e) => {
            log::error!("{}", e);
            if matches!(e, AppError::ModelLoad { .. }) {
                log::error!("create an untrained model with `ferrite-vision scaffold <path>`");
            }
            return ExitCode::FAILURE;
        }
    };

    let addr = app.config.bind_addr.clone();
    let server = match Server::http(addr.as_str()) {
        Ok(s) => s,
        Err(e) => {
            log::error!("failed to bind {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    println!("╔══════════════════════════════════════════════╗");
    println!("║          ferrite-vision                      ║");
    println!("╠══════════════════════════════════════════════╣");
    println!("║  Open in your browser:                       ║");
    println!("║  http://{:<37}║", addr);
    println!("╚══════════════════════════════════════════════╝");
    log::info!(
        "labels: {}; uploads in {}",
        app.config.labels.join(", "),
        app.config.upload_dir.display()
    );

    // One thread per request; handlers only share the immutable `App`.
    for request in server.incoming_requests() {
        let app = Arc::clone(&app);
        std::thread::spawn(move || {
            routes::serve(request, &app);
        });
    }
    ExitCode::SUCCESS
}
