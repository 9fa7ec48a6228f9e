//! Model tool for ferrite-vision.
//!
//!   ferrite-vision scaffold <path> [--size N] [--hidden H]
//!   ferrite-vision inspect  <path>
//!
//! `scaffold` writes an untrained, randomly initialised classifier whose
//! input layer matches an N×N RGB thumbnail and whose softmax output layer
//! matches the default label set.  It lets the web app boot before real
//! weights are available; its predictions are meaningless.

use std::process::ExitCode;

use ferrite_vision::config::{DEFAULT_LABELS, DEFAULT_THUMBNAIL_SIZE};
use ferrite_vision::{ActivationFunction, ImageTensor, InputType, ModelMetadata, Network};

const USAGE: &str = "usage:\n  ferrite-vision scaffold <path> [--size N] [--hidden H]\n  ferrite-vision inspect <path>";

struct ScaffoldArgs {
    path: String,
    size: u32,
    hidden: Option<usize>,
}

fn parse_scaffold(args: &[String]) -> Result<ScaffoldArgs, String> {
    let mut it = args.iter();
    let path = it.next().ok_or("missing <path>")?.clone();
    let mut size = DEFAULT_THUMBNAIL_SIZE;
    let mut hidden = None;
    while let Some(flag) = it.next() {
        let value = it.next().ok_or_else(|| format!("{} needs a value", flag))?;
        match flag.as_str() {
            "--size" => size = value.parse().map_err(|_| format!("bad --size {:?}", value))?,
            "--hidden" => hidden = Some(value.parse().map_err(|_| format!("bad --hidden {:?}", value))?),
            other => return Err(format!("unknown flag {:?}", other)),
        }
    }
    if size == 0 {
        return Err("--size must be positive".into());
    }
    Ok(ScaffoldArgs { path, size, hidden })
}

fn scaffold(args: ScaffoldArgs) -> std::io::Result<()> {
    let inputs = ImageTensor::len_for(args.size);
    let outputs = DEFAULT_LABELS.len();
    let layers = match args.hidden {
        Some(h) if h > 0 => vec![
            (h, inputs, ActivationFunction::ReLU),
            (outputs, h, ActivationFunction::Softmax),
        ],
        _ => vec![(outputs, inputs, ActivationFunction::Softmax)],
    };

    let network = Network::new(layers).with_metadata(ModelMetadata {
        description: Some("untrained scaffold".into()),
        input_type: Some(InputType::ImageRgb { width: args.size, height: args.size }),
        output_labels: Some(DEFAULT_LABELS.iter().map(|s| s.to_string()).collect()),
    });

    if let Some(parent) = std::path::Path::new(&args.path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    network.save_json(&args.path)?;
    log::info!("wrote untrained {}x{} model to {}", args.size, args.size, args.path);
    Ok(())
}

fn inspect(path: &str) -> std::io::Result<()> {
    let network = Network::load_json(path)?;
    println!("model: {}", path);
    for (i, layer) in network.layers.iter().enumerate() {
        println!("  layer {}: {} -> {} ({:?})", i, layer.input_size(), layer.size, layer.activator);
    }
    match network.validate() {
        Ok(()) => println!("  shapes: ok"),
        Err(e) => println!("  shapes: {}", e),
    }
    if let Some(meta) = &network.metadata {
        if let Some(d) = &meta.description { println!("  description: {}", d); }
        if let Some(t) = &meta.input_type { println!("  input: {:?}", t); }
        if let Some(l) = &meta.output_labels { println!("  labels: {}", l.join(", ")); }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = match args.first().map(String::as_str) {
        Some("scaffold") => match parse_scaffold(&args[1..]) {
            Ok(a) => scaffold(a).map_err(|e| e.to_string()),
            Err(e) => Err(format!("{}\n{}", e, USAGE)),
        },
        Some("inspect") => match args.get(1) {
            Some(path) => inspect(path).map_err(|e| e.to_string()),
            None => Err(USAGE.to_owned()),
        },
        _ => Err(USAGE.to_owned()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_flags() {
        let a = parse_scaffold(&strings(&["m.json", "--size", "32", "--hidden", "8"])).unwrap();
        assert_eq!((a.path.as_str(), a.size, a.hidden), ("m.json", 32, Some(8)));
        assert!(parse_scaffold(&strings(&["m.json", "--size"])).is_err());
        assert!(parse_scaffold(&strings(&["m.json", "--depth", "3"])).is_err());
        assert!(parse_scaffold(&[]).is_err());
    }

    #[test]
    fn scaffold_is_loadable_by_the_classifier() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model").join("tiny.json");
        scaffold(ScaffoldArgs { path: path.to_string_lossy().into(), size: 6, hidden: Some(3) }).unwrap();

        let labels: Vec<String> = DEFAULT_LABELS.iter().map(|s| s.to_string()).collect();
        assert!(ferrite_vision::NetworkClassifier::load(&path, 6, &labels).is_ok());
    }
}
