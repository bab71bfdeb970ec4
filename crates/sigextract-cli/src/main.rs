// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// sigextract — Signature extractor command line.
//
// Entry point. Initialises logging, thresholds the input photo, replays the
// requested erase strokes and crop, and writes a transparent PNG.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Utc;
use clap::Parser;
use sigextract_core::error::Result;
use sigextract_core::human_errors::humanize_error;
use sigextract_core::{EditMode, ExtractorConfig};
use sigextract_raster::{Bitmap, DisplayPoint, SignatureExtractor};
use tracing::{error, info, warn};

/// Turn a photo of a handwritten signature into a transparent PNG.
#[derive(Parser, Debug)]
#[command(name = "sigextract", version)]
#[command(about = "Extract a handwritten signature from a photo as a transparent PNG")]
struct Args {
    /// Photo of the signature (PNG, JPEG, ...)
    input: PathBuf,

    /// Sensitivity percentage; higher keeps only darker strokes
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=100))]
    sensitivity: Option<u8>,

    /// Eraser radius in pixels (10–150)
    #[arg(short = 'r', long)]
    eraser_radius: Option<f64>,

    /// Erase stroke as X,Y points joined by ':' (e.g. 10,10:40,12). Repeatable;
    /// each occurrence is one gesture.
    #[arg(short, long = "erase", value_name = "X,Y[:X,Y...]", value_parser = parse_stroke)]
    erase: Vec<Stroke>,

    /// Crop to X,Y,W,H after erasing
    #[arg(short, long, value_name = "X,Y,W,H", value_parser = parse_crop)]
    crop: Option<CropArg>,

    /// Directory to write the PNG into
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Points of one erase gesture, in bitmap pixels.
#[derive(Debug, Clone, PartialEq)]
struct Stroke(Vec<DisplayPoint>);

#[derive(Debug, Clone, Copy, PartialEq)]
struct CropArg {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

fn parse_numbers(s: &str, expected: usize) -> std::result::Result<Vec<f64>, String> {
    let values = s
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| format!("'{}' is not a number", part.trim()))
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;
    if values.len() != expected {
        return Err(format!("expected {expected} comma-separated numbers, got {}", values.len()));
    }
    Ok(values)
}

fn parse_point(s: &str) -> std::result::Result<DisplayPoint, String> {
    let v = parse_numbers(s, 2)?;
    Ok(DisplayPoint::new(v[0], v[1]))
}

fn parse_stroke(s: &str) -> std::result::Result<Stroke, String> {
    s.split(':').map(parse_point).collect::<std::result::Result<_, _>>().map(Stroke)
}

fn parse_crop(s: &str) -> std::result::Result<CropArg, String> {
    let v = parse_numbers(s, 4)?;
    Ok(CropArg {
        x: v[0],
        y: v[1],
        width: v[2],
        height: v[3],
    })
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(path) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(%err, "extraction failed");
            eprintln!("{}", humanize_error(&err));
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &Args) -> Result<ExtractorConfig> {
    let mut config = ExtractorConfig::load_or_default(args.config.as_deref())?;
    if let Some(percent) = args.sensitivity {
        config.default_sensitivity_percent = percent;
    }
    if let Some(radius) = args.eraser_radius {
        config.eraser_radius = radius;
    }
    Ok(config.validated())
}

fn run(args: &Args) -> Result<PathBuf> {
    let config = load_config(args)?;
    let source = Bitmap::open(&args.input)?;
    let mut extractor = SignatureExtractor::new(source, config)?;
    info!(
        sensitivity = %extractor.sensitivity(),
        ink_ratio = extractor.stats().ink_ratio(),
        "Photo thresholded"
    );

    let session = extractor.session_mut();
    if !args.erase.is_empty() {
        session.set_mode(EditMode::Erase);
        for stroke in &args.erase {
            let Some((first, rest)) = stroke.0.split_first() else {
                continue;
            };
            session.begin_erase(*first);
            for point in rest {
                session.continue_erase(*point);
            }
            session.end_erase();
        }
    }

    if let Some(crop) = args.crop {
        session.set_mode(EditMode::Crop);
        session.begin_crop(DisplayPoint::new(crop.x, crop.y));
        session.update_crop(DisplayPoint::new(crop.x + crop.width, crop.y + crop.height));
        if session.commit_crop().is_none() {
            warn!(?crop, "crop too small; keeping the full image");
        }
    }

    write_output(&extractor, &args.out_dir)
}

fn write_output(extractor: &SignatureExtractor, out_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(out_dir)?;
    extractor.save_to_dir(out_dir, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigextract_core::SigextractError;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["sigextract", "photo.jpg"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults() {
        let a = args(&[]);
        assert_eq!(a.input, PathBuf::from("photo.jpg"));
        assert_eq!(a.sensitivity, None);
        assert!(a.erase.is_empty());
        assert_eq!(a.out_dir, PathBuf::from("."));
    }

    #[test]
    fn parses_strokes_and_crop() {
        let a = args(&["--erase", "10,10:40,12", "-e", "5.5,6", "--crop", "1,2,30,40"]);
        assert_eq!(a.erase.len(), 2);
        assert_eq!(
            a.erase[0],
            Stroke(vec![DisplayPoint::new(10.0, 10.0), DisplayPoint::new(40.0, 12.0)])
        );
        assert_eq!(a.erase[1], Stroke(vec![DisplayPoint::new(5.5, 6.0)]));
        assert_eq!(
            a.crop,
            Some(CropArg {
                x: 1.0,
                y: 2.0,
                width: 30.0,
                height: 40.0
            })
        );
    }

    #[test]
    fn rejects_bad_values() {
        for argv in [
            vec!["sigextract", "p.png", "--sensitivity", "101"],
            vec!["sigextract", "p.png", "--erase", "10"],
            vec!["sigextract", "p.png", "--erase", "a,b"],
            vec!["sigextract", "p.png", "--crop", "1,2,3"],
            vec!["sigextract", "p.png", "--crop", "1,2,3,inf"],
        ] {
            assert!(Args::try_parse_from(argv.iter().copied()).is_err(), "{argv:?} should fail");
        }
    }

    #[test]
    fn flags_override_config() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, r#"{ "default_sensitivity_percent": 40, "eraser_radius": 50.0 }"#)
            .unwrap();

        let config_arg = config_path.to_str().unwrap();
        let from_file = load_config(&args(&["--config", config_arg])).unwrap();
        assert_eq!(from_file.default_sensitivity_percent, 40);
        assert_eq!(from_file.eraser_radius, 50.0);

        let overridden = load_config(&args(&["--config", config_arg, "-s", "5", "-r", "500"])).unwrap();
        assert_eq!(overridden.default_sensitivity_percent, 5);
        assert_eq!(overridden.eraser_radius, 150.0);
    }

    #[test]
    fn end_to_end_erase_and_crop() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("photo.png");
        Bitmap::from_fn(120, 80, |x, y| {
            if x.abs_diff(y) <= 1 {
                [20, 20, 30, 255]
            } else {
                [210, 205, 200, 255]
            }
        })
        .save_png(&input)
        .unwrap();
        let out_dir = dir.path().join("out");

        let a = Args::try_parse_from([
            "sigextract",
            input.to_str().unwrap(),
            "--erase",
            "20,20",
            "--crop",
            "10,10,50,40",
            "--out-dir",
            out_dir.to_str().unwrap(),
        ])
        .unwrap();
        let path = run(&a).unwrap();

        assert!(path.starts_with(&out_dir));
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("firma-extraida-") && name.ends_with(".png"));
        let written = Bitmap::open(&path).unwrap();
        assert_eq!(written.dimensions(), (50, 40));
        // (20, 20) was under the eraser; it is (10, 10) after the crop.
        assert_eq!(written.pixel(10, 10).unwrap()[3], 0);
    }

    #[test]
    fn missing_input_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.png");
        let a = args(&[]);
        let a = Args { input: missing, ..a };
        let err = run(&a).unwrap_err();
        assert!(matches!(err, SigextractError::Decode(_) | SigextractError::Io(_)));
    }
}
