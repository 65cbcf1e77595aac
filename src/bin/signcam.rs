//! signcam - live hand-sign classification from a camera feed
//!
//! Loads the classifier, opens the camera and the window, then runs the
//! capture/display loop until 'q' is pressed or the stream ends. Start-up failures
//! are reported on stderr; the process exits normally either way.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use signcam::ui::{Ui, UiMode};
use signcam::{load_classifier, open_display, open_source, FrameSource, Session, SignConfig};

#[derive(Parser, Debug)]
#[command(name = "signcam", version, about = "Live hand-sign classification from a camera feed")]
struct Args {
    /// JSON config file (overrides SIGNCAM_CONFIG).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// ONNX model path.
    #[arg(long, value_name = "PATH")]
    model: Option<PathBuf>,
    /// Classifier backend (tract|stub).
    #[arg(long)]
    backend: Option<String>,
    /// Camera index, V4L2 device node or stub://<name>[?frames=N].
    #[arg(long)]
    device: Option<String>,
    /// Confidence cutoff; predictions at or below it show as uncertain.
    #[arg(long)]
    threshold: Option<f32>,
    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<u64>,
    /// Log decisions instead of opening a window.
    #[arg(long)]
    headless: bool,
    /// Do not mirror frames.
    #[arg(long)]
    no_mirror: bool,
    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(err) = run(args) {
        log::error!("{:#}", err);
    }
    log::info!("signcam finished");
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = interrupted.clone();
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
        .context("error setting Ctrl-C handler")?;

    let ui = Ui::new(UiMode::parse(Some(&args.ui)), std::io::stderr().is_terminal());

    let config = {
        let stage = ui.stage("load configuration");
        match load_config(&args) {
            Ok(config) => config,
            Err(err) => {
                stage.fail();
                return Err(err);
            }
        }
    };

    let classifier = {
        let stage = ui.stage("load classifier");
        match load_classifier(&config.model) {
            Ok(classifier) => classifier,
            Err(err) => {
                stage.fail();
                return Err(err.context("classifier unavailable"));
            }
        }
    };

    let source = {
        let stage = ui.stage("open camera");
        match open_source(&config.camera) {
            Ok(source) => source,
            Err(err) => {
                stage.fail();
                return Err(err.context("camera unavailable"));
            }
        }
    };

    let display = {
        let stage = ui.stage("open display");
        match open_display(&config.display, args.headless) {
            Ok(display) => display,
            Err(err) => {
                stage.fail();
                let mut source = source;
                source.release();
                return Err(err.context("display unavailable"));
            }
        }
    };
    if config.display.mirror {
        log::info!("mirroring frames horizontally");
    }
    log::info!("place your hand inside the green box");

    let mut session =
        Session::new(&config, source, classifier, display).with_interrupt(interrupted);
    session.run().context("session aborted")?;
    Ok(())
}

fn load_config(args: &Args) -> Result<SignConfig> {
    let mut config = match &args.config {
        Some(path) => SignConfig::load_from(Some(path.as_path()))?,
        None => SignConfig::load()?,
    };
    if let Some(model) = &args.model {
        config.model.path = model.clone();
    }
    if let Some(backend) = &args.backend {
        config.model.backend = backend.to_lowercase();
    }
    if let Some(device) = &args.device {
        config.camera.device = device.clone();
    }
    if let Some(threshold) = args.threshold {
        config.model.confidence_threshold = threshold;
    }
    if args.max_frames.is_some() {
        config.max_frames = args.max_frames;
    }
    if args.no_mirror {
        config.display.mirror = false;
    }
    config.validate()?;
    Ok(config)
}
