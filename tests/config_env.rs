use std::sync::Mutex;

use tempfile::NamedTempFile;

use signcam::config::SignConfig;
use signcam::{ChannelOrder, TensorLayout};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "SIGNCAM_CONFIG",
        "SIGNCAM_MODEL_PATH",
        "SIGNCAM_BACKEND",
        "SIGNCAM_DEVICE",
        "SIGNCAM_THRESHOLD",
        "SIGNCAM_LABELS",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "model": {
            "path": "models/asl.onnx",
            "backend": "tract",
            "input_size": 160,
            "confidence_threshold": 0.7,
            "channel_order": "bgr",
            "layout": "nchw"
        },
        "camera": {
            "device": "/dev/video2",
            "width": 1280,
            "height": 720
        },
        "roi": {
            "anchor_x": 0.25,
            "top": 20,
            "size": 256
        },
        "display": {
            "window_title": "Signs",
            "quit_key": "x",
            "mirror": false
        },
        "max_frames": 500
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("SIGNCAM_CONFIG", file.path());
    std::env::set_var("SIGNCAM_DEVICE", "stub://bench");
    std::env::set_var("SIGNCAM_LABELS", "yes, no ,maybe");

    let cfg = SignConfig::load().expect("load config");

    assert_eq!(cfg.model.path.to_str(), Some("models/asl.onnx"));
    assert_eq!(cfg.model.backend, "tract");
    assert_eq!(cfg.model.input_size, 160);
    assert_eq!(cfg.model.confidence_threshold, 0.7);
    assert_eq!(cfg.model.channel_order, ChannelOrder::Bgr);
    assert_eq!(cfg.model.layout, TensorLayout::Nchw);
    assert_eq!(cfg.model.labels, vec!["yes", "no", "maybe"]);
    assert_eq!(cfg.camera.device, "stub://bench");
    assert_eq!((cfg.camera.width, cfg.camera.height), (1280, 720));
    assert_eq!(cfg.roi.anchor_x, 0.25);
    assert_eq!(cfg.roi.top, 20);
    assert_eq!(cfg.roi.size, 256);
    assert_eq!(cfg.display.window_title, "Signs");
    assert_eq!(cfg.display.quit_key, 'x');
    assert!(!cfg.display.mirror);
    assert_eq!(cfg.max_frames, Some(500));

    clear_env();
}

#[test]
fn defaults_apply_without_config_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = SignConfig::load().expect("load config");
    assert_eq!(cfg.model.path.to_str(), Some("best_asl_model.onnx"));
    assert_eq!(cfg.model.input_size, 224);
    assert_eq!(cfg.model.confidence_threshold, 0.5);
    assert_eq!(cfg.model.labels.len(), 29);
    assert_eq!(cfg.camera.device, "0");
    assert_eq!(cfg.display.window_title, "ASL Detection Real-time");
    assert_eq!(cfg.max_frames, None);
}

#[test]
fn invalid_threshold_env_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("SIGNCAM_THRESHOLD", "high");
    assert!(SignConfig::load().is_err());

    std::env::set_var("SIGNCAM_THRESHOLD", "1.2");
    assert!(SignConfig::load().is_err());

    clear_env();
}

#[test]
fn malformed_config_file_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    std::io::Write::write_all(&mut file, b"{ \"model\": ").expect("write config");
    let err = SignConfig::load_from(Some(file.path())).expect_err("must fail");
    assert!(err.to_string().contains("invalid config file"));
}
