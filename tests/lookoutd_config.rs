use std::sync::Mutex;
use std::time::Duration;

use tempfile::NamedTempFile;

use lookout::config::LookoutConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "LOOKOUT_CONFIG",
        "LOOKOUT_DEVICE",
        "LOOKOUT_TICK_MS",
        "LOOKOUT_BACKEND",
        "LOOKOUT_MODEL_PATH",
        "LOOKOUT_CYCLE_DELAY_MS",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn defaults_apply_without_a_config_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = LookoutConfig::load().expect("load config");

    assert_eq!(cfg.capture.device, "stub://cam0");
    assert_eq!(cfg.capture.width, 640);
    assert_eq!(cfg.capture.height, 480);
    assert_eq!(cfg.capture.tick_interval, Duration::from_millis(50));
    assert_eq!(cfg.detector.backend, "stub");
    assert_eq!(cfg.detector.cycle_delay, Duration::from_millis(100));

    clear_env();
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let toml = r#"
        device = "/dev/video1"

        [capture]
        tick_interval_ms = 40
        width = 800
        height = 600

        [detector]
        backend = "stub"
        cycle_delay_ms = 250
        confidence_threshold = 0.6
    "#;
    std::io::Write::write_all(&mut file, toml.as_bytes()).expect("write config");

    std::env::set_var("LOOKOUT_CONFIG", file.path());
    std::env::set_var("LOOKOUT_DEVICE", "stub://overridden");
    std::env::set_var("LOOKOUT_TICK_MS", "25");

    let cfg = LookoutConfig::load().expect("load config");

    // Env wins over file.
    assert_eq!(cfg.capture.device, "stub://overridden");
    assert_eq!(cfg.capture.tick_interval, Duration::from_millis(25));
    // File wins over defaults.
    assert_eq!(cfg.capture.width, 800);
    assert_eq!(cfg.capture.height, 600);
    assert_eq!(cfg.detector.cycle_delay, Duration::from_millis(250));
    assert!((cfg.detector.confidence_threshold - 0.6).abs() < f32::EPSILON);

    clear_env();
}

#[test]
fn rejects_invalid_configuration() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let toml = r#"
        [capture]
        width = 0
    "#;
    std::io::Write::write_all(&mut file, toml.as_bytes()).expect("write config");
    assert!(LookoutConfig::load_with_path(Some(file.path())).is_err());

    // Tract backend requires a model path.
    std::env::set_var("LOOKOUT_BACKEND", "tract");
    assert!(LookoutConfig::load().is_err());
    std::env::set_var("LOOKOUT_MODEL_PATH", "/models/det.onnx");
    let cfg = LookoutConfig::load().expect("load config");
    assert_eq!(cfg.detector.backend, "tract");

    // Unknown backends are rejected.
    std::env::set_var("LOOKOUT_BACKEND", "cloud");
    assert!(LookoutConfig::load().is_err());

    clear_env();
}
