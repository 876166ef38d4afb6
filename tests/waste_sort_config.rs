use std::sync::Mutex;

use tempfile::NamedTempFile;

use waste_sort::config::WasteSortConfig;
use waste_sort::{Category, DecodedImage};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "WASTE_SORT_CONFIG",
        "WASTE_SORT_BACKEND",
        "WASTE_SORT_MODEL_PATH",
        "WASTE_SORT_LABELS_PATH",
        "WASTE_SORT_TOP_K",
        "WASTE_SORT_RULES",
    ] {
        std::env::remove_var(key);
    }
}

fn write_config(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp config");
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");
    file
}

#[test]
fn defaults_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = WasteSortConfig::load().expect("load config");

    assert_eq!(cfg.backend.kind, "stub");
    assert_eq!(cfg.backend.input_width, 224);
    assert_eq!(cfg.backend.input_height, 224);
    assert_eq!(cfg.backend.top_k, 5);
    assert!(cfg.backend.apply_softmax);
    assert_eq!(cfg.rules.len(), 3);
    assert_eq!(cfg.rules.lookup("plastic"), Category::CheckLocalGuidelines);
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config(
        r#"{
            "backend": {
                "kind": "stub",
                "input_width": 299,
                "input_height": 299,
                "apply_softmax": false,
                "top_k": 3,
                "stub_predictions": [
                    {"label": "cardboard", "confidence": 0.4},
                    {"label": "Glass", "confidence": 0.9}
                ]
            },
            "rules": {
                "Glass": "recyclable",
                "cardboard": "recyclable"
            }
        }"#,
    );

    std::env::set_var("WASTE_SORT_CONFIG", file.path());
    std::env::set_var("WASTE_SORT_TOP_K", "2");

    let cfg = WasteSortConfig::load().expect("load config");

    assert_eq!(cfg.backend.input_width, 299);
    assert_eq!(cfg.backend.input_height, 299);
    assert!(!cfg.backend.apply_softmax);
    assert_eq!(cfg.backend.top_k, 2);
    assert_eq!(cfg.backend.stub_predictions.len(), 2);
    assert_eq!(cfg.rules.lookup("glass"), Category::Recyclable);
    assert_eq!(cfg.rules.lookup("paper"), Category::Unknown);

    std::env::set_var("WASTE_SORT_RULES", "paper=recyclable");
    let cfg = WasteSortConfig::load().expect("load config with rule override");
    assert_eq!(cfg.rules.len(), 1);
    assert_eq!(cfg.rules.lookup("Paper"), Category::Recyclable);
    assert_eq!(cfg.rules.lookup("glass"), Category::Unknown);

    clear_env();
}

#[test]
fn stub_registry_ranks_canned_predictions() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config(
        r#"{"backend": {"stub_predictions": [
            {"label": "paper", "confidence": 0.2},
            {"label": "metal", "confidence": 0.7}
        ]}}"#,
    );
    let cfg = WasteSortConfig::load_from(Some(file.path())).expect("load config");
    let registry = cfg.backend.build_registry().expect("registry");
    let backend = registry.select(None).expect("default backend");
    assert_eq!(backend.name(), "stub");

    let categorizer = waste_sort::ClassificationCategorizer::new(backend, cfg.rules);
    let result = categorizer
        .classify(&DecodedImage::from_rgb8(1, 1, vec![1, 2, 3]))
        .expect("classify");
    assert_eq!(result.label(), Some("metal"));
    assert_eq!(result.category(), Category::Recyclable);
}

#[test]
fn rejects_invalid_settings() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let zero_top_k = write_config(r#"{"backend": {"top_k": 0}}"#);
    assert!(WasteSortConfig::load_from(Some(zero_top_k.path())).is_err());

    let bad_stub = write_config(
        r#"{"backend": {"stub_predictions": [{"label": "paper", "confidence": 1.5}]}}"#,
    );
    assert!(WasteSortConfig::load_from(Some(bad_stub.path())).is_err());

    let tract_without_model = write_config(r#"{"backend": {"kind": "tract"}}"#);
    let err = WasteSortConfig::load_from(Some(tract_without_model.path())).unwrap_err();
    assert!(err.to_string().contains("model_path"));

    let unknown_kind = write_config(r#"{"backend": {"kind": "coreml"}}"#);
    assert!(WasteSortConfig::load_from(Some(unknown_kind.path())).is_err());

    std::env::set_var("WASTE_SORT_RULES", "paper=compost");
    assert!(WasteSortConfig::load().is_err());
    std::env::set_var("WASTE_SORT_RULES", "");

    std::env::set_var("WASTE_SORT_TOP_K", "many");
    assert!(WasteSortConfig::load().is_err());

    clear_env();
}

#[test]
fn unreadable_config_file_is_reported() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let err = WasteSortConfig::load_from(Some(std::path::Path::new("/nonexistent/waste.json")))
        .unwrap_err();
    assert!(err.to_string().contains("failed to read config file"));

    let malformed = write_config("{ not json");
    let err = WasteSortConfig::load_from(Some(malformed.path())).unwrap_err();
    assert!(err.to_string().contains("invalid config file"));
}
