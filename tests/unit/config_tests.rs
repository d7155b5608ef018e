// Options files, merging and resolution

use std::io::Write;
use tempfile::NamedTempFile;
use tilemark::config::{
    DEFAULT_DEGREE, DEFAULT_FILL_STYLE, DEFAULT_FONT, DEFAULT_TEXT, DEFAULT_Z_INDEX,
};
use tilemark::dom::NodeId;
use tilemark::{resolve, WatermarkError, WatermarkOptions};

fn write_yaml(yaml: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file
        .write_all(yaml.as_bytes())
        .expect("Failed to write to temp file");
    temp_file.flush().expect("Failed to flush temp file");
    temp_file
}

#[test]
fn test_can_load_options_from_yaml_file_path() {
    let file = write_yaml(
        r#"
text: "  CONFIDENTIAL  "
font: "bold 14px sans-serif"
fillStyle: "rgba(200, 0, 0, 0.08)"
degree: -30
zIndex: 1000
"#,
    );

    let options = WatermarkOptions::from_file(file.path()).expect("Failed to load options");

    assert_eq!(options.text.as_deref(), Some("  CONFIDENTIAL  "));
    assert_eq!(options.font.as_deref(), Some("bold 14px sans-serif"));
    assert_eq!(options.fill_style.as_deref(), Some("rgba(200, 0, 0, 0.08)"));
    assert_eq!(options.degree, Some(-30.0));
    assert_eq!(options.z_index, Some(1000));
    assert_eq!(options.dom, None);
}

#[test]
fn test_partial_file_resolves_remaining_defaults() {
    let file = write_yaml("degree: 45\n");
    let options = WatermarkOptions::from_file(file.path()).unwrap();
    let config = resolve(&options, NodeId::new(1));

    assert_eq!(config.degree, 45.0);
    assert_eq!(config.text, DEFAULT_TEXT);
    assert_eq!(config.font, DEFAULT_FONT);
    assert_eq!(config.fill_style, DEFAULT_FILL_STYLE);
    assert_eq!(config.z_index, DEFAULT_Z_INDEX);
}

#[test]
fn test_snake_case_keys_are_accepted() {
    let file = write_yaml("fill_style: \"#333\"\nz_index: 5\n");
    let options = WatermarkOptions::from_file(file.path()).unwrap();
    assert_eq!(options.fill_style.as_deref(), Some("#333"));
    assert_eq!(options.z_index, Some(5));
}

#[test]
fn test_returns_error_for_non_existent_file() {
    let result = WatermarkOptions::from_file("/tmp/this_file_definitely_does_not_exist_tilemark.yaml");

    let err = result.unwrap_err();
    assert!(matches!(err, WatermarkError::Config(_)));
    assert!(
        err.to_string().contains("Failed to read options file"),
        "got: {}",
        err
    );
}

#[test]
fn test_returns_error_for_wrong_value_type() {
    let file = write_yaml("zIndex: \"on top\"\n");
    let err = WatermarkOptions::from_file(file.path()).unwrap_err();
    assert!(matches!(err, WatermarkError::Config(_)));
}

#[test]
fn test_file_options_merge_under_overrides() {
    let file = write_yaml("text: from file\nfont: 20px serif\ndegree: 10\n");
    let from_file = WatermarkOptions::from_file(file.path()).unwrap();
    let merged = from_file.merge(WatermarkOptions::new().text("from flags").z_index(0));

    let config = resolve(&merged, NodeId::new(1));
    assert_eq!(config.text, "from flags");
    assert_eq!(config.font, "20px serif");
    assert_eq!(config.degree, 10.0);
    assert_eq!(config.z_index, 0);
}

#[test]
fn test_empty_string_override_falls_back_to_default() {
    let merged = WatermarkOptions::new()
        .text("file text")
        .merge(WatermarkOptions::new().text(""));

    // The empty override wins the merge, then resolves to the default
    assert_eq!(merged.text.as_deref(), Some(""));
    assert_eq!(resolve(&merged, NodeId::new(1)).text, DEFAULT_TEXT);
}

#[test]
fn test_resolved_config_round_trips_through_options() {
    let options = WatermarkOptions::new().degree(0.0).dom(NodeId::new(7));
    let config = resolve(&options, NodeId::new(1));
    let again = resolve(&WatermarkOptions::from(&config), NodeId::new(1));

    assert_eq!(again, config);
    assert_eq!(again.degree, 0.0);
    assert_ne!(again.degree, DEFAULT_DEGREE);
    assert_eq!(again.target, NodeId::new(7));
}

#[test]
fn test_options_serialize_without_unset_fields() {
    let options = WatermarkOptions::new().text("x").degree(-5.0);
    let yaml = serde_yaml::to_string(&options).unwrap();
    assert!(yaml.contains("text: x"));
    assert!(yaml.contains("degree: -5.0"));
    assert!(!yaml.contains("font"));
    assert!(!yaml.contains("dom"));
}
