extern crate bvr_multibox;

use bvr_multibox::data::ConfigMultibox;
use bvr_multibox::{InferenceProcess, MultiboxPipeline};

#[test]
fn defaults() {
    let config = ConfigMultibox::default();
    assert_eq!(config.sizes, vec![0.75, 0.5, 0.25]);
    assert_eq!(config.ratios, vec![1.0, 2.0, 0.5]);
    assert_eq!(config.iou_threshold, 0.5);
    assert_eq!(config.nms_threshold, 0.5);
    assert_eq!(config.pos_threshold, 0.009999999);
    assert_eq!(config.weights, (10.0, 10.0, 5.0, 5.0));
    assert!(config.names.is_none());
    assert!(config.validate().is_ok());
}

#[test]
fn partial_json_falls_back_to_defaults() {
    let config = ConfigMultibox::from_json_str(r#"{ "sizes": [0.2], "ratios": [1.0], "nms_threshold": 0.3 }"#).unwrap();
    assert_eq!(config.sizes, vec![0.2]);
    assert_eq!(config.ratios, vec![1.0]);
    assert_eq!(config.nms_threshold, 0.3);
    assert_eq!(config.iou_threshold, 0.5);
    assert_eq!(config.weights, (10.0, 10.0, 5.0, 5.0));
}

#[test]
fn json_round_trip() {
    let config = ConfigMultibox::new()
        .with_names(&["dog", "cat"])
        .with_pos_threshold(0.25)
        .with_xform_clip(Some(4.0));

    let json = config.to_json().unwrap();
    assert_eq!(ConfigMultibox::from_json_str(&json).unwrap(), config);
}

#[test]
fn loads_from_file() {
    let path = std::env::temp_dir().join(format!("bvr_multibox_config_{}.json", std::process::id()));
    std::fs::write(&path, r#"{ "sizes": [0.5, 0.25], "names": ["banana"] }"#).unwrap();

    let config = ConfigMultibox::from_json_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(config.sizes, vec![0.5, 0.25]);
    assert_eq!(config.names, Some(vec!["banana".to_string()]));
}

#[test]
fn missing_file_is_an_error() {
    let path = std::env::temp_dir().join("bvr_multibox_config_does_not_exist.json");
    let err = ConfigMultibox::from_json_file(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to read config"));
}

#[test]
fn invalid_values_are_rejected() {
    assert!(ConfigMultibox::new().with_sizes(&[]).validate().is_err());
    assert!(ConfigMultibox::new().with_ratios(&[0.0]).validate().is_err());
    assert!(ConfigMultibox::new().with_nms_threshold(1.5).validate().is_err());
    assert!(ConfigMultibox::new().with_iou_threshold(-0.1).validate().is_err());
    assert!(ConfigMultibox::new().with_weights((10.0, 10.0, 0.0, 5.0)).validate().is_err());
    assert!(ConfigMultibox::from_json_str(r#"{ "pos_threshold": 2.0 }"#).is_err());
    assert!(ConfigMultibox::from_json_str("not json").is_err());

    assert!(MultiboxPipeline::new(ConfigMultibox::new().with_sizes(&[-0.5])).is_err());
}

#[test]
fn box_coder_follows_config() {
    let config = ConfigMultibox::new().with_weights((1.0, 2.0, 3.0, 4.0)).with_xform_clip(Some(2.0));
    let coder = config.box_coder();
    assert_eq!(coder.weights, (1.0, 2.0, 3.0, 4.0));
    assert_eq!(coder.bbox_xform_clip, Some(2.0));
}

#[test]
fn pipeline_keeps_its_config() {
    let config = ConfigMultibox::new().with_sizes(&[0.4]).with_names(&["person"]);
    let pipeline = MultiboxPipeline::new(config.clone()).unwrap();
    assert_eq!(pipeline.config(), &config);
    assert_eq!(pipeline.class_name(0), "person");
    assert_eq!(pipeline.class_name(3), "# 3");
}
