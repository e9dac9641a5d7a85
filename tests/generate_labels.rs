use std::path::Path;

use image::GenericImageView;
use tempfile::TempDir;

use labelgen::{
    BarcodeDecoder, Error, LabelConfig, LabelGenerator, OrderLabel, QrDecoder, Targets,
};

fn generator_in(dir: &Path) -> LabelGenerator {
    let mut config = LabelConfig::default();
    config.output.dir = dir.to_path_buf();
    LabelGenerator::new(config).expect("default config is valid")
}

fn decode_qr(path: &Path) -> String {
    let img = image::open(path).expect("open qr image");
    let payload = QrDecoder::new().decode(&img).expect("decode qr");
    payload.as_str().expect("utf-8 payload").to_string()
}

fn decode_barcode(path: &Path) -> String {
    let img = image::open(path).expect("open barcode image");
    BarcodeDecoder::new().decode(&img).expect("decode barcode")
}

#[tokio::test]
async fn default_order_round_trips_through_both_symbologies() {
    let dir = TempDir::new().expect("temp dir");
    let generator = generator_in(dir.path());

    let set = generator.generate().await.expect("generate labels");

    let qr_path = dir.path().join("qr.png");
    let barcode_path = dir.path().join("barcode.png");
    assert_eq!(set.qr.as_ref().map(|a| a.path.clone()), Some(qr_path.clone()));
    assert_eq!(
        set.barcode.as_ref().map(|a| a.path.clone()),
        Some(barcode_path.clone())
    );

    assert_eq!(
        decode_qr(&qr_path),
        "https://www.thednalabstore.com/order/ORD-2025-001"
    );
    assert_eq!(decode_barcode(&barcode_path), "ORD-2025-001|TS-001");

    let img = image::open(&barcode_path).expect("open barcode");
    let (width, height) = img.dimensions();
    assert_eq!(Some(width), set.barcode.as_ref().map(|a| a.width));
    assert_eq!(Some(height), set.barcode.as_ref().map(|a| a.height));
}

#[tokio::test]
async fn rerun_overwrites_with_identical_payloads() {
    let dir = TempDir::new().expect("temp dir");
    let generator = generator_in(dir.path());

    generator.generate().await.expect("first run");
    let first_qr = decode_qr(&dir.path().join("qr.png"));
    let first_barcode = decode_barcode(&dir.path().join("barcode.png"));

    generator.generate().await.expect("second run");
    assert_eq!(decode_qr(&dir.path().join("qr.png")), first_qr);
    assert_eq!(decode_barcode(&dir.path().join("barcode.png")), first_barcode);

    let entries = std::fs::read_dir(dir.path()).expect("list dir").count();
    assert_eq!(entries, 2, "only qr.png and barcode.png should remain");
}

#[tokio::test]
async fn unsupported_barcode_payload_fails_without_output() {
    let dir = TempDir::new().expect("temp dir");
    let generator = generator_in(dir.path());

    let result = generator.generate_barcode("ORD-2025-001|TS\u{2013}001").await;

    match result {
        Err(Error::UnsupportedCharacter { ch, position }) => {
            assert_eq!(ch, '\u{2013}');
            assert_eq!(position, 15);
        }
        other => panic!("expected unsupported character, got {other:?}"),
    }
    assert!(!dir.path().join("barcode.png").exists());
}

#[tokio::test]
async fn unwritable_destination_reports_io_error() {
    let dir = TempDir::new().expect("temp dir");
    // A regular file where the output directory should be
    let blocker = dir.path().join("labels");
    std::fs::write(&blocker, b"not a directory").expect("write blocker");

    let mut config = LabelConfig::default();
    config.output.dir = blocker.clone();
    let generator = LabelGenerator::new(config).expect("config");

    let result = generator.generate_qr("https://example.com/order/1").await;
    assert!(matches!(result, Err(Error::Io(_))), "got {result:?}");
    assert_eq!(std::fs::read(&blocker).expect("blocker intact"), b"not a directory");
}

#[tokio::test]
async fn orders_named_by_id_do_not_collide() {
    let dir = TempDir::new().expect("temp dir");
    let mut config = LabelConfig::default();
    config.output.dir = dir.path().to_path_buf();
    config.output.name_by_order = true;
    let generator = LabelGenerator::new(config).expect("config");

    for (order_id, sku) in [("ORD-2025-001", "TS-001"), ("ORD-2025-002", "TS-002")] {
        let order = OrderLabel::new(order_id, sku).expect("order");
        let set = generator
            .generate_order(&order, Targets::default())
            .await
            .expect("generate");
        for artifact in set.artifacts() {
            generator.verify(artifact).await.expect("verify");
        }
    }

    assert_eq!(
        decode_barcode(&dir.path().join("barcode-ORD-2025-002.png")),
        "ORD-2025-002|TS-002"
    );
    assert_eq!(
        decode_qr(&dir.path().join("qr-ORD-2025-001.png")),
        "https://www.thednalabstore.com/order/ORD-2025-001"
    );
}

#[tokio::test]
async fn control_characters_and_long_payloads_round_trip() {
    let dir = TempDir::new().expect("temp dir");
    let generator = generator_in(dir.path());

    let tabbed = "ORD-2025-001\tTS-001";
    let artifact = generator.generate_barcode(tabbed).await.expect("tabbed payload");
    assert_eq!(decode_barcode(&artifact.path), tabbed);
    assert_eq!(generator.verify(&artifact).await.expect("verify"), tabbed);

    let long = format!("ORD-2025-001|{}", "TS-001-".repeat(10));
    assert!(long.len() > 80);
    let artifact = generator.generate_barcode(&long).await.expect("long payload");
    assert_eq!(decode_barcode(&artifact.path), long);
}

#[tokio::test]
async fn configured_font_prints_payload_under_the_bars() {
    let dir = TempDir::new().expect("temp dir");
    let plain = generator_in(dir.path());

    let mut config = LabelConfig::default();
    config.output.dir = dir.path().join("labelled");
    config.barcode.font = Some(
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSans.ttf"),
    );
    let labelled = LabelGenerator::new(config).expect("font config");

    let without = plain
        .generate_barcode("ORD-2025-001|TS-001")
        .await
        .expect("plain barcode");
    let with = labelled
        .generate_barcode("ORD-2025-001|TS-001")
        .await
        .expect("labelled barcode");

    assert_eq!(with.width, without.width);
    assert!(with.height > without.height);
    assert_eq!(decode_barcode(&with.path), "ORD-2025-001|TS-001");
}
