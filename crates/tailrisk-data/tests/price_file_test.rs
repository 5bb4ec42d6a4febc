//! Integration tests for loading price files into return series.

use approx::assert_abs_diff_eq;
use rstest::rstest;
use std::io::Write;
use tailrisk_data::{DataError, PriceFile};

fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
    let file_name = format!("tailrisk-data-{}-{}.json", name, std::process::id());
    let path = std::env::temp_dir().join(file_name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

#[test]
fn test_load_from_disk() {
    let path = write_temp(
        "load",
        r#"{ "instruments": { "AAA": [
            { "date": "2024-03-01", "price": 10.0 },
            { "date": "2024-03-04", "price": 11.0 },
            { "date": "2024-03-05", "price": 10.0 }
        ] } }"#,
    );

    let file = PriceFile::from_path(&path).unwrap();
    let series = file.series("AAA").unwrap();
    std::fs::remove_file(&path).ok();

    let values = series.values();
    assert_eq!(values.len(), 2);
    // Up then back down to the starting price nets to zero in log space
    assert_abs_diff_eq!(values[0] + values[1], 0.0, epsilon = 1e-12);
}

#[test]
fn test_missing_file() {
    let result = PriceFile::from_path("/definitely/not/here.json");
    assert!(matches!(result, Err(DataError::Io(_))));
}

#[rstest]
#[case(0.0)]
#[case(-5.0)]
fn test_non_positive_price_yields_non_finite_return(#[case] bad_price: f64) {
    let json = format!(
        r#"{{ "instruments": {{ "AAA": [
            {{ "date": "2024-03-01", "price": 10.0 }},
            {{ "date": "2024-03-04", "price": {bad_price} }}
        ] }} }}"#
    );
    let file = PriceFile::from_json_str(&json).unwrap();
    let series = file.series("AAA").unwrap();
    assert!(!series.values()[0].is_finite());
}
