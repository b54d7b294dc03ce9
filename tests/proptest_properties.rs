use docshrink::recompress::is_image_path;
use docshrink::size::format_size;
use proptest::prelude::*;
use std::path::Path;

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

fn split(formatted: &str) -> (&str, &str) {
    let pos = formatted
        .find(|c: char| c.is_ascii_alphabetic())
        .expect("unit suffix");
    formatted.split_at(pos)
}

fn expected_unit(bytes: u64) -> (usize, f64) {
    let mut value = bytes as f64;
    let mut k = 0;
    while value >= 1024.0 && k < UNITS.len() - 1 {
        value /= 1024.0;
        k += 1;
    }
    (k, value)
}

proptest! {
    #[test]
    fn prop_unit_is_largest_below_1024(bytes in any::<u64>()) {
        let formatted = format_size(bytes);
        let (_, unit) = split(&formatted);
        let (k, _) = expected_unit(bytes);
        prop_assert_eq!(unit, UNITS[k]);
    }

    #[test]
    fn prop_value_is_rounded_to_two_places(bytes in 1024u64..(1u64 << 52)) {
        let formatted = format_size(bytes);
        let (number, _) = split(&formatted);
        let parsed: f64 = number.parse().unwrap();
        let (_, exact) = expected_unit(bytes);
        prop_assert!((parsed - exact).abs() <= 0.005 + 1e-9, "{} vs {}", formatted, exact);
        prop_assert!(number.contains('.'));
    }

    #[test]
    fn prop_small_counts_are_exact(bytes in 0u64..1024) {
        prop_assert_eq!(format_size(bytes), format!("{bytes}B"));
    }

    #[test]
    fn prop_only_raster_extensions_match(stem in "[a-z0-9_]{1,12}", ext in "[a-zA-Z]{1,5}") {
        let path = format!("word/media/{stem}.{ext}");
        let expected = matches!(ext.to_ascii_lowercase().as_str(), "jpg" | "jpeg" | "png");
        prop_assert_eq!(is_image_path(Path::new(&path)), expected);
    }
}
