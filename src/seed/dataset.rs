// src/seed/dataset.rs

//! Synthetic binary-classification dataset.
//!
//! Each row has `num_features` values in `[0, 1)` rounded to four decimals,
//! followed by a label that is `1` when the features sum to more than
//! `num_features * 0.5`.
//!
//! Values are derived from BLAKE3 over `(seed, row, column)` instead of a
//! random source, so the same seed always yields the same bytes.

pub const NUM_FEATURES: usize = 3;

/// One feature value for `(row, column)` under `seed`.
fn feature(seed: &str, row: usize, column: usize) -> f64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(seed.as_bytes());
    hasher.update(&(row as u64).to_le_bytes());
    hasher.update(&(column as u64).to_le_bytes());
    let digest = hasher.finalize();

    let mut word = [0u8; 8];
    word.copy_from_slice(&digest.as_bytes()[..8]);
    // Top 53 bits give a uniform double in [0, 1).
    let unit = (u64::from_le_bytes(word) >> 11) as f64 / (1u64 << 53) as f64;
    (unit * 10_000.0).round() / 10_000.0
}

/// Features plus label for one row.
pub fn generate_row(seed: &str, row: usize, num_features: usize) -> (Vec<f64>, u8) {
    let features: Vec<f64> = (0..num_features).map(|c| feature(seed, row, c)).collect();
    let sum: f64 = features.iter().sum();
    let label = if sum > num_features as f64 * 0.5 { 1 } else { 0 };
    (features, label)
}

/// Render `rows` rows as CSV with a `f1,..,fN,label` header and a trailing
/// newline.
pub fn build_csv(seed: &str, rows: usize, num_features: usize) -> String {
    let mut lines = Vec::with_capacity(rows + 1);

    let mut header: Vec<String> = (1..=num_features).map(|i| format!("f{i}")).collect();
    header.push("label".to_string());
    lines.push(header.join(","));

    for row in 0..rows {
        let (features, label) = generate_row(seed, row, num_features);
        let mut cells: Vec<String> = features.iter().map(|f| f.to_string()).collect();
        cells.push(label.to_string());
        lines.push(cells.join(","));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_and_row_count() {
        let csv = build_csv("s", 5, NUM_FEATURES);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "f1,f2,f3,label");
        assert_eq!(lines.len(), 6);
        assert!(csv.ends_with('\n'));
    }

    #[test]
    fn zero_rows_is_header_only() {
        assert_eq!(build_csv("s", 0, 2), "f1,f2,label\n");
    }

    #[test]
    fn features_in_range_and_label_consistent() {
        for row in 0..50 {
            let (features, label) = generate_row("seed", row, NUM_FEATURES);
            assert!(features.iter().all(|f| (0.0..=1.0).contains(f)));
            let sum: f64 = features.iter().sum();
            assert_eq!(label == 1, sum > 1.5);
        }
    }

    #[test]
    fn deterministic_per_seed() {
        assert_eq!(build_csv("a", 20, 3), build_csv("a", 20, 3));
        assert_ne!(build_csv("a", 20, 3), build_csv("b", 20, 3));
    }
}
