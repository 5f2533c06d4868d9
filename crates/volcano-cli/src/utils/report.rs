use std::fmt::Write;
use volcano::core::diagnostics::Diagnostics;
use volcano::core::scaling::fitter::ScalingRelations;

/// Plain-text table of fitted relations, one adsorbate per line.
pub fn format_relations(relations: &ScalingRelations) -> String {
    let descriptors = relations.descriptors();
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Scaling relations over x = G({}), y = G({})",
        descriptors.x(),
        descriptors.y()
    );
    let _ = writeln!(
        out,
        "  {:<12} {:>7} {:>9} {:>9} {:>9} {:>8}",
        "adsorbate", "x:y", "a", "b", "c", "R²"
    );
    for (adsorbate, params) in relations.params() {
        let (ratio, r_squared) = match relations.records().get(adsorbate) {
            Some(record) => (
                format!("{}:{}", record.ratio.x_percent(), record.ratio.y_percent()),
                format!("{:.4}", record.fit.r_squared),
            ),
            None => ("-".to_string(), "-".to_string()),
        };
        let _ = writeln!(
            out,
            "  {:<12} {:>7} {:>9.4} {:>9.4} {:>9.4} {:>8}",
            adsorbate, ratio, params.a, params.b, params.c, r_squared
        );
    }
    out
}

pub fn format_diagnostics(diagnostics: &Diagnostics) -> String {
    let mut out = String::new();
    for warning in diagnostics.warnings() {
        let _ = writeln!(out, "  ⚠ {}", warning);
    }
    out
}

/// Replaces characters that do not belong in a file name.
pub fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
