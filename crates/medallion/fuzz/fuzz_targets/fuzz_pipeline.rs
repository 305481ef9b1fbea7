//! Fuzz target for normalization and scoring.
//!
//! Feeds arbitrary cell text through a full pipeline run. Every input must
//! either be rejected as malformed or produce a bounded quality score.

#![no_main]

use libfuzzer_sys::fuzz_target;
use medallion::{MemoryLineage, MemoryStore, Parser, Pipeline};

fuzz_target!(|data: &[u8]| {
    if data.len() > 10_000 {
        return;
    }

    let Ok(content) = std::str::from_utf8(data) else {
        return;
    };

    // Fuzzed text lands in every canonical column.
    let csv = format!(
        "市场\t产品\t区域\t日期\t销售额\n{0}\t{0}\t{0}\t{0}\t{0}\n",
        content.replace(['\t', '\n', '\r'], " ")
    );
    let Ok(raw) = Parser::new().parse_bytes(csv.as_bytes(), b'\t') else {
        return;
    };

    let Ok(pipeline) = Pipeline::new() else {
        return;
    };
    let mut store = MemoryStore::new();
    let mut lineage = MemoryLineage::new();
    if let Ok(summary) = pipeline.run(&mut store, &mut lineage, "fuzz", raw) {
        let score = summary.clean.report.score();
        assert!((0.0..=100.0).contains(&score));
    }
});
