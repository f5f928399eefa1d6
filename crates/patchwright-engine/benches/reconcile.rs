use criterion::{black_box, criterion_group, criterion_main, Criterion};
use patchwright_core::{Catalog, PatchValue};
use patchwright_engine::{extract_candidates, ReconcileRequest, Reconciler};

const BUNDLED: &str = include_str!("../../../schemas/minilogue-xd/voice-parameters.json");
const INIT_PROGRAM: &str = include_str!("../../../schemas/minilogue-xd/fixtures/init-program.json");

fn synthetic_reply(noise_lines: usize) -> String {
    let controls = [
        ("filter.cutoff", "300", "continuous"),
        ("filter.resonance", "200", "continuous"),
        ("amp_eg.attack", "650", "continuous"),
        ("amp_eg.release", "700", "continuous"),
        ("lfo.rate", "120", "continuous"),
        ("vco1.wave", "\"saw\"", "enumeration"),
        ("vco2.sync", "false", "boolean"),
    ]
    .iter()
    .map(|(id, value, value_type)| {
        format!(
            r#"{{"id": "{id}", "value": {value}, "valueType": "{value_type}", "explanation": "shape \"the\" {{tone}}", "confidence": "medium"}}"#
        )
    })
    .collect::<Vec<_>>()
    .join(",\n    ");

    let mut reply = String::new();
    for i in 0..noise_lines {
        reply.push_str(&format!("Thinking about step {i}: keep {{braces}} balanced.\n"));
    }
    reply.push_str("```json\n");
    reply.push_str(&format!(
        r#"{{"summary": "Slow pad", "controls": [
    {controls}
], "reasoning": {{"intentSummary": "pad", "soundDesignNotes": ["dark"], "assumptions": []}}}}"#
    ));
    reply.push_str("\n```\nDone.");
    reply
}

fn bench_extract(c: &mut Criterion) {
    let reply = synthetic_reply(200);
    c.bench_function("extract_candidates_noisy", |b| {
        b.iter(|| black_box(extract_candidates(black_box(&reply))));
    });
}

fn bench_reconcile(c: &mut Criterion) {
    let catalog = Catalog::from_json_str(BUNDLED).expect("bundled catalog");
    let reply = synthetic_reply(20);
    let reconciler = Reconciler::new(&catalog);
    c.bench_function("reconcile_fenced_reply", |b| {
        b.iter(|| {
            let suggestion = reconciler.reconcile(black_box(&reply), ReconcileRequest::new("warm pad"));
            black_box(suggestion.is_ok());
        });
    });
}

fn bench_validate_document(c: &mut Criterion) {
    let catalog = Catalog::from_json_str(BUNDLED).expect("bundled catalog");
    let document: PatchValue = serde_json::from_str(INIT_PROGRAM).expect("fixture parses");
    c.bench_function("validate_init_program", |b| {
        b.iter(|| {
            let outcome = catalog.validate_document(black_box(&document));
            black_box(outcome.map(|o| o.is_valid()).unwrap_or(false));
        });
    });
}

criterion_group!(
    reconcile,
    bench_extract,
    bench_reconcile,
    bench_validate_document
);
criterion_main!(reconcile);
