use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sheetcast_pdf::detector::TableDetector;
use sheetcast_pdf::word::average_char_width;
use sheetcast_pdf::{LayoutEngine, PositionedWord};

/// A statement-like page: `rows` lines of date, payee (two words) and amount.
fn statement_page(rows: usize) -> Vec<PositionedWord> {
    let mut words = Vec::with_capacity(rows * 4);
    for row in 0..rows {
        let top = 40.0 + row as f64 * 14.0;
        let bottom = top + 10.0;
        words.push(PositionedWord::new("2023-01-15", 20.0, top, 100.0, bottom));
        words.push(PositionedWord::new("Coffee", 150.0, top, 198.0, bottom));
        words.push(PositionedWord::new("Shop", 201.0, top, 233.0, bottom));
        words.push(PositionedWord::new("4.50", 400.0, top, 432.0, bottom));
    }
    words
}

fn statement_text(rows: usize) -> String {
    let mut text = String::from("Date        Payee          Amount\n");
    for _ in 0..rows {
        text.push_str("2023-01-15  Coffee Shop    4.50\n");
    }
    text
}

fn bench_reconstruct(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconstruct");
    let engine = LayoutEngine::default();

    for rows in [10, 100, 1000].iter() {
        let words = statement_page(*rows);
        group.bench_with_input(BenchmarkId::new("statement", rows), rows, |b, _| {
            b.iter(|| engine.reconstruct(black_box(&words)))
        });
    }

    group.finish();
}

fn bench_pipeline_stages(c: &mut Criterion) {
    let mut group = c.benchmark_group("stages");
    let engine = LayoutEngine::default();
    let words = statement_page(200);
    let avg = average_char_width(&words);
    let lines = engine.segment_lines(&words);
    let merged: Vec<_> = lines.iter().map(|line| engine.merge_line(line, avg)).collect();
    let columns = engine.detect_columns(merged.iter().flatten(), avg);

    group.bench_function("segment_lines", |b| {
        b.iter(|| engine.segment_lines(black_box(&words)))
    });

    group.bench_function("merge_lines", |b| {
        b.iter(|| {
            lines
                .iter()
                .map(|line| engine.merge_line(black_box(line), avg))
                .count()
        })
    });

    group.bench_function("detect_columns", |b| {
        b.iter(|| engine.detect_columns(black_box(merged.iter().flatten()), avg))
    });

    group.bench_function("assemble_grid", |b| {
        b.iter(|| engine.assemble_grid(black_box(&merged), black_box(&columns), avg))
    });

    group.finish();
}

fn bench_text_gap_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("text_gap");
    let detector = TableDetector::default();

    for rows in [10, 100, 1000].iter() {
        let text = statement_text(*rows);
        group.bench_with_input(BenchmarkId::new("detect_tables", rows), rows, |b, _| {
            b.iter(|| detector.detect_tables(black_box(&text)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_reconstruct,
    bench_pipeline_stages,
    bench_text_gap_detection
);
criterion_main!(benches);
