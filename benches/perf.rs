use criterion::{Criterion, criterion_group, criterion_main};
use rust_xlsxwriter::Workbook;
use std::hint::black_box;

use war_games_terminal::loader::extract_events;
use war_games_terminal::team::{Edits, TeamTable};

fn sample_sheet(rows: u32) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "imprevisto").unwrap();
    sheet.write_string(0, 1, "note").unwrap();
    for row in 1..=rows {
        if row % 7 != 0 {
            sheet
                .write_string(row, 0, format!("Event {row}: the river floods the lower town"))
                .unwrap();
        }
        sheet.write_number(row, 1, row as f64).unwrap();
    }
    workbook.save_to_buffer().unwrap()
}

fn bench_extract_events(c: &mut Criterion) {
    let bytes = sample_sheet(1_000);
    c.bench_function("extract_events_1k_rows", |b| {
        b.iter(|| {
            let events = extract_events(black_box(&bytes)).unwrap();
            black_box(events.len());
        })
    });
}

fn bench_apply_edits(c: &mut Criterion) {
    let edits = Edits::from([(0, 90), (3, 45), (7, 0)]);
    c.bench_function("apply_edits_sparse", |b| {
        b.iter(|| {
            let mut table = TeamTable::new();
            table.apply_edits(black_box(&edits)).unwrap();
            black_box(table.has_critical_factor());
        })
    });
}

criterion_group!(benches, bench_extract_events, bench_apply_edits);
criterion_main!(benches);
