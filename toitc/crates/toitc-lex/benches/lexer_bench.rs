//! Benchmarks for the scanner.

use std::cell::RefCell;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use toitc_lex::{Scanner, SymbolCanonicalizer, Token};
use toitc_util::diagnostic::NullDiagnostics;
use toitc_util::fs::StdFilesystem;
use toitc_util::source::SourceManager;

fn sample_source() -> String {
    let mut text = String::new();
    for i in 0..100 {
        text.push_str(&format!("class C{}:\n", i));
        text.push_str("  field_ := 0\n");
        text.push_str(&format!("  method{} x/int -> int:\n", i));
        text.push_str("    result := x * 2 + 1\n");
        text.push_str("    return result\n\n");
    }
    text
}

fn bench_scan_file(c: &mut Criterion) {
    let text = sample_source();
    let mut group = c.benchmark_group("scanner");
    group.throughput(Throughput::Bytes(text.len() as u64));
    group.bench_function("scan_file", |b| {
        b.iter(|| {
            let fs = StdFilesystem::new();
            let mut manager = SourceManager::new(&fs);
            let source = manager.add_virtual_file("///bench.toit", text.as_bytes().to_vec());
            let symbols = RefCell::new(SymbolCanonicalizer::new());
            let diagnostics = NullDiagnostics::new();
            let mut scanner = Scanner::new(&source, &symbols, &diagnostics);
            let mut count = 0usize;
            loop {
                let state = scanner.next();
                count += 1;
                if state.token() == Token::Eos {
                    break;
                }
            }
            black_box(count)
        });
    });
    group.finish();
}

criterion_group!(benches, bench_scan_file);
criterion_main!(benches);
