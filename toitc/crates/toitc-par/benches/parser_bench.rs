//! Benchmarks for the parser.

use std::cell::RefCell;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use toitc_lex::{Scanner, SymbolCanonicalizer};
use toitc_par::Parser;
use toitc_util::diagnostic::NullDiagnostics;
use toitc_util::fs::StdFilesystem;
use toitc_util::source::SourceManager;

fn sample_source() -> String {
    let mut text = String::new();
    text.push_str("import core\n\n");
    for i in 0..50 {
        text.push_str("/** Does the thing. */\n");
        text.push_str(&format!("class C{}:\n", i));
        text.push_str("  field_ := {}\n");
        text.push_str(&format!("  method{} x/int y/int -> int:\n", i));
        text.push_str("    if x > y:\n");
        text.push_str("      return x - y\n");
        text.push_str("    list.do: print \"value=$it\"\n");
        text.push_str("    return x + y * 2\n\n");
    }
    text
}

fn bench_parse_file(c: &mut Criterion) {
    let text = sample_source();
    let mut group = c.benchmark_group("parser");
    group.throughput(Throughput::Bytes(text.len() as u64));
    group.bench_function("parse_unit", |b| {
        b.iter(|| {
            let fs = StdFilesystem::new();
            let mut manager = SourceManager::new(&fs);
            let source = manager.add_virtual_file("///bench.toit", text.as_bytes().to_vec());
            let symbols = RefCell::new(SymbolCanonicalizer::new());
            let diagnostics = NullDiagnostics::new();
            let scanner = Scanner::new(&source, &symbols, &diagnostics);
            let mut parser = Parser::new(&source, scanner, &diagnostics);
            black_box(parser.parse_unit())
        });
    });
    group.finish();
}

criterion_group!(benches, bench_parse_file);
criterion_main!(benches);
