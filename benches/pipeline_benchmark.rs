use chrono::{Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rift_forensics::{ForensicAnalyzer, Transaction};

fn txn(id: usize, sender: String, receiver: String, amount: f64, hour: i64) -> Transaction {
    Transaction {
        txn_id: format!("T{id}"),
        sender,
        receiver,
        amount,
        timestamp: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hour),
    }
}

/// A batch mixing cycles, fan-out smurfing, and shell chains so the
/// pipeline exercises every pass.
fn mixed_batch(scale: usize) -> Vec<Transaction> {
    let mut transactions = Vec::new();
    let mut id = 0usize;

    for ring in 0..scale {
        let a = format!("CYC{ring}_A");
        let b = format!("CYC{ring}_B");
        let c = format!("CYC{ring}_C");
        let d = format!("CYC{ring}_D");
        for (from, to) in [(&a, &b), (&b, &c), (&c, &d), (&d, &a)] {
            transactions.push(txn(id, from.clone(), to.clone(), 1000.0, id as i64));
            id += 1;
        }
    }

    for hub in 0..scale {
        let h = format!("HUB{hub}");
        for r in 0..14 {
            transactions.push(txn(id, h.clone(), format!("HUB{hub}_R{r}"), 495.0, (id % 48) as i64));
            id += 1;
        }
    }

    transactions
}

fn pipeline_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("forensic_pipeline");
    for scale in [10usize, 50, 200] {
        let batch = mixed_batch(scale);
        group.throughput(Throughput::Elements(batch.len() as u64));
        group.bench_with_input(BenchmarkId::new("analyze", scale), &batch, |b, batch| {
            let analyzer = ForensicAnalyzer::new();
            b.iter(|| analyzer.analyze(batch).expect("well-formed synthetic batch"));
        });
    }
    group.finish();
}

criterion_group!(benches, pipeline_benchmarks);
criterion_main!(benches);
