//! Demonstrates running the forensic pipeline over a small synthetic
//! batch containing a circular-routing ring.

use chrono::{Duration, TimeZone, Utc};
use rift_forensics::{ForensicAnalyzer, Transaction};

fn txn(id: &str, sender: &str, receiver: &str, amount: f64, hour: i64) -> Transaction {
    Transaction {
        txn_id: id.to_string(),
        sender: sender.to_string(),
        receiver: receiver.to_string(),
        amount,
        timestamp: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hour),
    }
}

fn main() {
    rift_forensics::init_tracing();

    let transactions = vec![
        txn("T1", "ACC_A", "ACC_B", 1250.0, 0),
        txn("T2", "ACC_B", "ACC_C", 1250.0, 1),
        txn("T3", "ACC_C", "ACC_D", 1250.0, 2),
        txn("T4", "ACC_D", "ACC_A", 1250.0, 3),
    ];

    let analyzer = ForensicAnalyzer::new();
    match analyzer.analyze(&transactions) {
        Ok(report) => println!("{}", report.to_json_pretty().expect("serializable report")),
        Err(e) => eprintln!("analysis failed: {e}"),
    }
}
