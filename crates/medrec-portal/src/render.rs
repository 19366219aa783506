//! Terminal output helpers for the medrec CLI.

use std::fmt::Write as _;
use std::str::FromStr;

use medrec_core::{Address, ChainRecord};

use crate::view::{ManifestOutcome, RecordView};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown format {other:?} (expected table or json)")),
        }
    }
}

pub fn format_timestamp(secs: i64) -> String {
    chrono::DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "invalid date".to_string())
}

/// Abbreviated address for table cells: first four bytes, last two.
pub fn short_address(address: &Address) -> String {
    let hex = address.to_hex_lower();
    format!("{}...{}", &hex[..6], &hex[38..])
}

pub fn records_table(records: &[ChainRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<6} {:<13} {:<13} {:<24} {:<23} {}",
        "ID", "PATIENT", "DOCTOR", "CID", "CREATED", "STATUS"
    );
    for record in records {
        let cid = if record.cid.len() > 22 {
            format!("{}..", &record.cid[..22])
        } else {
            record.cid.clone()
        };
        let _ = writeln!(
            out,
            "{:<6} {:<13} {:<13} {:<24} {:<23} {:?}",
            record.id,
            short_address(&record.patient),
            short_address(&record.doctor),
            cid,
            format_timestamp(record.created_at),
            record.status,
        );
    }
    out
}

pub fn record_view(view: &RecordView) -> String {
    let mut out = String::new();
    let record = &view.record;
    let _ = writeln!(out, "Record #{}", record.id);
    let _ = writeln!(out, "  Patient: {}", record.patient);
    let _ = writeln!(out, "  Doctor:  {}", record.doctor);
    let _ = writeln!(out, "  CID:     {}", record.cid);
    let _ = writeln!(out, "  Created: {}", format_timestamp(record.created_at));
    let _ = writeln!(out, "  Status:  {:?}", record.status);
    match &view.manifest {
        ManifestOutcome::Loaded(manifest) => {
            let body = serde_json::to_string_pretty(manifest)
                .unwrap_or_else(|_| "<unprintable manifest>".to_string());
            let _ = writeln!(out, "  Payload:\n{body}");
        }
        ManifestOutcome::Unavailable(reason) => {
            let _ = writeln!(out, "  Payload unavailable: {reason}");
        }
    }
    out
}

pub fn doctors_table(doctors: &[Address]) -> String {
    if doctors.is_empty() {
        return "No authorized doctors.\n".to_string();
    }
    let mut out = String::new();
    for (i, doctor) in doctors.iter().enumerate() {
        let _ = writeln!(out, "{:>3}. {doctor}", i + 1);
    }
    out
}
