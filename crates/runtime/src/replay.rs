use std::io::{self, Write};

use crate::logging::DecisionLogEntry;

pub const REPLAY_CSV_HEADER: &str =
    "step,instrument,cluster,proposed_size,applied_size,capital,modules\n";

/// Writes decision log entries as CSV. The `modules` column packs each
/// module's factor as `name=factor` pairs joined by `;`.
pub struct ReplayCsvWriter<W: Write> {
    writer: W,
}

impl<W: Write> ReplayCsvWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write_header(&mut self) -> io::Result<()> {
        self.writer.write_all(REPLAY_CSV_HEADER.as_bytes())
    }

    pub fn append_decisions(&mut self, entries: &[DecisionLogEntry]) -> io::Result<()> {
        for entry in entries {
            let modules = entry
                .modules
                .iter()
                .map(|factor| format!("{}={:.6}", factor.module, factor.factor))
                .collect::<Vec<_>>()
                .join(";");
            writeln!(
                self.writer,
                "{},{},{},{:.6},{:.6},{:.2},{}",
                entry.step,
                escape_csv_field(&entry.instrument),
                escape_csv_field(&entry.cluster),
                entry.proposed_size,
                entry.applied_size,
                entry.capital,
                escape_csv_field(&modules),
            )?;
        }
        Ok(())
    }

    /// Flushes and hands back the underlying writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

pub fn decisions_to_csv(entries: &[DecisionLogEntry]) -> io::Result<String> {
    let mut writer = ReplayCsvWriter::new(Vec::new());
    writer.write_header()?;
    writer.append_decisions(entries)?;
    let bytes = writer.finish()?;
    String::from_utf8(bytes).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}

fn escape_csv_field(value: &str) -> String {
    let needs_quotes = value
        .chars()
        .any(|ch| matches!(ch, ',' | '"' | '\n' | '\r'));
    if !needs_quotes {
        return value.to_string();
    }

    let escaped = value.replace('"', "\"\"");
    format!("\"{escaped}\"")
}
