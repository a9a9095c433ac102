//! Output sinks for run reports

use anyhow::{Context, Result};
use std::fs::{create_dir_all, rename, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;
use xema_core::{RunReport, Sink};

/// Latest run, overwritten every run
pub const SNAPSHOT_FILE: &str = "resum_periode.json";
/// Daily summaries of the latest run
pub const DAILY_FILE: &str = "resum_diari.json";
/// One line per output record, appended across runs
pub const HISTORY_FILE: &str = "records.jsonl";

/// Writes run reports under a directory
///
/// The snapshot is written to a temporary file and renamed into place, so
/// readers never see a half-written report.
pub struct FsSink {
    dir: PathBuf,
}

impl FsSink {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        create_dir_all(&dir).with_context(|| format!("creating output dir {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn replace(&self, name: &str, contents: &[u8]) -> Result<()> {
        let target = self.dir.join(name);
        let tmp = self.dir.join(format!(".{name}.tmp"));
        std::fs::write(&tmp, contents).with_context(|| format!("writing {}", tmp.display()))?;
        rename(&tmp, &target).with_context(|| format!("replacing {}", target.display()))?;
        Ok(())
    }

    fn append_history(&self, report: &RunReport) -> Result<()> {
        let path = self.dir.join(HISTORY_FILE);
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening {}", path.display()))?;
        for record in &report.records {
            let line = serde_json::to_string(record)?;
            f.write_all(line.as_bytes())?;
            f.write_all(b"\n")?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Sink for FsSink {
    async fn emit(&mut self, report: &RunReport) -> Result<()> {
        let snapshot = serde_json::to_vec_pretty(report)?;
        self.replace(SNAPSHOT_FILE, &snapshot)?;
        if !report.daily_summaries.is_empty() {
            let daily = serde_json::to_vec_pretty(&report.daily_summaries)?;
            self.replace(DAILY_FILE, &daily)?;
        }
        self.append_history(report)?;
        debug!(dir = %self.dir.display(), records = report.records.len(), "run report written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use xema_core::{OutputRecord, RecordStatus, ResolverSettings};

    fn report() -> RunReport {
        let at = Utc.with_ymd_and_hms(2026, 1, 31, 7, 0, 0).unwrap();
        let mut ok = OutputRecord::bare("XJ", "Girona", RecordStatus::Ok, at);
        ok.readings.insert("TM".into(), "5.2 °C".into());
        let missing = OutputRecord::bare("D5", "Fabra", RecordStatus::NotFound, at);
        RunReport::new(
            at,
            ResolverSettings::default().run_settings(),
            2,
            vec![ok, missing],
            Vec::new(),
        )
    }

    #[tokio::test]
    async fn writes_snapshot_and_history() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FsSink::new(dir.path().join("out")).unwrap();
        sink.emit(&report()).await.unwrap();

        let snapshot = std::fs::read_to_string(sink.dir().join(SNAPSHOT_FILE)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&snapshot).unwrap();
        assert_eq!(value["summary"]["found_today"], 1);
        assert_eq!(value["summary"]["not_found"], 1);
        assert!(!sink.dir().join(DAILY_FILE).exists());

        let history = std::fs::read_to_string(sink.dir().join(HISTORY_FILE)).unwrap();
        assert_eq!(history.lines().count(), 2);
        assert!(history.contains("5.2 °C"));
    }

    #[tokio::test]
    async fn history_appends_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FsSink::new(dir.path()).unwrap();
        sink.emit(&report()).await.unwrap();
        sink.emit(&report()).await.unwrap();

        let history = std::fs::read_to_string(dir.path().join(HISTORY_FILE)).unwrap();
        assert_eq!(history.lines().count(), 4);
        assert!(!dir.path().join(format!(".{SNAPSHOT_FILE}.tmp")).exists());
    }
}
