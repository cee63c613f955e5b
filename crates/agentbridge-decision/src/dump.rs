use std::fs;
use std::path::PathBuf;

use agentbridge_core::types::CycleId;
use serde_json::Value;
use tracing::warn;

/// Writes each outgoing decision-request payload to a rotating on-disk
/// directory for offline analysis, bounded to `max_files` (spec §4.7
/// "Payload dump (optional)"). Oldest files are removed once the bound is
/// exceeded.
pub struct PayloadDumper {
    directory: PathBuf,
    max_files: usize,
}

impl PayloadDumper {
    pub fn new(directory: impl Into<PathBuf>, max_files: usize) -> Self {
        Self {
            directory: directory.into(),
            max_files,
        }
    }

    /// Best-effort: a dump failure is logged and otherwise ignored, it must
    /// never interrupt a decision cycle.
    pub fn dump(&self, cycle_id: &CycleId, payload: &Value) {
        if let Err(e) = self.try_dump(cycle_id, payload) {
            warn!(error = %e, "failed to dump decision payload");
        }
    }

    fn try_dump(&self, cycle_id: &CycleId, payload: &Value) -> std::io::Result<()> {
        fs::create_dir_all(&self.directory)?;
        let filename = format!("{}-{cycle_id}.json", agentbridge_core::types::now_secs());
        let path = self.directory.join(filename);
        fs::write(&path, serde_json::to_vec_pretty(payload)?)?;
        self.rotate()
    }

    fn rotate(&self) -> std::io::Result<()> {
        let mut entries: Vec<_> = fs::read_dir(&self.directory)?
            .filter_map(|e| e.ok())
            .collect();
        if entries.len() <= self.max_files {
            return Ok(());
        }
        entries.sort_by_key(|e| {
            e.metadata()
                .and_then(|m| m.modified())
                .unwrap_or(std::time::SystemTime::UNIX_EPOCH)
        });
        let excess = entries.len() - self.max_files;
        for entry in entries.into_iter().take(excess) {
            let _ = fs::remove_file(entry.path());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotates_down_to_max_files() {
        let dir = std::env::temp_dir().join(format!("agentbridge-dump-test-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        let dumper = PayloadDumper::new(dir.clone(), 2);
        for i in 0..5 {
            dumper.dump(&CycleId(format!("c{i}")), &serde_json::json!({ "i": i }));
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        let remaining = fs::read_dir(&dir).unwrap().count();
        assert!(remaining <= 2);
        let _ = fs::remove_dir_all(&dir);
    }
}
