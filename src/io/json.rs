use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dynamics::state::TargetSite;
use crate::perception::channel::ChannelStats;
use crate::sim::flight::EpisodeOutcome;
use crate::sim::runner::EpisodeLog;

/// Summary of one episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    pub outcome: EpisodeOutcome,
    pub ticks: usize,
    pub total_reward: f64,
    pub truncated: bool,
    pub target: TargetSite,
    /// [x, altitude, z] on the last tick.
    pub final_position: Option<[f64; 3]>,
    /// Horizontal distance from the target on the last tick.
    pub target_deviation: Option<f64>,
    pub contacts: usize,
    pub max_closing_speed: f64,
    pub telemetry_present: bool,
    pub telemetry: Option<ChannelStats>,
}

impl EpisodeSummary {
    pub fn from_log(log: &EpisodeLog, telemetry: Option<ChannelStats>) -> Self {
        let last = log.final_state();
        let contacts = log.records.iter().flat_map(|r| r.contacts.iter());

        EpisodeSummary {
            outcome: log.outcome,
            ticks: log.ticks(),
            total_reward: log.total_reward,
            truncated: log.truncated,
            target: log.target,
            final_position: last.map(|s| [s.position.x, s.position.y, s.position.z]),
            target_deviation: last.map(|s| log.target.distance_to(s)),
            contacts: contacts.clone().count(),
            max_closing_speed: contacts.map(|c| c.closing_speed).fold(0.0_f64, f64::max),
            telemetry_present: log.telemetry_seen(),
            telemetry,
        }
    }
}

/// Write the episode summary as pretty JSON to a writer.
pub fn write_summary<W: Write>(writer: &mut W, summary: &EpisodeSummary) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, summary)?;
    writeln!(writer)
}

/// Write the episode summary JSON to a file.
pub fn write_summary_file(path: impl AsRef<Path>, summary: &EpisodeSummary) -> io::Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    write_summary(&mut file, summary)?;
    file.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    use crate::dynamics::state::{ContactEvent, VehicleState};
    use crate::gnc::actuator::ThrusterCommand;
    use crate::sim::runner::TickRecord;

    fn record(tick: u64, pos: Vector3<f64>, contacts: Vec<ContactEvent>, outcome: EpisodeOutcome) -> TickRecord {
        TickRecord {
            tick,
            state: VehicleState::at(pos),
            contacts,
            snapshot_sequence: None,
            reward: 0.25,
            outcome,
            terms: None,
            command: ThrusterCommand::default(),
        }
    }

    fn crashed_log() -> EpisodeLog {
        EpisodeLog {
            target: TargetSite::new(0.0, 0.0),
            records: vec![
                record(1, Vector3::new(3.0, 5.0, 4.0), vec![ContactEvent::new(1.5)], EpisodeOutcome::InProgress),
                record(2, Vector3::new(3.0, 0.0, 4.0), vec![ContactEvent::new(7.0)], EpisodeOutcome::Crashed),
            ],
            events: Vec::new(),
            outcome: EpisodeOutcome::Crashed,
            total_reward: 0.25,
            truncated: false,
        }
    }

    #[test]
    fn summary_reports_deviation_and_contacts() {
        let s = EpisodeSummary::from_log(&crashed_log(), None);
        assert_eq!(s.outcome, EpisodeOutcome::Crashed);
        assert_eq!(s.ticks, 2);
        assert_eq!(s.final_position, Some([3.0, 0.0, 4.0]));
        assert!((s.target_deviation.unwrap() - 5.0).abs() < 1e-12);
        assert_eq!(s.contacts, 2);
        assert_eq!(s.max_closing_speed, 7.0);
        assert!(!s.telemetry_present);
    }

    #[test]
    fn json_output_round_trips() {
        let summary = EpisodeSummary::from_log(&crashed_log(), Some(ChannelStats::default()));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        write_summary_file(&path, &summary).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"outcome\": \"crashed\""));
        let back: EpisodeSummary = serde_json::from_str(&text).unwrap();
        assert_eq!(back, summary);
    }
}
