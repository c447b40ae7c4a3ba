use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::Vector3;

use crate::dynamics::state::{Attitude, ContactEvent, VehicleState};
use crate::error::ReplayError;
use crate::sim::runner::TickRecord;

pub const TRAJECTORY_COLUMNS: [&str; 14] = [
    "x", "altitude", "z", "vx", "vy", "vz", "pitch", "roll", "yaw", "wx", "wy", "wz", "settled",
    "contact_speed",
];

// ---------------------------------------------------------------------------
// Trajectory input
// ---------------------------------------------------------------------------

/// One recorded tick: sensed state plus the contact reported on that tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryRow {
    pub state: VehicleState,
    pub contact: Option<ContactEvent>,
}

/// Read a recorded trajectory.
///
/// Columns: x, altitude, z, vx, vy, vz, pitch, roll, yaw, wx, wy, wz,
///          settled, contact_speed
///
/// A header line is required. Angles are degrees in any range; `settled` is
/// `true`/`false` or `1`/`0`; `contact_speed` is empty when there was no
/// contact. Blank lines are skipped.
pub fn read_trajectory<R: BufRead>(reader: R) -> Result<Vec<TrajectoryRow>, ReplayError> {
    let mut lines = reader.lines().enumerate();

    let header = loop {
        match lines.next() {
            Some((_, line)) => {
                let line = line?;
                if !line.trim().is_empty() {
                    break line;
                }
            }
            None => return Err(ReplayError::MissingHeader),
        }
    };
    if header.split(',').next().map(str::trim) != Some(TRAJECTORY_COLUMNS[0]) {
        return Err(ReplayError::MissingHeader);
    }

    let mut rows = Vec::new();
    for (idx, line) in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        rows.push(parse_row(idx + 1, &line)?);
    }
    Ok(rows)
}

pub fn read_trajectory_file(path: impl AsRef<Path>) -> Result<Vec<TrajectoryRow>, ReplayError> {
    let file = File::open(path)?;
    read_trajectory(BufReader::new(file))
}

fn parse_row(line: usize, text: &str) -> Result<TrajectoryRow, ReplayError> {
    let fields: Vec<&str> = text.split(',').map(str::trim).collect();
    if fields.len() != TRAJECTORY_COLUMNS.len() {
        return Err(ReplayError::ColumnCount {
            line,
            expected: TRAJECTORY_COLUMNS.len(),
            found: fields.len(),
        });
    }

    let num = |i: usize| -> Result<f64, ReplayError> {
        fields[i].parse::<f64>().map_err(|_| ReplayError::InvalidValue {
            line,
            column: TRAJECTORY_COLUMNS[i],
            value: fields[i].to_string(),
        })
    };

    let settled = match fields[12] {
        "true" | "1" => true,
        "false" | "0" => false,
        other => {
            return Err(ReplayError::InvalidValue {
                line,
                column: TRAJECTORY_COLUMNS[12],
                value: other.to_string(),
            })
        }
    };
    let contact = if fields[13].is_empty() {
        None
    } else {
        Some(ContactEvent::new(num(13)?))
    };

    Ok(TrajectoryRow {
        state: VehicleState {
            position: Vector3::new(num(0)?, num(1)?, num(2)?),
            velocity: Vector3::new(num(3)?, num(4)?, num(5)?),
            attitude: Attitude::from_degrees(num(6)?, num(7)?, num(8)?),
            angular_velocity: Vector3::new(num(9)?, num(10)?, num(11)?),
            settled,
        },
        contact,
    })
}

// ---------------------------------------------------------------------------
// Tick log output
// ---------------------------------------------------------------------------

/// Write the per-tick log.
///
/// Columns: tick, altitude, x, z, vx, vy, vz, pitch, yaw,
///          step, vertical, attitude, horizontal, reward,
///          main, pitch_cmd, yaw_cmd, outcome
///
/// Reward terms are left empty on terminal ticks.
pub fn write_tick_log<W: Write>(writer: &mut W, records: &[TickRecord]) -> io::Result<()> {
    writeln!(
        writer,
        "tick,altitude,x,z,vx,vy,vz,pitch,yaw,\
         step,vertical,attitude,horizontal,reward,\
         main,pitch_cmd,yaw_cmd,outcome"
    )?;

    for r in records {
        let s = &r.state;
        let terms = match r.terms {
            Some(t) => format!(
                "{:.6},{:.6},{:.6},{:.6}",
                t.step,
                t.vertical,
                t.attitude(),
                t.horizontal()
            ),
            None => ",,,".to_string(),
        };
        let cmd = r.command.encode();
        writeln!(
            writer,
            "{},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4},{:.2},{:.2},\
             {},{:.6},\
             {},{},{},{}",
            r.tick,
            s.position.y, s.position.x, s.position.z,
            s.velocity.x, s.velocity.y, s.velocity.z,
            s.attitude.pitch(), s.attitude.yaw(),
            terms,
            r.reward,
            cmd.main, cmd.pitch, cmd.yaw,
            r.outcome,
        )?;
    }

    Ok(())
}

/// Write the per-tick log to a file at the given path.
pub fn write_tick_log_file(path: impl AsRef<Path>, records: &[TickRecord]) -> io::Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    write_tick_log(&mut file, records)?;
    file.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gnc::actuator::{AxisCommand, ThrusterCommand};
    use crate::gnc::reward::RewardTerms;
    use crate::sim::flight::EpisodeOutcome;

    const HEADER: &str = "x,altitude,z,vx,vy,vz,pitch,roll,yaw,wx,wy,wz,settled,contact_speed";

    #[test]
    fn reads_rows_and_contacts() {
        let text = format!(
            "{HEADER}\n\
             1,20,3,0,-2.5,0,350,0,10,0,0,0,false,\n\
             \n\
             1,0.2,3,0,0,0,0,0,0,0,0,0,1,1.25\n"
        );
        let rows = read_trajectory(text.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].state.position, Vector3::new(1.0, 20.0, 3.0));
        assert_eq!(rows[0].state.velocity.y, -2.5);
        assert!((rows[0].state.attitude.pitch() - -10.0).abs() < 1e-12);
        assert_eq!(rows[0].contact, None);
        assert!(!rows[0].state.settled);
        assert!(rows[1].state.settled);
        assert_eq!(rows[1].contact, Some(ContactEvent::new(1.25)));
    }

    #[test]
    fn rejects_bad_input_with_line_numbers() {
        assert!(matches!(
            read_trajectory("".as_bytes()),
            Err(ReplayError::MissingHeader)
        ));
        assert!(matches!(
            read_trajectory("1,2,3\n".as_bytes()),
            Err(ReplayError::MissingHeader)
        ));

        let short = format!("{HEADER}\n1,2,3\n");
        assert!(matches!(
            read_trajectory(short.as_bytes()),
            Err(ReplayError::ColumnCount { line: 2, expected: 14, found: 3 })
        ));

        let bad = format!("{HEADER}\n1,2,3,0,0,0,0,0,0,0,0,0,false,\n1,abc,3,0,0,0,0,0,0,0,0,0,false,\n");
        match read_trajectory(bad.as_bytes()) {
            Err(ReplayError::InvalidValue { line, column, value }) => {
                assert_eq!(line, 3);
                assert_eq!(column, "altitude");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected: {other:?}"),
        }

        let settled = format!("{HEADER}\n1,2,3,0,0,0,0,0,0,0,0,0,maybe,\n");
        assert!(matches!(
            read_trajectory(settled.as_bytes()),
            Err(ReplayError::InvalidValue { column: "settled", .. })
        ));
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("descent.csv");
        std::fs::write(&path, format!("{HEADER}\n0,5,0,0,-1,0,0,0,0,0,0,0,0,\n")).unwrap();
        let rows = read_trajectory_file(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(read_trajectory_file(dir.path().join("missing.csv")).is_err());
    }

    #[test]
    fn tick_log_has_header_and_one_row_per_tick() {
        let state = VehicleState::at(Vector3::new(1.0, 50.0, 2.0));
        let records = vec![
            TickRecord {
                tick: 1,
                state: state.clone(),
                contacts: Vec::new(),
                snapshot_sequence: None,
                reward: 0.5,
                outcome: EpisodeOutcome::InProgress,
                terms: Some(RewardTerms {
                    step: -0.0004,
                    vertical: 0.5,
                    ..RewardTerms::default()
                }),
                command: ThrusterCommand {
                    main_engine: true,
                    pitch: AxisCommand::Neg,
                    yaw: AxisCommand::Off,
                },
            },
            TickRecord {
                tick: 2,
                state,
                contacts: vec![ContactEvent::new(9.0)],
                snapshot_sequence: Some(3),
                reward: 0.0,
                outcome: EpisodeOutcome::Crashed,
                terms: None,
                command: ThrusterCommand::default(),
            },
        ];

        let mut buf = Vec::new();
        write_tick_log(&mut buf, &records).unwrap();
        let output = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 3); // header + 2 ticks
        assert!(lines[0].starts_with("tick,altitude,"));
        let cols = lines[0].split(',').count();
        for l in &lines[1..] {
            assert_eq!(l.split(',').count(), cols, "{l}");
        }
        assert!(lines[1].ends_with(",1,1,0,in_progress"));
        assert!(lines[2].contains(",,,,0.000000,"));
        assert!(lines[2].ends_with(",0,0,0,crashed"));
    }
}
