pub mod csv;
pub mod json;

pub use csv::{read_trajectory, read_trajectory_file, write_tick_log, write_tick_log_file, TrajectoryRow};
pub use json::{write_summary, write_summary_file, EpisodeSummary};
