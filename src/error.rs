use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Why an inbound hazard-map datagram was rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DatagramError {
    #[error("datagram is not valid UTF-8")]
    NotUtf8,
    #[error("expected {expected} ';'-separated fields, found {found}")]
    FieldCount { expected: usize, found: usize },
    #[error("expected {expected} grid cells, found {found}")]
    GridLength { expected: usize, found: usize },
    #[error("invalid integer {token:?} in {field}")]
    InvalidToken { field: &'static str, token: String },
    #[error("grid cell {index} has value {value}, expected 0 or 255")]
    CellValue { index: usize, value: i64 },
    #[error("local centroid ({cx}, {cy}) lies outside the grid")]
    CentroidOutOfBounds { cx: i64, cy: i64 },
}

#[derive(thiserror::Error, Debug)]
pub enum TelemetryError {
    #[error("cannot bind telemetry socket on {addr}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("cannot resolve telemetry destination {0}")]
    Resolve(String),
    #[error("telemetry socket configuration failed")]
    Socket(#[source] io::Error),
    #[error("cannot start telemetry receiver thread")]
    Spawn(#[source] io::Error),
    #[error("position send to {dest} failed")]
    Send {
        dest: SocketAddr,
        #[source]
        source: io::Error,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum ReplayError {
    #[error("cannot read trajectory")]
    Io(#[from] io::Error),
    #[error("trajectory has no header line")]
    MissingHeader,
    #[error("line {line}: expected {expected} columns, found {found}")]
    ColumnCount {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: invalid value {value:?} in column {column}")]
    InvalidValue {
        line: usize,
        column: &'static str,
        value: String,
    },
}
