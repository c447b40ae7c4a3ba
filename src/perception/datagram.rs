//! Text wire formats shared with the perception process.
//!
//! Inbound: `<4096 cells 0|255, comma-separated>;<cx>;<cy>;<global_cx>;<global_cy>`
//! Outbound: `<x>,<y>,<z>`
//!
//! Both directions are plain ASCII decimals. There is no header, sequence
//! number or timestamp on the wire.

use std::fmt::Write as _;

use nalgebra::Vector3;

use super::hazard::{Centroid, HazardMap, GRID_CELLS, GRID_SIZE};
use crate::error::DatagramError;

const FIELD_COUNT: usize = 5;

/// Parse a raw datagram into a hazard map.
pub fn decode_hazard(bytes: &[u8]) -> Result<HazardMap, DatagramError> {
    let text = std::str::from_utf8(bytes).map_err(|_| DatagramError::NotUtf8)?;
    parse_hazard(text)
}

pub fn parse_hazard(text: &str) -> Result<HazardMap, DatagramError> {
    let fields: Vec<&str> = text.trim().split(';').collect();
    if fields.len() != FIELD_COUNT {
        return Err(DatagramError::FieldCount {
            expected: FIELD_COUNT,
            found: fields.len(),
        });
    }

    let mut cells = Vec::with_capacity(GRID_CELLS);
    for (index, token) in fields[0].split(',').enumerate() {
        let value = parse_int(token, "grid")?;
        let cell = u8::try_from(value)
            .ok()
            .filter(|&c| c == 0 || c == 255)
            .ok_or(DatagramError::CellValue { index, value })?;
        cells.push(cell);
    }
    if cells.len() != GRID_CELLS {
        return Err(DatagramError::GridLength {
            expected: GRID_CELLS,
            found: cells.len(),
        });
    }

    let cx = parse_int(fields[1], "cx")?;
    let cy = parse_int(fields[2], "cy")?;
    let global = (
        parse_int(fields[3], "global_cx")?,
        parse_int(fields[4], "global_cy")?,
    );

    let on_grid = |v: i64| usize::try_from(v).ok().filter(|&v| v < GRID_SIZE);
    let (Some(lx), Some(ly)) = (on_grid(cx), on_grid(cy)) else {
        return Err(DatagramError::CentroidOutOfBounds { cx, cy });
    };

    let centroid = Centroid {
        local: (lx, ly),
        global,
    };
    // Length, cell values and centroid were all checked above.
    HazardMap::new(cells, centroid).ok_or(DatagramError::CentroidOutOfBounds { cx, cy })
}

fn parse_int(token: &str, field: &'static str) -> Result<i64, DatagramError> {
    let t = token.trim();
    t.parse::<i64>().map_err(|_| DatagramError::InvalidToken {
        field,
        token: t.to_string(),
    })
}

/// Inverse of [`parse_hazard`]; what the perception process sends.
pub fn encode_hazard(map: &HazardMap) -> String {
    let mut out = String::with_capacity(GRID_CELLS * 4 + 32);
    for (i, cell) in map.cells().iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, "{}", cell);
    }
    let c = map.centroid();
    let _ = write!(
        out,
        ";{};{};{};{}",
        c.local.0, c.local.1, c.global.0, c.global.1
    );
    out
}

/// Outbound position report. `Display` for f64 is locale-independent and
/// round-trips exactly.
pub fn encode_position(position: &Vector3<f64>) -> String {
    format!("{},{},{}", position.x, position.y, position.z)
}
