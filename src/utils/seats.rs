//! Auditorium seat layout and seat label parsing.

use std::collections::HashSet;

use serde::Serialize;

/// Row letters as printed on the seat map, front row last.
pub const ROW_LABELS: [char; 7] = ['G', 'F', 'E', 'D', 'C', 'B', 'A'];
pub const SEATS_PER_ROW: u32 = 13;

#[derive(Debug, Clone, Serialize)]
pub struct SeatLayout {
    pub rows: Vec<String>,
    pub columns: u32,
}

impl SeatLayout {
    pub fn standard() -> Self {
        Self {
            rows: ROW_LABELS.iter().map(|c| c.to_string()).collect(),
            columns: SEATS_PER_ROW,
        }
    }
}

/// Normalize a seat label like `a7` to `A7`, or `None` if it is not on the map.
pub fn normalize_seat(label: &str) -> Option<String> {
    let label = label.trim();
    let mut chars = label.chars();
    let row = chars.next()?.to_ascii_uppercase();
    if !ROW_LABELS.contains(&row) {
        return None;
    }

    let number: u32 = chars.as_str().parse().ok()?;
    if number == 0 || number > SEATS_PER_ROW {
        return None;
    }

    Some(format!("{}{}", row, number))
}

/// Validate a requested seat list, rejecting unknown labels and duplicates.
pub fn parse_seats(requested: &[String]) -> Result<Vec<String>, String> {
    if requested.is_empty() {
        return Err("At least one seat must be selected".to_string());
    }

    let mut seen = HashSet::new();
    let mut seats = Vec::with_capacity(requested.len());
    for raw in requested {
        let seat = normalize_seat(raw).ok_or_else(|| format!("Invalid seat: {}", raw))?;
        if !seen.insert(seat.clone()) {
            return Err(format!("Seat {} selected more than once", seat));
        }
        seats.push(seat);
    }

    Ok(seats)
}

/// Seats from `requested` that already appear in `taken`.
pub fn conflicting_seats<'a>(requested: &'a [String], taken: &HashSet<String>) -> Vec<&'a str> {
    requested
        .iter()
        .filter(|s| taken.contains(s.as_str()))
        .map(String::as_str)
        .collect()
}
