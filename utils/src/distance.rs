//! Distance formatting for user-facing messages.

/// Format a distance in meters: whole meters below 1 km, one decimal above.
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{}m", meters.round() as u64)
    } else {
        format!("{:.1}km", meters / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_whole_meters() {
        assert_eq!(format_distance(62.4), "62m");
        assert_eq!(format_distance(39.6), "40m");
        assert_eq!(format_distance(0.0), "0m");
    }

    #[test]
    fn switches_to_kilometers() {
        assert_eq!(format_distance(1_260.0), "1.3km");
        assert_eq!(format_distance(15_000.0), "15.0km");
    }
}
