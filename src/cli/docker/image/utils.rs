//! Duration formatting for build logs.

/// Formats elapsed seconds as `42s`, `3m 07s` or `1h 02m`.
pub fn humanize_duration(seconds: u64) -> String {
    match seconds {
        s if s < 60 => format!("{s}s"),
        s if s < 3600 => format!("{}m {:02}s", s / 60, s % 60),
        s => format!("{}h {:02}m", s / 3600, (s % 3600) / 60),
    }
}

#[cfg(test)]
mod tests {
    use super::humanize_duration;

    #[test]
    fn picks_the_largest_two_units() {
        assert_eq!(humanize_duration(0), "0s");
        assert_eq!(humanize_duration(59), "59s");
        assert_eq!(humanize_duration(187), "3m 07s");
        assert_eq!(humanize_duration(3720), "1h 02m");
    }
}
