//! Download file names.

use footprint_core::ScopeId;

/// File name for an export of `scope` made on `date` (`YYYY-MM-DD`).
///
/// Characters other than ASCII alphanumerics and `-` are dropped from
/// `date` so a stray separator or time suffix cannot produce a path.
#[must_use]
pub fn export_filename(scope: ScopeId, date: &str, ext: &str) -> String {
    let date: String = date
        .chars()
        .take_while(|c| *c != 'T')
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    let ext = ext.trim_start_matches('.');
    if date.is_empty() {
        format!("footprint-{}.{ext}", scope.slug())
    } else {
        format!("footprint-{}-{date}.{ext}", scope.slug())
    }
}

/// Format a calendar date as `YYYY-MM-DD`.
#[must_use]
pub fn format_date(year: u32, month: u32, day: u32) -> String {
    format!("{year:04}-{month:02}-{day:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_carry_scope_and_date() {
        assert_eq!(
            export_filename(ScopeId::World, "2026-10-17", "png"),
            "footprint-world-2026-10-17.png"
        );
        assert_eq!(
            export_filename(ScopeId::UsStates, "2026-01-05", ".svg"),
            "footprint-us-states-2026-01-05.svg"
        );
    }

    #[test]
    fn iso_timestamps_are_cut_to_the_date() {
        assert_eq!(
            export_filename(ScopeId::CanadaProvinces, "2026-10-17T08:30:00.000Z", "png"),
            "footprint-canada-provinces-2026-10-17.png"
        );
        assert_eq!(
            export_filename(ScopeId::World, "../x", "png"),
            "footprint-world-x.png"
        );
        assert_eq!(export_filename(ScopeId::World, "", "png"), "footprint-world.png");
    }

    #[test]
    fn dates_are_zero_padded() {
        assert_eq!(format_date(2026, 3, 9), "2026-03-09");
    }
}
