//! `STTRACE` facility parsing

/// Facility name that enables debug tracing of dial decisions.
pub const DIALER_FACILITY: &str = "dialer";

/// Returns true if `facility` is listed in the comma-separated `trace`
/// value, or if the value is `all`.
#[must_use]
pub fn facility_enabled(trace: &str, facility: &str) -> bool {
    trace
        .split(',')
        .map(str::trim)
        .any(|entry| entry == facility || entry == "all")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facility_list() {
        assert!(facility_enabled("dialer", DIALER_FACILITY));
        assert!(facility_enabled("net, dialer ,model", DIALER_FACILITY));
        assert!(facility_enabled("all", DIALER_FACILITY));
        assert!(!facility_enabled("", DIALER_FACILITY));
        assert!(!facility_enabled("dialers", DIALER_FACILITY));
    }
}
