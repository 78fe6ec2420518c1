use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use super::PerformanceRecord;

/// Per-field fallbacks used when a labeled value is absent or unparsable.
/// Delays fall back to 1e-9 here, not the 1e-8 used when the simulator is
/// unreachable (see [`super::FALLBACK_DELAY`]).
pub const FIELD_FALLBACK_DELAY: f64 = 1e-9;
pub const FIELD_FALLBACK_POWER: f64 = 1e-3;

lazy_static! {
    static ref TPLH_RE: Regex = Regex::new(r"(?i)tplh\s*=\s*([0-9.eE+\-]+)").unwrap();
    static ref TPHL_RE: Regex = Regex::new(r"(?i)tphl\s*=\s*([0-9.eE+\-]+)").unwrap();
    static ref PSTATIC_RE: Regex = Regex::new(r"(?i)p_static\s*=\s*([0-9.eE+\-]+)").unwrap();
    static ref PDYNAMIC_RE: Regex = Regex::new(r"(?i)p_dynamic\s*=\s*([0-9.eE+\-]+)").unwrap();
}

/// Extracts the four labeled measurements from a simulator report.
///
/// Each field is recovered independently; a missing or malformed label never
/// aborts the evaluation.
pub fn parse_report(output: &str) -> PerformanceRecord {
    let t_plh = extract(&TPLH_RE, output, "tplh", FIELD_FALLBACK_DELAY);
    let t_phl = extract(&TPHL_RE, output, "tphl", FIELD_FALLBACK_DELAY);
    let static_power = extract(&PSTATIC_RE, output, "p_static", FIELD_FALLBACK_POWER);
    let dynamic_power = extract(&PDYNAMIC_RE, output, "p_dynamic", FIELD_FALLBACK_POWER);
    PerformanceRecord::new(t_plh, t_phl, static_power, dynamic_power)
}

fn extract(re: &Regex, text: &str, label: &str, fallback: f64) -> f64 {
    let value = re
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok());
    match value {
        Some(v) => v,
        None => {
            debug!("measurement `{label}` missing from report; using {fallback:e}");
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    const REPORT: &str = "
Circuit: * gate sizing testbench

tplh                =  4.52e-11 targ=  1.0452e-09 trig=  1.0000e-09
TPHL                =  3.81e-11 targ=  2.0381e-09 trig=  2.0000e-09
p_static            =  1.24e-09 from=  0.0000e+00 to=  1.0000e-09
p_dynamic           =  3.60e-06 from=  1.0000e-09 to=  5.0000e-09
";

    #[test]
    fn test_parse_full_report() {
        let rec = parse_report(REPORT);
        assert_relative_eq!(rec.t_plh, 4.52e-11);
        assert_relative_eq!(rec.t_phl, 3.81e-11);
        assert_relative_eq!(rec.static_power, 1.24e-9);
        assert_relative_eq!(rec.dynamic_power, 3.6e-6);
    }

    #[test]
    fn test_labels_are_case_insensitive() {
        let rec = parse_report("TpLh = 1e-11\ntPHL=2e-11\nP_STATIC = 1e-9\nP_Dynamic = 1e-6\n");
        assert_relative_eq!(rec.t_plh, 1e-11);
        assert_relative_eq!(rec.t_phl, 2e-11);
    }

    #[test]
    fn test_missing_fields_fall_back_independently() {
        let rec = parse_report("tplh = 7.5e-11\nno other measurements here\n");
        assert_relative_eq!(rec.t_plh, 7.5e-11);
        assert_eq!(rec.t_phl, FIELD_FALLBACK_DELAY);
        assert_eq!(rec.static_power, FIELD_FALLBACK_POWER);
        assert_eq!(rec.dynamic_power, FIELD_FALLBACK_POWER);
    }

    #[test]
    fn test_garbage_report_falls_back_entirely() {
        let rec = parse_report("ngspice-41 done. errors were found.");
        assert_eq!(rec.t_plh, FIELD_FALLBACK_DELAY);
        assert_eq!(rec.t_phl, FIELD_FALLBACK_DELAY);
        assert_eq!(rec.static_power, FIELD_FALLBACK_POWER);
        assert_eq!(rec.dynamic_power, FIELD_FALLBACK_POWER);
    }

    #[test]
    fn test_negative_readings_are_rectified() {
        let rec = parse_report("tplh = -4e-11\ntphl = 4e-11\np_static = 1e-9\np_dynamic = 1e-6\n");
        assert_relative_eq!(rec.t_plh, 4e-11);
        assert_relative_eq!(rec.avg_delay(), 4e-11);
    }

    #[test]
    fn test_unparsable_value_falls_back() {
        let rec = parse_report("tplh = ---\ntphl = 4e-11\n");
        assert_eq!(rec.t_plh, FIELD_FALLBACK_DELAY);
        assert_relative_eq!(rec.t_phl, 4e-11);
    }
}
