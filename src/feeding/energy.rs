use time::Date;

/// Signed elapsed weeks between two dates.
pub fn weeks_between(d1: Date, d2: Date) -> f64 {
    (d2 - d1).whole_days() as f64 / 7.0
}

/// Maturity bucket governing the energy multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifeStage {
    Kitten0To4m,
    Kitten4To12m,
    AdultNeutered,
    AdultIntact,
    AdultObeseProne,
}

impl LifeStage {
    pub fn code(self) -> &'static str {
        match self {
            LifeStage::Kitten0To4m => "kitten_0_4m",
            LifeStage::Kitten4To12m => "kitten_4_12m",
            LifeStage::AdultNeutered => "adult_neutered",
            LifeStage::AdultIntact => "adult_intact",
            LifeStage::AdultObeseProne => "adult_obese_prone",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "kitten_0_4m" => Some(LifeStage::Kitten0To4m),
            "kitten_4_12m" => Some(LifeStage::Kitten4To12m),
            "adult_neutered" => Some(LifeStage::AdultNeutered),
            "adult_intact" => Some(LifeStage::AdultIntact),
            "adult_obese_prone" => Some(LifeStage::AdultObeseProne),
            _ => None,
        }
    }

    /// DER multiplier from commonly used vet guidance.
    pub fn factor(self) -> f64 {
        match self {
            LifeStage::Kitten0To4m => 2.5,
            LifeStage::Kitten4To12m => 2.0,
            LifeStage::AdultNeutered => 1.2,
            LifeStage::AdultIntact => 1.4,
            LifeStage::AdultObeseProne => 1.0,
        }
    }
}

/// Age-based default, used only when no explicit override is set.
pub fn infer_life_stage(age_weeks: f64) -> LifeStage {
    if age_weeks < 16.0 {
        LifeStage::Kitten0To4m
    } else if age_weeks < 52.0 {
        LifeStage::Kitten4To12m
    } else {
        LifeStage::AdultNeutered
    }
}

/// Resting Energy Requirement: RER = 70 * (BWkg ^ 0.75).
pub fn rer_kcal(weight_kg: f64) -> f64 {
    70.0 * weight_kg.powf(0.75)
}

/// Multiplier for a stage code. Override codes arrive unsanitized, so any
/// unrecognized code falls back to the adult-neutered factor.
pub fn stage_factor(code: &str) -> f64 {
    LifeStage::from_code(code).map_or(1.2, LifeStage::factor)
}

/// Daily Energy Requirement: RER scaled by the life-stage factor.
pub fn der_kcal(weight_kg: f64, stage_code: &str) -> f64 {
    rer_kcal(weight_kg) * stage_factor(stage_code)
}

/// The stage code in effect: a non-blank override wins, otherwise inferred
/// from age.
pub fn effective_stage_code(override_code: Option<&str>, age_weeks: f64) -> String {
    match override_code.map(str::trim) {
        Some(code) if !code.is_empty() => code.to_string(),
        _ => infer_life_stage(age_weeks).code().to_string(),
    }
}

const GROWTH_CURVE: [(f64, f64); 7] = [
    (0.0, 0.1),
    (4.0, 0.3),
    (8.0, 0.6),
    (12.0, 1.0),
    (16.0, 1.5),
    (26.0, 2.5),
    (52.0, 4.0),
];

/// Typical kitten weight for a given age, used only when the weight log is
/// empty. Linear interpolation between the curve points; adults (>= 52 weeks)
/// are a flat 4.5 kg and negative ages clamp to the first point.
pub fn estimate_weight_by_age(age_weeks: f64) -> f64 {
    if age_weeks >= 52.0 {
        return 4.5;
    }
    if age_weeks <= 0.0 {
        return 0.1;
    }
    for pair in GROWTH_CURVE.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        if age_weeks < x1 {
            return y0 + (y1 - y0) * (age_weeks - x0) / (x1 - x0);
        }
    }
    4.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn weeks_between_is_signed() {
        let d1 = date!(2024 - 01 - 01);
        let d2 = date!(2024 - 01 - 15);
        assert!(close(weeks_between(d1, d2), 2.0));
        assert!(close(weeks_between(d2, d1), -2.0));
        assert!(close(weeks_between(d1, date!(2024 - 01 - 04)), 3.0 / 7.0));
    }

    #[test]
    fn life_stage_is_a_step_function() {
        let cases = [
            (0.0, LifeStage::Kitten0To4m),
            (15.99, LifeStage::Kitten0To4m),
            (16.0, LifeStage::Kitten4To12m),
            (51.99, LifeStage::Kitten4To12m),
            (52.0, LifeStage::AdultNeutered),
            (200.0, LifeStage::AdultNeutered),
        ];
        for (age, expected) in cases {
            assert_eq!(infer_life_stage(age), expected, "age {}", age);
        }
    }

    #[test]
    fn der_is_rer_times_factor() {
        for weight in [0.4, 1.0, 3.2, 4.5, 7.0] {
            for stage in [
                LifeStage::Kitten0To4m,
                LifeStage::Kitten4To12m,
                LifeStage::AdultNeutered,
                LifeStage::AdultIntact,
                LifeStage::AdultObeseProne,
            ] {
                let expected = 70.0 * f64::powf(weight, 0.75) * stage.factor();
                assert!(close(der_kcal(weight, stage.code()), expected));
            }
        }
    }

    #[test]
    fn unknown_stage_falls_back_to_adult_neutered() {
        assert!(close(stage_factor("definitely_not_a_stage"), 1.2));
        assert!(close(stage_factor(""), 1.2));
        assert!(close(der_kcal(4.0, "garbage"), rer_kcal(4.0) * 1.2));
    }

    #[test]
    fn override_wins_even_when_unsanitized() {
        assert_eq!(effective_stage_code(Some("adult_intact"), 2.0), "adult_intact");
        assert_eq!(effective_stage_code(Some("not_a_stage"), 2.0), "not_a_stage");
        assert_eq!(effective_stage_code(Some(""), 2.0), "kitten_0_4m");
        assert_eq!(effective_stage_code(Some("   "), 60.0), "adult_neutered");
        assert_eq!(effective_stage_code(None, 20.0), "kitten_4_12m");
    }

    #[test]
    fn growth_curve_hits_its_breakpoints() {
        let points = [
            (0.0, 0.1),
            (4.0, 0.3),
            (8.0, 0.6),
            (12.0, 1.0),
            (16.0, 1.5),
            (26.0, 2.5),
        ];
        for (age, kg) in points {
            assert!(close(estimate_weight_by_age(age), kg), "age {}", age);
        }
    }

    #[test]
    fn growth_curve_interpolates_between_breakpoints() {
        assert!(close(estimate_weight_by_age(6.0), 0.45));
        assert!(close(estimate_weight_by_age(10.0), 0.8));
        assert!(close(estimate_weight_by_age(39.0), 3.25));
    }

    #[test]
    fn growth_curve_is_flat_for_adults_and_clamps_negatives() {
        assert!(close(estimate_weight_by_age(52.0), 4.5));
        assert!(close(estimate_weight_by_age(300.0), 4.5));
        assert!(close(estimate_weight_by_age(-3.0), 0.1));
    }
}
