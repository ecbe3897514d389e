use serde::Serialize;
use std::fmt;

/// EPA AQI bands. Upper bounds are inclusive: 50 is Good, 51 is Moderate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum AqiCategory {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl AqiCategory {
    pub const ALL: [AqiCategory; 6] = [
        AqiCategory::Good,
        AqiCategory::Moderate,
        AqiCategory::UnhealthyForSensitiveGroups,
        AqiCategory::Unhealthy,
        AqiCategory::VeryUnhealthy,
        AqiCategory::Hazardous,
    ];

    pub fn from_aqi(aqi: i32) -> Self {
        match aqi {
            i32::MIN..=50 => AqiCategory::Good,
            51..=100 => AqiCategory::Moderate,
            101..=150 => AqiCategory::UnhealthyForSensitiveGroups,
            151..=200 => AqiCategory::Unhealthy,
            201..=300 => AqiCategory::VeryUnhealthy,
            _ => AqiCategory::Hazardous,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AqiCategory::Good => "Good",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            AqiCategory::Unhealthy => "Unhealthy",
            AqiCategory::VeryUnhealthy => "Very Unhealthy",
            AqiCategory::Hazardous => "Hazardous",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AqiCategory::Good => {
                "Air quality is satisfactory, and air pollution poses little or no risk."
            }
            AqiCategory::Moderate => {
                "Air quality is acceptable. However, there may be a risk for some people."
            }
            AqiCategory::UnhealthyForSensitiveGroups => {
                "Members of sensitive groups may experience health effects."
            }
            AqiCategory::Unhealthy => {
                "Some members of the general public may experience health effects."
            }
            AqiCategory::VeryUnhealthy => {
                "Health alert: The risk of health effects is increased for everyone."
            }
            AqiCategory::Hazardous => {
                "Health warning of emergency conditions: everyone is more likely to be affected."
            }
        }
    }

    /// Advisory strings shown with alerts, in display order.
    pub fn recommended_actions(&self) -> &'static [&'static str] {
        match self {
            AqiCategory::Good => &["Air quality is good, no special precautions needed."],
            AqiCategory::Moderate => &[
                "Some people may be sensitive; consider reducing prolonged outdoor exertion.",
            ],
            AqiCategory::UnhealthyForSensitiveGroups => &[
                "Sensitive groups should reduce outdoor exertion.",
                "Consider wearing masks outdoors.",
            ],
            AqiCategory::Unhealthy => &[
                "Reduce prolonged outdoor exertion.",
                "Keep windows closed if possible.",
                "Consider N95 masks.",
            ],
            AqiCategory::VeryUnhealthy => &[
                "Avoid outdoor exertion.",
                "Use air purifiers indoors.",
                "Follow local health guidance.",
            ],
            AqiCategory::Hazardous => &[
                "Everyone should avoid outdoor activity.",
                "Seek medical advice if symptoms occur.",
            ],
        }
    }

    /// Map fill colour for the band.
    pub fn hex_color(&self) -> &'static str {
        match self {
            AqiCategory::Good => "#16a34a",
            AqiCategory::Moderate => "#eab308",
            AqiCategory::UnhealthyForSensitiveGroups => "#fb923c",
            AqiCategory::Unhealthy => "#ef4444",
            AqiCategory::VeryUnhealthy => "#7c3aed",
            AqiCategory::Hazardous => "#7f1d1d",
        }
    }
}

impl fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Category label for an AQI value.
pub fn category(aqi: i32) -> &'static str {
    AqiCategory::from_aqi(aqi).label()
}

/// Marker opacity in 0.15..=0.85, scaled linearly over 0..=500.
pub fn opacity_for(value: f64) -> f64 {
    let v = if value.is_finite() {
        value.clamp(0.0, 500.0)
    } else {
        0.0
    };
    0.15 + (v / 500.0) * 0.7
}
