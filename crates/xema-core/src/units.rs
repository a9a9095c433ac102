//! Unit suffixes for readings
//!
//! Reading keys are normalized header texts whose leading token is the
//! source's variable code (`TM`, `VVM`, `PM`...). The code picks the unit;
//! unit hints left in the key by the header (`grausC`, `km_h`, `hPa`) are the
//! fallback for codes not listed here.

/// Unit group for observation types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitGroup {
    Temperature,
    Humidity,
    Rain,
    Speed,
    Direction,
    Pressure,
    Radiation,
    SnowDepth,
}

impl UnitGroup {
    pub fn suffix(self) -> &'static str {
        match self {
            UnitGroup::Temperature => "°C",
            UnitGroup::Humidity => "%",
            UnitGroup::Rain => "mm",
            UnitGroup::Speed => "km/h",
            UnitGroup::Direction => "º",
            UnitGroup::Pressure => "hPa",
            UnitGroup::Radiation => "W/m²",
            UnitGroup::SnowDepth => "cm",
        }
    }
}

/// Get unit group for a reading key
pub fn get_unit_group(name: &str) -> Option<UnitGroup> {
    let code = name.split('_').next().unwrap_or(name);
    let by_code = match code {
        "TM" | "TX" | "TN" => Some(UnitGroup::Temperature),
        "HR" | "HRM" | "HRX" | "HRN" => Some(UnitGroup::Humidity),
        "PPT" => Some(UnitGroup::Rain),
        "VVM" | "VVX" => Some(UnitGroup::Speed),
        "DVM" | "DVX" => Some(UnitGroup::Direction),
        "PM" => Some(UnitGroup::Pressure),
        "RS" => Some(UnitGroup::Radiation),
        "GN" => Some(UnitGroup::SnowDepth),
        _ => None,
    };
    by_code.or_else(|| unit_hint(name))
}

fn unit_hint(name: &str) -> Option<UnitGroup> {
    if name.ends_with("grausC") {
        Some(UnitGroup::Temperature)
    } else if name.ends_with("km_h") {
        Some(UnitGroup::Speed)
    } else if name.ends_with("hPa") {
        Some(UnitGroup::Pressure)
    } else if name.ends_with("perc") {
        Some(UnitGroup::Humidity)
    } else if name.ends_with("W_m2") || name.ends_with("W_m_2") {
        Some(UnitGroup::Radiation)
    } else if name.ends_with("_mm") {
        Some(UnitGroup::Rain)
    } else {
        None
    }
}

/// Attach the unit for `name` to a cleaned value
///
/// Empty values stay empty. Directions keep only their first run of digits.
pub fn with_unit(name: &str, value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        return String::new();
    }

    match get_unit_group(name) {
        Some(UnitGroup::Direction) => {
            let digits: String = value
                .chars()
                .skip_while(|c| !c.is_ascii_digit())
                .take_while(|c| c.is_ascii_digit())
                .collect();
            if digits.is_empty() {
                value.to_string()
            } else {
                format!("{digits}{}", UnitGroup::Direction.suffix())
            }
        }
        Some(group) => format!("{value} {}", group.suffix()),
        None => value.to_string(),
    }
}
