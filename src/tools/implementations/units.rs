//! Unit conversion over static factor tables
//!
//! Every category except temperature scales linearly through a base unit.

use crate::errors::Result;
use crate::tools::implementations::text::format_general;
use crate::tools::types::{Tool, ToolCategory};
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;

type Table = &'static [(&'static str, f64)];

const LENGTH: Table = &[
    ("m", 1.0), ("meter", 1.0), ("meters", 1.0),
    ("km", 1000.0), ("kilometer", 1000.0), ("kilometers", 1000.0),
    ("cm", 0.01), ("centimeter", 0.01), ("centimeters", 0.01),
    ("mm", 0.001), ("millimeter", 0.001), ("millimeters", 0.001),
    ("mi", 1609.344), ("mile", 1609.344), ("miles", 1609.344),
    ("yd", 0.9144), ("yard", 0.9144), ("yards", 0.9144),
    ("ft", 0.3048), ("foot", 0.3048), ("feet", 0.3048),
    ("in", 0.0254), ("inch", 0.0254), ("inches", 0.0254),
    ("nm", 1852.0), ("nautical_mile", 1852.0), ("nautical_miles", 1852.0),
];

const MASS: Table = &[
    ("kg", 1.0), ("kilogram", 1.0), ("kilograms", 1.0),
    ("g", 0.001), ("gram", 0.001), ("grams", 0.001),
    ("mg", 0.000001), ("milligram", 0.000001), ("milligrams", 0.000001),
    ("lb", 0.453592), ("lbs", 0.453592), ("pound", 0.453592), ("pounds", 0.453592),
    ("oz", 0.0283495), ("ounce", 0.0283495), ("ounces", 0.0283495),
    ("ton", 1000.0), ("tons", 1000.0), ("tonne", 1000.0), ("tonnes", 1000.0),
    ("st", 6.35029), ("stone", 6.35029), ("stones", 6.35029),
];

const VOLUME: Table = &[
    ("l", 1.0), ("liter", 1.0), ("liters", 1.0), ("litre", 1.0), ("litres", 1.0),
    ("ml", 0.001), ("milliliter", 0.001), ("milliliters", 0.001),
    ("gal", 3.78541), ("gallon", 3.78541), ("gallons", 3.78541),
    ("qt", 0.946353), ("quart", 0.946353), ("quarts", 0.946353),
    ("pt", 0.473176), ("pint", 0.473176), ("pints", 0.473176),
    ("cup", 0.236588), ("cups", 0.236588),
    ("floz", 0.0295735), ("fl_oz", 0.0295735), ("fluid_ounce", 0.0295735),
    ("tbsp", 0.0147868), ("tablespoon", 0.0147868), ("tablespoons", 0.0147868),
    ("tsp", 0.00492892), ("teaspoon", 0.00492892), ("teaspoons", 0.00492892),
    ("m3", 1000.0), ("cubic_meter", 1000.0), ("cubic_meters", 1000.0),
];

const TIME: Table = &[
    ("s", 1.0), ("sec", 1.0), ("second", 1.0), ("seconds", 1.0),
    ("ms", 0.001), ("millisecond", 0.001), ("milliseconds", 0.001),
    ("min", 60.0), ("minute", 60.0), ("minutes", 60.0),
    ("h", 3600.0), ("hr", 3600.0), ("hour", 3600.0), ("hours", 3600.0),
    ("d", 86400.0), ("day", 86400.0), ("days", 86400.0),
    ("wk", 604800.0), ("week", 604800.0), ("weeks", 604800.0),
    // 30 and 365 days
    ("mo", 2592000.0), ("month", 2592000.0), ("months", 2592000.0),
    ("yr", 31536000.0), ("year", 31536000.0), ("years", 31536000.0),
];

const SPEED: Table = &[
    ("mps", 1.0), ("m/s", 1.0),
    ("kph", 0.277778), ("km/h", 0.277778), ("kmh", 0.277778),
    ("mph", 0.44704),
    ("knot", 0.514444), ("knots", 0.514444),
    ("fps", 0.3048), ("ft/s", 0.3048),
];

const AREA: Table = &[
    ("sqm", 1.0), ("m2", 1.0), ("sq_m", 1.0), ("square_meter", 1.0), ("square_meters", 1.0),
    ("sqkm", 1e6), ("km2", 1e6), ("square_kilometer", 1e6),
    ("sqft", 0.092903), ("ft2", 0.092903), ("square_foot", 0.092903), ("square_feet", 0.092903),
    ("sqmi", 2589988.0), ("mi2", 2589988.0), ("square_mile", 2589988.0), ("square_miles", 2589988.0),
    ("acre", 4046.86), ("acres", 4046.86),
    ("hectare", 10000.0), ("hectares", 10000.0), ("ha", 10000.0),
];

const DATA: Table = &[
    ("b", 1.0), ("byte", 1.0), ("bytes", 1.0),
    ("kb", 1024.0), ("kilobyte", 1024.0), ("kilobytes", 1024.0),
    ("mb", 1048576.0), ("megabyte", 1048576.0), ("megabytes", 1048576.0),
    ("gb", 1073741824.0), ("gigabyte", 1073741824.0), ("gigabytes", 1073741824.0),
    ("tb", 1099511627776.0), ("terabyte", 1099511627776.0), ("terabytes", 1099511627776.0),
    ("pb", 1125899906842624.0), ("petabyte", 1125899906842624.0),
];

const CATEGORIES: &[(&str, Table)] = &[
    ("length", LENGTH),
    ("weight", MASS),
    ("volume", VOLUME),
    ("time", TIME),
    ("speed", SPEED),
    ("area", AREA),
    ("data", DATA),
];

const HELP: &str = "Unit Converter Help:

FORMAT:
  5 km to miles
  convert 100 F to C
  10 pounds to kg

SUPPORTED UNITS:

Length: m, km, cm, mm, mi (miles), yd, ft, in, nm (nautical miles)

Weight: kg, g, mg, lb (pounds), oz (ounces), ton, stone

Volume: l, ml, gal (gallons), qt (quarts), pt (pints), cup,
        floz (fluid oz), tbsp, tsp, m3 (cubic meters)

Time: s, ms, min, h (hours), d (days), wk (weeks), mo (months), yr (years)

Speed: m/s, km/h, mph, knots, ft/s

Area: sqm, sqft, sqmi, acre, hectare, km2, m2

Temperature: C (Celsius), F (Fahrenheit), K (Kelvin)

Data: b (bytes), kb, mb, gb, tb, pb";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Temperature {
    Celsius,
    Fahrenheit,
    Kelvin,
}

impl Temperature {
    fn parse(unit: &str) -> Option<Self> {
        match unit {
            "c" | "celsius" => Some(Temperature::Celsius),
            "f" | "fahrenheit" => Some(Temperature::Fahrenheit),
            "k" | "kelvin" => Some(Temperature::Kelvin),
            _ => None,
        }
    }

    fn to_celsius(self, value: f64) -> f64 {
        match self {
            Temperature::Celsius => value,
            Temperature::Fahrenheit => (value - 32.0) * 5.0 / 9.0,
            Temperature::Kelvin => value - 273.15,
        }
    }

    fn from_celsius(self, celsius: f64) -> f64 {
        match self {
            Temperature::Celsius => celsius,
            Temperature::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
            Temperature::Kelvin => celsius + 273.15,
        }
    }
}

fn normalize(unit: &str) -> String {
    unit.to_lowercase().replace(' ', "_")
}

/// Category name and factor for a normalized unit
fn lookup(unit: &str) -> Option<(&'static str, f64)> {
    CATEGORIES.iter().find_map(|(category, table)| {
        table
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, factor)| (*category, *factor))
    })
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Convert `value` between two units, returning the observation text
pub fn convert_units(value: f64, from: &str, to: &str) -> String {
    let from_key = normalize(from);
    let to_key = normalize(to);

    if let (Some(source), Some(target)) = (Temperature::parse(&from_key), Temperature::parse(&to_key)) {
        let result = target.from_celsius(source.to_celsius(value));
        return format!("{} {} = {} {}", format_value(value), from, format_general(result, 4), to);
    }

    let Some((from_category, from_factor)) = lookup(&from_key) else {
        return format!("Error: Unknown unit '{}'", from);
    };
    let Some((to_category, to_factor)) = lookup(&to_key) else {
        return format!("Error: Unknown unit '{}'", to);
    };

    if from_category != to_category {
        return format!(
            "Error: Cannot convert {} ({}) to {} ({})",
            from_category, from, to_category, to
        );
    }

    let result = value * from_factor / to_factor;
    format!("{} {} = {} {}", format_value(value), from, format_general(result, 6), to)
}

/// Parse and run a conversion request
pub fn convert(input: &str) -> String {
    static REQUEST: OnceLock<Option<Regex>> = OnceLock::new();

    let input = input.trim();
    if input.is_empty() {
        return "Error: Empty conversion request".to_string();
    }
    if matches!(input.to_lowercase().as_str(), "help" | "?") {
        return HELP.to_string();
    }

    let captures = REQUEST
        .get_or_init(|| {
            Regex::new(r"(?i)^(?:convert\s+)?(-?[\d.]+)\s*([a-zA-Z_/]+)\s+to\s+([a-zA-Z_/]+)").ok()
        })
        .as_ref()
        .and_then(|re| re.captures(input));

    let Some(caps) = captures else {
        return "Error: Could not parse conversion request. \
                Use format: '5 km to miles' or 'convert 100 F to C'"
            .to_string();
    };

    match caps[1].parse::<f64>() {
        Ok(value) => convert_units(value, &caps[2], &caps[3]),
        Err(_) => format!("Error: could not convert string to float: '{}'", &caps[1]),
    }
}

/// Unit converter tool
#[derive(Debug, Clone, Default)]
pub struct UnitConverterTool;

impl UnitConverterTool {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for UnitConverterTool {
    fn name(&self) -> &str {
        "unit_converter"
    }

    fn description(&self) -> &str {
        "Convert between different units of measurement.\n\n\
         FORMAT: '5 km to miles', 'convert 100 F to C', '10 pounds to kg'\n\n\
         SUPPORTED UNITS:\n\
         - Length: m, km, cm, mm, mi, ft, in, yd\n\
         - Weight: kg, g, lb, oz, ton\n\
         - Volume: l, ml, gal, cup, tbsp, tsp\n\
         - Time: s, min, h, day, week, year\n\
         - Speed: m/s, km/h, mph, knots\n\
         - Area: sqm, sqft, acre, hectare\n\
         - Temperature: C, F, K\n\
         - Data: bytes, kb, mb, gb, tb"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::MathComputation
    }

    async fn call(&self, query: &str) -> Result<String> {
        Ok(convert(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_conversion() {
        assert_eq!(convert("5 km to miles"), "5 km = 3.10686 miles");
        assert_eq!(convert("convert 1 GB to MB"), "1 GB = 1024 MB");
        assert_eq!(convert("2 hours to min"), "2 hours = 120 min");
    }

    #[test]
    fn test_temperature() {
        assert_eq!(convert("100 F to C"), "100 F = 37.78 C");
        assert_eq!(convert("0 celsius to kelvin"), "0 celsius = 273.1 kelvin");
        assert_eq!(convert("-40 C to F"), "-40 C = -40 F");
    }

    #[test]
    fn test_errors() {
        assert_eq!(convert(""), "Error: Empty conversion request");
        assert_eq!(convert("5 parsecs to km"), "Error: Unknown unit 'parsecs'");
        assert_eq!(
            convert("5 kg to km"),
            "Error: Cannot convert weight (kg) to length (km)"
        );
        assert!(convert("how far is it").starts_with("Error: Could not parse"));
    }

    #[test]
    fn test_help() {
        assert!(convert("?").starts_with("Unit Converter Help:"));
    }
}
