//! Unit conversion handler.
//!
//! Linear units convert through a base unit per family; temperatures go
//! through Celsius.

use async_trait::async_trait;

use switchboard_core::Capability;

use crate::error::ToolError;
use crate::handler::{wrong_args, ToolHandler};
use crate::types::{ToolArgs, ToolOutput};

pub const UNSUPPORTED_HINT: &str =
    "Try: celsius/fahrenheit/kelvin, km/miles/meters/feet, kg/pounds/grams/ounces";

#[derive(Debug, Clone, Copy, PartialEq)]
enum Unit {
    Celsius,
    Fahrenheit,
    Kelvin,
    /// Factor to meters.
    Distance(f64),
    /// Factor to grams.
    Mass(f64),
}

fn parse_unit(raw: &str) -> Option<Unit> {
    let key: String = raw
        .chars()
        .filter(|c| c.is_alphabetic())
        .collect::<String>()
        .to_lowercase();
    let unit = match key.as_str() {
        "c" | "celsius" | "centigrade" | "degc" => Unit::Celsius,
        "f" | "fahrenheit" | "degf" => Unit::Fahrenheit,
        "k" | "kelvin" | "kelvins" => Unit::Kelvin,
        "km" | "kms" | "kilometer" | "kilometers" | "kilometre" | "kilometres" => Unit::Distance(1000.0),
        "mi" | "mile" | "miles" => Unit::Distance(1609.344),
        "m" | "meter" | "meters" | "metre" | "metres" => Unit::Distance(1.0),
        "ft" | "foot" | "feet" => Unit::Distance(0.3048),
        "kg" | "kgs" | "kilogram" | "kilograms" | "kilo" | "kilos" => Unit::Mass(1000.0),
        "lb" | "lbs" | "pound" | "pounds" => Unit::Mass(453.592_37),
        "g" | "gram" | "grams" => Unit::Mass(1.0),
        "oz" | "ounce" | "ounces" => Unit::Mass(28.349_523_125),
        _ => return None,
    };
    Some(unit)
}

fn to_celsius(value: f64, unit: Unit) -> Option<f64> {
    match unit {
        Unit::Celsius => Some(value),
        Unit::Fahrenheit => Some((value - 32.0) * 5.0 / 9.0),
        Unit::Kelvin => Some(value - 273.15),
        _ => None,
    }
}

fn from_celsius(value: f64, unit: Unit) -> Option<f64> {
    match unit {
        Unit::Celsius => Some(value),
        Unit::Fahrenheit => Some(value * 9.0 / 5.0 + 32.0),
        Unit::Kelvin => Some(value + 273.15),
        _ => None,
    }
}

/// Convert `value` between two unit names. `None` when the pair is unsupported.
pub fn convert(value: f64, from: &str, to: &str) -> Option<f64> {
    let (from, to) = (parse_unit(from)?, parse_unit(to)?);
    match (from, to) {
        (Unit::Distance(a), Unit::Distance(b)) | (Unit::Mass(a), Unit::Mass(b)) => Some(value * a / b),
        _ => from_celsius(to_celsius(value, from)?, to),
    }
}

/// Handler for unit conversions.
pub struct UnitConverterHandler;

#[async_trait]
impl ToolHandler for UnitConverterHandler {
    fn capability(&self) -> Capability {
        Capability::UnitConverter
    }

    async fn execute(&self, args: &ToolArgs) -> Result<ToolOutput, ToolError> {
        let ToolArgs::UnitConversion {
            value,
            from_unit,
            to_unit,
        } = args
        else {
            return Err(wrong_args(self.capability(), args));
        };

        let amount: f64 = value
            .trim()
            .parse()
            .map_err(|_| ToolError::InvalidInput(format!("'{}' is not a number", value)))?;

        let text = match convert(amount, from_unit, to_unit) {
            Some(result) => format!(
                "{} {} = {:.2} {}",
                value.trim(),
                from_unit.trim(),
                result,
                to_unit.trim()
            ),
            None => format!(
                "Conversion not supported: {} to {}. {}",
                from_unit.trim(),
                to_unit.trim(),
                UNSUPPORTED_HINT
            ),
        };
        Ok(ToolOutput::text(text))
    }

    fn describe(&self, args: &ToolArgs) -> String {
        match args {
            ToolArgs::UnitConversion {
                from_unit, to_unit, ..
            } => format!("Convert {} to {}", from_unit, to_unit),
            _ => "Convert units".to_string(),
        }
    }
}
