//! Built-in simple-type bindings
//!
//! Bindings for the XSD built-in types. Each parses the component's text
//! into a typed value; an empty text passes the incoming value through
//! unchanged, so chains over elements without text content still work.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use url::Url;

use crate::error::{Error, Result};
use crate::instance::{BoundValue, InstanceComponent};
use crate::namespaces::QName;
use crate::schema::xs;

use super::{BindingRegistry, SimpleBinding};

/// Register every built-in binding
pub fn register(registry: &mut BindingRegistry) {
    registry.register_simple(XsStringBinding);
    registry.register_simple(XsBooleanBinding);
    registry.register_simple(XsDecimalBinding);
    registry.register_simple(XsIntegerBinding);
    registry.register_simple(XsLongBinding);
    registry.register_simple(XsIntBinding);
    registry.register_simple(XsDoubleBinding);
    registry.register_simple(XsFloatBinding);
    registry.register_simple(XsDateTimeBinding);
    registry.register_simple(XsDateBinding);
    registry.register_simple(XsAnyUriBinding);
    registry.register_simple(XsBase64BinaryBinding);
    registry.register_simple(XsHexBinaryBinding);
}

fn trimmed(component: &dyn InstanceComponent) -> Option<&str> {
    let text = component.text().trim();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

macro_rules! simple_binding {
    ($binding:ident, $local:literal, $text:ident => $parse:expr) => {
        #[doc = concat!("Binding for xs:", $local)]
        pub struct $binding;

        impl SimpleBinding for $binding {
            fn target(&self) -> QName {
                xs($local)
            }

            fn parse(
                &self,
                component: &dyn InstanceComponent,
                value: Option<BoundValue>,
            ) -> Result<Option<BoundValue>> {
                match trimmed(component) {
                    Some($text) => Ok(Some(Box::new($parse?))),
                    None => Ok(value),
                }
            }
        }
    };
}

simple_binding!(XsStringBinding, "string", text => {
    Ok::<String, Error>(text.to_string())
});

simple_binding!(XsBooleanBinding, "boolean", text => match text {
    "true" | "1" => Ok(true),
    "false" | "0" => Ok(false),
    other => Err(Error::Value(format!("not a boolean: '{}'", other))),
});

simple_binding!(XsDecimalBinding, "decimal", text => {
    text.parse::<Decimal>()
        .map_err(|e| Error::Value(format!("not a decimal: '{}': {}", text, e)))
});

simple_binding!(XsIntegerBinding, "integer", text => {
    text.parse::<i64>()
        .map_err(|_| Error::Value(format!("not an integer: '{}'", text)))
});

simple_binding!(XsLongBinding, "long", text => {
    text.parse::<i64>()
        .map_err(|_| Error::Value(format!("not a long: '{}'", text)))
});

simple_binding!(XsIntBinding, "int", text => {
    text.parse::<i32>()
        .map_err(|_| Error::Value(format!("not an int: '{}'", text)))
});

simple_binding!(XsDoubleBinding, "double", text => {
    text.parse::<f64>()
        .map_err(|_| Error::Value(format!("not a double: '{}'", text)))
});

simple_binding!(XsFloatBinding, "float", text => {
    text.parse::<f32>()
        .map_err(|_| Error::Value(format!("not a float: '{}'", text)))
});

simple_binding!(XsDateTimeBinding, "dateTime", text => parse_date_time(text));

simple_binding!(XsDateBinding, "date", text => {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|_| Error::Value(format!("not a date: '{}'", text)))
});

simple_binding!(XsAnyUriBinding, "anyURI", text => {
    Url::parse(text).map_err(|e| Error::Value(format!("not a URI: '{}': {}", text, e)))
});

simple_binding!(XsBase64BinaryBinding, "base64Binary", text => {
    BASE64
        .decode(text.as_bytes())
        .map_err(|e| Error::Value(format!("not base64 data: {}", e)))
});

simple_binding!(XsHexBinaryBinding, "hexBinary", text => decode_hex(text));

/// xs:dateTime: timezone-qualified or local (treated as UTC)
fn parse_date_time(text: &str) -> Result<DateTime<FixedOffset>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Ok(parsed);
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Utc.from_utc_datetime(&naive).fixed_offset())
        .map_err(|_| Error::Value(format!("not a dateTime: '{}'", text)))
}

fn decode_hex(text: &str) -> Result<Vec<u8>> {
    if text.len() % 2 != 0 {
        return Err(Error::Value(format!(
            "hexBinary has odd length: '{}'",
            text
        )));
    }
    (0..text.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&text[i..i + 2], 16)
                .map_err(|_| Error::Value(format!("not hex data: '{}'", text)))
        })
        .collect()
}
