use crate::Error;

use serde::{Serialize, Deserialize, Deserializer, de};
use std::convert::TryFrom;
use std::fmt;

/// A usb vendor or product id, as it arrives from the outside
///
/// Ids may come as json numbers, decimal strings, or `0x` prefixed hexadecimal strings. Integral floats such as `1208.0` are taken as numbers.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum UsbId {
    Number(i64),
    Text(String)
}

impl UsbId {
    /// Zero and the empty string count as a missing id
    pub fn is_absent(&self) -> bool {
        match self {
            UsbId::Number(n) => *n == 0,
            UsbId::Text(s) => s.is_empty()
        }
    }

    /// Normalizes the id to its 16 bit value
    ///
    /// ```rust
    /// use escpos_usb_print::UsbId;
    /// assert_eq!(UsbId::from("0x04b8").normalize().unwrap(), 1208);
    /// assert_eq!(UsbId::from("1208").normalize().unwrap(), 1208);
    /// assert_eq!(UsbId::from(1208).normalize().unwrap(), 1208);
    /// assert!(UsbId::from("04b8").normalize().is_err());
    /// ```
    pub fn normalize(&self) -> Result<u16, Error> {
        match self {
            UsbId::Number(n) => u16::try_from(*n).map_err(|_| Error::InvalidIdentifier(n.to_string())),
            UsbId::Text(s) => parse_usb_id(s)
        }
    }
}

impl From<i64> for UsbId {
    fn from(n: i64) -> UsbId {
        UsbId::Number(n)
    }
}

impl From<&str> for UsbId {
    fn from(s: &str) -> UsbId {
        UsbId::Text(s.to_string())
    }
}

impl From<String> for UsbId {
    fn from(s: String) -> UsbId {
        UsbId::Text(s)
    }
}

impl<'de> Deserialize<'de> for UsbId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<UsbId, D::Error> {
        deserializer.deserialize_any(UsbIdVisitor)
    }
}

struct UsbIdVisitor;

impl<'de> de::Visitor<'de> for UsbIdVisitor {
    type Value = UsbId;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a usb id as an integer or a string")
    }

    fn visit_i64<E: de::Error>(self, n: i64) -> Result<UsbId, E> {
        Ok(UsbId::Number(n))
    }

    fn visit_u64<E: de::Error>(self, n: u64) -> Result<UsbId, E> {
        i64::try_from(n)
            .map(UsbId::Number)
            .map_err(|_| E::custom(Error::InvalidIdentifier(n.to_string())))
    }

    fn visit_f64<E: de::Error>(self, n: f64) -> Result<UsbId, E> {
        // Anything that survives the range check is exactly representable
        if n.fract() == 0.0 && n >= 0.0 && n <= f64::from(u16::MAX) {
            Ok(UsbId::Number(n as i64))
        } else {
            Err(E::custom(Error::InvalidIdentifier(n.to_string())))
        }
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<UsbId, E> {
        Ok(UsbId::Text(s.to_string()))
    }

    fn visit_string<E: de::Error>(self, s: String) -> Result<UsbId, E> {
        Ok(UsbId::Text(s))
    }
}

fn parse_usb_id(raw: &str) -> Result<u16, Error> {
    let trimmed = raw.trim();
    let parsed = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => trimmed.parse::<u16>()
    };
    parsed.map_err(|_| Error::InvalidIdentifier(raw.to_string()))
}

/// Print request, exactly as received
///
/// Every field is optional at this stage, [validate](PrintRequest::validate) turns it into a [PrintJob](crate::PrintJob).
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct PrintRequest {
    pub vendor_id: Option<UsbId>,
    pub product_id: Option<UsbId>,
    /// Text to be printed, missing means empty
    pub text: Option<String>,
    /// Cut the paper after printing, missing or `null` means `true`
    pub cut: Option<bool>,
    /// Usb interface to try first, missing means 0
    pub interface: Option<u8>
}

impl PrintRequest {
    /// Builds a request from positional command line arguments
    ///
    /// Only the literal `true` (in any case) enables the cut when the flag is present.
    /// ```rust
    /// use escpos_usb_print::PrintRequest;
    /// let request = PrintRequest::from_args("0x04b8", "0x0202", "Hello", Some("TRUE"));
    /// assert_eq!(request.cut, Some(true));
    /// let request = PrintRequest::from_args("0x04b8", "0x0202", "Hello", Some("yes"));
    /// assert_eq!(request.cut, Some(false));
    /// ```
    pub fn from_args(vendor_id: &str, product_id: &str, text: &str, cut: Option<&str>) -> PrintRequest {
        PrintRequest {
            vendor_id: Some(vendor_id.into()),
            product_id: Some(product_id.into()),
            text: Some(text.to_string()),
            cut: cut.map(|flag| flag.eq_ignore_ascii_case("true")),
            interface: None
        }
    }

    /// Checks the required ids and normalizes them
    pub fn validate(&self) -> Result<PrintJob, Error> {
        let (vendor_id, product_id) = match (&self.vendor_id, &self.product_id) {
            (Some(vendor_id), Some(product_id)) if !vendor_id.is_absent() && !product_id.is_absent() => (vendor_id, product_id),
            _ => return Err(Error::MissingIdentifiers)
        };
        Ok(PrintJob {
            vendor_id: vendor_id.normalize()?,
            product_id: product_id.normalize()?,
            text: self.text.clone().unwrap_or_default(),
            cut: self.cut.unwrap_or(true),
            interface: self.interface.unwrap_or(0)
        })
    }
}

/// A validated print request, ready to be sent to a device
#[derive(Clone, Debug, PartialEq)]
pub struct PrintJob {
    pub vendor_id: u16,
    pub product_id: u16,
    pub text: String,
    pub cut: bool,
    pub interface: u8
}
