//! Check form: raw submitted values and validation into a transaction.
//!
//! Blank numeric fields take the widget defaults (amount and coordinates 0,
//! hour 12, day 15, month 6). Text that is not a number is rejected while
//! the request is being decoded.

use crate::distance::Coordinates;
use crate::types::{Gender, TransactionInput};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

pub const DEFAULT_HOUR: u8 = 12;
pub const DEFAULT_DAY: u8 = 15;
pub const DEFAULT_MONTH: u8 = 6;

/// Fields that must be non-empty before a check runs
pub const REQUIRED_FIELDS: [&str; 3] = ["merchant", "category", "cc_num"];

/// Validation failure. Nothing is predicted or logged when this is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormError {
    #[error("Please fill all required fields! Missing: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("{field} must be a whole number, got {value}")]
    NotWhole { field: &'static str, value: f64 },
}

/// Raw field values as submitted, before validation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionForm {
    pub merchant: String,
    pub category: String,
    #[serde(deserialize_with = "optional_number")]
    pub amt: Option<f64>,
    #[serde(deserialize_with = "optional_number")]
    pub lat: Option<f64>,
    #[serde(deserialize_with = "optional_number")]
    pub long: Option<f64>,
    #[serde(deserialize_with = "optional_number")]
    pub merch_lat: Option<f64>,
    #[serde(deserialize_with = "optional_number")]
    pub merch_long: Option<f64>,
    #[serde(deserialize_with = "optional_number")]
    pub hour: Option<f64>,
    #[serde(deserialize_with = "optional_number")]
    pub day: Option<f64>,
    #[serde(deserialize_with = "optional_number")]
    pub month: Option<f64>,
    pub gender: Gender,
    pub cc_num: String,
}

impl SubmissionForm {
    /// Check required fields and widget ranges
    pub fn validate(&self) -> Result<TransactionInput, FormError> {
        let missing: Vec<&'static str> = REQUIRED_FIELDS
            .into_iter()
            .zip([&self.merchant, &self.category, &self.cc_num])
            .filter(|(_, value)| value.is_empty())
            .map(|(name, _)| name)
            .collect();
        if !missing.is_empty() {
            return Err(FormError::MissingFields(missing));
        }

        let amt = self.amt.unwrap_or(0.0);
        if amt.is_nan() || amt < 0.0 {
            return Err(FormError::OutOfRange {
                field: "amt",
                value: amt,
                min: 0.0,
                max: f64::INFINITY,
            });
        }

        Ok(TransactionInput {
            merchant: self.merchant.clone(),
            category: self.category.clone(),
            amt,
            customer: Coordinates::new(self.lat.unwrap_or(0.0), self.long.unwrap_or(0.0)),
            merchant_location: Coordinates::new(
                self.merch_lat.unwrap_or(0.0),
                self.merch_long.unwrap_or(0.0),
            ),
            hour: slider("hour", self.hour, DEFAULT_HOUR, 0, 23)?,
            day: slider("day", self.day, DEFAULT_DAY, 1, 31)?,
            month: slider("month", self.month, DEFAULT_MONTH, 1, 12)?,
            gender: self.gender,
            cc_num: self.cc_num.clone(),
        })
    }
}

impl From<&TransactionInput> for SubmissionForm {
    fn from(tx: &TransactionInput) -> Self {
        Self {
            merchant: tx.merchant.clone(),
            category: tx.category.clone(),
            amt: Some(tx.amt),
            lat: Some(tx.customer.lat),
            long: Some(tx.customer.lon),
            merch_lat: Some(tx.merchant_location.lat),
            merch_long: Some(tx.merchant_location.lon),
            hour: Some(f64::from(tx.hour)),
            day: Some(f64::from(tx.day)),
            month: Some(f64::from(tx.month)),
            gender: tx.gender,
            cc_num: tx.cc_num.clone(),
        }
    }
}

fn slider(field: &'static str, value: Option<f64>, default: u8, min: u8, max: u8) -> Result<u8, FormError> {
    let Some(value) = value else {
        return Ok(default);
    };
    if value.fract() != 0.0 {
        return Err(FormError::NotWhole { field, value });
    }
    if value < f64::from(min) || value > f64::from(max) {
        return Err(FormError::OutOfRange {
            field,
            value,
            min: f64::from(min),
            max: f64::from(max),
        });
    }
    Ok(value as u8)
}

/// Accepts a JSON number, a numeric string, or a blank string (as `None`)
fn optional_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    struct NumberVisitor;

    impl<'de> de::Visitor<'de> for NumberVisitor {
        type Value = Option<f64>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a number or a blank string")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v as f64))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v as f64))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            let v = v.trim();
            if v.is_empty() {
                return Ok(None);
            }
            v.parse::<f64>()
                .map(Some)
                .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
            d.deserialize_any(NumberVisitor)
        }
    }

    deserializer.deserialize_any(NumberVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> SubmissionForm {
        SubmissionForm {
            merchant: "ShopCo".to_string(),
            category: "grocery".to_string(),
            cc_num: "4111111111111111".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_applied() {
        let tx = filled().validate().unwrap();

        assert_eq!(tx.amt, 0.0);
        assert_eq!(tx.customer, Coordinates::new(0.0, 0.0));
        assert_eq!((tx.hour, tx.day, tx.month), (12, 15, 6));
        assert_eq!(tx.gender, Gender::Male);
    }

    #[test]
    fn test_missing_required_fields() {
        for field in REQUIRED_FIELDS {
            let mut form = filled();
            match field {
                "merchant" => form.merchant.clear(),
                "category" => form.category.clear(),
                _ => form.cc_num.clear(),
            }
            assert_eq!(form.validate(), Err(FormError::MissingFields(vec![field])));
        }

        let err = SubmissionForm::default().validate().unwrap_err();
        assert_eq!(
            err,
            FormError::MissingFields(vec!["merchant", "category", "cc_num"])
        );
        assert!(err.to_string().starts_with("Please fill all required fields!"));
    }

    #[test]
    fn test_slider_ranges() {
        let mut form = filled();
        form.hour = Some(24.0);
        assert!(matches!(
            form.validate(),
            Err(FormError::OutOfRange { field: "hour", .. })
        ));

        let mut form = filled();
        form.day = Some(0.0);
        assert!(matches!(
            form.validate(),
            Err(FormError::OutOfRange { field: "day", .. })
        ));

        let mut form = filled();
        form.month = Some(6.5);
        assert!(matches!(
            form.validate(),
            Err(FormError::NotWhole { field: "month", .. })
        ));

        let mut form = filled();
        form.hour = Some(0.0);
        form.day = Some(31.0);
        form.month = Some(12.0);
        let tx = form.validate().unwrap();
        assert_eq!((tx.hour, tx.day, tx.month), (0, 31, 12));
    }

    #[test]
    fn test_negative_amount_rejected() {
        let mut form = filled();
        form.amt = Some(-0.01);
        assert!(matches!(
            form.validate(),
            Err(FormError::OutOfRange { field: "amt", .. })
        ));
    }

    #[test]
    fn test_coordinates_not_validated() {
        let mut form = filled();
        form.lat = Some(123.0);
        form.merch_long = Some(-999.0);
        let tx = form.validate().unwrap();
        assert_eq!(tx.customer.lat, 123.0);
        assert_eq!(tx.merchant_location.lon, -999.0);
    }

    #[test]
    fn test_json_numbers_and_strings() {
        let form: SubmissionForm = serde_json::from_str(
            r#"{"merchant": "ShopCo", "category": "grocery", "cc_num": "1",
                "amt": 42.5, "lat": "40.0", "long": "", "hour": 14, "gender": "Female"}"#,
        )
        .unwrap();

        assert_eq!(form.amt, Some(42.5));
        assert_eq!(form.lat, Some(40.0));
        assert_eq!(form.long, None);
        assert_eq!(form.hour, Some(14.0));
        assert_eq!(form.day, None);
        assert_eq!(form.gender, Gender::Female);
    }

    #[test]
    fn test_malformed_number_rejected() {
        let result: Result<SubmissionForm, _> =
            serde_json::from_str(r#"{"merchant": "a", "amt": "forty"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_round_trip_from_transaction() {
        let tx = filled().validate().unwrap();
        assert_eq!(SubmissionForm::from(&tx).validate().unwrap(), tx);
    }
}
