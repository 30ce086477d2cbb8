//! Input contracts: which fields a payload may carry and what each must look like.
//! Independent of the persistence records; the service layer composes the two.

use crate::error::{AppError, FieldErrors};
use crate::model::{EMAIL_MAX_LEN, NAME_MAX_LEN, PHONE_MAX_LEN};
use serde_json::{Map, Value};

pub const MISSING: &str = "Missing data for required field.";
pub const NULL: &str = "Field may not be null.";
pub const NOT_A_STRING: &str = "Not a valid string.";
pub const UNKNOWN: &str = "Unknown field.";
pub const INVALID_INPUT: &str = "Invalid input type.";
pub const NUL_CHAR: &str = "Must not contain NUL characters.";

/// Key under which whole-payload errors are reported.
pub const SCHEMA_KEY: &str = "_schema";

#[derive(Clone, Copy, Debug)]
pub struct FieldRule {
    pub required: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
}

impl FieldRule {
    pub const fn required_string() -> Self {
        FieldRule {
            required: true,
            min_length: None,
            max_length: None,
        }
    }

    pub const fn min(mut self, n: usize) -> Self {
        self.min_length = Some(n);
        self
    }

    pub const fn max(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }
}

/// A named set of string fields. `ignored` keys are accepted and dropped (e.g. a client echoing `id`).
#[derive(Clone, Copy, Debug)]
pub struct Contract {
    pub fields: &'static [(&'static str, FieldRule)],
    pub ignored: &'static [&'static str],
}

pub const CUSTOMER_CONTRACT: Contract = Contract {
    fields: &[
        ("name", FieldRule::required_string().min(1).max(NAME_MAX_LEN)),
        ("email", FieldRule::required_string().max(EMAIL_MAX_LEN)),
        ("phone", FieldRule::required_string().max(PHONE_MAX_LEN)),
    ],
    ignored: &["id"],
};

pub struct RequestValidator;

impl RequestValidator {
    /// Check `body` against `contract`, collecting every failing field.
    /// Returns the object on success so callers can pull typed values from it.
    pub fn validate<'a>(body: &'a Value, contract: &Contract) -> Result<&'a Map<String, Value>, AppError> {
        let Value::Object(obj) = body else {
            let mut errors = FieldErrors::new();
            errors.insert(SCHEMA_KEY.into(), vec![INVALID_INPUT.into()]);
            return Err(AppError::Validation(errors));
        };

        let mut errors = FieldErrors::new();
        for (field, rule) in contract.fields {
            if let Some(msg) = check_field(obj.get(*field), rule) {
                errors.entry((*field).to_string()).or_default().push(msg);
            }
        }
        for key in obj.keys() {
            let known = contract.fields.iter().any(|(f, _)| *f == key.as_str())
                || contract.ignored.iter().any(|i| *i == key.as_str());
            if !known {
                errors.entry(key.clone()).or_default().push(UNKNOWN.into());
            }
        }

        if errors.is_empty() {
            Ok(obj)
        } else {
            Err(AppError::Validation(errors))
        }
    }
}

fn check_field(value: Option<&Value>, rule: &FieldRule) -> Option<String> {
    let s = match value {
        None if rule.required => return Some(MISSING.into()),
        None => return None,
        Some(Value::Null) => return Some(NULL.into()),
        Some(Value::String(s)) => s,
        Some(_) => return Some(NOT_A_STRING.into()),
    };
    // PostgreSQL text types cannot store U+0000
    if s.contains('\0') {
        return Some(NUL_CHAR.into());
    }
    let len = s.chars().count();
    if let Some(min) = rule.min_length {
        if len < min {
            return Some(format!("Shorter than minimum length {}.", min));
        }
    }
    if let Some(max) = rule.max_length {
        if len > max {
            return Some(format!("Longer than maximum length {}.", max));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn errors(body: Value) -> FieldErrors {
        match RequestValidator::validate(&body, &CUSTOMER_CONTRACT) {
            Err(AppError::Validation(e)) => e,
            other => panic!("expected validation error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn accepts_complete_payload() {
        let body = json!({"name": "Ada", "email": "ada@x.com", "phone": "555-0100"});
        let obj = RequestValidator::validate(&body, &CUSTOMER_CONTRACT).unwrap();
        assert_eq!(obj["name"], "Ada");
    }

    #[test]
    fn reports_every_missing_field() {
        let e = errors(json!({}));
        assert_eq!(e.len(), 3);
        assert_eq!(e["email"], vec![MISSING.to_string()]);
        assert_eq!(e["phone"], vec![MISSING.to_string()]);
    }

    #[test]
    fn type_and_null_errors() {
        let e = errors(json!({"name": 5, "email": null, "phone": "1"}));
        assert_eq!(e["name"], vec![NOT_A_STRING.to_string()]);
        assert_eq!(e["email"], vec![NULL.to_string()]);
        assert!(!e.contains_key("phone"));
    }

    #[test]
    fn length_limits() {
        let e = errors(json!({"name": "", "email": "a@b", "phone": "0123456789012345"}));
        assert_eq!(e["name"], vec!["Shorter than minimum length 1.".to_string()]);
        assert_eq!(e["phone"], vec!["Longer than maximum length 15.".to_string()]);
    }

    #[test]
    fn nul_character_rejected() {
        let e = errors(json!({"name": "A\u{0}da", "email": "a@x", "phone": "1"}));
        assert_eq!(e.len(), 1);
        assert_eq!(e["name"], vec![NUL_CHAR.to_string()]);
    }

    #[test]
    fn unknown_fields_rejected_but_id_ignored() {
        let e = errors(json!({"name": "Ada", "email": "a@b", "phone": "1", "id": 9, "vip": true}));
        assert_eq!(e.len(), 1);
        assert_eq!(e["vip"], vec![UNKNOWN.to_string()]);
    }

    #[test]
    fn non_object_body() {
        let e = errors(json!(["Ada"]));
        assert_eq!(e[SCHEMA_KEY], vec![INVALID_INPUT.to_string()]);
    }
}
