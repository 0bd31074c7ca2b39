//! Step validation schemas
//!
//! A schema lists per-field checks and cross-field refinements. Failures are
//! reported per field path so the form can show them inline.

use crate::availability::AvailabilityMap;
use crate::payload::{FieldValue, StepPayload};
use crate::upload::{validate_file, FileConstraints};
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Checks for one step. Keys of `fields` are dotted paths into the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSchema {
    #[serde(default)]
    pub fields: BTreeMap<String, FieldSchema>,
    /// Run after all field checks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub refinements: Vec<Refinement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub requirement: Requirement,
    /// Checked in order; the first failure is reported.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    /// Numbers or numeric strings.
    Number,
    Boolean,
    /// `YYYY-MM-DD`.
    Date,
    File,
    List,
    Map,
    /// Day → `{ startTime, endTime }` map.
    Availability,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Requirement {
    #[default]
    Optional,
    Required { message: String },
    /// Required only while the sibling field `field` equals `equals`.
    RequiredWhen {
        field: String,
        equals: FieldValue,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Rule {
    Email { message: String },
    Url { message: String },
    MinLength { min: usize, message: String },
    MaxLength { max: usize, message: String },
    Min { min: f64, message: String },
    Max { max: f64, message: String },
    /// `value * 10^places` must be a whole number.
    DecimalPlaces { places: u32, message: String },
    OneOf { values: Vec<String>, message: String },
    Pattern { pattern: String, message: String },
    MinItems { min: usize, message: String },
    File { constraints: FileConstraints },
}

/// Cross-field checks, run after every field passed or failed on its own.
/// `path` is the field the message is attached to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "refine", rename_all = "snake_case")]
pub enum Refinement {
    DateAfter {
        start: String,
        end: String,
        path: String,
        message: String,
    },
    TimeAfter {
        start: String,
        end: String,
        path: String,
        message: String,
    },
    RequiredWhen {
        field: String,
        equals: FieldValue,
        path: String,
        message: String,
    },
}

/// Field path → message for every field that failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(transparent)]
#[error("validation failed for {} field(s)", .errors.len())]
pub struct ValidationErrors {
    errors: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the first message reported for a path.
    pub fn add(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.entry(path.into()).or_insert_with(|| message.into());
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.errors.get(path).map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.errors.contains_key(path)
    }

    pub fn has_errors_under(&self, path: &str) -> bool {
        let prefix = format!("{path}.");
        self.errors
            .keys()
            .any(|key| key == path || key.starts_with(&prefix))
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.errors.iter()
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.errors
    }
}

/// Anything that can check a step payload.
pub trait Validator {
    fn validate(&self, payload: &StepPayload) -> Result<(), ValidationErrors>;
}

impl ValidationSchema {
    pub fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
            refinements: Vec::new(),
        }
    }

    pub fn field(mut self, path: impl Into<String>, schema: FieldSchema) -> Self {
        self.fields.insert(path.into(), schema);
        self
    }

    pub fn refine(mut self, refinement: Refinement) -> Self {
        self.refinements.push(refinement);
        self
    }
}

impl Default for ValidationSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldSchema {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            requirement: Requirement::Optional,
            rules: Vec::new(),
        }
    }

    pub fn required(mut self, message: impl Into<String>) -> Self {
        self.requirement = Requirement::Required {
            message: message.into(),
        };
        self
    }

    pub fn required_when(
        mut self,
        field: impl Into<String>,
        equals: impl Into<FieldValue>,
        message: impl Into<String>,
    ) -> Self {
        self.requirement = Requirement::RequiredWhen {
            field: field.into(),
            equals: equals.into(),
            message: message.into(),
        };
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }
}

impl Validator for ValidationSchema {
    fn validate(&self, payload: &StepPayload) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        for (path, field) in &self.fields {
            validate_field(path, field, payload, &mut errors);
        }

        for refinement in &self.refinements {
            if let Some((path, message)) = evaluate_refinement(refinement, payload) {
                errors.add(path, message);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn validate_field(
    path: &str,
    field: &FieldSchema,
    payload: &StepPayload,
    errors: &mut ValidationErrors,
) {
    let value = payload.lookup(path).filter(|v| !v.is_blank());

    let Some(value) = value else {
        match &field.requirement {
            Requirement::Optional => {}
            Requirement::Required { message } => errors.add(path, message.clone()),
            Requirement::RequiredWhen {
                field: sibling,
                equals,
                message,
            } => {
                if condition_holds(payload, sibling, equals) {
                    errors.add(path, message.clone());
                }
            }
        }
        return;
    };

    if let Err(message) = check_type(field.field_type, value) {
        errors.add(path, message);
        return;
    }

    if field.field_type == FieldType::Availability {
        match AvailabilityMap::from_field_value(value, path) {
            Ok(map) => {
                for (p, m) in map.validate(path) {
                    errors.add(p, m);
                }
            }
            Err(found) => {
                for (p, m) in found {
                    errors.add(p, m);
                }
            }
        }
    }

    for rule in &field.rules {
        if let Err(message) = check_rule(rule, value) {
            errors.add(path, message);
            return;
        }
    }
}

fn condition_holds(payload: &StepPayload, field: &str, equals: &FieldValue) -> bool {
    payload.lookup(field).is_some_and(|v| v == equals)
}

fn check_type(field_type: FieldType, value: &FieldValue) -> Result<(), String> {
    let ok = match field_type {
        FieldType::String => value.as_str().is_some(),
        FieldType::Number => value.as_f64().is_some(),
        FieldType::Boolean => value.as_bool().is_some(),
        FieldType::Date => value.as_str().and_then(parse_date).is_some(),
        FieldType::File => value.as_file().is_some(),
        FieldType::List => value.as_list().is_some(),
        FieldType::Map | FieldType::Availability => value.as_map().is_some(),
    };
    if ok {
        return Ok(());
    }
    Err(match field_type {
        FieldType::Date => "Invalid date".to_string(),
        FieldType::Number => "Expected a number".to_string(),
        FieldType::File => "Expected a file".to_string(),
        other => format!(
            "Expected {}, received {}",
            format!("{other:?}").to_lowercase(),
            value.type_name()
        ),
    })
}

fn check_rule(rule: &Rule, value: &FieldValue) -> Result<(), String> {
    let failed = |message: &String| -> Result<(), String> { Err(message.clone()) };
    match rule {
        Rule::Email { message } => match value.as_str() {
            Some(s) if email_regex().is_match(s.trim()) => Ok(()),
            _ => failed(message),
        },
        Rule::Url { message } => match value.as_str().map(|s| url::Url::parse(s.trim())) {
            Some(Ok(parsed)) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
            _ => failed(message),
        },
        Rule::MinLength { min, message } => match value.as_str() {
            Some(s) if s.trim().chars().count() >= *min => Ok(()),
            _ => failed(message),
        },
        Rule::MaxLength { max, message } => match value.as_str() {
            Some(s) if s.trim().chars().count() <= *max => Ok(()),
            _ => failed(message),
        },
        Rule::Min { min, message } => match value.as_f64() {
            Some(n) if n >= *min => Ok(()),
            _ => failed(message),
        },
        Rule::Max { max, message } => match value.as_f64() {
            Some(n) if n <= *max => Ok(()),
            _ => failed(message),
        },
        Rule::DecimalPlaces { places, message } => match value.as_f64() {
            Some(n) if has_at_most_decimal_places(n, *places) => Ok(()),
            _ => failed(message),
        },
        Rule::OneOf { values, message } => match value.as_str() {
            Some(s) if values.iter().any(|v| v == s) => Ok(()),
            _ => failed(message),
        },
        Rule::Pattern { pattern, message } => {
            let re = Regex::new(pattern).map_err(|e| format!("invalid pattern: {e}"))?;
            match value.as_str() {
                Some(s) if re.is_match(s) => Ok(()),
                _ => failed(message),
            }
        }
        Rule::MinItems { min, message } => match value.as_list() {
            Some(items) if items.len() >= *min => Ok(()),
            _ => failed(message),
        },
        Rule::File { constraints } => match value {
            FieldValue::File(file) => validate_file(file, constraints).map_err(|e| e.to_string()),
            FieldValue::List(items) => {
                for item in items {
                    let file = item.as_file().ok_or_else(|| "Expected a file".to_string())?;
                    validate_file(file, constraints).map_err(|e| e.to_string())?;
                }
                Ok(())
            }
            _ => Err("Expected a file".to_string()),
        },
    }
}

/// `value * 10^places` must be integral; the tolerance absorbs binary float
/// noise such as `19.99 * 100 = 1998.9999999999998`.
pub fn has_at_most_decimal_places(value: f64, places: u32) -> bool {
    let scaled = value * 10_f64.powi(places as i32);
    (scaled - scaled.round()).abs() < 1e-6
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

fn evaluate_refinement(refinement: &Refinement, payload: &StepPayload) -> Option<(String, String)> {
    match refinement {
        Refinement::DateAfter {
            start,
            end,
            path,
            message,
        } => {
            let start = payload.lookup(start)?.as_str().and_then(parse_date)?;
            let end = payload.lookup(end)?.as_str().and_then(parse_date)?;
            (end <= start).then(|| (path.clone(), message.clone()))
        }
        Refinement::TimeAfter {
            start,
            end,
            path,
            message,
        } => {
            let start = payload
                .lookup(start)?
                .as_str()
                .and_then(crate::availability::parse_clock_time)?;
            let end = payload
                .lookup(end)?
                .as_str()
                .and_then(crate::availability::parse_clock_time)?;
            (end <= start).then(|| (path.clone(), message.clone()))
        }
        Refinement::RequiredWhen {
            field,
            equals,
            path,
            message,
        } => {
            let missing = payload.lookup(path).map_or(true, FieldValue::is_blank);
            (condition_holds(payload, field, equals) && missing)
                .then(|| (path.clone(), message.clone()))
        }
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
            .unwrap_or_else(|e| panic!("email pattern must compile: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::FileRef;
    use crate::upload::MB;

    fn license_schema() -> ValidationSchema {
        ValidationSchema::new()
            .field(
                "registrationType",
                FieldSchema::new(FieldType::String)
                    .required("Registration type is required")
                    .rule(Rule::OneOf {
                        values: vec!["individual".to_string(), "business".to_string()],
                        message: "Select a registration type".to_string(),
                    }),
            )
            .field(
                "businessLicense",
                FieldSchema::new(FieldType::File)
                    .required_when("registrationType", "business", "Business license is required.")
                    .rule(Rule::File {
                        constraints: FileConstraints::images_and_pdf(5),
                    }),
            )
    }

    #[test]
    fn conditional_requirement_ignored_when_condition_false() {
        let payload = StepPayload::new()
            .with("registrationType", "individual")
            .with("businessLicense", FieldValue::Null);
        assert!(license_schema().validate(&payload).is_ok());
    }

    #[test]
    fn conditional_requirement_fires_when_condition_true() {
        let payload = StepPayload::new().with("registrationType", "business");
        let errors = license_schema().validate(&payload).expect_err("license missing");
        assert_eq!(errors.get("businessLicense"), Some("Business license is required."));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn file_rule_applies_to_present_file() {
        let payload = StepPayload::new()
            .with("registrationType", "business")
            .with("businessLicense", FileRef::new("license.png", "image/png", 6 * MB));
        let errors = license_schema().validate(&payload).expect_err("too large");
        assert_eq!(errors.get("businessLicense"), Some("File size must be less than 5MB"));
    }

    fn offer_schema() -> ValidationSchema {
        ValidationSchema::new()
            .field(
                "offerStartDate",
                FieldSchema::new(FieldType::Date).required("Offer start date is required"),
            )
            .field(
                "offerEndDate",
                FieldSchema::new(FieldType::Date).required("Offer end date is required"),
            )
            .refine(Refinement::DateAfter {
                start: "offerStartDate".to_string(),
                end: "offerEndDate".to_string(),
                path: "offerEndDate".to_string(),
                message: "Offer end date must be after start date.".to_string(),
            })
    }

    #[test]
    fn date_range_refinement_fires_on_reversed_dates() {
        let payload = StepPayload::new()
            .with("offerStartDate", "2025-01-10")
            .with("offerEndDate", "2025-01-05");
        let errors = offer_schema().validate(&payload).expect_err("reversed");
        assert_eq!(
            errors.get("offerEndDate"),
            Some("Offer end date must be after start date.")
        );
        assert!(!errors.contains("offerStartDate"));
    }

    #[test]
    fn missing_date_is_required_error_not_range_error() {
        let payload = StepPayload::new().with("offerStartDate", "2025-01-10");
        let errors = offer_schema().validate(&payload).expect_err("missing end");
        assert_eq!(errors.get("offerEndDate"), Some("Offer end date is required"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn valid_date_range_passes() {
        let payload = StepPayload::new()
            .with("offerStartDate", "2025-01-05")
            .with("offerEndDate", "2025-01-10");
        assert!(offer_schema().validate(&payload).is_ok());
    }

    #[test]
    fn decimal_places_checks_scaled_value_is_integral() {
        assert!(has_at_most_decimal_places(12.5, 2));
        assert!(has_at_most_decimal_places(19.99, 2));
        assert!(has_at_most_decimal_places(100.0, 2));
        assert!(!has_at_most_decimal_places(12.345, 2));

        let schema = ValidationSchema::new().field(
            "discountPercentage",
            FieldSchema::new(FieldType::Number).rule(Rule::DecimalPlaces {
                places: 2,
                message: "No more than 2 decimal places".to_string(),
            }),
        );
        let bad = StepPayload::new().with("discountPercentage", "10.125");
        let errors = schema.validate(&bad).expect_err("three places");
        assert_eq!(errors.get("discountPercentage"), Some("No more than 2 decimal places"));
    }

    #[test]
    fn first_failing_rule_wins() {
        let schema = ValidationSchema::new().field(
            "email",
            FieldSchema::new(FieldType::String)
                .required("Email is required")
                .rule(Rule::MinLength {
                    min: 30,
                    message: "Too short".to_string(),
                })
                .rule(Rule::Email {
                    message: "Invalid email".to_string(),
                }),
        );
        let payload = StepPayload::new().with("email", "nope");
        let errors = schema.validate(&payload).expect_err("invalid");
        assert_eq!(errors.get("email"), Some("Too short"));
    }

    #[test]
    fn email_and_url_formats() {
        let schema = ValidationSchema::new()
            .field(
                "email",
                FieldSchema::new(FieldType::String).rule(Rule::Email {
                    message: "Invalid email address".to_string(),
                }),
            )
            .field(
                "website",
                FieldSchema::new(FieldType::String).rule(Rule::Url {
                    message: "Invalid URL".to_string(),
                }),
            );

        let good = StepPayload::new()
            .with("email", "ops@acme-plumbing.co.uk")
            .with("website", "https://acme.example");
        assert!(schema.validate(&good).is_ok());

        let bad = StepPayload::new()
            .with("email", "ops@")
            .with("website", "acme dot com");
        let errors = schema.validate(&bad).expect_err("invalid");
        assert_eq!(errors.get("email"), Some("Invalid email address"));
        assert_eq!(errors.get("website"), Some("Invalid URL"));
    }

    #[test]
    fn refinement_does_not_overwrite_field_error() {
        let schema = ValidationSchema::new()
            .field(
                "emergencyRate",
                FieldSchema::new(FieldType::Number).rule(Rule::Min {
                    min: 0.0,
                    message: "Rate cannot be negative".to_string(),
                }),
            )
            .refine(Refinement::RequiredWhen {
                field: "emergencyService".to_string(),
                equals: FieldValue::Bool(true),
                path: "emergencyRate".to_string(),
                message: "Emergency rate is required".to_string(),
            });

        let missing = StepPayload::new().with("emergencyService", true);
        let errors = schema.validate(&missing).expect_err("missing");
        assert_eq!(errors.get("emergencyRate"), Some("Emergency rate is required"));

        let negative = StepPayload::new()
            .with("emergencyService", true)
            .with("emergencyRate", -5.0);
        let errors = schema.validate(&negative).expect_err("negative");
        assert_eq!(errors.get("emergencyRate"), Some("Rate cannot be negative"));
    }

    #[test]
    fn availability_field_reports_nested_paths() {
        let schema = ValidationSchema::new().field(
            "availability",
            FieldSchema::new(FieldType::Availability).required("Select at least one available day"),
        );

        let json = r#"{ "availability": { "monday": { "startTime": "6:00 PM", "endTime": "9:00 AM" } } }"#;
        let payload: StepPayload = serde_json::from_str(json).expect("json");
        let errors = schema.validate(&payload).expect_err("reversed");
        assert_eq!(
            errors.get("availability.monday.endTime"),
            Some("End time must be after start time")
        );
        assert!(errors.has_errors_under("availability"));

        let empty: StepPayload = serde_json::from_str(r#"{ "availability": {} }"#).expect("json");
        let errors = schema.validate(&empty).expect_err("empty");
        assert_eq!(errors.get("availability"), Some("Select at least one available day"));
    }

    #[test]
    fn schema_loads_from_json() {
        let json = r#"{
            "fields": {
                "businessName": {
                    "type": "string",
                    "requirement": { "kind": "required", "message": "Business name is required" },
                    "rules": [ { "rule": "min_length", "min": 2, "message": "Too short" } ]
                },
                "businessLicense": {
                    "type": "file",
                    "requirement": {
                        "kind": "required_when",
                        "field": "registrationType",
                        "equals": "business",
                        "message": "Business license is required."
                    }
                }
            }
        }"#;

        let schema: ValidationSchema = serde_json::from_str(json).expect("schema");
        let errors = schema
            .validate(&StepPayload::new().with("registrationType", "business"))
            .expect_err("invalid");
        assert_eq!(errors.get("businessName"), Some("Business name is required"));
        assert_eq!(errors.get("businessLicense"), Some("Business license is required."));
    }

    fn opening_hours_schema() -> ValidationSchema {
        ValidationSchema::new().refine(Refinement::TimeAfter {
            start: "opensAt".to_string(),
            end: "closesAt".to_string(),
            path: "closesAt".to_string(),
            message: "Closing time must be after opening time".to_string(),
        })
    }

    #[test]
    fn time_range_refinement() {
        let schema = opening_hours_schema();

        let ordered = StepPayload::new()
            .with("opensAt", "9:00 AM")
            .with("closesAt", "6:00 PM");
        assert!(schema.validate(&ordered).is_ok());

        let reversed = StepPayload::new()
            .with("opensAt", "6:00 PM")
            .with("closesAt", "9:00 AM");
        let errors = schema.validate(&reversed).expect_err("reversed");
        assert_eq!(
            errors.get("closesAt"),
            Some("Closing time must be after opening time")
        );
        assert_eq!(errors.len(), 1);

        let missing = StepPayload::new().with("opensAt", "6:00 PM");
        assert!(schema.validate(&missing).is_ok());
    }
}
