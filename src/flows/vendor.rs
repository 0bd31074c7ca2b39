//! Vendor setup: business details, services offered, weekly availability and
//! identity verification.

use super::{DefinedFlow, Role, StepDefinition};
use crate::api::Endpoint;
use crate::payload::FieldValue;
use crate::schema::{FieldSchema, FieldType, Rule, ValidationSchema};
use crate::transform::ApiShape;
use crate::upload::FileConstraints;

pub const FLOW_ID: &str = "vendor_setup";

pub const ID_TYPES: [&str; 3] = ["national_id", "passport", "drivers_license"];

pub(crate) const PHONE_PATTERN: &str = r"^\+?[0-9][0-9 ()\-]{6,19}$";

pub fn flow() -> DefinedFlow {
    DefinedFlow::new(
        FLOW_ID,
        "Vendor setup",
        Role::Vendor,
        vec![business_info(), services(), availability(), kyc()],
    )
}

fn business_info() -> StepDefinition {
    let schema = ValidationSchema::new()
        .field(
            "businessName",
            FieldSchema::new(FieldType::String)
                .required("Business name is required")
                .rule(Rule::MinLength {
                    min: 2,
                    message: "Business name must be at least 2 characters".to_string(),
                }),
        )
        .field(
            "registrationType",
            FieldSchema::new(FieldType::String)
                .required("Registration type is required")
                .rule(Rule::OneOf {
                    values: vec!["individual".to_string(), "business".to_string()],
                    message: "Select a valid registration type".to_string(),
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
        .field(
            "email",
            FieldSchema::new(FieldType::String)
                .required("Email is required")
                .rule(Rule::Email {
                    message: "Invalid email address".to_string(),
                }),
        )
        .field(
            "phoneNumber",
            FieldSchema::new(FieldType::String)
                .required("Phone number is required")
                .rule(Rule::Pattern {
                    pattern: PHONE_PATTERN.to_string(),
                    message: "Invalid phone number".to_string(),
                }),
        )
        .field(
            "website",
            FieldSchema::new(FieldType::String).rule(Rule::Url {
                message: "Please enter a valid URL".to_string(),
            }),
        );

    StepDefinition::new(
        "business_info",
        "Business Information",
        Endpoint::post("vendor/business-info"),
        schema,
    )
    .with_shape(
        ApiShape::new()
            .rename("phoneNumber", "phone")
            .rename("businessLicense", "license_document"),
    )
}

fn services() -> StepDefinition {
    let schema = ValidationSchema::new()
        .field(
            "serviceCategories",
            FieldSchema::new(FieldType::List)
                .required("Select at least one service category")
                .rule(Rule::MinItems {
                    min: 1,
                    message: "Select at least one service category".to_string(),
                }),
        )
        .field(
            "serviceArea",
            FieldSchema::new(FieldType::String).required("Service area is required"),
        )
        .field(
            "yearsOfExperience",
            FieldSchema::new(FieldType::Number)
                .required("Years of experience is required")
                .rule(Rule::Min {
                    min: 0.0,
                    message: "Years of experience cannot be negative".to_string(),
                }),
        )
        .field(
            "hourlyRate",
            FieldSchema::new(FieldType::Number)
                .rule(Rule::Min {
                    min: 0.0,
                    message: "Rate cannot be negative".to_string(),
                })
                .rule(Rule::DecimalPlaces {
                    places: 2,
                    message: "Rate can have at most 2 decimal places".to_string(),
                }),
        );

    StepDefinition::new("services", "Services", Endpoint::patch("vendor/services"), schema)
}

fn availability() -> StepDefinition {
    let schema = ValidationSchema::new()
        .field(
            "availability",
            FieldSchema::new(FieldType::Availability).required("Select at least one available day"),
        )
        .field("emergencyService", FieldSchema::new(FieldType::Boolean))
        .field(
            "emergencyRate",
            FieldSchema::new(FieldType::Number)
                .required_when(
                    "emergencyService",
                    FieldValue::Bool(true),
                    "Emergency rate is required when emergency service is offered",
                )
                .rule(Rule::Min {
                    min: 0.0,
                    message: "Rate cannot be negative".to_string(),
                })
                .rule(Rule::DecimalPlaces {
                    places: 2,
                    message: "Rate can have at most 2 decimal places".to_string(),
                }),
        );

    StepDefinition::new(
        "availability",
        "Availability",
        Endpoint::patch("vendor/availability"),
        schema,
    )
    .skippable()
}

fn kyc() -> StepDefinition {
    let schema = ValidationSchema::new()
        .field(
            "idType",
            FieldSchema::new(FieldType::String)
                .required("ID type is required")
                .rule(Rule::OneOf {
                    values: ID_TYPES.iter().map(|t| t.to_string()).collect(),
                    message: "Select a valid ID type".to_string(),
                }),
        )
        .field(
            "idDocument",
            FieldSchema::new(FieldType::File)
                .required("ID document is required")
                .rule(Rule::File {
                    constraints: FileConstraints::images_and_pdf(5),
                }),
        )
        .field(
            "selfie",
            FieldSchema::new(FieldType::File)
                .required("A selfie is required")
                .rule(Rule::File {
                    constraints: FileConstraints::images(5),
                }),
        );

    StepDefinition::new("kyc", "KYC Verification", Endpoint::post("vendor/kyc"), schema)
}
