//! Tenant setup: personal details, employment and identity verification.

use super::vendor::{ID_TYPES, PHONE_PATTERN};
use super::{DefinedFlow, Role, StepDefinition};
use crate::api::Endpoint;
use crate::schema::{FieldSchema, FieldType, Rule, ValidationSchema};
use crate::transform::ApiShape;
use crate::upload::FileConstraints;

pub const FLOW_ID: &str = "tenant_setup";

pub const EMPLOYMENT_STATUSES: [&str; 4] = ["employed", "self_employed", "unemployed", "student"];

pub fn flow() -> DefinedFlow {
    DefinedFlow::new(
        FLOW_ID,
        "Tenant setup",
        Role::Tenant,
        vec![personal_info(), employment(), kyc()],
    )
}

fn personal_info() -> StepDefinition {
    let schema = ValidationSchema::new()
        .field(
            "fullName",
            FieldSchema::new(FieldType::String)
                .required("Full name is required")
                .rule(Rule::MinLength {
                    min: 2,
                    message: "Full name must be at least 2 characters".to_string(),
                }),
        )
        .field(
            "dateOfBirth",
            FieldSchema::new(FieldType::Date).required("Date of birth is required"),
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
        );

    StepDefinition::new(
        "personal_info",
        "Personal Information",
        Endpoint::post("tenant/profile"),
        schema,
    )
    .with_shape(ApiShape::new().rename("phoneNumber", "phone"))
}

fn employment() -> StepDefinition {
    let schema = ValidationSchema::new()
        .field(
            "employmentStatus",
            FieldSchema::new(FieldType::String)
                .required("Employment status is required")
                .rule(Rule::OneOf {
                    values: EMPLOYMENT_STATUSES.iter().map(|s| s.to_string()).collect(),
                    message: "Select a valid employment status".to_string(),
                }),
        )
        .field(
            "employerName",
            FieldSchema::new(FieldType::String).required_when(
                "employmentStatus",
                "employed",
                "Employer name is required",
            ),
        )
        .field(
            "monthlyIncome",
            FieldSchema::new(FieldType::Number)
                .required("Monthly income is required")
                .rule(Rule::Min {
                    min: 0.0,
                    message: "Income cannot be negative".to_string(),
                })
                .rule(Rule::DecimalPlaces {
                    places: 2,
                    message: "Income can have at most 2 decimal places".to_string(),
                }),
        );

    StepDefinition::new(
        "employment",
        "Employment",
        Endpoint::patch("tenant/employment"),
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
                    constraints: FileConstraints::images_and_pdf(10),
                }),
        )
        .field(
            "proofOfIncome",
            FieldSchema::new(FieldType::File).rule(Rule::File {
                constraints: FileConstraints::images_and_pdf(10),
            }),
        );

    StepDefinition::new("kyc", "Identity Documents", Endpoint::post("tenant/kyc"), schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flows::Flow;
    use crate::payload::{FileRef, StepPayload};
    use crate::schema::Validator;
    use crate::upload::MB;

    #[test]
    fn employer_required_only_when_employed() {
        let flow = flow();
        let schema = &flow.step(2).expect("step").schema;

        let student = StepPayload::new()
            .with("employmentStatus", "student")
            .with("monthlyIncome", 0.0);
        assert!(schema.validate(&student).is_ok());

        let employed = StepPayload::new()
            .with("employmentStatus", "employed")
            .with("monthlyIncome", "3500.75");
        let errors = schema.validate(&employed).expect_err("employer");
        assert_eq!(errors.get("employerName"), Some("Employer name is required"));
    }

    #[test]
    fn tenant_documents_allow_ten_megabytes() {
        let flow = flow();
        let schema = &flow.step(3).expect("step").schema;

        let eight = StepPayload::new()
            .with("idType", "national_id")
            .with("idDocument", FileRef::new("nin.pdf", "application/pdf", 8 * MB));
        assert!(schema.validate(&eight).is_ok());

        let twelve = StepPayload::new()
            .with("idType", "national_id")
            .with("idDocument", FileRef::new("nin.png", "image/png", 12 * MB));
        let errors = schema.validate(&twelve).expect_err("too large");
        assert_eq!(errors.get("idDocument"), Some("File size must be less than 10MB"));
    }

    #[test]
    fn invalid_birth_date_is_reported() {
        let flow = flow();
        let schema = &flow.step(1).expect("step").schema;
        let payload = StepPayload::new()
            .with("fullName", "Ada Obi")
            .with("dateOfBirth", "31/12/1990")
            .with("email", "ada@example.com")
            .with("phoneNumber", "08012345678");
        let errors = schema.validate(&payload).expect_err("date");
        assert_eq!(errors.get("dateOfBirth"), Some("Invalid date"));
    }
}
