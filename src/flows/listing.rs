//! Property listing: the property, its units, an optional introductory offer
//! and photos.

use super::{DefinedFlow, Role, StepDefinition};
use crate::api::Endpoint;
use crate::payload::FieldValue;
use crate::schema::{FieldSchema, FieldType, Refinement, Rule, ValidationSchema};
use crate::transform::ApiShape;
use crate::upload::FileConstraints;

pub const FLOW_ID: &str = "property_listing";

pub const PROPERTY_TYPES: [&str; 4] = ["apartment", "house", "duplex", "commercial"];

pub fn flow() -> DefinedFlow {
    DefinedFlow::new(
        FLOW_ID,
        "List a property",
        Role::Owner,
        vec![property_details(), units(), offer(), photos()],
    )
}

fn property_details() -> StepDefinition {
    let schema = ValidationSchema::new()
        .field(
            "propertyName",
            FieldSchema::new(FieldType::String)
                .required("Property name is required")
                .rule(Rule::MinLength {
                    min: 3,
                    message: "Property name must be at least 3 characters".to_string(),
                }),
        )
        .field(
            "propertyType",
            FieldSchema::new(FieldType::String)
                .required("Property type is required")
                .rule(Rule::OneOf {
                    values: PROPERTY_TYPES.iter().map(|t| t.to_string()).collect(),
                    message: "Select a valid property type".to_string(),
                }),
        )
        .field(
            "description",
            FieldSchema::new(FieldType::String).rule(Rule::MaxLength {
                max: 1000,
                message: "Description must be 1000 characters or fewer".to_string(),
            }),
        )
        .field(
            "address",
            FieldSchema::new(FieldType::Map).required("Address is required"),
        )
        .field(
            "address.street",
            FieldSchema::new(FieldType::String).required("Street address is required"),
        )
        .field(
            "address.city",
            FieldSchema::new(FieldType::String).required("City is required"),
        )
        .field(
            "address.state",
            FieldSchema::new(FieldType::String).required("State is required"),
        );

    StepDefinition::new(
        "property_details",
        "Property Details",
        Endpoint::post("properties"),
        schema,
    )
    .with_shape(ApiShape::new().rename("propertyName", "name").flatten("address"))
}

fn units() -> StepDefinition {
    let schema = ValidationSchema::new()
        .field(
            "unitCount",
            FieldSchema::new(FieldType::Number)
                .required("Number of units is required")
                .rule(Rule::Min {
                    min: 1.0,
                    message: "At least one unit is required".to_string(),
                }),
        )
        .field(
            "bedrooms",
            FieldSchema::new(FieldType::Number)
                .required("Number of bedrooms is required")
                .rule(Rule::Min {
                    min: 0.0,
                    message: "Bedrooms cannot be negative".to_string(),
                }),
        )
        .field(
            "rentAmount",
            FieldSchema::new(FieldType::Number)
                .required("Rent amount is required")
                .rule(Rule::Min {
                    min: 0.01,
                    message: "Rent must be greater than zero".to_string(),
                })
                .rule(Rule::DecimalPlaces {
                    places: 2,
                    message: "Rent can have at most 2 decimal places".to_string(),
                }),
        )
        .field(
            "securityDeposit",
            FieldSchema::new(FieldType::Number)
                .rule(Rule::Min {
                    min: 0.0,
                    message: "Deposit cannot be negative".to_string(),
                })
                .rule(Rule::DecimalPlaces {
                    places: 2,
                    message: "Deposit can have at most 2 decimal places".to_string(),
                }),
        )
        .field(
            "availableFrom",
            FieldSchema::new(FieldType::Date).required("Available-from date is required"),
        );

    StepDefinition::new("units", "Units", Endpoint::post("properties/units"), schema)
}

fn offer() -> StepDefinition {
    let active = || FieldValue::Bool(true);
    let schema = ValidationSchema::new()
        .field("hasOffer", FieldSchema::new(FieldType::Boolean))
        .field(
            "discountPercentage",
            FieldSchema::new(FieldType::Number)
                .required_when("hasOffer", active(), "Discount percentage is required")
                .rule(Rule::Min {
                    min: 0.0,
                    message: "Discount cannot be negative".to_string(),
                })
                .rule(Rule::Max {
                    max: 100.0,
                    message: "Discount cannot exceed 100%".to_string(),
                })
                .rule(Rule::DecimalPlaces {
                    places: 2,
                    message: "Discount can have at most 2 decimal places".to_string(),
                }),
        )
        .field(
            "offerStartDate",
            FieldSchema::new(FieldType::Date).required_when(
                "hasOffer",
                active(),
                "Offer start date is required",
            ),
        )
        .field(
            "offerEndDate",
            FieldSchema::new(FieldType::Date).required_when(
                "hasOffer",
                active(),
                "Offer end date is required",
            ),
        )
        .refine(Refinement::DateAfter {
            start: "offerStartDate".to_string(),
            end: "offerEndDate".to_string(),
            path: "offerEndDate".to_string(),
            message: "Offer end date must be after start date.".to_string(),
        });

    StepDefinition::new(
        "offer",
        "Special Offer",
        Endpoint::patch("properties/offer"),
        schema,
    )
    .with_shape(ApiShape::new().rename("discountPercentage", "discount_percent"))
    .skippable()
}

fn photos() -> StepDefinition {
    let schema = ValidationSchema::new().field(
        "photos",
        FieldSchema::new(FieldType::List)
            .required("Upload at least one photo")
            .rule(Rule::MinItems {
                min: 1,
                message: "Upload at least one photo".to_string(),
            })
            .rule(Rule::File {
                constraints: FileConstraints::images(5),
            }),
    );

    StepDefinition::new("photos", "Photos", Endpoint::post("properties/photos"), schema).skippable()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flows::Flow;
    use crate::payload::{FileRef, StepPayload};
    use crate::schema::Validator;
    use crate::upload::MB;

    fn offer_payload(start: &str, end: &str) -> StepPayload {
        StepPayload::new()
            .with("hasOffer", true)
            .with("discountPercentage", 12.5)
            .with("offerStartDate", start)
            .with("offerEndDate", end)
    }

    #[test]
    fn offer_end_must_follow_start() {
        let flow = flow();
        let schema = &flow.step(3).expect("step").schema;
        let errors = schema
            .validate(&offer_payload("2025-01-10", "2025-01-05"))
            .expect_err("reversed");
        assert_eq!(
            errors.get("offerEndDate"),
            Some("Offer end date must be after start date.")
        );
        assert!(schema.validate(&offer_payload("2025-01-05", "2025-01-10")).is_ok());
    }

    #[test]
    fn inactive_offer_needs_nothing() {
        let flow = flow();
        let schema = &flow.step(3).expect("step").schema;
        assert!(schema.validate(&StepPayload::new().with("hasOffer", false)).is_ok());
    }

    #[test]
    fn discount_is_bounded_and_two_decimal() {
        let flow = flow();
        let schema = &flow.step(3).expect("step").schema;

        let over = offer_payload("2025-01-05", "2025-01-10").with("discountPercentage", 120.0);
        let errors = schema.validate(&over).expect_err("over 100");
        assert_eq!(errors.get("discountPercentage"), Some("Discount cannot exceed 100%"));

        let precise = offer_payload("2025-01-05", "2025-01-10").with("discountPercentage", 10.555);
        let errors = schema.validate(&precise).expect_err("precision");
        assert_eq!(
            errors.get("discountPercentage"),
            Some("Discount can have at most 2 decimal places")
        );
    }

    #[test]
    fn nested_address_fields_are_required() {
        let flow = flow();
        let schema = &flow.step(1).expect("step").schema;
        let payload: StepPayload = serde_json::from_str(
            r#"{
                "propertyName": "Elm Court",
                "propertyType": "apartment",
                "address": { "street": "12 Elm St" }
            }"#,
        )
        .expect("json");
        let errors = schema.validate(&payload).expect_err("address");
        assert_eq!(errors.get("address.city"), Some("City is required"));
        assert_eq!(errors.get("address.state"), Some("State is required"));
        assert!(!errors.contains("address"));
    }

    #[test]
    fn every_photo_is_checked() {
        let flow = flow();
        let schema = &flow.step(4).expect("step").schema;
        let payload = StepPayload::new().with(
            "photos",
            vec![
                FieldValue::from(FileRef::new("front.jpg", "image/jpeg", MB)),
                FieldValue::from(FileRef::new("tour.mp4", "video/mp4", MB)),
            ],
        );
        let errors = schema.validate(&payload).expect_err("video");
        assert_eq!(errors.get("photos"), Some("Only JPG, PNG files are allowed"));
    }
}
