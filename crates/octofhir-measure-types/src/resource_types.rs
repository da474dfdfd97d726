//! FHIR R4 resource type hierarchy
//!
//! `Resource` is the root; `Bundle`, `Binary` and `Parameters` derive from it
//! directly and every other resource derives from `DomainResource`.

/// Resources that are not domain resources
const NON_DOMAIN_RESOURCES: &[&str] = &["Binary", "Bundle", "Parameters"];

/// Concrete R4 resource types, sorted for binary search
const R4_RESOURCE_TYPES: &[&str] = &[
    "Account",
    "ActivityDefinition",
    "AdverseEvent",
    "AllergyIntolerance",
    "Appointment",
    "AppointmentResponse",
    "AuditEvent",
    "Basic",
    "Binary",
    "BiologicallyDerivedProduct",
    "BodyStructure",
    "Bundle",
    "CapabilityStatement",
    "CarePlan",
    "CareTeam",
    "CatalogEntry",
    "ChargeItem",
    "ChargeItemDefinition",
    "Claim",
    "ClaimResponse",
    "ClinicalImpression",
    "CodeSystem",
    "Communication",
    "CommunicationRequest",
    "CompartmentDefinition",
    "Composition",
    "ConceptMap",
    "Condition",
    "Consent",
    "Contract",
    "Coverage",
    "CoverageEligibilityRequest",
    "CoverageEligibilityResponse",
    "DetectedIssue",
    "Device",
    "DeviceDefinition",
    "DeviceMetric",
    "DeviceRequest",
    "DeviceUseStatement",
    "DiagnosticReport",
    "DocumentManifest",
    "DocumentReference",
    "EffectEvidenceSynthesis",
    "Encounter",
    "Endpoint",
    "EnrollmentRequest",
    "EnrollmentResponse",
    "EpisodeOfCare",
    "EventDefinition",
    "Evidence",
    "EvidenceVariable",
    "ExampleScenario",
    "ExplanationOfBenefit",
    "FamilyMemberHistory",
    "Flag",
    "Goal",
    "GraphDefinition",
    "Group",
    "GuidanceResponse",
    "HealthcareService",
    "ImagingStudy",
    "Immunization",
    "ImmunizationEvaluation",
    "ImmunizationRecommendation",
    "ImplementationGuide",
    "InsurancePlan",
    "Invoice",
    "Library",
    "Linkage",
    "List",
    "Location",
    "Measure",
    "MeasureReport",
    "Media",
    "Medication",
    "MedicationAdministration",
    "MedicationDispense",
    "MedicationKnowledge",
    "MedicationRequest",
    "MedicationStatement",
    "MedicinalProduct",
    "MedicinalProductAuthorization",
    "MedicinalProductContraindication",
    "MedicinalProductIndication",
    "MedicinalProductIngredient",
    "MedicinalProductInteraction",
    "MedicinalProductManufactured",
    "MedicinalProductPackaged",
    "MedicinalProductPharmaceutical",
    "MedicinalProductUndesirableEffect",
    "MessageDefinition",
    "MessageHeader",
    "MolecularSequence",
    "NamingSystem",
    "NutritionOrder",
    "Observation",
    "ObservationDefinition",
    "OperationDefinition",
    "OperationOutcome",
    "Organization",
    "OrganizationAffiliation",
    "Parameters",
    "Patient",
    "PaymentNotice",
    "PaymentReconciliation",
    "Person",
    "PlanDefinition",
    "Practitioner",
    "PractitionerRole",
    "Procedure",
    "Provenance",
    "Questionnaire",
    "QuestionnaireResponse",
    "RelatedPerson",
    "RequestGroup",
    "ResearchDefinition",
    "ResearchElementDefinition",
    "ResearchStudy",
    "ResearchSubject",
    "RiskAssessment",
    "RiskEvidenceSynthesis",
    "Schedule",
    "SearchParameter",
    "ServiceRequest",
    "Slot",
    "Specimen",
    "SpecimenDefinition",
    "StructureDefinition",
    "StructureMap",
    "Subscription",
    "Substance",
    "SubstanceNucleicAcid",
    "SubstancePolymer",
    "SubstanceProtein",
    "SubstanceReferenceInformation",
    "SubstanceSourceMaterial",
    "SubstanceSpecification",
    "SupplyDelivery",
    "SupplyRequest",
    "Task",
    "TerminologyCapabilities",
    "TestReport",
    "TestScript",
    "ValueSet",
    "VerificationResult",
    "VisionPrescription",
];

/// Normalize runtime class aliases to their resource type name
pub fn canonical_name(name: &str) -> &str {
    match name {
        "ListResource" => "List",
        other => other,
    }
}

/// Whether `name` is a concrete resource type or one of the abstract bases
pub fn is_resource_type(name: &str) -> bool {
    let name = canonical_name(name);
    matches!(name, "Resource" | "DomainResource")
        || R4_RESOURCE_TYPES.binary_search(&name).is_ok()
}

/// Whether a value of type `actual` conforms to the resource type `expected`
pub fn conforms_to(actual: &str, expected: &str) -> bool {
    let actual = canonical_name(actual);
    let expected = canonical_name(expected);
    if !is_resource_type(actual) {
        return false;
    }
    match expected {
        "Resource" => true,
        "DomainResource" => actual != "Resource" && !NON_DOMAIN_RESOURCES.contains(&actual),
        _ => actual == expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_resource_list_is_sorted() {
        assert!(R4_RESOURCE_TYPES.windows(2).all(|w| w[0] < w[1]));
    }

    #[rstest]
    #[case("Encounter", "Encounter", true)]
    #[case("Encounter", "Patient", false)]
    #[case("Encounter", "DomainResource", true)]
    #[case("Bundle", "DomainResource", false)]
    #[case("Bundle", "Resource", true)]
    #[case("ListResource", "List", true)]
    #[case("List", "ListResource", true)]
    #[case("Boolean", "Resource", false)]
    #[case("Resource", "DomainResource", false)]
    fn test_conforms_to(#[case] actual: &str, #[case] expected: &str, #[case] conforms: bool) {
        assert_eq!(conforms_to(actual, expected), conforms);
    }

    #[test]
    fn test_is_resource_type() {
        assert!(is_resource_type("Patient"));
        assert!(is_resource_type("DomainResource"));
        assert!(!is_resource_type("patient"));
        assert!(!is_resource_type("Boolean"));
    }
}
