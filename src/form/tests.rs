use serde_json::json;

use super::classify::LineClass;
use super::clean::extract_gender;
use super::document::{
    ExtractionDocument, ExtractionSeed, FieldEntry, FieldValue, KeyRegistry, MandatoryRegistry,
};
use super::matcher::LineMatch;
use super::parser::FormParser;
use super::rules::FormRules;
use crate::model::FormFieldRecord;

fn parser() -> FormParser {
    FormParser::new(FormRules::default()).expect("default rules compile")
}

fn extract(lines: &[&str]) -> ExtractionDocument {
    parser().extract(lines, ExtractionSeed::default()).document
}

fn text(value: &str) -> FieldEntry {
    FieldEntry::Scalar(FieldValue::text(value))
}

fn flag(value: bool) -> FieldEntry {
    FieldEntry::Scalar(FieldValue::Bool(value))
}

#[test]
fn numbered_section_prefixes_label_value_keys() {
    let document = extract(&["1. Patient Information", "Age: 45"]);

    assert_eq!(document.len(), 1);
    assert_eq!(document.get("NZ_Patient_Information_Age"), Some(&text("45")));
}

#[test]
fn dotted_subsection_starts_a_new_section() {
    let document = extract(&[
        "1. Patient Information",
        "3.1 Device Details",
        "Brand Name: Acme",
    ]);

    assert_eq!(
        document.get("NZ_Device_Details_Brand_Name"),
        Some(&text("Acme"))
    );
    assert!(document.get("NZ_Patient_Information_Brand_Name").is_none());
}

#[test]
fn caption_before_checkbox_options_is_not_a_field() {
    let document = extract(&["1. Patient Information", "Sex: ☒ Male ☐ Female"]);

    assert_eq!(document.get("NZ_Patient_Information_Male"), Some(&flag(true)));
    assert_eq!(document.get("NZ_Patient_Information_Female"), Some(&flag(false)));
    assert!(document.get("NZ_Patient_Information_Sex").is_none());
}

#[test]
fn label_then_glyph_reads_as_checkbox() {
    let parser = parser();
    assert_eq!(
        parser.match_line("Serious Injury: ☒"),
        vec![LineMatch::LabelBox {
            label: "Serious Injury".to_string(),
            checked: true,
        }]
    );
}

#[test]
fn several_pairs_on_one_line_keep_multi_word_labels() {
    let document = extract(&[
        "1. Patient Information",
        "Initials: AB Date of Birth: 1/2/1980",
        "Age: 45 Reporter Name: John Smith",
    ]);

    assert_eq!(
        serde_json::to_value(&document).expect("document serializes"),
        json!({
            "NZ_Patient_Information_Initials": "AB",
            "NZ_Patient_Information_Date_Of_Birth": "1/2/1980",
            "NZ_Patient_Information_Age": "45",
            "NZ_Patient_Information_Reporter_Name": "John Smith",
        })
    );
}

#[test]
fn label_run_drops_leading_connector() {
    let parser = parser();
    assert_eq!(
        parser.match_line("Site: ward in Hospital Name: St Mary"),
        vec![
            LineMatch::LabelValue {
                label: "Site".to_string(),
                value: "ward in".to_string(),
            },
            LineMatch::LabelValue {
                label: "Hospital Name".to_string(),
                value: "St Mary".to_string(),
            },
        ]
    );
}

#[test]
fn colon_inside_value_stays_with_value() {
    let parser = parser();
    assert_eq!(
        parser.match_line("Onset: 10:30 Outcome: Resolved"),
        vec![
            LineMatch::LabelValue {
                label: "Onset".to_string(),
                value: "10:30".to_string(),
            },
            LineMatch::LabelValue {
                label: "Outcome".to_string(),
                value: "Resolved".to_string(),
            },
        ]
    );
}

#[test]
fn narrative_lines_join_with_single_spaces() {
    let document = extract(&[
        "Event Description:",
        "The pump stopped",
        "during the procedure",
        "",
    ]);

    assert_eq!(document.len(), 1);
    assert_eq!(
        document.get("NZ_Event_Description"),
        Some(&text("The pump stopped during the procedure"))
    );
}

#[test]
fn trailing_number_in_narrative_becomes_wand_number() {
    let document = extract(&["Event Description:", "12 34"]);

    assert_eq!(document.get("NZ_Event_Description"), Some(&text("12")));
    assert_eq!(document.get("NZ_Wand_Number"), Some(&text("34")));
}

#[test]
fn instruction_lines_produce_no_fields() {
    let document = extract(&["Please attach supporting documents"]);
    assert!(document.is_empty());
}

#[test]
fn mandatory_marker_survives_single_line_checkbox_and_narrative_paths() {
    let document = extract(&[
        "1. Patient Information",
        "*Age: 45",
        "☒ *Consent Given",
        "*Event Description:",
        "Alarm sounded twice",
    ]);

    assert_eq!(
        serde_json::to_value(&document).expect("document serializes"),
        json!({
            "NZ_Patient_Information_Age": {"value": "45", "mandatory": true},
            "NZ_Patient_Information_Consent_Given": {"value": true, "mandatory": true},
            "NZ_Patient_Information_Event_Description": {
                "value": "Alarm sounded twice",
                "mandatory": true
            },
        })
    );
}

#[test]
fn repeated_labels_get_numbered_keys() {
    let document = extract(&["1. Patient Information", "Age: 45", "Age: 46"]);

    assert_eq!(document.get("NZ_Patient_Information_Age"), Some(&text("45")));
    assert_eq!(document.get("NZ_Patient_Information_Age_2"), Some(&text("46")));
}

#[test]
fn key_registry_first_use_is_the_base() {
    let mut registry = KeyRegistry::default();
    let keys = (0..5)
        .map(|_| registry.make_unique("NZ_Age"))
        .collect::<Vec<_>>();

    assert_eq!(keys[0], "NZ_Age");
    assert_eq!(keys[1], "NZ_Age_2");
    assert_eq!(keys[4], "NZ_Age_5");

    let mut distinct = keys.clone();
    distinct.sort();
    distinct.dedup();
    assert_eq!(distinct.len(), keys.len());
}

#[test]
fn subgroup_opener_scopes_following_keys() {
    let document = extract(&[
        "2. Product Details",
        "Implant History:",
        "Implant Date: received 12/03/2020",
    ]);

    assert_eq!(
        document.get("NZ_Product_Details_Implant_History_Implant_Date"),
        Some(&text("12/03/2020"))
    );
}

#[test]
fn yes_no_values_become_booleans() {
    let document = extract(&["2. Product Details", "Returned To Supplier: Yes"]);
    assert_eq!(
        document.get("NZ_Product_Details_Returned_To_Supplier"),
        Some(&flag(true))
    );
}

#[test]
fn sex_shorthand_label_maps_to_gender() {
    let document = extract(&["1. Patient Information", "M/F: Female"]);
    assert_eq!(
        document.get("NZ_Patient_Information_Gender"),
        Some(&text("Female"))
    );

    let document = extract(&["1. Patient Information", "M/F:", "Other - not stated"]);
    assert_eq!(
        document.get("NZ_Patient_Information_Gender"),
        Some(&text("Other"))
    );
}

#[test]
fn table_boundary_takes_next_line_as_value() {
    let document = extract(&["List of other devices involved", "Infusion pump"]);

    assert_eq!(document.len(), 1);
    assert_eq!(
        document.get("NZ_Other_Devices_Involved"),
        Some(&text("Infusion pump"))
    );
}

#[test]
fn wand_number_row_uses_dedicated_key() {
    let rules = FormRules {
        table_boundaries: vec!["wand number".to_string()],
        ..FormRules::default()
    };
    let parser = FormParser::new(rules).expect("rules compile");
    let outcome = parser.extract(&["Wand Number", "WX-1200"], ExtractionSeed::default());

    assert_eq!(outcome.document.get("NZ_Wand_Number"), Some(&text("WX-1200")));
}

#[test]
fn reporter_checkbox_block_is_followed_by_clinical_narrative() {
    let document = extract(&[
        "3. Description of the Clinical Event Problem",
        "Reporter: ☒ Hcp ☐ Patient",
        "Pump stopped delivering insulin overnight",
    ]);

    let prefix = "NZ_Description_Of_The_Clinical_Event_Problem";
    assert_eq!(document.get(&format!("{prefix}_Hcp")), Some(&flag(true)));
    assert_eq!(document.get(&format!("{prefix}_Patient")), Some(&flag(false)));
    assert_eq!(
        document.get(&format!("{prefix}_Narrative")),
        Some(&text("Pump stopped delivering insulin overnight"))
    );
}

#[test]
fn text_after_not_applicable_box_goes_to_narrative() {
    let document = extract(&[
        "3. Description of the Clinical Event Problem",
        "☐ Unknown ☒ N/A",
        "Pump stopped overnight",
    ]);

    let prefix = "NZ_Description_Of_The_Clinical_Event_Problem";
    assert_eq!(document.get(&format!("{prefix}_Unknown")), Some(&flag(false)));
    assert_eq!(document.get(&format!("{prefix}_N_A")), Some(&flag(true)));
    assert_eq!(
        document.get(&format!("{prefix}_Narrative")),
        Some(&text("Pump stopped overnight"))
    );
}

#[test]
fn bare_line_after_checkbox_fills_that_key_once() {
    let document = extract(&["☒ Other", "Hospital pharmacy", "Second loose line"]);

    assert_eq!(document.get("NZ_Other"), Some(&text("Hospital pharmacy")));
    assert_eq!(document.len(), 1);
}

#[test]
fn trailing_heading_in_value_opens_new_field() {
    let document = extract(&["Batch: A12 Please/Specify", "Sterile packaging torn"]);

    assert_eq!(document.len(), 2);
    assert_eq!(document.get("NZ_Batch"), Some(&text("A12")));
    assert_eq!(
        document.get("NZ_Specify"),
        Some(&text("Sterile packaging torn"))
    );
}

#[test]
fn grouping_noun_label_skips_the_pair() {
    let document = extract(&["Lot: A12 Please/Specify"]);
    assert!(document.is_empty());
}

#[test]
fn subgroup_inside_open_narrative_is_flagged_for_review() {
    let outcome = parser().extract(
        &[
            "Event Description:",
            "Pump failed",
            "Follow Up:",
            "Date: 01/02/2021",
        ],
        ExtractionSeed::default(),
    );

    assert_eq!(
        outcome.document.get("NZ_Event_Description"),
        Some(&text("Pump failed"))
    );
    assert_eq!(
        outcome.document.get("NZ_Follow_Up_Date"),
        Some(&text("01/02/2021"))
    );
    assert_eq!(outcome.review_flags.len(), 1);
    assert_eq!(outcome.review_flags[0].line_number, 3);
    assert_eq!(outcome.review_flags[0].line, "Follow Up:");
}

#[test]
fn classifier_resolves_line_kinds() {
    let parser = parser();

    assert_eq!(parser.classify_line("   ", None), LineClass::Blank);
    assert_eq!(
        parser.classify_line("1. Patient Information", None),
        LineClass::NumberedSection("Patient Information".to_string())
    );
    assert_eq!(
        parser.classify_line("Other Reporting Information", None),
        LineClass::StrongHeading("Other Reporting Information".to_string())
    );
    assert_eq!(
        parser.classify_line("Additional comments", None),
        LineClass::TableBoundary
    );
    assert_eq!(
        parser.classify_line("Implant History:", Some("Implant Date: 1/1/2020")),
        LineClass::SubgroupOpener("Implant History".to_string())
    );
    assert_eq!(
        parser.classify_line("Implant History:", Some("left knee")),
        LineClass::Content
    );
    assert_eq!(
        parser.classify_line("Please attach supporting documents", None),
        LineClass::GroupingOrInstruction
    );
    assert_eq!(
        parser.classify_line("3.1 Device Details", None),
        LineClass::NumberedSection("Device Details".to_string())
    );
    assert_eq!(
        parser.classify_line("3.1. Device Details", None),
        LineClass::NumberedSection("Device Details".to_string())
    );
    assert_eq!(parser.classify_line("12.5 mg daily", None), LineClass::Content);
}

#[test]
fn line_class_serializes_with_tag_and_text() {
    assert_eq!(
        serde_json::to_value(LineClass::NumberedSection("Patient Information".to_string()))
            .expect("class serializes"),
        json!({"class": "numbered_section", "text": "Patient Information"})
    );
    assert_eq!(
        serde_json::to_value(LineClass::Blank).expect("class serializes"),
        json!({"class": "blank"})
    );
}

#[test]
fn validator_rejects_placeholders_and_instructions() {
    let parser = parser();
    let valid = |value: &str, key: &str| parser.is_valid_value(&FieldValue::text(value), key);

    assert!(valid("Infusion pump", "NZ_Device"));
    assert!(valid("No", "NZ_Returned"));
    assert!(!valid("none", "NZ_Device"));
    assert!(!valid("(optional)", "NZ_Device"));
    assert!(!valid("Please submit within 30 days", "NZ_Device"));
    assert!(!valid("see guidance notes", "NZ_Device"));
    assert!(!valid("---", "NZ_Device"));
    assert!(!valid("M/F", "NZ_Device"));
    assert!(!valid("x", "NZ_Device"));
    assert!(!valid("Infusion pump", "NZ_Example"));
    assert!(parser.is_valid_value(&FieldValue::Bool(false), "NZ_Returned"));
    assert!(!parser.is_valid_value(&FieldValue::Null, "NZ_Returned"));
}

#[test]
fn label_normalizer_is_idempotent() {
    let parser = parser();
    let samples = [
        "*Please indicate the Patient Age",
        "Select Other Devices Involved (if any)",
        "Check box Tick Select Age",
        "  - Event Date:",
        "M/F",
    ];

    for raw in samples {
        let (once, _) = parser.normalize_label(raw);
        let (twice, mandatory) = parser.normalize_label(&once);
        assert_eq!(once, twice, "label {raw:?} changed on second pass");
        assert!(!mandatory);
    }

    assert_eq!(
        parser.normalize_label("*Please indicate the Patient Age"),
        ("the Patient Age".to_string(), true)
    );
    assert_eq!(parser.normalize_label("Check box Tick Select Age").0, "Age");
    assert_eq!(parser.normalize_label("M/F").0, "Gender");
}

#[test]
fn section_names_drop_numbers_and_trailing_instructions() {
    let parser = parser();
    assert_eq!(
        parser.normalize_section_name("Adverse Event 2 Details if applicable"),
        "Adverse Event Details"
    );
}

#[test]
fn keys_are_pascal_tokens_without_parentheticals() {
    let parser = parser();
    assert_eq!(
        parser.build_key(&[
            Some("Patient Information"),
            None,
            Some("Date of Birth (dd/mm/yyyy)"),
        ]),
        "NZ_Patient_Information_Date_Of_Birth"
    );
    assert_eq!(
        parser.gender_key("NZ_Patient_M_F"),
        Some("NZ_Patient_Gender".to_string())
    );
    assert_eq!(parser.gender_key("NZ_Patient_Age"), None);
}

#[test]
fn cleaning_strips_asides_and_grouping_nouns() {
    let parser = parser();
    assert_eq!(parser.clean_value("(optional) Pump Details"), "Pump");
    assert_eq!(parser.clean_value("  Infusion set type model "), "Infusion set");
}

#[test]
fn value_parsing_recognizes_booleans_and_dates() {
    let parser = parser();
    assert_eq!(parser.parse_value("Yes", "Returned"), FieldValue::Bool(true));
    assert_eq!(parser.parse_value("no", "Returned"), FieldValue::Bool(false));
    assert_eq!(
        parser.parse_value("Received 3/4/2021 by post", "Event Date"),
        FieldValue::text("3/4/2021")
    );
    assert_eq!(
        parser.parse_value("3/4/2021", "Comment"),
        FieldValue::text("3/4/2021")
    );
    assert_eq!(extract_gender("female patient"), "Female");
    assert_eq!(extract_gender("unknown"), "unknown");
}

#[test]
fn flattening_is_idempotent() {
    let parser = parser();
    let mut document = ExtractionDocument::new();
    document.insert("NZ_Age".to_string(), text("45"));
    document.insert("NZ_Weight".to_string(), text("70"));
    document.insert("NZ_Device".to_string(), text("none"));
    document.insert(
        "NZ_Consent".to_string(),
        FieldEntry::wrap(FieldValue::Bool(true), true),
    );
    document.insert(
        "NZ_Site".to_string(),
        FieldEntry::Envelope {
            value: FieldValue::text("Left knee"),
            mandatory: false,
        },
    );

    let mut mandatory = MandatoryRegistry::default();
    mandatory.record("NZ_Weight", true);

    let once = parser.flatten(&document, &mandatory);
    let twice = parser.flatten(&once, &mandatory);

    assert_eq!(once, twice);
    assert!(once.get("NZ_Device").is_none());
    assert_eq!(once.get("NZ_Site"), Some(&text("Left knee")));
    assert_eq!(
        once.get("NZ_Weight"),
        Some(&FieldEntry::wrap(FieldValue::text("70"), true))
    );
    assert_eq!(
        once.iter().map(|(key, _)| key).collect::<Vec<_>>(),
        vec!["NZ_Age", "NZ_Weight", "NZ_Consent", "NZ_Site"]
    );
}

#[test]
fn mandatory_registry_never_downgrades() {
    let mut mandatory = MandatoryRegistry::default();
    mandatory.record("NZ_Age", true);
    mandatory.record("NZ_Age", false);
    assert!(mandatory.is_mandatory("NZ_Age"));
    assert!(!mandatory.is_mandatory("NZ_Weight"));
}

#[test]
fn form_fields_seed_the_document() {
    let parser = parser();
    let fields: Vec<FormFieldRecord> = serde_json::from_value(json!([
        {"name": "*Reporter Name", "kind": "text", "value": "Jane Roe"},
        {"name": "Urgent", "kind": "checkbox", "checked": true},
        {"name": "Follow Up", "kind": "checkbox"},
        {"name": "Clinic", "kind": "text", "value": "none"},
    ]))
    .expect("form fields deserialize");

    let seed = parser.seed_from_form_fields(&fields);
    let outcome = parser.extract(&["Age: 45"], seed);

    assert_eq!(outcome.raw_field_count, 4);
    assert_eq!(
        serde_json::to_value(&outcome.document).expect("document serializes"),
        json!({
            "NZ_Reporter_Name": {"value": "Jane Roe", "mandatory": true},
            "NZ_Urgent": true,
            "NZ_Follow_Up": false,
            "NZ_Age": "45",
        })
    );
}

#[test]
fn partial_rules_file_keeps_default_tables() {
    let rules: FormRules =
        serde_json::from_value(json!({"key_prefix": "AU"})).expect("rules deserialize");
    assert_eq!(rules.strong_headings, FormRules::default().strong_headings);

    let parser = FormParser::new(rules).expect("rules compile");
    let outcome = parser.extract(&["Age: 45"], ExtractionSeed::default());
    assert_eq!(outcome.document.get("AU_Age"), Some(&text("45")));
}
