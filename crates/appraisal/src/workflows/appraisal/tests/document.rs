use serde_json::json;

use super::common::*;
use crate::workflows::appraisal::document::{decode_form, encode_form, DocumentError};
use crate::workflows::appraisal::domain::{Cadre, FormKind, RawEntry};
use crate::workflows::appraisal::rubric::{ConfigurationError, Rubric};
use crate::workflows::appraisal::verification::{VerificationError, VerificationLedger};

#[test]
fn encodes_sections_by_position_and_omits_unverified_marks() {
    let rubric = Rubric::standard();
    let research = rubric.form(FormKind::Research).unwrap();
    let inputs = assistant_inputs();
    let form_inputs = &inputs.forms[&FormKind::Research];
    let scorecard = engine()
        .score_form(FormKind::Research, Cadre::AssistantProfessor, form_inputs)
        .unwrap();

    let mut ledger = VerificationLedger::from_scorecard(&scorecard, research).unwrap();
    ledger
        .set_verified_score(&verifier_ctx(), "journal_papers", 200.0, 1000.0)
        .unwrap();

    let document = encode_form(research, form_inputs, &scorecard, Some(&ledger)).unwrap();

    assert_eq!(document["1"]["journal_sci"], json!({ "count": 3 }));
    assert_eq!(document["1"]["marks"], json!(300.0));
    assert_eq!(document["1"]["verified_marks"], json!(200.0));
    assert_eq!(
        document["2"]["conference_scopus_wos"]["proofLink"],
        json!("https://drive.example.edu/conf.pdf")
    );
    assert!(document["2"].get("verified_marks").is_none());
    assert_eq!(document["total_marks"], json!(210.0));
}

#[test]
fn decoding_restores_inputs_and_verified_marks() {
    let rubric = Rubric::standard();
    let research = rubric.form(FormKind::Research).unwrap();
    let inputs = assistant_inputs();
    let form_inputs = &inputs.forms[&FormKind::Research];
    let scorecard = engine()
        .score_form(FormKind::Research, Cadre::AssistantProfessor, form_inputs)
        .unwrap();
    let mut ledger = VerificationLedger::from_scorecard(&scorecard, research).unwrap();
    ledger
        .set_verified_score(&verifier_ctx(), "conference_papers", 150.0, 1000.0)
        .unwrap();

    let document = encode_form(research, form_inputs, &scorecard, Some(&ledger)).unwrap();
    let decoded = decode_form(research, &document).unwrap();

    assert_eq!(&decoded.inputs, form_inputs);
    assert_eq!(decoded.marks.get("journal_papers"), Some(&300.0));
    assert_eq!(decoded.verified.len(), 1);
    assert_eq!(decoded.total_marks, Some(210.0));

    let mut reopened = VerificationLedger::from_scorecard(&scorecard, research).unwrap();
    decoded.restore_into(&mut reopened, 1000.0).unwrap();
    assert_eq!(
        reopened.section("conference_papers").unwrap().verified_score(),
        Some(150.0)
    );
    assert_eq!(reopened.section("journal_papers").unwrap().verified_score(), None);
}

#[test]
fn bare_scalars_decode_as_counts() {
    let rubric = Rubric::standard();
    let teaching = rubric.form(FormKind::Teaching).unwrap();
    let document = json!({ "1": { "contact_hours": "120", "marks": 60 }, "verified_marks": null });

    // a stray top-level key is not a section index
    assert!(matches!(
        decode_form(teaching, &document),
        Err(DocumentError::Malformed(_))
    ));

    let document = json!({ "1": { "contact_hours": "120", "marks": 60, "verified_marks": null } });
    let decoded = decode_form(teaching, &document).unwrap();
    assert_eq!(decoded.inputs["contact_hours"], RawEntry::count("120"));
    assert!(decoded.verified.is_empty());
}

#[test]
fn unknown_positions_and_categories_are_configuration_errors() {
    let rubric = Rubric::standard();
    let self_development = rubric.form(FormKind::SelfDevelopment).unwrap();

    let error = decode_form(self_development, &json!({ "9": { "marks": 10 } })).unwrap_err();
    assert_eq!(
        error,
        DocumentError::Configuration(ConfigurationError::UnknownSectionIndex {
            form: FormKind::SelfDevelopment,
            index: 9,
        })
    );

    let error = decode_form(
        self_development,
        &json!({ "1": { "journal_sci": { "count": 1 } } }),
    )
    .unwrap_err();
    assert!(matches!(
        error,
        DocumentError::Configuration(ConfigurationError::UnknownCategory { .. })
    ));
}

#[test]
fn restored_marks_are_bounded_like_fresh_verifications() {
    let rubric = Rubric::standard();
    let research = rubric.form(FormKind::Research).unwrap();
    let inputs = assistant_inputs();
    let scorecard = engine()
        .score_form(
            FormKind::Research,
            Cadre::AssistantProfessor,
            &inputs.forms[&FormKind::Research],
        )
        .unwrap();
    let mut ledger = VerificationLedger::from_scorecard(&scorecard, research).unwrap();

    let over_cap = decode_form(
        research,
        &json!({ "3": { "verified_marks": 5 }, "2": { "verified_marks": 5000 } }),
    )
    .unwrap();
    assert_eq!(
        over_cap.restore_into(&mut ledger, 1000.0),
        Err(VerificationError::CapConflict {
            section: "conference_papers".to_string(),
            value: 5000.0,
            max: 180.0,
        })
    );
    // nothing from the rejected document sticks
    assert_eq!(ledger.section("book_chapters").unwrap().verified_score(), None);

    let negative = decode_form(research, &json!({ "3": { "verified_marks": -40 } })).unwrap();
    assert!(matches!(
        negative.restore_into(&mut ledger, 1000.0),
        Err(VerificationError::InvalidScore { .. })
    ));
    assert_eq!(ledger.verified_total().verified_sections, 0);
}

#[test]
fn non_numeric_marks_are_malformed() {
    let rubric = Rubric::standard();
    let research = rubric.form(FormKind::Research).unwrap();

    for document in [
        json!({ "1": { "marks": "three hundred" } }),
        json!({ "1": { "verified_marks": [280] } }),
        json!({ "total_marks": "210" }),
    ] {
        assert!(matches!(
            decode_form(research, &document),
            Err(DocumentError::Malformed(_))
        ));
    }

    let nulls = decode_form(
        research,
        &json!({ "1": { "marks": null, "verified_marks": null }, "total_marks": null }),
    )
    .unwrap();
    assert!(nulls.marks.is_empty());
    assert!(nulls.verified.is_empty());
    assert_eq!(nulls.total_marks, None);
}
