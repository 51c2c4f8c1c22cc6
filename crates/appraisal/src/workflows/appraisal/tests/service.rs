use std::sync::{Arc, Barrier};
use std::thread;

use super::common::*;
use crate::workflows::appraisal::domain::{
    ActorRole, Cadre, FacultyInputs, FacultyKey, FormKind, RawEntry, ReviewContext,
};
use crate::workflows::appraisal::interaction::{InteractionError, InteractionSheet};
use crate::workflows::appraisal::repository::RepositoryError;
use crate::workflows::appraisal::rubric::ConfigurationError;
use crate::workflows::appraisal::scoring::ScoringError;
use crate::workflows::appraisal::service::{AppraisalService, AppraisalServiceError};
use crate::workflows::appraisal::status::{AppraisalStatus, StatusError};
use crate::workflows::appraisal::verification::VerificationError;

#[test]
fn saving_inputs_opens_a_pending_record() {
    let (service, _) = build_service();
    let record = service
        .save_inputs(&faculty_ctx(), &faculty_key(), assistant_inputs())
        .unwrap();

    assert_eq!(record.status, AppraisalStatus::Pending);
    assert_close(record.scorecard.unwrap().self_reported_total, 360.0);
    assert!(record.verification.is_empty());
}

#[test]
fn pending_inputs_can_be_replaced() {
    let (service, _) = build_service();
    let key = faculty_key();
    service
        .save_inputs(&faculty_ctx(), &key, assistant_inputs())
        .unwrap();

    let smaller = FacultyInputs::new(Cadre::AssistantProfessor).with_entry(
        FormKind::Research,
        "journal_sci",
        RawEntry::count(1),
    );
    let record = service.save_inputs(&faculty_ctx(), &key, smaller).unwrap();
    assert_close(record.scorecard.unwrap().self_reported_total, 100.0);
}

#[test]
fn inputs_are_locked_after_submission() {
    let service = submitted_service();
    let error = service
        .save_inputs(&faculty_ctx(), &faculty_key(), assistant_inputs())
        .unwrap_err();

    assert!(matches!(
        error,
        AppraisalServiceError::Status(StatusError::Locked {
            status: AppraisalStatus::VerificationPending,
            ..
        })
    ));
}

#[test]
fn faculty_cannot_touch_another_record() {
    let (service, _) = build_service();
    let other = FacultyKey::new(DEPARTMENT, "f-202");

    assert!(matches!(
        service.save_inputs(&faculty_ctx(), &other, assistant_inputs()),
        Err(AppraisalServiceError::Forbidden { .. })
    ));
}

#[test]
fn reviewers_are_scoped_to_their_department() {
    let service = submitted_service();
    let outsider = ReviewContext::new("v-99", ActorRole::Verifier, "ECE");

    assert!(matches!(
        service.verify_section(&outsider, &faculty_key(), FormKind::Research, "journal_papers", 10.0),
        Err(AppraisalServiceError::Forbidden { .. })
    ));
}

#[test]
fn submission_freezes_scores_and_opens_ledgers() {
    let service = submitted_service();
    let record = service.get(&faculty_key()).unwrap();

    assert_eq!(record.status, AppraisalStatus::VerificationPending);
    assert_eq!(record.verification.len(), 3);
    assert_eq!(record.history.len(), 1);
    assert_eq!(record.history[0].role, ActorRole::Faculty);
    assert!(!record.verification_complete());

    let summary = service.summary(&faculty_key()).unwrap();
    assert_close(summary.self_reported_total.unwrap(), 360.0);
    assert_close(summary.verified_total, 0.0);
    assert!(summary.final_mark.is_none());
}

#[test]
fn verifying_sections_reconciles_through_the_cadre_cap() {
    let service = submitted_service();
    let key = faculty_key();

    let partial = service
        .verify_section(&verifier_ctx(), &key, FormKind::Research, "journal_papers", 300.0)
        .unwrap();
    assert!(!partial.complete);
    assert_close(partial.capped_total, 210.0);

    let summary = service.summary(&key).unwrap();
    assert_close(summary.verified_total, 210.0);
    assert!(!summary.verification_complete);
}

#[test]
fn verified_scores_are_gated_by_phase_and_role() {
    let service = submitted_service();
    let key = faculty_key();

    // HOD waits for the peer verifier
    assert!(matches!(
        service.verify_section(&hod_ctx(), &key, FormKind::Research, "journal_papers", 10.0),
        Err(AppraisalServiceError::Status(StatusError::Locked { .. }))
    ));

    service.advance(&verifier_ctx(), &key).unwrap();

    assert!(matches!(
        service.verify_section(&verifier_ctx(), &key, FormKind::Research, "journal_papers", 10.0),
        Err(AppraisalServiceError::Status(StatusError::Locked { .. }))
    ));
    service
        .verify_section(&hod_ctx(), &key, FormKind::Research, "journal_papers", 10.0)
        .unwrap();
}

#[test]
fn cap_conflicts_surface_from_the_service() {
    let service = submitted_service();

    let error = service
        .verify_section(
            &verifier_ctx(),
            &faculty_key(),
            FormKind::Research,
            "conference_papers",
            181.0,
        )
        .unwrap_err();
    assert!(matches!(
        error,
        AppraisalServiceError::Verification(VerificationError::CapConflict { .. })
    ));
}

#[test]
fn authority_phase_cannot_close_with_pending_sections() {
    let service = submitted_service();
    let key = faculty_key();
    service.advance(&verifier_ctx(), &key).unwrap();

    let error = service.advance(&hod_ctx(), &key).unwrap_err();
    match error {
        AppraisalServiceError::Status(StatusError::VerificationIncomplete { pending }) => {
            assert!(pending > 0);
        }
        other => panic!("expected incomplete verification, got {other:?}"),
    }
    assert_eq!(
        service.get(&key).unwrap().status,
        AppraisalStatus::AuthorityVerificationPending
    );
}

#[test]
fn advancing_with_the_wrong_role_fails() {
    let service = submitted_service();

    assert!(matches!(
        service.advance(&hod_ctx(), &faculty_key()),
        Err(AppraisalServiceError::Status(StatusError::WrongRole { .. }))
    ));
}

#[test]
fn interaction_marks_wait_for_their_phase() {
    let service = submitted_service();

    assert!(matches!(
        service.record_interaction(&hod_ctx(), &faculty_key(), 80.0),
        Err(AppraisalServiceError::Status(StatusError::Locked { .. }))
    ));
}

#[test]
fn full_lifecycle_produces_a_final_mark() {
    let service = service_at_interaction();
    let key = faculty_key();

    service.record_interaction(&hod_ctx(), &key, 80.0).unwrap();
    let average = service.record_interaction(&external_ctx(), &key, 60.0).unwrap();
    assert_close(average.value, 70.0);
    assert_eq!(average.reviewers, 2);

    assert!(matches!(
        service.record_interaction(&verifier_ctx(), &key, 90.0),
        Err(AppraisalServiceError::Interaction(InteractionError::NotAReviewer(_)))
    ));

    service.advance(&hod_ctx(), &key).unwrap();
    service.advance(&hod_ctx(), &key).unwrap();

    let summary = service.summary(&key).unwrap();
    assert_eq!(summary.status, AppraisalStatus::SentToDirector);
    assert!(summary.verification_complete);
    assert_close(summary.verified_total, 360.0);

    let mark = summary.final_mark.expect("final mark once interaction opens");
    assert_close(mark.self_appraisal_component, 76.5);
    assert_close(mark.interaction_component, 10.5);
    assert_close(mark.value, 87.0);

    let record = service.get(&key).unwrap();
    assert_eq!(record.history.len(), 6);
    assert!(matches!(
        service.advance(&hod_ctx(), &key),
        Err(AppraisalServiceError::Status(StatusError::Terminal(_)))
    ));
}

#[test]
fn interaction_sheet_import_is_all_or_nothing() {
    let service = service_at_interaction();
    let key = faculty_key();

    let sheet = InteractionSheet::from_reader(
        "department,faculty_id,role,marks\nCSE,f-101,hod,90\nCSE,f-101,dean,\nCSE,f-101,external,70\n"
            .as_bytes(),
    )
    .unwrap();
    assert_eq!(service.import_interactions(&hod_ctx(), &sheet).unwrap(), 2);

    let record = service.get(&key).unwrap();
    assert_eq!(record.interaction.hod, Some(90.0));
    assert_eq!(record.interaction.dean, None);
    assert_eq!(record.interaction.external, Some(70.0));

    let bad = InteractionSheet::from_reader(
        "department,faculty_id,role,marks\nCSE,f-101,dean,50\nCSE,f-101,external,150\n".as_bytes(),
    )
    .unwrap();
    assert!(matches!(
        service.import_interactions(&hod_ctx(), &bad),
        Err(AppraisalServiceError::Interaction(InteractionError::OutOfRange { .. }))
    ));
    assert_eq!(service.get(&key).unwrap().interaction.dean, None);

    assert!(matches!(
        service.import_interactions(&verifier_ctx(), &sheet),
        Err(AppraisalServiceError::ImportForbidden { .. })
    ));
}

#[test]
fn only_the_hod_imports_even_an_empty_sheet() {
    let service = service_at_interaction();
    let empty = InteractionSheet::from_reader("department,faculty_id,role,marks\n".as_bytes())
        .unwrap();

    assert!(matches!(
        service.import_interactions(&verifier_ctx(), &empty),
        Err(AppraisalServiceError::ImportForbidden {
            role: ActorRole::Verifier,
            ..
        })
    ));
    assert_eq!(service.import_interactions(&hod_ctx(), &empty).unwrap(), 0);
}

#[test]
fn interaction_import_spanning_records_writes_none_when_one_is_locked() {
    let service = service_at_interaction();
    let colleague = FacultyKey::new(DEPARTMENT, "f-050");
    let colleague_ctx = ReviewContext::new("f-050", ActorRole::Faculty, DEPARTMENT);
    service
        .save_inputs(&colleague_ctx, &colleague, FacultyInputs::new(Cadre::Professor))
        .unwrap();

    let sheet = InteractionSheet::from_reader(
        "department,faculty_id,role,marks\nCSE,f-101,dean,50\nCSE,f-050,hod,60\n".as_bytes(),
    )
    .unwrap();
    assert!(matches!(
        service.import_interactions(&hod_ctx(), &sheet),
        Err(AppraisalServiceError::Status(StatusError::Locked {
            status: AppraisalStatus::Pending,
            ..
        }))
    ));
    assert_eq!(service.get(&faculty_key()).unwrap().interaction.dean, None);
}

#[test]
fn concurrent_verifiers_on_different_sections_keep_every_score() {
    let service = submitted_service();
    let key = faculty_key();
    let record = service.get(&key).unwrap();
    let sections: Vec<(FormKind, String, f64)> = record
        .verification
        .iter()
        .flat_map(|(form, ledger)| {
            ledger
                .sections()
                .iter()
                .map(move |section| (*form, section.key.clone(), section.self_reported))
        })
        .collect();
    let barrier = Barrier::new(sections.len());

    thread::scope(|scope| {
        for (form, section, score) in &sections {
            let (service, key, barrier) = (&service, &key, &barrier);
            scope.spawn(move || {
                barrier.wait();
                service
                    .verify_section(&verifier_ctx(), key, *form, section, *score)
                    .unwrap();
            });
        }
    });

    let record = service.get(&key).unwrap();
    assert_eq!(record.pending_sections(), 0);
    assert!(record.verification_complete());
}

#[test]
fn department_report_lists_every_record() {
    let service = service_at_interaction();
    let colleague = FacultyKey::new(DEPARTMENT, "f-050");
    let colleague_ctx = ReviewContext::new("f-050", ActorRole::Faculty, DEPARTMENT);
    service
        .save_inputs(
            &colleague_ctx,
            &colleague,
            FacultyInputs::new(Cadre::Professor).with_entry(
                FormKind::Research,
                "journal_sci",
                RawEntry::count(1),
            ),
        )
        .unwrap();

    let report = service.department_report(DEPARTMENT).unwrap();
    assert_eq!(report.rows.len(), 2);
    assert_eq!(report.rows[0].faculty_id, "f-050");
    assert_eq!(report.rows[0].status, "pending");
    assert_eq!(report.rows[0].verified_total, None);
    assert_eq!(report.rows[1].status, "Interaction_pending");
    assert!(report.rows[1].final_mark.is_some());

    let csv = report.to_csv_string().unwrap();
    let mut lines = csv.lines();
    assert!(lines.next().unwrap().starts_with("department,faculty_id,cadre,status"));
    assert!(lines.next().unwrap().starts_with("CSE,f-050,Professor,pending"));
}

#[test]
fn unknown_categories_are_rejected_on_save() {
    let (service, _) = build_service();
    let inputs = FacultyInputs::new(Cadre::Professor).with_entry(
        FormKind::Teaching,
        "journal_sci",
        RawEntry::count(1),
    );

    assert!(matches!(
        service.save_inputs(&faculty_ctx(), &faculty_key(), inputs),
        Err(AppraisalServiceError::Scoring(ScoringError::Configuration(
            ConfigurationError::UnknownCategory { .. }
        )))
    ));
}

#[test]
fn repository_outages_propagate() {
    let service = AppraisalService::new(Arc::new(UnavailableRepository), settings());

    assert!(matches!(
        service.summary(&faculty_key()),
        Err(AppraisalServiceError::Repository(RepositoryError::Unavailable(_)))
    ));
}

#[test]
fn missing_records_are_not_found() {
    let (service, _) = build_service();

    assert!(matches!(
        service.summary(&faculty_key()),
        Err(AppraisalServiceError::Repository(RepositoryError::NotFound))
    ));
}
