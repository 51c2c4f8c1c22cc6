use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use axum::response::Response;
use serde_json::Value;

use crate::workflows::appraisal::domain::{
    ActorRole, Cadre, FacultyInputs, FacultyKey, FormKind, RawEntry, ReviewContext,
};
use crate::workflows::appraisal::interaction::FinalMarkConfig;
use crate::workflows::appraisal::repository::{
    AppraisalRecord, AppraisalRepository, RepositoryError,
};
use crate::workflows::appraisal::rubric::{Cap, CategoryRule, FormRubric, SectionRule};
use crate::workflows::appraisal::scoring::{InputPolicy, ScoringEngine};
use crate::workflows::appraisal::service::{AppraisalService, AppraisalSettings};

pub(super) const DEPARTMENT: &str = "CSE";
pub(super) const FACULTY: &str = "f-101";

pub(super) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

pub(super) fn engine() -> ScoringEngine {
    ScoringEngine::standard()
}

pub(super) fn faculty_key() -> FacultyKey {
    FacultyKey::new(DEPARTMENT, FACULTY)
}

pub(super) fn faculty_ctx() -> ReviewContext {
    ReviewContext::new(FACULTY, ActorRole::Faculty, DEPARTMENT)
}

pub(super) fn verifier_ctx() -> ReviewContext {
    ReviewContext::new("v-7", ActorRole::Verifier, DEPARTMENT)
}

pub(super) fn hod_ctx() -> ReviewContext {
    ReviewContext::new("hod-cse", ActorRole::Hod, DEPARTMENT)
}

pub(super) fn dean_ctx() -> ReviewContext {
    ReviewContext::new("dean-1", ActorRole::Dean, "ACADEMICS")
}

pub(super) fn external_ctx() -> ReviewContext {
    ReviewContext::new("ext-9", ActorRole::External, "EXTERNAL")
}

/// Assistant Professor: Research 480 pre-cap (210 capped), Teaching 120, Self-Development 30.
pub(super) fn assistant_inputs() -> FacultyInputs {
    FacultyInputs::new(Cadre::AssistantProfessor)
        .with_entry(FormKind::Research, "journal_sci", RawEntry::count(3))
        .with_entry(
            FormKind::Research,
            "conference_scopus_wos",
            RawEntry::count(10).with_proof("https://drive.example.edu/conf.pdf"),
        )
        .with_entry(FormKind::Teaching, "contact_hours", RawEntry::count(120))
        .with_entry(FormKind::Teaching, "course_pass_90", RawEntry::count(2))
        .with_entry(FormKind::Teaching, "feedback_excellent", RawEntry::count(1))
        .with_entry(FormKind::SelfDevelopment, "fdp_one_week", RawEntry::count(2))
        .with_entry(
            FormKind::SelfDevelopment,
            "mooc_certification",
            RawEntry::count("1"),
        )
}

/// Professor teaching inputs that hit every teaching section cap (400 raw).
pub(super) fn professor_full_teaching() -> FacultyInputs {
    [
        ("contact_hours", 200),
        ("course_pass_90", 3),
        ("feedback_excellent", 3),
        ("lab_manual", 4),
        ("course_developed", 2),
        ("pg_project", 4),
        ("mentee_group", 3),
        ("mooc_module", 2),
    ]
    .into_iter()
    .fold(FacultyInputs::new(Cadre::Professor), |inputs, (key, count)| {
        inputs.with_entry(FormKind::Teaching, key, RawEntry::count(count))
    })
}

/// Three small sections (caps 20, 20, 30) on an uncapped cadre table.
pub(super) fn three_section_rubric() -> FormRubric {
    let section = |index: u8, key: &'static str, item: &'static str, cap: f64| {
        SectionRule::new(
            index,
            key,
            key,
            Cap::Limit(cap),
            vec![CategoryRule::per_unit(item, item, 5.0)],
        )
    };

    FormRubric {
        form: FormKind::SelfDevelopment,
        sections: vec![
            section(1, "alpha", "alpha_item", 20.0),
            section(2, "beta", "beta_item", 20.0),
            section(3, "gamma", "gamma_item", 30.0),
        ],
        cadre_caps: BTreeMap::from([(Cadre::Professor, Cap::Unlimited)]),
        cadre_multipliers: None,
    }
}

pub(super) fn settings() -> AppraisalSettings {
    AppraisalSettings {
        input_policy: InputPolicy::Clamp,
        final_mark: FinalMarkConfig::default().with_self_appraisal_ceiling(400.0),
        verified_score_ceiling: 1000.0,
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    records: Arc<Mutex<HashMap<FacultyKey, AppraisalRecord>>>,
}

impl AppraisalRepository for MemoryRepository {
    fn insert(&self, record: AppraisalRecord) -> Result<AppraisalRecord, RepositoryError> {
        let mut guard = self.records.lock().unwrap();
        if guard.contains_key(&record.key) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.key.clone(), record.clone());
        Ok(record)
    }

    fn modify<E, F>(&self, keys: &[FacultyKey], mut change: F) -> Result<(), E>
    where
        F: FnMut(&mut AppraisalRecord) -> Result<(), E>,
        E: From<RepositoryError>,
    {
        let mut guard = self.records.lock().unwrap();
        let mut staged = Vec::new();
        for key in keys {
            let mut record = guard.get(key).cloned().ok_or(RepositoryError::NotFound)?;
            change(&mut record)?;
            staged.push(record);
        }
        for record in staged {
            guard.insert(record.key.clone(), record);
        }
        Ok(())
    }

    fn fetch(&self, key: &FacultyKey) -> Result<Option<AppraisalRecord>, RepositoryError> {
        Ok(self.records.lock().unwrap().get(key).cloned())
    }

    fn list_department(&self, department: &str) -> Result<Vec<AppraisalRecord>, RepositoryError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|record| record.key.department == department)
            .cloned()
            .collect())
    }
}

pub(super) struct UnavailableRepository;

impl AppraisalRepository for UnavailableRepository {
    fn insert(&self, _record: AppraisalRecord) -> Result<AppraisalRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }

    fn modify<E, F>(&self, _keys: &[FacultyKey], _change: F) -> Result<(), E>
    where
        F: FnMut(&mut AppraisalRecord) -> Result<(), E>,
        E: From<RepositoryError>,
    {
        Err(RepositoryError::Unavailable("store offline".to_string()).into())
    }

    fn fetch(&self, _key: &FacultyKey) -> Result<Option<AppraisalRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }

    fn list_department(&self, _department: &str) -> Result<Vec<AppraisalRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }
}

pub(super) fn build_service() -> (Arc<AppraisalService<MemoryRepository>>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let service = Arc::new(AppraisalService::new(repository.clone(), settings()));
    (service, repository)
}

/// Saves the assistant inputs and submits them.
pub(super) fn submitted_service() -> Arc<AppraisalService<MemoryRepository>> {
    let (service, _) = build_service();
    let key = faculty_key();
    service
        .save_inputs(&faculty_ctx(), &key, assistant_inputs())
        .expect("inputs saved");
    service.submit(&faculty_ctx(), &key).expect("submitted");
    service
}

/// Verifies every section at its self-reported value as the peer verifier.
pub(super) fn verify_everything(service: &AppraisalService<MemoryRepository>) {
    let key = faculty_key();
    let record = service.get(&key).expect("record exists");
    for (form, ledger) in &record.verification {
        for section in ledger.sections() {
            service
                .verify_section(
                    &verifier_ctx(),
                    &key,
                    *form,
                    &section.key,
                    section.self_reported,
                )
                .expect("verification accepted");
        }
    }
}

/// Walks a submitted record up to `Interaction_pending`.
pub(super) fn service_at_interaction() -> Arc<AppraisalService<MemoryRepository>> {
    let service = submitted_service();
    verify_everything(&service);
    let key = faculty_key();
    service.advance(&verifier_ctx(), &key).expect("peer verification done");
    service.advance(&hod_ctx(), &key).expect("authority verification done");
    service.advance(&hod_ctx(), &key).expect("portfolio marks done");
    service
}

pub(super) async fn response_json(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}
