use appraisal::workflows::appraisal::{
    AppraisalRecord, AppraisalRepository, FacultyKey, RepositoryError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local store; records vanish on restart.
#[derive(Default, Clone)]
pub(crate) struct InMemoryAppraisalRepository {
    records: Arc<Mutex<HashMap<FacultyKey, AppraisalRecord>>>,
}

impl InMemoryAppraisalRepository {
    fn guard(&self) -> Result<MutexGuard<'_, HashMap<FacultyKey, AppraisalRecord>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
    }
}

impl AppraisalRepository for InMemoryAppraisalRepository {
    fn insert(&self, record: AppraisalRecord) -> Result<AppraisalRecord, RepositoryError> {
        let mut guard = self.guard()?;
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
        let mut guard = self.guard()?;
        let mut staged = Vec::with_capacity(keys.len());
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
        Ok(self.guard()?.get(key).cloned())
    }

    fn list_department(&self, department: &str) -> Result<Vec<AppraisalRecord>, RepositoryError> {
        Ok(self
            .guard()?
            .values()
            .filter(|record| record.key.department == department)
            .cloned()
            .collect())
    }
}
