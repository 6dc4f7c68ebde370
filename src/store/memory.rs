use std::sync::{
    Mutex, MutexGuard,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;

use crate::{
    model::employee::{Employee, EmployeeFilter, NewEmployee},
    store::{EmployeeStore, StoreError, UpsertOutcome, next_id},
};

/// In-memory `persona` table with the same id rules as the MySQL store.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<Employee>>,
    /// Max id as seen by a `create` that read it before a concurrent insert.
    frozen_max: Mutex<Option<Option<i64>>>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn with_rows(rows: Vec<Employee>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Default::default()
        }
    }

    pub fn rows(&self) -> Vec<Employee> {
        self.lock().clone()
    }

    /// Make every later `create` reuse the current max id, as racing POSTs would.
    pub fn freeze_max_id(&self) {
        let max = self.lock().iter().map(|e| e.id).max();
        *self.frozen_max.lock().unwrap() = Some(max);
    }

    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Employee>> {
        self.rows.lock().unwrap()
    }

    fn connect(&self) -> Result<MutexGuard<'_, Vec<Employee>>, StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Connect(sqlx::Error::PoolClosed));
        }
        Ok(self.lock())
    }
}

#[async_trait]
impl EmployeeStore for MemoryStore {
    async fn fetch(&self, id: i64) -> Result<Option<Employee>, StoreError> {
        let rows = self.connect()?;
        Ok(rows.iter().find(|e| e.id == id).cloned())
    }

    async fn list(&self, filter: &EmployeeFilter) -> Result<Vec<Employee>, StoreError> {
        let rows = self.connect()?;
        Ok(rows
            .iter()
            .filter(|e| filter.name.as_ref().is_none_or(|n| *n == e.nome))
            .filter(|e| filter.surname.as_ref().is_none_or(|s| *s == e.cognome))
            .cloned()
            .collect())
    }

    async fn upsert(&self, employee: &Employee) -> Result<UpsertOutcome, StoreError> {
        let mut rows = self.connect()?;
        match rows.iter_mut().find(|e| e.id == employee.id) {
            Some(existing) => {
                *existing = employee.clone();
                Ok(UpsertOutcome::Updated)
            }
            None => {
                rows.push(employee.clone());
                Ok(UpsertOutcome::Created)
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<u64, StoreError> {
        let mut rows = self.connect()?;
        let before = rows.len();
        rows.retain(|e| e.id != id);
        Ok((before - rows.len()) as u64)
    }

    async fn create(&self, employee: &NewEmployee) -> Result<Employee, StoreError> {
        let mut rows = self.connect()?;
        let max = match *self.frozen_max.lock().unwrap() {
            Some(frozen) => frozen,
            None => rows.iter().map(|e| e.id).max(),
        };

        let employee = employee.clone().with_id(next_id(max)?);
        if rows.iter().any(|e| e.id == employee.id) {
            return Err(StoreError::Conflict { id: employee.id });
        }
        rows.push(employee.clone());
        Ok(employee)
    }
}
