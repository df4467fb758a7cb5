//! Lead capture from the marketing site and the admin-side follow-up list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Emails under this suffix mark records created by end-to-end suites; the
/// cleanup endpoint removes exactly these.
pub const TEST_DATA_SUFFIX: &str = "@e2e.test";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeadId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    Nueva,
    Contactada,
    Descartada,
}

impl LeadStatus {
    pub const fn label(self) -> &'static str {
        match self {
            LeadStatus::Nueva => "Nueva",
            LeadStatus::Contactada => "Contactada",
            LeadStatus::Descartada => "Descartada",
        }
    }
}

/// A prospective-student contact captured from the landing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    pub nombre: String,
    pub telefono: String,
    pub email: String,
    pub mensaje: String,
    pub status: LeadStatus,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLead {
    pub nombre: String,
    #[serde(default)]
    pub telefono: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub mensaje: String,
}

#[derive(Debug, thiserror::Error)]
pub enum LeadError {
    #[error("Ingrese un nombre y un teléfono o correo de contacto")]
    MissingContact,
    #[error("lead not found")]
    NotFound,
    #[error("lead store unavailable: {0}")]
    Unavailable(String),
}

/// Storage abstraction over the lead list.
pub trait LeadRepository: Send + Sync {
    fn insert(&self, lead: Lead) -> Result<Lead, LeadError>;
    fn list(&self) -> Result<Vec<Lead>, LeadError>;
    fn update_status(&self, id: LeadId, status: LeadStatus) -> Result<Lead, LeadError>;
    /// Remove every lead matching the predicate, returning how many fell.
    fn remove_where(&self, predicate: &dyn Fn(&Lead) -> bool) -> Result<usize, LeadError>;
    fn next_id(&self) -> LeadId;
}

pub struct LeadService<R> {
    repository: std::sync::Arc<R>,
}

impl<R: LeadRepository + 'static> LeadService<R> {
    pub fn new(repository: std::sync::Arc<R>) -> Self {
        Self { repository }
    }

    /// Landing-page capture: a name plus at least one contact channel.
    pub fn capture(&self, lead: NewLead, now: DateTime<Utc>) -> Result<Lead, LeadError> {
        let nombre = lead.nombre.trim().to_string();
        let telefono = lead.telefono.trim().to_string();
        let email = lead.email.trim().to_string();
        if nombre.is_empty() || (telefono.is_empty() && email.is_empty()) {
            return Err(LeadError::MissingContact);
        }

        self.repository.insert(Lead {
            id: self.repository.next_id(),
            nombre,
            telefono,
            email,
            mensaje: lead.mensaje.trim().to_string(),
            status: LeadStatus::Nueva,
            captured_at: now,
        })
    }

    pub fn list(&self) -> Result<Vec<Lead>, LeadError> {
        let mut leads = self.repository.list()?;
        leads.sort_by(|a, b| b.captured_at.cmp(&a.captured_at));
        Ok(leads)
    }

    pub fn update_status(&self, id: LeadId, status: LeadStatus) -> Result<Lead, LeadError> {
        self.repository.update_status(id, status)
    }

    pub fn cleanup_test_data(&self) -> Result<usize, LeadError> {
        self.repository
            .remove_where(&|lead| lead.email.ends_with(TEST_DATA_SUFFIX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct MemoryLeads {
        records: Mutex<HashMap<LeadId, Lead>>,
        sequence: AtomicU32,
    }

    impl LeadRepository for MemoryLeads {
        fn insert(&self, lead: Lead) -> Result<Lead, LeadError> {
            let mut guard = self.records.lock().expect("lock");
            guard.insert(lead.id, lead.clone());
            Ok(lead)
        }

        fn list(&self) -> Result<Vec<Lead>, LeadError> {
            Ok(self.records.lock().expect("lock").values().cloned().collect())
        }

        fn update_status(&self, id: LeadId, status: LeadStatus) -> Result<Lead, LeadError> {
            let mut guard = self.records.lock().expect("lock");
            let lead = guard.get_mut(&id).ok_or(LeadError::NotFound)?;
            lead.status = status;
            Ok(lead.clone())
        }

        fn remove_where(&self, predicate: &dyn Fn(&Lead) -> bool) -> Result<usize, LeadError> {
            let mut guard = self.records.lock().expect("lock");
            let before = guard.len();
            guard.retain(|_, lead| !predicate(lead));
            Ok(before - guard.len())
        }

        fn next_id(&self) -> LeadId {
            LeadId(self.sequence.fetch_add(1, Ordering::Relaxed) + 1)
        }
    }

    fn service() -> LeadService<MemoryLeads> {
        LeadService::new(Arc::new(MemoryLeads::default()))
    }

    fn captured(service: &LeadService<MemoryLeads>, nombre: &str, email: &str) -> Lead {
        service
            .capture(
                NewLead {
                    nombre: nombre.to_string(),
                    telefono: String::new(),
                    email: email.to_string(),
                    mensaje: "Quisiera información".to_string(),
                },
                Utc::now(),
            )
            .expect("capture succeeds")
    }

    #[test]
    fn capture_requires_name_and_contact() {
        let service = service();
        let missing = service.capture(
            NewLead {
                nombre: "Rosa".to_string(),
                telefono: String::new(),
                email: String::new(),
                mensaje: String::new(),
            },
            Utc::now(),
        );
        assert!(matches!(missing, Err(LeadError::MissingContact)));
    }

    #[test]
    fn captured_leads_start_as_nueva() {
        let service = service();
        let lead = captured(&service, "Rosa", "rosa@example.com");
        assert_eq!(lead.status, LeadStatus::Nueva);
    }

    #[test]
    fn status_updates_are_persisted() {
        let service = service();
        let lead = captured(&service, "Rosa", "rosa@example.com");
        let updated = service
            .update_status(lead.id, LeadStatus::Contactada)
            .expect("update succeeds");
        assert_eq!(updated.status, LeadStatus::Contactada);
    }

    #[test]
    fn cleanup_removes_only_marked_leads() {
        let service = service();
        captured(&service, "Rosa", "rosa@example.com");
        captured(&service, "Prueba", "bot@e2e.test");
        captured(&service, "Prueba 2", "otro@e2e.test");

        let removed = service.cleanup_test_data().expect("cleanup succeeds");
        assert_eq!(removed, 2);
        assert_eq!(service.list().expect("list").len(), 1);
    }
}
