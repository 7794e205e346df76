//! Document manager collaborator opened by wizards after their document step.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DocumentStep {
    pub step: u8,
    pub process_type: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSession {
    pub process_type: String,
    pub customer_id: String,
}

pub trait DocumentManager: Send + Sync {
    fn open(&self, process_type: &str, customer_id: &str);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopDocumentManager;

impl DocumentManager for NoopDocumentManager {
    fn open(&self, _process_type: &str, _customer_id: &str) {}
}

#[derive(Clone, Default)]
pub struct RecordingDocumentManager {
    sessions: Arc<Mutex<Vec<DocumentSession>>>,
}

impl RecordingDocumentManager {
    pub fn sessions(&self) -> Vec<DocumentSession> {
        match self.sessions.lock() {
            Ok(sessions) => sessions.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl DocumentManager for RecordingDocumentManager {
    fn open(&self, process_type: &str, customer_id: &str) {
        let session = DocumentSession {
            process_type: process_type.to_owned(),
            customer_id: customer_id.to_owned(),
        };
        match self.sessions.lock() {
            Ok(mut sessions) => sessions.push(session),
            Err(poisoned) => poisoned.into_inner().push(session),
        }
    }
}
