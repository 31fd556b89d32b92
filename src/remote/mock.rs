//! In-memory backend with call counters for exercising hooks in isolation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::Backend;
use crate::errors::AppError;
use crate::models::{
    Application, ApplicationStatus, EmergencyContact, Socials, Team, TypeformLinks,
};

#[derive(Default)]
struct Data {
    applications: Vec<Application>,
    pictures: HashMap<String, String>,
    socials: HashMap<String, Socials>,
    events: Vec<(String, serde_json::Value)>,
}

#[derive(Default)]
pub struct MockBackend {
    data: Mutex<Data>,
    pub list_calls: AtomicUsize,
    pub draft_calls: AtomicUsize,
    pub picture_calls: AtomicUsize,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
    pub delay: Mutex<Option<Duration>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        let backend = Self::default();
        *backend.delay.lock().unwrap() = Some(delay);
        backend
    }

    pub fn insert_application(&self, application: Application) {
        self.data.lock().unwrap().applications.push(application);
    }

    pub fn insert_picture(&self, uid: &str, url: &str) {
        self.data
            .lock()
            .unwrap()
            .pictures
            .insert(uid.to_string(), url.to_string());
    }

    pub fn insert_socials(&self, uid: &str, socials: Socials) {
        self.data
            .lock()
            .unwrap()
            .socials
            .insert(uid.to_string(), socials);
    }

    /// Every stored application, drafts included.
    pub fn applications(&self) -> Vec<Application> {
        self.data.lock().unwrap().applications.clone()
    }

    pub fn events(&self) -> Vec<(String, serde_json::Value)> {
        self.data.lock().unwrap().events.clone()
    }

    async fn pause(&self) {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn check_read(&self) -> Result<(), AppError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::Backend("read unavailable".to_string()));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Backend("write rejected".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn list_applications(&self, uid: &str, year: i32) -> Result<Vec<Application>, AppError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.check_read()?;
        Ok(self
            .data
            .lock()
            .unwrap()
            .applications
            .iter()
            .filter(|a| a.applicant_id == uid && a.year == year && a.status.is_submitted())
            .cloned()
            .collect())
    }

    async fn get_draft(&self, uid: &str, year: i32) -> Result<Option<Application>, AppError> {
        self.draft_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.check_read()?;
        Ok(self
            .data
            .lock()
            .unwrap()
            .applications
            .iter()
            .find(|a| a.applicant_id == uid && a.year == year && !a.status.is_submitted())
            .cloned())
    }

    async fn save_draft(&self, draft: &Application) -> Result<Application, AppError> {
        self.check_write()?;
        let mut data = self.data.lock().unwrap();
        data.applications.retain(|a| a.id != draft.id);
        data.applications.push(draft.clone());
        Ok(draft.clone())
    }

    async fn submit_application(&self, uid: &str, year: i32) -> Result<Application, AppError> {
        self.check_write()?;
        let mut data = self.data.lock().unwrap();
        let draft = data
            .applications
            .iter_mut()
            .find(|a| a.applicant_id == uid && a.year == year && !a.status.is_submitted())
            .ok_or_else(|| AppError::NotFound("No draft".to_string()))?;
        draft.status = ApplicationStatus::Pending;
        Ok(draft.clone())
    }

    async fn get_application(&self, id: &str) -> Result<Option<Application>, AppError> {
        self.check_read()?;
        Ok(self
            .data
            .lock()
            .unwrap()
            .applications
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn set_application_status(
        &self,
        id: &str,
        status: ApplicationStatus,
    ) -> Result<Application, AppError> {
        self.check_write()?;
        let mut data = self.data.lock().unwrap();
        let application = data
            .applications
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Application {} not found", id)))?;
        application.status = status;
        Ok(application.clone())
    }

    async fn get_emergency_contact(
        &self,
        _uid: &str,
    ) -> Result<Option<EmergencyContact>, AppError> {
        self.check_read()?;
        Ok(None)
    }

    async fn set_emergency_contact(
        &self,
        _uid: &str,
        _contact: &EmergencyContact,
    ) -> Result<(), AppError> {
        self.check_write()
    }

    async fn get_typeform_links(&self) -> Result<Option<TypeformLinks>, AppError> {
        self.check_read()?;
        Ok(None)
    }

    async fn get_profile_picture_url(&self, uid: &str) -> Result<Option<String>, AppError> {
        self.picture_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.check_read()?;
        Ok(self.data.lock().unwrap().pictures.get(uid).cloned())
    }

    async fn set_profile_picture_url(&self, uid: &str, url: &str) -> Result<(), AppError> {
        self.check_write()?;
        self.insert_picture(uid, url);
        Ok(())
    }

    async fn get_team(&self, _uid: &str) -> Result<Option<Team>, AppError> {
        self.pause().await;
        self.check_read()?;
        Ok(None)
    }

    async fn save_team(&self, team: &Team) -> Result<Team, AppError> {
        self.check_write()?;
        Ok(team.clone())
    }

    async fn log_event(&self, kind: &str, data: serde_json::Value) -> Result<(), AppError> {
        self.data
            .lock()
            .unwrap()
            .events
            .push((kind.to_string(), data));
        Ok(())
    }

    async fn verify_github_email(&self, token: &str, _email: &str) -> Result<bool, AppError> {
        Ok(token == "valid-token")
    }

    async fn request_socials(&self, uid: &str) -> Result<Socials, AppError> {
        self.pause().await;
        self.check_read()?;
        Ok(self
            .data
            .lock()
            .unwrap()
            .socials
            .get(uid)
            .cloned()
            .unwrap_or_default())
    }

    async fn update_socials(&self, uid: &str, socials: &Socials) -> Result<Socials, AppError> {
        self.check_write()?;
        self.data
            .lock()
            .unwrap()
            .socials
            .insert(uid.to_string(), socials.clone());
        Ok(socials.clone())
    }
}
