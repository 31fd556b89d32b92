//! SQLite-backed implementation of the remote data accessors.
//!
//! Documents are stored as JSON; applications keep owner, year and status in
//! columns so they can be queried without decoding every record.

use async_trait::async_trait;
use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::{Row, SqlitePool};

use super::collections;
use crate::errors::AppError;
use crate::models::{
    Application, ApplicationStatus, EmergencyContact, LoggedEvent, Socials, Team, TypeformLinks,
};
use crate::remote::Backend;

/// Document id of the typeform links inside `hackathon-metadata`.
const TYPEFORMS_DOC: &str = "typeforms";

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== DOCUMENT OPERATIONS ====================

    /// Read a document and decode it.
    pub async fn get_document<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<T>, AppError> {
        let row = sqlx::query("SELECT data FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let data: String = row.get("data");
                Ok(Some(serde_json::from_str(&data)?))
            }
            None => Ok(None),
        }
    }

    /// Insert or replace a document.
    pub async fn put_document<T: Serialize>(
        &self,
        collection: &str,
        id: &str,
        value: &T,
    ) -> Result<(), AppError> {
        let data = serde_json::to_string(value)?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO documents (collection, id, data, updated_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(collection, id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
        )
        .bind(collection)
        .bind(id)
        .bind(&data)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Decode every document of a collection.
    async fn list_documents<T: DeserializeOwned>(
        &self,
        collection: &str,
    ) -> Result<Vec<T>, AppError> {
        let rows = sqlx::query("SELECT data FROM documents WHERE collection = ? ORDER BY id")
            .bind(collection)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                let data: String = row.get("data");
                serde_json::from_str(&data).map_err(AppError::from)
            })
            .collect()
    }

    /// Seed the typeform links document.
    pub async fn set_typeform_links(&self, links: &TypeformLinks) -> Result<(), AppError> {
        self.put_document(collections::HACKATHON_METADATA, TYPEFORMS_DOC, links)
            .await
    }

    /// Register a token/email pair that `verify_github_email` accepts.
    pub async fn register_github_email(&self, token: &str, email: &str) -> Result<(), AppError> {
        sqlx::query("INSERT OR IGNORE INTO github_emails (token, email) VALUES (?, ?)")
            .bind(token)
            .bind(email.to_lowercase())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Telemetry events in insertion order.
    pub async fn list_events(&self) -> Result<Vec<LoggedEvent>, AppError> {
        let rows = sqlx::query("SELECT kind, data, created_at FROM events ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                let data: String = row.get("data");
                Ok(LoggedEvent {
                    kind: row.get("kind"),
                    data: serde_json::from_str(&data)?,
                    created_at: row.get("created_at"),
                })
            })
            .collect()
    }

    // ==================== APPLICATION HELPERS ====================

    async fn write_application(&self, application: &Application) -> Result<(), AppError> {
        let data = serde_json::to_string(application)?;

        sqlx::query(
            "INSERT INTO applications (id, applicant_id, year, status, data, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET status = excluded.status, data = excluded.data, updated_at = excluded.updated_at",
        )
        .bind(&application.id)
        .bind(&application.applicant_id)
        .bind(application.year)
        .bind(application.status.as_str())
        .bind(&data)
        .bind(&application.created_at)
        .bind(&application.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn query_applications(
        &self,
        uid: &str,
        year: i32,
        drafts: bool,
    ) -> Result<Vec<Application>, AppError> {
        let sql = if drafts {
            "SELECT data FROM applications WHERE applicant_id = ? AND year = ? AND status = 'draft' ORDER BY created_at DESC"
        } else {
            "SELECT data FROM applications WHERE applicant_id = ? AND year = ? AND status != 'draft' ORDER BY created_at DESC"
        };

        let rows = sqlx::query(sql)
            .bind(uid)
            .bind(year)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(application_from_row).collect()
    }
}

#[async_trait]
impl Backend for Repository {
    async fn list_applications(&self, uid: &str, year: i32) -> Result<Vec<Application>, AppError> {
        self.query_applications(uid, year, false).await
    }

    async fn get_draft(&self, uid: &str, year: i32) -> Result<Option<Application>, AppError> {
        Ok(self
            .query_applications(uid, year, true)
            .await?
            .into_iter()
            .next())
    }

    async fn save_draft(&self, draft: &Application) -> Result<Application, AppError> {
        if draft.status.is_submitted() {
            return Err(AppError::Validation(
                "Only drafts can be saved".to_string(),
            ));
        }

        if let Some(existing) = self.get_application(&draft.id).await? {
            if existing.status.is_submitted() {
                return Err(AppError::Validation(format!(
                    "Application {} is already submitted",
                    draft.id
                )));
            }
        }

        let mut saved = draft.clone();
        saved.updated_at = Utc::now().to_rfc3339();
        self.write_application(&saved).await?;
        Ok(saved)
    }

    async fn submit_application(&self, uid: &str, year: i32) -> Result<Application, AppError> {
        if !self.query_applications(uid, year, false).await?.is_empty() {
            return Err(AppError::Validation(format!(
                "An application for {} was already submitted",
                year
            )));
        }

        let mut application = self
            .get_draft(uid, year)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No draft for {}", year)))?;

        application.status = ApplicationStatus::Pending;
        application.updated_at = Utc::now().to_rfc3339();

        // Only promote if the row is still a draft
        let data = serde_json::to_string(&application)?;
        let result = sqlx::query(
            "UPDATE applications SET status = ?, data = ?, updated_at = ? WHERE id = ? AND status = 'draft'",
        )
        .bind(application.status.as_str())
        .bind(&data)
        .bind(&application.updated_at)
        .bind(&application.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Validation(
                "Concurrent submission detected".to_string(),
            ));
        }

        Ok(application)
    }

    async fn get_application(&self, id: &str) -> Result<Option<Application>, AppError> {
        let row = sqlx::query("SELECT data FROM applications WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(application_from_row).transpose()
    }

    async fn set_application_status(
        &self,
        id: &str,
        status: ApplicationStatus,
    ) -> Result<Application, AppError> {
        let mut application = self
            .get_application(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Application {} not found", id)))?;

        if !application.status.is_submitted() || !status.is_submitted() {
            return Err(AppError::Validation(
                "Status decisions apply to submitted applications only".to_string(),
            ));
        }

        application.status = status;
        application.updated_at = Utc::now().to_rfc3339();
        self.write_application(&application).await?;
        Ok(application)
    }

    async fn get_emergency_contact(
        &self,
        uid: &str,
    ) -> Result<Option<EmergencyContact>, AppError> {
        self.get_document(collections::EMERGENCY_CONTACTS, uid).await
    }

    async fn set_emergency_contact(
        &self,
        uid: &str,
        contact: &EmergencyContact,
    ) -> Result<(), AppError> {
        self.put_document(collections::EMERGENCY_CONTACTS, uid, contact)
            .await
    }

    async fn get_typeform_links(&self) -> Result<Option<TypeformLinks>, AppError> {
        self.get_document(collections::HACKATHON_METADATA, TYPEFORMS_DOC)
            .await
    }

    async fn get_profile_picture_url(&self, uid: &str) -> Result<Option<String>, AppError> {
        self.get_document(collections::PROFILE_PICTURES, uid).await
    }

    async fn set_profile_picture_url(&self, uid: &str, url: &str) -> Result<(), AppError> {
        self.put_document(collections::PROFILE_PICTURES, uid, &url)
            .await
    }

    async fn get_team(&self, uid: &str) -> Result<Option<Team>, AppError> {
        let teams: Vec<Team> = self.list_documents(collections::TEAMS).await?;
        Ok(teams
            .into_iter()
            .find(|t| t.owner_id == uid || t.member_ids.iter().any(|m| m == uid)))
    }

    async fn save_team(&self, team: &Team) -> Result<Team, AppError> {
        if team.name.trim().is_empty() {
            return Err(AppError::Validation("Team name is required".to_string()));
        }

        let mut saved = team.clone();
        saved.updated_at = Utc::now().to_rfc3339();
        self.put_document(collections::TEAMS, &saved.id, &saved)
            .await?;
        Ok(saved)
    }

    async fn log_event(&self, kind: &str, data: serde_json::Value) -> Result<(), AppError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("INSERT INTO events (kind, data, created_at) VALUES (?, ?, ?)")
            .bind(kind)
            .bind(data.to_string())
            .bind(&now)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn verify_github_email(&self, token: &str, email: &str) -> Result<bool, AppError> {
        let row = sqlx::query("SELECT 1 AS found FROM github_emails WHERE token = ? AND email = ?")
            .bind(token)
            .bind(email.to_lowercase())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn request_socials(&self, uid: &str) -> Result<Socials, AppError> {
        Ok(self
            .get_document(collections::SOCIALS, uid)
            .await?
            .unwrap_or_default())
    }

    async fn update_socials(&self, uid: &str, socials: &Socials) -> Result<Socials, AppError> {
        self.put_document(collections::SOCIALS, uid, socials).await?;
        Ok(socials.clone())
    }
}

fn application_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Application, AppError> {
    let data: String = row.get("data");
    Ok(serde_json::from_str(&data)?)
}
