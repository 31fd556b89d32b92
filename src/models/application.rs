//! Application record for one (user, hackathon year).

use serde::{Deserialize, Serialize};

/// Review status of an application.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Draft,
    Pending,
    Rejected,
    Accepted,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "draft",
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Accepted => "accepted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(ApplicationStatus::Draft),
            "pending" => Some(ApplicationStatus::Pending),
            "rejected" => Some(ApplicationStatus::Rejected),
            "accepted" => Some(ApplicationStatus::Accepted),
            _ => None,
        }
    }

    /// Submitted records are read-only on the client.
    pub fn is_submitted(&self) -> bool {
        !matches!(self, ApplicationStatus::Draft)
    }
}

/// Consent flags collected on the application form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Consents {
    pub code_of_conduct: bool,
    pub privacy_policy: bool,
    pub marketing_emails: bool,
    pub photo_release: bool,
}

impl Consents {
    /// The two agreements that must be accepted before submission.
    pub fn required_accepted(&self) -> bool {
        self.code_of_conduct && self.privacy_policy
    }
}

/// A hackathon application. Drafts are mutable until submitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: String,
    pub applicant_id: String,
    pub year: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_of_study: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub major: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graduation_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shirt_size: Option<String>,
    #[serde(default)]
    pub dietary_restrictions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_hackathon: Option<bool>,
    #[serde(default)]
    pub consents: Consents,
    pub status: ApplicationStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// Partial update of a draft. Absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDraftRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Country selector label, e.g. `Canada (+1)`
    #[serde(default)]
    pub phone_country: Option<String>,
    /// Digits typed into the phone field
    #[serde(default)]
    pub phone_digits: Option<String>,
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub level_of_study: Option<String>,
    #[serde(default)]
    pub school: Option<String>,
    #[serde(default)]
    pub major: Option<String>,
    #[serde(default)]
    pub graduation_year: Option<i32>,
    #[serde(default)]
    pub shirt_size: Option<String>,
    #[serde(default)]
    pub dietary_restrictions: Option<Vec<String>>,
    #[serde(default)]
    pub referral_source: Option<String>,
    #[serde(default)]
    pub first_hackathon: Option<bool>,
    #[serde(default)]
    pub consents: Option<Consents>,
}

impl SaveDraftRequest {
    /// Apply the non-phone fields of this request to a draft.
    pub fn apply_to(&self, draft: &mut Application) {
        if let Some(v) = &self.first_name {
            draft.first_name = v.clone();
        }
        if let Some(v) = &self.last_name {
            draft.last_name = v.clone();
        }
        if let Some(v) = &self.email {
            draft.email = v.clone();
        }
        if self.age.is_some() {
            draft.age = self.age;
        }
        if self.country.is_some() {
            draft.country = self.country.clone();
        }
        if self.gender.is_some() {
            draft.gender = self.gender.clone();
        }
        if self.level_of_study.is_some() {
            draft.level_of_study = self.level_of_study.clone();
        }
        if self.school.is_some() {
            draft.school = self.school.clone();
        }
        if self.major.is_some() {
            draft.major = self.major.clone();
        }
        if self.graduation_year.is_some() {
            draft.graduation_year = self.graduation_year;
        }
        if self.shirt_size.is_some() {
            draft.shirt_size = self.shirt_size.clone();
        }
        if let Some(v) = &self.dietary_restrictions {
            draft.dietary_restrictions = v.clone();
        }
        if self.referral_source.is_some() {
            draft.referral_source = self.referral_source.clone();
        }
        if self.first_hackathon.is_some() {
            draft.first_hackathon = self.first_hackathon;
        }
        if let Some(v) = &self.consents {
            draft.consents = v.clone();
        }
    }
}

/// Request body for an admin status decision.
#[derive(Debug, Clone, Deserialize)]
pub struct SetStatusRequest {
    pub status: ApplicationStatus,
}
