//! Default application factory and submission checks.

use chrono::Utc;

use super::options::{self, is_option};
use crate::errors::AppError;
use crate::models::{Application, ApplicationStatus, Consents, CurrentUser};

/// A fresh draft for `user` with identity fields prefilled.
pub fn new_application(user: &CurrentUser, year: i32) -> Application {
    let now = Utc::now().to_rfc3339();
    let (first_name, last_name) = split_name(user.display_name.as_deref().unwrap_or_default());

    Application {
        id: uuid::Uuid::new_v4().to_string(),
        applicant_id: user.uid.clone(),
        year,
        first_name,
        last_name,
        email: user.email.clone().unwrap_or_default(),
        phone: String::new(),
        age: None,
        country: None,
        gender: None,
        level_of_study: None,
        school: None,
        major: None,
        graduation_year: None,
        shirt_size: None,
        dietary_restrictions: Vec::new(),
        referral_source: None,
        first_hackathon: None,
        consents: Consents::default(),
        status: ApplicationStatus::Draft,
        created_at: now.clone(),
        updated_at: now,
    }
}

fn split_name(display_name: &str) -> (String, String) {
    let trimmed = display_name.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((first, rest)) => (first.to_string(), rest.trim().to_string()),
        None => (trimmed.to_string(), String::new()),
    }
}

/// Check that a draft is complete enough to submit.
pub fn validate_for_submission(application: &Application) -> Result<(), AppError> {
    if application.first_name.trim().is_empty() || application.last_name.trim().is_empty() {
        return Err(AppError::Validation("Full name is required".to_string()));
    }
    if !application.email.contains('@') {
        return Err(AppError::Validation("A valid email is required".to_string()));
    }
    // An empty composite phone means the number was never completed
    if application.phone.is_empty() {
        return Err(AppError::Validation("Phone number is required".to_string()));
    }
    if !application.consents.required_accepted() {
        return Err(AppError::Validation(
            "The code of conduct and privacy policy must be accepted".to_string(),
        ));
    }

    let choices = [
        (&application.gender, options::GENDERS, "gender"),
        (&application.level_of_study, options::LEVELS_OF_STUDY, "level of study"),
        (&application.shirt_size, options::SHIRT_SIZES, "shirt size"),
    ];
    for (value, allowed, field) in choices {
        if let Some(value) = value {
            if !is_option(allowed, value) {
                return Err(AppError::Validation(format!("Unknown {}: {}", field, value)));
            }
        }
    }

    for restriction in &application.dietary_restrictions {
        if !is_option(options::DIETARY_RESTRICTIONS, restriction) {
            return Err(AppError::Validation(format!(
                "Unknown dietary restriction: {}",
                restriction
            )));
        }
    }

    Ok(())
}
