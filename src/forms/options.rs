//! Static option lists used to populate the application form.

use serde::Serialize;

/// Country selector entries. The dialing code is embedded in the label.
pub const COUNTRY_CODES: &[&str] = &[
    "Argentina (+54)",
    "Australia (+61)",
    "Austria (+43)",
    "Bangladesh (+880)",
    "Belgium (+32)",
    "Brazil (+55)",
    "Canada (+1)",
    "Chile (+56)",
    "China (+86)",
    "Colombia (+57)",
    "Denmark (+45)",
    "Egypt (+20)",
    "Finland (+358)",
    "France (+33)",
    "Germany (+49)",
    "Ghana (+233)",
    "Greece (+30)",
    "Hong Kong (+852)",
    "India (+91)",
    "Indonesia (+62)",
    "Ireland (+353)",
    "Israel (+972)",
    "Italy (+39)",
    "Jamaica (+1-876)",
    "Japan (+81)",
    "Kenya (+254)",
    "Malaysia (+60)",
    "Mexico (+52)",
    "Netherlands (+31)",
    "New Zealand (+64)",
    "Nigeria (+234)",
    "Norway (+47)",
    "Pakistan (+92)",
    "Peru (+51)",
    "Philippines (+63)",
    "Poland (+48)",
    "Portugal (+351)",
    "Puerto Rico (+1-787)",
    "Singapore (+65)",
    "South Africa (+27)",
    "South Korea (+82)",
    "Spain (+34)",
    "Sweden (+46)",
    "Switzerland (+41)",
    "Taiwan (+886)",
    "Turkey (+90)",
    "Ukraine (+380)",
    "United Arab Emirates (+971)",
    "United Kingdom (+44)",
    "United States (+1)",
    "Vietnam (+84)",
];

pub const GENDERS: &[&str] = &[
    "Woman",
    "Man",
    "Non-binary",
    "Prefer to self-describe",
    "Prefer not to answer",
];

pub const LEVELS_OF_STUDY: &[&str] = &[
    "Less than Secondary / High School",
    "Secondary / High School",
    "Undergraduate University (2 year - community college or similar)",
    "Undergraduate University (3+ year)",
    "Graduate University (Masters, Professional, Doctoral, etc)",
    "Code School / Bootcamp",
    "Other Vocational / Trade Program or Apprenticeship",
    "Post Doctorate",
    "I'm not currently a student",
    "Prefer not to answer",
];

pub const MAJORS: &[&str] = &[
    "Computer Science",
    "Computer Engineering",
    "Software Engineering",
    "Electrical Engineering",
    "Mechanical Engineering",
    "Information Systems",
    "Mathematics",
    "Statistics",
    "Physics",
    "Business",
    "Design",
    "Other",
];

pub const SHIRT_SIZES: &[&str] = &["XS", "S", "M", "L", "XL", "XXL"];

pub const DIETARY_RESTRICTIONS: &[&str] = &[
    "Vegetarian",
    "Vegan",
    "Celiac Disease",
    "Halal",
    "Kosher",
    "Nut Allergy",
    "Lactose Intolerant",
    "None",
];

pub const REFERRAL_SOURCES: &[&str] = &[
    "Instagram",
    "LinkedIn",
    "Discord",
    "Friend",
    "Professor",
    "Major League Hacking",
    "Other",
];

pub const YES_NO: &[&str] = &["Yes", "No"];

/// All option lists, as sent to the apply page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormOptions {
    pub country_codes: &'static [&'static str],
    pub genders: &'static [&'static str],
    pub levels_of_study: &'static [&'static str],
    pub majors: &'static [&'static str],
    pub shirt_sizes: &'static [&'static str],
    pub dietary_restrictions: &'static [&'static str],
    pub referral_sources: &'static [&'static str],
    pub yes_no: &'static [&'static str],
}

pub fn form_options() -> FormOptions {
    FormOptions {
        country_codes: COUNTRY_CODES,
        genders: GENDERS,
        levels_of_study: LEVELS_OF_STUDY,
        majors: MAJORS,
        shirt_sizes: SHIRT_SIZES,
        dietary_restrictions: DIETARY_RESTRICTIONS,
        referral_sources: REFERRAL_SOURCES,
        yes_no: YES_NO,
    }
}

/// True if `value` is one of `options`.
pub fn is_option(options: &[&str], value: &str) -> bool {
    options.contains(&value)
}
