//! Form binding and validation.
//!
//! Each form keeps the raw submitted strings so an invalid submission can be
//! re-rendered as typed, and `clean` turns it into the typed values the
//! repositories take, or into field-level errors.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::Deserialize;

use crate::auth::users::{self, ProfileChanges};
use crate::blog::posts::{self, PostDraft};
use crate::db::models::{Category, Location, Post, User};

pub const TITLE_MAX_CHARS: usize = 256;
pub const NAME_MAX_CHARS: usize = 150;
pub const PASSWORD_MIN_CHARS: usize = 8;

const REQUIRED: &str = "This field is required.";
const DATETIME_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";
const ACCEPTED_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<String, Vec<String>>,
    non_field: Vec<String>,
}

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.non_field.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }

    /// Messages for one field; empty when the field is fine.
    pub fn field(&self, name: &str) -> &[String] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn non_field(&self) -> &[String] {
        &self.non_field
    }
}

/// An `<option>` in a rendered `<select>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

fn choices<'a>(
    options: impl Iterator<Item = (&'a str, &'a str)>,
    current: &str,
) -> Vec<Choice> {
    std::iter::once(Choice {
        value: String::new(),
        label: "---------".to_string(),
        selected: current.is_empty(),
    })
    .chain(options.map(|(value, label)| Choice {
        value: value.to_string(),
        label: label.to_string(),
        selected: value == current,
    }))
    .collect()
}

/// Parse a `datetime-local` value; a bare date means midnight.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    ACCEPTED_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

pub fn format_datetime_input(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_INPUT_FORMAT).to_string()
}

// --- Posts ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub file_name: String,
    pub data: Vec<u8>,
}

impl UploadedImage {
    /// Lower-cased extension, if the name has one.
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
    }

    pub fn is_image(&self) -> bool {
        mime_guess::from_path(&self.file_name)
            .first()
            .is_some_and(|mime| mime.type_() == mime_guess::mime::IMAGE)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostForm {
    pub title: String,
    pub text: String,
    pub pub_date: String,
    pub category: String,
    pub location: String,
    pub is_published: bool,
    pub image: Option<UploadedImage>,
    pub clear_image: bool,
}

impl PostForm {
    /// Blank form for a new post: published, dated now.
    pub fn initial(now: NaiveDateTime) -> Self {
        Self {
            pub_date: format_datetime_input(&now),
            is_published: true,
            ..Self::default()
        }
    }

    pub fn from_post(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            text: post.text.clone(),
            pub_date: format_datetime_input(&post.pub_date),
            category: post.category_id.clone().unwrap_or_default(),
            location: post.location_id.clone().unwrap_or_default(),
            is_published: post.is_published,
            image: None,
            clear_image: false,
        }
    }

    pub fn category_choices(&self, categories: &[Category]) -> Vec<Choice> {
        choices(
            categories.iter().map(|c| (c.id.as_str(), c.title.as_str())),
            &self.category,
        )
    }

    pub fn location_choices(&self, locations: &[Location]) -> Vec<Choice> {
        choices(
            locations.iter().map(|l| (l.id.as_str(), l.name.as_str())),
            &self.location,
        )
    }

    /// Field checks that need nothing but the available choices.
    pub fn validate(
        &self,
        categories: &[Category],
        locations: &[Location],
    ) -> Result<PostDraft, FormErrors> {
        let mut errors = FormErrors::default();

        let title = self.title.trim();
        if title.is_empty() {
            errors.add("title", REQUIRED);
        } else if title.chars().count() > TITLE_MAX_CHARS {
            errors.add(
                "title",
                format!("Ensure this value has at most {TITLE_MAX_CHARS} characters."),
            );
        }

        let text = self.text.trim();
        if text.is_empty() {
            errors.add("text", REQUIRED);
        }

        let pub_date = if self.pub_date.trim().is_empty() {
            errors.add("pub_date", REQUIRED);
            None
        } else {
            let parsed = parse_datetime(&self.pub_date);
            if parsed.is_none() {
                errors.add("pub_date", "Enter a valid date/time.");
            }
            parsed
        };

        let category = self.category.trim();
        if category.is_empty() {
            errors.add("category", REQUIRED);
        } else if !categories.iter().any(|c| c.id == category) {
            errors.add(
                "category",
                "Select a valid choice. That choice is not one of the available choices.",
            );
        }

        let location = self.location.trim();
        if !location.is_empty() && !locations.iter().any(|l| l.id == location) {
            errors.add(
                "location",
                "Select a valid choice. That choice is not one of the available choices.",
            );
        }

        if let Some(image) = &self.image {
            if !image.is_image() {
                errors.add(
                    "image",
                    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.",
                );
            }
            if self.clear_image {
                errors.add(
                    "image",
                    "Please either submit a file or check the clear checkbox, not both.",
                );
            }
        }

        match pub_date {
            Some(pub_date) if errors.is_empty() => Ok(PostDraft {
                title: title.to_string(),
                text: text.to_string(),
                pub_date,
                is_published: self.is_published,
                category_id: Some(category.to_string()),
                location_id: (!location.is_empty()).then(|| location.to_string()),
            }),
            _ => Err(errors),
        }
    }

    /// Full validation, including the per-author uniqueness of title and text.
    /// `except_id` is the post being edited.
    pub fn clean(
        &self,
        conn: &Connection,
        categories: &[Category],
        locations: &[Location],
        author_id: &str,
        except_id: Option<&str>,
    ) -> rusqlite::Result<Result<PostDraft, FormErrors>> {
        let draft = match self.validate(categories, locations) {
            Ok(draft) => draft,
            Err(errors) => return Ok(Err(errors)),
        };
        if posts::duplicate_exists(conn, author_id, &draft.title, &draft.text, except_id)? {
            let mut errors = FormErrors::default();
            errors.add_non_field("You already have a post with this title and text.");
            return Ok(Err(errors));
        }
        Ok(Ok(draft))
    }
}

// --- Comments ---

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

impl CommentForm {
    pub fn clean(&self) -> Result<String, FormErrors> {
        let text = self.text.trim();
        if text.is_empty() {
            let mut errors = FormErrors::default();
            errors.add("text", REQUIRED);
            return Err(errors);
        }
        Ok(text.to_string())
    }
}

// --- Accounts ---

fn check_username(username: &str, errors: &mut FormErrors) {
    if username.is_empty() {
        errors.add("username", REQUIRED);
    } else if username.chars().count() > NAME_MAX_CHARS {
        errors.add(
            "username",
            format!("Ensure this value has at most {NAME_MAX_CHARS} characters."),
        );
    } else if !username
        .chars()
        .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
    {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }
}

/// Loose address check: one `@`, something before it, a dotted domain after.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
}

impl ProfileForm {
    pub fn from_user(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }

    pub fn clean(
        &self,
        conn: &Connection,
        user_id: &str,
    ) -> rusqlite::Result<Result<ProfileChanges, FormErrors>> {
        let mut errors = FormErrors::default();
        let username = self.username.trim();
        check_username(username, &mut errors);
        if errors.field("username").is_empty()
            && users::username_taken(conn, username, Some(user_id))?
        {
            errors.add("username", "A user with that username already exists.");
        }

        for (field, value) in [("first_name", &self.first_name), ("last_name", &self.last_name)] {
            if value.trim().chars().count() > NAME_MAX_CHARS {
                errors.add(
                    field,
                    format!("Ensure this value has at most {NAME_MAX_CHARS} characters."),
                );
            }
        }

        let email = self.email.trim();
        if !email.is_empty() && !is_valid_email(email) {
            errors.add("email", "Enter a valid email address.");
        }

        if !errors.is_empty() {
            return Ok(Err(errors));
        }
        Ok(Ok(ProfileChanges {
            username: username.to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: email.to_string(),
        }))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

/// A validated sign-up: username and plaintext password to hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub username: String,
    pub password: String,
}

impl RegistrationForm {
    pub fn clean(&self, conn: &Connection) -> rusqlite::Result<Result<NewAccount, FormErrors>> {
        let mut errors = FormErrors::default();
        let username = self.username.trim();
        check_username(username, &mut errors);
        if errors.field("username").is_empty() && users::username_taken(conn, username, None)? {
            errors.add("username", "A user with that username already exists.");
        }

        if self.password1.is_empty() {
            errors.add("password1", REQUIRED);
        }
        if self.password2.is_empty() {
            errors.add("password2", REQUIRED);
        } else if self.password1 != self.password2 {
            errors.add("password2", "The two password fields didn't match.");
        } else {
            let password = &self.password1;
            if password.chars().count() < PASSWORD_MIN_CHARS {
                errors.add(
                    "password2",
                    format!(
                        "This password is too short. It must contain at least {PASSWORD_MIN_CHARS} characters."
                    ),
                );
            }
            if password.chars().all(|c| c.is_ascii_digit()) {
                errors.add("password2", "This password is entirely numeric.");
            }
            if !username.is_empty() && password.eq_ignore_ascii_case(username) {
                errors.add("password2", "The password is too similar to the username.");
            }
        }

        if !errors.is_empty() {
            return Ok(Err(errors));
        }
        Ok(Ok(NewAccount {
            username: username.to_string(),
            password: self.password1.clone(),
        }))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: String,
}
