//! Shared business logic — framework-agnostic pure functions.
//!
//! Validation runs before any persistence call and returns a structured
//! result: either the validated fields or the full set of field-level
//! error messages. Route handlers never persist a record that failed here.

use std::collections::BTreeMap;

use crate::{Category, WorkForm};

// ─── Validation Result ───────────────────────────────────────────────────────

/// Accumulated field-level validation errors, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<(&'static str, String)>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push((field, message.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Error messages grouped by field, Rails-`errors.messages` shaped.
    pub fn messages(&self) -> BTreeMap<String, Vec<String>> {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (field, message) in &self.errors {
            map.entry((*field).to_string()).or_default().push(message.clone());
        }
        map
    }
}

// ─── Work Validation ─────────────────────────────────────────────────────────

/// A fully validated create payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWork {
    pub title: String,
    pub category: Category,
    pub creator: Option<String>,
    pub description: Option<String>,
    pub publication_year: Option<i64>,
}

/// A validated partial update. Absent fields leave the record untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkPatch {
    pub title: Option<String>,
    pub category: Option<Category>,
    pub creator: Option<String>,
    pub description: Option<String>,
    pub publication_year: Option<i64>,
}

impl WorkPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.category.is_none()
            && self.creator.is_none()
            && self.description.is_none()
            && self.publication_year.is_none()
    }
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// Validate a create payload: title present and non-blank, category present
/// and exactly one of the canonical strings.
pub fn validate_work_create(form: &WorkForm) -> Result<NewWork, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let title = match form.title.as_deref() {
        Some(t) if !is_blank(t) => Some(t.to_string()),
        _ => {
            errors.add("title", "can't be blank");
            None
        }
    };

    let category = match form.category.as_deref() {
        Some(c) => match Category::parse(c) {
            Some(cat) => Some(cat),
            None => {
                errors.add("category", format!("{c:?} is not a valid category"));
                None
            }
        },
        None => {
            errors.add("category", "can't be blank");
            None
        }
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    // Both are Some once errors is empty.
    Ok(NewWork {
        title: title.unwrap_or_default(),
        category: category.unwrap_or(Category::Album),
        creator: form.creator.clone(),
        description: form.description.clone(),
        publication_year: form.publication_year,
    })
}

/// Validate an update payload. Only present fields are checked; a present
/// but blank title or a present but non-canonical category rejects.
pub fn validate_work_patch(form: &WorkForm) -> Result<WorkPatch, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let mut patch = WorkPatch::default();

    if let Some(title) = form.title.as_deref() {
        if is_blank(title) {
            errors.add("title", "can't be blank");
        } else {
            patch.title = Some(title.to_string());
        }
    }

    if let Some(category) = form.category.as_deref() {
        match Category::parse(category) {
            Some(cat) => patch.category = Some(cat),
            None => errors.add("category", format!("{category:?} is not a valid category")),
        }
    }

    patch.creator = form.creator.clone();
    patch.description = form.description.clone();
    patch.publication_year = form.publication_year;

    if errors.is_empty() { Ok(patch) } else { Err(errors) }
}

// ─── Session IDs ─────────────────────────────────────────────────────────────

/// Generate an opaque session id for the session cookie.
pub fn generate_session_id() -> String {
    format!("msk_{}", uuid::Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::{validate_work_create, validate_work_patch};
    use crate::{Category, WorkForm};

    const INVALID_CATEGORIES: [&str; 5] = ["nope", "42", "", "  ", "albumstrailingtext"];

    fn form(title: Option<&str>, category: Option<&str>) -> WorkForm {
        WorkForm {
            title: title.map(String::from),
            category: category.map(String::from),
            ..WorkForm::default()
        }
    }

    #[test]
    fn create_accepts_canonical_categories() {
        for category in ["album", "book", "movie"] {
            let new = validate_work_create(&form(Some("Dirty Computer"), Some(category)))
                .expect("valid form");
            assert_eq!(new.category.as_str(), category);
            assert_eq!(new.title, "Dirty Computer");
        }
    }

    #[test]
    fn create_rejects_every_invalid_category() {
        for category in INVALID_CATEGORIES {
            let errors = validate_work_create(&form(Some("Invalid Work"), Some(category)))
                .expect_err("must reject");
            let messages = errors.messages();
            assert!(messages.contains_key("category"), "category {category:?} accepted");
        }
    }

    #[test]
    fn create_rejects_missing_or_blank_title() {
        for title in [None, Some(""), Some("   ")] {
            let errors =
                validate_work_create(&form(title, Some("book"))).expect_err("must reject");
            assert_eq!(
                errors.messages().get("title"),
                Some(&vec!["can't be blank".to_string()])
            );
        }
    }

    #[test]
    fn create_collects_all_field_errors_at_once() {
        let errors = validate_work_create(&form(None, Some("nope"))).expect_err("must reject");
        let messages = errors.messages();
        assert!(messages.contains_key("title"));
        assert!(messages.contains_key("category"));
    }

    #[test]
    fn patch_leaves_absent_fields_untouched() {
        let patch = validate_work_patch(&form(Some("Dirty Computer"), None)).expect("valid");
        assert_eq!(patch.title.as_deref(), Some("Dirty Computer"));
        assert!(patch.category.is_none());
    }

    #[test]
    fn patch_rejects_present_but_invalid_fields() {
        for category in INVALID_CATEGORIES {
            assert!(validate_work_patch(&form(None, Some(category))).is_err());
        }
        assert!(validate_work_patch(&form(Some("  "), None)).is_err());
    }

    #[test]
    fn category_parse_is_exact_and_case_sensitive() {
        assert_eq!(Category::parse("album"), Some(Category::Album));
        assert_eq!(Category::parse("Album"), None);
        assert_eq!(Category::parse("albums"), None);
        assert_eq!(Category::parse(" book"), None);
    }
}
