use base64::{STANDARD_NO_PAD, URL_SAFE_NO_PAD, decode_config, encode_config};
use time::format_description::StaticFormatDescription;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::error::{ServiceError, ValidationErrors};
use crate::types::push::{SubscriptionKeys, SubscriptionRequest};
use crate::types::task::{NewTask, Priority, TaskPatch};

pub(crate) const TITLE_MAX_CHARS: usize = 100;
pub(crate) const DESCRIPTION_MAX_CHARS: usize = 500;

/// `datetime-local` inputs carry no offset; they are read as UTC.
const LOCAL_DATE_TIME_FORMATS: [StaticFormatDescription; 2] = [
    format_description!("[year]-[month]-[day]T[hour]:[minute]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
];

#[derive(Debug)]
pub(crate) struct ValidTask {
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) due_date: OffsetDateTime,
    pub(crate) priority: Priority,
    pub(crate) tags: Vec<String>,
}

#[derive(Debug, Default)]
pub(crate) struct ValidPatch {
    pub(crate) title: Option<String>,
    /// `Some(None)` clears the description.
    pub(crate) description: Option<Option<String>>,
    pub(crate) due_date: Option<OffsetDateTime>,
    pub(crate) priority: Option<Priority>,
    pub(crate) tags: Option<Vec<String>>,
}

pub(crate) fn parse_due_date(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if let Ok(at) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(at);
    }
    LOCAL_DATE_TIME_FORMATS.iter().find_map(|format| {
        PrimitiveDateTime::parse(raw, format)
            .ok()
            .map(PrimitiveDateTime::assume_utc)
    })
}

pub(crate) fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !normalized.iter().any(|existing| existing == tag) {
            normalized.push(tag.to_string());
        }
    }
    normalized
}

fn check_title(raw: &str, errors: &mut ValidationErrors) -> String {
    let title = raw.trim();
    if title.is_empty() {
        errors.push("title", "Task title is required");
    } else if title.chars().count() > TITLE_MAX_CHARS {
        errors.push("title", "Title cannot exceed 100 characters");
    }
    title.to_string()
}

fn check_description(raw: Option<&str>, errors: &mut ValidationErrors) -> Option<String> {
    let description = raw.map(str::trim).filter(|d| !d.is_empty())?;
    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        errors.push("description", "Description cannot exceed 500 characters");
    }
    Some(description.to_string())
}

fn check_due_date(
    raw: Option<&str>,
    now: OffsetDateTime,
    errors: &mut ValidationErrors,
) -> Option<OffsetDateTime> {
    let Some(raw) = raw.filter(|raw| !raw.trim().is_empty()) else {
        errors.push("dueDate", "Due date is required");
        return None;
    };
    let Some(due_date) = parse_due_date(raw) else {
        errors.push("dueDate", "Due date must be a valid date");
        return None;
    };
    if due_date <= now {
        errors.push("dueDate", "Due date must be in the future");
    }
    Some(due_date)
}

pub(crate) fn validate_new_task(
    input: NewTask,
    now: OffsetDateTime,
) -> Result<ValidTask, ServiceError> {
    let mut errors = ValidationErrors::default();
    let title = check_title(&input.title, &mut errors);
    let description = check_description(input.description.as_deref(), &mut errors);
    let due_date = check_due_date(input.due_date.as_deref(), now, &mut errors);
    let (Some(due_date), true) = (due_date, errors.is_empty()) else {
        return Err(ServiceError::Validation(errors));
    };

    Ok(ValidTask {
        title,
        description,
        due_date,
        priority: input.priority.unwrap_or_default(),
        tags: normalize_tags(input.tags),
    })
}

pub(crate) fn validate_patch(
    patch: TaskPatch,
    now: OffsetDateTime,
) -> Result<ValidPatch, ServiceError> {
    let mut errors = ValidationErrors::default();
    let title = patch
        .title
        .as_deref()
        .map(|title| check_title(title, &mut errors));
    let description = patch
        .description
        .as_deref()
        .map(|description| check_description(Some(description), &mut errors));
    let due_date = match patch.due_date.as_deref() {
        Some(raw) => check_due_date(Some(raw), now, &mut errors),
        None => None,
    };
    errors.into_result()?;

    Ok(ValidPatch {
        title,
        description,
        due_date,
        priority: patch.priority,
        tags: patch.tags.map(normalize_tags),
    })
}

/// Accepts either base64 alphabet, padded or not, and re-encodes the key in
/// the URL-safe unpadded form the push encryption expects.
fn normalize_key(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('=');
    if trimmed.is_empty() {
        return None;
    }
    let bytes = decode_config(trimmed, URL_SAFE_NO_PAD)
        .or_else(|_| decode_config(trimmed, STANDARD_NO_PAD))
        .ok()?;
    Some(encode_config(bytes, URL_SAFE_NO_PAD))
}

/// Returns the subscription keys in canonical form.
pub(crate) fn validate_subscription(
    request: &SubscriptionRequest,
) -> Result<SubscriptionKeys, ServiceError> {
    let mut errors = ValidationErrors::default();
    let endpoint = request.endpoint.trim();
    if endpoint.is_empty() {
        errors.push("endpoint", "Endpoint is required");
    } else if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
        errors.push("endpoint", "Endpoint must be an http(s) URL");
    }
    let p256dh = normalize_key(&request.keys.p256dh);
    if p256dh.is_none() {
        errors.push("keys.p256dh", "p256dh key must be base64");
    }
    let auth = normalize_key(&request.keys.auth);
    if auth.is_none() {
        errors.push("keys.auth", "auth key must be base64");
    }
    let (Some(p256dh), Some(auth), true) = (p256dh, auth, errors.is_empty()) else {
        return Err(ServiceError::Validation(errors));
    };
    Ok(SubscriptionKeys { p256dh, auth })
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::testing::fixed_now;
    use crate::types::push::SubscriptionKeys;

    fn new_task(title: &str, due_date: Option<&str>) -> NewTask {
        NewTask {
            title: title.to_string(),
            due_date: due_date.map(str::to_string),
            ..NewTask::default()
        }
    }

    fn fields(err: ServiceError) -> Vec<&'static str> {
        match err {
            ServiceError::Validation(errors) => errors.0.iter().map(|e| e.field).collect(),
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn parse_due_date__should_accept_rfc3339_and_datetime_local() {
        let expected = OffsetDateTime::parse("2025-01-13T08:15:00Z", &Rfc3339).expect("parse");

        assert_eq!(parse_due_date("2025-01-13T08:15:00Z"), Some(expected));
        assert_eq!(parse_due_date("2025-01-13T09:15:00+01:00"), Some(expected));
        assert_eq!(parse_due_date("2025-01-13T08:15"), Some(expected));
        assert_eq!(parse_due_date("tomorrow"), None);
    }

    #[test]
    fn validate_new_task__should_normalize_fields() {
        // Given
        let input = NewTask {
            title: "  Buy milk  ".to_string(),
            description: Some("   ".to_string()),
            due_date: Some("2025-01-13T08:15:00Z".to_string()),
            priority: None,
            tags: vec![" home ".to_string(), "".to_string(), "home".to_string()],
        };

        // When
        let task = validate_new_task(input, fixed_now()).expect("valid task");

        // Then
        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.description, None);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.tags, vec!["home".to_string()]);
    }

    #[test]
    fn validate_new_task__should_report_every_bad_field() {
        let input = NewTask {
            title: "x".repeat(101),
            description: Some("y".repeat(501)),
            due_date: Some("2025-01-01T00:00:00Z".to_string()),
            ..NewTask::default()
        };

        let err = validate_new_task(input, fixed_now()).expect_err("invalid task");

        assert_eq!(fields(err), vec!["title", "description", "dueDate"]);
    }

    #[test]
    fn validate_new_task__should_require_title_and_due_date() {
        let err = validate_new_task(new_task("  ", None), fixed_now()).expect_err("invalid task");

        assert_eq!(fields(err), vec!["title", "dueDate"]);
    }

    #[test]
    fn validate_patch__should_only_check_present_fields() {
        let patch = TaskPatch {
            priority: Some(Priority::High),
            description: Some(String::new()),
            ..TaskPatch::default()
        };

        let valid = validate_patch(patch, fixed_now()).expect("valid patch");

        assert_eq!(valid.priority, Some(Priority::High));
        assert_eq!(valid.description, Some(None));
        assert!(valid.title.is_none());
        assert!(valid.due_date.is_none());
    }

    #[test]
    fn validate_subscription__should_require_endpoint_and_keys() {
        let request = SubscriptionRequest {
            endpoint: " ".to_string(),
            keys: SubscriptionKeys {
                p256dh: String::new(),
                auth: "c2VjcmV0".to_string(),
            },
            user_agent: None,
        };

        let err = validate_subscription(&request).expect_err("invalid subscription");

        assert_eq!(fields(err), vec!["endpoint", "keys.p256dh"]);
    }

    #[test]
    fn validate_subscription__should_reencode_standard_alphabet_keys() {
        // Given
        let request = SubscriptionRequest {
            endpoint: "https://push.example/abc".to_string(),
            keys: SubscriptionKeys {
                p256dh: "BNcRdreALRFXTkOOUHK1EtK2wtaz5Ry4YfYCA/0QTpQ=".to_string(),
                auth: "xS03Fj5ErfTNH/l9WHE9Ig==".to_string(),
            },
            user_agent: None,
        };

        // When
        let keys = validate_subscription(&request).expect("valid subscription");

        // Then
        assert_eq!(keys.p256dh, "BNcRdreALRFXTkOOUHK1EtK2wtaz5Ry4YfYCA_0QTpQ");
        assert_eq!(keys.auth, "xS03Fj5ErfTNH_l9WHE9Ig");
    }
}
