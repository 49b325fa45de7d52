//! UI-agnostic form metadata and validation results

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Raw submitted form values
pub type FormData = HashMap<String, String>;

/// Saved configuration of a rule action
pub type RuleOptions = BTreeMap<String, String>;

pub type Validation<T> = std::result::Result<T, FormErrors>;

/// Field metadata handed to whatever renders the rule editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldSpec {
    Choice {
        choices: Vec<(String, String)>,
        #[serde(skip_serializing_if = "Option::is_none")]
        default: Option<String>,
        #[serde(rename = "updatesForm", skip_serializing_if = "std::ops::Not::not")]
        updates_form: bool,
    },
    #[serde(rename = "string")]
    Text { placeholder: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// `None` for errors about the form as a whole
    pub field: Option<String>,
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormErrors(Vec<FieldError>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(&mut self, field: &str) {
        self.0.push(FieldError {
            field: Some(field.to_string()),
            code: "required",
            message: "This field is required.".to_string(),
        });
    }

    pub fn invalid_choice(&mut self, field: &str, value: &str) {
        self.0.push(FieldError {
            field: Some(field.to_string()),
            code: "invalid_choice",
            message: format!(
                "Select a valid choice. {} is not one of the available choices.",
                value
            ),
        });
    }

    pub fn non_field(&mut self, code: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field: None,
            code,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn for_field(&self, field: &str) -> impl Iterator<Item = &FieldError> {
        self.0
            .iter()
            .filter(move |e| e.field.as_deref() == Some(field))
    }

    /// `Ok(value)` when nothing was recorded
    pub fn finish<T>(self, value: T) -> Validation<T> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self
            .0
            .iter()
            .map(|e| match &e.field {
                Some(field) => format!("{}: {}", field, e.message),
                None => e.message.clone(),
            })
            .collect();
        f.write_str(&messages.join("; "))
    }
}

/// Trimmed, non-empty value of a required text field
pub fn required_text<'a>(data: &'a FormData, field: &str, errors: &mut FormErrors) -> Option<&'a str> {
    match data.get(field).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        Some(value) => Some(value),
        None => {
            errors.required(field);
            None
        }
    }
}

/// Trimmed value of an optional text field, empty when absent
pub fn optional_text<'a>(data: &'a FormData, field: &str) -> &'a str {
    data.get(field).map(|v| v.trim()).unwrap_or_default()
}

/// Required choice; returns the matching choice key
pub fn required_choice(
    data: &FormData,
    field: &str,
    choices: &[(String, String)],
    errors: &mut FormErrors,
) -> Option<String> {
    let value = required_text(data, field, errors)?;
    if choices.iter().any(|(key, _)| key == value) {
        Some(value.to_string())
    } else {
        errors.invalid_choice(field, value);
        None
    }
}

/// Comma separated tag list; blanks dropped
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(pairs: &[(&str, &str)]) -> FormData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_required_text() {
        let mut errors = FormErrors::new();
        let form = data(&[("channel", "  #general "), ("blank", "   ")]);

        assert_eq!(required_text(&form, "channel", &mut errors), Some("#general"));
        assert_eq!(required_text(&form, "blank", &mut errors), None);
        assert_eq!(required_text(&form, "missing", &mut errors), None);

        assert_eq!(errors.errors().len(), 2);
        assert_eq!(errors.for_field("blank").next().unwrap().code, "required");
    }

    #[test]
    fn test_required_choice() {
        let choices = vec![("1".to_string(), "Acme".to_string())];
        let mut errors = FormErrors::new();

        let form = data(&[("workspace", "1")]);
        assert_eq!(
            required_choice(&form, "workspace", &choices, &mut errors),
            Some("1".to_string())
        );

        let form = data(&[("workspace", "2")]);
        assert_eq!(required_choice(&form, "workspace", &choices, &mut errors), None);
        assert_eq!(errors.errors()[0].code, "invalid_choice");
    }

    #[test]
    fn test_split_tags() {
        assert_eq!(
            split_tags(" environment, user,,my_tag "),
            vec!["environment", "user", "my_tag"]
        );
        assert!(split_tags("").is_empty());
    }

    #[test]
    fn test_finish_and_display() {
        assert_eq!(FormErrors::new().finish(5), Ok(5));

        let mut errors = FormErrors::new();
        errors.required("channel");
        errors.non_field("invalid", "Workspace is gone.");
        assert_eq!(
            errors.to_string(),
            "channel: This field is required.; Workspace is gone."
        );
        assert!(errors.finish(()).is_err());
    }

    #[test]
    fn test_field_spec_serialization() {
        let spec = FieldSpec::Choice {
            choices: vec![("Bug".to_string(), "Bug".to_string())],
            default: Some("Bug".to_string()),
            updates_form: true,
        };
        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["type"], "choice");
        assert_eq!(value["updatesForm"], true);

        let spec = FieldSpec::Text {
            placeholder: "i.e #critical".to_string(),
        };
        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["type"], "string");
        assert!(value.get("updatesForm").is_none());
    }
}
