//! Legacy message attachment for alert notifications

use crate::rules::{Event, Rule};
use serde_json::{Value, json};
use std::collections::BTreeSet;

const MAX_TEXT_LEN: usize = 600;

/// Build the attachment posted for an event
///
/// Only tags whose key is in `tags` are rendered, in the order they appear on
/// the event.
pub fn build_attachment(event: &Event, tags: &BTreeSet<String>, rules: &[Rule]) -> Value {
    let group = &event.group;

    let fields: Vec<Value> = event
        .tags
        .iter()
        .filter(|(key, _)| tags.contains(key))
        .map(|(key, value)| {
            json!({
                "title": key,
                "value": value,
                "short": true,
            })
        })
        .collect();

    let text = truncate(
        group
            .culprit
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(&event.message),
        MAX_TEXT_LEN,
    );

    let footer = match rules.first() {
        Some(rule) if rules.len() > 1 => format!(
            "{} via {} (+{} other)",
            group.project.name,
            rule.label,
            rules.len() - 1
        ),
        Some(rule) => format!("{} via {}", group.project.name, rule.label),
        None => group.project.name.clone(),
    };

    let mut attachment = json!({
        "fallback": format!("[{}] {}", group.project.name, group.title),
        "title": group.title,
        "text": text,
        "color": group.level.color(),
        "fields": fields,
        "mrkdwn_in": ["text"],
        "footer": footer,
        "ts": event.timestamp.timestamp(),
    });

    if let Some(url) = &group.url {
        attachment["title_link"] = Value::String(url.clone());
    }

    attachment
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::{OrganizationId, Project};
    use crate::rules::{Group, GroupStatus, Level};
    use chrono::{TimeZone, Utc};

    fn event() -> Event {
        Event {
            id: "e1".to_string(),
            group: Group {
                id: 7,
                title: "ZeroDivisionError: division by zero".to_string(),
                culprit: Some("app.views.divide".to_string()),
                project: Project {
                    id: 1,
                    name: "backend".to_string(),
                    organization_id: OrganizationId(1),
                },
                status: GroupStatus::Unresolved,
                level: Level::Error,
                url: Some("https://tracker.example.com/issues/7/".to_string()),
            },
            message: "division by zero".to_string(),
            tags: vec![
                ("environment".to_string(), "prod".to_string()),
                ("level".to_string(), "error".to_string()),
                ("user".to_string(), "42".to_string()),
            ],
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_attachment_selects_requested_tags() {
        let tags: BTreeSet<String> = ["user", "environment", "missing"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let rules = vec![Rule {
            id: 1,
            label: "High error rate".to_string(),
        }];

        let attachment = build_attachment(&event(), &tags, &rules);

        let fields = attachment["fields"].as_array().unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0]["title"], "environment");
        assert_eq!(fields[1]["value"], "42");
        assert_eq!(attachment["title_link"], "https://tracker.example.com/issues/7/");
        assert_eq!(attachment["text"], "app.views.divide");
        assert_eq!(attachment["color"], "#e03e2f");
        assert_eq!(attachment["footer"], "backend via High error rate");
        assert_eq!(attachment["ts"], 1714564800);
    }

    #[test]
    fn test_attachment_without_rules_or_link() {
        let mut event = event();
        event.group.url = None;
        event.group.culprit = None;

        let attachment = build_attachment(&event, &BTreeSet::new(), &[]);

        assert!(attachment.get("title_link").is_none());
        assert_eq!(attachment["text"], "division by zero");
        assert_eq!(attachment["footer"], "backend");
        assert!(attachment["fields"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc…");
    }
}
