//! Notification mail body
//!
//! One mail per rule and batch. Entries are grouped by record in the order
//! they were staged; each group lists the changed fields with their previous
//! value (writes only) and current value.

use chrono::FixedOffset;

use audit_core::entities::{NotificationTask, StagedChange};

use crate::render::{escape_html, format_timestamp};

/// Rendered notification mail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Entries of one record
struct RecordGroup<'a> {
    model: &'a str,
    record_name: &'a str,
    changes: Vec<&'a StagedChange>,
}

fn group_by_record(changes: &[StagedChange]) -> Vec<RecordGroup<'_>> {
    let mut groups: Vec<RecordGroup<'_>> = Vec::new();
    for change in changes {
        let existing = groups.iter_mut().find(|g| {
            g.model == change.model
                && g.changes
                    .first()
                    .is_some_and(|c| c.record_key == change.record_key)
        });
        match existing {
            Some(group) => group.changes.push(change),
            None => groups.push(RecordGroup {
                model: &change.model,
                record_name: &change.record_name,
                changes: vec![change],
            }),
        }
    }
    groups
}

impl NotificationMail {
    /// Render a task for a rule, timestamps localized to `offset`
    pub fn render(task: &NotificationTask, rule_name: &str, offset: FixedOffset) -> Self {
        let groups = group_by_record(&task.changes);
        let timestamp = format_timestamp(task.timestamp, offset);

        let subject = if groups.len() == 1 {
            format!("[{rule_name}] {} changed", groups[0].record_name)
        } else {
            format!("[{rule_name}] {} records changed", groups.len())
        };

        let mut html = String::from("<div>\n");
        let mut text = String::new();

        for group in &groups {
            html.push_str(&format!(
                "<h3>{} <small>({})</small></h3>\n<ul>\n",
                escape_html(group.record_name),
                escape_html(group.model)
            ));
            text.push_str(&format!("{} ({})\n", group.record_name, group.model));

            for change in &group.changes {
                match &change.old_value {
                    Some(old) => {
                        html.push_str(&format!(
                            "<li><b>{}</b>: {} &rarr; {}</li>\n",
                            escape_html(&change.field_label),
                            escape_html(old),
                            escape_html(&change.current_value)
                        ));
                        text.push_str(&format!(
                            "  - {}: {} → {}\n",
                            change.field_label, old, change.current_value
                        ));
                    }
                    None => {
                        html.push_str(&format!(
                            "<li><b>{}</b>: {}</li>\n",
                            escape_html(&change.field_label),
                            escape_html(&change.current_value)
                        ));
                        text.push_str(&format!(
                            "  - {}: {}\n",
                            change.field_label, change.current_value
                        ));
                    }
                }
            }
            html.push_str("</ul>\n");
            text.push('\n');
        }

        html.push_str(&format!(
            "<p>{} &middot; {}</p>\n</div>\n",
            escape_html(&task.user_name),
            escape_html(&timestamp)
        ));
        text.push_str(&format!("-- \n{} · {}\n", task.user_name, timestamp));

        Self {
            subject,
            html,
            text,
        }
    }
}
