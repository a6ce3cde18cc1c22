use chrono::{NaiveDateTime, Utc};

/// Publication date as shown on post cards and the detail page.
pub fn format_pub_date(dt: &NaiveDateTime) -> String {
    dt.format("%-d %B %Y, %H:%M").to_string()
}

pub fn format_relative_time(dt: &NaiveDateTime) -> String {
    relative_to(dt, Utc::now().naive_utc())
}

fn relative_to(dt: &NaiveDateTime, now: NaiveDateTime) -> String {
    let diff = now.signed_duration_since(*dt);

    let seconds = diff.num_seconds();
    if seconds < 60 {
        return "just now".to_string();
    }

    let minutes = diff.num_minutes();
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }

    let hours = diff.num_hours();
    if hours < 24 {
        return format!("{}h ago", hours);
    }

    let days = diff.num_days();
    if days < 7 {
        return format!("{}d ago", days);
    }

    dt.format("%b %-d, %Y").to_string()
}

/// First `words` words of `text`, with an ellipsis when cut.
pub fn truncate_words(text: &str, words: usize) -> String {
    let mut parts = text.split_whitespace();
    let kept: Vec<&str> = parts.by_ref().take(words).collect();
    if parts.next().is_some() {
        format!("{} …", kept.join(" "))
    } else {
        kept.join(" ")
    }
}
