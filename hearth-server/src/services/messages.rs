//! Outbound message templates

/// Reminder for a task due tomorrow
pub fn format_task_reminder(title: &str, due_date: &str, creator: Option<&str>) -> String {
    format!(
        "Reminder: Task \"{}\" is due tomorrow{}. Due: {}",
        title,
        from_clause(creator),
        due_date
    )
}

/// Reminder for an event happening tomorrow
pub fn format_event_reminder(
    title: &str,
    date: &str,
    time: Option<&str>,
    creator: Option<&str>,
) -> String {
    let at = match time.filter(|t| !t.is_empty()) {
        Some(t) => format!(" at {}", t),
        None => String::new(),
    };
    format!(
        "Reminder: Event \"{}\" is tomorrow{}{}. Date: {}",
        title,
        at,
        from_clause(creator),
        date
    )
}

/// Personalised morning greeting carrying the day's quote
pub fn format_good_morning(name: &str, quote: &str) -> String {
    format!(
        "\u{1F305} Good Morning, {}!\n\n{}\n\nHave a wonderful day! \u{1F499}",
        name, quote
    )
}

fn from_clause(creator: Option<&str>) -> String {
    match creator.filter(|c| !c.is_empty()) {
        Some(name) => format!(" (from {})", name),
        None => String::new(),
    }
}
