use std::sync::OnceLock;

use regex::Regex;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, Weekday};

use crate::model::{Priority, Recurrence, Task, TaskStatus};

pub const DEFAULT_DURATION_MINUTES: u32 = 60;

const MAX_TAGS: usize = 4;
const SLUG_MAX_LEN: usize = 20;

const HIGH_PRIORITY_MARKERS: &[&str] = &[
    "urgent",
    "asap",
    "critical",
    "emergency",
    "immediately",
    "high priority",
];

const LOW_PRIORITY_MARKERS: &[&str] = &[
    "low priority",
    "someday",
    "eventually",
    "when possible",
    "nice to have",
    "optional",
    "maybe",
];

const FILLER_PREFIXES: &[&str] = &[
    "i need to",
    "i have to",
    "i want to",
    "i should",
    "we need to",
    "please",
    "remember to",
    "don't forget to",
    "todo:",
    "task:",
];

// Sorted for binary search. A clause only splits at a conjunction when both
// sides carry one of these.
const VERB_WORDS: &[&str] = &[
    "attend", "book", "buy", "call", "check", "clean", "draft", "email", "exercise", "finish",
    "fix", "meet", "organize", "pay", "plan", "practice", "prepare", "read", "renew", "research",
    "review", "schedule", "send", "study", "submit", "update", "visit", "walk", "water", "write",
];

// Keyword table matched as substrings, like the tag heuristics this grew out
// of; first match per tag, insertion order, at most MAX_TAGS.
const TAG_RULES: &[(&str, &[&str])] = &[
    (
        "work",
        &[
            "work", "office", "meeting", "project", "deadline", "client", "report", "review",
        ],
    ),
    ("personal", &["personal", "home", "family", "hobby"]),
    (
        "health",
        &["exercise", "gym", "doctor", "medication", "health"],
    ),
    ("shopping", &["buy", "purchase", "shop", "grocery", "store"]),
    (
        "communication",
        &["call", "email", "text", "message", "contact"],
    ),
    (
        "travel",
        &["travel", "trip", "flight", "hotel", "vacation"],
    ),
    ("finance", &["pay", "bill", "bank", "money", "budget"]),
    ("learning", &["learn", "study", "course", "book", "research"]),
    (
        "maintenance",
        &["fix", "repair", "clean", "maintain", "organize"],
    ),
];

fn list_marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)(?:^\s*(?:\d{1,2}\.|[-*])\s+|\s\d{1,2}\.\s+)")
            .expect("list marker pattern must compile")
    })
}

fn conjunction_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:,\s*|\s+)(?:and\s+then|and|then)\s+")
            .expect("conjunction pattern must compile")
    })
}

fn hours_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:for\s+)?(\d{1,3})\s*(?:hours?|hrs?|h)\b(?:\s*(?:and\s+)?(\d{1,3})\s*(?:minutes?|mins?|m)\b)?",
        )
        .expect("hours pattern must compile")
    })
}

fn minutes_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:for\s+)?(\d{1,4})\s*(?:minutes?|mins?|m)\b")
            .expect("minutes pattern must compile")
    })
}

fn iso_date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:(?:by|due(?:\s+on)?|on|before)\s+)?(\d{4}-\d{2}-\d{2})\b")
            .expect("iso date pattern must compile")
    })
}

fn in_days_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:in|within)\s+(\d{1,3})\s+days?\b")
            .expect("relative days pattern must compile")
    })
}

fn date_keyword_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:(?:by|due(?:\s+on)?|on|before)\s+)?(today|tomorrow|monday|tuesday|wednesday|thursday|friday|saturday|sunday|next\s+week)\b",
        )
        .expect("date keyword pattern must compile")
    })
}

fn priority_marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:urgent|asap|critical|emergency|immediately|high\s+priority|low\s+priority|someday|eventually|when\s+possible|nice\s+to\s+have|optional)\b\s*:?",
        )
        .expect("priority marker pattern must compile")
    })
}

/// Parses free text into zero or more task records, resolving relative dates
/// against the injected `now`. Never fails: empty input yields an empty
/// sequence and unrecognizable input degrades to a single best-effort task.
pub fn extract(text: &str, now: OffsetDateTime) -> Vec<Task> {
    extract_with_default_duration(text, now, DEFAULT_DURATION_MINUTES)
}

pub fn extract_with_default_duration(
    text: &str,
    now: OffsetDateTime,
    default_duration_minutes: u32,
) -> Vec<Task> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let mut tasks: Vec<Task> = Vec::new();
    for clause in segment_clauses(trimmed) {
        let mut task = build_task(&clause, now, default_duration_minutes);
        let base_id = task.id.clone();
        let mut suffix = 2;
        while tasks.iter().any(|existing| existing.id == task.id) {
            task.id = format!("{base_id}-{suffix}");
            suffix += 1;
        }
        tasks.push(task);
    }
    tasks
}

/// Deterministic task identity: normalized-title slug plus the creation date.
pub fn task_id(title: &str, date: Date) -> String {
    let mut slug = String::new();
    let mut previous_dash = false;
    for ch in title.chars() {
        if slug.len() >= SLUG_MAX_LEN {
            break;
        }
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            previous_dash = false;
        } else if !previous_dash && !slug.is_empty() {
            slug.push('-');
            previous_dash = true;
        }
    }
    let slug = slug.trim_end_matches('-');
    let slug = if slug.is_empty() { "task" } else { slug };
    format!(
        "{slug}-{:04}{:02}{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

fn build_task(clause: &str, now: OffsetDateTime, default_duration_minutes: u32) -> Task {
    let priority = detect_priority(clause);
    let mut working = clause.to_string();
    let duration_minutes = take_duration(&mut working)
        .filter(|minutes| *minutes > 0)
        .unwrap_or(default_duration_minutes);
    let due_date = take_due_date(&mut working, now);
    strip_priority_markers(&mut working);

    let title = tidy_title(&working, clause);
    let description = (clause.trim().len() > title.len() + 20)
        .then(|| collapse_whitespace(clause));

    Task {
        id: task_id(&title, now.date()),
        title,
        description,
        priority,
        duration_minutes,
        due_date,
        tags: infer_tags(clause),
        recurrence: detect_recurrence(clause),
        status: TaskStatus::Pending,
        created_at: now.format(&Rfc3339).unwrap_or_default(),
    }
}

fn segment_clauses(text: &str) -> Vec<String> {
    let mut clauses = Vec::new();
    for item in split_list_items(text) {
        for sentence in item.split(['.', '!', '?', ';', '\n']) {
            let sentence = sentence.trim();
            if sentence.is_empty() {
                continue;
            }
            for part in split_on_conjunctions(sentence) {
                let part = part.trim();
                if !part.is_empty() {
                    clauses.push(part.to_string());
                }
            }
        }
    }
    clauses
}

fn split_list_items(text: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut cursor = 0;
    for marker in list_marker_regex().find_iter(text) {
        if marker.start() > cursor {
            items.push(text[cursor..marker.start()].to_string());
        }
        cursor = marker.end();
    }
    items.push(text[cursor..].to_string());
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn split_on_conjunctions(sentence: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut start = 0;
    for separator in conjunction_regex().find_iter(sentence) {
        let left = &sentence[start..separator.start()];
        let right = &sentence[separator.end()..];
        if contains_verb(left) && contains_verb(right) {
            parts.push(left.to_string());
            start = separator.end();
        }
    }
    parts.push(sentence[start..].to_string());
    parts
}

fn contains_verb(text: &str) -> bool {
    text.split(|c: char| !c.is_ascii_alphanumeric()).any(|word| {
        let word = word.to_ascii_lowercase();
        VERB_WORDS.binary_search(&word.as_str()).is_ok()
    })
}

fn detect_priority(clause: &str) -> Priority {
    let lower = clause.to_lowercase();
    if HIGH_PRIORITY_MARKERS
        .iter()
        .any(|marker| lower.contains(marker))
        || clause.contains("!!")
    {
        return Priority::High;
    }
    if LOW_PRIORITY_MARKERS
        .iter()
        .any(|marker| lower.contains(marker))
    {
        return Priority::Low;
    }
    Priority::Medium
}

fn take_duration(working: &mut String) -> Option<u32> {
    let hours_match = hours_regex().captures(working).map(|caps| {
        let hours: u32 = caps[1].parse().unwrap_or(0);
        let minutes: u32 = caps
            .get(2)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0);
        (caps.get(0).map(|m| m.range()), hours * 60 + minutes)
    });
    if let Some((Some(range), total)) = hours_match {
        working.replace_range(range, " ");
        return Some(total);
    }

    let minutes_match = minutes_regex()
        .captures(working)
        .map(|caps| (caps.get(0).map(|m| m.range()), caps[1].parse().unwrap_or(0)));
    if let Some((Some(range), total)) = minutes_match {
        working.replace_range(range, " ");
        return Some(total);
    }
    None
}

fn take_due_date(working: &mut String, now: OffsetDateTime) -> Option<String> {
    // Rule precedence: explicit ISO dates, then "in N days", then the
    // relative vocabulary.
    if let Some((range, date)) = match_iso_date(working) {
        let due = date.midnight().assume_offset(now.offset());
        working.replace_range(range, " ");
        return due.format(&Rfc3339).ok();
    }

    let in_days = in_days_regex()
        .captures(working)
        .map(|caps| (caps.get(0).map(|m| m.range()), caps[1].parse().unwrap_or(0)));
    if let Some((Some(range), days)) = in_days {
        working.replace_range(range, " ");
        let due = now + Duration::days(days);
        return due.format(&Rfc3339).ok();
    }

    let keyword = date_keyword_regex()
        .captures(working)
        .map(|caps| (caps.get(0).map(|m| m.range()), caps[1].to_lowercase()));
    if let Some((Some(range), keyword)) = keyword {
        working.replace_range(range, " ");
        let due = resolve_date_keyword(&keyword, now);
        return due.format(&Rfc3339).ok();
    }
    None
}

fn match_iso_date(working: &str) -> Option<(std::ops::Range<usize>, Date)> {
    let caps = iso_date_regex().captures(working)?;
    let format = format_description!("[year]-[month]-[day]");
    // An out-of-range date (month 13 etc.) is left alone for the later rules.
    let date = Date::parse(caps[1].trim(), &format).ok()?;
    Some((caps.get(0)?.range(), date))
}

fn resolve_date_keyword(keyword: &str, now: OffsetDateTime) -> OffsetDateTime {
    match keyword {
        "today" => now,
        "tomorrow" => now + Duration::days(1),
        other if other.starts_with("next") => now + Duration::days(7),
        other => match weekday_from_name(other) {
            Some(target) => now + Duration::days(days_until_weekday(now, target)),
            None => now,
        },
    }
}

fn weekday_from_name(name: &str) -> Option<Weekday> {
    match name {
        "monday" => Some(Weekday::Monday),
        "tuesday" => Some(Weekday::Tuesday),
        "wednesday" => Some(Weekday::Wednesday),
        "thursday" => Some(Weekday::Thursday),
        "friday" => Some(Weekday::Friday),
        "saturday" => Some(Weekday::Saturday),
        "sunday" => Some(Weekday::Sunday),
        _ => None,
    }
}

// Next strictly future occurrence: a weekday naming today means next week.
fn days_until_weekday(now: OffsetDateTime, target: Weekday) -> i64 {
    let current = i64::from(now.date().weekday().number_days_from_monday());
    let wanted = i64::from(target.number_days_from_monday());
    let mut ahead = wanted - current;
    if ahead <= 0 {
        ahead += 7;
    }
    ahead
}

fn strip_priority_markers(working: &mut String) {
    *working = priority_marker_regex()
        .replace_all(working, " ")
        .into_owned();
}

fn tidy_title(stripped: &str, original_clause: &str) -> String {
    let mut title = collapse_whitespace(stripped);
    loop {
        let mut changed = false;
        for filler in FILLER_PREFIXES {
            if title.len() >= filler.len()
                && title
                    .get(..filler.len())
                    .is_some_and(|prefix| prefix.eq_ignore_ascii_case(filler))
            {
                title = title[filler.len()..].trim_start().to_string();
                changed = true;
                break;
            }
        }
        if !changed {
            break;
        }
    }

    let title = title
        .trim_matches(|c: char| matches!(c, ' ' | ',' | '.' | ';' | ':' | '-' | '!' | '?'))
        .to_string();
    if title.is_empty() {
        collapse_whitespace(original_clause)
    } else {
        title
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn infer_tags(clause: &str) -> Vec<String> {
    let lower = clause.to_lowercase();
    let mut tags = Vec::new();
    for (tag, keywords) in TAG_RULES {
        if keywords.iter().any(|keyword| lower.contains(keyword)) {
            tags.push((*tag).to_string());
            if tags.len() == MAX_TAGS {
                break;
            }
        }
    }
    tags
}

fn detect_recurrence(clause: &str) -> Option<Recurrence> {
    let lower = clause.to_lowercase();
    if ["daily", "every day", "each day"]
        .iter()
        .any(|marker| lower.contains(marker))
    {
        return Some(Recurrence::Daily);
    }
    if ["weekly", "every week", "each week"]
        .iter()
        .any(|marker| lower.contains(marker))
    {
        return Some(Recurrence::Weekly);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_DURATION_MINUTES, extract, extract_with_default_duration, task_id};
    use crate::model::{Priority, Recurrence, TaskStatus};
    use time::macros::{date, datetime};

    // 2025-11-24 is a Monday.
    const NOW: time::OffsetDateTime = datetime!(2025-11-24 08:00 UTC);

    #[test]
    fn empty_input_yields_no_tasks() {
        assert!(extract("", NOW).is_empty());
        assert!(extract("   \n  ", NOW).is_empty());
    }

    #[test]
    fn extracts_due_date_tags_and_title() {
        let tasks = extract("I need to call the dentist by Friday", NOW);
        assert_eq!(tasks.len(), 1);

        let task = &tasks[0];
        assert!(task.title.contains("call the dentist"), "{}", task.title);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.duration_minutes, DEFAULT_DURATION_MINUTES);
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.tags.iter().any(|tag| tag == "communication"));

        let due = task.due_date.as_deref().expect("due date resolved");
        assert!(due.starts_with("2025-11-28"), "{due}");
    }

    #[test]
    fn extracts_high_priority_and_duration() {
        let tasks = extract("URGENT: fix server issues for 2 hours", NOW);
        assert_eq!(tasks.len(), 1);

        let task = &tasks[0];
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.duration_minutes, 120);
        assert_eq!(task.title, "fix server issues");
        assert_eq!(task.due_date, None);
    }

    #[test]
    fn extracts_combined_hour_minute_duration() {
        let tasks = extract("study for the exam for 2h 30m", NOW);
        assert_eq!(tasks[0].duration_minutes, 150);
        assert!(tasks[0].tags.iter().any(|tag| tag == "learning"));
    }

    #[test]
    fn extracts_minutes_only_duration() {
        let tasks = extract("review the budget for 45 minutes", NOW);
        assert_eq!(tasks[0].duration_minutes, 45);
    }

    #[test]
    fn duration_is_extracted_before_due_date() {
        let tasks = extract("prepare slides for 2 hours by Friday", NOW);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].duration_minutes, 120);
        let due = tasks[0].due_date.as_deref().unwrap();
        assert!(due.starts_with("2025-11-28"), "{due}");
    }

    #[test]
    fn splits_clauses_when_both_sides_have_verbs() {
        let tasks = extract("Call the bank and email the accountant", NOW);
        assert_eq!(tasks.len(), 2);
        assert!(tasks[0].title.to_lowercase().contains("call the bank"));
        assert!(tasks[1].title.to_lowercase().contains("email the accountant"));
    }

    #[test]
    fn keeps_noun_lists_as_a_single_task() {
        let tasks = extract("meeting, presentation, and budget review", NOW);
        assert_eq!(tasks.len(), 1);
    }

    #[test]
    fn splits_numbered_lists() {
        let tasks = extract("1. Email the team 2. Write the report", NOW);
        assert_eq!(tasks.len(), 2);
        assert!(tasks[0].title.contains("Email the team"));
        assert!(tasks[1].title.contains("Write the report"));
    }

    #[test]
    fn resolves_tomorrow_against_injected_now() {
        let tasks = extract("pay bills tomorrow", NOW);
        let due = tasks[0].due_date.as_deref().unwrap();
        assert!(due.starts_with("2025-11-25"), "{due}");
        assert!(tasks[0].tags.iter().any(|tag| tag == "finance"));
    }

    #[test]
    fn resolves_explicit_iso_date() {
        let tasks = extract("submit the expense report by 2025-12-01", NOW);
        let due = tasks[0].due_date.as_deref().unwrap();
        assert!(due.starts_with("2025-12-01"), "{due}");
        assert!(!tasks[0].title.contains("2025-12-01"));
    }

    #[test]
    fn a_weekday_naming_today_means_next_week() {
        let tasks = extract("check the backups on Monday", NOW);
        let due = tasks[0].due_date.as_deref().unwrap();
        assert!(due.starts_with("2025-12-01"), "{due}");
    }

    #[test]
    fn detects_low_priority_markers() {
        let tasks = extract("clean the garage low priority", NOW);
        assert_eq!(tasks[0].priority, Priority::Low);
        assert_eq!(tasks[0].title, "clean the garage");
    }

    #[test]
    fn detects_recurrence_keywords() {
        let tasks = extract("water the plants daily", NOW);
        assert_eq!(tasks[0].recurrence, Some(Recurrence::Daily));

        let tasks = extract("plan the sprint every week", NOW);
        assert_eq!(tasks[0].recurrence, Some(Recurrence::Weekly));
    }

    #[test]
    fn title_only_input_still_produces_a_task() {
        let tasks = extract("quarterly numbers", NOW);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "quarterly numbers");
        assert_eq!(tasks[0].duration_minutes, DEFAULT_DURATION_MINUTES);
        assert_eq!(tasks[0].due_date, None);
    }

    #[test]
    fn zero_duration_falls_back_to_default() {
        let tasks = extract("meditate for 0 minutes", NOW);
        assert_eq!(tasks[0].duration_minutes, DEFAULT_DURATION_MINUTES);
    }

    #[test]
    fn default_duration_is_configurable() {
        let tasks = extract_with_default_duration("write the summary", NOW, 25);
        assert_eq!(tasks[0].duration_minutes, 25);
    }

    #[test]
    fn duplicate_titles_get_disambiguated_ids() {
        let tasks = extract("call mom and call mom", NOW);
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id, "call-mom-20251124");
        assert_eq!(tasks[1].id, "call-mom-20251124-2");
    }

    #[test]
    fn task_id_slugs_and_truncates() {
        let id = task_id("Write the Quarterly Financial Report", date!(2025-11-24));
        assert_eq!(id, "write-the-quarterly-20251124");

        let id = task_id("???", date!(2025-11-24));
        assert_eq!(id, "task-20251124");
    }

    #[test]
    fn long_clause_keeps_raw_text_as_description() {
        let tasks = extract(
            "I need to prepare the investor deck for 2 hours by Friday with the latest numbers",
            NOW,
        );
        assert_eq!(tasks.len(), 1);
        let description = tasks[0].description.as_deref().expect("description kept");
        assert!(description.contains("investor deck"));
        assert!(description.contains("2 hours"));
    }

    #[test]
    fn created_at_comes_from_injected_now() {
        let tasks = extract("renew passport", NOW);
        assert_eq!(tasks[0].created_at, "2025-11-24T08:00:00Z");
    }
}
