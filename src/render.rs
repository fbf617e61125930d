//! HTML for the dashboard page. Every region is rebuilt from controller state
//! on each request; the templates live under `templates/`.

use crate::error::AppResult;
use crate::formatter::{PLACEHOLDER, TimeRanges};
use crate::locale::Locale;
use crate::notifier::{Notice, Phase, Severity};
use crate::session::{SessionController, Surface, UserBadge};
use crate::view::{FormMode, FormState, RegularDraft, RegularRow, SpecialDraft, SpecialRow};
use askama::Template;

#[derive(Template)]
#[template(path = "page.html")]
pub struct PageTemplate<'a> {
    locale: Locale,
    headers: [&'static str; 6],
    shell: Option<Shell<'a>>,
    notice: Option<NoticeView>,
}

struct Shell<'a> {
    badge: &'a UserBadge,
    regular_form: Option<RegularForm<'a>>,
    special_form: Option<SpecialForm<'a>>,
    regular_rows: Vec<RegularLine>,
    special_rows: Vec<SpecialLine>,
}

struct DayOption {
    value: usize,
    name: &'static str,
    selected: bool,
}

struct RegularForm<'a> {
    draft: &'a RegularDraft,
    days: Vec<DayOption>,
    submit: &'static str,
}

struct SpecialForm<'a> {
    draft: &'a SpecialDraft,
    submit: &'static str,
}

/// Chips for one cell. No chips means the placeholder is shown.
struct Chips {
    items: Vec<String>,
    compact: bool,
}

struct RegularLine {
    id: String,
    day: String,
    ranges: Chips,
    active: bool,
    status: &'static str,
}

struct SpecialLine {
    id: String,
    date: String,
    description: String,
    ranges: Chips,
    active: bool,
    status: &'static str,
}

struct NoticeView {
    message: String,
    class: &'static str,
    icon: &'static str,
    phase: &'static str,
    delay_ms: u128,
}

pub fn page(dashboard: &SessionController) -> AppResult<String> {
    let locale = dashboard.view().locale();
    let shell = match dashboard.surface() {
        Surface::Login => None,
        Surface::Shell(badge) => Some(shell(dashboard, badge, locale)),
    };
    let template = PageTemplate {
        locale,
        headers: locale.headers(),
        shell,
        notice: dashboard.notifier().current().map(notice_view),
    };
    Ok(template.render()?)
}

fn shell<'a>(dashboard: &'a SessionController, badge: &'a UserBadge, locale: Locale) -> Shell<'a> {
    let view = dashboard.view();
    let state = view.state();
    Shell {
        badge,
        regular_form: regular_form(&state.regular, locale),
        special_form: special_form(&state.special, locale),
        regular_rows: view
            .regular_table()
            .into_iter()
            .map(|row| regular_line(row, locale))
            .collect(),
        special_rows: view
            .special_table()
            .into_iter()
            .map(|row| special_line(row, locale))
            .collect(),
    }
}

fn submit_label(mode: &FormMode, locale: Locale) -> &'static str {
    match mode {
        FormMode::Editing(_) => locale.update(),
        _ => locale.save(),
    }
}

fn regular_form(form: &FormState<RegularDraft>, locale: Locale) -> Option<RegularForm<'_>> {
    if !form.mode.is_visible() {
        return None;
    }
    let chosen = form.draft.day_of_week.trim();
    let days = locale
        .weekdays()
        .iter()
        .enumerate()
        .map(|(i, &name)| DayOption {
            value: i + 1,
            name,
            selected: chosen == (i + 1).to_string(),
        })
        .collect();
    Some(RegularForm {
        draft: &form.draft,
        days,
        submit: submit_label(&form.mode, locale),
    })
}

fn special_form(form: &FormState<SpecialDraft>, locale: Locale) -> Option<SpecialForm<'_>> {
    form.mode.is_visible().then(|| SpecialForm {
        draft: &form.draft,
        submit: submit_label(&form.mode, locale),
    })
}

fn chips(ranges: TimeRanges, locale: Locale) -> Chips {
    match ranges {
        TimeRanges::Empty => Chips {
            items: Vec::new(),
            compact: false,
        },
        TimeRanges::Chips { mut chips, more } => {
            if let Some(n) = more {
                chips.push(locale.more(n));
            }
            Chips {
                items: chips,
                compact: more.is_some(),
            }
        }
    }
}

fn regular_line(row: RegularRow, locale: Locale) -> RegularLine {
    RegularLine {
        id: row.id.0,
        day: row.day,
        ranges: chips(row.time_ranges, locale),
        active: row.active,
        status: locale.active(row.active),
    }
}

fn special_line(row: SpecialRow, locale: Locale) -> SpecialLine {
    SpecialLine {
        id: row.id.0,
        date: row.date,
        description: row.description.unwrap_or_else(|| PLACEHOLDER.to_string()),
        ranges: chips(row.time_ranges, locale),
        active: row.active,
        status: locale.active(row.active),
    }
}

fn notice_view(notice: Notice) -> NoticeView {
    let (class, icon) = match notice.severity {
        Severity::Success => ("notification-success", "fa-check-circle"),
        Severity::Error => ("notification-error", "fa-exclamation-circle"),
        Severity::Info => ("notification-info", "fa-info-circle"),
    };
    let phase = match notice.phase {
        Phase::Shown => "show",
        Phase::Fading => "fading",
    };
    NoticeView {
        message: notice.message,
        class,
        icon,
        phase,
        delay_ms: notice.remaining.as_millis(),
    }
}
