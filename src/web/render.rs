//! HTML rendering for the index and calendar pages.

use super::response::{Notice, NoticeLevel};
use super::templates;
use crate::calendar::{CalendarReport, ViewType};
use crate::types::{Subtask, Task, TaskCounts, TaskWithSubtasks};
use chrono::{DateTime, Datelike, NaiveDate, Utc};

/// Escape HTML special characters.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

fn notice_html(notice: Option<&Notice>) -> String {
    match notice {
        Some(notice) => {
            let class = match notice.level {
                NoticeLevel::Success => "notice-success",
                NoticeLevel::Error => "notice-error",
            };
            format!(
                r#"<div class="notice {}">{}</div>"#,
                class,
                html_escape(&notice.message)
            )
        }
        None => String::new(),
    }
}

/// Wrap page content in the base layout.
pub fn page(title: &str, notice: Option<&Notice>, content: &str) -> String {
    templates::fill(
        templates::BASE_TEMPLATE,
        &[
            ("title", html_escape(title).as_str()),
            ("notice", notice_html(notice).as_str()),
            ("content", content),
        ],
    )
}

/// Minimal page for failures that cannot redirect.
pub fn error_page(message: &str) -> String {
    page(
        "Error",
        Some(&Notice {
            level: NoticeLevel::Error,
            message: message.to_string(),
        }),
        r#"<p><a href="/">Back to tasks</a></p>"#,
    )
}

fn subtask_item(subtask: &Subtask) -> String {
    let done = if subtask.completed { " done" } else { "" };
    let checked = if subtask.completed { " checked" } else { "" };
    format!(
        r#"<li class="subtask-item{done}">
    <input type="checkbox" data-toggle-url="/subtasks/{id}/complete"{checked}>
    <span>{title}</span>
    <form class="inline" action="/delete_subtask/{id}" method="post"><button class="danger" type="submit">&times;</button></form>
</li>"#,
        id = subtask.id,
        title = html_escape(&subtask.title),
    )
}

fn task_item(item: &TaskWithSubtasks) -> String {
    let task = &item.task;
    let done = if task.completed { " done" } else { "" };
    let checked = if task.completed { " checked" } else { "" };

    let mut meta = format!("Created {}", format_timestamp(task.created_at));
    if let Some(completed_at) = task.completed_at {
        meta.push_str(&format!(" &middot; Completed {}", format_timestamp(completed_at)));
    }
    if !item.subtasks.is_empty() {
        meta.push_str(&format!(
            " &middot; {}/{} subtasks done",
            item.completed_subtasks(),
            item.subtasks.len()
        ));
    }

    let description = task
        .description
        .as_deref()
        .map(|d| format!("<p>{}</p>", html_escape(d)))
        .unwrap_or_default();
    let image = task
        .image_path
        .as_deref()
        .map(|p| {
            format!(
                r#"<img class="task-image" src="/uploads/{}" alt="{}">"#,
                urlencoding::encode(p),
                html_escape(&task.title)
            )
        })
        .unwrap_or_default();
    let subtasks: String = item.subtasks.iter().map(subtask_item).collect();

    format!(
        r#"<div class="task-item{done}" id="task-{id}">
    <div class="task-header">
        <input type="checkbox" data-toggle-url="/tasks/{id}/complete"{checked}>
        <span class="task-title">{title}</span>
        <form class="inline" action="/delete_task/{id}" method="post"><button class="danger" type="submit">Delete</button></form>
    </div>
    <div class="task-meta">{meta}</div>
    {description}
    {image}
    <ul class="subtasks">{subtasks}</ul>
    <form class="subtasks" action="/add_subtask/{id}" method="post">
        <input type="text" name="title" placeholder="Add subtask" required>
    </form>
</div>"#,
        id = task.id,
        title = html_escape(&task.title),
    )
}

fn task_list(items: &[TaskWithSubtasks], empty: &str) -> String {
    if items.is_empty() {
        return format!(r#"<div class="empty-state">{}</div>"#, empty);
    }
    items.iter().map(task_item).collect()
}

/// The index page: counts, add form, open and completed tasks.
pub fn index_page(
    incomplete: &[TaskWithSubtasks],
    completed: &[TaskWithSubtasks],
    counts: &TaskCounts,
    allowed_extensions: &[String],
    max_bytes: usize,
    notice: Option<&Notice>,
) -> String {
    let accept: Vec<String> = allowed_extensions.iter().map(|e| format!(".{e}")).collect();
    let content = templates::fill(
        templates::INDEX_TEMPLATE,
        &[
            ("total", counts.total.to_string().as_str()),
            ("completed", counts.completed.to_string().as_str()),
            ("subtasks", counts.subtasks.to_string().as_str()),
            ("accept", html_escape(&accept.join(",")).as_str()),
            ("max_mb", (max_bytes / (1024 * 1024)).to_string().as_str()),
            ("incomplete", task_list(incomplete, "Nothing to do.").as_str()),
            ("completed_list", task_list(completed, "No completed tasks yet.").as_str()),
        ],
    );
    page("Tasks", notice, &content)
}

fn calendar_url(view: ViewType, date: NaiveDate) -> String {
    format!("/calendar?view={}&date={}", view, date)
}

fn created_list(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return r#"<div class="empty-state">No tasks created in this period.</div>"#.to_string();
    }
    let rows: String = tasks
        .iter()
        .map(|t| {
            format!(
                r#"<li>{} <span class="task-meta">{}</span></li>"#,
                html_escape(&t.title),
                format_timestamp(t.created_at)
            )
        })
        .collect();
    format!("<ul>{rows}</ul>")
}

fn month_rows(report: &CalendarReport) -> String {
    let mut html = String::new();
    for week in &report.month_grid {
        html.push_str("<tr>");
        for cell in week {
            let Some(day) = cell else {
                html.push_str("<td></td>");
                continue;
            };
            let mut classes = Vec::new();
            if report.window.contains(*day) {
                classes.push("in-window");
            }
            if report.active_days.is_active(*day) {
                classes.push("active");
            }

            let mut dots = String::new();
            if let Some(stats) = report.day_stats.get(day) {
                if stats.created > 0 {
                    dots.push_str(&format!(
                        r#"<span class="dot dot-created" title="{0} created">{0}</span>"#,
                        stats.created
                    ));
                }
                if stats.completed > 0 {
                    dots.push_str(&format!(
                        r#"<span class="dot dot-completed" title="{0} completed">{0}</span>"#,
                        stats.completed
                    ));
                }
            }

            html.push_str(&format!(
                r#"<td class="{}"><a href="{}">{}</a><br>{}</td>"#,
                classes.join(" "),
                calendar_url(ViewType::Daily, *day),
                day.day(),
                dots
            ));
        }
        html.push_str("</tr>");
    }
    html
}

/// The calendar page for one report.
pub fn calendar_page(report: &CalendarReport, today: NaiveDate) -> String {
    let view_links: String = ViewType::ALL
        .iter()
        .map(|view| {
            let class = if *view == report.view { " class=\"active\"" } else { "" };
            format!(
                r#"<a href="{}"{}>{}</a>"#,
                calendar_url(*view, report.anchor),
                class,
                capitalize(view.as_str())
            )
        })
        .collect();

    let content = templates::fill(
        templates::CALENDAR_TEMPLATE,
        &[
            ("view_links", view_links.as_str()),
            ("previous_url", calendar_url(report.view, report.previous).as_str()),
            ("next_url", calendar_url(report.view, report.next).as_str()),
            ("today_url", calendar_url(report.view, today).as_str()),
            ("heading", html_escape(&report.title()).as_str()),
            ("window_start", report.window.start.to_string().as_str()),
            ("window_end", report.window.end.to_string().as_str()),
            ("month_heading", report.anchor.format("%B %Y").to_string().as_str()),
            ("month_rows", month_rows(report).as_str()),
            ("completed_count", report.completed.len().to_string().as_str()),
            (
                "completed_list",
                task_list(&report.completed, "No tasks completed in this period.").as_str(),
            ),
            ("created_count", report.created.len().to_string().as_str()),
            ("created_list", created_list(&report.created).as_str()),
        ],
    );

    page(&report.title(), None, &content)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::DateWindow;
    use crate::db::calendar::{ActiveDays, DayStats};
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task(id: i64, title: &str) -> Task {
        Task {
            id,
            title: title.to_string(),
            description: None,
            image_path: None,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
            completed: false,
            completed_at: None,
        }
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
    }

    #[test]
    fn test_index_escapes_titles_and_shows_notice() {
        let items = vec![TaskWithSubtasks {
            task: task(1, "<script>alert(1)</script>"),
            subtasks: vec![],
        }];
        let notice = Notice {
            level: NoticeLevel::Error,
            message: "Title is required!".to_string(),
        };
        let html = index_page(
            &items,
            &[],
            &TaskCounts::default(),
            &["png".to_string()],
            16 * 1024 * 1024,
            Some(&notice),
        );

        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains(r#"class="notice notice-error">Title is required!"#));
        assert!(html.contains("max 16MB"));
        assert!(html.contains("No completed tasks yet."));
    }

    #[test]
    fn test_calendar_page_marks_active_days() {
        let anchor = date(2024, 3, 14);
        let mut completed = std::collections::BTreeSet::new();
        completed.insert(date(2024, 3, 1));
        let mut day_stats = BTreeMap::new();
        day_stats.insert(
            date(2024, 3, 1),
            DayStats {
                created: 2,
                completed: 1,
            },
        );

        let report = CalendarReport {
            view: ViewType::Weekly,
            anchor,
            window: DateWindow::for_view(ViewType::Weekly, anchor),
            previous: date(2024, 3, 7),
            next: date(2024, 3, 21),
            created: vec![task(1, "Plan")],
            completed: vec![],
            active_days: ActiveDays {
                created: Default::default(),
                completed,
            },
            day_stats,
            month_grid: crate::calendar::month_grid(anchor),
        };

        let html = calendar_page(&report, anchor);
        assert!(
            html.contains(r#"<td class="active"><a href="/calendar?view=daily&date=2024-03-01">1</a>"#)
        );
        assert!(
            html.contains(r#"<td class="in-window"><a href="/calendar?view=daily&date=2024-03-11">11</a>"#)
        );
        assert!(html.contains("/calendar?view=weekly&date=2024-03-07"));
        assert!(html.contains(r#"title="2 created""#));
        assert!(html.contains("No tasks completed in this period."));
        assert!(
            html.contains(r#"<a href="/calendar?view=weekly&date=2024-03-14" class="active">Weekly</a>"#)
        );
    }

    #[test]
    fn test_index_keeps_placeholder_text_in_titles() {
        let open = vec![TaskWithSubtasks {
            task: task(1, "Fill {{completed_list}} later"),
            subtasks: vec![],
        }];
        let done = vec![TaskWithSubtasks {
            task: task(2, "Filed taxes"),
            subtasks: vec![],
        }];
        let html = index_page(
            &open,
            &done,
            &TaskCounts::default(),
            &["png".to_string()],
            16 * 1024 * 1024,
            Some(&Notice {
                level: NoticeLevel::Success,
                message: "Saw {{content}}".to_string(),
            }),
        );

        assert!(html.contains("Fill {{completed_list}} later"));
        assert!(html.contains("Saw {{content}}"));
        assert_eq!(html.matches("Filed taxes").count(), 1);
    }

    #[test]
    fn test_calendar_keeps_placeholder_text_in_titles() {
        let anchor = date(2024, 3, 14);
        let report = CalendarReport {
            view: ViewType::Daily,
            anchor,
            window: DateWindow::for_view(ViewType::Daily, anchor),
            previous: date(2024, 3, 13),
            next: date(2024, 3, 15),
            created: vec![task(1, "Created elsewhere")],
            completed: vec![TaskWithSubtasks {
                task: task(2, "See {{created_list}} and {{created_count}}"),
                subtasks: vec![],
            }],
            active_days: ActiveDays::default(),
            day_stats: BTreeMap::new(),
            month_grid: crate::calendar::month_grid(anchor),
        };

        let html = calendar_page(&report, anchor);
        assert!(html.contains("See {{created_list}} and {{created_count}}"));
        assert_eq!(html.matches("Created elsewhere").count(), 1);
    }
}
