use std::fmt::Write;

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

use crate::todo::{TodoItem, TodoStats};

pub const TITLE: &str = "📝 Simple Todo List App";
pub const EMPTY_LIST_MESSAGE: &str = "No todos yet! Add your first todo above.";
pub const COMPLETED_MARKER: &str = "✅";

const STYLE: &str = r#"
    body {
        font-family: system-ui, -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif;
        background: #0b1020;
        color: #e5e7eb;
        margin: 0;
    }
    .container { max-width: 720px; margin: 0 auto; padding: 32px 20px; }
    h1 { font-size: 28px; margin: 0 0 12px; }
    h2 { font-size: 18px; margin: 16px 0 8px; }
    hr { border: 0; border-top: 1px solid rgba(255,255,255,0.08); margin: 20px 0; }
    label { display: block; margin-bottom: 6px; color: #9ca3af; }
    input[type=text] {
        width: 100%; box-sizing: border-box; padding: 10px 12px;
        border-radius: 8px; border: 1px solid rgba(255,255,255,0.12);
        background: rgba(17,24,39,0.7); color: #e5e7eb;
    }
    button {
        margin-top: 8px; padding: 8px 14px; border: 0; border-radius: 8px;
        background: rgba(99,102,241,0.6); color: #fff; cursor: pointer;
    }
    .notice { padding: 10px 12px; border-radius: 8px; margin-top: 12px; }
    .notice.success { background: rgba(34,197,94,0.2); }
    .notice.error { background: rgba(239,68,68,0.25); }
    .notice.info { background: rgba(56,189,248,0.2); }
    .todo { display: flex; align-items: center; gap: 8px; padding: 6px 0; }
    .todo .text { flex: 0 0 70%; }
    .todo .text p { margin: 0; }
    .todo form { flex: 0 0 15%; margin: 0; }
    .todo button { margin-top: 0; width: 100%; }
    .todo.completed .text { color: #9ca3af; }
    .metric .label { color: #9ca3af; font-size: 14px; }
    .metric .value { font-size: 28px; font-weight: 700; }
"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

impl Notice {
    fn class(&self) -> &'static str {
        match self {
            Notice::Success(_) => "success",
            Notice::Error(_) => "error",
        }
    }

    fn message(&self) -> &str {
        match self {
            Notice::Success(message) | Notice::Error(message) => message,
        }
    }
}

/// Renders the whole screen from the current list.
pub fn render_page(items: &[TodoItem], notice: Option<&Notice>) -> String {
    let mut body = String::new();
    let _ = write!(body, "<h1>{}</h1><hr>", escape_html(TITLE));

    body.push_str("<h2>Add New Todo</h2>");
    body.push_str(
        r#"<form method="post" action="/todos">
<label for="new_todo">Enter a new todo item:</label>
<input type="text" id="new_todo" name="text" autocomplete="off" autofocus>
<button type="submit">Add Todo</button>
</form>"#,
    );
    if let Some(notice) = notice {
        let _ = write!(
            body,
            r#"<div class="notice {}">{}</div>"#,
            notice.class(),
            escape_html(notice.message())
        );
    }
    body.push_str("<hr><h2>Your Todo List</h2>");

    if items.is_empty() {
        let _ = write!(
            body,
            r#"<div class="notice info">{}</div>"#,
            escape_html(EMPTY_LIST_MESSAGE)
        );
    } else {
        body.push_str(r#"<div class="todos">"#);
        for item in items {
            body.push_str(&render_item(item));
        }
        body.push_str("</div>");

        let stats = TodoStats::from_items(items);
        let _ = write!(
            body,
            r#"<hr><div class="metric"><div class="label">Progress</div><div class="value">{}</div></div>"#,
            progress_label(stats)
        );
    }

    layout(&body)
}

pub fn render_error_page(message: &str) -> String {
    let body = format!(
        r#"<h1>{}</h1><hr><div class="notice error">{}</div><p><a href="/">Back to the list</a></p>"#,
        escape_html(TITLE),
        escape_html(message)
    );
    layout(&body)
}

pub fn progress_label(stats: TodoStats) -> String {
    format!("{}/{} completed", stats.completed, stats.total)
}

fn render_item(item: &TodoItem) -> String {
    let (class, text) = if item.completed {
        (
            "todo completed",
            markdown_to_html(&format!("~~{}~~ {COMPLETED_MARKER}", item.text)),
        )
    } else {
        ("todo", markdown_to_html(&item.text))
    };
    format!(
        r#"<div class="{class}" id="todo-{id}"><div class="text">{text}</div><form method="post" action="/todos/{id}/toggle"><button type="submit">Toggle</button></form><form method="post" action="/todos/{id}/delete"><button type="submit">Delete</button></form></div>"#,
        id = item.id,
    )
}

fn layout(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\"><head><meta charset=\"utf-8\">\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
<title>{title}</title><style>{STYLE}</style></head>\
<body><div class=\"container\">{body}</div></body></html>",
        title = escape_html(TITLE),
    )
}

/// Markdown to HTML with raw HTML from the input rendered as text.
pub fn markdown_to_html(input: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    let parser = Parser::new_ext(input, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) if !is_safe_destination(&dest_url) => Event::Start(Tag::Link {
            link_type,
            dest_url: CowStr::Borrowed("#"),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) if !is_safe_destination(&dest_url) => Event::Start(Tag::Image {
            link_type,
            dest_url: CowStr::Borrowed("#"),
            title,
            id,
        }),
        other => other,
    });
    let mut output = String::new();
    html::push_html(&mut output, parser);
    output
}

/// Relative destinations and http, https and mailto URLs are safe.
fn is_safe_destination(url: &str) -> bool {
    let url = url.trim_start();
    match url.find([':', '/', '?', '#']) {
        Some(idx) if url[idx..].starts_with(':') => {
            let scheme = url[..idx].to_ascii_lowercase();
            matches!(scheme.as_str(), "http" | "https" | "mailto")
        }
        _ => true,
    }
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
