/// Page rendering for the web app.
///
/// One HTML shell (`webapp/assets/page.html`) is embedded at compile time;
/// pages fill its `{{TOKEN}}` placeholders.  Tokens a page does not fill are
/// blanked so raw `{{TOKEN}}` strings never reach the browser.

use ferrite_vision::chart::html_escape;

const TEMPLATE: &str = include_str!("assets/page.html");

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Page {
    Upload,
    Predict,
    Error,
}

impl Page {
    fn title(self) -> &'static str {
        match self {
            Page::Upload => "Upload",
            Page::Predict => "Prediction",
            Page::Error => "Error",
        }
    }
}

/// Renders the shell with `content` as the main body and an optional flash
/// message above it.  `content` is trusted HTML; `flash` is escaped.
pub fn render_page(page: Page, flash: Option<&str>, content: &str) -> String {
    let flash_html = flash
        .filter(|m| !m.is_empty())
        .map(|m| format!("<div class=\"flash\" role=\"alert\">{}</div>", html_escape(m)))
        .unwrap_or_default();

    let shell = TEMPLATE
        .replace("{{TITLE}}", page.title())
        .replace("{{FLASH}}", &flash_html);
    // Content goes in last so nothing inside it is mistaken for a token.
    let (head, tail) = shell.split_once("{{CONTENT}}").unwrap_or((shell.as_str(), ""));
    let mut html = blank_remaining(head.to_owned());
    html.push_str(content);
    html.push_str(&blank_remaining(tail.to_owned()));
    html
}

/// Replaces any `{{TOKEN}}` that wasn't already substituted with an empty
/// string.
fn blank_remaining(mut html: String) -> String {
    let mut from = 0;
    while let Some(rel) = html[from..].find("{{") {
        let start = from + rel;
        match html[start..].find("}}") {
            Some(end) if is_token(&html[start + 2..start + end]) => {
                html.replace_range(start..start + end + 2, "");
                from = start;
            }
            _ => from = start + 2,
        }
    }
    html
}

fn is_token(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_uppercase() || b == b'_')
}
