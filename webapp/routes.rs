use std::io::{Cursor, Read};

use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::handlers;
use crate::render::{render_page, Page};
use crate::state::App;
use crate::util::form::{form_get, parse_cookies, url_encode};

pub const FLASH_COOKIE: &str = "flash";

// ---------------------------------------------------------------------------
// Request / response values
// ---------------------------------------------------------------------------

/// A fully-read request, decoupled from the socket so handlers can be driven
/// directly in tests.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    /// Set when the body exceeded the limit and was not read.
    pub oversized: bool,
}

impl HttpRequest {
    pub fn new(method: Method, url: &str) -> HttpRequest {
        HttpRequest { method, url: url.to_owned(), headers: Vec::new(), body: Vec::new(), oversized: false }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn path(&self) -> &str {
        self.url.split_once('?').map(|(p, _)| p).unwrap_or(&self.url)
    }

    pub fn cookie(&self, name: &str) -> Option<String> {
        let pairs = parse_cookies(self.header("Cookie")?);
        form_get(&pairs, name).map(str::to_owned)
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn with_header(mut self, name: &str, value: impl Into<String>) -> HttpResponse {
        self.headers.push((name.to_owned(), value.into()));
        self
    }

    fn into_tiny(self) -> Response<Cursor<Vec<u8>>> {
        let len = self.body.len();
        let headers = self.headers.iter()
            .filter_map(|(k, v)| Header::from_bytes(k.as_bytes(), v.as_bytes()).ok())
            .collect();
        Response::new(StatusCode(self.status), headers, Cursor::new(self.body), Some(len), None)
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

pub fn html_response(body: String) -> HttpResponse {
    HttpResponse {
        status: 200,
        headers: vec![("Content-Type".into(), "text/html; charset=utf-8".into())],
        body: body.into_bytes(),
    }
}

pub fn bytes_response(content_type: &str, body: Vec<u8>) -> HttpResponse {
    HttpResponse {
        status: 200,
        headers: vec![("Content-Type".into(), content_type.into())],
        body,
    }
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse {
        status: 303,
        headers: vec![("Location".into(), location.into())],
        body: Vec::new(),
    }
}

/// Redirect carrying a one-shot message for the next page render.
pub fn redirect_with_flash(location: &str, message: &str) -> HttpResponse {
    redirect(location).with_header(
        "Set-Cookie",
        format!("{}={}; Path=/; HttpOnly; SameSite=Lax", FLASH_COOKIE, url_encode(message)),
    )
}

/// Expires the flash cookie once its message has been shown.
pub fn clear_flash(response: HttpResponse) -> HttpResponse {
    response.with_header("Set-Cookie", format!("{}=; Path=/; Max-Age=0", FLASH_COOKIE))
}

pub fn text_response(status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status,
        headers: vec![("Content-Type".into(), "text/plain; charset=utf-8".into())],
        body: body.as_bytes().to_vec(),
    }
}

pub fn not_found() -> HttpResponse {
    text_response(404, "404 Not Found")
}

pub fn server_error() -> HttpResponse {
    let content = r#"<div class="card"><h1>Something went wrong</h1>
<p>The server could not complete your request. Please try again with a different image.</p>
<p><a class="btn btn-primary" href="/">Back to upload</a></p></div>"#;
    let mut resp = html_response(render_page(Page::Error, None, content));
    resp.status = 500;
    resp
}

// ---------------------------------------------------------------------------
// Request dispatcher
// ---------------------------------------------------------------------------

pub fn dispatch(request: &HttpRequest, app: &App) -> HttpResponse {
    let path = request.path();

    match (&request.method, path) {
        (Method::Get,  "/")       => handlers::upload::handle_get(request),
        (Method::Post, "/")       => handlers::upload::handle_post(request, app),
        (Method::Get,  "/health") => text_response(200, "ok"),
        (Method::Get, p) => {
            if let Some(name) = p.strip_prefix("/images/") {
                handlers::images::handle(name, app)
            } else if let Some(name) = p.strip_prefix("/predict/") {
                handlers::predict::handle(name, app)
            } else {
                not_found()
            }
        }
        _ => not_found(),
    }
}

/// Reads a tiny_http request, dispatches it and writes the response.
pub fn serve(mut request: Request, app: &App) {
    let method = request.method().clone();
    let url = request.url().to_owned();
    let headers = request.headers().iter()
        .map(|h| (h.field.as_str().as_str().to_owned(), h.value.as_str().to_owned()))
        .collect();

    let limit = app.body_limit();
    let declared_too_big = request.body_length().map_or(false, |len| len > limit);
    let mut body = Vec::new();
    let mut oversized = declared_too_big;
    if !declared_too_big {
        let read = request.as_reader().take(limit as u64 + 1).read_to_end(&mut body);
        if let Err(e) = read {
            log::warn!("{} {}: failed to read body: {}", method, url, e);
        }
        oversized = body.len() > limit;
        if oversized {
            body.clear();
        }
    }

    let parsed = HttpRequest { method, url, headers, body, oversized };
    let response = dispatch(&parsed, app);
    log::debug!("{} {} -> {}", parsed.method, parsed.url, response.status);

    if let Err(e) = request.respond(response.into_tiny()) {
        log::warn!("{} {}: failed to send response: {}", parsed.method, parsed.url, e);
    }
}
