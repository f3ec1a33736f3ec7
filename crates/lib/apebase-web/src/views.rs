//! Server-side HTML rendering for the listing and detail views.

use std::fmt::Write as _;

use apebase_core::control::TokenPage;
use apebase_store::models::Record;

const STYLE: &str = "\
body{font-family:system-ui,sans-serif;margin:0;background:#111;color:#eee}\
header,main{padding:1rem 2rem}\
a{color:#9cf}\
textarea{width:100%;min-height:8rem;font-family:monospace;background:#222;color:#eee}\
#items{display:grid;grid-template-columns:repeat(auto-fill,minmax(180px,1fr));gap:1rem}\
.card{background:#1c1c1c;border-radius:6px;padding:.5rem;text-align:center}\
.card img,.detail img{width:100%;border-radius:4px}\
.detail{max-width:640px}\
table{border-collapse:collapse}td,th{padding:.25rem .75rem;border-bottom:1px solid #333;text-align:left}\
pre{background:#222;padding:1rem;overflow:auto}";

const LOAD_MORE_SCRIPT: &str = r"
const items = document.getElementById('items');
const button = document.getElementById('load-more');
const marker = () => items.querySelector('[data-next-page]');
if (!marker()) button.hidden = true;
button.addEventListener('click', async () => {
  const next = marker();
  if (!next) return;
  const params = new URLSearchParams({ filter: items.dataset.filter, page: next.dataset.nextPage });
  button.disabled = true;
  const response = await fetch('/?' + params);
  button.disabled = false;
  if (!response.ok) {
    button.textContent = 'Failed to load more';
    return;
  }
  next.remove();
  items.insertAdjacentHTML('beforeend', await response.text());
  if (!marker()) button.hidden = true;
});
";

/// Full listing page with the filter form echoed back.
#[must_use]
pub fn index(listing: &TokenPage) -> String {
    let mut body = String::new();
    let _ = write!(
        body,
        "<header><h1><a href=\"/\">apebase</a></h1>\
         <form method=\"get\" action=\"/\">\
         <textarea name=\"filter\" id=\"filter\" spellcheck=\"false\">{filter}</textarea>\
         <button type=\"submit\">Filter</button></form></header>\
         <main><div id=\"items\" data-filter=\"{compact}\">{items}</div>\
         <p><button id=\"load-more\" type=\"button\">Load more</button></p></main>\
         <script>{LOAD_MORE_SCRIPT}</script>",
        filter = escape(&listing.filter.to_pretty_json()),
        compact = escape(&listing.filter.to_string()),
        items = partial(listing),
    );
    layout("apebase", &body)
}

/// Record list fragment, for incremental fetches of later pages.
#[must_use]
pub fn partial(listing: &TokenPage) -> String {
    let mut html = String::new();
    for record in &listing.records {
        html.push_str(&card(record));
    }
    if listing.is_full() {
        let _ = write!(
            html,
            "<span hidden data-next-page=\"{}\"></span>",
            listing.page.next()
        );
    }
    html
}

/// Detail view; an absent record renders an empty view.
#[must_use]
pub fn token(record: Option<&Record>) -> String {
    let Some(record) = record else {
        return layout(
            "Token not found",
            "<main class=\"detail\"><p><a href=\"/\">&larr; back</a></p>\
             <p>Token not found.</p></main>",
        );
    };

    let title = display_name(record);
    let mut body = String::from("<main class=\"detail\"><p><a href=\"/\">&larr; back</a></p>");
    let _ = write!(body, "<h1>{}</h1>", escape(&title));
    if let Some(image) = record.image() {
        let _ = write!(
            body,
            "<img src=\"{}\" alt=\"{}\">",
            escape(image),
            escape(&title)
        );
    }
    let _ = write!(body, "<p>id: <code>{}</code></p>", escape(&record.id));

    if let Some(metadata) = &record.metadata {
        let traits = metadata.traits();
        if !traits.is_empty() {
            body.push_str("<table><tr><th>Trait</th><th>Value</th></tr>");
            for entry in traits {
                let _ = write!(
                    body,
                    "<tr><td>{}</td><td>{}</td></tr>",
                    escape(&entry.trait_type),
                    escape(&entry.value)
                );
            }
            body.push_str("</table>");
        }
        if let Ok(pretty) = serde_json::to_string_pretty(metadata) {
            let _ = write!(body, "<pre>{}</pre>", escape(&pretty));
        }
    }
    body.push_str("</main>");
    layout(&title, &body)
}

fn card(record: &Record) -> String {
    let name = display_name(record);
    let href = format!("/token/{}", urlencoding::encode(&record.id));
    let image = record.image().map_or_else(String::new, |image| {
        format!(
            "<img loading=\"lazy\" src=\"{}\" alt=\"{}\">",
            escape(image),
            escape(&name)
        )
    });
    format!(
        "<a class=\"card\" href=\"{}\">{image}<div>{}</div></a>",
        escape(&href),
        escape(&name)
    )
}

fn display_name(record: &Record) -> String {
    record
        .name()
        .map_or_else(|| format!("#{}", record.id), str::to_string)
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width,initial-scale=1\">\
         <title>{}</title><style>{STYLE}</style></head><body>{body}</body></html>",
        escape(title)
    )
}

/// Escapes text for HTML element content and quoted attribute values.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
