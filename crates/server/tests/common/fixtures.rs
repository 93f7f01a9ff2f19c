//! Request bodies used across API tests.

use serde_json::{Value, json};

/// A valid hackathon body.
pub fn hackathon_body(title: &str) -> Value {
    json!({
        "title": title,
        "location": "Lisbon, Portugal",
        "start_date": "2024-06-07",
        "end_date": "2024-06-09",
        "description": "Built a transit planner over one weekend.",
        "links": [{"platform": "Github", "label": "code", "url": "https://github.com/example/planner"}],
    })
}

/// A valid work-gallery body with one attachment per URL.
#[allow(dead_code)]
pub fn gallery_body(title: &str, urls: &[&str]) -> Value {
    let attachments: Vec<Value> = urls
        .iter()
        .map(|url| {
            json!({
                "name": "screenshot.png",
                "type": "image/png",
                "size": 2048,
                "url": url,
            })
        })
        .collect();
    json!({
        "title": title,
        "description": "Personal site with a JSON API.",
        "tech_used": ["rust", "axum", "sqlite"],
        "links": [{"platform": "SourceCode", "label": "repo", "url": "https://git.example.com/site"}],
        "attachments": attachments,
    })
}

#[allow(dead_code)]
pub fn profile_body(email: &str) -> Value {
    json!({
        "email": email,
        "full_name": "Test User",
        "avatar_url": "https://cdn.example.com/avatar.png",
    })
}

/// Titles of a list response, in response order.
#[allow(dead_code)]
pub fn titles(list: &Value) -> Vec<String> {
    list.as_array()
        .map(|items| {
            items
                .iter()
                .map(|i| i["payload"]["title"].as_str().unwrap_or_default().to_string())
                .collect()
        })
        .unwrap_or_default()
}
