//! Index page
//!
//! The page text comes from a JSON data file that may contain comments. The
//! file is re-read on every request so it can be edited while the server
//! runs.

use std::fmt::Write as _;
use std::path::Path;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::error::PageError;

/// One entry of the info list shown under the video
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InfoItem {
    pub title: String,
    pub data: String,
}

/// Contents of the page data file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData {
    pub page_title: String,
    pub page_header: String,
    #[serde(default)]
    pub style_sheet: Option<String>,
    #[serde(default)]
    pub info: Vec<InfoItem>,
}

impl PageData {
    /// Parse data file text
    pub fn parse(path: &Path, text: &str) -> Result<Self, PageError> {
        json5::from_str(text).map_err(|e| PageError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Read and parse the data file
    pub async fn load(path: &Path) -> Result<Self, PageError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| PageError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        Self::parse(path, &text)
    }

    /// Render the index page
    pub fn render(&self) -> String {
        let mut html = String::with_capacity(1024);

        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        let _ = writeln!(html, "<title>{}</title>", escape(&self.page_title));
        if let Some(href) = &self.style_sheet {
            let _ = writeln!(html, "<link rel=\"stylesheet\" href=\"{}\">", escape(href));
        }
        html.push_str("</head>\n<body>\n");

        let _ = writeln!(html, "<h1>{}</h1>", escape(&self.page_header));
        html.push_str("<img id=\"video\" src=\"/video_feed\" alt=\"Live video\">\n");
        html.push_str("<p id=\"count\">People watching: 0</p>\n");

        if !self.info.is_empty() {
            html.push_str("<dl class=\"info\">\n");
            for item in &self.info {
                let _ = writeln!(
                    html,
                    "<dt>{}</dt><dd>{}</dd>",
                    escape(&item.title),
                    escape(&item.data)
                );
            }
            html.push_str("</dl>\n");
        }

        html.push_str("<script src=\"/static/app.js\"></script>\n</body>\n</html>\n");
        html
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Cannot render index page");

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Internal Server Error: {self}"),
        )
            .into_response()
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
