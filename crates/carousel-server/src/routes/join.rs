// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Public join surface: ad-link redirect and landing page.
//!
//! These routes are the URLs printed on ads. They must ALWAYS answer:
//! missing pool, missing active group, missing invite link and database
//! errors all collapse to the same "temporarily unavailable" page, with no
//! distinction visible to the end user and nothing cached along the way.

use axum::extract::{Path, State};
use axum::http::{HeaderName, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use tracing::error;

use carousel_core::store;

use crate::state::AppState;

const X_ROBOTS_TAG: HeaderName = HeaderName::from_static("x-robots-tag");

const UNAVAILABLE_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Grupo Indisponível</title>
</head>
<body>
  <h1>Grupo temporariamente indisponível.</h1>
  <p>Tente novamente em instantes.</p>
</body>
</html>
"#;

/// `GET /join/{slug}`: 302 redirect straight into the group invite.
///
/// This is the link placed in ads; it never renders anything when the
/// invite resolves, and never fails outward when it does not.
pub async fn join_redirect(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    match store::resolve_active_invite(&state.db, &slug).await {
        Ok(Some(invite)) => (
            StatusCode::FOUND,
            [
                (header::LOCATION, invite.invite_url),
                (header::CACHE_CONTROL, "no-store".to_string()),
            ],
        )
            .into_response(),
        Ok(None) => unavailable(),
        Err(err) => {
            error!(slug = %slug, error = %err, "join redirect lookup failed");
            unavailable()
        }
    }
}

/// `GET /join/{slug}/page`: lightweight landing page with an explicit
/// button plus a scripted auto-forward, for contexts where a bare 302 gets
/// eaten by in-app browsers.
pub async fn join_page(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    match store::resolve_active_invite(&state.db, &slug).await {
        Ok(Some(invite)) => page_response(
            StatusCode::OK,
            landing_page(&invite.title, &invite.invite_url),
        ),
        Ok(None) => page_response(StatusCode::OK, UNAVAILABLE_HTML.to_string()),
        Err(err) => {
            error!(slug = %slug, error = %err, "join page lookup failed");
            page_response(StatusCode::OK, UNAVAILABLE_HTML.to_string())
        }
    }
}

fn unavailable() -> Response {
    (
        StatusCode::OK,
        [(header::CACHE_CONTROL, "no-store")],
        Html(UNAVAILABLE_HTML),
    )
        .into_response()
}

fn page_response(status: StatusCode, html: String) -> Response {
    (
        status,
        [
            (header::CACHE_CONTROL, "no-store"),
            (header::PRAGMA, "no-cache"),
            (header::EXPIRES, "0"),
            (X_ROBOTS_TAG, "noindex, nofollow"),
        ],
        Html(html),
    )
        .into_response()
}

/// Render the landing page for a resolved invite.
fn landing_page(title: &str, invite_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Entrar no Grupo</title>
  <style>
    * {{ margin: 0; padding: 0; box-sizing: border-box; }}
    body {{
      font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
      display: flex;
      justify-content: center;
      align-items: center;
      min-height: 100vh;
      background: linear-gradient(135deg, #25D366 0%, #128C7E 100%);
      padding: 20px;
    }}
    .container {{
      background: white;
      border-radius: 16px;
      padding: 40px;
      text-align: center;
      box-shadow: 0 10px 40px rgba(0,0,0,0.2);
      max-width: 400px;
      width: 100%;
    }}
    h1 {{
      color: #128C7E;
      margin-bottom: 20px;
      font-size: 24px;
    }}
    p {{
      color: #666;
      margin-bottom: 30px;
      line-height: 1.6;
    }}
    .button {{
      display: inline-block;
      background: #25D366;
      color: white;
      text-decoration: none;
      padding: 16px 32px;
      border-radius: 8px;
      font-weight: 600;
      font-size: 18px;
    }}
    .button:hover {{
      background: #20BA5A;
    }}
  </style>
</head>
<body>
  <div class="container">
    <h1>{title}</h1>
    <p>Clique no botão abaixo para entrar no grupo do WhatsApp</p>
    <a href="{invite_url}" class="button">Abrir no WhatsApp</a>
  </div>
  <script>
    setTimeout(function() {{
      window.location.href = '{invite_url}';
    }}, 2000);
  </script>
</body>
</html>
"#
    )
}
