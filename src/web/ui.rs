//! Shell chrome actions. Each one mutates the client's `UiState` and sends
//! the browser back to where it was.

use axum::{extract::Form, response::Redirect, Extension};
use serde::Deserialize;
use std::sync::Arc;

use super::{client::Client, validate_redirect_url};
use crate::gate::LANDING_PATH;
use crate::models::Section;

#[derive(Debug, Deserialize)]
pub struct BackForm {
    pub next: Option<String>,
}

impl BackForm {
    fn target(&self) -> String {
        self.next
            .as_deref()
            .map(validate_redirect_url)
            .unwrap_or_else(|| LANDING_PATH.to_string())
    }
}

#[derive(Debug, Deserialize)]
pub struct SelectForm {
    pub section: String,
}

pub async fn toggle_sidebar(Extension(client): Extension<Arc<Client>>, Form(form): Form<BackForm>) -> Redirect {
    client.ui.lock().toggle_collapsed();
    Redirect::to(&form.target())
}

pub async fn open_drawer(Extension(client): Extension<Arc<Client>>, Form(form): Form<BackForm>) -> Redirect {
    client.ui.lock().open_drawer();
    Redirect::to(&form.target())
}

pub async fn close_drawer(Extension(client): Extension<Arc<Client>>, Form(form): Form<BackForm>) -> Redirect {
    client.ui.lock().close_drawer();
    Redirect::to(&form.target())
}

/// Navigate from the mobile drawer. Unknown sections just close it.
pub async fn select_from_drawer(
    Extension(client): Extension<Arc<Client>>,
    Form(form): Form<SelectForm>,
) -> Redirect {
    let mut ui = client.ui.lock();
    match Section::parse(&form.section) {
        Some(section) => Redirect::to(ui.select_from_drawer(section)),
        None => {
            ui.close_drawer();
            Redirect::to(LANDING_PATH)
        }
    }
}
