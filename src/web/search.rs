use axum::{
    extract::{Form, State},
    response::Redirect,
    Extension,
};
use maud::{html, Markup};
use parking_lot::Mutex;
use serde::Deserialize;
use std::sync::Arc;

use super::{client::Client, components::layout, render_page, AppState};
use crate::simulate::SimulatedOperation;

pub struct SearchResult {
    pub title: &'static str,
    pub content: &'static str,
    pub author: &'static str,
    pub date: &'static str,
    pub category: &'static str,
}

pub const RESULTS: [SearchResult; 3] = [
    SearchResult {
        title: "Annual Financial Report 2024",
        content: "Comprehensive financial analysis and projections for fiscal year...",
        author: "John Doe",
        date: "2024-01-15",
        category: "Finance",
    },
    SearchResult {
        title: "Q4 Performance Review",
        content: "Detailed performance metrics and key achievements for the fourth quarter...",
        author: "Jane Smith",
        date: "2024-01-10",
        category: "Reports",
    },
    SearchResult {
        title: "Strategic Planning Document",
        content: "Long-term strategic goals and implementation roadmap...",
        author: "Mike Johnson",
        date: "2024-01-05",
        category: "Strategy",
    },
];

/// Page-local state of the search view.
pub struct SearchState {
    pub op: SimulatedOperation,
    pub query: Mutex<String>,
}

impl Default for SearchState {
    fn default() -> Self {
        SearchState {
            op: SimulatedOperation::new("search"),
            query: Mutex::new(String::new()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub q: String,
}

pub async fn show(Extension(client): Extension<Arc<Client>>) -> Markup {
    let searching = client.search.op.is_busy();
    let query = client.search.query.lock().clone();
    render_page(&client, "/search", "Search", searching, content(&query, searching))
}

/// Run a (simulated) search. The result set is fixed regardless of query.
pub async fn submit(
    State(state): State<AppState>,
    Extension(client): Extension<Arc<Client>>,
    Form(form): Form<SearchForm>,
) -> Redirect {
    *client.search.query.lock() = form.q;
    client.search.op.start(state.settings.search_delay(), || {});
    Redirect::to("/search")
}

fn content(query: &str, searching: bool) -> Markup {
    html! {
        div class="p-6 space-y-6" {
            (layout::header("Document Search", "Search through your PostgreSQL database"))

            (layout::card(html! {
                form action="/search" method="post" class="space-y-4" {
                    div class="flex gap-4" {
                        div class="flex-1 relative" {
                            (layout::icon(crate::models::Icon::Search, "absolute left-3 top-3.5 h-5 w-5 text-gray-400"))
                            input
                                type="text"
                                name="q"
                                value=(query)
                                placeholder="Search documents, records, and more..."
                                class="w-full pl-10 h-12 rounded-md border border-gray-300 focus:outline-none focus:ring-primary focus:border-primary";
                        }
                        button
                            type="submit"
                            disabled[searching]
                            class="px-8 rounded-md text-white bg-gradient-to-r from-primary to-accent hover:opacity-90 disabled:opacity-50" {
                            @if searching { "Searching..." } @else { "Search" }
                        }
                    }
                    div class="flex gap-2 text-sm text-gray-500" {
                        span { "Database: PostgreSQL on 192.168.1.100" }
                    }
                }
            }))

            div class="space-y-4" {
                h2 class="text-xl font-semibold text-gray-900" { (RESULTS.len()) " Results Found" }
                @for result in &RESULTS {
                    (layout::card(html! {
                        div class="flex items-start gap-4" {
                            div class="p-3 rounded-lg bg-indigo-50" {
                                (layout::icon(crate::models::Icon::FileText, "h-6 w-6 text-primary"))
                            }
                            div class="flex-1" {
                                h3 class="text-lg font-semibold text-gray-900 mb-2" { (result.title) }
                                p class="text-gray-500 mb-4" { (result.content) }
                                div class="flex flex-wrap gap-4 text-sm text-gray-500" {
                                    span { (result.author) }
                                    span { (result.date) }
                                    span class="px-2 py-1 rounded bg-indigo-50 text-primary" { (result.category) }
                                }
                            }
                        }
                    }))
                }
            }
        }
    }
}
