use axum::{
    extract::{Multipart, State},
    response::Redirect,
    Extension,
};
use maud::{html, Markup};
use std::sync::Arc;

use super::{client::Client, components::layout, render_page, AppState};
use crate::simulate::SimulatedOperation;

pub const DESTINATION: &str = "/var/documents/constitucheck/";
const ACCEPTED: &str = ".pdf,.doc,.docx,.xls,.xlsx,.ppt,.pptx,.txt";

struct RecentUpload {
    name: &'static str,
    size: &'static str,
    date: &'static str,
}

const RECENT_UPLOADS: [RecentUpload; 4] = [
    RecentUpload { name: "report_2024.pdf", size: "2.4 MB", date: "2 hours ago" },
    RecentUpload { name: "data_analysis.xlsx", size: "1.2 MB", date: "5 hours ago" },
    RecentUpload { name: "presentation.pptx", size: "8.7 MB", date: "1 day ago" },
    RecentUpload { name: "document.docx", size: "456 KB", date: "2 days ago" },
];

/// Page-local state of the documents view.
pub struct DocumentsState {
    pub upload: SimulatedOperation,
}

impl Default for DocumentsState {
    fn default() -> Self {
        DocumentsState {
            upload: SimulatedOperation::new("upload"),
        }
    }
}

/// Show the upload zone and recent uploads
pub async fn show(Extension(client): Extension<Arc<Client>>) -> Markup {
    let uploading = client.documents.upload.is_busy();
    render_page(&client, "/documents", "Documents", uploading, content(uploading))
}

/// Accept a file selection. Files are counted and discarded; the upload
/// itself is simulated.
pub async fn upload(
    State(state): State<AppState>,
    Extension(client): Extension<Arc<Client>>,
    mut multipart: Multipart,
) -> Redirect {
    let mut count = 0usize;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let named = field.file_name().is_some_and(|name| !name.is_empty());
                // drain the body so the stream can advance
                if field.bytes().await.is_err() {
                    client.notices.error("Upload failed. Please try again.");
                    return Redirect::to("/documents");
                }
                if named {
                    count += 1;
                }
            }
            Ok(None) => break,
            Err(err) => {
                tracing::warn!(client = %client.id, error = %err, "Malformed upload");
                client.notices.error("Upload failed. Please try again.");
                return Redirect::to("/documents");
            }
        }
    }

    if count == 0 {
        return Redirect::to("/documents");
    }

    tracing::info!(client = %client.id, files = count, "Upload started");
    let notices = client.notices.clone();
    client
        .documents
        .upload
        .start(state.settings.upload_delay(), move || {
            notices.success(format!("Successfully uploaded {} file(s)", count));
        });

    Redirect::to("/documents")
}

fn content(uploading: bool) -> Markup {
    html! {
        div class="p-6 space-y-6" {
            (layout::header("Document Management", "Upload and manage documents on your Linux VM"))

            (layout::card(html! {
                form action="/documents/upload" method="post" enctype="multipart/form-data" {
                    label
                        for="file-upload"
                        class="block border-2 border-dashed border-gray-300 rounded-lg p-12 text-center hover:border-primary cursor-pointer" {
                        div class="flex flex-col items-center gap-4" {
                            div class="p-4 rounded-full bg-indigo-50" {
                                svg class="h-12 w-12 text-primary" fill="none" stroke="currentColor" viewBox="0 0 24 24" {
                                    path stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d="M7 16a4 4 0 01-.88-7.903A5 5 0 1115.9 6L16 6a5 5 0 011 9.9M15 13l-3-3m0 0l-3 3m3-3v12" {}
                                }
                            }
                            div {
                                h3 class="text-xl font-semibold text-gray-900 mb-2" {
                                    @if uploading { "Uploading to VM..." } @else { "Drop files here or click to upload" }
                                }
                                p class="text-gray-500" { "Supports PDF, DOCX, XLSX, PPTX, and more" }
                            }
                        }
                    }
                    input
                        id="file-upload"
                        name="files"
                        type="file"
                        multiple
                        class="hidden"
                        accept=(ACCEPTED)
                        disabled[uploading]
                        onchange="this.form.submit()";
                    div class="mt-6 flex items-center gap-2 text-sm text-gray-500" {
                        span { "Files will be uploaded to: " }
                        code class="px-2 py-1 rounded bg-gray-100 text-primary" { (DESTINATION) }
                    }
                }
            }))

            (layout::card(html! {
                h2 class="text-xl font-semibold text-gray-900 mb-4" { "Recent Uploads" }
                div class="space-y-3" {
                    @for file in &RECENT_UPLOADS {
                        div class="flex items-center justify-between p-4 rounded-lg bg-gray-50 hover:bg-gray-100" {
                            div class="flex items-center gap-3" {
                                (layout::icon(crate::models::Icon::FileText, "h-5 w-5 text-primary"))
                                div {
                                    p class="font-medium text-gray-900" { (file.name) }
                                    p class="text-sm text-gray-500" { (file.size) " • " (file.date) }
                                }
                            }
                            button type="button" class="text-sm text-primary hover:underline" { "Download" }
                        }
                    }
                }
            }))
        }
    }
}
