use maud::{html, Markup, DOCTYPE};

use crate::models::Icon;
use crate::shell::{active_section, Notice, NoticeKind, UiState, NAVIGATION};

/// Base HTML layout with Tailwind CSS.
///
/// `auto_refresh` reloads the page every second; pages use it while a
/// simulated operation is running.
pub fn base(title: &str, auto_refresh: bool, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                @if auto_refresh {
                    meta http-equiv="refresh" content="1";
                }
                title { (title) " - ConstituCheck" }

                // Tailwind CSS (using CDN for now, can switch to build later)
                script src="https://cdn.tailwindcss.com" {}

                script {
                    r#"
                    tailwind.config = {
                        theme: {
                            extend: {
                                colors: {
                                    primary: '#6366f1',
                                    accent: '#8b5cf6',
                                }
                            }
                        }
                    }
                    "#
                }
            }
            body class="bg-gray-50 min-h-screen" {
                (content)
            }
        }
    }
}

/// Everything the shell needs to draw itself around a page.
pub struct ShellView<'a> {
    pub location: &'a str,
    pub ui: UiState,
    pub user_email: Option<String>,
    pub notices: Vec<Notice>,
}

/// Persistent chrome: desktop sidebar, mobile header and drawer, toasts.
pub fn shell(view: &ShellView<'_>, content: Markup) -> Markup {
    let active = active_section(view.location);
    let collapsed = view.ui.collapsed;
    let width = if collapsed { "w-20" } else { "w-64" };

    html! {
        div class="min-h-screen flex" {
            // Sidebar - Desktop
            aside class=(format!("hidden md:flex flex-col bg-white border-r border-gray-200 {}", width)) {
                div class="p-4 border-b border-gray-200 flex items-center justify-between" {
                    @if !collapsed {
                        (brand("text-xl"))
                    }
                    form action="/ui/sidebar" method="post" {
                        input type="hidden" name="next" value=(view.location);
                        button type="submit" class="p-2 rounded-md hover:bg-gray-100" title=(if collapsed { "Expand sidebar" } else { "Collapse sidebar" }) {
                            (chevron(collapsed))
                        }
                    }
                }

                nav class="flex-1 p-4 space-y-2" {
                    @for item in &NAVIGATION {
                        @let is_active = active == Some(item.section);
                        a href=(item.path)
                            class=(nav_classes(is_active, collapsed))
                            aria-current=[is_active.then_some("page")] {
                            (icon(item.icon, if collapsed { "h-5 w-5" } else { "h-5 w-5 mr-3" }))
                            @if !collapsed {
                                span { (item.label) }
                            }
                        }
                    }
                }

                div class="p-4 border-t border-gray-200" {
                    (logout_button(view.location, collapsed))
                    @if !collapsed {
                        @if let Some(email) = &view.user_email {
                            p class="text-xs text-gray-500 mt-2 truncate" { (email) }
                        }
                    }
                }
            }

            // Sidebar - Mobile
            @if view.ui.mobile_open {
                div class="fixed inset-0 z-50 md:hidden" {
                    form action="/ui/drawer/close" method="post" class="absolute inset-0" {
                        input type="hidden" name="next" value=(view.location);
                        button type="submit" class="absolute inset-0 w-full h-full bg-black/50" aria-label="Close menu" {}
                    }
                    aside class="absolute left-0 top-0 bottom-0 w-64 bg-white border-r border-gray-200" {
                        div class="p-4 border-b border-gray-200 flex items-center justify-between" {
                            (brand("text-xl"))
                            form action="/ui/drawer/close" method="post" {
                                input type="hidden" name="next" value=(view.location);
                                button type="submit" class="p-2 rounded-md hover:bg-gray-100" aria-label="Close menu" { "✕" }
                            }
                        }

                        nav class="p-4 space-y-2" {
                            @for item in &NAVIGATION {
                                @let is_active = active == Some(item.section);
                                form action="/ui/drawer/select" method="post" {
                                    input type="hidden" name="section" value=(format!("{:?}", item.section).to_lowercase());
                                    button type="submit" class=(nav_classes(is_active, false)) {
                                        (icon(item.icon, "h-5 w-5 mr-3"))
                                        span { (item.label) }
                                    }
                                }
                            }
                        }

                        div class="absolute bottom-0 left-0 right-0 p-4 border-t border-gray-200" {
                            (logout_button(view.location, false))
                            @if let Some(email) = &view.user_email {
                                p class="text-xs text-gray-500 mt-2 truncate" { (email) }
                            }
                        }
                    }
                }
            }

            // Main Content
            div class="flex-1 flex flex-col" {
                header class="md:hidden p-4 border-b border-gray-200 bg-white flex items-center justify-between" {
                    form action="/ui/drawer/open" method="post" {
                        input type="hidden" name="next" value=(view.location);
                        button type="submit" class="p-2 rounded-md hover:bg-gray-100" aria-label="Open menu" { "☰" }
                    }
                    (brand("text-lg"))
                    div class="w-10" {}
                }

                main class="flex-1 overflow-auto" {
                    (content)
                }
            }
        }
        (toasts(&view.notices))
    }
}

/// Stacked transient notifications, dismissible client-side.
pub fn toasts(notices: &[Notice]) -> Markup {
    html! {
        @if !notices.is_empty() {
            div class="fixed bottom-4 right-4 z-50 space-y-2" id="toasts" {
                @for notice in notices {
                    @let (bg_class, text_class) = match notice.kind {
                        NoticeKind::Success => ("bg-green-50 border-green-200", "text-green-800"),
                        NoticeKind::Error => ("bg-red-50 border-red-200", "text-red-800"),
                    };
                    div class=(format!("rounded-md p-4 border shadow flex items-start gap-3 {}", bg_class)) role="status" {
                        p class=(format!("text-sm font-medium {}", text_class)) { (notice.message) }
                        button type="button" class="text-gray-400 hover:text-gray-600" onclick="this.parentElement.remove()" aria-label="Dismiss" { "✕" }
                    }
                }
            }
        }
    }
}

/// Page heading with a subtitle
pub fn header(title: &str, subtitle: &str) -> Markup {
    html! {
        div {
            h1 class="text-3xl font-bold text-gray-900 mb-2" { (title) }
            p class="text-gray-500" { (subtitle) }
        }
    }
}

/// Card component
pub fn card(content: Markup) -> Markup {
    html! {
        div class="bg-white overflow-hidden shadow rounded-lg p-6" {
            (content)
        }
    }
}

pub fn icon(icon: Icon, class: &str) -> Markup {
    html! {
        svg class=(class) fill="none" stroke="currentColor" viewBox="0 0 24 24" {
            path stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d=(icon.path()) {}
        }
    }
}

fn brand(size: &str) -> Markup {
    html! {
        h1 class=(format!("{} font-bold bg-gradient-to-r from-primary to-accent bg-clip-text text-transparent", size)) {
            "ConstituCheck"
        }
    }
}

fn chevron(collapsed: bool) -> Markup {
    let d = if collapsed { "M9 5l7 7-7 7" } else { "M15 19l-7-7 7-7" };
    html! {
        svg class="h-4 w-4" fill="none" stroke="currentColor" viewBox="0 0 24 24" {
            path stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d=(d) {}
        }
    }
}

fn nav_classes(active: bool, collapsed: bool) -> String {
    let mut classes = String::from("w-full flex items-center px-3 py-2 rounded-md text-sm font-medium");
    if active {
        classes.push_str(" bg-primary text-white shadow");
    } else {
        classes.push_str(" text-gray-700 hover:bg-gray-100");
    }
    classes.push_str(if collapsed { " justify-center" } else { " justify-start" });
    classes
}

fn logout_button(location: &str, collapsed: bool) -> Markup {
    html! {
        form action="/logout" method="post" {
            input type="hidden" name="next" value=(location);
            button
                type="submit"
                class=(format!("w-full flex items-center px-3 py-2 rounded-md text-sm text-gray-700 hover:bg-red-600 hover:text-white {}", if collapsed { "justify-center" } else { "justify-start" })) {
                svg class=(if collapsed { "h-5 w-5" } else { "h-5 w-5 mr-3" }) fill="none" stroke="currentColor" viewBox="0 0 24 24" {
                    path stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d="M17 16l4-4m0 0l-4-4m4 4H7m6 4v1a3 3 0 01-3 3H6a3 3 0 01-3-3V7a3 3 0 013-3h4a3 3 0 013 3v1" {}
                }
                @if !collapsed {
                    span { "Logout" }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(location: &str, ui: UiState) -> ShellView<'_> {
        ShellView {
            location,
            ui,
            user_email: Some("a@b.com".to_string()),
            notices: vec![],
        }
    }

    #[test]
    fn exactly_the_current_item_is_marked_active() {
        let html = shell(&view("/documents", UiState::default()), html! {}).into_string();
        assert_eq!(html.matches(r#"aria-current="page""#).count(), 1);
        assert!(html.contains(r#"href="/documents" class="w-full flex items-center px-3 py-2 rounded-md text-sm font-medium bg-primary"#));

        let html = shell(&view("/elsewhere", UiState::default()), html! {}).into_string();
        assert_eq!(html.matches(r#"aria-current="page""#).count(), 0);
    }

    #[test]
    fn collapsed_sidebar_hides_labels_and_email() {
        let ui = UiState {
            collapsed: true,
            mobile_open: false,
        };
        let html = shell(&view("/", ui), html! {}).into_string();
        assert!(!html.contains("<span>Dashboard</span>"));
        assert!(!html.contains("a@b.com"));
        assert!(html.contains("Expand sidebar"));
    }

    #[test]
    fn drawer_renders_only_when_open() {
        let closed = shell(&view("/", UiState::default()), html! {}).into_string();
        assert!(!closed.contains("/ui/drawer/select"));

        let ui = UiState {
            collapsed: false,
            mobile_open: true,
        };
        let open = shell(&view("/", ui), html! {}).into_string();
        assert_eq!(open.matches("/ui/drawer/select").count(), NAVIGATION.len());
        assert!(open.contains(r#"name="section" value="documents""#));
    }

    #[test]
    fn toasts_escape_messages() {
        let notices = vec![Notice {
            kind: NoticeKind::Error,
            message: "<b>nope</b>".to_string(),
        }];
        let html = toasts(&notices).into_string();
        assert!(html.contains("&lt;b&gt;nope&lt;/b&gt;"));
        assert!(toasts(&[]).into_string().is_empty());
    }
}
