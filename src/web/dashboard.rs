use axum::Extension;
use maud::{html, Markup};
use std::sync::Arc;

use super::{client::Client, components::layout, render_page};

struct Stat {
    title: &'static str,
    value: &'static str,
    change: &'static str,
    icon: &'static str,
}

const STATS: [Stat; 4] = [
    Stat {
        title: "Total Users",
        value: "3",
        change: "+100%",
        icon: "M12 4.354a4 4 0 110 5.292M15 21H3v-1a6 6 0 0112 0v1zm0 0h6v-1a6 6 0 00-9-5.197M13 7a4 4 0 11-8 0 4 4 0 018 0z",
    },
    Stat {
        title: "Documents",
        value: "1,287",
        change: "+8.2%",
        icon: "M9 12h6m-6 4h6m2 5H7a2 2 0 01-2-2V5a2 2 0 012-2h5.586a1 1 0 01.707.293l5.414 5.414a1 1 0 01.293.707V19a2 2 0 01-2 2z",
    },
    Stat {
        title: "Active Sessions",
        value: "1",
        change: "+100%",
        icon: "M13 7h8m0 0v8m0-8l-8 8-4-4-6 6",
    },
    Stat {
        title: "Database Size",
        value: "400 MB",
        change: "+0%",
        icon: "M4 7v10c0 2.21 3.582 4 8 4s8-1.79 8-4V7M4 7c0 2.21 3.582 4 8 4s8-1.79 8-4M4 7c0-2.21 3.582-4 8-4s8 1.79 8 4",
    },
];

struct Activity {
    user: &'static str,
    action: &'static str,
    time: &'static str,
}

const RECENT_ACTIVITY: [Activity; 4] = [
    Activity { user: "admin@constitucheck.com", action: "Uploaded document", time: "2 minutes ago" },
    Activity { user: "abbas1795khan@gmail.com", action: "Searched database", time: "15 minutes ago" },
    Activity { user: "staff@constitucheck.com", action: "Modified record", time: "1 hour ago" },
    Activity { user: "admin@constitucheck.com", action: "Generated report", time: "2 hours ago" },
];

/// Show dashboard
pub async fn show(Extension(client): Extension<Arc<Client>>) -> Markup {
    render_page(&client, "/", "Dashboard", false, content())
}

fn content() -> Markup {
    html! {
        div class="p-6 space-y-6" {
            (layout::header("Dashboard", "Welcome to your ConstituCheck admin portal"))

            // Stats cards
            div class="grid grid-cols-1 gap-6 md:grid-cols-2 lg:grid-cols-4" {
                @for stat in &STATS {
                    (layout::card(html! {
                        div class="flex items-start justify-between" {
                            div {
                                p class="text-sm text-gray-500 mb-1" { (stat.title) }
                                h3 class="text-3xl font-bold text-gray-900" { (stat.value) }
                                p class="text-sm text-green-600 mt-2" { (stat.change) " from last month" }
                            }
                            div class="p-3 rounded-lg bg-gradient-to-r from-primary to-accent" {
                                svg class="h-6 w-6 text-white" fill="none" stroke="currentColor" viewBox="0 0 24 24" {
                                    path stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d=(stat.icon) {}
                                }
                            }
                        }
                    }))
                }
            }

            // Recent activity
            (layout::card(html! {
                h2 class="text-xl font-semibold text-gray-900 mb-4" { "Recent Activity" }
                div class="space-y-4" {
                    @for activity in &RECENT_ACTIVITY {
                        div class="flex items-center justify-between p-4 rounded-lg bg-gray-50 hover:bg-gray-100" {
                            div class="flex items-center gap-4" {
                                div class="h-10 w-10 rounded-full bg-gradient-to-r from-primary to-accent flex items-center justify-center text-white font-semibold" {
                                    (activity.user.chars().next().map(|c| c.to_ascii_uppercase()).unwrap_or('?'))
                                }
                                div {
                                    p class="font-medium text-gray-900" { (activity.user) }
                                    p class="text-sm text-gray-500" { (activity.action) }
                                }
                            }
                            span class="text-sm text-gray-500" { (activity.time) }
                        }
                    }
                }
            }))

            // Status cards
            div class="grid grid-cols-1 gap-6 md:grid-cols-2" {
                (status_card("PostgreSQL Connected", "VM: 192.168.1.100 • Port: 5432"))
                (status_card("VM Storage Ready", "Used: 45.2 GB / 100 GB available"))
            }
        }
    }
}

fn status_card(title: &str, detail: &str) -> Markup {
    layout::card(html! {
        div class="flex items-center gap-4" {
            div class="p-3 rounded-lg bg-green-100" {
                div class="h-3 w-3 rounded-full bg-green-500" {}
            }
            div {
                h3 class="font-semibold text-gray-900" { (title) }
                p class="text-sm text-gray-500" { (detail) }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dashboard_lists_stats_and_activity() {
        let html = content().into_string();
        for stat in &STATS {
            assert!(html.contains(stat.title));
        }
        assert!(html.contains("1,287"));
        assert_eq!(html.matches("admin@constitucheck.com").count(), 2);
        assert!(html.contains("PostgreSQL Connected"));
    }
}
