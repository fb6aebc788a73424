use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt;

/// Opaque credential issued by the identity provider. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct IdentityToken(String);

impl IdentityToken {
    pub fn new(value: impl Into<String>) -> Self {
        IdentityToken(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IdentityToken(<redacted>)")
    }
}

/// The authenticated identity held by a session store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    uid: String,
    email: String,
    id_token: IdentityToken,
    refresh_token: IdentityToken,
    expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        uid: impl Into<String>,
        email: impl Into<String>,
        id_token: IdentityToken,
        refresh_token: IdentityToken,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Session {
            uid: uid.into(),
            email: email.into(),
            id_token,
            refresh_token,
            expires_at,
        }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Display identifier shown in the shell
    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn id_token(&self) -> &IdentityToken {
        &self.id_token
    }

    pub fn refresh_token(&self) -> &IdentityToken {
        &self.refresh_token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// True when the id token expires within `skew` of `now`.
    pub fn expires_within(&self, now: DateTime<Utc>, skew: Duration) -> bool {
        self.expires_at - skew <= now
    }
}

/// Closed set of shell sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Dashboard,
    Documents,
    Search,
}

/// Icons the shell knows how to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    LayoutDashboard,
    FileText,
    Search,
}

impl Icon {
    /// SVG path data (24x24 viewbox, stroked)
    pub fn path(&self) -> &'static str {
        match self {
            Icon::LayoutDashboard => "M4 5a1 1 0 011-1h4a1 1 0 011 1v7a1 1 0 01-1 1H5a1 1 0 01-1-1V5zm10 0a1 1 0 011-1h4a1 1 0 011 1v3a1 1 0 01-1 1h-4a1 1 0 01-1-1V5zM4 17a1 1 0 011-1h4a1 1 0 011 1v2a1 1 0 01-1 1H5a1 1 0 01-1-1v-2zm10-4a1 1 0 011-1h4a1 1 0 011 1v6a1 1 0 01-1 1h-4a1 1 0 01-1-1v-6z",
            Icon::FileText => "M9 12h6m-6 4h6m2 5H7a2 2 0 01-2-2V5a2 2 0 012-2h5.586a1 1 0 01.707.293l5.414 5.414a1 1 0 01.293.707V19a2 2 0 01-2 2z",
            Icon::Search => "M21 21l-6-6m2-5a7 7 0 11-14 0 7 7 0 0114 0z",
        }
    }
}

/// Static descriptor for one sidebar entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationItem {
    pub section: Section,
    pub label: &'static str,
    pub path: &'static str,
    pub icon: Icon,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Dashboard, Section::Documents, Section::Search];

    pub const fn descriptor(self) -> NavigationItem {
        match self {
            Section::Dashboard => NavigationItem {
                section: self,
                label: "Dashboard",
                path: "/",
                icon: Icon::LayoutDashboard,
            },
            Section::Documents => NavigationItem {
                section: self,
                label: "Documents",
                path: "/documents",
                icon: Icon::FileText,
            },
            Section::Search => NavigationItem {
                section: self,
                label: "Search",
                path: "/search",
                icon: Icon::Search,
            },
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Section::ALL
            .into_iter()
            .find(|section| format!("{:?}", section).eq_ignore_ascii_case(value.trim()))
    }
}
