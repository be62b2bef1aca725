//! The displayed status and its transitions.

use crate::config::Locale;
use crate::location::{Fix, LocationError, LocationSource};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Idle,
    Fetching(LocationSource),
    Resolved(LocationSource, Fix),
    Failed(LocationSource),
    PermissionDenied,
    Cancelled(LocationSource),
}

impl Status {
    pub fn is_fetching(&self) -> bool {
        matches!(self, Self::Fetching(_))
    }

    pub fn kind(&self) -> StatusKind {
        match self {
            Self::Idle => StatusKind::Idle,
            Self::Fetching(_) => StatusKind::Fetching,
            Self::Resolved(..) => StatusKind::Resolved,
            Self::Failed(_) => StatusKind::Failed,
            Self::PermissionDenied => StatusKind::Denied,
            Self::Cancelled(_) => StatusKind::Cancelled,
        }
    }

    pub fn source(&self) -> Option<LocationSource> {
        match self {
            Self::Fetching(s) | Self::Resolved(s, _) | Self::Failed(s) | Self::Cancelled(s) => Some(*s),
            Self::Idle | Self::PermissionDenied => None,
        }
    }

    pub fn fix(&self) -> Option<Fix> {
        match self {
            Self::Resolved(_, fix) => Some(*fix),
            _ => None,
        }
    }

    /// Localized status line.
    pub fn text(&self, locale: Locale) -> String {
        match (locale, self) {
            (Locale::Ja, Self::Idle) => "位置情報未取得".into(),
            (Locale::Ja, Self::Fetching(_)) => "取得中...".into(),
            (Locale::Ja, Self::Resolved(source, fix)) => format!(
                "{} 推定位置:\n 緯度={},\n 経度={},\n 精度={}",
                source,
                coord(fix.lat),
                coord(fix.lon),
                coord(fix.accuracy)
            ),
            (Locale::Ja, Self::Failed(_)) => "位置情報の取得に失敗".into(),
            (Locale::Ja, Self::PermissionDenied) => "権限が拒否されました".into(),
            (Locale::Ja, Self::Cancelled(_)) => "取得を中止しました".into(),
            (Locale::En, Self::Idle) => "Location not retrieved".into(),
            (Locale::En, Self::Fetching(_)) => "Fetching...".into(),
            (Locale::En, Self::Resolved(source, fix)) => format!(
                "{} estimated position:\n lat={},\n lon={},\n accuracy={}",
                source,
                coord(fix.lat),
                coord(fix.lon),
                coord(fix.accuracy)
            ),
            (Locale::En, Self::Failed(_)) => "Could not retrieve location".into(),
            (Locale::En, Self::PermissionDenied) => "Permission denied".into(),
            (Locale::En, Self::Cancelled(_)) => "Request cancelled".into(),
        }
    }
}

/// Whole numbers keep one decimal place (`35.0`, not `35`).
fn coord(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 {
        format!("{:.1}", v)
    } else {
        v.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Idle,
    Fetching,
    Resolved,
    Failed,
    Denied,
    Cancelled,
}

/// Serializable snapshot of the status for the CLI and the web page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusView {
    pub state: StatusKind,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<LocationSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<Fix>,
    pub updated_at: DateTime<Utc>,
}

impl StatusView {
    pub fn is_fetching(&self) -> bool {
        self.state == StatusKind::Fetching
    }
}

/// Owns the status. Only the app loop holds one.
pub struct Presenter {
    status: Status,
    locale: Locale,
    updated_at: DateTime<Utc>,
}

impl Presenter {
    pub fn new(locale: Locale) -> Self {
        Self {
            status: Status::Idle,
            locale,
            updated_at: Utc::now(),
        }
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn begin(&mut self, source: LocationSource) {
        self.set(Status::Fetching(source));
    }

    /// Apply a pipeline result. Every error looks the same to the user.
    pub fn complete(&mut self, source: LocationSource, result: &Result<Fix, LocationError>) {
        match result {
            Ok(fix) => self.set(Status::Resolved(source, *fix)),
            Err(_) => self.set(Status::Failed(source)),
        }
    }

    pub fn deny(&mut self) {
        self.set(Status::PermissionDenied);
    }

    pub fn cancel(&mut self, source: LocationSource) {
        self.set(Status::Cancelled(source));
    }

    pub fn view(&self) -> StatusView {
        StatusView {
            state: self.status.kind(),
            text: self.status.text(self.locale),
            source: self.status.source(),
            fix: self.status.fix(),
            updated_at: self.updated_at,
        }
    }

    fn set(&mut self, status: Status) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}
