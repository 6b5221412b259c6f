//! Screen state that survives failed refreshes.
//!
//! A fetch failure never clears what is already shown; it records a
//! dismissible notice instead.

use hub_shared::HubError;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub detail: String,
}

impl Notice {
    pub fn success(title: &str, detail: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Success, title: title.to_string(), detail: detail.into() }
    }

    pub fn error(title: &str, err: &HubError) -> Self {
        Self { kind: NoticeKind::Error, title: title.to_string(), detail: err.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState<T> {
    data: Option<T>,
    notice: Option<Notice>,
    loading: bool,
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        Self { data: None, notice: None, loading: false }
    }
}

impl<T> ViewState<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) {
        self.loading = true;
    }

    /// Replace data on success; keep it and post a notice on failure
    pub fn apply(&mut self, title: &str, result: Result<T, HubError>) -> bool {
        self.loading = false;
        match result {
            Ok(data) => {
                self.data = Some(data);
                true
            }
            Err(e) => {
                if e.is_transient() {
                    error!("{}: {}", title, e);
                } else {
                    warn!("{}: {}", title, e);
                }
                self.notice = Some(Notice::error(title, &e));
                false
            }
        }
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn notify(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    pub fn dismiss(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }
}
