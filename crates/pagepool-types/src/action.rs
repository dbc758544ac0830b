//! The closed `PageAction` enumeration and the request envelope used to
//! dispatch one action against a `PageSession`.

use crate::error::PoolError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Every action a `PageSession` can perform. Closed: adding a new kind of
/// browser operation means adding a variant here, not inventing a new type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageAction {
    Click,
    Authenticate,
    SetUserAgent,
    Screenshot,
    Goto,
    GoBack,
    GoForward,
    Evaluate,
    ExtractPageContents,
    ExposeFunction,
    RemoveFunction,
    SetViewport,
    SetGeolocation,
    ClearGeolocation,
    AddScriptTag,
    RemoveScriptTag,
    EvaluateHandle,
    EvaluateOnNewDocument,
    SetCookie,
    DeleteCookie,
    EmulateMedia,
    StartJsCoverage,
    StopJsCoverage,
    GetPageMetrics,
    GetAccessibilityTree,
    SetContent,
    SetExtraHttpHeaders,
    SaveSnapshot,
    RestoreSnapshot,
}

impl PageAction {
    pub const ALL: &'static [PageAction] = &[
        PageAction::Click,
        PageAction::Authenticate,
        PageAction::SetUserAgent,
        PageAction::Screenshot,
        PageAction::Goto,
        PageAction::GoBack,
        PageAction::GoForward,
        PageAction::Evaluate,
        PageAction::ExtractPageContents,
        PageAction::ExposeFunction,
        PageAction::RemoveFunction,
        PageAction::SetViewport,
        PageAction::SetGeolocation,
        PageAction::ClearGeolocation,
        PageAction::AddScriptTag,
        PageAction::RemoveScriptTag,
        PageAction::EvaluateHandle,
        PageAction::EvaluateOnNewDocument,
        PageAction::SetCookie,
        PageAction::DeleteCookie,
        PageAction::EmulateMedia,
        PageAction::StartJsCoverage,
        PageAction::StopJsCoverage,
        PageAction::GetPageMetrics,
        PageAction::GetAccessibilityTree,
        PageAction::SetContent,
        PageAction::SetExtraHttpHeaders,
        PageAction::SaveSnapshot,
        PageAction::RestoreSnapshot,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PageAction::Click => "click",
            PageAction::Authenticate => "authenticate",
            PageAction::SetUserAgent => "set_user_agent",
            PageAction::Screenshot => "screenshot",
            PageAction::Goto => "goto",
            PageAction::GoBack => "go_back",
            PageAction::GoForward => "go_forward",
            PageAction::Evaluate => "evaluate",
            PageAction::ExtractPageContents => "extract_page_contents",
            PageAction::ExposeFunction => "expose_function",
            PageAction::RemoveFunction => "remove_function",
            PageAction::SetViewport => "set_viewport",
            PageAction::SetGeolocation => "set_geolocation",
            PageAction::ClearGeolocation => "clear_geolocation",
            PageAction::AddScriptTag => "add_script_tag",
            PageAction::RemoveScriptTag => "remove_script_tag",
            PageAction::EvaluateHandle => "evaluate_handle",
            PageAction::EvaluateOnNewDocument => "evaluate_on_new_document",
            PageAction::SetCookie => "set_cookie",
            PageAction::DeleteCookie => "delete_cookie",
            PageAction::EmulateMedia => "emulate_media",
            PageAction::StartJsCoverage => "start_js_coverage",
            PageAction::StopJsCoverage => "stop_js_coverage",
            PageAction::GetPageMetrics => "get_page_metrics",
            PageAction::GetAccessibilityTree => "get_accessibility_tree",
            PageAction::SetContent => "set_content",
            PageAction::SetExtraHttpHeaders => "set_extra_http_headers",
            PageAction::SaveSnapshot => "save_snapshot",
            PageAction::RestoreSnapshot => "restore_snapshot",
        }
    }
}

/// One dispatched action: the kind, its raw JSON params, and the
/// cross-cutting `returnPageContents` option.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionRequest {
    pub action: PageAction,
    #[serde(default, rename = "returnPageContents")]
    pub return_page_contents: bool,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl ActionRequest {
    pub fn required_str(&self, key: &str) -> Result<String, PoolError> {
        self.params
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                PoolError::bad_params(self.action.as_str(), format!("missing required '{key}'"))
            })
    }

    pub fn optional_str(&self, key: &str) -> Option<String> {
        self.params.get(key).and_then(Value::as_str).map(str::to_string)
    }

    pub fn optional_bool(&self, key: &str) -> Option<bool> {
        self.params.get(key).and_then(Value::as_bool)
    }

    pub fn optional_u64(&self, key: &str) -> Option<u64> {
        self.params.get(key).and_then(Value::as_u64)
    }

    /// Validate that every parameter required by this action's contract is
    /// present, without yet executing the action.
    pub fn validate(&self) -> Result<(), PoolError> {
        match self.action {
            PageAction::Click => {
                self.required_str("selector")?;
            }
            PageAction::Goto => {
                self.required_str("url")?;
            }
            PageAction::Evaluate => {
                self.required_str("code")?;
            }
            PageAction::SetUserAgent => {
                self.required_str("userAgent")?;
            }
            PageAction::SetCookie | PageAction::DeleteCookie => {
                self.required_str("name")?;
            }
            PageAction::AddScriptTag | PageAction::RemoveScriptTag => {
                self.required_str("url")
                    .or_else(|_| self.required_str("content"))?;
            }
            PageAction::SetContent => {
                self.required_str("html")?;
            }
            PageAction::ExposeFunction | PageAction::RemoveFunction => {
                self.required_str("name")?;
            }
            PageAction::EmulateMedia => {
                self.required_str("media")?;
            }
            PageAction::RestoreSnapshot => {
                self.required_str("snapshotId").or_else(|_| {
                    if self.params.contains_key("snapshot") {
                        Ok(String::new())
                    } else {
                        Err(PoolError::bad_params(
                            self.action.as_str(),
                            "missing required 'snapshot' or 'snapshotId'",
                        ))
                    }
                })?;
            }
            // Remaining actions (screenshot, go_back, go_forward,
            // extract_page_contents, viewport/geolocation toggles, coverage,
            // metrics, accessibility tree, save_snapshot, evaluate_handle,
            // evaluate_on_new_document, set_extra_http_headers) take only
            // optional parameters.
            _ => {}
        }
        Ok(())
    }
}
