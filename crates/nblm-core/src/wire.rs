//! Fixed values of the batchexecute dialect spoken by the NotebookLM frontend.

/// The NotebookLM origin. Also used as the `Origin` / `Referer` header value.
pub const BASE_URL: &str = "https://notebooklm.google.com";

/// Batched RPC endpoint.
pub const BATCH_EXECUTE_PATH: &str = "/_/LabsTailwindUi/data/batchexecute";

/// Streaming chat endpoint used by `Query`.
pub const STREAM_QUERY_PATH: &str = "/_/LabsTailwindUi/data/google.internal.labs.tailwind.orchestration.v1.LabsTailwindOrchestrationService/GenerateFreeFormStreamed";

/// Frontend build identifier sent as `bl`. Bumped with NotebookLM releases and
/// overridable through configuration.
pub const DEFAULT_BUILD_LABEL: &str = "boq_labs-tailwind-frontend_20260108.06_p0";

/// Locale sent as `hl`.
pub const LOCALE: &str = "en";

/// Anti-XSSI prefix that precedes every response body.
pub const XSSI_PREFIX: &str = ")]}'";

/// First element of every response entry carrying an RPC result.
pub const RESPONSE_MARKER: &str = "wrb.fr";

/// Fourth element of every envelope entry.
pub const ENVELOPE_TAG: &str = "generic";

pub const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko)";

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=UTF-8";

/// Source path (page context) for calls scoped to one notebook.
pub fn notebook_path(notebook_id: &str) -> String {
    format!("/notebook/{notebook_id}")
}

/// RPC identifiers, captured from the web UI's network traffic.
pub mod rpc {
    // Notebooks
    pub const LIST_NOTEBOOKS: &str = "wXbhsf";
    pub const GET_NOTEBOOK: &str = "rLM1Ne";
    pub const CREATE_NOTEBOOK: &str = "CCqFvf";
    /// Rename and chat configuration share this id.
    pub const UPDATE_NOTEBOOK: &str = "s0tc2d";
    pub const DELETE_NOTEBOOK: &str = "WWINqb";

    // Sources
    pub const ADD_SOURCE: &str = "izAoDd";
    pub const GET_SOURCE: &str = "hizoJc";
    pub const SYNC_SOURCE: &str = "FLmJqe";
    pub const DELETE_SOURCE: &str = "tGMBJ";

    // Research
    pub const START_FAST_RESEARCH: &str = "Ljjv0c";
    pub const START_DEEP_RESEARCH: &str = "QA9ei";
    pub const POLL_RESEARCH: &str = "e3bVqc";
    pub const IMPORT_SOURCES: &str = "LBwxtb";

    // Studio
    pub const CREATE_STUDIO: &str = "R7cb6c";
    pub const POLL_STUDIO: &str = "gArtLc";
    pub const DELETE_STUDIO: &str = "V5N4be";
    pub const RENAME_STUDIO: &str = "rc3d8d";

    // Mind maps share ids with notes.
    pub const SAVE_MIND_MAP: &str = "CYK0Xb";
    pub const LIST_MIND_MAPS: &str = "cFji9";
    pub const DELETE_MIND_MAP: &str = "AH0mwd";
    pub const UPDATE_NOTE: &str = "cYAfTb";

    pub const NOTEBOOK_SUMMARY: &str = "VfAZjd";
    pub const SOURCE_GUIDE: &str = "tr032e";

    pub const SET_SHARING: &str = "QDyure";
    pub const GET_SHARE_STATUS: &str = "JFMDGd";

    pub const EXPORT: &str = "Krh3pd";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notebook_path_prefixes_id() {
        assert_eq!(notebook_path("abc-123"), "/notebook/abc-123");
    }

    #[test]
    fn endpoints_are_relative_paths() {
        assert!(BATCH_EXECUTE_PATH.starts_with("/_/"));
        assert!(STREAM_QUERY_PATH.ends_with("GenerateFreeFormStreamed"));
    }
}
