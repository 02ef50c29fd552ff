//! Name/code tables for the integer enums embedded in NotebookLM payloads.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Bidirectional mapping between human-readable names and wire codes.
/// Name lookups are case-insensitive.
#[derive(Debug, Clone)]
pub struct CodeMap {
    name_to_code: HashMap<String, i64>,
    code_to_name: HashMap<i64, &'static str>,
}

impl CodeMap {
    pub fn new(entries: &[(&'static str, i64)]) -> Self {
        let mut name_to_code = HashMap::with_capacity(entries.len());
        let mut code_to_name = HashMap::with_capacity(entries.len());
        for (name, code) in entries {
            name_to_code.insert(name.to_lowercase(), *code);
            code_to_name.insert(*code, *name);
        }
        Self {
            name_to_code,
            code_to_name,
        }
    }

    pub fn code(&self, name: &str) -> Option<i64> {
        self.name_to_code.get(&name.to_lowercase()).copied()
    }

    pub fn name(&self, code: i64) -> Option<&'static str> {
        self.code_to_name.get(&code).copied()
    }

    /// Name for `code`, or `unknown_<code>` when the table has no entry.
    pub fn name_or_unknown(&self, code: i64) -> String {
        match self.name(code) {
            Some(name) => name.to_string(),
            None => format!("unknown_{code}"),
        }
    }

    /// Known names, sorted by code.
    pub fn names(&self) -> Vec<&'static str> {
        let mut pairs: Vec<_> = self.code_to_name.iter().collect();
        pairs.sort_by_key(|(code, _)| **code);
        pairs.into_iter().map(|(_, name)| *name).collect()
    }
}

pub static CHAT_GOALS: Lazy<CodeMap> =
    Lazy::new(|| CodeMap::new(&[("default", 1), ("custom", 2), ("learning_guide", 3)]));

pub static RESPONSE_LENGTHS: Lazy<CodeMap> =
    Lazy::new(|| CodeMap::new(&[("default", 1), ("longer", 4), ("shorter", 5)]));

pub static RESEARCH_SOURCES: Lazy<CodeMap> =
    Lazy::new(|| CodeMap::new(&[("web", 1), ("drive", 2)]));

pub static RESEARCH_MODES: Lazy<CodeMap> = Lazy::new(|| CodeMap::new(&[("fast", 1), ("deep", 5)]));

pub static SOURCE_TYPES: Lazy<CodeMap> = Lazy::new(|| {
    CodeMap::new(&[
        ("google_docs", 1),
        ("google_slides_sheets", 2),
        ("pdf", 3),
        ("pasted_text", 4),
        ("web_page", 5),
        ("generated_text", 8),
        ("youtube", 9),
        ("uploaded_file", 11),
        ("image", 13),
        ("word_doc", 14),
    ])
});

pub static STUDIO_TYPES: Lazy<CodeMap> = Lazy::new(|| {
    CodeMap::new(&[
        ("audio", 1),
        ("report", 2),
        ("video", 3),
        ("flashcards", 4),
        ("infographic", 7),
        ("slide_deck", 8),
        ("data_table", 9),
    ])
});

pub static AUDIO_FORMATS: Lazy<CodeMap> = Lazy::new(|| {
    CodeMap::new(&[
        ("deep_dive", 1),
        ("brief", 2),
        ("critique", 3),
        ("debate", 4),
    ])
});

pub static AUDIO_LENGTHS: Lazy<CodeMap> =
    Lazy::new(|| CodeMap::new(&[("short", 1), ("default", 2), ("long", 3)]));

pub static VIDEO_FORMATS: Lazy<CodeMap> =
    Lazy::new(|| CodeMap::new(&[("explainer", 1), ("brief", 2)]));

pub static VIDEO_STYLES: Lazy<CodeMap> = Lazy::new(|| {
    CodeMap::new(&[
        ("auto_select", 1),
        ("custom", 2),
        ("classic", 3),
        ("whiteboard", 4),
        ("kawaii", 5),
        ("anime", 6),
        ("watercolor", 7),
        ("retro_print", 8),
        ("heritage", 9),
        ("paper_craft", 10),
    ])
});

pub static INFOGRAPHIC_ORIENTATIONS: Lazy<CodeMap> =
    Lazy::new(|| CodeMap::new(&[("landscape", 1), ("portrait", 2), ("square", 3)]));

pub static INFOGRAPHIC_DETAILS: Lazy<CodeMap> =
    Lazy::new(|| CodeMap::new(&[("concise", 1), ("standard", 2), ("detailed", 3)]));

pub static SLIDE_DECK_FORMATS: Lazy<CodeMap> =
    Lazy::new(|| CodeMap::new(&[("detailed_deck", 1), ("presenter_slides", 2)]));

pub static SLIDE_DECK_LENGTHS: Lazy<CodeMap> =
    Lazy::new(|| CodeMap::new(&[("short", 1), ("default", 3)]));

pub static FLASHCARD_DIFFICULTIES: Lazy<CodeMap> =
    Lazy::new(|| CodeMap::new(&[("easy", 1), ("medium", 2), ("hard", 3)]));

pub static SHARE_ROLES: Lazy<CodeMap> =
    Lazy::new(|| CodeMap::new(&[("owner", 1), ("editor", 2), ("viewer", 3)]));

pub static SHARE_ACCESS: Lazy<CodeMap> =
    Lazy::new(|| CodeMap::new(&[("restricted", 0), ("public", 1)]));

pub static EXPORT_TYPES: Lazy<CodeMap> = Lazy::new(|| CodeMap::new(&[("docs", 1), ("sheets", 2)]));

/// Table names accepted by [`table`].
pub const TABLE_NAMES: &[&str] = &[
    "chat_goals",
    "response_lengths",
    "research_sources",
    "research_modes",
    "source_types",
    "studio_types",
    "audio_formats",
    "audio_lengths",
    "video_formats",
    "video_styles",
    "infographic_orientations",
    "infographic_details",
    "slide_deck_formats",
    "slide_deck_lengths",
    "flashcard_difficulties",
    "share_roles",
    "share_access",
    "export_types",
];

/// Look up a code table by name, case-insensitively, accepting `-` for `_`.
pub fn table(name: &str) -> Option<&'static CodeMap> {
    let map: &'static Lazy<CodeMap> = match name.to_lowercase().replace('-', "_").as_str() {
        "chat_goals" => &CHAT_GOALS,
        "response_lengths" => &RESPONSE_LENGTHS,
        "research_sources" => &RESEARCH_SOURCES,
        "research_modes" => &RESEARCH_MODES,
        "source_types" => &SOURCE_TYPES,
        "studio_types" => &STUDIO_TYPES,
        "audio_formats" => &AUDIO_FORMATS,
        "audio_lengths" => &AUDIO_LENGTHS,
        "video_formats" => &VIDEO_FORMATS,
        "video_styles" => &VIDEO_STYLES,
        "infographic_orientations" => &INFOGRAPHIC_ORIENTATIONS,
        "infographic_details" => &INFOGRAPHIC_DETAILS,
        "slide_deck_formats" => &SLIDE_DECK_FORMATS,
        "slide_deck_lengths" => &SLIDE_DECK_LENGTHS,
        "flashcard_difficulties" => &FLASHCARD_DIFFICULTIES,
        "share_roles" => &SHARE_ROLES,
        "share_access" => &SHARE_ACCESS,
        "export_types" => &EXPORT_TYPES,
        _ => return None,
    };
    Some(Lazy::force(map))
}
