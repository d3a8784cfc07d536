//! Where the remote services live.
//!
//! Endpoints and keys are baked in at build time from the environment, e.g.
//! `GRID_WALDO_CLIP_URL=https://clip.example trunk build`.

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ServiceSettings {
    pub clip_url: String,
    pub clip_token: String,
    pub database_url: String,
    pub database_key: String,
}

impl ServiceSettings {
    pub(crate) fn load() -> Self {
        Self {
            clip_url: compiled("GRID_WALDO_CLIP_URL", option_env!("GRID_WALDO_CLIP_URL")),
            clip_token: compiled("GRID_WALDO_CLIP_TOKEN", option_env!("GRID_WALDO_CLIP_TOKEN")),
            database_url: compiled(
                "GRID_WALDO_SUPABASE_URL",
                option_env!("GRID_WALDO_SUPABASE_URL"),
            ),
            database_key: compiled(
                "GRID_WALDO_SUPABASE_KEY",
                option_env!("GRID_WALDO_SUPABASE_KEY"),
            ),
        }
    }
}

fn compiled(key: &str, value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => {
            log::warn!("{key} was not set at build time, requests to it will fail");
            String::new()
        }
    }
}
