use std::path::Path;

use anyhow::anyhow;
use config::{Config, File};
use serde::Deserialize;

/// Engine settings, layered from the user's config directory and the vault root.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Show note previews on hover and in completion documentation.
    pub hover: bool,
    pub diagnostics: bool,
    /// Upper bound on findings published for one document.
    pub max_diagnostics: usize,
    /// Skip dot-files and dot-directories while indexing.
    pub ignore_hidden: bool,
    pub code_actions: bool,
}

impl Settings {
    pub fn new(root_dir: &Path) -> anyhow::Result<Settings> {
        let expanded = shellexpand::tilde("~/.config/wikivault/settings");
        let settings = Config::builder()
            .add_source(File::with_name(&expanded).required(false))
            .add_source(
                File::with_name(&format!(
                    "{}/.wikivault",
                    root_dir
                        .to_str()
                        .ok_or(anyhow!("Can't convert root_dir to str"))?
                ))
                .required(false),
            )
            .set_default("hover", true)?
            .set_default("diagnostics", true)?
            .set_default("max_diagnostics", 1000_i64)?
            .set_default("ignore_hidden", true)?
            .set_default("code_actions", true)?
            .build()
            .map_err(|err| anyhow!("Build err: {err}"))?;

        let settings = settings.try_deserialize::<Settings>()?;

        anyhow::Ok(settings)
    }

    /// Like [`Settings::new`], but an unreadable settings file is logged and ignored.
    pub fn load_or_default(root_dir: &Path) -> Settings {
        Settings::new(root_dir).unwrap_or_else(|err| {
            tracing::warn!(%err, "falling back to default settings");
            Settings::default()
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            hover: true,
            diagnostics: true,
            max_diagnostics: 1000,
            ignore_hidden: true,
            code_actions: true,
        }
    }
}
