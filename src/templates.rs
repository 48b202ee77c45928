use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::response::Html;
use tera::{Context, Tera};
use tracing::{debug, error};

use crate::error::AppError;

/// Templates compiled into the binary, keyed by the name views render them under.
const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("account/login.html", include_str!("../templates/account/login.html")),
    ("account/dashboard.html", include_str!("../templates/account/dashboard.html")),
    ("account/register.html", include_str!("../templates/account/register.html")),
    ("account/register_done.html", include_str!("../templates/account/register_done.html")),
    ("account/edit.html", include_str!("../templates/account/edit.html")),
    ("registration/logged_out.html", include_str!("../templates/registration/logged_out.html")),
    (
        "registration/password_change_form.html",
        include_str!("../templates/registration/password_change_form.html"),
    ),
    (
        "registration/password_change_done.html",
        include_str!("../templates/registration/password_change_done.html"),
    ),
];

fn builtin_tera() -> Result<Tera, AppError> {
    let mut tera = Tera::default();
    tera.add_raw_templates(BUILTIN_TEMPLATES.iter().copied())?;
    Ok(tera)
}

fn collect_html_files(
    root: &Path,
    dir: &Path,
    files: &mut Vec<(PathBuf, Option<String>)>,
) -> Result<(), AppError> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_html_files(root, &path, files)?;
        } else if path.extension().is_some_and(|ext| ext == "html") {
            let name = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            files.push((path, Some(name)));
        }
    }
    Ok(())
}

/// Compiled page templates. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Templates {
    tera: Arc<Tera>,
}

impl Templates {
    pub fn builtin() -> Result<Self, AppError> {
        Ok(Self {
            tera: Arc::new(builtin_tera()?),
        })
    }

    /// Built-in templates overridden by the `.html` files under `dir`.
    ///
    /// A file is registered under its path relative to `dir`, so
    /// `dir/account/login.html` replaces `account/login.html`.
    pub fn from_dir(dir: &Path) -> Result<Self, AppError> {
        let mut files = Vec::new();
        collect_html_files(dir, dir, &mut files)?;
        debug!("Loading {} template override(s) from {}", files.len(), dir.display());

        let mut tera = builtin_tera()?;
        tera.add_template_files(files)?;
        Ok(Self { tera: Arc::new(tera) })
    }

    pub fn render(&self, name: &str, context: &Context) -> Result<Html<String>, AppError> {
        self.tera.render(name, context).map(Html).map_err(|e| {
            error!("Failed to render template '{}': {:?}", name, e);
            AppError::from(e)
        })
    }
}
