// src/render/renderer.rs

// --- Imports ---
use crate::bom::Bom;
use crate::render::helpers::register_helpers;
use crate::utils::error::RenderError;
use handlebars::Handlebars;
use serde::Serialize;
use std::path::{Path, PathBuf};

// --- Constants ---
pub const DEFAULT_TEMPLATE: &str = "project_summary_template";
const TEMPLATE_EXTENSION: &str = "hbs";
// Column width handed to templates when there are no items at all.
const DEFAULT_MAX_LEN: usize = 10;

// Templates compiled into the binary, available without a template directory.
const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    (DEFAULT_TEMPLATE, include_str!("templates/project_summary_template.hbs")),
    ("bom_table_template", include_str!("templates/bom_table_template.hbs")),
];

/// Named inputs every template receives.
#[derive(Debug, Serialize)]
struct ReportContext<'a> {
    bom: &'a Bom,
    title: Option<&'a str>,
    total_cost: f64,
    currency: Option<&'a str>,
    max_len: usize,
}

impl<'a> ReportContext<'a> {
    fn new(bom: &'a Bom) -> Self {
        Self {
            bom,
            title: bom.title(),
            total_cost: bom.total_cost(),
            currency: bom.currency_symbol(),
            max_len: max_item_name_len(bom),
        }
    }
}

/// Length in characters of the longest item name, or the default width
/// when the BOM has no items.
pub fn max_item_name_len(bom: &Bom) -> usize {
    bom.groups()
        .flat_map(|(_, group)| group.items.iter())
        .map(|item| item.item_name.chars().count())
        .max()
        .unwrap_or(DEFAULT_MAX_LEN)
}

/// Renders a [`Bom`] through a named Handlebars template.
///
/// Templates are looked up in the optional template directory first
/// (`<dir>/<name>`, then `<dir>/<name>.hbs`), then among the built-ins.
pub struct BomRenderer {
    registry: Handlebars<'static>,
    template_dir: Option<PathBuf>,
}

impl BomRenderer {
    pub fn new(template_dir: Option<PathBuf>) -> Self {
        let mut registry = Handlebars::new();
        // Reports are plain text.
        registry.register_escape_fn(handlebars::no_escape);
        register_helpers(&mut registry);

        for (name, source) in BUILTIN_TEMPLATES {
            if let Err(e) = registry.register_template_string(name, source) {
                tracing::error!("Built-in template '{}' failed to compile: {}", name, e);
            }
        }

        Self { registry, template_dir }
    }

    /// Renders the report, returning an empty string on any failure.
    ///
    /// The failure is logged; callers treat empty output as "rendering failed".
    pub fn render(&self, bom: &Bom, template: &str) -> String {
        match self.try_render(bom, template) {
            Ok(output) => output,
            Err(e) => {
                tracing::error!("Failed to render template '{}': {}", template, e);
                String::new()
            }
        }
    }

    pub fn try_render(&self, bom: &Bom, template: &str) -> Result<String, RenderError> {
        let context = ReportContext::new(bom);
        tracing::debug!(
            "Rendering '{}' for {} group(s), max_len {}",
            template,
            bom.group_count(),
            context.max_len
        );

        if let Some(path) = self.find_template_file(template) {
            tracing::info!("Using template file: {}", path.display());
            let source = std::fs::read_to_string(&path)
                .map_err(|source| RenderError::TemplateIo { path: path.clone(), source })?;
            return Ok(self.registry.render_template(&source, &context)?);
        }

        if self.registry.has_template(template) {
            tracing::info!("Using built-in template: {}", template);
            return Ok(self.registry.render(template, &context)?);
        }

        Err(RenderError::TemplateNotFound(template.to_string()))
    }

    /// Whether `template` resolves to a file or a built-in.
    pub fn has_template(&self, template: &str) -> bool {
        self.find_template_file(template).is_some() || self.registry.has_template(template)
    }

    fn find_template_file(&self, template: &str) -> Option<PathBuf> {
        let dir = self.template_dir.as_deref()?;
        candidate_paths(dir, template)
            .into_iter()
            .find(|path| path.is_file())
    }
}

impl Default for BomRenderer {
    fn default() -> Self {
        Self::new(None)
    }
}

fn candidate_paths(dir: &Path, template: &str) -> [PathBuf; 2] {
    [
        dir.join(template),
        dir.join(format!("{}.{}", template, TEMPLATE_EXTENSION)),
    ]
}
