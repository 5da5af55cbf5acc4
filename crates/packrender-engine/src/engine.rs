//! Template engine based on MiniJinja

use minijinja::Environment;
use packrender_core::{LoadedPack, TemplateContext};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::error::{EngineError, Result, TemplateError};
use crate::filters;
use crate::functions;

/// Rendered text keyed by output path (`<pack>/templates/<file>`)
pub type RenderedDocuments = BTreeMap<String, String>;

pub struct EngineBuilder {
    strict_mode: bool,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self { strict_mode: true }
    }

    /// Fail on undefined variables
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    pub fn build(self) -> Engine {
        Engine::new(self.strict_mode)
    }
}

pub struct Engine {
    strict_mode: bool,
}

impl Engine {
    pub fn new(strict_mode: bool) -> Self {
        Self { strict_mode }
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    fn create_environment(&self) -> Environment<'static> {
        let mut env = Environment::new();

        env.set_undefined_behavior(if self.strict_mode {
            minijinja::UndefinedBehavior::Strict
        } else {
            minijinja::UndefinedBehavior::Lenient
        });

        env.add_filter("toyaml", filters::toyaml);
        env.add_filter("tojson", filters::tojson);
        env.add_filter("b64encode", filters::b64encode);
        env.add_filter("b64decode", filters::b64decode);
        env.add_filter("quote", filters::quote);
        env.add_filter("squote", filters::squote);
        env.add_filter("nindent", filters::nindent);
        env.add_filter("indent", filters::indent);
        env.add_filter("required", filters::required);
        env.add_filter("trunc", filters::trunc);
        env.add_filter("trimprefix", filters::trimprefix);
        env.add_filter("trimsuffix", filters::trimsuffix);
        env.add_filter("sha256", filters::sha256);

        env.add_function("fail", functions::fail);
        env.add_function("dict", functions::dict);
        env.add_function("list", functions::list);
        env.add_function("ternary", functions::ternary);
        env.add_function("now", functions::now);

        env
    }

    /// Render one template string under `template_name`
    pub fn render_string(
        &self,
        template: &str,
        context: &TemplateContext,
        template_name: &str,
    ) -> Result<String> {
        let mut env = self.create_environment();
        let source_of = |_: &str| Some(template);

        env.add_template_owned(template_name.to_string(), template.to_string())
            .map_err(|e| TemplateError::from_minijinja(&e, template_name, source_of))?;

        let tmpl = env
            .get_template(template_name)
            .map_err(|e| TemplateError::from_minijinja(&e, template_name, source_of))?;

        tmpl.render(context)
            .map_err(|e| TemplateError::from_minijinja(&e, template_name, source_of).into())
    }

    /// Expand every template of a pack.
    ///
    /// All files are registered first so partials (`_*.tpl`) can be included or
    /// imported by path relative to the including template. Partials are never
    /// emitted, and outputs that are blank or a lone `---` are dropped.
    pub fn render_pack(
        &self,
        pack: &LoadedPack,
        context: &TemplateContext,
    ) -> Result<RenderedDocuments> {
        let template_files = pack.template_files()?;
        let base_path = format!("{}/templates", pack.name());

        let mut env = self.create_environment();
        let prefix = format!("{}/", base_path);
        env.set_path_join_callback(move |name, parent| {
            if name.starts_with(prefix.as_str()) {
                return Cow::Borrowed(name);
            }
            let mut segments: Vec<&str> = parent.split('/').collect();
            segments.pop();
            for segment in name.split('/') {
                match segment {
                    "" | "." => {}
                    ".." => {
                        segments.pop();
                    }
                    other => segments.push(other),
                }
            }
            Cow::Owned(segments.join("/"))
        });

        let mut sources: HashMap<String, String> = HashMap::new();
        let mut renderable = Vec::new();

        for file_path in &template_files {
            let rel_path = file_path
                .strip_prefix(&pack.templates_dir)
                .unwrap_or(file_path);
            let name = format!("{}/{}", base_path, slash_path(rel_path));
            let content = std::fs::read_to_string(file_path)?;

            if !is_partial(rel_path) {
                renderable.push(name.clone());
            }
            sources.insert(name.clone(), content.clone());

            env.add_template_owned(name.clone(), content).map_err(|e| {
                TemplateError::from_minijinja(&e, &name, |n| sources.get(n).map(String::as_str))
            })?;
        }

        let mut rendered = RenderedDocuments::new();

        for name in &renderable {
            let to_error = |e: minijinja::Error| -> EngineError {
                TemplateError::from_minijinja(&e, name, |n| sources.get(n).map(String::as_str))
                    .into()
            };

            let tmpl = env.get_template(name).map_err(to_error)?;
            let output = tmpl
                .render(context.for_template(name, &base_path))
                .map_err(to_error)?;

            let trimmed = output.trim();
            if trimmed.is_empty() || trimmed == "---" {
                tracing::debug!(template = %name, "skipping empty output");
                continue;
            }

            rendered.insert(output_name(name).to_string(), output);
        }

        tracing::debug!(
            pack = pack.name(),
            documents = rendered.len(),
            "rendered pack"
        );
        Ok(rendered)
    }
}

/// Relative path with `/` separators on every platform
fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_partial(rel_path: &Path) -> bool {
    rel_path
        .file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with('_'))
}

/// Output key for a template, dropping the Jinja extension
fn output_name(template_name: &str) -> &str {
    template_name
        .strip_suffix(".j2")
        .or_else(|| template_name.strip_suffix(".jinja2"))
        .unwrap_or(template_name)
}
