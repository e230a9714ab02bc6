//! Template rendering for connection strings and query bodies.
//!
//! Each [`TemplateRenderer`] owns its own handlebars registry. Built-in
//! helpers are registered first and caller helpers after them, so a caller
//! helper with a built-in's name replaces it. The registry is never touched
//! again after construction.

use std::fmt;

use handlebars::{
    no_escape, Context, Handlebars, HelperDef, RenderContext, RenderError, Renderable,
    StringOutput, Template,
};
use serde::Serialize;
use tracing::trace;

use crate::error::TemplateFailure;

mod builtin {
    use handlebars::handlebars_helper;

    handlebars_helper!(json: |value: Json| value.to_string());
    handlebars_helper!(add: |a: i64, b: i64| a.saturating_add(b));
    handlebars_helper!(subtract: |a: i64, b: i64| a.saturating_sub(b));
    handlebars_helper!(multiply: |a: i64, b: i64| a.saturating_mul(b));
    handlebars_helper!(page_offset: |page: u64, size: u64| page.saturating_sub(1).saturating_mul(size));
}

/// Named helpers to register on a renderer.
#[derive(Default)]
pub struct HelperRegistry {
    helpers: Vec<(String, Box<dyn HelperDef + Send + Sync>)>,
}

impl HelperRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to add a helper. Later helpers win on name collision.
    pub fn with_helper(
        mut self,
        name: impl Into<String>,
        helper: impl HelperDef + Send + Sync + 'static,
    ) -> Self {
        self.helpers.push((name.into(), Box::new(helper)));
        self
    }

    /// Names of the registered helpers, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.helpers.iter().map(|(name, _)| name.as_str())
    }

    /// Number of registered helpers.
    pub fn len(&self) -> usize {
        self.helpers.len()
    }

    /// Returns true if no helpers are registered.
    pub fn is_empty(&self) -> bool {
        self.helpers.is_empty()
    }
}

impl fmt::Debug for HelperRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Renderer behavior switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RendererOptions {
    /// Fail renders that reference missing variables.
    pub strict: bool,
}

/// Compiles and renders templates against a route context.
pub struct TemplateRenderer {
    registry: Handlebars<'static>,
    options: RendererOptions,
}

impl TemplateRenderer {
    /// Create a renderer with the built-in helpers and the given extras.
    pub fn new(helpers: HelperRegistry) -> Self {
        Self::with_options(helpers, RendererOptions::default())
    }

    /// Create a renderer with explicit options.
    pub fn with_options(helpers: HelperRegistry, options: RendererOptions) -> Self {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(options.strict);
        registry.register_escape_fn(no_escape);

        registry.register_helper("json", Box::new(builtin::json));
        registry.register_helper("add", Box::new(builtin::add));
        registry.register_helper("subtract", Box::new(builtin::subtract));
        registry.register_helper("multiply", Box::new(builtin::multiply));
        registry.register_helper("pageOffset", Box::new(builtin::page_offset));

        for (name, helper) in helpers.helpers {
            trace!(helper = %name, "Registering template helper");
            registry.register_helper(&name, helper);
        }

        Self { registry, options }
    }

    /// Options this renderer was built with.
    pub fn options(&self) -> RendererOptions {
        self.options
    }

    /// Parse a template source once so it can be rendered repeatedly.
    pub fn compile<'a>(&'a self, source: &'a str) -> Result<CompiledTemplate<'a>, TemplateFailure> {
        let template = Template::compile(source)?;
        Ok(CompiledTemplate {
            registry: &self.registry,
            template,
            source,
        })
    }

    /// Compile and render in one step.
    pub fn render<T: Serialize>(&self, source: &str, context: &T) -> Result<String, TemplateFailure> {
        self.compile(source)?.render(context)
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new(HelperRegistry::new())
    }
}

impl fmt::Debug for TemplateRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateRenderer")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// A parsed template bound to the renderer that compiled it.
#[derive(Clone)]
pub struct CompiledTemplate<'a> {
    registry: &'a Handlebars<'static>,
    template: Template,
    source: &'a str,
}

impl CompiledTemplate<'_> {
    /// Render against a context using the renderer's helpers and options.
    pub fn render<T: Serialize>(&self, context: &T) -> Result<String, TemplateFailure> {
        let context = Context::wraps(context)?;
        let mut render_context = RenderContext::new(None);
        let mut out = StringOutput::new();
        self.template
            .render(self.registry, &context, &mut render_context, &mut out)?;
        Ok(out.into_string().map_err(RenderError::from)?)
    }

    /// The template source.
    pub fn source(&self) -> &str {
        self.source
    }
}
