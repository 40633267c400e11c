use super::{RouteRegistry, Template, TemplateConfig, TemplateError, TemplateMeta};

/// Fills the read path and page length of a template
pub struct Structure<'a> {
    template: &'a mut Template,
    meta: &'a mut TemplateMeta,
    routes: &'a RouteRegistry,
    config: &'a TemplateConfig,
}

impl<'a> Structure<'a> {
    pub fn new(
        template: &'a mut Template,
        meta: &'a mut TemplateMeta,
        routes: &'a RouteRegistry,
        config: &'a TemplateConfig,
    ) -> Self {
        Self {
            template,
            meta,
            routes,
            config,
        }
    }

    pub fn build(self) -> Result<(), TemplateError> {
        let route = self.template.data_route();
        let read_path = self
            .routes
            .path(&route)
            .ok_or(TemplateError::UnknownRoute(route.clone()))?;

        let length_menu = self
            .template
            .length_menu
            .get_or_insert_with(|| self.config.length_menu.clone());
        let length = *length_menu.first().ok_or(TemplateError::EmptyLengthMenu)?;

        self.template.read_path = Some(read_path.to_string());
        self.meta.length = Some(length);

        tracing::trace!(%route, read_path, length, "Template structure built");
        Ok(())
    }
}
