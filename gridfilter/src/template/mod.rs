//! Grid template structure
//!
//! A grid template is the static description a client loads before it sends
//! data requests. [`Structure`] fills in the parts that depend on the
//! deployment: the path data is read from and the initial page length.

mod structure;

pub use structure::Structure;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::constants::DEFAULT_LENGTH_MENU;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("No route named '{0}'")]
    UnknownRoute(String),

    #[error("Length menu is empty")]
    EmptyLengthMenu,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub route_prefix: String,
    pub data_route_suffix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_menu: Option<Vec<u32>>,
}

impl Template {
    pub fn new(route_prefix: impl Into<String>, data_route_suffix: impl Into<String>) -> Self {
        Self {
            route_prefix: route_prefix.into(),
            data_route_suffix: data_route_suffix.into(),
            ..Default::default()
        }
    }

    /// Name of the route serving grid data
    pub fn data_route(&self) -> String {
        format!("{}.{}", self.route_prefix, self.data_route_suffix)
    }
}

/// Per-request grid state sent alongside the template
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TemplateMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
}

/// Named routes and the paths they serve
#[derive(Debug, Clone, Default)]
pub struct RouteRegistry {
    routes: FxHashMap<String, String>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, path: impl Into<String>) -> &mut Self {
        self.routes.insert(name.into(), path.into());
        self
    }

    pub fn path(&self, name: &str) -> Option<&str> {
        self.routes.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TemplateConfig {
    pub length_menu: Vec<u32>,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            length_menu: DEFAULT_LENGTH_MENU.to_vec(),
        }
    }
}
