mod authenticate;
mod legacy;
mod plugin;
mod standard;

#[cfg(test)]
pub(crate) use plugin::ApiKeyAuth;
pub(crate) use plugin::{AuthPlugin, AuthSystemRegistry};
