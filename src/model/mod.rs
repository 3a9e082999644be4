//! # Resource Model
//!
//! The application-facing description of resources: path templates,
//! resource methods with their consumed/produced media types, sub-resource
//! locators and child resources. The routing module compiles this model into
//! a routing tree; [`validate`] reports problems into an
//! [`ErrorScope`](crate::errors::ErrorScope) before that happens.
//!
//! Sub-resource locators return a [`LocatorTarget`]:
//!
//! - [`LocatorTarget::Class`] - static metadata, always cached by class identity
//! - [`LocatorTarget::Instance`] - an object whose identity may be cached
//! - [`LocatorTarget::Model`] - a programmatic [`Resource`]

mod core;
mod error;
mod validation;


pub use self::core::{
    LocatorTarget, MethodKind, Resource, ResourceClass, ResourceInstance, ResourceMethod,
    ResourceMethodBuilder, SubResourceLocator,
};
pub use error::ModelError;
pub use validation::{validate, validate_sub_resource};
