//! quire - a static site generator with cascading layouts, page reference
//! resolution and Go-style templates.
//!
//! The build is driven by [`site::Site`]: content comes from a
//! [`page::source::ContentSource`], templates from a
//! [`template::TemplateSource`] and output goes to a [`site::Sink`].

pub mod cli;
pub mod config;
pub mod diagnostic;
pub mod layout;
pub mod logger;
pub mod page;
pub mod site;
pub mod template;
pub mod utils;
