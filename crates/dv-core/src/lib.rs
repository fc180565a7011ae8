//! Detail View Core Library
//!
//! This library turns arbitrary objects into detail pages:
//! - Value resolution and formatting of column descriptors
//! - Record and table builders with row limits and row actions
//! - Per-request render passes issuing lazy fragment keys
//! - Route derivation and fragment dispatch
//! - A detail site with an HTTP surface, logging and configuration
//!
//! The binary entry point is in `main.rs`.

pub mod autolink;
pub mod builder;
pub mod config;
pub mod demo;
pub mod dispatch;
pub mod exit_codes;
pub mod format;
pub mod lazy;
pub mod logging;
pub mod resolve;
pub mod routes;
pub mod server;
pub mod site;

pub use autolink::AutolinkPolicy;
pub use builder::{build_record, build_table, DetailsOptions, LazyLoad, RowAction, TableOptions};
pub use config::{DisplayConfig, ServerConfig, SiteConfig};
pub use dispatch::{DetailViewDef, DispatchState, Fragment, FragmentDispatcher, ObjectStore};
pub use format::{Formatter, FormatterRegistry};
pub use lazy::{LazyKeyRegistry, RenderPass};
pub use resolve::ValueResolver;
pub use routes::{RouteAction, RouteMatch, Routes};
pub use server::{DetailServer, ServerError};
pub use site::{DetailSite, SiteResponse};
