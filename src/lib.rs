//! page-locale-runtime
//!
//! Client-side localization runtime: an expiring locale preference, a read-only
//! translation registry, directive-driven document translation and locale
//! selector synchronization.

pub mod config;
pub mod directive;
pub mod dom;
pub mod engine;
pub mod locale;
pub mod registry;
pub mod runtime;
pub mod selector;
pub mod store;

#[cfg(test)]
mod test_utils;

// LocaleRuntime を再エクスポート
pub use runtime::{
    InitStatus,
    LocaleRuntime,
};
