#![doc = "rstgen-core: page-tree generation logic for rstgen."]

//! This crate holds everything that turns a source tree into a tree of
//! reStructuredText pages: the exclusion rules, the symbol extractor, the
//! directory walker, the page emitter, toctree linking and root index
//! composition. The `rstgen` binary crate only parses arguments and settings.
//!
//! # Usage
//! Build a [`config::GeneratorConfig`] once and hand it to
//! [`generate::generate`].

pub mod config;
pub mod contract;
pub mod emit;
pub mod extract;
pub mod generate;
pub mod index;
pub mod rules;
pub mod stage;
pub mod toctree;
pub mod walk;
