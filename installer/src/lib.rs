//! Solr installer library.
//!
//! This crate resolves a download source for Apache Solr releases, reads its
//! directory listing into an ordered version catalog, downloads the selected
//! release archive, and extracts it. It is used by the `solr-installer` CLI
//! binary and can be consumed programmatically with custom fetchers,
//! downloaders, or extractors.
//!
//! # Modules
//!
//! - [`catalog`] - Ordered version catalogs and target selection
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Layered configuration loading and validation
//! - [`dirs`] - Directory resolution abstraction for platform-specific paths
//! - [`download`] - Artefact naming and HTTP download
//! - [`error`] - Top-level error type
//! - [`extraction`] - Zip extraction with path traversal checks
//! - [`list`] - The `list` command
//! - [`list_output`] - Output formatting for version listing
//! - [`listing`] - Listing page retrieval and anchor selection
//! - [`mirror`] - Mirror discovery through the redirector
//! - [`output`] - Progress and summary output
//! - [`pipeline`] - Source resolution and install orchestration
//! - [`version`] - Version parsing from listing entries

pub mod catalog;
pub mod cli;
pub mod config;
pub mod dirs;
pub mod download;
pub mod error;
pub mod extraction;
pub mod list;
pub mod list_output;
pub mod listing;
pub mod mirror;
pub mod output;
pub mod pipeline;
pub mod version;
