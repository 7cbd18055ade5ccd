//! Side-by-side diffs of two file versions rendered as standalone HTML.
//!
//! [`view::DiffView`] is the entry point: it diffs the two texts, builds one
//! [`render::split_row::SplitRow`] per line pair, accepts highlighted
//! fragments from a [`worker::HighlightWorker`] and renders the page.
//! Hosts embedding the view receive comment requests and errors through
//! [`host::HostEmbedding`].

pub mod attributed;
pub mod chardiff;
pub mod cli;
pub mod config;
pub mod error;
pub mod host;
pub mod model;
pub mod patch;
pub mod render;
pub mod syntax;
pub mod theme;
pub mod view;
pub mod worker;
