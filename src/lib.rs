//! Docshrink: recompress the images inside ZIP-based documents.
//!
//! Office documents (`.docx`, `.pptx`, `.xlsx`, `.odt`, ...) are ZIP
//! containers. Docshrink extracts one into a private scratch directory,
//! re-encodes every PNG/JPEG entry as a quality-85 JPEG, repacks the tree
//! and swaps the result in only when it is smaller. The original goes to
//! the trash, never straight to deletion.
//!
//! The crate provides:
//! - The pipeline (`pipeline`) and its options (`config`)
//! - Single-image recompression (`recompress`)
//! - Pluggable archive/trash backends (`tools`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```no_run
//! use docshrink::config::ShrinkOptions;
//! use docshrink::pipeline::{self, ProgressEvent};
//! use docshrink::tools::NativeTools;
//!
//! let outcome = pipeline::shrink(
//!     "slides.pptx".as_ref(),
//!     &ShrinkOptions::default(),
//!     &NativeTools::default(),
//!     |event| {
//!         if let ProgressEvent::Image { name, size } = event {
//!             println!("{name}: {size}");
//!         }
//!     },
//! )
//! .unwrap();
//! println!("{:?}: {}", outcome.status, outcome.size);
//! ```

pub mod config;
pub mod pipeline;
pub mod recompress;
pub mod scratch;
pub mod size;
pub mod tools;
pub mod walk;

#[cfg(feature = "cli")]
pub mod cli;
