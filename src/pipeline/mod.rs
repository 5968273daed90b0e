//! Pipeline stages for both conversion directions.
//!
//! Each submodule implements one step and is testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! PDF→JPG:  input ──▶ pages ──▶ render ──▶ jpeg
//!          (checks)  (lopdf)   (pdfium)   (encode + save)
//!
//! JPG→PDF:  input ──▶ jpeg ──▶ assemble
//!          (expand)  (pass-through or re-encode)  (lopdf)
//! ```
//!
//! 1. [`input`]   : validate PDFs, derive output names, expand image folders
//! 2. [`pages`]   : count pages without loading the rendering engine
//! 3. [`render`]  : rasterise pages one at a time; blocking, because pdfium
//!    is not async-safe
//! 4. [`jpeg`]    : colour normalisation, JPEG encoding, SOF inspection
//! 5. [`assemble`]: build the merged PDF and write it atomically

pub mod assemble;
pub mod input;
pub mod jpeg;
pub mod pages;
pub mod render;
