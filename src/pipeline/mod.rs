//! Pipeline stages for archive-to-cookbook conversion.
//!
//! Each submodule implements one transformation step and is tested on its
//! own; [`crate::convert`] wires them together.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ archive ──▶ record ──▶ photo ──▶ html ──▶ pdf
//! (path/URL) (zip)      (gzip+JSON) (resize)  (template) (external)
//! ```
//!
//! 1. [`input`]   — canonicalise the user-supplied path or URL to a local file
//! 2. [`archive`] — list entries and read bytes; blocking, so callers run it
//!    inside `spawn_blocking`
//! 3. [`record`]  — gunzip and decode each record; field cleanup via [`text`]
//! 4. [`photo`]   — decode, downscale and JPEG-encode photos for embedding
//! 5. [`html`]    — cover, table of contents and recipe cards
//! 6. [`pdf`]     — hand the HTML to an external paged-media renderer

pub mod archive;
pub mod html;
pub mod input;
pub mod pdf;
pub mod photo;
pub mod record;
pub mod text;
