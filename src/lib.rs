//! Parser and replayer for Shogi game records in [KIF notation].
//!
//! A record is parsed once into an immutable move [tree] (variations
//! included), after which the position at any ply of any recorded line can be
//! reconstructed on demand. Move legality is never checked: the transcript is
//! trusted to come from a standard KIF writer.
//!
//! [KIF notation]: http://kakinoki.o.oo7.jp/kif_format.html
//! [tree]: crate::shogi::record::Tree

#![warn(missing_docs, variant_size_differences)]
// Rustc lints.
#![warn(
    absolute_paths_not_starting_with_crate,
    keyword_idents,
    macro_use_extern_crate,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unused_extern_crates,
    unused_import_braces,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]
// Rustdoc lints.
#![warn(
    rustdoc::private_doc_tests,
    rustdoc::broken_intra_doc_links,
    rustdoc::invalid_codeblock_attributes,
    rustdoc::invalid_html_tags,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::bare_urls
)]
// Clippy lints.
#![warn(
    clippy::correctness,
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::pedantic
)]

pub mod kif;
pub mod shogi;

pub use kif::Kif;
