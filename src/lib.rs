//! Hierarchical genome annotation.
//!
//! Annotation of one sequence is held as a five-level tree, context,
//! alignment, block, feature set and feature, stored in an arena owned by a
//! [`FeatureContext`](data_structs::FeatureContext). Trees are built from
//! GFF2 or GFF3 text by [`io::gff::GffParser`] and combined with
//! [`merge::merge_context`], which reports what it added as a diff that
//! can later be erased again.
//!
//! ```no_run
//! use annotree::prelude::*;
//!
//! let mut master = FeatureContext::new(Quark::intern("chr1"));
//! for path in ["genes.gff3", "ests.gff3"] {
//!     let mut parser = GffParser::new(ParserConfig::default());
//!     parser.parse_reader(std::io::BufReader::new(std::fs::File::open(path)?))?;
//!     let diff = merge_context(&mut master, parser.finish()?.context)?;
//!     println!("{}: {} new features", path, diff.feature_count());
//!     master.release_diff(diff);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```
pub mod data_structs;
pub mod io;
pub mod merge;
pub mod prelude;
pub mod quark;
pub mod utils;
