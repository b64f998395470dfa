//! Input and output of feature trees: the GFF parser, the text dump, the
//! XML event mapping and the background loader.
pub mod dump;
pub mod gff;
pub mod loader;
pub mod xml;
