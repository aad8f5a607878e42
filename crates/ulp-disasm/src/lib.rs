pub mod model;
pub mod source;

pub use model::{load_image, load_raw_bin, read_word, Image};
pub use source::assemble_source;
