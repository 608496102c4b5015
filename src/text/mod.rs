//! Tweet normalization used before vectorization.

mod clean;
mod stopwords;

pub use clean::{clean_optional_text, clean_text};
pub use stopwords::{is_stopword, ENGLISH_STOPWORDS};
