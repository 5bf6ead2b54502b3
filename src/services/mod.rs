pub mod full_text_links;
pub mod paper_fetcher;
pub mod summarizer;
pub mod table_extractor;
pub mod text_extractor;

pub use full_text_links::extract_full_text_links;
pub use paper_fetcher::PaperFetcher;
pub use summarizer::Summarizer;
pub use table_extractor::{CandidateTable, ResultsTable, TableExtractor};
pub use text_extractor::{ChunkingPolicy, TextExtractor};
