pub mod lexicon;
pub mod pipeline;
pub mod summary;

#[cfg(test)]
mod pipeline_tests;

pub use lexicon::LexiconSentiment;
pub use pipeline::{
    aggregate_sentiment, is_trusted, label_for_score, NewsClassificationPipeline, TrustThresholds,
};
pub use summary::{OverallSentiment, SentimentOverview};
