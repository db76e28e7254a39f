mod feed;
mod headline;

pub use feed::Feed;
pub use headline::Headline;
