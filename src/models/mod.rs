pub mod media;

pub use media::{
    Episode, MediaBody, MediaRecord, MediaType, NormalizedMedia, Quality, Season, SeasonZips,
    Seasons, Source, Stream,
};
