mod metadata;

pub use self::metadata::{ImageSet, Images, RawMetadata, SeriesMetadata, TitleVariant};
