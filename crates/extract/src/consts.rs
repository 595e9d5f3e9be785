use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// Scanlation group tags, release years, "{digital}" and the like.
regex!(ANNOTATION_REGEX, r"\[.*?\]|\(.*?\)|\{.*?\}");
regex!(VOLUME_REGEX, r"(?i)(?:v|vol|volume)\.?(\d+)");
regex!(CHAPTER_REGEX, r"(?i)c(\d+)");
regex!(DIGIT_RUN_REGEX, r"\d+");
