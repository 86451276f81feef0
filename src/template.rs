use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

use regex::Regex;

use crate::error::{SeqError, SeqResult};

/// One `%NNd` token: percent, exactly two decimal digits, letter d.
static PADDING_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%\d\dd").expect("padding pattern is valid"));

/// A frame-path template: a file path containing exactly one zero-padding
/// placeholder (`%04d` style) that stands for a per-frame sequence number.
///
/// The template carries a 1-based frame counter. Formatting the current
/// counter value into the placeholder yields the concrete path of one frame;
/// [`SeqPath::output_increment`] enumerates consecutive frame paths.
///
/// ```
/// use frameseq::SeqPath;
///
/// let mut tpl = SeqPath::new("small_dog_%04d.png").unwrap();
/// assert_eq!(tpl.output_increment(), "small_dog_0001.png");
/// assert_eq!(tpl.output_increment(), "small_dog_0002.png");
/// ```
#[derive(Clone, Debug)]
pub struct SeqPath {
    input_path: PathBuf,
    prefix: String,
    suffix: String,
    padding: u32,
    current_frame: u64,
}

impl SeqPath {
    /// Parse `path` into a frame-path template.
    ///
    /// Errors if the path contains no placeholder token, or more than one:
    /// a path with zero tokens is a literal file name, and a path with
    /// several is ambiguous about which field carries the frame number.
    pub fn new(path: impl AsRef<Path>) -> SeqResult<Self> {
        let path = path.as_ref();
        let text = path
            .to_str()
            .ok_or_else(|| SeqError::template("frame path template must be valid UTF-8"))?;

        let Some(m) = PADDING_PATTERN.find(text) else {
            return Err(SeqError::template(format!(
                "no frame padding pattern in '{text}'"
            )));
        };
        if PADDING_PATTERN.is_match(&text[m.end()..]) {
            return Err(SeqError::template(format!(
                "more than one frame padding pattern in '{text}'"
            )));
        }

        // The match is "%NNd"; the two digits are the zero-pad width.
        let padding = text[m.start() + 1..m.end() - 1]
            .parse::<u32>()
            .map_err(|e| SeqError::template(format!("invalid padding width: {e}")))?;

        Ok(Self {
            input_path: path.to_path_buf(),
            prefix: text[..m.start()].to_string(),
            suffix: text[m.end()..].to_string(),
            padding,
            current_frame: 1,
        })
    }

    /// True iff `path` contains the placeholder pattern exactly once.
    ///
    /// Used to classify a candidate input as a templated sequence versus a
    /// literal single file without constructing a full template (which
    /// errors on ambiguous input).
    pub fn has_placeholder(path: impl AsRef<Path>) -> bool {
        let Some(text) = path.as_ref().to_str() else {
            return false;
        };
        match PADDING_PATTERN.find(text) {
            Some(m) => !PADDING_PATTERN.is_match(&text[m.end()..]),
            None => false,
        }
    }

    /// The concrete path for the current frame counter: prefix, counter
    /// zero-padded to the template's width (width 0 renders at natural
    /// width), suffix.
    pub fn output_path(&self) -> String {
        format!(
            "{}{:0width$}{}",
            self.prefix,
            self.current_frame,
            self.suffix,
            width = self.padding as usize
        )
    }

    /// Returns [`Self::output_path`] for the current counter, then advances
    /// the counter by one. Calling this repeatedly enumerates consecutive
    /// frame file names starting at index 1.
    pub fn output_increment(&mut self) -> String {
        let output = self.output_path();
        self.current_frame += 1;
        output
    }

    /// Advance the frame counter without formatting a path.
    pub fn increment(&mut self) {
        self.current_frame += 1;
    }

    /// The index the counter will hold after the next increment.
    pub fn peek_next_index(&self) -> u64 {
        self.current_frame + 1
    }

    /// The frame index encoded in `file_name`, if it belongs to this
    /// template: the file-name part of the prefix, a digit run that the
    /// template's padding would produce, then the suffix.
    pub fn frame_index_of(&self, file_name: &str) -> Option<u64> {
        let name_prefix = self
            .prefix
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.prefix.as_str());
        let digits = file_name
            .strip_prefix(name_prefix)?
            .strip_suffix(self.suffix.as_str())?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let index = digits.parse::<u64>().ok()?;
        let rendered = format!("{index:0width$}", width = self.padding as usize);
        (rendered == digits).then_some(index)
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn padding(&self) -> u32 {
        self.padding
    }

    pub fn current_frame(&self) -> u64 {
        self.current_frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_pads_to_width() {
        let tpl = SeqPath::new("small_dog_%04d.jpg").unwrap();
        assert_eq!(tpl.output_path(), "small_dog_0001.jpg");
    }

    #[test]
    fn placeholder_position_does_not_matter() {
        let cases = [
            ("small_dog_001_%04d.png", "small_dog_001_0001.png"),
            ("../dog/cat/small_dog_001_%04d.png", "../dog/cat/small_dog_001_0001.png"),
            ("%04d_small_dog_001.png", "0001_small_dog_001.png"),
            ("small_%04d_dog_001.png", "small_0001_dog_001.png"),
        ];
        for (input, expected) in cases {
            let tpl = SeqPath::new(input).unwrap();
            assert_eq!(tpl.input_path(), Path::new(input));
            assert_eq!(tpl.output_path(), expected);
        }
    }

    #[test]
    fn zero_padding_width_renders_natural_width() {
        let tpl = SeqPath::new("small_dog_001_%00d.png").unwrap();
        assert_eq!(tpl.padding(), 0);
        assert_eq!(tpl.output_path(), "small_dog_001_1.png");
    }

    #[test]
    fn wide_padding_renders_all_zeros() {
        let tpl = SeqPath::new("small_dog_001_%31d.png").unwrap();
        assert_eq!(
            tpl.output_path(),
            "small_dog_001_0000000000000000000000000000001.png"
        );
    }

    #[test]
    fn no_placeholder_is_an_error() {
        assert!(SeqPath::new("small_dog_0001.png").is_err());
    }

    #[test]
    fn multiple_placeholders_are_an_error() {
        assert!(SeqPath::new("small_dog_0001_%04d_%04d.png").is_err());
    }

    #[test]
    fn output_increment_counts_from_one() {
        let mut norm = SeqPath::new("small_dog_%04d.png").unwrap();
        let mut short = SeqPath::new("small_dog_%00d.png").unwrap();
        let mut long = SeqPath::new("small_dog_%15d.png").unwrap();

        for i in 1u64..500 {
            assert_eq!(norm.output_increment(), format!("small_dog_{i:04}.png"));
            assert_eq!(short.output_increment(), format!("small_dog_{i}.png"));
            assert_eq!(long.output_increment(), format!("small_dog_{i:015}.png"));
        }
    }

    #[test]
    fn increment_and_peek() {
        let mut tpl = SeqPath::new("frame_%02d.png").unwrap();
        assert_eq!(tpl.current_frame(), 1);
        assert_eq!(tpl.peek_next_index(), 2);
        tpl.increment();
        assert_eq!(tpl.current_frame(), 2);
        assert_eq!(tpl.output_path(), "frame_02.png");
    }

    #[test]
    fn has_placeholder_requires_exactly_one_match() {
        assert!(SeqPath::has_placeholder("a/b/frame_%04d.png"));
        assert!(!SeqPath::has_placeholder("a/b/frame_0001.png"));
        assert!(!SeqPath::has_placeholder("a/b/frame_%04d_%02d.png"));
    }

    #[test]
    fn frame_index_of_matches_padded_names() {
        let tpl = SeqPath::new("seq/dog_%04d.png").unwrap();
        assert_eq!(tpl.frame_index_of("dog_0001.png"), Some(1));
        assert_eq!(tpl.frame_index_of("dog_0187.png"), Some(187));
        assert_eq!(tpl.frame_index_of("dog_12345.png"), Some(12345));
        assert_eq!(tpl.frame_index_of("dog_001.png"), None);
        assert_eq!(tpl.frame_index_of("dog_00001.png"), None);
        assert_eq!(tpl.frame_index_of("cat_0001.png"), None);
        assert_eq!(tpl.frame_index_of("dog_0001.jpg"), None);
    }

    #[test]
    fn frame_index_of_natural_width() {
        let tpl = SeqPath::new("dog_%00d.png").unwrap();
        assert_eq!(tpl.frame_index_of("dog_7.png"), Some(7));
        assert_eq!(tpl.frame_index_of("dog_123.png"), Some(123));
        assert_eq!(tpl.frame_index_of("dog_07.png"), None);
    }
}
