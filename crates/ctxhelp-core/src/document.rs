use std::ops::Range;

/// One formatting instruction applied to a whole line
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TagSpec {
    Bold,
    Italic,
    Underline,
    /// Color value as authored, e.g. `#800000`
    Color(String),
    FontFamily(String),
    FontSize(i32),
}

impl TagSpec {
    fn is_family(&self) -> bool {
        matches!(self, TagSpec::FontFamily(_))
    }

    fn is_size(&self) -> bool {
        matches!(self, TagSpec::FontSize(_))
    }

    /// A color or family without a value has no tag name
    fn is_blank(&self) -> bool {
        match self {
            TagSpec::Color(value) | TagSpec::FontFamily(value) => value.is_empty(),
            _ => false,
        }
    }
}

/// Effective style of a line once all of its tags are applied.
///
/// Saved lines do not remember the order of their colors, so when a line
/// carries several the greatest value is used. Rendering is then the same
/// before and after a save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub color: Option<String>,
    pub family: Option<String>,
    pub size: Option<i32>,
}

/// A line of text with its tag set.
///
/// Tags are kept in application order; re-applying a tag moves it to the
/// end. Two lines are equal when their text matches and they carry the same
/// set of tags, whatever the order.
#[derive(Debug, Clone, Default, Eq)]
pub struct StyledLine {
    text: String,
    tags: Vec<TagSpec>,
}

impl StyledLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_tag(mut self, tag: TagSpec) -> Self {
        self.apply(tag);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn tags(&self) -> &[TagSpec] {
        &self.tags
    }

    pub fn has(&self, tag: &TagSpec) -> bool {
        self.tags.contains(tag)
    }

    /// Empty colors and families are ignored
    pub fn apply(&mut self, tag: TagSpec) {
        if tag.is_blank() {
            return;
        }
        self.tags.retain(|t| *t != tag);
        self.tags.push(tag);
    }

    pub fn remove(&mut self, tag: &TagSpec) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        self.tags.len() != before
    }

    /// Add the tag if absent, remove it otherwise; returns whether it is now set
    pub fn toggle(&mut self, tag: TagSpec) -> bool {
        if tag.is_blank() || self.remove(&tag) {
            false
        } else {
            self.tags.push(tag);
            true
        }
    }

    /// Tags with only the most recently applied family and size kept
    pub fn normalized_tags(&self) -> Vec<&TagSpec> {
        let last_family = self.tags.iter().rposition(TagSpec::is_family);
        let last_size = self.tags.iter().rposition(TagSpec::is_size);

        self.tags
            .iter()
            .enumerate()
            .filter(|(i, tag)| {
                (!tag.is_family() || Some(*i) == last_family)
                    && (!tag.is_size() || Some(*i) == last_size)
            })
            .map(|(_, tag)| tag)
            .collect()
    }

    pub fn normalize(&mut self) {
        let kept: Vec<TagSpec> = self.normalized_tags().into_iter().cloned().collect();
        self.tags = kept;
    }

    /// Later family and size tags override earlier ones
    pub fn style(&self) -> LineStyle {
        let mut style = LineStyle::default();
        for tag in &self.tags {
            match tag {
                TagSpec::Bold => style.bold = true,
                TagSpec::Italic => style.italic = true,
                TagSpec::Underline => style.underline = true,
                TagSpec::Color(color) => {
                    if style.color.as_ref().map_or(true, |current| color > current) {
                        style.color = Some(color.clone());
                    }
                }
                TagSpec::FontFamily(family) => style.family = Some(family.clone()),
                TagSpec::FontSize(size) => style.size = Some(*size),
            }
        }
        style
    }
}

impl PartialEq for StyledLine {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
            && self.tags.len() == other.tags.len()
            && self.tags.iter().all(|t| other.tags.contains(t))
    }
}

/// An ordered sequence of styled lines making up one help entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotatedDocument {
    lines: Vec<StyledLine>,
}

impl AnnotatedDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Untagged document, one line per line of `text`
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.lines().map(StyledLine::new).collect(),
        }
    }

    pub fn from_lines(lines: Vec<StyledLine>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[StyledLine] {
        &self.lines
    }

    pub fn line_mut(&mut self, index: usize) -> Option<&mut StyledLine> {
        self.lines.get_mut(index)
    }

    pub fn push_line(&mut self, line: StyledLine) {
        self.lines.push(line);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn plain_text(&self) -> String {
        self.lines
            .iter()
            .map(StyledLine::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Apply a tag to every line in `range` (clamped to the document)
    pub fn apply_tag(&mut self, range: Range<usize>, tag: &TagSpec) {
        for line in self.lines_in(range) {
            line.apply(tag.clone());
        }
    }

    pub fn remove_tag(&mut self, range: Range<usize>, tag: &TagSpec) {
        for line in self.lines_in(range) {
            line.remove(tag);
        }
    }

    /// Toggle like an editor toolbar button: if the first selected line
    /// carries the tag it is removed from the whole range, otherwise added.
    pub fn toggle_tag(&mut self, range: Range<usize>, tag: &TagSpec) {
        let present = self
            .lines
            .get(range.start)
            .map(|line| line.has(tag))
            .unwrap_or(false);
        if present {
            self.remove_tag(range, tag);
        } else {
            self.apply_tag(range, tag);
        }
    }

    pub fn set_color(&mut self, range: Range<usize>, color: &str) {
        self.apply_tag(range, &TagSpec::Color(color.to_string()));
    }

    pub fn set_font_family(&mut self, range: Range<usize>, family: &str) {
        self.apply_tag(range, &TagSpec::FontFamily(family.to_string()));
    }

    pub fn set_font_size(&mut self, range: Range<usize>, size: i32) {
        self.apply_tag(range, &TagSpec::FontSize(size));
    }

    pub fn normalize(&mut self) {
        self.lines.iter_mut().for_each(StyledLine::normalize);
    }

    fn lines_in(&mut self, range: Range<usize>) -> impl Iterator<Item = &mut StyledLine> {
        let end = range.end.min(self.lines.len());
        let start = range.start.min(end);
        self.lines[start..end].iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_moves_tag_to_end() {
        let mut line = StyledLine::new("x")
            .with_tag(TagSpec::Bold)
            .with_tag(TagSpec::Italic);
        line.apply(TagSpec::Bold);
        assert_eq!(line.tags(), &[TagSpec::Italic, TagSpec::Bold]);
    }

    #[test]
    fn test_equality_ignores_tag_order() {
        let a = StyledLine::new("x")
            .with_tag(TagSpec::Bold)
            .with_tag(TagSpec::Color("#FF0000".into()));
        let b = StyledLine::new("x")
            .with_tag(TagSpec::Color("#FF0000".into()))
            .with_tag(TagSpec::Bold);
        assert_eq!(a, b);
        assert_ne!(a, StyledLine::new("x").with_tag(TagSpec::Bold));
    }

    #[test]
    fn test_normalized_tags_keep_last_family_and_size() {
        let line = StyledLine::new("x")
            .with_tag(TagSpec::FontFamily("Arial".into()))
            .with_tag(TagSpec::FontSize(12))
            .with_tag(TagSpec::Color("#000080".into()))
            .with_tag(TagSpec::Color("#FF0000".into()))
            .with_tag(TagSpec::FontFamily("Courier".into()))
            .with_tag(TagSpec::FontSize(9));

        let kept: Vec<&TagSpec> = line.normalized_tags();
        assert_eq!(
            kept,
            vec![
                &TagSpec::Color("#000080".into()),
                &TagSpec::Color("#FF0000".into()),
                &TagSpec::FontFamily("Courier".into()),
                &TagSpec::FontSize(9),
            ]
        );
    }

    #[test]
    fn test_style() {
        let line = StyledLine::new("x")
            .with_tag(TagSpec::FontSize(10))
            .with_tag(TagSpec::Underline)
            .with_tag(TagSpec::FontSize(12));
        let style = line.style();
        assert!(style.underline);
        assert!(!style.bold);
        assert_eq!(style.size, Some(12));
    }

    #[test]
    fn test_style_color_ignores_application_order() {
        let dark_first = StyledLine::new("x")
            .with_tag(TagSpec::Color("#000000".into()))
            .with_tag(TagSpec::Color("#FFFFFF".into()));
        let light_first = StyledLine::new("x")
            .with_tag(TagSpec::Color("#FFFFFF".into()))
            .with_tag(TagSpec::Color("#000000".into()));

        assert_eq!(dark_first.style(), light_first.style());
        assert_eq!(light_first.style().color.as_deref(), Some("#FFFFFF"));
    }

    #[test]
    fn test_blank_color_and_family_are_ignored() {
        let mut doc = AnnotatedDocument::from_text("one
two");
        doc.set_color(0..2, "");
        doc.set_font_family(0..2, "");
        doc.toggle_tag(0..1, &TagSpec::FontFamily(String::new()));
        assert!(doc.lines().iter().all(|l| l.tags().is_empty()));

        doc.set_font_family(0..1, "Arial");
        assert_eq!(doc.lines()[0].tags(), &[TagSpec::FontFamily("Arial".into())]);
    }

    #[test]
    fn test_toggle_tag_over_range() {
        let mut doc = AnnotatedDocument::from_text("one\ntwo\nthree");
        doc.toggle_tag(0..2, &TagSpec::Bold);
        assert!(doc.lines()[0].has(&TagSpec::Bold));
        assert!(doc.lines()[1].has(&TagSpec::Bold));
        assert!(!doc.lines()[2].has(&TagSpec::Bold));

        doc.toggle_tag(0..3, &TagSpec::Bold);
        assert!(doc.lines().iter().all(|l| !l.has(&TagSpec::Bold)));
    }

    #[test]
    fn test_range_is_clamped() {
        let mut doc = AnnotatedDocument::from_text("only");
        doc.set_font_size(0..10, 14);
        doc.set_color(5..8, "#FF0000");
        assert_eq!(doc.lines()[0].tags(), &[TagSpec::FontSize(14)]);
    }

    #[test]
    fn test_plain_text() {
        let doc = AnnotatedDocument::from_text("a\n\nb");
        assert_eq!(doc.len(), 3);
        assert_eq!(doc.plain_text(), "a\n\nb");
    }
}
