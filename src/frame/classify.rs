/// What a line is, once trimmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowClass {
    Header,
    Data,
    Blank,
}

/// A classified line carrying its trimmed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub class: RowClass,
    pub text: String,
}

impl Row {
    pub fn blank() -> Self {
        Self {
            class: RowClass::Blank,
            text: String::new(),
        }
    }
}

/// Assigns header / data / blank classes to lines in stream order.
///
/// The header is the first line with non-blank trimmed text. Blank lines before it are
/// discarded and produce no row at all.
#[derive(Debug, Default)]
pub struct RowClassifier {
    seen_header: bool,
}

impl RowClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen_header(&self) -> bool {
        self.seen_header
    }

    pub fn classify(&mut self, line: &str) -> Option<Row> {
        let trimmed = line.trim();
        let class = match (self.seen_header, trimmed.is_empty()) {
            (false, true) => return None,
            (false, false) => {
                self.seen_header = true;
                RowClass::Header
            }
            (true, true) => RowClass::Blank,
            (true, false) => RowClass::Data,
        };
        Some(Row {
            class,
            text: trimmed.to_string(),
        })
    }
}
