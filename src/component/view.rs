use std::fmt;

/// A rendered view description.
///
/// This is the output of a component's render. The host engine diffs and
/// draws it; bindings only store and forward it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Empty,
    Text(String),
    Element { tag: String, children: Vec<View> },
}

impl View {
    pub fn text(text: impl Into<String>) -> Self {
        View::Text(text.into())
    }

    pub fn element(tag: impl Into<String>, children: impl IntoIterator<Item = View>) -> Self {
        View::Element {
            tag: tag.into(),
            children: children.into_iter().collect(),
        }
    }

    /// All text in the view, concatenated in document order.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            View::Empty => {}
            View::Text(text) => out.push_str(text),
            View::Element { children, .. } => {
                for child in children {
                    child.collect_text(out);
                }
            }
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Empty => Ok(()),
            View::Text(text) => f.write_str(text),
            View::Element { tag, children } => {
                write!(f, "<{tag}>")?;
                for child in children {
                    write!(f, "{child}")?;
                }
                write!(f, "</{tag}>")
            }
        }
    }
}
