//! Ordered fallback chains for projected fields.

use tracing::trace;

type Extractor<'a, T> = Box<dyn Fn() -> Option<T> + 'a>;

/// An ordered list of `(source, extractor)` pairs for one output field.
///
/// ```ignore
/// let author_url = FallbackChain::new("author_url")
///     .or("attribution", || attribution_url(metadata))
///     .or("object", || metadata.url.as_ref().map(Url::to_string))
///     .resolve();
/// ```
pub struct FallbackChain<'a, T> {
    field: &'static str,
    sources: Vec<(&'static str, Extractor<'a, T>)>,
}

impl<'a, T> FallbackChain<'a, T> {
    pub fn new(field: &'static str) -> Self {
        Self {
            field,
            sources: Vec::new(),
        }
    }

    /// Append a source, tried after every source already in the chain.
    pub fn or(mut self, source: &'static str, extract: impl Fn() -> Option<T> + 'a) -> Self {
        self.sources.push((source, Box::new(extract)));
        self
    }

    /// Source labels in evaluation order.
    pub fn sources(&self) -> Vec<&'static str> {
        self.sources.iter().map(|(source, _)| *source).collect()
    }

    /// The first present value. Later extractors are not called once a value
    /// is found.
    pub fn resolve(&self) -> Option<T> {
        self.sources.iter().find_map(|(source, extract)| {
            let value = extract()?;
            trace!(field = self.field, source = *source, "Resolved projected field");
            Some(value)
        })
    }
}
