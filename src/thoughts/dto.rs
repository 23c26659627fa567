use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateThoughtRequest {
    #[serde(default)]
    pub content: Option<String>,
}

impl CreateThoughtRequest {
    /// `null` and a missing field both read as empty.
    pub fn content(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }
}
