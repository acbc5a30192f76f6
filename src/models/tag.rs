use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "cor")]
    pub color: String,
    #[serde(rename = "descricao", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Tag {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: super::new_id(),
            name: name.into(),
            color: color.into(),
            description: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TagUpdate {
    pub name: Option<String>,
    pub color: Option<String>,
    pub description: Option<Option<String>>,
}

impl TagUpdate {
    pub fn apply_to(self, tag: &mut Tag) {
        if let Some(v) = self.name {
            tag.name = v;
        }
        if let Some(v) = self.color {
            tag.color = v;
        }
        if let Some(v) = self.description {
            tag.description = v;
        }
    }
}
