use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A single activity report.
///
/// `idNum` and `link` are assigned together at creation and never edited
/// afterwards. Callers may attach arbitrary extra text fields (title, date,
/// ...); those round-trip through the flattened map untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(deserialize_with = "numeric_id")]
    pub id_num: u64,
    pub link: String,
    #[serde(default)]
    pub img: String,
    #[serde(default)]
    pub content_md: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Post {
    /// A fresh post with a newly allocated id and its derived page link.
    pub fn new(id_num: u64, img: String) -> Self {
        Self {
            id_num,
            link: format!("report{id_num}.html"),
            img,
            content_md: String::new(),
            extra: Map::new(),
        }
    }

    /// Shallow-merge caller-supplied fields over this post.
    ///
    /// `idNum`, `link` and `img` are controlled by the store and never
    /// touched by merges.
    pub fn apply_fields(&mut self, fields: Map<String, Value>) {
        for (key, value) in fields {
            match key.as_str() {
                "idNum" | "link" | "img" => {}
                "contentMd" => {
                    if let Value::String(text) = value {
                        self.content_md = text;
                    }
                }
                _ => {
                    self.extra.insert(key, value);
                }
            }
        }
    }

    /// All fields of this post as a flat map, wire names included.
    pub fn field_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("idNum".to_string(), Value::from(self.id_num));
        map.insert("link".to_string(), Value::String(self.link.clone()));
        map.insert("img".to_string(), Value::String(self.img.clone()));
        map.insert(
            "contentMd".to_string(),
            Value::String(self.content_md.clone()),
        );
        for (key, value) in &self.extra {
            map.insert(key.clone(), value.clone());
        }
        map
    }
}

/// Pre-seeded documents sometimes carry ids as numeric strings; normalize
/// both representations to the integer value.
fn numeric_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| de::Error::custom("idNum must be a non-negative integer")),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom("idNum must be numeric")),
        _ => Err(de::Error::custom("idNum must be a number or numeric string")),
    }
}
