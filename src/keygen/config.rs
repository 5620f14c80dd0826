use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeygenConfig {
    pub counter_key: String,
    pub salt: String,
    pub min_length: usize,
}

impl Default for KeygenConfig {
    fn default() -> Self {
        Self {
            counter_key: "keygen".to_string(),
            salt: "65fce519433f4218aa0cee6394225eea".to_string(),
            min_length: 4,
        }
    }
}
