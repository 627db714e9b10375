use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use crate::error::Result;
use crate::Field;

/// Relevance multiplier per analyzed field. A weight of zero (or below) takes the field
/// out of querying entirely.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldWeights {
    pub name: f32,
    pub birthplace: f32,
    pub notes: f32,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self { name: 3.0, birthplace: 1.0, notes: 1.0 }
    }
}

impl FieldWeights {
    pub fn get(&self, field: Field) -> f32 {
        match field {
            Field::Name => self.name,
            Field::Birthplace => self.birthplace,
            Field::Notes => self.notes,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub weights: FieldWeights,
    /// Abandon a rebuild that runs longer than this; unbounded when absent.
    pub max_rebuild_duration_secs: Option<u64>,
}

impl EngineConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = File::open(path)?;
        let config = serde_json::from_reader(BufReader::new(f))?;
        Ok(config)
    }

    pub fn max_rebuild_duration(&self) -> Option<Duration> {
        self.max_rebuild_duration_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_boost_name() {
        let w = FieldWeights::default();
        assert_eq!(w.get(Field::Name), 3.0);
        assert_eq!(w.get(Field::Birthplace), 1.0);
        assert_eq!(w.get(Field::Notes), 1.0);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"weights": {"notes": 0}}"#).unwrap();
        assert_eq!(config.weights.name, 3.0);
        assert_eq!(config.weights.notes, 0.0);
        assert_eq!(config.max_rebuild_duration(), None);
    }
}
