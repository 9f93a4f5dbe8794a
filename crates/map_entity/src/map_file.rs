use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::EntityData;

pub const MAP_ENTITY_FILE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapEntityFile {
    pub version: u32,
    #[serde(default)]
    pub entities: Vec<EntityData>,
}

#[derive(Debug, Error)]
pub enum MapFileError {
    #[error("failed to read map entity file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse map entity json at {json_path}: {source}")]
    Parse {
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("unsupported map entity file version: expected {expected}, got {actual}")]
    UnsupportedVersion { expected: u32, actual: u32 },
}

pub fn parse_map_entity_file(raw: &str) -> Result<MapEntityFile, MapFileError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let file: MapEntityFile =
        serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
            let json_path = error.path().to_string();
            MapFileError::Parse {
                json_path,
                source: error.into_inner(),
            }
        })?;
    deserializer.end().map_err(|source| MapFileError::Parse {
        json_path: ".".to_string(),
        source,
    })?;
    if file.version != MAP_ENTITY_FILE_VERSION {
        return Err(MapFileError::UnsupportedVersion {
            expected: MAP_ENTITY_FILE_VERSION,
            actual: file.version,
        });
    }
    Ok(file)
}

pub fn load_map_entity_file(path: &Path) -> Result<MapEntityFile, MapFileError> {
    let raw = fs::read_to_string(path).map_err(|source| MapFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_map_entity_file(&raw)
}
