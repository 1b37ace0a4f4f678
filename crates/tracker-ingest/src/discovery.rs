//! Input file discovery and file-name conventions.

use std::path::{Path, PathBuf};

use tracker_model::{ProgramId, StageId, TrackedEntityId};

use crate::error::{IngestError, Result};

/// Lists the input files of a directory.
///
/// Every regular file is an input except hidden (dot) files; split outputs
/// such as `data.csv0` carry no `.csv` extension. Returns files sorted by
/// file name.
pub fn list_input_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let hidden = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with('.'));
        if !hidden {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Identifiers encoded in a file name of the form
/// `programID.stageID.trackedEntityID.<ext>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIdentifiers {
    pub program: ProgramId,
    pub stage: StageId,
    pub tracked_entity: TrackedEntityId,
}

impl FileIdentifiers {
    pub fn from_file_name(name: &str) -> Result<Self> {
        let invalid = || IngestError::InvalidFileName {
            name: name.to_string(),
        };
        let parts: Vec<&str> = name.split('.').collect();
        let [program, stage, tracked_entity, _extension] = parts.as_slice() else {
            return Err(invalid());
        };
        Ok(Self {
            program: ProgramId::new(*program).map_err(|_| invalid())?,
            stage: StageId::new(*stage).map_err(|_| invalid())?,
            tracked_entity: TrackedEntityId::new(*tracked_entity).map_err(|_| invalid())?,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_file_name(&name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_four_part_names() {
        let ids = FileIdentifiers::from_file_name("prog.stage.entity.csv").unwrap();
        assert_eq!(ids.program.as_str(), "prog");
        assert_eq!(ids.stage.as_str(), "stage");
        assert_eq!(ids.tracked_entity.as_str(), "entity");

        let split = FileIdentifiers::from_file_name("prog.stage.entity.csv12").unwrap();
        assert_eq!(split.tracked_entity.as_str(), "entity");
    }

    #[test]
    fn rejects_other_shapes() {
        for name in ["data.csv", "a.b.c.d.csv", "prog..entity.csv", ""] {
            let err = FileIdentifiers::from_file_name(name).unwrap_err();
            assert!(
                matches!(err, IngestError::InvalidFileName { .. }),
                "{name}: {err}"
            );
        }
    }
}
