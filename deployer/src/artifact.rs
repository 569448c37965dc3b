// deployer/src/artifact.rs
// Resolves compiled contracts from a Hardhat `artifacts/` tree.

use ethers::{abi::Abi, types::Bytes};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::debug;

const LINK_PLACEHOLDER: &str = "__$";

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact for contract `{name}` not found under {dir:?}")]
    NotFound { name: String, dir: PathBuf },
    #[error("contract name `{name}` is ambiguous, use a fully qualified name: {candidates:?}")]
    Ambiguous { name: String, candidates: Vec<String> },
    #[error("failed to read artifact {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse artifact {path:?}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("contract `{0}` has no creation bytecode (abstract contract or interface?)")]
    EmptyBytecode(String),
    #[error("contract `{0}` references libraries that are not linked")]
    UnlinkedLibraries(String),
    #[error("contract `{name}` has invalid bytecode")]
    InvalidBytecode {
        name: String,
        #[source]
        source: hex::FromHexError,
    },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HardhatArtifact {
    contract_name: String,
    source_name: String,
    abi: Abi,
    bytecode: String,
}

/// A compiled contract ready to be deployed.
#[derive(Debug, Clone)]
pub struct ContractArtifact {
    pub contract_name: String,
    pub source_name: String,
    pub abi: Abi,
    pub bytecode: Bytes,
}

impl ContractArtifact {
    /// Finds `name` under `artifacts_dir`. Accepts `Name` or `path/To.sol:Name`.
    pub fn resolve(artifacts_dir: impl AsRef<Path>, name: &str) -> Result<Self, ArtifactError> {
        let dir = artifacts_dir.as_ref();
        let (source, contract) = match name.rsplit_once(':') {
            Some((source, contract)) => (Some(source), contract),
            None => (None, name),
        };

        let mut found = Vec::new();
        collect_candidates(dir, &format!("{contract}.json"), &mut found)?;

        let mut artifacts = Vec::new();
        for path in found {
            let artifact = Self::from_file(&path)?;
            if artifact.contract_name != contract {
                continue;
            }
            if source.is_some_and(|s| s != artifact.source_name) {
                continue;
            }
            artifacts.push(artifact);
        }

        match artifacts.len() {
            0 => Err(ArtifactError::NotFound {
                name: name.to_string(),
                dir: dir.to_path_buf(),
            }),
            1 => Ok(artifacts.remove(0)),
            _ => {
                let mut candidates: Vec<String> =
                    artifacts.iter().map(|a| a.qualified_name()).collect();
                candidates.sort();
                Err(ArtifactError::Ambiguous {
                    name: name.to_string(),
                    candidates,
                })
            }
        }
    }

    /// Parses a single Hardhat artifact file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact: HardhatArtifact =
            serde_json::from_str(&raw).map_err(|source| ArtifactError::Json {
                path: path.to_path_buf(),
                source,
            })?;

        let code = artifact.bytecode.trim().trim_start_matches("0x");
        if code.is_empty() {
            return Err(ArtifactError::EmptyBytecode(artifact.contract_name));
        }
        if code.contains(LINK_PLACEHOLDER) {
            return Err(ArtifactError::UnlinkedLibraries(artifact.contract_name));
        }
        let bytecode = match hex::decode(code) {
            Ok(bytes) => Bytes::from(bytes),
            Err(source) => {
                return Err(ArtifactError::InvalidBytecode {
                    name: artifact.contract_name,
                    source,
                })
            }
        };

        debug!(
            path = %path.display(),
            contract = %artifact.contract_name,
            size = bytecode.len(),
            "Loaded artifact"
        );
        Ok(Self {
            contract_name: artifact.contract_name,
            source_name: artifact.source_name,
            abi: artifact.abi,
            bytecode,
        })
    }

    pub fn qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }
}

fn collect_candidates(
    dir: &Path,
    file_name: &str,
    out: &mut Vec<PathBuf>,
) -> Result<(), ArtifactError> {
    let io_error = |source| ArtifactError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(source) => return Err(io_error(source)),
    };
    for entry in entries {
        let entry = entry.map_err(io_error)?;
        let path = entry.path();
        if path.is_dir() {
            // Compiler inputs/outputs, never contract artifacts.
            if entry.file_name() == "build-info" {
                continue;
            }
            collect_candidates(&path, file_name, out)?;
        } else if entry.file_name().to_str() == Some(file_name) {
            out.push(path);
        }
    }
    Ok(())
}
