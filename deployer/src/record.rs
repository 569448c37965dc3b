// deployer/src/record.rs

use ethers::{types::Address, utils::to_checksum};
use std::{fmt, fs, io, io::Write, path::Path, str::FromStr};
use tempfile::NamedTempFile;
use thiserror::Error;

const DEPLOYED_TO: &str = "Contract deployed to: ";
const DEPLOYED_BY: &str = "Contract deployed by: ";

/// What a successful run leaves behind: where the contract lives and who deployed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeploymentRecord {
    pub contract_address: Address,
    pub deployer: Address,
}

impl DeploymentRecord {
    pub fn new(contract_address: Address, deployer: Address) -> Self {
        Self {
            contract_address,
            deployer,
        }
    }

    /// Writes the record to `path`, creating the parent directory if missing and
    /// replacing any previous record. The file is swapped in atomically and
    /// keeps the mode of the record it replaces (0644 for a new one).
    pub fn write_to(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let path = path.as_ref();
        let contents = self.to_string();

        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        #[cfg(unix)]
        tmp.as_file().set_permissions(record_permissions(path))?;
        tmp.write_all(contents.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    pub fn read_from(path: impl AsRef<Path>) -> io::Result<Self> {
        fs::read_to_string(path)?
            .parse::<Self>()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

// Temp files are created owner-only; the record should not be.
#[cfg(unix)]
fn record_permissions(target: &Path) -> fs::Permissions {
    use std::os::unix::fs::PermissionsExt;

    fs::metadata(target)
        .map(|meta| meta.permissions())
        .unwrap_or_else(|_| fs::Permissions::from_mode(0o644))
}

impl fmt::Display for DeploymentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{DEPLOYED_TO}{}", to_checksum(&self.contract_address, None))?;
        writeln!(f, "{DEPLOYED_BY}{}", to_checksum(&self.deployer, None))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseRecordError {
    #[error("expected exactly two newline-terminated lines")]
    Shape,
    #[error("line {line} must start with {prefix:?}")]
    Prefix { line: usize, prefix: &'static str },
    #[error("line {line} holds an invalid address {value:?}")]
    Address { line: usize, value: String },
}

impl FromStr for DeploymentRecord {
    type Err = ParseRecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s.strip_suffix('\n').ok_or(ParseRecordError::Shape)?;
        let lines: Vec<&str> = body.split('\n').collect();
        let [to, by] = lines.as_slice() else {
            return Err(ParseRecordError::Shape);
        };

        Ok(Self {
            contract_address: parse_field(1, to, DEPLOYED_TO)?,
            deployer: parse_field(2, by, DEPLOYED_BY)?,
        })
    }
}

fn parse_field(line: usize, text: &str, prefix: &'static str) -> Result<Address, ParseRecordError> {
    let value = text
        .strip_prefix(prefix)
        .ok_or(ParseRecordError::Prefix { line, prefix })?;
    value
        .parse::<Address>()
        .map_err(|_| ParseRecordError::Address {
            line,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn addr(s: &str) -> Address {
        s.parse().unwrap()
    }

    #[test]
    fn renders_two_checksummed_lines() {
        let record = DeploymentRecord::new(
            addr("0x5fbdb2315678afecb367f032d93f642f64180aa3"),
            addr("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"),
        );
        assert_eq!(
            record.to_string(),
            "Contract deployed to: 0x5FbDB2315678afecb367f032d93F642f64180aa3\n\
             Contract deployed by: 0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266\n"
        );
    }

    #[test]
    fn parses_what_it_writes() {
        let text = "Contract deployed to: 0x5FbDB2315678afecb367f032d93F642f64180aa3\n\
                    Contract deployed by: 0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266\n";
        let record: DeploymentRecord = text.parse().unwrap();
        assert_eq!(record.to_string(), text);
    }

    #[test]
    fn rejects_extra_lines_and_wrong_prefixes() {
        let appended = "Contract deployed to: 0x5FbDB2315678afecb367f032d93F642f64180aa3\n\
                        Contract deployed by: 0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266\n\
                        Contract deployed to: 0x5FbDB2315678afecb367f032d93F642f64180aa3\n";
        assert_eq!(
            appended.parse::<DeploymentRecord>(),
            Err(ParseRecordError::Shape)
        );

        let no_newline = "Contract deployed to: 0x5FbDB2315678afecb367f032d93F642f64180aa3\n\
                          Contract deployed by: 0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
        assert_eq!(
            no_newline.parse::<DeploymentRecord>(),
            Err(ParseRecordError::Shape)
        );

        let swapped = "Contract deployed by: 0x5FbDB2315678afecb367f032d93F642f64180aa3\n\
                       Contract deployed to: 0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266\n";
        assert_eq!(
            swapped.parse::<DeploymentRecord>(),
            Err(ParseRecordError::Prefix {
                line: 1,
                prefix: DEPLOYED_TO
            })
        );
    }

    #[test]
    fn write_creates_directory_and_replaces_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("genericJson").join("deploymentInfo.txt");

        let first = DeploymentRecord::new(Address::repeat_byte(0x11), Address::repeat_byte(0x22));
        first.write_to(&path).unwrap();
        assert_eq!(DeploymentRecord::read_from(&path).unwrap(), first);

        let second = DeploymentRecord::new(Address::repeat_byte(0x33), Address::repeat_byte(0x22));
        second.write_to(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), second.to_string());

        // Only the record itself is left in the directory.
        assert_eq!(fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn new_record_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("deploymentInfo.txt");
        DeploymentRecord::new(Address::repeat_byte(0x11), Address::repeat_byte(0x22))
            .write_to(&path)
            .unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[cfg(unix)]
    #[test]
    fn replaced_record_keeps_its_mode() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("deploymentInfo.txt");
        fs::write(&path, "old\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        DeploymentRecord::new(Address::repeat_byte(0x11), Address::repeat_byte(0x22))
            .write_to(&path)
            .unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
        assert!(fs::read_to_string(&path).unwrap().starts_with("Contract deployed to: "));
    }
}
