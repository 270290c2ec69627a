use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{GarbledWire, S};

pub type Commit = [u8; 32];

pub fn commit_label(label: &S) -> Commit {
    Sha256::digest(label.0).into()
}

/// Hashes of both keys of one output wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCommit {
    pub commit_label0: Commit,
    pub commit_label1: Commit,
}

impl LabelCommit {
    pub fn new(wire: &GarbledWire) -> Self {
        Self {
            commit_label0: commit_label(&wire.label0),
            commit_label1: commit_label(&wire.label1),
        }
    }

    pub fn commit_for_value(&self, bit: bool) -> Commit {
        if bit {
            self.commit_label1
        } else {
            self.commit_label0
        }
    }

    /// Plain value `label` opens, if any.
    pub fn open(&self, label: &S) -> Option<bool> {
        let commit = commit_label(label);
        if commit == self.commit_label0 {
            Some(false)
        } else if commit == self.commit_label1 {
            Some(true)
        } else {
            None
        }
    }
}

impl fmt::Display for LabelCommit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LabelCommit {{ label0: 0x")?;
        write_commit_hex(f, &self.commit_label0)?;
        write!(f, ", label1: 0x")?;
        write_commit_hex(f, &self.commit_label1)?;
        write!(f, " }}")
    }
}

fn write_commit_hex(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    for byte in bytes {
        write!(f, "{byte:02x}")?;
    }
    Ok(())
}

/// One [`LabelCommit`] per output wire, in output order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputCommitments(Vec<LabelCommit>);

impl OutputCommitments {
    pub fn new(outputs: &[GarbledWire]) -> Self {
        Self(outputs.iter().map(LabelCommit::new).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LabelCommit> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::trng;

    #[test]
    fn commit_opens_only_own_labels() {
        let mut rng = trng();
        let wire = GarbledWire::random(&mut rng, true);
        let commit = LabelCommit::new(&wire);

        assert_eq!(commit.open(&wire.label0), Some(false));
        assert_eq!(commit.open(&wire.label1), Some(true));
        assert_eq!(commit.open(&S::random(&mut rng)), None);
        assert_eq!(commit.commit_for_value(true), commit_label(&wire.label1));
        assert!(commit.to_string().starts_with("LabelCommit { label0: 0x"));
    }
}
