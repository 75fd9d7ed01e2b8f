use anyhow::{Context, Result};
use serde::Serialize;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HashAlgorithm {
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Blake3,
}

impl HashAlgorithm {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "sha224" => Some(Self::Sha224),
            "sha256" => Some(Self::Sha256),
            "sha384" => Some(Self::Sha384),
            "sha512" => Some(Self::Sha512),
            "blake3" => Some(Self::Blake3),
            _ => None,
        }
    }
}

/// Hex digest of a file's contents.
pub fn hash_file(path: &Path, algorithm: HashAlgorithm) -> Result<String> {
    let file = File::open(path)
        .with_context(|| format!("could not open file for hashing: {}", path.display()))?;
    let reader = BufReader::new(file);
    hash_reader(reader, algorithm)
        .with_context(|| format!("could not read file for hashing: {}", path.display()))
}

fn hash_reader<R: Read>(mut reader: R, algorithm: HashAlgorithm) -> io::Result<String> {
    let digest = match algorithm {
        HashAlgorithm::Sha224 => digest_with::<Sha224, _>(&mut reader)?,
        HashAlgorithm::Sha256 => digest_with::<Sha256, _>(&mut reader)?,
        HashAlgorithm::Sha384 => digest_with::<Sha384, _>(&mut reader)?,
        HashAlgorithm::Sha512 => digest_with::<Sha512, _>(&mut reader)?,
        HashAlgorithm::Blake3 => {
            let mut hasher = blake3::Hasher::new();
            io::copy(&mut reader, &mut hasher)?;
            hasher.finalize().to_hex().to_string()
        }
    };
    Ok(digest)
}

fn digest_with<D, R>(reader: &mut R) -> io::Result<String>
where
    D: Digest + io::Write,
    R: Read,
{
    let mut hasher = D::new();
    io::copy(reader, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn sha256_of_known_input() {
        let digest = hash_reader(&b"abc"[..], HashAlgorithm::Sha256).expect("hash");
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn blake3_matches_one_shot_hash() {
        let digest = hash_reader(&b"abc"[..], HashAlgorithm::Blake3).expect("hash");
        assert_eq!(digest, blake3::hash(b"abc").to_hex().to_string());
    }

    #[test]
    fn sha_digests_are_lowercase_hex() {
        let digest = hash_reader(&b""[..], HashAlgorithm::Sha224).expect("hash");
        assert_eq!(
            digest,
            "d14a028c2a3a2bc9476102bb288234c415a2b01f828ea62ac5b3e42f"
        );
        assert_eq!(hex::decode(&digest).expect("valid hex").len(), 28);
    }

    #[test]
    fn hash_file_reports_missing_file() {
        let temp = tempdir().expect("tempdir");
        let err = hash_file(&temp.path().join("missing.bin"), HashAlgorithm::Sha512)
            .expect_err("missing file must fail");
        assert!(err.to_string().contains("could not open file for hashing"));
    }

    #[test]
    fn hash_file_digests_contents() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("data.bin");
        fs::write(&path, b"abc").expect("write");
        let digest = hash_file(&path, HashAlgorithm::Sha224).expect("hash");
        assert_eq!(digest.len(), 56);
    }
}
