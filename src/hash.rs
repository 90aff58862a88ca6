//! BLAKE3 digest of a bundle's packaged file list

use blake3::Hasher;

use crate::apex::file::ApexFile;

/// Hash prefix for BLAKE3 hashes
pub const HASH_PREFIX: &str = "blake3:";

/// Digest the install path, source and class of every packaged file
///
/// The list must already be in its final sorted order; the same list always
/// produces the same digest.
pub fn hash_contents(files: &[ApexFile]) -> String {
    let mut hasher = Hasher::new();
    for file in files {
        hasher.update(file.path().as_bytes());
        hasher.update(b"\0"); // null separator
        hasher.update(file.built_file.as_bytes());
        hasher.update(b"\0");
        hasher.update(format!("{:?}", file.class).as_bytes());
        hasher.update(b"\0");
        for link in &file.symlinks {
            hasher.update(link.as_bytes());
            hasher.update(b"\0");
        }
        hasher.update(if file.transitive { b"t\n" } else { b"d\n" });
    }
    format!("{}{}", HASH_PREFIX, hasher.finalize().to_hex())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apex::file::FileClass;

    fn lib(name: &str) -> ApexFile {
        ApexFile::new(
            name,
            format!("out/{name}/android_arm64/{name}.so"),
            "lib64",
            FileClass::NativeSharedLib,
        )
    }

    #[test]
    fn test_hash_has_prefix() {
        let digest = hash_contents(&[lib("libfoo")]);
        assert!(digest.starts_with(HASH_PREFIX));
        assert_eq!(digest.len(), HASH_PREFIX.len() + 64);
    }

    #[test]
    fn test_hash_is_deterministic() {
        let files = vec![lib("libbar"), lib("libfoo")];
        assert_eq!(hash_contents(&files), hash_contents(&files.clone()));
    }

    #[test]
    fn test_hash_changes_with_contents() {
        let direct = lib("libfoo");
        let mut transitive = lib("libfoo");
        transitive.transitive = true;
        assert_ne!(hash_contents(&[direct.clone()]), hash_contents(&[transitive]));
        assert_ne!(hash_contents(&[direct.clone()]), hash_contents(&[direct, lib("libbar")]));
        assert_ne!(hash_contents(&[]), hash_contents(&[lib("libfoo")]));
    }
}
