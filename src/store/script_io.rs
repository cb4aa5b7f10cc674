use std::io::Read;
use std::path::Path;

use super::Error;

/// Where a script was read from; `-` stands for standard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Stdin,
    File,
}

impl Source {
    pub fn of(path: &Path) -> Self {
        if path.as_os_str() == "-" {
            Self::Stdin
        } else {
            Self::File
        }
    }
}

pub fn load_script(path: &Path) -> Result<String, Error> {
    match Source::of(path) {
        Source::Stdin => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|e| Error::io("<stdin>", e))?;
            Ok(text)
        }
        Source::File => std::fs::read_to_string(path).map_err(|e| Error::io(path.display(), e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.sieve");
        std::fs::write(&path, "keep;\n").unwrap();
        assert_eq!(load_script(&path).unwrap(), "keep;\n");
        assert_eq!(Source::of(&path), Source::File);
        assert_eq!(Source::of(Path::new("-")), Source::Stdin);
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = load_script(Path::new("/nonexistent/rules.sieve")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/rules.sieve"));
    }
}
