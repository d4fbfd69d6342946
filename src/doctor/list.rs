//! Plain dependency list input
//!
//! One library per line: `name`, `name version`, `name@version` or
//! `name==version`. Blank lines and `#` comments are skipped.

use crate::error::{DepdocError, DepdocResult};
use crate::library::Library;

/// Parse a dependency list into libraries, in file order
pub fn parse(input: &str) -> DepdocResult<Vec<Library>> {
    let mut libraries = Vec::new();

    for (index, raw) in input.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        let library = match fields.as_slice() {
            [spec] => parse_spec(spec),
            [name, version] => Library::with_version(*name, *version),
            _ => {
                return Err(DepdocError::DependencyListParse {
                    line: index + 1,
                    reason: format!("expected `name [version]`, got `{}`", line),
                })
            }
        };

        if library.name.is_empty() {
            return Err(DepdocError::DependencyListParse {
                line: index + 1,
                reason: "missing library name".to_string(),
            });
        }
        libraries.push(library);
    }

    Ok(libraries)
}

fn parse_spec(spec: &str) -> Library {
    if let Some((name, version)) = spec.split_once("==") {
        return Library::with_version(name, version);
    }
    // Scoped npm names start with '@', so only a later '@' separates a version
    match spec.rfind('@') {
        Some(at) if at > 0 => Library::with_version(&spec[..at], &spec[at + 1..]),
        _ => Library::new(spec),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_versions() {
        let input = "\
# ruby gems
thor 1.3.0
faker

dotenv@2.8.1
requests==2.31.0
@babel/core@7.23.0
@types/node
";
        let libs = parse(input).unwrap();

        assert_eq!(
            libs,
            vec![
                Library::with_version("thor", "1.3.0"),
                Library::new("faker"),
                Library::with_version("dotenv", "2.8.1"),
                Library::with_version("requests", "2.31.0"),
                Library::with_version("@babel/core", "7.23.0"),
                Library::new("@types/node"),
            ]
        );
    }

    #[test]
    fn strips_trailing_comments() {
        let libs = parse("serde 1.0 # serialization").unwrap();
        assert_eq!(libs, vec![Library::with_version("serde", "1.0")]);
    }

    #[test]
    fn rejects_extra_fields() {
        let err = parse("ok\nthor 1.3.0 extra").unwrap_err();
        match err {
            DepdocError::DependencyListParse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_missing_name() {
        assert!(parse("==1.0").is_err());
    }

    #[test]
    fn empty_input() {
        assert!(parse("").unwrap().is_empty());
    }
}
