//! Reading the route id input file.

use std::path::Path;

use crate::error::MigrationError;
use crate::model::RouteId;

/// Reads one route id per line from `path`.
///
/// Lines are trimmed and blank lines skipped. Ids are returned in file order,
/// duplicates included.
///
/// # Errors
///
/// Fails if the file cannot be read or holds no id.
pub fn read_route_ids(path: impl AsRef<Path>) -> Result<Vec<RouteId>, MigrationError> {
    let path = path.as_ref();
    let content =
        std::fs::read_to_string(path).map_err(|source| MigrationError::RouteIdsUnreadable {
            path: path.to_path_buf(),
            source,
        })?;

    let route_ids = parse_route_ids(&content);
    if route_ids.is_empty() {
        return Err(MigrationError::NoRouteIds {
            path: path.to_path_buf(),
        });
    }
    Ok(route_ids)
}

fn parse_route_ids(content: &str) -> Vec<RouteId> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(RouteId::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("route-ids-{}-{name}", std::process::id()));
        std::fs::write(&path, content).expect("writable temp dir");
        path
    }

    #[test]
    fn should_trim_and_skip_blank_lines() {
        let ids = parse_route_ids("R-1\n\n  R-2  \r\n\t\nR-3");

        assert_eq!(
            ids,
            vec![RouteId::from("R-1"), RouteId::from("R-2"), RouteId::from("R-3")]
        );
    }

    #[test]
    fn should_read_ids_from_file() {
        let path = temp_file("valid", "R-1\nR-2\n");

        let ids = read_route_ids(&path).expect("readable");
        std::fs::remove_file(&path).ok();

        assert_eq!(ids, vec![RouteId::from("R-1"), RouteId::from("R-2")]);
    }

    #[test]
    fn should_fail_on_missing_file() {
        let path = std::env::temp_dir().join("route-ids-does-not-exist.txt");

        let error = read_route_ids(&path).expect_err("missing file");

        assert!(matches!(error, MigrationError::RouteIdsUnreadable { .. }));
        assert!(error.to_string().contains("route-ids-does-not-exist.txt"));
    }

    #[test]
    fn should_fail_on_blank_file() {
        let path = temp_file("blank", "\n   \n\n");

        let error = read_route_ids(&path).expect_err("no ids");
        std::fs::remove_file(&path).ok();

        assert!(matches!(error, MigrationError::NoRouteIds { .. }));
    }
}
