use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use itertools::Itertools;
use serde::Serialize;

use crate::error::TwitterResult;

/// The user columns of a followers CSV.
#[derive(Serialize, Clone, PartialEq, Eq, Debug)]
pub struct FollowerRow {
    pub name: String,
    pub id: String,
    pub username: String,
}

/// Read a header-less followers CSV as written by [`crate::CsvSink`]. Rows without an id are
/// dropped, and trailing columns are ignored.
pub fn read_followers(path: impl AsRef<Path>) -> TwitterResult<Vec<FollowerRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut rows = vec![];
    for record in reader.records() {
        let record = record?;
        let (Some(name), Some(id), Some(username)) = (record.get(0), record.get(1), record.get(2))
        else {
            continue;
        };
        if id.is_empty() {
            continue;
        }
        rows.push(FollowerRow {
            name: name.to_owned(),
            id: id.to_owned(),
            username: username.to_owned(),
        });
    }

    Ok(rows)
}

/// Users that follow every one of the accounts behind `files`, in the order of the smallest file.
pub fn find_common_users(files: &[impl AsRef<Path>]) -> TwitterResult<Vec<FollowerRow>> {
    let lists = files
        .iter()
        .map(|f| read_followers(f))
        .collect::<TwitterResult<Vec<_>>>()?;

    let Some(smallest) = lists.iter().min_by_key(|l| l.len()) else {
        return Ok(vec![]);
    };
    let id_sets: Vec<HashSet<&str>> = lists
        .iter()
        .map(|l| l.iter().map(|r| r.id.as_str()).collect())
        .collect();

    Ok(smallest
        .iter()
        .filter(|r| id_sets.iter().all(|ids| ids.contains(r.id.as_str())))
        .unique_by(|r| r.id.as_str())
        .cloned()
        .collect())
}

/// Write `rows` as CSV with a `name,id,username` header.
pub fn write_common_users_to<W: Write>(writer: W, rows: &[FollowerRow]) -> TwitterResult<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Same as [`write_common_users_to`], replacing any existing file at `path`.
pub fn write_common_users(path: impl AsRef<Path>, rows: &[FollowerRow]) -> TwitterResult<()> {
    write_common_users_to(File::create(path)?, rows)
}
